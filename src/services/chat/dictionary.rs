//! Canned assistant replies in English, French and Arabic.

use super::language::Lang;
use super::session::Topic;
use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Greet,
    GreetUser,
    WelcomeBack,
    Default,
    Products,
    ProductsFound,
    ProductsNotFound,
    Shipping,
    Returns,
    Contact,
    Thanks,
    SkinDry,
    SkinOily,
    Navigate,
    OrdersList,
    OrdersEmpty,
    LoginToTrack,
    FollowUpProducts,
    FollowUpOrders,
    FollowUpSkincare,
    Payment,
    Promotions,
    About,
    Ingredients,
    Yes,
    No,
}

fn english(key: Key) -> &'static str {
    match key {
        Key::Greet => "Hello! Welcome to Saria Beauty. How can I enhance your glow today?",
        Key::GreetUser => "Hello {{name}}! Welcome to Saria Beauty. How can I enhance your glow today?",
        Key::WelcomeBack => "Welcome back {{name}}! How can I enhance your glow today?",
        Key::Default => "I'm Saria's assistant. I can help with product info, recommendations, shipping, or general questions.",
        Key::Products => "Explore our luxury skincare and beauty products. Picks: {{list}}",
        Key::ProductsFound => "Here are some products matching '{{query}}': {{list}}",
        Key::ProductsNotFound => "I couldn't find products matching '{{query}}', but here are our top picks: {{list}}",
        Key::Shipping => "We ship worldwide. Delivery is free on orders over 100 and usually takes 3 to 5 business days.",
        Key::Returns => "Unused items in their original packaging can be returned within 30 days.",
        Key::Contact => "Our customer success team is at support@sariabeauty.com.",
        Key::Thanks => "You're welcome! Anything else I can help with?",
        Key::SkinDry => "For dry skin, try our hydrating picks: {{list}}",
        Key::SkinOily => "For oily skin, try our mattifying picks: {{list}}",
        Key::Navigate => "You can browse the Shop, view your Cart, or log in to track orders.",
        Key::OrdersList => "Here are your recent orders:\n{{list}}\n\nWould you like details about a specific order?",
        Key::OrdersEmpty => "I don't see any orders in your account yet. Would you like to browse our products?",
        Key::LoginToTrack => "Please log in to track your orders. You can browse products in the meantime.",
        Key::FollowUpProducts => "Would you like to see more products or get recommendations for a specific skin type?",
        Key::FollowUpOrders => "Is there anything specific about your orders you'd like to know?",
        Key::FollowUpSkincare => "I can find products for dry, oily or combination skin. Which type do you have?",
        Key::Payment => "We accept Visa, Mastercard and PayPal. Every transaction is secured.",
        Key::Promotions => "Check the homepage for our latest deals, including free shipping on larger orders.",
        Key::About => "Saria Beauty curates premium skincare and beauty products that enhance your natural glow.",
        Key::Ingredients => "We choose high-quality, ethically sourced ingredients. Each product page lists the full formula.",
        Key::Yes => "Great! How should we continue?",
        Key::No => "Understood. Is there anything else I can help you with?",
    }
}

fn french(key: Key) -> &'static str {
    match key {
        Key::Greet => "Bonjour ! Bienvenue chez Saria Beauty. Comment puis-je sublimer votre éclat aujourd'hui ?",
        Key::GreetUser => "Bonjour {{name}} ! Bienvenue chez Saria Beauty. Comment puis-je sublimer votre éclat aujourd'hui ?",
        Key::WelcomeBack => "Bon retour {{name}} ! Comment puis-je sublimer votre éclat aujourd'hui ?",
        Key::Default => "Je suis l'assistante de Saria. Je vous aide pour les produits, les conseils, la livraison ou toute autre question.",
        Key::Products => "Découvrez nos soins et produits de beauté de luxe. Sélection : {{list}}",
        Key::ProductsFound => "Voici des produits correspondant à '{{query}}' : {{list}}",
        Key::ProductsNotFound => "Aucun produit ne correspond à '{{query}}', mais voici nos meilleurs choix : {{list}}",
        Key::Shipping => "Livraison dans le monde entier, offerte au-delà de 100, en 3 à 5 jours ouvrés.",
        Key::Returns => "Les articles non utilisés dans leur emballage d'origine peuvent être retournés sous 30 jours.",
        Key::Contact => "Notre équipe est joignable à support@sariabeauty.com.",
        Key::Thanks => "Avec plaisir ! Puis-je vous aider pour autre chose ?",
        Key::SkinDry => "Pour une peau sèche, essayez nos soins hydratants : {{list}}",
        Key::SkinOily => "Pour une peau grasse, essayez nos soins matifiants : {{list}}",
        Key::Navigate => "Parcourez la Boutique, consultez votre Panier ou connectez-vous pour suivre vos commandes.",
        Key::OrdersList => "Voici vos commandes récentes :\n{{list}}\n\nSouhaitez-vous des détails sur une commande ?",
        Key::OrdersEmpty => "Je ne vois aucune commande sur votre compte. Souhaitez-vous parcourir nos produits ?",
        Key::LoginToTrack => "Connectez-vous pour suivre vos commandes. Vous pouvez parcourir nos produits en attendant.",
        Key::FollowUpProducts => "Voulez-vous voir plus de produits ou des conseils pour un type de peau précis ?",
        Key::FollowUpOrders => "Souhaitez-vous savoir quelque chose de précis sur vos commandes ?",
        Key::FollowUpSkincare => "Je peux trouver des produits pour peau sèche, grasse ou mixte. Quel est votre type de peau ?",
        Key::Payment => "Nous acceptons Visa, Mastercard et PayPal. Toutes les transactions sont sécurisées.",
        Key::Promotions => "Consultez la page d'accueil pour nos dernières offres, dont la livraison offerte.",
        Key::About => "Saria Beauty sélectionne des soins et produits de beauté haut de gamme pour sublimer votre éclat naturel.",
        Key::Ingredients => "Nous choisissons des ingrédients de qualité et d'origine éthique. Chaque fiche produit détaille la formule.",
        Key::Yes => "Parfait ! Comment souhaitez-vous continuer ?",
        Key::No => "Entendu. Puis-je vous aider pour autre chose ?",
    }
}

fn arabic(key: Key) -> &'static str {
    match key {
        Key::Greet => "مرحباً! أهلاً بك في سارية بيوتي. كيف أساعدك اليوم؟",
        Key::GreetUser => "مرحباً {{name}}! أهلاً بك في سارية بيوتي. كيف أساعدك اليوم؟",
        Key::WelcomeBack => "أهلاً بعودتك {{name}}! كيف أساعدك اليوم؟",
        Key::Default => "أنا مساعدة سارية. أساعدك في معلومات المنتجات والتوصيات والشحن والأسئلة العامة.",
        Key::Products => "استكشف منتجات العناية والتجميل الفاخرة. اقتراحاتنا: {{list}}",
        Key::ProductsFound => "إليك منتجات تطابق '{{query}}': {{list}}",
        Key::ProductsNotFound => "لم أجد منتجات تطابق '{{query}}'، لكن إليك أفضل اختياراتنا: {{list}}",
        Key::Shipping => "نشحن إلى جميع أنحاء العالم، والشحن مجاني للطلبات فوق 100، ويستغرق التوصيل من 3 إلى 5 أيام عمل.",
        Key::Returns => "يمكن إرجاع المنتجات غير المستخدمة بعبوتها الأصلية خلال 30 يوماً.",
        Key::Contact => "تواصل مع فريق الدعم عبر support@sariabeauty.com.",
        Key::Thanks => "على الرحب والسعة! هل تحتاج إلى شيء آخر؟",
        Key::SkinDry => "للبشرة الجافة ننصح بمنتجات الترطيب: {{list}}",
        Key::SkinOily => "للبشرة الدهنية ننصح بمنتجات مطفية للمعان: {{list}}",
        Key::Navigate => "تصفح المتجر، أو شاهد السلة، أو سجّل الدخول لمتابعة طلباتك.",
        Key::OrdersList => "إليك طلباتك الأخيرة:\n{{list}}\n\nهل تود معرفة تفاصيل طلب معين؟",
        Key::OrdersEmpty => "لا أرى أي طلبات في حسابك. هل تود تصفح منتجاتنا؟",
        Key::LoginToTrack => "يرجى تسجيل الدخول لتتبع طلباتك. يمكنك تصفح المنتجات في هذه الأثناء.",
        Key::FollowUpProducts => "هل تود رؤية المزيد من المنتجات أو توصيات لنوع بشرة معين؟",
        Key::FollowUpOrders => "هل هناك شيء محدد تود معرفته عن طلباتك؟",
        Key::FollowUpSkincare => "يمكنني مساعدتك في إيجاد منتجات للبشرة الجافة أو الدهنية أو المختلطة. ما نوع بشرتك؟",
        Key::Payment => "نقبل فيزا وماستركارد وباي بال. جميع المعاملات آمنة.",
        Key::Promotions => "تفقد الصفحة الرئيسية لأحدث العروض، ومنها الشحن المجاني.",
        Key::About => "تقدم سارية بيوتي منتجات عناية وتجميل فاخرة تبرز جمالك الطبيعي.",
        Key::Ingredients => "نختار مكونات عالية الجودة ومن مصادر أخلاقية. تجد التركيبة الكاملة في صفحة كل منتج.",
        Key::Yes => "رائع! كيف نتابع؟",
        Key::No => "فهمت. هل هناك شيء آخر يمكنني مساعدتك به؟",
    }
}

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{(\w+)\}\}").expect("valid placeholder pattern"));

pub fn text(lang: Lang, key: Key) -> &'static str {
    match lang {
        Lang::En => english(key),
        Lang::Fr => french(key),
        Lang::Ar => arabic(key),
    }
}

/// Fills `{{var}}` placeholders; unknown variables render empty
pub fn render(lang: Lang, key: Key, vars: &[(&str, &str)]) -> String {
    PLACEHOLDER
        .replace_all(text(lang, key), |caps: &regex::Captures<'_>| {
            vars.iter()
                .find(|(name, _)| *name == &caps[1])
                .map(|(_, value)| value.to_string())
                .unwrap_or_default()
        })
        .into_owned()
}

/// Quick replies offered under the assistant's answer
pub fn suggestions(topic: Option<Topic>, lang: Lang) -> Vec<String> {
    let set: [&str; 3] = match (lang, topic) {
        (Lang::En, Some(Topic::Products)) => ["Show me bestsellers", "Products for oily skin", "What's on sale?"],
        (Lang::En, Some(Topic::Orders)) => ["Track my latest order", "When will my order arrive?", "Cancel order"],
        (Lang::En, Some(Topic::Skincare)) => ["Products for dry skin", "Anti-aging products", "Sunscreen recommendations"],
        (Lang::En, _) => ["What products do you recommend?", "Tell me about shipping", "Show me new arrivals"],
        (Lang::Fr, Some(Topic::Products)) => ["Montrez-moi les best-sellers", "Produits pour peau grasse", "Qu'est-ce qui est en promotion ?"],
        (Lang::Fr, Some(Topic::Orders)) => ["Suivre ma dernière commande", "Quand ma commande arrivera-t-elle ?", "Annuler une commande"],
        (Lang::Fr, Some(Topic::Skincare)) => ["Produits pour peau sèche", "Produits anti-âge", "Conseils de protection solaire"],
        (Lang::Fr, _) => ["Quels produits recommandez-vous ?", "Parlez-moi de la livraison", "Montrez-moi les nouveautés"],
        (Lang::Ar, Some(Topic::Products)) => ["أظهر لي الأكثر مبيعاً", "منتجات للبشرة الدهنية", "ما العروض المتاحة الآن؟"],
        (Lang::Ar, Some(Topic::Orders)) => ["تتبع طلبي الأخير", "متى سيصل طلبي؟", "إلغاء طلب"],
        (Lang::Ar, Some(Topic::Skincare)) => ["منتجات للبشرة الجافة", "منتجات لمكافحة الشيخوخة", "توصيات واقي الشمس"],
        (Lang::Ar, _) => ["ما المنتجات التي توصي بها؟", "أخبرني عن الشحن", "أظهر لي أحدث المنتجات"],
    };
    set.iter().map(|s| s.to_string()).collect()
}
