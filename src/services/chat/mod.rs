//! Shopping assistant: an ordered keyword classifier over per-session context,
//! with an optional completion-API fallback for messages no rule matches.

pub mod dictionary;
pub mod language;
pub mod llm;
pub mod session;

use crate::{
    auth::AuthUser,
    common::format_amount,
    config::AppConfig,
    db::DbPool,
    entities::{order, order_item, product},
    errors::ServiceError,
    services::products::ProductService,
};
use dictionary::{render, suggestions, Key};
use language::Lang;
use llm::{CompletionClient, CompletionMessage, OpenAiClient, Role};
use metrics::counter;
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait};
use serde::{Deserialize, Serialize};
use session::{Session, SessionStore, Speaker, Topic, UserInfo};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

/// Turns of history sent along with an escalated message
pub const LLM_HISTORY_TURNS: usize = 8;
const SUGGESTED_PRODUCTS: u64 = 3;
const RECENT_ORDERS: u64 = 3;

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: Option<String>,
    pub session_id: Option<String>,
    /// Client-side context; accepted for compatibility, the server keeps its own
    #[schema(value_type = Object)]
    pub context: Option<serde_json::Value>,
    pub lang: Option<String>,
    /// Only keys the session; identity comes from the bearer token
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatContext {
    pub last_topic: Option<Topic>,
    pub user_info: Option<UserInfo>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatResponse {
    pub response: String,
    pub suggestions: Vec<String>,
    pub context: ChatContext,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Greeting,
    ProductQuery,
    OrderQuery,
    Shipping,
    Returns,
    Contact,
    Thanks,
    DrySkin,
    OilySkin,
    Payment,
    Promotions,
    About,
    Ingredients,
    Navigation,
    Yes,
    No,
    Unknown,
}

fn word_pattern(words: &str) -> Regex {
    Regex::new(&format!(r"(?i)\b({})\b", words)).expect("valid keyword pattern")
}

static GREETING: Lazy<Regex> =
    Lazy::new(|| word_pattern("hi|hello|hey|greetings|bonjour|salut|مرحبا|اهلا|أهلا"));
static PRODUCT: Lazy<Regex> = Lazy::new(|| {
    word_pattern(
        "products?|prices?|costs?|buy|creams?|serums?|oils?|masks?|cleansers?|toners?|moisturi[sz]ers?|\
         shampoos?|conditioners?|lipsticks?|makeup|beauty|bodycare|haircare|skincare|tools|\
         produits?|prix|acheter|achat|crèmes?|sérums?|huiles?|masques?|nettoyants?|shampoings?|\
         maquillage|rouge à lèvres|beauté|soins?|cheveux|outils|المنتج|منتج|سعر|شراء",
    )
});
static ORDER: Lazy<Regex> =
    Lazy::new(|| word_pattern("orders?|commandes?|track|tracking|status"));
static ABOUT: Lazy<Regex> =
    Lazy::new(|| word_pattern("about|brand|saria|story|propos|histoire|marque|قصة|عن"));
static YES: Lazy<Regex> =
    Lazy::new(|| word_pattern("yes|yeah|sure|ok|okay|oui|d'accord|ouais|نعم|أكيد"));
static NO: Lazy<Regex> = Lazy::new(|| word_pattern("no|nope|non|لا|كلا"));
static SEARCH_NOISE: Lazy<Regex> = Lazy::new(|| {
    word_pattern(
        "products?|produits?|prices?|prix|costs?|buy|acheter|achat|شراء|المنتج|منتج|سعر|show|montrez|voir|\
         find|trouver|me|moi|the|some|any|a|an|for|please|les|des|un|une|pour|do|you|have|what|is|are",
    )
});

fn contains_any(text: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| text.contains(n))
}

/// First matching rule wins
pub fn classify(message: &str) -> Intent {
    let lower = message.to_lowercase();
    let text = lower.as_str();

    if GREETING.is_match(text) {
        Intent::Greeting
    } else if PRODUCT.is_match(text) {
        Intent::ProductQuery
    } else if ORDER.is_match(text) || text.contains("طلب") {
        Intent::OrderQuery
    } else if contains_any(text, &["shipping", "delivery", "livraison", "expédition", "شحن", "تسليم"]) {
        Intent::Shipping
    } else if contains_any(text, &["return", "refund", "retour", "remboursement", "إرجاع", "استرداد"]) {
        Intent::Returns
    } else if contains_any(text, &["contact", "support", "help", "aide", "مساعدة"]) {
        Intent::Contact
    } else if contains_any(text, &["thank", "merci", "شكر"]) {
        Intent::Thanks
    } else if contains_any(text, &["dry", "sèche", "seche", "جافة"]) {
        Intent::DrySkin
    } else if contains_any(text, &["oily", "grasse", "دهنية"]) {
        Intent::OilySkin
    } else if contains_any(text, &["payment", "paiement", "carte", "credit", "visa", "paypal", "دفع", "بطاقة"]) {
        Intent::Payment
    } else if contains_any(
        text,
        &[
            "promo", "sale", "deal", "discount", "offre", "réduction", "solde", "new arrival",
            "nouveauté", "عرض", "خصم", "جديد",
        ],
    ) {
        Intent::Promotions
    } else if ABOUT.is_match(text) {
        Intent::About
    } else if contains_any(
        text,
        &[
            "ingredient", "composition", "organic", "natural", "ingrédient", "naturel", "bio",
            "مكونات", "طبيعي",
        ],
    ) {
        Intent::Ingredients
    } else if contains_any(text, &["navigate", "shop", "boutique"]) {
        Intent::Navigation
    } else if YES.is_match(text) {
        Intent::Yes
    } else if NO.is_match(text) {
        Intent::No
    } else {
        Intent::Unknown
    }
}

/// What the shopper is looking for once intent words and filler are removed
pub fn search_terms(message: &str) -> String {
    let lower = message.to_lowercase();
    let stripped = SEARCH_NOISE.replace_all(&lower, " ");
    stripped
        .split(|c: char| !(c.is_alphanumeric() || c == '-' || c == '\''))
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn system_prompt(lang: Lang) -> String {
    format!(
        "You are Saria, the beauty shopping assistant for Saria Beauty.\n\
         - Always answer in {}.\n\
         - Be warm, elegant and brief (2 to 5 short sentences).\n\
         - You can explain skincare, makeup, haircare, bodycare, shipping, returns and how to use the website.\n\
         - Never invent order or account details. For specific orders, point to the Orders page or support.\n\
         - Product advice should focus on skin type, concerns and routine steps, with generic brand names unless the conversation names one.",
        lang.display_name()
    )
}

fn order_line(order: &order::Model) -> String {
    let id = order.id.simple().to_string();
    let short = &id[id.len().saturating_sub(6)..];
    format!(
        "Order #{} - {} - {}",
        short,
        if order.is_paid { "Paid" } else { "Pending" },
        if order.is_delivered { "Delivered" } else { "In Transit" }
    )
}

/// Reply text plus whether the completion API should get a chance to improve it
struct Answer {
    reply: String,
    escalate: bool,
}

impl Answer {
    fn canned(reply: String) -> Self {
        Self {
            reply,
            escalate: false,
        }
    }
}

#[derive(Clone)]
pub struct ChatService {
    db_pool: Arc<DbPool>,
    products: ProductService,
    sessions: SessionStore,
    llm: Option<Arc<dyn CompletionClient>>,
    currency: String,
}

impl ChatService {
    pub fn new(
        db_pool: Arc<DbPool>,
        products: ProductService,
        sessions: SessionStore,
        llm: Option<Arc<dyn CompletionClient>>,
        currency: &str,
    ) -> Self {
        Self {
            db_pool,
            products,
            sessions,
            llm,
            currency: currency.to_uppercase(),
        }
    }

    pub fn from_config(
        cfg: &AppConfig,
        db_pool: Arc<DbPool>,
        products: ProductService,
    ) -> Result<Self, ServiceError> {
        let llm: Option<Arc<dyn CompletionClient>> = match cfg.openai_api_key.as_deref() {
            Some(key) if !key.is_empty() => Some(Arc::new(OpenAiClient::new(
                &cfg.openai_api_base,
                key,
                &cfg.assistant_model,
                cfg.provider_timeout(),
            )?)),
            _ => None,
        };
        let sessions = SessionStore::new(
            Duration::from_secs(cfg.chat_session_ttl_secs),
            cfg.chat_session_capacity,
        );
        Ok(Self::new(db_pool, products, sessions, llm, &cfg.store_currency))
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    #[instrument(skip(self, viewer, request), fields(signed_in = viewer.is_some()))]
    pub async fn respond(
        &self,
        viewer: Option<&AuthUser>,
        request: ChatRequest,
    ) -> Result<ChatResponse, ServiceError> {
        let message = request
            .message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .ok_or_else(|| ServiceError::ValidationError("Message is required".to_string()))?;

        let session_key = [request.session_id, request.user_id]
            .into_iter()
            .flatten()
            .find(|k| !k.trim().is_empty())
            .unwrap_or_else(|| "anonymous".to_string());
        let lang = language::detect(&message, request.lang.as_deref());

        let mut session = self.sessions.load(&session_key);
        let history: Vec<CompletionMessage> = session
            .recent(LLM_HISTORY_TURNS)
            .iter()
            .map(|turn| {
                let role = match turn.speaker {
                    Speaker::User => Role::User,
                    Speaker::Assistant => Role::Assistant,
                };
                CompletionMessage::new(role, turn.text.clone())
            })
            .collect();
        session.push(Speaker::User, message.clone());

        let intent = classify(&message);
        debug!(?intent, lang = lang.code(), "Chat message classified");
        let mut answer = self.answer(intent, &message, lang, viewer, &mut session).await?;

        if answer.escalate {
            if let Some(llm) = &self.llm {
                counter!("saria_chat.llm_fallbacks", 1);
                let mut messages = Vec::with_capacity(history.len() + 2);
                messages.push(CompletionMessage::new(Role::System, system_prompt(lang)));
                messages.extend(history);
                messages.push(CompletionMessage::new(Role::User, message.clone()));
                match llm.complete(messages).await {
                    Ok(Some(text)) => answer.reply = text,
                    Ok(None) => debug!("Completion returned no text"),
                    Err(e) => warn!(error = %e, "Completion fallback failed; keeping default reply"),
                }
            }
        }

        session.push(Speaker::Assistant, answer.reply.clone());
        let response = ChatResponse {
            response: answer.reply,
            suggestions: suggestions(session.last_topic, lang),
            context: ChatContext {
                last_topic: session.last_topic,
                user_info: session.user_info.clone(),
            },
        };
        self.sessions.save(&session_key, session);
        Ok(response)
    }

    async fn answer(
        &self,
        intent: Intent,
        message: &str,
        lang: Lang,
        viewer: Option<&AuthUser>,
        session: &mut Session,
    ) -> Result<Answer, ServiceError> {
        let (topic, reply) = match intent {
            Intent::Greeting => {
                let reply = if let Some(info) = &session.user_info {
                    render(lang, Key::WelcomeBack, &[("name", info.name.as_str())])
                } else if let Some(user) = viewer {
                    session.user_info = Some(UserInfo {
                        name: user.name.clone(),
                    });
                    render(lang, Key::GreetUser, &[("name", user.name.as_str())])
                } else {
                    render(lang, Key::Greet, &[])
                };
                (Some(Topic::Greeting), reply)
            }
            Intent::ProductQuery => (
                Some(Topic::Products),
                self.product_reply(message, lang, viewer).await?,
            ),
            Intent::OrderQuery => (Some(Topic::Orders), self.orders_reply(lang, viewer).await?),
            Intent::Shipping => (Some(Topic::Shipping), render(lang, Key::Shipping, &[])),
            Intent::Returns => (Some(Topic::Returns), render(lang, Key::Returns, &[])),
            Intent::Contact => (Some(Topic::Support), render(lang, Key::Contact, &[])),
            Intent::Thanks => (Some(Topic::Thanks), render(lang, Key::Thanks, &[])),
            Intent::DrySkin | Intent::OilySkin => {
                let picks = self.products.search_by_category("skin", SUGGESTED_PRODUCTS).await?;
                let list = picks
                    .iter()
                    .map(|p| p.localized_name(lang.code()))
                    .collect::<Vec<_>>()
                    .join(", ");
                let key = if intent == Intent::DrySkin { Key::SkinDry } else { Key::SkinOily };
                (Some(Topic::Skincare), render(lang, key, &[("list", list.as_str())]))
            }
            Intent::Payment => (Some(Topic::Payment), render(lang, Key::Payment, &[])),
            Intent::Promotions => (Some(Topic::Promotions), render(lang, Key::Promotions, &[])),
            Intent::About => (Some(Topic::About), render(lang, Key::About, &[])),
            Intent::Ingredients => (Some(Topic::Ingredients), render(lang, Key::Ingredients, &[])),
            Intent::Navigation => (Some(Topic::Navigation), render(lang, Key::Navigate, &[])),
            Intent::Yes if session.last_topic == Some(Topic::Greeting) => {
                let picks = self.products.top_rated(SUGGESTED_PRODUCTS).await?;
                let list = self.price_list(&picks, lang);
                (Some(Topic::Products), render(lang, Key::Products, &[("list", list.as_str())]))
            }
            Intent::Yes => (session.last_topic, render(lang, Key::Yes, &[])),
            Intent::No => (session.last_topic, render(lang, Key::No, &[])),
            Intent::Unknown => {
                let follow_up = match session.last_topic {
                    Some(Topic::Products) => Some(Key::FollowUpProducts),
                    Some(Topic::Orders) => Some(Key::FollowUpOrders),
                    Some(Topic::Skincare) => Some(Key::FollowUpSkincare),
                    _ => None,
                };
                return Ok(match follow_up {
                    Some(key) => Answer::canned(render(lang, key, &[])),
                    None => Answer {
                        reply: render(lang, Key::Default, &[]),
                        escalate: true,
                    },
                });
            }
        };
        session.last_topic = topic;
        Ok(Answer::canned(reply))
    }

    fn price_list(&self, products: &[product::Model], lang: Lang) -> String {
        products
            .iter()
            .map(|p| {
                format!(
                    "{} ({} {})",
                    p.localized_name(lang.code()),
                    self.currency,
                    format_amount(p.price)
                )
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    async fn product_reply(
        &self,
        message: &str,
        lang: Lang,
        viewer: Option<&AuthUser>,
    ) -> Result<String, ServiceError> {
        let query = search_terms(message);
        let mut key = Key::Products;
        let mut picks = Vec::new();

        if query.chars().count() > 2 {
            picks = self
                .products
                .search_by_name_or_category(&query, SUGGESTED_PRODUCTS)
                .await?;
            if picks.is_empty() {
                for word in query.split(' ').filter(|w| w.chars().count() > 3) {
                    picks = self
                        .products
                        .search_by_name_or_category(word, SUGGESTED_PRODUCTS)
                        .await?;
                    if !picks.is_empty() {
                        break;
                    }
                }
            }
            key = if picks.is_empty() {
                Key::ProductsNotFound
            } else {
                Key::ProductsFound
            };
        }

        if picks.is_empty() {
            if let Some(user) = viewer {
                if let Some(category) = self.favourite_category(user.user_id).await? {
                    picks = self
                        .products
                        .in_categories(vec![category], SUGGESTED_PRODUCTS)
                        .await?;
                }
            }
        }
        if picks.is_empty() {
            picks = self.products.top_rated(SUGGESTED_PRODUCTS).await?;
        }

        let list = self.price_list(&picks, lang);
        Ok(render(lang, key, &[("list", list.as_str()), ("query", query.as_str())]))
    }

    /// Most purchased category across the user's paid orders
    async fn favourite_category(&self, user_id: Uuid) -> Result<Option<String>, ServiceError> {
        let product_ids: Vec<Uuid> = order_item::Entity::find()
            .select_only()
            .column(order_item::Column::ProductId)
            .join(sea_orm::JoinType::InnerJoin, order_item::Relation::Order.def())
            .filter(order::Column::UserId.eq(user_id))
            .filter(order::Column::IsPaid.eq(true))
            .into_tuple()
            .all(&*self.db_pool)
            .await?;
        if product_ids.is_empty() {
            return Ok(None);
        }

        let categories: HashMap<Uuid, String> = self
            .products
            .find_many(product_ids.clone())
            .await?
            .into_iter()
            .map(|p| (p.id, p.category))
            .collect();

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for id in &product_ids {
            if let Some(category) = categories.get(id) {
                *counts.entry(category.as_str()).or_default() += 1;
            }
        }
        let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        Ok(ranked.first().map(|(category, _)| category.to_string()))
    }

    async fn orders_reply(&self, lang: Lang, viewer: Option<&AuthUser>) -> Result<String, ServiceError> {
        let Some(user) = viewer else {
            return Ok(render(lang, Key::LoginToTrack, &[]));
        };
        let recent = order::Entity::find()
            .filter(order::Column::UserId.eq(user.user_id))
            .order_by_desc(order::Column::CreatedAt)
            .limit(RECENT_ORDERS)
            .all(&*self.db_pool)
            .await?;
        if recent.is_empty() {
            return Ok(render(lang, Key::OrdersEmpty, &[]));
        }
        let list = recent.iter().map(order_line).collect::<Vec<_>>().join("\n");
        Ok(render(lang, Key::OrdersList, &[("list", list.as_str())]))
    }
}
