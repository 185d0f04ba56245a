//! Launch catalog, inserted when the products table is empty.

/// One seeded product with its French and Arabic copy
pub struct CatalogEntry {
    /// File name under the images directory
    pub image: &'static str,
    pub name: &'static str,
    pub category: &'static str,
    pub price_cents: i64,
    pub description: &'static str,
    /// `(name, description)`
    pub fr: (&'static str, &'static str),
    pub ar: (&'static str, &'static str),
}

/// Units in stock for every seeded product
pub const SEED_STOCK: i32 = 30;

pub const CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        image: "1.png",
        name: "Rose Glow Serum",
        category: "Skincare",
        price_cents: 4900,
        description: "Brightening face serum with vitamin C and rose extract for a luminous complexion.",
        fr: (
            "Sérum Éclat Rose",
            "Sérum visage éclaircissant à la vitamine C et extrait de rose pour un teint lumineux.",
        ),
        ar: (
            "سيروم إشراقة الورد",
            "سيروم للوجه بفيتامين سي وخلاصة الورد يمنح إشراقًا واضحًا.",
        ),
    },
    CatalogEntry {
        image: "2.png",
        name: "Velvet Rose Lipstick",
        category: "Beauty",
        price_cents: 2400,
        description: "Matte lipstick with velvet finish and deep rose pigment that lasts all day.",
        fr: (
            "Rouge à Lèvres Velours Rose",
            "Rouge à lèvres mat, fini velours, pigment rose profond qui tient toute la journée.",
        ),
        ar: (
            "أحمر شفاه مخملي وردي",
            "أحمر شفاه مطفي بلمسة مخملية، لون وردي عميق يدوم طوال اليوم.",
        ),
    },
    CatalogEntry {
        image: "3.png",
        name: "Luminous Silk Foundation",
        category: "Beauty",
        price_cents: 4500,
        description: "Weightless foundation delivering medium coverage and a soft, radiant finish.",
        fr: (
            "Fond de Teint Soie Lumineuse",
            "Fond de teint léger, couvrance moyenne, fini doux et lumineux.",
        ),
        ar: (
            "كريم أساس حريري مضيء",
            "كريم أساس خفيف يمنح تغطية متوسطة وإنهاء ناعم ومضيء.",
        ),
    },
    CatalogEntry {
        image: "4.png",
        name: "Rose Quartz Roller",
        category: "Tools",
        price_cents: 2900,
        description: "Cooling facial roller crafted from rose quartz to depuff and enhance glow.",
        fr: (
            "Roller Quartz Rose",
            "Roller visage en quartz rose, effet rafraîchissant pour défatiguer et illuminer.",
        ),
        ar: (
            "رولر كوارتز وردي",
            "أداة تدليك للوجه من حجر الكوارتز الوردي لتقليل الانتفاخ وتعزيز اللمعان.",
        ),
    },
    CatalogEntry {
        image: "5.png",
        name: "Silk Touch Primer",
        category: "Beauty",
        price_cents: 3200,
        description: "Blurring primer that smooths texture and prolongs wear.",
        fr: (
            "Base Lissante Soie",
            "Base floutante qui lisse le grain de peau et prolonge la tenue.",
        ),
        ar: (
            "برايمر لمسة حرير",
            "برايمر لتنعيم الملمس ويطيل الثبات.",
        ),
    },
    CatalogEntry {
        image: "6.png",
        name: "Rose Petal Mist",
        category: "Skincare",
        price_cents: 2200,
        description: "Hydrating face mist with rose water to refresh and soothe skin.",
        fr: (
            "Brume Pétales de Rose",
            "Brume hydratante à l’eau de rose pour rafraîchir et apaiser la peau.",
        ),
        ar: (
            "رذاذ بتلات الورد",
            "رذاذ مرطب للوجه بماء الورد ينعش ويهدئ البشرة.",
        ),
    },
    CatalogEntry {
        image: "7.png",
        name: "Golden Glow Highlighter",
        category: "Beauty",
        price_cents: 2700,
        description: "Finely milled powder highlighter with rose-gold tones for a soft sheen.",
        fr: (
            "Enlumineur Éclat Doré",
            "Enlumineur poudre aux tons or rose pour une lueur subtile.",
        ),
        ar: (
            "هايلايتر توهج ذهبي",
            "هايلايتر بودرة ناعمة بظلال ذهبية وردية تمنح لمعانًا رقيقًا.",
        ),
    },
    CatalogEntry {
        image: "8.png",
        name: "Silk Finish Setting Spray",
        category: "Beauty",
        price_cents: 2600,
        description: "Long-wear setting spray that locks in your look with a luminous finish.",
        fr: (
            "Spray Fixateur Fini Soie",
            "Spray fixateur longue tenue au fini lumineux.",
        ),
        ar: (
            "رذاذ تثبيت لمسة حرير",
            "رذاذ تثبيت طويل الأمد يمنح إنهاءً مضيئًا.",
        ),
    },
    CatalogEntry {
        image: "9.png",
        name: "Rose Silk Compact",
        category: "Beauty",
        price_cents: 3400,
        description: "Pressed powder compact for shine control and a soft-focus complexion.",
        fr: (
            "Poudre Compacte Soie Rose",
            "Poudre compacte pour contrôler la brillance et un teint flouté.",
        ),
        ar: (
            "بودرة مضغوطة حرير وردي",
            "بودرة مضغوطة للتحكم باللمعان ومنح تأثير ناعم.",
        ),
    },
    CatalogEntry {
        image: "10.png",
        name: "Radiant Rose Blush",
        category: "Beauty",
        price_cents: 2300,
        description: "Silky powder blush in a flattering rose tone with buildable pigment.",
        fr: (
            "Blush Rose Rayonnant",
            "Blush poudre soyeux au ton rose flatteur, pigment modulable.",
        ),
        ar: (
            "بلاشر وردي مشرق",
            "بلاشر بودرة حريري بدرجة وردية جذابة وقابل للبناء.",
        ),
    },
    CatalogEntry {
        image: "11.png",
        name: "Gold Rose Perfume Oil",
        category: "Fragrance",
        price_cents: 3900,
        description: "Concentrated perfume oil blending damask rose with warm amber and soft musk.",
        fr: (
            "Huile de Parfum Or Rose",
            "Huile de parfum concentrée alliant rose de Damas, ambre chaud et musc doux.",
        ),
        ar: (
            "زيت عطر الورد الذهبي",
            "زيت عطر مركز يمزج الورد الدمشقي بالعنبر الدافئ والمسك الناعم.",
        ),
    },
    CatalogEntry {
        image: "12.png",
        name: "Rose Silk Hand Cream",
        category: "Bodycare",
        price_cents: 1800,
        description: "Nourishing hand cream with shea butter and rose essence for soft hands.",
        fr: (
            "Crème Mains Soie Rose",
            "Crème nourrissante au beurre de karité et essence de rose pour des mains douces.",
        ),
        ar: (
            "كريم يدين حرير وردي",
            "كريم مغذي لليدين بزبدة الشيا وخلاصة الورد يمنح نعومة.",
        ),
    },
    CatalogEntry {
        image: "13.png",
        name: "Rose Gold Hair Oil",
        category: "Haircare",
        price_cents: 2800,
        description: "Lightweight hair oil to tame frizz and add shine without weighing down.",
        fr: (
            "Huile Capillaire Or Rose",
            "Huile légère pour discipliner les frisottis et apporter de la brillance sans alourdir.",
        ),
        ar: (
            "زيت شعر ذهب وردي",
            "زيت شعر خفيف يقلل الهيشان ويمنح لمعانًا دون إثقال.",
        ),
    },
    CatalogEntry {
        image: "14.png",
        name: "Silk Rose Body Lotion",
        category: "Bodycare",
        price_cents: 2100,
        description: "Hydrating body lotion with aloe and rose to smooth and soften skin.",
        fr: (
            "Lait Corps Soie Rose",
            "Lotion hydratante à l’aloe et rose pour une peau douce et lisse.",
        ),
        ar: (
            "لوشن جسم حرير وردي",
            "لوشن مرطب للجسم بالألوة والورد لنعومة البشرة.",
        ),
    },
    CatalogEntry {
        image: "15.png",
        name: "Velvet Eye Shadow Duo",
        category: "Beauty",
        price_cents: 2900,
        description: "Two-pan eyeshadow palette with rose and gold hues in velvet textures.",
        fr: (
            "Duo Fard à Paupières Velours",
            "Palette deux fards aux teintes rose et or avec textures velours.",
        ),
        ar: (
            "ثنائي ظلال مخملية",
            "بالت ظلال عيون من درجتين وردي وذهبي بقوام مخملي.",
        ),
    },
    CatalogEntry {
        image: "16.png",
        name: "Silk Brow Gel",
        category: "Beauty",
        price_cents: 1900,
        description: "Clear hold brow gel to shape and set brows with a natural finish.",
        fr: (
            "Gel Sourcils Soie",
            "Gel transparent pour fixer et structurer les sourcils au fini naturel.",
        ),
        ar: (
            "جل حواجب حريري",
            "جل شفاف لتثبيت وتشكيل الحواجب بإنهاء طبيعي.",
        ),
    },
    CatalogEntry {
        image: "17.png",
        name: "Rose Renewal Night Cream",
        category: "Skincare",
        price_cents: 5400,
        description: "Rich night cream with peptides and rosehip to restore overnight.",
        fr: (
            "Crème Nuit Renouvellement Rose",
            "Crème nuit riche aux peptides et cynorhodon pour une réparation nocturne.",
        ),
        ar: (
            "كريم ليلي تجديد الورد",
            "كريم ليلي غني بالبيبتيدات وزيت بذور الورد للتجديد أثناء النوم.",
        ),
    },
    CatalogEntry {
        image: "18.png",
        name: "Gold Infused Sheet Mask",
        category: "Skincare",
        price_cents: 750,
        description: "Hydrogel sheet mask infused with gold and botanical extracts for instant radiance.",
        fr: (
            "Masque Tissu Infusé Or",
            "Masque hydrogel infusé d’or et extraits botaniques pour un éclat immédiat.",
        ),
        ar: (
            "قناع ورقي مدمج بالذهب",
            "قناع هيدروجيل بذهب ومستخلصات نباتية يمنح إشراقًا فوريًا.",
        ),
    },
    CatalogEntry {
        image: "19.png",
        name: "Rose Velvet Lip Balm",
        category: "Beauty",
        price_cents: 1500,
        description: "Cushiony lip balm with rose wax for comfort and soft shine.",
        fr: (
            "Baume Lèvres Velours Rose",
            "Baume lèvres moelleux à la cire de rose pour confort et éclat doux.",
        ),
        ar: (
            "بلسم شفاه مخملي وردي",
            "بلسم شفاه ناعم بشمع الورد يمنح راحة ولمعانًا خفيفًا.",
        ),
    },
    CatalogEntry {
        image: "21.png",
        name: "Pure Rose Micellar Water",
        category: "Skincare",
        price_cents: 1700,
        description: "Gentle micellar water that cleanses skin while calming skin.",
        fr: (
            "Eau Micellaire Rose Pure",
            "Eau micellaire douce qui nettoie tout en apaisant la peau.",
        ),
        ar: (
            "ماء ميسيلار الورد النقي",
            "ماء ميسيلار لطيف ينظف ويهدئ البشرة.",
        ),
    },
    CatalogEntry {
        image: "22.png",
        name: "Silk Contour Stick",
        category: "Beauty",
        price_cents: 2500,
        description: "Cream contour stick with blendable texture for natural definition.",
        fr: (
            "Stick Contour Soie",
            "Stick contour crème, texture fondante pour une définition naturelle.",
        ),
        ar: (
            "ستيک كنتور حريري",
            "ستيک كنتور كريم بقوام قابل للمزج يمنح تحديدًا طبيعيًا.",
        ),
    },
    CatalogEntry {
        image: "23.png",
        name: "Rose Silk Face Cleanser",
        category: "Skincare",
        price_cents: 2000,
        description: "Low-foam cleanser with rose water that leaves skin soft and balanced.",
        fr: (
            "Nettoyant Visage Soie Rose",
            "Nettoyant doux à l’eau de rose, laisse la peau souple et équilibrée.",
        ),
        ar: (
            "منظف وجه حرير وردي",
            "منظف لطيف بماء الورد يترك البشرة ناعمة ومتوازنة.",
        ),
    },
    CatalogEntry {
        image: "24.png",
        name: "Rose Gold Nail Lacquer",
        category: "Beauty",
        price_cents: 1600,
        description: "Chip-resistant nail lacquer in a chic rose-gold shade.",
        fr: (
            "Vernis Or Rose",
            "Vernis résistant aux éclats dans une teinte or rose élégante.",
        ),
        ar: (
            "طِلاء أظافر ذهب وردي",
            "طِلاء أظافر مقاوم للتقشر بدرجة ذهبية وردية أنيقة.",
        ),
    },
    CatalogEntry {
        image: "25.png",
        name: "Silk Lash Mascara",
        category: "Beauty",
        price_cents: 2400,
        description: "Lengthening mascara with flexible brush for fanned-out lashes.",
        fr: (
            "Mascara Cils Soie",
            "Mascara allongeant à brosse flexible pour des cils déployés.",
        ),
        ar: (
            "ماسكارا حرير الرموش",
            "ماسكارا مطولة بفرشاة مرنة لرموش متفتحة.",
        ),
    },
    CatalogEntry {
        image: "26.png",
        name: "Rose Repair Hair Mask",
        category: "Haircare",
        price_cents: 3100,
        description: "Deep conditioning hair mask to repair and strengthen strands.",
        fr: (
            "Masque Cheveux Réparateur Rose",
            "Masque nourrissant pour réparer et renforcer la fibre capillaire.",
        ),
        ar: (
            "قناع شعر إصلاح الورد",
            "قناع عميق لتغذية الشعر وتقويته.",
        ),
    },
    CatalogEntry {
        image: "27.png",
        name: "Velvet Cheek Palette",
        category: "Beauty",
        price_cents: 3600,
        description: "Three-shade cheek palette for blush, bronzer, and highlight.",
        fr: (
            "Palette Joues Velours",
            "Palette trois teintes pour blush, bronzer et enlumineur.",
        ),
        ar: (
            "لوحة خدود مخملية",
            "لوحة بثلاث درجات للبلاشر والبرونزر والهايلايتر.",
        ),
    },
    CatalogEntry {
        image: "28.png",
        name: "Rose Renewal Eye Cream",
        category: "Skincare",
        price_cents: 3300,
        description: "Peptide eye cream to smooth fine lines and reduce puffiness.",
        fr: (
            "Crème Yeux Renouvellement Rose",
            "Crème yeux aux peptides pour lisser les ridules et réduire les poches.",
        ),
        ar: (
            "كريم عين تجديد الورد",
            "كريم عين بالبيبتيدات لتنعيم الخطوط وتقليل الانتفاخ.",
        ),
    },
    CatalogEntry {
        image: "29.png",
        name: "Gold Glow Body Oil",
        category: "Bodycare",
        price_cents: 2900,
        description: "Shimmering body oil that nourishes and gives a sunlit glow.",
        fr: (
            "Huile Corps Éclat Doré",
            "Huile scintillante qui nourrit et offre une lueur ensoleillée.",
        ),
        ar: (
            "زيت جسم بريق ذهبي",
            "زيت جسم لامع يغذي ويمنح توهجًا مشرقًا.",
        ),
    },
    CatalogEntry {
        image: "30.png",
        name: "Silk Rose Toner",
        category: "Skincare",
        price_cents: 1900,
        description: "Balancing toner with rose extract to refine pores and calm skin.",
        fr: (
            "Tonique Soie Rose",
            "Tonique équilibrant à l’extrait de rose pour affiner les pores et apaiser la peau.",
        ),
        ar: (
            "تونر حرير وردي",
            "تونر متوازن بخلاصة الورد لتنقية المسام وتهدئة البشرة.",
        ),
    },
    CatalogEntry {
        image: "31.png",
        name: "Golden Silk Hand Wash",
        category: "Bodycare",
        price_cents: 1400,
        description: "Gentle hand wash with subtle rose-gold aroma; leaves hands soft.",
        fr: (
            "Gel Lavant Mains Soie Dorée",
            "Gel lavant doux au parfum subtile or rose; mains douces.",
        ),
        ar: (
            "غسول يدين حرير ذهبي",
            "غسول لطيف برائحة ذهبية وردية خفيفة يمنح نعومة لليدين.",
        ),
    },
    CatalogEntry {
        image: "32.png",
        name: "Rose Silk Body Scrub",
        category: "Bodycare",
        price_cents: 2600,
        description: "Sugar-based body scrub with rose petals to smooth and polish skin.",
        fr: (
            "Gommage Corps Soie Rose",
            "Gommage corps au sucre et pétales de rose pour lisser et polir.",
        ),
        ar: (
            "سكراب جسم حرير وردي",
            "مقشر للجسم يعتمد على السكر مع بتلات الورد لتنعيم البشرة.",
        ),
    },
    CatalogEntry {
        image: "33.png",
        name: "Silk Finishing Powder",
        category: "Beauty",
        price_cents: 2800,
        description: "Translucent finishing powder that blurs imperfections and sets your look.",
        fr: (
            "Poudre de Finition Soie",
            "Poudre translucide qui floute les imperfections et fixe le teint.",
        ),
        ar: (
            "بودرة تثبيت حريرية",
            "بودرة شفافة لتثبيت المظهر وتنعيم المظهر.",
        ),
    },
    CatalogEntry {
        image: "34.png",
        name: "Rose Gold Brush Set",
        category: "Tools",
        price_cents: 3900,
        description: "Five-piece brush set with soft synthetic bristles.",
        fr: (
            "Kit Pinceaux Or Rose",
            "Ensemble de 5 pinceaux aux poils synthétiques doux.",
        ),
        ar: (
            "طقم فرش ذهب وردي",
            "مجموعة من خمس فرش بشعيرات صناعية ناعمة.",
        ),
    },
    CatalogEntry {
        image: "35.png",
        name: "Rose Silk Remover",
        category: "Skincare",
        price_cents: 1800,
        description: "Oil-based remover that melts away long-wear pigments.",
        fr: (
            "Nettoyant Soie Rose",
            "Nettoyant huile qui dissout les pigments longue tenue.",
        ),
        ar: (
            "مزيل شوائب حرير وردي",
            "مزيل زيتي يزيل الألوان الثابتة بسهولة.",
        ),
    },
    CatalogEntry {
        image: "39.png",
        name: "Velvet Lip Liner",
        category: "Beauty",
        price_cents: 1400,
        description: "Creamy lip liner to define shape and prevent feathering.",
        fr: (
            "Crayon Lèvres Velours",
            "Crayon lèvres crémeux pour définir et éviter le débordement.",
        ),
        ar: (
            "قلم تحديد شفاه مخملي",
            "قلم شفاه كريمي لتحديد الشكل ومنع الامتداد.",
        ),
    },
    CatalogEntry {
        image: "40.png",
        name: "Rose Silk Bath Salt",
        category: "Bodycare",
        price_cents: 2000,
        description: "Mineral bath salts with rose petals to relax body and mind.",
        fr: (
            "Sel de Bain Soie Rose",
            "Sels minéraux aux pétales de rose pour une détente profonde.",
        ),
        ar: (
            "أملاح حمام حرير وردي",
            "أملاح معدنية مع بتلات الورد للاسترخاء للجسم والعقل.",
        ),
    },
    CatalogEntry {
        image: "41.png",
        name: "Golden Body Butter",
        category: "Bodycare",
        price_cents: 2500,
        description: "Rich body butter with cocoa and rose oils for intense nourishment.",
        fr: (
            "Beurre Corps Doré",
            "Beurre corporel riche au cacao et huiles de rose pour une nutrition intense.",
        ),
        ar: (
            "زبدة جسم ذهبية",
            "زبدة جسم غنية بالكاكاو وزيوت الورد لتغذية عميقة.",
        ),
    },
    CatalogEntry {
        image: "43.png",
        name: "Silk Gel Eyeliner",
        category: "Beauty",
        price_cents: 1900,
        description: "Smudge-resistant gel eyeliner for precise and smooth lines.",
        fr: (
            "Eyeliner Gel Soie",
            "Eyeliner gel résistant, ligne précise et fluide.",
        ),
        ar: (
            "آيلاينر جل حريري",
            "آيلاينر جل مقاوم للتلطخ يمنح خطوطًا دقيقة وسلسة.",
        ),
    },
    CatalogEntry {
        image: "44.png",
        name: "Rose Hydrating Sheet Mask",
        category: "Skincare",
        price_cents: 600,
        description: "Hydrating sheet mask infused with rose essence for instant plumpness.",
        fr: (
            "Masque Tissu Hydratant Rose",
            "Masque tissu hydratant infusé d’essence de rose pour un rebond immédiat.",
        ),
        ar: (
            "قناع ورقي مرطب بالورد",
            "قناع ورقي مرطب بخلاصة الورد يمنح امتلاءً فوريًا.",
        ),
    },
    CatalogEntry {
        image: "45.png",
        name: "Golden Hair Gloss",
        category: "Haircare",
        price_cents: 2300,
        description: "Finishing hair gloss that adds shine and tames flyaways.",
        fr: (
            "Gloss Cheveux Doré",
            "Fini gloss pour les cheveux, ajoute de la brillance et discipline les frisottis.",
        ),
        ar: (
            "جلس شعر ذهبي",
            "لمسة نهائية للشعر تضيف لمعانًا وتقلل الشعيرات المتطايرة.",
        ),
    },
    CatalogEntry {
        image: "46.png",
        name: "Rose Velvet Nail Care Set",
        category: "Bodycare",
        price_cents: 2700,
        description: "Manicure care set with nourishing oil and buffer for healthy nails.",
        fr: (
            "Set Soin Ongles Velours Rose",
            "Kit manucure avec huile nourrissante et polissoir pour des ongles sains.",
        ),
        ar: (
            "طقم عناية بالأظافر مخملي وردي",
            "طقم عناية يتضمن زيتًا مغذيًا ومبردًا لأظافر صحية.",
        ),
    },
];
