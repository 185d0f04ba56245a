use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

static ARABIC_SCRIPT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\x{0600}-\x{06FF}]").expect("valid arabic script pattern"));

static FRENCH_MARKERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(le|la|les|bonjour|merci|produit|prix|je|tu|vous|nous|pas|est|c'est|ca|ça|comment|pourquoi|salut|au revoir|s'il|plait)\b",
    )
    .expect("valid french marker pattern")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    #[default]
    En,
    Fr,
    Ar,
}

impl Lang {
    pub fn code(self) -> &'static str {
        match self {
            Lang::En => "en",
            Lang::Fr => "fr",
            Lang::Ar => "ar",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Lang::En => "English",
            Lang::Fr => "French",
            Lang::Ar => "Arabic",
        }
    }

    /// Unknown codes fall back to English
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_lowercase().as_str() {
            "fr" => Lang::Fr,
            "ar" => Lang::Ar,
            _ => Lang::En,
        }
    }
}

/// The message's own script and wording win over the UI language
pub fn detect(message: &str, requested: Option<&str>) -> Lang {
    if ARABIC_SCRIPT.is_match(message) {
        Lang::Ar
    } else if FRENCH_MARKERS.is_match(message) {
        Lang::Fr
    } else {
        requested.map(Lang::from_code).unwrap_or_default()
    }
}
