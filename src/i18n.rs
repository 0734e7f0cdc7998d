//! # Localization Module
//!
//! ## Purpose
//! Locale lookup for the user-facing error text the search controller
//! composes. Only the messages the pipeline itself surfaces live here;
//! static UI chrome is an external collaborator.

use serde::{Deserialize, Serialize};

/// Supported locales
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    Ru,
    En,
}

/// Default locale when none is configured or recognized
pub const DEFAULT_LOCALE: Locale = Locale::Ru;

/// User-facing message bundle for one locale
#[derive(Debug, Clone, Copy)]
pub struct Messages {
    pub too_long: &'static str,
    pub request_failed: &'static str,
}

const RU: Messages = Messages {
    too_long: "Слишком длинный запрос (макс. 50 символов).",
    request_failed: "Ошибка запроса",
};

const EN: Messages = Messages {
    too_long: "Query is too long (max 50 characters).",
    request_failed: "Request failed",
};

impl Locale {
    /// Parse a locale tag, falling back to the default for anything else
    pub fn parse(value: &str) -> Locale {
        match value.to_ascii_lowercase().as_str() {
            "en" => Locale::En,
            "ru" => Locale::Ru,
            _ => DEFAULT_LOCALE,
        }
    }

    /// Message bundle for this locale
    pub fn messages(&self) -> Messages {
        match self {
            Locale::Ru => RU,
            Locale::En => EN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_falls_back_to_default() {
        assert_eq!(Locale::parse("en"), Locale::En);
        assert_eq!(Locale::parse("RU"), Locale::Ru);
        assert_eq!(Locale::parse("de"), DEFAULT_LOCALE);
        assert_eq!(Locale::parse(""), DEFAULT_LOCALE);
    }

    #[test]
    fn test_messages_differ_by_locale() {
        assert_ne!(
            Locale::En.messages().too_long,
            Locale::Ru.messages().too_long
        );
    }
}
