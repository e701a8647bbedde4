//! UI languages and the handful of localized labels the client core needs.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Languages the client interface ships labels for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UiLanguage {
    #[default]
    En,
    Fr,
    De,
}

impl UiLanguage {
    /// Parse a language code such as `fr` or `de-CH`. Unknown languages fall
    /// back to English.
    pub fn from_code(code: &str) -> Self {
        let primary = code
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match primary.as_str() {
            "fr" => UiLanguage::Fr,
            "de" => UiLanguage::De,
            _ => UiLanguage::En,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            UiLanguage::En => "en",
            UiLanguage::Fr => "fr",
            UiLanguage::De => "de",
        }
    }

    /// Display name given to a session that has not been named yet.
    pub fn new_conversation_label(&self) -> &'static str {
        match self {
            UiLanguage::En => "New conversation",
            UiLanguage::Fr => "Nouvelle conversation",
            UiLanguage::De => "Neues Gespräch",
        }
    }
}

impl fmt::Display for UiLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
