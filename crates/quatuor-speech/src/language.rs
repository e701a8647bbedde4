//! Mapping from the interface language to recognition locales and voices.

use serde::{Deserialize, Serialize};

/// A synthesis voice offered by the environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    pub name: String,
    /// Language tag, e.g. `fr-FR`.
    pub lang: String,
}

impl Voice {
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
        }
    }
}

/// `(ui language, voice language prefix, recognition locale)`.
const LANGUAGE_TABLE: [(&str, &str, &str); 3] = [
    ("fr", "fr", "fr-FR"),
    ("en", "en", "en-US"),
    ("de", "de", "de-DE"),
];

const FALLBACK_LANGUAGE: &str = "en";
const FALLBACK_LOCALE: &str = "en-US";

fn lookup(ui_language: &str) -> Option<&'static (&'static str, &'static str, &'static str)> {
    LANGUAGE_TABLE.iter().find(|(ui, _, _)| *ui == ui_language)
}

/// Recognition locale for an interface language; English when unmapped.
pub fn resolve_recognition_locale(ui_language: &str) -> &'static str {
    lookup(ui_language)
        .map(|(_, _, locale)| *locale)
        .unwrap_or(FALLBACK_LOCALE)
}

/// Best synthesis voice for an interface language.
///
/// Falls back to any English voice, then to the first available voice.
/// `None` only when no voice is available at all.
pub fn resolve_voice(voices: &[Voice], ui_language: &str) -> Option<Voice> {
    let target = lookup(ui_language)
        .map(|(_, prefix, _)| *prefix)
        .unwrap_or(FALLBACK_LANGUAGE);

    voices
        .iter()
        .find(|v| v.lang.starts_with(target))
        .or_else(|| voices.iter().find(|v| v.lang.starts_with(FALLBACK_LANGUAGE)))
        .or_else(|| voices.first())
        .cloned()
}
