use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::QuatuorError;

// =============================================================================
// Providers and modes
// =============================================================================

/// A language-model provider reachable through the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    ChatGpt,
    Gemini,
    DeepSeek,
    Claude,
}

impl Provider {
    /// All providers in speech priority order.
    pub const ALL: [Provider; 4] = [
        Provider::ChatGpt,
        Provider::Gemini,
        Provider::DeepSeek,
        Provider::Claude,
    ];

    /// Wire name, also the prefix of the `<provider>_response` reply fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::ChatGpt => "chatgpt",
            Provider::Gemini => "gemini",
            Provider::DeepSeek => "deepseek",
            Provider::Claude => "claude",
        }
    }

    /// Human-readable name for display.
    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::ChatGpt => "ChatGPT",
            Provider::Gemini => "Gemini",
            Provider::DeepSeek => "DeepSeek",
            Provider::Claude => "Claude",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = QuatuorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Provider::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| QuatuorError::UnknownProvider(s.to_string()))
    }
}

/// Send mode: every provider at once, or a single one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ChatMode {
    #[default]
    Compare,
    Single(Provider),
}

impl ChatMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatMode::Compare => "compare",
            ChatMode::Single(p) => p.as_str(),
        }
    }
}

impl fmt::Display for ChatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatMode {
    type Err = QuatuorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("compare") {
            return Ok(ChatMode::Compare);
        }
        s.parse::<Provider>()
            .map(ChatMode::Single)
            .map_err(|_| QuatuorError::UnknownMode(s.to_string()))
    }
}

impl TryFrom<String> for ChatMode {
    type Error = QuatuorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ChatMode> for String {
    fn from(mode: ChatMode) -> Self {
        mode.as_str().to_string()
    }
}

// =============================================================================
// Sessions
// =============================================================================

/// Opaque session identifier.
///
/// Minted client-side as `session-<unix millis>` for fresh sessions; the
/// backend may hand back identifiers of any shape.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mint a client-side identifier from the creation time.
    pub fn mint(now: DateTime<Utc>) -> Self {
        Self(format!("session-{}", now.timestamp_millis()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A session as listed by the backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub session_name: String,
    #[serde(with = "utc_lenient")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "utc_lenient")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub message_count: u64,
}

// =============================================================================
// Answers, turns and replies
// =============================================================================

/// One provider's answer to a message.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderAnswer {
    pub text: Option<String>,
    /// Elapsed provider time in seconds.
    pub response_time: Option<f64>,
}

impl ProviderAnswer {
    pub fn new(text: impl Into<String>, response_time: f64) -> Self {
        Self {
            text: Some(text.into()),
            response_time: Some(response_time),
        }
    }

    /// The answer text, if present and non-empty.
    pub fn non_empty_text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.is_empty())
    }
}

/// Answers from every provider, one slot each.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderAnswers {
    pub chatgpt: ProviderAnswer,
    pub gemini: ProviderAnswer,
    pub deepseek: ProviderAnswer,
    pub claude: ProviderAnswer,
}

impl ProviderAnswers {
    pub fn get(&self, provider: Provider) -> &ProviderAnswer {
        match provider {
            Provider::ChatGpt => &self.chatgpt,
            Provider::Gemini => &self.gemini,
            Provider::DeepSeek => &self.deepseek,
            Provider::Claude => &self.claude,
        }
    }

    /// Iterate in priority order.
    pub fn iter(&self) -> impl Iterator<Item = (Provider, &ProviderAnswer)> {
        Provider::ALL.into_iter().map(move |p| (p, self.get(p)))
    }

    /// First non-empty answer text in priority order.
    pub fn first_spoken(&self) -> Option<&str> {
        self.iter().find_map(|(_, answer)| answer.non_empty_text())
    }
}

/// A retrieval source cited when a file was used as context.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub filename: String,
    #[serde(default)]
    pub page: Option<u32>,
}

/// One persisted exchange: a user message and the reply or replies to it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub id: String,
    pub session_id: SessionId,
    pub session_name: Option<String>,
    pub message: String,
    /// Mode recorded at send time. `None` when the backend stored a mode this
    /// client does not recognise.
    pub mode: Option<ChatMode>,
    pub answers: ProviderAnswers,
    pub sources: Vec<Source>,
    pub timestamp: DateTime<Utc>,
}

/// A provider reply, resolved from the flat wire fields once at the
/// transport boundary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ReplyRecord {
    Compare {
        answers: ProviderAnswers,
    },
    Single {
        provider: Provider,
        answer: ProviderAnswer,
        #[serde(default)]
        sources: Vec<Source>,
    },
}

impl ReplyRecord {
    pub fn mode(&self) -> ChatMode {
        match self {
            ReplyRecord::Compare { .. } => ChatMode::Compare,
            ReplyRecord::Single { provider, .. } => ChatMode::Single(*provider),
        }
    }

    /// The text that voice playback should read out, if any.
    pub fn primary_text(&self) -> Option<&str> {
        match self {
            ReplyRecord::Compare { answers } => answers.first_spoken(),
            ReplyRecord::Single { answer, .. } => answer.non_empty_text(),
        }
    }
}

// =============================================================================
// Display timeline
// =============================================================================

/// A rendered timeline entry. Derived on the client, never persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum DisplayMessage {
    User {
        text: String,
        timestamp: DateTime<Utc>,
    },
    AiCompare {
        answers: ProviderAnswers,
        timestamp: DateTime<Utc>,
    },
    AiSingle {
        text: String,
        provider: Provider,
        response_time: Option<f64>,
        sources: Vec<Source>,
        timestamp: DateTime<Utc>,
    },
    /// Client-side error notice.
    System {
        text: String,
        timestamp: DateTime<Utc>,
    },
}

impl DisplayMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            DisplayMessage::User { .. } => "user",
            DisplayMessage::AiCompare { .. } => "ai-compare",
            DisplayMessage::AiSingle { .. } => "ai-single",
            DisplayMessage::System { .. } => "system",
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            DisplayMessage::User { timestamp, .. }
            | DisplayMessage::AiCompare { timestamp, .. }
            | DisplayMessage::AiSingle { timestamp, .. }
            | DisplayMessage::System { timestamp, .. } => *timestamp,
        }
    }

    pub fn is_ai(&self) -> bool {
        matches!(
            self,
            DisplayMessage::AiCompare { .. } | DisplayMessage::AiSingle { .. }
        )
    }
}

/// The uploaded file currently bound as conversation context.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContext {
    pub file_id: String,
    pub filename: String,
}

// =============================================================================
// Timestamp helpers
// =============================================================================

/// Serde adapter accepting both RFC 3339 timestamps and the naive
/// `YYYY-MM-DDTHH:MM:SS[.ffffff]` form the backend emits (read as UTC).
pub mod utc_lenient {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&dt.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
    }
}

// =============================================================================
// Tests
// =============================================================================
