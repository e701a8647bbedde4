//! JSON shapes exchanged with the chat backend.
//!
//! The backend reports answers as flat `<provider>_response` and
//! `<provider>_response_time` fields. They are folded into
//! [`ProviderAnswers`] and [`ReplyRecord`] here so nothing past the transport
//! boundary has to look fields up by name.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use quatuor_core::types::utc_lenient;
use quatuor_core::{
    ChatMode, FileContext, ProviderAnswer, ProviderAnswers, ReplyRecord, SessionId, Source, Turn,
};

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub session_id: SessionId,
    pub session_name: String,
    pub message: String,
    pub mode: ChatMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
}

/// The eight flat answer fields shared by chat replies and stored turns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlatAnswers {
    #[serde(default)]
    pub chatgpt_response: Option<String>,
    #[serde(default)]
    pub gemini_response: Option<String>,
    #[serde(default)]
    pub deepseek_response: Option<String>,
    #[serde(default)]
    pub claude_response: Option<String>,
    #[serde(default)]
    pub chatgpt_response_time: Option<f64>,
    #[serde(default)]
    pub gemini_response_time: Option<f64>,
    #[serde(default)]
    pub deepseek_response_time: Option<f64>,
    #[serde(default)]
    pub claude_response_time: Option<f64>,
}

impl FlatAnswers {
    pub fn into_answers(self) -> ProviderAnswers {
        ProviderAnswers {
            chatgpt: ProviderAnswer {
                text: self.chatgpt_response,
                response_time: self.chatgpt_response_time,
            },
            gemini: ProviderAnswer {
                text: self.gemini_response,
                response_time: self.gemini_response_time,
            },
            deepseek: ProviderAnswer {
                text: self.deepseek_response,
                response_time: self.deepseek_response_time,
            },
            claude: ProviderAnswer {
                text: self.claude_response,
                response_time: self.claude_response_time,
            },
        }
    }
}

/// Reply to `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(flatten)]
    pub answers: FlatAnswers,
    pub mode: String,
    #[serde(default)]
    pub sources: Vec<Source>,
}

impl ChatResponse {
    /// Resolve into a reply record for the mode that was sent. A differing
    /// echo from the backend is logged and otherwise ignored.
    pub fn into_reply(self, requested: ChatMode) -> ReplyRecord {
        if self.mode != requested.as_str() {
            warn!(echoed = %self.mode, requested = %requested, "Reply mode differs from request");
        }
        let answers = self.answers.into_answers();
        match requested {
            ChatMode::Compare => ReplyRecord::Compare { answers },
            ChatMode::Single(provider) => ReplyRecord::Single {
                provider,
                answer: answers.get(provider).clone(),
                sources: self.sources,
            },
        }
    }
}

/// One element of `GET /api/chat/history/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub id: String,
    pub session_id: SessionId,
    #[serde(default)]
    pub session_name: Option<String>,
    pub message: String,
    #[serde(flatten)]
    pub answers: FlatAnswers,
    pub mode: String,
    #[serde(default)]
    pub sources: Vec<Source>,
    #[serde(with = "utc_lenient")]
    pub timestamp: DateTime<Utc>,
}

impl From<TurnRecord> for Turn {
    fn from(record: TurnRecord) -> Self {
        let mode = match record.mode.parse::<ChatMode>() {
            Ok(mode) => Some(mode),
            Err(_) => {
                debug!(turn = %record.id, mode = %record.mode, "Stored turn has unknown mode");
                None
            }
        };
        Turn {
            id: record.id,
            session_id: record.session_id,
            session_name: record.session_name,
            message: record.message,
            mode,
            answers: record.answers.into_answers(),
            sources: record.sources,
            timestamp: record.timestamp,
        }
    }
}

/// Body of `POST /api/auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
    pub username: String,
}

/// Reply to `POST /api/auth/login`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub user: Option<UserInfo>,
}

/// Reply to `POST /api/files/upload`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub file_id: String,
    pub filename: String,
    #[serde(default)]
    pub size: Option<u64>,
}

impl From<UploadResponse> for FileContext {
    fn from(upload: UploadResponse) -> Self {
        FileContext {
            file_id: upload.file_id,
            filename: upload.filename,
        }
    }
}
