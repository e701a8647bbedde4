//! Application state owned by the UI and passed into every conversation
//! operation.

use chrono::Utc;
use serde::Serialize;

use quatuor_core::{
    ChatMode, DisplayMessage, FileContext, SessionId, SessionSummary, UiLanguage,
};

#[derive(Debug, Clone, Serialize)]
pub struct ChatState {
    /// Identifier all sends go to.
    pub session_id: SessionId,
    pub session_name: String,
    pub timeline: Vec<DisplayMessage>,
    /// Uploaded file bound as context for subsequent sends.
    pub file_context: Option<FileContext>,
    pub sessions: Vec<SessionSummary>,
    pub session_panel_open: bool,
    pub language: UiLanguage,
    pub mode: ChatMode,
    pub(crate) busy: bool,
}

impl ChatState {
    /// Fresh state with a newly minted, unnamed session.
    pub fn new(language: UiLanguage, mode: ChatMode) -> Self {
        Self {
            session_id: SessionId::mint(Utc::now()),
            session_name: language.new_conversation_label().to_string(),
            timeline: Vec::new(),
            file_context: None,
            sessions: Vec::new(),
            session_panel_open: false,
            language,
            mode,
            busy: false,
        }
    }

    /// Whether a send is outstanding. The UI disables submission while set.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub(crate) fn push_notice(&mut self, text: &str) {
        self.timeline.push(DisplayMessage::System {
            text: text.to_string(),
            timestamp: Utc::now(),
        });
    }
}

impl Default for ChatState {
    fn default() -> Self {
        Self::new(UiLanguage::default(), ChatMode::default())
    }
}
