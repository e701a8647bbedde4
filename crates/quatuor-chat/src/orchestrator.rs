//! Conversation orchestrator: sending, session lifecycle and file context.
//!
//! Operations take the [`ChatState`] explicitly. Sending is split into
//! [`begin_send`], [`dispatch`] and [`complete_send`] so an event loop can
//! run the network call in the background while keeping the state on its
//! own task; [`send`] chains the three.
//!
//! Backend failures never escape as panics or lost state: they are recorded
//! in the timeline as `System` notices and returned to the caller.
//!
//! [`begin_send`]: ConversationOrchestrator::begin_send
//! [`dispatch`]: ConversationOrchestrator::dispatch
//! [`complete_send`]: ConversationOrchestrator::complete_send
//! [`send`]: ConversationOrchestrator::send

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use quatuor_core::{
    ChatMode, DisplayMessage, FileContext, ReplyRecord, SessionId, SessionSummary, UiLanguage,
};
use quatuor_speech::Speaker;

use crate::error::{ChatError, TransportError};
use crate::history::{reconstruct, reply_message};
use crate::state::ChatState;
use crate::transport::{FileStore, Transport};
use crate::wire::ChatRequest;

pub const SEND_FAILED_NOTICE: &str = "Error sending message. Check your API keys in the backend.";
pub const HISTORY_FAILED_NOTICE: &str = "Error loading this conversation. Please try again.";
pub const SESSION_UPDATE_FAILED_NOTICE: &str = "Error updating conversations. Please try again.";
pub const UPLOAD_FAILED_NOTICE: &str = "Error uploading the file. Please try again.";

/// Display name of a loaded session whose turns carry no name.
const FALLBACK_SESSION_NAME: &str = "Conversation";

/// Result of a dispatched send, applied to the state by
/// [`ConversationOrchestrator::complete_send`].
#[derive(Debug)]
pub struct SendCompletion {
    pub request: ChatRequest,
    pub result: Result<ReplyRecord, TransportError>,
    /// Session list fetched after a successful send, when available.
    pub sessions: Option<Vec<SessionSummary>>,
}

#[derive(Clone)]
pub struct ConversationOrchestrator {
    transport: Arc<dyn Transport>,
    files: Option<Arc<dyn FileStore>>,
}

impl ConversationOrchestrator {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            files: None,
        }
    }

    pub fn with_file_store(mut self, files: Arc<dyn FileStore>) -> Self {
        self.files = Some(files);
        self
    }

    // -- Sending --

    /// Validate and record an outgoing message.
    ///
    /// Rejects blank messages and a second send while one is outstanding,
    /// leaving the state untouched. Otherwise marks the state busy, appends
    /// the user message and returns the request to dispatch.
    pub fn begin_send(
        &self,
        state: &mut ChatState,
        message: &str,
        mode: ChatMode,
    ) -> Result<ChatRequest, ChatError> {
        if message.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if state.busy {
            debug!(session = %state.session_id, "Send already in flight; rejected");
            return Err(ChatError::Busy);
        }

        state.busy = true;
        state.timeline.push(DisplayMessage::User {
            text: message.to_string(),
            timestamp: Utc::now(),
        });
        Ok(ChatRequest {
            session_id: state.session_id.clone(),
            session_name: state.session_name.clone(),
            message: message.to_string(),
            mode,
            file_id: state.file_context.as_ref().map(|f| f.file_id.clone()),
        })
    }

    /// Perform the network side of a send. Touches no state.
    pub async fn dispatch(&self, request: ChatRequest) -> SendCompletion {
        info!(session = %request.session_id, mode = %request.mode, "Sending message");
        let result = self.transport.send_chat(&request).await;
        let sessions = match &result {
            Ok(_) => match self.transport.list_sessions().await {
                Ok(sessions) => Some(sessions),
                Err(e) => {
                    warn!(error = %e, "Failed to refresh sessions after send");
                    None
                }
            },
            Err(e) => {
                warn!(session = %request.session_id, error = %e, "Send failed");
                None
            }
        };
        SendCompletion {
            request,
            result,
            sessions,
        }
    }

    /// Apply a send result: append the reply or the failure notice, clear
    /// the busy flag, and read the reply aloud when speech is enabled.
    ///
    /// A reply for a session that is no longer active is not displayed.
    pub fn complete_send(
        &self,
        state: &mut ChatState,
        speaker: &mut dyn Speaker,
        completion: SendCompletion,
    ) -> Result<ReplyRecord, ChatError> {
        state.busy = false;
        if let Some(sessions) = completion.sessions {
            state.sessions = sessions;
        }
        let active = completion.request.session_id == state.session_id;

        match completion.result {
            Ok(reply) => {
                if !active {
                    debug!(session = %completion.request.session_id, "Reply for inactive session dropped");
                    return Ok(reply);
                }
                state.timeline.push(reply_message(&reply, Utc::now()));
                if speaker.speech_enabled() {
                    if let Some(text) = reply.primary_text() {
                        speaker.speak_reply(text);
                    }
                }
                Ok(reply)
            }
            Err(e) => {
                if active {
                    state.push_notice(SEND_FAILED_NOTICE);
                }
                Err(e.into())
            }
        }
    }

    /// Send a message and wait for the reply.
    pub async fn send(
        &self,
        state: &mut ChatState,
        speaker: &mut dyn Speaker,
        message: &str,
        mode: ChatMode,
    ) -> Result<ReplyRecord, ChatError> {
        let request = self.begin_send(state, message, mode)?;
        let completion = self.dispatch(request).await;
        self.complete_send(state, speaker, completion)
    }

    // -- Sessions --

    /// Switch to a fresh, empty session. The file context is kept.
    pub fn new_session(&self, state: &mut ChatState) {
        state.session_id = SessionId::mint(Utc::now());
        state.session_name = state.language.new_conversation_label().to_string();
        state.timeline.clear();
        info!(session = %state.session_id, "New session");
    }

    /// Replace the timeline with a session's persisted history.
    pub async fn load_session(
        &self,
        state: &mut ChatState,
        session_id: &SessionId,
    ) -> Result<(), ChatError> {
        let turns = match self.transport.get_history(session_id).await {
            Ok(turns) => turns,
            Err(e) => {
                warn!(session = %session_id, error = %e, "Failed to load history");
                state.push_notice(HISTORY_FAILED_NOTICE);
                return Err(e.into());
            }
        };

        state.timeline = reconstruct(&turns);
        state.session_id = session_id.clone();
        state.session_name = turns
            .first()
            .and_then(|t| t.session_name.as_deref())
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(FALLBACK_SESSION_NAME)
            .to_string();
        state.session_panel_open = false;
        info!(session = %session_id, turns = turns.len(), "Session loaded");
        Ok(())
    }

    /// Delete a session; the active session is replaced by a fresh one.
    pub async fn delete_session(
        &self,
        state: &mut ChatState,
        session_id: &SessionId,
    ) -> Result<(), ChatError> {
        if let Err(e) = self.transport.delete_session(session_id).await {
            warn!(session = %session_id, error = %e, "Failed to delete session");
            state.push_notice(SESSION_UPDATE_FAILED_NOTICE);
            return Err(e.into());
        }
        info!(session = %session_id, "Session deleted");

        state.sessions.retain(|s| &s.session_id != session_id);
        if let Err(e) = self.refresh_sessions(state).await {
            debug!(error = %e, "Session list left as is after delete");
        }
        if &state.session_id == session_id {
            self.new_session(state);
        }
        Ok(())
    }

    /// Rename a session on the backend and in the local state.
    pub async fn rename_session(
        &self,
        state: &mut ChatState,
        session_id: &SessionId,
        name: &str,
    ) -> Result<(), ChatError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ChatError::EmptyName);
        }
        if let Err(e) = self.transport.rename_session(session_id, name).await {
            warn!(session = %session_id, error = %e, "Failed to rename session");
            state.push_notice(SESSION_UPDATE_FAILED_NOTICE);
            return Err(e.into());
        }

        if let Some(summary) = state
            .sessions
            .iter_mut()
            .find(|s| &s.session_id == session_id)
        {
            summary.session_name = name.to_string();
        }
        if &state.session_id == session_id {
            state.session_name = name.to_string();
        }
        info!(session = %session_id, "Session renamed");
        Ok(())
    }

    /// Reload the session list. Failures leave the current list in place.
    pub async fn refresh_sessions(&self, state: &mut ChatState) -> Result<(), ChatError> {
        match self.transport.list_sessions().await {
            Ok(sessions) => {
                debug!(count = sessions.len(), "Session list refreshed");
                state.sessions = sessions;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Failed to list sessions");
                Err(e.into())
            }
        }
    }

    pub fn toggle_session_panel(&self, state: &mut ChatState) -> bool {
        state.session_panel_open = !state.session_panel_open;
        state.session_panel_open
    }

    // -- File context --

    /// Upload a file and bind it as context, replacing any previous file.
    pub async fn attach_file(
        &self,
        state: &mut ChatState,
        path: &Path,
    ) -> Result<FileContext, ChatError> {
        let Some(files) = self.files.as_ref() else {
            return Err(ChatError::UploadUnavailable);
        };
        match files.upload(path).await {
            Ok(context) => {
                info!(file_id = %context.file_id, filename = %context.filename, "File attached");
                state.file_context = Some(context.clone());
                Ok(context)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Upload failed");
                state.push_notice(UPLOAD_FAILED_NOTICE);
                Err(e.into())
            }
        }
    }

    pub fn clear_file(&self, state: &mut ChatState) -> Option<FileContext> {
        let removed = state.file_context.take();
        if let Some(file) = &removed {
            info!(file_id = %file.file_id, "File context cleared");
        }
        removed
    }

    // -- Preferences --

    pub fn set_mode(&self, state: &mut ChatState, mode: ChatMode) {
        debug!(mode = %mode, "Chat mode changed");
        state.mode = mode;
    }

    /// Switch interface language. An untouched session picks up the new
    /// "new conversation" label.
    pub fn set_language(&self, state: &mut ChatState, language: UiLanguage) {
        if state.session_name == state.language.new_conversation_label() {
            state.session_name = language.new_conversation_label().to_string();
        }
        state.language = language;
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use quatuor_core::{Provider, ProviderAnswer, ProviderAnswers, Turn};
    use std::path::PathBuf;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeTransport {
        reply: Option<ReplyRecord>,
        history: Option<Vec<Turn>>,
        sessions: Vec<SessionSummary>,
        fail_list: bool,
        fail_delete: bool,
        fail_rename: bool,
        requests: Mutex<Vec<ChatRequest>>,
        deleted: Mutex<Vec<SessionId>>,
        renamed: Mutex<Vec<(SessionId, String)>>,
    }

    fn backend_down() -> TransportError {
        TransportError::Http {
            status: 500,
            body: "internal error".into(),
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn send_chat(&self, request: &ChatRequest) -> Result<ReplyRecord, TransportError> {
            self.requests.lock().unwrap().push(request.clone());
            self.reply.clone().ok_or_else(backend_down)
        }

        async fn list_sessions(&self) -> Result<Vec<SessionSummary>, TransportError> {
            if self.fail_list {
                return Err(TransportError::Network("connection reset".into()));
            }
            Ok(self.sessions.clone())
        }

        async fn get_history(&self, _id: &SessionId) -> Result<Vec<Turn>, TransportError> {
            self.history.clone().ok_or_else(backend_down)
        }

        async fn rename_session(&self, id: &SessionId, name: &str) -> Result<(), TransportError> {
            if self.fail_rename {
                return Err(backend_down());
            }
            self.renamed.lock().unwrap().push((id.clone(), name.to_string()));
            Ok(())
        }

        async fn delete_session(&self, id: &SessionId) -> Result<(), TransportError> {
            if self.fail_delete {
                return Err(backend_down());
            }
            self.deleted.lock().unwrap().push(id.clone());
            Ok(())
        }
    }

    struct FakeFiles {
        fail: bool,
    }

    #[async_trait]
    impl FileStore for FakeFiles {
        async fn upload(&self, path: &Path) -> Result<FileContext, TransportError> {
            if self.fail {
                return Err(backend_down());
            }
            Ok(FileContext {
                file_id: "file-1".into(),
                filename: path.file_name().unwrap().to_string_lossy().into_owned(),
            })
        }
    }

    #[derive(Default)]
    struct RecordingSpeaker {
        disabled: bool,
        spoken: Vec<String>,
    }

    impl Speaker for RecordingSpeaker {
        fn speech_enabled(&self) -> bool {
            !self.disabled
        }

        fn speak_reply(&mut self, text: &str) {
            self.spoken.push(text.to_string());
        }
    }

    fn orchestrator(transport: FakeTransport) -> (ConversationOrchestrator, Arc<FakeTransport>) {
        let transport = Arc::new(transport);
        (ConversationOrchestrator::new(transport.clone()), transport)
    }

    fn summary(id: &str, name: &str) -> SessionSummary {
        let ts = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        SessionSummary {
            session_id: SessionId::new(id),
            session_name: name.into(),
            created_at: ts,
            updated_at: ts,
            message_count: 2,
        }
    }

    fn stored_turn(name: Option<&str>, mode: Option<ChatMode>) -> Turn {
        Turn {
            id: "t1".into(),
            session_id: SessionId::new("session-old"),
            session_name: name.map(String::from),
            message: "earlier question".into(),
            mode,
            answers: ProviderAnswers {
                claude: ProviderAnswer::new("earlier answer", 1.0),
                ..Default::default()
            },
            sources: vec![],
            timestamp: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        }
    }

    fn gemini_reply() -> ReplyRecord {
        ReplyRecord::Single {
            provider: Provider::Gemini,
            answer: ProviderAnswer::new("Hi!", 1.2),
            sources: vec![],
        }
    }

    // ---- Sending ----

    #[tokio::test]
    async fn test_send_single_provider() {
        let (orch, transport) = orchestrator(FakeTransport {
            reply: Some(gemini_reply()),
            sessions: vec![summary("s1", "Hello")],
            ..Default::default()
        });
        let mut state = ChatState::default();
        let mut speaker = RecordingSpeaker::default();

        let reply = orch
            .send(&mut state, &mut speaker, "Hello", ChatMode::Single(Provider::Gemini))
            .await
            .unwrap();
        assert_eq!(reply, gemini_reply());

        assert_eq!(state.timeline.len(), 2);
        match &state.timeline[0] {
            DisplayMessage::User { text, .. } => assert_eq!(text, "Hello"),
            other => panic!("expected user message, got {other:?}"),
        }
        match &state.timeline[1] {
            DisplayMessage::AiSingle {
                text,
                provider,
                response_time,
                ..
            } => {
                assert_eq!(text, "Hi!");
                assert_eq!(*provider, Provider::Gemini);
                assert_eq!(*response_time, Some(1.2));
            }
            other => panic!("expected ai-single, got {other:?}"),
        }
        assert!(!state.is_busy());
        assert_eq!(speaker.spoken, vec!["Hi!"]);
        assert_eq!(state.sessions.len(), 1);

        let requests = transport.requests.lock().unwrap();
        assert_eq!(requests[0].mode, ChatMode::Single(Provider::Gemini));
        assert_eq!(requests[0].session_id, state.session_id);
    }

    #[tokio::test]
    async fn test_send_single_without_text_still_appends_reply() {
        let (orch, _) = orchestrator(FakeTransport {
            reply: Some(ReplyRecord::Single {
                provider: Provider::Gemini,
                answer: ProviderAnswer {
                    text: None,
                    response_time: Some(0.3),
                },
                sources: vec![],
            }),
            ..Default::default()
        });
        let mut state = ChatState::default();
        let mut speaker = RecordingSpeaker::default();

        orch.send(&mut state, &mut speaker, "Hello", ChatMode::Single(Provider::Gemini))
            .await
            .unwrap();

        let kinds: Vec<_> = state.timeline.iter().map(|m| m.kind()).collect();
        assert_eq!(kinds, vec!["user", "ai-single"]);
        match &state.timeline[1] {
            DisplayMessage::AiSingle {
                text,
                response_time,
                ..
            } => {
                assert!(text.is_empty());
                assert_eq!(*response_time, Some(0.3));
            }
            other => panic!("expected ai-single, got {other:?}"),
        }
        assert!(speaker.spoken.is_empty());
    }

    #[tokio::test]
    async fn test_send_keeps_message_as_typed() {
        let (orch, transport) = orchestrator(FakeTransport {
            reply: Some(gemini_reply()),
            ..Default::default()
        });
        let mut state = ChatState::default();
        let mut speaker = RecordingSpeaker::default();

        orch.send(&mut state, &mut speaker, "  Hello\n", ChatMode::Single(Provider::Gemini))
            .await
            .unwrap();

        match &state.timeline[0] {
            DisplayMessage::User { text, .. } => assert_eq!(text, "  Hello\n"),
            other => panic!("expected user message, got {other:?}"),
        }
        assert_eq!(transport.requests.lock().unwrap()[0].message, "  Hello\n");
    }

    #[tokio::test]
    async fn test_send_failure_appends_one_notice() {
        let (orch, _) = orchestrator(FakeTransport::default());
        let mut state = ChatState::default();
        let mut speaker = RecordingSpeaker::default();

        let result = orch
            .send(&mut state, &mut speaker, "Hello", ChatMode::Compare)
            .await;
        assert!(matches!(result, Err(ChatError::Transport(_))));

        let notices: Vec<_> = state
            .timeline
            .iter()
            .filter_map(|m| match m {
                DisplayMessage::System { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(notices, vec![SEND_FAILED_NOTICE]);
        assert_eq!(state.timeline.len(), 2);
        assert!(!state.is_busy());
        assert!(speaker.spoken.is_empty());
    }

    #[tokio::test]
    async fn test_compare_speaks_first_non_empty_in_priority_order() {
        let answers = ProviderAnswers {
            chatgpt: ProviderAnswer::new("", 0.1),
            gemini: ProviderAnswer::default(),
            deepseek: ProviderAnswer::new("from deepseek", 2.0),
            claude: ProviderAnswer::new("from claude", 1.0),
        };
        let (orch, _) = orchestrator(FakeTransport {
            reply: Some(ReplyRecord::Compare {
                answers: answers.clone(),
            }),
            ..Default::default()
        });
        let mut state = ChatState::default();
        let mut speaker = RecordingSpeaker::default();

        orch.send(&mut state, &mut speaker, "Compare this", ChatMode::Compare)
            .await
            .unwrap();
        match &state.timeline[1] {
            DisplayMessage::AiCompare { answers: shown, .. } => assert_eq!(shown, &answers),
            other => panic!("expected ai-compare, got {other:?}"),
        }
        assert_eq!(speaker.spoken, vec!["from deepseek"]);
    }

    #[tokio::test]
    async fn test_speech_disabled_does_not_speak() {
        let (orch, _) = orchestrator(FakeTransport {
            reply: Some(gemini_reply()),
            ..Default::default()
        });
        let mut state = ChatState::default();
        let mut speaker = RecordingSpeaker {
            disabled: true,
            ..Default::default()
        };
        orch.send(&mut state, &mut speaker, "Hello", ChatMode::Single(Provider::Gemini))
            .await
            .unwrap();
        assert!(speaker.spoken.is_empty());
    }

    #[tokio::test]
    async fn test_blank_message_is_noop() {
        let (orch, transport) = orchestrator(FakeTransport::default());
        let mut state = ChatState::default();
        let mut speaker = RecordingSpeaker::default();

        let result = orch
            .send(&mut state, &mut speaker, "   \n\t", ChatMode::Compare)
            .await;
        assert!(matches!(result, Err(ChatError::EmptyMessage)));
        assert!(state.timeline.is_empty());
        assert!(!state.is_busy());
        assert!(transport.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_single_flight() {
        let (orch, transport) = orchestrator(FakeTransport {
            reply: Some(gemini_reply()),
            ..Default::default()
        });
        let mut state = ChatState::default();
        let mut speaker = RecordingSpeaker::default();

        let request = orch
            .begin_send(&mut state, "first", ChatMode::Compare)
            .unwrap();
        assert!(state.is_busy());

        let second = orch.begin_send(&mut state, "second", ChatMode::Compare);
        assert!(matches!(second, Err(ChatError::Busy)));
        assert_eq!(state.timeline.len(), 1);

        let completion = orch.dispatch(request).await;
        orch.complete_send(&mut state, &mut speaker, completion).unwrap();
        assert!(!state.is_busy());
        assert_eq!(transport.requests.lock().unwrap().len(), 1);

        // A new send is accepted once the first completed.
        assert!(orch.begin_send(&mut state, "third", ChatMode::Compare).is_ok());
    }

    #[tokio::test]
    async fn test_send_includes_file_context() {
        let (orch, transport) = orchestrator(FakeTransport {
            reply: Some(gemini_reply()),
            ..Default::default()
        });
        let mut state = ChatState::default();
        state.file_context = Some(FileContext {
            file_id: "file-42".into(),
            filename: "report.pdf".into(),
        });
        let mut speaker = RecordingSpeaker::default();
        orch.send(&mut state, &mut speaker, "summarize", ChatMode::Single(Provider::Gemini))
            .await
            .unwrap();
        let requests = transport.requests.lock().unwrap();
        assert_eq!(requests[0].file_id.as_deref(), Some("file-42"));
    }

    #[tokio::test]
    async fn test_reply_for_abandoned_session_is_dropped() {
        let (orch, _) = orchestrator(FakeTransport {
            reply: Some(gemini_reply()),
            ..Default::default()
        });
        let mut state = ChatState::default();
        let mut speaker = RecordingSpeaker::default();

        let request = orch.begin_send(&mut state, "Hello", ChatMode::Compare).unwrap();
        let completion = orch.dispatch(request).await;
        state.session_id = SessionId::new("session-other");
        state.timeline.clear();

        orch.complete_send(&mut state, &mut speaker, completion).unwrap();
        assert!(state.timeline.is_empty());
        assert!(!state.is_busy());
        assert!(speaker.spoken.is_empty());
    }

    #[tokio::test]
    async fn test_list_failure_after_send_is_not_surfaced() {
        let (orch, _) = orchestrator(FakeTransport {
            reply: Some(gemini_reply()),
            fail_list: true,
            ..Default::default()
        });
        let mut state = ChatState::default();
        let mut speaker = RecordingSpeaker::default();
        assert!(orch
            .send(&mut state, &mut speaker, "Hello", ChatMode::Single(Provider::Gemini))
            .await
            .is_ok());
        assert!(state.timeline.iter().all(|m| m.kind() != "system"));
    }

    // ---- Session lifecycle ----

    #[test]
    fn test_new_session_resets_timeline_keeps_file() {
        let (orch, _) = orchestrator(FakeTransport::default());
        let mut state = ChatState::new(UiLanguage::De, ChatMode::Compare);
        state.session_id = SessionId::new("session-old");
        state.session_name = "Old".into();
        state.timeline.push(DisplayMessage::User {
            text: "hi".into(),
            timestamp: Utc::now(),
        });
        state.file_context = Some(FileContext {
            file_id: "f".into(),
            filename: "a.txt".into(),
        });

        orch.new_session(&mut state);
        assert_ne!(state.session_id, SessionId::new("session-old"));
        assert!(state.session_id.as_str().starts_with("session-"));
        assert_eq!(state.session_name, "Neues Gespräch");
        assert!(state.timeline.is_empty());
        assert!(state.file_context.is_some());
    }

    #[tokio::test]
    async fn test_load_session_reconstructs_and_names() {
        let (orch, _) = orchestrator(FakeTransport {
            history: Some(vec![stored_turn(
                Some("Weekend plans"),
                Some(ChatMode::Single(Provider::Claude)),
            )]),
            ..Default::default()
        });
        let mut state = ChatState::default();
        state.session_panel_open = true;
        let id = SessionId::new("session-old");

        orch.load_session(&mut state, &id).await.unwrap();
        assert_eq!(state.session_id, id);
        assert_eq!(state.session_name, "Weekend plans");
        assert_eq!(state.timeline.len(), 2);
        assert!(!state.session_panel_open);
    }

    #[tokio::test]
    async fn test_load_session_fallback_name() {
        let (orch, _) = orchestrator(FakeTransport {
            history: Some(vec![stored_turn(None, None)]),
            ..Default::default()
        });
        let mut state = ChatState::default();
        orch.load_session(&mut state, &SessionId::new("session-old"))
            .await
            .unwrap();
        assert_eq!(state.session_name, "Conversation");
        // Unknown mode: only the user message.
        assert_eq!(state.timeline.len(), 1);
    }

    #[tokio::test]
    async fn test_load_empty_session_uses_fallback_name() {
        let (orch, _) = orchestrator(FakeTransport {
            history: Some(vec![]),
            ..Default::default()
        });
        let mut state = ChatState::default();
        orch.load_session(&mut state, &SessionId::new("session-empty"))
            .await
            .unwrap();
        assert_eq!(state.session_name, "Conversation");
        assert!(state.timeline.is_empty());
    }

    #[tokio::test]
    async fn test_load_failure_keeps_state() {
        let (orch, _) = orchestrator(FakeTransport::default());
        let mut state = ChatState::default();
        let before_id = state.session_id.clone();
        let before_name = state.session_name.clone();

        let result = orch
            .load_session(&mut state, &SessionId::new("session-old"))
            .await;
        assert!(result.is_err());
        assert_eq!(state.session_id, before_id);
        assert_eq!(state.session_name, before_name);
        assert_eq!(state.timeline.len(), 1);
        assert_eq!(state.timeline[0].kind(), "system");
    }

    #[tokio::test]
    async fn test_delete_active_session_starts_new_one() {
        let (orch, transport) = orchestrator(FakeTransport {
            sessions: vec![summary("session-b", "B")],
            ..Default::default()
        });
        let mut state = ChatState::default();
        state.session_id = SessionId::new("session-a");
        state.timeline.push(DisplayMessage::User {
            text: "hi".into(),
            timestamp: Utc::now(),
        });

        orch.delete_session(&mut state, &SessionId::new("session-a"))
            .await
            .unwrap();
        assert_ne!(state.session_id, SessionId::new("session-a"));
        assert!(state.timeline.is_empty());
        assert_eq!(state.sessions.len(), 1);
        assert_eq!(
            transport.deleted.lock().unwrap().as_slice(),
            &[SessionId::new("session-a")]
        );
    }

    #[tokio::test]
    async fn test_delete_other_session_keeps_active() {
        let (orch, _) = orchestrator(FakeTransport::default());
        let mut state = ChatState::default();
        let active = state.session_id.clone();
        state.timeline.push(DisplayMessage::User {
            text: "hi".into(),
            timestamp: Utc::now(),
        });

        orch.delete_session(&mut state, &SessionId::new("session-x"))
            .await
            .unwrap();
        assert_eq!(state.session_id, active);
        assert_eq!(state.timeline.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_failure_appends_notice() {
        let (orch, _) = orchestrator(FakeTransport {
            fail_delete: true,
            ..Default::default()
        });
        let mut state = ChatState::default();
        let active = state.session_id.clone();
        assert!(orch.delete_session(&mut state, &active).await.is_err());
        assert_eq!(state.session_id, active);
        match &state.timeline[0] {
            DisplayMessage::System { text, .. } => assert_eq!(text, SESSION_UPDATE_FAILED_NOTICE),
            other => panic!("expected notice, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rename_active_session() {
        let (orch, transport) = orchestrator(FakeTransport::default());
        let mut state = ChatState::default();
        let active = state.session_id.clone();
        state.sessions = vec![summary(active.as_str(), "New conversation")];

        orch.rename_session(&mut state, &active, "  Holidays  ")
            .await
            .unwrap();
        assert_eq!(state.session_name, "Holidays");
        assert_eq!(state.sessions[0].session_name, "Holidays");
        assert_eq!(transport.renamed.lock().unwrap()[0].1, "Holidays");
    }

    #[tokio::test]
    async fn test_rename_rejects_blank_name() {
        let (orch, _) = orchestrator(FakeTransport::default());
        let mut state = ChatState::default();
        let active = state.session_id.clone();
        let result = orch.rename_session(&mut state, &active, "   ").await;
        assert!(matches!(result, Err(ChatError::EmptyName)));
    }

    #[tokio::test]
    async fn test_rename_failure_appends_notice() {
        let (orch, _) = orchestrator(FakeTransport {
            fail_rename: true,
            ..Default::default()
        });
        let mut state = ChatState::default();
        let active = state.session_id.clone();
        let before = state.session_name.clone();
        assert!(orch.rename_session(&mut state, &active, "X").await.is_err());
        assert_eq!(state.session_name, before);
        assert_eq!(state.timeline[0].kind(), "system");
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_list() {
        let (orch, _) = orchestrator(FakeTransport {
            fail_list: true,
            ..Default::default()
        });
        let mut state = ChatState::default();
        state.sessions = vec![summary("s1", "One")];
        assert!(orch.refresh_sessions(&mut state).await.is_err());
        assert_eq!(state.sessions.len(), 1);
    }

    #[test]
    fn test_toggle_session_panel() {
        let (orch, _) = orchestrator(FakeTransport::default());
        let mut state = ChatState::default();
        assert!(orch.toggle_session_panel(&mut state));
        assert!(!orch.toggle_session_panel(&mut state));
    }

    // ---- File context ----

    #[tokio::test]
    async fn test_attach_and_clear_file() {
        let orch = ConversationOrchestrator::new(Arc::new(FakeTransport::default()))
            .with_file_store(Arc::new(FakeFiles { fail: false }));
        let mut state = ChatState::default();

        let ctx = orch
            .attach_file(&mut state, &PathBuf::from("/tmp/report.pdf"))
            .await
            .unwrap();
        assert_eq!(ctx.filename, "report.pdf");
        assert_eq!(state.file_context, Some(ctx.clone()));

        assert_eq!(orch.clear_file(&mut state), Some(ctx));
        assert!(state.file_context.is_none());
        assert!(orch.clear_file(&mut state).is_none());
    }

    #[tokio::test]
    async fn test_attach_failure_keeps_previous_file() {
        let orch = ConversationOrchestrator::new(Arc::new(FakeTransport::default()))
            .with_file_store(Arc::new(FakeFiles { fail: true }));
        let mut state = ChatState::default();
        let previous = FileContext {
            file_id: "old".into(),
            filename: "old.txt".into(),
        };
        state.file_context = Some(previous.clone());

        assert!(orch
            .attach_file(&mut state, Path::new("/tmp/new.pdf"))
            .await
            .is_err());
        assert_eq!(state.file_context, Some(previous));
        assert_eq!(state.timeline[0].kind(), "system");
    }

    #[tokio::test]
    async fn test_attach_without_file_store() {
        let (orch, _) = orchestrator(FakeTransport::default());
        let mut state = ChatState::default();
        let result = orch.attach_file(&mut state, Path::new("/tmp/a.txt")).await;
        assert!(matches!(result, Err(ChatError::UploadUnavailable)));
    }

    // ---- Preferences ----

    #[test]
    fn test_set_language_relabels_untouched_session() {
        let (orch, _) = orchestrator(FakeTransport::default());
        let mut state = ChatState::new(UiLanguage::En, ChatMode::Compare);
        orch.set_language(&mut state, UiLanguage::Fr);
        assert_eq!(state.session_name, "Nouvelle conversation");

        state.session_name = "Recettes".into();
        orch.set_language(&mut state, UiLanguage::De);
        assert_eq!(state.session_name, "Recettes");
        assert_eq!(state.language, UiLanguage::De);
    }

    #[test]
    fn test_set_mode() {
        let (orch, _) = orchestrator(FakeTransport::default());
        let mut state = ChatState::default();
        orch.set_mode(&mut state, ChatMode::Single(Provider::DeepSeek));
        assert_eq!(state.mode, ChatMode::Single(Provider::DeepSeek));
    }
}
