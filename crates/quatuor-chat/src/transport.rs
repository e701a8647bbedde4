//! Contracts for the backend collaborators of the conversation layer.

use std::path::Path;

use async_trait::async_trait;

use quatuor_core::{FileContext, ReplyRecord, SessionId, SessionSummary, Turn};

use crate::error::TransportError;
use crate::wire::ChatRequest;

/// Chat and session operations against the backend.
///
/// Implementations attach the bearer credential from an [`AuthStore`] and
/// never retry.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_chat(&self, request: &ChatRequest) -> Result<ReplyRecord, TransportError>;

    /// Sessions of the signed-in user, most recently updated first.
    async fn list_sessions(&self) -> Result<Vec<SessionSummary>, TransportError>;

    /// Persisted turns of a session in chronological order.
    async fn get_history(&self, session_id: &SessionId) -> Result<Vec<Turn>, TransportError>;

    async fn rename_session(
        &self,
        session_id: &SessionId,
        name: &str,
    ) -> Result<(), TransportError>;

    async fn delete_session(&self, session_id: &SessionId) -> Result<(), TransportError>;
}

/// Holder of the bearer credential.
pub trait AuthStore: Send + Sync {
    fn token(&self) -> Option<String>;
    fn set_token(&self, token: &str) -> Result<(), TransportError>;
    fn clear(&self);
}

/// Upload of documents used as conversation context.
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn upload(&self, path: &Path) -> Result<FileContext, TransportError>;
}
