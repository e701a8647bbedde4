//! Conversation layer of the quatuor client.
//!
//! Sends messages to the backend in compare or single-provider mode, keeps
//! the display timeline, rebuilds it from persisted history, and manages
//! sessions and the uploaded-file context.

pub mod auth;
pub mod error;
pub mod history;
pub mod http;
pub mod orchestrator;
pub mod state;
pub mod transport;
pub mod wire;

pub use auth::{FileAuthStore, MemoryAuthStore};
pub use error::{ChatError, TransportError};
pub use history::reconstruct;
pub use http::HttpTransport;
pub use orchestrator::{
    ConversationOrchestrator, SendCompletion, HISTORY_FAILED_NOTICE, SEND_FAILED_NOTICE,
    SESSION_UPDATE_FAILED_NOTICE, UPLOAD_FAILED_NOTICE,
};
pub use state::ChatState;
pub use transport::{AuthStore, FileStore, Transport};
pub use wire::ChatRequest;
