pub mod config;
pub mod error;
pub mod labels;
pub mod types;

pub use config::QuatuorConfig;
pub use error::{QuatuorError, Result};
pub use labels::UiLanguage;
pub use types::*;
