//! Credential stores.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::{debug, warn};

use crate::error::TransportError;
use crate::transport::AuthStore;

/// Token kept in memory for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryAuthStore {
    token: RwLock<Option<String>>,
}

impl MemoryAuthStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

impl AuthStore for MemoryAuthStore {
    fn token(&self) -> Option<String> {
        self.token.read().ok().and_then(|t| t.clone())
    }

    fn set_token(&self, token: &str) -> Result<(), TransportError> {
        let mut slot = self
            .token
            .write()
            .map_err(|e| TransportError::Io(std::io::Error::other(format!("token lock poisoned: {e}"))))?;
        *slot = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) {
        if let Ok(mut slot) = self.token.write() {
            *slot = None;
        }
    }
}

/// Token persisted to a file so sign-in survives restarts.
#[derive(Debug)]
pub struct FileAuthStore {
    path: PathBuf,
    cached: RwLock<Option<String>>,
}

impl FileAuthStore {
    /// Open the store at `path`, reading any token already saved there.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cached = match std::fs::read_to_string(&path) {
            Ok(contents) => {
                let token = contents.trim().to_string();
                (!token.is_empty()).then_some(token)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read saved token");
                None
            }
        };
        debug!(path = %path.display(), signed_in = cached.is_some(), "Auth store opened");
        Self {
            path,
            cached: RwLock::new(cached),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuthStore for FileAuthStore {
    fn token(&self) -> Option<String> {
        self.cached.read().ok().and_then(|t| t.clone())
    }

    fn set_token(&self, token: &str) -> Result<(), TransportError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, token)?;
        let mut slot = self
            .cached
            .write()
            .map_err(|e| TransportError::Io(std::io::Error::other(format!("token lock poisoned: {e}"))))?;
        *slot = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) {
        if let Ok(mut slot) = self.cached.write() {
            *slot = None;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Saved token removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to remove saved token"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store_set_and_clear() {
        let store = MemoryAuthStore::new();
        assert!(store.token().is_none());
        store.set_token("abc").unwrap();
        assert_eq!(store.token().as_deref(), Some("abc"));
        store.clear();
        assert!(store.token().is_none());
    }

    #[test]
    fn test_memory_store_with_token() {
        let store = MemoryAuthStore::with_token("xyz");
        assert_eq!(store.token().as_deref(), Some("xyz"));
    }

    #[test]
    fn test_file_store_persists_across_opens() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("token");

        let store = FileAuthStore::open(&path);
        assert!(store.token().is_none());
        store.set_token("secret-token").unwrap();
        assert!(path.exists());

        let reopened = FileAuthStore::open(&path);
        assert_eq!(reopened.token().as_deref(), Some("secret-token"));
    }

    #[test]
    fn test_file_store_clear_removes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("token");
        let store = FileAuthStore::open(&path);
        store.set_token("t").unwrap();
        store.clear();
        assert!(store.token().is_none());
        assert!(!path.exists());
        // Clearing twice is harmless.
        store.clear();
    }

    #[test]
    fn test_file_store_ignores_blank_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("token");
        std::fs::write(&path, "  \n").unwrap();
        assert!(FileAuthStore::open(&path).token().is_none());
    }
}
