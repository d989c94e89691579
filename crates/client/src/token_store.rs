//! Persisted bearer token.
//!
//! [`TokenStore`] wraps a [`TokenStorage`] backend and guarantees that
//! whatever it hands out is a structurally valid token in `Bearer <jwt>`
//! form. Anything invalid found in storage is removed on read.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use pitchcraft_core::token::BearerToken;

use crate::error::ClientError;

/// Raw string storage for a single token value.
pub trait TokenStorage: Send + Sync {
    fn load(&self) -> Result<Option<String>, ClientError>;
    fn save(&self, value: &str) -> Result<(), ClientError>;
    /// Remove the value. Removing an absent value succeeds.
    fn remove(&self) -> Result<(), ClientError>;
}

/// Process-local storage, lost on exit.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    value: Mutex<Option<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.value.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TokenStorage for MemoryStorage {
    fn load(&self) -> Result<Option<String>, ClientError> {
        Ok(self.slot().clone())
    }

    fn save(&self, value: &str) -> Result<(), ClientError> {
        *self.slot() = Some(value.to_string());
        Ok(())
    }

    fn remove(&self) -> Result<(), ClientError> {
        self.slot().take();
        Ok(())
    }
}

/// Storage in a single file that survives restarts.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TokenStorage for FileStorage {
    fn load(&self) -> Result<Option<String>, ClientError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let trimmed = contents.trim();
                Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, value: &str) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, value)?;
        Ok(())
    }

    fn remove(&self) -> Result<(), ClientError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Validated access to the persisted token. Cheap to clone; clones share
/// the same storage.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn TokenStorage>,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn TokenStorage>) -> Self {
        Self { storage }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// Validate and persist a token, adding the `Bearer ` prefix if missing.
    ///
    /// An invalid token clears whatever was stored before.
    pub fn set_token(&self, raw: &str) -> Result<BearerToken, ClientError> {
        let token = match BearerToken::parse(raw) {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "Rejected invalid token; clearing stored token");
                self.clear_token()?;
                return Err(e.into());
            }
        };
        self.storage.save(&token.header_value())?;
        Ok(token)
    }

    /// Read the stored token.
    ///
    /// Invalid values are removed and reported as absent. A valid value
    /// stored without its prefix is rewritten in normalized form.
    pub fn get_token(&self) -> Option<BearerToken> {
        let stored = match self.storage.load() {
            Ok(stored) => stored?,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read stored token");
                return None;
            }
        };

        match BearerToken::parse(&stored) {
            Ok(token) => {
                let normalized = token.header_value();
                if stored != normalized {
                    if let Err(e) = self.storage.save(&normalized) {
                        tracing::warn!(error = %e, "Failed to normalize stored token");
                    }
                }
                Some(token)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Stored token is invalid; clearing it");
                if let Err(e) = self.storage.remove() {
                    tracing::warn!(error = %e, "Failed to clear invalid token");
                }
                None
            }
        }
    }

    /// Remove the stored token. Idempotent.
    pub fn clear_token(&self) -> Result<(), ClientError> {
        self.storage.remove()
    }

    /// Remove the stored token only if it is still `expected`.
    ///
    /// Returns whether anything was removed. A token stored after `expected`
    /// was read is left in place.
    pub fn clear_token_if(&self, expected: &BearerToken) -> Result<bool, ClientError> {
        match self.get_token() {
            Some(current) if current == *expected => {
                self.storage.remove()?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const TOKEN: &str = "eyJhbGciOiJIUzI1NiJ9.eyJzdWIiOjF9.c2lnbmF0dXJl";

    fn store_with(storage: Arc<MemoryStorage>) -> TokenStore {
        TokenStore::new(storage)
    }

    #[test]
    fn set_then_get_adds_prefix() {
        let store = TokenStore::in_memory();
        store.set_token(TOKEN).unwrap();

        let token = store.get_token().unwrap();
        assert_eq!(token.header_value(), format!("Bearer {TOKEN}"));
    }

    #[test]
    fn prefixed_input_is_not_doubled() {
        let storage = Arc::new(MemoryStorage::new());
        let store = store_with(storage.clone());
        store.set_token(&format!("Bearer {TOKEN}")).unwrap();

        assert_eq!(storage.load().unwrap(), Some(format!("Bearer {TOKEN}")));
    }

    #[test]
    fn invalid_token_is_rejected_and_clears_existing() {
        let storage = Arc::new(MemoryStorage::new());
        let store = store_with(storage.clone());
        store.set_token(TOKEN).unwrap();

        assert_matches!(store.set_token("not-a-token"), Err(ClientError::InvalidToken(_)));
        assert_eq!(storage.load().unwrap(), None);
        assert!(store.get_token().is_none());
    }

    #[test]
    fn empty_token_is_rejected() {
        let store = TokenStore::in_memory();
        assert_matches!(store.set_token(""), Err(ClientError::InvalidToken(_)));
        assert!(store.get_token().is_none());
    }

    #[test]
    fn corrupt_stored_value_is_cleared_on_read() {
        let storage = Arc::new(MemoryStorage::new());
        storage.save("garbage").unwrap();
        let store = store_with(storage.clone());

        assert!(store.get_token().is_none());
        assert_eq!(storage.load().unwrap(), None);
    }

    #[test]
    fn unprefixed_stored_value_is_rewritten() {
        let storage = Arc::new(MemoryStorage::new());
        storage.save(TOKEN).unwrap();
        let store = store_with(storage.clone());

        assert!(store.get_token().is_some());
        assert_eq!(storage.load().unwrap(), Some(format!("Bearer {TOKEN}")));
    }

    #[test]
    fn clear_is_idempotent() {
        let store = TokenStore::in_memory();
        store.set_token(TOKEN).unwrap();
        store.clear_token().unwrap();
        store.clear_token().unwrap();
        assert!(store.get_token().is_none());
    }

    #[test]
    fn conditional_clear_keeps_a_replaced_token() {
        let store = TokenStore::in_memory();
        let old = store.set_token("old.old.old").unwrap();
        store.set_token(TOKEN).unwrap();

        assert!(!store.clear_token_if(&old).unwrap());
        assert_eq!(store.get_token().unwrap().raw(), TOKEN);

        let current = store.get_token().unwrap();
        assert!(store.clear_token_if(&current).unwrap());
        assert!(store.get_token().is_none());
    }

    #[test]
    fn file_storage_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth").join("token");

        TokenStore::new(Arc::new(FileStorage::new(&path)))
            .set_token(TOKEN)
            .unwrap();

        let reopened = TokenStore::new(Arc::new(FileStorage::new(&path)));
        assert_eq!(
            reopened.get_token().unwrap().header_value(),
            format!("Bearer {TOKEN}")
        );

        reopened.clear_token().unwrap();
        reopened.clear_token().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn file_storage_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("absent"));
        assert_eq!(storage.load().unwrap(), None);
    }
}
