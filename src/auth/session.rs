use super::storage::CredentialStore;
use crate::error::StorageError;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// The single owner of the bearer credential.
///
/// Every [`ApiClient`](crate::api::ApiClient) sharing a session sees the same
/// credential. The lock is only ever held for one store operation, never across
/// a request.
pub struct Session {
    store: Mutex<Box<dyn CredentialStore>>,
}

impl Session {
    pub fn new(store: impl CredentialStore + 'static) -> Self {
        Self {
            store: Mutex::new(Box::new(store)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Box<dyn CredentialStore>>, StorageError> {
        self.store.lock().map_err(|_| StorageError::Poisoned)
    }

    /// The current credential, if we have one.
    pub fn credential(&self) -> Result<Option<String>, StorageError> {
        self.lock()?.load()
    }

    /// Replaces the current credential.
    pub fn store(&self, token: &str) -> Result<(), StorageError> {
        self.lock()?.save(token)
    }

    /// Forgets the current credential.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.lock()?.remove()
    }

    /// Clears the credential after the server rejected `sent`.
    ///
    /// Only clears if the stored credential is still the one that was sent, so
    /// several requests failing together clear it once, and a token stored by a
    /// newer login survives a stale rejection. Returns whether anything was
    /// cleared.
    pub fn invalidate(&self, sent: Option<&str>) -> Result<bool, StorageError> {
        let mut store = self.lock()?;
        let current = store.load()?;
        if current.is_none() || current.as_deref() != sent {
            debug!("credential already replaced or cleared, leaving it alone");
            return Ok(false);
        }
        store.remove()?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryStore;

    #[test]
    fn invalidate_clears_matching_credential_once() {
        let session = Session::new(MemoryStore::with_token("abc"));
        assert!(session.invalidate(Some("abc")).unwrap());
        assert!(!session.invalidate(Some("abc")).unwrap());
        assert_eq!(session.credential().unwrap(), None);
    }

    #[test]
    fn invalidate_keeps_newer_credential() {
        let session = Session::new(MemoryStore::with_token("old"));
        session.store("new").unwrap();
        assert!(!session.invalidate(Some("old")).unwrap());
        assert_eq!(session.credential().unwrap().as_deref(), Some("new"));
    }

    #[test]
    fn invalidate_without_sent_credential_is_a_no_op() {
        let session = Session::new(MemoryStore::new());
        assert!(!session.invalidate(None).unwrap());
    }
}
