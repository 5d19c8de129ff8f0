use crate::error::StorageError;
use keyring::Entry;

/// The fixed key our bearer token is stored under.
pub const TOKEN_KEY: &str = "auth_token";

/// Somewhere a single bearer token can live between runs.
pub trait CredentialStore: Send {
    /// Returns the stored token, or `None` if nothing is stored.
    fn load(&self) -> Result<Option<String>, StorageError>;
    /// Replaces whatever is stored with `token`.
    fn save(&mut self, token: &str) -> Result<(), StorageError>;
    /// Removes the stored token. Removing nothing is not an error.
    fn remove(&mut self) -> Result<(), StorageError>;
}

/// Keeps the token in the operating system's credential store.
pub struct KeyringStore {
    entry: Entry,
}

impl KeyringStore {
    /// Opens the keyring entry for `service`, filed under [`TOKEN_KEY`].
    pub fn new(service: &str) -> Result<Self, StorageError> {
        let entry = Entry::new(service, TOKEN_KEY)?;
        Ok(Self { entry })
    }
}

impl CredentialStore for KeyringStore {
    fn load(&self) -> Result<Option<String>, StorageError> {
        // A missing entry simply means we've never logged in.
        match self.entry.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&mut self, token: &str) -> Result<(), StorageError> {
        self.entry.set_password(token)?;
        Ok(())
    }

    fn remove(&mut self) -> Result<(), StorageError> {
        match self.entry.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Keeps the token for the lifetime of the process only.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    token: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `token`.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }
}

impl CredentialStore for MemoryStore {
    fn load(&self) -> Result<Option<String>, StorageError> {
        Ok(self.token.clone())
    }

    fn save(&mut self, token: &str) -> Result<(), StorageError> {
        self.token = Some(token.to_string());
        Ok(())
    }

    fn remove(&mut self) -> Result<(), StorageError> {
        self.token = None;
        Ok(())
    }
}
