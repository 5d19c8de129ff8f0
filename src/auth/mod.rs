//! Credential ownership: where the bearer token lives and who may change it.

mod claims;
mod session;
mod storage;

pub use claims::{decode_claims, TokenClaims};
pub use session::Session;
pub use storage::{CredentialStore, KeyringStore, MemoryStore, TOKEN_KEY};
