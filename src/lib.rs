//! Client for the housing service desk API.
//!
//! # Modules
//!
//! - [`api`]: the HTTP client, endpoint methods and request/response schemas
//! - [`auth`]: credential storage and the session that owns it
//! - [`config`]: configuration loading from the environment
//! - [`error`]: error types

pub mod api;
pub mod auth;
pub mod config;
pub mod error;

pub use api::{ApiClient, Reply};
pub use config::Config;
pub use error::{ApiError, Result};
