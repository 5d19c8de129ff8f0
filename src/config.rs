//! Configuration loaded from `ZKH_`-prefixed environment variables.

use serde::Deserialize;
use url::Url;

/// Runtime settings for the client and CLI.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Root of the service desk API, without a trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Where callers should send the user after the session expires.
    #[serde(default = "default_landing_path")]
    pub landing_path: String,

    /// Keyring service name the credential is filed under.
    #[serde(default = "default_keyring_service")]
    pub keyring_service: String,

    /// Keep the credential in memory only.
    #[serde(default)]
    pub ephemeral: bool,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_landing_path() -> String {
    "index.html".to_string()
}

fn default_keyring_service() -> String {
    "zkhctl".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            landing_path: default_landing_path(),
            keyring_service: default_keyring_service(),
            ephemeral: false,
        }
    }
}

impl Config {
    /// Load configuration from the environment, reading `.env` first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::prefixed("ZKH_").from_env()
    }

    /// Check that the configuration can be used to build a client.
    pub fn validate(&self) -> Result<(), String> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| format!("ZKH_BASE_URL is not a valid URL: {e}"))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err("ZKH_BASE_URL must use http or https".to_string());
        }
        if self.base_url.ends_with('/') {
            return Err("ZKH_BASE_URL must not end with '/'".to_string());
        }
        if self.keyring_service.is_empty() {
            return Err("ZKH_KEYRING_SERVICE must not be empty".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_backend() {
        let config = Config::default();
        assert_eq!(config.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.landing_path, "index.html");
        assert!(!config.ephemeral);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_trailing_slash() {
        let config = Config {
            base_url: "http://127.0.0.1:8000/".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_non_http_scheme() {
        let config = Config {
            base_url: "ftp://example.com".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn envy_fills_defaults_for_missing_keys() {
        let vars = vec![("BASE_URL".to_string(), "https://desk.example".to_string())];
        let config: Config = envy::from_iter(vars).unwrap();
        assert_eq!(config.base_url, "https://desk.example");
        assert_eq!(config.keyring_service, "zkhctl");
    }
}
