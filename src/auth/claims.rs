use crate::error::ClaimsError;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// What the backend puts in its access tokens.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenClaims {
    /// The username (a phone number) the token was issued to.
    pub sub: String,
    /// Expiry, in seconds since the Unix epoch.
    pub exp: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub role: Option<String>,
}

impl TokenClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}

/// Reads the claims out of a bearer token without verifying it.
///
/// This is for display only. The server decides whether a token is valid, so
/// nothing here should stop a request from being sent.
pub fn decode_claims(token: &str) -> Result<TokenClaims, ClaimsError> {
    // Header, payload, signature. We only care about the payload.
    let components: Vec<&str> = token.split('.').collect();
    let [_, payload, _] = components.as_slice() else {
        return Err(ClaimsError::Malformed);
    };

    let decoded = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
    Ok(serde_json::from_slice(&decoded)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_with(payload: &str) -> String {
        format!("eyJhbGciOiJIUzI1NiJ9.{}.c2ln", URL_SAFE_NO_PAD.encode(payload))
    }

    #[test]
    fn decodes_backend_claims() {
        let token = token_with(r#"{"sub":"79161234567","user_id":3,"role":"client","exp":1700000000}"#);
        let claims = decode_claims(&token).unwrap();
        assert_eq!(claims.sub, "79161234567");
        assert_eq!(claims.user_id, Some(3));
        assert_eq!(claims.role.as_deref(), Some("client"));
        assert_eq!(claims.expires_at().unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn expiry_is_inclusive() {
        let claims = decode_claims(&token_with(r#"{"sub":"admin","exp":100}"#)).unwrap();
        assert!(!claims.is_expired_at(DateTime::from_timestamp(99, 0).unwrap()));
        assert!(claims.is_expired_at(DateTime::from_timestamp(100, 0).unwrap()));
    }

    #[test]
    fn rejects_opaque_tokens() {
        assert!(matches!(decode_claims("not-a-jwt"), Err(ClaimsError::Malformed)));
        assert!(matches!(decode_claims("a.b.c.d"), Err(ClaimsError::Malformed)));
    }

    #[test]
    fn rejects_garbage_payload() {
        assert!(matches!(
            decode_claims("a.!!!.c"),
            Err(ClaimsError::Encoding(_))
        ));
        assert!(matches!(
            decode_claims(&token_with("[]")),
            Err(ClaimsError::Payload(_))
        ));
    }
}
