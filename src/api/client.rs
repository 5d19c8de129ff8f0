use super::transport::{HttpRequest, ReqwestTransport, Transport};
use crate::{
    auth::Session,
    config::Config,
    error::{ApiError, Result},
};
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Method, StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, warn};
use url::Url;

const APP_USER_AGENT: &str = concat!("zkhctl/", env!("CARGO_PKG_VERSION"));

/// Used when a failed response doesn't tell us what went wrong.
pub const GENERIC_FAILURE: &str = "Request failed";

/// Per-call configuration for [`ApiClient::request`].
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Defaults to `GET`.
    pub method: Method,
    /// Merged over `Content-Type: application/json`.
    pub headers: HeaderMap,
    /// An already serialized JSON body.
    pub body: Option<String>,
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    /// Serializes `body` as the JSON payload.
    pub fn json<B: Serialize + ?Sized>(method: Method, body: &B) -> Result<Self> {
        Ok(Self {
            method,
            body: Some(serde_json::to_string(body)?),
            ..Self::default()
        })
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// Tells the caller the server no longer accepts our credential.
///
/// The client never navigates anywhere itself; whoever renders the result
/// decides what to do with `redirect_to`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedOut {
    /// Where the user should be sent to sign in again.
    pub redirect_to: String,
    /// Whether this call is the one that removed the stored credential.
    /// When several requests are rejected together only one of them clears it.
    pub cleared: bool,
}

/// The successful outcomes of a request.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply<T> {
    /// The parsed response body.
    Data(T),
    /// 204 No Content.
    NoContent,
    /// 401 Unauthorized. The credential has been dropped.
    SignedOut(SignedOut),
}

impl<T> Reply<T> {
    /// The body, if there was one.
    pub fn data(self) -> Option<T> {
        match self {
            Reply::Data(data) => Some(data),
            _ => None,
        }
    }

    pub fn is_signed_out(&self) -> bool {
        matches!(self, Reply::SignedOut(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Reply<U> {
        match self {
            Reply::Data(data) => Reply::Data(f(data)),
            Reply::NoContent => Reply::NoContent,
            Reply::SignedOut(event) => Reply::SignedOut(event),
        }
    }
}

/// Builds the headers a request actually goes out with.
///
/// `Content-Type: application/json` is always set, caller headers replace it
/// (and each other) by name, and a present credential always wins over any
/// caller-supplied `Authorization`.
pub fn effective_headers(caller: &HeaderMap, credential: Option<&str>) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    for name in caller.keys() {
        headers.remove(name);
    }
    for (name, value) in caller {
        headers.append(name.clone(), value.clone());
    }

    if let Some(token) = credential {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| ApiError::InvalidHeader(format!("stored credential: {e}")))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }
    Ok(headers)
}

/// Extracts a human-readable message from a failed response body.
fn failure_message(body: &Value) -> String {
    match body.get("detail") {
        Some(Value::String(detail)) if !detail.is_empty() => detail.clone(),
        None | Some(Value::Null) | Some(Value::String(_)) => GENERIC_FAILURE.to_string(),
        // Validation failures carry a list of problems; pass it through as-is.
        Some(other) => other.to_string(),
    }
}

/// An authenticated client for the service desk API.
pub struct ApiClient<T = ReqwestTransport> {
    transport: T,
    /// Requests go to `base_url + endpoint`.
    base_url: String,
    landing_path: String,
    session: Arc<Session>,
}

impl ApiClient<ReqwestTransport> {
    /// A client talking to the configured backend over the network.
    pub fn from_config(config: &Config, session: Arc<Session>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(APP_USER_AGENT)
            .build()?;
        Ok(
            ApiClient::new(&config.base_url, ReqwestTransport::with_client(http), session)?
                .with_landing_path(&config.landing_path),
        )
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn new(base_url: impl Into<String>, transport: T, session: Arc<Session>) -> Result<Self> {
        let base_url = base_url.into();
        Url::parse(&base_url)?;
        Ok(Self {
            transport,
            base_url,
            landing_path: "index.html".to_string(),
            session,
        })
    }

    /// Changes where [`SignedOut`] tells callers to go.
    pub fn with_landing_path(mut self, landing_path: impl Into<String>) -> Self {
        self.landing_path = landing_path.into();
        self
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends one request to `endpoint` and interprets the response.
    ///
    /// 401 drops the credential and yields [`Reply::SignedOut`], 204 yields
    /// [`Reply::NoContent`], other failures become [`ApiError::Request`].
    /// Every error is logged before being handed back.
    pub async fn request<R: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<Reply<R>> {
        let method = options.method.clone();
        let result = self.dispatch(endpoint, options).await;
        if let Err(err) = &result {
            error!(%method, endpoint, error = %err, "API error");
        }
        result
    }

    async fn dispatch<R: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<Reply<R>> {
        let credential = self.session.credential()?;
        let headers = effective_headers(&options.headers, credential.as_deref())?;
        let url = Url::parse(&format!("{}{}", self.base_url, endpoint))?;

        debug!(method = %options.method, %url, authenticated = credential.is_some(), "sending request");
        let response = self
            .transport
            .send(HttpRequest {
                method: options.method,
                url,
                headers,
                body: options.body,
            })
            .await?;

        match response.status {
            StatusCode::UNAUTHORIZED => {
                // Signing out must not fail just because the store did.
                let cleared = match self.session.invalidate(credential.as_deref()) {
                    Ok(cleared) => cleared,
                    Err(err) => {
                        error!(endpoint, error = %err, "failed to clear rejected credential");
                        false
                    }
                };
                warn!(endpoint, cleared, "credential rejected, signing out");
                return Ok(Reply::SignedOut(SignedOut {
                    redirect_to: self.landing_path.clone(),
                    cleared,
                }));
            }
            StatusCode::NO_CONTENT => return Ok(Reply::NoContent),
            _ => {}
        }

        if !response.status.is_success() {
            let body: Value = serde_json::from_slice(&response.body)?;
            return Err(ApiError::Request {
                status: response.status.as_u16(),
                message: failure_message(&body),
            });
        }

        Ok(Reply::Data(serde_json::from_slice(&response.body)?))
    }

    pub(crate) async fn get<R: DeserializeOwned>(&self, endpoint: &str) -> Result<Reply<R>> {
        self.request(endpoint, RequestOptions::default()).await
    }

    pub(crate) async fn send_json<B, R>(
        &self,
        method: Method,
        endpoint: &str,
        body: &B,
    ) -> Result<Reply<R>>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let options = RequestOptions::json(method, body).inspect_err(|err| {
            error!(endpoint, error = %err, "failed to serialize request body");
        })?;
        self.request(endpoint, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn content_type_is_always_json_by_default() {
        let headers = effective_headers(&HeaderMap::new(), None).unwrap();
        assert_eq!(headers[CONTENT_TYPE], "application/json");
        assert!(!headers.contains_key(AUTHORIZATION));
    }

    #[test]
    fn caller_headers_override_defaults() {
        let mut caller = HeaderMap::new();
        caller.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        caller.insert("x-trace", HeaderValue::from_static("1"));

        let headers = effective_headers(&caller, None).unwrap();
        assert_eq!(headers.get_all(CONTENT_TYPE).iter().count(), 1);
        assert_eq!(headers[CONTENT_TYPE], "text/plain");
        assert_eq!(headers["x-trace"], "1");
    }

    #[test]
    fn credential_beats_caller_authorization() {
        let mut caller = HeaderMap::new();
        caller.insert(AUTHORIZATION, HeaderValue::from_static("Basic Zm9vOmJhcg=="));

        let headers = effective_headers(&caller, Some("tok")).unwrap();
        assert_eq!(headers.get_all(AUTHORIZATION).iter().count(), 1);
        assert_eq!(headers[AUTHORIZATION], "Bearer tok");
    }

    #[test]
    fn caller_authorization_survives_without_credential() {
        let mut caller = HeaderMap::new();
        caller.insert(AUTHORIZATION, HeaderValue::from_static("Bearer mine"));
        let headers = effective_headers(&caller, None).unwrap();
        assert_eq!(headers[AUTHORIZATION], "Bearer mine");
    }

    #[test]
    fn failure_message_prefers_detail() {
        assert_eq!(failure_message(&json!({"detail": "User not found"})), "User not found");
        assert_eq!(failure_message(&json!({"error": "nope"})), GENERIC_FAILURE);
        assert_eq!(failure_message(&json!({"detail": ""})), GENERIC_FAILURE);
        assert_eq!(failure_message(&json!({"detail": null})), GENERIC_FAILURE);
        assert_eq!(failure_message(&json!([1, 2])), GENERIC_FAILURE);
        assert_eq!(
            failure_message(&json!({"detail": [{"msg": "field required"}]})),
            r#"[{"msg":"field required"}]"#
        );
    }

    #[test]
    fn reply_map_keeps_signed_out() {
        let event = SignedOut {
            redirect_to: "index.html".to_string(),
            cleared: true,
        };
        let reply: Reply<u8> = Reply::SignedOut(event.clone());
        assert_eq!(reply.map(|n| n + 1), Reply::SignedOut(event));
        assert_eq!(Reply::Data(1).map(|n| n + 1).data(), Some(2));
        assert_eq!(Reply::<u8>::NoContent.data(), None);
    }
}
