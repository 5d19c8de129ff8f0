use crate::error::ApiError;
use async_trait::async_trait;
use reqwest::{header::HeaderMap, Method, StatusCode};
use url::Url;

/// A fully assembled request, ready to go out over the wire.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

/// What came back, before any interpretation.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

/// Sends requests on behalf of the API client.
///
/// The client decides what a status code means; a transport only fails when
/// no response was received at all.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// The real network, via `reqwest`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Wraps an existing client, e.g. one with a proxy configured.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let result = builder.send().await?;
        let status = result.status();
        let body = result.bytes().await?.to_vec();
        Ok(HttpResponse { status, body })
    }
}
