mod client;
mod endpoints;
pub mod models;
mod query;
mod transport;

pub use client::{effective_headers, ApiClient, Reply, RequestOptions, SignedOut, GENERIC_FAILURE};
pub use query::{QueryParams, RequestFilter, UserFilter};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
