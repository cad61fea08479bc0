//! HTTP client types for Xero API communication.
//!
//! This module provides the request execution layer: building requests,
//! signing them, sending them through a pluggable transport, and renewing
//! expired tokens.
//!
//! # Overview
//!
//! The main types in this module are:
//!
//! - [`RefreshingClient`]: The executor applications use; renews expired tokens
//! - [`SignedClient`]: Signs requests with one fixed set of credentials
//! - [`Transport`]: The network seam, with [`ReqwestTransport`] as default
//! - [`HttpRequest`]: A request to be sent to the API
//! - [`HttpResponse`]: A response from the API, with [`RateLimit`] details
//! - [`HttpMethod`]: Supported HTTP methods (GET, POST, PUT, DELETE)
//! - [`DataType`]: Content types for request bodies
//!
//! # Example
//!
//! ```rust,ignore
//! use xero_api::clients::{HttpMethod, HttpRequest, RefreshingClient};
//! use xero_api::XeroConfig;
//!
//! let mut client = RefreshingClient::new(XeroConfig::default(), credentials);
//!
//! let request = HttpRequest::builder(HttpMethod::Get, "Contacts")
//!     .query_param("If-Modified-Since", "2017-11-28T12:00:00")
//!     .build()
//!     .unwrap();
//!
//! let response = client.execute(request).await?;
//! println!("{} contacts changed", response.envelope().count());
//! ```
//!
//! # Token Renewal
//!
//! For credentials with a session handle, a 401 response carrying
//! `oauth_problem=token_expired` triggers one renewal at the access token
//! endpoint followed by one retry of the original request. Any other
//! response, including `token_rejected`, is returned unchanged.

mod errors;
mod http_request;
mod http_response;
mod refreshing;
mod signed;
mod transport;

pub use errors::{ClientError, HttpError, InvalidHttpRequestError};
pub use http_request::{DataType, HttpMethod, HttpRequest, HttpRequestBuilder};
pub use http_response::{HttpResponse, RateLimit};
pub use refreshing::{RefreshingClient, TokenRefreshCallback, SDK_VERSION};
pub use signed::SignedClient;
pub use transport::{PreparedRequest, ReqwestTransport, Transport};
