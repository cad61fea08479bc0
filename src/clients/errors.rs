//! HTTP-specific error types for the Xero API client.
//!
//! This module contains error types for HTTP operations, including response
//! errors, request validation failures, and the executor's result error.
//!
//! # Error Handling
//!
//! - [`HttpError`]: Transport-level failures, and non-2xx responses when the
//!   transport is configured to treat them as errors
//! - [`InvalidHttpRequestError`]: A request failed validation before sending
//! - [`ClientError`]: What [`RefreshingClient`](crate::clients::RefreshingClient)
//!   returns: HTTP, OAuth or signing failures
//!
//! # Example
//!
//! ```rust,ignore
//! use xero_api::clients::{ClientError, HttpError};
//! use xero_api::auth::oauth::OAuthError;
//!
//! match client.get("Invoices").await {
//!     Ok(response) => println!("{} invoices", response.envelope().count()),
//!     Err(ClientError::OAuth(OAuthError::RefreshFailed { problem, advice, .. })) => {
//!         println!("Re-authorize: {problem:?} {advice:?}");
//!     }
//!     Err(ClientError::Http(HttpError::Response(response))) => {
//!         println!("API error {}", response.code);
//!     }
//!     Err(e) => println!("Request failed: {e}"),
//! }
//! ```

use thiserror::Error;

use crate::auth::oauth::{OAuthError, SigningError};
use crate::clients::http_response::HttpResponse;

/// Error returned when an HTTP request fails validation.
///
/// This error is raised before a request is sent if it fails validation
/// checks, such as:
/// - Missing body for POST/PUT requests
/// - Body provided without `body_type`
///
/// # Example
///
/// ```rust
/// use xero_api::clients::InvalidHttpRequestError;
///
/// let error = InvalidHttpRequestError::MissingBody {
///     method: "POST".to_string(),
/// };
///
/// println!("{}", error); // "Cannot use POST without specifying data."
/// ```
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidHttpRequestError {
    /// A request body was provided without specifying the body type.
    #[error("Cannot set a body without also setting body_type.")]
    MissingBodyType,

    /// A POST or PUT request was made without a body.
    #[error("Cannot use {method} without specifying data.")]
    MissingBody {
        /// The HTTP method that requires a body.
        method: String,
    },
}

/// Unified error type for HTTP-related errors.
///
/// Transport errors are propagated and never retried by the executor.
#[derive(Debug, Error)]
pub enum HttpError {
    /// A non-2xx response, surfaced as an error. The response is kept so the
    /// caller (and the token refresh logic) can still inspect it.
    #[error("HTTP {} response from Xero", .0.code)]
    Response(Box<HttpResponse>),

    /// Request validation failed.
    #[error(transparent)]
    InvalidRequest(#[from] InvalidHttpRequestError),

    /// The request URL could not be built.
    #[error("Invalid request URL '{url}': {source}")]
    InvalidUrl {
        /// The URL that failed to parse.
        url: String,
        /// The parse failure.
        #[source]
        source: url::ParseError,
    },

    /// Network or connection error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl HttpError {
    /// Returns the response carried by this error, if any.
    #[must_use]
    pub fn response(&self) -> Option<&HttpResponse> {
        match self {
            Self::Response(response) => Some(response),
            _ => None,
        }
    }
}

/// Error returned by the refreshing request executor.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request failed at the HTTP level.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// Refreshing the access token failed.
    #[error(transparent)]
    OAuth(#[from] OAuthError),

    /// The request could not be signed.
    #[error(transparent)]
    Signing(#[from] SigningError),
}

// Verify error types are Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<HttpError>();
    assert_send_sync::<ClientError>();
};
