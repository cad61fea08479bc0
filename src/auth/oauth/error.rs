//! OAuth-specific error types for the Xero API client.
//!
//! # Error Types
//!
//! - [`OAuthError::RefreshFailed`]: the token endpoint did not issue a token
//! - [`OAuthError::NotRenewable`]: the credentials carry no session handle
//! - [`OAuthError::HttpError`]: wrapped HTTP client error
//! - [`SigningError`]: a request could not be signed
//!
//! # Example
//!
//! ```rust
//! use xero_api::auth::oauth::{OAuthError, ProblemCode};
//!
//! let error = OAuthError::RefreshFailed {
//!     problem: Some(ProblemCode::TokenRejected),
//!     advice: Some("Token X does not match".to_string()),
//!     status: 401,
//! };
//! assert!(error.to_string().contains("token_rejected"));
//! ```

use thiserror::Error;

use crate::auth::oauth::ProblemCode;
use crate::clients::HttpError;

/// Errors that can occur while signing a request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SigningError {
    /// The signing key could not be used.
    #[error("Invalid signing key")]
    InvalidKey,

    /// The request URL cannot be normalized for the signature base string.
    #[error("Cannot sign request for URL '{url}'")]
    InvalidUrl {
        /// The URL that could not be normalized.
        url: String,
    },
}

/// Errors that can occur during OAuth operations.
///
/// # Thread Safety
///
/// `OAuthError` is `Send + Sync`, making it safe to use across async boundaries.
///
/// # Example
///
/// ```rust
/// use xero_api::auth::oauth::OAuthError;
///
/// fn handle_oauth_error(err: OAuthError) {
///     match err {
///         OAuthError::RefreshFailed { problem, advice, status } => {
///             eprintln!("Refresh failed ({status}): {problem:?} {advice:?}");
///         }
///         OAuthError::NotRenewable => {
///             eprintln!("Credentials have no session handle");
///         }
///         OAuthError::HttpError(e) => eprintln!("HTTP error: {e}"),
///         OAuthError::Signing(e) => eprintln!("Signing error: {e}"),
///     }
/// }
/// ```
#[derive(Debug, Error)]
pub enum OAuthError {
    /// The token endpoint answered without a token.
    ///
    /// A `token_rejected` problem means the token does not belong to the
    /// consumer, usually a configuration mistake. Retrying will not help.
    #[error(
        "Token refresh failed (HTTP {status}): {}",
        describe_problem(.problem.as_ref(), .advice.as_deref())
    )]
    RefreshFailed {
        /// The `oauth_problem` code, if one was reported.
        problem: Option<ProblemCode>,
        /// The `oauth_problem_advice`, if one was reported.
        advice: Option<String>,
        /// The HTTP status of the token endpoint response.
        status: u16,
    },

    /// A refresh was requested for credentials without a session handle.
    #[error("Credentials have no session handle and cannot be renewed")]
    NotRenewable,

    /// HTTP request failed.
    #[error(transparent)]
    HttpError(#[from] HttpError),

    /// The refresh request could not be signed.
    #[error(transparent)]
    Signing(#[from] SigningError),
}

fn describe_problem(problem: Option<&ProblemCode>, advice: Option<&str>) -> String {
    let problem = problem.map_or("no token issued", ProblemCode::as_str);
    match advice {
        Some(advice) => format!("{problem}: {advice}"),
        None => problem.to_string(),
    }
}

// Verify error types are Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<OAuthError>();
    assert_send_sync::<SigningError>();
};
