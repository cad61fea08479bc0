//! OAuth 1.0a for Xero partner applications.
//!
//! This module provides the pieces that keep a partner application's
//! credentials valid:
//!
//! - **Signing** ([`RequestSigner`], [`OAuth1Signer`]): every request carries
//!   an OAuth 1.0a signature, in a header or in the query string
//! - **Token endpoint responses** ([`OAuthParams`]): URL-encoded token grants
//!   and `oauth_problem` reports, including the `token_expired` problem an API
//!   endpoint returns with a 401
//! - **Renewal** ([`refresh_access_token`]): exchanges the session handle for
//!   a new access token
//!
//! Most applications never call these directly: the
//! [`RefreshingClient`](crate::clients::RefreshingClient) signs every request
//! and renews the token when an API call reports it expired.
//!
//! # Example
//!
//! ```rust
//! use xero_api::auth::oauth::{OAuthParams, ProblemCode};
//!
//! let params = OAuthParams::from_body(
//!     b"oauth_problem=token_expired&oauth_problem_advice=The+access+token+has+expired",
//!     Some("text/html"),
//! );
//! assert!(params.is_expired());
//! assert_eq!(params.problem(), Some(ProblemCode::TokenExpired));
//! ```

mod error;
mod params;
mod refresh;
mod signer;

pub use error::{OAuthError, SigningError};
pub use params::{OAuthParams, ProblemCode};
pub use refresh::refresh_access_token;
pub use signer::{signature_base_string, OAuth1Signer, RequestSigner, SignaturePlacement};
