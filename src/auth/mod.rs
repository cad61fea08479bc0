//! Authentication types for the Xero API client.
//!
//! # Overview
//!
//! - [`Credentials`]: the consumer key pair and the current access token
//! - [`Expiry`]: when a token stops being valid, with guard-time checks
//! - [`oauth`]: OAuth 1.0a signing, token endpoint parsing and renewal
//!
//! Partner application tokens expire after 30 minutes and are renewed with
//! the session handle issued alongside them. Credentials without a session
//! handle (public and private applications) are used as-is.
//!
//! # Example
//!
//! ```rust
//! use xero_api::{ConsumerKey, ConsumerSecret, Credentials};
//! use chrono::{Duration, Utc};
//!
//! let credentials = Credentials::new(
//!     ConsumerKey::new("consumer-key").unwrap(),
//!     ConsumerSecret::new("consumer-secret").unwrap(),
//!     "access-token",
//!     "token-secret",
//! )
//! .unwrap()
//! .with_session_handle("session-handle")
//! .with_expires_at(Utc::now() + Duration::minutes(30));
//!
//! // Renew proactively five minutes before the token runs out
//! assert!(!credentials.is_expired(300));
//! ```

mod credentials;
mod expiry;
pub mod oauth;

pub use credentials::Credentials;
pub use expiry::Expiry;
