//! # Xero API Rust Client
//!
//! A Rust client for the Xero accounting APIs, handling OAuth 1.0a request
//! signing, transparent renewal of expiring partner application tokens, and
//! normalization of Xero's many response formats.
//!
//! ## Overview
//!
//! This crate provides:
//! - Type-safe configuration via [`XeroConfig`] and [`XeroConfigBuilder`]
//! - Endpoint URLs for the Core, Payroll, Files and Assets APIs via [`Endpoint`]
//! - [`Credentials`] that rotate when the access token is renewed
//! - OAuth 1.0a signing and token endpoint parsing via [`auth::oauth`]
//! - An async request executor that renews expired tokens and retries once,
//!   [`RefreshingClient`]
//! - Response decoding (JSON, XML, text) into one navigable resource tree
//!   via [`response`]
//!
//! ## Quick Start
//!
//! ```rust
//! use xero_api::{ApiFamily, ConsumerKey, ConsumerSecret, Credentials, XeroConfig};
//! use std::time::Duration;
//!
//! let config = XeroConfig::builder()
//!     .api_family(ApiFamily::Core)
//!     .request_timeout(Duration::from_secs(20))
//!     .user_agent_prefix("My App")
//!     .build()
//!     .unwrap();
//!
//! let credentials = Credentials::new(
//!     ConsumerKey::new("consumer-key").unwrap(),
//!     ConsumerSecret::new("consumer-secret").unwrap(),
//!     "access-token",
//!     "access-token-secret",
//! )
//! .unwrap()
//! .with_session_handle("session-handle");
//!
//! assert_eq!(config.endpoint().with_resource("Invoices").url(),
//!     "https://api.xero.com/api.xro/2.0/Invoices");
//! assert!(credentials.is_renewable());
//! ```
//!
//! ## Making API Requests
//!
//! ```rust,ignore
//! use xero_api::RefreshingClient;
//!
//! let mut client = RefreshingClient::new(config, credentials)
//!     .on_token_refresh(|new, _old| {
//!         // Persist the new token; the old one no longer works
//!         store.save(new);
//!     });
//!
//! let response = client.get("Invoices").await?;
//! let envelope = response.envelope();
//! for invoice in &envelope {
//!     println!("{} due {}", invoice["InvoiceNumber"], invoice["DueDate"]);
//! }
//! ```
//!
//! ## Reading Responses
//!
//! ```rust
//! use xero_api::response::ResponseEnvelope;
//! use serde_json::json;
//!
//! let envelope = ResponseEnvelope::from_value(&json!({
//!     "Id": "2b5e6b8e-1a1a-4f3e-9b7c-111111111111",
//!     "Status": "OK",
//!     "ProviderName": "My App",
//!     "DateTimeUTC": "/Date(1509454062181)/",
//!     "Payments": [{"PaymentID": "p1", "Amount": 10.5}]
//! }));
//!
//! assert!(envelope.is_collection());
//! assert_eq!(envelope.count(), 1);
//! assert_eq!(envelope.first()["amount"].as_f64(), Some(10.5));
//! assert_eq!(envelope.metadata()["ProviderName"].as_str(), Some("My App"));
//! ```
//!
//! ## Design Principles
//!
//! - **No global state**: Configuration is instance-based and passed explicitly
//! - **Fail-fast validation**: All newtypes validate on construction
//! - **Thread-safe**: All types are `Send + Sync`
//! - **Async-first**: Designed for use with Tokio async runtime
//! - **Immutable credentials**: A renewal produces new [`Credentials`]

pub mod auth;
pub mod clients;
pub mod config;
pub mod error;
pub mod response;

// Re-export public types at crate root for convenience
pub use auth::{Credentials, Expiry};
pub use config::{
    AcceptType, ApiFamily, ApiVersion, BaseUrl, ConsumerKey, ConsumerSecret, Endpoint,
    ResourcePath, SignatureMethod, XeroConfig, XeroConfigBuilder,
};
pub use error::ConfigError;

// Re-export HTTP client types
pub use clients::{
    ClientError, DataType, HttpError, HttpMethod, HttpRequest, HttpRequestBuilder, HttpResponse,
    InvalidHttpRequestError, RateLimit, RefreshingClient, TokenRefreshCallback,
};

// Re-export OAuth types for convenience
pub use auth::oauth::{OAuthError, OAuthParams, ProblemCode};

// Re-export response types
pub use response::{Node, ResponseEnvelope};
