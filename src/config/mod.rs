//! Configuration types for the Xero API client.
//!
//! This module provides the configuration used to address and talk to the
//! Xero APIs. Credentials are deliberately not part of the configuration:
//! they rotate at runtime and live in [`Credentials`](crate::Credentials).
//!
//! # Overview
//!
//! The main types in this module are:
//!
//! - [`XeroConfig`]: Endpoint, timeout and header settings
//! - [`XeroConfigBuilder`]: A builder for constructing [`XeroConfig`] instances
//! - [`ConsumerKey`]: A validated consumer key newtype
//! - [`ConsumerSecret`]: A validated consumer secret with masked debug output
//! - [`BaseUrl`]: A validated API base URL
//! - [`ApiFamily`], [`ApiVersion`], [`Endpoint`]: URL construction
//!
//! # Example
//!
//! ```rust
//! use xero_api::{ApiFamily, XeroConfig};
//! use std::time::Duration;
//!
//! let config = XeroConfig::builder()
//!     .api_family(ApiFamily::Payroll)
//!     .request_timeout(Duration::from_secs(10))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.api_version().as_ref(), "1.0");
//! assert_eq!(
//!     config.endpoint().with_resource("Employees").url(),
//!     "https://api.xero.com/payroll.xro/1.0/Employees"
//! );
//! ```

mod endpoint;
mod newtypes;

pub use endpoint::{build_url, ApiFamily, ApiVersion, Endpoint, ResourcePath};
pub use newtypes::{BaseUrl, ConsumerKey, ConsumerSecret};

use crate::error::ConfigError;
use std::fmt;
use std::time::Duration;

/// Default timeout for ordinary API requests.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default timeout for the token refresh call.
pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(120);

/// Default resource name of the token endpoint under the OAuth API.
pub const DEFAULT_ACCESS_TOKEN_RESOURCE: &str = "AccessToken";

/// The OAuth 1.0a signature method used by the default signer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SignatureMethod {
    /// `HMAC-SHA256`.
    #[default]
    HmacSha256,
    /// `PLAINTEXT`. Only safe over TLS.
    Plaintext,
}

impl SignatureMethod {
    /// Returns the value sent as `oauth_signature_method`.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::HmacSha256 => "HMAC-SHA256",
            Self::Plaintext => "PLAINTEXT",
        }
    }
}

impl fmt::Display for SignatureMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The representation requested through the `Accept` header.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AcceptType {
    /// `application/json`.
    #[default]
    Json,
    /// `text/xml`.
    Xml,
    /// `application/pdf`.
    Pdf,
}

impl AcceptType {
    /// Returns the MIME type sent in the `Accept` header.
    #[must_use]
    pub const fn as_mime(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Xml => "text/xml",
            Self::Pdf => "application/pdf",
        }
    }
}

/// Configuration for the Xero API client.
///
/// # Thread Safety
///
/// `XeroConfig` is `Clone`, `Send`, and `Sync`, making it safe to share
/// across threads and async tasks.
///
/// # Example
///
/// ```rust
/// use xero_api::{AcceptType, BaseUrl, XeroConfig};
///
/// let config = XeroConfig::builder()
///     .base_url(BaseUrl::new("https://api.xero.com").unwrap())
///     .accept(AcceptType::Xml)
///     .user_agent_prefix("MyApp/1.0")
///     .build()
///     .unwrap();
///
/// assert_eq!(config.accept(), AcceptType::Xml);
/// ```
#[derive(Clone, Debug)]
pub struct XeroConfig {
    base_url: BaseUrl,
    api_family: ApiFamily,
    api_version: ApiVersion,
    oauth_access_token_resource: String,
    request_timeout: Duration,
    refresh_timeout: Duration,
    signature_method: SignatureMethod,
    user_agent_prefix: Option<String>,
    accept: AcceptType,
}

impl XeroConfig {
    /// Creates a new builder for constructing a `XeroConfig`.
    #[must_use]
    pub fn builder() -> XeroConfigBuilder {
        XeroConfigBuilder::new()
    }

    /// Returns the base URL.
    #[must_use]
    pub const fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    /// Returns the API family relative paths are resolved against.
    #[must_use]
    pub const fn api_family(&self) -> ApiFamily {
        self.api_family
    }

    /// Returns the API version.
    #[must_use]
    pub const fn api_version(&self) -> &ApiVersion {
        &self.api_version
    }

    /// Returns the resource name of the token endpoint.
    #[must_use]
    pub fn oauth_access_token_resource(&self) -> &str {
        &self.oauth_access_token_resource
    }

    /// Returns the timeout applied to ordinary requests.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Returns the timeout applied to the token refresh request.
    #[must_use]
    pub const fn refresh_timeout(&self) -> Duration {
        self.refresh_timeout
    }

    /// Returns the signature method used by the default signer.
    #[must_use]
    pub const fn signature_method(&self) -> SignatureMethod {
        self.signature_method
    }

    /// Returns the user agent prefix, if configured.
    #[must_use]
    pub fn user_agent_prefix(&self) -> Option<&str> {
        self.user_agent_prefix.as_deref()
    }

    /// Returns the default `Accept` type.
    #[must_use]
    pub const fn accept(&self) -> AcceptType {
        self.accept
    }

    /// Returns the endpoint for the configured family and version, without a
    /// resource.
    #[must_use]
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.base_url.clone(), self.api_family).with_version(self.api_version.clone())
    }

    /// Returns the full URL of the token endpoint.
    #[must_use]
    pub fn access_token_url(&self) -> String {
        Endpoint::new(self.base_url.clone(), ApiFamily::OAuth)
            .with_resource(self.oauth_access_token_resource.as_str())
            .url()
    }
}

impl Default for XeroConfig {
    fn default() -> Self {
        Self {
            base_url: BaseUrl::default(),
            api_family: ApiFamily::default(),
            api_version: ApiFamily::default().default_version(),
            oauth_access_token_resource: DEFAULT_ACCESS_TOKEN_RESOURCE.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            refresh_timeout: DEFAULT_REFRESH_TIMEOUT,
            signature_method: SignatureMethod::default(),
            user_agent_prefix: None,
            accept: AcceptType::default(),
        }
    }
}

// Verify XeroConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<XeroConfig>();
};

/// Builder for constructing [`XeroConfig`] instances.
///
/// # Defaults
///
/// - `base_url`: `https://api.xero.com`
/// - `api_family`: [`ApiFamily::Core`]
/// - `api_version`: the family's default (`2.0` for Core, `1.0` otherwise)
/// - `oauth_access_token_resource`: `AccessToken`
/// - `request_timeout`: 30 seconds
/// - `refresh_timeout`: 120 seconds
/// - `signature_method`: [`SignatureMethod::HmacSha256`]
/// - `user_agent_prefix`: `None`
/// - `accept`: [`AcceptType::Json`]
#[derive(Debug, Default)]
pub struct XeroConfigBuilder {
    base_url: Option<BaseUrl>,
    api_family: Option<ApiFamily>,
    api_version: Option<ApiVersion>,
    oauth_access_token_resource: Option<String>,
    request_timeout: Option<Duration>,
    refresh_timeout: Option<Duration>,
    signature_method: Option<SignatureMethod>,
    user_agent_prefix: Option<String>,
    accept: Option<AcceptType>,
}

impl XeroConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL.
    #[must_use]
    pub fn base_url(mut self, base_url: BaseUrl) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Sets the API family relative request paths resolve against.
    #[must_use]
    pub const fn api_family(mut self, family: ApiFamily) -> Self {
        self.api_family = Some(family);
        self
    }

    /// Sets the API version. Defaults to the family's default version.
    #[must_use]
    pub fn api_version(mut self, version: ApiVersion) -> Self {
        self.api_version = Some(version);
        self
    }

    /// Sets the resource name of the token endpoint.
    #[must_use]
    pub fn oauth_access_token_resource(mut self, resource: impl Into<String>) -> Self {
        self.oauth_access_token_resource = Some(resource.into());
        self
    }

    /// Sets the timeout for ordinary requests.
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Sets the timeout for the token refresh request.
    #[must_use]
    pub const fn refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = Some(timeout);
        self
    }

    /// Sets the signature method used by the default signer.
    #[must_use]
    pub const fn signature_method(mut self, method: SignatureMethod) -> Self {
        self.signature_method = Some(method);
        self
    }

    /// Sets the user agent prefix for HTTP requests.
    #[must_use]
    pub fn user_agent_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.user_agent_prefix = Some(prefix.into());
        self
    }

    /// Sets the default `Accept` type.
    #[must_use]
    pub const fn accept(mut self, accept: AcceptType) -> Self {
        self.accept = Some(accept);
        self
    }

    /// Builds the [`XeroConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] if the access token
    /// resource was set to an empty string, and
    /// [`ConfigError::InvalidTimeout`] if either timeout is zero.
    pub fn build(self) -> Result<XeroConfig, ConfigError> {
        let api_family = self.api_family.unwrap_or_default();

        let oauth_access_token_resource = self
            .oauth_access_token_resource
            .unwrap_or_else(|| DEFAULT_ACCESS_TOKEN_RESOURCE.to_string());
        if oauth_access_token_resource.is_empty() {
            return Err(ConfigError::MissingRequiredField {
                field: "oauth_access_token_resource",
            });
        }

        let request_timeout = self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT);
        if request_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout {
                field: "request_timeout",
            });
        }
        let refresh_timeout = self.refresh_timeout.unwrap_or(DEFAULT_REFRESH_TIMEOUT);
        if refresh_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout {
                field: "refresh_timeout",
            });
        }

        Ok(XeroConfig {
            base_url: self.base_url.unwrap_or_default(),
            api_family,
            api_version: self
                .api_version
                .unwrap_or_else(|| api_family.default_version()),
            oauth_access_token_resource,
            request_timeout,
            refresh_timeout,
            signature_method: self.signature_method.unwrap_or_default(),
            user_agent_prefix: self.user_agent_prefix,
            accept: self.accept.unwrap_or_default(),
        })
    }
}
