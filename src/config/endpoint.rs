//! Endpoint URL construction for the Xero APIs.
//!
//! Every Xero sub-API lives under its own path segment on the same host, and
//! all but the OAuth API carry a version segment:
//!
//! ```text
//! {base_url}/{api}/{version}/{resource}
//! {base_url}/oauth/{resource}
//! ```
//!
//! [`Endpoint`] is a pure value type: building a URL performs no I/O and no
//! validation. Malformed input simply yields a malformed URL.

use crate::config::BaseUrl;
use crate::error::ConfigError;
use std::fmt;
use std::str::FromStr;

/// The Xero sub-API a request is addressed to.
///
/// # Example
///
/// ```rust
/// use xero_api::ApiFamily;
///
/// assert_eq!(ApiFamily::Core.path_segment(), "api.xro");
/// assert_eq!(ApiFamily::Core.default_version().as_ref(), "2.0");
/// assert!(!ApiFamily::OAuth.is_versioned());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ApiFamily {
    /// The core accounting API (`api.xro`).
    #[default]
    Core,
    /// The payroll API (`payroll.xro`).
    Payroll,
    /// The files API (`files.xro`).
    Files,
    /// The fixed assets API (`assets.xro`).
    Assets,
    /// The OAuth authorization API (`oauth`). Not versioned.
    OAuth,
}

impl ApiFamily {
    /// Returns the path segment identifying this API.
    #[must_use]
    pub const fn path_segment(&self) -> &'static str {
        match self {
            Self::Core => "api.xro",
            Self::Payroll => "payroll.xro",
            Self::Files => "files.xro",
            Self::Assets => "assets.xro",
            Self::OAuth => "oauth",
        }
    }

    /// Returns `true` if URLs for this API include a version segment.
    #[must_use]
    pub const fn is_versioned(&self) -> bool {
        !matches!(self, Self::OAuth)
    }

    /// Returns the version used when none is configured.
    #[must_use]
    pub fn default_version(&self) -> ApiVersion {
        match self {
            Self::Core => ApiVersion("2.0".to_string()),
            _ => ApiVersion("1.0".to_string()),
        }
    }
}

impl fmt::Display for ApiFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

/// A validated API version such as `2.0`.
///
/// # Example
///
/// ```rust
/// use xero_api::ApiVersion;
///
/// let version: ApiVersion = "2.0".parse().unwrap();
/// assert_eq!(version.to_string(), "2.0");
/// assert!("latest".parse::<ApiVersion>().is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ApiVersion(String);

impl ApiVersion {
    /// Creates a new validated version.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidApiVersion`] unless the version is one
    /// or more dot-separated numbers.
    pub fn new(version: impl Into<String>) -> Result<Self, ConfigError> {
        let version = version.into();
        let valid = !version.is_empty()
            && version
                .split('.')
                .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()));

        if !valid {
            return Err(ConfigError::InvalidApiVersion { version });
        }
        Ok(Self(version))
    }
}

impl FromStr for ApiVersion {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for ApiVersion {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A resource path: one segment or an ordered sequence of segments.
///
/// Segments are joined with `/`.
///
/// ```rust
/// use xero_api::ResourcePath;
///
/// assert_eq!(ResourcePath::from("Invoices").to_string(), "Invoices");
/// assert_eq!(
///     ResourcePath::from(["Invoices", "INV-001", "Attachments"]).to_string(),
///     "Invoices/INV-001/Attachments"
/// );
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResourcePath(Vec<String>);

impl ResourcePath {
    /// Returns `true` if there are no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

impl From<&str> for ResourcePath {
    fn from(segment: &str) -> Self {
        Self(vec![segment.to_string()])
    }
}

impl From<String> for ResourcePath {
    fn from(segment: String) -> Self {
        Self(vec![segment])
    }
}

impl From<Vec<String>> for ResourcePath {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}

impl From<&[&str]> for ResourcePath {
    fn from(segments: &[&str]) -> Self {
        Self(segments.iter().map(ToString::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ResourcePath {
    fn from(segments: [&str; N]) -> Self {
        Self(segments.iter().map(ToString::to_string).collect())
    }
}

/// A complete endpoint on one of the Xero APIs.
///
/// # Example
///
/// ```rust
/// use xero_api::{ApiFamily, BaseUrl, Endpoint};
///
/// let endpoint = Endpoint::new(BaseUrl::default(), ApiFamily::Core)
///     .with_resource("Invoices");
/// assert_eq!(endpoint.url(), "https://api.xero.com/api.xro/2.0/Invoices");
///
/// let refresh = Endpoint::new(BaseUrl::default(), ApiFamily::OAuth)
///     .with_resource("AccessToken");
/// assert_eq!(refresh.url(), "https://api.xero.com/oauth/AccessToken");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    base_url: BaseUrl,
    family: ApiFamily,
    version: ApiVersion,
    resource: ResourcePath,
}

impl Endpoint {
    /// Creates an endpoint using the family's default version and no resource.
    #[must_use]
    pub fn new(base_url: BaseUrl, family: ApiFamily) -> Self {
        Self {
            base_url,
            version: family.default_version(),
            family,
            resource: ResourcePath::default(),
        }
    }

    /// Returns a copy with a different API family.
    #[must_use]
    pub fn with_family(&self, family: ApiFamily) -> Self {
        Self {
            family,
            ..self.clone()
        }
    }

    /// Returns a copy with a different version.
    #[must_use]
    pub fn with_version(&self, version: ApiVersion) -> Self {
        Self {
            version,
            ..self.clone()
        }
    }

    /// Returns a copy addressing a different resource.
    #[must_use]
    pub fn with_resource(&self, resource: impl Into<ResourcePath>) -> Self {
        Self {
            resource: resource.into(),
            ..self.clone()
        }
    }

    /// Returns the API family.
    #[must_use]
    pub const fn family(&self) -> ApiFamily {
        self.family
    }

    /// Returns the version segment (unused for the OAuth family).
    #[must_use]
    pub const fn version(&self) -> &ApiVersion {
        &self.version
    }

    /// Builds the full URL string.
    #[must_use]
    pub fn url(&self) -> String {
        let mut url = format!("{}/{}", self.base_url, self.family.path_segment());
        if self.family.is_versioned() {
            url.push('/');
            url.push_str(self.version.as_ref());
        }
        url.push('/');
        url.push_str(&self.resource.to_string());
        url
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url())
    }
}

/// Builds an endpoint URL in one call.
///
/// `version` of `None` uses the family default.
#[must_use]
pub fn build_url(
    base_url: &BaseUrl,
    family: ApiFamily,
    version: Option<&ApiVersion>,
    resource: impl Into<ResourcePath>,
) -> String {
    let endpoint = Endpoint::new(base_url.clone(), family);
    let endpoint = match version {
        Some(version) => endpoint.with_version(version.clone()),
        None => endpoint,
    };
    endpoint.with_resource(resource).url()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_endpoint_includes_version() {
        let url = build_url(&BaseUrl::default(), ApiFamily::Core, None, "Contacts");
        assert_eq!(url, "https://api.xero.com/api.xro/2.0/Contacts");
    }

    #[test]
    fn test_payroll_defaults_to_version_one() {
        let url = build_url(&BaseUrl::default(), ApiFamily::Payroll, None, "Employees");
        assert_eq!(url, "https://api.xero.com/payroll.xro/1.0/Employees");
    }

    #[test]
    fn test_oauth_endpoint_omits_version() {
        let version = ApiVersion::new("9.9").unwrap();
        let url = build_url(
            &BaseUrl::default(),
            ApiFamily::OAuth,
            Some(&version),
            "AccessToken",
        );
        assert_eq!(url, "https://api.xero.com/oauth/AccessToken");
    }

    #[test]
    fn test_multi_segment_resource_is_joined() {
        let url = build_url(
            &BaseUrl::default(),
            ApiFamily::Files,
            None,
            ["Folders", "abc-123", "Files"],
        );
        assert_eq!(url, "https://api.xero.com/files.xro/1.0/Folders/abc-123/Files");
    }

    #[test]
    fn test_endpoint_with_methods_leave_original_unchanged() {
        let base = Endpoint::new(BaseUrl::default(), ApiFamily::Core).with_resource("Invoices");
        let other = base
            .with_family(ApiFamily::Assets)
            .with_version(ApiVersion::new("1.1").unwrap());

        assert_eq!(base.url(), "https://api.xero.com/api.xro/2.0/Invoices");
        assert_eq!(other.url(), "https://api.xero.com/assets.xro/1.1/Invoices");
    }

    #[test]
    fn test_empty_resource_leaves_trailing_slash() {
        let endpoint = Endpoint::new(BaseUrl::default(), ApiFamily::Core);
        assert_eq!(endpoint.url(), "https://api.xero.com/api.xro/2.0/");
    }

    #[test]
    fn test_api_version_validation() {
        assert!(ApiVersion::new("2.0").is_ok());
        assert!(ApiVersion::new("1").is_ok());
        assert!(matches!(
            ApiVersion::new("v2"),
            Err(ConfigError::InvalidApiVersion { .. })
        ));
        assert!(ApiVersion::new("2.").is_err());
        assert!(ApiVersion::new("").is_err());
    }
}
