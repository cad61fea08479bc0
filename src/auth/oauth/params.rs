//! Parsing of token endpoint responses.
//!
//! The token endpoint answers with a URL-encoded body, usually labelled
//! `text/html`, both on success and on failure:
//!
//! ```text
//! oauth_token=NEWTOK&oauth_token_secret=NEWSEC&oauth_expires_in=1800&oauth_session_handle=H1
//! oauth_problem=token_expired&oauth_problem_advice=The+access+token+has+expired
//! ```
//!
//! API endpoints report OAuth problems the same way on a 401, which is how
//! an expired token is detected.

use chrono::{DateTime, Duration, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::auth::expiry::{parse_stored_timestamp, Expiry};
use crate::clients::HttpResponse;

/// Content types whose bodies are parsed as URL-encoded parameters.
const PARSED_CONTENT_TYPES: [&str; 3] = [
    "text/html",
    "text/plain",
    "application/x-www-form-urlencoded",
];

/// An `oauth_problem` code from the OAuth problem reporting extension.
///
/// # Example
///
/// ```rust
/// use xero_api::auth::oauth::ProblemCode;
///
/// assert_eq!("token_expired".parse::<ProblemCode>(), Ok(ProblemCode::TokenExpired));
/// assert_eq!(ProblemCode::from("rate limit exceeded").as_str(), "rate limit exceeded");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ProblemCode {
    /// `version_rejected`
    VersionRejected,
    /// `parameter_absent`
    ParameterAbsent,
    /// `parameter_rejected`
    ParameterRejected,
    /// `timestamp_refused`
    TimestampRefused,
    /// `nonce_used`
    NonceUsed,
    /// `signature_method_rejected`
    SignatureMethodRejected,
    /// `signature_invalid`
    SignatureInvalid,
    /// `consumer_key_unknown`
    ConsumerKeyUnknown,
    /// `consumer_key_rejected`
    ConsumerKeyRejected,
    /// `consumer_key_refused`
    ConsumerKeyRefused,
    /// `token_used`
    TokenUsed,
    /// `token_expired`: the access token can be renewed.
    TokenExpired,
    /// `token_revoked`
    TokenRevoked,
    /// `token_rejected`: the token does not match the consumer. Not retryable.
    TokenRejected,
    /// `additional_authorization_required`
    AdditionalAuthorizationRequired,
    /// `permission_unknown`
    PermissionUnknown,
    /// `permission_denied`
    PermissionDenied,
    /// `user_refused`
    UserRefused,
    /// Any code not listed above.
    Other(String),
}

impl ProblemCode {
    /// Returns the wire form of the code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::VersionRejected => "version_rejected",
            Self::ParameterAbsent => "parameter_absent",
            Self::ParameterRejected => "parameter_rejected",
            Self::TimestampRefused => "timestamp_refused",
            Self::NonceUsed => "nonce_used",
            Self::SignatureMethodRejected => "signature_method_rejected",
            Self::SignatureInvalid => "signature_invalid",
            Self::ConsumerKeyUnknown => "consumer_key_unknown",
            Self::ConsumerKeyRejected => "consumer_key_rejected",
            Self::ConsumerKeyRefused => "consumer_key_refused",
            Self::TokenUsed => "token_used",
            Self::TokenExpired => "token_expired",
            Self::TokenRevoked => "token_revoked",
            Self::TokenRejected => "token_rejected",
            Self::AdditionalAuthorizationRequired => "additional_authorization_required",
            Self::PermissionUnknown => "permission_unknown",
            Self::PermissionDenied => "permission_denied",
            Self::UserRefused => "user_refused",
            Self::Other(code) => code,
        }
    }
}

impl From<&str> for ProblemCode {
    fn from(code: &str) -> Self {
        match code {
            "version_rejected" => Self::VersionRejected,
            "parameter_absent" => Self::ParameterAbsent,
            "parameter_rejected" => Self::ParameterRejected,
            "timestamp_refused" => Self::TimestampRefused,
            "nonce_used" => Self::NonceUsed,
            "signature_method_rejected" => Self::SignatureMethodRejected,
            "signature_invalid" => Self::SignatureInvalid,
            "consumer_key_unknown" => Self::ConsumerKeyUnknown,
            "consumer_key_rejected" => Self::ConsumerKeyRejected,
            "consumer_key_refused" => Self::ConsumerKeyRefused,
            "token_used" => Self::TokenUsed,
            "token_expired" => Self::TokenExpired,
            "token_revoked" => Self::TokenRevoked,
            "token_rejected" => Self::TokenRejected,
            "additional_authorization_required" => Self::AdditionalAuthorizationRequired,
            "permission_unknown" => Self::PermissionUnknown,
            "permission_denied" => Self::PermissionDenied,
            "user_refused" => Self::UserRefused,
            other => Self::Other(other.to_string()),
        }
    }
}

impl FromStr for ProblemCode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl fmt::Display for ProblemCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters returned by the token endpoint, or by an API endpoint
/// reporting an OAuth problem.
///
/// Keeps the raw parameters in their original order, plus the time they
/// were received so that `oauth_expires_in` can be turned into an instant.
///
/// # Thread Safety
///
/// `OAuthParams` is an immutable value and is `Send + Sync`.
///
/// # Example
///
/// ```rust
/// use xero_api::auth::oauth::OAuthParams;
///
/// let params = OAuthParams::from_body(
///     b"oauth_problem=token_rejected&oauth_problem_advice=Token+X+does+not+match",
///     Some("text/html; charset=utf-8"),
/// );
/// assert!(!params.has_token());
/// assert!(params.is_rejected());
/// assert_eq!(params.problem_advice(), Some("Token X does not match"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OAuthParams {
    params: Vec<(String, String)>,
    created_at: DateTime<Utc>,
}

// Verify OAuthParams is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<OAuthParams>();
    assert_send_sync::<ProblemCode>();
};

impl OAuthParams {
    /// Builds a parameter set from key/value pairs.
    ///
    /// `created_at` is taken from an `oauth_created_at` pair if present,
    /// otherwise it is the current time.
    #[must_use]
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let params: Vec<(String, String)> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let created_at = params
            .iter()
            .find(|(k, _)| k == "oauth_created_at")
            .and_then(|(_, v)| parse_stored_timestamp(v))
            .unwrap_or_else(Utc::now);

        Self { params, created_at }
    }

    /// Parses a response body.
    ///
    /// Only `text/html`, `text/plain` and `application/x-www-form-urlencoded`
    /// bodies are read; any other content type, or none, gives an empty
    /// parameter set.
    #[must_use]
    pub fn from_body(body: &[u8], content_type: Option<&str>) -> Self {
        let mime = content_type
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().to_ascii_lowercase());

        match mime {
            Some(mime) if PARSED_CONTENT_TYPES.contains(&mime.as_str()) => {
                Self::from_pairs(url::form_urlencoded::parse(body).into_owned())
            }
            _ => Self::from_pairs(Vec::<(String, String)>::new()),
        }
    }

    /// Parses the body of a response, whatever its status code.
    #[must_use]
    pub fn from_response(response: &HttpResponse) -> Self {
        Self::from_body(&response.body, response.content_type())
    }

    /// Replaces the time the parameters were received.
    #[must_use]
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Returns a parameter by its exact name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns all parameters in their original order.
    #[must_use]
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Returns `true` if there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// When the parameters were received.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The `oauth_token` value, if present and non-empty.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.get("oauth_token").filter(|token| !token.is_empty())
    }

    /// The `oauth_token_secret` value.
    #[must_use]
    pub fn token_secret(&self) -> Option<&str> {
        self.get("oauth_token_secret")
    }

    /// The `oauth_session_handle` value, if present and non-empty.
    #[must_use]
    pub fn session_handle(&self) -> Option<&str> {
        self.get("oauth_session_handle")
            .filter(|handle| !handle.is_empty())
    }

    /// Returns `true` if a token was issued.
    #[must_use]
    pub fn has_token(&self) -> bool {
        self.token().is_some()
    }

    /// The reported problem, if any.
    #[must_use]
    pub fn problem(&self) -> Option<ProblemCode> {
        self.get("oauth_problem")
            .filter(|code| !code.is_empty())
            .map(ProblemCode::from)
    }

    /// The human-readable advice accompanying a problem.
    #[must_use]
    pub fn problem_advice(&self) -> Option<&str> {
        self.get("oauth_problem_advice")
    }

    /// Returns `true` if the problem is an expired token, which can be renewed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.problem() == Some(ProblemCode::TokenExpired)
    }

    /// Returns `true` if the token was rejected. Renewing will not help.
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        self.problem() == Some(ProblemCode::TokenRejected)
    }

    /// The `oauth_expires_in` lifetime in seconds.
    #[must_use]
    pub fn expires_in(&self) -> Option<i64> {
        self.get("oauth_expires_in")
            .and_then(|value| value.trim().parse().ok())
    }

    /// The expiry described by these parameters.
    ///
    /// An explicit `oauth_expires_at` wins over `created_at` plus
    /// `oauth_expires_in`.
    #[must_use]
    pub fn expiry(&self) -> Expiry {
        if let Some(at) = self
            .get("oauth_expires_at")
            .and_then(parse_stored_timestamp)
        {
            return Expiry::at(at);
        }
        self.expires_in()
            .map_or_else(Expiry::unknown, |secs| Expiry::after(self.created_at, secs))
    }

    /// The expiry instant, or now if the parameters carry no expiry.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expiry().expires_at()
    }

    /// Returns `true` if the problem is an expired token, or the expiry
    /// falls within `guard_seconds` from now. Without any expiry information
    /// the token counts as expired.
    #[must_use]
    pub fn is_expired_at(&self, guard_seconds: i64) -> bool {
        self.is_expired() || self.expiry().is_expired(guard_seconds)
    }

    /// Time left until the token expires, if known.
    #[must_use]
    pub fn remaining_time(&self) -> Option<Duration> {
        self.expiry().remaining()
    }

    /// Returns the parameters with `oauth_expires_at` set to the expiry
    /// instant in epoch seconds.
    #[must_use]
    pub fn to_map(&self) -> Vec<(String, String)> {
        let mut map: Vec<(String, String)> = self
            .params
            .iter()
            .filter(|(key, _)| key != "oauth_expires_at")
            .cloned()
            .collect();
        map.push((
            "oauth_expires_at".to_string(),
            self.expires_at().timestamp().to_string(),
        ));
        map
    }
}

impl Serialize for OAuthParams {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let entries = self.to_map();
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (key, value) in &entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for OAuthParams {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ParamsVisitor;

        impl<'de> Visitor<'de> for ParamsVisitor {
            type Value = OAuthParams;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of OAuth parameters")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut pairs = Vec::new();
                while let Some((key, value)) = access.next_entry::<String, String>()? {
                    pairs.push((key, value));
                }
                Ok(OAuthParams::from_pairs(pairs))
            }
        }

        deserializer.deserialize_map(ParamsVisitor)
    }
}
