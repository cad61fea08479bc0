//! Credential state for signed requests.
//!
//! This module provides the [`Credentials`] type: the consumer key pair plus
//! the current access token, which rotates whenever the token is renewed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::auth::oauth::OAuthParams;
use crate::auth::Expiry;
use crate::config::{ConsumerKey, ConsumerSecret};
use crate::error::ConfigError;

/// The credentials used to sign requests.
///
/// The consumer key and secret identify the application and never change.
/// The access token, its secret, the session handle used to renew it and
/// its expiry are replaced together on every renewal; a renewal always
/// produces a new `Credentials` value.
///
/// Serializes with serde so the host application can persist it. `Debug`
/// output masks the secrets.
///
/// # Thread Safety
///
/// `Credentials` is `Send + Sync`, making it safe to share across threads.
///
/// # Example
///
/// ```rust
/// use xero_api::{ConsumerKey, ConsumerSecret, Credentials};
///
/// let credentials = Credentials::new(
///     ConsumerKey::new("consumer-key").unwrap(),
///     ConsumerSecret::new("consumer-secret").unwrap(),
///     "access-token",
///     "token-secret",
/// )
/// .unwrap()
/// .with_session_handle("handle");
///
/// assert!(credentials.is_renewable());
/// assert!(!format!("{credentials:?}").contains("token-secret"));
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    consumer_key: ConsumerKey,
    consumer_secret: ConsumerSecret,
    access_token: String,
    access_token_secret: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    session_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at: Option<DateTime<Utc>>,
}

// Verify Credentials is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Credentials>();
};

impl Credentials {
    /// Creates credentials for an access token.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyAccessToken`] if `access_token` is empty.
    pub fn new(
        consumer_key: ConsumerKey,
        consumer_secret: ConsumerSecret,
        access_token: impl Into<String>,
        access_token_secret: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let access_token = access_token.into();
        if access_token.is_empty() {
            return Err(ConfigError::EmptyAccessToken);
        }
        Ok(Self {
            consumer_key,
            consumer_secret,
            access_token,
            access_token_secret: access_token_secret.into(),
            session_handle: None,
            expires_at: None,
        })
    }

    /// Returns a copy with the given session handle.
    #[must_use]
    pub fn with_session_handle(mut self, session_handle: impl Into<String>) -> Self {
        let handle = session_handle.into();
        self.session_handle = (!handle.is_empty()).then_some(handle);
        self
    }

    /// Returns a copy with the given expiry instant.
    #[must_use]
    pub const fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Returns a copy with a different access token and secret.
    ///
    /// The session handle and expiry are kept.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyAccessToken`] if `access_token` is empty.
    pub fn with_access_token(
        &self,
        access_token: impl Into<String>,
        access_token_secret: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let access_token = access_token.into();
        if access_token.is_empty() {
            return Err(ConfigError::EmptyAccessToken);
        }
        Ok(Self {
            access_token,
            access_token_secret: access_token_secret.into(),
            ..self.clone()
        })
    }

    /// Returns the credentials rotated to the token in `params`.
    ///
    /// Token, secret and expiry are replaced. The session handle is kept
    /// unless `params` supplies a new one. Returns `None` if `params`
    /// carries no token.
    #[must_use]
    pub fn with_fresh_token(&self, params: &OAuthParams) -> Option<Self> {
        let token = params.token()?;
        Some(Self {
            consumer_key: self.consumer_key.clone(),
            consumer_secret: self.consumer_secret.clone(),
            access_token: token.to_string(),
            access_token_secret: params.token_secret().unwrap_or_default().to_string(),
            session_handle: params
                .session_handle()
                .map(String::from)
                .or_else(|| self.session_handle.clone()),
            expires_at: Some(params.expires_at()),
        })
    }

    /// Returns the consumer key.
    #[must_use]
    pub const fn consumer_key(&self) -> &ConsumerKey {
        &self.consumer_key
    }

    /// Returns the consumer secret.
    #[must_use]
    pub const fn consumer_secret(&self) -> &ConsumerSecret {
        &self.consumer_secret
    }

    /// Returns the access token.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Returns the access token secret.
    #[must_use]
    pub fn access_token_secret(&self) -> &str {
        &self.access_token_secret
    }

    /// Returns the session handle used to renew the token.
    #[must_use]
    pub fn session_handle(&self) -> Option<&str> {
        self.session_handle.as_deref()
    }

    /// Returns when the access token expires, if known.
    #[must_use]
    pub const fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Returns `true` if the token can be renewed.
    #[must_use]
    pub const fn is_renewable(&self) -> bool {
        self.session_handle.is_some()
    }

    /// Returns the token expiry.
    #[must_use]
    pub fn expiry(&self) -> Expiry {
        self.expires_at.map_or_else(Expiry::unknown, Expiry::at)
    }

    /// Returns `true` if the token expires within `guard_seconds` from now.
    ///
    /// Credentials without a known expiry are never reported as expired;
    /// their expiry is only discovered when a request is rejected.
    #[must_use]
    pub fn is_expired(&self, guard_seconds: i64) -> bool {
        self.expires_at.is_some() && self.expiry().is_expired(guard_seconds)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &self.consumer_secret)
            .field("access_token", &self.access_token)
            .field("access_token_secret", &"*****")
            .field("session_handle", &self.session_handle.as_ref().map(|_| "*****"))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn credentials() -> Credentials {
        Credentials::new(
            ConsumerKey::new("CK").unwrap(),
            ConsumerSecret::new("CS").unwrap(),
            "OLDTOK",
            "OLDSEC",
        )
        .unwrap()
    }

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_new_rejects_empty_token() {
        let result = Credentials::new(
            ConsumerKey::new("CK").unwrap(),
            ConsumerSecret::new("CS").unwrap(),
            "",
            "secret",
        );
        assert!(matches!(result, Err(ConfigError::EmptyAccessToken)));
    }

    #[test]
    fn test_with_fresh_token_rotates_token_only() {
        let old = credentials().with_session_handle("H0");
        let params = OAuthParams::from_body(
            b"oauth_token=NEWTOK&oauth_token_secret=NEWSEC&oauth_expires_in=1800&oauth_session_handle=H1",
            Some("text/html"),
        )
        .with_created_at(utc("2017-11-28T12:00:00Z"));

        let new = old.with_fresh_token(&params).unwrap();

        assert_eq!(new.access_token(), "NEWTOK");
        assert_eq!(new.access_token_secret(), "NEWSEC");
        assert_eq!(new.session_handle(), Some("H1"));
        assert_eq!(new.expires_at(), Some(utc("2017-11-28T12:30:00Z")));
        assert_eq!(new.consumer_key(), old.consumer_key());
        assert_eq!(new.consumer_secret(), old.consumer_secret());
        assert_eq!(old.access_token(), "OLDTOK");
    }

    #[test]
    fn test_with_fresh_token_keeps_session_handle() {
        let old = credentials().with_session_handle("H0");
        let params = OAuthParams::from_pairs([("oauth_token", "T"), ("oauth_token_secret", "S")]);

        let new = old.with_fresh_token(&params).unwrap();
        assert_eq!(new.session_handle(), Some("H0"));
    }

    #[test]
    fn test_with_fresh_token_requires_token() {
        let params = OAuthParams::from_pairs([("oauth_problem", "token_rejected")]);
        assert!(credentials().with_fresh_token(&params).is_none());
    }

    #[test]
    fn test_is_expired_with_guard() {
        let creds = credentials().with_expires_at(Utc::now() + Duration::minutes(5));
        assert!(!creds.is_expired(0));
        assert!(creds.is_expired(600));

        assert!(!credentials().is_expired(600));
    }

    #[test]
    fn test_is_expired_with_huge_guard() {
        let creds = credentials().with_expires_at(Utc::now() + Duration::minutes(5));
        assert!(creds.is_expired(9_000_000_000_000_000));
        assert!(creds.is_expired(i64::MAX));
    }

    #[test]
    fn test_is_renewable() {
        assert!(!credentials().is_renewable());
        assert!(credentials().with_session_handle("H").is_renewable());
        assert!(!credentials().with_session_handle("").is_renewable());
    }

    #[test]
    fn test_with_access_token() {
        let creds = credentials()
            .with_session_handle("H")
            .with_access_token("T2", "S2")
            .unwrap();
        assert_eq!(creds.access_token(), "T2");
        assert_eq!(creds.session_handle(), Some("H"));
        assert!(credentials().with_access_token("", "S").is_err());
    }

    #[test]
    fn test_debug_masks_secrets() {
        let debug = format!("{:?}", credentials().with_session_handle("HANDLE"));
        assert!(debug.contains("OLDTOK"));
        assert!(!debug.contains("OLDSEC"));
        assert!(!debug.contains("HANDLE"));
        assert!(!debug.contains("\"CS\""));
    }

    #[test]
    fn test_serde_round_trip() {
        let creds = credentials()
            .with_session_handle("H")
            .with_expires_at(utc("2017-11-28T12:30:00Z"));
        let value = serde_json::to_value(&creds).unwrap();
        assert_eq!(
            value,
            json!({
                "consumer_key": "CK",
                "consumer_secret": "CS",
                "access_token": "OLDTOK",
                "access_token_secret": "OLDSEC",
                "session_handle": "H",
                "expires_at": "2017-11-28T12:30:00Z"
            })
        );

        let back: Credentials = serde_json::from_value(value).unwrap();
        assert_eq!(back, creds);
    }
}
