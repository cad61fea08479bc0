//! Token expiry bookkeeping.
//!
//! An [`Expiry`] is built either from an explicit instant or from a creation
//! time plus a lifetime in seconds, the way the token endpoint reports it
//! (`oauth_expires_in`). Persisted credential records use several spellings
//! for the same fields; [`Expiry::from_json`] accepts all of them.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::response::{coerce_timestamp, parse_timestamp};

/// When a token stops being valid.
///
/// An `Expiry` with no information at all is treated as already expired.
///
/// # Example
///
/// ```rust
/// use xero_api::auth::Expiry;
/// use chrono::{Duration, Utc};
///
/// let expiry = Expiry::after(Utc::now(), 1800);
/// assert!(!expiry.is_expired(0));
/// assert!(expiry.is_expired(3600));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expiry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_in: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at: Option<DateTime<Utc>>,
}

// Verify Expiry is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Expiry>();
};

impl Expiry {
    /// An expiry with no information. Always reported as expired.
    #[must_use]
    pub const fn unknown() -> Self {
        Self {
            created_at: None,
            expires_in: None,
            expires_at: None,
        }
    }

    /// Expires at a fixed instant.
    #[must_use]
    pub const fn at(expires_at: DateTime<Utc>) -> Self {
        Self {
            created_at: None,
            expires_in: None,
            expires_at: Some(expires_at),
        }
    }

    /// Expires `expires_in` seconds after `created_at`.
    #[must_use]
    pub const fn after(created_at: DateTime<Utc>, expires_in: i64) -> Self {
        Self {
            created_at: Some(created_at),
            expires_in: Some(expires_in),
            expires_at: None,
        }
    }

    /// Reads an expiry from a persisted JSON object.
    ///
    /// Field names are matched case-insensitively, with or without the
    /// `oauth_` prefix and with or without underscores: `oauth_expires_at`,
    /// `expiresAt`, `created_at`, `oauth_expires_in` and so on. Timestamps
    /// may be any encoding [`coerce_timestamp`] understands, or a string of
    /// digits holding epoch seconds.
    ///
    /// A lifetime without a creation time counts from now.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        let Value::Object(map) = value else {
            return Self::unknown();
        };

        let mut expiry = Self::unknown();
        for (key, value) in map {
            match normalize_key(key).as_str() {
                "expiresat" => expiry.expires_at = timestamp_value(value),
                "createdat" => expiry.created_at = timestamp_value(value),
                "expiresin" => expiry.expires_in = seconds_value(value),
                _ => {}
            }
        }

        if expiry.expires_in.is_some() && expiry.created_at.is_none() {
            expiry.created_at = Some(Utc::now());
        }
        expiry
    }

    /// Returns the expiry instant, if it can be determined.
    ///
    /// An explicit instant wins over creation time plus lifetime.
    #[must_use]
    pub fn known_expires_at(&self) -> Option<DateTime<Utc>> {
        if let Some(expires_at) = self.expires_at {
            return Some(expires_at);
        }
        let created_at = self.created_at?;
        let expires_in = Duration::try_seconds(self.expires_in?)?;
        created_at.checked_add_signed(expires_in)
    }

    /// Returns the expiry instant, or now if it cannot be determined.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.known_expires_at().unwrap_or_else(Utc::now)
    }

    /// Returns `true` if the token expires within `guard_seconds` from now.
    #[must_use]
    pub fn is_expired(&self, guard_seconds: i64) -> bool {
        self.is_expired_at(Utc::now(), guard_seconds)
    }

    /// Like [`is_expired`](Self::is_expired), against a given clock reading.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>, guard_seconds: i64) -> bool {
        let Some(expires_at) = self.known_expires_at() else {
            return true;
        };
        // A limit past the representable range counts as expired.
        Duration::try_seconds(guard_seconds)
            .and_then(|guard| now.checked_add_signed(guard))
            .map_or(true, |limit| expires_at < limit)
    }

    /// Time left until expiry; negative once expired.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.known_expires_at().map(|at| at - Utc::now())
    }
}

impl From<DateTime<Utc>> for Expiry {
    fn from(expires_at: DateTime<Utc>) -> Self {
        Self::at(expires_at)
    }
}

fn normalize_key(key: &str) -> String {
    let key: String = key
        .chars()
        .filter(|c| *c != '_' && *c != '-')
        .collect::<String>()
        .to_ascii_lowercase();
    key.strip_prefix("oauth").map_or(key.clone(), String::from)
}

/// Parses a timestamp that may also be a string of epoch seconds.
pub(crate) fn parse_stored_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
        return value
            .parse::<i64>()
            .ok()
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single());
    }
    parse_timestamp(value)
}

fn timestamp_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_stored_timestamp(s),
        other => coerce_timestamp(other),
    }
}

fn seconds_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
