//! OAuth 1.0a request signing.
//!
//! Every API call and every token renewal is signed with the consumer key
//! pair and the current access token. [`OAuth1Signer`] implements the
//! `HMAC-SHA256` and `PLAINTEXT` methods; hosts with other requirements
//! (for example RSA-SHA1 private applications) provide their own
//! [`RequestSigner`].
//!
//! # Example
//!
//! ```rust
//! use xero_api::auth::oauth::{OAuth1Signer, RequestSigner, SignaturePlacement};
//! use xero_api::clients::{HttpMethod, PreparedRequest};
//! use xero_api::{ConsumerKey, ConsumerSecret, Credentials};
//!
//! let credentials = Credentials::new(
//!     ConsumerKey::new("CK").unwrap(),
//!     ConsumerSecret::new("CS").unwrap(),
//!     "TOK",
//!     "TS",
//! )
//! .unwrap();
//!
//! let mut request = PreparedRequest::new(HttpMethod::Get, "https://api.xero.com/api.xro/2.0/Invoices");
//! OAuth1Signer::default()
//!     .sign(&mut request, &credentials, SignaturePlacement::Header)
//!     .unwrap();
//!
//! assert!(request.header("Authorization").unwrap().starts_with("OAuth "));
//! ```

use base64::prelude::*;
use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha2::Sha256;
use std::fmt;

use crate::auth::oauth::SigningError;
use crate::auth::Credentials;
use crate::clients::{DataType, PreparedRequest};
use crate::config::SignatureMethod;

type HmacSha256 = Hmac<Sha256>;

const NONCE_LENGTH: usize = 32;

/// Where the signature goes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SignaturePlacement {
    /// In an `Authorization: OAuth ...` header.
    #[default]
    Header,
    /// In the query string. Used for token renewal.
    Query,
}

/// Signs prepared requests.
pub trait RequestSigner: Send + Sync + fmt::Debug {
    /// Adds the OAuth protocol parameters and signature to `request`.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError`] if the request cannot be signed.
    fn sign(
        &self,
        request: &mut PreparedRequest,
        credentials: &Credentials,
        placement: SignaturePlacement,
    ) -> Result<(), SigningError>;
}

/// OAuth 1.0a signer for the `HMAC-SHA256` and `PLAINTEXT` methods.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OAuth1Signer {
    method: SignatureMethod,
}

// Verify OAuth1Signer is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<OAuth1Signer>();
};

impl OAuth1Signer {
    /// Creates a signer for the given method.
    #[must_use]
    pub const fn new(method: SignatureMethod) -> Self {
        Self { method }
    }

    /// Returns the signature method.
    #[must_use]
    pub const fn method(&self) -> SignatureMethod {
        self.method
    }

    /// Signs with a fixed nonce and timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError`] if the request URL is not absolute.
    pub fn sign_with(
        &self,
        request: &mut PreparedRequest,
        credentials: &Credentials,
        placement: SignaturePlacement,
        nonce: &str,
        timestamp: i64,
    ) -> Result<(), SigningError> {
        let timestamp = timestamp.to_string();
        let protocol: Vec<(String, String)> = [
            ("oauth_consumer_key", credentials.consumer_key().as_ref()),
            ("oauth_nonce", nonce),
            ("oauth_signature_method", self.method.as_str()),
            ("oauth_timestamp", timestamp.as_str()),
            ("oauth_token", credentials.access_token()),
            ("oauth_version", "1.0"),
        ]
        .into_iter()
        .filter(|(name, _)| !request.query.iter().any(|(key, _)| key == name))
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();

        let key = format!(
            "{}&{}",
            percent_encode(credentials.consumer_secret().as_ref()),
            percent_encode(credentials.access_token_secret())
        );

        let signature = match self.method {
            SignatureMethod::Plaintext => key,
            SignatureMethod::HmacSha256 => {
                let mut params = request.query.clone();
                params.extend(protocol.iter().cloned());
                if is_form_body(request) {
                    if let Some(body) = &request.body {
                        params.extend(url::form_urlencoded::parse(body.as_bytes()).into_owned());
                    }
                }
                let base = signature_base_string(request.method.as_str(), &request.url, &params)?;
                hmac_sha256(&key, &base)?
            }
        };

        match placement {
            SignaturePlacement::Header => {
                let fields: Vec<String> = protocol
                    .iter()
                    .map(|(name, value)| (name.as_str(), value.as_str()))
                    .chain(std::iter::once(("oauth_signature", signature.as_str())))
                    .map(|(name, value)| format!("{name}=\"{}\"", percent_encode(value)))
                    .collect();
                request.set_header("Authorization", format!("OAuth {}", fields.join(", ")));
            }
            SignaturePlacement::Query => {
                request.query.extend(protocol);
                request.query.push(("oauth_signature".to_string(), signature));
            }
        }

        Ok(())
    }
}

impl RequestSigner for OAuth1Signer {
    fn sign(
        &self,
        request: &mut PreparedRequest,
        credentials: &Credentials,
        placement: SignaturePlacement,
    ) -> Result<(), SigningError> {
        let nonce: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(NONCE_LENGTH)
            .map(char::from)
            .collect();
        self.sign_with(
            request,
            credentials,
            placement,
            &nonce,
            Utc::now().timestamp(),
        )
    }
}

/// Builds the OAuth 1.0a signature base string.
///
/// `METHOD&enc(normalized url)&enc(sorted, encoded parameters)`.
///
/// # Errors
///
/// Returns [`SigningError::InvalidUrl`] if `url` is not an absolute URL.
pub fn signature_base_string(
    method: &str,
    url: &str,
    params: &[(String, String)],
) -> Result<String, SigningError> {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(key, value)| (percent_encode(key), percent_encode(value)))
        .collect();
    encoded.sort();

    let normalized: Vec<String> = encoded
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect();

    Ok(format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        percent_encode(&normalize_url(url)?),
        percent_encode(&normalized.join("&"))
    ))
}

/// Scheme and host lowercased, default port dropped, no query or fragment.
fn normalize_url(raw: &str) -> Result<String, SigningError> {
    let invalid = || SigningError::InvalidUrl {
        url: raw.to_string(),
    };
    let url = url::Url::parse(raw).map_err(|_| invalid())?;
    let host = url.host_str().ok_or_else(invalid)?;

    Ok(match url.port() {
        Some(port) => format!("{}://{}:{port}{}", url.scheme(), host, url.path()),
        None => format!("{}://{}{}", url.scheme(), host, url.path()),
    })
}

fn percent_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

fn is_form_body(request: &PreparedRequest) -> bool {
    request
        .header("Content-Type")
        .is_some_and(|ct| ct.starts_with(DataType::Form.as_content_type()))
}

fn hmac_sha256(key: &str, message: &str) -> Result<String, SigningError> {
    let mut mac =
        HmacSha256::new_from_slice(key.as_bytes()).map_err(|_| SigningError::InvalidKey)?;
    mac.update(message.as_bytes());
    Ok(BASE64_STANDARD.encode(mac.finalize().into_bytes()))
}
