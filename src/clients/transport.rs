//! The HTTP transport seam.
//!
//! Everything above this module works with [`PreparedRequest`] and
//! [`HttpResponse`] values; the [`Transport`] trait is the only place bytes
//! hit the network. [`ReqwestTransport`] is the default implementation.
//! Tests and hosts with their own HTTP stack can provide another.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use crate::clients::errors::HttpError;
use crate::clients::http_request::HttpMethod;
use crate::clients::http_response::HttpResponse;

/// A fully resolved request, ready to be signed and sent.
///
/// `url` carries no query string; query parameters are kept separately so
/// the signer can include them in the signature base string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedRequest {
    /// The HTTP method.
    pub method: HttpMethod,
    /// The absolute URL without query string.
    pub url: String,
    /// Query parameters, in order.
    pub query: Vec<(String, String)>,
    /// Request headers.
    pub headers: Vec<(String, String)>,
    /// The request body.
    pub body: Option<String>,
    /// Per-request timeout.
    pub timeout: Option<Duration>,
}

impl PreparedRequest {
    /// Creates a request for an absolute URL.
    ///
    /// Any query string already present on `url` is split off into
    /// [`query`](Self::query).
    #[must_use]
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        let url = url.into();
        let (url, query) = match url.split_once('?') {
            Some((base, query)) => (
                base.to_string(),
                url::form_urlencoded::parse(query.as_bytes())
                    .into_owned()
                    .collect(),
            ),
            None => (url, Vec::new()),
        };

        Self {
            method,
            url,
            query,
            headers: Vec::new(),
            body: None,
            timeout: None,
        }
    }

    /// Returns the first header with this name, matched case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Sets a header, replacing any existing value with the same name.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers.retain(|(key, _)| !key.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
    }

    /// Builds the final URL including the query string.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::InvalidUrl`] if the URL cannot be parsed.
    pub fn full_url(&self) -> Result<url::Url, HttpError> {
        let mut url = url::Url::parse(&self.url).map_err(|source| HttpError::InvalidUrl {
            url: self.url.clone(),
            source,
        })?;
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.query);
        }
        Ok(url)
    }
}

/// Sends prepared requests.
///
/// Implementations return non-2xx responses either as `Ok` or as
/// [`HttpError::Response`]; the refreshing executor handles both.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    /// Sends one request and returns its response.
    async fn send(&self, request: PreparedRequest) -> Result<HttpResponse, HttpError>;
}

/// [`Transport`] backed by `reqwest`.
///
/// # Thread Safety
///
/// `ReqwestTransport` is `Send + Sync`; the inner `reqwest::Client` pools
/// connections and is cheap to clone.
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    error_for_status: bool,
}

// Verify ReqwestTransport is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ReqwestTransport>();
};

impl ReqwestTransport {
    /// Creates a transport with a default `reqwest` client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport around an existing `reqwest` client.
    #[must_use]
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            error_for_status: false,
        }
    }

    /// When enabled, non-2xx responses are returned as
    /// [`HttpError::Response`] instead of `Ok`.
    #[must_use]
    pub const fn error_for_status(mut self, enabled: bool) -> Self {
        self.error_for_status = enabled;
        self
    }

    fn parse_response_headers(
        headers: &reqwest::header::HeaderMap,
    ) -> HashMap<String, Vec<String>> {
        let mut result: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in headers {
            let key = name.as_str().to_lowercase();
            let value = value.to_str().unwrap_or_default().to_string();
            result.entry(key).or_default().push(value);
        }
        result
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: PreparedRequest) -> Result<HttpResponse, HttpError> {
        let url = request.full_url()?;

        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };

        tracing::debug!(method = %request.method, url = %request.url, "Sending request");

        let mut builder = self.client.request(method, url);
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let res = builder.send().await?;
        let code = res.status().as_u16();
        let headers = Self::parse_response_headers(res.headers());
        let body = res.bytes().await?.to_vec();

        let response = HttpResponse::new(code, headers, body);
        tracing::debug!(status = code, "Received response");

        if self.error_for_status && !response.is_ok() {
            return Err(HttpError::Response(Box::new(response)));
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepared_request_splits_query() {
        let request = PreparedRequest::new(
            HttpMethod::Get,
            "https://api.xero.com/api.xro/2.0/Invoices?page=2&where=Type%3D%3D%22ACCREC%22",
        );
        assert_eq!(request.url, "https://api.xero.com/api.xro/2.0/Invoices");
        assert_eq!(
            request.query,
            vec![
                ("page".to_string(), "2".to_string()),
                ("where".to_string(), "Type==\"ACCREC\"".to_string()),
            ]
        );
    }

    #[test]
    fn test_full_url_appends_query() {
        let mut request = PreparedRequest::new(HttpMethod::Get, "https://api.xero.com/oauth/AccessToken");
        request.query.push(("oauth_token".to_string(), "a b".to_string()));
        let url = request.full_url().unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.xero.com/oauth/AccessToken?oauth_token=a+b"
        );
    }

    #[test]
    fn test_full_url_rejects_relative() {
        let request = PreparedRequest::new(HttpMethod::Get, "Invoices");
        assert!(matches!(
            request.full_url(),
            Err(HttpError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_set_header_replaces_case_insensitively() {
        let mut request = PreparedRequest::new(HttpMethod::Get, "https://api.xero.com/");
        request.set_header("Accept", "text/xml");
        request.set_header("accept", "application/json");
        assert_eq!(request.headers.len(), 1);
        assert_eq!(request.header("ACCEPT"), Some("application/json"));
    }

    #[test]
    fn test_transport_is_object_safe() {
        let transport: std::sync::Arc<dyn Transport> = std::sync::Arc::new(ReqwestTransport::new());
        assert!(format!("{transport:?}").contains("ReqwestTransport"));
    }
}
