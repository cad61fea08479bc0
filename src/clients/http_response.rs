//! HTTP response types for the Xero API client.
//!
//! This module provides the [`HttpResponse`] type and the Xero rate limit
//! information parsed from its headers.

use std::borrow::Cow;
use std::collections::HashMap;

use crate::response::{decode_body, ResponseEnvelope};

/// Rate limit information parsed from Xero's response headers.
///
/// Xero reports the remaining allowance per minute and per day, and names
/// the limit that was hit in `X-Rate-Limit-Problem` when a request is
/// rejected with 429.
///
/// # Example
///
/// ```rust
/// use xero_api::clients::RateLimit;
/// use std::collections::HashMap;
///
/// let mut headers = HashMap::new();
/// headers.insert("x-minlimit-remaining".to_string(), vec!["58".to_string()]);
/// headers.insert("x-daylimit-remaining".to_string(), vec!["4990".to_string()]);
///
/// let limit = RateLimit::from_headers(&headers).unwrap();
/// assert_eq!(limit.minute_remaining, Some(58));
/// assert_eq!(limit.day_remaining, Some(4990));
/// assert!(limit.problem.is_none());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RateLimit {
    /// The limit that was exceeded (`minute`, `daily`, ...), from `X-Rate-Limit-Problem`.
    pub problem: Option<String>,
    /// Calls remaining this minute, from `X-MinLimit-Remaining`.
    pub minute_remaining: Option<u32>,
    /// Calls remaining today, from `X-DayLimit-Remaining`.
    pub day_remaining: Option<u32>,
}

impl RateLimit {
    /// Parses rate limit headers. Returns `None` if none are present.
    ///
    /// Header names must already be lowercase.
    #[must_use]
    pub fn from_headers(headers: &HashMap<String, Vec<String>>) -> Option<Self> {
        let first = |name: &str| {
            headers
                .get(name)
                .and_then(|values| values.first())
                .map(|value| value.trim())
        };

        let limit = Self {
            problem: first("x-rate-limit-problem").map(String::from),
            minute_remaining: first("x-minlimit-remaining").and_then(|v| v.parse().ok()),
            day_remaining: first("x-daylimit-remaining").and_then(|v| v.parse().ok()),
        };

        if limit == Self::default() {
            None
        } else {
            Some(limit)
        }
    }
}

/// An HTTP response from the Xero API.
///
/// The body is kept as raw bytes: token endpoint responses are URL-encoded,
/// API responses may be JSON, XML or PDF. Use [`envelope`](Self::envelope)
/// for the normalized view.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    /// The HTTP status code.
    pub code: u16,
    /// Response headers, keyed by lowercase name (headers may have multiple values).
    pub headers: HashMap<String, Vec<String>>,
    /// The raw response body.
    pub body: Vec<u8>,
    /// Rate limit information, if Xero sent any.
    pub rate_limit: Option<RateLimit>,
    /// Seconds to wait before retrying (from `Retry-After` header).
    pub retry_after: Option<f64>,
}

impl HttpResponse {
    /// Creates a new `HttpResponse`, normalizing header names and parsing
    /// the rate limit headers.
    #[must_use]
    pub fn new(code: u16, headers: HashMap<String, Vec<String>>, body: impl Into<Vec<u8>>) -> Self {
        let mut normalized: HashMap<String, Vec<String>> = HashMap::new();
        for (name, values) in headers {
            normalized
                .entry(name.to_lowercase())
                .or_default()
                .extend(values);
        }

        let rate_limit = RateLimit::from_headers(&normalized);
        let retry_after = normalized
            .get("retry-after")
            .and_then(|values| values.first())
            .and_then(|value| value.trim().parse::<f64>().ok());

        Self {
            code,
            headers: normalized,
            body: body.into(),
            rate_limit,
            retry_after,
        }
    }

    /// Returns `true` if the response status code is in the 2xx range.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.code >= 200 && self.code <= 299
    }

    /// Returns the first value of a header, matched case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_lowercase())
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Returns the `Content-Type` header, if present.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Returns the body as text, replacing invalid UTF-8.
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Decodes the body into a JSON value according to its content type.
    #[must_use]
    pub fn json(&self) -> serde_json::Value {
        decode_body(self)
    }

    /// Decodes and classifies the body.
    #[must_use]
    pub fn envelope(&self) -> ResponseEnvelope {
        ResponseEnvelope::from_response(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::Structure;

    fn headers(pairs: &[(&str, &str)]) -> HashMap<String, Vec<String>> {
        let mut map: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in pairs {
            map.entry((*name).to_string())
                .or_default()
                .push((*value).to_string());
        }
        map
    }

    #[test]
    fn test_is_ok_returns_true_for_2xx() {
        for code in 200..=299 {
            let response = HttpResponse::new(code, HashMap::new(), "");
            assert!(response.is_ok(), "Expected is_ok() to be true for code {code}");
        }
    }

    #[test]
    fn test_is_ok_returns_false_for_4xx_and_5xx() {
        for code in [400, 401, 404, 429, 500, 503] {
            assert!(!HttpResponse::new(code, HashMap::new(), "").is_ok());
        }
    }

    #[test]
    fn test_header_names_are_normalized() {
        let response = HttpResponse::new(
            200,
            headers(&[("Content-Type", "application/json; charset=utf-8")]),
            "{}",
        );
        assert_eq!(
            response.content_type(),
            Some("application/json; charset=utf-8")
        );
        assert_eq!(response.header("CONTENT-TYPE"), response.content_type());
    }

    #[test]
    fn test_rate_limit_parsing() {
        let response = HttpResponse::new(
            429,
            headers(&[
                ("X-Rate-Limit-Problem", "minute"),
                ("X-MinLimit-Remaining", "0"),
                ("X-DayLimit-Remaining", "4200"),
                ("Retry-After", "35"),
            ]),
            "",
        );

        let limit = response.rate_limit.unwrap();
        assert_eq!(limit.problem.as_deref(), Some("minute"));
        assert_eq!(limit.minute_remaining, Some(0));
        assert_eq!(limit.day_remaining, Some(4200));
        assert!((response.retry_after.unwrap() - 35.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_no_rate_limit_headers() {
        let response = HttpResponse::new(200, HashMap::new(), "");
        assert!(response.rate_limit.is_none());
        assert!(response.retry_after.is_none());
    }

    #[test]
    fn test_envelope_from_json_body() {
        let response = HttpResponse::new(
            200,
            headers(&[("content-type", "application/json")]),
            r#"{"Status":"OK","ProviderName":"X","Contacts":[{"Name":"A"}]}"#,
        );
        let envelope = response.envelope();
        assert_eq!(envelope.structure(), Structure::OldFormat);
        assert_eq!(envelope.count(), 1);
    }

    #[test]
    fn test_envelope_from_namespaced_xml_body() {
        let body = r#"<Response xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:xsd="http://www.w3.org/2001/XMLSchema">
  <Id>6a6a1d1e-0000-0000-0000-000000000000</Id>
  <Status>OK</Status>
  <ProviderName>Test</ProviderName>
  <DateTimeUTC>2017-11-28T12:00:00.1234567</DateTimeUTC>
  <Invoices>
    <Invoice><InvoiceNumber>INV-001</InvoiceNumber></Invoice>
    <Invoice><InvoiceNumber>INV-002</InvoiceNumber></Invoice>
  </Invoices>
</Response>"#;
        let response = HttpResponse::new(
            200,
            headers(&[("content-type", "text/xml; charset=utf-8")]),
            body,
        );

        let envelope = response.envelope();
        assert_eq!(envelope.structure(), Structure::OldFormat);
        assert!(envelope.is_collection());
        assert_eq!(envelope.count(), 2);
        assert_eq!(envelope.first()["InvoiceNumber"].as_str(), Some("INV-001"));
        assert_eq!(envelope.collection().get(1)["invoiceNumber"].as_str(), Some("INV-002"));
        assert!(!envelope.metadata().contains("Invoices"));
        assert_eq!(envelope.metadata()["ProviderName"].as_str(), Some("Test"));
        assert!(envelope.metadata()["DateTimeUTC"].as_timestamp().is_some());
    }

    #[test]
    fn test_envelope_from_xml_body_with_single_item() {
        let body = r#"<Response xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <Status>OK</Status>
  <ProviderName>Test</ProviderName>
  <Contacts><Contact><Name>ABC</Name></Contact></Contacts>
</Response>"#;
        let response = HttpResponse::new(200, headers(&[("content-type", "application/xml")]), body);

        let envelope = response.envelope();
        assert!(envelope.is_collection());
        assert_eq!(envelope.count(), 1);
        assert_eq!(envelope.get("name").as_str(), Some("ABC"));
    }

    #[test]
    fn test_text_body() {
        let response = HttpResponse::new(401, HashMap::new(), "oauth_problem=token_expired");
        assert_eq!(response.text(), "oauth_problem=token_expired");
        assert_eq!(response.json()["httpStatusCode"], 401);
    }
}
