//! Integration tests for token renewal against a mock Xero server.
//!
//! These tests run the [`RefreshingClient`] over the real `reqwest`
//! transport, with `wiremock` standing in for the API and the access token
//! endpoint.

use std::sync::{Arc, Mutex};

use serde_json::json;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{header, header_regex, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use xero_api::auth::oauth::OAuth1Signer;
use xero_api::clients::{ClientError, HttpError, HttpMethod, HttpRequest, ReqwestTransport};
use xero_api::response::Structure;
use xero_api::{
    BaseUrl, ConsumerKey, ConsumerSecret, Credentials, OAuthError, ProblemCode, RefreshingClient,
    XeroConfig,
};

const EXPIRED: &str =
    "oauth_problem=token_expired&oauth_problem_advice=The%20access%20token%20has%20expired";
const FRESH: &str =
    "oauth_token=NEWTOK&oauth_token_secret=NEWSEC&oauth_expires_in=1800&oauth_session_handle=H1";
const REJECTED: &str = "oauth_problem=token_rejected&oauth_problem_advice=Token+X+does+not+match";

fn config(server: &MockServer) -> XeroConfig {
    XeroConfig::builder()
        .base_url(BaseUrl::new(server.uri()).unwrap())
        .build()
        .unwrap()
}

fn credentials(session_handle: Option<&str>) -> Credentials {
    let credentials = Credentials::new(
        ConsumerKey::new("CK").unwrap(),
        ConsumerSecret::new("CS").unwrap(),
        "OLDTOK",
        "OLDSEC",
    )
    .unwrap();
    match session_handle {
        Some(handle) => credentials.with_session_handle(handle),
        None => credentials,
    }
}

fn oauth_response(status: u16, body: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_raw(body, "text/html; charset=utf-8")
}

fn json_response(body: &serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "application/json; charset=utf-8")
}

#[tokio::test]
async fn test_expired_token_is_renewed_and_request_retried_once() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api.xro/2.0/Invoices"))
        .respond_with(oauth_response(401, EXPIRED))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/oauth/AccessToken"))
        .and(query_param("oauth_token", "OLDTOK"))
        .and(query_param("oauth_session_handle", "H0"))
        .and(query_param("oauth_consumer_key", "CK"))
        .respond_with(oauth_response(200, FRESH))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api.xro/2.0/Invoices"))
        .and(header_regex("authorization", r#"oauth_token="NEWTOK""#))
        .respond_with(json_response(&json!({
            "Id": "6a6a1d1e-0000-0000-0000-000000000000",
            "Status": "OK",
            "ProviderName": "Test",
            "DateTimeUTC": "/Date(1511870400000)/",
            "Invoices": [{"InvoiceNumber": "INV-001"}, {"InvoiceNumber": "INV-002"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let saved: Arc<Mutex<Vec<(String, String)>>> = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&saved);

    let mut client = RefreshingClient::new(config(&server), credentials(Some("H0")))
        .on_token_refresh(move |new, old| {
            recorder.lock().unwrap().push((
                new.access_token().to_string(),
                old.access_token().to_string(),
            ));
        });

    let response = assert_ok!(client.get("Invoices").await);
    assert_eq!(response.code, 200);

    let envelope = response.envelope();
    assert_eq!(envelope.structure(), Structure::OldFormat);
    assert_eq!(envelope.count(), 2);
    assert_eq!(
        envelope.first()["invoiceNumber"].as_str(),
        Some("INV-001")
    );

    assert!(client.token_refreshed());
    assert_eq!(client.credentials().access_token(), "NEWTOK");
    assert_eq!(client.credentials().access_token_secret(), "NEWSEC");
    assert_eq!(client.credentials().session_handle(), Some("H1"));
    assert_eq!(client.credentials().consumer_key().as_ref(), "CK");
    assert_eq!(
        client.refreshed_token().and_then(|params| params.expires_in()),
        Some(1800)
    );
    assert_eq!(
        *saved.lock().unwrap(),
        vec![("NEWTOK".to_string(), "OLDTOK".to_string())]
    );

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
}

#[tokio::test]
async fn test_expiry_reported_as_error_is_still_renewed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api.xro/2.0/Contacts"))
        .respond_with(oauth_response(401, EXPIRED))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/oauth/AccessToken"))
        .respond_with(oauth_response(200, FRESH))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api.xro/2.0/Contacts"))
        .respond_with(json_response(&json!({"Contacts": []})))
        .mount(&server)
        .await;

    let mut client = RefreshingClient::with_transport(
        config(&server),
        credentials(Some("H0")),
        Arc::new(OAuth1Signer::default()),
        Arc::new(ReqwestTransport::new().error_for_status(true)),
    );

    let response = client.get("Contacts").await.unwrap();
    assert_eq!(response.code, 200);
    assert!(response.envelope().is_collection());
    assert!(client.token_refreshed());
}

#[tokio::test]
async fn test_rejected_refresh_is_fatal() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api.xro/2.0/Invoices"))
        .respond_with(oauth_response(401, EXPIRED))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/oauth/AccessToken"))
        .respond_with(oauth_response(401, REJECTED))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = RefreshingClient::new(config(&server), credentials(Some("H0")));
    let error = assert_err!(client.get("Invoices").await);

    match error {
        ClientError::OAuth(OAuthError::RefreshFailed {
            problem,
            advice,
            status,
        }) => {
            assert_eq!(problem, Some(ProblemCode::TokenRejected));
            assert_eq!(advice.as_deref(), Some("Token X does not match"));
            assert_eq!(status, 401);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!client.token_refreshed());
    assert_eq!(client.credentials().access_token(), "OLDTOK");
}

#[tokio::test]
async fn test_other_errors_are_not_renewed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api.xro/2.0/Invoices"))
        .respond_with(oauth_response(401, REJECTED))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/oauth/AccessToken"))
        .respond_with(oauth_response(200, FRESH))
        .expect(0)
        .mount(&server)
        .await;

    let mut client = RefreshingClient::with_transport(
        config(&server),
        credentials(Some("H0")),
        Arc::new(OAuth1Signer::default()),
        Arc::new(ReqwestTransport::new().error_for_status(true)),
    );

    let error = assert_err!(client.get("Invoices").await);
    let ClientError::Http(HttpError::Response(response)) = error else {
        panic!("expected an HTTP response error");
    };
    assert_eq!(response.code, 401);
    assert!(!client.token_refreshed());
}

#[tokio::test]
async fn test_credentials_without_session_handle_are_not_renewed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api.xro/2.0/Invoices"))
        .respond_with(oauth_response(401, EXPIRED))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/oauth/AccessToken"))
        .respond_with(oauth_response(200, FRESH))
        .expect(0)
        .mount(&server)
        .await;

    let mut client = RefreshingClient::new(config(&server), credentials(None));
    let response = client.get("Invoices").await.unwrap();

    assert_eq!(response.code, 401);
    assert!(!client.token_refreshed());
}

#[tokio::test]
async fn test_modified_since_is_sent_as_header() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api.xro/2.0/Contacts"))
        .and(header("if-modified-since", "Tue, 28 Nov 2017 12:00:00 GMT"))
        .and(query_param("page", "1"))
        .respond_with(json_response(&json!({"Contacts": [{"Name": "ABC"}]})))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = RefreshingClient::new(config(&server), credentials(None));
    let request = HttpRequest::builder(HttpMethod::Get, "Contacts")
        .query_param("page", "1")
        .query_param("modified_since", "2017-11-28T12:00:00Z")
        .build()
        .unwrap();

    let response = client.execute(request).await.unwrap();
    assert_eq!(response.code, 200);

    let requests = server.received_requests().await.unwrap();
    assert!(!requests[0].url.as_str().contains("modified"));
}

#[tokio::test]
async fn test_default_headers() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api.xro/2.0/Contacts"))
        .and(header("accept", "application/json"))
        .and(header("content-type", "application/json"))
        .and(header_regex("user-agent", r"^TestApp/1\.0 \| Xero API Library v"))
        .and(header_regex("authorization", r#"^OAuth oauth_consumer_key="CK""#))
        .respond_with(json_response(&json!({"Contacts": [{"Name": "ABC"}]})))
        .expect(1)
        .mount(&server)
        .await;

    let config = XeroConfig::builder()
        .base_url(BaseUrl::new(server.uri()).unwrap())
        .user_agent_prefix("TestApp/1.0")
        .build()
        .unwrap();
    let mut client = RefreshingClient::new(config, credentials(None));

    client
        .post("Contacts", &json!({"Contacts": [{"Name": "ABC"}]}))
        .await
        .unwrap();
}
