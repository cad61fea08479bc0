//! The request executor with transparent token renewal.
//!
//! This module provides [`RefreshingClient`], the main entry point for
//! talking to the Xero APIs.

use std::fmt;
use std::sync::Arc;

use crate::auth::oauth::{
    refresh_access_token, OAuth1Signer, OAuthParams, RequestSigner, SignaturePlacement,
};
use crate::auth::Credentials;
use crate::clients::errors::{ClientError, HttpError};
use crate::clients::http_request::{HttpMethod, HttpRequest};
use crate::clients::http_response::HttpResponse;
use crate::clients::signed::SignedClient;
use crate::clients::transport::{PreparedRequest, ReqwestTransport, Transport};
use crate::config::{Endpoint, XeroConfig};
use crate::response::parse_timestamp;

/// Library version from Cargo.toml.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Format of the `If-Modified-Since` header.
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Called with `(new, old)` credentials every time the token is renewed, so
/// the host application can persist the new token.
pub type TokenRefreshCallback = Arc<dyn Fn(&Credentials, &Credentials) + Send + Sync>;

/// Sends signed requests and renews the access token when it expires.
///
/// The client:
/// - Resolves relative paths against the configured API family and version
/// - Sets the `User-Agent`, `Accept` and `Content-Type` headers
/// - Moves a `modified-since` query parameter into an `If-Modified-Since` header
/// - Signs every request with the current [`Credentials`]
/// - When a renewable token is reported expired (401 with
///   `oauth_problem=token_expired`), renews it, notifies the
///   [`TokenRefreshCallback`] and retries the request once
///
/// Credentials without a session handle cannot be renewed; their requests
/// are sent without expiry detection.
///
/// # Thread Safety
///
/// `RefreshingClient` is `Send + Sync`. [`execute`](Self::execute) takes
/// `&mut self`, so sharing a client between tasks needs a
/// `tokio::sync::Mutex`, which also keeps two tasks from renewing the same
/// token at once.
///
/// # Example
///
/// ```rust,ignore
/// use xero_api::{Credentials, XeroConfig};
/// use xero_api::clients::RefreshingClient;
///
/// let mut client = RefreshingClient::new(XeroConfig::default(), credentials)
///     .on_token_refresh(|new, _old| save_credentials(new));
///
/// let response = client.get("Invoices").await?;
/// for invoice in &response.envelope() {
///     println!("{}", invoice["InvoiceNumber"]);
/// }
/// ```
pub struct RefreshingClient {
    config: XeroConfig,
    client: SignedClient,
    on_token_refresh: Option<TokenRefreshCallback>,
    force_token_refresh: bool,
    token_refreshed: bool,
    refreshed_token: Option<OAuthParams>,
}

// Verify RefreshingClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<RefreshingClient>();
};

impl RefreshingClient {
    /// Creates a client using the [`OAuth1Signer`] for the configured
    /// signature method and a [`ReqwestTransport`].
    #[must_use]
    pub fn new(config: XeroConfig, credentials: Credentials) -> Self {
        let signer = Arc::new(OAuth1Signer::new(config.signature_method()));
        Self::with_transport(config, credentials, signer, Arc::new(ReqwestTransport::new()))
    }

    /// Creates a client with a custom signer and transport.
    #[must_use]
    pub fn with_transport(
        config: XeroConfig,
        credentials: Credentials,
        signer: Arc<dyn RequestSigner>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            config,
            client: SignedClient::new(credentials, signer, transport),
            on_token_refresh: None,
            force_token_refresh: false,
            token_refreshed: false,
            refreshed_token: None,
        }
    }

    /// Sets the callback invoked with `(new, old)` credentials on renewal.
    #[must_use]
    pub fn on_token_refresh<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Credentials, &Credentials) + Send + Sync + 'static,
    {
        self.on_token_refresh = Some(Arc::new(callback));
        self
    }

    /// Renews the token after the next request whatever its response.
    ///
    /// Cleared once the token has been renewed. Mainly for testing.
    #[must_use]
    pub const fn force_token_refresh(mut self, force: bool) -> Self {
        self.force_token_refresh = force;
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &XeroConfig {
        &self.config
    }

    /// Returns the current credentials, rotated if the token was renewed.
    #[must_use]
    pub const fn credentials(&self) -> &Credentials {
        self.client.credentials()
    }

    /// Returns `true` if this client has renewed the token.
    #[must_use]
    pub const fn token_refreshed(&self) -> bool {
        self.token_refreshed
    }

    /// Returns the token endpoint response of the last renewal.
    #[must_use]
    pub const fn refreshed_token(&self) -> Option<&OAuthParams> {
        self.refreshed_token.as_ref()
    }

    /// Sends a GET request.
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub async fn get(&mut self, path: &str) -> Result<HttpResponse, ClientError> {
        let request = HttpRequest::builder(HttpMethod::Get, path)
            .build()
            .map_err(HttpError::from)?;
        self.execute(request).await
    }

    /// Sends a POST request with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub async fn post(
        &mut self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<HttpResponse, ClientError> {
        let request = HttpRequest::builder(HttpMethod::Post, path)
            .json(body)
            .build()
            .map_err(HttpError::from)?;
        self.execute(request).await
    }

    /// Sends a PUT request with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub async fn put(
        &mut self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<HttpResponse, ClientError> {
        let request = HttpRequest::builder(HttpMethod::Put, path)
            .json(body)
            .build()
            .map_err(HttpError::from)?;
        self.execute(request).await
    }

    /// Sends a DELETE request.
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub async fn delete(&mut self, path: &str) -> Result<HttpResponse, ClientError> {
        let request = HttpRequest::builder(HttpMethod::Delete, path)
            .build()
            .map_err(HttpError::from)?;
        self.execute(request).await
    }

    /// Sends a request, renewing the token and retrying once if the
    /// response reports it expired.
    ///
    /// The retry's outcome is final: a second expiry is returned as is.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Http`] for invalid requests and transport failures,
    ///   and for non-2xx responses if the transport reports them as errors
    /// - [`ClientError::OAuth`] if the token renewal fails
    /// - [`ClientError::Signing`] if the request cannot be signed
    pub async fn execute(&mut self, request: HttpRequest) -> Result<HttpResponse, ClientError> {
        let prepared = self.prepare(&request)?;

        if !self.client.credentials().is_renewable() {
            let outcome = self
                .client
                .send(prepared, SignaturePlacement::Header)
                .await;
            log_rate_limit(&outcome);
            return outcome;
        }

        let outcome = self
            .client
            .send(prepared.clone(), SignaturePlacement::Header)
            .await;

        let expired = match &outcome {
            Ok(response) => is_token_expired(response),
            Err(ClientError::Http(HttpError::Response(response))) => is_token_expired(response),
            Err(_) => false,
        };

        if !expired && !self.force_token_refresh {
            log_rate_limit(&outcome);
            return outcome;
        }

        tracing::debug!(forced = !expired, "Access token expired, renewing");
        self.refresh().await?;

        let outcome = self
            .client
            .send(prepared, SignaturePlacement::Header)
            .await;
        log_rate_limit(&outcome);
        outcome
    }

    /// Renews the access token now.
    ///
    /// Rotates the credentials, calls the [`TokenRefreshCallback`] and
    /// returns the new credentials.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::OAuth`] if the credentials cannot be renewed
    /// or the token endpoint issued no token.
    pub async fn refresh(&mut self) -> Result<&Credentials, ClientError> {
        let old = self.client.credentials().clone();
        let (new, params) = refresh_access_token(
            &self.config,
            &old,
            self.client.signer(),
            self.client.transport(),
        )
        .await?;

        if let Some(callback) = &self.on_token_refresh {
            callback(&new, &old);
        }

        self.client = self.client.with_credentials(new);
        self.force_token_refresh = false;
        self.token_refreshed = true;
        self.refreshed_token = Some(params);

        Ok(self.client.credentials())
    }

    /// Resolves a request into a prepared, unsigned request.
    fn prepare(&self, request: &HttpRequest) -> Result<PreparedRequest, ClientError> {
        request.verify().map_err(HttpError::from)?;

        let url = if request.is_absolute() {
            request.path.clone()
        } else {
            let family = request.api_family.unwrap_or_else(|| self.config.api_family());
            let mut endpoint = Endpoint::new(self.config.base_url().clone(), family);
            if family == self.config.api_family() {
                endpoint = endpoint.with_version(self.config.api_version().clone());
            }
            endpoint
                .with_resource(request.path.trim_start_matches('/'))
                .url()
        };

        let mut prepared = PreparedRequest::new(request.http_method, url);
        prepared.query.extend(request.query.iter().cloned());
        move_modified_since(&mut prepared);

        prepared.set_header("User-Agent", self.user_agent());
        prepared.set_header(
            "Accept",
            request.accept.unwrap_or_else(|| self.config.accept()).as_mime(),
        );
        if let Some(body_type) = request.body_type {
            prepared.set_header("Content-Type", body_type.as_content_type());
        }
        for (name, value) in &request.extra_headers {
            prepared.set_header(name.as_str(), value.as_str());
        }

        prepared.body.clone_from(&request.body);
        prepared.timeout = Some(request.timeout.unwrap_or_else(|| self.config.request_timeout()));

        Ok(prepared)
    }

    fn user_agent(&self) -> String {
        let prefix = self
            .config
            .user_agent_prefix()
            .map_or(String::new(), |prefix| format!("{prefix} | "));
        let rust_version = env!("CARGO_PKG_RUST_VERSION");
        format!("{prefix}Xero API Library v{SDK_VERSION} | Rust {rust_version}")
    }
}

impl fmt::Debug for RefreshingClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshingClient")
            .field("config", &self.config)
            .field("client", &self.client)
            .field("on_token_refresh", &self.on_token_refresh.is_some())
            .field("force_token_refresh", &self.force_token_refresh)
            .field("token_refreshed", &self.token_refreshed)
            .finish_non_exhaustive()
    }
}

fn is_token_expired(response: &HttpResponse) -> bool {
    response.code == 401 && OAuthParams::from_response(response).is_expired()
}

fn log_rate_limit(outcome: &Result<HttpResponse, ClientError>) {
    let response = match outcome {
        Ok(response) => response,
        Err(ClientError::Http(HttpError::Response(response))) => response.as_ref(),
        Err(_) => return,
    };
    if let Some(problem) = response
        .rate_limit
        .as_ref()
        .and_then(|limit| limit.problem.as_deref())
    {
        tracing::warn!(
            problem,
            retry_after = ?response.retry_after,
            "Xero rate limit exceeded"
        );
    }
}

/// Moves a `modified-since` query parameter into an `If-Modified-Since`
/// header. Matching ignores case, `-` and `_`.
fn move_modified_since(request: &mut PreparedRequest) {
    let is_modified_since = |name: &str| {
        let normalized: String = name
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        normalized == "ifmodifiedsince" || normalized == "modifiedsince"
    };

    let Some(index) = request
        .query
        .iter()
        .position(|(name, _)| is_modified_since(name))
    else {
        return;
    };

    let (_, value) = request.query.remove(index);
    request.query.retain(|(name, _)| !is_modified_since(name));

    let value = parse_timestamp(&value)
        .map_or(value, |at| at.format(HTTP_DATE_FORMAT).to_string());
    request.set_header("If-Modified-Since", value);
}
