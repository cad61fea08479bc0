//! Access token renewal.
//!
//! Partner application tokens expire after 30 minutes. The session handle
//! issued with a token renews it at the access token endpoint:
//!
//! 1. `GET {base}/oauth/AccessToken?oauth_token=..&oauth_session_handle=..&oauth_consumer_key=..`,
//!    signed in the query string, with the refresh timeout
//! 2. The URL-encoded response is parsed with [`OAuthParams`]
//! 3. A response without a token is fatal: [`OAuthError::RefreshFailed`]
//! 4. Token, secret and expiry are rotated; the session handle is kept
//!    unless a new one is issued
//!
//! # Example
//!
//! ```rust,ignore
//! use xero_api::auth::oauth::{refresh_access_token, OAuth1Signer};
//! use xero_api::clients::ReqwestTransport;
//!
//! let (credentials, params) =
//!     refresh_access_token(&config, &credentials, &OAuth1Signer::default(), &ReqwestTransport::new())
//!         .await?;
//! println!("New token expires at {}", params.expires_at());
//! ```

use crate::auth::oauth::{OAuthError, OAuthParams, RequestSigner, SignaturePlacement};
use crate::auth::Credentials;
use crate::clients::{HttpError, HttpMethod, PreparedRequest, Transport};
use crate::config::XeroConfig;

/// Renews the access token held by `credentials`.
///
/// Returns the rotated credentials together with the parsed token endpoint
/// response.
///
/// # Errors
///
/// - [`OAuthError::NotRenewable`] if the credentials have no session handle
/// - [`OAuthError::RefreshFailed`] if the endpoint issued no token
/// - [`OAuthError::HttpError`] on transport failures
/// - [`OAuthError::Signing`] if the request cannot be signed
pub async fn refresh_access_token(
    config: &XeroConfig,
    credentials: &Credentials,
    signer: &dyn RequestSigner,
    transport: &dyn Transport,
) -> Result<(Credentials, OAuthParams), OAuthError> {
    let session_handle = credentials
        .session_handle()
        .ok_or(OAuthError::NotRenewable)?;

    let mut request = PreparedRequest::new(HttpMethod::Get, config.access_token_url());
    request.query = vec![
        (
            "oauth_token".to_string(),
            credentials.access_token().to_string(),
        ),
        (
            "oauth_session_handle".to_string(),
            session_handle.to_string(),
        ),
        (
            "oauth_consumer_key".to_string(),
            credentials.consumer_key().as_ref().to_string(),
        ),
    ];
    request.timeout = Some(config.refresh_timeout());
    signer.sign(&mut request, credentials, SignaturePlacement::Query)?;

    tracing::debug!(url = %request.url, "Refreshing access token");

    let response = match transport.send(request).await {
        Ok(response) => response,
        Err(HttpError::Response(response)) => *response,
        Err(e) => return Err(e.into()),
    };

    let params = OAuthParams::from_response(&response);
    let Some(rotated) = credentials.with_fresh_token(&params) else {
        let problem = params.problem();
        let advice = params.problem_advice().map(String::from);
        tracing::warn!(
            status = response.code,
            problem = ?problem,
            advice = ?advice,
            "Access token refresh failed"
        );
        return Err(OAuthError::RefreshFailed {
            problem,
            advice,
            status: response.code,
        });
    };

    tracing::info!(expires_at = %params.expires_at(), "Access token refreshed");
    Ok((rotated, params))
}
