//! A transport bound to one set of credentials.

use std::sync::Arc;

use crate::auth::oauth::{RequestSigner, SignaturePlacement};
use crate::auth::Credentials;
use crate::clients::errors::ClientError;
use crate::clients::http_response::HttpResponse;
use crate::clients::transport::{PreparedRequest, Transport};

/// Signs every request with one fixed set of credentials, then sends it.
///
/// A `SignedClient` never changes its credentials. When the token rotates,
/// [`RefreshingClient`](crate::clients::RefreshingClient) builds a new one
/// with [`with_credentials`](Self::with_credentials); the signer and the
/// transport are shared between the two.
///
/// # Thread Safety
///
/// `SignedClient` is `Send + Sync` and cheap to clone.
#[derive(Clone, Debug)]
pub struct SignedClient {
    credentials: Credentials,
    signer: Arc<dyn RequestSigner>,
    transport: Arc<dyn Transport>,
}

// Verify SignedClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<SignedClient>();
};

impl SignedClient {
    /// Creates a client for `credentials`.
    #[must_use]
    pub fn new(
        credentials: Credentials,
        signer: Arc<dyn RequestSigner>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            credentials,
            signer,
            transport,
        }
    }

    /// Returns a client for other credentials sharing this client's signer
    /// and transport.
    #[must_use]
    pub fn with_credentials(&self, credentials: Credentials) -> Self {
        Self {
            credentials,
            signer: Arc::clone(&self.signer),
            transport: Arc::clone(&self.transport),
        }
    }

    /// Returns the credentials requests are signed with.
    #[must_use]
    pub const fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Returns the signer.
    #[must_use]
    pub fn signer(&self) -> &dyn RequestSigner {
        self.signer.as_ref()
    }

    /// Returns the transport.
    #[must_use]
    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// Signs and sends a request.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Signing`] if the request cannot be signed and
    /// [`ClientError::Http`] if the transport fails.
    pub async fn send(
        &self,
        mut request: PreparedRequest,
        placement: SignaturePlacement,
    ) -> Result<HttpResponse, ClientError> {
        self.signer
            .sign(&mut request, &self.credentials, placement)?;
        Ok(self.transport.send(request).await?)
    }
}
