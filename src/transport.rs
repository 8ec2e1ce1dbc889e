//! Outbound HTTP senders.
//!
//! [`Transport`] is the seam between [`ServiceNowClient`] and the network.
//! `reqwest::Client` implements it directly; [`BasicAuthTransport`] decorates
//! any other transport with HTTP Basic credentials.
//!
//! TLS client certificates and proxies are configured on the
//! `reqwest::Client` handed to the decorator, not here.
//!
//! [`ServiceNowClient`]: crate::client::ServiceNowClient

use std::fmt;
use std::future::Future;

use base64::Engine;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Request, Response};

use crate::error::NowError;

/// Sends a single HTTP request.
///
/// Implementations must not mutate the request they are given; decorators
/// work on a copy.
pub trait Transport: Send + Sync {
    /// Sends `request` and returns the raw response.
    fn round_trip(
        &self,
        request: &Request,
    ) -> impl Future<Output = Result<Response, NowError>> + Send;
}

impl Transport for reqwest::Client {
    fn round_trip(
        &self,
        request: &Request,
    ) -> impl Future<Output = Result<Response, NowError>> + Send {
        let copy = request.try_clone();
        let client = self.clone();
        async move {
            let copy = copy.ok_or(NowError::StreamingBody)?;
            client.execute(copy).await.map_err(NowError::Transport)
        }
    }
}

/// Transport that authenticates every request with HTTP Basic credentials.
///
/// # Example
///
/// ```ignore
/// let transport = BasicAuthTransport::new("admin", "secret");
/// let client = ServiceNowClient::new("https://instance.service-now.com", transport)?;
/// ```
#[derive(Clone)]
pub struct BasicAuthTransport<T = reqwest::Client> {
    /// Base64-encoded "username:password".
    encoded_credentials: String,

    /// The underlying sender.
    inner: T,
}

impl BasicAuthTransport<reqwest::Client> {
    /// Creates a decorator over a default `reqwest::Client`.
    pub fn new(username: impl AsRef<str>, password: impl AsRef<str>) -> Self {
        Self::with_transport(username, password, reqwest::Client::new())
    }
}

impl<T> BasicAuthTransport<T> {
    /// Creates a decorator over the given transport.
    pub fn with_transport(username: impl AsRef<str>, password: impl AsRef<str>, inner: T) -> Self {
        let credentials = format!("{}:{}", username.as_ref(), password.as_ref());
        let encoded_credentials = base64::engine::general_purpose::STANDARD.encode(credentials);
        Self {
            encoded_credentials,
            inner,
        }
    }

    /// Returns the wrapped transport.
    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Copies `request` with its own header map and the `Authorization` header set.
    ///
    /// The original request is left untouched.
    pub fn authorize(&self, request: &Request) -> Result<Request, NowError> {
        let mut copy = request.try_clone().ok_or(NowError::StreamingBody)?;

        let mut value = HeaderValue::from_str(&format!("Basic {}", self.encoded_credentials))
            .map_err(NowError::encoding)?;
        value.set_sensitive(true);
        copy.headers_mut().insert(AUTHORIZATION, value);

        Ok(copy)
    }
}

impl<T: Transport> Transport for BasicAuthTransport<T> {
    fn round_trip(
        &self,
        request: &Request,
    ) -> impl Future<Output = Result<Response, NowError>> + Send {
        let authorized = self.authorize(request);
        async move { self.inner.round_trip(&authorized?).await }
    }
}

impl<T> fmt::Debug for BasicAuthTransport<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuthTransport")
            .field("encoded_credentials", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}
