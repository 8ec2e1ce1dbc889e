//! HTTP client for the ServiceNow JSONv2 web service.
//!
//! This module provides [`ServiceNowClient`], which builds requests against a
//! base endpoint and executes them through a pluggable [`Transport`].
//!
//! # Request pipeline
//!
//! ```text
//! RecordService -> add_options -> new_request -> execute -> Transport -> network
//! ```
//!
//! # Security
//!
//! Credentials live in the transport and are never logged. Transport errors
//! have `client_secret` redacted from their URL, and error bodies are
//! truncated before they are returned.

use std::io::Write;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::{Method, Request, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::config::Config;
use crate::context::Context;
use crate::error::NowError;
use crate::models::{ChangeRequest, Incident, Record, StandardChangeTemplate};
use crate::services::RecordService;
use crate::transport::{BasicAuthTransport, Transport};

/// Default User-Agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("servicenow-rs/", env!("CARGO_PKG_VERSION"));

/// Media type for request and response bodies.
const JSON_MEDIA_TYPE: &str = "application/json";

/// Query parameter redacted from URLs that surface in errors.
const CLIENT_SECRET_PARAM: &str = "client_secret";

/// Replacement value for redacted secrets.
const REDACTED: &str = "REDACTED";

/// Maximum length for HTTP error response bodies.
const MAX_ERROR_BODY_LEN: usize = 500;

/// Client for the ServiceNow JSONv2 API.
///
/// The client holds no per-call state, so one instance can be shared across
/// tasks. Cloning is cheap when the transport is.
///
/// # Example
///
/// ```ignore
/// let config = Config::from_env()?;
/// let client = ServiceNowClient::from_config(&config)?;
///
/// let ctx = Context::background();
/// let incident = client
///     .incidents()
///     .get(&ctx, "INC0010001", GetOptions::new())
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct ServiceNowClient<T = BasicAuthTransport> {
    /// The sender used for every request.
    transport: T,

    /// Base endpoint. Its path always ends in `/`.
    base_url: Url,

    /// User-Agent header value; empty suppresses the header.
    user_agent: String,
}

impl ServiceNowClient<BasicAuthTransport> {
    /// Creates a client from configuration, authenticating with HTTP Basic.
    ///
    /// # Errors
    ///
    /// Returns `NowError::HttpClient` if the HTTP client fails to initialize,
    /// or `NowError::Encoding` if the base URL does not parse.
    pub fn from_config(config: &Config) -> Result<Self, NowError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(NowError::HttpClient)?;

        let transport =
            BasicAuthTransport::with_transport(&config.username, config.password(), http);

        Ok(Self::new(&config.base_url, transport)?.with_user_agent(&config.user_agent))
    }
}

impl<T: Transport> ServiceNowClient<T> {
    /// Creates a client for `base_url` sending through `transport`.
    ///
    /// A trailing `/` is appended to the base URL's path when missing, so
    /// `https://instance.service-now.com` and `https://instance.service-now.com/`
    /// are equivalent.
    ///
    /// # Errors
    ///
    /// Returns `NowError::Encoding` if `base_url` is not an absolute URL.
    pub fn new(base_url: &str, transport: T) -> Result<Self, NowError> {
        let mut base_url = Url::parse(base_url.trim())
            .map_err(|e| NowError::encoding(format!("invalid base URL: {}", e)))?;

        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            transport,
            base_url,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        })
    }

    /// Overrides the User-Agent header. An empty value omits the header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Returns the base endpoint.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Incident records (`incident.do`).
    pub fn incidents(&self) -> RecordService<'_, Incident, T> {
        RecordService::new(self)
    }

    /// Change request records (`change_request.do`).
    pub fn change_requests(&self) -> RecordService<'_, ChangeRequest, T> {
        RecordService::new(self)
    }

    /// Standard change template proposals (`std_change_proposal.do`).
    pub fn standard_change_templates(&self) -> RecordService<'_, StandardChangeTemplate, T> {
        RecordService::new(self)
    }

    /// Records of any [`Record`] type.
    pub fn records<R: Record>(&self) -> RecordService<'_, R, T> {
        RecordService::new(self)
    }

    /// Builds an unsent request.
    ///
    /// `path` is resolved against the base endpoint and should not start
    /// with `/`. When `body` is given it is encoded as JSON and
    /// `Content-Type: application/json` is set.
    ///
    /// # Errors
    ///
    /// - `NowError::Configuration` if the base endpoint lost its trailing `/`
    /// - `NowError::Encoding` if `path` does not resolve or `body` fails to serialize
    pub fn new_request<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Request, NowError>
    where
        B: Serialize + ?Sized,
    {
        if !self.base_url.path().ends_with('/') {
            return Err(NowError::configuration(format!(
                "base URL must have a trailing slash, but {:?} does not",
                self.base_url.as_str()
            )));
        }

        let url = self
            .base_url
            .join(path)
            .map_err(|e| NowError::encoding(format!("invalid request path {:?}: {}", path, e)))?;

        let mut request = Request::new(method, url);

        if let Some(body) = body {
            let bytes = serde_json::to_vec(body).map_err(NowError::encoding)?;
            request
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_MEDIA_TYPE));
            *request.body_mut() = Some(bytes.into());
        }

        request
            .headers_mut()
            .insert(ACCEPT, HeaderValue::from_static(JSON_MEDIA_TYPE));
        if !self.user_agent.is_empty() {
            let value = HeaderValue::from_str(&self.user_agent).map_err(NowError::encoding)?;
            request.headers_mut().insert(USER_AGENT, value);
        }

        Ok(request)
    }

    /// Sends `request` and writes its body into `target`.
    ///
    /// The send and the body read are both raced against `ctx`; if the
    /// context ends first, its error is returned. A transport failure
    /// observed after the context ended also reports the context error.
    ///
    /// The response body is fully read and released before this returns,
    /// on every path.
    ///
    /// `target` only receives the body of a 2xx response. For any other
    /// status the body goes into the returned error (truncated for
    /// `HttpStatus`, dropped for `Authentication`), so a [`Sink`] stays
    /// untouched.
    ///
    /// # Errors
    ///
    /// - `NowError::Context` if `ctx` was cancelled or expired
    /// - `NowError::Transport` on network failure, with `client_secret` redacted
    /// - `NowError::Authentication` / `NowError::HttpStatus` on a non-2xx status
    /// - `NowError::Decode` / `NowError::Sink` if `target` rejects the body
    pub async fn execute<D>(
        &self,
        ctx: &Context,
        request: Request,
        target: &mut D,
    ) -> Result<Response, NowError>
    where
        D: ResponseTarget + Send + ?Sized,
    {
        let method = request.method().clone();
        let url = sanitize_url(request.url());

        tracing::debug!(method = %method, url = %url, "Sending ServiceNow request");

        let sent = tokio::select! {
            biased;
            reason = ctx.done() => return Err(reason.into()),
            sent = self.transport.round_trip(&request) => sent,
        };

        let response = match sent {
            Ok(response) => response,
            Err(e) => {
                if let Some(reason) = ctx.err() {
                    return Err(reason.into());
                }
                let e = e.sanitized();
                tracing::debug!(method = %method, url = %url, error = %e, "ServiceNow request failed");
                return Err(e);
            }
        };

        let meta = Response {
            status: response.status(),
            headers: response.headers().clone(),
            url: sanitize_url(response.url()),
        };

        tracing::debug!(status = %meta.status, url = %meta.url, "ServiceNow response received");

        // Consuming the response releases the body stream on every branch.
        let body = tokio::select! {
            biased;
            reason = ctx.done() => return Err(reason.into()),
            body = response.bytes() => body.map_err(|e| NowError::Transport(e).sanitized())?,
        };

        tracing::trace!(bytes = body.len(), "ServiceNow response body");

        if !meta.status.is_success() {
            return Err(status_error(meta.status, &body));
        }

        target.fill(meta.status, &body)?;

        Ok(meta)
    }
}

/// Classifies a non-success response.
fn status_error(status: StatusCode, body: &[u8]) -> NowError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            tracing::warn!(status = %status, "ServiceNow rejected the credentials");
            NowError::Authentication
        }
        _ => {
            let body = String::from_utf8_lossy(body);
            let body = if body.len() > MAX_ERROR_BODY_LEN {
                let mut end = MAX_ERROR_BODY_LEN;
                while !body.is_char_boundary(end) {
                    end -= 1;
                }
                format!("{}...[truncated]", &body[..end])
            } else {
                body.into_owned()
            };
            NowError::HttpStatus { status, body }
        }
    }
}

/// Metadata of a completed response. The body has already been consumed.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    url: Url,
}

impl Response {
    /// HTTP status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Final URL of the response, with secrets redacted.
    pub fn url(&self) -> &Url {
        &self.url
    }
}

/// Destination for a response body.
pub trait ResponseTarget {
    /// Consumes the complete body of a successful response.
    fn fill(&mut self, status: StatusCode, body: &[u8]) -> Result<(), NowError>;
}

/// Discards the body.
impl ResponseTarget for () {
    fn fill(&mut self, _status: StatusCode, _body: &[u8]) -> Result<(), NowError> {
        Ok(())
    }
}

/// Decodes the body as JSON. An empty body leaves the target as `None`.
impl<T: DeserializeOwned> ResponseTarget for Option<T> {
    fn fill(&mut self, status: StatusCode, body: &[u8]) -> Result<(), NowError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(());
        }
        let value =
            serde_json::from_slice(body).map_err(|source| NowError::Decode { status, source })?;
        *self = Some(value);
        Ok(())
    }
}

/// Copies the body verbatim into a writer.
#[derive(Debug)]
pub struct Sink<W>(pub W);

impl<W: Write> ResponseTarget for Sink<W> {
    fn fill(&mut self, _status: StatusCode, body: &[u8]) -> Result<(), NowError> {
        self.0.write_all(body).map_err(NowError::Sink)
    }
}

/// Returns a copy of `url` with any `client_secret` value replaced by `REDACTED`.
///
/// URLs without that parameter are returned unchanged.
pub fn sanitize_url(url: &Url) -> Url {
    let mut url = url.clone();
    redact_client_secret(&mut url);
    url
}

pub(crate) fn redact_client_secret(url: &mut Url) {
    let has_secret = url
        .query_pairs()
        .any(|(key, value)| key == CLIENT_SECRET_PARAM && !value.is_empty());
    if !has_secret {
        return;
    }

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| {
            let value = if key == CLIENT_SECRET_PARAM {
                REDACTED.to_string()
            } else {
                value.into_owned()
            };
            (key.into_owned(), value)
        })
        .collect();

    url.query_pairs_mut().clear().extend_pairs(pairs);
}
