//! The navigating HTTP client.
//!
//! A request names a verb, a start URL (or the configured entry point) and a
//! list of link relations. Each relation costs one `GET`: the client fetches
//! the current resource, looks the relation up in its `Links` and moves to
//! the target. The verb is then issued against the final URL.
//!
//! ```no_run
//! use hateoas::{Client, ClientConfig, Headers};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Where {
//!     #[serde(rename = "Where")]
//!     place: String,
//! }
//!
//! # async fn example() -> Result<(), hateoas::Error> {
//! let client = Client::new(ClientConfig::new("http://localhost:8080"))?;
//! let response = client
//!     .get::<Where>("", &["bob", "where"], &Headers::new())
//!     .await?;
//! println!("{} via {}", response.value.place, response.url);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, warn};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Method, Request, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{Error, ErrorResponse};
use crate::headers::{FORM_URLENCODED, Headers, default_headers};
use crate::links::SimpleEndpoint;
use crate::transport::HttpTransport;

/// A fully read HTTP response.
///
/// The transport-level response has already been drained and released by
/// the time a `RawResponse` exists.
#[derive(Debug, Clone)]
pub struct RawResponse {
    status: StatusCode,
    url: Url,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl RawResponse {
    /// HTTP status of the response.
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// The resolved URL the request was sent to.
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Response headers.
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Raw response body.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Decodes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_slice(&self.body).map_err(Error::Decode)
    }

    /// Decodes the body into a [`Response`] carrying the status and URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the body does not match `T`.
    pub fn into_response<T: DeserializeOwned>(self) -> Result<Response<T>, Error> {
        let value = self.json()?;
        Ok(Response {
            status: self.status,
            url: self.url,
            value,
        })
    }

    const fn is_failure(&self) -> bool {
        self.status.as_u16() >= 400
    }

    /// Maps a failing status to a service or status error.
    fn error_for_status(self) -> Result<Self, Error> {
        if !self.is_failure() {
            return Ok(self);
        }

        let status = self.status.as_u16();
        match serde_json::from_slice::<ErrorResponse>(&self.body) {
            Ok(parsed) => {
                error!(
                    "Request to {} failed with status {status}: {} ({})",
                    self.url, parsed.code, parsed.message
                );
                Err(Error::Service {
                    status,
                    code: parsed.code,
                    message: parsed.message,
                    details: parsed.details,
                })
            }
            Err(parse_err) => {
                warn!("Error body from {} is not a service error: {parse_err}", self.url);
                error!("Request to {} failed with status {status}", self.url);
                Err(Error::HttpStatus {
                    status,
                    url: self.url.to_string(),
                })
            }
        }
    }
}

/// A decoded response together with its metadata.
#[derive(Debug, Clone)]
pub struct Response<T> {
    /// HTTP status of the final request.
    pub status: StatusCode,
    /// The resolved URL the final request was sent to.
    pub url: Url,
    /// The decoded body.
    pub value: T,
}

impl<T> Response<T> {
    /// Discards the metadata and returns the decoded body.
    pub fn into_inner(self) -> T {
        self.value
    }
}

/// Hypermedia client.
///
/// Holds the entry point, the default headers (including any bearer token)
/// and the injected transport. Header state is changed only through
/// `&mut self` methods, so one client instance is one session; share it
/// across tasks only behind your own lock.
#[derive(Clone)]
pub struct Client {
    entry_url: Option<Url>,
    default_headers: HeaderMap,
    timeout: Option<Duration>,
    transport: Arc<dyn HttpTransport>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header_names: Vec<&str> = self.default_headers.keys().map(|k| k.as_str()).collect();
        f.debug_struct("Client")
            .field("entry_url", &self.entry_url.as_ref().map(Url::as_str))
            .field("default_headers", &header_names)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a client backed by a plain `reqwest` transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }

        let transport = reqwest_middleware::ClientBuilder::new(builder.build()?).build();
        Self::with_transport(config, Arc::new(transport))
    }

    /// Creates a client that sends every request through `transport`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the entry point is invalid, or
    /// [`Error::InvalidHeader`] if a configured default header is invalid.
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, Error> {
        let entry_url = config.entry_url()?;

        let mut default_headers = default_headers();
        config.headers.apply(&mut default_headers)?;

        Ok(Self {
            entry_url,
            default_headers,
            timeout: config.timeout,
            transport,
        })
    }

    /// The configured entry point, if any.
    pub const fn entry_url(&self) -> Option<&Url> {
        self.entry_url.as_ref()
    }

    /// Headers sent with every request unless overridden.
    pub const fn default_headers(&self) -> &HeaderMap {
        &self.default_headers
    }

    /// Mutable access to the default headers.
    pub const fn default_headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.default_headers
    }

    /// Installs `Authorization: Bearer <token>` as a default header.
    ///
    /// An empty token removes the header instead. Returns the previous
    /// `Authorization` value so a caller can roll back with
    /// [`Client::restore_authorization`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHeader`] if the token contains bytes that are
    /// not allowed in a header value; the headers are left unchanged.
    pub fn set_bearer_token(&mut self, token: &str) -> Result<Option<HeaderValue>, Error> {
        if token.is_empty() {
            return Ok(self.default_headers.remove(AUTHORIZATION));
        }

        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| Error::InvalidHeader(format!("authorization: {e}")))?;
        value.set_sensitive(true);

        Ok(self.default_headers.insert(AUTHORIZATION, value))
    }

    /// Puts back an `Authorization` value returned by [`Client::set_bearer_token`].
    pub fn restore_authorization(&mut self, previous: Option<HeaderValue>) {
        match previous {
            Some(value) => {
                self.default_headers.insert(AUTHORIZATION, value);
            }
            None => {
                self.default_headers.remove(AUTHORIZATION);
            }
        }
    }

    /// Follows `navigate` from `url` and issues `method` on the result.
    ///
    /// `url` may be empty to start at the entry point. Navigation steps always
    /// use the default headers; `headers` only affects the final request. The
    /// final response is returned only if its status is below 400.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if `url` is empty and no entry point is configured
    /// - [`Error::HttpStatus`] if a navigation step fails, or the final request
    ///   fails without a structured error body
    /// - [`Error::Service`] if the final request fails with a structured error body
    /// - [`Error::LinkNotFound`] if a relation is missing
    /// - [`Error::Decode`] if a navigation step returns something other than JSON
    /// - [`Error::InvalidHeader`] if an override cannot be sent, before any request is made
    pub async fn execute(
        &self,
        method: Method,
        url: &str,
        navigate: &[&str],
        headers: &Headers,
        body: Option<Vec<u8>>,
    ) -> Result<RawResponse, Error> {
        let start = self.resolve_start(url)?;

        let mut request_headers = self.default_headers.clone();
        headers.apply(&mut request_headers)?;

        let target = self.follow(start, navigate).await?;

        self.round_trip(method, target, request_headers, body)
            .await?
            .error_for_status()
    }

    /// `GET` and decode the body.
    ///
    /// # Errors
    ///
    /// See [`Client::execute`]; additionally [`Error::Decode`] if the body does not match `T`.
    pub async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        navigate: &[&str],
        headers: &Headers,
    ) -> Result<Response<T>, Error> {
        self.execute(Method::GET, url, navigate, headers, None)
            .await?
            .into_response()
    }

    /// `POST` a JSON body and decode the response.
    ///
    /// # Errors
    ///
    /// See [`Client::execute`]; additionally [`Error::Encode`] if `body` cannot be
    /// serialized and [`Error::Decode`] if the response does not match `T`.
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        url: &str,
        navigate: &[&str],
        headers: &Headers,
        body: &B,
    ) -> Result<Response<T>, Error> {
        let body = serde_json::to_vec(body).map_err(Error::Encode)?;
        self.execute(Method::POST, url, navigate, headers, Some(body))
            .await?
            .into_response()
    }

    /// `POST` a URL-encoded form and decode the response.
    ///
    /// `Content-Type: application/x-www-form-urlencoded` is always sent, even
    /// if `headers` says otherwise.
    ///
    /// # Errors
    ///
    /// See [`Client::execute`]; additionally [`Error::Decode`] if the response does not match `T`.
    pub async fn post_form<T: DeserializeOwned>(
        &self,
        url: &str,
        navigate: &[&str],
        headers: &Headers,
        form: &[(&str, &str)],
    ) -> Result<Response<T>, Error> {
        let headers = headers
            .iter()
            .filter(|(name, _)| !name.eq_ignore_ascii_case(CONTENT_TYPE.as_str()))
            .chain([(CONTENT_TYPE.as_str(), FORM_URLENCODED)])
            .collect::<Headers>();

        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(form.iter())
            .finish();

        self.execute(Method::POST, url, navigate, &headers, Some(body.into_bytes()))
            .await?
            .into_response()
    }

    /// `DELETE` without decoding a body.
    ///
    /// # Errors
    ///
    /// See [`Client::execute`].
    pub async fn delete(
        &self,
        url: &str,
        navigate: &[&str],
        headers: &Headers,
    ) -> Result<RawResponse, Error> {
        self.execute(Method::DELETE, url, navigate, headers, None)
            .await
    }

    /// Turns a caller supplied start URL into an absolute URL.
    ///
    /// Relative URLs are resolved against the entry point.
    pub(crate) fn resolve_start(&self, url: &str) -> Result<Url, Error> {
        if url.is_empty() {
            return self.entry_url.clone().ok_or_else(|| {
                Error::Config("no start URL given and no entry URL configured".to_string())
            });
        }

        match Url::parse(url) {
            Ok(parsed) => Ok(parsed),
            Err(url::ParseError::RelativeUrlWithoutBase) => match &self.entry_url {
                Some(entry) => entry.join(url).map_err(|source| invalid_url(url, source)),
                None => Err(invalid_url(url, url::ParseError::RelativeUrlWithoutBase)),
            },
            Err(source) => Err(invalid_url(url, source)),
        }
    }

    /// Walks `navigate` one `GET` at a time and returns the final URL.
    async fn follow(&self, start: Url, navigate: &[&str]) -> Result<Url, Error> {
        let mut url = start;

        for rel in navigate {
            let raw = self
                .round_trip(Method::GET, url.clone(), self.default_headers.clone(), None)
                .await?;

            if raw.is_failure() {
                error!(
                    "Navigation to '{rel}' aborted: {} returned {}",
                    raw.url,
                    raw.status.as_u16()
                );
                return Err(Error::HttpStatus {
                    status: raw.status.as_u16(),
                    url: raw.url.to_string(),
                });
            }

            let endpoint: SimpleEndpoint = raw.json()?;
            let link = endpoint
                .links
                .as_ref()
                .ok_or_else(|| Error::link_not_found(*rel))?
                .get(rel)?;

            url = url
                .join(&link.href)
                .map_err(|source| invalid_url(&link.href, source))?;
            debug!("Followed '{rel}' to {url}");
        }

        Ok(url)
    }

    /// Sends one request and reads its body to the end.
    async fn round_trip(
        &self,
        method: Method,
        url: Url,
        headers: HeaderMap,
        body: Option<Vec<u8>>,
    ) -> Result<RawResponse, Error> {
        let mut request = Request::new(method.clone(), url.clone());
        *request.headers_mut() = headers;
        *request.timeout_mut() = self.timeout;
        if let Some(body) = body {
            *request.body_mut() = Some(body.into());
        }

        debug!("{method} {url}");
        let response = self.transport.send(request).await?;
        let status = response.status();
        let headers = response.headers().clone();

        // Consumes the response, so the connection is released on every path.
        let body = response.bytes().await?.to_vec();
        debug!("{method} {url} -> {}", status.as_u16());

        Ok(RawResponse {
            status,
            url,
            headers,
            body,
        })
    }
}

fn invalid_url(url: &str, source: url::ParseError) -> Error {
    Error::InvalidUrl {
        url: url.to_string(),
        source,
    }
}
