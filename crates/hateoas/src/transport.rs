//! The HTTP capability injected into [`Client`](crate::Client).
//!
//! The client never talks to the network directly: it hands fully built
//! requests to an [`HttpTransport`]. Plain `reqwest` clients and
//! `reqwest-middleware` stacks both implement it, so callers can add
//! timeouts, tracing or test doubles without touching the navigation logic.

use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use reqwest::{Request, Response};
use reqwest_middleware::ClientWithMiddleware;

use crate::error::Error;

/// Executes a single HTTP request.
///
/// Implementations must not retry; one call is one round trip.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends `request` and returns the response with its body unread.
    ///
    /// # Errors
    ///
    /// Returns an error if the request could not be completed.
    async fn send(&self, request: Request) -> Result<Response, Error>;
}

#[async_trait]
impl HttpTransport for reqwest::Client {
    async fn send(&self, request: Request) -> Result<Response, Error> {
        Ok(self.execute(request).await?)
    }
}

#[async_trait]
impl HttpTransport for ClientWithMiddleware {
    async fn send(&self, request: Request) -> Result<Response, Error> {
        Ok(self.execute(request).await?)
    }
}

#[async_trait]
impl<T: HttpTransport + ?Sized> HttpTransport for Arc<T> {
    async fn send(&self, request: Request) -> Result<Response, Error> {
        (**self).send(request).await
    }
}

/// Transport wrapper that logs every round trip at debug level.
///
/// Each line reads `METHOD URL STATUS`, or `METHOD URL (error)` when the
/// request failed before a response arrived. Nothing is retained.
#[derive(Debug, Default)]
pub struct LoggingTransport<T> {
    inner: T,
}

impl<T: HttpTransport> LoggingTransport<T> {
    /// Wraps `inner`.
    pub const fn new(inner: T) -> Self {
        Self { inner }
    }

    /// The wrapped transport.
    pub const fn inner(&self) -> &T {
        &self.inner
    }
}

#[async_trait]
impl<T: HttpTransport> HttpTransport for LoggingTransport<T> {
    async fn send(&self, request: Request) -> Result<Response, Error> {
        let method = request.method().clone();
        let url = request.url().clone();

        let result = self.inner.send(request).await;
        match &result {
            Ok(response) => debug!("{method} {url} {}", response.status().as_u16()),
            Err(e) => debug!("{method} {url} ({e})"),
        }
        result
    }
}

/// Test double that records `METHOD URL STATUS` for each round trip.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingTransport {
    inner: reqwest::Client,
    entries: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl RecordingTransport {
    pub(crate) fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
#[async_trait]
impl HttpTransport for RecordingTransport {
    async fn send(&self, request: Request) -> Result<Response, Error> {
        let entry = format!("{} {}", request.method(), request.url());
        let response = self.inner.send(request).await?;
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(format!("{entry} {}", response.status().as_u16()));
        Ok(response)
    }
}
