//! Client configuration.

use std::time::Duration;

use url::Url;

use crate::error::Error;
use crate::headers::Headers;

/// Configuration for a hypermedia [`Client`](crate::Client).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use hateoas::ClientConfig;
///
/// let config = ClientConfig::new("https://deviceserver.creatordev.io")
///     .with_timeout(Duration::from_secs(30))
///     .with_header("X-Trace", "on");
/// assert!(config.entry_url().is_ok());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// Well-known root URL navigation starts from when no start URL is given.
    pub entry_url: Option<String>,
    /// Extra default headers merged over `Accept`/`Content-Type`.
    pub headers: Headers,
    /// Per-request timeout applied to every round trip. `None` waits forever.
    pub timeout: Option<Duration>,
    /// `User-Agent` used by the default transport.
    pub user_agent: Option<String>,
}

impl ClientConfig {
    /// Creates a configuration with the given entry point.
    pub fn new(entry_url: impl Into<String>) -> Self {
        Self {
            entry_url: Some(entry_url.into()),
            ..Self::default()
        }
    }

    /// Adds a default header sent with every request.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the `User-Agent` of the default transport.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Parses the entry point, if one is configured.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the entry point is empty, not a valid URL,
    /// or not `http`/`https`.
    pub fn entry_url(&self) -> Result<Option<Url>, Error> {
        let Some(raw) = self.entry_url.as_deref() else {
            return Ok(None);
        };

        if raw.trim().is_empty() {
            return Err(Error::Config("entry URL is empty".to_string()));
        }

        let url = Url::parse(raw)
            .map_err(|e| Error::Config(format!("invalid entry URL '{raw}': {e}")))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "entry URL must be http or https, got '{}'",
                url.scheme()
            )));
        }

        Ok(Some(url))
    }
}
