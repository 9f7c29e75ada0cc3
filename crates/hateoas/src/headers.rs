//! Per-request header overrides layered over the client's default headers.

use std::collections::BTreeMap;

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};

use crate::error::Error;

/// `application/json`, the default `Accept` and `Content-Type`.
pub const APPLICATION_JSON: &str = "application/json";

/// Media type forced by form submissions.
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Header overrides for a single request.
///
/// A non-empty value replaces the default header of the same name; an empty
/// value removes it, which lets a caller suppress `Authorization` for an
/// unauthenticated probe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(BTreeMap<String, String>);

impl Headers {
    /// Creates an empty override set.
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Adds an override and returns the set.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Overrides `name` with `value`.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Marks `name` for removal from the outgoing request.
    pub fn remove(&mut self, name: impl Into<String>) {
        self.0.insert(name.into(), String::new());
    }

    /// Whether no overrides are present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(name, value)` pairs; an empty value means removal.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Applies the overrides on top of `target`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHeader`] if a name or value cannot be sent on the wire.
    pub fn apply(&self, target: &mut HeaderMap) -> Result<(), Error> {
        for (name, value) in self.iter() {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::InvalidHeader(format!("{name}: {e}")))?;
            if value.is_empty() {
                target.remove(&name);
            } else {
                let value = HeaderValue::from_str(value)
                    .map_err(|e| Error::InvalidHeader(format!("{name}: {e}")))?;
                target.insert(name, value);
            }
        }
        Ok(())
    }
}

impl<const N: usize> From<[(&str, &str); N]> for Headers {
    fn from(pairs: [(&str, &str); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for Headers {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect(),
        )
    }
}

/// Headers every new client starts with.
pub fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(APPLICATION_JSON));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
    headers
}
