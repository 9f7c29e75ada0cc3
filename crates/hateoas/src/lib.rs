//! # hateoas
//!
//! Client for JSON APIs that advertise their URLs as link relations.
//!
//! Instead of hard-coding paths, a caller starts at a well-known entry point
//! and names the relations to follow. The [`Client`] fetches each resource in
//! turn, picks the named link out of its `Links` array and finally issues the
//! requested verb against the URL it arrived at.
//!
//! - [`LinkSet`] resolves relations, first match wins
//! - [`Client`] navigates, applies default and per-request [`Headers`] and
//!   maps failures onto [`Error`]
//! - [`Page`] and [`Client::next_page`] walk paginated collections
//! - [`HttpTransport`] is the network seam; wrap it in [`LoggingTransport`]
//!   to log traffic
//!
//! ## Example
//!
//! ```no_run
//! use hateoas::{Client, ClientConfig, Headers, Page};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct AccessKey {
//!     #[serde(rename = "Name")]
//!     name: String,
//! }
//!
//! # async fn example() -> Result<(), hateoas::Error> {
//! let mut client = Client::new(ClientConfig::new("https://deviceserver.creatordev.io"))?;
//! client.set_bearer_token("token")?;
//!
//! let mut page: Page<AccessKey> = client
//!     .first_page("", &["accesskeys"], &Headers::new())
//!     .await?;
//! loop {
//!     for key in &page.items {
//!         println!("{}", key.name);
//!     }
//!     match client.next_page(&page).await? {
//!         Some(next) => page = next,
//!         None => break,
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod headers;
pub mod links;
pub mod page;
pub mod transport;

pub use client::{Client, RawResponse, Response};
pub use config::ClientConfig;
pub use error::{Error, ErrorResponse};
pub use headers::{APPLICATION_JSON, FORM_URLENCODED, Headers};
pub use links::{Link, LinkSet, NEXT_REL, SELF_REL};
pub use page::{Page, PageInfo};
pub use transport::{HttpTransport, LoggingTransport};

/// Re-exported so callers can name verbs and header values without a direct
/// `reqwest` dependency.
pub use reqwest::{Method, StatusCode, header};

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
