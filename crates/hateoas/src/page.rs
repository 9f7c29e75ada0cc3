//! Paginated collections and cursor traversal.

use std::collections::HashSet;

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::client::Client;
use crate::error::Error;
use crate::headers::Headers;
use crate::links::{Link, LinkSet, NEXT_REL};

/// Position of a page inside the whole collection.
///
/// The counts are reported by the service and taken as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    /// Items in the whole collection.
    #[serde(rename = "TotalCount", default)]
    pub total_count: u64,
    /// Items on this page.
    #[serde(rename = "ItemsCount", default)]
    pub items_count: u64,
    /// Offset of this page's first item in the collection.
    #[serde(rename = "StartIndex", default)]
    pub start_index: u64,
    /// Cursor links; `next` points at the following page.
    #[serde(rename = "Links", default)]
    pub links: LinkSet,
}

/// One page of a collection resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Paging metadata and cursors.
    #[serde(rename = "PageInfo", default)]
    pub page_info: PageInfo,
    /// Items on this page, in service order.
    #[serde(rename = "Items", default = "Vec::new")]
    pub items: Vec<T>,
    /// Links of the collection itself, e.g. `add`.
    #[serde(rename = "Links", default)]
    pub links: LinkSet,
}

impl<T> Page<T> {
    /// The `next` cursor, if the service advertised one.
    pub fn next_link(&self) -> Option<&Link> {
        self.page_info.links.find(NEXT_REL)
    }

    /// Whether another page follows this one.
    pub fn has_next(&self) -> bool {
        self.next_link().is_some()
    }
}

impl Client {
    /// Fetches the first page of the collection reached along `navigate`.
    ///
    /// # Errors
    ///
    /// Same as [`Client::get`].
    pub async fn first_page<T: DeserializeOwned>(
        &self,
        url: &str,
        navigate: &[&str],
        headers: &Headers,
    ) -> Result<Page<T>, Error> {
        Ok(self.get::<Page<T>>(url, navigate, headers).await?.value)
    }

    /// Fetches the page after `previous`.
    ///
    /// Returns `Ok(None)` when `previous` has no `next` cursor. Otherwise the
    /// cursor href is fetched directly, without following any relation.
    /// Relative cursors resolve against the entry point.
    ///
    /// # Errors
    ///
    /// Same as [`Client::get`].
    pub async fn next_page<T: DeserializeOwned>(
        &self,
        previous: &Page<T>,
    ) -> Result<Option<Page<T>>, Error> {
        let Some(next) = previous.next_link() else {
            debug!("No next page");
            return Ok(None);
        };

        let page = self.get::<Page<T>>(&next.href, &[], &Headers::new()).await?;
        Ok(Some(page.value))
    }

    /// Fetches every page of a collection and returns all items in order.
    ///
    /// Stops early if the service hands out a cursor it already returned.
    ///
    /// # Errors
    ///
    /// Returns the first error of any page request.
    pub async fn collect_all<T: DeserializeOwned>(
        &self,
        url: &str,
        navigate: &[&str],
        headers: &Headers,
    ) -> Result<Vec<T>, Error> {
        let mut page = self.first_page::<T>(url, navigate, headers).await?;
        let mut items = Vec::new();
        let mut seen = HashSet::new();

        loop {
            let cursor = page.next_link().map(|link| link.href.clone());
            items.append(&mut page.items);

            let Some(cursor) = cursor else {
                break;
            };
            if !seen.insert(cursor.clone()) {
                warn!("Pagination cursor {cursor} repeated, stopping");
                break;
            }

            page = self.get::<Page<T>>(&cursor, &[], &Headers::new()).await?.value;
        }

        Ok(items)
    }
}
