//! Link relations embedded in resource envelopes.

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::Error;

/// Relation naming the resource itself.
pub const SELF_REL: &str = "self";

/// Relation naming the following page of a paginated collection.
pub const NEXT_REL: &str = "next";

/// A single hypermedia link: `{"rel": ..., "href": ..., "type": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Relation name, e.g. `self`, `next` or `accesskeys`.
    pub rel: String,
    /// Target URI.
    pub href: String,
    /// Media type of the target, often empty.
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub media_type: String,
}

impl Link {
    /// Creates a link without a media type.
    pub fn new(rel: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            rel: rel.into(),
            href: href.into(),
            media_type: String::new(),
        }
    }

    /// Sets the media type of the link target.
    #[must_use]
    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = media_type.into();
        self
    }
}

/// Ordered collection of links, in the order the service sent them.
///
/// Relation names are not unique; lookups return the first match so that
/// resolution stays deterministic when a service repeats a relation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkSet(SmallVec<[Link; 4]>);

impl LinkSet {
    /// Creates an empty link set.
    #[must_use]
    pub fn new() -> Self {
        Self(SmallVec::new())
    }

    /// Returns the first link whose relation equals `rel` (case-sensitive).
    ///
    /// # Errors
    ///
    /// Returns [`Error::LinkNotFound`] naming `rel` if no link matches.
    pub fn get(&self, rel: &str) -> Result<&Link, Error> {
        self.find(rel).ok_or_else(|| Error::link_not_found(rel))
    }

    /// Returns the first link whose relation equals `rel`, if any.
    pub fn find(&self, rel: &str) -> Option<&Link> {
        self.0.iter().find(|link| link.rel == rel)
    }

    /// Returns the `self` href, or a placeholder when the link is missing.
    ///
    /// Intended for display purposes where a missing link is not worth an error.
    pub fn self_href(&self) -> &str {
        self.find(SELF_REL)
            .map_or(r#"(unable to find "self" link)"#, |link| link.href.as_str())
    }

    /// Appends a link.
    pub fn push(&mut self, link: Link) {
        self.0.push(link);
    }

    /// Number of links in the set.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set contains no links.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the links in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Link> {
        self.0.iter()
    }
}

impl FromIterator<Link> for LinkSet {
    fn from_iter<I: IntoIterator<Item = Link>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a LinkSet {
    type Item = &'a Link;
    type IntoIter = std::slice::Iter<'a, Link>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for LinkSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for link in &self.0 {
            write!(f, "\n  {} -> {}", link.rel, link.href)?;
            if !link.media_type.is_empty() {
                write!(f, " ({})", link.media_type)?;
            }
        }
        write!(f, "]")
    }
}

/// Minimal envelope used while following relations: only `Links` matters.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct SimpleEndpoint {
    #[serde(rename = "Links", default)]
    pub links: Option<LinkSet>,
}


#[cfg(test)]
mod proptests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn first_occurrence_wins(
            rels in prop::collection::vec("[a-c]{1,2}", 1..12),
            pick in any::<prop::sample::Index>(),
        ) {
            let links: LinkSet = rels
                .iter()
                .enumerate()
                .map(|(i, rel)| Link::new(rel.clone(), format!("http://h/{i}")))
                .collect();

            let wanted = &rels[pick.index(rels.len())];
            let first = rels.iter().position(|r| r == wanted).unwrap();

            prop_assert_eq!(&links.get(wanted).unwrap().href, &format!("http://h/{first}"));
        }
    }
}
