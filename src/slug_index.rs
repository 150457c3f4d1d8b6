//! Bidirectional slug ↔ page ID index

use reqwest::Url;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Length of a hosted page identifier
pub const PAGE_ID_LEN: usize = 32;

/// Check that `id` is exactly 32 lowercase hex characters
pub fn is_page_id(id: &str) -> bool {
    id.len() == PAGE_ID_LEN && id.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Extract the trailing page ID from a hosted page URL
///
/// Accepts a full URL (`https://acme.notion.site/About-<id>`) or a bare
/// path/ID. Returns `None` when the last 32 characters of the path are not a
/// page ID.
pub fn extract_page_id(input: &str) -> Option<String> {
    let input = input.trim();
    let path = match Url::parse(input) {
        Ok(url) => url.path().to_string(),
        Err(_) => input.to_string(),
    };
    let tail = last_chars(&path, PAGE_ID_LEN);
    if is_page_id(tail) {
        Some(tail.to_string())
    } else {
        None
    }
}

/// Last `n` characters of `s` (the whole string when shorter)
pub(crate) fn last_chars(s: &str, n: usize) -> &str {
    match s.char_indices().rev().nth(n.saturating_sub(1)) {
        Some((idx, _)) if n > 0 => &s[idx..],
        _ if n == 0 => "",
        _ => s,
    }
}

/// Immutable bidirectional mapping between slugs and page IDs
///
/// The root slug `""` is always present. Entries keep configuration order,
/// root first, which is also the order used for the sitemap and the
/// client-side table.
#[derive(Debug, Clone)]
pub struct SlugIndex {
    entries: Vec<(String, String)>,
    by_slug: HashMap<String, usize>,
    by_page: HashMap<String, usize>,
}

impl SlugIndex {
    /// Build the index from the root page ID and `(slug, page ID)` pairs
    ///
    /// Returns `None` when the root page ID is malformed. Non-root entries
    /// with an empty slug, a duplicate slug, or a malformed page ID are
    /// dropped with a warning. When two slugs share a page ID the later one
    /// becomes canonical for the reverse lookup.
    pub fn build<I, S, P>(root_page_id: &str, entries: I) -> Option<Self>
    where
        I: IntoIterator<Item = (S, P)>,
        S: Into<String>,
        P: Into<String>,
    {
        if !is_page_id(root_page_id) {
            return None;
        }

        let mut index = SlugIndex {
            entries: Vec::new(),
            by_slug: HashMap::new(),
            by_page: HashMap::new(),
        };
        index.insert(String::new(), root_page_id.to_string());

        for (slug, page_id) in entries {
            let slug = slug.into();
            let page_id = page_id.into();
            if slug.is_empty() {
                warn!("Dropping slug entry with empty slug: page_id={}", page_id);
                continue;
            }
            if !is_page_id(&page_id) {
                warn!(
                    "Dropping slug entry with malformed page id: slug={}, page_id={}",
                    slug, page_id
                );
                continue;
            }
            if index.by_slug.contains_key(&slug) {
                warn!("Dropping duplicate slug entry: slug={}, page_id={}", slug, page_id);
                continue;
            }
            index.insert(slug, page_id);
        }

        debug!("Built slug index with {} entries", index.entries.len());
        Some(index)
    }

    fn insert(&mut self, slug: String, page_id: String) {
        let position = self.entries.len();
        self.by_slug.insert(slug.clone(), position);
        self.by_page.insert(page_id.clone(), position);
        self.entries.push((slug, page_id));
    }

    /// Page ID for `slug`, if the slug is known
    pub fn resolve_slug(&self, slug: &str) -> Option<&str> {
        self.by_slug
            .get(slug)
            .map(|&position| self.entries[position].1.as_str())
    }

    /// Canonical slug for `page_id`, or `""` when the page is not indexed
    pub fn resolve_canonical_slug(&self, page_id: &str) -> &str {
        self.by_page
            .get(page_id)
            .map(|&position| self.entries[position].0.as_str())
            .unwrap_or("")
    }

    pub fn contains_slug(&self, slug: &str) -> bool {
        self.by_slug.contains_key(slug)
    }

    pub fn root_page_id(&self) -> &str {
        &self.entries[0].1
    }

    /// Slugs in index order, root first
    pub fn slugs(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(slug, _)| slug.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(slug, page_id)| (slug.as_str(), page_id.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false: the root entry is mandatory
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The slug → page ID table as an ordered JSON object
    pub fn to_json_object(&self) -> Value {
        let map: Map<String, Value> = self
            .entries
            .iter()
            .map(|(slug, page_id)| (slug.clone(), Value::String(page_id.clone())))
            .collect();
        Value::Object(map)
    }
}
