use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use crate::error::Result;
use crate::transport::ApiClient;

/// Name of a cached server query, as a list of segments.
///
/// A key matches every key it prefixes, so `["comments"]` covers
/// `["comments", "p1"]` and `["comments", "p2"]`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn post(post_id: &str) -> Self {
        Self::new(["post", post_id])
    }

    pub fn comments(post_id: &str) -> Self {
        Self::new(["comments", post_id])
    }

    pub fn all_comments() -> Self {
        Self::new(["comments"])
    }

    pub fn recent_posts() -> Self {
        Self::new(["recent-posts"])
    }

    /// True when `self` is a prefix of `other` (or equal to it).
    pub fn matches(&self, other: &QueryKey) -> bool {
        other.0.starts_with(&self.0)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

#[derive(Debug, Clone)]
struct Entry {
    path: String,
    value: Value,
    stale: bool,
}

/// Read-side cache of forum queries.
///
/// Entries remember the path they were fetched from so that invalidation can
/// be followed by a refetch without the caller knowing the URL.
pub struct QueryCache {
    client: ApiClient,
    entries: RefCell<BTreeMap<QueryKey, Entry>>,
}

impl QueryCache {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            entries: RefCell::new(BTreeMap::new()),
        }
    }

    /// Cached value if fresh, otherwise GET `path` and cache the answer.
    pub async fn fetch(&self, key: QueryKey, path: &str) -> Result<Value> {
        if let Some(entry) = self.entries.borrow().get(&key) {
            if !entry.stale && entry.path == path {
                return Ok(entry.value.clone());
            }
        }
        let value = self.client.get_json(path).await?;
        self.entries.borrow_mut().insert(
            key,
            Entry {
                path: path.to_string(),
                value: value.clone(),
                stale: false,
            },
        );
        Ok(value)
    }

    /// Mark every entry matched by any of `keys` stale. Returns how many.
    pub fn invalidate(&self, keys: &[QueryKey]) -> usize {
        let mut entries = self.entries.borrow_mut();
        let mut marked = 0;
        for (key, entry) in entries.iter_mut() {
            if keys.iter().any(|k| k.matches(key)) {
                entry.stale = true;
                marked += 1;
            }
        }
        tracing::debug!("Invalidated {} cached query(ies)", marked);
        marked
    }

    /// Re-GET every entry matched by `keys` now.
    ///
    /// A failed refetch leaves that entry stale and is logged; it never fails
    /// the caller.
    pub async fn refetch(&self, keys: &[QueryKey]) {
        let targets: Vec<(QueryKey, String)> = self
            .entries
            .borrow()
            .iter()
            .filter(|(key, _)| keys.iter().any(|k| k.matches(key)))
            .map(|(key, entry)| (key.clone(), entry.path.clone()))
            .collect();

        for (key, path) in targets {
            match self.client.get_json(&path).await {
                Ok(value) => {
                    if let Some(entry) = self.entries.borrow_mut().get_mut(&key) {
                        entry.value = value;
                        entry.stale = false;
                    }
                }
                Err(e) => {
                    tracing::warn!("Refetch of {} failed: {}", key, e);
                    if let Some(entry) = self.entries.borrow_mut().get_mut(&key) {
                        entry.stale = true;
                    }
                }
            }
        }
    }

    /// None when the key was never fetched.
    pub fn is_stale(&self, key: &QueryKey) -> Option<bool> {
        self.entries.borrow().get(key).map(|e| e.stale)
    }

    pub fn get(&self, key: &QueryKey) -> Option<Value> {
        self.entries.borrow().get(key).map(|e| e.value.clone())
    }

    pub fn remove(&self, key: &QueryKey) -> Option<Value> {
        self.entries.borrow_mut().remove(key).map(|e| e.value)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}
