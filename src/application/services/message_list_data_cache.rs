//! LRU cache of message lists keyed by narrow hash.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace};

use super::message_list_data::MessageListData;
use crate::domain::entities::Term;
use crate::domain::narrow::{Filter, terms_to_hash};

/// Default maximum number of message lists kept in memory.
pub const DEFAULT_CACHE_CAPACITY: usize = 100;

/// A message list shared between the cache and its views.
pub type SharedMessageListData = Arc<RwLock<MessageListData>>;

/// How a cached list relates to the requested narrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheRelation {
    /// Same canonical narrow.
    Exact,
    /// Every message of the requested narrow is also in the cached one.
    Superset,
    /// The cached narrow is contained in the requested one.
    Subset,
}

/// A cached list usable as a data source for a requested narrow.
#[derive(Debug, Clone)]
pub struct CacheHit {
    pub relation: CacheRelation,
    pub data: SharedMessageListData,
}

#[derive(Debug)]
struct CacheEntry {
    filter: Filter,
    data: SharedMessageListData,
}

/// Bounded cache of message lists.
pub struct MessageListDataCache {
    entries: Mutex<LruCache<String, CacheEntry>>,
}

impl MessageListDataCache {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(cap)),
        }
    }

    #[must_use]
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }

    /// Caches a list under its filter's hash.
    ///
    /// Lists whose filter needs the server to evaluate, and empty lists, are
    /// not cached. Returns whether the list was stored.
    pub fn add(&self, data: SharedMessageListData) -> bool {
        let filter = {
            let mld = data.read();
            if !mld.filter().can_apply_locally() || mld.is_empty() {
                trace!(narrow = %mld.filter().to_hash(), "Not caching message list");
                return false;
            }
            mld.filter().clone()
        };
        let key = filter.to_hash();
        debug!(narrow = %key, "Caching message list");
        self.entries.lock().put(key, CacheEntry { filter, data });
        true
    }

    /// Looks up the list for exactly this narrow, marking it recently used.
    #[must_use]
    pub fn get(&self, filter: &Filter) -> Option<SharedMessageListData> {
        self.entries
            .lock()
            .get(&filter.to_hash())
            .map(|entry| Arc::clone(&entry.data))
    }

    /// Cached lists that can seed a view of `filter`.
    ///
    /// Probes the exact narrow, then narrows guaranteed to contain it
    /// (`is:private` for private conversations, the bare stream for a
    /// stream topic), then narrows it contains (private conversations for
    /// `is:private`, topics for a bare stream).
    #[must_use]
    pub fn get_valid_mlds(&self, filter: &Filter) -> Vec<CacheHit> {
        let mut entries = self.entries.lock();
        let mut hits = Vec::new();

        if let Some(entry) = entries.get(&filter.to_hash()) {
            hits.push(CacheHit {
                relation: CacheRelation::Exact,
                data: Arc::clone(&entry.data),
            });
        }

        let mut superset_keys = Vec::new();
        if !filter.operands("pm-with").is_empty() || !filter.operands("group-pm-with").is_empty() {
            superset_keys.push(terms_to_hash(&[Term::new("is", "private")]));
        }
        if !filter.operands("topic").is_empty()
            && let Some(stream) = filter.operands("stream").first()
        {
            superset_keys.push(terms_to_hash(&[Term::new("stream", *stream)]));
        }
        for key in superset_keys {
            if let Some(entry) = entries.get(&key) {
                hits.push(CacheHit {
                    relation: CacheRelation::Superset,
                    data: Arc::clone(&entry.data),
                });
            }
        }

        let is_contained: Option<Box<dyn Fn(&Filter) -> bool>> =
            if filter.is_exactly(&["is-private"]) {
                Some(Box::new(|cached: &Filter| {
                    cached.is_exactly(&["pm-with"]) || cached.is_exactly(&["group-pm-with"])
                }))
            } else if filter.is_exactly(&["stream"]) {
                let stream = filter.operands("stream").first().map(|s| (*s).to_string());
                Some(Box::new(move |cached: &Filter| {
                    cached.is_exactly(&["stream", "topic"])
                        && stream
                            .as_deref()
                            .is_some_and(|stream| cached.has_operand("stream", stream))
                }))
            } else {
                None
            };
        if let Some(is_contained) = is_contained {
            hits.extend(
                entries
                    .iter()
                    .filter(|(_, entry)| is_contained(&entry.filter))
                    .map(|(_, entry)| CacheHit {
                        relation: CacheRelation::Subset,
                        data: Arc::clone(&entry.data),
                    }),
            );
        }

        trace!(narrow = %filter.to_hash(), hits = hits.len(), "Cache lookup");
        hits
    }

    pub fn remove(&self, filter: &Filter) -> Option<SharedMessageListData> {
        self.entries
            .lock()
            .pop(&filter.to_hash())
            .map(|entry| entry.data)
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MessageListDataCache {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

impl std::fmt::Debug for MessageListDataCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageListDataCache")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}
