//! Load narrow use case implementation.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::application::services::{
    CacheRelation, MessageListData, MessageListDataCache, SharedMessageListData,
};
use crate::domain::entities::Message;
use crate::domain::errors::NarrowError;
use crate::domain::narrow::Filter;
use crate::domain::ports::{Anchor, FetchRequest, MessageFetcher};

/// Opens a narrow: reuses a cached list, or builds one from related cached
/// lists plus a fetch.
#[derive(Clone)]
pub struct LoadNarrowUseCase {
    fetcher: Arc<dyn MessageFetcher>,
    cache: Arc<MessageListDataCache>,
    num_before: usize,
    num_after: usize,
}

impl LoadNarrowUseCase {
    #[must_use]
    pub const fn new(fetcher: Arc<dyn MessageFetcher>, cache: Arc<MessageListDataCache>) -> Self {
        Self {
            fetcher,
            cache,
            num_before: 50,
            num_after: 50,
        }
    }

    #[must_use]
    pub const fn with_window(mut self, num_before: usize, num_after: usize) -> Self {
        self.num_before = num_before;
        self.num_after = num_after;
        self
    }

    /// Returns the message list for `filter`, selected near `anchor`.
    ///
    /// # Errors
    /// Returns error if the fetch fails.
    pub async fn execute(
        &self,
        filter: Filter,
        anchor: Anchor,
    ) -> Result<SharedMessageListData, NarrowError> {
        let narrow = filter.to_hash();
        let hits = self.cache.get_valid_mlds(&filter);

        if let Some(hit) = hits.iter().find(|hit| hit.relation == CacheRelation::Exact) {
            debug!(narrow = %narrow, "Serving narrow from cache");
            return Ok(Arc::clone(&hit.data));
        }

        let mut mld = MessageListData::new(filter.clone());
        if filter.can_apply_locally() {
            for hit in &hits {
                let seed: Vec<Message> = {
                    let source = hit.data.read();
                    source
                        .all_items()
                        .iter()
                        .filter_map(|id| source.get(*id).cloned())
                        .collect()
                };
                let seed = mld.valid_non_duplicated_messages(seed);
                debug!(
                    narrow = %narrow,
                    relation = ?hit.relation,
                    seeded = seed.len(),
                    "Seeding narrow from cached list"
                );
                mld.add_messages(seed);
            }
        }

        let request = FetchRequest::new(filter.terms().to_vec())
            .with_anchor(anchor)
            .with_window(self.num_before, self.num_after);
        let response = self.fetcher.fetch_messages(&request).await.map_err(|e| {
            warn!(narrow = %narrow, error = %e, "Fetching narrow failed");
            e
        })?;

        mld.fetch_status_mut()
            .record(response.found_oldest, response.found_newest);
        let fresh = mld.valid_non_duplicated_messages(response.messages);
        let added = mld.add_messages(fresh);

        let selected = match anchor {
            Anchor::Id(id) => mld.closest_id(id),
            Anchor::FirstUnread => mld.first_unread_message_id(),
            Anchor::Newest => mld.last().map(Message::id),
            Anchor::Oldest => mld.first().map(Message::id),
        };
        if let Some(id) = selected {
            mld.set_selected_id(id);
        }

        info!(
            narrow = %narrow,
            fetched = added.len(),
            visible = mld.num_items(),
            "Loaded narrow"
        );

        let shared = Arc::new(RwLock::new(mld));
        self.cache.add(Arc::clone(&shared));
        Ok(shared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{MessageFlags, MessageId};
    use crate::domain::ports::mocks::MockMessageFetcher;
    use crate::test_support::{self, ALICE, DENMARK, VERONA};

    fn message(id: u64, topic: &str) -> Message {
        Message::stream(id, ALICE, VERONA, "Verona", topic)
    }

    fn setup(messages: Vec<Message>) -> (LoadNarrowUseCase, Arc<MockMessageFetcher>, Arc<MessageListDataCache>) {
        let fetcher = Arc::new(MockMessageFetcher::new(messages));
        let cache = Arc::new(MessageListDataCache::default());
        let use_case = LoadNarrowUseCase::new(fetcher.clone(), cache.clone());
        (use_case, fetcher, cache)
    }

    #[tokio::test]
    async fn test_load_fetches_filters_and_caches() {
        let (context, _) = test_support::realm();
        let denmark = Message::stream(3_u64, ALICE, DENMARK, "Denmark", "x");
        let (use_case, fetcher, cache) = setup(vec![message(1, "a"), message(2, "b"), denmark]);
        let filter = Filter::parse("stream:Verona", context);

        let mld = use_case.execute(filter.clone(), Anchor::Newest).await.unwrap();

        let mld = mld.read();
        assert_eq!(mld.items(), [MessageId::from(1), MessageId::from(2)]);
        assert_eq!(mld.selected_id(), Some(MessageId::from(2)));
        assert!(mld.fetch_status().has_found_newest());
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(fetcher.last_request().unwrap().terms, filter.terms());
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_second_load_is_served_from_cache() {
        let (context, _) = test_support::realm();
        let (use_case, fetcher, _) = setup(vec![message(1, "a")]);
        let filter = Filter::parse("stream:Verona", context);

        let first = use_case.execute(filter.clone(), Anchor::Newest).await.unwrap();
        let second = use_case.execute(filter, Anchor::Newest).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_topic_narrow_is_seeded_from_stream_narrow() {
        let (context, _) = test_support::realm();
        let (use_case, _, cache) = setup(Vec::new());

        let stream = Filter::parse("stream:Verona", context.clone());
        let mut stream_mld = MessageListData::new(stream);
        stream_mld.add_messages(vec![message(1, "lunch"), message(2, "dinner"), message(3, "lunch")]);
        cache.add(Arc::new(RwLock::new(stream_mld)));

        let topic = Filter::parse("stream:Verona topic:lunch", context);
        let mld = use_case.execute(topic, Anchor::Oldest).await.unwrap();

        let mld = mld.read();
        assert_eq!(mld.items(), [MessageId::from(1), MessageId::from(3)]);
        assert_eq!(mld.selected_id(), Some(MessageId::from(1)));
    }

    #[tokio::test]
    async fn test_first_unread_anchor_selects_unread() {
        let (context, _) = test_support::realm();
        let read = message(1, "a").with_flags(MessageFlags::READ);
        let (use_case, _, _) = setup(vec![read, message(2, "a"), message(3, "a")]);

        let mld = use_case
            .execute(Filter::parse("stream:Verona", context), Anchor::FirstUnread)
            .await
            .unwrap();
        assert_eq!(mld.read().selected_id(), Some(MessageId::from(2)));
    }

    #[tokio::test]
    async fn test_search_narrow_is_not_cached() {
        let (context, _) = test_support::realm();
        let (use_case, fetcher, cache) = setup(vec![message(1, "a")]);
        let filter = Filter::parse("stream:Verona hello", context);

        use_case.execute(filter.clone(), Anchor::Newest).await.unwrap();
        use_case.execute(filter, Anchor::Newest).await.unwrap();

        assert!(cache.is_empty());
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_fetch_failure_propagates() {
        let (context, _) = test_support::realm();
        let fetcher = Arc::new(MockMessageFetcher::failing());
        let cache = Arc::new(MessageListDataCache::default());
        let use_case = LoadNarrowUseCase::new(fetcher, cache.clone());

        let result = use_case
            .execute(Filter::parse("stream:Verona", context), Anchor::Newest)
            .await;

        assert!(matches!(result, Err(NarrowError::FetchFailed { .. })));
        assert!(cache.is_empty());
    }
}
