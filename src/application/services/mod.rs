//! Stateful services built on the narrow domain.

pub mod message_list_data;
pub mod message_list_data_cache;

pub use message_list_data::{AddMessagesInfo, FetchStatus, MessageListData, effective_sort_key};
pub use message_list_data_cache::{
    CacheHit, CacheRelation, DEFAULT_CACHE_CAPACITY, MessageListDataCache, SharedMessageListData,
};
