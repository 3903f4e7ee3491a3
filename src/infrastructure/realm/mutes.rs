//! In-memory mute settings.

use std::collections::HashSet;

use parking_lot::RwLock;

use crate::domain::entities::{StreamId, UserId};
use crate::domain::ports::MuteState;

#[derive(Debug, Default)]
struct MuteTable {
    topics: HashSet<(StreamId, String)>,
    streams: HashSet<StreamId>,
    users: HashSet<UserId>,
}

/// Mute settings shared between the settings UI and every message list.
///
/// Topic names compare case-insensitively.
#[derive(Debug, Default)]
pub struct InMemoryMutes {
    table: RwLock<MuteTable>,
}

impl InMemoryMutes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mute_topic(&self, stream_id: StreamId, topic: &str) {
        self.table
            .write()
            .topics
            .insert((stream_id, topic.to_lowercase()));
    }

    pub fn unmute_topic(&self, stream_id: StreamId, topic: &str) {
        self.table
            .write()
            .topics
            .remove(&(stream_id, topic.to_lowercase()));
    }

    pub fn mute_stream(&self, stream_id: StreamId) {
        self.table.write().streams.insert(stream_id);
    }

    pub fn unmute_stream(&self, stream_id: StreamId) {
        self.table.write().streams.remove(&stream_id);
    }

    pub fn mute_user(&self, user_id: UserId) {
        self.table.write().users.insert(user_id);
    }

    pub fn unmute_user(&self, user_id: UserId) {
        self.table.write().users.remove(&user_id);
    }
}

impl MuteState for InMemoryMutes {
    fn is_topic_muted(&self, stream_id: StreamId, topic: &str) -> bool {
        self.table
            .read()
            .topics
            .contains(&(stream_id, topic.to_lowercase()))
    }

    fn is_stream_muted(&self, stream_id: StreamId) -> bool {
        self.table.read().streams.contains(&stream_id)
    }

    fn is_user_muted(&self, user_id: UserId) -> bool {
        self.table.read().users.contains(&user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_mutes_ignore_case() {
        let mutes = InMemoryMutes::new();
        mutes.mute_topic(StreamId(1), "Lunch");
        assert!(mutes.is_topic_muted(StreamId(1), "lunch"));
        assert!(!mutes.is_topic_muted(StreamId(2), "lunch"));

        mutes.unmute_topic(StreamId(1), "LUNCH");
        assert!(!mutes.is_topic_muted(StreamId(1), "lunch"));
    }

    #[test]
    fn test_stream_and_user_mutes() {
        let mutes = InMemoryMutes::new();
        mutes.mute_stream(StreamId(3));
        mutes.mute_user(UserId(4));
        assert!(mutes.is_stream_muted(StreamId(3)));
        assert!(mutes.is_user_muted(UserId(4)));

        mutes.unmute_stream(StreamId(3));
        mutes.unmute_user(UserId(4));
        assert!(!mutes.is_stream_muted(StreamId(3)));
        assert!(!mutes.is_user_muted(UserId(4)));
    }
}
