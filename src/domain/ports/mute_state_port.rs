//! Mute state port definition.

use crate::domain::entities::{StreamId, UserId};

/// Read-only view of the user's mute settings.
#[cfg_attr(test, mockall::automock)]
pub trait MuteState: Send + Sync {
    /// Checks whether a topic within a stream is muted.
    fn is_topic_muted(&self, stream_id: StreamId, topic: &str) -> bool;

    /// Checks whether a whole stream is muted.
    fn is_stream_muted(&self, stream_id: StreamId) -> bool;

    /// Checks whether a user is muted.
    fn is_user_muted(&self, user_id: UserId) -> bool;
}
