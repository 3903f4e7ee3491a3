//! Stream directory port definition.

use crate::domain::entities::StreamId;

/// Resolves stream names to ids and canonical spellings.
pub trait StreamDirectory: Send + Sync {
    /// Returns the id of a known stream, matching the name case-insensitively.
    fn stream_id(&self, name: &str) -> Option<StreamId>;

    /// Returns the canonical spelling of a known stream name.
    fn canonical_name(&self, name: &str) -> Option<String>;

    /// Returns the current name of a stream.
    fn stream_name(&self, stream_id: StreamId) -> Option<String>;
}
