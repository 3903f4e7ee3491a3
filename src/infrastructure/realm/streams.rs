//! In-memory stream directory.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::domain::entities::{Stream, StreamId};
use crate::domain::fold_dict::FoldDict;
use crate::domain::ports::StreamDirectory;

#[derive(Debug, Default)]
struct StreamTable {
    by_name: FoldDict<StreamId>,
    by_id: HashMap<StreamId, String>,
}

/// Stream directory backed by a case-insensitive name table.
///
/// Renames take effect for every filter sharing the directory.
#[derive(Debug, Default)]
pub struct InMemoryStreams {
    table: RwLock<StreamTable>,
}

impl InMemoryStreams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_streams(streams: impl IntoIterator<Item = Stream>) -> Self {
        let directory = Self::new();
        for stream in streams {
            directory.add_stream(&stream);
        }
        directory
    }

    pub fn add_stream(&self, stream: &Stream) {
        let mut guard = self.table.write();
        let table = &mut *guard;
        if let Some(previous) = table.by_id.insert(stream.stream_id(), stream.name().to_string()) {
            table.by_name.remove(&previous);
        }
        table.by_name.insert(stream.name(), stream.stream_id());
    }

    /// Renames a known stream. Returns `false` for unknown ids.
    pub fn rename_stream(&self, stream_id: StreamId, new_name: &str) -> bool {
        let mut guard = self.table.write();
        let table = &mut *guard;
        let Some(old_name) = table.by_id.get(&stream_id).cloned() else {
            return false;
        };
        table.by_name.remove(&old_name);
        table.by_name.insert(new_name, stream_id);
        table.by_id.insert(stream_id, new_name.to_string());
        true
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.table.read().by_id.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StreamDirectory for InMemoryStreams {
    fn stream_id(&self, name: &str) -> Option<StreamId> {
        self.table.read().by_name.get(name).copied()
    }

    fn canonical_name(&self, name: &str) -> Option<String> {
        self.table
            .read()
            .by_name
            .original_key(name)
            .map(str::to_string)
    }

    fn stream_name(&self, stream_id: StreamId) -> Option<String> {
        self.table.read().by_id.get(&stream_id).cloned()
    }
}
