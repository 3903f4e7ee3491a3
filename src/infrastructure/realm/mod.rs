//! In-memory realm adapters for the directory, mute, and fetch ports.

mod message_source;
mod mutes;
mod people;
mod snapshot;
mod streams;

pub use message_source::SnapshotMessageSource;
pub use mutes::InMemoryMutes;
pub use people::InMemoryPeople;
pub use snapshot::{MutedTopic, Realm, RealmSnapshot};
pub use streams::InMemoryStreams;
