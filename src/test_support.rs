//! Shared fixtures: a small realm with four people and three streams.

use std::sync::Arc;

use crate::domain::entities::{Person, Stream, StreamId, UserId};
use crate::domain::narrow::NarrowContext;
use crate::infrastructure::realm::{InMemoryMutes, InMemoryPeople, InMemoryStreams};

pub const ME: UserId = UserId(1);
pub const ALICE: UserId = UserId(2);
pub const BOB: UserId = UserId(3);
pub const CORDELIA: UserId = UserId(4);

pub const VERONA: StreamId = StreamId(10);
pub const DENMARK: StreamId = StreamId(11);
pub const SOCIAL: StreamId = StreamId(12);

pub fn streams() -> InMemoryStreams {
    InMemoryStreams::from_streams([
        Stream::new(VERONA, "Verona"),
        Stream::new(DENMARK, "Denmark"),
        Stream::new(SOCIAL, "social"),
    ])
}

pub fn people() -> InMemoryPeople {
    let people = InMemoryPeople::new(Person::new(ME, "me@example.com", "Me"));
    people.add_person(Person::new(ALICE, "alice@example.com", "Alice"));
    people.add_person(Person::new(BOB, "bob@example.com", "Bob"));
    people.add_person(Person::new(CORDELIA, "cordelia@example.com", "Cordelia"));
    people
}

/// Builds a fresh realm. The returned mutes are shared with the context.
pub fn realm() -> (NarrowContext, Arc<InMemoryMutes>) {
    let mutes = Arc::new(InMemoryMutes::new());
    let context = NarrowContext::new(Arc::new(streams()), Arc::new(people()), mutes.clone());
    (context, mutes)
}
