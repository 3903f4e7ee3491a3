//! Ports for the collaborators the narrowing core consumes.

mod message_fetch_port;
mod mute_state_port;
mod people_port;
mod stream_directory_port;

pub use message_fetch_port::{Anchor, FetchRequest, FetchResponse, MessageFetcher};
pub use mute_state_port::MuteState;
pub use people_port::PeopleDirectory;
pub use stream_directory_port::StreamDirectory;

#[cfg(test)]
pub mod mocks {
    pub use super::message_fetch_port::mock::MockMessageFetcher;
    pub use super::mute_state_port::MockMuteState;
}
