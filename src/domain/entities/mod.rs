//! Domain entity definitions.

mod message;
mod stream;
mod term;
mod user;

pub use message::{Message, MessageFlags, MessageId, MessageKind};
pub use stream::{Stream, StreamId};
pub use term::Term;
pub use user::{Person, UserId};
