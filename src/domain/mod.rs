//! Domain layer with core entities, narrow filters, and port definitions.

/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Case-insensitive string map.
pub mod fold_dict;
/// Narrow filters and the search language.
pub mod narrow;
/// Port definitions.
pub mod ports;
/// Serde utilities.
pub mod serde_utils;

pub use entities::{Message, MessageId, Term};
pub use errors::NarrowError;
pub use fold_dict::FoldDict;
pub use narrow::{Filter, NarrowContext};
