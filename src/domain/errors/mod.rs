//! Domain error types.

mod narrow_error;

pub use narrow_error::NarrowError;
