//! Presentation layer: text output for the command-line front end.

/// Narrow and message list rendering.
pub mod report;

pub use report::{render_filter, render_messages};
