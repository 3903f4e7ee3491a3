//! chat-narrow - narrowing engine for a team chat client.
//!
//! Parses search queries into filters, evaluates them against messages,
//! and keeps ordered, de-duplicated message lists per narrow with an LRU
//! cache shared across narrows.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Application layer containing message lists, their cache, and use cases.
pub mod application;
/// Domain layer containing entities, errors, narrows, and port definitions.
pub mod domain;
/// Infrastructure layer containing configuration and realm adapters.
pub mod infrastructure;
/// Presentation layer containing text reports.
pub mod presentation;

#[cfg(test)]
mod test_support;

/// Current version of the application.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const NAME: &str = "chat-narrow";
