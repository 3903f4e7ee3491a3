//! Application layer with message list services and use cases.

/// Message lists and their cache.
pub mod services;
/// Use case implementations.
pub mod use_cases;

pub use services::{MessageListData, MessageListDataCache, SharedMessageListData};
pub use use_cases::LoadNarrowUseCase;
