//! Narrowing error types.

use thiserror::Error;

use crate::domain::entities::MessageId;

/// Errors raised while maintaining or loading a narrowed message view.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum NarrowError {
    #[error("duplicate message {id} added to message list")]
    DuplicateMessage { id: MessageId },

    #[error("message range given an invalid start")]
    InvalidRangeStart,

    #[error("invalid message id: {value}")]
    InvalidMessageId { value: String },

    #[error("failed to fetch messages: {message}")]
    FetchFailed { message: String },

    #[error("invalid realm snapshot: {message}")]
    Snapshot { message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl NarrowError {
    /// Creates invalid message id error.
    #[must_use]
    pub fn invalid_message_id(value: impl Into<String>) -> Self {
        Self::InvalidMessageId {
            value: value.into(),
        }
    }

    /// Creates fetch failure error.
    #[must_use]
    pub fn fetch_failed(message: impl Into<String>) -> Self {
        Self::FetchFailed {
            message: message.into(),
        }
    }

    /// Creates snapshot error.
    #[must_use]
    pub fn snapshot(message: impl Into<String>) -> Self {
        Self::Snapshot {
            message: message.into(),
        }
    }

    /// Returns whether the error reports a broken list invariant rather than
    /// a failure of an external collaborator.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::DuplicateMessage { .. } | Self::InvalidRangeStart
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_classification() {
        assert!(NarrowError::InvalidRangeStart.is_internal());
        assert!(
            NarrowError::DuplicateMessage {
                id: MessageId::from(3)
            }
            .is_internal()
        );
        assert!(!NarrowError::fetch_failed("timeout").is_internal());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            NarrowError::invalid_message_id("abc").to_string(),
            "invalid message id: abc"
        );
    }
}
