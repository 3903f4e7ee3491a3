//! Message fetch port definition.

use async_trait::async_trait;

use crate::domain::entities::{MessageId, Term};
use crate::domain::errors::NarrowError;

/// Where a fetch is centered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Anchor {
    /// The first unread message in the narrow.
    #[default]
    FirstUnread,
    /// The newest message in the narrow.
    Newest,
    /// The oldest message in the narrow.
    Oldest,
    /// A specific message id.
    Id(MessageId),
}

impl std::str::FromStr for Anchor {
    type Err = NarrowError;

    /// Accepts `newest`, `oldest`, `first_unread`, or a message id.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "newest" => Ok(Self::Newest),
            "oldest" => Ok(Self::Oldest),
            "first_unread" | "first-unread" => Ok(Self::FirstUnread),
            other => other.parse::<MessageId>().map(Self::Id),
        }
    }
}

/// Options for fetching messages matching a narrow.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub anchor: Anchor,
    pub num_before: usize,
    pub num_after: usize,
    pub terms: Vec<Term>,
}

impl FetchRequest {
    #[must_use]
    pub fn new(terms: Vec<Term>) -> Self {
        Self {
            anchor: Anchor::default(),
            num_before: 50,
            num_after: 50,
            terms,
        }
    }

    #[must_use]
    pub const fn with_anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    #[must_use]
    pub const fn with_window(mut self, num_before: usize, num_after: usize) -> Self {
        self.num_before = num_before;
        self.num_after = num_after;
        self
    }
}

/// Fetched batch plus whether it reached either end of history.
#[derive(Debug, Clone, Default)]
pub struct FetchResponse {
    pub messages: Vec<crate::domain::entities::Message>,
    pub found_oldest: bool,
    pub found_newest: bool,
}

/// Port for fetching raw message records.
#[async_trait]
pub trait MessageFetcher: Send + Sync {
    /// Fetches messages around an anchor. The server applies the full
    /// narrow, including search terms the client cannot evaluate.
    async fn fetch_messages(&self, request: &FetchRequest) -> Result<FetchResponse, NarrowError>;
}
