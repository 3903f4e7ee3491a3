//! Message source that answers fetches from an in-memory history.
//!
//! Evaluates the whole narrow the way a server would, including the
//! `search` and `has` terms clients cannot apply locally.

use async_trait::async_trait;
use tracing::debug;

use crate::domain::entities::{Message, Term};
use crate::domain::errors::NarrowError;
use crate::domain::narrow::{Filter, NarrowContext, message_matches_search_term};
use crate::domain::ports::{Anchor, FetchRequest, FetchResponse, MessageFetcher};

const IMAGE_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".webp"];

/// Serves fetches from a fixed, id-ordered message history.
#[derive(Debug, Clone)]
pub struct SnapshotMessageSource {
    messages: Vec<Message>,
    context: NarrowContext,
}

impl SnapshotMessageSource {
    #[must_use]
    pub fn new(mut messages: Vec<Message>, context: NarrowContext) -> Self {
        messages.sort_by_key(Message::id);
        messages.dedup_by_key(|message| message.id());
        Self { messages, context }
    }

    fn matches_term(&self, message: &Message, term: &Term) -> bool {
        let matched = match term.operator.as_str() {
            "search" => {
                let haystack = format!("{} {}", message.topic(), message.content()).to_lowercase();
                term.operand
                    .split_whitespace()
                    .map(|word| word.trim_matches('"'))
                    .all(|word| haystack.contains(word))
            }
            "has" => has_content(message.content(), &term.operand),
            _ => message_matches_search_term(message, &term.operator, &term.operand, &self.context),
        };
        matched != term.negated
    }

    fn matching(&self, filter: &Filter) -> Vec<&Message> {
        self.messages
            .iter()
            .filter(|message| filter.terms().iter().all(|term| self.matches_term(message, term)))
            .collect()
    }
}

fn has_content(content: &str, operand: &str) -> bool {
    let content = content.to_lowercase();
    match operand {
        "link" => content.contains("http://") || content.contains("https://"),
        "image" => IMAGE_EXTENSIONS.iter().any(|ext| content.contains(ext)),
        "attachment" => content.contains("/user_uploads/"),
        _ => false,
    }
}

#[async_trait]
impl MessageFetcher for SnapshotMessageSource {
    async fn fetch_messages(&self, request: &FetchRequest) -> Result<FetchResponse, NarrowError> {
        let filter = Filter::new(request.terms.clone(), self.context.clone());
        let matching = self.matching(&filter);
        if matching.is_empty() {
            return Ok(FetchResponse {
                messages: Vec::new(),
                found_oldest: true,
                found_newest: true,
            });
        }

        let last = matching.len() - 1;
        let anchor_index = match request.anchor {
            Anchor::Oldest => 0,
            Anchor::Newest => last,
            Anchor::FirstUnread => matching
                .iter()
                .position(|message| message.is_unread())
                .unwrap_or(last),
            Anchor::Id(id) => matching
                .partition_point(|message| message.id() < id)
                .min(last),
        };

        let start = anchor_index.saturating_sub(request.num_before);
        let end = (anchor_index + request.num_after + 1).min(matching.len());
        debug!(
            narrow = %filter.to_hash(),
            matched = matching.len(),
            start,
            end,
            "Serving fetch"
        );

        Ok(FetchResponse {
            messages: matching[start..end].iter().map(|m| (*m).clone()).collect(),
            found_oldest: start == 0,
            found_newest: end == matching.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{MessageFlags, MessageId};
    use crate::test_support::{self, ALICE, BOB, DENMARK, VERONA};

    fn source() -> SnapshotMessageSource {
        let (context, _) = test_support::realm();
        let messages = (1..=10_u64)
            .map(|id| {
                let stream = if id % 2 == 0 { VERONA } else { DENMARK };
                let name = if id % 2 == 0 { "Verona" } else { "Denmark" };
                Message::stream(id, ALICE, stream, name, "lunch")
                    .with_content(format!("message number {id}"))
                    .with_flags(if id < 7 { MessageFlags::READ } else { MessageFlags::empty() })
            })
            .chain([Message::stream(11_u64, BOB, VERONA, "Verona", "links")
                .with_content("see https://example.com/cat.png")
                .with_flags(MessageFlags::READ)])
            .collect();
        SnapshotMessageSource::new(messages, context)
    }

    fn ids(response: &FetchResponse) -> Vec<MessageId> {
        response.messages.iter().map(Message::id).collect()
    }

    #[tokio::test]
    async fn test_fetch_applies_stream_filter() {
        let request = FetchRequest::new(vec![Term::new("stream", "Verona")]).with_anchor(Anchor::Oldest);
        let response = source().fetch_messages(&request).await.unwrap();

        assert_eq!(
            ids(&response),
            [2, 4, 6, 8, 10, 11].map(MessageId::from).to_vec()
        );
        assert!(response.found_oldest);
        assert!(response.found_newest);
    }

    #[tokio::test]
    async fn test_fetch_windows_around_anchor() {
        let request = FetchRequest::new(Vec::new())
            .with_anchor(Anchor::Id(MessageId::from(5)))
            .with_window(2, 1);
        let response = source().fetch_messages(&request).await.unwrap();

        assert_eq!(ids(&response), [3, 4, 5, 6].map(MessageId::from).to_vec());
        assert!(!response.found_oldest);
        assert!(!response.found_newest);
    }

    #[tokio::test]
    async fn test_fetch_first_unread_anchor() {
        let request = FetchRequest::new(Vec::new()).with_window(1, 0);
        let response = source().fetch_messages(&request).await.unwrap();
        assert_eq!(ids(&response), [6, 7].map(MessageId::from).to_vec());
    }

    #[tokio::test]
    async fn test_fetch_evaluates_search_and_has() {
        let search = FetchRequest::new(vec![Term::new("search", "number 1")]).with_anchor(Anchor::Oldest);
        let response = source().fetch_messages(&search).await.unwrap();
        assert_eq!(ids(&response), [1, 10].map(MessageId::from).to_vec());

        let has = FetchRequest::new(vec![Term::new("has", "images")]).with_anchor(Anchor::Oldest);
        let response = source().fetch_messages(&has).await.unwrap();
        assert_eq!(ids(&response), vec![MessageId::from(11)]);
    }

    #[tokio::test]
    async fn test_fetch_empty_narrow() {
        let request = FetchRequest::new(vec![Term::new("stream", "Nowhere")]);
        let response = source().fetch_messages(&request).await.unwrap();
        assert!(response.messages.is_empty());
        assert!(response.found_oldest && response.found_newest);
    }
}
