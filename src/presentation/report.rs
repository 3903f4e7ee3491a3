//! Plain-text rendering of a narrow and the messages it selected.

use std::fmt::Write;

use crate::application::services::MessageListData;
use crate::domain::entities::Message;
use crate::domain::narrow::Filter;

/// Describes the filter itself: canonical terms, prose, and hash.
#[must_use]
pub fn render_filter(filter: &Filter) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "query:       {}", filter.unparse());
    let _ = writeln!(out, "description: {}", filter.describe());
    let _ = writeln!(out, "hash:        {}", filter.to_hash());
    let _ = writeln!(out, "local:       {}", filter.can_apply_locally());
    let _ = writeln!(out, "terms:");
    for term in filter.terms() {
        let _ = writeln!(out, "  {term}");
    }
    out
}

fn render_message(message: &Message, selected: bool) -> String {
    let marker = if selected { '>' } else { ' ' };
    let unread = if message.is_unread() { '*' } else { ' ' };
    let location = match message.stream_name() {
        Some(stream) => format!("#{stream} > {}", message.topic()),
        None => "private".to_string(),
    };
    let sender = if message.sender_email().is_empty() {
        message.sender_id().to_string()
    } else {
        message.sender_email().to_string()
    };
    format!(
        "{marker}{unread} {:>8}  {}  {location}  {sender}: {}",
        message.id(),
        message.formatted_timestamp(),
        message.content()
    )
}

/// Lists the visible messages of a loaded narrow.
#[must_use]
pub fn render_messages(mld: &MessageListData) -> String {
    let mut out = String::new();
    let hidden = mld.all_items().len() - mld.num_items();
    let _ = writeln!(
        out,
        "messages:    {} visible, {hidden} muted",
        mld.num_items()
    );
    for message in mld.all_messages() {
        let selected = mld.selected_id() == Some(message.id());
        let _ = writeln!(out, "{}", render_message(message, selected));
    }
    let status = mld.fetch_status();
    if !status.has_found_oldest() || !status.has_found_newest() {
        let _ = writeln!(out, "(more history available)");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::MessageFlags;
    use crate::test_support::{self, ALICE, VERONA};

    #[test]
    fn test_render_filter() {
        let (context, _) = test_support::realm();
        let filter = Filter::parse("stream:verona -is:starred lunch", context);
        let report = render_filter(&filter);

        assert!(report.contains("query:       stream:Verona -is:starred lunch"));
        assert!(report.contains("description: stream Verona, exclude starred messages, search for lunch"));
        assert!(report.contains("hash:        #narrow/stream/Verona/-is/starred/search/lunch"));
        assert!(report.contains("local:       false"));
        assert!(report.contains("  -is:starred"));
    }

    #[test]
    fn test_render_messages_marks_selection_and_unread() {
        let (context, _) = test_support::realm();
        let mut mld = MessageListData::new(Filter::parse("stream:Verona", context));
        mld.add_messages(vec![
            Message::stream(1_u64, ALICE, VERONA, "Verona", "lunch")
                .with_flags(MessageFlags::READ)
                .with_content("hi"),
            Message::stream(2_u64, ALICE, VERONA, "Verona", "lunch").with_content("there"),
        ]);
        mld.select_idx(1);

        let report = render_messages(&mld);
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines[0], "messages:    2 visible, 0 muted");
        assert!(lines[1].starts_with("  "));
        assert!(lines[2].starts_with(">*"));
        assert!(lines[2].ends_with("#Verona > lunch  2: there"));
        assert_eq!(lines[3], "(more history available)");
    }
}
