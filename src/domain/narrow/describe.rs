//! Human-readable descriptions of narrows.

use super::filter::canonicalize_operator;
use crate::domain::entities::Term;

const VALID_IS_DESCRIPTIONS: &[&str] = &["private", "starred", "alerted", "unread"];
const VALID_HAS_OPERANDS: &[&str] = &[
    "image",
    "images",
    "link",
    "links",
    "attachment",
    "attachments",
];

/// English prefix for an operator, or an empty string for operators the
/// search language does not know.
#[must_use]
pub fn operator_to_prefix(operator: &str, negated: bool) -> String {
    let operator = canonicalize_operator(operator);
    if operator == "search" {
        return if negated { "exclude" } else { "search for" }.to_string();
    }

    let phrase = match operator.as_str() {
        "stream" => "stream",
        "streams" => "streams",
        "near" => "messages around",
        "has" => "messages with one or more",
        "id" => "message ID",
        "topic" => "topic",
        "sender" => "sent by",
        "pm-with" => "private messages with",
        "in" => "messages in",
        "is" => "messages that are",
        "group-pm-with" => "group private messages including",
        _ => return String::new(),
    };

    if negated {
        format!("exclude {phrase}")
    } else {
        phrase.to_string()
    }
}

fn describe_is_operator(term: &Term) -> String {
    let verb = if term.negated { "exclude " } else { "" };
    let operand = term.operand.as_str();
    if VALID_IS_DESCRIPTIONS.contains(&operand) {
        format!("{verb}{operand} messages")
    } else if operand == "mentioned" {
        format!("{verb}@-mentions")
    } else {
        format!("invalid {operand} operand for is operator")
    }
}

fn describe_term(term: &Term) -> String {
    let operator = canonicalize_operator(&term.operator);
    if operator == "is" {
        return describe_is_operator(term);
    }
    if operator == "has" && !VALID_HAS_OPERANDS.contains(&term.operand.as_str()) {
        return format!("invalid {} operand for has operator", term.operand);
    }

    let prefix = operator_to_prefix(&operator, term.negated);
    if prefix.is_empty() {
        "unknown operator".to_string()
    } else {
        format!("{prefix} {}", term.operand)
    }
}

/// Builds a phrase such as `stream Verona > lunch, sent by alice@example.com`.
#[must_use]
pub fn describe(terms: &[Term]) -> String {
    let mut parts = Vec::with_capacity(terms.len());
    let mut rest = terms;

    if let [stream, topic, tail @ ..] = terms
        && stream.is("stream")
        && topic.is("topic")
    {
        parts.push(format!("stream {} > {}", stream.operand, topic.operand));
        rest = tail;
    }

    parts.extend(rest.iter().map(describe_term));
    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_stream_topic_pair() {
        let terms = vec![Term::new("stream", "foo"), Term::new("topic", "bar")];
        assert_eq!(describe(&terms), "stream foo > bar");
    }

    #[test]
    fn test_negated_topic_is_not_collapsed() {
        let terms = vec![Term::new("stream", "foo"), Term::negated("topic", "bar")];
        assert_eq!(describe(&terms), "stream foo, exclude topic bar");
    }

    #[test]
    fn test_multiple_terms() {
        let terms = vec![
            Term::new("stream", "devel"),
            Term::new("topic", "release"),
            Term::new("sender", "alice@example.com"),
            Term::new("search", "tag"),
        ];
        assert_eq!(
            describe(&terms),
            "stream devel > release, sent by alice@example.com, search for tag"
        );
    }

    #[test_case(Term::new("is", "starred"), "starred messages" ; "is_starred")]
    #[test_case(Term::negated("is", "unread"), "exclude unread messages" ; "not_unread")]
    #[test_case(Term::new("is", "mentioned"), "@-mentions" ; "mentioned")]
    #[test_case(Term::new("is", "bogus"), "invalid bogus operand for is operator" ; "invalid_is")]
    #[test_case(Term::new("has", "image"), "messages with one or more image" ; "has_image")]
    #[test_case(Term::new("has", "emoji"), "invalid emoji operand for has operator" ; "invalid_has")]
    #[test_case(Term::new("from", "bob@example.com"), "sent by bob@example.com" ; "from_synonym")]
    #[test_case(Term::new("frobnicate", "x"), "unknown operator" ; "unknown")]
    #[test_case(Term::negated("search", "lunch"), "exclude lunch" ; "negated_search")]
    fn test_single_term(term: Term, expected: &str) {
        assert_eq!(describe(&[term]), expected);
    }

    #[test]
    fn test_operator_to_prefix() {
        assert_eq!(operator_to_prefix("near", false), "messages around");
        assert_eq!(operator_to_prefix("Subject", true), "exclude topic");
        assert_eq!(operator_to_prefix("bogus", false), "");
    }
}
