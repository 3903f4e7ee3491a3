//! Canonical, immutable filters built from parsed terms.

use std::sync::{Arc, OnceLock};

use super::context::NarrowContext;
use super::describe::describe;
use super::hash::terms_to_hash;
use super::parser::{parse, unparse};
use super::predicate::MessagePredicate;
use crate::domain::entities::{Message, Term, UserId};

/// Bucket precedence for [`sorted_term_types`]. `is`, `has`, and `in`
/// stand for every `is-*`, `has-*`, and `in-*` bucket.
const TERM_TYPE_LEVELS: &[&str] = &[
    "in",
    "stream",
    "topic",
    "pm-with",
    "group-pm-with",
    "sender",
    "near",
    "id",
    "is",
    "has",
    "search",
];

fn is_topic_synonym(operator: &str) -> bool {
    operator == "subject"
}

/// Lowercases an operator and folds synonyms onto their canonical name.
#[must_use]
pub fn canonicalize_operator(operator: &str) -> String {
    let operator = operator.to_lowercase();
    if operator == "from" {
        "sender".to_string()
    } else if is_topic_synonym(&operator) {
        "topic".to_string()
    } else {
        operator
    }
}

/// Normalizes a term's operator and operand. Never fails: operands that
/// cannot be resolved (an unknown stream, say) pass through unchanged.
#[must_use]
pub fn canonicalize_term(term: &Term, context: &NarrowContext) -> Term {
    let operator = canonicalize_operator(&term.operator);
    let operand = match operator.as_str() {
        "has" => term
            .operand
            .strip_suffix('s')
            .unwrap_or(&term.operand)
            .to_string(),
        "stream" => context
            .streams()
            .canonical_name(&term.operand)
            .unwrap_or_else(|| term.operand.clone()),
        "sender" | "pm-with" => {
            let operand = term.operand.to_lowercase();
            if operand == "me" {
                context.people().my_email()
            } else {
                operand
            }
        }
        // Some keyboards substitute curly quotes while typing.
        "search" => term
            .operand
            .to_lowercase()
            .replace(['\u{201C}', '\u{201D}'], "\""),
        _ => term.operand.to_lowercase(),
    };

    Term {
        negated: term.negated,
        operator,
        operand,
    }
}

/// Classifies a term into its bucket, e.g. `stream`, `not-topic`, `is-starred`.
#[must_use]
pub fn term_type(term: &Term) -> String {
    let mut result = if term.negated {
        String::from("not-")
    } else {
        String::new()
    };
    result.push_str(&term.operator);
    if matches!(term.operator.as_str(), "is" | "has" | "in") {
        result.push('-');
        result.push_str(&term.operand);
    }
    result
}

fn term_type_level(term_type: &str) -> usize {
    let base = ["is-", "has-", "in-"]
        .iter()
        .find(|prefix| term_type.starts_with(*prefix))
        .map_or(term_type, |prefix| prefix.trim_end_matches('-'));
    TERM_TYPE_LEVELS
        .iter()
        .position(|level| *level == base)
        .unwrap_or(usize::MAX)
}

/// Sorts bucket names by precedence, then alphabetically.
#[must_use]
pub fn sorted_term_types<S: AsRef<str>>(term_types: &[S]) -> Vec<String> {
    let mut sorted: Vec<String> = term_types.iter().map(|t| t.as_ref().to_string()).collect();
    sorted.sort_by(|a, b| {
        term_type_level(a)
            .cmp(&term_type_level(b))
            .then_with(|| a.cmp(b))
    });
    sorted
}

fn fix_redundant_is_private(terms: Vec<Term>) -> Vec<Term> {
    if !terms.iter().any(|term| term_type(term) == "pm-with") {
        return terms;
    }
    terms
        .into_iter()
        .filter(|term| term_type(term) != "is-private")
        .collect()
}

/// An immutable, canonicalized narrow.
///
/// Two filters are equal when their term lists are equal in order. The
/// compiled predicate is built on first use and shared by clones.
#[derive(Debug, Clone)]
pub struct Filter {
    terms: Vec<Term>,
    context: NarrowContext,
    predicate: OnceLock<Arc<MessagePredicate>>,
}

impl PartialEq for Filter {
    fn eq(&self, other: &Self) -> bool {
        self.terms == other.terms
    }
}

impl Eq for Filter {}

impl Filter {
    #[must_use]
    pub fn new(terms: Vec<Term>, context: NarrowContext) -> Self {
        let terms = terms
            .iter()
            .map(|term| canonicalize_term(term, &context))
            .collect();
        Self {
            terms: fix_redundant_is_private(terms),
            context,
            predicate: OnceLock::new(),
        }
    }

    /// Parses and canonicalizes a search string.
    #[must_use]
    pub fn parse(text: &str, context: NarrowContext) -> Self {
        Self::new(parse(text), context)
    }

    #[must_use]
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    #[must_use]
    pub fn operators(&self) -> &[Term] {
        self.terms()
    }

    #[must_use]
    pub const fn context(&self) -> &NarrowContext {
        &self.context
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    #[must_use]
    pub fn has_operator(&self, operator: &str) -> bool {
        self.terms.iter().any(|term| term.operator == operator)
    }

    #[must_use]
    pub fn has_operand(&self, operator: &str, operand: &str) -> bool {
        self.terms
            .iter()
            .any(|term| term.is(operator) && term.operand == operand)
    }

    #[must_use]
    pub fn has_negated_operand(&self, operator: &str, operand: &str) -> bool {
        self.terms
            .iter()
            .any(|term| term.negated && term.operator == operator && term.operand == operand)
    }

    /// Non-negated operands of `operator`, in term order.
    #[must_use]
    pub fn operands(&self, operator: &str) -> Vec<&str> {
        self.terms
            .iter()
            .filter(|term| term.is(operator))
            .map(|term| term.operand.as_str())
            .collect()
    }

    #[must_use]
    pub fn is_search(&self) -> bool {
        self.has_operator("search")
    }

    /// Whether the predicate can be evaluated with data the client holds.
    /// Search and `has:` need message content analysis the server does.
    #[must_use]
    pub fn can_apply_locally(&self) -> bool {
        !self.is_search() && !self.has_operator("has")
    }

    /// A 1:1 private conversation (not a group).
    #[must_use]
    pub fn is_non_huddle_pm(&self) -> bool {
        self.has_operator("pm-with")
            && self
                .operands("pm-with")
                .first()
                .is_some_and(|operand| !operand.contains(','))
    }

    #[must_use]
    pub fn has_topic(&self, stream: &str, topic: &str) -> bool {
        self.has_operand("stream", stream) && self.has_operand("topic", topic)
    }

    #[must_use]
    pub fn contains_only_private_messages(&self) -> bool {
        self.operands("is").first() == Some(&"private")
            || self.has_operator("pm-with")
            || self.has_operator("group-pm-with")
    }

    /// Narrows where viewing a message is enough to mark it read.
    #[must_use]
    pub fn can_mark_messages_read(&self) -> bool {
        let term_types = self.sorted_term_types();
        let shapes: &[&[&str]] = &[
            &[],
            &["stream"],
            &["stream", "topic"],
            &["pm-with"],
            &["group-pm-with"],
            &["is-private"],
            &["is-mentioned"],
            &["in-home"],
        ];
        shapes.iter().any(|shape| term_types == *shape)
    }

    #[must_use]
    pub fn is_common_narrow(&self) -> bool {
        self.can_mark_messages_read() || self.sorted_term_types() == ["is-starred"]
    }

    /// Whether muted topics should be hidden from this narrow's visible view.
    #[must_use]
    pub fn excludes_muted_topics(&self) -> bool {
        !(self.has_operator("stream") && self.has_operator("topic"))
            && !self.is_search()
            && !self.has_operator("pm-with")
            && !self.has_operator("group-pm-with")
            && !self.has_operand("is", "starred")
    }

    /// Buckets of every term, sorted by precedence.
    #[must_use]
    pub fn sorted_term_types(&self) -> Vec<String> {
        let term_types: Vec<String> = self.terms.iter().map(term_type).collect();
        sorted_term_types(&term_types)
    }

    /// The filter's buckets are exactly `wanted`, in any order.
    #[must_use]
    pub fn is_exactly(&self, wanted: &[&str]) -> bool {
        self.sorted_term_types() == sorted_term_types(wanted)
    }

    /// The filter's highest-precedence buckets are `wanted`, in that order.
    #[must_use]
    pub fn can_bucket_by(&self, wanted: &[&str]) -> bool {
        let term_types = self.sorted_term_types();
        term_types.len() >= wanted.len() && term_types[..wanted.len()] == *wanted
    }

    /// The compiled predicate, memoized on first call.
    #[must_use]
    pub fn predicate(&self) -> Arc<MessagePredicate> {
        Arc::clone(self.predicate.get_or_init(|| {
            if self.can_apply_locally() {
                Arc::new(MessagePredicate::compile(&self.terms, &self.context))
            } else {
                Arc::new(MessagePredicate::always())
            }
        }))
    }

    #[must_use]
    pub fn matches(&self, message: &Message) -> bool {
        self.predicate().matches(message)
    }

    #[must_use]
    pub fn describe(&self) -> String {
        describe(&self.terms)
    }

    #[must_use]
    pub fn unparse(&self) -> String {
        unparse(&self.terms)
    }

    /// Narrow hash of this filter, also used as its cache key.
    #[must_use]
    pub fn to_hash(&self) -> String {
        terms_to_hash(&self.terms)
    }

    /// Copy of this filter where the first term with `term.operator` is
    /// replaced by `term`.
    #[must_use]
    pub fn filter_with_new_params(&self, term: Term) -> Self {
        let term = canonicalize_term(&term, &self.context);
        let mut terms = self.terms.clone();
        if let Some(existing) = terms.iter_mut().find(|t| t.operator == term.operator) {
            *existing = term;
        }
        Self::new(terms, self.context.clone())
    }

    #[must_use]
    pub fn filter_with_new_topic(&self, topic: &str) -> Self {
        self.filter_with_new_params(Term::new("topic", topic))
    }

    /// Copy of this filter with a user's emails rewritten after an email
    /// change.
    #[must_use]
    pub fn update_email(&self, user_id: UserId, new_email: &str) -> Self {
        let people = self.context.people();
        let terms = self
            .terms
            .iter()
            .map(|term| match term.operator.as_str() {
                "sender" | "pm-with" | "group-pm-with" => {
                    let operand = term
                        .operand
                        .split(',')
                        .map(|email| {
                            if people.user_id_by_email(email.trim()) == Some(user_id) {
                                new_email.to_lowercase()
                            } else {
                                email.to_string()
                            }
                        })
                        .collect::<Vec<_>>()
                        .join(",");
                    Term {
                        operand,
                        ..term.clone()
                    }
                }
                _ => term.clone(),
            })
            .collect();
        Self {
            terms,
            context: self.context.clone(),
            predicate: OnceLock::new(),
        }
    }
}
