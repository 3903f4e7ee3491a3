//! Tokenizer for the `operator:operand` search language.

use std::sync::LazyLock;

use regex::Regex;

use super::describe::operator_to_prefix;
use super::filter::canonicalize_operator;
use super::hash::percent_decode_lossy;
use crate::domain::entities::Term;

/// One token: an optional `operator:` (with an optional space after the
/// colon) followed by a quoted span or a run of non-space characters.
static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([^\s:]+: ?)?("[^"]+"?|\S+)"#).expect("Invalid regex"));

/// Operators whose operands are email lists, where `+` is a legal character.
fn keeps_plus(operator: &str) -> bool {
    matches!(
        canonicalize_operator(operator).as_str(),
        "sender" | "pm-with" | "group-pm-with"
    )
}

/// Reverses [`encode_operand`].
#[must_use]
pub fn decode_operand(encoded: &str, operator: &str) -> String {
    let mut text = encoded.replace('"', "");
    if !keeps_plus(operator) {
        text = text.replace('+', " ");
    }
    percent_decode_lossy(&text).trim().to_string()
}

/// Escapes an operand so it survives [`parse`] as a single token.
#[must_use]
pub fn encode_operand(operand: &str) -> String {
    operand
        .replace('%', "%25")
        .replace('+', "%2B")
        .replace(' ', "+")
        .replace('"', "%22")
}

/// Parses a search string into terms.
///
/// Never fails: anything that does not look like a known operator ends up
/// in a single `search` term, which is always the last element.
#[must_use]
pub fn parse(text: &str) -> Vec<Term> {
    let mut terms = Vec::new();
    let mut search_words: Vec<String> = Vec::new();

    for token in TOKEN_RE.find_iter(text).map(|m| m.as_str()) {
        let split = if token.starts_with('"') {
            None
        } else {
            token.split_once(':')
        };
        let Some((raw_operator, raw_operand)) = split else {
            search_words.push(token.to_string());
            continue;
        };

        let (negated, operator) = match raw_operator.strip_prefix('-') {
            Some(stripped) => (true, stripped),
            None => (false, raw_operator),
        };

        // `foo:bar` prose is only an operator if `foo` is one we know.
        if operator_to_prefix(operator, negated).is_empty() {
            search_words.push(token.to_string());
            continue;
        }

        let operand = decode_operand(raw_operand, operator);
        if canonicalize_operator(operator) == "search" {
            // Keeps the single trailing search term invariant.
            if !operand.is_empty() {
                search_words.push(operand);
            }
            continue;
        }

        terms.push(Term {
            negated,
            operator: operator.to_string(),
            operand,
        });
    }

    if !search_words.is_empty() {
        terms.push(Term::new("search", search_words.join(" ")));
    }
    terms
}

/// Serializes terms back into a search string.
#[must_use]
pub fn unparse(terms: &[Term]) -> String {
    terms
        .iter()
        .map(|term| {
            if term.operator == "search" || term.operator.is_empty() {
                return term.operand.clone();
            }
            let sign = if term.negated { "-" } else { "" };
            format!("{sign}{}:{}", term.operator, encode_operand(&term.operand))
        })
        .collect::<Vec<_>>()
        .join(" ")
}
