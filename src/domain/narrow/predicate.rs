//! Compiles filter terms into a predicate over message records.

use regex::Regex;

use super::context::NarrowContext;
use crate::domain::entities::{Message, Term, UserId};
use crate::domain::ports::PeopleDirectory;

#[derive(Debug)]
enum TermMatcher {
    Always,
    IsPrivate,
    IsStarred,
    IsMentioned,
    IsAlerted,
    IsUnread,
    InHome,
    Id(String),
    Stream(String),
    ZephyrStream(Regex),
    Topic(String),
    ZephyrTopic(Regex),
    Sender(String),
    PmWith(String),
    GroupPmWith(String),
}

#[derive(Debug)]
struct CompiledTerm {
    negated: bool,
    matcher: TermMatcher,
}

/// A boolean function over messages, compiled once per filter.
#[derive(Debug)]
pub struct MessagePredicate {
    context: Option<NarrowContext>,
    terms: Vec<CompiledTerm>,
}

fn zephyr_stream_regex(operand: &str) -> Option<Regex> {
    let base = Regex::new(r"(?i)^(?:un)*(.+?)(?:\.d)*$")
        .ok()?
        .captures(operand)
        .and_then(|captures| captures.get(1))
        .map_or(operand, |base| base.as_str());
    Regex::new(&format!(r"(?i)^(un)*{}(\.d)*$", regex::escape(base))).ok()
}

fn zephyr_topic_regex(operand: &str) -> Option<Regex> {
    let base = Regex::new(r"(?i)^(.*?)(?:\.d)*$")
        .ok()?
        .captures(operand)
        .and_then(|captures| captures.get(1))
        .map_or(operand, |base| base.as_str());
    if base.is_empty() || base == "personal" || base == r#"(instance "")"# {
        Regex::new(r#"(?i)^(|personal|\(instance ""\))(\.d)*$"#).ok()
    } else {
        Regex::new(&format!(r"(?i)^{}(\.d)*$", regex::escape(base))).ok()
    }
}

impl TermMatcher {
    fn compile(operator: &str, operand: &str, context: &NarrowContext) -> Self {
        let zephyr = context.settings().zephyr_mirror;
        match operator {
            "is" => match operand {
                "private" => Self::IsPrivate,
                "starred" => Self::IsStarred,
                "mentioned" => Self::IsMentioned,
                "alerted" => Self::IsAlerted,
                "unread" => Self::IsUnread,
                _ => Self::Always,
            },
            "in" if operand == "home" => Self::InHome,
            "id" => Self::Id(operand.to_string()),
            "stream" => {
                let operand = operand.to_lowercase();
                match zephyr.then(|| zephyr_stream_regex(&operand)).flatten() {
                    Some(regex) => Self::ZephyrStream(regex),
                    None => Self::Stream(operand),
                }
            }
            "topic" => {
                let operand = operand.to_lowercase();
                match zephyr.then(|| zephyr_topic_regex(&operand)).flatten() {
                    Some(regex) => Self::ZephyrTopic(regex),
                    None => Self::Topic(operand),
                }
            }
            "sender" => Self::Sender(operand.to_string()),
            "pm-with" => Self::PmWith(operand.to_string()),
            "group-pm-with" => Self::GroupPmWith(operand.to_string()),
            // `in:all`, `near`, and operators this client does not know are
            // handled elsewhere (or by the server), so they never exclude.
            _ => Self::Always,
        }
    }

    fn matches(&self, message: &Message, context: &NarrowContext) -> bool {
        match self {
            Self::Always => true,
            Self::IsPrivate => message.is_private(),
            Self::IsStarred => message.is_starred(),
            Self::IsMentioned => message.is_mentioned(),
            Self::IsAlerted => message.is_alerted(),
            Self::IsUnread => message.is_unread(),
            Self::InHome => message_in_home(message, context),
            Self::Id(operand) => message.id().to_string() == *operand,
            Self::Stream(operand) => {
                if !message.is_stream() {
                    return false;
                }
                match context.streams().stream_id(operand) {
                    Some(stream_id) => message.stream_id() == Some(stream_id),
                    // Messages from streams the directory does not know.
                    None => message
                        .stream_name()
                        .is_some_and(|name| name.to_lowercase() == *operand),
                }
            }
            Self::ZephyrStream(regex) => {
                message.is_stream() && message.stream_name().is_some_and(|name| regex.is_match(name))
            }
            Self::Topic(operand) => message.is_stream() && message.topic().to_lowercase() == *operand,
            Self::ZephyrTopic(regex) => message.is_stream() && regex.is_match(message.topic()),
            Self::Sender(operand) => context
                .people()
                .user_id_by_email(operand)
                .is_some_and(|user_id| user_id == message.sender_id()),
            Self::PmWith(operand) => {
                if !message.is_private() {
                    return false;
                }
                let people = context.people();
                match (
                    pm_with_operand_ids(operand, people),
                    pm_with_user_ids(message, people),
                ) {
                    (Some(operand_ids), Some(user_ids)) => operand_ids == user_ids,
                    _ => false,
                }
            }
            Self::GroupPmWith(operand) => {
                let people = context.people();
                let Some(first) = pm_with_operand_ids(operand, people)
                    .and_then(|ids| ids.first().copied())
                else {
                    return false;
                };
                group_pm_with_user_ids(message, people).is_some_and(|ids| ids.contains(&first))
            }
        }
    }
}

fn message_in_home(message: &Message, context: &NarrowContext) -> bool {
    if message.is_private() || message.is_mentioned() {
        return true;
    }
    let in_narrow_stream = context
        .settings()
        .narrow_stream
        .as_deref()
        .zip(message.stream_name())
        .is_some_and(|(narrow_stream, name)| narrow_stream.to_lowercase() == name.to_lowercase());
    in_narrow_stream
        || message
            .stream_id()
            .is_none_or(|stream_id| !context.mutes().is_stream_muted(stream_id))
}

/// Resolves a comma-separated email list to sorted user ids. The current
/// user is dropped from lists naming more than one person. Returns `None`
/// if any email is unknown.
#[must_use]
pub fn pm_with_operand_ids(operand: &str, people: &dyn PeopleDirectory) -> Option<Vec<UserId>> {
    let emails: Vec<&str> = operand.split(',').map(str::trim).collect();
    let many = emails.len() > 1;
    let mut user_ids = Vec::with_capacity(emails.len());
    for email in emails {
        let user_id = people.user_id_by_email(email)?;
        if many && people.is_my_user_id(user_id) {
            continue;
        }
        user_ids.push(user_id);
    }
    user_ids.sort_unstable();
    Some(user_ids)
}

/// Sorted ids of the other participants of a private message, or just the
/// current user for a message to oneself.
#[must_use]
pub fn pm_with_user_ids(message: &Message, people: &dyn PeopleDirectory) -> Option<Vec<UserId>> {
    if !message.is_private() || message.recipient_ids().is_empty() {
        return None;
    }
    let mut other_ids: Vec<UserId> = message
        .recipient_ids()
        .iter()
        .copied()
        .filter(|user_id| !people.is_my_user_id(*user_id))
        .collect();
    if other_ids.is_empty() {
        return Some(vec![people.my_user_id()]);
    }
    other_ids.sort_unstable();
    other_ids.dedup();
    Some(other_ids)
}

/// Sorted ids of every participant of a private message the current user
/// is part of.
#[must_use]
pub fn group_pm_with_user_ids(
    message: &Message,
    people: &dyn PeopleDirectory,
) -> Option<Vec<UserId>> {
    if !message.is_private() {
        return None;
    }
    let recipients = message.recipient_ids();
    if !recipients.iter().any(|user_id| people.is_my_user_id(*user_id)) {
        return None;
    }
    let mut user_ids = recipients.to_vec();
    user_ids.sort_unstable();
    Some(user_ids)
}

impl MessagePredicate {
    /// A predicate that accepts every message. Used for narrows the server
    /// has to evaluate.
    #[must_use]
    pub const fn always() -> Self {
        Self {
            context: None,
            terms: Vec::new(),
        }
    }

    /// Compiles canonicalized terms. Regexes and operand normalization are
    /// done once here; oracle lookups happen per message.
    #[must_use]
    pub fn compile(terms: &[Term], context: &NarrowContext) -> Self {
        let terms = terms
            .iter()
            .map(|term| CompiledTerm {
                negated: term.negated,
                matcher: TermMatcher::compile(&term.operator, &term.operand, context),
            })
            .collect();
        Self {
            context: Some(context.clone()),
            terms,
        }
    }

    #[must_use]
    pub const fn is_always_true(&self) -> bool {
        self.context.is_none()
    }

    #[must_use]
    pub fn matches(&self, message: &Message) -> bool {
        let Some(context) = &self.context else {
            return true;
        };
        self.terms
            .iter()
            .all(|term| term.matcher.matches(message, context) != term.negated)
    }
}

/// Evaluates a single canonical `operator:operand` clause against a message.
#[must_use]
pub fn message_matches_search_term(
    message: &Message,
    operator: &str,
    operand: &str,
    context: &NarrowContext,
) -> bool {
    TermMatcher::compile(operator, operand, context).matches(message, context)
}
