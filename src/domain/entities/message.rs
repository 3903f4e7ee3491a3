use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{StreamId, UserId};
use crate::domain::errors::NarrowError;
use crate::domain::serde_utils;

/// Identifier of a message in a list.
///
/// Server-confirmed messages carry integer ids. Locally echoed messages
/// carry a fractional placeholder (e.g. `10.01`) until the server assigns
/// the final id.
#[derive(Debug, Clone, Copy)]
pub struct MessageId(f64);

impl MessageId {
    /// Wraps a raw id. Returns `None` for NaN or infinite values.
    #[must_use]
    pub fn new(value: f64) -> Option<Self> {
        // Adding zero folds -0.0 into 0.0 so hashing stays consistent.
        value.is_finite().then_some(Self(value + 0.0))
    }

    /// Returns the underlying value.
    #[must_use]
    pub const fn as_f64(self) -> f64 {
        self.0
    }

    /// Returns true for a locally echoed (fractional) id.
    #[must_use]
    pub fn is_local_only(self) -> bool {
        self.0.fract() != 0.0
    }

    /// Fractional part of the id, zero for server ids.
    #[must_use]
    pub fn fraction(self) -> f64 {
        self.0.fract()
    }

    /// Absolute numeric distance between two ids.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self.0 - other.0).abs()
    }
}

impl PartialEq for MessageId {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for MessageId {}

impl Hash for MessageId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl PartialOrd for MessageId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MessageId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for MessageId {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: u64) -> Self {
        Self(value as f64)
    }
}

impl std::str::FromStr for MessageId {
    type Err = NarrowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<f64>()
            .ok()
            .and_then(Self::new)
            .ok_or_else(|| NarrowError::invalid_message_id(s))
    }
}

impl Serialize for MessageId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serde_utils::number_or_string::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for MessageId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_utils::number_or_string::deserialize(deserializer)?;
        Self::new(value).ok_or_else(|| serde::de::Error::custom("message id must be finite"))
    }
}

/// Whether a message went to a stream or was sent privately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Stream,
    Private,
}

bitflags::bitflags! {
    /// Per-user flags attached to a message.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MessageFlags: u32 {
        const READ = 1 << 0;
        const STARRED = 1 << 1;
        const MENTIONED = 1 << 2;
        const WILDCARD_MENTIONED = 1 << 3;
        const HAS_ALERT_WORD = 1 << 4;
        const HISTORICAL = 1 << 5;
    }
}

const FLAG_NAMES: &[(&str, MessageFlags)] = &[
    ("read", MessageFlags::READ),
    ("starred", MessageFlags::STARRED),
    ("mentioned", MessageFlags::MENTIONED),
    ("wildcard_mentioned", MessageFlags::WILDCARD_MENTIONED),
    ("has_alert_word", MessageFlags::HAS_ALERT_WORD),
    ("historical", MessageFlags::HISTORICAL),
];

impl MessageFlags {
    /// Looks up a flag by its wire name.
    #[must_use]
    pub fn from_flag_name(name: &str) -> Option<Self> {
        FLAG_NAMES
            .iter()
            .find(|(flag_name, _)| *flag_name == name)
            .map(|(_, flag)| *flag)
    }

    /// Wire names of the flags that are set, in a stable order.
    #[must_use]
    pub fn names(self) -> Vec<&'static str> {
        FLAG_NAMES
            .iter()
            .filter(|(_, flag)| self.contains(*flag))
            .map(|(name, _)| *name)
            .collect()
    }
}

fn unix_epoch() -> DateTime<Utc> {
    DateTime::UNIX_EPOCH
}

/// A raw message record as produced by the fetch and local echo collaborators.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[allow(missing_docs)]
pub struct Message {
    id: MessageId,
    #[serde(rename = "type", default)]
    kind: MessageKind,
    sender_id: UserId,
    #[serde(default)]
    sender_email: String,
    #[serde(default)]
    stream_id: Option<StreamId>,
    #[serde(default)]
    stream: Option<String>,
    #[serde(default, alias = "subject")]
    topic: String,
    #[serde(default)]
    recipient_ids: Vec<UserId>,
    #[serde(default, with = "serde_utils::flag_names")]
    flags: MessageFlags,
    #[serde(default = "unix_epoch", with = "chrono::serde::ts_seconds")]
    timestamp: DateTime<Utc>,
    #[serde(default)]
    content: String,
}

#[allow(missing_docs)]
impl Message {
    /// Creates a stream message.
    #[must_use]
    pub fn stream(
        id: impl Into<MessageId>,
        sender_id: impl Into<UserId>,
        stream_id: impl Into<StreamId>,
        stream: impl Into<String>,
        topic: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: MessageKind::Stream,
            sender_id: sender_id.into(),
            sender_email: String::new(),
            stream_id: Some(stream_id.into()),
            stream: Some(stream.into()),
            topic: topic.into(),
            recipient_ids: Vec::new(),
            flags: MessageFlags::empty(),
            timestamp: unix_epoch(),
            content: String::new(),
        }
    }

    /// Creates a private message. `recipient_ids` lists every participant,
    /// sender and current user included.
    #[must_use]
    pub fn private(
        id: impl Into<MessageId>,
        sender_id: impl Into<UserId>,
        recipient_ids: Vec<UserId>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: MessageKind::Private,
            sender_id: sender_id.into(),
            sender_email: String::new(),
            stream_id: None,
            stream: None,
            topic: String::new(),
            recipient_ids,
            flags: MessageFlags::empty(),
            timestamp: unix_epoch(),
            content: String::new(),
        }
    }

    #[must_use]
    pub const fn with_flags(mut self, flags: MessageFlags) -> Self {
        self.flags = flags;
        self
    }

    #[must_use]
    pub fn with_sender_email(mut self, email: impl Into<String>) -> Self {
        self.sender_email = email.into();
        self
    }

    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    #[must_use]
    pub const fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    #[must_use]
    pub const fn id(&self) -> MessageId {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: MessageId) {
        self.id = id;
    }

    #[must_use]
    pub const fn kind(&self) -> MessageKind {
        self.kind
    }

    #[must_use]
    pub const fn sender_id(&self) -> UserId {
        self.sender_id
    }

    #[must_use]
    pub fn sender_email(&self) -> &str {
        &self.sender_email
    }

    #[must_use]
    pub const fn stream_id(&self) -> Option<StreamId> {
        self.stream_id
    }

    #[must_use]
    pub fn stream_name(&self) -> Option<&str> {
        self.stream.as_deref()
    }

    pub(crate) fn set_stream_name(&mut self, name: impl Into<String>) {
        self.stream = Some(name.into());
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    #[must_use]
    pub fn recipient_ids(&self) -> &[UserId] {
        &self.recipient_ids
    }

    #[must_use]
    pub const fn flags(&self) -> MessageFlags {
        self.flags
    }

    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub fn is_private(&self) -> bool {
        self.kind == MessageKind::Private
    }

    #[must_use]
    pub fn is_stream(&self) -> bool {
        self.kind == MessageKind::Stream
    }

    #[must_use]
    pub const fn is_starred(&self) -> bool {
        self.flags.contains(MessageFlags::STARRED)
    }

    #[must_use]
    pub const fn is_mentioned(&self) -> bool {
        self.flags
            .intersects(MessageFlags::MENTIONED.union(MessageFlags::WILDCARD_MENTIONED))
    }

    #[must_use]
    pub const fn is_alerted(&self) -> bool {
        self.flags.contains(MessageFlags::HAS_ALERT_WORD)
    }

    #[must_use]
    pub const fn is_unread(&self) -> bool {
        !self.flags.contains(MessageFlags::READ)
    }

    /// Sets or clears the read flag. Returns true if the flag changed.
    pub fn set_read(&mut self, read: bool) -> bool {
        let was_read = self.flags.contains(MessageFlags::READ);
        self.flags.set(MessageFlags::READ, read);
        was_read != read
    }

    #[must_use]
    pub fn formatted_timestamp(&self) -> String {
        self.timestamp.format("%Y-%m-%d %H:%M").to_string()
    }
}
