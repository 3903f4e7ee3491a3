//! Realm snapshots: a JSON dump of directories, mutes, and messages.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{InMemoryMutes, InMemoryPeople, InMemoryStreams, SnapshotMessageSource};
use crate::domain::entities::{Message, Person, Stream, UserId};
use crate::domain::errors::NarrowError;
use crate::domain::narrow::{NarrowContext, RealmSettings};
use crate::domain::ports::{PeopleDirectory, StreamDirectory};

/// A muted topic, addressed by stream name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutedTopic {
    pub stream: String,
    pub topic: String,
}

/// Serialized realm state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealmSnapshot {
    pub me: Person,
    #[serde(default)]
    pub people: Vec<Person>,
    #[serde(default)]
    pub streams: Vec<Stream>,
    #[serde(default)]
    pub muted_topics: Vec<MutedTopic>,
    #[serde(default)]
    pub muted_streams: Vec<String>,
    #[serde(default)]
    pub muted_users: Vec<UserId>,
    #[serde(default)]
    pub settings: RealmSettings,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl RealmSnapshot {
    /// Parses a snapshot from JSON text.
    ///
    /// # Errors
    ///
    /// Returns `NarrowError::Json` if the text is not a valid snapshot.
    pub fn from_json(text: &str) -> Result<Self, NarrowError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads a snapshot file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub async fn load(path: &Path) -> Result<Self, NarrowError> {
        debug!(path = %path.display(), "Reading realm snapshot");
        let text = tokio::fs::read_to_string(path).await?;
        Self::from_json(&text)
    }

    /// Builds live directories from the snapshot.
    ///
    /// # Errors
    ///
    /// Returns `NarrowError::Snapshot` if a mute names an unknown stream.
    pub fn into_realm(self) -> Result<Realm, NarrowError> {
        let streams = Arc::new(InMemoryStreams::from_streams(self.streams));

        let people = Arc::new(InMemoryPeople::new(self.me));
        for person in self.people {
            people.add_person(person);
        }

        let mutes = Arc::new(InMemoryMutes::new());
        for name in &self.muted_streams {
            let stream_id = streams
                .stream_id(name)
                .ok_or_else(|| NarrowError::snapshot(format!("muted stream {name} is unknown")))?;
            mutes.mute_stream(stream_id);
        }
        for muted in &self.muted_topics {
            let stream_id = streams.stream_id(&muted.stream).ok_or_else(|| {
                NarrowError::snapshot(format!("muted topic stream {} is unknown", muted.stream))
            })?;
            mutes.mute_topic(stream_id, &muted.topic);
        }
        for user_id in self.muted_users {
            mutes.mute_user(user_id);
        }

        let messages = self
            .messages
            .into_iter()
            .map(|message| fill_in_names(message, streams.as_ref(), people.as_ref()))
            .collect::<Vec<_>>();

        info!(
            streams = streams.len(),
            messages = messages.len(),
            "Realm snapshot loaded"
        );

        let context = NarrowContext::new(streams.clone(), people.clone(), mutes.clone())
            .with_settings(self.settings);
        Ok(Realm {
            streams,
            people,
            mutes,
            context,
            messages,
        })
    }
}

/// Snapshots may omit denormalized names; derive them from the directories.
fn fill_in_names(
    mut message: Message,
    streams: &dyn StreamDirectory,
    people: &dyn PeopleDirectory,
) -> Message {
    if message.stream_name().is_none()
        && let Some(name) = message.stream_id().and_then(|id| streams.stream_name(id))
    {
        message.set_stream_name(name);
    }
    if message.sender_email().is_empty()
        && let Some(email) = people.email_by_user_id(message.sender_id())
    {
        message = message.with_sender_email(email);
    }
    message
}

/// Live directories and history built from a snapshot.
#[derive(Debug)]
pub struct Realm {
    pub streams: Arc<InMemoryStreams>,
    pub people: Arc<InMemoryPeople>,
    pub mutes: Arc<InMemoryMutes>,
    context: NarrowContext,
    messages: Vec<Message>,
}

impl Realm {
    #[must_use]
    pub const fn context(&self) -> &NarrowContext {
        &self.context
    }

    /// Layers settings from configuration over the snapshot's own.
    pub fn apply_settings(&mut self, overrides: &RealmSettings) {
        let mut settings = self.context.settings().clone();
        settings.zephyr_mirror |= overrides.zephyr_mirror;
        if overrides.narrow_stream.is_some() {
            settings.narrow_stream.clone_from(&overrides.narrow_stream);
        }
        self.context = self.context.clone().with_settings(settings);
    }

    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// A message source serving this realm's history.
    #[must_use]
    pub fn message_source(&self) -> SnapshotMessageSource {
        SnapshotMessageSource::new(self.messages.clone(), self.context.clone())
    }
}
