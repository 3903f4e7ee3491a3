//! Collaborators and realm settings a narrow is evaluated against.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::ports::{MuteState, PeopleDirectory, StreamDirectory};

/// Realm-wide settings that change how terms match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealmSettings {
    /// Zephyr mirroring realms treat `un`-prefixed and `.d`-suffixed
    /// stream and topic names as the same conversation.
    #[serde(default)]
    pub zephyr_mirror: bool,

    /// A stream the whole client is locked to; it always counts as part
    /// of the home view.
    #[serde(default)]
    pub narrow_stream: Option<String>,
}

/// Handles to the read-only oracles a filter consults.
///
/// Passed explicitly to every filter so nothing depends on ambient state.
#[derive(Clone)]
pub struct NarrowContext {
    streams: Arc<dyn StreamDirectory>,
    people: Arc<dyn PeopleDirectory>,
    mutes: Arc<dyn MuteState>,
    settings: RealmSettings,
}

impl NarrowContext {
    #[must_use]
    pub fn new(
        streams: Arc<dyn StreamDirectory>,
        people: Arc<dyn PeopleDirectory>,
        mutes: Arc<dyn MuteState>,
    ) -> Self {
        Self {
            streams,
            people,
            mutes,
            settings: RealmSettings::default(),
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: RealmSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn streams(&self) -> &dyn StreamDirectory {
        self.streams.as_ref()
    }

    #[must_use]
    pub fn people(&self) -> &dyn PeopleDirectory {
        self.people.as_ref()
    }

    #[must_use]
    pub fn mutes(&self) -> &dyn MuteState {
        self.mutes.as_ref()
    }

    #[must_use]
    pub const fn settings(&self) -> &RealmSettings {
        &self.settings
    }
}

impl std::fmt::Debug for NarrowContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NarrowContext")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
