//! Ordered, de-duplicated message collection behind one narrow.
//!
//! Keeps two parallel id views: `all_items` holds every accepted message and
//! `items` the visible subset that survives mute filtering. Records live in
//! `id_index`, whose key set always equals the ids in `all_items`.

use std::collections::{HashMap, HashSet};

use tracing::{debug, error};

use crate::domain::entities::{Message, MessageId, StreamId};
use crate::domain::errors::NarrowError;
use crate::domain::narrow::Filter;

/// Sort key of `items[idx]` as used by [`MessageListData::lower_bound`].
///
/// A locally echoed item sorts as the closest preceding server id plus its
/// own fractional part, so `10.02` in `[11, 10.02, 12]` compares as `11.02`.
/// Items with no server id before them use their own value.
#[must_use]
pub fn effective_sort_key(items: &[MessageId], idx: usize) -> f64 {
    let id = items[idx];
    if !id.is_local_only() {
        return id.as_f64();
    }
    prev_nonlocal(items, idx).map_or(id.as_f64(), |anchor| anchor.as_f64() + id.fraction())
}

fn prev_nonlocal(items: &[MessageId], idx: usize) -> Option<MessageId> {
    items[..idx]
        .iter()
        .rev()
        .find(|id| !id.is_local_only())
        .copied()
}

fn is_out_of_order(items: &[MessageId], id: MessageId) -> bool {
    let Some(idx) = items.iter().position(|item| *item == id) else {
        return false;
    };
    let before = idx.checked_sub(1).map(|prev| items[prev]);
    let after = items.get(idx + 1).copied();
    before.is_some_and(|prev| prev > id) || after.is_some_and(|next| next < id)
}

/// How far history has been fetched in each direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchStatus {
    found_oldest: bool,
    found_newest: bool,
}

impl FetchStatus {
    #[must_use]
    pub const fn has_found_oldest(&self) -> bool {
        self.found_oldest
    }

    #[must_use]
    pub const fn has_found_newest(&self) -> bool {
        self.found_newest
    }

    /// Records the outcome of a fetch. Once an end is found it stays found.
    pub fn record(&mut self, found_oldest: bool, found_newest: bool) {
        self.found_oldest |= found_oldest;
        self.found_newest |= found_newest;
    }
}

/// Ids that became visible in each region of the list after an insert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddMessagesInfo {
    pub top_messages: Vec<MessageId>,
    pub bottom_messages: Vec<MessageId>,
    pub interior_messages: Vec<MessageId>,
}

impl AddMessagesInfo {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.top_messages.is_empty()
            && self.bottom_messages.is_empty()
            && self.interior_messages.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.top_messages.len() + self.bottom_messages.len() + self.interior_messages.len()
    }
}

#[derive(Debug, Clone)]
pub struct MessageListData {
    filter: Filter,
    excludes_muted_topics: bool,
    all_items: Vec<MessageId>,
    items: Vec<MessageId>,
    id_index: HashMap<MessageId, Message>,
    local_only_ids: HashSet<MessageId>,
    selected_id: Option<MessageId>,
    fetch_status: FetchStatus,
}

impl MessageListData {
    #[must_use]
    pub fn new(filter: Filter) -> Self {
        Self {
            excludes_muted_topics: filter.excludes_muted_topics(),
            filter,
            all_items: Vec::new(),
            items: Vec::new(),
            id_index: HashMap::new(),
            local_only_ids: HashSet::new(),
            selected_id: None,
            fetch_status: FetchStatus::default(),
        }
    }

    #[must_use]
    pub const fn with_excludes_muted_topics(mut self, excludes_muted_topics: bool) -> Self {
        self.excludes_muted_topics = excludes_muted_topics;
        self
    }

    #[must_use]
    pub const fn filter(&self) -> &Filter {
        &self.filter
    }

    #[must_use]
    pub const fn excludes_muted_topics(&self) -> bool {
        self.excludes_muted_topics
    }

    #[must_use]
    pub const fn fetch_status(&self) -> &FetchStatus {
        &self.fetch_status
    }

    pub fn fetch_status_mut(&mut self) -> &mut FetchStatus {
        &mut self.fetch_status
    }

    /// Visible messages in order.
    pub fn all_messages(&self) -> impl Iterator<Item = &Message> + '_ {
        self.items.iter().filter_map(|id| self.id_index.get(id))
    }

    /// Visible ids in order.
    #[must_use]
    pub fn items(&self) -> &[MessageId] {
        &self.items
    }

    /// Every accepted id in order, muted or not.
    #[must_use]
    pub fn all_items(&self) -> &[MessageId] {
        &self.all_items
    }

    #[must_use]
    pub fn local_only_ids(&self) -> &HashSet<MessageId> {
        &self.local_only_ids
    }

    #[must_use]
    pub fn num_items(&self) -> usize {
        self.items.len()
    }

    /// No visible messages. Muted ones may still be held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn first(&self) -> Option<&Message> {
        self.items.first().and_then(|id| self.id_index.get(id))
    }

    #[must_use]
    pub fn last(&self) -> Option<&Message> {
        self.items.last().and_then(|id| self.id_index.get(id))
    }

    #[must_use]
    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.id_index.get(&id)
    }

    #[must_use]
    pub fn contains(&self, id: MessageId) -> bool {
        self.id_index.contains_key(&id)
    }

    #[must_use]
    pub const fn selected_id(&self) -> Option<MessageId> {
        self.selected_id
    }

    pub fn set_selected_id(&mut self, id: MessageId) {
        self.selected_id = Some(id);
    }

    pub fn clear_selected_id(&mut self) {
        self.selected_id = None;
    }

    /// Selects the visible item at `idx`, returning its id.
    pub fn select_idx(&mut self, idx: usize) -> Option<MessageId> {
        let id = self.items.get(idx).copied()?;
        self.selected_id = Some(id);
        Some(id)
    }

    /// Position of the selection in the visible view, or `None` when the
    /// selected message is not visible.
    #[must_use]
    pub fn selected_idx(&self) -> Option<usize> {
        let selected = self.selected_id?;
        self.items.iter().position(|id| *id == selected)
    }

    /// Id of the visible message before the selection.
    #[must_use]
    pub fn prev(&self) -> Option<MessageId> {
        let idx = self.selected_idx()?;
        idx.checked_sub(1).map(|prev| self.items[prev])
    }

    /// Id of the visible message after the selection.
    #[must_use]
    pub fn next(&self) -> Option<MessageId> {
        let idx = self.selected_idx()?;
        self.items.get(idx + 1).copied()
    }

    /// Whether the last visible message is selected.
    #[must_use]
    pub fn is_at_end(&self) -> bool {
        self.selected_id.is_some() && self.items.last().copied() == self.selected_id
    }

    /// Id of the `n`th newest visible message; `1` is the last one.
    #[must_use]
    pub fn nth_most_recent_id(&self, n: usize) -> Option<MessageId> {
        let idx = self.items.len().checked_sub(n)?;
        self.items.get(idx).copied()
    }

    /// Moves the selection onto the closest visible id.
    pub fn reset_select_to_closest(&mut self) {
        if let Some(selected) = self.selected_id {
            self.selected_id = self.closest_id(selected);
        }
    }

    /// Advances the selection past a contiguous run of following messages
    /// whose ids are all in `ids`.
    pub fn advance_past_messages(&mut self, ids: &[MessageId]) {
        let ids: HashSet<MessageId> = ids.iter().copied().collect();
        let start = self.selected_idx().map_or(0, |idx| idx + 1);
        let last_skipped = self.items[start.min(self.items.len())..]
            .iter()
            .take_while(|id| ids.contains(id))
            .last()
            .copied();
        if let Some(id) = last_skipped {
            self.selected_id = Some(id);
        }
    }

    /// Messages in `messages` that are new to this list and match the filter.
    #[must_use]
    pub fn valid_non_duplicated_messages(&self, messages: Vec<Message>) -> Vec<Message> {
        let predicate = self.filter.predicate();
        messages
            .into_iter()
            .filter(|message| !self.contains(message.id()) && predicate.matches(message))
            .collect()
    }

    /// Messages in `messages` that match the filter.
    #[must_use]
    pub fn filter_incoming(&self, messages: Vec<Message>) -> Vec<Message> {
        let predicate = self.filter.predicate();
        messages
            .into_iter()
            .filter(|message| predicate.matches(message))
            .collect()
    }

    /// Inserts a batch, returning the ids that became visible per region.
    ///
    /// Duplicates and messages failing the filter are dropped; duplicates
    /// are reported as errors. The batch does not need to be sorted.
    pub fn add_messages(&mut self, messages: Vec<Message>) -> AddMessagesInfo {
        let mut batch: Vec<Message> = Vec::with_capacity(messages.len());
        for message in self.filter_incoming(messages) {
            if self.contains(message.id()) {
                error!(id = %message.id(), "Duplicate message added to message list");
                continue;
            }
            batch.push(message);
        }
        batch.sort_by_key(Message::id);

        let mut top = Vec::new();
        let mut bottom = Vec::new();
        let mut interior = Vec::new();
        let mut previous_id = None;
        for message in batch {
            if previous_id == Some(message.id()) {
                error!(id = %message.id(), "Duplicate message added to message list");
                continue;
            }
            previous_id = Some(message.id());
            match (self.all_items.first(), self.all_items.last()) {
                (_, Some(last)) if message.id() > *last => bottom.push(message),
                (Some(first), _) if message.id() < *first => top.push(message),
                (None, None) => bottom.push(message),
                _ => interior.push(message),
            }
        }

        let info = AddMessagesInfo {
            interior_messages: self.add_anywhere(interior),
            top_messages: self.prepend(top),
            bottom_messages: self.append(bottom),
        };
        debug!(
            narrow = %self.filter.to_hash(),
            top = info.top_messages.len(),
            bottom = info.bottom_messages.len(),
            interior = info.interior_messages.len(),
            "Added messages"
        );
        info
    }

    /// Records messages in the index and returns the visible ones' ids.
    fn index_messages(&mut self, messages: Vec<Message>) -> (Vec<MessageId>, Vec<MessageId>) {
        let mut ids = Vec::with_capacity(messages.len());
        let mut visible = Vec::new();
        for message in messages {
            let id = message.id();
            if self.is_visible(&message) {
                visible.push(id);
            }
            if id.is_local_only() {
                self.local_only_ids.insert(id);
            }
            self.id_index.insert(id, message);
            ids.push(id);
        }
        (ids, visible)
    }

    fn append(&mut self, messages: Vec<Message>) -> Vec<MessageId> {
        let (ids, visible) = self.index_messages(messages);
        self.all_items.extend(ids);
        self.items.extend(visible.iter().copied());
        visible
    }

    fn prepend(&mut self, messages: Vec<Message>) -> Vec<MessageId> {
        let (ids, visible) = self.index_messages(messages);
        self.all_items.splice(0..0, ids);
        self.items.splice(0..0, visible.iter().copied());
        visible
    }

    fn add_anywhere(&mut self, messages: Vec<Message>) -> Vec<MessageId> {
        if messages.is_empty() {
            return Vec::new();
        }
        let (ids, visible) = self.index_messages(messages);
        self.all_items.extend(ids);
        self.all_items.sort_unstable();
        self.items.extend(visible.iter().copied());
        self.items.sort_unstable();
        visible
    }

    /// Insertion point for `id` in the visible view.
    #[must_use]
    pub fn lower_bound(&self, id: MessageId) -> usize {
        let target = id.as_f64();
        let (mut low, mut high) = (0, self.items.len());
        while low < high {
            let mid = low + (high - low) / 2;
            if effective_sort_key(&self.items, mid) < target {
                low = mid + 1;
            } else {
                high = mid;
            }
        }
        low
    }

    /// Visible id nearest to `id`. Known local echoes resolve to themselves.
    #[must_use]
    pub fn closest_id(&self, id: MessageId) -> Option<MessageId> {
        if self.items.is_empty() {
            return None;
        }
        if self.local_only_ids.contains(&id) {
            return Some(id);
        }

        let mut closest = self.lower_bound(id);
        if self.items.get(closest) == Some(&id) {
            return Some(id);
        }

        // lower_bound treats a run of local echoes as sitting just after its
        // server predecessor, so every member of the run is a candidate.
        let mut candidates = Vec::new();
        while closest > 0 && self.items[closest - 1].is_local_only() {
            candidates.push(closest);
            closest -= 1;
        }
        candidates.push(closest);

        if closest == self.items.len() {
            return self.items.last().copied();
        }
        if let Some(prev) = closest.checked_sub(1) {
            candidates.insert(0, prev);
        }

        let mut best = self.items[closest];
        for idx in candidates {
            let Some(candidate) = self.items.get(idx).copied() else {
                continue;
            };
            if id.distance(candidate) < id.distance(best) {
                best = candidate;
            }
        }
        Some(best)
    }

    /// Visible messages from `start` to `end`, inclusive.
    ///
    /// # Errors
    ///
    /// Returns `NarrowError::InvalidRangeStart` when `start` is `None`.
    pub fn message_range(
        &self,
        start: Option<MessageId>,
        end: MessageId,
    ) -> Result<Vec<&Message>, NarrowError> {
        let Some(start) = start else {
            error!(narrow = %self.filter.to_hash(), "message_range given an invalid start");
            return Err(NarrowError::InvalidRangeStart);
        };
        let start_idx = self.lower_bound(start);
        let end_idx = (self.lower_bound(end) + 1).min(self.items.len());
        if start_idx >= end_idx {
            return Ok(Vec::new());
        }
        Ok(self.items[start_idx..end_idx]
            .iter()
            .filter_map(|id| self.id_index.get(id))
            .collect())
    }

    /// Replaces a message's id, typically when the server acknowledges a
    /// local echo. Returns true if the views had to be re-sorted.
    pub fn change_message_id(&mut self, old_id: MessageId, new_id: MessageId) -> bool {
        if old_id == new_id || !self.contains(old_id) {
            return false;
        }
        if self.contains(new_id) {
            error!(old = %old_id, new = %new_id, "Message id change collides with a known message");
            return false;
        }
        let Some(mut message) = self.id_index.remove(&old_id) else {
            return false;
        };
        message.set_id(new_id);
        self.id_index.insert(new_id, message);

        self.local_only_ids.remove(&old_id);
        if new_id.is_local_only() {
            self.local_only_ids.insert(new_id);
        }
        for view in [&mut self.all_items, &mut self.items] {
            if let Some(slot) = view.iter_mut().find(|id| **id == old_id) {
                *slot = new_id;
            }
        }
        if self.selected_id == Some(old_id) {
            self.selected_id = Some(new_id);
        }

        if is_out_of_order(&self.items, new_id) || is_out_of_order(&self.all_items, new_id) {
            debug!(old = %old_id, new = %new_id, "Re-sorting message list after id change");
            self.items.sort_unstable();
            self.all_items.sort_unstable();
            return true;
        }
        false
    }

    /// Drops messages by id. Unknown ids are ignored.
    pub fn remove(&mut self, ids: &[MessageId]) {
        let ids: HashSet<MessageId> = ids.iter().copied().collect();
        for id in &ids {
            self.id_index.remove(id);
            self.local_only_ids.remove(id);
        }
        self.items.retain(|id| !ids.contains(id));
        self.all_items.retain(|id| !ids.contains(id));
    }

    pub fn clear(&mut self) {
        self.all_items.clear();
        self.items.clear();
        self.id_index.clear();
        self.local_only_ids.clear();
        self.selected_id = None;
        self.fetch_status = FetchStatus::default();
    }

    /// Mute visibility of one message under this list's filter.
    fn is_visible(&self, message: &Message) -> bool {
        self.passes_topic_mutes(message) && self.passes_user_mutes(message)
    }

    fn passes_topic_mutes(&self, message: &Message) -> bool {
        if !self.excludes_muted_topics || message.is_mentioned() {
            return true;
        }
        let Some(stream_id) = message.stream_id().filter(|_| message.is_stream()) else {
            return true;
        };
        let mutes = self.filter.context().mutes();
        if mutes.is_topic_muted(stream_id, message.topic()) {
            return false;
        }
        !self.filter.operands("stream").is_empty() || !mutes.is_stream_muted(stream_id)
    }

    fn passes_user_mutes(&self, message: &Message) -> bool {
        if !message.is_private() || self.filter.is_non_huddle_pm() {
            return true;
        }
        let context = self.filter.context();
        let people = context.people();
        let others: Vec<_> = message
            .recipient_ids()
            .iter()
            .copied()
            .filter(|user_id| !people.is_my_user_id(*user_id))
            .collect();
        if others.len() > 1 {
            return true;
        }
        let recipient = others.first().copied().unwrap_or_else(|| people.my_user_id());
        let mutes = context.mutes();
        !mutes.is_user_muted(recipient) && !mutes.is_user_muted(message.sender_id())
    }

    /// Recomputes the visible view after mute settings change.
    pub fn update_items_for_muting(&mut self) {
        let items = self
            .all_items
            .iter()
            .copied()
            .filter(|id| self.id_index.get(id).is_some_and(|message| self.is_visible(message)))
            .collect();
        self.items = items;
    }

    /// First unread visible message, or the last visible one if all are read.
    #[must_use]
    pub fn first_unread_message_id(&self) -> Option<MessageId> {
        self.all_messages()
            .find(|message| message.is_unread())
            .or_else(|| self.last())
            .map(Message::id)
    }

    #[must_use]
    pub fn has_unread_messages(&self) -> bool {
        self.all_messages().any(Message::is_unread)
    }

    #[must_use]
    pub fn get_last_message_sent_by_me(&self) -> Option<&Message> {
        let me = self.filter.context().people().my_user_id();
        self.items
            .iter()
            .rev()
            .filter_map(|id| self.id_index.get(id))
            .find(|message| message.sender_id() == me)
    }

    /// Marks messages read. Returns how many actually changed.
    pub fn mark_read(&mut self, ids: &[MessageId]) -> usize {
        let mut changed = 0;
        for id in ids {
            if let Some(message) = self.id_index.get_mut(id)
                && message.set_read(true)
            {
                changed += 1;
            }
        }
        changed
    }

    /// Rewrites the stream name on held messages after a rename.
    pub fn update_stream_name(&mut self, stream_id: StreamId, new_name: &str) -> usize {
        let mut updated = 0;
        for message in self.id_index.values_mut() {
            if message.stream_id() == Some(stream_id) {
                message.set_stream_name(new_name);
                updated += 1;
            }
        }
        updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{MessageFlags, Term};
    use crate::domain::narrow::NarrowContext;
    use crate::domain::ports::mocks::MockMuteState;
    use crate::test_support::{self, ALICE, BOB, CORDELIA, DENMARK, ME, VERONA};
    use std::sync::Arc;
    use test_case::test_case;

    fn id(value: f64) -> MessageId {
        MessageId::new(value).unwrap()
    }

    fn ids(values: &[f64]) -> Vec<MessageId> {
        values.iter().copied().map(id).collect()
    }

    fn verona(message_id: f64) -> Message {
        Message::stream(id(message_id), ALICE, VERONA, "Verona", "lunch")
    }

    fn list(context: NarrowContext) -> MessageListData {
        MessageListData::new(Filter::new(Vec::new(), context))
    }

    fn list_with(values: &[f64]) -> MessageListData {
        let (context, _) = test_support::realm();
        let mut mld = list(context);
        mld.add_messages(values.iter().copied().map(verona).collect());
        mld
    }

    #[test]
    fn test_add_messages_classifies_regions() {
        let mut mld = list_with(&[10.0, 20.0]);

        let info = mld.add_messages(vec![verona(30.0), verona(5.0), verona(15.0), verona(18.0)]);
        assert_eq!(info.top_messages, ids(&[5.0]));
        assert_eq!(info.bottom_messages, ids(&[30.0]));
        assert_eq!(info.interior_messages, ids(&[15.0, 18.0]));
        assert_eq!(mld.items(), ids(&[5.0, 10.0, 15.0, 18.0, 20.0, 30.0]));

        let info = mld.add_messages(vec![verona(25.0), verona(40.0)]);
        assert_eq!(info.bottom_messages, ids(&[40.0]));
        assert_eq!(info.interior_messages, ids(&[25.0]));
        assert_eq!(mld.items(), mld.all_items());
    }

    #[test]
    fn test_initial_batch_goes_to_bottom() {
        let (context, _) = test_support::realm();
        let mut mld = list(context);
        let info = mld.add_messages(vec![verona(3.0), verona(1.0), verona(2.0)]);

        assert_eq!(info.bottom_messages, ids(&[1.0, 2.0, 3.0]));
        assert!(info.top_messages.is_empty());
        assert_eq!(mld.first().map(Message::id), Some(id(1.0)));
        assert_eq!(mld.last().map(Message::id), Some(id(3.0)));
    }

    #[test]
    fn test_duplicates_are_skipped() {
        let mut mld = list_with(&[1.0, 2.0]);
        let info = mld.add_messages(vec![verona(2.0), verona(3.0), verona(3.0)]);

        assert_eq!(info.bottom_messages, ids(&[3.0]));
        assert_eq!(mld.all_items(), ids(&[1.0, 2.0, 3.0]));
        assert_eq!(mld.num_items(), 3);
    }

    #[test]
    fn test_messages_failing_filter_are_dropped() {
        let (context, _) = test_support::realm();
        let mut mld = MessageListData::new(Filter::new(vec![Term::new("stream", "Verona")], context));
        let denmark = Message::stream(id(2.0), ALICE, DENMARK, "Denmark", "x");

        let info = mld.add_messages(vec![verona(1.0), denmark.clone()]);
        assert_eq!(info.len(), 1);
        assert!(!mld.contains(id(2.0)));
        assert!(mld.valid_non_duplicated_messages(vec![denmark, verona(1.0)]).is_empty());
    }

    #[test]
    fn test_local_echo_lower_bound() {
        let mut mld = list_with(&[10.0]);
        mld.add_messages(vec![verona(10.01)]);
        mld.add_messages(vec![verona(11.0)]);

        assert_eq!(mld.items(), ids(&[10.0, 10.01, 11.0]));
        assert!(mld.local_only_ids().contains(&id(10.01)));
        assert_eq!(mld.lower_bound(id(10.5)), 2);
        assert_eq!(mld.lower_bound(id(10.0)), 0);
        assert_eq!(mld.lower_bound(id(12.0)), 3);
    }

    #[test]
    fn test_effective_sort_key() {
        let items = ids(&[11.0, 10.02, 12.0]);
        assert!((effective_sort_key(&items, 1) - 11.02).abs() < 1e-9);
        assert!((effective_sort_key(&items, 2) - 12.0).abs() < f64::EPSILON);

        let leading = ids(&[9.5, 10.0]);
        assert!((effective_sort_key(&leading, 0) - 9.5).abs() < f64::EPSILON);
    }

    #[test_case(13.0, Some(12.0) ; "nearer_lower_neighbor")]
    #[test_case(12.0, Some(12.0) ; "exact")]
    #[test_case(14.0, Some(15.0) ; "nearer_upper_neighbor")]
    #[test_case(100.0, Some(15.0) ; "past_end")]
    #[test_case(1.0, Some(10.0) ; "before_start")]
    fn test_closest_id(query: f64, expected: Option<f64>) {
        let mld = list_with(&[10.0, 12.0, 15.0]);
        assert_eq!(mld.closest_id(id(query)), expected.map(id));
    }

    #[test]
    fn test_closest_id_with_local_echoes() {
        let mld = list_with(&[10.0, 10.01, 10.02, 20.0]);
        assert_eq!(mld.closest_id(id(10.02)), Some(id(10.02)));
        assert_eq!(mld.closest_id(id(11.0)), Some(id(10.02)));
        assert_eq!(mld.closest_id(id(19.0)), Some(id(20.0)));
        assert_eq!(list_with(&[]).closest_id(id(5.0)), None);
    }

    #[test]
    fn test_message_range() {
        let mld = list_with(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let range: Vec<MessageId> = mld
            .message_range(Some(id(2.0)), id(4.0))
            .unwrap()
            .into_iter()
            .map(Message::id)
            .collect();
        assert_eq!(range, ids(&[2.0, 3.0, 4.0]));

        assert!(matches!(
            mld.message_range(None, id(4.0)),
            Err(NarrowError::InvalidRangeStart)
        ));
        assert!(mld.message_range(Some(id(9.0)), id(10.0)).unwrap().is_empty());
    }

    #[test]
    fn test_change_message_id_in_order() {
        let mut mld = list_with(&[10.0, 10.01, 12.0]);
        mld.set_selected_id(id(10.01));

        assert!(!mld.change_message_id(id(10.01), id(11.0)));
        assert_eq!(mld.items(), ids(&[10.0, 11.0, 12.0]));
        assert_eq!(mld.get(id(11.0)).map(Message::id), Some(id(11.0)));
        assert!(mld.get(id(10.01)).is_none());
        assert!(mld.local_only_ids().is_empty());
        assert_eq!(mld.selected_id(), Some(id(11.0)));
    }

    #[test]
    fn test_change_message_id_reorders() {
        let mut mld = list_with(&[10.0, 10.01, 11.0, 12.0]);

        assert!(mld.change_message_id(id(10.01), id(13.0)));
        assert_eq!(mld.items(), ids(&[10.0, 11.0, 12.0, 13.0]));
        assert_eq!(mld.all_items(), ids(&[10.0, 11.0, 12.0, 13.0]));
    }

    #[test]
    fn test_change_message_id_rejects_unknown_and_collisions() {
        let mut mld = list_with(&[10.0, 11.0]);
        assert!(!mld.change_message_id(id(9.0), id(12.0)));
        assert!(!mld.change_message_id(id(10.0), id(11.0)));
        assert_eq!(mld.all_items(), ids(&[10.0, 11.0]));
    }

    #[test]
    fn test_remove() {
        let mut mld = list_with(&[1.0, 1.01, 2.0, 3.0]);
        mld.remove(&ids(&[1.01, 3.0, 99.0]));

        assert_eq!(mld.items(), ids(&[1.0, 2.0]));
        assert_eq!(mld.all_items(), ids(&[1.0, 2.0]));
        assert!(!mld.contains(id(3.0)));
        assert!(mld.local_only_ids().is_empty());
    }

    #[test]
    fn test_selection_navigation() {
        let mut mld = list_with(&[1.0, 2.0, 3.0]);
        assert_eq!(mld.next(), None);
        assert!(!mld.is_at_end());

        mld.set_selected_id(id(2.0));
        assert_eq!(mld.selected_idx(), Some(1));
        assert_eq!(mld.prev(), Some(id(1.0)));
        assert_eq!(mld.next(), Some(id(3.0)));

        assert_eq!(mld.select_idx(2), Some(id(3.0)));
        assert!(mld.is_at_end());
        assert_eq!(mld.select_idx(5), None);

        assert_eq!(mld.nth_most_recent_id(1), Some(id(3.0)));
        assert_eq!(mld.nth_most_recent_id(3), Some(id(1.0)));
        assert_eq!(mld.nth_most_recent_id(4), None);
        assert_eq!(mld.nth_most_recent_id(0), None);
    }

    #[test]
    fn test_selection_of_local_echo_uses_its_position() {
        let mut mld = list_with(&[5.0, 10.01]);
        mld.set_selected_id(id(10.01));

        assert_eq!(mld.selected_idx(), Some(1));
        assert_eq!(mld.prev(), Some(id(5.0)));
        assert_eq!(mld.next(), None);
        assert!(mld.is_at_end());
    }

    #[test]
    fn test_removed_selection_has_no_neighbours() {
        let mut mld = list_with(&[1.0, 2.0, 3.0, 4.0]);
        mld.set_selected_id(id(2.0));
        mld.remove(&ids(&[2.0]));

        assert_eq!(mld.selected_idx(), None);
        assert_eq!(mld.prev(), None);
        assert_eq!(mld.next(), None);

        mld.reset_select_to_closest();
        assert_eq!(mld.selected_id(), Some(id(3.0)));
        assert_eq!(mld.next(), Some(id(4.0)));
    }

    #[test]
    fn test_reset_select_to_closest() {
        let mut mld = list_with(&[10.0, 12.0, 15.0]);
        mld.set_selected_id(id(14.0));
        mld.reset_select_to_closest();
        assert_eq!(mld.selected_id(), Some(id(15.0)));

        mld.clear_selected_id();
        mld.reset_select_to_closest();
        assert_eq!(mld.selected_id(), None);
    }

    #[test]
    fn test_advance_past_messages() {
        let mut mld = list_with(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        mld.set_selected_id(id(1.0));

        mld.advance_past_messages(&ids(&[2.0, 3.0, 5.0]));
        assert_eq!(mld.selected_id(), Some(id(3.0)));

        mld.advance_past_messages(&ids(&[5.0]));
        assert_eq!(mld.selected_id(), Some(id(3.0)));
    }

    #[test]
    fn test_topic_mutes_hide_unmentioned_messages() {
        let (context, mutes) = test_support::realm();
        mutes.mute_topic(VERONA, "lunch");
        let mut mld = list(context);
        let mentioned = verona(2.0).with_flags(MessageFlags::MENTIONED);

        let info = mld.add_messages(vec![verona(1.0), mentioned, verona(3.0)]);
        assert_eq!(info.bottom_messages, ids(&[2.0]));
        assert_eq!(mld.items(), ids(&[2.0]));
        assert_eq!(mld.all_items(), ids(&[1.0, 2.0, 3.0]));

        mutes.unmute_topic(VERONA, "lunch");
        mld.update_items_for_muting();
        assert_eq!(mld.items(), ids(&[1.0, 2.0, 3.0]));
    }

    #[test]
    fn test_topic_mutes_ignored_when_not_excluding() {
        let (context, mutes) = test_support::realm();
        mutes.mute_topic(VERONA, "lunch");
        let mut mld = list(context).with_excludes_muted_topics(false);
        mld.add_messages(vec![verona(1.0)]);
        assert_eq!(mld.items(), ids(&[1.0]));
    }

    #[test]
    fn test_stream_mutes_apply_outside_stream_narrows() {
        let (context, mutes) = test_support::realm();
        mutes.mute_stream(DENMARK);
        let denmark = Message::stream(id(1.0), ALICE, DENMARK, "Denmark", "x");

        let mut home = list(context.clone());
        home.add_messages(vec![denmark.clone()]);
        assert!(home.is_empty());

        let mut stream =
            MessageListData::new(Filter::new(vec![Term::new("stream", "Denmark")], context.clone()));
        stream.add_messages(vec![denmark.clone()]);
        assert_eq!(stream.items(), ids(&[1.0]));

        let mut not_verona =
            MessageListData::new(Filter::new(vec![Term::negated("stream", "Verona")], context));
        not_verona.add_messages(vec![denmark]);
        assert!(not_verona.is_empty());
        assert_eq!(not_verona.all_items(), ids(&[1.0]));
    }

    #[test]
    fn test_user_mutes_apply_to_one_on_one_messages() {
        let (context, mutes) = test_support::realm();
        mutes.mute_user(ALICE);
        let from_alice = Message::private(id(1.0), ALICE, vec![ALICE, ME]);
        let to_alice = Message::private(id(2.0), ME, vec![ALICE, ME]);
        let group = Message::private(id(3.0), ALICE, vec![ALICE, BOB, ME]);
        let from_cordelia = Message::private(id(4.0), CORDELIA, vec![CORDELIA, ME]);

        let mut mld = list(context.clone());
        mld.add_messages(vec![from_alice.clone(), to_alice, group, from_cordelia]);
        assert_eq!(mld.items(), ids(&[3.0, 4.0]));

        let mut pm = MessageListData::new(Filter::new(
            vec![Term::new("pm-with", "alice@example.com")],
            context,
        ));
        pm.add_messages(vec![from_alice]);
        assert_eq!(pm.items(), ids(&[1.0]));
    }

    #[test]
    fn test_mute_oracle_is_consulted_per_message() {
        let mut mock = MockMuteState::new();
        mock.expect_is_topic_muted()
            .returning(|_, topic| topic == "secret");
        mock.expect_is_stream_muted().returning(|_| false);
        mock.expect_is_user_muted().never();

        let context = NarrowContext::new(
            Arc::new(test_support::streams()),
            Arc::new(test_support::people()),
            Arc::new(mock),
        );
        let mut mld = list(context);
        let secret = Message::stream(id(2.0), ALICE, VERONA, "Verona", "secret");
        mld.add_messages(vec![verona(1.0), secret]);
        assert_eq!(mld.items(), ids(&[1.0]));
    }

    #[test]
    fn test_sort_invariant_under_mixed_operations() {
        let (context, mutes) = test_support::realm();
        mutes.mute_topic(VERONA, "muted");
        let mut mld = list(context);

        let message = |n: u64| {
            let topic = if n % 3 == 0 { "muted" } else { "lunch" };
            Message::stream(n, ALICE, VERONA, "Verona", topic)
        };
        let batches: [&[u64]; 5] = [&[50, 40, 45], &[10, 60, 47], &[5, 46, 70, 3], &[44, 41], &[100, 1]];
        for (step, batch) in batches.iter().enumerate() {
            mld.add_messages(batch.iter().copied().map(message).collect());
            if step % 2 == 1 {
                let removed = [MessageId::from(45), MessageId::from(3)];
                mld.remove(&removed);
            }

            assert!(mld.all_items().windows(2).all(|pair| pair[0] < pair[1]));
            assert!(mld.items().windows(2).all(|pair| pair[0] < pair[1]));
            let expected: Vec<MessageId> = mld
                .all_items()
                .iter()
                .copied()
                .filter(|id| mld.get(*id).is_some_and(|m| m.topic() != "muted"))
                .collect();
            assert_eq!(mld.items(), expected);
            assert_eq!(mld.all_items().len(), mld.id_index.len());
        }

        let before = mld.items().to_vec();
        mld.update_items_for_muting();
        assert_eq!(mld.items(), before);
    }

    #[test]
    fn test_unread_queries_and_mark_read() {
        let mut mld = list_with(&[1.0, 2.0, 3.0]);
        assert_eq!(mld.first_unread_message_id(), Some(id(1.0)));
        assert!(mld.has_unread_messages());

        assert_eq!(mld.mark_read(&ids(&[1.0, 2.0, 42.0])), 2);
        assert_eq!(mld.mark_read(&ids(&[1.0])), 0);
        assert_eq!(mld.first_unread_message_id(), Some(id(3.0)));

        mld.mark_read(&ids(&[3.0]));
        assert!(!mld.has_unread_messages());
        assert_eq!(mld.first_unread_message_id(), Some(id(3.0)));
    }

    #[test]
    fn test_get_last_message_sent_by_me() {
        let (context, _) = test_support::realm();
        let mut mld = list(context);
        mld.add_messages(vec![
            Message::stream(1_u64, ME, VERONA, "Verona", "x"),
            Message::stream(2_u64, ME, VERONA, "Verona", "x"),
            Message::stream(3_u64, ALICE, VERONA, "Verona", "x"),
        ]);
        assert_eq!(
            mld.get_last_message_sent_by_me().map(Message::id),
            Some(MessageId::from(2))
        );
    }

    #[test]
    fn test_update_stream_name_and_clear() {
        let mut mld = list_with(&[1.0, 2.0]);
        mld.fetch_status_mut().record(true, false);
        assert_eq!(mld.update_stream_name(VERONA, "Venice"), 2);
        assert_eq!(mld.get(id(1.0)).and_then(Message::stream_name), Some("Venice"));

        mld.clear();
        assert!(mld.is_empty());
        assert!(mld.all_items().is_empty());
        assert!(!mld.fetch_status().has_found_oldest());
    }
}
