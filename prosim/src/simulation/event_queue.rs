//! Coalescing event queue ordered by virtual time.

use std::collections::{BTreeMap, HashMap};

use crate::client::ClientId;
use crate::time::{SimTime, TimeKey};

use super::event::Event;

/// Identifier of a per-timestamp slot.
///
/// Slot identifiers are allocated from a monotone counter and never reused, so
/// a stale identifier held elsewhere can at worst name a slot that no longer
/// exists.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct SlotId(pub(crate) u64);

/// An associative container optimized for extraction of the events with the
/// lowest timestamp.
///
/// Events sharing a timestamp are coalesced into a single *slot* so that queue
/// operations scale with the number of distinct instants rather than with the
/// number of events. Within a slot, submission order is preserved.
///
/// Three structures are kept in agreement: the time-ordered index (timestamp →
/// slot), the inverse mapping (slot → timestamp) and the per-slot event lists.
pub(crate) struct EventQueue {
    by_time: BTreeMap<TimeKey, SlotId>,
    slot_times: HashMap<SlotId, TimeKey>,
    events: HashMap<SlotId, Vec<Event>>,
    next_index: u64,
}

impl EventQueue {
    /// Creates an empty `EventQueue`.
    pub(crate) fn new() -> Self {
        Self {
            by_time: BTreeMap::new(),
            slot_times: HashMap::new(),
            events: HashMap::new(),
            next_index: 0,
        }
    }

    /// Files an event, coalescing it onto the existing slot for its timestamp
    /// or allocating a fresh slot.
    pub(crate) fn insert(&mut self, event: Event) -> SlotId {
        let key = TimeKey::new(event.time);

        if let Some(&slot) = self.by_time.get(&key) {
            self.events.get_mut(&slot).unwrap().push(event);

            return slot;
        }

        let slot = SlotId(self.next_index);
        self.next_index += 1;
        self.by_time.insert(key, slot);
        self.slot_times.insert(slot, key);
        self.events.insert(slot, vec![event]);

        slot
    }

    /// Returns the slot with the lowest timestamp, leaving it in the queue.
    pub(crate) fn peek_min(&self) -> Option<(SlotId, SimTime)> {
        self.by_time
            .first_key_value()
            .map(|(key, &slot)| (slot, key.get()))
    }

    /// Removes a slot from all three structures and returns its events in
    /// submission order.
    ///
    /// A slot that was already removed yields an empty list.
    pub(crate) fn pop_slot(&mut self, slot: SlotId) -> Vec<Event> {
        match self.slot_times.remove(&slot) {
            Some(key) => {
                self.by_time.remove(&key);

                self.events.remove(&slot).unwrap_or_default()
            }
            None => Vec::new(),
        }
    }

    /// Removes and returns the events of `owner` filed under `slot`, popping
    /// the slot entirely if its list empties.
    ///
    /// Other clients sharing the timestamp are unaffected.
    pub(crate) fn remove_events_of_owner(&mut self, slot: SlotId, owner: ClientId) -> Vec<Event> {
        let Some(list) = self.events.get_mut(&slot) else {
            return Vec::new();
        };

        let (removed, kept): (Vec<_>, Vec<_>) =
            list.drain(..).partition(|event| event.owner == owner);
        *list = kept;

        if list.is_empty() {
            self.pop_slot(slot);
        }

        removed
    }

    /// Number of distinct live timestamps.
    pub(crate) fn len(&self) -> usize {
        self.by_time.len()
    }
}
