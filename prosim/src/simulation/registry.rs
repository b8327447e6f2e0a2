//! Client lifecycle bookkeeping.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::client::ClientId;

use super::event_queue::SlotId;

struct ClientEntry {
    /// Slots in which this client currently has pending events.
    slots: Vec<SlotId>,
    /// Whether the client is suspended on a pending event.
    suspended: bool,
}

/// Bidirectional mapping between registered clients and the queue slots they
/// occupy.
///
/// The registry also maintains the count of *running* clients — registered
/// clients that are not suspended on a pending event. The scheduler only pops
/// the next timestamp when this count is zero, which is what turns preemptive
/// threads back into cooperative processes: a resumed client keeps the logical
/// token until it re-suspends or deregisters.
pub(crate) struct ClientRegistry {
    clients: HashMap<ClientId, ClientEntry>,
    running: usize,
}

impl ClientRegistry {
    /// Creates an empty `ClientRegistry`.
    pub(crate) fn new() -> Self {
        Self {
            clients: HashMap::new(),
            running: 0,
        }
    }

    /// Registers a client with an empty slot list, in the running state.
    ///
    /// Re-registering a known client is a no-op.
    pub(crate) fn insert(&mut self, id: ClientId) {
        if let Entry::Vacant(entry) = self.clients.entry(id) {
            entry.insert(ClientEntry {
                slots: Vec::new(),
                suspended: false,
            });
            self.running += 1;
        }
    }

    /// Removes a client, returning the slots it still occupied.
    pub(crate) fn remove(&mut self, id: ClientId) -> Vec<SlotId> {
        match self.clients.remove(&id) {
            Some(entry) => {
                if !entry.suspended {
                    self.running -= 1;
                }

                entry.slots
            }
            None => Vec::new(),
        }
    }

    pub(crate) fn contains(&self, id: ClientId) -> bool {
        self.clients.contains_key(&id)
    }

    /// Files a pending slot for `id` and marks it suspended.
    pub(crate) fn suspend(&mut self, id: ClientId, slot: SlotId) {
        if let Some(entry) = self.clients.get_mut(&id) {
            entry.slots.push(slot);
            if !entry.suspended {
                entry.suspended = true;
                self.running -= 1;
            }
        }
    }

    /// Detaches one slot from `id` after delivery; the client counts as
    /// running again once no slots remain.
    pub(crate) fn detach_slot(&mut self, id: ClientId, slot: SlotId) {
        if let Some(entry) = self.clients.get_mut(&id) {
            entry.slots.retain(|s| *s != slot);
            if entry.slots.is_empty() && entry.suspended {
                entry.suspended = false;
                self.running += 1;
            }
        }
    }

    /// Takes all slots of `id` at once, marking it running.
    ///
    /// Unknown clients yield an empty list.
    pub(crate) fn take_slots(&mut self, id: ClientId) -> Vec<SlotId> {
        match self.clients.get_mut(&id) {
            Some(entry) => {
                if entry.suspended {
                    entry.suspended = false;
                    self.running += 1;
                }

                std::mem::take(&mut entry.slots)
            }
            None => Vec::new(),
        }
    }

    /// Number of registered clients not suspended on a pending event.
    pub(crate) fn running(&self) -> usize {
        self.running
    }

    /// Clients currently suspended on a pending event.
    pub(crate) fn suspended_clients(&self) -> Vec<ClientId> {
        self.clients
            .iter()
            .filter(|(_, entry)| entry.suspended)
            .map(|(&id, _)| id)
            .collect()
    }

    /// Drops all client entries and resets the running count.
    pub(crate) fn clear(&mut self) {
        self.clients.clear();
        self.running = 0;
    }
}
