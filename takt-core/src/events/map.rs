//! Event id registry and per-id subscriber lists.

use crate::error::EventError;

use super::{truncate_name, EventId, EventType, ServerId};

#[derive(Debug, Clone)]
struct EventDescriptor {
    id: EventId,
    name: String,
    subscribers: Vec<ServerId>,
}

/// Registered event ids. Table position is the dense index used by every
/// per-id array in a server.
#[derive(Debug, Clone)]
pub struct EventMap {
    descriptors: Vec<EventDescriptor>,
}

impl EventMap {
    pub fn new(table: &[EventType], name_capacity: usize) -> Result<Self, EventError> {
        if table.is_empty() {
            return Err(EventError::EmptyTable);
        }

        let mut descriptors: Vec<EventDescriptor> = Vec::with_capacity(table.len());
        for entry in table {
            if descriptors.iter().any(|existing| existing.id == entry.id) {
                return Err(EventError::DuplicateEvent(entry.id));
            }
            descriptors.push(EventDescriptor {
                id: entry.id,
                name: truncate_name(&entry.name, name_capacity),
                subscribers: Vec::new(),
            });
        }

        Ok(Self { descriptors })
    }

    /// Number of registered event ids.
    #[inline]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    #[inline]
    pub fn index_of(&self, id: EventId) -> Option<usize> {
        self.descriptors.iter().position(|event| event.id == id)
    }

    #[inline]
    pub fn contains(&self, id: EventId) -> bool {
        self.index_of(id).is_some()
    }

    /// Diagnostic name of `id`.
    pub fn name(&self, id: EventId) -> Option<&str> {
        self.descriptors
            .iter()
            .find(|event| event.id == id)
            .map(|event| event.name.as_str())
    }

    /// Registered ids in table order.
    pub fn ids(&self) -> impl Iterator<Item = EventId> + '_ {
        self.descriptors.iter().map(|event| event.id)
    }

    /// Servers subscribed to the event at `index`, in subscription order.
    pub fn subscribers(&self, index: usize) -> &[ServerId] {
        self.descriptors
            .get(index)
            .map(|event| event.subscribers.as_slice())
            .unwrap_or(&[])
    }

    pub(crate) fn attach(&mut self, index: usize, server: ServerId) {
        if let Some(event) = self.descriptors.get_mut(index) {
            if !event.subscribers.contains(&server) {
                event.subscribers.push(server);
            }
        }
    }

    pub(crate) fn detach(&mut self, index: usize, server: ServerId) {
        if let Some(event) = self.descriptors.get_mut(index) {
            event.subscribers.retain(|&id| id != server);
        }
    }

    pub(crate) fn detach_all(&mut self, server: ServerId) {
        for event in &mut self.descriptors {
            event.subscribers.retain(|&id| id != server);
        }
    }
}
