//! Subscription endpoints.

use std::collections::VecDeque;
use std::rc::Rc;

use super::message::Envelope;
use super::{Handler, SubscribeMode};

/// Slot index of a server within its bus.
pub type ServerId = usize;

pub(crate) enum Subscription<C> {
    Unsubscribed,
    Subscribed { mode: SubscribeMode, handler: Handler<C> },
}

pub(crate) struct EventServer<C> {
    pub(crate) name: String,
    pub(crate) enabled: bool,
    /// One slot per registered event, indexed like the map.
    pub(crate) slots: Vec<Subscription<C>>,
    pub(crate) queue: VecDeque<Rc<Envelope>>,
}

impl<C> EventServer<C> {
    pub(crate) fn new(name: String, event_count: usize) -> Self {
        Self {
            name,
            enabled: true,
            slots: (0..event_count).map(|_| Subscription::Unsubscribed).collect(),
            queue: VecDeque::new(),
        }
    }

    pub(crate) fn mode(&self, index: usize) -> Option<SubscribeMode> {
        match self.slots.get(index)? {
            Subscription::Subscribed { mode, .. } => Some(*mode),
            Subscription::Unsubscribed => None,
        }
    }

    pub(crate) fn handler(&self, index: usize) -> Option<Handler<C>> {
        match self.slots.get(index)? {
            Subscription::Subscribed { handler, .. } => Some(Rc::clone(handler)),
            Subscription::Unsubscribed => None,
        }
    }
}
