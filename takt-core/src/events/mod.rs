//! ## takt-core::events
//! **Publish/subscribe event bus with sync and async delivery**
//!
//! ### Key Submodules:
//! - `map`: event id registry, one subscriber list per id
//! - `server`: subscription endpoints with per-id handler slots and a FIFO queue
//! - `message`: reference-counted envelopes around owned payload copies
//! - `bus`: the [`EventBus`] tying the three together
//!
//! A sync subscriber runs inside `publish`. An async subscriber gets the
//! envelope appended to its queue and runs on the next `execute`. Every async
//! queue holding an envelope keeps it alive; the payload is freed once, when the
//! last queue lets go.

pub mod bus;
pub mod map;
pub mod message;
pub mod server;

pub use bus::{Delivery, EventBus};
pub use map::EventMap;
pub use message::Message;
pub use server::ServerId;

use std::rc::Rc;

/// Small integer identifying a kind of occurrence.
pub type EventId = u8;

/// Callback invoked with the handler context and the delivered message.
pub type Handler<C> = Rc<dyn Fn(&mut C, &Message)>;

/// One row of the event type table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventType {
    pub id: EventId,
    pub name: String,
}

impl EventType {
    pub fn new(id: EventId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// How a subscription is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubscribeMode {
    #[default]
    Async,
    Sync,
}

/// Truncates `name` to fit `capacity` bytes including a terminator, never
/// splitting a UTF-8 sequence.
pub fn truncate_name(name: &str, capacity: usize) -> String {
    let max = capacity.saturating_sub(1);
    if name.len() <= max {
        return name.to_owned();
    }

    let mut end = max;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    name[..end].to_owned()
}
