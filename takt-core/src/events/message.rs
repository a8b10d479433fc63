//! Published messages and their shared envelopes.

use std::fmt;
use std::rc::Rc;

use bytes::Bytes;

use crate::alloc::EnvelopeStats;

use super::EventId;

/// What a subscriber sees: the event id and an optional owned payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    id: EventId,
    payload: Option<Bytes>,
}

impl Message {
    #[inline]
    pub fn id(&self) -> EventId {
        self.id
    }

    /// Payload bytes, `None` for a plain `publish`.
    #[inline]
    pub fn data(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }

    #[inline]
    pub fn data_size(&self) -> usize {
        self.payload.as_ref().map_or(0, Bytes::len)
    }

    #[inline]
    pub fn payload(&self) -> Option<&Bytes> {
        self.payload.as_ref()
    }
}

/// One allocation per publish, shared by every queue that captured it.
///
/// The strong count of the surrounding `Rc` is the number of holders; the
/// payload is released when the last one lets go.
pub(crate) struct Envelope {
    message: Message,
    stats: Rc<EnvelopeStats>,
}

impl Envelope {
    pub(crate) fn new(id: EventId, data: Option<&[u8]>, stats: Rc<EnvelopeStats>) -> Rc<Self> {
        stats.increment_allocated();
        Rc::new(Self {
            message: Message {
                id,
                payload: data.map(Bytes::copy_from_slice),
            },
            stats,
        })
    }

    #[inline]
    pub(crate) fn message(&self) -> &Message {
        &self.message
    }
}

impl Drop for Envelope {
    fn drop(&mut self) {
        self.stats.increment_released();
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("message", &self.message)
            .finish()
    }
}
