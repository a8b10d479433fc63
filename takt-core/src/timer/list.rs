//! Tick-ordered waiting list of countdown timers.
//!
//! A `TimerList` owns its timers. Armed timers are additionally kept in
//! `armed`, sorted by ascending overtick, so the head is always the next timer
//! due. All mutation goes through [`TimerService`](super::TimerService), which
//! brackets it with a critical section.

use crate::alloc::SlotPool;
use crate::error::TimerError;

use super::{is_before, Tick};

/// Slot index of a timer within its list.
pub type TimerKey = usize;

/// Whether a timer re-arms itself after firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerMode {
    Single,
    Loop,
}

/// Membership of a timer in its list's armed sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    Unlinked,
    Linked,
}

/// A single countdown entry.
#[derive(Debug, Clone)]
pub struct Timer<P> {
    enabled: bool,
    mode: TimerMode,
    interval: Tick,
    overtick: Tick,
    param: P,
    link: Link,
}

impl<P> Timer<P> {
    fn new(mode: TimerMode, param: P) -> Self {
        Self {
            enabled: false,
            mode,
            interval: 0,
            overtick: 0,
            param,
            link: Link::Unlinked,
        }
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[inline]
    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    /// Interval of the last successful start, zero if never started.
    #[inline]
    pub fn interval(&self) -> Tick {
        self.interval
    }

    /// Absolute tick at which the timer is due.
    #[inline]
    pub fn overtick(&self) -> Tick {
        self.overtick
    }

    #[inline]
    pub fn param(&self) -> &P {
        &self.param
    }

    #[inline]
    pub fn link(&self) -> Link {
        self.link
    }
}

/// Waiting list owning a bounded set of timers.
#[derive(Debug, Clone)]
pub struct TimerList<P> {
    slots: SlotPool<Timer<P>>,
    armed: Vec<TimerKey>,
}

impl<P> TimerList<P> {
    /// Creates a list holding at most `capacity` timers.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: SlotPool::with_capacity(capacity),
            armed: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn get(&self, key: TimerKey) -> Option<&Timer<P>> {
        self.slots.get(key)
    }

    #[inline]
    pub fn contains(&self, key: TimerKey) -> bool {
        self.slots.contains(key)
    }

    #[inline]
    pub fn is_armed(&self, key: TimerKey) -> bool {
        self.get(key).is_some_and(|timer| timer.link == Link::Linked)
    }

    /// Number of timers owned by the list, armed or not.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[inline]
    pub fn armed_len(&self) -> usize {
        self.armed.len()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Keys of every owned timer in ascending key order.
    pub fn keys(&self) -> impl Iterator<Item = TimerKey> + '_ {
        self.slots.indices()
    }

    /// Armed keys in firing order.
    pub fn keys_by_deadline(&self) -> impl Iterator<Item = TimerKey> + '_ {
        self.armed.iter().copied()
    }

    pub(crate) fn insert(&mut self, mode: TimerMode, param: P) -> Result<TimerKey, TimerError> {
        self.slots
            .insert(Timer::new(mode, param))
            .map_err(|_| TimerError::PoolExhausted(self.slots.len()))
    }

    pub(crate) fn remove(&mut self, key: TimerKey) -> Result<Timer<P>, TimerError> {
        self.unlink(key)?;
        self.slots.remove(key).ok_or(TimerError::UnknownTimer(key))
    }

    pub(crate) fn clear(&mut self) -> usize {
        self.armed.clear();
        self.slots.clear()
    }

    pub(crate) fn get_mut(&mut self, key: TimerKey) -> Result<&mut Timer<P>, TimerError> {
        self.slots.get_mut(key).ok_or(TimerError::UnknownTimer(key))
    }

    /// First armed timer, the next one due.
    pub(crate) fn head(&self) -> Option<(TimerKey, &Timer<P>)> {
        let key = *self.armed.first()?;
        self.slots.get(key).map(|timer| (key, timer))
    }

    /// Disables the timer and drops it from the armed sequence.
    pub(crate) fn unlink(&mut self, key: TimerKey) -> Result<(), TimerError> {
        let timer = self.get_mut(key)?;
        timer.enabled = false;
        if timer.link == Link::Linked {
            timer.link = Link::Unlinked;
            self.armed.retain(|&armed| armed != key);
        }
        Ok(())
    }

    /// Unlinks, validates `interval` and re-inserts the timer in deadline order.
    ///
    /// A timer due at the same tick as an armed one is placed after it.
    pub(crate) fn link(&mut self, key: TimerKey, now: Tick, interval: Tick) -> Result<(), TimerError> {
        self.unlink(key)?;

        if interval == 0 {
            return Err(TimerError::ZeroInterval);
        }
        if interval > Tick::MAX / 2 {
            return Err(TimerError::IntervalTooLarge(interval));
        }

        let overtick = now.wrapping_add(interval);
        let slots = &self.slots;
        let position = self
            .armed
            .iter()
            .position(|&other| {
                slots
                    .get(other)
                    .is_some_and(|timer| is_before(overtick, timer.overtick))
            })
            .unwrap_or(self.armed.len());
        self.armed.insert(position, key);

        let timer = self.get_mut(key)?;
        timer.enabled = true;
        timer.interval = interval;
        timer.overtick = overtick;
        timer.link = Link::Linked;
        Ok(())
    }

    pub(crate) fn set_mode(&mut self, key: TimerKey, mode: TimerMode) -> Result<(), TimerError> {
        self.get_mut(key)?.mode = mode;
        Ok(())
    }

    pub(crate) fn set_param(&mut self, key: TimerKey, param: P) -> Result<(), TimerError> {
        self.get_mut(key)?.param = param;
        Ok(())
    }
}
