//! ## takt-core::timer
//! **Software timers driven by an external tick counter**
//!
//! The tick source and the interrupt mask are injected into a [`TimerService`];
//! there is no process-wide timer state, so independent services (and
//! deterministic test clocks) can coexist.
//!
//! Deadlines are compared with signed wraparound arithmetic: `now` has reached
//! `target` iff `(now - target) as i32 >= 0`. This stays correct across counter
//! overflow as long as no interval exceeds half the counter range, which
//! [`TimerService::start`] enforces.

mod list;

pub use list::{Link, Timer, TimerKey, TimerList, TimerMode};

use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::error::TimerError;
use crate::irq::{CriticalSection, InterruptControl, NoInterrupts};

/// Monotonic, wrapping tick count.
pub type Tick = u32;

/// Source of the current tick count.
pub trait TickSource {
    fn now(&self) -> Tick;
}

impl<F> TickSource for F
where
    F: Fn() -> Tick,
{
    #[inline]
    fn now(&self) -> Tick {
        self()
    }
}

/// True once `now` has reached `target`.
#[inline]
pub fn is_time_out(now: Tick, target: Tick) -> bool {
    (now.wrapping_sub(target) as i32) >= 0
}

/// True if `a` is strictly earlier than `b`.
#[inline]
pub(crate) fn is_before(a: Tick, b: Tick) -> bool {
    (a.wrapping_sub(b) as i32) < 0
}

/// A timer taken off the head of its list by [`TimerService::expire_next`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expired<P> {
    pub key: TimerKey,
    pub mode: TimerMode,
    pub param: P,
}

/// Arms, stops and expires timers held in [`TimerList`]s.
#[derive(Clone)]
pub struct TimerService {
    clock: Rc<dyn TickSource>,
    irq: Rc<dyn InterruptControl>,
}

impl TimerService {
    /// Creates a service reading ticks from `clock`, without interrupt masking.
    pub fn new(clock: Rc<dyn TickSource>) -> Self {
        Self::with_interrupts(clock, Rc::new(NoInterrupts))
    }

    pub fn with_interrupts(clock: Rc<dyn TickSource>, irq: Rc<dyn InterruptControl>) -> Self {
        Self { clock, irq }
    }

    /// Samples the tick source.
    #[inline]
    pub fn now(&self) -> Tick {
        self.clock.now()
    }

    #[inline]
    pub fn interrupts(&self) -> &Rc<dyn InterruptControl> {
        &self.irq
    }

    /// Adds a stopped timer to `list`.
    pub fn create<P>(
        &self,
        list: &mut TimerList<P>,
        mode: TimerMode,
        param: P,
    ) -> Result<TimerKey, TimerError> {
        let _cs = CriticalSection::enter(&*self.irq);
        list.insert(mode, param)
    }

    /// Stops and removes a timer, handing back its entry.
    pub fn destroy<P>(&self, list: &mut TimerList<P>, key: TimerKey) -> Result<Timer<P>, TimerError> {
        let _cs = CriticalSection::enter(&*self.irq);
        list.remove(key)
    }

    /// Removes every timer in `list`, returning how many were dropped.
    pub fn clear<P>(&self, list: &mut TimerList<P>) -> usize {
        let _cs = CriticalSection::enter(&*self.irq);
        list.clear()
    }

    /// Arms `key` to fire `interval` ticks after `now`.
    ///
    /// The timer is unlinked first, so a rejected interval leaves it stopped.
    pub fn start<P>(
        &self,
        list: &mut TimerList<P>,
        key: TimerKey,
        now: Tick,
        interval: Tick,
    ) -> Result<(), TimerError> {
        let _cs = CriticalSection::enter(&*self.irq);
        list.link(key, now, interval)
    }

    /// Re-arms `key` with its previously configured interval.
    pub fn restart<P>(&self, list: &mut TimerList<P>, key: TimerKey, now: Tick) -> Result<(), TimerError> {
        let _cs = CriticalSection::enter(&*self.irq);
        let interval = list.get(key).ok_or(TimerError::UnknownTimer(key))?.interval();
        list.link(key, now, interval)
    }

    /// Disarms `key`. Stopping a stopped timer is a no-op.
    pub fn stop<P>(&self, list: &mut TimerList<P>, key: TimerKey) -> Result<(), TimerError> {
        let _cs = CriticalSection::enter(&*self.irq);
        list.unlink(key)
    }

    pub fn set_mode<P>(&self, list: &mut TimerList<P>, key: TimerKey, mode: TimerMode) -> Result<(), TimerError> {
        let _cs = CriticalSection::enter(&*self.irq);
        list.set_mode(key, mode)
    }

    pub fn set_param<P>(&self, list: &mut TimerList<P>, key: TimerKey, param: P) -> Result<(), TimerError> {
        let _cs = CriticalSection::enter(&*self.irq);
        list.set_param(key, param)
    }

    /// Takes the head of `list` if it is due at `now`.
    ///
    /// The timer is stopped; a loop timer is re-armed at `now + interval`
    /// before this returns, so whoever handles the expiry already sees it
    /// rescheduled.
    pub fn expire_next<P: Clone>(&self, list: &mut TimerList<P>, now: Tick) -> Option<Expired<P>> {
        let _cs = CriticalSection::enter(&*self.irq);

        let (key, mode, interval, param) = {
            let (key, timer) = list.head()?;
            if !is_time_out(now, timer.overtick()) {
                return None;
            }
            (key, timer.mode(), timer.interval(), timer.param().clone())
        };

        list.unlink(key).ok()?;
        if mode == TimerMode::Loop {
            // interval was validated when the timer was first armed
            list.link(key, now, interval).ok()?;
        }

        Some(Expired { key, mode, param })
    }

    /// Fires every timer in `list` that is due, in deadline order.
    ///
    /// `on_fire` may start, stop or destroy timers in the same list, including
    /// the one that just fired; scanning resumes from the current head.
    pub fn handler<P, F>(&self, list: &mut TimerList<P>, mut on_fire: F) -> usize
    where
        P: Clone,
        F: FnMut(&mut TimerList<P>, TimerKey, P),
    {
        let now = self.now();
        let mut fired = 0;

        while let Some(expired) = self.expire_next(list, now) {
            trace!(key = expired.key, now, "timer expired");
            on_fire(list, expired.key, expired.param);
            fired += 1;
        }

        fired
    }
}

impl fmt::Debug for TimerService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerService").finish_non_exhaustive()
    }
}
