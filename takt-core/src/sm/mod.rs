//! ## takt-core::sm
//! **State machine over the event bus and timer service**
//!
//! Each state owns one event server and a private timer pool. Only the current
//! state's server is running; a transition stops the old server, drops its
//! backlog and its private timers, then starts the new one. Global timers belong
//! to the machine and survive transitions.
//!
//! Handlers receive the machine itself, so they can publish, transition and arm
//! timers while being dispatched. User data lives in the machine's context,
//! reachable through [`StateMachine::context_mut`].

mod state;

pub use state::{MachineTimer, StateId, TimerScope};

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::config::MachineConfig;
use crate::error::{EventError, StateMachineError};
use crate::events::{EventBus, EventId, EventType, Handler, Message, ServerId, SubscribeMode};
use crate::irq::{InterruptControl, NoInterrupts};
use crate::timer::{Expired, Tick, TickSource, TimerKey, TimerList, TimerMode, TimerService};

use state::State;

/// Handler signature for state subscriptions.
pub type StateHandler<T> = Handler<StateMachine<T>>;

pub struct StateMachine<T> {
    bus: EventBus<StateMachine<T>>,
    states: BTreeMap<StateId, State>,
    current: Option<StateId>,
    global_timers: TimerList<MachineTimer>,
    timers: TimerService,
    timer_capacity: usize,
    context: T,
}

impl<T> StateMachine<T> {
    /// Builds a machine with default sizing and no interrupt masking.
    pub fn new(table: &[EventType], clock: Rc<dyn TickSource>, context: T) -> Result<Self, StateMachineError> {
        Self::with_config(table, clock, Rc::new(NoInterrupts), MachineConfig::default(), context)
    }

    /// Builds a machine sized by `config`. Zero servers or zero timer slots are
    /// rejected.
    pub fn with_config(
        table: &[EventType],
        clock: Rc<dyn TickSource>,
        irq: Rc<dyn InterruptControl>,
        config: MachineConfig,
        context: T,
    ) -> Result<Self, StateMachineError> {
        if config.timer_pool_capacity == 0 {
            return Err(StateMachineError::NoTimerCapacity);
        }
        let bus = EventBus::with_config(table, config.bus, Rc::clone(&irq))?;

        Ok(Self {
            bus,
            states: BTreeMap::new(),
            current: None,
            global_timers: TimerList::new(config.timer_pool_capacity),
            timers: TimerService::with_interrupts(clock, irq),
            timer_capacity: config.timer_pool_capacity,
            context,
        })
    }

    #[inline]
    pub fn context(&self) -> &T {
        &self.context
    }

    #[inline]
    pub fn context_mut(&mut self) -> &mut T {
        &mut self.context
    }

    /// The bus backing this machine, for inspection.
    #[inline]
    pub fn bus(&self) -> &EventBus<StateMachine<T>> {
        &self.bus
    }

    /// Current tick of the machine's clock.
    #[inline]
    pub fn now(&self) -> Tick {
        self.timers.now()
    }

    /// Registers a state. Its server stays stopped until the first transition
    /// into it.
    pub fn state_create(&mut self, id: StateId) -> Result<(), StateMachineError> {
        if self.states.contains_key(&id) {
            return Err(StateMachineError::DuplicateState(id));
        }

        let server = self.bus.create_server(&format!("state{id}"))?;
        self.bus.stop_server(server)?;
        self.states.insert(id, State::new(server, self.timer_capacity));
        debug!(state = id, server, "state created");
        Ok(())
    }

    /// Registers a state subscribed to every id in `events` with one shared
    /// handler. Nothing is created if any id is unknown.
    pub fn state_create_with_events<F>(
        &mut self,
        id: StateId,
        events: &[EventId],
        handler: F,
    ) -> Result<(), StateMachineError>
    where
        F: Fn(&mut StateMachine<T>, &Message) + 'static,
    {
        if let Some(&unknown) = events.iter().find(|&&event| !self.bus.contains(event)) {
            return Err(EventError::UnknownEvent(unknown).into());
        }

        self.state_create(id)?;
        let handler: StateHandler<T> = Rc::new(handler);
        for &event in events {
            self.state_subscribe_handler(id, event, Rc::clone(&handler))?;
        }
        Ok(())
    }

    /// Removes a state together with its server and private timers.
    ///
    /// Destroying the current state leaves the machine without one.
    pub fn state_destroy(&mut self, id: StateId) -> Result<(), StateMachineError> {
        let mut state = self.states.remove(&id).ok_or(StateMachineError::UnknownState(id))?;
        self.timers.clear(&mut state.timers);
        self.bus.destroy_server(state.server)?;

        if self.current == Some(id) {
            self.current = None;
        }
        debug!(state = id, "state destroyed");
        Ok(())
    }

    pub fn state_subscribe_event<F>(&mut self, id: StateId, event: EventId, handler: F) -> Result<(), StateMachineError>
    where
        F: Fn(&mut StateMachine<T>, &Message) + 'static,
    {
        self.state_subscribe_handler(id, event, Rc::new(handler))
    }

    /// Subscribes `id` to each of `events` with one shared handler.
    pub fn state_subscribe_events<F>(
        &mut self,
        id: StateId,
        events: &[EventId],
        handler: F,
    ) -> Result<(), StateMachineError>
    where
        F: Fn(&mut StateMachine<T>, &Message) + 'static,
    {
        let handler: StateHandler<T> = Rc::new(handler);
        for &event in events {
            self.state_subscribe_handler(id, event, Rc::clone(&handler))?;
        }
        Ok(())
    }

    pub fn state_subscribe_handler(
        &mut self,
        id: StateId,
        event: EventId,
        handler: StateHandler<T>,
    ) -> Result<(), StateMachineError> {
        let server = self.server_of(id)?;
        self.bus
            .subscribe_handler(server, event, SubscribeMode::Async, handler)?;
        Ok(())
    }

    pub fn state_unsubscribe_event(&mut self, id: StateId, event: EventId) -> Result<(), StateMachineError> {
        let server = self.server_of(id)?;
        self.bus.unsubscribe(server, event)?;
        Ok(())
    }

    #[inline]
    pub fn current_state(&self) -> Option<StateId> {
        self.current
    }

    #[inline]
    pub fn has_state(&self, id: StateId) -> bool {
        self.states.contains_key(&id)
    }

    /// Registered state ids in ascending order.
    pub fn state_ids(&self) -> impl Iterator<Item = StateId> + '_ {
        self.states.keys().copied()
    }

    /// Messages waiting for state `id`.
    pub fn state_msg_count(&self, id: StateId) -> Result<usize, StateMachineError> {
        let server = self.server_of(id)?;
        Ok(self.bus.msg_count(server)?)
    }

    /// Makes `id` the current state.
    ///
    /// The previous state's server is stopped, its backlog discarded and its
    /// private timers removed. Transitioning to the current state does the same
    /// teardown and restarts it fresh.
    pub fn trans_to(&mut self, id: StateId) -> Result<(), StateMachineError> {
        let server = self.server_of(id)?;

        if let Some(from) = self.current {
            if let Some(old) = self.states.get_mut(&from) {
                self.bus.stop_server(old.server)?;
                let discarded = self.bus.clear_msg(old.server)?;
                let timers = self.timers.clear(&mut old.timers);
                debug!(from, to = id, discarded, timers, "leaving state");
            }
        }

        self.current = Some(id);
        self.bus.start_server(server)?;
        debug!(state = id, "transitioned");
        Ok(())
    }

    /// Runs one scheduling pass.
    ///
    /// Fires due global timers, then due private timers of the current state,
    /// then drains the queue of the state that was current when the pass began.
    /// Returns the number of queued messages handed to a handler.
    pub fn handler(&mut self) -> Result<usize, StateMachineError> {
        let id = self.current.ok_or(StateMachineError::NoCurrentState)?;
        let server = self.server_of(id)?;
        let now = self.timers.now();

        while let Some(expired) = self.timers.expire_next(&mut self.global_timers, now) {
            if expired.mode == TimerMode::Single {
                let _ = self.timers.destroy(&mut self.global_timers, expired.key);
            }
            self.fire(TimerScope::Global, now, expired);
        }

        while let Some(expired) = self.expire_private(now) {
            self.fire(TimerScope::Private, now, expired);
        }

        let mut delivered = 0;
        while self.states.get(&id).is_some_and(|state| state.server == server) {
            let Some(delivery) = self.bus.next_delivery(server)? else {
                break;
            };
            if delivery.deliver(self) {
                delivered += 1;
            }
        }
        Ok(delivered)
    }

    /// Pops the next due private timer of whatever state is current now.
    fn expire_private(&mut self, now: Tick) -> Option<Expired<MachineTimer>> {
        let current = self.current?;
        let state = self.states.get_mut(&current)?;
        let expired = self.timers.expire_next(&mut state.timers, now)?;
        if expired.mode == TimerMode::Single {
            let _ = self.timers.destroy(&mut state.timers, expired.key);
        }
        Some(expired)
    }

    fn fire(&mut self, scope: TimerScope, now: Tick, expired: Expired<MachineTimer>) {
        let event = expired.param.event;
        trace!(%scope, id = expired.key, event, now, "machine timer fired");
        if let Err(error) = self.publish_event(event) {
            warn!(%scope, id = expired.key, event, %error, "timer event dropped");
        }
    }

    /// Publishes `event` on the machine's bus.
    pub fn publish_event(&mut self, event: EventId) -> Result<(), StateMachineError> {
        self.publish_inner(event, None)
    }

    pub fn publish_event_with_param(&mut self, event: EventId, data: &[u8]) -> Result<(), StateMachineError> {
        self.publish_inner(event, Some(data))
    }

    fn publish_inner(&mut self, event: EventId, data: Option<&[u8]>) -> Result<(), StateMachineError> {
        for delivery in self.bus.dispatch(event, data)? {
            delivery.deliver(self);
        }
        Ok(())
    }

    /// Arms a single-shot private timer publishing `event` after `interval`
    /// ticks. Returns the timer id.
    pub fn start_timer(&mut self, interval: Tick, event: EventId) -> Result<TimerKey, StateMachineError> {
        self.start_machine_timer(TimerScope::Private, TimerMode::Single, interval, event)
    }

    pub fn start_timer_loop(&mut self, interval: Tick, event: EventId) -> Result<TimerKey, StateMachineError> {
        self.start_machine_timer(TimerScope::Private, TimerMode::Loop, interval, event)
    }

    pub fn start_global_timer(&mut self, interval: Tick, event: EventId) -> Result<TimerKey, StateMachineError> {
        self.start_machine_timer(TimerScope::Global, TimerMode::Single, interval, event)
    }

    pub fn start_global_timer_loop(&mut self, interval: Tick, event: EventId) -> Result<TimerKey, StateMachineError> {
        self.start_machine_timer(TimerScope::Global, TimerMode::Loop, interval, event)
    }

    fn start_machine_timer(
        &mut self,
        scope: TimerScope,
        mode: TimerMode,
        interval: Tick,
        event: EventId,
    ) -> Result<TimerKey, StateMachineError> {
        if !self.bus.contains(event) {
            return Err(EventError::UnknownEvent(event).into());
        }

        let now = self.timers.now();
        let timers = self.timers.clone();
        let list = self.timer_list(scope)?;
        let key = timers.create(list, mode, MachineTimer { event })?;
        if let Err(error) = timers.start(list, key, now, interval) {
            let _ = timers.destroy(list, key);
            return Err(error.into());
        }

        debug!(%scope, id = key, interval, event, ?mode, "machine timer started");
        Ok(key)
    }

    /// Stops and frees a timer id.
    pub fn remove_timer(&mut self, scope: TimerScope, id: TimerKey) -> Result<(), StateMachineError> {
        let timers = self.timers.clone();
        let list = self.timer_list(scope)?;
        timers
            .destroy(list, id)
            .map_err(|_| StateMachineError::UnknownTimer { scope, id })?;
        Ok(())
    }

    /// Removes every private timer of state `id`, current or not.
    pub fn remove_state_all_timer(&mut self, id: StateId) -> Result<usize, StateMachineError> {
        let state = self.states.get_mut(&id).ok_or(StateMachineError::UnknownState(id))?;
        Ok(self.timers.clear(&mut state.timers))
    }

    pub fn remove_all_global_timer(&mut self) -> usize {
        self.timers.clear(&mut self.global_timers)
    }

    /// Timer ids in use in `scope`.
    pub fn timer_count(&self, scope: TimerScope) -> Result<usize, StateMachineError> {
        match scope {
            TimerScope::Global => Ok(self.global_timers.len()),
            TimerScope::Private => {
                let id = self.current.ok_or(StateMachineError::NoCurrentState)?;
                let state = self.states.get(&id).ok_or(StateMachineError::UnknownState(id))?;
                Ok(state.timers.len())
            }
        }
    }

    /// Private timers of state `id`.
    pub fn state_timers(&self, id: StateId) -> Option<&TimerList<MachineTimer>> {
        self.states.get(&id).map(|state| &state.timers)
    }

    #[inline]
    pub fn global_timers(&self) -> &TimerList<MachineTimer> {
        &self.global_timers
    }

    fn server_of(&self, id: StateId) -> Result<ServerId, StateMachineError> {
        self.states
            .get(&id)
            .map(|state| state.server)
            .ok_or(StateMachineError::UnknownState(id))
    }

    fn timer_list(&mut self, scope: TimerScope) -> Result<&mut TimerList<MachineTimer>, StateMachineError> {
        match scope {
            TimerScope::Global => Ok(&mut self.global_timers),
            TimerScope::Private => {
                let id = self.current.ok_or(StateMachineError::NoCurrentState)?;
                self.states
                    .get_mut(&id)
                    .map(|state| &mut state.timers)
                    .ok_or(StateMachineError::UnknownState(id))
            }
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for StateMachine<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("states", &self.states.keys().collect::<Vec<_>>())
            .field("current", &self.current)
            .field("global_timers", &self.global_timers.len())
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}
