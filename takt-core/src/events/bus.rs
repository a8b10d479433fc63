//! Event bus: the map, the servers built against it, and delivery.
//!
//! The bus owns its servers, so the map can never be torn down underneath a
//! live server: dropping the bus drops every server and every queued envelope.
//!
//! Handlers receive a caller-chosen context `C`. [`EventBus::publish`] and
//! [`EventBus::execute`] take that context by `&mut`. Callers whose handlers must
//! reach back into the bus itself (the state machine is one) use the two-phase
//! [`EventBus::dispatch`] / [`EventBus::next_delivery`] API, which hands out
//! [`Delivery`] values that hold no borrow of the bus.

use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::alloc::{EnvelopeStats, SlotPool};
use crate::config::BusConfig;
use crate::error::EventError;
use crate::irq::{CriticalSection, InterruptControl, NoInterrupts};

use super::map::EventMap;
use super::message::{Envelope, Message};
use super::server::{EventServer, ServerId, Subscription};
use super::{truncate_name, EventId, EventType, Handler, SubscribeMode};

/// A message paired with the handler that should see it.
///
/// `handler` is `None` when the server unsubscribed between enqueue and drain;
/// the message is consumed without a callback.
pub struct Delivery<C> {
    handler: Option<Handler<C>>,
    envelope: Rc<Envelope>,
}

impl<C> Delivery<C> {
    #[inline]
    pub fn message(&self) -> &Message {
        self.envelope.message()
    }

    #[inline]
    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }

    /// Runs the handler, if any. Returns whether a handler ran.
    pub fn deliver(self, ctx: &mut C) -> bool {
        match self.handler {
            Some(handler) => {
                handler(ctx, self.envelope.message());
                true
            }
            None => false,
        }
    }
}

impl<C> fmt::Debug for Delivery<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delivery")
            .field("message", self.message())
            .field("has_handler", &self.has_handler())
            .finish()
    }
}

/// Publish/subscribe hub for one event type table.
pub struct EventBus<C> {
    map: EventMap,
    servers: SlotPool<EventServer<C>>,
    irq: Rc<dyn InterruptControl>,
    stats: Rc<EnvelopeStats>,
    name_capacity: usize,
}

impl<C> EventBus<C> {
    /// Builds a bus for `table` with default sizing and no interrupt masking.
    pub fn new(table: &[EventType]) -> Result<Self, EventError> {
        Self::with_config(table, BusConfig::default(), Rc::new(NoInterrupts))
    }

    pub fn with_config(
        table: &[EventType],
        config: BusConfig,
        irq: Rc<dyn InterruptControl>,
    ) -> Result<Self, EventError> {
        if config.max_servers == 0 {
            return Err(EventError::NoServerCapacity);
        }
        let map = EventMap::new(table, config.name_capacity)?;
        debug!(events = map.len(), max_servers = config.max_servers, "event map created");

        Ok(Self {
            map,
            servers: SlotPool::with_capacity(config.max_servers),
            irq,
            stats: Rc::new(EnvelopeStats::new()),
            name_capacity: config.name_capacity,
        })
    }

    #[inline]
    pub fn map(&self) -> &EventMap {
        &self.map
    }

    /// Number of registered event ids.
    #[inline]
    pub fn event_count(&self) -> usize {
        self.map.len()
    }

    #[inline]
    pub fn contains(&self, id: EventId) -> bool {
        self.map.contains(id)
    }

    /// Diagnostic name for `id`.
    #[inline]
    pub fn event_name(&self, id: EventId) -> Option<&str> {
        self.map.name(id)
    }

    /// Envelope counters; `live()` is zero once every queue is drained.
    #[inline]
    pub fn stats(&self) -> &Rc<EnvelopeStats> {
        &self.stats
    }

    /// Creates an enabled server with every slot unsubscribed.
    ///
    /// Names longer than the configured capacity are truncated.
    pub fn create_server(&mut self, name: &str) -> Result<ServerId, EventError> {
        let server = EventServer::new(truncate_name(name, self.name_capacity), self.map.len());
        let id = self
            .servers
            .insert(server)
            .map_err(|_| EventError::ServerLimit(self.servers.capacity()))?;
        debug!(server = id, name, "event server created");
        Ok(id)
    }

    /// Drops a server, its subscriptions and its queue.
    ///
    /// Envelopes only this server still referenced are freed; envelopes queued
    /// elsewhere survive.
    pub fn destroy_server(&mut self, server: ServerId) -> Result<(), EventError> {
        let removed = {
            let _cs = CriticalSection::enter(&*self.irq);
            self.map.detach_all(server);
            self.servers.remove(server)
        };
        let removed = removed.ok_or(EventError::UnknownServer(server))?;
        debug!(server, pending = removed.queue.len(), "event server destroyed");
        Ok(())
    }

    #[inline]
    pub fn has_server(&self, server: ServerId) -> bool {
        self.servers.contains(server)
    }

    pub fn server_name(&self, server: ServerId) -> Result<&str, EventError> {
        Ok(self.server(server)?.name.as_str())
    }

    /// Lets publishes reach `server` again.
    pub fn start_server(&mut self, server: ServerId) -> Result<(), EventError> {
        self.server_mut(server)?.enabled = true;
        Ok(())
    }

    /// Makes publishes skip `server`. Its queue is left as is.
    pub fn stop_server(&mut self, server: ServerId) -> Result<(), EventError> {
        self.server_mut(server)?.enabled = false;
        Ok(())
    }

    pub fn is_enabled(&self, server: ServerId) -> Result<bool, EventError> {
        Ok(self.server(server)?.enabled)
    }

    /// Subscribes `server` to `id` with deferred delivery.
    pub fn subscribe<F>(&mut self, server: ServerId, id: EventId, handler: F) -> Result<(), EventError>
    where
        F: Fn(&mut C, &Message) + 'static,
    {
        self.subscribe_handler(server, id, SubscribeMode::Async, Rc::new(handler))
    }

    /// Subscribes `server` to `id` with delivery inside `publish`.
    pub fn subscribe_sync<F>(&mut self, server: ServerId, id: EventId, handler: F) -> Result<(), EventError>
    where
        F: Fn(&mut C, &Message) + 'static,
    {
        self.subscribe_handler(server, id, SubscribeMode::Sync, Rc::new(handler))
    }

    /// Installs `handler` for (`server`, `id`).
    ///
    /// An existing subscription is overwritten in place: the server stays
    /// registered once, with the new mode and handler.
    pub fn subscribe_handler(
        &mut self,
        server: ServerId,
        id: EventId,
        mode: SubscribeMode,
        handler: Handler<C>,
    ) -> Result<(), EventError> {
        let index = self.index_of(id)?;
        let entry = self
            .servers
            .get_mut(server)
            .ok_or(EventError::UnknownServer(server))?;

        entry.slots[index] = Subscription::Subscribed { mode, handler };
        self.map.attach(index, server);
        debug!(server, event = id, ?mode, "subscribed");
        Ok(())
    }

    /// Removes the subscription; unsubscribing twice is not an error.
    pub fn unsubscribe(&mut self, server: ServerId, id: EventId) -> Result<(), EventError> {
        let index = self.index_of(id)?;
        let entry = self
            .servers
            .get_mut(server)
            .ok_or(EventError::UnknownServer(server))?;

        entry.slots[index] = Subscription::Unsubscribed;
        self.map.detach(index, server);
        debug!(server, event = id, "unsubscribed");
        Ok(())
    }

    /// Current subscription mode of (`server`, `id`), `None` if unsubscribed.
    pub fn is_subscribed(&self, server: ServerId, id: EventId) -> Result<Option<SubscribeMode>, EventError> {
        let index = self.index_of(id)?;
        Ok(self.server(server)?.mode(index))
    }

    /// Publishes `id` without a payload.
    pub fn publish(&mut self, ctx: &mut C, id: EventId) -> Result<(), EventError> {
        self.publish_inner(ctx, id, None)
    }

    /// Publishes `id` with an owned copy of `data`.
    pub fn publish_with_param(&mut self, ctx: &mut C, id: EventId, data: &[u8]) -> Result<(), EventError> {
        self.publish_inner(ctx, id, Some(data))
    }

    fn publish_inner(&mut self, ctx: &mut C, id: EventId, data: Option<&[u8]>) -> Result<(), EventError> {
        for delivery in self.dispatch(id, data)? {
            delivery.deliver(ctx);
        }
        Ok(())
    }

    /// Queues `id` for every enabled async subscriber and returns the sync
    /// deliveries, in subscription order, for the caller to run.
    ///
    /// No envelope is built when nobody subscribes to `id`.
    pub fn dispatch(&mut self, id: EventId, data: Option<&[u8]>) -> Result<Vec<Delivery<C>>, EventError> {
        let index = self.index_of(id)?;
        let subscribers = self.map.subscribers(index);
        if subscribers.is_empty() {
            return Ok(Vec::new());
        }

        let envelope = Envelope::new(id, data, Rc::clone(&self.stats));
        let mut deliveries = Vec::new();
        let mut queued = 0usize;
        {
            let _cs = CriticalSection::enter(&*self.irq);
            for &server_id in subscribers {
                let Some(server) = self.servers.get_mut(server_id) else {
                    continue;
                };
                if !server.enabled {
                    continue;
                }
                match &server.slots[index] {
                    Subscription::Subscribed {
                        mode: SubscribeMode::Sync,
                        handler,
                    } => deliveries.push(Delivery {
                        handler: Some(Rc::clone(handler)),
                        envelope: Rc::clone(&envelope),
                    }),
                    Subscription::Subscribed {
                        mode: SubscribeMode::Async,
                        ..
                    } => {
                        server.queue.push_back(Rc::clone(&envelope));
                        queued += 1;
                    }
                    Subscription::Unsubscribed => {}
                }
            }
        }

        // holders: this frame, each queue, each pending sync delivery
        debug_assert_eq!(Rc::strong_count(&envelope), 1 + queued + deliveries.len());
        trace!(event = id, queued, sync = deliveries.len(), "published");
        Ok(deliveries)
    }

    /// Pops the oldest queued message of `server`.
    pub fn next_delivery(&mut self, server: ServerId) -> Result<Option<Delivery<C>>, EventError> {
        let entry = self
            .servers
            .get_mut(server)
            .ok_or(EventError::UnknownServer(server))?;

        let envelope = {
            let _cs = CriticalSection::enter(&*self.irq);
            entry.queue.pop_front()
        };
        let Some(envelope) = envelope else {
            return Ok(None);
        };

        let handler = self
            .map
            .index_of(envelope.message().id())
            .and_then(|index| entry.handler(index));
        Ok(Some(Delivery { handler, envelope }))
    }

    /// Delivers every queued message of `server` in publish order.
    ///
    /// Returns the number of handlers invoked.
    pub fn execute(&mut self, server: ServerId, ctx: &mut C) -> Result<usize, EventError> {
        let mut delivered = 0;
        while let Some(delivery) = self.next_delivery(server)? {
            if delivery.deliver(ctx) {
                delivered += 1;
            }
        }
        Ok(delivered)
    }

    /// Same as [`execute`](Self::execute).
    #[inline]
    pub fn handler(&mut self, server: ServerId, ctx: &mut C) -> Result<usize, EventError> {
        self.execute(server, ctx)
    }

    /// Discards the backlog of `server` without running any handler.
    ///
    /// Returns the number of messages dropped.
    pub fn clear_msg(&mut self, server: ServerId) -> Result<usize, EventError> {
        let entry = self
            .servers
            .get_mut(server)
            .ok_or(EventError::UnknownServer(server))?;

        let _cs = CriticalSection::enter(&*self.irq);
        let discarded = entry.queue.len();
        entry.queue.clear();
        Ok(discarded)
    }

    /// Messages waiting in the queue of `server`.
    pub fn msg_count(&self, server: ServerId) -> Result<usize, EventError> {
        Ok(self.server(server)?.queue.len())
    }

    fn index_of(&self, id: EventId) -> Result<usize, EventError> {
        self.map.index_of(id).ok_or(EventError::UnknownEvent(id))
    }

    fn server(&self, server: ServerId) -> Result<&EventServer<C>, EventError> {
        self.servers.get(server).ok_or(EventError::UnknownServer(server))
    }

    fn server_mut(&mut self, server: ServerId) -> Result<&mut EventServer<C>, EventError> {
        self.servers
            .get_mut(server)
            .ok_or(EventError::UnknownServer(server))
    }
}

impl<C> fmt::Debug for EventBus<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("map", &self.map)
            .field("servers", &self.servers.len())
            .field("live_envelopes", &self.stats.live())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::irq::testing::CountingIrq;
    use proptest::prelude::*;

    const INIT: EventId = 7;
    const ENTER: EventId = 8;
    const EXIT: EventId = 9;

    fn table() -> Vec<EventType> {
        vec![
            EventType::new(INIT, "init"),
            EventType::new(ENTER, "enter"),
            EventType::new(EXIT, "exit"),
        ]
    }

    /// Handler context recording (tag, event id, payload) per delivery.
    #[derive(Debug, Default)]
    struct Recorder {
        seen: Vec<(&'static str, EventId, Option<Vec<u8>>)>,
    }

    impl Recorder {
        fn count(&self, id: EventId) -> usize {
            self.seen.iter().filter(|(_, seen, _)| *seen == id).count()
        }
    }

    fn record(tag: &'static str) -> impl Fn(&mut Recorder, &Message) + 'static {
        move |rec: &mut Recorder, msg: &Message| {
            rec.seen.push((tag, msg.id(), msg.data().map(<[u8]>::to_vec)));
        }
    }

    fn bus() -> EventBus<Recorder> {
        EventBus::new(&table()).unwrap()
    }

    #[test]
    fn sync_fires_inside_publish_async_waits_for_execute() {
        let mut bus = bus();
        let mut rec = Recorder::default();
        let s = bus.create_server("S").unwrap();
        bus.subscribe_sync(s, EXIT, record("S")).unwrap();
        bus.subscribe(s, ENTER, record("S")).unwrap();

        bus.publish(&mut rec, ENTER).unwrap();
        assert!(rec.seen.is_empty());
        assert_eq!(bus.msg_count(s).unwrap(), 1);

        bus.publish(&mut rec, EXIT).unwrap();
        assert_eq!(rec.seen, vec![("S", EXIT, None)]);
        assert_eq!(bus.msg_count(s).unwrap(), 1);

        assert_eq!(bus.execute(s, &mut rec).unwrap(), 1);
        assert_eq!(rec.seen, vec![("S", EXIT, None), ("S", ENTER, None)]);
        assert_eq!(bus.msg_count(s).unwrap(), 0);
        assert_eq!(bus.stats().live(), 0);
    }

    #[test]
    fn mixed_modes_across_servers() {
        let mut bus = bus();
        let mut rec = Recorder::default();
        let one = bus.create_server("server1").unwrap();
        let two = bus.create_server("server2").unwrap();
        bus.subscribe_sync(one, INIT, record("one")).unwrap();
        bus.subscribe(one, ENTER, record("one")).unwrap();
        bus.subscribe(two, INIT, record("two")).unwrap();

        bus.publish(&mut rec, ENTER).unwrap();
        assert_eq!(rec.count(ENTER), 0);
        assert_eq!(bus.msg_count(one).unwrap(), 1);
        assert_eq!(bus.msg_count(two).unwrap(), 0);

        bus.publish(&mut rec, INIT).unwrap();
        assert_eq!(rec.count(INIT), 1);
        assert_eq!(bus.msg_count(one).unwrap(), 1);
        assert_eq!(bus.msg_count(two).unwrap(), 1);

        bus.execute(one, &mut rec).unwrap();
        assert_eq!(rec.count(ENTER), 1);
        assert_eq!(bus.msg_count(two).unwrap(), 1);

        bus.execute(two, &mut rec).unwrap();
        assert_eq!(rec.count(INIT), 2);
        assert_eq!(bus.stats().live(), 0);
    }

    #[test]
    fn unobserved_publish_allocates_nothing() {
        let mut bus = bus();
        let mut rec = Recorder::default();
        bus.create_server("idle").unwrap();

        bus.publish_with_param(&mut rec, INIT, b"ignored").unwrap();
        assert_eq!(bus.stats().allocated(), 0);
    }

    #[test]
    fn unknown_event_is_rejected() {
        let mut bus = bus();
        let mut rec = Recorder::default();
        let s = bus.create_server("S").unwrap();

        assert_eq!(bus.publish(&mut rec, 1), Err(EventError::UnknownEvent(1)));
        assert_eq!(
            bus.subscribe(s, 1, record("S")),
            Err(EventError::UnknownEvent(1))
        );
        assert_eq!(bus.unsubscribe(s, 1), Err(EventError::UnknownEvent(1)));
    }

    #[test]
    fn repeated_subscribe_registers_once_and_carries_payloads() {
        let mut bus = bus();
        let mut rec = Recorder::default();
        let s = bus.create_server("server1").unwrap();
        for _ in 0..3 {
            bus.subscribe(s, INIT, record("S")).unwrap();
        }
        bus.subscribe(s, EXIT, record("S")).unwrap();
        assert_eq!(bus.map().subscribers(0), &[s]);

        bus.publish_with_param(&mut rec, INIT, b"init1\0").unwrap();
        bus.publish(&mut rec, ENTER).unwrap();
        bus.publish(&mut rec, EXIT).unwrap();
        bus.publish_with_param(&mut rec, INIT, b"init2\0").unwrap();
        assert_eq!(bus.msg_count(s).unwrap(), 3);

        bus.execute(s, &mut rec).unwrap();
        assert_eq!(
            rec.seen,
            vec![
                ("S", INIT, Some(b"init1\0".to_vec())),
                ("S", EXIT, None),
                ("S", INIT, Some(b"init2\0".to_vec())),
            ]
        );
    }

    #[test]
    fn resubscribe_with_other_mode_overwrites_in_place() {
        let mut bus = bus();
        let mut rec = Recorder::default();
        let s = bus.create_server("S").unwrap();

        bus.subscribe(s, ENTER, record("async")).unwrap();
        bus.subscribe_sync(s, ENTER, record("sync")).unwrap();
        assert_eq!(bus.is_subscribed(s, ENTER).unwrap(), Some(SubscribeMode::Sync));
        assert_eq!(bus.map().subscribers(1).len(), 1);

        bus.publish(&mut rec, ENTER).unwrap();
        assert_eq!(rec.seen, vec![("sync", ENTER, None)]);
        assert_eq!(bus.msg_count(s).unwrap(), 0);
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let mut bus = bus();
        let s = bus.create_server("S").unwrap();
        bus.subscribe(s, INIT, record("S")).unwrap();

        bus.unsubscribe(s, INIT).unwrap();
        let once = (bus.is_subscribed(s, INIT).unwrap(), bus.map().subscribers(0).len());
        bus.unsubscribe(s, INIT).unwrap();
        let twice = (bus.is_subscribed(s, INIT).unwrap(), bus.map().subscribers(0).len());

        assert_eq!(once, (None, 0));
        assert_eq!(once, twice);
    }

    #[test]
    fn unsubscribe_after_enqueue_skips_delivery_but_consumes() {
        let mut bus = bus();
        let mut rec = Recorder::default();
        let s = bus.create_server("S").unwrap();
        bus.subscribe(s, ENTER, record("S")).unwrap();
        bus.subscribe(s, EXIT, record("S")).unwrap();

        bus.publish(&mut rec, ENTER).unwrap();
        bus.publish(&mut rec, EXIT).unwrap();
        bus.unsubscribe(s, ENTER).unwrap();

        assert_eq!(bus.execute(s, &mut rec).unwrap(), 1);
        assert_eq!(rec.seen, vec![("S", EXIT, None)]);
        assert_eq!(bus.msg_count(s).unwrap(), 0);
        assert_eq!(bus.stats().live(), 0);
    }

    #[test]
    fn clear_msg_discards_without_callbacks() {
        let mut bus = bus();
        let mut rec = Recorder::default();
        let s = bus.create_server("server1").unwrap();
        for id in [INIT, ENTER, EXIT] {
            bus.subscribe(s, id, record("S")).unwrap();
        }

        for id in [ENTER, EXIT, ENTER, EXIT] {
            bus.publish(&mut rec, id).unwrap();
        }
        assert_eq!(bus.clear_msg(s).unwrap(), 4);
        assert!(rec.seen.is_empty());
        assert_eq!(bus.stats().live(), 0);

        for id in [ENTER, EXIT, ENTER, EXIT] {
            bus.publish(&mut rec, id).unwrap();
        }
        bus.execute(s, &mut rec).unwrap();
        assert_eq!(rec.count(INIT), 0);
        assert_eq!(rec.count(ENTER), 2);
        assert_eq!(rec.count(EXIT), 2);
    }

    #[test]
    fn stopped_server_is_skipped() {
        let mut bus = bus();
        let mut rec = Recorder::default();
        let s = bus.create_server("S").unwrap();
        bus.subscribe(s, ENTER, record("S")).unwrap();
        bus.subscribe_sync(s, EXIT, record("S")).unwrap();

        bus.stop_server(s).unwrap();
        bus.publish(&mut rec, ENTER).unwrap();
        bus.publish(&mut rec, EXIT).unwrap();
        assert_eq!(bus.msg_count(s).unwrap(), 0);
        assert!(rec.seen.is_empty());
        assert_eq!(bus.stats().live(), 0);

        bus.start_server(s).unwrap();
        bus.publish(&mut rec, ENTER).unwrap();
        assert_eq!(bus.msg_count(s).unwrap(), 1);
    }

    #[test]
    fn destroy_server_keeps_shared_envelopes_alive() {
        let mut bus = bus();
        let mut rec = Recorder::default();
        let one = bus.create_server("one").unwrap();
        let two = bus.create_server("two").unwrap();
        bus.subscribe(one, INIT, record("one")).unwrap();
        bus.subscribe(two, INIT, record("two")).unwrap();
        bus.subscribe(one, EXIT, record("one")).unwrap();

        bus.publish_with_param(&mut rec, INIT, b"shared").unwrap();
        bus.publish(&mut rec, EXIT).unwrap();
        assert_eq!(bus.stats().live(), 2);

        bus.destroy_server(one).unwrap();
        // EXIT was only queued for `one`
        assert_eq!(bus.stats().live(), 1);
        assert!(bus.map().subscribers(0).iter().all(|&id| id != one));

        bus.execute(two, &mut rec).unwrap();
        assert_eq!(rec.seen, vec![("two", INIT, Some(b"shared".to_vec()))]);
        assert_eq!(bus.stats().live(), 0);
        assert_eq!(bus.destroy_server(one), Err(EventError::UnknownServer(one)));
    }

    #[test]
    fn dropping_bus_releases_queued_envelopes() {
        let stats;
        {
            let mut bus = bus();
            let mut rec = Recorder::default();
            let s = bus.create_server("S").unwrap();
            bus.subscribe(s, INIT, record("S")).unwrap();
            bus.publish(&mut rec, INIT).unwrap();
            bus.publish(&mut rec, INIT).unwrap();
            stats = Rc::clone(bus.stats());
            assert_eq!(stats.live(), 2);
        }
        assert_eq!(stats.allocated(), 2);
        assert_eq!(stats.released(), 2);
    }

    #[test]
    fn server_names_are_truncated() {
        let config = BusConfig {
            max_servers: 2,
            name_capacity: 16,
        };
        let mut bus: EventBus<Recorder> =
            EventBus::with_config(&table(), config, Rc::new(NoInterrupts)).unwrap();
        let s = bus.create_server("123456789012345678901234567890").unwrap();
        assert_eq!(bus.server_name(s).unwrap(), "123456789012345");
    }

    #[test]
    fn server_limit_is_reported() {
        let config = BusConfig {
            max_servers: 1,
            ..BusConfig::default()
        };
        let mut bus: EventBus<Recorder> =
            EventBus::with_config(&table(), config, Rc::new(NoInterrupts)).unwrap();
        let s = bus.create_server("a").unwrap();
        assert_eq!(bus.create_server("b"), Err(EventError::ServerLimit(1)));

        bus.destroy_server(s).unwrap();
        assert_eq!(bus.create_server("c"), Ok(s));
    }

    #[test]
    fn zero_server_capacity_is_rejected() {
        let config = BusConfig {
            max_servers: 0,
            ..BusConfig::default()
        };
        let result = EventBus::<Recorder>::with_config(&table(), config, Rc::new(NoInterrupts));
        assert!(matches!(result, Err(EventError::NoServerCapacity)));
    }

    #[test]
    fn event_names_resolve() {
        let bus = bus();
        assert_eq!(bus.event_name(ENTER), Some("enter"));
        assert_eq!(bus.event_name(42), None);
        assert_eq!(bus.event_count(), 3);
    }

    #[test]
    fn queue_operations_are_masked() {
        let irq = Rc::new(CountingIrq::default());
        let mut bus: EventBus<Recorder> =
            EventBus::with_config(&table(), BusConfig::default(), irq.clone()).unwrap();
        let mut rec = Recorder::default();
        let s = bus.create_server("S").unwrap();
        bus.subscribe(s, INIT, record("S")).unwrap();

        bus.publish(&mut rec, INIT).unwrap();
        let after_publish = irq.entered.get();
        bus.execute(s, &mut rec).unwrap();

        assert_eq!(after_publish, 1);
        // one pop with a message, one that finds the queue empty
        assert_eq!(irq.entered.get(), 3);
        assert_eq!(irq.depth.get(), 0);
    }

    proptest! {
        #[test]
        fn async_delivery_is_fifo(ids in prop::collection::vec(prop::sample::select(vec![INIT, ENTER, EXIT]), 0..64)) {
            let mut bus = bus();
            let mut rec = Recorder::default();
            let s = bus.create_server("S").unwrap();
            for id in [INIT, ENTER, EXIT] {
                bus.subscribe(s, id, record("S")).unwrap();
            }

            for &id in &ids {
                bus.publish(&mut rec, id).unwrap();
            }
            prop_assert_eq!(bus.msg_count(s).unwrap(), ids.len());

            bus.execute(s, &mut rec).unwrap();
            let delivered: Vec<EventId> = rec.seen.iter().map(|(_, id, _)| *id).collect();
            prop_assert_eq!(delivered, ids);
        }

        #[test]
        fn envelopes_freed_once_after_all_receivers_drain(receivers in 0usize..6, publishes in 1usize..8) {
            let mut bus = bus();
            let mut rec = Recorder::default();
            let servers: Vec<_> = (0..receivers)
                .map(|n| {
                    let s = bus.create_server(&format!("s{n}")).unwrap();
                    bus.subscribe(s, INIT, record("S")).unwrap();
                    s
                })
                .collect();

            for _ in 0..publishes {
                bus.publish_with_param(&mut rec, INIT, b"payload").unwrap();
            }
            let expected = if receivers == 0 { 0 } else { publishes };
            prop_assert_eq!(bus.stats().allocated(), expected);

            for (drained, &s) in servers.iter().enumerate() {
                prop_assert_eq!(bus.stats().released(), 0, "released before receiver {} drained", drained);
                bus.execute(s, &mut rec).unwrap();
            }
            prop_assert_eq!(bus.stats().released(), expected);
            prop_assert_eq!(rec.seen.len(), receivers * publishes);
        }
    }
}
