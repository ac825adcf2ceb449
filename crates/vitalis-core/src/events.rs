//! Typed publish/subscribe.
//!
//! An [`EventBus`] is owned by whatever produces events (the transport client
//! owns one); consumers register handlers keyed by the event's kind.

use crate::biometrics::CognitiveState;
use crate::protocol::Inbound;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// An event that can be routed by kind.
pub trait Event {
    /// Routing key.
    type Kind: Copy + Eq + Hash + fmt::Debug;

    /// Key for this event.
    fn kind(&self) -> Self::Kind;
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler<E> = Box<dyn FnMut(&E)>;

/// Handlers keyed by event kind, invoked in subscription order.
pub struct EventBus<E: Event> {
    next_id: u64,
    handlers: HashMap<E::Kind, Vec<(SubscriptionId, Handler<E>)>>,
}

impl<E: Event> EventBus<E> {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: 0,
            handlers: HashMap::new(),
        }
    }

    /// Register `handler` for events of `kind`.
    pub fn subscribe<F>(&mut self, kind: E::Kind, handler: F) -> SubscriptionId
    where
        F: FnMut(&E) + 'static,
    {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.handlers
            .entry(kind)
            .or_default()
            .push((id, Box::new(handler)));
        id
    }

    /// Remove a handler. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        for handlers in self.handlers.values_mut() {
            if let Some(pos) = handlers.iter().position(|(h, _)| *h == id) {
                handlers.remove(pos);
                return true;
            }
        }
        false
    }

    /// Deliver `event` to every handler for its kind. Returns how many ran.
    pub fn emit(&mut self, event: &E) -> usize {
        self.handlers.get_mut(&event.kind()).map_or(0, |handlers| {
            for (_, handler) in handlers.iter_mut() {
                handler(event);
            }
            handlers.len()
        })
    }

    /// Number of handlers registered for `kind`.
    #[must_use]
    pub fn handler_count(&self, kind: E::Kind) -> usize {
        self.handlers.get(&kind).map_or(0, Vec::len)
    }

    /// Drop every handler.
    pub fn clear(&mut self) {
        self.handlers.clear();
    }
}

impl<E: Event> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<_, _> = self.handlers.iter().map(|(k, v)| (k, v.len())).collect();
        f.debug_struct("EventBus").field("handlers", &counts).finish()
    }
}

/// Kinds of [`TransportEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Link opened or server acknowledged the session
    Connected,
    /// Link lost
    Disconnected,
    /// `biometric_update`
    BiometricUpdate,
    /// `state_change`
    StateChange,
    /// `intervention`
    Intervention,
    /// `sleep_mode`
    SleepMode,
    /// `plant_update`
    PlantUpdate,
    /// `app_focus_change`
    AppFocusChange,
}

/// Everything the transport client reports.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// Link opened, or the server confirmed the session
    Connected {
        /// Session id from the server handshake
        session_id: Option<String>,
        /// Server's view of the current state
        current_state: Option<CognitiveState>,
    },
    /// Link lost; a reconnect is scheduled
    Disconnected,
    /// A decoded server message
    Message(Inbound),
}

impl TransportEvent {
    /// Wrap a decoded message. The handshake acknowledgement becomes `Connected`.
    #[must_use]
    pub fn from_inbound(message: Inbound) -> Self {
        match message {
            Inbound::ConnectionEstablished {
                session_id,
                current_state,
            } => Self::Connected {
                session_id,
                current_state: current_state.as_deref().and_then(|s| s.parse().ok()),
            },
            other => Self::Message(other),
        }
    }
}

impl Event for TransportEvent {
    type Kind = EventKind;

    fn kind(&self) -> EventKind {
        match self {
            Self::Connected { .. } | Self::Message(Inbound::ConnectionEstablished { .. }) => {
                EventKind::Connected
            }
            Self::Disconnected => EventKind::Disconnected,
            Self::Message(Inbound::BiometricUpdate(_)) => EventKind::BiometricUpdate,
            Self::Message(Inbound::StateChange { .. }) => EventKind::StateChange,
            Self::Message(Inbound::Intervention(_)) => EventKind::Intervention,
            Self::Message(Inbound::SleepMode { .. }) => EventKind::SleepMode,
            Self::Message(Inbound::PlantUpdate { .. }) => EventKind::PlantUpdate,
            Self::Message(Inbound::AppFocusChange { .. }) => EventKind::AppFocusChange,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_handlers_run_in_order_for_their_kind() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::<TransportEvent>::new();
        let log = Rc::clone(&seen);
        bus.subscribe(EventKind::Disconnected, move |_| log.borrow_mut().push("a"));
        let log = Rc::clone(&seen);
        bus.subscribe(EventKind::Disconnected, move |_| log.borrow_mut().push("b"));
        let log = Rc::clone(&seen);
        bus.subscribe(EventKind::SleepMode, move |_| log.borrow_mut().push("sleep"));

        assert_eq!(bus.emit(&TransportEvent::Disconnected), 2);
        assert_eq!(*seen.borrow(), vec!["a", "b"]);
    }

    #[test]
    fn test_unsubscribe() {
        let count = Rc::new(RefCell::new(0));
        let mut bus = EventBus::<TransportEvent>::new();
        let c = Rc::clone(&count);
        let id = bus.subscribe(EventKind::Disconnected, move |_| *c.borrow_mut() += 1);
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        assert_eq!(bus.emit(&TransportEvent::Disconnected), 0);
        assert_eq!(*count.borrow(), 0);
        assert_eq!(bus.handler_count(EventKind::Disconnected), 0);
    }

    #[test]
    fn test_connection_established_maps_to_connected() {
        let event = TransportEvent::from_inbound(Inbound::ConnectionEstablished {
            session_id: Some("abc".to_string()),
            current_state: Some("WIRED".to_string()),
        });
        assert_eq!(
            event,
            TransportEvent::Connected {
                session_id: Some("abc".to_string()),
                current_state: Some(CognitiveState::Wired),
            }
        );
        assert_eq!(event.kind(), EventKind::Connected);
    }

    #[test]
    fn test_message_kinds() {
        let event = TransportEvent::from_inbound(Inbound::SleepMode { active: true });
        assert_eq!(event.kind(), EventKind::SleepMode);
        let event = TransportEvent::from_inbound(Inbound::PlantUpdate {
            health: None,
            delta: Some(-5.0),
        });
        assert_eq!(event.kind(), EventKind::PlantUpdate);
    }

    #[test]
    fn test_debug_lists_counts() {
        let mut bus = EventBus::<TransportEvent>::new();
        bus.subscribe(EventKind::Connected, |_| {});
        assert!(format!("{bus:?}").contains("Connected"));
        bus.clear();
        assert_eq!(bus.handler_count(EventKind::Connected), 0);
    }
}
