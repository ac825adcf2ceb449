//! Reconnecting event-stream client.
//!
//! The client is sans-IO at the edges: a [`Dialer`] produces a [`Link`] that
//! moves text frames, and every time-dependent call takes `now_ms`. The
//! terminal crate plugs in a WebSocket dialer; tests and the offline demo use
//! [`LoopbackDialer`].
//!
//! Behavior:
//! - A close (remote, write error, or failed dial) schedules exactly one
//!   reconnect after the fixed delay; a second close before it fires
//!   reschedules rather than double-firing. Retries never stop.
//! - Sends while not connected are dropped with a warning. There is no queue.
//! - Content updates are debounced per document and suppressed when equal to
//!   the last value actually sent for that document.

use crate::config::TimingConfig;
use crate::error::{ProtocolError, TransportError};
use crate::events::{EventBus, EventKind, SubscriptionId, TransportEvent};
use crate::protocol::{timestamp_now, Inbound, Outbound};
use crate::timer::Deferred;
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use tracing::{debug, error, info, warn};

/// Result of polling a link for inbound data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkPoll {
    /// Nothing waiting
    Idle,
    /// One text frame
    Message(String),
    /// The peer closed the link
    Closed,
}

/// An open, non-blocking text link.
pub trait Link {
    /// Write one text frame.
    fn send_text(&mut self, text: &str) -> Result<(), TransportError>;

    /// Read one frame without blocking.
    fn poll_recv(&mut self) -> LinkPoll;

    /// Close the link. Errors are ignored.
    fn close(&mut self) {}
}

/// Opens links.
pub trait Dialer {
    /// Link type produced.
    type Link: Link;

    /// Open a link to `url`.
    fn dial(&mut self, url: &str) -> Result<Self::Link, TransportError>;
}

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// Not connected; a reconnect may be pending
    #[default]
    Disconnected,
    /// Dial in progress
    Connecting,
    /// Link open
    Connected,
}

impl ConnectionState {
    /// Check if messages can be sent.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

// =============================================================================
// Content debounce
// =============================================================================

#[derive(Debug, Clone)]
struct PendingContent {
    content: String,
    metadata: Map<String, Value>,
    timer: Deferred,
}

/// A debounced content update ready to send.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadyContent {
    /// Document key
    pub document: String,
    /// Content
    pub content: String,
    /// Extra envelope fields
    pub metadata: Map<String, Value>,
}

/// Per-document debounce with last-sent suppression.
#[derive(Debug, Clone, Default)]
pub struct ContentDebouncer {
    delay_ms: u64,
    pending: HashMap<String, PendingContent>,
    last_sent: HashMap<String, String>,
}

impl ContentDebouncer {
    /// Create a debouncer requiring `delay_ms` of quiescence.
    #[must_use]
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            ..Self::default()
        }
    }

    /// Queue `content` for `document`, replacing any pending value and
    /// restarting its timer. A value equal to the last one sent cancels the
    /// pending value instead. Returns whether something is now pending.
    pub fn submit(
        &mut self,
        document: &str,
        content: &str,
        metadata: Map<String, Value>,
        now_ms: u64,
    ) -> bool {
        if self.last_sent.get(document).map(String::as_str) == Some(content) {
            self.pending.remove(document);
            return false;
        }
        let mut timer = Deferred::new("content-debounce", self.delay_ms);
        timer.schedule(now_ms);
        self.pending.insert(
            document.to_string(),
            PendingContent {
                content: content.to_string(),
                metadata,
                timer,
            },
        );
        true
    }

    /// Take every value whose quiet period has elapsed.
    pub fn take_due(&mut self, now_ms: u64) -> Vec<ReadyContent> {
        let mut due: Vec<String> = self
            .pending
            .iter_mut()
            .filter_map(|(doc, p)| p.timer.fire(now_ms).then(|| doc.clone()))
            .collect();
        due.sort();
        due.into_iter()
            .filter_map(|document| {
                let p = self.pending.remove(&document)?;
                let unchanged =
                    self.last_sent.get(&document).map(String::as_str) == Some(p.content.as_str());
                (!unchanged).then_some(ReadyContent {
                    document,
                    content: p.content,
                    metadata: p.metadata,
                })
            })
            .collect()
    }

    /// Record that `content` went out for `document`.
    pub fn mark_sent(&mut self, document: &str, content: &str) {
        self.last_sent
            .insert(document.to_string(), content.to_string());
    }

    /// Last value sent for `document`.
    #[must_use]
    pub fn last_sent(&self, document: &str) -> Option<&str> {
        self.last_sent.get(document).map(String::as_str)
    }

    /// Whether `document` has a value waiting.
    #[must_use]
    pub fn is_pending(&self, document: &str) -> bool {
        self.pending.contains_key(document)
    }

    /// Number of documents with a value waiting.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Drop every pending value.
    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }
}

// =============================================================================
// Client
// =============================================================================

/// Reconnecting client for the event server.
pub struct TransportClient<D: Dialer> {
    url: String,
    dialer: D,
    link: Option<D::Link>,
    state: ConnectionState,
    reconnect: Deferred,
    debouncer: ContentDebouncer,
    bus: EventBus<TransportEvent>,
    link_broken: bool,
    dial_attempts: u64,
    dropped_sends: u64,
    shut_down: bool,
}

impl<D: Dialer> TransportClient<D> {
    /// Create a disconnected client. Call [`Self::connect`] to open the link.
    pub fn new(url: impl Into<String>, timing: &TimingConfig, dialer: D) -> Self {
        Self {
            url: url.into(),
            dialer,
            link: None,
            state: ConnectionState::Disconnected,
            reconnect: Deferred::new("reconnect", timing.reconnect_delay_ms),
            debouncer: ContentDebouncer::new(timing.debounce_ms),
            bus: EventBus::new(),
            link_broken: false,
            dial_attempts: 0,
            dropped_sends: 0,
            shut_down: false,
        }
    }

    /// Dial now. A failed dial counts as a close.
    pub fn connect(&mut self, now_ms: u64) -> Vec<TransportEvent> {
        let mut events = Vec::new();
        if self.shut_down {
            return events;
        }
        self.reconnect.cancel();
        if let Some(mut old) = self.link.take() {
            old.close();
        }
        self.state = ConnectionState::Connecting;
        self.dial_attempts += 1;
        info!(url = %self.url, attempt = self.dial_attempts, "connecting");

        match self.dialer.dial(&self.url) {
            Ok(link) => {
                self.link = Some(link);
                self.link_broken = false;
                self.state = ConnectionState::Connected;
                info!(url = %self.url, "connected");
                self.publish(
                    TransportEvent::Connected {
                        session_id: None,
                        current_state: None,
                    },
                    &mut events,
                );
            }
            Err(e) => {
                warn!(error = %e, "connect failed");
                self.handle_close(now_ms, &mut events);
            }
        }
        events
    }

    /// Report that the link closed (remote close or error).
    pub fn notify_closed(&mut self, now_ms: u64) -> Vec<TransportEvent> {
        let mut events = Vec::new();
        if !self.shut_down {
            self.handle_close(now_ms, &mut events);
        }
        events
    }

    fn handle_close(&mut self, now_ms: u64, events: &mut Vec<TransportEvent>) {
        if let Some(mut link) = self.link.take() {
            link.close();
        }
        self.link_broken = false;
        self.state = ConnectionState::Disconnected;
        self.reconnect.schedule(now_ms);
        warn!(
            retry_in_ms = self.reconnect.delay_ms(),
            "disconnected, reconnect scheduled"
        );
        self.publish(TransportEvent::Disconnected, events);
    }

    fn publish(&mut self, event: TransportEvent, events: &mut Vec<TransportEvent>) {
        self.bus.emit(&event);
        events.push(event);
    }

    /// Run timers, drain inbound frames and flush due content updates.
    /// Returns events in arrival order.
    pub fn poll(&mut self, now_ms: u64) -> Vec<TransportEvent> {
        let mut events = Vec::new();
        if self.shut_down {
            return events;
        }

        if self.reconnect.fire(now_ms) {
            events.extend(self.connect(now_ms));
        }

        let mut closed = self.link_broken;
        while let Some(link) = self.link.as_mut() {
            match link.poll_recv() {
                LinkPoll::Idle => break,
                LinkPoll::Closed => {
                    closed = true;
                    break;
                }
                LinkPoll::Message(text) => {
                    if let Some(event) = Self::decode(&text) {
                        self.publish(event, &mut events);
                    }
                }
            }
        }
        if closed {
            self.handle_close(now_ms, &mut events);
        }

        for ready in self.debouncer.take_due(now_ms) {
            let message =
                Outbound::content_update(&ready.document, &ready.content, ready.metadata, timestamp_now());
            if self.send(&message) {
                self.debouncer.mark_sent(&ready.document, &ready.content);
            }
        }
        events
    }

    fn decode(text: &str) -> Option<TransportEvent> {
        match Inbound::parse(text) {
            Ok(message) => {
                debug!(kind = message.kind(), "received");
                Some(TransportEvent::from_inbound(message))
            }
            Err(ProtocolError::UnknownType(kind)) => {
                warn!(%kind, "unknown message type, dropped");
                None
            }
            Err(e) => {
                warn!(error = %e, "undecodable message, dropped");
                None
            }
        }
    }

    /// Send immediately. Dropped with a warning unless connected.
    pub fn send(&mut self, message: &Outbound) -> bool {
        if !self.state.is_active() || self.link.is_none() {
            warn!(kind = message.kind(), "not connected, message dropped");
            self.dropped_sends += 1;
            return false;
        }
        let text = match message.to_json() {
            Ok(text) => text,
            Err(e) => {
                error!(kind = message.kind(), error = %e, "encode failed");
                return false;
            }
        };
        let result = match self.link.as_mut() {
            Some(link) => link.send_text(&text),
            None => Err(TransportError::Closed),
        };
        match result {
            Ok(()) => {
                debug!(kind = message.kind(), "sent");
                true
            }
            Err(e) => {
                warn!(kind = message.kind(), error = %e, "send failed, closing link");
                self.link_broken = true;
                self.state = ConnectionState::Disconnected;
                self.dropped_sends += 1;
                false
            }
        }
    }

    /// Queue a debounced content update for `document`.
    pub fn send_content_update(
        &mut self,
        document: &str,
        content: &str,
        metadata: Map<String, Value>,
        now_ms: u64,
    ) -> bool {
        self.debouncer.submit(document, content, metadata, now_ms)
    }

    /// Register a handler for events of `kind`.
    pub fn subscribe<F>(&mut self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: FnMut(&TransportEvent) + 'static,
    {
        self.bus.subscribe(kind, handler)
    }

    /// Remove a handler.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Close the link and cancel every timer. The client stays idle afterwards.
    pub fn shutdown(&mut self) {
        self.shut_down = true;
        self.reconnect.cancel();
        self.debouncer.cancel_all();
        if let Some(mut link) = self.link.take() {
            link.close();
        }
        self.state = ConnectionState::Disconnected;
        info!("transport shut down");
    }

    /// Connection state.
    #[must_use]
    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    /// Check if connected.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.state.is_active()
    }

    /// Whether a reconnect is scheduled.
    #[must_use]
    pub const fn reconnect_pending(&self) -> bool {
        self.reconnect.is_pending()
    }

    /// Dial attempts so far.
    #[must_use]
    pub const fn dial_attempts(&self) -> u64 {
        self.dial_attempts
    }

    /// Messages dropped because the link was down.
    #[must_use]
    pub const fn dropped_sends(&self) -> u64 {
        self.dropped_sends
    }

    /// Content debounce state.
    #[must_use]
    pub const fn debouncer(&self) -> &ContentDebouncer {
        &self.debouncer
    }

    /// Whether [`Self::shutdown`] has been called.
    #[must_use]
    pub const fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Target URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl<D: Dialer> std::fmt::Debug for TransportClient<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportClient")
            .field("url", &self.url)
            .field("state", &self.state)
            .field("reconnect", &self.reconnect)
            .field("dial_attempts", &self.dial_attempts)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Loopback
// =============================================================================

#[derive(Debug, Default)]
struct LoopbackState {
    inbound: VecDeque<String>,
    sent: Vec<String>,
    dials: u64,
    failing_dials: u64,
    fail_sends: bool,
    remote_closed: bool,
    open: bool,
}

/// In-process dialer whose "server" is driven through a [`LoopbackHandle`].
///
/// Used for offline demo mode and for exercising the client deterministically.
#[derive(Debug, Clone, Default)]
pub struct LoopbackDialer {
    state: Rc<RefCell<LoopbackState>>,
}

/// Server side of a loopback connection.
#[derive(Debug, Clone)]
pub struct LoopbackHandle {
    state: Rc<RefCell<LoopbackState>>,
}

/// Client side of a loopback connection.
#[derive(Debug)]
pub struct LoopbackLink {
    state: Rc<RefCell<LoopbackState>>,
}

impl LoopbackDialer {
    /// Create a dialer and the handle that controls it.
    #[must_use]
    pub fn new() -> (Self, LoopbackHandle) {
        let dialer = Self::default();
        let handle = LoopbackHandle {
            state: Rc::clone(&dialer.state),
        };
        (dialer, handle)
    }
}

impl Dialer for LoopbackDialer {
    type Link = LoopbackLink;

    fn dial(&mut self, url: &str) -> Result<LoopbackLink, TransportError> {
        let mut state = self.state.borrow_mut();
        state.dials += 1;
        if state.failing_dials > 0 {
            state.failing_dials -= 1;
            return Err(TransportError::Dial {
                url: url.to_string(),
                reason: "loopback refused".to_string(),
            });
        }
        state.remote_closed = false;
        state.open = true;
        Ok(LoopbackLink {
            state: Rc::clone(&self.state),
        })
    }
}

impl Link for LoopbackLink {
    fn send_text(&mut self, text: &str) -> Result<(), TransportError> {
        let mut state = self.state.borrow_mut();
        if state.fail_sends {
            return Err(TransportError::Send("loopback write failed".to_string()));
        }
        if !state.open {
            return Err(TransportError::Closed);
        }
        state.sent.push(text.to_string());
        Ok(())
    }

    fn poll_recv(&mut self) -> LinkPoll {
        let mut state = self.state.borrow_mut();
        if let Some(text) = state.inbound.pop_front() {
            return LinkPoll::Message(text);
        }
        if state.remote_closed {
            state.open = false;
            return LinkPoll::Closed;
        }
        LinkPoll::Idle
    }

    fn close(&mut self) {
        self.state.borrow_mut().open = false;
    }
}

impl LoopbackHandle {
    /// Queue a frame for the client.
    pub fn push_text(&self, text: impl Into<String>) {
        self.state.borrow_mut().inbound.push_back(text.into());
    }

    /// Queue a message for the client.
    pub fn push(&self, message: &Inbound) {
        if let Ok(text) = serde_json::to_string(message) {
            self.push_text(text);
        }
    }

    /// Close the link from the server side.
    pub fn close_remote(&self) {
        self.state.borrow_mut().remote_closed = true;
    }

    /// Refuse the next `n` dials.
    pub fn fail_next_dials(&self, n: u64) {
        self.state.borrow_mut().failing_dials = n;
    }

    /// Make every write fail.
    pub fn fail_sends(&self, fail: bool) {
        self.state.borrow_mut().fail_sends = fail;
    }

    /// Frames written by the client so far.
    #[must_use]
    pub fn sent(&self) -> Vec<String> {
        self.state.borrow().sent.clone()
    }

    /// Frames written by the client, decoded as JSON.
    #[must_use]
    pub fn sent_json(&self) -> Vec<Value> {
        self.state
            .borrow()
            .sent
            .iter()
            .filter_map(|s| serde_json::from_str(s).ok())
            .collect()
    }

    /// Dial attempts seen.
    #[must_use]
    pub fn dials(&self) -> u64 {
        self.state.borrow().dials
    }

    /// Whether a client link is currently open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state.borrow().open
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biometrics::CognitiveState;

    fn client() -> (TransportClient<LoopbackDialer>, LoopbackHandle) {
        let (dialer, handle) = LoopbackDialer::new();
        let client = TransportClient::new("ws://loopback/ws", &TimingConfig::default(), dialer);
        (client, handle)
    }

    fn connected() -> (TransportClient<LoopbackDialer>, LoopbackHandle) {
        let (mut client, handle) = client();
        client.connect(0);
        (client, handle)
    }

    #[test]
    fn test_connect_emits_connected() {
        let (mut client, handle) = client();
        let events = client.connect(0);
        assert_eq!(
            events,
            vec![TransportEvent::Connected {
                session_id: None,
                current_state: None
            }]
        );
        assert!(client.is_connected());
        assert!(handle.is_open());
    }

    #[test]
    fn test_failed_dial_schedules_single_reconnect() {
        let (mut client, handle) = client();
        handle.fail_next_dials(1);
        let events = client.connect(0);
        assert_eq!(events, vec![TransportEvent::Disconnected]);
        assert_eq!(client.state(), ConnectionState::Disconnected);
        assert!(client.reconnect_pending());

        client.poll(2999);
        assert_eq!(handle.dials(), 1);
        let events = client.poll(3000);
        assert_eq!(handle.dials(), 2);
        assert!(client.is_connected());
        assert!(matches!(events[0], TransportEvent::Connected { .. }));
        client.poll(10_000);
        assert_eq!(handle.dials(), 2);
    }

    #[test]
    fn test_second_close_reschedules_instead_of_double_firing() {
        let (mut client, handle) = connected();
        client.notify_closed(0);
        client.notify_closed(1000);
        client.poll(3000);
        assert_eq!(handle.dials(), 1);
        client.poll(4000);
        assert_eq!(handle.dials(), 2);
        client.poll(7000);
        assert_eq!(handle.dials(), 2);
    }

    #[test]
    fn test_retries_forever_at_fixed_delay() {
        let (mut client, handle) = client();
        handle.fail_next_dials(5);
        client.connect(0);
        for attempt in 1..=5u64 {
            client.poll(attempt * 3000);
        }
        assert_eq!(handle.dials(), 6);
        assert!(client.is_connected());
    }

    #[test]
    fn test_remote_close_detected_on_poll() {
        let (mut client, handle) = connected();
        handle.close_remote();
        let events = client.poll(500);
        assert_eq!(events, vec![TransportEvent::Disconnected]);
        client.poll(3500);
        assert!(client.is_connected());
    }

    #[test]
    fn test_inbound_decoded_in_order_and_bad_frames_dropped() {
        let (mut client, handle) = connected();
        handle.push_text(r#"{"type":"biometric_update","heartRate":88}"#);
        handle.push_text("garbage");
        handle.push_text(r#"{"type":"weather"}"#);
        handle.push_text(r#"{"type":"sleep_mode"}"#);
        handle.push(&Inbound::StateChange {
            from: None,
            to: CognitiveState::Wired,
            reason: None,
            estimated_stress: None,
        });
        handle.push_text(r#"{"type":"connection_established","session_id":"s1"}"#);

        let events = client.poll(10);
        assert_eq!(events.len(), 3);
        assert!(matches!(&events[0], TransportEvent::Message(Inbound::BiometricUpdate(u)) if u.heart_rate == Some(88.0)));
        assert!(matches!(&events[1], TransportEvent::Message(Inbound::StateChange { to: CognitiveState::Wired, .. })));
        assert!(matches!(&events[2], TransportEvent::Connected { session_id: Some(s), .. } if s == "s1"));
        assert!(client.is_connected());
    }

    #[test]
    fn test_send_while_disconnected_is_dropped() {
        let (mut client, handle) = client();
        assert!(!client.send(&Outbound::mock_state(CognitiveState::Stressed)));
        assert_eq!(client.dropped_sends(), 1);
        client.connect(0);
        assert!(client.send(&Outbound::mock_state(CognitiveState::Stressed)));
        assert_eq!(handle.sent_json().len(), 1);
        assert_eq!(handle.sent_json()[0]["state"], 2);
    }

    #[test]
    fn test_send_error_closes_on_next_poll() {
        let (mut client, handle) = connected();
        handle.fail_sends(true);
        assert!(!client.send(&Outbound::BleDisconnected));
        assert!(!client.is_connected());
        let events = client.poll(100);
        assert_eq!(events, vec![TransportEvent::Disconnected]);
        assert!(client.reconnect_pending());
    }

    #[test]
    fn test_debounce_coalesces_to_last_value() {
        let (mut client, handle) = connected();
        client.send_content_update("editor", "A", Map::new(), 0);
        client.send_content_update("editor", "B", Map::new(), 500);
        client.send_content_update("editor", "C", Map::new(), 1000);
        client.poll(2499);
        assert!(handle.sent().is_empty());
        client.poll(2500);
        let sent = handle.sent_json();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0]["type"], "content_update");
        assert_eq!(sent[0]["app_type"], "editor");
        assert_eq!(sent[0]["content"], "C");
    }

    #[test]
    fn test_debounce_suppresses_repeat_of_last_sent() {
        let (mut client, handle) = connected();
        client.send_content_update("notes", "A", Map::new(), 0);
        client.poll(1500);
        assert_eq!(handle.sent().len(), 1);
        assert!(!client.send_content_update("notes", "A", Map::new(), 2000));
        client.poll(10_000);
        assert_eq!(handle.sent().len(), 1);
    }

    #[test]
    fn test_debounce_reverting_to_last_sent_cancels_pending() {
        let (mut client, handle) = connected();
        client.send_content_update("notes", "A", Map::new(), 0);
        client.poll(1500);
        client.send_content_update("notes", "B", Map::new(), 2000);
        client.send_content_update("notes", "A", Map::new(), 2100);
        client.poll(10_000);
        assert_eq!(handle.sent().len(), 1);
    }

    #[test]
    fn test_debounce_is_per_document() {
        let (mut client, handle) = connected();
        client.send_content_update("editor", "x", Map::new(), 0);
        client.send_content_update("notes", "y", Map::new(), 100);
        client.poll(1600);
        assert_eq!(handle.sent().len(), 2);
    }

    #[test]
    fn test_content_dropped_while_disconnected_is_not_marked_sent() {
        let (mut client, handle) = client();
        client.send_content_update("notes", "A", Map::new(), 0);
        client.poll(1500);
        assert_eq!(client.debouncer().last_sent("notes"), None);
        client.connect(2000);
        assert!(client.send_content_update("notes", "A", Map::new(), 2000));
        client.poll(3500);
        assert_eq!(handle.sent().len(), 1);
    }

    #[test]
    fn test_subscribers_see_events() {
        let (mut client, handle) = client();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        let id = client.subscribe(EventKind::SleepMode, move |e| log.borrow_mut().push(e.clone()));
        client.connect(0);
        handle.push(&Inbound::SleepMode { active: true });
        client.poll(1);
        assert_eq!(seen.borrow().len(), 1);
        assert!(client.unsubscribe(id));
        handle.push(&Inbound::SleepMode { active: false });
        client.poll(2);
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn test_shutdown_cancels_timers_and_pending_content() {
        let (mut client, handle) = connected();
        client.send_content_update("notes", "draft", Map::new(), 0);
        client.notify_closed(10);
        assert!(client.reconnect_pending());
        client.shutdown();
        assert!(!client.reconnect_pending());
        assert_eq!(client.debouncer().pending_count(), 0);
        assert!(client.poll(1_000_000).is_empty());
        assert!(client.connect(1_000_001).is_empty());
        assert_eq!(handle.dials(), 1);
        assert!(client.is_shut_down());
    }
}
