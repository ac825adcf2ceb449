//! The engine context.
//!
//! One [`Engine`] is built at startup and passed to whatever drives the frame
//! loop. It owns the transport client and every model, applies inbound events
//! in arrival order, and reports what changed as [`EngineEvent`]s so that
//! presenters can react (flash on state change, shake on a critical
//! intervention) without reaching into the transport.

use crate::biometrics::{BiometricSample, CognitiveState, StateModel};
use crate::config::EngineConfig;
use crate::events::TransportEvent;
use crate::interventions::{Intervention, InterventionBubble, InterventionLog};
use crate::plant::PlantHealth;
use crate::protocol::{timestamp_now, Inbound, Outbound};
use crate::sensor::LiveHeartRateRelay;
use crate::timer::FrameTick;
use crate::transport::{Dialer, TransportClient};
use serde_json::{Map, Value};
use tracing::{debug, info};

/// Model changes produced by [`Engine::pump`].
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Link up
    Connected,
    /// Link down, reconnect pending
    Disconnected,
    /// New merged biometric sample
    SampleUpdated(BiometricSample),
    /// Cognitive state switched
    StateChanged {
        /// Previous state
        from: CognitiveState,
        /// New state
        to: CognitiveState,
    },
    /// Intervention received and logged
    Intervention(Intervention),
    /// The intervention bubble went away (timeout, press or dismiss)
    BubbleDismissed,
    /// Sleep mode toggled
    SleepMode(bool),
    /// Plant health target changed
    PlantUpdated {
        /// New target health
        health: f64,
    },
    /// Another client changed focus
    FocusChanged(Option<String>),
}

/// Owns the transport client and the models presenters read.
pub struct Engine<D: Dialer> {
    config: EngineConfig,
    transport: TransportClient<D>,
    model: StateModel,
    interventions: InterventionLog,
    bubble: InterventionBubble,
    plant: PlantHealth,
    relay: LiveHeartRateRelay,
    initialized: bool,
}

impl<D: Dialer> Engine<D> {
    /// Build an engine. Nothing is dialed until [`Self::init`].
    pub fn new(config: EngineConfig, dialer: D) -> Self {
        let transport = TransportClient::new(config.url.clone(), &config.timing, dialer);
        let bubble = InterventionBubble::new(config.timing.auto_dismiss_ms);
        Self {
            config,
            transport,
            model: StateModel::new(),
            interventions: InterventionLog::default(),
            bubble,
            plant: PlantHealth::new(),
            relay: LiveHeartRateRelay::new(),
            initialized: false,
        }
    }

    /// Open the connection. Later calls do nothing.
    pub fn init(&mut self, now_ms: u64) -> Vec<EngineEvent> {
        if self.initialized {
            debug!("engine already initialized");
            return Vec::new();
        }
        self.initialized = true;
        info!(url = %self.config.url, "engine starting");
        let events = self.transport.connect(now_ms);
        self.apply_all(events, now_ms)
    }

    /// Drain the transport and run model timers. Call once per frame, before
    /// [`Self::advance_frame`].
    pub fn pump(&mut self, now_ms: u64) -> Vec<EngineEvent> {
        let events = self.transport.poll(now_ms);
        let mut out = self.apply_all(events, now_ms);
        if self.bubble.poll(now_ms).is_some() {
            out.push(EngineEvent::BubbleDismissed);
        }
        out
    }

    fn apply_all(&mut self, events: Vec<TransportEvent>, now_ms: u64) -> Vec<EngineEvent> {
        let mut out = Vec::new();
        for event in events {
            self.apply(event, now_ms, &mut out);
        }
        out
    }

    /// Apply one transport event to the models.
    pub fn apply(&mut self, event: TransportEvent, now_ms: u64, out: &mut Vec<EngineEvent>) {
        match event {
            TransportEvent::Connected { current_state, .. } => {
                self.model.set_connected(true, now_ms);
                out.push(EngineEvent::Connected);
                if let Some(state) = current_state {
                    self.switch_state(state, out);
                }
            }
            TransportEvent::Disconnected => {
                self.model.set_connected(false, now_ms);
                out.push(EngineEvent::Disconnected);
            }
            TransportEvent::Message(message) => self.apply_message(message, now_ms, out),
        }
    }

    fn apply_message(&mut self, message: Inbound, now_ms: u64, out: &mut Vec<EngineEvent>) {
        match message {
            Inbound::ConnectionEstablished { .. } => {
                self.apply(TransportEvent::from_inbound(message), now_ms, out);
            }
            Inbound::BiometricUpdate(update) => {
                let previous = self.model.state();
                let (sample, changed) = self.model.apply_biometric(&update);
                out.push(EngineEvent::SampleUpdated(sample));
                if changed {
                    out.push(EngineEvent::StateChanged {
                        from: previous,
                        to: sample.state,
                    });
                }
            }
            Inbound::StateChange {
                to,
                estimated_stress,
                ..
            } => {
                if let Some(stress) = estimated_stress {
                    self.model.set_stress(stress);
                }
                self.switch_state(to, out);
            }
            Inbound::Intervention(message) => {
                let intervention = Intervention::from_message(message, now_ms);
                info!(
                    priority = intervention.priority.label(),
                    "intervention received"
                );
                self.interventions.push(intervention.clone());
                self.bubble.show(intervention.clone(), now_ms);
                out.push(EngineEvent::Intervention(intervention));
            }
            Inbound::SleepMode { active } => {
                self.model.set_sleep_mode(active);
                out.push(EngineEvent::SleepMode(active));
            }
            Inbound::PlantUpdate { health, delta } => {
                match (health, delta) {
                    (Some(health), _) => self.plant.set(health),
                    (None, Some(delta)) => self.plant.adjust(delta),
                    (None, None) => return,
                }
                out.push(EngineEvent::PlantUpdated {
                    health: self.plant.health(),
                });
            }
            Inbound::AppFocusChange { app_type } => {
                info!(app = app_type.as_deref().unwrap_or("none"), "focus changed");
                out.push(EngineEvent::FocusChanged(app_type));
            }
        }
    }

    fn switch_state(&mut self, state: CognitiveState, out: &mut Vec<EngineEvent>) {
        if let Some(from) = self.model.set_state(state) {
            info!(from = from.as_str(), to = state.as_str(), "state changed");
            out.push(EngineEvent::StateChanged { from, to: state });
        }
    }

    /// Advance smoothed values by one frame. Returns `true` when the plant
    /// read-out moved enough to repaint.
    pub fn advance_frame(&mut self, tick: FrameTick) -> bool {
        let delta = tick.delta();
        self.model.advance(delta);
        self.plant.advance(delta)
    }

    /// Ask the server to force a cognitive state.
    pub fn mock_state(&mut self, state: CognitiveState) -> bool {
        self.transport.send(&Outbound::mock_state(state))
    }

    /// Press button `index` on the shown intervention.
    pub fn press_button(&mut self, index: usize) -> Option<EngineEvent> {
        let feedback = self.bubble.press(index, timestamp_now())?;
        self.transport.send(&feedback);
        Some(EngineEvent::BubbleDismissed)
    }

    /// Hide the shown intervention without responding.
    pub fn dismiss_bubble(&mut self) -> Option<EngineEvent> {
        self.bubble.dismiss().map(|_| EngineEvent::BubbleDismissed)
    }

    /// Queue a debounced content update.
    pub fn update_content(
        &mut self,
        document: &str,
        content: &str,
        metadata: Map<String, Value>,
        now_ms: u64,
    ) -> bool {
        self.transport
            .send_content_update(document, content, metadata, now_ms)
    }

    /// Report local focus.
    pub fn set_app_focus(&mut self, app_type: Option<&str>) -> bool {
        self.transport
            .send(&Outbound::app_focus(app_type, timestamp_now()))
    }

    /// Relay a heart-rate strap reading. Returns how many messages went out.
    pub fn live_heart_rate(&mut self, bpm: u16, connected: bool) -> usize {
        let messages = self.relay.update(bpm, connected);
        let mut sent = 0;
        for message in &messages {
            if self.transport.send(message) {
                sent += 1;
            }
        }
        sent
    }

    /// Close the link and cancel every timer.
    pub fn shutdown(&mut self) {
        self.transport.shutdown();
        self.bubble.dismiss();
        info!("engine stopped");
    }

    /// Authoritative state.
    #[must_use]
    pub const fn model(&self) -> &StateModel {
        &self.model
    }

    /// Mutable state, for local overrides such as a display hard reset.
    pub fn model_mut(&mut self) -> &mut StateModel {
        &mut self.model
    }

    /// Recent interventions.
    #[must_use]
    pub const fn interventions(&self) -> &InterventionLog {
        &self.interventions
    }

    /// The shown intervention.
    #[must_use]
    pub const fn bubble(&self) -> &InterventionBubble {
        &self.bubble
    }

    /// Plant health.
    #[must_use]
    pub const fn plant(&self) -> &PlantHealth {
        &self.plant
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The transport client.
    #[must_use]
    pub const fn transport(&self) -> &TransportClient<D> {
        &self.transport
    }

    /// Whether [`Self::init`] has run.
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }
}

impl<D: Dialer> std::fmt::Debug for Engine<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("transport", &self.transport)
            .field("state", &self.model.state())
            .field("initialized", &self.initialized)
            .finish_non_exhaustive()
    }
}
