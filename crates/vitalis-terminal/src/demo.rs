//! Offline demo feed: plays the server's part over a loopback link.
//!
//! It answers `mock_state` requests with the matching preset reading and
//! repeats the current reading every [`SAMPLE_PERIOD_MS`], so the whole UI can
//! be exercised without an event server.

use tracing::debug;
use vitalis_core::{BiometricUpdate, CognitiveState, Inbound, LoopbackHandle, Repeating};

/// Interval between repeated readings.
pub const SAMPLE_PERIOD_MS: u64 = 2000;

struct Preset {
    heart_rate: f64,
    hrv: f64,
    recovery: f64,
    strain: f64,
    stress: f64,
    sleep_performance: f64,
    spo2: f64,
    skin_temp: f64,
}

const fn preset(state: CognitiveState) -> Preset {
    match state {
        CognitiveState::DeepFocus => Preset {
            heart_rate: 62.0,
            hrv: 40.0,
            recovery: 75.0,
            strain: 10.2,
            stress: 1.2,
            sleep_performance: 0.85,
            spo2: 97.5,
            skin_temp: 33.2,
        },
        CognitiveState::Stressed => Preset {
            heart_rate: 95.0,
            hrv: 22.0,
            recovery: 45.0,
            strain: 18.5,
            stress: 2.6,
            sleep_performance: 0.72,
            spo2: 96.0,
            skin_temp: 34.1,
        },
        CognitiveState::Fatigued => Preset {
            heart_rate: 55.0,
            hrv: 28.0,
            recovery: 30.0,
            strain: 3.1,
            stress: 1.8,
            sleep_performance: 0.45,
            spo2: 95.5,
            skin_temp: 33.0,
        },
        CognitiveState::Relaxed => Preset {
            heart_rate: 68.0,
            hrv: 72.0,
            recovery: 85.0,
            strain: 4.5,
            stress: 0.4,
            sleep_performance: 0.92,
            spo2: 98.0,
            skin_temp: 33.5,
        },
        CognitiveState::Wired => Preset {
            heart_rate: 88.0,
            hrv: 35.0,
            recovery: 50.0,
            strain: 14.3,
            stress: 1.9,
            sleep_performance: 0.70,
            spo2: 96.5,
            skin_temp: 33.8,
        },
    }
}

/// Reading for a state, as the server would send it.
#[must_use]
pub fn reading(state: CognitiveState) -> BiometricUpdate {
    let p = preset(state);
    BiometricUpdate {
        source: Some("mock".to_string()),
        heart_rate: Some(p.heart_rate),
        hrv: Some(p.hrv),
        recovery: Some(p.recovery),
        strain: Some(p.strain),
        estimated_stress: Some(p.stress),
        state: Some(state.as_str().to_string()),
        sleep_performance: Some(p.sleep_performance),
        spo2: Some(p.spo2),
        skin_temp: Some(p.skin_temp),
    }
}

/// Server stand-in driven from the frame loop.
pub struct DemoFeed {
    handle: LoopbackHandle,
    state: CognitiveState,
    seen: usize,
    samples: Repeating,
    greeted: bool,
}

impl DemoFeed {
    /// Feed the client behind `handle`, starting relaxed.
    #[must_use]
    pub fn new(handle: LoopbackHandle) -> Self {
        Self {
            handle,
            state: CognitiveState::Relaxed,
            seen: 0,
            samples: Repeating::new("demo-samples", SAMPLE_PERIOD_MS),
            greeted: false,
        }
    }

    /// State currently being played.
    #[must_use]
    pub const fn state(&self) -> CognitiveState {
        self.state
    }

    /// Answer new client requests and emit periodic readings.
    pub fn step(&mut self, now_ms: u64) {
        if !self.handle.is_open() {
            self.greeted = false;
            self.samples.stop();
            return;
        }
        if !self.greeted {
            self.greeted = true;
            self.handle.push(&Inbound::ConnectionEstablished {
                session_id: Some("demo".to_string()),
                current_state: Some(self.state.as_str().to_string()),
            });
            self.push_reading();
            self.samples.start(now_ms);
        }

        let sent = self.handle.sent_json();
        for message in sent.iter().skip(self.seen) {
            if message["type"] != "mock_state" {
                continue;
            }
            let requested = message["state"]
                .as_u64()
                .and_then(|n| u8::try_from(n).ok())
                .and_then(CognitiveState::from_preset);
            if let Some(state) = requested {
                debug!(state = state.as_str(), "demo switching preset");
                self.state = state;
                self.push_reading();
                self.samples.start(now_ms);
            }
        }
        self.seen = sent.len();

        if self.samples.fire(now_ms) {
            self.push_reading();
        }
    }

    fn push_reading(&self) {
        self.handle.push(&Inbound::BiometricUpdate(reading(self.state)));
    }
}
