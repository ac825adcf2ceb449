//! Biometric signal synthesis and state-driven animation engine.
//!
//! This crate holds everything that does not touch a terminal or a socket:
//! - Wire protocol and the reconnecting client: [`protocol`], [`transport`], [`events`]
//! - Models: [`StateModel`], [`InterventionLog`], [`PlantHealth`]
//! - Signal synthesis: [`WaveformSynth`]
//! - Animation: [`Smoothed`], [`ColorTransition`], [`Flash`], [`ScreenShake`], [`ParticleField`]
//! - Drawing: the [`Canvas`] trait and [`RecordingCanvas`]
//!
//! All timing is passed in explicitly as `now_ms` or a [`FrameTick`], so the
//! whole engine runs deterministically under test.

pub mod animation;
pub mod biometrics;
pub mod canvas;
mod color;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
mod geometry;
pub mod interventions;
pub mod particles;
pub mod plant;
pub mod protocol;
pub mod sensor;
pub mod timer;
pub mod transport;
pub mod waveform;

pub use animation::{ColorTransition, Flash, Ramp, ScreenShake, Smoothed};
pub use biometrics::{
    BiometricSample, CognitiveState, DisplayModel, SampleHistory, StateModel, StateProfile,
    ThreatLevel,
};
pub use canvas::{
    Canvas, DrawCommand, FontWeight, RecordingCanvas, TextAlign, TextStyle, Transform2D,
};
pub use color::{Color, ColorParseError};
pub use config::{EngineConfig, TimingConfig};
pub use engine::{Engine, EngineEvent};
pub use error::{ConfigError, ProtocolError, SensorError, TransportError};
pub use events::{Event, EventBus, EventKind, SubscriptionId, TransportEvent};
pub use geometry::{Point, Rect, Size};
pub use interventions::{Intervention, InterventionBubble, InterventionLog, Priority};
pub use particles::{Particle, ParticleField, ParticleKind};
pub use plant::{GrowthStage, PlantHealth};
pub use protocol::{BiometricUpdate, Inbound, Outbound};
pub use sensor::{parse_heart_rate_measurement, LiveHeartRateRelay};
pub use timer::{Deferred, FrameHandle, FrameScheduler, FrameTick, Repeating, FRAME_MS};
pub use transport::{
    ConnectionState, Dialer, Link, LinkPoll, LoopbackDialer, LoopbackHandle, TransportClient,
};
pub use waveform::{WaveformBuffer, WaveformSynth};
