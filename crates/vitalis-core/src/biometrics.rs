//! Biometric samples, cognitive states and the authoritative state model.

use crate::animation::Smoothed;
use crate::protocol::BiometricUpdate;
use crate::Color;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

/// Discrete cognitive-state classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CognitiveState {
    /// Sustained concentration
    DeepFocus,
    /// Acute stress
    Stressed,
    /// Low energy
    Fatigued,
    /// Calm baseline
    #[default]
    Relaxed,
    /// Over-stimulated
    Wired,
}

/// Visual profile attached to a cognitive state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateProfile {
    /// Accent and overlay tint
    pub color: Color,
    /// Ambient particle speed
    pub particle_speed: f32,
    /// Ambient particle target population
    pub particle_count: usize,
    /// Full-surface overlay alpha
    pub overlay_alpha: f32,
    /// Glyph floated by the companion on entering this state
    pub glyph: &'static str,
}

impl CognitiveState {
    /// All states, in demo preset order.
    pub const ALL: [Self; 5] = [
        Self::DeepFocus,
        Self::Stressed,
        Self::Fatigued,
        Self::Relaxed,
        Self::Wired,
    ];

    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DeepFocus => "DEEP_FOCUS",
            Self::Stressed => "STRESSED",
            Self::Fatigued => "FATIGUED",
            Self::Relaxed => "RELAXED",
            Self::Wired => "WIRED",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::DeepFocus => "DEEP FOCUS",
            Self::Stressed => "STRESSED",
            Self::Fatigued => "FATIGUED",
            Self::Relaxed => "RELAXED",
            Self::Wired => "WIRED",
        }
    }

    /// Visual profile for this state.
    #[must_use]
    pub const fn profile(self) -> StateProfile {
        match self {
            Self::DeepFocus => StateProfile {
                color: Color::rgb8(128, 0, 255),
                particle_speed: 0.3,
                particle_count: 18,
                overlay_alpha: 0.10,
                glyph: "◉",
            },
            Self::Stressed => StateProfile {
                color: Color::rgb8(255, 80, 80),
                particle_speed: 2.0,
                particle_count: 40,
                overlay_alpha: 0.14,
                glyph: "!",
            },
            Self::Fatigued => StateProfile {
                color: Color::rgb8(255, 160, 0),
                particle_speed: 0.2,
                particle_count: 12,
                overlay_alpha: 0.12,
                glyph: "z",
            },
            Self::Relaxed => StateProfile {
                color: Color::rgb8(0, 200, 100),
                particle_speed: 0.5,
                particle_count: 22,
                overlay_alpha: 0.08,
                glyph: "~",
            },
            Self::Wired => StateProfile {
                color: Color::rgb8(0, 150, 255),
                particle_speed: 3.0,
                particle_count: 35,
                overlay_alpha: 0.13,
                glyph: "⚡",
            },
        }
    }

    /// Demo preset number (1-5) used by `mock_state`.
    #[must_use]
    pub const fn preset(self) -> u8 {
        match self {
            Self::DeepFocus => 1,
            Self::Stressed => 2,
            Self::Fatigued => 3,
            Self::Relaxed => 4,
            Self::Wired => 5,
        }
    }

    /// State for a demo preset number.
    #[must_use]
    pub const fn from_preset(preset: u8) -> Option<Self> {
        match preset {
            1 => Some(Self::DeepFocus),
            2 => Some(Self::Stressed),
            3 => Some(Self::Fatigued),
            4 => Some(Self::Relaxed),
            5 => Some(Self::Wired),
            _ => None,
        }
    }
}

impl fmt::Display for CognitiveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognized state name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown cognitive state: {0}")]
pub struct UnknownState(pub String);

impl FromStr for CognitiveState {
    type Err = UnknownState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| UnknownState(s.to_string()))
    }
}

/// Overall alert level shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ThreatLevel {
    /// Nothing to report
    Nominal,
    /// Worth watching
    Elevated,
    /// Needs attention
    Critical,
}

impl ThreatLevel {
    /// Classify from the current state and estimated stress (0-3).
    #[must_use]
    pub fn assess(state: CognitiveState, stress: f64) -> Self {
        if state == CognitiveState::Stressed || stress > 2.0 {
            Self::Critical
        } else if matches!(state, CognitiveState::Fatigued | CognitiveState::Wired) || stress > 1.0
        {
            Self::Elevated
        } else {
            Self::Nominal
        }
    }

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Nominal => "NOMINAL",
            Self::Elevated => "ELEVATED",
            Self::Critical => "CRITICAL",
        }
    }

    /// Display color.
    #[must_use]
    pub const fn color(self) -> Color {
        match self {
            Self::Nominal => Color::HEALTHY,
            Self::Elevated => Color::CAUTION,
            Self::Critical => Color::ALARM,
        }
    }
}

/// One merged biometric reading.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BiometricSample {
    /// Beats per minute
    pub heart_rate: f64,
    /// Heart-rate variability (ms)
    pub hrv: f64,
    /// Recovery score (0-100)
    pub recovery: f64,
    /// Day strain
    pub strain: f64,
    /// Estimated stress (0-3)
    pub estimated_stress: f64,
    /// Classification at the time of the reading
    pub state: CognitiveState,
}

impl BiometricSample {
    /// Overlay a partial update. Absent, non-positive or non-finite fields keep
    /// the previous value; stress also accepts an explicit zero.
    #[must_use]
    pub fn merged(&self, update: &BiometricUpdate) -> Self {
        let pick = |new: Option<f64>, old: f64| match new {
            Some(v) if v.is_finite() && v > 0.0 => v,
            _ => old,
        };
        Self {
            heart_rate: pick(update.heart_rate, self.heart_rate),
            hrv: pick(update.hrv, self.hrv),
            recovery: pick(update.recovery, self.recovery).min(100.0),
            strain: pick(update.strain, self.strain),
            estimated_stress: match update.estimated_stress {
                Some(v) if v.is_finite() && v >= 0.0 => v.min(3.0),
                _ => self.estimated_stress,
            },
            state: update.cognitive_state().unwrap_or(self.state),
        }
    }
}

/// Bounded FIFO of recent samples.
#[derive(Debug, Clone)]
pub struct SampleHistory {
    samples: VecDeque<BiometricSample>,
    capacity: usize,
}

impl SampleHistory {
    /// Default capacity.
    pub const DEFAULT_CAPACITY: usize = 30;

    /// Create an empty history.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Append, evicting the oldest sample when full.
    pub fn push(&mut self, sample: BiometricSample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Number of retained samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &BiometricSample> {
        self.samples.iter()
    }

    /// HRV trend series, oldest first, skipping readings without HRV.
    #[must_use]
    pub fn hrv_series(&self) -> Vec<f64> {
        self.samples
            .iter()
            .map(|s| s.hrv)
            .filter(|hrv| *hrv > 0.0)
            .collect()
    }
}

impl Default for SampleHistory {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

/// Smoothed, render-facing copies of the latest sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayModel {
    /// Heart rate
    pub heart_rate: Smoothed,
    /// HRV
    pub hrv: Smoothed,
    /// Recovery
    pub recovery: Smoothed,
    /// Strain
    pub strain: Smoothed,
    /// Estimated stress
    pub stress: Smoothed,
}

impl DisplayModel {
    /// Default smoothing rate per frame.
    pub const DEFAULT_RATE: f64 = 0.12;

    /// Create an empty display model with the given smoothing rate.
    #[must_use]
    pub const fn new(rate: f64) -> Self {
        Self {
            heart_rate: Smoothed::new(rate),
            hrv: Smoothed::new(rate),
            recovery: Smoothed::new(rate),
            strain: Smoothed::new(rate),
            stress: Smoothed::new(rate),
        }
    }

    fn fields_mut(&mut self) -> [&mut Smoothed; 5] {
        [
            &mut self.heart_rate,
            &mut self.hrv,
            &mut self.recovery,
            &mut self.strain,
            &mut self.stress,
        ]
    }

    /// Retarget every field at `sample`.
    pub fn set_targets(&mut self, sample: &BiometricSample) {
        let values = [
            sample.heart_rate,
            sample.hrv,
            sample.recovery,
            sample.strain,
            sample.estimated_stress,
        ];
        for (field, value) in self.fields_mut().into_iter().zip(values) {
            field.set_target(value);
        }
    }

    /// Jump every field to `sample`.
    pub fn hard_reset(&mut self, sample: &BiometricSample) {
        self.heart_rate.snap(sample.heart_rate);
        self.hrv.snap(sample.hrv);
        self.recovery.snap(sample.recovery);
        self.strain.snap(sample.strain);
        self.stress.snap(sample.estimated_stress);
    }

    /// Advance every field by `delta` frames.
    pub fn advance(&mut self, delta: f64) {
        for field in self.fields_mut() {
            field.advance(delta);
        }
    }
}

impl Default for DisplayModel {
    fn default() -> Self {
        Self::new(Self::DEFAULT_RATE)
    }
}

/// Authoritative view of the user, written only by the engine.
#[derive(Debug, Clone, Default)]
pub struct StateModel {
    latest: Option<BiometricSample>,
    state: CognitiveState,
    history: SampleHistory,
    display: DisplayModel,
    connected: bool,
    sleep_mode: bool,
    session_started_ms: Option<u64>,
}

impl StateModel {
    /// Create a model with no data.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a biometric update. Returns the new sample and whether the
    /// cognitive state changed as a result.
    pub fn apply_biometric(&mut self, update: &BiometricUpdate) -> (BiometricSample, bool) {
        let base = self.latest.unwrap_or(BiometricSample {
            state: self.state,
            ..BiometricSample::default()
        });
        let sample = base.merged(update);
        self.latest = Some(sample);
        self.history.push(sample);
        self.display.set_targets(&sample);
        let changed = sample.state != self.state;
        self.state = sample.state;
        (sample, changed)
    }

    /// Switch cognitive state. Returns the previous state if it changed.
    pub fn set_state(&mut self, state: CognitiveState) -> Option<CognitiveState> {
        if state == self.state {
            return None;
        }
        let previous = self.state;
        self.state = state;
        if let Some(sample) = self.latest.as_mut() {
            sample.state = state;
        }
        Some(previous)
    }

    /// Override estimated stress (carried on some state transitions).
    pub fn set_stress(&mut self, stress: f64) {
        if !stress.is_finite() {
            return;
        }
        let stress = stress.clamp(0.0, 3.0);
        let sample = self.latest.get_or_insert(BiometricSample {
            state: self.state,
            ..BiometricSample::default()
        });
        sample.estimated_stress = stress;
        self.display.stress.set_target(stress);
    }

    /// Record connection status. The session clock starts on the first connect.
    pub fn set_connected(&mut self, connected: bool, now_ms: u64) {
        self.connected = connected;
        if connected && self.session_started_ms.is_none() {
            self.session_started_ms = Some(now_ms);
        }
    }

    /// Enter or leave sleep mode.
    pub fn set_sleep_mode(&mut self, active: bool) {
        self.sleep_mode = active;
    }

    /// Advance display smoothing by `delta` frames.
    pub fn advance(&mut self, delta: f64) {
        self.display.advance(delta);
    }

    /// Snap display values to the latest sample.
    pub fn hard_reset_display(&mut self) {
        if let Some(sample) = self.latest {
            self.display.hard_reset(&sample);
        }
    }

    /// Most recent merged sample.
    #[must_use]
    pub const fn latest(&self) -> Option<&BiometricSample> {
        self.latest.as_ref()
    }

    /// Current cognitive state.
    #[must_use]
    pub const fn state(&self) -> CognitiveState {
        self.state
    }

    /// Latest heart rate, if one has been received.
    #[must_use]
    pub fn target_bpm(&self) -> Option<f64> {
        self.latest
            .map(|s| s.heart_rate)
            .filter(|bpm| *bpm > 0.0)
    }

    /// Smoothed display values.
    #[must_use]
    pub const fn display(&self) -> &DisplayModel {
        &self.display
    }

    /// Recent samples.
    #[must_use]
    pub const fn history(&self) -> &SampleHistory {
        &self.history
    }

    /// Connection status.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.connected
    }

    /// Sleep mode status.
    #[must_use]
    pub const fn is_sleep_mode(&self) -> bool {
        self.sleep_mode
    }

    /// Milliseconds since the first connect.
    #[must_use]
    pub fn session_elapsed_ms(&self, now_ms: u64) -> Option<u64> {
        self.session_started_ms
            .map(|start| now_ms.saturating_sub(start))
    }

    /// Current threat level.
    #[must_use]
    pub fn threat_level(&self) -> ThreatLevel {
        let stress = self.latest.map_or(0.0, |s| s.estimated_stress);
        ThreatLevel::assess(self.state, stress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(hr: f64) -> BiometricUpdate {
        BiometricUpdate {
            heart_rate: Some(hr),
            ..BiometricUpdate::default()
        }
    }

    #[test]
    fn test_state_wire_names() {
        assert_eq!(
            serde_json::to_string(&CognitiveState::DeepFocus).unwrap(),
            "\"DEEP_FOCUS\""
        );
        assert_eq!("WIRED".parse::<CognitiveState>(), Ok(CognitiveState::Wired));
        assert!("CALM".parse::<CognitiveState>().is_err());
        assert_eq!(CognitiveState::default(), CognitiveState::Relaxed);
    }

    #[test]
    fn test_presets_round_trip() {
        for state in CognitiveState::ALL {
            assert_eq!(CognitiveState::from_preset(state.preset()), Some(state));
        }
        assert_eq!(CognitiveState::from_preset(0), None);
        assert_eq!(CognitiveState::from_preset(6), None);
    }

    #[test]
    fn test_profile_colors() {
        assert_eq!(CognitiveState::Relaxed.profile().color.to_rgb8(), (0, 200, 100));
        assert_eq!(CognitiveState::Stressed.profile().color.to_rgb8(), (255, 80, 80));
        assert_eq!(CognitiveState::Stressed.profile().particle_count, 40);
    }

    #[test]
    fn test_threat_level() {
        use CognitiveState::*;
        assert_eq!(ThreatLevel::assess(Stressed, 0.0), ThreatLevel::Critical);
        assert_eq!(ThreatLevel::assess(Relaxed, 2.5), ThreatLevel::Critical);
        assert_eq!(ThreatLevel::assess(Wired, 0.0), ThreatLevel::Elevated);
        assert_eq!(ThreatLevel::assess(DeepFocus, 1.5), ThreatLevel::Elevated);
        assert_eq!(ThreatLevel::assess(Relaxed, 1.0), ThreatLevel::Nominal);
    }

    #[test]
    fn test_merge_keeps_previous_on_zero_or_missing() {
        let mut model = StateModel::new();
        model.apply_biometric(&BiometricUpdate {
            heart_rate: Some(70.0),
            hrv: Some(55.0),
            recovery: Some(80.0),
            ..BiometricUpdate::default()
        });
        let (sample, _) = model.apply_biometric(&BiometricUpdate {
            heart_rate: Some(0.0),
            hrv: None,
            strain: Some(12.5),
            ..BiometricUpdate::default()
        });
        assert_eq!(sample.heart_rate, 70.0);
        assert_eq!(sample.hrv, 55.0);
        assert_eq!(sample.recovery, 80.0);
        assert_eq!(sample.strain, 12.5);
    }

    #[test]
    fn test_biometric_state_change_reported() {
        let mut model = StateModel::new();
        let (_, changed) = model.apply_biometric(&BiometricUpdate {
            state: Some("WIRED".to_string()),
            ..update(90.0)
        });
        assert!(changed);
        assert_eq!(model.state(), CognitiveState::Wired);
        let (_, changed) = model.apply_biometric(&update(91.0));
        assert!(!changed);
    }

    #[test]
    fn test_unknown_state_string_keeps_state() {
        let mut model = StateModel::new();
        model.apply_biometric(&BiometricUpdate {
            state: Some("SLEEPY".to_string()),
            ..update(60.0)
        });
        assert_eq!(model.state(), CognitiveState::Relaxed);
    }

    #[test]
    fn test_history_capacity() {
        let mut model = StateModel::new();
        for i in 0..40 {
            model.apply_biometric(&update(60.0 + f64::from(i)));
        }
        assert_eq!(model.history().len(), SampleHistory::DEFAULT_CAPACITY);
        assert_eq!(model.history().iter().next().unwrap().heart_rate, 70.0);
    }

    #[test]
    fn test_hrv_series_skips_missing() {
        let mut history = SampleHistory::new(4);
        for hrv in [0.0, 40.0, 0.0, 45.0, 50.0] {
            history.push(BiometricSample {
                hrv,
                ..BiometricSample::default()
            });
        }
        assert_eq!(history.hrv_series(), vec![45.0, 50.0]);
    }

    #[test]
    fn test_display_lags_then_converges() {
        let mut model = StateModel::new();
        model.apply_biometric(&update(60.0));
        assert_eq!(model.display().heart_rate.value(), 60.0);
        model.apply_biometric(&update(120.0));
        model.advance(1.0);
        let hr = model.display().heart_rate.value();
        assert!(hr > 60.0 && hr < 120.0);
        for _ in 0..200 {
            model.advance(1.0);
        }
        assert!(model.display().heart_rate.is_settled(1e-6));
    }

    #[test]
    fn test_hard_reset_display() {
        let mut model = StateModel::new();
        model.apply_biometric(&update(60.0));
        model.apply_biometric(&update(120.0));
        model.hard_reset_display();
        assert_eq!(model.display().heart_rate.value(), 120.0);
    }

    #[test]
    fn test_session_clock_starts_on_first_connect() {
        let mut model = StateModel::new();
        assert_eq!(model.session_elapsed_ms(500), None);
        model.set_connected(true, 1000);
        model.set_connected(false, 2000);
        model.set_connected(true, 3000);
        assert_eq!(model.session_elapsed_ms(4000), Some(3000));
        assert!(model.is_connected());
    }

    #[test]
    fn test_set_state_and_stress() {
        let mut model = StateModel::new();
        assert_eq!(model.set_state(CognitiveState::Stressed), Some(CognitiveState::Relaxed));
        assert_eq!(model.set_state(CognitiveState::Stressed), None);
        model.set_stress(9.0);
        assert_eq!(model.latest().unwrap().estimated_stress, 3.0);
        assert_eq!(model.threat_level(), ThreatLevel::Critical);
        assert_eq!(model.target_bpm(), None);
    }
}
