//! Synthetic ECG trace driven only by a target heart rate.
//!
//! Each tick shifts the ring buffer by exactly one sample. A beat replays a
//! fixed template (P wave, QRS complex, T wave) one amplitude per tick; between
//! beats the trace sits on the baseline. The time since the last onset is kept
//! phase-preserving: when a beat starts the interval is subtracted instead of
//! resetting to zero, so rounding never drifts the rhythm.

use std::collections::VecDeque;

/// Resting level of the trace.
pub const BASELINE: f32 = 0.5;

/// Amplitudes of one heartbeat, one per tick. Lower values draw higher on
/// screen (y grows downward), so the R peak is the 0.07 sample.
pub const BEAT_TEMPLATE: [f32; 28] = [
    0.5, 0.5, 0.5, 0.5, // lead-in
    0.44, 0.38, 0.38, 0.44, // P wave
    0.5, 0.5, // PR segment
    0.58, 0.14, 0.07, 0.14, 0.64, 0.58, // QRS complex
    0.5, 0.5, 0.5, // ST segment
    0.40, 0.33, 0.30, 0.33, 0.40, // T wave
    0.5, 0.5, 0.5, 0.5, // tail
];

/// Fixed-length ring of trace samples in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformBuffer {
    samples: VecDeque<f32>,
}

impl WaveformBuffer {
    /// Create a buffer of `len` baseline samples.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            samples: std::iter::repeat(BASELINE).take(len).collect(),
        }
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if the buffer has zero length.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Append at the tail, dropping the head. Length never changes.
    pub fn push(&mut self, sample: f32) {
        if self.samples.pop_front().is_some() {
            self.samples.push_back(sample.clamp(0.0, 1.0));
        }
    }

    /// Change length, keeping the most recent `min(old, new)` samples in order
    /// and padding new leading slots with the baseline.
    pub fn resize(&mut self, len: usize) {
        let current = self.samples.len();
        if len < current {
            self.samples.drain(..current - len);
        } else {
            for _ in current..len {
                self.samples.push_front(BASELINE);
            }
        }
    }

    /// Samples oldest first.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = f32> + '_ {
        self.samples.iter().copied()
    }

    /// Most recent sample.
    #[must_use]
    pub fn latest(&self) -> Option<f32> {
        self.samples.back().copied()
    }
}

/// Per-presenter ECG synthesizer.
#[derive(Debug, Clone)]
pub struct WaveformSynth {
    buffer: WaveformBuffer,
    bpm: f64,
    target_bpm: f64,
    since_beat_ms: f64,
    cursor: Option<usize>,
    rest_phase: Option<f64>,
    beats: u64,
}

impl WaveformSynth {
    /// Rate at which the BPM estimate follows its target, per tick.
    pub const BPM_SMOOTHING: f64 = 0.05;
    /// Slowest rhythm synthesized.
    pub const MIN_BPM: f64 = 30.0;
    /// Fastest rhythm synthesized.
    pub const MAX_BPM: f64 = 150.0;
    /// Rhythm before any heart rate has been received.
    pub const DEFAULT_BPM: f64 = 72.0;
    /// Largest frame delta honored, in milliseconds.
    pub const MAX_TICK_MS: f64 = 50.0;
    /// Phase advance per millisecond in rest mode.
    pub const REST_PHASE_PER_MS: f64 = 0.0008;
    /// Peak deviation from baseline in rest mode.
    pub const REST_AMPLITUDE: f64 = 0.06;

    /// Create a synthesizer for a surface `width` samples wide.
    #[must_use]
    pub fn new(width: usize) -> Self {
        Self {
            buffer: WaveformBuffer::new(width),
            bpm: Self::DEFAULT_BPM,
            target_bpm: Self::DEFAULT_BPM,
            since_beat_ms: 0.0,
            cursor: None,
            rest_phase: None,
            beats: 0,
        }
    }

    /// Set the heart rate to follow. Zero, negative or non-finite values are
    /// treated as "no data" and the previous target is kept.
    pub fn set_target_bpm(&mut self, bpm: f64) -> bool {
        if bpm.is_finite() && bpm > 0.0 {
            self.target_bpm = bpm;
            true
        } else {
            false
        }
    }

    /// Switch between beats and the slow resting sine.
    pub fn set_rest_mode(&mut self, active: bool) {
        if active == self.rest_phase.is_some() {
            return;
        }
        self.cursor = None;
        self.rest_phase = active.then_some(0.0);
    }

    /// Whether the resting sine is active.
    #[must_use]
    pub const fn is_resting(&self) -> bool {
        self.rest_phase.is_some()
    }

    /// Advance one tick and return the sample pushed onto the buffer.
    pub fn tick(&mut self, delta_ms: f64) -> f32 {
        let delta_ms = if delta_ms.is_finite() {
            delta_ms.clamp(0.0, Self::MAX_TICK_MS)
        } else {
            0.0
        };
        self.bpm += (self.target_bpm - self.bpm) * Self::BPM_SMOOTHING;

        let sample = if let Some(phase) = self.rest_phase.as_mut() {
            *phase += delta_ms * Self::REST_PHASE_PER_MS;
            Self::REST_AMPLITUDE.mul_add(phase.sin(), f64::from(BASELINE)) as f32
        } else {
            self.beat_sample(delta_ms)
        };

        self.buffer.push(sample);
        sample
    }

    fn beat_sample(&mut self, delta_ms: f64) -> f32 {
        let interval = self.beat_interval_ms();
        self.since_beat_ms += delta_ms;
        if self.cursor.is_none() && self.since_beat_ms >= interval {
            // Carry the remainder, but never more than one interval of debt.
            self.since_beat_ms = (self.since_beat_ms - interval).min(interval);
            self.cursor = Some(0);
            self.beats += 1;
        }

        match self.cursor {
            Some(index) => {
                self.cursor = (index + 1 < BEAT_TEMPLATE.len()).then_some(index + 1);
                BEAT_TEMPLATE[index]
            }
            None => BASELINE,
        }
    }

    /// Resize for a new surface width, keeping recent history.
    pub fn resize(&mut self, width: usize) {
        self.buffer.resize(width);
    }

    /// Smoothed BPM estimate (unclamped).
    #[must_use]
    pub const fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Target BPM.
    #[must_use]
    pub const fn target_bpm(&self) -> f64 {
        self.target_bpm
    }

    /// BPM used for timing, clamped to the synthesizable range.
    #[must_use]
    pub fn effective_bpm(&self) -> f64 {
        self.bpm.clamp(Self::MIN_BPM, Self::MAX_BPM)
    }

    /// Milliseconds between beat onsets at the current estimate.
    #[must_use]
    pub fn beat_interval_ms(&self) -> f64 {
        60_000.0 / self.effective_bpm()
    }

    /// Whether a beat is currently being replayed.
    #[must_use]
    pub const fn beat_in_flight(&self) -> bool {
        self.cursor.is_some()
    }

    /// Beats started since creation.
    #[must_use]
    pub const fn beat_count(&self) -> u64 {
        self.beats
    }

    /// The trace.
    #[must_use]
    pub const fn buffer(&self) -> &WaveformBuffer {
        &self.buffer
    }
}
