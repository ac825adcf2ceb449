//! Frame-rate independent interpolation primitives.
//!
//! Every integrator here advances by `delta`, measured in nominal frames
//! (1.0 == one 60 fps frame). Callers derive it from [`crate::FrameTick`].

use crate::Color;
use rand::Rng;

// =============================================================================
// Smoothed scalar
// =============================================================================

/// Exponentially smoothed scalar.
///
/// Each advance moves `value` toward `target` by `min(rate * delta, 1)` of the
/// remaining distance, so it never overshoots and never moves away.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Smoothed {
    value: f64,
    target: f64,
    rate: f64,
    initialized: bool,
}

impl Smoothed {
    /// Create an uninitialized value. The first target written is adopted as-is.
    #[must_use]
    pub const fn new(rate: f64) -> Self {
        Self {
            value: 0.0,
            target: 0.0,
            rate,
            initialized: false,
        }
    }

    /// Create a value already resting at `initial`.
    #[must_use]
    pub const fn with_initial(initial: f64, rate: f64) -> Self {
        Self {
            value: initial,
            target: initial,
            rate,
            initialized: true,
        }
    }

    /// Set a new target. Non-finite targets are ignored.
    pub fn set_target(&mut self, target: f64) {
        if !target.is_finite() {
            return;
        }
        if !self.initialized {
            self.value = target;
            self.initialized = true;
        }
        self.target = target;
    }

    /// Jump straight to `value` (explicit hard reset).
    pub fn snap(&mut self, value: f64) {
        if value.is_finite() {
            self.value = value;
            self.target = value;
            self.initialized = true;
        }
    }

    /// Advance by `delta` frames and return the new value.
    pub fn advance(&mut self, delta: f64) -> f64 {
        let factor = (self.rate * delta.max(0.0)).min(1.0);
        self.value += (self.target - self.value) * factor;
        self.value
    }

    /// Current displayed value.
    #[must_use]
    pub const fn value(&self) -> f64 {
        self.value
    }

    /// Current target.
    #[must_use]
    pub const fn target(&self) -> f64 {
        self.target
    }

    /// Whether any target has ever been written.
    #[must_use]
    pub const fn has_value(&self) -> bool {
        self.initialized
    }

    /// Whether the value is within `epsilon` of its target.
    #[must_use]
    pub fn is_settled(&self, epsilon: f64) -> bool {
        (self.target - self.value).abs() <= epsilon
    }
}

// =============================================================================
// Flash
// =============================================================================

/// One-shot tinted flash that decays linearly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Flash {
    color: Color,
    alpha: f32,
}

impl Flash {
    /// Peak alpha right after a trigger.
    pub const PEAK_ALPHA: f32 = 0.22;
    /// Alpha lost per frame; the flash is gone after roughly one second.
    pub const DECAY_PER_FRAME: f32 = Self::PEAK_ALPHA / 60.0;

    /// Create an idle flash.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            color: Color::WHITE,
            alpha: 0.0,
        }
    }

    /// Start a flash tinted `color`.
    pub fn trigger(&mut self, color: Color) {
        self.color = color;
        self.alpha = Self::PEAK_ALPHA;
    }

    /// Decay by `delta` frames.
    pub fn advance(&mut self, delta: f64) {
        self.alpha = (self.alpha - Self::DECAY_PER_FRAME * delta.max(0.0) as f32).max(0.0);
    }

    /// Current overlay color, or `None` when idle.
    #[must_use]
    pub fn overlay(&self) -> Option<Color> {
        (self.alpha > 0.0).then(|| self.color.with_alpha(self.alpha))
    }

    /// Current alpha.
    #[must_use]
    pub const fn alpha(&self) -> f32 {
        self.alpha
    }
}

impl Default for Flash {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Color transition
// =============================================================================

/// Tint transition between two overlay colors.
///
/// Progress advances by `rate * delta` and is clamped to 1; the displayed color
/// is a straight lerp between the endpoints. Retargeting mid-way restarts from
/// whatever is currently displayed, so the output never jumps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorTransition {
    from: Color,
    to: Color,
    progress: f32,
    rate: f32,
}

impl ColorTransition {
    /// Default progress per frame (about two seconds end to end).
    pub const DEFAULT_RATE: f32 = 0.008;

    /// Create a settled transition resting on `color`.
    #[must_use]
    pub const fn settled(color: Color) -> Self {
        Self {
            from: color,
            to: color,
            progress: 1.0,
            rate: Self::DEFAULT_RATE,
        }
    }

    /// Override the progress rate.
    #[must_use]
    pub const fn with_rate(mut self, rate: f32) -> Self {
        self.rate = rate;
        self
    }

    /// Begin moving toward `target` from the currently displayed color.
    pub fn retarget(&mut self, target: Color) {
        self.from = self.current();
        self.to = target;
        self.progress = 0.0;
    }

    /// Advance by `delta` frames.
    pub fn advance(&mut self, delta: f64) {
        self.progress = (self.progress + self.rate * delta.max(0.0) as f32).min(1.0);
    }

    /// Currently displayed color (alpha included).
    #[must_use]
    pub fn current(&self) -> Color {
        self.from.lerp(&self.to, self.progress)
    }

    /// Progress in [0, 1].
    #[must_use]
    pub const fn progress(&self) -> f32 {
        self.progress
    }

    /// Destination color.
    #[must_use]
    pub const fn target(&self) -> Color {
        self.to
    }

    /// Whether the transition has completed.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.progress >= 1.0
    }
}

// =============================================================================
// Screen shake
// =============================================================================

/// Random positional jitter with linear falloff.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenShake {
    remaining_ms: f32,
    duration_ms: f32,
    intensity: f32,
}

impl ScreenShake {
    /// Time consumed by each sample.
    pub const TICK_MS: f32 = 16.0;

    /// Create an idle shake.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            remaining_ms: 0.0,
            duration_ms: 0.0,
            intensity: 0.0,
        }
    }

    /// Start a shake lasting `duration_ms` with peak offset `intensity`.
    pub fn trigger(&mut self, duration_ms: f32, intensity: f32) {
        if duration_ms <= 0.0 || intensity <= 0.0 {
            return;
        }
        self.remaining_ms = duration_ms;
        self.duration_ms = duration_ms;
        self.intensity = intensity;
    }

    /// Whether the shake is still running.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.remaining_ms > 0.0
    }

    /// Current maximum offset magnitude per axis.
    #[must_use]
    pub fn amplitude(&self) -> f32 {
        if self.is_active() {
            self.intensity * self.remaining_ms / self.duration_ms
        } else {
            0.0
        }
    }

    /// Draw this frame's offset and consume one tick.
    pub fn sample<R: Rng + ?Sized>(&mut self, rng: &mut R) -> (f32, f32) {
        if !self.is_active() {
            return (0.0, 0.0);
        }
        let amplitude = self.amplitude();
        let dx = (rng.gen::<f32>() - 0.5) * 2.0 * amplitude;
        let dy = (rng.gen::<f32>() - 0.5) * 2.0 * amplitude;
        self.remaining_ms = (self.remaining_ms - Self::TICK_MS).max(0.0);
        (dx, dy)
    }
}

// =============================================================================
// Asymmetric ramp
// =============================================================================

/// Scalar in [0, 1] that ramps up and down at different speeds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ramp {
    value: f32,
    rising: bool,
    rise_rate: f32,
    fall_rate: f32,
}

impl Ramp {
    /// Create a ramp at 0.
    #[must_use]
    pub const fn new(rise_rate: f32, fall_rate: f32) -> Self {
        Self {
            value: 0.0,
            rising: false,
            rise_rate,
            fall_rate,
        }
    }

    /// Choose the direction.
    pub fn set_rising(&mut self, rising: bool) {
        self.rising = rising;
    }

    /// Whether the ramp is heading to 1.
    #[must_use]
    pub const fn is_rising(&self) -> bool {
        self.rising
    }

    /// Advance by `delta` frames.
    pub fn advance(&mut self, delta: f64) {
        let delta = delta.max(0.0) as f32;
        self.value = if self.rising {
            self.rise_rate.mul_add(delta, self.value).min(1.0)
        } else {
            self.fall_rate.mul_add(-delta, self.value).max(0.0)
        };
    }

    /// Current value.
    #[must_use]
    pub const fn value(&self) -> f32 {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_smoothed_first_target_snaps() {
        let mut s = Smoothed::new(0.12);
        assert!(!s.has_value());
        s.set_target(72.0);
        assert_eq!(s.value(), 72.0);
        s.set_target(100.0);
        assert_eq!(s.value(), 72.0);
        s.advance(1.0);
        assert!(s.value() > 72.0 && s.value() < 100.0);
    }

    #[test]
    fn test_smoothed_large_delta_does_not_overshoot() {
        let mut s = Smoothed::with_initial(0.0, 0.5);
        s.set_target(10.0);
        assert_eq!(s.advance(100.0), 10.0);
    }

    #[test]
    fn test_smoothed_ignores_non_finite() {
        let mut s = Smoothed::with_initial(5.0, 0.1);
        s.set_target(f64::NAN);
        s.set_target(f64::INFINITY);
        assert_eq!(s.target(), 5.0);
    }

    #[test]
    fn test_smoothed_snap() {
        let mut s = Smoothed::with_initial(5.0, 0.1);
        s.set_target(50.0);
        s.snap(20.0);
        assert!(s.is_settled(0.0));
        assert_eq!(s.value(), 20.0);
    }

    #[test]
    fn test_flash_decays_to_zero_in_about_a_second() {
        let mut flash = Flash::new();
        assert!(flash.overlay().is_none());
        flash.trigger(Color::ALARM);
        assert_eq!(flash.alpha(), Flash::PEAK_ALPHA);
        for _ in 0..30 {
            flash.advance(1.0);
        }
        assert!(flash.alpha() > 0.0);
        for _ in 0..31 {
            flash.advance(1.0);
        }
        assert!(flash.overlay().is_none());
    }

    #[test]
    fn test_color_transition_reaches_target() {
        let mut t = ColorTransition::settled(Color::HEALTHY);
        t.retarget(Color::ALARM);
        assert_eq!(t.current(), Color::HEALTHY);
        for _ in 0..130 {
            t.advance(1.0);
        }
        assert!(t.is_settled());
        assert_eq!(t.current().to_rgb8(), Color::ALARM.to_rgb8());
    }

    #[test]
    fn test_color_transition_retarget_midway_is_continuous() {
        let mut t = ColorTransition::settled(Color::HEALTHY);
        t.retarget(Color::ALARM);
        for _ in 0..40 {
            t.advance(1.0);
        }
        let before = t.current();
        t.retarget(Color::CALM);
        assert_eq!(t.current(), before);
        assert_eq!(t.target(), Color::CALM);
    }

    #[test]
    fn test_shake_falls_off_and_stops() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut shake = ScreenShake::new();
        assert_eq!(shake.sample(&mut rng), (0.0, 0.0));
        shake.trigger(400.0, 5.0);
        let mut samples = 0;
        while shake.is_active() {
            let amp = shake.amplitude();
            let (dx, dy) = shake.sample(&mut rng);
            assert!(dx.abs() <= amp && dy.abs() <= amp);
            samples += 1;
        }
        assert_eq!(samples, 25);
        assert_eq!(shake.sample(&mut rng), (0.0, 0.0));
    }

    #[test]
    fn test_shake_ignores_degenerate_trigger() {
        let mut shake = ScreenShake::new();
        shake.trigger(0.0, 4.0);
        assert!(!shake.is_active());
    }

    #[test]
    fn test_ramp_falls_twice_as_fast() {
        let mut ramp = Ramp::new(0.006, 0.012);
        ramp.set_rising(true);
        for _ in 0..100 {
            ramp.advance(1.0);
        }
        assert!((ramp.value() - 0.6).abs() < 1e-4);
        ramp.set_rising(false);
        for _ in 0..50 {
            ramp.advance(1.0);
        }
        assert!(ramp.value() < 1e-4);
    }

    proptest! {
        #[test]
        fn prop_smoothed_distance_strictly_decreases(
            start in -500.0f64..500.0,
            target in -500.0f64..500.0,
            rate in 0.01f64..0.5,
        ) {
            let mut s = Smoothed::with_initial(start, rate);
            s.set_target(target);
            let mut distance = (target - start).abs();
            let bound = (30.0 / rate).ceil() as usize;
            for _ in 0..bound {
                if distance < 1e-9 {
                    break;
                }
                s.advance(1.0);
                let next = (target - s.value()).abs();
                prop_assert!(next < distance);
                distance = next;
            }
            prop_assert!(s.is_settled(1e-9 + 1e-10 * target.abs().max(start.abs())));
        }

        #[test]
        fn prop_transition_red_monotonic(steps in 1usize..300) {
            let mut t = ColorTransition::settled(Color::HEALTHY);
            t.retarget(Color::ALARM);
            let mut last = t.current().r;
            for _ in 0..steps {
                t.advance(1.0);
                let r = t.current().r;
                prop_assert!(r >= last);
                last = r;
            }
        }
    }
}
