//! Named, cancellable timers and frame-callback registration.
//!
//! Nothing here reads a clock: every query takes `now_ms`, a monotonic
//! millisecond timestamp supplied by the caller. That keeps reconnect,
//! debounce and auto-dismiss logic testable without sleeping.

use std::collections::BTreeSet;

/// Nominal duration of one animation frame in milliseconds.
pub const FRAME_MS: f64 = 1000.0 / 60.0;

/// A one-shot deferred action.
///
/// Scheduling while pending replaces the previous deadline, so at most one
/// firing is ever outstanding per handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deferred {
    name: &'static str,
    delay_ms: u64,
    deadline: Option<u64>,
}

impl Deferred {
    /// Create an idle timer.
    #[must_use]
    pub const fn new(name: &'static str, delay_ms: u64) -> Self {
        Self {
            name,
            delay_ms,
            deadline: None,
        }
    }

    /// Timer name, for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Configured delay.
    #[must_use]
    pub const fn delay_ms(&self) -> u64 {
        self.delay_ms
    }

    /// Arm the timer to fire `delay_ms` after `now_ms`, cancelling any pending deadline.
    pub fn schedule(&mut self, now_ms: u64) {
        self.deadline = Some(now_ms.saturating_add(self.delay_ms));
    }

    /// Disarm the timer.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Check if a firing is outstanding.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Pending deadline, if armed.
    #[must_use]
    pub const fn deadline(&self) -> Option<u64> {
        self.deadline
    }

    /// Fire if due. Returns `true` exactly once per scheduling.
    pub fn fire(&mut self, now_ms: u64) -> bool {
        match self.deadline {
            Some(deadline) if now_ms >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// A periodic timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repeating {
    name: &'static str,
    period_ms: u64,
    next: Option<u64>,
}

impl Repeating {
    /// Create a stopped timer.
    #[must_use]
    pub const fn new(name: &'static str, period_ms: u64) -> Self {
        Self {
            name,
            period_ms,
            next: None,
        }
    }

    /// Timer name, for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Current period.
    #[must_use]
    pub const fn period_ms(&self) -> u64 {
        self.period_ms
    }

    /// Start ticking; the first tick is one period after `now_ms`.
    pub fn start(&mut self, now_ms: u64) {
        self.next = Some(now_ms.saturating_add(self.period_ms.max(1)));
    }

    /// Stop ticking.
    pub fn stop(&mut self) {
        self.next = None;
    }

    /// Check if the timer is running.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.next.is_some()
    }

    /// Change the period. A running timer restarts from `now_ms`.
    pub fn set_period(&mut self, period_ms: u64, now_ms: u64) {
        if period_ms == self.period_ms {
            return;
        }
        self.period_ms = period_ms;
        if self.is_running() {
            self.start(now_ms);
        }
    }

    /// Fire if a period has elapsed. Missed periods collapse into one tick.
    pub fn fire(&mut self, now_ms: u64) -> bool {
        match self.next {
            Some(next) if now_ms >= next => {
                let period = self.period_ms.max(1);
                let missed = (now_ms - next) / period;
                self.next = Some(next + (missed + 1) * period);
                true
            }
            _ => false,
        }
    }
}

/// Token for a registered frame callback.
///
/// Not `Clone`: whoever holds it is the only one able to cancel it.
#[derive(Debug, PartialEq, Eq)]
pub struct FrameHandle(u64);

/// Registry of live frame callbacks.
///
/// Presenters request a handle when opened and must hand it back on close;
/// the frame loop only advances presenters whose handle is still active.
#[derive(Debug, Default)]
pub struct FrameScheduler {
    next_id: u64,
    active: BTreeSet<u64>,
}

impl FrameScheduler {
    /// Create an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new frame callback.
    pub fn request(&mut self) -> FrameHandle {
        self.next_id += 1;
        self.active.insert(self.next_id);
        FrameHandle(self.next_id)
    }

    /// Cancel a frame callback, consuming its handle.
    pub fn cancel(&mut self, handle: FrameHandle) {
        self.active.remove(&handle.0);
    }

    /// Check if a handle is still registered.
    #[must_use]
    pub fn is_active(&self, handle: &FrameHandle) -> bool {
        self.active.contains(&handle.0)
    }

    /// Number of registered callbacks.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}

/// Timing of a single animation frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTick {
    /// Monotonic timestamp of this frame
    pub now_ms: u64,
    /// Milliseconds since the previous frame
    pub dt_ms: f64,
}

impl FrameTick {
    /// Longest frame delta fed into animation integrators.
    pub const MAX_DT_MS: f64 = 50.0;

    /// Create a frame tick.
    #[must_use]
    pub const fn new(now_ms: u64, dt_ms: f64) -> Self {
        Self { now_ms, dt_ms }
    }

    /// Frame delta in nominal frames (1.0 at 60 fps), clamped to `MAX_DT_MS`.
    #[must_use]
    pub fn delta(&self) -> f64 {
        self.clamped_ms() / FRAME_MS
    }

    /// Frame delta in milliseconds, clamped to `[0, MAX_DT_MS]`.
    #[must_use]
    pub fn clamped_ms(&self) -> f64 {
        if self.dt_ms.is_finite() {
            self.dt_ms.clamp(0.0, Self::MAX_DT_MS)
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deferred_fires_once() {
        let mut t = Deferred::new("reconnect", 3000);
        assert!(!t.fire(10_000));
        t.schedule(0);
        assert!(t.is_pending());
        assert!(!t.fire(2999));
        assert!(t.fire(3000));
        assert!(!t.fire(3001));
        assert!(!t.is_pending());
    }

    #[test]
    fn test_deferred_reschedule_replaces() {
        let mut t = Deferred::new("debounce", 1500);
        t.schedule(0);
        t.schedule(1000);
        assert_eq!(t.deadline(), Some(2500));
        assert!(!t.fire(1500));
        assert!(t.fire(2500));
    }

    #[test]
    fn test_deferred_cancel() {
        let mut t = Deferred::new("dismiss", 15_000);
        t.schedule(0);
        t.cancel();
        assert!(!t.fire(u64::MAX));
        assert_eq!(t.name(), "dismiss");
    }

    #[test]
    fn test_repeating_collapses_missed_periods() {
        let mut clock = Repeating::new("clock", 1000);
        clock.start(0);
        assert!(!clock.fire(999));
        assert!(clock.fire(1000));
        assert!(!clock.fire(1500));
        assert!(clock.fire(5500));
        assert!(!clock.fire(5900));
        assert!(clock.fire(6000));
    }

    #[test]
    fn test_repeating_stop_and_period_change() {
        let mut pulse = Repeating::new("heartbeat", 833);
        pulse.start(0);
        pulse.set_period(500, 100);
        assert_eq!(pulse.period_ms(), 500);
        assert!(!pulse.fire(599));
        assert!(pulse.fire(600));
        pulse.stop();
        assert!(!pulse.fire(10_000));
    }

    #[test]
    fn test_frame_scheduler_cancel() {
        let mut frames = FrameScheduler::new();
        let a = frames.request();
        let b = frames.request();
        assert_eq!(frames.active_count(), 2);
        frames.cancel(a);
        assert_eq!(frames.active_count(), 1);
        assert!(frames.is_active(&b));
    }

    #[test]
    fn test_frame_tick_clamps() {
        assert_eq!(FrameTick::new(0, 500.0).clamped_ms(), 50.0);
        assert_eq!(FrameTick::new(0, -3.0).clamped_ms(), 0.0);
        assert_eq!(FrameTick::new(0, f64::NAN).delta(), 0.0);
        assert!((FrameTick::new(0, FRAME_MS).delta() - 1.0).abs() < 1e-9);
    }
}
