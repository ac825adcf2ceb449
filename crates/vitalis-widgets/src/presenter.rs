//! The presenter lifecycle shared by every view.

use vitalis_core::engine::Engine;
use vitalis_core::transport::Dialer;
use vitalis_core::{
    Canvas, EngineEvent, FrameHandle, FrameScheduler, FrameTick, Intervention, InterventionLog,
    PlantHealth, Rect, StateModel,
};

/// Read-only view of the engine handed to presenters.
#[derive(Debug, Clone, Copy)]
pub struct Scene<'a> {
    /// Authoritative biometric and cognitive state
    pub model: &'a StateModel,
    /// Recent interventions
    pub interventions: &'a InterventionLog,
    /// Plant health
    pub plant: &'a PlantHealth,
    /// Intervention currently shown, if any
    pub bubble: Option<&'a Intervention>,
    /// Frame timestamp
    pub now_ms: u64,
}

impl<'a> Scene<'a> {
    /// Borrow the models out of an engine.
    pub fn from_engine<D: Dialer>(engine: &'a Engine<D>, now_ms: u64) -> Self {
        Self {
            model: engine.model(),
            interventions: engine.interventions(),
            plant: engine.plant(),
            bubble: engine.bubble().current(),
            now_ms,
        }
    }
}

/// A view driven by engine events and animation frames.
///
/// A presenter registers a frame callback in [`Presenter::open`] and must
/// cancel it, together with every timer it owns, in [`Presenter::close`].
pub trait Presenter {
    /// Start animating; registers a frame callback.
    fn open(&mut self, frames: &mut FrameScheduler, now_ms: u64);

    /// React to a model change.
    fn on_event(&mut self, event: &EngineEvent, scene: &Scene<'_>);

    /// Advance one animation frame.
    fn advance(&mut self, tick: FrameTick, scene: &Scene<'_>);

    /// Paint the current frame.
    fn paint(&self, canvas: &mut dyn Canvas, scene: &Scene<'_>);

    /// Move to new bounds. Waveform history survives.
    fn resize(&mut self, bounds: Rect);

    /// Stop animating; cancels the frame callback and all timers.
    fn close(&mut self, frames: &mut FrameScheduler);

    /// Whether the presenter holds a live frame callback.
    fn is_open(&self, frames: &FrameScheduler) -> bool;
}

/// Frame-callback bookkeeping shared by the presenters.
#[derive(Debug, Default)]
pub struct FrameSlot {
    handle: Option<FrameHandle>,
}

impl FrameSlot {
    /// Register a callback unless one is already held.
    pub fn acquire(&mut self, frames: &mut FrameScheduler) {
        if self.handle.is_none() {
            self.handle = Some(frames.request());
        }
    }

    /// Cancel the held callback, if any.
    pub fn release(&mut self, frames: &mut FrameScheduler) {
        if let Some(handle) = self.handle.take() {
            frames.cancel(handle);
        }
    }

    /// Whether the held callback is still registered.
    #[must_use]
    pub fn is_active(&self, frames: &FrameScheduler) -> bool {
        self.handle.as_ref().is_some_and(|h| frames.is_active(h))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_slot_acquire_once() {
        let mut frames = FrameScheduler::new();
        let mut slot = FrameSlot::default();
        slot.acquire(&mut frames);
        slot.acquire(&mut frames);
        assert_eq!(frames.active_count(), 1);
        assert!(slot.is_active(&frames));
        slot.release(&mut frames);
        slot.release(&mut frames);
        assert_eq!(frames.active_count(), 0);
        assert!(!slot.is_active(&frames));
    }
}
