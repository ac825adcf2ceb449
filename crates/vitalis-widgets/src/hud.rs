//! Compact heads-up read-out: state, heart rate, connection, stress and an ECG.

use crate::ecg::EcgTrace;
use crate::format::{self, SLEEP_COLOR};
use crate::gauge;
use crate::presenter::{FrameSlot, Presenter, Scene};
use vitalis_core::{
    Canvas, Color, EngineEvent, FrameScheduler, FrameTick, Point, Rect, StateModel, TextAlign,
    TextStyle,
};

const PANEL_ALPHA: f32 = 0.6;
const HEADER_ROWS: f32 = 3.0;

/// Heads-up display.
#[derive(Debug)]
pub struct HudPresenter {
    bounds: Rect,
    trace: EcgTrace,
    frame: FrameSlot,
}

impl HudPresenter {
    /// Create a HUD occupying `bounds`.
    #[must_use]
    pub fn new(bounds: Rect) -> Self {
        Self {
            bounds,
            trace: EcgTrace::new(Self::trace_bounds(bounds)),
            frame: FrameSlot::default(),
        }
    }

    fn trace_bounds(bounds: Rect) -> Rect {
        let inner = bounds.inset(1.0);
        Rect::new(
            inner.x,
            inner.y + HEADER_ROWS,
            inner.width,
            (inner.height - HEADER_ROWS).max(0.0),
        )
    }

    /// The ECG trace.
    #[must_use]
    pub const fn trace(&self) -> &EcgTrace {
        &self.trace
    }

    fn accent(model: &StateModel) -> Color {
        if model.is_sleep_mode() {
            SLEEP_COLOR
        } else {
            model.state().profile().color
        }
    }

    fn displayed_bpm(model: &StateModel) -> Option<f64> {
        let hr = model.display().heart_rate;
        (hr.has_value() && model.target_bpm().is_some()).then(|| hr.value())
    }
}

impl Presenter for HudPresenter {
    fn open(&mut self, frames: &mut FrameScheduler, _now_ms: u64) {
        self.frame.acquire(frames);
    }

    fn on_event(&mut self, _event: &EngineEvent, _scene: &Scene<'_>) {}

    fn advance(&mut self, tick: FrameTick, scene: &Scene<'_>) {
        self.trace.advance(tick.clamped_ms(), scene.model);
    }

    fn paint(&self, canvas: &mut dyn Canvas, scene: &Scene<'_>) {
        let model = scene.model;
        let accent = Self::accent(model);
        let inner = self.bounds.inset(1.0);

        canvas.fill_rect(self.bounds, Color::BLACK.with_alpha(PANEL_ALPHA));
        canvas.stroke_rect(self.bounds, accent, 1.0);

        canvas.draw_text(
            model.state().label(),
            Point::new(inner.x, inner.y),
            &TextStyle::colored(accent).bold(),
        );
        let (dot, dot_color) = if model.is_connected() {
            ("● LIVE", Color::HEALTHY)
        } else {
            ("● OFFLINE", Color::ALARM)
        };
        canvas.draw_text(
            dot,
            Point::new(inner.right(), inner.y),
            &TextStyle::colored(dot_color).with_align(TextAlign::Right),
        );

        let alarm = format::is_model_alarm(model);
        let bpm = Self::displayed_bpm(model);
        let bpm_color = if alarm {
            Color::ALARM
        } else {
            format::bpm_color(bpm)
        };
        canvas.draw_text(
            &format!("♥ {} BPM", format::bpm(bpm)),
            Point::new(inner.x, inner.y + 1.0),
            &TextStyle::colored(bpm_color).bold(),
        );
        if model.is_sleep_mode() {
            canvas.draw_text(
                "SLEEP",
                Point::new(inner.right(), inner.y + 1.0),
                &TextStyle::colored(SLEEP_COLOR).with_align(TextAlign::Right),
            );
        }

        let stress = model.display().stress;
        let stress_value = if stress.has_value() { stress.value() } else { 0.0 };
        canvas.draw_text(
            "STRESS",
            Point::new(inner.x, inner.y + 2.0),
            &TextStyle::colored(format::MUTED),
        );
        gauge::paint_bar(
            canvas,
            Rect::new(inner.x + 7.0, inner.y + 2.0, (inner.width - 7.0).max(0.0), 1.0),
            (stress_value / 3.0) as f32,
            format::stress_color(stress_value),
        );

        let trace_color = if model.is_sleep_mode() {
            SLEEP_COLOR
        } else if alarm {
            Color::ALARM
        } else {
            accent
        };
        self.trace.paint(canvas, trace_color);
    }

    fn resize(&mut self, bounds: Rect) {
        self.bounds = bounds;
        self.trace.resize(Self::trace_bounds(bounds));
    }

    fn close(&mut self, frames: &mut FrameScheduler) {
        self.frame.release(frames);
    }

    fn is_open(&self, frames: &FrameScheduler) -> bool {
        self.frame.is_active(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitalis_core::{BiometricUpdate, InterventionLog, PlantHealth, RecordingCanvas};

    fn scene<'a>(
        model: &'a StateModel,
        log: &'a InterventionLog,
        plant: &'a PlantHealth,
    ) -> Scene<'a> {
        Scene {
            model,
            interventions: log,
            plant,
            bubble: None,
            now_ms: 0,
        }
    }

    fn hud() -> HudPresenter {
        HudPresenter::new(Rect::new(40.0, 0.0, 34.0, 10.0))
    }

    #[test]
    fn test_placeholders_before_data() {
        let (model, log, plant) = (StateModel::new(), InterventionLog::default(), PlantHealth::new());
        let mut canvas = RecordingCanvas::new();
        hud().paint(&mut canvas, &scene(&model, &log, &plant));
        assert!(canvas.has_text("♥ -- BPM"));
        assert!(canvas.has_text("● OFFLINE"));
        assert!(canvas.has_text("RELAXED"));
        assert!(!canvas.texts().iter().any(|t| t.contains("NaN")));
    }

    #[test]
    fn test_alarm_above_one_hundred() {
        let mut model = StateModel::new();
        let (log, plant) = (InterventionLog::default(), PlantHealth::new());
        let (sample, _) = model.apply_biometric(&BiometricUpdate {
            heart_rate: Some(140.0),
            ..BiometricUpdate::default()
        });
        model.set_connected(true, 0);
        let mut hud = hud();
        hud.on_event(&EngineEvent::SampleUpdated(sample), &scene(&model, &log, &plant));
        assert!(format::is_model_alarm(&model));

        let mut canvas = RecordingCanvas::new();
        hud.paint(&mut canvas, &scene(&model, &log, &plant));
        assert_eq!(canvas.text_color("♥ 140 BPM"), Some(Color::ALARM));
        assert!(canvas.has_text("● LIVE"));
    }

    #[test]
    fn test_sleep_label() {
        let mut model = StateModel::new();
        model.set_sleep_mode(true);
        let (log, plant) = (InterventionLog::default(), PlantHealth::new());
        let mut canvas = RecordingCanvas::new();
        hud().paint(&mut canvas, &scene(&model, &log, &plant));
        assert_eq!(canvas.text_color("SLEEP"), Some(SLEEP_COLOR));
    }

    #[test]
    fn test_close_cancels_frame_callback() {
        let mut frames = FrameScheduler::new();
        let mut hud = hud();
        hud.open(&mut frames, 0);
        assert!(hud.is_open(&frames));
        hud.close(&mut frames);
        assert!(!hud.is_open(&frames));
        assert_eq!(frames.active_count(), 0);
    }

    #[test]
    fn test_resize_keeps_trace_history() {
        let (model, log, plant) = (StateModel::new(), InterventionLog::default(), PlantHealth::new());
        let mut hud = hud();
        for i in 0..100 {
            hud.advance(FrameTick::new(i * 16, 16.0), &scene(&model, &log, &plant));
        }
        let before: Vec<f32> = hud.trace().synth().buffer().iter().collect();
        hud.resize(Rect::new(0.0, 0.0, 44.0, 12.0));
        let after: Vec<f32> = hud.trace().synth().buffer().iter().collect();
        assert_eq!(after.len(), 42);
        assert_eq!(after[after.len() - before.len()..], before[..]);
    }
}
