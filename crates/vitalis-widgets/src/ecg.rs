//! ECG trace: a waveform synthesizer bound to a rectangle.

use vitalis_core::{Canvas, Color, Point, Rect, StateModel, WaveformSynth};

/// A synthesized ECG line filling its bounds.
///
/// One sample per horizontal unit, so the buffer is exactly as long as the
/// trace is wide.
#[derive(Debug, Clone)]
pub struct EcgTrace {
    synth: WaveformSynth,
    bounds: Rect,
}

impl EcgTrace {
    /// Create a trace for `bounds`.
    #[must_use]
    pub fn new(bounds: Rect) -> Self {
        Self {
            synth: WaveformSynth::new(Self::width_of(bounds)),
            bounds,
        }
    }

    fn width_of(bounds: Rect) -> usize {
        if bounds.width.is_finite() && bounds.width > 0.0 {
            bounds.width.floor() as usize
        } else {
            0
        }
    }

    /// Follow the model's heart rate and sleep state, then advance one tick.
    pub fn advance(&mut self, delta_ms: f64, model: &StateModel) {
        if let Some(bpm) = model.target_bpm() {
            self.synth.set_target_bpm(bpm);
        }
        self.synth.set_rest_mode(model.is_sleep_mode());
        self.synth.tick(delta_ms);
    }

    /// Move to new bounds, keeping the most recent samples.
    pub fn resize(&mut self, bounds: Rect) {
        self.bounds = bounds;
        self.synth.resize(Self::width_of(bounds));
    }

    /// Current bounds.
    #[must_use]
    pub const fn bounds(&self) -> Rect {
        self.bounds
    }

    /// The underlying synthesizer.
    #[must_use]
    pub const fn synth(&self) -> &WaveformSynth {
        &self.synth
    }

    /// Map the buffer to surface points, oldest sample on the left. Lower
    /// samples land higher, so the R peak points up.
    #[must_use]
    pub fn points(&self) -> Vec<Point> {
        let b = self.bounds;
        self.synth
            .buffer()
            .iter()
            .enumerate()
            .map(|(i, sample)| {
                Point::new(
                    b.x + i as f32,
                    sample.clamp(0.0, 1.0).mul_add(b.height, b.y),
                )
            })
            .collect()
    }

    /// Stroke the trace.
    pub fn paint(&self, canvas: &mut dyn Canvas, color: Color) {
        let points = self.points();
        if points.len() >= 2 {
            canvas.push_clip(self.bounds);
            canvas.stroke_path(&points, color, 1.5);
            canvas.pop_clip();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitalis_core::{BiometricUpdate, DrawCommand, RecordingCanvas};

    #[test]
    fn test_buffer_matches_width() {
        let trace = EcgTrace::new(Rect::new(0.0, 0.0, 40.5, 10.0));
        assert_eq!(trace.synth().buffer().len(), 40);
        assert!(EcgTrace::new(Rect::new(0.0, 0.0, 0.0, 5.0)).points().is_empty());
    }

    #[test]
    fn test_follows_model_heart_rate() {
        let mut model = StateModel::new();
        model.apply_biometric(&BiometricUpdate {
            heart_rate: Some(130.0),
            ..BiometricUpdate::default()
        });
        let mut trace = EcgTrace::new(Rect::new(0.0, 0.0, 50.0, 10.0));
        trace.advance(16.0, &model);
        assert_eq!(trace.synth().target_bpm(), 130.0);
    }

    #[test]
    fn test_rest_mode_tracks_sleep() {
        let mut model = StateModel::new();
        model.set_sleep_mode(true);
        let mut trace = EcgTrace::new(Rect::new(0.0, 0.0, 50.0, 10.0));
        for _ in 0..200 {
            trace.advance(16.0, &model);
        }
        assert!(trace.synth().is_resting());
        assert!(trace
            .synth()
            .buffer()
            .iter()
            .all(|s| (0.5 - 0.06 - 1e-6..=0.5 + 0.06 + 1e-6).contains(&s)));
    }

    #[test]
    fn test_resize_keeps_tail() {
        let model = StateModel::new();
        let mut trace = EcgTrace::new(Rect::new(0.0, 0.0, 30.0, 10.0));
        for _ in 0..120 {
            trace.advance(16.0, &model);
        }
        let tail: Vec<f32> = trace.synth().buffer().iter().skip(10).collect();
        trace.resize(Rect::new(0.0, 0.0, 20.0, 10.0));
        let kept: Vec<f32> = trace.synth().buffer().iter().collect();
        assert_eq!(kept, tail);
    }

    #[test]
    fn test_r_peak_drawn_above_baseline() {
        let mut model = StateModel::new();
        model.apply_biometric(&BiometricUpdate {
            heart_rate: Some(70.0),
            ..BiometricUpdate::default()
        });
        let mut trace = EcgTrace::new(Rect::new(0.0, 0.0, 60.0, 10.0));
        for _ in 0..500 {
            trace.advance(16.0, &model);
            if trace.synth().buffer().iter().any(|s| s < 0.1) {
                break;
            }
        }
        let samples: Vec<f32> = trace.synth().buffer().iter().collect();
        let points = trace.points();
        let peak = samples
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .expect("samples");
        let baseline = samples
            .iter()
            .position(|s| (*s - vitalis_core::waveform::BASELINE).abs() < 1e-6)
            .expect("baseline sample");

        assert!(samples[peak] < 0.1);
        assert!(points[peak].y < points[baseline].y);
        assert!((points[baseline].y - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_paint_clips_to_bounds() {
        let trace = EcgTrace::new(Rect::new(5.0, 2.0, 20.0, 6.0));
        let mut canvas = RecordingCanvas::new();
        trace.paint(&mut canvas, Color::HEALTHY);
        let path = canvas.commands().iter().find_map(|c| match c {
            DrawCommand::StrokePath { points, .. } => Some(points.clone()),
            _ => None,
        });
        let path = path.expect("trace stroked");
        assert_eq!(path.len(), 20);
        assert!(path.iter().all(|p| p.y >= 2.0 && p.y <= 8.0));
        assert_eq!(canvas.current_clip(), None);
    }
}
