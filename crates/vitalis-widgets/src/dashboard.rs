//! Full-screen telemetry dashboard.
//!
//! Layout, top to bottom: title and wall clock, session status, a two-column
//! body (vitals and gauges on the left, intervention log and plant on the
//! right) and an ECG strip along the bottom edge.

use crate::ecg::EcgTrace;
use crate::format::{self, MUTED, SLEEP_COLOR};
use crate::fx;
use crate::gauge;
use crate::presenter::{FrameSlot, Presenter, Scene};
use chrono::Local;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;
use vitalis_core::particles::{self, LEAF_CHANCE, SPARKLE_CHANCE};
use vitalis_core::{
    Canvas, Color, Deferred, EngineEvent, Flash, FrameScheduler, FrameTick, Particle,
    ParticleField, Point, Rect, Repeating, StateModel, TextAlign, TextStyle,
};

const HEADER_ROWS: f32 = 3.0;
const TRACE_ROWS: f32 = 6.0;
const SPARKLINE_ROWS: f32 = 3.0;
const GAUGE_RADIUS: f32 = 3.0;
const PLANT_ROWS: f32 = 4.0;
const PLANT_FX_LIMIT: usize = 40;
/// How long the heart-rate read-out stays dim after a beat.
pub const HEARTBEAT_DIM_MS: u64 = 100;

/// Screen regions derived from the outer bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Layout {
    inner: Rect,
    left: Rect,
    right: Rect,
    plant: Rect,
    trace: Rect,
}

impl Layout {
    fn new(bounds: Rect) -> Self {
        let inner = bounds.inset(1.0);
        let trace_rows = TRACE_ROWS.min(inner.height);
        let trace = Rect::new(
            inner.x,
            inner.bottom() - trace_rows,
            inner.width,
            trace_rows,
        );
        let body = Rect::new(
            inner.x,
            inner.y + HEADER_ROWS,
            inner.width,
            (inner.height - HEADER_ROWS - trace_rows).max(0.0),
        );
        let (left, right) = body.split_horizontal(0.5);
        let plant_rows = PLANT_ROWS.min(right.height);
        let plant = Rect::new(
            right.x,
            right.bottom() - plant_rows,
            right.width,
            plant_rows,
        );
        Self {
            inner,
            left,
            right,
            plant,
            trace,
        }
    }
}

fn local_clock() -> String {
    format::wall_clock(&Local::now())
}

/// The dashboard.
#[derive(Debug)]
pub struct DashboardPresenter {
    bounds: Rect,
    layout: Layout,
    trace: EcgTrace,
    frame: FrameSlot,
    clock: Repeating,
    clock_source: fn() -> String,
    clock_text: String,
    heartbeat: Repeating,
    heartbeat_dim: Deferred,
    dimmed: bool,
    border: Flash,
    plant_fx: ParticleField,
    rng: StdRng,
}

impl DashboardPresenter {
    /// Create a dashboard occupying `bounds`; the wall clock refreshes every
    /// `clock_period_ms`.
    #[must_use]
    pub fn new(bounds: Rect, clock_period_ms: u64) -> Self {
        Self::with_rng(bounds, clock_period_ms, StdRng::from_entropy())
    }

    /// Create a dashboard with a seeded random source for the plant particles.
    #[must_use]
    pub fn with_seed(bounds: Rect, clock_period_ms: u64, seed: u64) -> Self {
        Self::with_rng(bounds, clock_period_ms, StdRng::seed_from_u64(seed))
    }

    fn with_rng(bounds: Rect, clock_period_ms: u64, rng: StdRng) -> Self {
        let layout = Layout::new(bounds);
        Self {
            bounds,
            layout,
            trace: EcgTrace::new(layout.trace),
            frame: FrameSlot::default(),
            clock: Repeating::new("dashboard-clock", clock_period_ms),
            clock_source: local_clock,
            clock_text: format::PLACEHOLDER_SHORT.to_string(),
            heartbeat: Repeating::new("dashboard-heartbeat", format::heartbeat_period_ms(0.0)),
            heartbeat_dim: Deferred::new("dashboard-heartbeat-dim", HEARTBEAT_DIM_MS),
            dimmed: false,
            border: Flash::new(),
            plant_fx: ParticleField::new(PLANT_FX_LIMIT).with_bounds(layout.plant),
            rng,
        }
    }

    /// Replace the wall-clock source.
    #[must_use]
    pub fn with_clock_source(mut self, source: fn() -> String) -> Self {
        self.clock_source = source;
        self
    }

    /// Text shown by the wall clock.
    #[must_use]
    pub fn clock_text(&self) -> &str {
        &self.clock_text
    }

    /// Whether the heart-rate read-out is in its post-beat dim phase.
    #[must_use]
    pub const fn is_dimmed(&self) -> bool {
        self.dimmed
    }

    /// Current heartbeat pulse period.
    #[must_use]
    pub const fn heartbeat_period_ms(&self) -> u64 {
        self.heartbeat.period_ms()
    }

    /// Whether any dashboard timer is still armed.
    #[must_use]
    pub const fn has_running_timers(&self) -> bool {
        self.clock.is_running() || self.heartbeat.is_running() || self.heartbeat_dim.is_pending()
    }

    /// Border pulse alpha.
    #[must_use]
    pub const fn border_pulse(&self) -> f32 {
        self.border.alpha()
    }

    /// Sparkles and leaves around the plant read-out.
    #[must_use]
    pub const fn plant_particles(&self) -> &ParticleField {
        &self.plant_fx
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

    fn run_timers(&mut self, now_ms: u64, model: &StateModel) {
        if self.clock.fire(now_ms) {
            self.clock_text = (self.clock_source)();
        }
        if let Some(bpm) = model.target_bpm() {
            self.heartbeat
                .set_period(format::heartbeat_period_ms(bpm), now_ms);
        }
        if self.heartbeat.fire(now_ms) {
            self.dimmed = true;
            self.heartbeat_dim.schedule(now_ms);
        }
        if self.heartbeat_dim.fire(now_ms) {
            self.dimmed = false;
        }
    }

    fn emit_plant_particles(&mut self, delta: f64, scene: &Scene<'_>) {
        let stage = scene.plant.stage();
        let area = self.layout.plant;
        let origin = Point::new(area.center().x, area.y + 1.0);
        let spread = area.width * 0.5;
        if stage.sparkles() && particles::roll(&mut self.rng, SPARKLE_CHANCE, delta) {
            let sparkle = Particle::sparkle(&mut self.rng, origin, spread);
            self.plant_fx.spawn(sparkle);
        }
        if stage.sheds_leaves() && particles::roll(&mut self.rng, LEAF_CHANCE, delta) {
            let leaf = Particle::leaf(&mut self.rng, origin, spread, stage.leaf_color());
            self.plant_fx.spawn(leaf);
        }
        self.plant_fx.step(delta, &mut self.rng);
    }

    fn paint_header(&self, canvas: &mut dyn Canvas, scene: &Scene<'_>, accent: Color) {
        let inner = self.layout.inner;
        canvas.draw_text(
            "VITALIS TELEMETRY",
            Point::new(inner.x, inner.y),
            &TextStyle::colored(accent).bold(),
        );
        canvas.draw_text(
            &self.clock_text,
            Point::new(inner.right(), inner.y),
            &TextStyle::colored(Color::WHITE).with_align(TextAlign::Right),
        );

        let model = scene.model;
        let (label, color) = if model.is_connected() {
            ("SESSION ACTIVE", Color::HEALTHY)
        } else {
            ("OFFLINE", Color::ALARM)
        };
        canvas.draw_text(label, Point::new(inner.x, inner.y + 1.0), &TextStyle::colored(color));
        canvas.draw_text(
            &format::session_timer(model.session_elapsed_ms(scene.now_ms)),
            Point::new(inner.right(), inner.y + 1.0),
            &TextStyle::colored(MUTED).with_align(TextAlign::Right),
        );
    }

    fn paint_vitals(&self, canvas: &mut dyn Canvas, scene: &Scene<'_>, accent: Color) {
        let model = scene.model;
        let display = model.display();
        let left = self.layout.left;
        let mut y = left.y;

        let bpm = (display.heart_rate.has_value() && model.target_bpm().is_some())
            .then(|| display.heart_rate.value());
        let mut bpm_color = if format::is_model_alarm(model) {
            Color::ALARM
        } else {
            format::bpm_color(bpm)
        };
        if self.dimmed {
            bpm_color = bpm_color.with_alpha(0.5);
        }
        canvas.draw_text(
            &format!("♥ {} BPM", format::bpm(bpm)),
            Point::new(left.x, y),
            &TextStyle::colored(bpm_color).bold(),
        );
        y += 1.0;

        let state_color = if model.is_sleep_mode() { SLEEP_COLOR } else { accent };
        canvas.draw_text(
            model.state().label(),
            Point::new(left.x, y),
            &TextStyle::colored(state_color),
        );
        y += 1.0;

        let threat = model.threat_level();
        canvas.draw_text(
            &format!("THREAT {}", threat.label()),
            Point::new(left.x, y),
            &TextStyle::colored(threat.color()),
        );
        y += 1.0;

        let hrv = display.hrv.has_value().then(|| display.hrv.value());
        canvas.draw_text(
            &format!("HRV {}", format::hrv(hrv)),
            Point::new(left.x, y),
            &TextStyle::colored(if hrv.is_some() { Color::WHITE } else { MUTED }),
        );
        y += 1.0;
        gauge::paint_sparkline(
            canvas,
            &model.history().hrv_series(),
            Rect::new(left.x, y, (left.width - 1.0).max(0.0), SPARKLINE_ROWS),
            Color::CALM,
        );
        y += SPARKLINE_ROWS + 1.0;

        let gauge_y = y + GAUGE_RADIUS;
        let recovery_center = Point::new(left.x + left.width * 0.25, gauge_y);
        let load_center = Point::new(left.x + left.width * 0.75, gauge_y);

        let recovery = display.recovery.has_value().then(|| display.recovery.value());
        let recovery_color = recovery.map_or(MUTED, format::recovery_color);
        gauge::paint_arc_gauge(
            canvas,
            recovery_center,
            GAUGE_RADIUS,
            recovery.map_or(0.0, |r| (r / 100.0) as f32),
            recovery_color,
        );
        canvas.draw_text(
            &format::percent(recovery),
            recovery_center,
            &TextStyle::colored(recovery_color).with_align(TextAlign::Center),
        );
        canvas.draw_text(
            "RECOVERY",
            Point::new(recovery_center.x, gauge_y + 1.0),
            &TextStyle::colored(MUTED).with_align(TextAlign::Center),
        );

        let load = display
            .stress
            .has_value()
            .then(|| format::cognitive_load(display.stress.value()));
        let load_color = load.map_or(MUTED, format::cognitive_load_color);
        gauge::paint_ring(
            canvas,
            load_center,
            GAUGE_RADIUS,
            load.map_or(0.0, |l| (l / 100.0) as f32),
            load_color,
        );
        canvas.draw_text(
            &format::percent(load),
            load_center,
            &TextStyle::colored(load_color).with_align(TextAlign::Center),
        );
        canvas.draw_text(
            "COGNITIVE LOAD",
            Point::new(load_center.x, gauge_y + GAUGE_RADIUS + 1.0),
            &TextStyle::colored(MUTED).with_align(TextAlign::Center),
        );
    }

    fn paint_log(&self, canvas: &mut dyn Canvas, scene: &Scene<'_>) {
        let right = self.layout.right;
        let log = scene.interventions;
        canvas.draw_text(
            "INTERVENTIONS",
            Point::new(right.x + 1.0, right.y),
            &TextStyle::colored(MUTED).bold(),
        );
        canvas.draw_text(
            &format::intervention_count(log.total()),
            Point::new(right.right(), right.y),
            &TextStyle::colored(MUTED).with_align(TextAlign::Right),
        );

        let rows = (self.layout.plant.y - right.y - 1.0).max(0.0) as usize;
        for (i, item) in log.iter().take(rows).enumerate() {
            canvas.draw_text(
                &format!("[{}] {}", item.priority.label(), item.message),
                Point::new(right.x + 1.0, right.y + 1.0 + i as f32),
                &TextStyle::colored(item.priority.color()),
            );
        }
    }

    fn paint_plant(&self, canvas: &mut dyn Canvas, scene: &Scene<'_>) {
        let area = self.layout.plant;
        let stage = scene.plant.stage();
        canvas.draw_text(
            &format!(
                "PLANT {} {}",
                stage.name().to_uppercase(),
                format::percent(Some(scene.plant.display()))
            ),
            Point::new(area.x + 1.0, area.bottom() - 1.0),
            &TextStyle::colored(stage.leaf_color()),
        );
        fx::paint_particles(canvas, &self.plant_fx);
    }
}

impl Presenter for DashboardPresenter {
    fn open(&mut self, frames: &mut FrameScheduler, now_ms: u64) {
        self.frame.acquire(frames);
        self.clock_text = (self.clock_source)();
        self.clock.start(now_ms);
        self.heartbeat.start(now_ms);
        debug!("dashboard opened");
    }

    fn on_event(&mut self, event: &EngineEvent, _scene: &Scene<'_>) {
        if let EngineEvent::StateChanged { to, .. } = event {
            self.border.trigger(to.profile().color);
        }
    }

    fn advance(&mut self, tick: FrameTick, scene: &Scene<'_>) {
        let delta = tick.delta();
        self.run_timers(tick.now_ms, scene.model);
        self.border.advance(delta);
        self.trace.advance(tick.clamped_ms(), scene.model);
        self.emit_plant_particles(delta, scene);
    }

    fn paint(&self, canvas: &mut dyn Canvas, scene: &Scene<'_>) {
        let model = scene.model;
        let accent = Self::accent(model);

        canvas.fill_rect(self.bounds, Color::BLACK.with_alpha(0.85));
        canvas.stroke_rect(self.bounds, accent, 1.0);
        if let Some(pulse) = self.border.overlay() {
            canvas.stroke_rect(self.bounds, pulse.with_alpha(1.0), 2.0);
        }

        self.paint_header(canvas, scene, accent);
        self.paint_vitals(canvas, scene, accent);
        self.paint_log(canvas, scene);
        self.paint_plant(canvas, scene);

        let trace_color = if model.is_sleep_mode() {
            SLEEP_COLOR
        } else if format::is_model_alarm(model) {
            Color::ALARM
        } else {
            accent
        };
        self.trace.paint(canvas, trace_color);
    }

    fn resize(&mut self, bounds: Rect) {
        self.bounds = bounds;
        self.layout = Layout::new(bounds);
        self.trace.resize(self.layout.trace);
        self.plant_fx.set_bounds(self.layout.plant);
    }

    fn close(&mut self, frames: &mut FrameScheduler) {
        self.frame.release(frames);
        self.clock.stop();
        self.heartbeat.stop();
        self.heartbeat_dim.cancel();
        self.dimmed = false;
        debug!("dashboard closed");
    }

    fn is_open(&self, frames: &FrameScheduler) -> bool {
        self.frame.is_active(frames)
    }
}
