//! Full-surface atmosphere: state tint, flash, ambient motes, reaction glyphs,
//! the sleep overlay and the intervention bubble, all shaken together.

use crate::bubble;
use crate::fx;
use crate::presenter::{FrameSlot, Presenter, Scene};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;
use vitalis_core::particles::Jitter;
use vitalis_core::{
    Canvas, CognitiveState, Color, ColorTransition, EngineEvent, Flash, FrameScheduler, FrameTick,
    Particle, ParticleField, Point, Ramp, Rect, ScreenShake, Transform2D,
};

/// Night sky drawn over everything while sleep mode fades in.
pub const SLEEP_OVERLAY: Color = Color::rgb8(5, 5, 16);
/// Overlay alpha at full sleep fade.
pub const SLEEP_OVERLAY_ALPHA: f32 = 0.55;
/// Stars in the sleep sky.
pub const STAR_COUNT: usize = 30;
/// Shake raised by a critical intervention: duration (ms) and peak offset.
pub const CRITICAL_SHAKE: (f32, f32) = (400.0, 5.0);

const SLEEP_RISE: f32 = 0.006;
const SLEEP_FALL: f32 = 0.012;
const GLYPH_LIMIT: usize = 8;

fn tint(state: CognitiveState) -> Color {
    let profile = state.profile();
    profile.color.with_alpha(profile.overlay_alpha)
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Star {
    x: f32,
    y: f32,
    phase: f32,
    speed: f32,
}

/// The atmosphere layer.
#[derive(Debug)]
pub struct AtmospherePresenter {
    bounds: Rect,
    frame: FrameSlot,
    tint: ColorTransition,
    flash: Flash,
    ambient: ParticleField,
    glyphs: ParticleField,
    prewarmed: bool,
    sleep: Ramp,
    stars: Vec<Star>,
    clock: f32,
    shake: ScreenShake,
    offset: (f32, f32),
    rng: StdRng,
}

impl AtmospherePresenter {
    /// Create an atmosphere covering `bounds`.
    #[must_use]
    pub fn new(bounds: Rect) -> Self {
        Self::with_rng(bounds, StdRng::from_entropy())
    }

    /// Create an atmosphere with a seeded random source.
    #[must_use]
    pub fn with_seed(bounds: Rect, seed: u64) -> Self {
        Self::with_rng(bounds, StdRng::seed_from_u64(seed))
    }

    fn with_rng(bounds: Rect, mut rng: StdRng) -> Self {
        let stars = (0..STAR_COUNT)
            .map(|_| Star {
                x: rng.gen(),
                y: rng.gen::<f32>() * 0.7,
                phase: rng.gen::<f32>() * std::f32::consts::TAU,
                speed: rng.gen_range(0.02..0.06),
            })
            .collect();
        let initial = CognitiveState::default();
        Self {
            bounds,
            frame: FrameSlot::default(),
            tint: ColorTransition::settled(tint(initial)),
            flash: Flash::new(),
            ambient: ParticleField::new(initial.profile().particle_count + ParticleField::SLACK)
                .with_bounds(bounds),
            glyphs: ParticleField::new(GLYPH_LIMIT),
            prewarmed: false,
            sleep: Ramp::new(SLEEP_RISE, SLEEP_FALL),
            stars,
            clock: 0.0,
            shake: ScreenShake::new(),
            offset: (0.0, 0.0),
            rng,
        }
    }

    /// Where the companion stands: glyphs rise from here and bubbles point here.
    #[must_use]
    pub fn companion_anchor(&self) -> Point {
        let b = self.bounds;
        Point::new(b.x + (b.width * 0.15).min(12.0), b.bottom() - 3.0)
    }

    /// Currently displayed tint.
    #[must_use]
    pub fn tint(&self) -> Color {
        self.tint.current()
    }

    /// Flash alpha.
    #[must_use]
    pub const fn flash_alpha(&self) -> f32 {
        self.flash.alpha()
    }

    /// Ambient motes.
    #[must_use]
    pub const fn ambient(&self) -> &ParticleField {
        &self.ambient
    }

    /// Floating reaction glyphs.
    #[must_use]
    pub const fn glyphs(&self) -> &ParticleField {
        &self.glyphs
    }

    /// Sleep fade in [0, 1].
    #[must_use]
    pub const fn sleep_fade(&self) -> f32 {
        self.sleep.value()
    }

    /// Whether the screen is shaking.
    #[must_use]
    pub fn is_shaking(&self) -> bool {
        self.shake.is_active()
    }

    /// Offset applied to this frame's paint.
    #[must_use]
    pub const fn shake_offset(&self) -> (f32, f32) {
        self.offset
    }

    fn enter_state(&mut self, to: CognitiveState) {
        let profile = to.profile();
        self.tint.retarget(tint(to));
        self.flash.trigger(profile.color);
        self.glyphs
            .spawn(Particle::glyph(profile.glyph, self.companion_anchor(), profile.color));
        self.ambient
            .set_jitter((to == CognitiveState::Wired).then_some(Jitter::WIRED));
    }

    fn step_ambient(&mut self, delta: f64, state: CognitiveState) {
        let profile = state.profile();
        let bounds = self.bounds;
        if !self.prewarmed {
            self.ambient.set_limit(profile.particle_count + ParticleField::SLACK);
            for _ in 0..profile.particle_count {
                self.ambient
                    .spawn(Particle::ambient(&mut self.rng, bounds, &profile, true));
            }
            self.prewarmed = true;
        }
        self.ambient
            .regulate(profile.particle_count, &mut self.rng, |rng| {
                Particle::ambient(rng, bounds, &profile, false)
            });
        self.ambient.step(delta, &mut self.rng);
    }

    fn paint_sleep(&self, canvas: &mut dyn Canvas) {
        let fade = self.sleep.value();
        if fade <= 0.0 {
            return;
        }
        canvas.fill_rect(self.bounds, SLEEP_OVERLAY.with_alpha(SLEEP_OVERLAY_ALPHA * fade));
        let b = self.bounds;
        for star in &self.stars {
            let twinkle = 0.5 + 0.5 * star.speed.mul_add(self.clock, star.phase).sin();
            canvas.fill_circle(
                Point::new(star.x.mul_add(b.width, b.x), star.y.mul_add(b.height, b.y)),
                0.5,
                Color::WHITE.with_alpha(fade * twinkle),
            );
        }
    }
}

impl Presenter for AtmospherePresenter {
    fn open(&mut self, frames: &mut FrameScheduler, _now_ms: u64) {
        self.frame.acquire(frames);
        debug!("atmosphere opened");
    }

    fn on_event(&mut self, event: &EngineEvent, _scene: &Scene<'_>) {
        match event {
            EngineEvent::StateChanged { to, .. } => self.enter_state(*to),
            EngineEvent::Intervention(intervention) if intervention.is_critical() => {
                let (duration, intensity) = CRITICAL_SHAKE;
                self.shake.trigger(duration, intensity);
            }
            _ => {}
        }
    }

    fn advance(&mut self, tick: FrameTick, scene: &Scene<'_>) {
        let delta = tick.delta();
        self.tint.advance(delta);
        self.flash.advance(delta);
        self.sleep.set_rising(scene.model.is_sleep_mode());
        self.sleep.advance(delta);
        self.clock += delta as f32;
        self.step_ambient(delta, scene.model.state());
        self.glyphs.step(delta, &mut self.rng);
        self.offset = self.shake.sample(&mut self.rng);
    }

    fn paint(&self, canvas: &mut dyn Canvas, scene: &Scene<'_>) {
        let (dx, dy) = self.offset;
        canvas.push_transform(Transform2D::translate(dx, dy));

        canvas.fill_rect(self.bounds, self.tint.current());
        if let Some(flash) = self.flash.overlay() {
            canvas.fill_rect(self.bounds, flash);
        }
        fx::paint_particles(canvas, &self.ambient);
        self.paint_sleep(canvas);
        fx::paint_particles(canvas, &self.glyphs);
        if let Some(intervention) = scene.bubble {
            bubble::paint(canvas, intervention, self.bounds, self.companion_anchor());
        }

        canvas.pop_transform();
    }

    fn resize(&mut self, bounds: Rect) {
        self.bounds = bounds;
        self.ambient.set_bounds(bounds);
    }

    fn close(&mut self, frames: &mut FrameScheduler) {
        self.frame.release(frames);
        self.shake = ScreenShake::new();
        self.offset = (0.0, 0.0);
        debug!("atmosphere closed");
    }

    fn is_open(&self, frames: &FrameScheduler) -> bool {
        self.frame.is_active(frames)
    }
}
