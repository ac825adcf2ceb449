//! Bounded particle pools with per-kind alpha envelopes.

use crate::biometrics::StateProfile;
use crate::geometry::{Point, Rect};
use crate::Color;
use rand::Rng;
use std::collections::VecDeque;

/// Piecewise-linear opacity over a particle's life.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    /// Fraction of life spent fading in
    pub fade_in: f32,
    /// Fraction of life spent fading out (at the end)
    pub fade_out: f32,
    /// Opacity while holding
    pub peak: f32,
}

impl Envelope {
    /// Opacity at `life` in [0, 1].
    #[must_use]
    pub fn alpha(&self, life: f32) -> f32 {
        let life = life.clamp(0.0, 1.0);
        let hold_until = 1.0 - self.fade_out;
        let shape = if self.fade_in > 0.0 && life < self.fade_in {
            life / self.fade_in
        } else if self.fade_out > 0.0 && life > hold_until {
            (1.0 - life) / self.fade_out
        } else {
            1.0
        };
        self.peak * shape.clamp(0.0, 1.0)
    }
}

/// What a particle depicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleKind {
    /// Atmosphere mote
    Ambient,
    /// Plant sparkle (blooming)
    Sparkle,
    /// Falling leaf (withering)
    Leaf,
    /// Floating reaction glyph
    Glyph(&'static str),
}

impl ParticleKind {
    /// Opacity envelope for this kind.
    #[must_use]
    pub const fn envelope(self) -> Envelope {
        match self {
            Self::Ambient => Envelope {
                fade_in: 0.1,
                fade_out: 0.2,
                peak: 0.6,
            },
            Self::Sparkle | Self::Leaf => Envelope {
                fade_in: 0.0,
                fade_out: 0.3,
                peak: 0.8,
            },
            Self::Glyph(_) => Envelope {
                fade_in: 0.0,
                fade_out: 1.0,
                peak: 1.0,
            },
        }
    }
}

/// A single particle. Ages are in frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// Position
    pub position: Point,
    /// Velocity per frame
    pub velocity: Point,
    /// Frames lived
    pub age: f32,
    /// Frames to live
    pub max_age: f32,
    /// Radius or font size
    pub size: f32,
    /// Kind
    pub kind: ParticleKind,
    /// Base color (alpha comes from the envelope)
    pub color: Color,
}

impl Particle {
    /// Frames a reaction glyph lives (1400 ms at 60 fps).
    pub const GLYPH_FRAMES: f32 = 84.0;
    /// Distance a reaction glyph rises.
    pub const GLYPH_RISE: f32 = 45.0;

    /// Ambient mote for a state profile. `prewarm` scatters it anywhere in
    /// `bounds`; otherwise it enters from just below.
    pub fn ambient<R: Rng + ?Sized>(
        rng: &mut R,
        bounds: Rect,
        profile: &StateProfile,
        prewarm: bool,
    ) -> Self {
        let speed = profile.particle_speed;
        let y = if prewarm {
            bounds.y + rng.gen::<f32>() * bounds.height
        } else {
            bounds.bottom() + 10.0
        };
        Self {
            position: Point::new(bounds.x + rng.gen::<f32>() * bounds.width, y),
            velocity: Point::new(
                (rng.gen::<f32>() - 0.5) * speed,
                -rng.gen::<f32>().mul_add(speed, 0.2),
            ),
            age: 0.0,
            max_age: rng.gen::<f32>().mul_add(400.0, 200.0),
            size: rng.gen::<f32>().mul_add(2.5, 1.5),
            kind: ParticleKind::Ambient,
            color: profile.color,
        }
    }

    /// Rising sparkle near `origin`.
    pub fn sparkle<R: Rng + ?Sized>(rng: &mut R, origin: Point, spread: f32) -> Self {
        Self {
            position: Point::new(
                (rng.gen::<f32>() - 0.5).mul_add(spread, origin.x),
                (rng.gen::<f32>() - 0.5).mul_add(spread * 0.5, origin.y),
            ),
            velocity: Point::new(
                (rng.gen::<f32>() - 0.5) * 0.3,
                -rng.gen::<f32>().mul_add(0.3, 0.2),
            ),
            age: 0.0,
            max_age: rng.gen::<f32>().mul_add(40.0, 60.0),
            size: rng.gen::<f32>().mul_add(1.0, 1.0),
            kind: ParticleKind::Sparkle,
            color: Color::rgb8(255, 215, 0),
        }
    }

    /// Falling leaf near `origin`.
    pub fn leaf<R: Rng + ?Sized>(rng: &mut R, origin: Point, spread: f32, color: Color) -> Self {
        Self {
            position: Point::new(
                (rng.gen::<f32>() - 0.5).mul_add(spread, origin.x),
                origin.y,
            ),
            velocity: Point::new(
                (rng.gen::<f32>() - 0.5) * 0.4,
                rng.gen::<f32>().mul_add(0.2, 0.3),
            ),
            age: 0.0,
            max_age: rng.gen::<f32>().mul_add(40.0, 80.0),
            size: rng.gen::<f32>().mul_add(1.0, 2.0),
            kind: ParticleKind::Leaf,
            color,
        }
    }

    /// Reaction glyph floating up from `origin`.
    #[must_use]
    pub fn glyph(text: &'static str, origin: Point, color: Color) -> Self {
        Self {
            position: origin,
            velocity: Point::new(0.0, -Self::GLYPH_RISE / Self::GLYPH_FRAMES),
            age: 0.0,
            max_age: Self::GLYPH_FRAMES,
            size: 14.0,
            kind: ParticleKind::Glyph(text),
            color,
        }
    }

    /// Fraction of life used, in [0, 1].
    #[must_use]
    pub fn life(&self) -> f32 {
        if self.max_age <= 0.0 {
            1.0
        } else {
            (self.age / self.max_age).clamp(0.0, 1.0)
        }
    }

    /// Current opacity.
    #[must_use]
    pub fn alpha(&self) -> f32 {
        self.kind.envelope().alpha(self.life())
    }

    /// Color with envelope opacity applied.
    #[must_use]
    pub fn display_color(&self) -> Color {
        self.color.with_alpha(self.alpha())
    }

    /// Whether the particle has outlived `max_age`.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.age >= self.max_age
    }
}

/// Random per-frame velocity perturbation for agitated states.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Jitter {
    /// Max horizontal kick per frame
    pub vx: f32,
    /// Max vertical kick per frame
    pub vy: f32,
    /// Horizontal speed limit
    pub max_vx: f32,
}

impl Jitter {
    /// Jitter used while the user is wired.
    pub const WIRED: Self = Self {
        vx: 0.2,
        vy: 0.1,
        max_vx: 4.0,
    };
}

/// A bounded pool of particles.
///
/// Population never exceeds `limit`; lowering the limit drops the oldest
/// particles immediately.
#[derive(Debug, Clone)]
pub struct ParticleField {
    particles: VecDeque<Particle>,
    limit: usize,
    bounds: Option<Rect>,
    jitter: Option<Jitter>,
}

impl ParticleField {
    /// Off-screen margin before a particle is culled.
    pub const CULL_MARGIN: f32 = 20.0;
    /// Headroom above the target population.
    pub const SLACK: usize = 10;

    /// Create an empty field holding at most `limit` particles.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            particles: VecDeque::with_capacity(limit),
            limit,
            bounds: None,
            jitter: None,
        }
    }

    /// Cull particles that leave `bounds`.
    #[must_use]
    pub const fn with_bounds(mut self, bounds: Rect) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// Change the cull bounds.
    pub fn set_bounds(&mut self, bounds: Rect) {
        self.bounds = Some(bounds);
    }

    /// Cull bounds, if any.
    #[must_use]
    pub const fn bounds(&self) -> Option<Rect> {
        self.bounds
    }

    /// Enable or disable ambient jitter.
    pub fn set_jitter(&mut self, jitter: Option<Jitter>) {
        self.jitter = jitter;
    }

    /// Change the hard cap, dropping the oldest particles if over it.
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
        while self.particles.len() > limit {
            self.particles.pop_front();
        }
    }

    /// Hard cap.
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Add a particle. Refused (returns `false`) at the cap.
    pub fn spawn(&mut self, particle: Particle) -> bool {
        if self.particles.len() >= self.limit {
            return false;
        }
        self.particles.push_back(particle);
        true
    }

    /// Move one step toward `target` particles: spawn one when below, cull the
    /// oldest when above. The cap becomes `target + SLACK`.
    pub fn regulate<R, F>(&mut self, target: usize, rng: &mut R, mut make: F)
    where
        R: Rng + ?Sized,
        F: FnMut(&mut R) -> Particle,
    {
        self.set_limit(target + Self::SLACK);
        match self.particles.len() {
            n if n < target => {
                self.spawn(make(rng));
            }
            n if n > target => {
                self.particles.pop_front();
            }
            _ => {}
        }
    }

    /// Integrate all particles by `delta` frames and drop dead or escaped ones.
    pub fn step<R: Rng + ?Sized>(&mut self, delta: f64, rng: &mut R) {
        let delta = delta.max(0.0) as f32;
        let jitter = self.jitter;
        for p in &mut self.particles {
            if let (Some(j), ParticleKind::Ambient) = (jitter, p.kind) {
                p.velocity.x = (rng.gen::<f32>() - 0.5)
                    .mul_add(2.0 * j.vx, p.velocity.x)
                    .clamp(-j.max_vx, j.max_vx);
                p.velocity.y = (rng.gen::<f32>() - 0.5).mul_add(2.0 * j.vy, p.velocity.y);
            }
            let sway = if p.kind == ParticleKind::Leaf {
                (p.age * 0.1).sin() * 0.3
            } else {
                0.0
            };
            p.position.x += (p.velocity.x + sway) * delta;
            p.position.y += p.velocity.y * delta;
            p.age += delta;
        }

        let bounds = self.bounds;
        self.particles.retain(|p| {
            !p.is_expired() && bounds.map_or(true, |b| Self::within(&b, p.position))
        });
    }

    fn within(bounds: &Rect, p: Point) -> bool {
        p.y >= bounds.y - Self::CULL_MARGIN
            && p.x >= bounds.x - Self::CULL_MARGIN
            && p.x <= bounds.right() + Self::CULL_MARGIN
    }

    /// Remove every particle.
    pub fn clear(&mut self) {
        self.particles.clear();
    }

    /// Particles, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    /// Current population.
    #[must_use]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// Check if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}

/// Per-frame chance of emitting a plant sparkle, scaled by delta.
pub const SPARKLE_CHANCE: f64 = 0.03;
/// Per-frame chance of shedding a leaf, scaled by delta.
pub const LEAF_CHANCE: f64 = 0.02;

/// Roll whether an event with per-frame `chance` happens during `delta` frames.
pub fn roll<R: Rng + ?Sized>(rng: &mut R, chance: f64, delta: f64) -> bool {
    rng.gen::<f64>() < chance * delta.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biometrics::CognitiveState;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const VIEW: Rect = Rect::new(0.0, 0.0, 200.0, 100.0);

    fn mote(position: Point, velocity: Point, max_age: f32) -> Particle {
        Particle {
            position,
            velocity,
            age: 0.0,
            max_age,
            size: 2.0,
            kind: ParticleKind::Ambient,
            color: Color::WHITE,
        }
    }

    #[test]
    fn test_ambient_envelope() {
        let env = ParticleKind::Ambient.envelope();
        assert_eq!(env.alpha(0.0), 0.0);
        assert!((env.alpha(0.05) - 0.3).abs() < 1e-6);
        assert_eq!(env.alpha(0.5), 0.6);
        assert!((env.alpha(0.9) - 0.3).abs() < 1e-5);
        assert_eq!(env.alpha(1.0), 0.0);
    }

    #[test]
    fn test_glyph_fades_linearly() {
        let env = ParticleKind::Glyph("!").envelope();
        assert_eq!(env.alpha(0.0), 1.0);
        assert!((env.alpha(0.25) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_glyph_rises_45_over_lifetime() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut field = ParticleField::new(4);
        field.spawn(Particle::glyph("~", Point::new(50.0, 100.0), Color::WHITE));
        for _ in 0..83 {
            field.step(1.0, &mut rng);
        }
        let y = field.iter().next().unwrap().position.y;
        assert!((y - (100.0 - 45.0 * 83.0 / 84.0)).abs() < 1e-3);
        field.step(1.0, &mut rng);
        assert!(field.is_empty());
    }

    #[test]
    fn test_spawn_refused_at_limit() {
        let mut field = ParticleField::new(1);
        assert!(field.spawn(mote(Point::ORIGIN, Point::ORIGIN, 10.0)));
        assert!(!field.spawn(mote(Point::ORIGIN, Point::ORIGIN, 10.0)));
    }

    #[test]
    fn test_out_of_bounds_culled() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut field = ParticleField::new(10).with_bounds(VIEW);
        field.spawn(mote(Point::new(10.0, -19.0), Point::new(0.0, -2.0), 100.0));
        field.spawn(mote(Point::new(219.0, 50.0), Point::new(2.0, 0.0), 100.0));
        field.spawn(mote(Point::new(-19.0, 50.0), Point::new(-2.0, 0.0), 100.0));
        field.spawn(mote(Point::new(100.0, 150.0), Point::new(0.0, 0.0), 100.0));
        field.step(1.0, &mut rng);
        assert_eq!(field.len(), 1);
        assert_eq!(field.iter().next().unwrap().position.y, 150.0);
    }

    #[test]
    fn test_expired_removed() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut field = ParticleField::new(10);
        field.spawn(mote(Point::ORIGIN, Point::ORIGIN, 2.0));
        field.step(1.0, &mut rng);
        assert_eq!(field.len(), 1);
        field.step(1.0, &mut rng);
        assert!(field.is_empty());
    }

    #[test]
    fn test_regulate_one_per_frame() {
        let mut rng = StdRng::seed_from_u64(4);
        let profile = CognitiveState::Stressed.profile();
        let mut field = ParticleField::new(0).with_bounds(VIEW);
        for frame in 1..=5 {
            field.regulate(40, &mut rng, |r| Particle::ambient(r, VIEW, &profile, true));
            assert_eq!(field.len(), frame);
        }
        assert_eq!(field.limit(), 50);
    }

    #[test]
    fn test_lower_target_trims_to_cap_immediately() {
        let mut rng = StdRng::seed_from_u64(5);
        let stressed = CognitiveState::Stressed.profile();
        let mut field = ParticleField::new(0).with_bounds(VIEW);
        for _ in 0..40 {
            field.regulate(40, &mut rng, |r| Particle::ambient(r, VIEW, &stressed, true));
        }
        assert_eq!(field.len(), 40);
        field.regulate(12, &mut rng, |r| Particle::ambient(r, VIEW, &stressed, true));
        assert_eq!(field.len(), 21);
        field.regulate(12, &mut rng, |r| Particle::ambient(r, VIEW, &stressed, true));
        assert_eq!(field.len(), 20);
    }

    #[test]
    fn test_wired_jitter_limits_speed() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut field = ParticleField::new(10);
        field.set_jitter(Some(Jitter::WIRED));
        field.spawn(mote(Point::ORIGIN, Point::new(3.9, 0.0), 10_000.0));
        for _ in 0..500 {
            field.step(1.0, &mut rng);
            assert!(field.iter().all(|p| p.velocity.x.abs() <= 4.0));
        }
    }

    #[test]
    fn test_leaf_falls_and_sparkle_rises() {
        let mut rng = StdRng::seed_from_u64(7);
        let leaf = Particle::leaf(&mut rng, Point::new(0.0, 0.0), 10.0, Color::WHITE);
        let sparkle = Particle::sparkle(&mut rng, Point::new(0.0, 0.0), 10.0);
        assert!(leaf.velocity.y > 0.0);
        assert!(sparkle.velocity.y < 0.0);
    }

    #[test]
    fn test_roll_scales_with_delta() {
        let mut rng = StdRng::seed_from_u64(8);
        assert!(!roll(&mut rng, 0.5, 0.0));
        assert!(roll(&mut rng, 1.0, 1.0));
    }

    proptest! {
        #[test]
        fn prop_population_bounded(
            seed in any::<u64>(),
            schedule in proptest::collection::vec((0usize..5, 1usize..40), 1..20),
        ) {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut field = ParticleField::new(0).with_bounds(VIEW);
            for (state_index, frames) in schedule {
                let profile = CognitiveState::ALL[state_index].profile();
                for _ in 0..frames {
                    field.regulate(profile.particle_count, &mut rng, |r| {
                        Particle::ambient(r, VIEW, &profile, false)
                    });
                    field.step(1.0, &mut rng);
                    prop_assert!(field.len() <= profile.particle_count + ParticleField::SLACK);
                }
            }
        }
    }
}
