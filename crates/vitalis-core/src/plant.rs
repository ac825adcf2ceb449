//! Plant health model: a 0-100 scalar with lagging, staged display.

use crate::animation::Smoothed;
use crate::Color;

/// Growth stage, selected from the smoothed health value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum GrowthStage {
    /// Health ≤ 15
    Dead,
    /// Health ≤ 30
    Withering,
    /// Health ≤ 50
    Seedling,
    /// Health ≤ 70
    Sprout,
    /// Health ≤ 85
    Growing,
    /// Health > 85
    Blooming,
}

impl GrowthStage {
    /// Stage for a health value.
    #[must_use]
    pub fn from_health(health: f64) -> Self {
        match health {
            h if h <= 15.0 => Self::Dead,
            h if h <= 30.0 => Self::Withering,
            h if h <= 50.0 => Self::Seedling,
            h if h <= 70.0 => Self::Sprout,
            h if h <= 85.0 => Self::Growing,
            _ => Self::Blooming,
        }
    }

    /// Lower-case name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Dead => "dead",
            Self::Withering => "withering",
            Self::Seedling => "seedling",
            Self::Sprout => "sprout",
            Self::Growing => "growing",
            Self::Blooming => "blooming",
        }
    }

    /// Foliage color.
    #[must_use]
    pub const fn leaf_color(self) -> Color {
        match self {
            Self::Dead => Color::rgb8(0x55, 0x44, 0x33),
            Self::Withering => Color::rgb8(0x8b, 0x73, 0x55),
            Self::Seedling => Color::rgb8(0x7c, 0xb3, 0x42),
            Self::Sprout => Color::rgb8(0x4c, 0xaf, 0x50),
            Self::Growing => Color::rgb8(0x2e, 0x7d, 0x32),
            Self::Blooming => Color::rgb8(0x1b, 0x5e, 0x20),
        }
    }

    /// Whether sparkles are emitted.
    #[must_use]
    pub const fn sparkles(self) -> bool {
        matches!(self, Self::Blooming)
    }

    /// Whether falling leaves are emitted.
    #[must_use]
    pub const fn sheds_leaves(self) -> bool {
        matches!(self, Self::Dead | Self::Withering)
    }
}

/// Plant health with a lagging display value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlantHealth {
    health: f64,
    display: Smoothed,
    drawn: f64,
}

impl PlantHealth {
    /// Starting health.
    pub const INITIAL: f64 = 50.0;
    /// Display smoothing rate per frame.
    pub const RATE: f64 = 0.02;
    /// Display change that warrants a redraw.
    pub const REDRAW_THRESHOLD: f64 = 0.5;

    /// Create a plant at the initial health.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            health: Self::INITIAL,
            display: Smoothed::with_initial(Self::INITIAL, Self::RATE),
            drawn: Self::INITIAL,
        }
    }

    /// Set absolute health (clamped to 0-100).
    pub fn set(&mut self, health: f64) {
        if health.is_finite() {
            self.health = health.clamp(0.0, 100.0);
            self.display.set_target(self.health);
        }
    }

    /// Adjust health by `delta` (result clamped to 0-100).
    pub fn adjust(&mut self, delta: f64) {
        self.set(self.health + delta);
    }

    /// Advance the display value by `delta` frames. Returns `true` when the
    /// display moved far enough since the last redraw to repaint.
    pub fn advance(&mut self, delta: f64) -> bool {
        let shown = self.display.advance(delta);
        if (shown - self.drawn).abs() > Self::REDRAW_THRESHOLD {
            self.drawn = shown;
            true
        } else {
            false
        }
    }

    /// Raw target health.
    #[must_use]
    pub const fn health(&self) -> f64 {
        self.health
    }

    /// Lagging display health.
    #[must_use]
    pub const fn display(&self) -> f64 {
        self.display.value()
    }

    /// Stage of the displayed (not raw) health.
    #[must_use]
    pub fn stage(&self) -> GrowthStage {
        GrowthStage::from_health(self.display.value())
    }
}

impl Default for PlantHealth {
    fn default() -> Self {
        Self::new()
    }
}
