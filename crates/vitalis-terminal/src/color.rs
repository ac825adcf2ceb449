//! Mapping engine colors onto what the terminal can show.

use crossterm::style::Color as CrosstermColor;
use vitalis_core::Color;

/// Terminal color capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ColorMode {
    /// 24-bit color (`COLORTERM=truecolor` or `24bit`)
    #[default]
    #[value(name = "truecolor")]
    TrueColor,
    /// xterm 256-color palette
    #[value(name = "256")]
    Color256,
    /// The 16 ANSI colors
    #[value(name = "16")]
    Color16,
    /// No color
    Mono,
}

/// Levels of the 6×6×6 cube in the 256-color palette.
const CUBE_LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];

/// Approximate RGB of the 16 ANSI colors, in crossterm order.
const ANSI16: [(CrosstermColor, (u8, u8, u8)); 16] = [
    (CrosstermColor::Black, (0, 0, 0)),
    (CrosstermColor::DarkRed, (128, 0, 0)),
    (CrosstermColor::DarkGreen, (0, 128, 0)),
    (CrosstermColor::DarkYellow, (128, 128, 0)),
    (CrosstermColor::DarkBlue, (0, 0, 128)),
    (CrosstermColor::DarkMagenta, (128, 0, 128)),
    (CrosstermColor::DarkCyan, (0, 128, 128)),
    (CrosstermColor::Grey, (192, 192, 192)),
    (CrosstermColor::DarkGrey, (128, 128, 128)),
    (CrosstermColor::Red, (255, 0, 0)),
    (CrosstermColor::Green, (0, 255, 0)),
    (CrosstermColor::Yellow, (255, 255, 0)),
    (CrosstermColor::Blue, (0, 0, 255)),
    (CrosstermColor::Magenta, (255, 0, 255)),
    (CrosstermColor::Cyan, (0, 255, 255)),
    (CrosstermColor::White, (255, 255, 255)),
];

impl ColorMode {
    /// Detect from the process environment.
    #[must_use]
    pub fn detect() -> Self {
        Self::detect_with_env(
            std::env::var("COLORTERM").ok().as_deref(),
            std::env::var("TERM").ok().as_deref(),
        )
    }

    /// Detect from `COLORTERM` and `TERM` values.
    #[must_use]
    pub fn detect_with_env(colorterm: Option<&str>, term: Option<&str>) -> Self {
        if matches!(colorterm, Some("truecolor" | "24bit")) {
            return Self::TrueColor;
        }
        match term {
            Some(t) if t.contains("256color") => Self::Color256,
            Some("dumb") | None => Self::Mono,
            Some(_) => Self::Color16,
        }
    }

    /// Convert an engine color. Fully transparent maps to the terminal default.
    #[must_use]
    pub fn to_crossterm(self, color: Color) -> CrosstermColor {
        if color.a <= 0.0 {
            return CrosstermColor::Reset;
        }
        let (r, g, b) = color.to_rgb8();
        match self {
            Self::TrueColor => CrosstermColor::Rgb { r, g, b },
            Self::Color256 => CrosstermColor::AnsiValue(rgb_to_256(r, g, b)),
            Self::Color16 => rgb_to_16(r, g, b),
            Self::Mono => CrosstermColor::Reset,
        }
    }
}

fn distance((r1, g1, b1): (u8, u8, u8), (r2, g2, b2): (u8, u8, u8)) -> u32 {
    let d = |a: u8, b: u8| u32::from(a.abs_diff(b)).pow(2);
    d(r1, r2) + d(g1, g2) + d(b1, b2)
}

fn nearest_level(v: u8) -> usize {
    CUBE_LEVELS
        .iter()
        .enumerate()
        .min_by_key(|(_, level)| level.abs_diff(v))
        .map_or(0, |(i, _)| i)
}

/// Nearest entry among the color cube and the gray ramp.
fn rgb_to_256(r: u8, g: u8, b: u8) -> u8 {
    let (ri, gi, bi) = (nearest_level(r), nearest_level(g), nearest_level(b));
    let cube = (CUBE_LEVELS[ri], CUBE_LEVELS[gi], CUBE_LEVELS[bi]);
    let cube_index = 16 + 36 * ri + 6 * gi + bi;

    let mean = (u16::from(r) + u16::from(g) + u16::from(b)) / 3;
    let step = (mean.saturating_sub(3) / 10).min(23);
    let gray_value = (8 + step * 10) as u8;
    let gray = (gray_value, gray_value, gray_value);

    if distance((r, g, b), gray) < distance((r, g, b), cube) {
        232 + step as u8
    } else {
        cube_index as u8
    }
}

fn rgb_to_16(r: u8, g: u8, b: u8) -> CrosstermColor {
    ANSI16
        .iter()
        .min_by_key(|(_, rgb)| distance((r, g, b), *rgb))
        .map_or(CrosstermColor::White, |(color, _)| *color)
}
