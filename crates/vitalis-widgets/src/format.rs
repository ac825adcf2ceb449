//! Read-out formatting and color thresholds.
//!
//! Everything here is a pure function of model values. Missing data renders
//! as a placeholder glyph, never as `NaN`.

use chrono::{DateTime, TimeZone};
use vitalis_core::{Color, StateModel};

/// Placeholder for a missing numeric read-out.
pub const PLACEHOLDER: &str = "—";
/// Placeholder for a missing short field (BPM, timers).
pub const PLACEHOLDER_SHORT: &str = "--";

/// Accent used while sleep mode is active.
pub const SLEEP_COLOR: Color = Color::rgb8(68, 68, 170);
/// Read-out color for missing values.
pub const MUTED: Color = Color::rgb8(102, 102, 102);

/// Rounded BPM above which the heart-rate read-out turns red.
pub const BPM_ALARM: f64 = 100.0;

fn present(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Whole beats per minute, or `--`.
#[must_use]
pub fn bpm(value: Option<f64>) -> String {
    present(value)
        .filter(|v| *v > 0.0)
        .map_or_else(|| PLACEHOLDER_SHORT.to_string(), |v| format!("{}", v.round() as i64))
}

/// Whether the rounded heart rate is in alarm range.
#[must_use]
pub fn is_bpm_alarm(value: f64) -> bool {
    value.is_finite() && value.round() > BPM_ALARM
}

/// Whether the model's latest heart rate is in alarm range.
#[must_use]
pub fn is_model_alarm(model: &StateModel) -> bool {
    model.target_bpm().is_some_and(is_bpm_alarm)
}

/// Heart-rate read-out color.
#[must_use]
pub fn bpm_color(value: Option<f64>) -> Color {
    match present(value) {
        Some(v) if is_bpm_alarm(v) => Color::ALARM,
        Some(v) if v > 0.0 => Color::WHITE,
        _ => MUTED,
    }
}

/// HRV in milliseconds, or `—`.
#[must_use]
pub fn hrv(value: Option<f64>) -> String {
    present(value)
        .filter(|v| *v > 0.0)
        .map_or_else(|| PLACEHOLDER.to_string(), |v| format!("{} ms", v.round() as i64))
}

/// Whole percent, or `—`.
#[must_use]
pub fn percent(value: Option<f64>) -> String {
    present(value).map_or_else(|| PLACEHOLDER.to_string(), |v| format!("{}%", v.round() as i64))
}

/// One decimal place, or `—`.
#[must_use]
pub fn decimal(value: Option<f64>) -> String {
    present(value).map_or_else(|| PLACEHOLDER.to_string(), |v| format!("{v:.1}"))
}

/// Recovery color: red below 33, amber below 67, green otherwise.
#[must_use]
pub fn recovery_color(recovery: f64) -> Color {
    if recovery < 33.0 {
        Color::ALARM
    } else if recovery < 67.0 {
        Color::CAUTION
    } else {
        Color::HEALTHY
    }
}

/// Stress color: red above 2, amber above 1, green otherwise.
#[must_use]
pub fn stress_color(stress: f64) -> Color {
    if stress > 2.0 {
        Color::ALARM
    } else if stress > 1.0 {
        Color::CAUTION
    } else {
        Color::HEALTHY
    }
}

/// Cognitive load as a percentage of the stress scale (0-3).
#[must_use]
pub fn cognitive_load(stress: f64) -> f64 {
    if stress.is_finite() {
        (stress / 3.0 * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Cognitive-load color: red above 66%, amber above 33%, blue otherwise.
#[must_use]
pub fn cognitive_load_color(load: f64) -> Color {
    if load > 66.0 {
        Color::ALARM
    } else if load > 33.0 {
        Color::CAUTION
    } else {
        Color::CALM
    }
}

/// `HH:MM:SS` for an elapsed duration, or `--:--:--`.
#[must_use]
pub fn session_timer(elapsed_ms: Option<u64>) -> String {
    elapsed_ms.map_or_else(
        || "--:--:--".to_string(),
        |ms| {
            let secs = ms / 1000;
            format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
        },
    )
}

/// `HH:MM:SS` wall-clock time.
#[must_use]
pub fn wall_clock<Tz: TimeZone>(time: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    time.format("%H:%M:%S").to_string()
}

/// `1 INTERVENTION`, `N INTERVENTIONS`.
#[must_use]
pub fn intervention_count(total: u64) -> String {
    if total == 1 {
        "1 INTERVENTION".to_string()
    } else {
        format!("{total} INTERVENTIONS")
    }
}

/// Heartbeat pulse period for a heart rate: one beat, but never faster than 300 ms.
#[must_use]
pub fn heartbeat_period_ms(bpm: f64) -> u64 {
    if bpm.is_finite() && bpm > 0.0 {
        ((60_000.0 / bpm) as u64).max(300)
    } else {
        1000
    }
}
