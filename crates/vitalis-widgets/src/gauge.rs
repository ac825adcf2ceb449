//! Small charts used by the read-outs: sparkline, arc gauge, ring and bar.

use std::f32::consts::{FRAC_PI_2, PI, TAU};
use vitalis_core::{Canvas, Color, Point, Rect};

/// Track color behind gauges and bars.
pub const TRACK: Color = Color::rgb8(34, 34, 34);

/// Value range shown by a sparkline: data range padded by 5 each side.
#[must_use]
pub fn sparkline_range(series: &[f64]) -> Option<(f64, f64)> {
    let finite = series.iter().copied().filter(|v| v.is_finite());
    let (min, max) = finite.fold(None, |acc: Option<(f64, f64)>, v| {
        Some(acc.map_or((v, v), |(lo, hi)| (lo.min(v), hi.max(v))))
    })?;
    Some((min - 5.0, max + 5.0))
}

/// Points of a sparkline spread across `rect`.
#[must_use]
pub fn sparkline_points(series: &[f64], rect: Rect) -> Vec<Point> {
    let Some((lo, hi)) = sparkline_range(series) else {
        return Vec::new();
    };
    if series.len() < 2 {
        return Vec::new();
    }
    let step = rect.width / (series.len() - 1) as f32;
    series
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .map(|(i, v)| {
            let t = ((v - lo) / (hi - lo)) as f32;
            Point::new(
                (i as f32).mul_add(step, rect.x),
                (1.0 - t).mul_add(rect.height, rect.y),
            )
        })
        .collect()
}

/// Stroke a sparkline. Fewer than two points draws nothing.
pub fn paint_sparkline(canvas: &mut dyn Canvas, series: &[f64], rect: Rect, color: Color) {
    let points = sparkline_points(series, rect);
    if points.len() >= 2 {
        canvas.stroke_path(&points, color, 1.0);
    }
}

/// Half-circle gauge opening downward, filled to `fraction` from the left.
pub fn paint_arc_gauge(
    canvas: &mut dyn Canvas,
    center: Point,
    radius: f32,
    fraction: f32,
    color: Color,
) {
    let fraction = if fraction.is_finite() {
        fraction.clamp(0.0, 1.0)
    } else {
        0.0
    };
    canvas.stroke_arc(center, radius, PI, TAU, TRACK, 2.0);
    if fraction > 0.0 {
        canvas.stroke_arc(center, radius, PI, fraction.mul_add(PI, PI), color, 2.0);
    }
}

/// Full ring filled clockwise from twelve o'clock.
pub fn paint_ring(canvas: &mut dyn Canvas, center: Point, radius: f32, fraction: f32, color: Color) {
    let fraction = if fraction.is_finite() {
        fraction.clamp(0.0, 1.0)
    } else {
        0.0
    };
    canvas.stroke_arc(center, radius, 0.0, TAU, TRACK, 2.0);
    if fraction > 0.0 {
        canvas.stroke_arc(
            center,
            radius,
            -FRAC_PI_2,
            fraction.mul_add(TAU, -FRAC_PI_2),
            color,
            2.0,
        );
    }
}

/// Horizontal bar filled to `fraction`.
pub fn paint_bar(canvas: &mut dyn Canvas, rect: Rect, fraction: f32, color: Color) {
    let fraction = if fraction.is_finite() {
        fraction.clamp(0.0, 1.0)
    } else {
        0.0
    };
    canvas.fill_rect(rect, TRACK);
    if fraction > 0.0 {
        canvas.fill_rect(
            Rect::new(rect.x, rect.y, rect.width * fraction, rect.height),
            color,
        );
    }
}
