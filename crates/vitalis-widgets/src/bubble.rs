//! Intervention bubble: a speech bubble near the companion, or a full-screen
//! alert for critical interventions.

use vitalis_core::{Canvas, Color, Intervention, Point, Rect, TextAlign, TextStyle};

const BUBBLE_MAX_WIDTH: f32 = 40.0;
const ALERT_MAX_WIDTH: f32 = 60.0;
/// Keys bound to the first and second response buttons.
pub const BUTTON_KEYS: [char; 2] = ['a', 'b'];

/// Greedy word wrap to at most `width` characters per line.
///
/// Words longer than a line are split.
#[must_use]
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut line_len = 0;
    for word in text.split_whitespace() {
        let mut chars: Vec<char> = word.chars().collect();
        while chars.len() > width {
            if line_len > 0 {
                lines.push(std::mem::take(&mut line));
                line_len = 0;
            }
            lines.push(chars.drain(..width).collect());
        }
        let word_len = chars.len();
        if word_len == 0 {
            continue;
        }
        if line_len > 0 && line_len + 1 + word_len > width {
            lines.push(std::mem::take(&mut line));
            line_len = 0;
        }
        if line_len > 0 {
            line.push(' ');
            line_len += 1;
        }
        line.extend(chars);
        line_len += word_len;
    }
    if line_len > 0 {
        lines.push(line);
    }
    lines
}

/// Button captions with their key hints, e.g. `[a] Got it`.
#[must_use]
pub fn button_captions(intervention: &Intervention) -> Vec<String> {
    intervention
        .buttons
        .iter()
        .zip(BUTTON_KEYS)
        .map(|(label, key)| format!("[{key}] {label}"))
        .collect()
}

/// Paint `intervention`. `anchor` is where the speech bubble's tail points.
pub fn paint(canvas: &mut dyn Canvas, intervention: &Intervention, bounds: Rect, anchor: Point) {
    if intervention.is_critical() {
        paint_alert(canvas, intervention, bounds);
    } else {
        paint_speech(canvas, intervention, bounds, anchor);
    }
}

fn paint_lines(canvas: &mut dyn Canvas, lines: &[String], origin: Point, style: &TextStyle) {
    for (i, line) in lines.iter().enumerate() {
        canvas.draw_text(line, Point::new(origin.x, origin.y + i as f32), style);
    }
}

fn paint_speech(canvas: &mut dyn Canvas, intervention: &Intervention, bounds: Rect, anchor: Point) {
    let width = BUBBLE_MAX_WIDTH.min(bounds.width - 2.0).max(4.0);
    let lines = wrap(&intervention.message, (width - 2.0) as usize);
    let captions = button_captions(intervention);
    let button_rows = if captions.is_empty() { 0.0 } else { 1.0 };
    let height = lines.len() as f32 + button_rows + 2.0;

    let x = anchor.x.min(bounds.right() - width).max(bounds.x);
    let y = (anchor.y - height - 1.0).max(bounds.y);
    let rect = Rect::new(x, y, width, height);
    let accent = intervention.priority.color();

    canvas.fill_rect(rect, Color::BLACK.with_alpha(0.8));
    canvas.stroke_rect(rect, accent, 1.0);
    canvas.draw_line(
        Point::new(anchor.x.clamp(rect.x, rect.right()), rect.bottom()),
        anchor,
        accent,
        1.0,
    );
    paint_lines(
        canvas,
        &lines,
        Point::new(rect.x + 1.0, rect.y + 1.0),
        &TextStyle::colored(Color::WHITE),
    );
    if !captions.is_empty() {
        canvas.draw_text(
            &captions.join("  "),
            Point::new(rect.x + 1.0, rect.bottom() - 2.0),
            &TextStyle::colored(accent),
        );
    }
}

fn paint_alert(canvas: &mut dyn Canvas, intervention: &Intervention, bounds: Rect) {
    canvas.fill_rect(bounds, Color::ALARM.with_alpha(0.25));

    let width = ALERT_MAX_WIDTH.min(bounds.width - 4.0).max(4.0);
    let lines = wrap(&intervention.message, (width - 4.0) as usize);
    let height = lines.len() as f32 + 6.0;
    let center = bounds.center();
    let rect = Rect::new(
        (center.x - width / 2.0).round(),
        (center.y - height / 2.0).round().max(bounds.y),
        width,
        height,
    );

    canvas.fill_rect(rect, Color::BLACK.with_alpha(0.9));
    canvas.stroke_rect(rect, Color::ALARM, 2.0);
    canvas.draw_text(
        "⚠ CRITICAL",
        Point::new(rect.center().x, rect.y + 1.0),
        &TextStyle::colored(Color::ALARM).bold().with_align(TextAlign::Center),
    );
    paint_lines(
        canvas,
        &lines,
        Point::new(rect.x + 2.0, rect.y + 3.0),
        &TextStyle::colored(Color::WHITE),
    );
    let captions = button_captions(intervention);
    if !captions.is_empty() {
        canvas.draw_text(
            &captions.join("   "),
            Point::new(rect.center().x, rect.bottom() - 2.0),
            &TextStyle::colored(Color::ALARM).with_align(TextAlign::Center),
        );
    }
}
