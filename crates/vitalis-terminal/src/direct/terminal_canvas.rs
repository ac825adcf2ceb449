//! [`Canvas`] over a [`CellBuffer`]: one canvas unit is one terminal cell.
//!
//! Translucent fills composite onto the cells underneath, so overlays tint
//! whatever was painted before them. Small circles become bullet glyphs and
//! lines use box-drawing characters picked by slope.

use super::cell_buffer::{CellBuffer, Modifiers};
use std::f32::consts::TAU;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;
use vitalis_core::{Canvas, Color, FontWeight, Point, Rect, TextAlign, TextStyle, Transform2D};

/// Circles at or below this radius are drawn as a single glyph.
const DOT_RADIUS: f32 = 1.0;

/// Cell-space clip rectangle, half-open on the right and bottom.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ClipRect {
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
}

impl ClipRect {
    const fn contains(self, x: i32, y: i32) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }

    fn intersect(self, other: Self) -> Self {
        let x0 = self.x0.max(other.x0);
        let y0 = self.y0.max(other.y0);
        Self {
            x0,
            y0,
            x1: self.x1.min(other.x1).max(x0),
            y1: self.y1.min(other.y1).max(y0),
        }
    }

    fn from_rect(rect: Rect) -> Self {
        Self {
            x0: rect.x.round() as i32,
            y0: rect.y.round() as i32,
            x1: rect.right().round() as i32,
            y1: rect.bottom().round() as i32,
        }
    }
}

/// Terminal implementation of the drawing surface.
pub struct TerminalCanvas<'a> {
    buffer: &'a mut CellBuffer,
    transforms: Vec<Transform2D>,
    clips: Vec<ClipRect>,
}

impl<'a> TerminalCanvas<'a> {
    /// Paint onto `buffer`.
    pub fn new(buffer: &'a mut CellBuffer) -> Self {
        Self {
            buffer,
            transforms: Vec::new(),
            clips: Vec::new(),
        }
    }

    /// Surface bounds in canvas units.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::new(
            0.0,
            0.0,
            f32::from(self.buffer.width()),
            f32::from(self.buffer.height()),
        )
    }

    fn transform(&self) -> Transform2D {
        self.transforms.last().copied().unwrap_or_default()
    }

    fn clip(&self) -> ClipRect {
        let screen = ClipRect {
            x0: 0,
            y0: 0,
            x1: i32::from(self.buffer.width()),
            y1: i32::from(self.buffer.height()),
        };
        self.clips.last().map_or(screen, |clip| clip.intersect(screen))
    }

    /// Map a canvas point to the cell that contains it.
    fn cell_of(&self, p: Point) -> (i32, i32) {
        let p = self.transform().apply(p);
        (p.x.floor() as i32, p.y.floor() as i32)
    }

    fn cell_rect(&self, rect: Rect) -> ClipRect {
        ClipRect::from_rect(self.transform().apply_rect(rect)).intersect(self.clip())
    }

    fn cells(rect: ClipRect) -> impl Iterator<Item = (i32, i32)> {
        (rect.y0..rect.y1).flat_map(move |y| (rect.x0..rect.x1).map(move |x| (x, y)))
    }

    fn blend_cell(&mut self, x: i32, y: i32, color: Color) {
        if self.clip().contains(x, y) {
            self.buffer.blend(x as u16, y as u16, color);
        }
    }

    /// Write a glyph keeping the cell's background; translucent ink fades
    /// toward that background.
    fn put(&mut self, x: i32, y: i32, symbol: &str, color: Color, modifiers: Modifiers) {
        let clip = self.clip();
        if !clip.contains(x, y) || color.a <= 0.0 {
            return;
        }
        let (cx, cy) = (x as u16, y as u16);
        let Some(cell) = self.buffer.get(cx, cy) else {
            return;
        };
        let bg = cell.bg;
        let ink = color.over(&cell.backdrop());
        self.buffer.update(cx, cy, symbol, ink, bg, modifiers);
        let wide = UnicodeWidthStr::width(symbol) > 1;
        if !clip.contains(x + 1, y) {
            return;
        }
        match self.buffer.get(cx + 1, cy) {
            Some(next) if wide || next.is_continuation() => {}
            _ => return,
        }
        if let Some(next) = self.buffer.get_mut(cx + 1, cy) {
            if wide {
                next.make_continuation();
            } else {
                next.reset();
            }
        }
    }

    fn line(&mut self, from: Point, to: Point, color: Color, width: f32) {
        let (x0, y0) = self.cell_of(from);
        let (x1, y1) = self.cell_of(to);
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let glyph = line_glyph(dx, -dy, sx == sy, width >= 2.0);

        let (mut x, mut y) = (x0, y0);
        let mut err = dx + dy;
        loop {
            self.put(x, y, glyph, color, Modifiers::NONE);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }
}

/// Box-drawing glyph for a segment with the given extents.
fn line_glyph(dx: i32, dy: i32, falling: bool, heavy: bool) -> &'static str {
    if dx == 0 && dy == 0 {
        "•"
    } else if dx > dy * 2 {
        if heavy {
            "━"
        } else {
            "─"
        }
    } else if dy > dx * 2 {
        if heavy {
            "┃"
        } else {
            "│"
        }
    } else if falling {
        "╲"
    } else {
        "╱"
    }
}

/// Even-odd point-in-polygon test.
fn inside(points: &[Point], p: Point) -> bool {
    let mut inside = false;
    let mut j = points.len() - 1;
    for (i, a) in points.iter().enumerate() {
        let b = points[j];
        if (a.y > p.y) != (b.y > p.y) {
            let x = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

impl Canvas for TerminalCanvas<'_> {
    fn clear(&mut self, color: Color) {
        self.buffer.clear(color);
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        for (x, y) in Self::cells(self.cell_rect(rect)) {
            self.buffer.blend(x as u16, y as u16, color);
        }
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color, width: f32) {
        let r = ClipRect::from_rect(self.transform().apply_rect(rect));
        if r.x1 <= r.x0 || r.y1 <= r.y0 {
            return;
        }
        let (h, v, tl, tr, bl, br) = if width >= 2.0 {
            ("═", "║", "╔", "╗", "╚", "╝")
        } else {
            ("─", "│", "┌", "┐", "└", "┘")
        };
        let (right, bottom) = (r.x1 - 1, r.y1 - 1);
        for x in r.x0..=right {
            self.put(x, r.y0, h, color, Modifiers::NONE);
            self.put(x, bottom, h, color, Modifiers::NONE);
        }
        for y in r.y0..=bottom {
            self.put(r.x0, y, v, color, Modifiers::NONE);
            self.put(right, y, v, color, Modifiers::NONE);
        }
        if right > r.x0 && bottom > r.y0 {
            self.put(r.x0, r.y0, tl, color, Modifiers::NONE);
            self.put(right, r.y0, tr, color, Modifiers::NONE);
            self.put(r.x0, bottom, bl, color, Modifiers::NONE);
            self.put(right, bottom, br, color, Modifiers::NONE);
        }
    }

    fn stroke_path(&mut self, points: &[Point], color: Color, width: f32) {
        match points {
            [] => {}
            [only] => self.line(*only, *only, color, width),
            _ => {
                for pair in points.windows(2) {
                    self.line(pair[0], pair[1], color, width);
                }
            }
        }
    }

    fn fill_path(&mut self, points: &[Point], color: Color) {
        if points.len() < 3 {
            return;
        }
        let t = self.transform();
        let mapped: Vec<Point> = points.iter().map(|p| t.apply(*p)).collect();
        let (mut min, mut max) = (mapped[0], mapped[0]);
        for p in &mapped {
            min = Point::new(min.x.min(p.x), min.y.min(p.y));
            max = Point::new(max.x.max(p.x), max.y.max(p.y));
        }
        let bounds = ClipRect {
            x0: min.x.floor() as i32,
            y0: min.y.floor() as i32,
            x1: max.x.ceil() as i32,
            y1: max.y.ceil() as i32,
        }
        .intersect(self.clip());
        for (x, y) in Self::cells(bounds) {
            let center = Point::new(x as f32 + 0.5, y as f32 + 0.5);
            if inside(&mapped, center) {
                self.buffer.blend(x as u16, y as u16, color);
            }
        }
    }

    fn fill_circle(&mut self, center: Point, radius: f32, color: Color) {
        let t = self.transform();
        let radius = radius * t.matrix[0].abs();
        if radius <= DOT_RADIUS {
            let (x, y) = self.cell_of(center);
            let glyph = if radius >= 0.5 { "•" } else { "·" };
            self.put(x, y, glyph, color, Modifiers::NONE);
            return;
        }
        let c = t.apply(center);
        let bounds = ClipRect {
            x0: (c.x - radius).floor() as i32,
            y0: (c.y - radius).floor() as i32,
            x1: (c.x + radius).ceil() as i32,
            y1: (c.y + radius).ceil() as i32,
        }
        .intersect(self.clip());
        for (x, y) in Self::cells(bounds) {
            let dx = x as f32 + 0.5 - c.x;
            let dy = y as f32 + 0.5 - c.y;
            if dx.hypot(dy) <= radius {
                self.blend_cell(x, y, color);
            }
        }
    }

    fn stroke_arc(
        &mut self,
        center: Point,
        radius: f32,
        start_angle: f32,
        end_angle: f32,
        color: Color,
        width: f32,
    ) {
        let sweep = (end_angle - start_angle).clamp(-TAU, TAU);
        if sweep == 0.0 || radius <= 0.0 {
            return;
        }
        let glyph = if width >= 2.0 { "●" } else { "•" };
        let steps = ((sweep.abs() * radius * 2.0).ceil() as usize).max(4);
        let mut last = None;
        for i in 0..=steps {
            let angle = (i as f32 / steps as f32).mul_add(sweep, start_angle);
            let p = Point::new(
                radius.mul_add(angle.cos(), center.x),
                radius.mul_add(angle.sin(), center.y),
            );
            let cell = self.cell_of(p);
            if last != Some(cell) {
                self.put(cell.0, cell.1, glyph, color, Modifiers::NONE);
                last = Some(cell);
            }
        }
    }

    fn draw_text(&mut self, text: &str, position: Point, style: &TextStyle) {
        let width = UnicodeWidthStr::width(text) as f32;
        let anchor_x = match style.align {
            TextAlign::Left => position.x,
            TextAlign::Center => position.x - width / 2.0,
            TextAlign::Right => position.x - width,
        };
        let (mut x, y) = self.cell_of(Point::new(anchor_x, position.y));
        let modifiers = if style.weight == FontWeight::Bold {
            Modifiers::BOLD
        } else {
            Modifiers::NONE
        };
        for grapheme in text.graphemes(true) {
            let w = UnicodeWidthStr::width(grapheme) as i32;
            if w == 0 {
                continue;
            }
            self.put(x, y, grapheme, style.color, modifiers);
            x += w;
        }
    }

    fn push_transform(&mut self, transform: Transform2D) {
        let composed = transform.then(&self.transform());
        self.transforms.push(composed);
    }

    fn pop_transform(&mut self) {
        self.transforms.pop();
    }

    fn push_clip(&mut self, rect: Rect) {
        let clip = ClipRect::from_rect(self.transform().apply_rect(rect)).intersect(self.clip());
        self.clips.push(clip);
    }

    fn pop_clip(&mut self) {
        self.clips.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas_test<F: FnOnce(&mut TerminalCanvas<'_>)>(w: u16, h: u16, paint: F) -> CellBuffer {
        let mut buffer = CellBuffer::new(w, h);
        paint(&mut TerminalCanvas::new(&mut buffer));
        buffer
    }

    fn symbol(buffer: &CellBuffer, x: u16, y: u16) -> &str {
        buffer.get(x, y).map_or("", |c| c.symbol.as_str())
    }

    #[test]
    fn test_text_alignment() {
        let buffer = canvas_test(20, 3, |c| {
            c.draw_text("LEFT", Point::new(0.0, 0.0), &TextStyle::colored(Color::WHITE));
            c.draw_text(
                "MID",
                Point::new(10.0, 1.0),
                &TextStyle::colored(Color::WHITE).with_align(TextAlign::Center),
            );
            c.draw_text(
                "END",
                Point::new(20.0, 2.0),
                &TextStyle::colored(Color::WHITE).with_align(TextAlign::Right),
            );
        });
        assert!(buffer.row_text(0).starts_with("LEFT"));
        assert_eq!(buffer.row_text(1).find("MID"), Some(8));
        assert!(buffer.row_text(2).ends_with("END"));
    }

    #[test]
    fn test_bold_and_translucent_text() {
        let buffer = canvas_test(10, 1, |c| {
            c.draw_text(
                "♥",
                Point::new(0.0, 0.0),
                &TextStyle::colored(Color::WHITE.with_alpha(0.5)).bold(),
            );
        });
        let cell = buffer.get(0, 0).expect("cell");
        assert!(cell.modifiers.contains(Modifiers::BOLD));
        assert_eq!(cell.fg.to_rgb8(), (128, 128, 128));
    }

    #[test]
    fn test_wide_text_marks_continuation() {
        let buffer = canvas_test(6, 1, |c| {
            c.draw_text("⚡ok", Point::new(0.0, 0.0), &TextStyle::colored(Color::WHITE));
        });
        assert_eq!(symbol(&buffer, 0, 0), "⚡");
        assert!(buffer.get(1, 0).is_some_and(|c| c.is_continuation()));
        assert_eq!(symbol(&buffer, 2, 0), "o");
    }

    #[test]
    fn test_text_clipped_at_edges() {
        let buffer = canvas_test(4, 1, |c| {
            c.draw_text("abcdef", Point::new(-2.0, 0.0), &TextStyle::colored(Color::WHITE));
            c.draw_text("zz", Point::new(0.0, 5.0), &TextStyle::colored(Color::WHITE));
        });
        assert_eq!(buffer.row_text(0), "cdef");
    }

    #[test]
    fn test_translucent_fill_tints_underlying_glyphs() {
        let buffer = canvas_test(4, 2, |c| {
            c.draw_text("ab", Point::new(0.0, 0.0), &TextStyle::colored(Color::WHITE));
            c.fill_rect(Rect::new(0.0, 0.0, 4.0, 2.0), Color::ALARM.with_alpha(0.25));
        });
        assert_eq!(symbol(&buffer, 0, 0), "a");
        let cell = buffer.get(0, 0).expect("cell");
        assert!(cell.bg.r > 0.2 && cell.bg.g < 0.1);
    }

    #[test]
    fn test_box_outline() {
        let buffer = canvas_test(6, 4, |c| {
            c.stroke_rect(Rect::new(1.0, 1.0, 4.0, 3.0), Color::HEALTHY, 1.0);
        });
        assert_eq!(buffer.row_text(1), " ┌──┐ ");
        assert_eq!(buffer.row_text(2), " │  │ ");
        assert_eq!(buffer.row_text(3), " └──┘ ");

        let heavy = canvas_test(4, 2, |c| {
            c.stroke_rect(Rect::new(0.0, 0.0, 4.0, 2.0), Color::ALARM, 2.0);
        });
        assert_eq!(heavy.row_text(0), "╔══╗");
    }

    #[test]
    fn test_line_glyphs() {
        let buffer = canvas_test(5, 5, |c| {
            c.draw_line(Point::new(0.0, 0.0), Point::new(4.0, 0.0), Color::WHITE, 1.0);
            c.draw_line(Point::new(0.0, 1.0), Point::new(0.0, 4.0), Color::WHITE, 1.0);
            c.draw_line(Point::new(1.0, 1.0), Point::new(4.0, 4.0), Color::WHITE, 1.0);
        });
        assert_eq!(buffer.row_text(0), "─────");
        assert_eq!(symbol(&buffer, 0, 3), "│");
        assert_eq!(symbol(&buffer, 2, 2), "╲");
    }

    #[test]
    fn test_small_circle_is_a_dot() {
        let buffer = canvas_test(4, 4, |c| {
            c.fill_circle(Point::new(1.5, 1.5), 1.0, Color::CALM);
            c.fill_circle(Point::new(3.2, 3.2), 0.3, Color::CALM);
        });
        assert_eq!(symbol(&buffer, 1, 1), "•");
        assert_eq!(symbol(&buffer, 3, 3), "·");
    }

    #[test]
    fn test_large_circle_fills() {
        let buffer = canvas_test(10, 10, |c| {
            c.fill_circle(Point::new(5.0, 5.0), 3.0, Color::ALARM);
        });
        assert_eq!(buffer.get(5, 5).map(|c| c.bg), Some(Color::ALARM));
        assert_eq!(buffer.get(0, 0).map(|c| c.bg), Some(Color::TRANSPARENT));
    }

    #[test]
    fn test_fill_path_triangle() {
        let buffer = canvas_test(10, 10, |c| {
            c.fill_path(
                &[Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(0.0, 10.0)],
                Color::HEALTHY,
            );
        });
        assert_eq!(buffer.get(1, 1).map(|c| c.bg), Some(Color::HEALTHY));
        assert_eq!(buffer.get(9, 9).map(|c| c.bg), Some(Color::TRANSPARENT));
    }

    #[test]
    fn test_arc_draws_dots_on_radius() {
        let buffer = canvas_test(12, 12, |c| {
            c.stroke_arc(Point::new(6.0, 6.0), 4.0, 0.0, TAU, Color::HEALTHY, 1.0);
        });
        assert_eq!(symbol(&buffer, 10, 6), "•");
        assert_eq!(symbol(&buffer, 2, 6), "•");
        assert_eq!(symbol(&buffer, 6, 6), " ");
    }

    #[test]
    fn test_transform_and_clip() {
        let buffer = canvas_test(10, 3, |c| {
            c.push_transform(Transform2D::translate(3.0, 1.0));
            c.push_clip(Rect::new(0.0, 0.0, 2.0, 1.0));
            c.draw_text("abcd", Point::new(0.0, 0.0), &TextStyle::colored(Color::WHITE));
            c.pop_clip();
            c.pop_transform();
            c.draw_text("x", Point::new(0.0, 0.0), &TextStyle::colored(Color::WHITE));
        });
        assert_eq!(buffer.row_text(1), "   ab     ");
        assert_eq!(symbol(&buffer, 0, 0), "x");
    }

    #[test]
    fn test_clear_and_zero_sized_surface() {
        let buffer = canvas_test(3, 1, |c| {
            c.draw_text("abc", Point::new(0.0, 0.0), &TextStyle::colored(Color::WHITE));
            c.clear(Color::BLACK);
        });
        assert_eq!(buffer.row_text(0), "   ");

        let empty = canvas_test(0, 0, |c| {
            c.fill_rect(Rect::new(0.0, 0.0, 5.0, 5.0), Color::WHITE);
            c.stroke_rect(Rect::new(0.0, 0.0, 5.0, 5.0), Color::WHITE, 1.0);
            c.fill_circle(Point::new(1.0, 1.0), 3.0, Color::WHITE);
            c.draw_text("x", Point::new(0.0, 0.0), &TextStyle::colored(Color::WHITE));
        });
        assert!(empty.is_empty());
    }
}
