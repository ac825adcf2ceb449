//! Drawing surface abstraction.
//!
//! Presenters paint through [`Canvas`] and never touch a concrete renderer.
//! [`RecordingCanvas`] captures every operation as a [`DrawCommand`] so paint
//! output can be asserted on in tests; the terminal crate implements the same
//! trait over a cell buffer.

use crate::{Color, Point, Rect};
use serde::{Deserialize, Serialize};

/// Font weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FontWeight {
    /// Regular weight
    #[default]
    Normal,
    /// Bold weight
    Bold,
}

/// Horizontal anchoring of text relative to its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextAlign {
    /// Position is the left edge
    #[default]
    Left,
    /// Position is the center
    Center,
    /// Position is the right edge
    Right,
}

/// Text style for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    /// Font size in surface units
    pub size: f32,
    /// Text color
    pub color: Color,
    /// Font weight
    pub weight: FontWeight,
    /// Anchoring
    pub align: TextAlign,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            size: 12.0,
            color: Color::WHITE,
            weight: FontWeight::Normal,
            align: TextAlign::Left,
        }
    }
}

impl TextStyle {
    /// Style with the given color and defaults otherwise.
    #[must_use]
    pub fn colored(color: Color) -> Self {
        Self {
            color,
            ..Self::default()
        }
    }

    /// Set the font size.
    #[must_use]
    pub const fn with_size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    /// Make the text bold.
    #[must_use]
    pub const fn bold(mut self) -> Self {
        self.weight = FontWeight::Bold;
        self
    }

    /// Set the anchoring.
    #[must_use]
    pub const fn with_align(mut self, align: TextAlign) -> Self {
        self.align = align;
        self
    }
}

/// 2D affine transform.
///
/// Matrix elements `[a, b, c, d, e, f]`:
/// ```text
/// | a c e |
/// | b d f |
/// | 0 0 1 |
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform2D {
    /// Matrix elements
    pub matrix: [f32; 6],
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform2D {
    /// Identity transformation.
    #[must_use]
    pub const fn identity() -> Self {
        Self {
            matrix: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
        }
    }

    /// Translation transform.
    #[must_use]
    pub const fn translate(x: f32, y: f32) -> Self {
        Self {
            matrix: [1.0, 0.0, 0.0, 1.0, x, y],
        }
    }

    /// Scale transform.
    #[must_use]
    pub const fn scale(sx: f32, sy: f32) -> Self {
        Self {
            matrix: [sx, 0.0, 0.0, sy, 0.0, 0.0],
        }
    }

    /// Compose: apply `self` first, then `next`.
    #[must_use]
    pub fn then(&self, next: &Self) -> Self {
        let [a1, b1, c1, d1, e1, f1] = self.matrix;
        let [a2, b2, c2, d2, e2, f2] = next.matrix;
        Self {
            matrix: [
                a2.mul_add(a1, c2 * b1),
                b2.mul_add(a1, d2 * b1),
                a2.mul_add(c1, c2 * d1),
                b2.mul_add(c1, d2 * d1),
                a2.mul_add(e1, c2.mul_add(f1, e2)),
                b2.mul_add(e1, d2.mul_add(f1, f2)),
            ],
        }
    }

    /// Map a point through the transform.
    #[must_use]
    pub fn apply(&self, p: Point) -> Point {
        let [a, b, c, d, e, f] = self.matrix;
        Point::new(a.mul_add(p.x, c.mul_add(p.y, e)), b.mul_add(p.x, d.mul_add(p.y, f)))
    }

    /// Map an axis-aligned rect (rotation is not supported).
    #[must_use]
    pub fn apply_rect(&self, r: Rect) -> Rect {
        let origin = self.apply(Point::new(r.x, r.y));
        Rect::new(
            origin.x,
            origin.y,
            r.width * self.matrix[0],
            r.height * self.matrix[3],
        )
    }
}

/// Drawing surface that presenters paint onto.
///
/// Angles are radians, measured clockwise from the positive x axis (screen
/// coordinates, y grows downward).
pub trait Canvas {
    /// Fill the whole surface.
    fn clear(&mut self, color: Color);

    /// Fill a rectangle. Alpha blends with what is underneath.
    fn fill_rect(&mut self, rect: Rect, color: Color);

    /// Outline a rectangle.
    fn stroke_rect(&mut self, rect: Rect, color: Color, width: f32);

    /// Stroke an open polyline.
    fn stroke_path(&mut self, points: &[Point], color: Color, width: f32);

    /// Fill a closed polygon.
    fn fill_path(&mut self, points: &[Point], color: Color);

    /// Fill a circle.
    fn fill_circle(&mut self, center: Point, radius: f32, color: Color);

    /// Stroke an arc between two angles.
    fn stroke_arc(
        &mut self,
        center: Point,
        radius: f32,
        start_angle: f32,
        end_angle: f32,
        color: Color,
        width: f32,
    );

    /// Draw text anchored at `position` (top of the line box).
    fn draw_text(&mut self, text: &str, position: Point, style: &TextStyle);

    /// Draw a straight line.
    fn draw_line(&mut self, from: Point, to: Point, color: Color, width: f32) {
        self.stroke_path(&[from, to], color, width);
    }

    /// Push a transform composed with the current one.
    fn push_transform(&mut self, transform: Transform2D);

    /// Pop the most recent transform.
    fn pop_transform(&mut self);

    /// Restrict drawing to `rect`, intersected with the current clip.
    fn push_clip(&mut self, rect: Rect);

    /// Pop the most recent clip.
    fn pop_clip(&mut self);
}

/// A recorded drawing operation, in surface coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Whole surface cleared
    Clear {
        /// Fill color
        color: Color,
    },
    /// Filled rectangle
    FillRect {
        /// Bounds
        bounds: Rect,
        /// Fill color
        color: Color,
    },
    /// Outlined rectangle
    StrokeRect {
        /// Bounds
        bounds: Rect,
        /// Stroke color
        color: Color,
        /// Stroke width
        width: f32,
    },
    /// Open polyline
    StrokePath {
        /// Vertices
        points: Vec<Point>,
        /// Stroke color
        color: Color,
        /// Stroke width
        width: f32,
    },
    /// Filled polygon
    FillPath {
        /// Vertices
        points: Vec<Point>,
        /// Fill color
        color: Color,
    },
    /// Filled circle
    Circle {
        /// Center
        center: Point,
        /// Radius
        radius: f32,
        /// Fill color
        color: Color,
    },
    /// Stroked arc
    Arc {
        /// Center
        center: Point,
        /// Radius
        radius: f32,
        /// Start angle (radians)
        start_angle: f32,
        /// End angle (radians)
        end_angle: f32,
        /// Stroke color
        color: Color,
        /// Stroke width
        width: f32,
    },
    /// Text run
    Text {
        /// Text content
        content: String,
        /// Anchor position
        position: Point,
        /// Style
        style: TextStyle,
    },
}

impl DrawCommand {
    /// Primary color of the command.
    #[must_use]
    pub const fn color(&self) -> Color {
        match self {
            Self::Clear { color }
            | Self::FillRect { color, .. }
            | Self::StrokeRect { color, .. }
            | Self::StrokePath { color, .. }
            | Self::FillPath { color, .. }
            | Self::Circle { color, .. }
            | Self::Arc { color, .. } => *color,
            Self::Text { style, .. } => style.color,
        }
    }
}

/// A Canvas implementation that records draw operations as `DrawCommand`s.
///
/// Coordinates are recorded after the current transform has been applied.
#[derive(Debug, Default)]
pub struct RecordingCanvas {
    commands: Vec<DrawCommand>,
    clip_stack: Vec<Rect>,
    transform_stack: Vec<Transform2D>,
}

impl RecordingCanvas {
    /// Create a new empty recording canvas.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the recorded draw commands.
    #[must_use]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Get the number of recorded commands.
    #[must_use]
    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    /// Check if no commands have been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Clear all recorded commands and stacks.
    pub fn reset(&mut self) {
        self.commands.clear();
        self.clip_stack.clear();
        self.transform_stack.clear();
    }

    /// Get the current transform (identity if no transforms pushed).
    #[must_use]
    pub fn current_transform(&self) -> Transform2D {
        self.transform_stack
            .last()
            .copied()
            .unwrap_or_else(Transform2D::identity)
    }

    /// Get the current clip bounds (None if no clips pushed).
    #[must_use]
    pub fn current_clip(&self) -> Option<Rect> {
        self.clip_stack.last().copied()
    }

    /// Get the transform stack depth.
    #[must_use]
    pub fn transform_depth(&self) -> usize {
        self.transform_stack.len()
    }

    /// All text runs, in paint order.
    #[must_use]
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { content, .. } => Some(content.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Check whether any text run equals `needle`.
    #[must_use]
    pub fn has_text(&self, needle: &str) -> bool {
        self.texts().iter().any(|t| *t == needle)
    }

    /// Color of the first text run equal to `needle`.
    #[must_use]
    pub fn text_color(&self, needle: &str) -> Option<Color> {
        self.commands.iter().find_map(|c| match c {
            DrawCommand::Text { content, style, .. } if content == needle => Some(style.color),
            _ => None,
        })
    }

    fn map_points(&self, points: &[Point]) -> Vec<Point> {
        let t = self.current_transform();
        points.iter().map(|p| t.apply(*p)).collect()
    }
}

impl Canvas for RecordingCanvas {
    fn clear(&mut self, color: Color) {
        self.commands.push(DrawCommand::Clear { color });
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let bounds = self.current_transform().apply_rect(rect);
        self.commands.push(DrawCommand::FillRect { bounds, color });
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color, width: f32) {
        let bounds = self.current_transform().apply_rect(rect);
        self.commands.push(DrawCommand::StrokeRect {
            bounds,
            color,
            width,
        });
    }

    fn stroke_path(&mut self, points: &[Point], color: Color, width: f32) {
        let points = self.map_points(points);
        self.commands.push(DrawCommand::StrokePath {
            points,
            color,
            width,
        });
    }

    fn fill_path(&mut self, points: &[Point], color: Color) {
        let points = self.map_points(points);
        self.commands.push(DrawCommand::FillPath { points, color });
    }

    fn fill_circle(&mut self, center: Point, radius: f32, color: Color) {
        let center = self.current_transform().apply(center);
        self.commands.push(DrawCommand::Circle {
            center,
            radius,
            color,
        });
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
        let center = self.current_transform().apply(center);
        self.commands.push(DrawCommand::Arc {
            center,
            radius,
            start_angle,
            end_angle,
            color,
            width,
        });
    }

    fn draw_text(&mut self, text: &str, position: Point, style: &TextStyle) {
        let position = self.current_transform().apply(position);
        self.commands.push(DrawCommand::Text {
            content: text.to_string(),
            position,
            style: style.clone(),
        });
    }

    fn push_transform(&mut self, transform: Transform2D) {
        let composed = transform.then(&self.current_transform());
        self.transform_stack.push(composed);
    }

    fn pop_transform(&mut self) {
        self.transform_stack.pop();
    }

    fn push_clip(&mut self, rect: Rect) {
        let clip = match self.current_clip() {
            Some(current) => current
                .intersection(&rect)
                .unwrap_or(Rect::new(rect.x, rect.y, 0.0, 0.0)),
            None => rect,
        };
        self.clip_stack.push(clip);
    }

    fn pop_clip(&mut self) {
        self.clip_stack.pop();
    }
}
