//! Differential renderer: writes only cells that changed since the last frame.
//!
//! A dirty mark alone is not enough, because presenters repaint the whole
//! surface every frame. The renderer keeps a copy of what it last emitted and
//! skips dirty cells that came out identical.

use super::cell_buffer::{Cell, CellBuffer, Modifiers};
use crate::color::ColorMode;
use crossterm::cursor::MoveTo;
use crossterm::style::{
    Attribute, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
};
use crossterm::{queue, QueueableCommand};
use std::io::{self, BufWriter, Write};
use vitalis_core::Color;

#[derive(Clone, Copy, Debug, PartialEq)]
struct StyleState {
    fg: Color,
    bg: Color,
    modifiers: Modifiers,
}

/// Per-flush counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushStats {
    /// Cells written
    pub cells_written: usize,
    /// Explicit cursor moves
    pub cursor_moves: usize,
    /// Style changes
    pub style_changes: usize,
}

/// Tracks cursor, style and the last emitted frame to minimize output.
#[derive(Debug)]
pub struct DiffRenderer {
    color_mode: ColorMode,
    cursor: Option<(u16, u16)>,
    style: Option<StyleState>,
    front: Vec<Cell>,
    front_width: u16,
    stats: FlushStats,
}

impl DiffRenderer {
    /// Create a renderer for `color_mode`.
    #[must_use]
    pub const fn new(color_mode: ColorMode) -> Self {
        Self {
            color_mode,
            cursor: None,
            style: None,
            front: Vec::new(),
            front_width: 0,
            stats: FlushStats {
                cells_written: 0,
                cursor_moves: 0,
                style_changes: 0,
            },
        }
    }

    /// Color mode in use.
    #[must_use]
    pub const fn color_mode(&self) -> ColorMode {
        self.color_mode
    }

    /// Counters from the last flush.
    #[must_use]
    pub const fn stats(&self) -> FlushStats {
        self.stats
    }

    /// Forget what is on screen; the next flush repaints everything.
    pub fn reset(&mut self) {
        self.cursor = None;
        self.style = None;
        self.front.clear();
        self.front_width = 0;
    }

    /// Write changed cells and clear the dirty marks.
    pub fn flush<W: Write>(&mut self, buffer: &mut CellBuffer, writer: &mut W) -> io::Result<usize> {
        self.stats = FlushStats::default();
        if buffer.width() != self.front_width || buffer.len() != self.front.len() {
            self.front = vec![Cell::default(); buffer.len()];
            self.front_width = buffer.width();
            self.cursor = None;
            self.style = None;
            buffer.mark_all_dirty();
        }

        let mut out = BufWriter::with_capacity(16 * 1024, writer);
        let full = self.style.is_none();
        if full {
            queue!(out, ResetColor)?;
        }

        for idx in buffer.iter_dirty() {
            let cell = &buffer.cells()[idx];
            if cell.is_continuation() || (!full && self.front[idx] == *cell) {
                continue;
            }
            let (x, y) = buffer.coords(idx);
            if self.cursor != Some((x, y)) {
                queue!(out, MoveTo(x, y))?;
                self.stats.cursor_moves += 1;
            }
            let style = StyleState {
                fg: cell.fg,
                bg: cell.bg,
                modifiers: cell.modifiers,
            };
            if self.style != Some(style) {
                self.apply_style(&mut out, style)?;
                self.style = Some(style);
                self.stats.style_changes += 1;
            }
            queue!(out, Print(cell.symbol.as_str()))?;
            let next_x = x.saturating_add(u16::from(cell.width()));
            self.cursor = (next_x < buffer.width()).then_some((next_x, y));
            self.front[idx] = cell.clone();
            self.stats.cells_written += 1;
        }

        buffer.clear_dirty();
        out.flush()?;
        Ok(self.stats.cells_written)
    }

    fn apply_style<W: Write>(&self, writer: &mut W, style: StyleState) -> io::Result<()> {
        writer.queue(SetAttribute(Attribute::Reset))?;
        writer.queue(SetForegroundColor(self.color_mode.to_crossterm(style.fg)))?;
        writer.queue(SetBackgroundColor(self.color_mode.to_crossterm(style.bg)))?;
        if style.modifiers.contains(Modifiers::BOLD) {
            writer.queue(SetAttribute(Attribute::Bold))?;
        }
        Ok(())
    }

    /// Repaint every cell regardless of what is on screen.
    pub fn render_full<W: Write>(
        &mut self,
        buffer: &mut CellBuffer,
        writer: &mut W,
    ) -> io::Result<usize> {
        self.reset();
        buffer.mark_all_dirty();
        self.flush(buffer, writer)
    }
}
