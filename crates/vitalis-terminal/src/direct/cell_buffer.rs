//! Grid of terminal cells with dirty tracking.
//!
//! Symbols are `CompactString`s, so the single graphemes the presenters draw
//! never touch the heap in steady state.

use bitvec::prelude::*;
use compact_str::CompactString;
use unicode_width::UnicodeWidthStr;
use vitalis_core::Color;

/// Text attributes for a cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers(u8);

impl Modifiers {
    /// Plain text.
    pub const NONE: Self = Self(0);
    /// Bold text.
    pub const BOLD: Self = Self(1);

    /// Check if every flag in `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Check if no flag is set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for Modifiers {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

/// A single terminal cell.
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    /// Grapheme shown in this cell (empty for the right half of a wide one).
    pub symbol: CompactString,
    /// Foreground color.
    pub fg: Color,
    /// Background color; transparent shows the terminal default.
    pub bg: Color,
    /// Text attributes.
    pub modifiers: Modifiers,
    /// Display width: 1, 2 for wide graphemes, 0 for a continuation.
    width: u8,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            symbol: CompactString::const_new(" "),
            fg: Color::WHITE,
            bg: Color::TRANSPARENT,
            modifiers: Modifiers::NONE,
            width: 1,
        }
    }
}

impl Cell {
    /// Create a cell.
    #[must_use]
    pub fn new(symbol: &str, fg: Color, bg: Color, modifiers: Modifiers) -> Self {
        let mut cell = Self::default();
        cell.update(symbol, fg, bg, modifiers);
        cell
    }

    /// Replace the content in place.
    pub fn update(&mut self, symbol: &str, fg: Color, bg: Color, modifiers: Modifiers) {
        self.symbol.clear();
        self.symbol.push_str(symbol);
        self.fg = fg;
        self.bg = bg;
        self.modifiers = modifiers;
        self.width = UnicodeWidthStr::width(symbol).clamp(1, 2) as u8;
    }

    /// Composite a translucent `color` over this cell.
    ///
    /// The background and the glyph color both move toward `color` by its
    /// alpha. An opaque color also erases the glyph.
    pub fn blend(&mut self, color: Color) {
        if color.a <= 0.0 {
            return;
        }
        self.bg = color.over(&self.backdrop());
        if color.a >= 1.0 {
            self.symbol.clear();
            self.symbol.push(' ');
            self.modifiers = Modifiers::NONE;
            self.width = 1;
        } else {
            self.fg = color.over(&self.fg);
        }
    }

    /// Background as an opaque color; the terminal default counts as black.
    #[must_use]
    pub fn backdrop(&self) -> Color {
        if self.bg.a <= 0.0 {
            Color::BLACK
        } else {
            self.bg
        }
    }

    /// Mark this cell as the right half of a wide grapheme.
    pub fn make_continuation(&mut self) {
        self.symbol.clear();
        self.width = 0;
    }

    /// Check if this is the right half of a wide grapheme.
    #[must_use]
    pub const fn is_continuation(&self) -> bool {
        self.width == 0
    }

    /// Display width.
    #[must_use]
    pub const fn width(&self) -> u8 {
        self.width
    }

    /// Back to a blank cell on the terminal default background.
    pub fn reset(&mut self) {
        self.update(" ", Color::WHITE, Color::TRANSPARENT, Modifiers::NONE);
    }
}

/// Row-major cell grid with one dirty bit per cell.
#[derive(Debug)]
pub struct CellBuffer {
    cells: Vec<Cell>,
    width: u16,
    height: u16,
    dirty: BitVec,
}

impl CellBuffer {
    /// Create a blank buffer. Zero-sized buffers are valid.
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        let size = usize::from(width) * usize::from(height);
        Self {
            cells: vec![Cell::default(); size],
            width,
            height,
            dirty: bitvec![0; size],
        }
    }

    /// Width in cells.
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Height in cells.
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// Number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if the buffer has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn index(&self, x: u16, y: u16) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| usize::from(y) * usize::from(self.width) + usize::from(x))
    }

    /// Convert a linear index to `(x, y)`.
    #[must_use]
    pub fn coords(&self, idx: usize) -> (u16, u16) {
        let width = usize::from(self.width.max(1));
        ((idx % width) as u16, (idx / width) as u16)
    }

    /// Borrow a cell.
    #[must_use]
    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        self.index(x, y).map(|idx| &self.cells[idx])
    }

    /// Borrow a cell mutably and mark it dirty.
    pub fn get_mut(&mut self, x: u16, y: u16) -> Option<&mut Cell> {
        let idx = self.index(x, y)?;
        self.dirty.set(idx, true);
        Some(&mut self.cells[idx])
    }

    /// Replace a cell's content. Out-of-range writes are ignored.
    pub fn update(
        &mut self,
        x: u16,
        y: u16,
        symbol: &str,
        fg: Color,
        bg: Color,
        modifiers: Modifiers,
    ) {
        if let Some(cell) = self.get_mut(x, y) {
            cell.update(symbol, fg, bg, modifiers);
        }
    }

    /// Composite a translucent color over one cell.
    pub fn blend(&mut self, x: u16, y: u16, color: Color) {
        if let Some(cell) = self.get_mut(x, y) {
            cell.blend(color);
        }
    }

    /// Mark every cell dirty, forcing a full repaint.
    pub fn mark_all_dirty(&mut self) {
        self.dirty.fill(true);
    }

    /// Forget all dirty marks.
    pub fn clear_dirty(&mut self) {
        self.dirty.fill(false);
    }

    /// Number of dirty cells.
    #[must_use]
    pub fn dirty_count(&self) -> usize {
        self.dirty.count_ones()
    }

    /// Indices of dirty cells, in row-major order.
    pub fn iter_dirty(&self) -> impl Iterator<Item = usize> + '_ {
        self.dirty.iter_ones()
    }

    /// All cells, row-major.
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Resize; content is cleared and everything is dirty.
    pub fn resize(&mut self, width: u16, height: u16) {
        let size = usize::from(width) * usize::from(height);
        self.width = width;
        self.height = height;
        self.cells.clear();
        self.cells.resize(size, Cell::default());
        self.dirty = bitvec![1; size];
    }

    /// Fill every cell with a blank on `bg`.
    pub fn clear(&mut self, bg: Color) {
        for cell in &mut self.cells {
            cell.update(" ", Color::WHITE, bg, Modifiers::NONE);
        }
        self.mark_all_dirty();
    }

    /// Symbols of one row, continuation cells skipped.
    #[must_use]
    pub fn row_text(&self, y: u16) -> String {
        if y >= self.height {
            return String::new();
        }
        let start = usize::from(y) * usize::from(self.width);
        self.cells[start..start + usize::from(self.width)]
            .iter()
            .map(|cell| cell.symbol.as_str())
            .collect()
    }

    /// Whether `needle` appears on any row.
    #[must_use]
    pub fn contains_text(&self, needle: &str) -> bool {
        (0..self.height).any(|y| self.row_text(y).contains(needle))
    }
}
