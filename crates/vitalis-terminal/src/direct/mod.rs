//! Direct crossterm backend.
//!
//! ```text
//! Presenter ─paint→ TerminalCanvas ─cells→ CellBuffer ─diff→ DiffRenderer ─bytes→ stdout
//! ```
//!
//! Each frame is painted in full into the buffer; the renderer compares it
//! with what it last emitted and writes only the differences in one batch.

mod cell_buffer;
mod diff_renderer;
mod terminal_canvas;

pub use cell_buffer::{Cell, CellBuffer, Modifiers};
pub use diff_renderer::{DiffRenderer, FlushStats};
pub use terminal_canvas::TerminalCanvas;
