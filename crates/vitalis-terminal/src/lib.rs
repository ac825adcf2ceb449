//! Terminal front end for vitalis.
//!
//! Paints the presenters from `vitalis-widgets` into a cell grid and writes
//! only the changed cells to the terminal with `crossterm`. The engine talks
//! to the event server over [`ws::WsDialer`], or to an in-process
//! [`demo::DemoFeed`] when running offline.
//!
//! ```text
//! keys ─→ InputHandler ─→ App ─→ Engine ←─ WsLink / LoopbackLink
//!                          │
//!                          └─paint→ TerminalCanvas → CellBuffer → DiffRenderer → stdout
//! ```
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::suboptimal_flops)]
#![allow(clippy::cast_lossless)]

pub mod app;
pub mod color;
pub mod demo;
pub mod direct;
pub mod error;
pub mod input;
pub mod terminal;
pub mod ws;

pub use app::{run, App, RunOptions, FRAME_INTERVAL, HUD_SIZE};
pub use color::ColorMode;
pub use demo::DemoFeed;
pub use direct::{CellBuffer, DiffRenderer, TerminalCanvas};
pub use error::TerminalError;
pub use input::{Command, InputHandler, KeyBinding};
pub use terminal::{
    CrosstermBackend, CrosstermTerminal, GenericTerminal, ScriptedTerminal, Terminal,
    TerminalBackend, TestableBackend,
};
pub use ws::{WsDialer, WsLink};
