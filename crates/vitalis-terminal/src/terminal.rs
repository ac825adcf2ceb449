//! Terminal abstraction so the app loop can run without a TTY.

use crate::direct::{CellBuffer, DiffRenderer};
use crate::error::TerminalError;
use crossterm::event::{self, Event};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, Stdout, Write};
use std::time::Duration;

/// What the app loop needs from a terminal.
pub trait Terminal {
    /// Enter raw mode and alternate screen.
    fn enter(&mut self) -> Result<(), TerminalError>;
    /// Leave alternate screen and raw mode.
    fn leave(&mut self) -> Result<(), TerminalError>;
    /// Terminal size (columns, rows).
    fn size(&self) -> Result<(u16, u16), TerminalError>;
    /// Next input event, waiting at most `timeout`.
    fn poll_event(&self, timeout: Duration) -> Result<Option<Event>, TerminalError>;
    /// Write changed cells.
    fn flush(
        &mut self,
        buffer: &mut CellBuffer,
        renderer: &mut DiffRenderer,
    ) -> Result<(), TerminalError>;
}

/// Raw terminal operations. Split out so the sequencing in
/// [`GenericTerminal`] can be tested against a writer.
pub trait TerminalBackend {
    fn enable_raw_mode(&mut self) -> Result<(), TerminalError>;
    fn disable_raw_mode(&mut self) -> Result<(), TerminalError>;
    fn enter_alternate_screen(&mut self) -> Result<(), TerminalError>;
    fn leave_alternate_screen(&mut self) -> Result<(), TerminalError>;
    fn hide_cursor(&mut self) -> Result<(), TerminalError>;
    fn show_cursor(&mut self) -> Result<(), TerminalError>;
    fn size(&self) -> Result<(u16, u16), TerminalError>;
    fn poll_event(&self, timeout: Duration) -> Result<Option<Event>, TerminalError>;
    fn write_flush(
        &mut self,
        buffer: &mut CellBuffer,
        renderer: &mut DiffRenderer,
    ) -> Result<(), TerminalError>;
}

/// Stdout backend.
pub struct CrosstermBackend {
    stdout: Stdout,
}

impl CrosstermBackend {
    #[must_use]
    pub fn new() -> Self {
        Self {
            stdout: io::stdout(),
        }
    }
}

impl Default for CrosstermBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalBackend for CrosstermBackend {
    fn enable_raw_mode(&mut self) -> Result<(), TerminalError> {
        enable_raw_mode()?;
        Ok(())
    }
    fn disable_raw_mode(&mut self) -> Result<(), TerminalError> {
        let _ = disable_raw_mode();
        Ok(())
    }
    fn enter_alternate_screen(&mut self) -> Result<(), TerminalError> {
        execute!(self.stdout, EnterAlternateScreen)?;
        Ok(())
    }
    fn leave_alternate_screen(&mut self) -> Result<(), TerminalError> {
        let _ = execute!(self.stdout, LeaveAlternateScreen);
        Ok(())
    }
    fn hide_cursor(&mut self) -> Result<(), TerminalError> {
        execute!(self.stdout, cursor::Hide)?;
        Ok(())
    }
    fn show_cursor(&mut self) -> Result<(), TerminalError> {
        let _ = execute!(self.stdout, cursor::Show);
        Ok(())
    }
    fn size(&self) -> Result<(u16, u16), TerminalError> {
        Ok(crossterm::terminal::size()?)
    }
    fn poll_event(&self, timeout: Duration) -> Result<Option<Event>, TerminalError> {
        if event::poll(timeout)? {
            Ok(Some(event::read()?))
        } else {
            Ok(None)
        }
    }
    fn write_flush(
        &mut self,
        buffer: &mut CellBuffer,
        renderer: &mut DiffRenderer,
    ) -> Result<(), TerminalError> {
        renderer.flush(buffer, &mut self.stdout)?;
        self.stdout.flush()?;
        Ok(())
    }
}

/// Backend over any writer, with scripted input.
pub struct TestableBackend<W: Write> {
    writer: W,
    size: (u16, u16),
    raw_mode: bool,
    alternate_screen: bool,
    cursor_hidden: bool,
    events: RefCell<VecDeque<Event>>,
}

impl<W: Write> TestableBackend<W> {
    /// Backend writing to `writer` with a fixed size.
    pub fn new(writer: W, width: u16, height: u16) -> Self {
        Self {
            writer,
            size: (width, height),
            raw_mode: false,
            alternate_screen: false,
            cursor_hidden: false,
            events: RefCell::new(VecDeque::new()),
        }
    }

    /// Queue events; one is returned per poll.
    #[must_use]
    pub fn with_events(self, events: Vec<Event>) -> Self {
        self.events.borrow_mut().extend(events);
        self
    }

    /// Queue one more event.
    pub fn push_event(&self, event: Event) {
        self.events.borrow_mut().push_back(event);
    }

    /// Change the reported size.
    pub fn set_size(&mut self, width: u16, height: u16) {
        self.size = (width, height);
    }

    pub fn is_raw_mode(&self) -> bool {
        self.raw_mode
    }

    pub fn is_alternate_screen(&self) -> bool {
        self.alternate_screen
    }

    pub fn is_cursor_hidden(&self) -> bool {
        self.cursor_hidden
    }

    /// Everything written so far.
    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn into_writer(self) -> W {
        self.writer
    }
}

impl<W: Write> TerminalBackend for TestableBackend<W> {
    fn enable_raw_mode(&mut self) -> Result<(), TerminalError> {
        self.raw_mode = true;
        Ok(())
    }

    fn disable_raw_mode(&mut self) -> Result<(), TerminalError> {
        self.raw_mode = false;
        Ok(())
    }

    fn enter_alternate_screen(&mut self) -> Result<(), TerminalError> {
        self.alternate_screen = true;
        execute!(self.writer, EnterAlternateScreen)?;
        Ok(())
    }

    fn leave_alternate_screen(&mut self) -> Result<(), TerminalError> {
        self.alternate_screen = false;
        let _ = execute!(self.writer, LeaveAlternateScreen);
        Ok(())
    }

    fn hide_cursor(&mut self) -> Result<(), TerminalError> {
        self.cursor_hidden = true;
        execute!(self.writer, cursor::Hide)?;
        Ok(())
    }

    fn show_cursor(&mut self) -> Result<(), TerminalError> {
        self.cursor_hidden = false;
        let _ = execute!(self.writer, cursor::Show);
        Ok(())
    }

    fn size(&self) -> Result<(u16, u16), TerminalError> {
        Ok(self.size)
    }

    fn poll_event(&self, _timeout: Duration) -> Result<Option<Event>, TerminalError> {
        Ok(self.events.borrow_mut().pop_front())
    }

    fn write_flush(
        &mut self,
        buffer: &mut CellBuffer,
        renderer: &mut DiffRenderer,
    ) -> Result<(), TerminalError> {
        renderer.flush(buffer, &mut self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}

/// [`Terminal`] on top of a [`TerminalBackend`].
pub struct GenericTerminal<B: TerminalBackend> {
    backend: B,
}

impl<B: TerminalBackend> GenericTerminal<B> {
    pub const fn new(backend: B) -> Self {
        Self { backend }
    }

    pub const fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

impl<B: TerminalBackend> Terminal for GenericTerminal<B> {
    fn enter(&mut self) -> Result<(), TerminalError> {
        self.backend.enable_raw_mode()?;
        self.backend.enter_alternate_screen()?;
        self.backend.hide_cursor()?;
        Ok(())
    }

    fn leave(&mut self) -> Result<(), TerminalError> {
        self.backend.show_cursor()?;
        self.backend.leave_alternate_screen()?;
        self.backend.disable_raw_mode()?;
        Ok(())
    }

    fn size(&self) -> Result<(u16, u16), TerminalError> {
        self.backend.size()
    }

    fn poll_event(&self, timeout: Duration) -> Result<Option<Event>, TerminalError> {
        self.backend.poll_event(timeout)
    }

    fn flush(
        &mut self,
        buffer: &mut CellBuffer,
        renderer: &mut DiffRenderer,
    ) -> Result<(), TerminalError> {
        self.backend.write_flush(buffer, renderer)
    }
}

/// Stdout terminal.
pub type CrosstermTerminal = GenericTerminal<CrosstermBackend>;

/// Scripted terminal for tests and headless runs.
pub type ScriptedTerminal<W> = GenericTerminal<TestableBackend<W>>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorMode;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    fn scripted() -> ScriptedTerminal<Vec<u8>> {
        GenericTerminal::new(TestableBackend::new(Vec::new(), 20, 5))
    }

    #[test]
    fn test_enter_leave_sequence() {
        let mut terminal = scripted();
        terminal.enter().expect("enter");
        assert!(terminal.backend().is_raw_mode());
        assert!(terminal.backend().is_alternate_screen());
        assert!(terminal.backend().is_cursor_hidden());

        terminal.leave().expect("leave");
        assert!(!terminal.backend().is_raw_mode());
        assert!(!terminal.backend().is_alternate_screen());
        assert!(!terminal.backend().is_cursor_hidden());
        assert!(!terminal.backend().writer().is_empty());
    }

    #[test]
    fn test_scripted_events_in_order() {
        let q = Event::Key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE));
        let tab = Event::Key(KeyEvent::new(KeyCode::Tab, KeyModifiers::NONE));
        let terminal = GenericTerminal::new(
            TestableBackend::new(Vec::new(), 10, 2).with_events(vec![tab.clone(), q.clone()]),
        );
        let wait = Duration::ZERO;
        assert_eq!(terminal.poll_event(wait).expect("poll"), Some(tab));
        assert_eq!(terminal.poll_event(wait).expect("poll"), Some(q));
        assert_eq!(terminal.poll_event(wait).expect("poll"), None);
    }

    #[test]
    fn test_flush_writes_cells() {
        let mut terminal = scripted();
        let mut buffer = CellBuffer::new(20, 5);
        let mut renderer = DiffRenderer::new(ColorMode::Mono);
        terminal.flush(&mut buffer, &mut renderer).expect("flush");
        assert_eq!(renderer.stats().cells_written, 100);
        assert_eq!(terminal.size().expect("size"), (20, 5));
    }
}
