//! Keyboard input: crossterm key events to app commands.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use vitalis_core::CognitiveState;
use vitalis_widgets::bubble::BUTTON_KEYS;

/// What a key press asks the app to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Ask the server to force a state (keys 1-5)
    MockState(CognitiveState),
    /// Show or hide the dashboard
    ToggleDashboard,
    /// Dismiss the bubble, or hide the dashboard
    Escape,
    /// Press an intervention button
    PressButton(usize),
    /// Leave the app
    Quit,
}

/// Key binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBinding {
    /// Key code.
    pub code: KeyCode,
    /// Required modifiers.
    pub modifiers: KeyModifiers,
    /// Command produced.
    pub command: Command,
}

impl KeyBinding {
    /// Create a new key binding.
    #[must_use]
    pub const fn new(code: KeyCode, modifiers: KeyModifiers, command: Command) -> Self {
        Self {
            code,
            modifiers,
            command,
        }
    }

    /// Create a binding without modifiers.
    #[must_use]
    pub const fn simple(code: KeyCode, command: Command) -> Self {
        Self::new(code, KeyModifiers::NONE, command)
    }

    /// Check if this binding matches a key event.
    #[must_use]
    pub fn matches(&self, event: &KeyEvent) -> bool {
        event.code == self.code && event.modifiers.contains(self.modifiers)
    }
}

/// Resolves key events against a binding table.
#[derive(Debug, Clone)]
pub struct InputHandler {
    bindings: Vec<KeyBinding>,
}

impl Default for InputHandler {
    fn default() -> Self {
        let mut bindings = vec![
            KeyBinding::new(KeyCode::Char('c'), KeyModifiers::CONTROL, Command::Quit),
            KeyBinding::simple(KeyCode::Char('q'), Command::Quit),
            KeyBinding::simple(KeyCode::Tab, Command::ToggleDashboard),
            KeyBinding::simple(KeyCode::Esc, Command::Escape),
        ];
        for state in CognitiveState::ALL {
            let digit = char::from(b'0' + state.preset());
            bindings.push(KeyBinding::simple(
                KeyCode::Char(digit),
                Command::MockState(state),
            ));
        }
        for (index, key) in BUTTON_KEYS.iter().enumerate() {
            bindings.push(KeyBinding::simple(
                KeyCode::Char(*key),
                Command::PressButton(index),
            ));
        }
        Self { bindings }
    }
}

impl InputHandler {
    /// Handler with the default bindings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key binding. Earlier bindings win.
    pub fn add_binding(&mut self, binding: KeyBinding) {
        self.bindings.push(binding);
    }

    /// Command for a key event. Releases and repeats are ignored.
    #[must_use]
    pub fn command_for(&self, event: &KeyEvent) -> Option<Command> {
        if event.kind != KeyEventKind::Press {
            return None;
        }
        self.bindings
            .iter()
            .find(|binding| binding.matches(event))
            .map(|binding| binding.command)
    }
}
