//! Terminal-agnostic keyboard input.

/// Keyboard input abstraction.
///
/// Decouples application logic from terminal libraries (crossterm, termion,
/// etc.) enabling deterministic simulation testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    /// Printable character.
    Char(char),
    /// Enter/Return key.
    Enter,
    /// Escape key (quit).
    Esc,
    /// Tab key (cycle streams).
    Tab,
    /// Up arrow key.
    Up,
    /// Down arrow key.
    Down,
}
