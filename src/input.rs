//! Keyboard input from the terminal, mapped onto [`GameInput`].

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;

use crate::game::GameInput;

/// Puts the terminal in raw mode for as long as it lives.
pub struct Keyboard {
    _private: (),
}

impl Keyboard {
    pub fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Keyboard { _private: () })
    }

    /// Drains pending key events without blocking. A key counts as held this frame if
    /// it was pressed or repeated since the last poll.
    pub fn poll(&mut self) -> io::Result<GameInput> {
        let mut input = GameInput::default();
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                apply_key(&mut input, key);
            }
        }
        Ok(input)
    }
}

impl Drop for Keyboard {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            log::warn!("failed to restore terminal: {}", e);
        }
    }
}

fn apply_key(input: &mut GameInput, key: KeyEvent) {
    if key.kind == KeyEventKind::Release {
        return;
    }
    match key.code {
        KeyCode::Up => input.up = true,
        KeyCode::Down => input.down = true,
        KeyCode::Esc | KeyCode::Char('q') => input.quit = true,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => input.quit = true,
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};

    use super::apply_key;
    use crate::game::GameInput;

    fn key(code: KeyCode, modifiers: KeyModifiers, kind: KeyEventKind) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            kind,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn test_arrows_map_to_up_and_down() {
        let mut input = GameInput::default();
        apply_key(&mut input, key(KeyCode::Up, KeyModifiers::NONE, KeyEventKind::Press));
        apply_key(&mut input, key(KeyCode::Down, KeyModifiers::NONE, KeyEventKind::Repeat));
        assert!(input.up && input.down && !input.quit);
    }

    #[test]
    /// Test that releases do not count as held keys.
    fn test_release_is_ignored() {
        let mut input = GameInput::default();
        apply_key(&mut input, key(KeyCode::Up, KeyModifiers::NONE, KeyEventKind::Release));
        assert_eq!(input, GameInput::default());
    }

    #[test]
    fn test_quit_keys() {
        for (code, modifiers) in [
            (KeyCode::Esc, KeyModifiers::NONE),
            (KeyCode::Char('q'), KeyModifiers::NONE),
            (KeyCode::Char('c'), KeyModifiers::CONTROL),
        ] {
            let mut input = GameInput::default();
            apply_key(&mut input, key(code, modifiers, KeyEventKind::Press));
            assert!(input.quit, "{:?} should quit", code);
        }

        let mut input = GameInput::default();
        apply_key(&mut input, key(KeyCode::Char('c'), KeyModifiers::NONE, KeyEventKind::Press));
        assert!(!input.quit);
    }
}
