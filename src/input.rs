//! Key and mouse bindings: arrows or vim keys for the cursor, left click for tiles.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

/// Action from a key press or mouse event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CursorUp,
    CursorDown,
    CursorLeft,
    CursorRight,
    /// Press the tile under the keyboard cursor.
    PressCursor,
    /// Pointer pressed at a screen coordinate (column, row).
    PressAt(u16, u16),
    Shuffle,
    Restart,
    Quit,
    None,
}

/// Map key event to game action. Supports both arrows and vim-style hjkl.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
        return Action::Quit;
    }
    if !(modifiers.is_empty() || modifiers == KeyModifiers::SHIFT) {
        return Action::None;
    }
    match code {
        KeyCode::Char('q' | 'Q') | KeyCode::Esc => Action::Quit,
        KeyCode::Up | KeyCode::Char('k') => Action::CursorUp,
        KeyCode::Down | KeyCode::Char('j') => Action::CursorDown,
        KeyCode::Left | KeyCode::Char('h') => Action::CursorLeft,
        KeyCode::Right | KeyCode::Char('l') => Action::CursorRight,
        KeyCode::Enter | KeyCode::Char(' ') => Action::PressCursor,
        KeyCode::Char('s' | 'S') => Action::Shuffle,
        KeyCode::Char('r' | 'R') => Action::Restart,
        _ => Action::None,
    }
}

/// Only a left-button press counts; drags, releases and other buttons do nothing.
pub fn mouse_to_action(mouse: MouseEvent) -> Action {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => Action::PressAt(mouse.column, mouse.row),
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    fn mouse(kind: MouseEventKind) -> MouseEvent {
        MouseEvent {
            kind,
            column: 12,
            row: 7,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn test_arrows_and_vim_keys_move_cursor() {
        assert_eq!(key_to_action(key(KeyCode::Up, KeyModifiers::NONE)), Action::CursorUp);
        assert_eq!(key_to_action(key(KeyCode::Char('j'), KeyModifiers::NONE)), Action::CursorDown);
        assert_eq!(key_to_action(key(KeyCode::Char('h'), KeyModifiers::NONE)), Action::CursorLeft);
        assert_eq!(key_to_action(key(KeyCode::Right, KeyModifiers::NONE)), Action::CursorRight);
    }

    #[test]
    fn test_commands() {
        assert_eq!(key_to_action(key(KeyCode::Enter, KeyModifiers::NONE)), Action::PressCursor);
        assert_eq!(key_to_action(key(KeyCode::Char('S'), KeyModifiers::SHIFT)), Action::Shuffle);
        assert_eq!(key_to_action(key(KeyCode::Char('r'), KeyModifiers::NONE)), Action::Restart);
        assert_eq!(key_to_action(key(KeyCode::Esc, KeyModifiers::NONE)), Action::Quit);
        assert_eq!(key_to_action(key(KeyCode::Char('c'), KeyModifiers::CONTROL)), Action::Quit);
        assert_eq!(key_to_action(key(KeyCode::Char('s'), KeyModifiers::ALT)), Action::None);
    }

    #[test]
    fn test_only_left_press_counts() {
        assert_eq!(
            mouse_to_action(mouse(MouseEventKind::Down(MouseButton::Left))),
            Action::PressAt(12, 7)
        );
        assert_eq!(mouse_to_action(mouse(MouseEventKind::Up(MouseButton::Left))), Action::None);
        assert_eq!(mouse_to_action(mouse(MouseEventKind::Down(MouseButton::Right))), Action::None);
        assert_eq!(mouse_to_action(mouse(MouseEventKind::Moved)), Action::None);
    }
}
