//! Keyboard bindings configuration.

use crate::model::key_action::KeyAction;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

/// Maps keyboard events to domain actions.
///
/// Provides default vim-style bindings.
#[derive(Debug, Clone)]
pub struct KeyBindings {
    bindings: HashMap<KeyEvent, KeyAction>,
}

impl KeyBindings {
    /// Look up the action for a key event.
    ///
    /// Only code and modifiers take part in the lookup; event kind and lock
    /// state reported by the terminal are ignored.
    pub fn get(&self, key: KeyEvent) -> Option<KeyAction> {
        self.bindings
            .get(&KeyEvent::new(key.code, key.modifiers))
            .copied()
    }

    /// Bind `code` with exactly `modifiers` to `action`, replacing any earlier binding.
    pub fn bind(&mut self, code: KeyCode, modifiers: KeyModifiers, action: KeyAction) {
        self.bindings.insert(KeyEvent::new(code, modifiers), action);
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        let mut bindings = Self {
            bindings: HashMap::new(),
        };
        let none = KeyModifiers::NONE;
        let ctrl = KeyModifiers::CONTROL;
        let shift = KeyModifiers::SHIFT;

        // Cursor movement
        bindings.bind(KeyCode::Char('j'), none, KeyAction::CursorDown);
        bindings.bind(KeyCode::Char('k'), none, KeyAction::CursorUp);
        bindings.bind(KeyCode::Down, none, KeyAction::CursorDown);
        bindings.bind(KeyCode::Up, none, KeyAction::CursorUp);
        bindings.bind(KeyCode::Char('d'), ctrl, KeyAction::PageDown);
        bindings.bind(KeyCode::Char('u'), ctrl, KeyAction::PageUp);
        bindings.bind(KeyCode::PageDown, none, KeyAction::PageDown);
        bindings.bind(KeyCode::PageUp, none, KeyAction::PageUp);
        bindings.bind(KeyCode::Char('g'), none, KeyAction::Top);
        bindings.bind(KeyCode::Home, none, KeyAction::Top);
        bindings.bind(KeyCode::Char('G'), shift, KeyAction::Bottom);
        bindings.bind(KeyCode::End, none, KeyAction::Bottom);

        // Sections
        bindings.bind(KeyCode::Enter, none, KeyAction::ToggleSection);
        bindings.bind(KeyCode::Char(' '), none, KeyAction::ToggleSection);
        bindings.bind(KeyCode::Char('r'), none, KeyAction::RetrySection);

        // Search
        bindings.bind(KeyCode::Char('/'), none, KeyAction::StartSearch);
        bindings.bind(KeyCode::Char('f'), ctrl, KeyAction::StartSearch);
        bindings.bind(KeyCode::Char('n'), none, KeyAction::NextMatch);
        bindings.bind(KeyCode::Char('N'), shift, KeyAction::PrevMatch);
        bindings.bind(KeyCode::Esc, none, KeyAction::ClearSearch);

        // Application controls
        bindings.bind(KeyCode::Char('q'), none, KeyAction::Quit);
        bindings.bind(KeyCode::Char('c'), KeyModifiers::CONTROL, KeyAction::Quit);

        bindings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventKind, KeyEventState};

    #[test]
    fn default_bindings_map_vim_movement() {
        let bindings = KeyBindings::default();
        assert_eq!(
            bindings.get(KeyEvent::new(KeyCode::Char('j'), KeyModifiers::NONE)),
            Some(KeyAction::CursorDown)
        );
        assert_eq!(
            bindings.get(KeyEvent::new(KeyCode::Char('k'), KeyModifiers::NONE)),
            Some(KeyAction::CursorUp)
        );
    }

    #[test]
    fn uppercase_n_maps_to_prev_match() {
        let bindings = KeyBindings::default();
        let key_event = KeyEvent::new(KeyCode::Char('N'), KeyModifiers::SHIFT);

        assert_eq!(
            bindings.get(key_event),
            Some(KeyAction::PrevMatch),
            "Shift+N should jump to the previous match"
        );
    }

    #[test]
    fn enter_and_space_toggle_sections() {
        let bindings = KeyBindings::default();
        assert_eq!(
            bindings.get(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)),
            Some(KeyAction::ToggleSection)
        );
        assert_eq!(
            bindings.get(KeyEvent::new(KeyCode::Char(' '), KeyModifiers::NONE)),
            Some(KeyAction::ToggleSection)
        );
    }

    #[test]
    fn lookup_ignores_event_kind_and_state() {
        let bindings = KeyBindings::default();
        let key_event = KeyEvent::new_with_kind_and_state(
            KeyCode::Char('q'),
            KeyModifiers::NONE,
            KeyEventKind::Press,
            KeyEventState::NUM_LOCK,
        );

        assert_eq!(bindings.get(key_event), Some(KeyAction::Quit));
    }

    #[test]
    fn unbound_key_has_no_action() {
        let bindings = KeyBindings::default();
        assert_eq!(
            bindings.get(KeyEvent::new(KeyCode::Char('z'), KeyModifiers::NONE)),
            None
        );
    }

    #[test]
    fn bind_overrides_default() {
        let mut bindings = KeyBindings::default();
        let none = KeyModifiers::NONE;
        bindings.bind(KeyCode::Char('x'), none, KeyAction::Quit);
        bindings.bind(KeyCode::Char('q'), none, KeyAction::ClearSearch);

        assert_eq!(
            bindings.get(KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE)),
            Some(KeyAction::Quit)
        );
        assert_eq!(
            bindings.get(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE)),
            Some(KeyAction::ClearSearch)
        );
    }
}
