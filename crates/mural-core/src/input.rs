//! Input event types fed to the tool engine by the host shell.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    /// The platform-level "command" modifier (meta on macOS, ctrl
    /// elsewhere) without caring which one the host mapped.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// A pointer event with positions in both coordinate spaces.
///
/// The host converts through the viewport before dispatch so tools can
/// work in document coordinates while overlays keep screen-space data.
#[derive(Debug, Clone, Copy)]
pub struct MouseEvent {
    /// Position in screen pixels.
    pub screen: Point,
    /// Position in document coordinates.
    pub canvas: Point,
    pub button: MouseButton,
    pub modifiers: Modifiers,
}

/// Named (non-text) keys the editor reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NamedKey {
    Escape,
    Enter,
    Backspace,
    Delete,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
}

/// A key press: either a named key or typed text.
#[derive(Debug, Clone)]
pub enum Key {
    Named(NamedKey),
    Character(String),
}

/// A keyboard event with its modifier state.
#[derive(Debug, Clone)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn named(key: NamedKey) -> Self {
        Self {
            key: Key::Named(key),
            modifiers: Modifiers::default(),
        }
    }

    pub fn character(text: &str) -> Self {
        Self {
            key: Key::Character(text.to_string()),
            modifiers: Modifiers::default(),
        }
    }

    /// The single lowercase character of this event, if it is one. Used
    /// for shortcut matching.
    pub fn single_char(&self) -> Option<char> {
        match &self.key {
            Key::Character(text) => {
                let mut chars = text.chars();
                let c = chars.next()?;
                if chars.next().is_some() {
                    return None;
                }
                Some(c.to_ascii_lowercase())
            }
            Key::Named(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_modifier() {
        let mut mods = Modifiers::default();
        assert!(!mods.command());
        mods.ctrl = true;
        assert!(mods.command());
        mods.ctrl = false;
        mods.meta = true;
        assert!(mods.command());
    }

    #[test]
    fn test_single_char() {
        assert_eq!(KeyEvent::character("R").single_char(), Some('r'));
        assert_eq!(KeyEvent::character("ab").single_char(), None);
        assert_eq!(KeyEvent::named(NamedKey::Escape).single_char(), None);
    }
}
