//! Keyboard and focus input types.
//!
//! Platform-agnostic key representation. Host code converts native key events
//! into [`KeyCombo`]s; the selection engine maps the ones it cares about onto
//! [`EmbedKeyAction`]s while a block embed is selected.

use smol_str::SmolStr;

/// Key values for keyboard input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// A character key.
    Character(SmolStr),

    /// Unknown/unidentified key.
    Unidentified,

    // === Whitespace / editing ===
    Backspace,
    Delete,
    Enter,
    Tab,
    Escape,
    Space,

    // === Navigation ===
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,
    PageUp,
    PageDown,

    // === Modifiers ===
    Alt,
    Control,
    Meta,
    Shift,
}

impl Key {
    /// Create a character key.
    pub fn character(s: impl Into<SmolStr>) -> Self {
        Self::Character(s.into())
    }

    /// Check if this is a navigation key.
    pub fn is_navigation(&self) -> bool {
        matches!(
            self,
            Self::ArrowLeft
                | Self::ArrowRight
                | Self::ArrowUp
                | Self::ArrowDown
                | Self::Home
                | Self::End
                | Self::PageUp
                | Self::PageDown
        )
    }

    /// Check if this is a modifier key.
    pub fn is_modifier(&self) -> bool {
        matches!(self, Self::Alt | Self::Control | Self::Meta | Self::Shift)
    }
}

/// Modifier key state for a key combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
    };

    pub const CTRL: Self = Self {
        ctrl: true,
        alt: false,
        shift: false,
        meta: false,
    };

    pub const SHIFT: Self = Self {
        ctrl: false,
        alt: false,
        shift: true,
        meta: false,
    };

    pub const META: Self = Self {
        ctrl: false,
        alt: false,
        shift: false,
        meta: true,
    };

    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }
}

/// A key combination as delivered by a keydown.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyCombo {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    pub fn shift(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::SHIFT,
        }
    }
}

/// Result of handling a keydown event.
#[derive(Debug, Clone, PartialEq)]
pub enum KeydownResult {
    /// Event was handled, prevent default.
    Handled,
    /// Event was not a keybinding, let platform handle it.
    NotHandled,
}

/// What a key does while a block embed holds the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedKeyAction {
    /// Delete the embed, then land on whatever precedes it.
    DeleteBackward,
    /// Delete the embed, then land on whatever now sits at its index.
    DeleteForward,
    /// Open a fresh line below the embed.
    InsertLineBelow,
    MovePrevious,
    MoveNext,
    Deselect,
}

impl EmbedKeyAction {
    /// Map a key combination to an embed action.
    ///
    /// Modified combos are left alone so the host's own shortcuts (copy,
    /// undo, ...) still work on a selected embed.
    pub fn from_combo(combo: &KeyCombo) -> Option<Self> {
        if combo.modifiers.ctrl || combo.modifiers.meta || combo.modifiers.alt {
            return None;
        }
        match combo.key {
            Key::Backspace => Some(Self::DeleteBackward),
            Key::Delete => Some(Self::DeleteForward),
            Key::Enter if !combo.modifiers.shift => Some(Self::InsertLineBelow),
            Key::ArrowUp | Key::ArrowLeft => Some(Self::MovePrevious),
            Key::ArrowDown | Key::ArrowRight => Some(Self::MoveNext),
            Key::Escape => Some(Self::Deselect),
            _ => None,
        }
    }
}

/// Where keyboard focus went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FocusTarget {
    /// Focus landed on an editor surface.
    Editor,
    /// Focus fell back to the document body. `keep_focus` is set when the
    /// element the user interacted with carries the keep-focus marker.
    Body { keep_focus: bool },
    /// Some other focusable element (an input, a button).
    Other,
}
