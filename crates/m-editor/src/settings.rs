//! Editor settings and the Normal-mode keymap.
//!
//! Settings are built in code; there is no configuration file. Every field
//! has a default that matches a stock install:
//!
//! | Setting               | Default | Meaning                                   |
//! |-----------------------|---------|-------------------------------------------|
//! | `tabstop`             | 4       | Cells a tab occupies (always >= 1)        |
//! | `tabchar`             | `' '`   | Glyph drawn in a tab's first cell         |
//! | `cursor_x_overflow`   | true    | Left/Right wrap across line boundaries    |
//! | `tab_names_full_path` | false   | Tab bar shows full paths, not file names  |

use m_term::input::{KeyCode, KeyEvent, Modifiers};

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// A Normal-mode command that a key can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    CursorUp,
    CursorDown,
    CursorLeft,
    CursorRight,
    /// Close the active tab; closing the last one exits.
    Close,
    /// Enter Insert mode before the cursor.
    InsertBefore,
    /// Enter Insert mode after the cursor.
    InsertAfter,
    /// Enter Insert mode at column 0.
    InsertLineStart,
    /// Enter Insert mode at the end of the line.
    InsertLineEnd,
    /// Open a new line below and enter Insert mode.
    OpenBelow,
    /// Open a new line above and enter Insert mode.
    OpenAbove,
    NextTab,
    PrevTab,
    NextPanel,
    SplitVertical,
    SplitHorizontal,
    ClosePanel,
}

// ---------------------------------------------------------------------------
// Keymap
// ---------------------------------------------------------------------------

/// Maps each [`Action`] to one key (code plus modifiers).
///
/// A key is bound to at most one action. The table is small, so lookups
/// scan it linearly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keymap {
    bindings: Vec<(Action, KeyEvent)>,
}

const fn key(ch: char) -> KeyEvent {
    KeyEvent::plain(KeyCode::Char(ch))
}

impl Default for Keymap {
    fn default() -> Self {
        Self {
            bindings: vec![
                (Action::CursorUp, key('k')),
                (Action::CursorDown, key('j')),
                (Action::CursorLeft, key('h')),
                (Action::CursorRight, key('l')),
                (Action::Close, key('q')),
                (Action::InsertBefore, key('i')),
                (Action::InsertAfter, key('a')),
                (Action::InsertLineStart, key('I')),
                (Action::InsertLineEnd, key('A')),
                (Action::OpenBelow, key('o')),
                (Action::OpenAbove, key('O')),
                (Action::NextTab, KeyEvent::plain(KeyCode::Tab)),
                (Action::PrevTab, KeyEvent::new(KeyCode::Tab, Modifiers::SHIFT)),
                (Action::NextPanel, KeyEvent::ctrl('w')),
                (Action::SplitVertical, KeyEvent::plain(KeyCode::F(3))),
                (Action::SplitHorizontal, KeyEvent::plain(KeyCode::F(4))),
                (Action::ClosePanel, KeyEvent::plain(KeyCode::F(5))),
            ],
        }
    }
}

impl Keymap {
    /// The action bound to `key`, if any.
    #[must_use]
    pub fn action_for(&self, key: KeyEvent) -> Option<Action> {
        self.bindings
            .iter()
            .find_map(|&(action, bound)| (bound == key).then_some(action))
    }

    /// The key bound to `action`, if any.
    #[must_use]
    pub fn key_for(&self, action: Action) -> Option<KeyEvent> {
        self.bindings
            .iter()
            .find_map(|&(bound, key)| (bound == action).then_some(key))
    }

    /// Bind `key` to `action`, replacing the action's previous key and
    /// taking `key` away from whatever held it before.
    pub fn bind(&mut self, action: Action, key: KeyEvent) {
        self.bindings.retain(|&(a, k)| a != action && k != key);
        self.bindings.push((action, key));
    }

    /// Remove the binding for `action`.
    pub fn unbind(&mut self, action: Action) {
        self.bindings.retain(|&(a, _)| a != action);
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub tabstop: usize,
    pub tabchar: char,
    pub cursor_x_overflow: bool,
    pub tab_names_full_path: bool,
    pub keymap: Keymap,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tabstop: 4,
            tabchar: ' ',
            cursor_x_overflow: true,
            tab_names_full_path: false,
            keymap: Keymap::default(),
        }
    }
}

impl Settings {
    /// Set the tab width. Zero is raised to 1.
    #[must_use]
    pub fn with_tabstop(mut self, tabstop: usize) -> Self {
        self.tabstop = tabstop.max(1);
        self
    }

    #[must_use]
    pub const fn with_tabchar(mut self, tabchar: char) -> Self {
        self.tabchar = tabchar;
        self
    }

    #[must_use]
    pub const fn with_cursor_x_overflow(mut self, enabled: bool) -> Self {
        self.cursor_x_overflow = enabled;
        self
    }

    #[must_use]
    pub const fn with_tab_names_full_path(mut self, enabled: bool) -> Self {
        self.tab_names_full_path = enabled;
        self
    }

    #[must_use]
    pub fn with_keymap(mut self, keymap: Keymap) -> Self {
        self.keymap = keymap;
        self
    }
}
