//! Modal editing state.
//!
//! The editor is always in exactly one [`Mode`]:
//!
//! | Mode   | Cursor shape | Cursor limit  | Keys                      |
//! |--------|--------------|---------------|---------------------------|
//! | Normal | Block        | `0..=len-1`   | Commands via the keymap   |
//! | Insert | Bar          | `0..=len`     | Text entry and navigation |
//!
//! Key dispatch lives in [`editor`](crate::editor); this is the data type.

use std::fmt;

use m_term::ansi::CursorShape;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Keys are commands, not text.
    #[default]
    Normal,
    /// Keys produce characters in the buffer.
    Insert,
}

impl Mode {
    /// Name shown on the status line.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Insert => "INSERT",
        }
    }

    #[must_use]
    pub const fn cursor_shape(self) -> CursorShape {
        match self {
            Self::Normal => CursorShape::Block,
            Self::Insert => CursorShape::Bar,
        }
    }

    /// True if the cursor may rest one past the last char.
    #[inline]
    #[must_use]
    pub const fn past_end(self) -> bool {
        matches!(self, Self::Insert)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
