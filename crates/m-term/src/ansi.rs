// SPDX-License-Identifier: MIT
//
// ANSI escape sequence generation.
//
// Stateless writers for the handful of terminal commands the editor
// issues: cursor placement and visibility, screen clearing, the
// alternate screen, reverse video for the tab bar, and cursor shape.
//
// Positions are 0-indexed here and 1-indexed on the wire.

use std::io::{self, Write};

// ─── Cursor ──────────────────────────────────────────────────────────────────

/// Move the cursor to `(x, y)` with CUP.
#[inline]
pub fn cursor_to(w: &mut impl Write, x: u16, y: u16) -> io::Result<()> {
    write!(w, "\x1b[{};{}H", u32::from(y) + 1, u32::from(x) + 1)
}

#[inline]
pub fn cursor_hide(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25l")
}

#[inline]
pub fn cursor_show(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25h")
}

// ─── Screen ──────────────────────────────────────────────────────────────────

/// Clear the entire screen (ED 2). The cursor does not move.
#[inline]
pub fn clear_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[2J")
}

/// Reset all SGR attributes (SGR 0).
#[inline]
pub fn reset(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[0m")
}

/// Swap foreground and background (SGR 7) until the next [`reset`].
#[inline]
pub fn reverse_video(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[7m")
}

// ─── Alternate Screen ───────────────────────────────────────────────────────

/// Enter the alternate screen buffer (DEC Private Mode 1049). The shell's
/// screen contents come back on [`exit_alt_screen`].
#[inline]
pub fn enter_alt_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1049h")
}

#[inline]
pub fn exit_alt_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1049l")
}

// ─── Cursor Shape ───────────────────────────────────────────────────────────

/// Terminal cursor shape (DECSCUSR).
///
/// Normal mode shows a block, Insert mode a bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorShape {
    /// Whatever the user's terminal is configured with.
    #[default]
    Default,
    /// Steady block.
    Block,
    /// Steady underline.
    Underline,
    /// Steady bar (I-beam).
    Bar,
}

impl CursorShape {
    /// DECSCUSR parameter.
    #[must_use]
    pub const fn decscusr(self) -> u8 {
        match self {
            Self::Default => 0,
            Self::Block => 2,
            Self::Underline => 4,
            Self::Bar => 6,
        }
    }
}

#[inline]
pub fn set_cursor_shape(w: &mut impl Write, shape: CursorShape) -> io::Result<()> {
    write!(w, "\x1b[{} q", shape.decscusr())
}

// ─── Tests ───────────────────────────────────────────────────────────────────
