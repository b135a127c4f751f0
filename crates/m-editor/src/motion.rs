//! Cursor motions over tab-expanded lines.
//!
//! Every motion works on one [`Panel`] and the [`Buffer`] it shows. The
//! `past_end` flag carries the mode's column limit: `false` keeps the
//! cursor on a char (Normal), `true` lets it rest after the last char
//! (Insert).
//!
//! Vertical moves aim for `max(current visual column, pinned column)` on the
//! target line so the cursor returns to where it was after passing a short
//! line. Horizontal moves re-pin. When the cursor leaves the visible rows
//! the panel scrolls by one line.

use crate::buffer::Buffer;
use crate::columns::{logical_col, visual_col};
use crate::layout::Panel;
use crate::position::Position;
use crate::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Move the cursor one step. Returns `true` if it moved.
pub fn move_cursor(
    panel: &mut Panel,
    buffer: &Buffer,
    settings: &Settings,
    direction: Direction,
    past_end: bool,
) -> bool {
    let moved = match direction {
        Direction::Up => up(panel, buffer, settings, past_end),
        Direction::Down => down(panel, buffer, settings, past_end),
        Direction::Left => left(panel, buffer, settings, past_end),
        Direction::Right => right(panel, buffer, settings, past_end),
    };
    if moved {
        log::trace!("{direction:?} -> {:?}", panel.cursor);
    }
    moved
}

/// Column on line `line` closest to the target visual column, within the
/// mode's limit.
fn column_for(panel: &Panel, buffer: &Buffer, settings: &Settings, line: usize, past_end: bool) -> usize {
    let ts = settings.tabstop;
    let here = visual_col(buffer.line(panel.cursor.line), panel.cursor.col, ts);
    let target = here.max(panel.pinned_col);
    logical_col(buffer.line(line), target, ts).min(Panel::last_col(buffer.line_len(line), past_end))
}

fn down(panel: &mut Panel, buffer: &Buffer, settings: &Settings, past_end: bool) -> bool {
    let next = panel.cursor.line + 1;
    if next >= buffer.line_count() {
        return false;
    }
    let col = column_for(panel, buffer, settings, next, past_end);
    let scroll = panel.on_bottom_row();
    panel.cursor = Position::new(next, col);
    if scroll {
        panel.top_line += 1;
    }
    true
}

fn up(panel: &mut Panel, buffer: &Buffer, settings: &Settings, past_end: bool) -> bool {
    let Some(prev) = panel.cursor.line.checked_sub(1) else {
        return false;
    };
    let col = column_for(panel, buffer, settings, prev, past_end);
    let scroll = panel.on_top_row();
    panel.cursor = Position::new(prev, col);
    if scroll {
        panel.top_line = panel.top_line.saturating_sub(1);
    }
    true
}

fn left(panel: &mut Panel, buffer: &Buffer, settings: &Settings, past_end: bool) -> bool {
    let Position { line, col } = panel.cursor;
    if col > 0 {
        panel.cursor.col = col - 1;
    } else if line > 0 && settings.cursor_x_overflow {
        let scroll = panel.on_top_row();
        let prev = line - 1;
        panel.cursor = Position::new(prev, Panel::last_col(buffer.line_len(prev), past_end));
        if scroll {
            panel.top_line = panel.top_line.saturating_sub(1);
        }
    } else {
        return false;
    }
    panel.sync_pin(buffer, settings.tabstop);
    true
}

fn right(panel: &mut Panel, buffer: &Buffer, settings: &Settings, past_end: bool) -> bool {
    let Position { line, col } = panel.cursor;
    if !Panel::at_line_end(col, buffer.line_len(line), past_end) {
        panel.cursor.col = col + 1;
    } else if line + 1 < buffer.line_count() && settings.cursor_x_overflow {
        let scroll = panel.on_bottom_row();
        panel.cursor = Position::new(line + 1, 0);
        if scroll {
            panel.top_line += 1;
        }
    } else {
        return false;
    }
    panel.sync_pin(buffer, settings.tabstop);
    true
}

// ---------------------------------------------------------------------------
// Line-level motions
// ---------------------------------------------------------------------------

/// Column 0.
pub fn line_start(panel: &mut Panel, buffer: &Buffer, settings: &Settings) -> bool {
    let moved = panel.cursor.col != 0;
    panel.cursor.col = 0;
    panel.sync_pin(buffer, settings.tabstop);
    moved
}

/// Last column the mode allows.
pub fn line_end(panel: &mut Panel, buffer: &Buffer, settings: &Settings, past_end: bool) -> bool {
    let last = Panel::last_col(buffer.line_len(panel.cursor.line), past_end);
    let moved = panel.cursor.col != last;
    panel.cursor.col = last;
    panel.sync_pin(buffer, settings.tabstop);
    moved
}

/// One panel height down.
pub fn page_down(panel: &mut Panel, buffer: &Buffer, settings: &Settings, past_end: bool) -> bool {
    repeat(panel, buffer, settings, Direction::Down, past_end)
}

/// One panel height up.
pub fn page_up(panel: &mut Panel, buffer: &Buffer, settings: &Settings, past_end: bool) -> bool {
    repeat(panel, buffer, settings, Direction::Up, past_end)
}

fn repeat(panel: &mut Panel, buffer: &Buffer, settings: &Settings, direction: Direction, past_end: bool) -> bool {
    let mut moved = false;
    for _ in 0..panel.height().max(1) {
        if !move_cursor(panel, buffer, settings, direction, past_end) {
            break;
        }
        moved = true;
    }
    moved
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
