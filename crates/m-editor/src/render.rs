//! Paint the editor state onto a [`Terminal`].
//!
//! The screen is redrawn in full on every pass:
//!
//! ```text
//!  main.rs notes.txt             ← tab bar (active name reversed)
//! fn main() {        │line one   ← panels, `│` between side-by-side ones
//! ~                  │~          ← rows past the end of the buffer
//!  NORMAL  main.rs          1:1  ← status line
//! ```
//!
//! Lines wider than their panel are cut off; there is no horizontal
//! scrolling.

use std::io;

use m_term::terminal::Terminal;

use crate::columns::expand_tabs;
use crate::editor::EditorState;
use crate::layout::Panel;

/// Draw the whole screen and place the cursor.
///
/// # Errors
///
/// Returns the first terminal write error.
pub fn draw<T: Terminal>(term: &mut T, state: &EditorState) -> io::Result<()> {
    term.clear_screen()?;

    if state.chrome().top > 0 {
        draw_tab_bar(term, state)?;
    }

    let tab = state.active_tab();
    for panel in tab.panels() {
        draw_panel(term, state, panel)?;
    }
    for (x, y, height) in tab.separators() {
        for row in 0..height {
            term.set_cursor_position(x, y + row)?;
            term.print("│")?;
        }
    }

    if state.chrome().bottom > 0 {
        draw_status(term, state)?;
    }

    let (x, y) = cursor_cell(state);
    term.set_cursor_position(x, y)?;
    term.flush()
}

/// First `width` chars of `text`.
fn fit(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}

fn draw_tab_bar<T: Terminal>(term: &mut T, state: &EditorState) -> io::Result<()> {
    let width = usize::from(state.size().cols);
    let full = state.settings().tab_names_full_path;

    term.set_cursor_position(0, 0)?;
    let mut used = 0;
    for (index, tab) in state.tabs().iter().enumerate() {
        if used >= width {
            break;
        }
        term.print(" ")?;
        used += 1;

        let buffer = state.buffer(tab.active_panel().buffer);
        let name = fit(&buffer.display_name(full), width.saturating_sub(used));
        used += name.chars().count();
        if index == state.active_tab_index() {
            term.print_reversed(&name)?;
        } else {
            term.print(&name)?;
        }
    }
    Ok(())
}

fn draw_panel<T: Terminal>(term: &mut T, state: &EditorState, panel: &Panel) -> io::Result<()> {
    if panel.area.is_empty() {
        return Ok(());
    }
    let buffer = state.buffer(panel.buffer);
    let settings = state.settings();
    let width = usize::from(panel.area.width);

    for row in 0..panel.area.height {
        let index = panel.top_line + usize::from(row);
        term.set_cursor_position(panel.area.x, panel.area.y + row)?;
        if index < buffer.line_count() {
            let shown = expand_tabs(buffer.line(index), settings.tabstop, settings.tabchar);
            term.print(&fit(&shown, width))?;
        } else {
            term.print("~")?;
        }
    }
    Ok(())
}

fn draw_status<T: Terminal>(term: &mut T, state: &EditorState) -> io::Result<()> {
    let size = state.size();
    let width = usize::from(size.cols);
    let buffer = state.active_buffer();

    let left = format!(
        " {}  {}{}",
        state.mode(),
        buffer.display_name(state.settings().tab_names_full_path),
        if buffer.is_modified() { " [+]" } else { "" }
    );
    let right = format!("{} ", state.cursor());
    let gap = width.saturating_sub(left.chars().count() + right.chars().count()).max(1);
    let line = format!("{left}{}{right}", " ".repeat(gap));

    term.set_cursor_position(0, size.rows.saturating_sub(1))?;
    term.print_reversed(&fit(&line, width))
}

/// Screen cell of the active panel's cursor, kept inside the panel.
fn cursor_cell(state: &EditorState) -> (u16, u16) {
    let panel = state.active_panel();
    let area = panel.area;
    let visual = panel.visual_cursor(state.active_buffer(), state.settings().tabstop);

    let max_x = usize::from(area.width.saturating_sub(1));
    let max_y = usize::from(area.height.saturating_sub(1));
    let dx = u16::try_from(visual.min(max_x)).unwrap_or(0);
    let dy = u16::try_from(panel.cursor.line.saturating_sub(panel.top_line).min(max_y)).unwrap_or(0);
    (area.x + dx, area.y + dy)
}
