//! Editor state and key dispatch.
//!
//! [`EditorState`] owns every buffer and tab and interprets decoded keys
//! according to the current [`Mode`]. [`Editor`] pairs that state with a
//! [`Terminal`] and implements the event loop's [`App`] trait, so the same
//! code runs against a real tty or a [`MockTerminal`] in tests.
//!
//! [`MockTerminal`]: m_term::terminal::MockTerminal

use m_term::ansi::CursorShape;
use m_term::event_loop::{self, App};
use m_term::input::{KeyCode, KeyEvent};
use m_term::terminal::{Size, Terminal};

use crate::buffer::{splice, Buffer, Splice};
use crate::layout::{Axis, BufferId, Panel, Rect, Tab};
use crate::mode::Mode;
use crate::motion::{self, Direction};
use crate::position::Position;
use crate::render;
use crate::settings::{Action, Settings};

// ---------------------------------------------------------------------------
// Chrome
// ---------------------------------------------------------------------------

/// Rows and columns reserved around the text area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chrome {
    /// Rows above the text (the tab bar).
    pub top: u16,
    /// Rows below the text (the status line).
    pub bottom: u16,
    /// Columns left of the text.
    pub left: u16,
}

impl Default for Chrome {
    fn default() -> Self {
        Self {
            top: 1,
            bottom: 1,
            left: 0,
        }
    }
}

impl Chrome {
    /// The part of a `size` terminal left for panels.
    #[must_use]
    pub const fn text_area(&self, size: Size) -> Rect {
        Rect {
            x: self.left,
            y: self.top,
            width: size.cols.saturating_sub(self.left),
            height: size.rows.saturating_sub(self.top.saturating_add(self.bottom)),
        }
    }
}

// ---------------------------------------------------------------------------
// EditorState
// ---------------------------------------------------------------------------

/// Everything the editor knows: buffers, tabs, mode and screen geometry.
#[derive(Debug)]
pub struct EditorState {
    settings: Settings,
    buffers: Vec<Buffer>,
    tabs: Vec<Tab>,
    active_tab: usize,
    mode: Mode,
    chrome: Chrome,
    size: Size,
    should_exit: bool,
    needs_redraw: bool,
}

impl EditorState {
    /// Open each buffer in its own tab, the first one active. With no
    /// buffers, starts on one untitled empty buffer.
    #[must_use]
    pub fn new(settings: Settings, size: Size, buffers: Vec<Buffer>) -> Self {
        let buffers = if buffers.is_empty() {
            vec![Buffer::new()]
        } else {
            buffers
        };
        let chrome = Chrome::default();
        let area = chrome.text_area(size);
        let tabs = (0..buffers.len()).map(|id| Tab::new(id, area)).collect();

        Self {
            settings,
            buffers,
            tabs,
            active_tab: 0,
            mode: Mode::Normal,
            chrome,
            size,
            should_exit: false,
            needs_redraw: true,
        }
    }

    // -- Queries ------------------------------------------------------------

    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub fn buffers(&self) -> &[Buffer] {
        &self.buffers
    }

    #[must_use]
    pub fn buffer(&self, id: BufferId) -> &Buffer {
        &self.buffers[id]
    }

    #[must_use]
    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    #[must_use]
    pub const fn active_tab_index(&self) -> usize {
        self.active_tab
    }

    #[must_use]
    pub fn active_tab(&self) -> &Tab {
        &self.tabs[self.active_tab]
    }

    #[must_use]
    pub fn active_panel(&self) -> &Panel {
        self.active_tab().active_panel()
    }

    #[must_use]
    pub fn active_buffer(&self) -> &Buffer {
        &self.buffers[self.active_panel().buffer]
    }

    /// Cursor of the active panel.
    #[must_use]
    pub fn cursor(&self) -> Position {
        self.active_panel().cursor
    }

    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub const fn chrome(&self) -> Chrome {
        self.chrome
    }

    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    #[must_use]
    pub const fn should_exit(&self) -> bool {
        self.should_exit
    }

    #[must_use]
    pub const fn needs_redraw(&self) -> bool {
        self.needs_redraw
    }

    pub fn mark_drawn(&mut self) {
        self.needs_redraw = false;
    }

    // -- Tabs ---------------------------------------------------------------

    /// Open `buffer` in a new tab and focus it.
    pub fn open_tab(&mut self, buffer: Buffer) -> usize {
        let id = self.buffers.len();
        log::debug!("opening {} in tab {}", buffer.display_name(true), self.tabs.len());
        self.buffers.push(buffer);
        self.tabs.push(Tab::new(id, self.chrome.text_area(self.size)));
        self.active_tab = self.tabs.len() - 1;
        self.needs_redraw = true;
        self.active_tab
    }

    pub fn next_tab(&mut self) {
        self.active_tab = (self.active_tab + 1) % self.tabs.len();
        self.needs_redraw = true;
    }

    pub fn prev_tab(&mut self) {
        self.active_tab = (self.active_tab + self.tabs.len() - 1) % self.tabs.len();
        self.needs_redraw = true;
    }

    /// Close the active tab. Closing the last one asks the editor to exit.
    pub fn close_tab(&mut self) {
        if self.tabs.len() == 1 {
            log::debug!("closing last tab, exiting");
            self.should_exit = true;
            return;
        }
        self.tabs.remove(self.active_tab);
        self.active_tab = self.active_tab.min(self.tabs.len() - 1);
        self.needs_redraw = true;
        log::debug!("closed tab, {} left", self.tabs.len());
    }

    // -- Geometry -----------------------------------------------------------

    /// The terminal changed size.
    pub fn resize(&mut self, size: Size) {
        self.size = size;
        self.relayout();
        self.needs_redraw = true;
    }

    fn relayout(&mut self) {
        let area = self.chrome.text_area(self.size);
        for tab in &mut self.tabs {
            tab.resize(area);
        }
    }

    // -- Key dispatch -------------------------------------------------------

    /// Interpret one decoded key in the current mode.
    pub fn handle_key(&mut self, key: KeyEvent) {
        let changed = match self.mode {
            Mode::Normal => self.normal_key(key),
            Mode::Insert => self.insert_key(key),
        };
        if changed {
            self.needs_redraw = true;
        }
    }

    fn normal_key(&mut self, key: KeyEvent) -> bool {
        if let Some(moved) = self.navigate(key) {
            return moved;
        }
        let Some(action) = self.settings.keymap.action_for(key) else {
            log::trace!("ignoring unbound key {key:?}");
            return false;
        };
        log::trace!("action {action:?}");
        self.run_action(action)
    }

    fn run_action(&mut self, action: Action) -> bool {
        match action {
            Action::CursorUp => self.step(Direction::Up),
            Action::CursorDown => self.step(Direction::Down),
            Action::CursorLeft => self.step(Direction::Left),
            Action::CursorRight => self.step(Direction::Right),
            Action::Close => {
                self.close_tab();
                true
            }
            Action::InsertBefore => self.enter_insert(),
            Action::InsertAfter => {
                let (panel, buffer, settings) = self.focus();
                let len = buffer.line_len(panel.cursor.line);
                panel.cursor.col = (panel.cursor.col + 1).min(len);
                panel.sync_pin(buffer, settings.tabstop);
                self.enter_insert()
            }
            Action::InsertLineStart => {
                let (panel, buffer, settings) = self.focus();
                motion::line_start(panel, buffer, settings);
                self.enter_insert()
            }
            Action::InsertLineEnd => {
                self.enter_insert();
                let (panel, buffer, settings) = self.focus();
                motion::line_end(panel, buffer, settings, true);
                true
            }
            Action::OpenBelow => self.open_line(1),
            Action::OpenAbove => self.open_line(0),
            Action::NextTab => {
                self.next_tab();
                true
            }
            Action::PrevTab => {
                self.prev_tab();
                true
            }
            Action::NextPanel => {
                self.tabs[self.active_tab].next_panel();
                true
            }
            Action::SplitVertical => self.tabs[self.active_tab].split(Axis::Vertical).is_some(),
            Action::SplitHorizontal => self.tabs[self.active_tab].split(Axis::Horizontal).is_some(),
            Action::ClosePanel => self.tabs[self.active_tab].close_active(),
        }
    }

    fn insert_key(&mut self, key: KeyEvent) -> bool {
        if let Some(moved) = self.navigate(key) {
            return moved;
        }
        match key.code {
            KeyCode::Escape => self.leave_insert(),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Enter => self.newline(),
            _ => match key.text() {
                Some(ch) => self.insert_char(ch),
                None => {
                    log::trace!("ignoring key {key:?} in insert mode");
                    false
                }
            },
        }
    }

    /// Arrow and paging keys. `None` if `key` is not one of them.
    fn navigate(&mut self, key: KeyEvent) -> Option<bool> {
        let direction = match key.code {
            KeyCode::Up => Direction::Up,
            KeyCode::Down => Direction::Down,
            KeyCode::Left => Direction::Left,
            KeyCode::Right => Direction::Right,
            KeyCode::Home | KeyCode::End | KeyCode::PageUp | KeyCode::PageDown => {
                let past_end = self.mode.past_end();
                let (panel, buffer, settings) = self.focus();
                return Some(match key.code {
                    KeyCode::Home => motion::line_start(panel, buffer, settings),
                    KeyCode::End => motion::line_end(panel, buffer, settings, past_end),
                    KeyCode::PageUp => motion::page_up(panel, buffer, settings, past_end),
                    _ => motion::page_down(panel, buffer, settings, past_end),
                });
            }
            _ => return None,
        };
        Some(self.step(direction))
    }

    // -- Mode transitions ---------------------------------------------------

    fn enter_insert(&mut self) -> bool {
        log::debug!("mode: {} -> {}", self.mode, Mode::Insert);
        self.mode = Mode::Insert;
        true
    }

    fn leave_insert(&mut self) -> bool {
        log::debug!("mode: {} -> {}", self.mode, Mode::Normal);
        self.mode = Mode::Normal;
        let (panel, buffer, settings) = self.focus();
        panel.clamp_cursor(buffer, false);
        panel.sync_pin(buffer, settings.tabstop);
        true
    }

    // -- Motions and edits --------------------------------------------------

    /// The active panel with the buffer it shows.
    fn focus(&mut self) -> (&mut Panel, &Buffer, &Settings) {
        let panel = self.tabs[self.active_tab].active_panel_mut();
        let buffer = &self.buffers[panel.buffer];
        (panel, buffer, &self.settings)
    }

    fn step(&mut self, direction: Direction) -> bool {
        let past_end = self.mode.past_end();
        let (panel, buffer, settings) = self.focus();
        motion::move_cursor(panel, buffer, settings, direction, past_end)
    }

    /// Run `f` on the active panel and its buffer, then move every other
    /// panel on that buffer so it keeps showing the same text.
    fn edit<F>(&mut self, f: F) -> bool
    where
        F: FnOnce(&mut Panel, &mut Buffer, &Settings) -> Change,
    {
        let panel = self.tabs[self.active_tab].active_panel_mut();
        let id = panel.buffer;
        let change = f(panel, &mut self.buffers[id], &self.settings);
        panel.scroll_to_cursor();
        if change == Change::None {
            return false;
        }
        self.refresh_panels(id, change);
        true
    }

    fn refresh_panels(&mut self, id: BufferId, change: Change) {
        let buffer = &self.buffers[id];
        for (t, tab) in self.tabs.iter_mut().enumerate() {
            let active = (t == self.active_tab).then_some(tab.active_index());
            for (i, panel) in tab.panels_mut().enumerate() {
                if panel.buffer == id && active != Some(i) {
                    change.follow(panel);
                    panel.clamp_cursor(buffer, false);
                    panel.scroll_to_cursor();
                }
            }
        }
    }

    fn open_line(&mut self, offset: usize) -> bool {
        self.edit(|panel, buffer, _| {
            let at = panel.cursor.line + offset;
            buffer.insert_line(at, "");
            panel.cursor = Position::new(at, 0);
            panel.pinned_col = 0;
            log::debug!("opened line {at}");
            Change::Opened(at)
        });
        self.enter_insert()
    }

    fn insert_char(&mut self, ch: char) -> bool {
        self.edit(|panel, buffer, settings| {
            let Position { line, col } = panel.cursor;
            let text = splice(buffer.line(line), col, Splice::Insert(ch));
            buffer.update_line(line, text);
            panel.cursor.col = col + 1;
            panel.sync_pin(buffer, settings.tabstop);
            log::trace!("inserted {ch:?} at {line}:{col}");
            Change::Text
        })
    }

    fn backspace(&mut self) -> bool {
        self.edit(|panel, buffer, settings| {
            let Position { line, col } = panel.cursor;
            let change = if col > 0 {
                let text = splice(buffer.line(line), col - 1, Splice::DeleteAt);
                buffer.update_line(line, text);
                panel.cursor.col = col - 1;
                Change::Text
            } else if line > 0 {
                let joint = buffer.join_with_next(line - 1);
                panel.cursor = Position::new(line - 1, joint);
                log::debug!("joined line {line} onto {}", line - 1);
                Change::Joined { line, joint }
            } else {
                return Change::None;
            };
            panel.sync_pin(buffer, settings.tabstop);
            change
        })
    }

    fn delete(&mut self) -> bool {
        self.edit(|panel, buffer, _| {
            let Position { line, col } = panel.cursor;
            if col < buffer.line_len(line) {
                let text = splice(buffer.line(line), col, Splice::DeleteAt);
                buffer.update_line(line, text);
                Change::Text
            } else if line + 1 < buffer.line_count() {
                let joint = buffer.join_with_next(line);
                log::debug!("joined line {} onto {line}", line + 1);
                Change::Joined {
                    line: line + 1,
                    joint,
                }
            } else {
                Change::None
            }
        })
    }

    fn newline(&mut self) -> bool {
        self.edit(|panel, buffer, _| {
            let Position { line, col } = panel.cursor;
            buffer.split_line(line, col);
            panel.cursor = Position::new(line + 1, 0);
            panel.pinned_col = 0;
            log::debug!("split line {line} at {col}");
            Change::Split { line, col }
        })
    }
}

/// What an edit did to a buffer's lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Change {
    None,
    /// Chars changed within one line.
    Text,
    /// An empty line was inserted at this index.
    Opened(usize),
    /// `line` was cut at `col`; the tail became line `line + 1`.
    Split { line: usize, col: usize },
    /// `line` was appended to the line above, starting at column `joint`.
    Joined { line: usize, joint: usize },
}

impl Change {
    /// Move another panel's cursor and scroll offset so they stay on the
    /// text they were on.
    fn follow(self, panel: &mut Panel) {
        let Position { line: cur, col } = panel.cursor;
        match self {
            Self::None | Self::Text => {}
            Self::Opened(at) => {
                if cur >= at {
                    panel.cursor.line += 1;
                }
                if panel.top_line > at {
                    panel.top_line += 1;
                }
            }
            Self::Split { line, col: at } => {
                if cur > line {
                    panel.cursor.line += 1;
                } else if cur == line && col >= at {
                    panel.cursor = Position::new(line + 1, col - at);
                }
                if panel.top_line > line {
                    panel.top_line += 1;
                }
            }
            Self::Joined { line, joint } => {
                if cur > line {
                    panel.cursor.line -= 1;
                } else if cur == line {
                    panel.cursor = Position::new(line - 1, joint + col);
                }
                if panel.top_line >= line {
                    panel.top_line -= 1;
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Editor
// ---------------------------------------------------------------------------

/// Editor state bound to a terminal.
pub struct Editor<T: Terminal> {
    state: EditorState,
    term: T,
}

impl<T: Terminal> Editor<T> {
    /// Pair `state` with `term` and set the cursor shape for the starting
    /// mode.
    pub fn new(state: EditorState, term: T) -> Self {
        let mut editor = Self { state, term };
        editor.apply_cursor_shape();
        editor
    }

    #[must_use]
    pub const fn state(&self) -> &EditorState {
        &self.state
    }

    #[must_use]
    pub const fn terminal(&self) -> &T {
        &self.term
    }

    fn apply_cursor_shape(&mut self) {
        let result = match self.state.mode().cursor_shape() {
            CursorShape::Bar => self.term.use_bar_cursor(),
            _ => self.term.use_block_cursor(),
        };
        if let Err(e) = result {
            log::warn!("failed to set cursor shape: {e}");
        }
    }
}

impl<T: Terminal> App for Editor<T> {
    fn on_key(&mut self, key: KeyEvent) -> event_loop::Action {
        let before = self.state.mode();
        self.state.handle_key(key);
        if self.state.mode() != before {
            self.apply_cursor_shape();
        }
        if self.state.should_exit() {
            event_loop::Action::Quit
        } else {
            event_loop::Action::Continue
        }
    }

    fn on_resize(&mut self, size: Size) {
        self.state.resize(size);
    }

    fn needs_redraw(&self) -> bool {
        self.state.needs_redraw()
    }

    fn redraw(&mut self) {
        if let Err(e) = render::draw(&mut self.term, &self.state) {
            log::warn!("redraw failed: {e}");
        }
        self.state.mark_drawn();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use m_term::input::{KeyDecoder, Modifiers};
    use m_term::source::ReplaySource;
    use m_term::terminal::MockTerminal;
    use pretty_assertions::assert_eq;

    const ESC: &str = "\x1b";

    fn state(text: &str) -> EditorState {
        EditorState::new(
            Settings::default(),
            Size::new(80, 24),
            vec![Buffer::from_text(text).with_path("test")],
        )
    }

    /// Feed `keys` through the decoder and event loop.
    fn drive_state(state: EditorState, keys: &str) -> Editor<MockTerminal> {
        let size = state.size();
        let mut editor = Editor::new(state, MockTerminal::new(size.cols, size.rows));
        let mut decoder = KeyDecoder::new(ReplaySource::from(keys));
        event_loop::run(&mut editor, &mut decoder).unwrap();
        editor
    }

    fn drive(text: &str, keys: &str) -> Editor<MockTerminal> {
        drive_state(state(text), keys)
    }

    /// Cursor as (col, line).
    fn xy(editor: &Editor<MockTerminal>) -> (usize, usize) {
        let c = editor.state().cursor();
        (c.col, c.line)
    }

    fn text(editor: &Editor<MockTerminal>) -> Vec<String> {
        editor.state().active_buffer().lines().to_vec()
    }

    // -- Scenarios ----------------------------------------------------------

    #[test]
    fn down_from_origin() {
        let ed = drive("package main\n\nimport \"fmt\"\n\nfunc main() {}\n", "j");
        assert_eq!(xy(&ed), (0, 1));
    }

    #[test]
    fn right_wraps_at_line_end() {
        assert_eq!(xy(&drive("ab\ncd", "ll")), (0, 1));
    }

    #[test]
    fn left_wraps_to_previous_line() {
        assert_eq!(xy(&drive("ab\ncd", "jh")), (1, 0));
    }

    #[test]
    fn pinned_column_survives_short_line() {
        assert_eq!(xy(&drive("aaa\nbb\ncccc", "lljj")), (2, 2));
    }

    #[test]
    fn insert_before_cursor() {
        let ed = drive("b", &format!("ia{ESC}"));
        assert_eq!(text(&ed), vec!["ab"]);
        assert_eq!(ed.state().mode(), Mode::Normal);
    }

    #[test]
    fn backspace_at_line_start_joins() {
        let ed = drive("abc\ndef", &format!("ji\x7f{ESC}"));
        assert_eq!(text(&ed), vec!["abcdef"]);
        assert_eq!(xy(&ed), (3, 0));
    }

    // -- Normal-mode motions ------------------------------------------------

    #[test]
    fn motion_sequences() {
        assert_eq!(xy(&drive("a\nb", "hk")), (0, 0));
        assert_eq!(xy(&drive("a\nb", "lll")), (0, 1));
        assert_eq!(xy(&drive("a\nb", "lllj")), (0, 1));
        assert_eq!(xy(&drive("ab\nc", "lj")), (0, 1));
        assert_eq!(xy(&drive("a\nbc", "jlk")), (0, 0));
        assert_eq!(xy(&drive("aaa\nbb\ncccc", "jjllkk")), (2, 0));
    }

    #[test]
    fn arrow_keys_move_in_normal_mode() {
        assert_eq!(xy(&drive("ab\ncd", "\x1b[B\x1b[C")), (1, 1));
        assert_eq!(xy(&drive("abc", "\x1b[F")), (2, 0));
        assert_eq!(xy(&drive("abc", "ll\x1b[H")), (0, 0));
    }

    #[test]
    fn unbound_keys_are_ignored() {
        let ed = drive("abc", "zxy!");
        assert_eq!(text(&ed), vec!["abc"]);
        assert_eq!(xy(&ed), (0, 0));
    }

    #[test]
    fn escape_then_key_in_normal_mode() {
        // A lone ESC before a command is a key of its own, then `l` runs.
        assert_eq!(xy(&drive("abc", "\x1bl")), (1, 0));
    }

    // -- Insert mode --------------------------------------------------------

    #[test]
    fn typing_advances_cursor() {
        let ed = drive("", "ihello");
        assert_eq!(text(&ed), vec!["hello"]);
        assert_eq!(xy(&ed), (5, 0));
        assert_eq!(ed.state().mode(), Mode::Insert);
    }

    #[test]
    fn escape_clamps_onto_last_char() {
        let ed = drive("", &format!("iab{ESC}"));
        assert_eq!(xy(&ed), (1, 0));
    }

    #[test]
    fn tab_inserts_tab_char() {
        let ed = drive("x", "i\t");
        assert_eq!(text(&ed), vec!["\tx"]);
        assert_eq!(ed.state().active_panel().pinned_col, 4);
    }

    #[test]
    fn backspace_deletes_left() {
        let ed = drive("abc", "A\x7f");
        assert_eq!(text(&ed), vec!["ab"]);
        assert_eq!(xy(&ed), (2, 0));
    }

    #[test]
    fn backspace_at_document_start_is_noop() {
        let ed = drive("abc", "i\x7f");
        assert_eq!(text(&ed), vec!["abc"]);
        assert_eq!(xy(&ed), (0, 0));
    }

    #[test]
    fn enter_splits_line() {
        let ed = drive("abcd", "lli\r");
        assert_eq!(text(&ed), vec!["ab", "cd"]);
        assert_eq!(xy(&ed), (0, 1));
    }

    #[test]
    fn enter_at_bottom_row_scrolls() {
        let st = EditorState::new(
            Settings::default(),
            Size::new(20, 5),
            vec![Buffer::from_text("a\nb\nc")],
        );
        let ed = drive_state(st, "jjA\r");
        let panel = ed.state().active_panel();
        assert_eq!(panel.cursor, Position::new(3, 0));
        assert_eq!(panel.top_line, 1);
    }

    #[test]
    fn delete_removes_under_cursor() {
        let ed = drive("abc", "i\x1b[3~");
        assert_eq!(text(&ed), vec!["bc"]);
    }

    #[test]
    fn delete_at_line_end_joins_next() {
        let ed = drive("ab\ncd", "A\x1b[3~");
        assert_eq!(text(&ed), vec!["abcd"]);
        assert_eq!(xy(&ed), (2, 0));
    }

    #[test]
    fn delete_at_document_end_is_noop() {
        let ed = drive("ab", "A\x1b[3~");
        assert_eq!(text(&ed), vec!["ab"]);
    }

    #[test]
    fn arrows_in_insert_mode_reach_line_end() {
        let ed = drive("ab\nc", "i\x1b[C\x1b[C\x1b[C");
        assert_eq!(xy(&ed), (0, 1));
        let ed = drive("ab\nc", "i\x1b[C\x1b[C");
        assert_eq!(xy(&ed), (2, 0));
    }

    #[test]
    fn ctrl_keys_do_not_insert() {
        let ed = drive("ab", "i\x01\x02");
        assert_eq!(text(&ed), vec!["ab"]);
    }

    #[test]
    fn multibyte_text() {
        let ed = drive("", "iñé");
        assert_eq!(text(&ed), vec!["ñé"]);
        assert_eq!(xy(&ed), (2, 0));
    }

    // -- Entering insert ----------------------------------------------------

    #[test]
    fn insert_after() {
        let ed = drive("ac", &format!("ab{ESC}"));
        assert_eq!(text(&ed), vec!["abc"]);
    }

    #[test]
    fn insert_after_on_empty_line() {
        let ed = drive("", "ax");
        assert_eq!(text(&ed), vec!["x"]);
    }

    #[test]
    fn insert_line_start_and_end() {
        let ed = drive("bc", &format!("llIa{ESC}Ad"));
        assert_eq!(text(&ed), vec!["abcd"]);
        assert_eq!(xy(&ed), (4, 0));
    }

    #[test]
    fn open_below_and_above() {
        let ed = drive("a\nc", &format!("ob{ESC}Oz"));
        assert_eq!(text(&ed), vec!["a", "z", "b", "c"]);
        assert_eq!(xy(&ed), (1, 1));
    }

    // -- Mode side effects --------------------------------------------------

    #[test]
    fn cursor_shape_follows_mode() {
        let ed = drive("abc", "");
        assert_eq!(ed.terminal().shape(), CursorShape::Block);
        let ed = drive("abc", "i");
        assert_eq!(ed.terminal().shape(), CursorShape::Bar);
        let ed = drive("abc", &format!("i{ESC}"));
        assert_eq!(ed.terminal().shape(), CursorShape::Block);
    }

    #[test]
    fn ignored_keys_do_not_redraw() {
        let ed = drive("abc", "zzz");
        assert_eq!(ed.terminal().flushes(), 1);
        let ed = drive("abc", "l");
        assert_eq!(ed.terminal().flushes(), 2);
    }

    // -- Tabs ---------------------------------------------------------------

    fn two_tabs() -> EditorState {
        EditorState::new(
            Settings::default(),
            Size::new(80, 24),
            vec![
                Buffer::from_text("first").with_path("one.txt"),
                Buffer::from_text("second").with_path("two.txt"),
            ],
        )
    }

    #[test]
    fn close_exits_on_last_tab() {
        let ed = drive("abc", "qj");
        assert!(ed.state().should_exit());
    }

    #[test]
    fn close_removes_tab_first() {
        let ed = drive_state(two_tabs(), "q");
        assert!(!ed.state().should_exit());
        assert_eq!(ed.state().tabs().len(), 1);
        assert_eq!(ed.state().active_buffer().line(0), "second");
    }

    #[test]
    fn tab_cycles_tabs() {
        let ed = drive_state(two_tabs(), "\t");
        assert_eq!(ed.state().active_tab_index(), 1);
        let ed = drive_state(two_tabs(), "\t\t");
        assert_eq!(ed.state().active_tab_index(), 0);
        let ed = drive_state(two_tabs(), "\x1b[Z");
        assert_eq!(ed.state().active_tab_index(), 1);
    }

    #[test]
    fn open_tab_focuses_it() {
        let mut st = state("a");
        let index = st.open_tab(Buffer::from_text("b"));
        assert_eq!(index, 1);
        assert_eq!(st.active_tab_index(), 1);
        assert_eq!(st.active_buffer().line(0), "b");
    }

    #[test]
    fn empty_start_is_untitled() {
        let st = EditorState::new(Settings::default(), Size::new(80, 24), Vec::new());
        assert_eq!(st.buffers().len(), 1);
        assert!(st.active_buffer().path().is_none());
    }

    // -- Panels -------------------------------------------------------------

    #[test]
    fn split_and_cycle_panels() {
        let ed = drive("abc", "\x1bOR\x17");
        let tab = ed.state().active_tab();
        assert_eq!(tab.panels().len(), 2);
        assert_eq!(tab.active_index(), 0);
    }

    #[test]
    fn close_panel_keeps_one() {
        let ed = drive("abc", "\x1b[15~\x1b[15~\x1b[15~");
        assert_eq!(ed.state().active_tab().panels().len(), 1);
    }

    #[test]
    fn vertical_split_then_close() {
        let ed = drive("abc", "\x1bOR\x1b[15~");
        let tab = ed.state().active_tab();
        assert_eq!(tab.panels().len(), 1);
        assert_eq!(tab.active_panel().area, Rect::new(0, 1, 80, 22));
    }

    #[test]
    fn panels_move_independently() {
        let ed = drive("abc\ndef", "\x1bOSj");
        let tab = ed.state().active_tab();
        assert_eq!(tab.panels()[0].cursor, Position::ZERO);
        assert_eq!(tab.panels()[1].cursor, Position::new(1, 0));
    }

    #[test]
    fn edits_clamp_other_panels() {
        // Split, move the first panel to the end of line 1, then delete
        // line 1's text from the second panel.
        let keys = format!("\x1bOS\x17jll\x17jA\x7f\x7f\x7f\x7f{ESC}");
        let ed = drive("x\nabc", &keys);
        assert_eq!(text(&ed), vec!["x"]);
        let tab = ed.state().active_tab();
        assert_eq!(tab.panels()[0].cursor, Position::new(0, 0));
    }

    #[test]
    fn open_above_shifts_other_panels() {
        let keys = format!("\x1bOS\x17jj\x17Oz{ESC}");
        let ed = drive("a\nb\nc", &keys);
        assert_eq!(text(&ed), vec!["z", "a", "b", "c"]);
        let tab = ed.state().active_tab();
        assert_eq!(tab.panels()[0].cursor, Position::new(3, 0));
    }

    #[test]
    fn enter_carries_other_cursor_to_new_line() {
        let keys = format!("\x1bOS\x17ll\x17li\r{ESC}");
        let ed = drive("abcd", &keys);
        assert_eq!(text(&ed), vec!["a", "bcd"]);
        let tab = ed.state().active_tab();
        assert_eq!(tab.panels()[0].cursor, Position::new(1, 1));
    }

    #[test]
    fn join_moves_other_cursors_up() {
        // The first panel sits on `d`, the second on `f`; joining line 1
        // onto line 0 from a third panel keeps both on their chars.
        let keys = format!("\x1bOS\x1bOS\x17jl\x17jjl\x17A\x1b[3~{ESC}");
        let ed = drive("ab\ncd\nef", &keys);
        assert_eq!(text(&ed), vec!["abcd", "ef"]);
        let tab = ed.state().active_tab();
        assert_eq!(tab.panels()[0].cursor, Position::new(0, 3));
        assert_eq!(tab.panels()[1].cursor, Position::new(1, 1));
    }

    #[test]
    fn escape_then_arrow_leaves_insert_and_moves() {
        let ed = drive("ab\ncd", "jix\x1b\x1b[A");
        assert_eq!(ed.state().mode(), Mode::Normal);
        assert_eq!(ed.state().cursor().line, 0);
        assert_eq!(text(&ed), vec!["ab", "xcd"]);
    }

    // -- Geometry -----------------------------------------------------------

    #[test]
    fn chrome_text_area() {
        let area = Chrome::default().text_area(Size::new(80, 24));
        assert_eq!(area, Rect::new(0, 1, 80, 22));
        let chrome = Chrome { top: 1, bottom: 1, left: 5 };
        assert_eq!(chrome.text_area(Size::new(80, 24)), Rect::new(5, 1, 75, 22));
        assert_eq!(Chrome::default().text_area(Size::new(10, 1)).height, 0);
    }

    #[test]
    fn resize_relayouts_tabs() {
        let mut st = two_tabs();
        st.resize(Size::new(40, 10));
        for tab in st.tabs() {
            assert_eq!(tab.area(), Rect::new(0, 1, 40, 8));
        }
        assert!(st.needs_redraw());
    }

    #[test]
    fn resize_via_app_trait() {
        let mut ed = Editor::new(state("abc"), MockTerminal::new(80, 24));
        ed.on_resize(Size::new(30, 6));
        assert_eq!(ed.state().active_panel().area, Rect::new(0, 1, 30, 4));
    }

    #[test]
    fn on_key_reports_quit() {
        let mut ed = Editor::new(state("abc"), MockTerminal::new(80, 24));
        assert_eq!(
            ed.on_key(KeyEvent::plain(KeyCode::Char('l'))),
            event_loop::Action::Continue
        );
        assert_eq!(
            ed.on_key(KeyEvent::plain(KeyCode::Char('q'))),
            event_loop::Action::Quit
        );
    }

    #[test]
    fn custom_keymap() {
        let mut settings = Settings::default();
        settings
            .keymap
            .bind(Action::CursorDown, KeyEvent::new(KeyCode::Char('n'), Modifiers::ALT));
        let st = EditorState::new(settings, Size::new(80, 24), vec![Buffer::from_text("a\nb")]);
        let mut ed = drive_state(st, "\x1bn");
        // Alt is not decoded from ESC-prefixed keys, so this is Escape + `n`.
        assert_eq!(xy(&ed), (0, 0));
        ed.on_key(KeyEvent::new(KeyCode::Char('n'), Modifiers::ALT));
        assert_eq!(xy(&ed), (0, 1));
    }
}
