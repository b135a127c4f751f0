//! Panels and tabs — how buffers are laid out on screen.
//!
//! A [`Panel`] is a viewport onto one buffer with its own cursor, scroll
//! offset and pinned visual column. A [`Tab`] arranges one or more panels
//! with a split tree: each leaf is a panel, each internal node divides its
//! area in two.
//!
//! ```text
//! Vertical
//! ├── Leaf(0)           ← left panel
//! └── Horizontal
//!     ├── Leaf(1)       ← top-right panel
//!     └── Leaf(2)       ← bottom-right panel
//! ```
//!
//! Vertical splits reserve one column for a `│` separator. Horizontal
//! splits need none.
//!
//! Panels refer to buffers by [`BufferId`], an index into the editor's
//! buffer list; they never own text.

use crate::buffer::Buffer;
use crate::columns;
use crate::position::Position;

/// Index into the editor's buffer list.
pub type BufferId = usize;

/// Unique panel identifier within a tab. Never reused.
pub type PanelId = usize;

/// A rectangle on screen.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Rect {
    #[must_use]
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Which way a split divides its area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Side by side, separated by a `│` column.
    Vertical,
    /// One above the other.
    Horizontal,
}

// ---------------------------------------------------------------------------
// Split tree
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum Split {
    Leaf(PanelId),
    Node {
        axis: Axis,
        first: Box<Self>,
        second: Box<Self>,
    },
}

impl Split {
    fn leaves(&self) -> Vec<PanelId> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves(&self, out: &mut Vec<PanelId>) {
        match self {
            Self::Leaf(id) => out.push(*id),
            Self::Node { first, second, .. } => {
                first.collect_leaves(out);
                second.collect_leaves(out);
            }
        }
    }

    /// Whether `area` leaves at least one cell for each half, plus the
    /// separator column of a vertical split.
    const fn can_divide(axis: Axis, area: Rect) -> bool {
        match axis {
            Axis::Horizontal => area.height >= 2,
            Axis::Vertical => area.width >= 3,
        }
    }

    /// Divide `area` between the two halves of a node. The second half is
    /// `None` when the area is too small to show both sides.
    fn divide(axis: Axis, area: Rect) -> (Rect, Option<Rect>) {
        if !Self::can_divide(axis, area) {
            return (area, None);
        }
        match axis {
            Axis::Horizontal => {
                let top = area.height / 2;
                (
                    Rect { height: top, ..area },
                    Some(Rect {
                        y: area.y + top,
                        height: area.height - top,
                        ..area
                    }),
                )
            }
            Axis::Vertical => {
                let left = area.width / 2;
                (
                    Rect { width: left, ..area },
                    Some(Rect {
                        x: area.x + left + 1,
                        width: area.width - left - 1,
                        ..area
                    }),
                )
            }
        }
    }

    /// Screen rectangle for every visible leaf.
    fn layout(&self, area: Rect, out: &mut Vec<(PanelId, Rect)>) {
        match self {
            Self::Leaf(id) => out.push((*id, area)),
            Self::Node {
                axis,
                first,
                second,
            } => {
                let (a, b) = Self::divide(*axis, area);
                first.layout(a, out);
                if let Some(b) = b {
                    second.layout(b, out);
                }
            }
        }
    }

    /// `(x, y, height)` of each vertical separator.
    fn separators(&self, area: Rect, out: &mut Vec<(u16, u16, u16)>) {
        if let Self::Node {
            axis,
            first,
            second,
        } = self
        {
            let (a, b) = Self::divide(*axis, area);
            if *axis == Axis::Vertical && b.is_some() {
                out.push((area.x + a.width, area.y, area.height));
            }
            first.separators(a, out);
            if let Some(b) = b {
                second.separators(b, out);
            }
        }
    }

    /// Replace leaf `target` with a node holding it and `new_id`.
    fn split(&mut self, target: PanelId, new_id: PanelId, axis: Axis) -> bool {
        match self {
            Self::Leaf(id) if *id == target => {
                *self = Self::Node {
                    axis,
                    first: Box::new(Self::Leaf(target)),
                    second: Box::new(Self::Leaf(new_id)),
                };
                true
            }
            Self::Leaf(_) => false,
            Self::Node { first, second, .. } => {
                first.split(target, new_id, axis) || second.split(target, new_id, axis)
            }
        }
    }

    /// Remove leaf `target`, promoting its sibling. A lone leaf is never
    /// removed.
    fn remove(&mut self, target: PanelId) -> bool {
        match self {
            Self::Leaf(_) => false,
            Self::Node { first, second, .. } => {
                if matches!(first.as_ref(), Self::Leaf(id) if *id == target) {
                    *self = *second.clone();
                    return true;
                }
                if matches!(second.as_ref(), Self::Leaf(id) if *id == target) {
                    *self = *first.clone();
                    return true;
                }
                first.remove(target) || second.remove(target)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Panel
// ---------------------------------------------------------------------------

/// A viewport bound to one buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Panel {
    pub id: PanelId,
    pub buffer: BufferId,
    pub area: Rect,
    /// Logical cursor: `col` is a char offset.
    pub cursor: Position,
    /// Visual column vertical moves try to return to.
    pub pinned_col: usize,
    /// First buffer line shown.
    pub top_line: usize,
}

impl Panel {
    #[must_use]
    pub const fn new(id: PanelId, buffer: BufferId, area: Rect) -> Self {
        Self {
            id,
            buffer,
            area,
            cursor: Position::ZERO,
            pinned_col: 0,
            top_line: 0,
        }
    }

    /// Last column the cursor may occupy on a line of `len` chars.
    ///
    /// With `past_end` the cursor may sit after the last char; otherwise
    /// it must sit on one, and an empty line only has column 0.
    #[inline]
    #[must_use]
    pub const fn last_col(len: usize, past_end: bool) -> usize {
        if past_end { len } else { len.saturating_sub(1) }
    }

    /// True if `col` is at (or beyond) the last column of a `len`-char line.
    #[inline]
    #[must_use]
    pub const fn at_line_end(col: usize, len: usize, past_end: bool) -> bool {
        if past_end { col >= len } else { col + 1 >= len }
    }

    /// Number of text rows.
    #[inline]
    #[must_use]
    pub fn height(&self) -> usize {
        usize::from(self.area.height)
    }

    /// True if the cursor is on the first visible row.
    #[must_use]
    pub const fn on_top_row(&self) -> bool {
        self.cursor.line == self.top_line
    }

    /// True if the cursor is on the last visible row.
    #[must_use]
    pub fn on_bottom_row(&self) -> bool {
        self.area.height > 0 && self.cursor.line + 1 == self.top_line + self.height()
    }

    /// The cursor's visual column.
    #[must_use]
    pub fn visual_cursor(&self, buffer: &Buffer, tabstop: usize) -> usize {
        columns::visual_col(buffer.line(self.cursor.line), self.cursor.col, tabstop)
    }

    /// Pin the current visual column.
    pub fn sync_pin(&mut self, buffer: &Buffer, tabstop: usize) {
        self.pinned_col = self.visual_cursor(buffer, tabstop);
    }

    /// Pull the cursor back inside the buffer and the line.
    pub fn clamp_cursor(&mut self, buffer: &Buffer, past_end: bool) {
        let line = self.cursor.line.min(buffer.line_count() - 1);
        let col = self
            .cursor
            .col
            .min(Self::last_col(buffer.line_len(line), past_end));
        self.cursor = Position::new(line, col);
    }

    /// Scroll the minimum needed to keep the cursor line visible.
    pub fn scroll_to_cursor(&mut self) {
        let line = self.cursor.line;
        if line < self.top_line {
            self.top_line = line;
        } else if self.area.height > 0 && line >= self.top_line + self.height() {
            self.top_line = line + 1 - self.height();
        }
    }
}

// ---------------------------------------------------------------------------
// Tab
// ---------------------------------------------------------------------------

/// A set of panels sharing the screen, one of them active.
///
/// `panels` is kept in split-tree order (left to right, top to bottom),
/// which is also the order panel focus cycles in.
#[derive(Debug, Clone)]
pub struct Tab {
    panels: Vec<Panel>,
    active: usize,
    tree: Split,
    area: Rect,
    next_id: PanelId,
}

impl Tab {
    /// A tab with one panel showing `buffer`.
    #[must_use]
    pub fn new(buffer: BufferId, area: Rect) -> Self {
        Self {
            panels: vec![Panel::new(0, buffer, area)],
            active: 0,
            tree: Split::Leaf(0),
            area,
            next_id: 1,
        }
    }

    #[must_use]
    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    pub fn panels_mut(&mut self) -> impl Iterator<Item = &mut Panel> {
        self.panels.iter_mut()
    }

    /// Index of the active panel in [`panels`](Self::panels).
    #[must_use]
    pub const fn active_index(&self) -> usize {
        self.active
    }

    #[must_use]
    pub fn active_panel(&self) -> &Panel {
        &self.panels[self.active]
    }

    pub fn active_panel_mut(&mut self) -> &mut Panel {
        &mut self.panels[self.active]
    }

    #[must_use]
    pub const fn area(&self) -> Rect {
        self.area
    }

    /// `(x, y, height)` of each `│` separator between side-by-side panels.
    #[must_use]
    pub fn separators(&self) -> Vec<(u16, u16, u16)> {
        let mut out = Vec::new();
        self.tree.separators(self.area, &mut out);
        out
    }

    /// Split the active panel. The new panel shows the same buffer at the
    /// same position and becomes active.
    ///
    /// Returns `None`, leaving the layout alone, when the active panel is
    /// too small for both halves to get a row (or a column) of text.
    pub fn split(&mut self, axis: Axis) -> Option<PanelId> {
        let current = self.active_panel();
        if !Split::can_divide(axis, current.area) {
            log::debug!("panel {} too small to split {axis:?}", current.id);
            return None;
        }

        let id = self.next_id;
        let target = current.id;
        let panel = Panel { id, ..current.clone() };
        self.next_id += 1;
        self.tree.split(target, id, axis);
        self.panels.push(panel);
        self.relayout(id);

        log::debug!("split panel {target} {axis:?} into {id}");
        Some(id)
    }

    /// Close the active panel. Refuses (returns `false`) when it is the
    /// only one.
    pub fn close_active(&mut self) -> bool {
        if self.panels.len() == 1 {
            return false;
        }
        let closing = self.active_panel().id;
        self.tree.remove(closing);
        self.panels.remove(self.active);

        let index = self.active.min(self.panels.len() - 1);
        let focus = self.panels[index].id;
        self.relayout(focus);

        log::debug!("closed panel {closing}");
        true
    }

    pub fn next_panel(&mut self) {
        self.cycle(1);
    }

    pub fn prev_panel(&mut self) {
        self.cycle(self.panels.len() - 1);
    }

    /// Step focus by `step` (mod panel count), skipping hidden panels.
    fn cycle(&mut self, step: usize) {
        let count = self.panels.len();
        let mut index = self.active;
        for _ in 0..count {
            index = (index + step) % count;
            if !self.panels[index].area.is_empty() {
                self.active = index;
                return;
            }
        }
    }

    /// Lay the panels out over a new area.
    pub fn resize(&mut self, area: Rect) {
        self.area = area;
        let focus = self.active_panel().id;
        self.relayout(focus);
    }

    /// Recompute panel areas, restore tree order and focus `focus`.
    fn relayout(&mut self, focus: PanelId) {
        let order = self.tree.leaves();
        self.panels
            .sort_by_key(|p| order.iter().position(|&id| id == p.id));

        let mut rects = Vec::new();
        self.tree.layout(self.area, &mut rects);
        for panel in &mut self.panels {
            panel.area = rects
                .iter()
                .find_map(|&(id, rect)| (id == panel.id).then_some(rect))
                .unwrap_or_default();
            panel.scroll_to_cursor();
        }

        self.active = self
            .panels
            .iter()
            .position(|p| p.id == focus)
            .unwrap_or(0);
        if self.panels[self.active].area.is_empty() {
            if let Some(visible) = self.panels.iter().position(|p| !p.area.is_empty()) {
                self.active = visible;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
