//! Line buffer — the text of one open file.
//!
//! A `Buffer` is an ordered list of lines with no trailing newline stored on
//! any of them. It always holds at least one line: an empty document is a
//! single empty line.
//!
//! # Mutation contract
//!
//! Lines change only through [`insert_line`](Buffer::insert_line),
//! [`remove_line`](Buffer::remove_line) and
//! [`update_line`](Buffer::update_line). An out-of-range index is a caller
//! bug, and these methods panic with a descriptive message rather than
//! silently clamping. Editing within a line goes through [`splice`], which
//! builds the replacement text.
//!
//! Columns are char offsets everywhere. Byte offsets stay inside this module.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Splice
// ---------------------------------------------------------------------------

/// An edit at one char position within a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Splice {
    /// Insert the char before `position`.
    Insert(char),
    /// Remove the char at `position`.
    DeleteAt,
}

/// Apply `op` at char offset `position` and return the new line.
///
/// # Panics
///
/// Panics if `position` is past the end of the line for an insert, or not
/// on a char for a delete.
#[must_use]
pub fn splice(line: &str, position: usize, op: Splice) -> String {
    let len = line.chars().count();
    match op {
        Splice::Insert(ch) => {
            assert!(
                position <= len,
                "splice insert at {position} past end of line (len {len})"
            );
            let at = byte_offset(line, position);
            let mut out = String::with_capacity(line.len() + ch.len_utf8());
            out.push_str(&line[..at]);
            out.push(ch);
            out.push_str(&line[at..]);
            out
        }
        Splice::DeleteAt => {
            assert!(
                position < len,
                "splice delete at {position} out of range (len {len})"
            );
            line.chars()
                .enumerate()
                .filter_map(|(i, ch)| (i != position).then_some(ch))
                .collect()
        }
    }
}

/// Byte offset of char index `col`, or the line's byte length past the end.
fn byte_offset(line: &str, col: usize) -> usize {
    line.char_indices().nth(col).map_or(line.len(), |(i, _)| i)
}

// ---------------------------------------------------------------------------
// Buffer
// ---------------------------------------------------------------------------

/// The lines of one document plus where they came from.
#[derive(Clone, PartialEq, Eq)]
pub struct Buffer {
    lines: Vec<String>,
    path: Option<PathBuf>,
    modified: bool,
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Buffer {
    // -- Construction -------------------------------------------------------

    /// An untitled buffer holding one empty line.
    #[must_use]
    pub fn new() -> Self {
        Self {
            lines: vec![String::new()],
            path: None,
            modified: false,
        }
    }

    /// Split `text` on `\n`. A trailing newline yields a trailing empty line.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        Self::from_lines(text.split('\n').map(str::to_owned).collect())
    }

    /// Take ownership of `lines`. An empty list becomes one empty line.
    #[must_use]
    pub fn from_lines(lines: Vec<String>) -> Self {
        let lines = if lines.is_empty() {
            vec![String::new()]
        } else {
            lines
        };
        Self {
            lines,
            path: None,
            modified: false,
        }
    }

    /// Load a file, one buffer line per file line.
    ///
    /// `\n` and `\r\n` both end a line, and a final newline does not add an
    /// empty line. A file that does not exist yet opens as one empty line
    /// carrying `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or is not
    /// valid UTF-8.
    pub fn from_file(path: &Path) -> io::Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::info!("{} does not exist, starting empty", path.display());
                String::new()
            }
            Err(e) => return Err(e),
        };

        let mut buf = Self::from_lines(text.lines().map(str::to_owned).collect());
        buf.path = Some(path.to_path_buf());
        log::debug!("loaded {} ({} lines)", path.display(), buf.line_count());
        Ok(buf)
    }

    /// Attach a path (or synthetic name) to the buffer.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    // -- Metadata -----------------------------------------------------------

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Name for the tab bar: the full path, or only its file name.
    #[must_use]
    pub fn display_name(&self, full_path: bool) -> String {
        let Some(path) = &self.path else {
            return "[No Name]".to_owned();
        };
        if full_path {
            return path.display().to_string();
        }
        path.file_name().map_or_else(
            || path.display().to_string(),
            |name| name.to_string_lossy().into_owned(),
        )
    }

    /// True once any line has been inserted, removed or replaced.
    #[inline]
    #[must_use]
    pub const fn is_modified(&self) -> bool {
        self.modified
    }

    // -- Text access --------------------------------------------------------

    /// Number of lines. Never zero.
    #[inline]
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// The text of line `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[must_use]
    pub fn line(&self, index: usize) -> &str {
        self.check_index(index, "line");
        &self.lines[index]
    }

    /// Length of line `index` in chars.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[must_use]
    pub fn line_len(&self, index: usize) -> usize {
        self.line(index).chars().count()
    }

    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// All lines joined with `\n`.
    #[must_use]
    pub fn contents(&self) -> String {
        self.lines.join("\n")
    }

    // -- Mutation -----------------------------------------------------------

    /// Insert `content` as line `index`, shifting later lines down.
    /// `index == line_count()` appends.
    ///
    /// # Panics
    ///
    /// Panics if `index > line_count()`.
    pub fn insert_line(&mut self, index: usize, content: impl Into<String>) {
        assert!(
            index <= self.lines.len(),
            "insert_line: index {index} out of range (line count {})",
            self.lines.len()
        );
        self.lines.insert(index, content.into());
        self.modified = true;
        log::trace!("insert line {index}");
    }

    /// Remove line `index`, shifting later lines up.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range or if it is the only line.
    pub fn remove_line(&mut self, index: usize) {
        self.check_index(index, "remove_line");
        assert!(
            self.lines.len() > 1,
            "remove_line: cannot remove the only line"
        );
        self.lines.remove(index);
        self.modified = true;
        log::trace!("remove line {index}");
    }

    /// Replace the text of line `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn update_line(&mut self, index: usize, content: impl Into<String>) {
        self.check_index(index, "update_line");
        self.lines[index] = content.into();
        self.modified = true;
        log::trace!("update line {index}");
    }

    /// Split line `index` at char `col`: the head stays, the tail becomes
    /// a new line below.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range or `col` is past the end.
    pub fn split_line(&mut self, index: usize, col: usize) {
        let line = self.line(index);
        assert!(
            col <= line.chars().count(),
            "split_line: column {col} past end of line {index}"
        );
        let at = byte_offset(line, col);
        let tail = line[at..].to_owned();
        let head = line[..at].to_owned();
        self.update_line(index, head);
        self.insert_line(index + 1, tail);
    }

    /// Append line `index + 1` onto line `index` and remove it. Returns the
    /// char length line `index` had before the join.
    ///
    /// # Panics
    ///
    /// Panics if `index + 1` is out of range.
    pub fn join_with_next(&mut self, index: usize) -> usize {
        self.check_index(index + 1, "join_with_next");
        let joint = self.line_len(index);
        let joined = format!("{}{}", self.lines[index], self.lines[index + 1]);
        self.update_line(index, joined);
        self.remove_line(index + 1);
        joint
    }

    fn check_index(&self, index: usize, op: &str) {
        assert!(
            index < self.lines.len(),
            "{op}: line {index} out of range (line count {})",
            self.lines.len()
        );
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("path", &self.path)
            .field("lines", &self.lines.len())
            .field("modified", &self.modified)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
