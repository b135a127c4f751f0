//! Logical ↔ visual column mapping.
//!
//! A *logical* column is a char offset into a line. A *visual* column is
//! where that char is drawn once tabs are expanded: a tab occupies
//! `tabstop` cells, every other char one. Tabs expand to a fixed width, not
//! to the next tab stop, so the mapping depends only on the chars before
//! the column.
//!
//! All functions here are pure.

/// Display width of one char.
#[inline]
const fn char_width(ch: char, tabstop: usize) -> usize {
    if ch == '\t' { tabstop } else { 1 }
}

/// Visual column of logical column `logical`.
///
/// Columns past the end of the line are clamped to the line's length.
#[must_use]
pub fn visual_col(line: &str, logical: usize, tabstop: usize) -> usize {
    line.chars()
        .take(logical)
        .map(|ch| char_width(ch, tabstop))
        .sum()
}

/// Logical column drawn at (or just before) visual column `visual`.
///
/// Returns the first index whose start reaches `visual`, or whose char would
/// overrun it, so a visual column in the middle of a tab maps to the tab.
/// A visual column past the end of the line maps to the line's length; the
/// caller clamps that onto the last char where needed.
#[must_use]
pub fn logical_col(line: &str, visual: usize, tabstop: usize) -> usize {
    let mut width = 0;
    for (index, ch) in line.chars().enumerate() {
        if width >= visual {
            return index;
        }
        let next = width + char_width(ch, tabstop);
        if next > visual {
            return index;
        }
        width = next;
    }
    line.chars().count()
}

/// Render `line` for display: each tab becomes `tabchar` followed by
/// `tabstop - 1` spaces.
#[must_use]
pub fn expand_tabs(line: &str, tabstop: usize, tabchar: char) -> String {
    if !line.contains('\t') {
        return line.to_owned();
    }
    let mut out = String::with_capacity(line.len() + tabstop * 4);
    for ch in line.chars() {
        if ch == '\t' {
            if tabstop > 0 {
                out.push(tabchar);
                out.extend(std::iter::repeat_n(' ', tabstop - 1));
            }
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const TS: usize = 4;

    // -- visual_col ---------------------------------------------------------

    #[test]
    fn visual_plain_text() {
        assert_eq!(visual_col("hello", 0, TS), 0);
        assert_eq!(visual_col("hello", 3, TS), 3);
        assert_eq!(visual_col("hello", 5, TS), 5);
    }

    #[test]
    fn visual_counts_tab_as_tabstop() {
        assert_eq!(visual_col("\tx", 1, TS), 4);
        assert_eq!(visual_col("a\tb", 2, TS), 5);
        assert_eq!(visual_col("\t\t", 2, 8), 16);
    }

    #[test]
    fn visual_clamps_past_end() {
        assert_eq!(visual_col("ab", 10, TS), 2);
        assert_eq!(visual_col("", 3, TS), 0);
    }

    #[test]
    fn visual_is_monotonic() {
        let line = "a\tb\t\tcd";
        let mut prev = 0;
        for i in 0..=line.chars().count() + 2 {
            let v = visual_col(line, i, TS);
            assert!(v >= prev, "visual_col decreased at {i}");
            prev = v;
        }
    }

    // -- logical_col --------------------------------------------------------

    #[test]
    fn logical_plain_text() {
        assert_eq!(logical_col("hello", 0, TS), 0);
        assert_eq!(logical_col("hello", 2, TS), 2);
    }

    #[test]
    fn logical_mid_tab_lands_on_tab() {
        // Tab spans visual 1..5.
        assert_eq!(logical_col("a\tb", 1, TS), 1);
        assert_eq!(logical_col("a\tb", 3, TS), 1);
        assert_eq!(logical_col("a\tb", 5, TS), 2);
    }

    #[test]
    fn logical_past_end_returns_len() {
        assert_eq!(logical_col("ab", 7, TS), 2);
        assert_eq!(logical_col("", 3, TS), 0);
    }

    #[test]
    fn round_trip_without_tabs() {
        let line = "the quick brown fox";
        for i in 0..=line.len() {
            assert_eq!(logical_col(line, visual_col(line, i, TS), TS), i);
        }
    }

    #[test]
    fn visual_of_logical_never_exceeds_target() {
        let line = "\ta\t\tbc\t";
        for v in 0..30 {
            let l = logical_col(line, v, TS);
            assert!(visual_col(line, l, TS) <= v, "overshot visual {v}");
        }
    }

    #[test]
    fn logical_is_monotonic() {
        let line = "x\t\ty";
        let mut prev = 0;
        for v in 0..20 {
            let l = logical_col(line, v, TS);
            assert!(l >= prev);
            prev = l;
        }
    }

    // -- expand_tabs --------------------------------------------------------

    #[test]
    fn expand_without_tabs_is_identity() {
        assert_eq!(expand_tabs("plain", TS, ' '), "plain");
    }

    #[test]
    fn expand_uses_tabchar_then_spaces() {
        assert_eq!(expand_tabs("\tx", TS, '>'), ">   x");
        assert_eq!(expand_tabs("a\t", 2, ' '), "a  ");
    }

    #[test]
    fn expanded_width_matches_visual_col() {
        let line = "a\tbc\t\td";
        let expanded = expand_tabs(line, TS, '|');
        assert_eq!(
            expanded.chars().count(),
            visual_col(line, line.chars().count(), TS)
        );
    }
}
