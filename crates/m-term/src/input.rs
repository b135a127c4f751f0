// SPDX-License-Identifier: MIT
//
// Key decoder.
//
// Turns a stream of raw input units (chars) into logical key events.
// Handles:
//
// - Plain characters and C0 control characters (Ctrl+letter)
// - Legacy CSI sequences (arrows, editing keys, function keys)
// - xterm modifier parameters (`ESC [ 1 ; 5 A` = Ctrl+Up)
// - SS3 sequences (F1-F4 and arrows from some terminals)
// - SGR mouse protocol (press / release / drag / move / scroll)
//
// # Design
//
// A lone ESC keypress and the first unit of an escape sequence look the
// same. After reading ESC the decoder waits up to `esc_timeout` for the
// next unit. Nothing arriving means the user pressed Escape. Anything
// arriving is accumulated until the sequence is recognized or proven
// unrecognizable, each further unit getting its own timeout.
//
// Units that never form a known sequence are replayed one by one as
// individual key events. Input is never dropped. Buffering is bounded by
// `MAX_SEQUENCE_LEN`.

use std::collections::VecDeque;
use std::time::Duration;

use bitflags::bitflags;

use crate::source::{InputError, InputSource, Read};

/// How long to wait after ESC for the rest of an escape sequence.
pub const DEFAULT_ESC_TIMEOUT: Duration = Duration::from_millis(25);

/// Longest escape sequence the decoder will buffer before giving up.
pub const MAX_SEQUENCE_LEN: usize = 32;

const ESC: char = '\x1b';

// ─── Event Types ────────────────────────────────────────────────────────────

/// Identity of a key.
///
/// Named keys have dedicated variants so they never collide with text
/// input. Printable characters and Ctrl+letter use [`Char`](KeyCode::Char).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A Unicode character.
    Char(char),
    // ── Named keys ──────────────────────────────────────────────
    Enter,
    Tab,
    Backspace,
    Escape,
    Delete,
    Insert,
    // ── Navigation ──────────────────────────────────────────────
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    // ── Function keys ───────────────────────────────────────────
    /// F1 through F20.
    F(u8),
    // ── Pointer ─────────────────────────────────────────────────
    Mouse(MouseEvent),
}

bitflags! {
    /// Keyboard modifier flags.
    ///
    /// Matches the xterm CSI modifier encoding where `param = 1 + bitmask`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0000_0001;
        const ALT   = 0b0000_0010;
        const CTRL  = 0b0000_0100;
        const SUPER = 0b0000_1000;
    }
}

/// A mouse action at a 0-indexed cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MouseEvent {
    pub kind: MouseEventKind,
    /// 0-indexed column.
    pub x: u16,
    /// 0-indexed row.
    pub y: u16,
}

/// Mouse event classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseEventKind {
    Press(MouseButton),
    Release(MouseButton),
    /// Mouse moved while a button is held.
    Drag(MouseButton),
    /// Mouse moved without any button held.
    Move,
    ScrollUp,
    ScrollDown,
    ScrollLeft,
    ScrollRight,
}

/// Mouse button identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

/// A decoded key with its modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    /// Which key was pressed.
    pub code: KeyCode,
    /// Active modifier keys.
    pub modifiers: Modifiers,
}

impl KeyEvent {
    #[must_use]
    pub const fn new(code: KeyCode, modifiers: Modifiers) -> Self {
        Self { code, modifiers }
    }

    /// A key with no modifiers.
    #[must_use]
    pub const fn plain(code: KeyCode) -> Self {
        Self::new(code, Modifiers::empty())
    }

    /// Ctrl + `ch`.
    #[must_use]
    pub const fn ctrl(ch: char) -> Self {
        Self::new(KeyCode::Char(ch), Modifiers::CTRL)
    }

    /// Interpret a single raw unit outside of any escape sequence.
    ///
    /// `\r` and `\n` are Enter, `0x7f` and `0x08` are Backspace, and the
    /// remaining C0 controls map to Ctrl+letter.
    #[must_use]
    pub fn from_unit(ch: char) -> Self {
        match ch {
            ESC => Self::plain(KeyCode::Escape),
            '\r' | '\n' => Self::plain(KeyCode::Enter),
            '\t' => Self::plain(KeyCode::Tab),
            '\x7f' | '\x08' => Self::plain(KeyCode::Backspace),
            '\0' => Self::ctrl('@'),
            '\x01'..='\x1a' => Self::ctrl(offset_char(ch, 0x60)),
            '\x1c'..='\x1f' => Self::ctrl(offset_char(ch, 0x40)),
            _ => Self::plain(KeyCode::Char(ch)),
        }
    }

    /// Whether this key inserts text in Insert mode: a printable
    /// character without Ctrl or Alt, or a plain Tab.
    #[must_use]
    pub fn is_standard_printable(&self) -> bool {
        match self.code {
            KeyCode::Char(ch) => {
                !self.modifiers.intersects(Modifiers::CTRL | Modifiers::ALT) && is_printable(ch)
            }
            KeyCode::Tab => self.modifiers.is_empty(),
            _ => false,
        }
    }

    /// The character this key inserts, if it is standard printable.
    #[must_use]
    pub fn text(&self) -> Option<char> {
        if !self.is_standard_printable() {
            return None;
        }
        match self.code {
            KeyCode::Char(ch) => Some(ch),
            KeyCode::Tab => Some('\t'),
            _ => None,
        }
    }
}

/// Printable and not a control character. The Private Use Area is
/// excluded since terminals never send it as typed text.
#[must_use]
pub fn is_printable(ch: char) -> bool {
    !ch.is_control() && !('\u{E000}'..='\u{F8FF}').contains(&ch)
}

fn offset_char(ch: char, offset: u32) -> char {
    char::from_u32(u32::from(ch) + offset).unwrap_or(ch)
}

// ─── Decoder ────────────────────────────────────────────────────────────────

/// Lazily decodes key events from an [`InputSource`].
///
/// # Example
///
/// ```
/// use m_term::input::{KeyCode, KeyDecoder, KeyEvent};
/// use m_term::source::ReplaySource;
///
/// let mut keys = KeyDecoder::new(ReplaySource::from("\x1b[Ax"));
/// assert_eq!(keys.next_key().unwrap(), Some(KeyEvent::plain(KeyCode::Up)));
/// assert_eq!(keys.next_key().unwrap(), Some(KeyEvent::plain(KeyCode::Char('x'))));
/// assert_eq!(keys.next_key().unwrap(), None);
/// ```
#[derive(Debug)]
pub struct KeyDecoder<S> {
    source: S,
    esc_timeout: Duration,
    /// Keys produced by a flush, waiting to be handed out.
    pending: VecDeque<KeyEvent>,
}

impl<S: InputSource> KeyDecoder<S> {
    /// Create a decoder with [`DEFAULT_ESC_TIMEOUT`].
    pub const fn new(source: S) -> Self {
        Self::with_esc_timeout(source, DEFAULT_ESC_TIMEOUT)
    }

    /// Create a decoder with a custom ESC disambiguation timeout.
    pub const fn with_esc_timeout(source: S, esc_timeout: Duration) -> Self {
        Self {
            source,
            esc_timeout,
            pending: VecDeque::new(),
        }
    }

    /// Decode the next key. `Ok(None)` means the input has ended.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::Read`] when the source fails.
    pub fn next_key(&mut self) -> Result<Option<KeyEvent>, InputError> {
        if let Some(key) = self.pending.pop_front() {
            return Ok(Some(key));
        }

        loop {
            match self.source.read(None)? {
                Read::Unit(ESC) => return self.decode_escape(),
                Read::Unit(ch) => return Ok(Some(KeyEvent::from_unit(ch))),
                Read::End => return Ok(None),
                // A blocking read has no deadline to miss.
                Read::TimedOut => {}
            }
        }
    }

    /// Called after ESC was read. Accumulates until the sequence is
    /// recognized, rejected, or interrupted by a timeout. Another ESC
    /// mid-sequence flushes what came before it and starts over.
    fn decode_escape(&mut self) -> Result<Option<KeyEvent>, InputError> {
        let mut seq = vec![ESC];

        loop {
            match self.source.read(Some(self.esc_timeout))? {
                Read::Unit(ESC) => {
                    if seq.len() > 1 {
                        log::trace!("escape sequence restarted: {seq:?}");
                    }
                    self.queue(&seq);
                    seq = vec![ESC];
                    continue;
                }
                Read::Unit(ch) => seq.push(ch),
                Read::TimedOut | Read::End => {
                    if seq.len() > 1 {
                        log::trace!("escape sequence interrupted: {seq:?}");
                    }
                    self.queue(&seq);
                    return Ok(self.pending.pop_front());
                }
            }

            match parse_sequence(&seq) {
                Parsed::Key(key) => {
                    self.pending.push_back(key);
                    return Ok(self.pending.pop_front());
                }
                Parsed::Incomplete if seq.len() < MAX_SEQUENCE_LEN => {}
                Parsed::Incomplete | Parsed::Invalid => {
                    log::trace!("unrecognized escape sequence: {seq:?}");
                    self.queue(&seq);
                    return Ok(self.pending.pop_front());
                }
            }
        }
    }

    /// Queue buffered units as individual keys.
    fn queue(&mut self, seq: &[char]) {
        self.pending.extend(seq.iter().map(|&ch| KeyEvent::from_unit(ch)));
    }
}

impl<S: InputSource> Iterator for KeyDecoder<S> {
    type Item = Result<KeyEvent, InputError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_key().transpose()
    }
}

// ─── Stateless Parsing Functions ────────────────────────────────────────────
//
// Each function inspects the whole accumulated sequence, which always
// starts with ESC and holds at least one more unit.

/// Result of matching the accumulated units against known sequences.
#[derive(Debug, PartialEq, Eq)]
enum Parsed {
    Key(KeyEvent),
    /// A prefix of something recognizable. Read more.
    Incomplete,
    /// Cannot become a recognized sequence.
    Invalid,
}

fn parse_sequence(seq: &[char]) -> Parsed {
    debug_assert!(seq.len() >= 2 && seq[0] == ESC);

    match seq[1] {
        '[' => parse_csi(seq),
        'O' => parse_ss3(seq),
        _ => Parsed::Invalid,
    }
}

// ── CSI (Control Sequence Introducer) ───────────────────────────────────────

fn parse_csi(seq: &[char]) -> Parsed {
    if seq.len() < 3 {
        return Parsed::Incomplete;
    }

    if seq[2] == '<' {
        return parse_sgr_mouse(seq);
    }

    // Parameter units are 0x30..=0x3F, intermediates 0x20..=0x2F, and the
    // final unit is 0x40..=0x7E. Only the last unit can be final.
    let last = seq[seq.len() - 1];
    if ('\x20'..='\x3f').contains(&last) {
        return Parsed::Incomplete;
    }
    if !('\x40'..='\x7e').contains(&last) {
        return Parsed::Invalid;
    }

    let Some(params) = parse_params(&seq[2..seq.len() - 1]) else {
        return Parsed::Invalid;
    };
    let modifiers = params
        .get(1)
        .map_or(Modifiers::empty(), |&p| decode_modifiers(p));

    if last == '~' {
        return tilde_key(params.first().copied().unwrap_or(0))
            .map_or(Parsed::Invalid, |code| {
                Parsed::Key(KeyEvent::new(code, modifiers))
            });
    }

    let code = match last {
        'A' => KeyCode::Up,
        'B' => KeyCode::Down,
        'C' => KeyCode::Right,
        'D' => KeyCode::Left,
        'H' => KeyCode::Home,
        'F' => KeyCode::End,
        'P' => KeyCode::F(1),
        'Q' => KeyCode::F(2),
        'R' => KeyCode::F(3),
        'S' => KeyCode::F(4),
        'Z' => return Parsed::Key(KeyEvent::new(KeyCode::Tab, Modifiers::SHIFT)),
        _ => return Parsed::Invalid,
    };

    Parsed::Key(KeyEvent::new(code, modifiers))
}

/// Editing and function keys of the form `ESC [ N ~`.
const fn tilde_key(n: u16) -> Option<KeyCode> {
    let code = match n {
        1 | 7 => KeyCode::Home,
        2 => KeyCode::Insert,
        3 => KeyCode::Delete,
        4 | 8 => KeyCode::End,
        5 => KeyCode::PageUp,
        6 => KeyCode::PageDown,
        15 => KeyCode::F(5),
        17 => KeyCode::F(6),
        18 => KeyCode::F(7),
        19 => KeyCode::F(8),
        20 => KeyCode::F(9),
        21 => KeyCode::F(10),
        23 => KeyCode::F(11),
        24 => KeyCode::F(12),
        25 => KeyCode::F(13),
        26 => KeyCode::F(14),
        28 => KeyCode::F(15),
        29 => KeyCode::F(16),
        31 => KeyCode::F(17),
        32 => KeyCode::F(18),
        33 => KeyCode::F(19),
        34 => KeyCode::F(20),
        _ => return None,
    };
    Some(code)
}

// ── SS3 (Single Shift 3) ───────────────────────────────────────────────────

fn parse_ss3(seq: &[char]) -> Parsed {
    if seq.len() < 3 {
        return Parsed::Incomplete;
    }

    let code = match seq[2] {
        'A' => KeyCode::Up,
        'B' => KeyCode::Down,
        'C' => KeyCode::Right,
        'D' => KeyCode::Left,
        'H' => KeyCode::Home,
        'F' => KeyCode::End,
        'P' => KeyCode::F(1),
        'Q' => KeyCode::F(2),
        'R' => KeyCode::F(3),
        'S' => KeyCode::F(4),
        _ => return Parsed::Invalid,
    };

    Parsed::Key(KeyEvent::plain(code))
}

// ── SGR Mouse Protocol ─────────────────────────────────────────────────────

fn parse_sgr_mouse(seq: &[char]) -> Parsed {
    // Format: ESC [ < Pb ; Px ; Py M    (press/motion)
    //         ESC [ < Pb ; Px ; Py m    (release)
    let last = seq[seq.len() - 1];
    if last.is_ascii_digit() || last == ';' || last == '<' {
        return Parsed::Incomplete;
    }
    if last != 'M' && last != 'm' {
        return Parsed::Invalid;
    }

    let Some(params) = parse_params(&seq[3..seq.len() - 1]) else {
        return Parsed::Invalid;
    };
    let &[cb, raw_x, raw_y] = params.as_slice() else {
        return Parsed::Invalid;
    };

    // SGR coordinates are 1-indexed; we use 0-indexed.
    let x = raw_x.saturating_sub(1);
    let y = raw_y.saturating_sub(1);

    let mut modifiers = Modifiers::empty();
    if cb & 4 != 0 {
        modifiers |= Modifiers::SHIFT;
    }
    if cb & 8 != 0 {
        modifiers |= Modifiers::ALT;
    }
    if cb & 16 != 0 {
        modifiers |= Modifiers::CTRL;
    }

    let is_scroll = cb & 64 != 0;
    let is_motion = cb & 32 != 0;
    let base = cb & 3;

    let kind = if is_scroll {
        match base {
            0 => MouseEventKind::ScrollUp,
            1 => MouseEventKind::ScrollDown,
            2 => MouseEventKind::ScrollLeft,
            _ => MouseEventKind::ScrollRight,
        }
    } else if is_motion {
        match base {
            0 => MouseEventKind::Drag(MouseButton::Left),
            1 => MouseEventKind::Drag(MouseButton::Middle),
            2 => MouseEventKind::Drag(MouseButton::Right),
            _ => MouseEventKind::Move,
        }
    } else if last == 'm' {
        MouseEventKind::Release(decode_mouse_button(base))
    } else {
        MouseEventKind::Press(decode_mouse_button(base))
    };

    Parsed::Key(KeyEvent::new(
        KeyCode::Mouse(MouseEvent { kind, x, y }),
        modifiers,
    ))
}

// ─── Helpers ────────────────────────────────────────────────────────────────

/// Parse semicolon-separated decimal parameters. Empty fields count as 0.
/// Returns `None` if anything other than digits and `;` appears.
fn parse_params(raw: &[char]) -> Option<Vec<u16>> {
    if raw.is_empty() {
        return Some(Vec::new());
    }
    raw.split(|&ch| ch == ';').map(parse_number).collect()
}

fn parse_number(digits: &[char]) -> Option<u16> {
    digits.iter().try_fold(0u16, |acc, &ch| {
        let digit = u16::try_from(ch.to_digit(10)?).ok()?;
        Some(acc.saturating_mul(10).saturating_add(digit))
    })
}

/// Decode an xterm modifier parameter (`1 + bitmask`). 0 or 1 means none.
#[allow(clippy::cast_possible_truncation)]
const fn decode_modifiers(param: u16) -> Modifiers {
    let val = if param > 0 { param - 1 } else { 0 };
    Modifiers::from_bits_truncate(val as u8)
}

const fn decode_mouse_button(base: u16) -> MouseButton {
    match base {
        0 => MouseButton::Left,
        1 => MouseButton::Middle,
        _ => MouseButton::Right,
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{ChannelSource, ReplaySource};
    use std::io;
    use std::sync::mpsc;
    use std::thread;

    /// Helper: decode all keys from a replayed string.
    fn decode(input: &str) -> Vec<KeyEvent> {
        KeyDecoder::new(ReplaySource::from(input))
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    /// Helper: decode exactly one key.
    fn decode_one(input: &str) -> KeyEvent {
        let keys = decode(input);
        assert_eq!(keys.len(), 1, "expected 1 key, got {}: {keys:?}", keys.len());
        keys[0]
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::plain(code)
    }

    fn key_mod(code: KeyCode, modifiers: Modifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    fn ch(c: char) -> KeyEvent {
        key(KeyCode::Char(c))
    }

    /// Source that plays back a script of read outcomes, then ends.
    struct Script(VecDeque<Read>);

    impl Script {
        fn new(reads: &[Read]) -> Self {
            Self(reads.iter().copied().collect())
        }
    }

    impl InputSource for Script {
        fn read(&mut self, timeout: Option<Duration>) -> Result<Read, InputError> {
            let next = self.0.pop_front().unwrap_or(Read::End);
            if next == Read::TimedOut {
                assert!(timeout.is_some(), "blocking read reported a timeout");
            }
            Ok(next)
        }
    }

    // ── Plain units ─────────────────────────────────────────────────────

    #[test]
    fn ascii_chars() {
        assert_eq!(decode("ab"), vec![ch('a'), ch('b')]);
    }

    #[test]
    fn multibyte_chars_pass_through() {
        assert_eq!(decode("é€😀"), vec![ch('é'), ch('€'), ch('😀')]);
    }

    #[test]
    fn enter_cr_and_lf() {
        assert_eq!(decode("\r\n"), vec![key(KeyCode::Enter), key(KeyCode::Enter)]);
    }

    #[test]
    fn tab_and_backspace() {
        assert_eq!(
            decode("\t\x7f\x08"),
            vec![
                key(KeyCode::Tab),
                key(KeyCode::Backspace),
                key(KeyCode::Backspace)
            ]
        );
    }

    #[test]
    fn ctrl_letters() {
        assert_eq!(decode_one("\x01"), KeyEvent::ctrl('a'));
        assert_eq!(decode_one("\x17"), KeyEvent::ctrl('w'));
        assert_eq!(decode_one("\x1a"), KeyEvent::ctrl('z'));
        assert_eq!(decode_one("\0"), KeyEvent::ctrl('@'));
        assert_eq!(decode_one("\x1c"), KeyEvent::ctrl('\\'));
    }

    #[test]
    fn empty_input_ends() {
        let mut keys = KeyDecoder::new(ReplaySource::default());
        assert_eq!(keys.next_key().unwrap(), None);
        assert_eq!(keys.next_key().unwrap(), None);
    }

    // ── Escape ──────────────────────────────────────────────────────────

    #[test]
    fn lone_escape_at_end_of_input() {
        assert_eq!(decode_one("\x1b"), key(KeyCode::Escape));
    }

    #[test]
    fn escape_then_timeout() {
        let src = Script::new(&[Read::Unit(ESC), Read::TimedOut, Read::Unit('k')]);
        let keys: Vec<_> = KeyDecoder::new(src).map(Result::unwrap).collect();
        assert_eq!(keys, vec![key(KeyCode::Escape), ch('k')]);
    }

    #[test]
    fn escape_followed_by_letter_flushes_both() {
        assert_eq!(decode("\x1bj"), vec![key(KeyCode::Escape), ch('j')]);
    }

    #[test]
    fn double_escape_is_two_escapes() {
        assert_eq!(
            decode("\x1b\x1b"),
            vec![key(KeyCode::Escape), key(KeyCode::Escape)]
        );
    }

    #[test]
    fn escape_then_arrow_sequence() {
        assert_eq!(decode("\x1b\x1b[A"), vec![key(KeyCode::Escape), key(KeyCode::Up)]);
    }

    #[test]
    fn escape_restarts_unfinished_sequence() {
        assert_eq!(
            decode("\x1b[\x1b[Bx"),
            vec![key(KeyCode::Escape), ch('['), key(KeyCode::Down), ch('x')]
        );
    }

    #[test]
    fn escape_storm_then_sequence() {
        assert_eq!(
            decode("\x1b\x1b\x1b\x1bOP"),
            vec![
                key(KeyCode::Escape),
                key(KeyCode::Escape),
                key(KeyCode::Escape),
                key(KeyCode::F(1)),
            ]
        );
    }

    #[test]
    fn interrupted_csi_is_flushed() {
        let src = Script::new(&[
            Read::Unit(ESC),
            Read::Unit('['),
            Read::Unit('1'),
            Read::TimedOut,
            Read::Unit('x'),
        ]);
        let keys: Vec<_> = KeyDecoder::new(src).map(Result::unwrap).collect();
        assert_eq!(
            keys,
            vec![key(KeyCode::Escape), ch('['), ch('1'), ch('x')]
        );
    }

    #[test]
    fn csi_cut_by_end_of_input_is_flushed() {
        assert_eq!(decode("\x1b["), vec![key(KeyCode::Escape), ch('[')]);
    }

    #[test]
    fn unknown_tilde_sequence_is_flushed() {
        assert_eq!(
            decode("\x1b[99~"),
            vec![key(KeyCode::Escape), ch('['), ch('9'), ch('9'), ch('~')]
        );
    }

    #[test]
    fn unknown_final_is_flushed() {
        assert_eq!(
            decode("\x1b[q"),
            vec![key(KeyCode::Escape), ch('['), ch('q')]
        );
    }

    #[test]
    fn overlong_sequence_is_flushed() {
        let input = format!("\x1b[{}", "1".repeat(MAX_SEQUENCE_LEN * 2));
        let keys = decode(&input);
        assert_eq!(keys.len(), input.chars().count());
        assert_eq!(keys[0], key(KeyCode::Escape));
        assert!(keys[2..].iter().all(|&k| k == ch('1')));
    }

    #[test]
    fn flushed_keys_precede_later_input() {
        let mut keys = KeyDecoder::new(ReplaySource::from("\x1bxy"));
        assert_eq!(keys.next_key().unwrap(), Some(key(KeyCode::Escape)));
        assert_eq!(keys.pending.len(), 1);
        assert_eq!(keys.next_key().unwrap(), Some(ch('x')));
        assert!(keys.pending.is_empty());
        assert_eq!(keys.next_key().unwrap(), Some(ch('y')));
        assert_eq!(keys.next_key().unwrap(), None);
    }

    // ── CSI ─────────────────────────────────────────────────────────────

    #[test]
    fn arrows() {
        assert_eq!(
            decode("\x1b[A\x1b[B\x1b[C\x1b[D"),
            vec![
                key(KeyCode::Up),
                key(KeyCode::Down),
                key(KeyCode::Right),
                key(KeyCode::Left)
            ]
        );
    }

    #[test]
    fn home_end_letters() {
        assert_eq!(decode_one("\x1b[H"), key(KeyCode::Home));
        assert_eq!(decode_one("\x1b[F"), key(KeyCode::End));
    }

    #[test]
    fn tilde_editing_keys() {
        assert_eq!(decode_one("\x1b[1~"), key(KeyCode::Home));
        assert_eq!(decode_one("\x1b[2~"), key(KeyCode::Insert));
        assert_eq!(decode_one("\x1b[3~"), key(KeyCode::Delete));
        assert_eq!(decode_one("\x1b[4~"), key(KeyCode::End));
        assert_eq!(decode_one("\x1b[5~"), key(KeyCode::PageUp));
        assert_eq!(decode_one("\x1b[6~"), key(KeyCode::PageDown));
        assert_eq!(decode_one("\x1b[7~"), key(KeyCode::Home));
        assert_eq!(decode_one("\x1b[8~"), key(KeyCode::End));
    }

    #[test]
    fn function_keys() {
        assert_eq!(decode_one("\x1b[P"), key(KeyCode::F(1)));
        assert_eq!(decode_one("\x1b[S"), key(KeyCode::F(4)));
        assert_eq!(decode_one("\x1b[15~"), key(KeyCode::F(5)));
        assert_eq!(decode_one("\x1b[24~"), key(KeyCode::F(12)));
        assert_eq!(decode_one("\x1b[34~"), key(KeyCode::F(20)));
    }

    #[test]
    fn shift_tab() {
        assert_eq!(decode_one("\x1b[Z"), key_mod(KeyCode::Tab, Modifiers::SHIFT));
    }

    #[test]
    fn modified_arrows() {
        assert_eq!(decode_one("\x1b[1;2A"), key_mod(KeyCode::Up, Modifiers::SHIFT));
        assert_eq!(decode_one("\x1b[1;3B"), key_mod(KeyCode::Down, Modifiers::ALT));
        assert_eq!(decode_one("\x1b[1;5C"), key_mod(KeyCode::Right, Modifiers::CTRL));
        assert_eq!(
            decode_one("\x1b[1;6D"),
            key_mod(KeyCode::Left, Modifiers::CTRL | Modifiers::SHIFT)
        );
    }

    #[test]
    fn modified_tilde_key() {
        assert_eq!(
            decode_one("\x1b[3;5~"),
            key_mod(KeyCode::Delete, Modifiers::CTRL)
        );
    }

    #[test]
    fn sequence_between_chars() {
        assert_eq!(decode("a\x1b[Ab"), vec![ch('a'), key(KeyCode::Up), ch('b')]);
    }

    // ── SS3 ─────────────────────────────────────────────────────────────

    #[test]
    fn ss3_keys() {
        assert_eq!(decode_one("\x1bOP"), key(KeyCode::F(1)));
        assert_eq!(decode_one("\x1bOS"), key(KeyCode::F(4)));
        assert_eq!(decode_one("\x1bOA"), key(KeyCode::Up));
        assert_eq!(decode_one("\x1bOH"), key(KeyCode::Home));
    }

    #[test]
    fn ss3_unknown_is_flushed() {
        assert_eq!(
            decode("\x1bOz"),
            vec![key(KeyCode::Escape), ch('O'), ch('z')]
        );
    }

    // ── SGR mouse ───────────────────────────────────────────────────────

    fn mouse(kind: MouseEventKind, x: u16, y: u16) -> KeyEvent {
        key(KeyCode::Mouse(MouseEvent { kind, x, y }))
    }

    #[test]
    fn mouse_press_and_release() {
        assert_eq!(
            decode_one("\x1b[<0;10;5M"),
            mouse(MouseEventKind::Press(MouseButton::Left), 9, 4)
        );
        assert_eq!(
            decode_one("\x1b[<2;1;1m"),
            mouse(MouseEventKind::Release(MouseButton::Right), 0, 0)
        );
    }

    #[test]
    fn mouse_scroll_and_drag() {
        assert_eq!(
            decode_one("\x1b[<64;3;4M"),
            mouse(MouseEventKind::ScrollUp, 2, 3)
        );
        assert_eq!(
            decode_one("\x1b[<65;3;4M"),
            mouse(MouseEventKind::ScrollDown, 2, 3)
        );
        assert_eq!(
            decode_one("\x1b[<32;7;8M"),
            mouse(MouseEventKind::Drag(MouseButton::Left), 6, 7)
        );
        assert_eq!(decode_one("\x1b[<35;7;8M"), mouse(MouseEventKind::Move, 6, 7));
    }

    #[test]
    fn mouse_with_ctrl() {
        let k = decode_one("\x1b[<16;1;1M");
        assert_eq!(k.modifiers, Modifiers::CTRL);
    }

    #[test]
    fn mouse_with_wrong_arity_is_flushed() {
        assert_eq!(decode("\x1b[<1;2M").len(), 7);
    }

    // ── Printable classification ────────────────────────────────────────

    #[test]
    fn standard_printable() {
        assert!(ch('a').is_standard_printable());
        assert!(ch(' ').is_standard_printable());
        assert!(ch('😀').is_standard_printable());
        assert!(key(KeyCode::Tab).is_standard_printable());
        assert!(!key_mod(KeyCode::Tab, Modifiers::SHIFT).is_standard_printable());
        assert!(!KeyEvent::ctrl('w').is_standard_printable());
        assert!(!ch('\u{E000}').is_standard_printable());
        assert!(!key(KeyCode::Enter).is_standard_printable());
        assert!(!key(KeyCode::Up).is_standard_printable());
    }

    #[test]
    fn text_of_keys() {
        assert_eq!(ch('x').text(), Some('x'));
        assert_eq!(key(KeyCode::Tab).text(), Some('\t'));
        assert_eq!(key(KeyCode::Escape).text(), None);
    }

    // ── Live channel ────────────────────────────────────────────────────

    #[test]
    fn live_lone_escape_times_out() {
        let (tx, rx) = mpsc::sync_channel(8);
        let mut keys =
            KeyDecoder::with_esc_timeout(ChannelSource::new(rx), Duration::from_millis(10));
        tx.send(Ok(ESC)).unwrap();
        assert_eq!(keys.next_key().unwrap(), Some(key(KeyCode::Escape)));
        tx.send(Ok('i')).unwrap();
        assert_eq!(keys.next_key().unwrap(), Some(ch('i')));
    }

    #[test]
    fn live_sequence_arrives_in_time() {
        let (tx, rx) = mpsc::sync_channel(8);
        let mut keys =
            KeyDecoder::with_esc_timeout(ChannelSource::new(rx), Duration::from_secs(5));
        let producer = thread::spawn(move || {
            for unit in "\x1b[B".chars() {
                tx.send(Ok(unit)).unwrap();
                thread::sleep(Duration::from_millis(2));
            }
        });
        assert_eq!(keys.next_key().unwrap(), Some(key(KeyCode::Down)));
        producer.join().unwrap();
        assert_eq!(keys.next_key().unwrap(), None);
    }

    #[test]
    fn live_read_error_propagates() {
        let (tx, rx) = mpsc::sync_channel(8);
        let mut keys = KeyDecoder::new(ChannelSource::new(rx));
        tx.send(Err(io::Error::other("boom"))).unwrap();
        assert!(matches!(keys.next_key(), Err(InputError::Read(_))));
    }

    #[test]
    fn live_disconnect_ends() {
        let (tx, rx) = mpsc::sync_channel::<io::Result<char>>(8);
        let mut keys = KeyDecoder::new(ChannelSource::new(rx));
        drop(tx);
        assert_eq!(keys.next_key().unwrap(), None);
    }
}
