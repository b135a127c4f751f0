// SPDX-License-Identifier: MIT
//
// Input sources — where raw input units come from.
//
// The key decoder pulls chars one at a time through the `InputSource`
// trait. Two implementations exist:
//
// - `ChannelSource` receives chars pushed by the background stdin reader
//   through a bounded channel. Reads can block forever (waiting for the
//   next keypress) or with a deadline (waiting to see whether an ESC is
//   followed by the rest of an escape sequence).
//
// - `ReplaySource` yields a fixed, pre-supplied sequence and then reports
//   end-of-input. Everything is already available, so a deadline never
//   expires. Scripted tests drive the whole editor through it.
//
// End-of-input is a normal outcome (`Read::End`), not an error. Only a
// failure of the underlying reader surfaces as `InputError`.

use std::io;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use thiserror::Error;

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Failure of the underlying input source.
#[derive(Debug, Error)]
pub enum InputError {
    /// Reading from the terminal failed.
    #[error("failed to read terminal input: {0}")]
    Read(#[from] io::Error),
}

// ─── Read Outcome ────────────────────────────────────────────────────────────

/// Outcome of a single [`InputSource::read`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Read {
    /// One raw input unit.
    Unit(char),
    /// The deadline passed without a unit arriving.
    TimedOut,
    /// The source is exhausted or closed. Every later read also returns `End`.
    End,
}

// ─── InputSource ─────────────────────────────────────────────────────────────

/// A pull-based supplier of raw input units.
pub trait InputSource {
    /// Read the next unit.
    ///
    /// With `timeout = None` the call blocks until a unit arrives or the
    /// source ends. With `Some(d)` it returns [`Read::TimedOut`] once `d`
    /// elapses with nothing to read.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::Read`] if the underlying reader failed.
    fn read(&mut self, timeout: Option<Duration>) -> Result<Read, InputError>;
}

impl<S: InputSource + ?Sized> InputSource for &mut S {
    fn read(&mut self, timeout: Option<Duration>) -> Result<Read, InputError> {
        (**self).read(timeout)
    }
}

impl<S: InputSource + ?Sized> InputSource for Box<S> {
    fn read(&mut self, timeout: Option<Duration>) -> Result<Read, InputError> {
        (**self).read(timeout)
    }
}

// ─── ReplaySource ────────────────────────────────────────────────────────────

/// Deterministic source that replays a fixed sequence of units.
///
/// # Example
///
/// ```
/// use m_term::source::{InputSource, Read, ReplaySource};
///
/// let mut src = ReplaySource::from("jk");
/// assert_eq!(src.read(None).unwrap(), Read::Unit('j'));
/// assert_eq!(src.read(None).unwrap(), Read::Unit('k'));
/// assert_eq!(src.read(None).unwrap(), Read::End);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ReplaySource {
    units: Vec<char>,
    pos: usize,
}

impl ReplaySource {
    /// Create a source that yields `units` in order.
    #[must_use]
    pub fn new(units: impl IntoIterator<Item = char>) -> Self {
        Self {
            units: units.into_iter().collect(),
            pos: 0,
        }
    }

    /// Number of units not yet read.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.units.len() - self.pos
    }
}

impl From<&str> for ReplaySource {
    fn from(text: &str) -> Self {
        Self::new(text.chars())
    }
}

impl InputSource for ReplaySource {
    fn read(&mut self, _timeout: Option<Duration>) -> Result<Read, InputError> {
        match self.units.get(self.pos) {
            Some(&ch) => {
                self.pos += 1;
                Ok(Read::Unit(ch))
            }
            None => Ok(Read::End),
        }
    }
}

// ─── ChannelSource ───────────────────────────────────────────────────────────

/// Live source fed by a producer thread through a channel.
///
/// The producer sends `Ok(ch)` for each decoded char and `Err(e)` once if
/// its read fails. Dropping the sender closes the source.
#[derive(Debug)]
pub struct ChannelSource {
    rx: Receiver<io::Result<char>>,
}

impl ChannelSource {
    /// Wrap the receiving end of an input channel.
    #[must_use]
    pub const fn new(rx: Receiver<io::Result<char>>) -> Self {
        Self { rx }
    }
}

impl InputSource for ChannelSource {
    fn read(&mut self, timeout: Option<Duration>) -> Result<Read, InputError> {
        let received = match timeout {
            None => self.rx.recv().ok(),
            Some(t) => match self.rx.recv_timeout(t) {
                Ok(item) => Some(item),
                Err(RecvTimeoutError::Timeout) => return Ok(Read::TimedOut),
                Err(RecvTimeoutError::Disconnected) => None,
            },
        };

        match received {
            Some(Ok(ch)) => Ok(Read::Unit(ch)),
            Some(Err(e)) => Err(InputError::Read(e)),
            None => Ok(Read::End),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn replay_yields_units_then_end() {
        let mut src = ReplaySource::from("ab");
        assert_eq!(src.remaining(), 2);
        assert_eq!(src.read(None).unwrap(), Read::Unit('a'));
        assert_eq!(src.read(None).unwrap(), Read::Unit('b'));
        assert_eq!(src.remaining(), 0);
        assert_eq!(src.read(None).unwrap(), Read::End);
    }

    #[test]
    fn replay_end_is_sticky() {
        let mut src = ReplaySource::default();
        assert_eq!(src.read(None).unwrap(), Read::End);
        assert_eq!(src.read(Some(Duration::from_millis(1))).unwrap(), Read::End);
    }

    #[test]
    fn replay_ignores_timeout() {
        let mut src = ReplaySource::new(['\x1b', '[']);
        assert_eq!(src.read(None).unwrap(), Read::Unit('\x1b'));
        assert_eq!(
            src.read(Some(Duration::ZERO)).unwrap(),
            Read::Unit('[')
        );
    }

    #[test]
    fn channel_receives_units() {
        let (tx, rx) = mpsc::sync_channel(4);
        let mut src = ChannelSource::new(rx);
        tx.send(Ok('x')).unwrap();
        assert_eq!(src.read(None).unwrap(), Read::Unit('x'));
    }

    #[test]
    fn channel_times_out_when_idle() {
        let (_tx, rx) = mpsc::sync_channel::<io::Result<char>>(4);
        let mut src = ChannelSource::new(rx);
        assert_eq!(
            src.read(Some(Duration::from_millis(5))).unwrap(),
            Read::TimedOut
        );
    }

    #[test]
    fn channel_disconnect_is_end() {
        let (tx, rx) = mpsc::sync_channel::<io::Result<char>>(4);
        let mut src = ChannelSource::new(rx);
        drop(tx);
        assert_eq!(src.read(None).unwrap(), Read::End);
        assert_eq!(src.read(Some(Duration::from_millis(5))).unwrap(), Read::End);
    }

    #[test]
    fn channel_forwards_read_errors() {
        let (tx, rx) = mpsc::sync_channel(4);
        let mut src = ChannelSource::new(rx);
        tx.send(Err(io::Error::other("tty gone"))).unwrap();
        let err = src.read(None).unwrap_err();
        assert!(err.to_string().contains("tty gone"));
    }

    #[test]
    fn mut_ref_is_a_source() {
        let mut inner = ReplaySource::from("z");
        let mut src = &mut inner;
        assert_eq!(src.read(None).unwrap(), Read::Unit('z'));
        assert_eq!(inner.remaining(), 0);
    }
}
