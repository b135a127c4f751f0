// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Background stdin reader — turns raw terminal bytes into chars.
//
// A dedicated thread polls stdin, decodes UTF-8 incrementally (a
// multi-byte character may be split across two reads), and pushes each
// char into a bounded channel. The consumer side is a `ChannelSource`,
// which the key decoder reads with or without a deadline.
//
// Shutdown: the thread uses `poll()` with a short timeout on stdin's
// file descriptor, checking an `AtomicBool` stop flag between polls. A
// full queue is retried with `try_send` so a stop request is still seen
// while the consumer is not draining.
//
// A read error is forwarded once as `Err`, then the thread exits. EOF or
// stop drops the sender, which the consumer sees as end-of-input.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::source::ChannelSource;

/// Capacity of the queue between the reader thread and the decoder.
pub const INPUT_QUEUE_CAPACITY: usize = 1024;

/// Byte chunk read from stdin.
const READ_BUF_SIZE: usize = 4096;

/// How often the reader thread checks the stop flag (milliseconds).
const POLL_TIMEOUT_MS: i32 = 50;

/// Pause between attempts to push into a full queue.
const FULL_QUEUE_BACKOFF: Duration = Duration::from_millis(2);

/// Background stdin reader thread.
///
/// # Example
///
/// ```no_run
/// use m_term::input::KeyDecoder;
/// use m_term::reader::StdinReader;
///
/// let (reader, source) = StdinReader::spawn();
/// let mut keys = KeyDecoder::new(source);
/// while let Ok(Some(key)) = keys.next_key() {
///     println!("{key:?}");
/// }
/// drop(reader);
/// ```
pub struct StdinReader {
    /// The reader thread handle. `None` after `stop()` joins it.
    handle: Option<JoinHandle<()>>,
    /// Shared flag to signal the thread to exit.
    stop: Arc<AtomicBool>,
}

impl StdinReader {
    /// Spawn the background reader thread.
    ///
    /// Returns the reader handle and the source the decoder reads from.
    ///
    /// # Panics
    ///
    /// Panics if the OS cannot spawn a new thread.
    #[must_use]
    pub fn spawn() -> (Self, ChannelSource) {
        let (tx, rx) = mpsc::sync_channel(INPUT_QUEUE_CAPACITY);
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let handle = thread::Builder::new()
            .name("stdin-reader".into())
            .spawn(move || {
                Self::reader_loop(&tx, &stop_flag);
                log::debug!("stdin reader exiting");
            })
            .expect("failed to spawn stdin reader thread");

        (
            Self {
                handle: Some(handle),
                stop,
            },
            ChannelSource::new(rx),
        )
    }

    /// Signal the reader thread to stop and wait for it to exit.
    ///
    /// Idempotent: calling `stop()` after the thread has already
    /// exited is a no-op.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    #[cfg(unix)]
    fn reader_loop(tx: &SyncSender<io::Result<char>>, stop: &AtomicBool) {
        use std::os::unix::io::AsRawFd;

        let stdin_fd = io::stdin().as_raw_fd();
        let mut buf = [0u8; READ_BUF_SIZE];
        let mut utf8 = Utf8Decoder::default();

        while !stop.load(Ordering::Relaxed) {
            let ready = unsafe {
                let mut pfd = libc::pollfd {
                    fd: stdin_fd,
                    events: libc::POLLIN,
                    revents: 0,
                };
                libc::poll(&raw mut pfd, 1, POLL_TIMEOUT_MS)
            };

            // Timeout or interrupted poll: loop back to check stop flag.
            if ready <= 0 {
                continue;
            }

            let n = unsafe { libc::read(stdin_fd, buf.as_mut_ptr().cast(), buf.len()) };

            if n == 0 {
                return;
            }
            if n < 0 {
                let err = io::Error::last_os_error();
                if matches!(
                    err.kind(),
                    io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
                ) {
                    continue;
                }
                log::warn!("stdin read failed: {err}");
                deliver(tx, Err(err), stop);
                return;
            }

            #[allow(clippy::cast_sign_loss)] // n > 0 checked above.
            let chunk = &buf[..n as usize];

            for ch in utf8.decode(chunk) {
                if !deliver(tx, Ok(ch), stop) {
                    return;
                }
            }
        }
    }

    /// Non-unix fallback using blocking reads with no poll.
    #[cfg(not(unix))]
    fn reader_loop(tx: &SyncSender<io::Result<char>>, stop: &AtomicBool) {
        use std::io::Read;

        let stdin = io::stdin();
        let mut buf = [0u8; READ_BUF_SIZE];
        let mut utf8 = Utf8Decoder::default();

        while !stop.load(Ordering::Relaxed) {
            match stdin.lock().read(&mut buf) {
                Ok(0) => return,
                Ok(n) => {
                    for ch in utf8.decode(&buf[..n]) {
                        if !deliver(tx, Ok(ch), stop) {
                            return;
                        }
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    deliver(tx, Err(e), stop);
                    return;
                }
            }
        }
    }
}

impl Drop for StdinReader {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Push one item, waiting while the queue is full. Returns `false` when
/// the consumer is gone or a stop was requested.
fn deliver(tx: &SyncSender<io::Result<char>>, item: io::Result<char>, stop: &AtomicBool) -> bool {
    let mut item = item;
    loop {
        match tx.try_send(item) {
            Ok(()) => return true,
            Err(TrySendError::Disconnected(_)) => return false,
            Err(TrySendError::Full(back)) => {
                if stop.load(Ordering::Relaxed) {
                    return false;
                }
                item = back;
                thread::sleep(FULL_QUEUE_BACKOFF);
            }
        }
    }
}

// ─── UTF-8 ───────────────────────────────────────────────────────────────────

/// Incremental UTF-8 decoder.
///
/// An incomplete trailing sequence is held back until the next chunk.
/// Invalid bytes become U+FFFD.
#[derive(Debug, Default)]
pub(crate) struct Utf8Decoder {
    partial: Vec<u8>,
}

impl Utf8Decoder {
    pub(crate) fn decode(&mut self, bytes: &[u8]) -> Vec<char> {
        self.partial.extend_from_slice(bytes);

        let mut chars = Vec::with_capacity(self.partial.len());
        let mut start = 0;

        while start < self.partial.len() {
            match std::str::from_utf8(&self.partial[start..]) {
                Ok(s) => {
                    chars.extend(s.chars());
                    start = self.partial.len();
                }
                Err(e) => {
                    let valid_end = start + e.valid_up_to();
                    chars.extend(String::from_utf8_lossy(&self.partial[start..valid_end]).chars());
                    match e.error_len() {
                        Some(bad) => {
                            chars.push(char::REPLACEMENT_CHARACTER);
                            start = valid_end + bad;
                        }
                        None => {
                            start = valid_end;
                            break;
                        }
                    }
                }
            }
        }

        self.partial.drain(..start);
        chars
    }

    /// Bytes held back waiting for the rest of a character.
    #[cfg(test)]
    fn held(&self) -> usize {
        self.partial.len()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
