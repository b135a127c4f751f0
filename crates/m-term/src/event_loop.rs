// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Event loop — decode, dispatch, redraw.
//
// Each iteration pulls one key from the decoder, hands it to the
// application, and redraws if the application says something changed.
// The decoder blocks while the user is idle, so an idle editor costs no
// CPU. End of input ends the loop cleanly; a read failure ends it with
// an error.
//
// # SIGWINCH Handling
//
// A resize sets an `AtomicBool` from the signal handler. The loop checks
// it after every key and reports the new size before redrawing, so a
// resize is picked up with the next keypress.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::input::{KeyDecoder, KeyEvent};
use crate::source::{InputError, InputSource};
use crate::terminal::{self, Size};

// ─── SIGWINCH ────────────────────────────────────────────────────────────────

/// Set by the SIGWINCH handler, cleared by the loop.
static SIGWINCH_RECEIVED: AtomicBool = AtomicBool::new(false);

/// Install a signal handler for SIGWINCH (terminal resize).
///
/// The handler only stores to an atomic, which is async-signal-safe.
#[cfg(unix)]
pub fn install_resize_handler() {
    unsafe {
        let mut sa: libc::sigaction = std::mem::zeroed();
        sa.sa_sigaction = sigwinch_handler as *const () as usize;
        sa.sa_flags = libc::SA_RESTART;
        libc::sigemptyset(&raw mut sa.sa_mask);
        libc::sigaction(libc::SIGWINCH, &raw const sa, std::ptr::null_mut());
    }
}

#[cfg(unix)]
extern "C" fn sigwinch_handler(_sig: libc::c_int) {
    SIGWINCH_RECEIVED.store(true, Ordering::Relaxed);
}

#[cfg(not(unix))]
pub fn install_resize_handler() {}

// ─── App Trait ───────────────────────────────────────────────────────────────

/// What the application tells the event loop to do after a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Keep reading keys.
    Continue,
    /// Exit the event loop cleanly.
    Quit,
}

/// Application interface for the event loop.
///
/// The loop calls [`redraw`](App::redraw) once before the first key, then
/// for each key: [`on_key`](App::on_key), [`on_resize`](App::on_resize)
/// if the terminal changed size, and `redraw` when
/// [`needs_redraw`](App::needs_redraw) says so.
pub trait App {
    /// Handle one decoded key. Return [`Action::Quit`] to stop.
    fn on_key(&mut self, key: KeyEvent) -> Action;

    /// The terminal was resized.
    fn on_resize(&mut self, _size: Size) {}

    /// Whether state changed since the last redraw.
    fn needs_redraw(&self) -> bool {
        true
    }

    /// Paint the current state. Output failures are the application's
    /// to report; the loop keeps going.
    fn redraw(&mut self);
}

// ─── Loop ────────────────────────────────────────────────────────────────────

/// Drive `app` with keys from `keys` until it quits or input ends.
///
/// # Errors
///
/// Returns [`InputError`] if the input source fails.
pub fn run<S: InputSource>(app: &mut impl App, keys: &mut KeyDecoder<S>) -> Result<(), InputError> {
    app.redraw();

    while let Some(key) = keys.next_key()? {
        log::trace!("key: {key:?}");

        if app.on_key(key) == Action::Quit {
            log::debug!("application requested quit");
            return Ok(());
        }

        if SIGWINCH_RECEIVED.swap(false, Ordering::Relaxed) {
            if let Some(size) = terminal::get_size() {
                log::debug!("terminal resized to {}x{}", size.cols, size.rows);
                app.on_resize(size);
            }
        }

        if app.needs_redraw() {
            app.redraw();
        }
    }

    log::debug!("input ended");
    Ok(())
}

// ─── Tests ───────────────────────────────────────────────────────────────────
