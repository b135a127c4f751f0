// SPDX-License-Identifier: MIT
//
// m-term — terminal layer for m-vi.
//
// Reads raw input on a background thread, decodes it into key events
// (telling a lone ESC apart from escape sequences by timing), drives the
// application through a decode-dispatch-redraw loop, and writes ANSI
// output behind a small `Terminal` trait that tests can replace with an
// in-memory grid.
//
// Direct termios and ANSI sequences, no TUI framework.

pub mod ansi;
pub mod event_loop;
pub mod input;
pub mod reader;
pub mod source;
pub mod terminal;
