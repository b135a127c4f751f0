// SPDX-License-Identifier: MIT
//
// Terminal control — raw mode guard, size queries, and the output trait.
//
// Safety: termios (tcgetattr, tcsetattr), ioctl (TIOCGWINSZ), isatty and
// raw fd writes are only reachable through `unsafe`. Each block is minimal.
#![allow(unsafe_code)]
//
// Two halves live here:
//
// - `RawMode`: an RAII guard that puts the tty into raw mode and the
//   alternate screen, and restores both on drop. A panic hook writes a
//   restore sequence straight to fd 1 and resets termios before the
//   panic message prints, so a crash never leaves the shell unusable.
//
// - `Terminal`: the capability the editor draws through. `AnsiTerminal`
//   writes escape sequences to any `Write`; `MockTerminal` keeps a grid
//   of chars in memory for tests.

use std::io::{self, Write};
use std::sync::{Mutex, Once};

use crate::ansi::{self, CursorShape};

// ─── Size ───────────────────────────────────────────────────────────────────

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    /// Number of columns.
    pub cols: u16,
    /// Number of rows.
    pub rows: u16,
}

impl Size {
    /// Used whenever the real size cannot be determined.
    pub const FALLBACK: Self = Self { cols: 80, rows: 24 };

    #[must_use]
    pub const fn new(cols: u16, rows: u16) -> Self {
        Self { cols, rows }
    }
}

// ─── Terminal Queries ───────────────────────────────────────────────────────

/// Query the current terminal size via `ioctl(TIOCGWINSZ)`.
///
/// Returns `None` if stdout is not a terminal or the query fails.
#[cfg(unix)]
#[must_use]
pub fn get_size() -> Option<Size> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) };

    (result == 0 && ws.ws_col > 0 && ws.ws_row > 0).then_some(Size::new(ws.ws_col, ws.ws_row))
}

#[cfg(not(unix))]
#[must_use]
pub fn get_size() -> Option<Size> {
    None
}

/// Check whether stdin is connected to a terminal.
#[cfg(unix)]
#[must_use]
pub fn is_tty() -> bool {
    unsafe { libc::isatty(libc::STDIN_FILENO) != 0 }
}

#[cfg(not(unix))]
#[must_use]
pub fn is_tty() -> bool {
    false
}

// ─── Panic-Safe Restore ─────────────────────────────────────────────────────

/// Original termios for the panic hook, which cannot reach the guard.
#[cfg(unix)]
static TERMIOS_BACKUP: Mutex<Option<libc::termios>> = Mutex::new(None);

#[cfg(unix)]
fn restore_termios_from_backup() {
    if let Ok(guard) = TERMIOS_BACKUP.lock() {
        if let Some(ref original) = *guard {
            unsafe {
                let _ = libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, original);
            }
        }
    }
}

/// Reset attributes and cursor shape, show the cursor, leave the
/// alternate screen. Alternate screen exit comes last.
const EMERGENCY_RESTORE: &[u8] = b"\x1b[0m\x1b[0 q\x1b[?25h\x1b[?1049l";

static PANIC_HOOK_INSTALLED: Once = Once::new();

/// Install (once per process) a panic hook that restores the terminal
/// and then delegates to the previous hook.
fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            emergency_restore();

            #[cfg(unix)]
            restore_termios_from_backup();

            original(info);
        }));
    });
}

/// Write the restore sequence directly to fd 1, bypassing the stdout
/// lock which the panicking thread may hold.
fn emergency_restore() {
    #[cfg(unix)]
    unsafe {
        let _ = libc::write(
            libc::STDOUT_FILENO,
            EMERGENCY_RESTORE.as_ptr().cast::<libc::c_void>(),
            EMERGENCY_RESTORE.len(),
        );
    }

    #[cfg(not(unix))]
    {
        let _ = io::stdout().write_all(EMERGENCY_RESTORE);
        let _ = io::stdout().flush();
    }
}

// ─── Raw Mode Guard ─────────────────────────────────────────────────────────

/// Raw mode plus alternate screen for as long as the guard lives.
///
/// # Example
///
/// ```no_run
/// use m_term::terminal::RawMode;
///
/// let guard = RawMode::enter()?;
/// // ... run the editor ...
/// drop(guard); // terminal restored
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct RawMode {
    #[cfg(unix)]
    original_termios: Option<libc::termios>,
}

impl RawMode {
    /// Enter raw mode and switch to the alternate screen.
    ///
    /// When stdin is not a tty, termios is left alone but the screen
    /// switch is still written.
    ///
    /// # Errors
    ///
    /// Returns an error if termios or the terminal write fails.
    pub fn enter() -> io::Result<Self> {
        install_panic_hook();

        let mut guard = Self {
            #[cfg(unix)]
            original_termios: None,
        };
        guard.enable_raw_mode()?;

        let stdout = io::stdout();
        let mut lock = stdout.lock();
        ansi::enter_alt_screen(&mut lock)?;
        ansi::clear_screen(&mut lock)?;
        lock.flush()?;

        log::debug!("entered raw mode (tty: {})", is_tty());
        Ok(guard)
    }

    #[cfg(unix)]
    fn enable_raw_mode(&mut self) -> io::Result<()> {
        use std::os::unix::io::AsRawFd;

        if !is_tty() {
            return Ok(());
        }

        let fd = io::stdin().as_raw_fd();

        unsafe {
            let mut termios: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(fd, &raw mut termios) != 0 {
                return Err(io::Error::last_os_error());
            }

            self.original_termios = Some(termios);
            if let Ok(mut backup) = TERMIOS_BACKUP.lock() {
                *backup = Some(termios);
            }

            // cfmakeraw equivalent.
            termios.c_iflag &= !(libc::IGNBRK
                | libc::BRKINT
                | libc::PARMRK
                | libc::ISTRIP
                | libc::INLCR
                | libc::IGNCR
                | libc::ICRNL
                | libc::IXON);
            termios.c_oflag &= !libc::OPOST;
            termios.c_lflag &=
                !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);
            termios.c_cflag &= !(libc::CSIZE | libc::PARENB);
            termios.c_cflag |= libc::CS8;
            termios.c_cc[libc::VMIN] = 1;
            termios.c_cc[libc::VTIME] = 0;

            if libc::tcsetattr(fd, libc::TCSAFLUSH, &raw const termios) != 0 {
                return Err(io::Error::last_os_error());
            }
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn enable_raw_mode(&mut self) -> io::Result<()> {
        Ok(())
    }

    #[cfg(unix)]
    fn disable_raw_mode(&mut self) -> io::Result<()> {
        use std::os::unix::io::AsRawFd;

        let Some(original) = self.original_termios.take() else {
            return Ok(());
        };
        let fd = io::stdin().as_raw_fd();

        unsafe {
            if libc::tcsetattr(fd, libc::TCSAFLUSH, &raw const original) != 0 {
                return Err(io::Error::last_os_error());
            }
        }

        if let Ok(mut backup) = TERMIOS_BACKUP.lock() {
            *backup = None;
        }
        Ok(())
    }

    #[cfg(not(unix))]
    fn disable_raw_mode(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn leave(&mut self) -> io::Result<()> {
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        ansi::reset(&mut lock)?;
        ansi::set_cursor_shape(&mut lock, CursorShape::Default)?;
        ansi::cursor_show(&mut lock)?;
        ansi::exit_alt_screen(&mut lock)?;
        lock.flush()?;
        drop(lock);

        self.disable_raw_mode()
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        if let Err(e) = self.leave() {
            log::warn!("failed to restore terminal: {e}");
        }
    }
}

// ─── Terminal Capability ────────────────────────────────────────────────────

/// Output operations the editor needs. Coordinates are 0-indexed.
pub trait Terminal {
    /// Blank the whole screen.
    ///
    /// # Errors
    ///
    /// Propagates write failures.
    fn clear_screen(&mut self) -> io::Result<()>;

    /// Move the cursor to column `x`, row `y`.
    ///
    /// # Errors
    ///
    /// Propagates write failures.
    fn set_cursor_position(&mut self, x: u16, y: u16) -> io::Result<()>;

    /// Current size in cells.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be queried.
    fn size(&self) -> io::Result<Size>;

    /// Write text at the cursor.
    ///
    /// # Errors
    ///
    /// Propagates write failures.
    fn print(&mut self, text: &str) -> io::Result<()>;

    /// Write text in reverse video. Plain [`print`](Self::print) by default.
    ///
    /// # Errors
    ///
    /// Propagates write failures.
    fn print_reversed(&mut self, text: &str) -> io::Result<()> {
        self.print(text)
    }

    /// Steady block cursor (Normal mode).
    ///
    /// # Errors
    ///
    /// Propagates write failures.
    fn use_block_cursor(&mut self) -> io::Result<()>;

    /// Steady bar cursor (Insert mode).
    ///
    /// # Errors
    ///
    /// Propagates write failures.
    fn use_bar_cursor(&mut self) -> io::Result<()>;

    /// Push buffered output to the device.
    ///
    /// # Errors
    ///
    /// Propagates write failures.
    fn flush(&mut self) -> io::Result<()>;
}

// ─── AnsiTerminal ───────────────────────────────────────────────────────────

/// Writes ANSI escape sequences to any `Write`.
///
/// The size comes from `TIOCGWINSZ` on stdout (falling back to 80×24)
/// unless pinned with [`with_size`](Self::with_size).
pub struct AnsiTerminal<W: Write> {
    out: W,
    fixed_size: Option<Size>,
}

impl AnsiTerminal<io::Stdout> {
    /// Terminal on the process's stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> AnsiTerminal<W> {
    pub const fn new(out: W) -> Self {
        Self {
            out,
            fixed_size: None,
        }
    }

    /// Report `size` instead of querying the OS.
    pub const fn with_size(out: W, size: Size) -> Self {
        Self {
            out,
            fixed_size: Some(size),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Terminal for AnsiTerminal<W> {
    // The cursor stays hidden from the clear until the frame is flushed.
    fn clear_screen(&mut self) -> io::Result<()> {
        ansi::cursor_hide(&mut self.out)?;
        ansi::clear_screen(&mut self.out)
    }

    fn set_cursor_position(&mut self, x: u16, y: u16) -> io::Result<()> {
        ansi::cursor_to(&mut self.out, x, y)
    }

    fn size(&self) -> io::Result<Size> {
        Ok(self
            .fixed_size
            .or_else(get_size)
            .unwrap_or(Size::FALLBACK))
    }

    fn print(&mut self, text: &str) -> io::Result<()> {
        self.out.write_all(text.as_bytes())
    }

    fn print_reversed(&mut self, text: &str) -> io::Result<()> {
        ansi::reverse_video(&mut self.out)?;
        self.out.write_all(text.as_bytes())?;
        ansi::reset(&mut self.out)
    }

    fn use_block_cursor(&mut self) -> io::Result<()> {
        ansi::set_cursor_shape(&mut self.out, CursorShape::Block)
    }

    fn use_bar_cursor(&mut self) -> io::Result<()> {
        ansi::set_cursor_shape(&mut self.out, CursorShape::Bar)
    }

    fn flush(&mut self) -> io::Result<()> {
        ansi::cursor_show(&mut self.out)?;
        self.out.flush()
    }
}

// ─── MockTerminal ───────────────────────────────────────────────────────────

/// In-memory terminal: a grid of chars plus cursor and shape state.
///
/// Text printed past the right edge is clipped, as is anything printed
/// on a row outside the grid.
#[derive(Debug, Clone)]
pub struct MockTerminal {
    size: Size,
    grid: Vec<Vec<char>>,
    cursor: (u16, u16),
    shape: CursorShape,
    flushes: usize,
    clears: usize,
}

impl MockTerminal {
    #[must_use]
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            size: Size::new(cols, rows),
            grid: vec![vec![' '; usize::from(cols)]; usize::from(rows)],
            cursor: (0, 0),
            shape: CursorShape::Default,
            flushes: 0,
            clears: 0,
        }
    }

    /// Contents of row `y` with trailing blanks removed.
    #[must_use]
    pub fn row(&self, y: u16) -> String {
        self.grid
            .get(usize::from(y))
            .map(|cells| cells.iter().collect::<String>().trim_end().to_owned())
            .unwrap_or_default()
    }

    /// All rows, trailing blanks removed.
    #[must_use]
    pub fn rows(&self) -> Vec<String> {
        (0..self.size.rows).map(|y| self.row(y)).collect()
    }

    /// Where the cursor was last placed or where printing left it.
    #[must_use]
    pub const fn cursor(&self) -> (u16, u16) {
        self.cursor
    }

    #[must_use]
    pub const fn shape(&self) -> CursorShape {
        self.shape
    }

    #[must_use]
    pub const fn flushes(&self) -> usize {
        self.flushes
    }

    #[must_use]
    pub const fn clears(&self) -> usize {
        self.clears
    }

    pub fn resize(&mut self, cols: u16, rows: u16) {
        *self = Self {
            shape: self.shape,
            ..Self::new(cols, rows)
        };
    }
}

impl Terminal for MockTerminal {
    fn clear_screen(&mut self) -> io::Result<()> {
        for row in &mut self.grid {
            row.fill(' ');
        }
        self.clears += 1;
        Ok(())
    }

    fn set_cursor_position(&mut self, x: u16, y: u16) -> io::Result<()> {
        self.cursor = (x, y);
        Ok(())
    }

    fn size(&self) -> io::Result<Size> {
        Ok(self.size)
    }

    fn print(&mut self, text: &str) -> io::Result<()> {
        let (mut x, y) = self.cursor;
        if let Some(row) = self.grid.get_mut(usize::from(y)) {
            for ch in text.chars() {
                if let Some(cell) = row.get_mut(usize::from(x)) {
                    *cell = ch;
                }
                x = x.saturating_add(1);
            }
        }
        self.cursor = (x, y);
        Ok(())
    }

    fn use_block_cursor(&mut self) -> io::Result<()> {
        self.shape = CursorShape::Block;
        Ok(())
    }

    fn use_bar_cursor(&mut self) -> io::Result<()> {
        self.shape = CursorShape::Bar;
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flushes += 1;
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
