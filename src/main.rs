// SPDX-License-Identifier: MIT
//
// m-vi — a minimal modal terminal text editor.
//
// This binary wires the two crates together:
//
//   m-term   → raw mode, stdin reader thread, key decoding, event loop
//   m-editor → buffers, panels and tabs, motions, modes, redraw
//
// Each keypress flows through:
//
//   stdin → reader thread → channel → KeyDecoder → Editor::on_key
//         → mode dispatch → motion | buffer edit → redraw
//
// Layout:
//
//   ┌──────────────────────────────┐
//   │ tab bar                      │  ← 1 row
//   ├──────────────────────────────┤
//   │ panels                       │  ← h - 2 rows
//   ├──────────────────────────────┤
//   │ status line                  │  ← 1 row
//   └──────────────────────────────┘

mod args;
mod logger;

use std::env;
use std::io;
use std::path::PathBuf;
use std::process;

use thiserror::Error;

use m_editor::buffer::Buffer;
use m_editor::editor::{Editor, EditorState};
use m_editor::settings::Settings;
use m_term::event_loop;
use m_term::input::KeyDecoder;
use m_term::reader::StdinReader;
use m_term::source::InputError;
use m_term::terminal::{self, AnsiTerminal, RawMode, Size};

use args::Command;

#[derive(Debug, Error)]
enum RunError {
    #[error("failed to initialize terminal: {0}")]
    Terminal(#[from] io::Error),
    #[error("input error: {0}")]
    Input(#[from] InputError),
}

/// Load every file, or stop at the first one that cannot be read.
fn load(paths: &[PathBuf]) -> Result<Vec<Buffer>, (PathBuf, io::Error)> {
    paths
        .iter()
        .map(|path| Buffer::from_file(path).map_err(|e| (path.clone(), e)))
        .collect()
}

fn run(buffers: Vec<Buffer>) -> Result<(), RunError> {
    let size = terminal::get_size().unwrap_or(Size::FALLBACK);
    let state = EditorState::new(Settings::default(), size, buffers);

    let guard = RawMode::enter()?;
    event_loop::install_resize_handler();

    let (mut reader, source) = StdinReader::spawn();
    let mut keys = KeyDecoder::new(source);
    let mut editor = Editor::new(state, AnsiTerminal::stdout());

    let result = event_loop::run(&mut editor, &mut keys);

    reader.stop();
    drop(guard);
    log::info!("m-vi exiting");
    Ok(result?)
}

fn main() {
    let files = match args::parse(env::args().skip(1)) {
        Ok(Command::Edit(files)) => files,
        Ok(Command::Help) => {
            print!("{}", args::USAGE);
            return;
        }
        Err(e) => {
            eprintln!("m-vi: {e}");
            eprint!("{}", args::USAGE);
            process::exit(2);
        }
    };

    if let Err(e) = logger::init() {
        eprintln!("m-vi: {e}");
    }
    log::info!("m-vi starting with {} file(s)", files.len());

    let buffers = match load(&files) {
        Ok(buffers) => buffers,
        Err((path, e)) => {
            eprintln!("m-vi: {}: {e}", path.display());
            process::exit(1);
        }
    };

    if let Err(e) = run(buffers) {
        log::error!("{e}");
        eprintln!("m-vi: {e}");
        process::exit(1);
    }
}
