// SPDX-License-Identifier: MIT
//
// File logging for m-vi.
//
// The editor owns the terminal, so `env_logger` is pointed at a file
// instead of stderr. The file is truncated once at startup; every record
// is one line.
//
// Environment:
//
//   M_VI_LOG         log file path (default `m-vi.log`)
//   M_VI_LOG_LEVEL   env_logger filter, e.g. `debug` or `m_term=trace`
//                    (default `info`)

use std::env;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use env_logger::{Builder, Env, Target, WriteStyle};
use thiserror::Error;

pub const LOG_PATH_ENV: &str = "M_VI_LOG";
pub const LOG_LEVEL_ENV: &str = "M_VI_LOG_LEVEL";
pub const DEFAULT_LOG_PATH: &str = "m-vi.log";
pub const DEFAULT_FILTER: &str = "info";

#[derive(Debug, Error)]
pub enum LogError {
    #[error("cannot open log file {}: {source}", path.display())]
    Open { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Install(#[from] log::SetLoggerError),
}

/// Log file path from `M_VI_LOG`.
#[must_use]
pub fn log_path() -> PathBuf {
    env::var_os(LOG_PATH_ENV).map_or_else(|| PathBuf::from(DEFAULT_LOG_PATH), PathBuf::from)
}

/// Route `builder`'s output into `file`, one plain-text line per record.
fn to_file(builder: &mut Builder, file: File) -> &mut Builder {
    builder
        .format(|buf, record| {
            writeln!(buf, "{:<5} {}: {}", record.level(), record.target(), record.args())
        })
        .write_style(WriteStyle::Never)
        .target(Target::Pipe(Box::new(file)))
}

/// Truncate the log file and install the global logger.
///
/// # Errors
///
/// Returns [`LogError::Open`] if the file cannot be created and
/// [`LogError::Install`] if a logger is already installed.
pub fn init() -> Result<PathBuf, LogError> {
    let path = log_path();
    let file = File::create(&path).map_err(|source| LogError::Open {
        path: path.clone(),
        source,
    })?;

    let mut builder = Builder::from_env(Env::new().filter_or(LOG_LEVEL_ENV, DEFAULT_FILTER));
    to_file(&mut builder, file).try_init()?;
    Ok(path)
}
