// SPDX-License-Identifier: MIT
//
// Command-line arguments.
//
//   m-vi [FILE]...
//
// Each file opens in its own tab. `--` ends option parsing so files whose
// names start with `-` can be opened.

use std::path::PathBuf;

use thiserror::Error;

pub const USAGE: &str = "\
usage: m-vi [FILE]...

Open each FILE in its own tab. With no FILE, start on an empty buffer.

options:
  -h, --help    print this help and exit
  --            treat every following argument as a file
";

/// What the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Open these files (possibly none).
    Edit(Vec<PathBuf>),
    /// Print usage and exit.
    Help,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArgsError {
    #[error("unknown option '{0}'")]
    UnknownOption(String),
}

/// Parse the arguments after the program name.
///
/// # Errors
///
/// Returns [`ArgsError::UnknownOption`] for a dash-prefixed argument
/// before `--` that is not a known option. A lone `-` is a file name.
pub fn parse(args: impl IntoIterator<Item = String>) -> Result<Command, ArgsError> {
    let mut files = Vec::new();
    let mut options_done = false;

    for arg in args {
        if options_done {
            files.push(PathBuf::from(arg));
            continue;
        }
        match arg.as_str() {
            "--" => options_done = true,
            "-h" | "--help" => return Ok(Command::Help),
            s if s.starts_with('-') && s.len() > 1 => return Err(ArgsError::UnknownOption(arg)),
            _ => files.push(PathBuf::from(arg)),
        }
    }

    Ok(Command::Edit(files))
}
