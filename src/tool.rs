//! Plumbing shared by the command-line tools: logging setup and the
//! mapping from errors to `sysexits.h` exit codes.

use std::io;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use crate::error::Error;

pub const EX_USAGE: u8 = 64;
pub const EX_DATAERR: u8 = 65;
pub const EX_NOINPUT: u8 = 66;
pub const EX_CANTCREAT: u8 = 73;
pub const EX_IOERR: u8 = 74;

/// Log to stderr, filtered by `RUST_LOG` (warnings and up by default).
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

pub fn exit_code(err: &Error) -> u8 {
    match err {
        Error::Open { .. } => EX_NOINPUT,
        Error::Create { .. } => EX_CANTCREAT,
        Error::BadFile | Error::Syntax { .. } => EX_DATAERR,
        Error::Io(_) | Error::TooBig | Error::Alloc { .. } => EX_IOERR,
    }
}

/// Report `err` on stderr and turn it into the process exit status.
pub fn fail(prog: &str, err: &Error) -> ExitCode {
    eprintln!("{}: {}", prog, err);
    ExitCode::from(exit_code(err))
}
