use std::collections::TryReserveError;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("cannot open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot create {}: {source}", .path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid file format")]
    BadFile,
    #[error("file too big")]
    TooBig,
    #[error("out of memory allocating {what}")]
    Alloc {
        what: &'static str,
        #[source]
        source: TryReserveError,
    },
    #[error("record {record}: {reason}")]
    Syntax { record: usize, reason: &'static str },
}

impl Error {
    pub(crate) fn alloc(what: &'static str) -> impl FnOnce(TryReserveError) -> Error {
        move |source| Error::Alloc { what, source }
    }
}
