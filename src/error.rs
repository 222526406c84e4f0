use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Background jobs guarded by the busy gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    Scan,
    Purge,
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Task::Scan => f.write_str("scan"),
            Task::Purge => f.write_str("purge"),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot read cache root {}: {source}", .path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("entry index {index} out of range for {len} entries")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("a {0} is already in progress")]
    Busy(Task),

    #[error("terminal error: {0}")]
    Terminal(#[from] io::Error),

    #[error("cannot set up logging: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, Error>;
