use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while filtering a class definition.
///
/// `UnparsableDeclaration` and `NoClassFound` are recovered inside the
/// pipeline by passing text through unchanged; only the I/O variants reach
/// the process boundary.
#[derive(Error, Debug)]
pub enum FilterError {
    #[error("unparsable {kind} declaration at line {line}: {reason}")]
    UnparsableDeclaration {
        kind: &'static str,
        line: usize,
        reason: String,
    },

    #[error("no recognizable class header")]
    NoClassFound,

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create output directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, FilterError>;

impl FilterError {
    pub fn unparsable(kind: &'static str, line: usize, reason: impl Into<String>) -> Self {
        FilterError::UnparsableDeclaration {
            kind,
            line,
            reason: reason.into(),
        }
    }
}
