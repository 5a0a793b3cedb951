//! Error types for the storage engine.
//!
//! The engine distinguishes two tiers, matching the REPL's error handling:
//! recoverable errors that the REPL reports and continues past, and fatal
//! errors that indicate a corrupt file or a broken invariant and should
//! terminate the process.

use std::fmt;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    /// The on-disk file is not a valid database file (e.g. its length is
    /// not a multiple of the page size).
    CorruptFile(String),
    /// A page operation addressed a page number outside the table's bounds,
    /// or flushed a page that was never loaded. Both are programmer errors.
    PageOutOfBounds(String),
    /// A tree operation hit a case this engine does not support.
    Unsupported(String),
    DuplicateKey,
    TableFull,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::CorruptFile(msg) => write!(f, "Corrupt file. {}", msg),
            Error::PageOutOfBounds(msg) => write!(f, "Page out of bounds. {}", msg),
            Error::Unsupported(msg) => write!(f, "Unsupported operation. {}", msg),
            Error::DuplicateKey => write!(f, "Error: Duplicate key."),
            Error::TableFull => write!(f, "Error: Table full."),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl Error {
    /// True for errors that reflect a corrupted file or a broken engine
    /// invariant. The REPL prints these and exits; everything else it
    /// reports and continues.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Io(_)
                | Error::CorruptFile(_)
                | Error::PageOutOfBounds(_)
                | Error::Unsupported(_)
        )
    }
}
