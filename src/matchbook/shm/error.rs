//! Error types for the shared mapped region.

use std::fmt;
use std::path::PathBuf;

/// Errors that can occur while creating, sizing, or mapping the shared
/// region file. All variants are fatal: the engine refuses to start on any
/// of them.
#[derive(Debug)]
#[non_exhaustive]
pub enum RegionError {
    /// An I/O error occurred while opening, sizing, or flushing the file.
    Io {
        /// The underlying I/O error message.
        message: String,
        /// The file path involved, if known.
        path: Option<PathBuf>,
    },

    /// An existing region file has the wrong size for the compiled layout.
    SizeMismatch {
        /// The size required by the layout.
        expected: u64,
        /// The size found on disk.
        actual: u64,
        /// The offending file.
        path: PathBuf,
    },
}

impl fmt::Display for RegionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionError::Io { message, path } => {
                if let Some(p) = path {
                    write!(f, "region I/O error at {}: {message}", p.display())
                } else {
                    write!(f, "region I/O error: {message}")
                }
            }
            RegionError::SizeMismatch {
                expected,
                actual,
                path,
            } => {
                write!(
                    f,
                    "region size mismatch at {}: expected {expected} bytes, found {actual}",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for RegionError {}

impl From<std::io::Error> for RegionError {
    #[cold]
    fn from(err: std::io::Error) -> Self {
        RegionError::Io {
            message: err.to_string(),
            path: None,
        }
    }
}
