//! Error types for DCP operations.
//!
//! # Overview
//!
//! The [`Error`] enum covers every failure mode of the text and picture
//! pipeline:
//! - Malformed input (time specifications, XML nodes, fractions, colours)
//! - JPEG2000 codec failures
//! - Precondition violations (for example an empty compression comment)
//! - Lazily detected invalid `LoadVariableZ` tables
//! - Filesystem failures when reading or writing assets
//!
//! Out-of-range pixel data is *not* an error; it is clamped and reported
//! through a note callback (see [`crate::NoteType`]).
//!
//! # Usage
//!
//! ```rust
//! use dcp_core::{Error, Result};
//!
//! fn check_comment(comment: &str) -> Result<()> {
//!     if comment.is_empty() {
//!         return Err(Error::Misc("comment can not be an empty string".into()));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_comment("").is_err());
//! ```
//!
//! # Dependencies
//!
//! - [`thiserror`] - For derive macro error implementation

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading, converting or writing DCP data.
///
/// # Categories
///
/// - **Malformed input**: [`Read`](Error::Read), [`Xml`](Error::Xml)
/// - **Codec failures**: [`StartCompression`](Error::StartCompression), [`Misc`](Error::Misc)
/// - **Deferred validation**: [`LoadVariableZ`](Error::LoadVariableZ)
/// - **Missing data**: [`MissingTextImage`](Error::MissingTextImage)
/// - **Filesystem**: [`File`](Error::File), [`Io`](Error::Io)
#[derive(Debug, Error)]
pub enum Error {
    /// Content could not be read or decoded.
    ///
    /// Used for malformed time specifications and JPEG2000 decode failures.
    #[error("read error: {0}")]
    Read(String),

    /// XML was structurally or semantically invalid.
    #[error("XML error: {0}")]
    Xml(String),

    /// Miscellaneous failure, including precondition violations.
    #[error("{0}")]
    Misc(String),

    /// The JPEG2000 encoder refused to start compressing.
    ///
    /// `code` is set when the codec reported a specific error number.
    #[error("could not start JPEG2000 compression{}", code_suffix(.code))]
    StartCompression {
        /// Codec-specific error number, if any.
        code: Option<i32>,
    },

    /// A `LoadVariableZ` table was read but its content is invalid.
    #[error("invalid LoadVariableZ content: {0}")]
    LoadVariableZ(String),

    /// A text image has no PNG data.
    #[error("no PNG data found for text image {0}")]
    MissingTextImage(String),

    /// Operation not supported by the selected backend.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// A file could not be read or written.
    #[error("could not access {}: {source}", .path.display())]
    File {
        /// Path of the file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

fn code_suffix(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!(" (error {})", c),
        None => String::new(),
    }
}

impl Error {
    /// Creates a [`Error::File`] for `path`.
    pub fn file(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::File {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_compression_display() {
        let with_code = Error::StartCompression { code: Some(4) };
        assert_eq!(
            with_code.to_string(),
            "could not start JPEG2000 compression (error 4)"
        );

        let without = Error::StartCompression { code: None };
        assert_eq!(without.to_string(), "could not start JPEG2000 compression");
    }

    #[test]
    fn test_file_error_carries_path() {
        let err = Error::file("/tmp/x.xml", io::Error::new(io::ErrorKind::NotFound, "gone"));
        let msg = err.to_string();
        assert!(msg.contains("/tmp/x.xml"), "{}", msg);
        assert!(msg.contains("gone"), "{}", msg);
    }

    #[test]
    fn test_misc_is_verbatim() {
        let err = Error::Misc("compress_j2k comment can not be an empty string".into());
        assert_eq!(err.to_string(), "compress_j2k comment can not be an empty string");
    }
}
