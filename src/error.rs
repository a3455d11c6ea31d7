use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::segment::DocNo;

/// Main error type for lexdump operations
#[derive(Error, Debug)]
pub enum LexdumpError {
    #[error("Docid not found: {0}")]
    IdentifierNotFound(String),

    #[error("{what} not stored for document {docid}")]
    NotStored { docid: String, what: &'static str },

    #[error("Term does not normalize to exactly one term: {0:?}")]
    AmbiguousOrEmptyTerm(String),

    #[error("Invalid internal docid {docno}: index has {max_doc} documents")]
    InvalidOrdinal { docno: u32, max_doc: u32 },

    #[error("Cannot open index at {path}: {reason}")]
    Open { path: PathBuf, reason: String },

    #[error("Docid {docid} cannot name an archive entry: {reason}")]
    InvalidEntryName { docid: String, reason: &'static str },

    #[error("Corrupt index: {0}")]
    CorruptIndex(String),

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Query parse error: {0}")]
    QueryParseError(String),
}

/// Result type alias for lexdump operations
pub type Result<T> = std::result::Result<T, LexdumpError>;

impl LexdumpError {
    pub fn not_stored(docid: impl Into<String>, what: &'static str) -> Self {
        LexdumpError::NotStored {
            docid: docid.into(),
            what,
        }
    }

    pub fn invalid_ordinal(docno: DocNo, max_doc: u32) -> Self {
        LexdumpError::InvalidOrdinal {
            docno: docno.as_u32(),
            max_doc,
        }
    }

    /// Attach the offending path to an IO error
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        LexdumpError::Io {
            path: path.into(),
            source,
        }
    }

    /// Fatal errors mean the index itself cannot be trusted; every remaining
    /// operation of the invocation is abandoned.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            LexdumpError::Open { .. } | LexdumpError::CorruptIndex(_)
        )
    }

    /// Check if this error is the expected outcome of a sparsely stored index
    pub fn is_not_stored(&self) -> bool {
        matches!(self, LexdumpError::NotStored { .. })
    }
}

/// Extension for tagging `io::Result` values with the path they concern
pub trait IoResultExt<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| LexdumpError::io(path, e))
    }
}
