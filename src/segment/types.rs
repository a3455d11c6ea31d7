//! Core types for the on-disk index

use serde::{Deserialize, Serialize};
use std::fmt;

/// Dense document number within the index (0..max_doc)
///
/// Only meaningful for the snapshot it was read from; re-derive it from the
/// collection docid every time a snapshot is opened.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocNo(pub u32);

impl DocNo {
    pub fn new(n: u32) -> Self {
        Self(n)
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }

    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for DocNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single posting entry within a posting list
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    /// Dense document number
    pub docno: DocNo,
    /// Term frequency in this document
    pub term_frequency: u32,
}

impl Posting {
    pub fn new(docno: DocNo, term_frequency: u32) -> Self {
        Self {
            docno,
            term_frequency,
        }
    }
}

/// Postings per encoded block
pub const BLOCK_SIZE: usize = 128;

/// A block of postings with skip data
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PostingBlock {
    /// Document numbers (delta-encoded when serialized)
    pub docnos: Vec<DocNo>,
    /// Term frequencies
    pub term_frequencies: Vec<u32>,
    /// Maximum document number in this block (for skip data)
    pub max_docno: DocNo,
}

impl PostingBlock {
    pub fn new() -> Self {
        Self {
            docnos: Vec::with_capacity(BLOCK_SIZE),
            term_frequencies: Vec::with_capacity(BLOCK_SIZE),
            max_docno: DocNo(0),
        }
    }

    pub fn is_full(&self) -> bool {
        self.docnos.len() >= BLOCK_SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.docnos.is_empty()
    }

    pub fn len(&self) -> usize {
        self.docnos.len()
    }

    pub fn push(&mut self, posting: Posting) {
        if posting.docno > self.max_docno {
            self.max_docno = posting.docno;
        }
        self.docnos.push(posting.docno);
        self.term_frequencies.push(posting.term_frequency);
    }
}

impl Default for PostingBlock {
    fn default() -> Self {
        Self::new()
    }
}

/// Posting list metadata stored in the term dictionary
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingListMeta {
    /// Offset in the postings file
    pub offset: u64,
    /// Length in bytes
    pub length: u64,
    /// Document frequency (number of documents containing this term)
    pub doc_frequency: u32,
    /// Total term frequency across all documents
    pub total_term_frequency: u64,
}

/// How much of a field is indexed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexOption {
    /// Stored only, no term dictionary
    None,
    /// Postings carry document numbers only (frequencies are always 1)
    Docs,
    /// Postings carry document numbers and term frequencies
    DocsAndFreqs,
}

impl fmt::Display for IndexOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IndexOption::None => "NONE",
            IndexOption::Docs => "DOCS",
            IndexOption::DocsAndFreqs => "DOCS_AND_FREQS",
        };
        f.write_str(name)
    }
}

/// Type of a docvalues column
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKind {
    Keyword,
    Numeric,
}
