//! Immutable single-segment on-disk index
//!
//! # Architecture
//!
//! - `IndexStore`: reads and writes the directory layout, checks checksums
//! - `IndexReader`: decoded, read-only view over one snapshot
//! - `TermDictionary` + `PostingsReader`: FST terms and block postings per field
//! - `BlobLogReader`: checksummed stored fields and term vectors
//! - `DocValuesReader`: per-document sort keys
//! - `IndexWriter`: lays out a segment from buffered documents (fixtures)

mod types;
mod statistics;
mod postings;
mod term_dict;
mod docvalues;
mod live_docs;
mod stored;
mod manifest;
mod reader;
mod writer;
mod store;

pub use types::*;
pub use statistics::*;
pub use postings::*;
pub use term_dict::*;
pub use docvalues::*;
pub use live_docs::*;
pub use stored::*;
pub use manifest::*;
pub use reader::*;
pub use writer::*;
pub use store::{expected_files, field_file, IndexStore, SegmentFiles, META_FILE};
