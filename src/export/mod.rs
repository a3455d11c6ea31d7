//! Export of index contents to files
//!
//! `codec` picks the compression of a file from its suffix; `pipeline`
//! writes docid lists and raw document tarballs through it.

pub mod codec;
pub mod pipeline;

pub use codec::{open_read, open_write, write_compressed, CompressedWriter, Compression};
pub use pipeline::{check_entry_name, docno_marker, ExportPipeline, ExportSummary};
