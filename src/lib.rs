//! lexdump: read-only inspection and corpus export for inverted indexes
//!
//! Opens a single-segment index directory and answers questions about it:
//! docid <-> docno mapping, term statistics and postings, stored raw and
//! transformed documents, term vectors and sentences. Bulk exports write
//! every docid, or a tarball of raw documents, to compressed files.

pub mod config;
pub mod error;
pub mod export;
pub mod inspect;
pub mod query;
pub mod runner;
pub mod segment;
pub mod testing;
pub mod tokenizer;

pub use config::{AnalyzerConfig, ExportConfig, FieldNames, ToolConfig};
pub use error::{LexdumpError, Result};
pub use export::{Compression, ExportPipeline, ExportSummary};
pub use inspect::{DocidResolver, DocumentAccessor, IndexHandle, IndexStats, TermStatsReader};
pub use query::DocOrder;
pub use runner::OperationRunner;
pub use segment::DocNo;
pub use tokenizer::Analyzer;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
