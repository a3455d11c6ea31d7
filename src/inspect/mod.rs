//! Read-only inspection of an index
//!
//! - `IndexHandle`: opens the index and owns the loaded segment
//! - `DocidResolver`: docid <-> docno
//! - `TermStatsReader`: analyzed term statistics and postings
//! - `DocumentAccessor`: raw text, transformed text, term vectors, sentences

pub mod accessor;
pub mod handle;
pub mod resolver;
pub mod sentences;
pub mod term_stats;

pub use accessor::DocumentAccessor;
pub use handle::{IndexHandle, IndexStats};
pub use resolver::DocidResolver;
pub use sentences::{
    HtmlTextExtractor, Sentence, SentenceProjector, SentenceSplitter, TextExtractor,
    UnicodeSentenceSplitter,
};
pub use term_stats::{TermRecord, TermStatsReader};
