//! Read-only handle to an index directory
//!
//! All segment files are loaded and validated at open. Every other operation
//! in the crate reaches the index through this handle.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{LexdumpError, Result};
use crate::query::DocOrder;
use crate::segment::{
    DocNo, FieldInfo, IndexOption, IndexReader, IndexStore, PostingIterator, PostingListMeta,
    TermVector, ValueKind,
};

fn corrupt(e: io::Error) -> LexdumpError {
    LexdumpError::CorruptIndex(e.to_string())
}

/// Summary of an index and one of its indexed fields
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexStats {
    /// Live documents
    pub documents: u32,
    /// Live documents with at least one term in the body field
    pub non_empty_documents: u32,
    /// Distinct terms of the body field
    pub unique_terms: u64,
    /// Term occurrences in the body field
    pub total_terms: u64,
    pub fields: Vec<FieldInfo>,
}

impl fmt::Display for IndexStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Index statistics")?;
        writeln!(f, "----------------")?;
        writeln!(f, "documents:             {}", self.documents)?;
        writeln!(f, "documents (non-empty): {}", self.non_empty_documents)?;
        writeln!(f, "unique terms:          {}", self.unique_terms)?;
        writeln!(f, "total terms:           {}", self.total_terms)?;
        writeln!(f, "stored fields:")?;
        for field in &self.fields {
            write!(
                f,
                "  {} (indexOption: {}, hasVectors: {}",
                field.name, field.index_option, field.has_vectors
            )?;
            if let Some(kind) = field.doc_values {
                write!(f, ", docValues: {:?}", kind)?;
            }
            writeln!(f, ")")?;
        }
        Ok(())
    }
}

/// Open index snapshot
///
/// Immutable after open; share it behind an `Arc` to use it from several
/// threads.
#[derive(Debug)]
pub struct IndexHandle {
    path: PathBuf,
    reader: IndexReader,
}

impl IndexHandle {
    /// Open the index stored in `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let reader = IndexStore::new(&path).open_reader()?;
        tracing::info!(
            path = %path.display(),
            documents = reader.num_docs(),
            max_doc = reader.max_doc(),
            "Opened index"
        );
        Ok(Self { path, reader })
    }

    /// Release the index. Dropping the handle has the same effect.
    pub fn close(self) {
        tracing::debug!(path = %self.path.display(), "Closed index");
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn reader(&self) -> &IndexReader {
        &self.reader
    }

    /// Number of live documents
    pub fn num_docs(&self) -> u32 {
        self.reader.num_docs()
    }

    /// Number of docnos, deleted ones included
    pub fn max_doc(&self) -> u32 {
        self.reader.max_doc()
    }

    pub fn is_live(&self, docno: DocNo) -> bool {
        self.reader.live_docs().is_live(docno)
    }

    pub fn field_info(&self, name: &str) -> Option<&FieldInfo> {
        self.reader.field_info(name)
    }

    /// Kind of docvalues column stored under `field`, if any
    pub fn doc_values_kind(&self, field: &str) -> Option<ValueKind> {
        self.reader.docvalues().kind_of(field)
    }

    /// Term dictionary entry for `term` in `field`
    pub fn term_meta(&self, field: &str, term: &str) -> Option<&PostingListMeta> {
        self.reader.term_meta(field, term)
    }

    /// Fresh postings iterator in ascending docno order; empty for unknown terms
    pub fn postings(&self, field: &str, term: &str) -> Result<PostingIterator<'_>> {
        self.reader.postings(field, term).map_err(corrupt)
    }

    /// Stored value of `field`, `None` when the document does not store it
    pub fn stored_field(&self, docno: DocNo, field: &str) -> Result<Option<String>> {
        self.reader.stored_field(docno, field).map_err(corrupt)
    }

    /// Body term vector, `None` when the document has none
    pub fn term_vector(&self, docno: DocNo) -> Result<Option<TermVector>> {
        self.reader.term_vector(docno).map_err(corrupt)
    }

    /// Live docnos in `order`, at most `limit` of them
    pub fn sorted_docs(&self, order: &DocOrder, limit: Option<usize>) -> Result<Vec<DocNo>> {
        order.sort_docs(&self.reader, limit)
    }

    /// Statistics over the whole index, with term counts taken from `body_field`
    pub fn stats(&self, body_field: &str) -> IndexStats {
        let (non_empty_documents, unique_terms, total_terms) = match self.reader.field_index(body_field) {
            Some(field) => (
                field.stats().doc_count(),
                field.terms().len() as u64,
                field.terms().sum_total_term_frequency(),
            ),
            None => (0, 0, 0),
        };

        IndexStats {
            documents: self.num_docs(),
            non_empty_documents,
            unique_terms,
            total_terms,
            fields: self.reader.meta().fields.clone(),
        }
    }

    /// Whether `field` carries term frequencies
    pub fn has_frequencies(&self, field: &str) -> bool {
        self.field_info(field)
            .map_or(false, |f| f.index_option == IndexOption::DocsAndFreqs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldNames;
    use crate::testing::{build_fixture_index, FixtureDoc};
    use tempfile::TempDir;

    #[test]
    fn test_open_and_stats() {
        let dir = TempDir::new().unwrap();
        build_fixture_index(
            dir.path(),
            &[
                FixtureDoc::new("d1").contents("the city of lights").raw("<p>the city of lights</p>"),
                FixtureDoc::new("d2").contents("city city"),
                FixtureDoc::new("d3"),
            ],
        )
        .unwrap();

        let handle = IndexHandle::open(dir.path()).unwrap();
        assert_eq!(handle.num_docs(), 3);
        assert_eq!(handle.max_doc(), 3);
        assert!(handle.has_frequencies("contents"));
        assert!(!handle.has_frequencies("raw"));

        let stats = handle.stats(&FieldNames::default().body);
        assert_eq!(stats.documents, 3);
        assert_eq!(stats.non_empty_documents, 2);
        assert_eq!(stats.unique_terms, 4);
        assert_eq!(stats.total_terms, 6);

        let printed = stats.to_string();
        assert!(printed.contains("contents (indexOption: DOCS_AND_FREQS, hasVectors: false)"));
        assert!(printed.contains("documents (non-empty): 2"));

        handle.close();
    }

    #[test]
    fn test_unknown_field_stats_are_zero() {
        let dir = TempDir::new().unwrap();
        build_fixture_index(dir.path(), &[FixtureDoc::new("d1").contents("x")]).unwrap();
        let handle = IndexHandle::open(dir.path()).unwrap();

        let stats = handle.stats("nope");
        assert_eq!(stats.unique_terms, 0);
        assert_eq!(stats.non_empty_documents, 0);
        assert_eq!(handle.doc_values_kind("id"), Some(ValueKind::Keyword));
        assert_eq!(handle.doc_values_kind("id_long"), None);
    }

    #[test]
    fn test_open_missing_index() {
        let dir = TempDir::new().unwrap();
        let err = IndexHandle::open(dir.path().join("none")).unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(err, LexdumpError::Open { .. }));
    }
}
