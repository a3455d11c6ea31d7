//! Collection statistics and postings of a single analyzed term

use std::fmt;

use crate::config::{AnalyzerConfig, FieldNames};
use crate::error::{LexdumpError, Result};
use crate::inspect::IndexHandle;
use crate::query::parse_term_query;
use crate::segment::{DocNo, PostingIterator};
use crate::tokenizer::Analyzer;

/// Statistics of one term in the body field
///
/// Postings are produced lazily in ascending docno order and can be consumed
/// once; look the term up again to restart them.
pub struct TermRecord<'a> {
    /// Text as given by the caller
    pub surface: String,
    /// Analyzed form looked up in the index
    pub normalized: String,
    /// Occurrences over the whole collection
    pub collection_frequency: u64,
    /// Documents containing the term
    pub document_frequency: u32,
    postings: PostingIterator<'a>,
}

impl<'a> TermRecord<'a> {
    /// Consume the record into its `(docno, term_frequency)` postings
    pub fn into_postings(self) -> PostingIterator<'a> {
        self.postings
    }

    /// Mutable access to the postings without consuming the record
    pub fn postings(&mut self) -> &mut PostingIterator<'a> {
        &mut self.postings
    }
}

impl fmt::Debug for TermRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TermRecord")
            .field("surface", &self.surface)
            .field("normalized", &self.normalized)
            .field("collection_frequency", &self.collection_frequency)
            .field("document_frequency", &self.document_frequency)
            .finish()
    }
}

impl fmt::Display for TermRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "raw term:             {}", self.surface)?;
        writeln!(f, "stemmed term:         {}", self.normalized)?;
        writeln!(f, "collection frequency: {}", self.collection_frequency)?;
        write!(f, "document frequency:   {}", self.document_frequency)
    }
}

/// Looks up analyzed terms in the body field
pub struct TermStatsReader<'a> {
    handle: &'a IndexHandle,
    analyzer: Analyzer,
    body_field: String,
}

impl<'a> TermStatsReader<'a> {
    pub fn new(handle: &'a IndexHandle, fields: &FieldNames, analyzer: &AnalyzerConfig) -> Self {
        Self {
            handle,
            analyzer: Analyzer::new(analyzer),
            body_field: fields.body.clone(),
        }
    }

    /// Normalize `raw_term` to exactly one analyzed term
    pub fn normalize(&self, raw_term: &str) -> Result<String> {
        let parsed = parse_term_query(raw_term)?;
        if let Some(field) = &parsed.field {
            if field != &self.body_field {
                tracing::debug!(field = %field, "Term qualified with a field other than the body");
                return Err(LexdumpError::AmbiguousOrEmptyTerm(raw_term.to_string()));
            }
        }

        let mut tokens = self.analyzer.analyze(&parsed.text);
        match tokens.len() {
            1 => Ok(tokens.remove(0)),
            _ => Err(LexdumpError::AmbiguousOrEmptyTerm(raw_term.to_string())),
        }
    }

    /// Statistics and postings for `raw_term`; unknown terms have zero counts
    pub fn lookup(&self, raw_term: &str) -> Result<TermRecord<'a>> {
        let normalized = self.normalize(raw_term)?;
        let (collection_frequency, document_frequency) = self
            .handle
            .term_meta(&self.body_field, &normalized)
            .map(|m| (m.total_term_frequency, m.doc_frequency))
            .unwrap_or((0, 0));
        let postings = self.handle.postings(&self.body_field, &normalized)?;

        tracing::debug!(
            term = raw_term,
            normalized = %normalized,
            df = document_frequency,
            cf = collection_frequency,
            "Looked up term"
        );

        Ok(TermRecord {
            surface: raw_term.to_string(),
            normalized,
            collection_frequency,
            document_frequency,
            postings,
        })
    }

    /// Postings of `raw_term` collected into a vector
    pub fn postings(&self, raw_term: &str) -> Result<Vec<(DocNo, u32)>> {
        Ok(self.lookup(raw_term)?.into_postings().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{build_fixture_index, FixtureDoc};
    use tempfile::TempDir;

    fn fixture() -> (TempDir, IndexHandle) {
        let dir = TempDir::new().unwrap();
        build_fixture_index(
            dir.path(),
            &[
                FixtureDoc::new("d1").contents("Cities and city dwellers"),
                FixtureDoc::new("d2").contents("a quiet village"),
                FixtureDoc::new("d3").contents("city"),
            ],
        )
        .unwrap();
        let handle = IndexHandle::open(dir.path()).unwrap();
        (dir, handle)
    }

    #[test]
    fn test_lookup_counts_and_postings() {
        let (_dir, handle) = fixture();
        let reader = TermStatsReader::new(&handle, &FieldNames::default(), &AnalyzerConfig::default());

        let record = reader.lookup("City").unwrap();
        assert_eq!(record.normalized, "citi");
        assert_eq!(record.collection_frequency, 3);
        assert_eq!(record.document_frequency, 2);
        let postings: Vec<(DocNo, u32)> = record.into_postings().collect();
        assert_eq!(postings, vec![(DocNo(0), 2), (DocNo(2), 1)]);

        assert_eq!(reader.postings("contents:city").unwrap().len(), 2);
    }

    #[test]
    fn test_absent_term_is_not_an_error() {
        let (_dir, handle) = fixture();
        let reader = TermStatsReader::new(&handle, &FieldNames::default(), &AnalyzerConfig::default());

        let record = reader.lookup("zebra").unwrap();
        assert_eq!(record.collection_frequency, 0);
        assert_eq!(record.document_frequency, 0);
        assert_eq!(record.into_postings().count(), 0);
    }

    #[test]
    fn test_rejects_ambiguous_terms() {
        let (_dir, handle) = fixture();
        let reader = TermStatsReader::new(&handle, &FieldNames::default(), &AnalyzerConfig::default());

        for raw in ["", "city AND village", "\"quiet village\"", "e-mail", "raw:city", "..."] {
            assert!(
                matches!(reader.lookup(raw), Err(LexdumpError::AmbiguousOrEmptyTerm(_))),
                "{raw:?} should be rejected"
            );
        }
    }
}
