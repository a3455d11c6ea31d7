//! Fixture indexes for tests and benchmarks

use std::io;
use std::path::Path;

use crate::config::{AnalyzerConfig, FieldNames};
use crate::segment::{IndexMeta, IndexStore, IndexWriter, NewDocument};

/// Description of one fixture document
#[derive(Clone, Debug, Default)]
pub struct FixtureDoc {
    doc: NewDocument,
    deleted: bool,
}

impl FixtureDoc {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            doc: NewDocument::new(id),
            deleted: false,
        }
    }

    /// Index and store the transformed body
    pub fn contents(mut self, text: impl Into<String>) -> Self {
        self.doc = self.doc.with_stored_contents(text);
        self
    }

    /// Index the body without storing it
    pub fn indexed(mut self, text: impl Into<String>) -> Self {
        self.doc = self.doc.with_contents(text);
        self
    }

    pub fn raw(mut self, raw: impl Into<String>) -> Self {
        self.doc = self.doc.with_raw(raw);
        self
    }

    /// Record a term vector for the body
    pub fn vector(mut self) -> Self {
        self.doc = self.doc.with_term_vector();
        self
    }

    pub fn tweet_id(mut self, id: i64) -> Self {
        self.doc = self.doc.with_id_long(id);
        self
    }

    /// Delete the document before the index is sealed
    pub fn deleted(mut self) -> Self {
        self.deleted = true;
        self
    }
}

/// Write an index of `docs` to `dir` with default field names and analyzer
pub fn build_fixture_index(dir: &Path, docs: &[FixtureDoc]) -> io::Result<IndexMeta> {
    build_fixture_index_with(dir, docs, &FieldNames::default(), &AnalyzerConfig::default())
}

/// Write an index of `docs` to `dir`
pub fn build_fixture_index_with(
    dir: &Path,
    docs: &[FixtureDoc],
    fields: &FieldNames,
    analyzer: &AnalyzerConfig,
) -> io::Result<IndexMeta> {
    let mut writer = IndexWriter::new(fields.clone(), analyzer);
    for fixture in docs {
        let docno = writer.add_document(fixture.doc.clone());
        if fixture.deleted {
            writer.delete(docno);
        }
    }

    let files = writer.build()?;
    IndexStore::new(dir).write(&files)?;
    Ok(files.meta().clone())
}

/// `count` documents with ids `doc-000000`.., each with a small body and raw text
pub fn synthetic_corpus(count: usize) -> Vec<FixtureDoc> {
    const WORDS: [&str; 8] = [
        "index", "segment", "posting", "term", "query", "document", "search", "archive",
    ];

    (0..count)
        .map(|i| {
            let body: Vec<&str> = (0..12).map(|j| WORDS[(i * 7 + j * 3) % WORDS.len()]).collect();
            let body = body.join(" ");
            FixtureDoc::new(format!("doc-{:06}", i))
                .raw(format!("<html><body><p>{}</p></body></html>", body))
                .contents(body)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_build_fixture_index() {
        let dir = TempDir::new().unwrap();
        let meta = build_fixture_index(
            dir.path(),
            &[FixtureDoc::new("a").contents("x"), FixtureDoc::new("b").deleted()],
        )
        .unwrap();

        assert_eq!(meta.max_doc, 2);
        assert!(dir.path().join(crate::segment::META_FILE).exists());
    }

    #[test]
    fn test_synthetic_corpus_ids_sorted() {
        let docs = synthetic_corpus(3);
        let ids: Vec<&str> = docs.iter().map(|d| d.doc.id.as_str()).collect();
        assert_eq!(ids, vec!["doc-000000", "doc-000001", "doc-000002"]);
    }
}
