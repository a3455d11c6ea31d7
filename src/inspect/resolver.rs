//! Mapping between collection docids and internal docnos
//!
//! Docnos are only valid for the handle they were resolved against; resolve
//! again after reopening an index.

use crate::config::FieldNames;
use crate::error::{LexdumpError, Result};
use crate::inspect::IndexHandle;
use crate::segment::DocNo;

/// Resolves docids through the identifier field of an index
pub struct DocidResolver<'a> {
    handle: &'a IndexHandle,
    id_field: String,
}

impl<'a> DocidResolver<'a> {
    pub fn new(handle: &'a IndexHandle, fields: &FieldNames) -> Self {
        Self {
            handle,
            id_field: fields.id.clone(),
        }
    }

    pub fn handle(&self) -> &'a IndexHandle {
        self.handle
    }

    /// Docno of the first live document whose identifier is `docid`
    pub fn resolve_internal(&self, docid: &str) -> Result<DocNo> {
        let docno = self
            .handle
            .postings(&self.id_field, docid)?
            .map(|(docno, _)| docno)
            .find(|&docno| self.handle.is_live(docno))
            .ok_or_else(|| LexdumpError::IdentifierNotFound(docid.to_string()))?;

        tracing::debug!(docid, docno = docno.as_u32(), "Resolved docid");
        Ok(docno)
    }

    /// Identifier stored for a live docno
    pub fn resolve_external(&self, docno: DocNo) -> Result<String> {
        if !self.handle.is_live(docno) {
            return Err(LexdumpError::invalid_ordinal(docno, self.handle.max_doc()));
        }

        self.handle
            .stored_field(docno, &self.id_field)?
            .ok_or_else(|| {
                LexdumpError::CorruptIndex(format!(
                    "Live document {} has no stored {} field",
                    docno, self.id_field
                ))
            })
    }

    /// Resolve several docids, keeping each outcome in input order
    pub fn resolve_many<I, S>(&self, docids: I) -> Vec<Result<DocNo>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        docids
            .into_iter()
            .map(|docid| self.resolve_internal(docid.as_ref()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{build_fixture_index, FixtureDoc};
    use tempfile::TempDir;

    fn open(docs: &[FixtureDoc]) -> (TempDir, IndexHandle) {
        let dir = TempDir::new().unwrap();
        build_fixture_index(dir.path(), docs).unwrap();
        let handle = IndexHandle::open(dir.path()).unwrap();
        (dir, handle)
    }

    #[test]
    fn test_round_trip() {
        let (_dir, handle) = open(&[
            FixtureDoc::new("LA010189-0001"),
            FixtureDoc::new("LA010189-0002"),
            FixtureDoc::new("LA010189-0003"),
        ]);
        let resolver = DocidResolver::new(&handle, &FieldNames::default());

        for docid in ["LA010189-0001", "LA010189-0002", "LA010189-0003"] {
            let docno = resolver.resolve_internal(docid).unwrap();
            assert_eq!(resolver.resolve_external(docno).unwrap(), docid);
        }
    }

    #[test]
    fn test_unknown_docid() {
        let (_dir, handle) = open(&[FixtureDoc::new("a")]);
        let resolver = DocidResolver::new(&handle, &FieldNames::default());

        let err = resolver.resolve_internal("zzz").unwrap_err();
        assert!(matches!(err, LexdumpError::IdentifierNotFound(ref id) if id == "zzz"));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_deleted_and_out_of_range_docnos() {
        let (_dir, handle) = open(&[FixtureDoc::new("a").deleted(), FixtureDoc::new("b")]);
        let resolver = DocidResolver::new(&handle, &FieldNames::default());

        assert!(matches!(
            resolver.resolve_internal("a"),
            Err(LexdumpError::IdentifierNotFound(_))
        ));
        assert_eq!(resolver.resolve_internal("b").unwrap(), DocNo(1));
        assert!(matches!(
            resolver.resolve_external(DocNo(0)),
            Err(LexdumpError::InvalidOrdinal { docno: 0, max_doc: 2 })
        ));
        assert!(matches!(
            resolver.resolve_external(DocNo(7)),
            Err(LexdumpError::InvalidOrdinal { docno: 7, .. })
        ));
    }

    #[test]
    fn test_resolve_many_keeps_order() {
        let (_dir, handle) = open(&[FixtureDoc::new("x"), FixtureDoc::new("y")]);
        let resolver = DocidResolver::new(&handle, &FieldNames::default());

        let results = resolver.resolve_many(["y", "missing", "x"]);
        assert_eq!(results.len(), 3);
        assert_eq!(*results[0].as_ref().unwrap(), DocNo(1));
        assert!(results[1].is_err());
        assert_eq!(*results[2].as_ref().unwrap(), DocNo(0));
    }
}
