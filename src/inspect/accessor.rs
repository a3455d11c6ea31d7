//! Stored content of documents addressed by collection docid

use crate::config::FieldNames;
use crate::error::{LexdumpError, Result};
use crate::inspect::sentences::{Sentence, SentenceProjector};
use crate::inspect::{DocidResolver, IndexHandle};
use crate::segment::TermVector;

/// Reads raw text, transformed text and term vectors of documents.
///
/// A field the document does not store is reported as `NotStored`, a docid
/// the index does not know as `IdentifierNotFound`.
pub struct DocumentAccessor<'a> {
    resolver: DocidResolver<'a>,
    fields: FieldNames,
    projector: SentenceProjector,
}

impl<'a> DocumentAccessor<'a> {
    pub fn new(handle: &'a IndexHandle, fields: &FieldNames) -> Self {
        Self {
            resolver: DocidResolver::new(handle, fields),
            fields: fields.clone(),
            projector: SentenceProjector::default(),
        }
    }

    /// Replace the sentence projection (text extraction and splitting)
    pub fn with_projector(mut self, projector: SentenceProjector) -> Self {
        self.projector = projector;
        self
    }

    pub fn resolver(&self) -> &DocidResolver<'a> {
        &self.resolver
    }

    fn stored(&self, docid: &str, field: &str, what: &'static str) -> Result<String> {
        let docno = self.resolver.resolve_internal(docid)?;
        self.resolver
            .handle()
            .stored_field(docno, field)?
            .ok_or_else(|| LexdumpError::not_stored(docid, what))
    }

    /// Raw document as ingested
    pub fn get_raw(&self, docid: &str) -> Result<String> {
        self.stored(docid, &self.fields.raw, "Raw document")
    }

    /// Transformed body as indexed
    pub fn get_transformed(&self, docid: &str) -> Result<String> {
        self.stored(docid, &self.fields.body, "Transformed document")
    }

    /// Body term vector as `(term, frequency)` pairs in stored order
    pub fn get_term_vector(&self, docid: &str) -> Result<TermVector> {
        let docno = self.resolver.resolve_internal(docid)?;
        self.resolver
            .handle()
            .term_vector(docno)?
            .ok_or_else(|| LexdumpError::not_stored(docid, "Document vector"))
    }

    /// Sentences of the transformed body, or of the raw text when the body is not stored
    pub fn get_sentences(&self, docid: &str) -> Result<Vec<Sentence>> {
        self.projector.project(self, docid)
    }
}
