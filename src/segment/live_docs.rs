//! Live document tracking
//!
//! Docnos are dense in `[0..max_doc)`. Documents deleted before the snapshot
//! was sealed keep their docno but are absent from postings and from every
//! enumeration.

use std::io;

use roaring::RoaringBitmap;

use super::postings::{decode_vbyte, encode_vbyte};
use super::types::DocNo;

/// Deleted-docs bitmap over a dense docno space
#[derive(Clone, Debug, Default)]
pub struct LiveDocs {
    max_doc: u32,
    deleted: RoaringBitmap,
}

impl LiveDocs {
    pub fn new(max_doc: u32) -> Self {
        Self {
            max_doc,
            deleted: RoaringBitmap::new(),
        }
    }

    /// Mark a docno as deleted
    pub fn delete(&mut self, docno: DocNo) {
        if docno.as_u32() < self.max_doc {
            self.deleted.insert(docno.as_u32());
        }
    }

    pub fn is_deleted(&self, docno: DocNo) -> bool {
        self.deleted.contains(docno.as_u32())
    }

    /// Check if a docno exists and is not deleted
    pub fn is_live(&self, docno: DocNo) -> bool {
        docno.as_u32() < self.max_doc && !self.deleted.contains(docno.as_u32())
    }

    /// Number of docnos allocated, deleted ones included
    pub fn max_doc(&self) -> u32 {
        self.max_doc
    }

    /// Number of live documents
    pub fn num_docs(&self) -> u32 {
        self.max_doc - self.deleted.len() as u32
    }

    pub fn deleted_count(&self) -> u32 {
        self.deleted.len() as u32
    }

    /// Iterate over live docnos in ascending order
    pub fn iter(&self) -> impl Iterator<Item = DocNo> + '_ {
        (0..self.max_doc)
            .filter(move |d| !self.deleted.contains(*d))
            .map(DocNo::new)
    }

    pub fn serialize(&self) -> io::Result<Vec<u8>> {
        let mut output = Vec::new();
        encode_vbyte(self.max_doc, &mut output);
        self.deleted.serialize_into(&mut output)?;
        Ok(output)
    }

    pub fn deserialize(data: &[u8]) -> io::Result<Self> {
        let mut pos = 0;
        let max_doc = decode_vbyte(data, &mut pos)?;
        let deleted = RoaringBitmap::deserialize_from(&data[pos..])?;

        if deleted.max().map_or(false, |m| m >= max_doc) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Deleted docno beyond max_doc",
            ));
        }

        Ok(Self { max_doc, deleted })
    }
}
