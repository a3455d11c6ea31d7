//! Checksummed blob log for stored fields and term vectors
//!
//! Record format:
//! - u32 length (little endian)
//! - u32 crc32 of payload
//! - raw payload bytes
//!
//! A pointer table (bincode) maps each docno to its record, or to nothing
//! when the document has no payload of that kind.

use std::collections::BTreeMap;
use std::io;

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

use super::types::DocNo;

/// Pointer to a record inside a blob log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobPointer {
    pub offset: u64,
    pub len: u32,
    pub crc32: u32,
}

impl BlobPointer {
    pub fn new(offset: u64, len: u32, crc32: u32) -> Self {
        Self { offset, len, crc32 }
    }
}

/// Stored field values of one document
pub type StoredDocument = BTreeMap<String, String>;

/// Term vector of one document: (term, frequency) sorted by term
pub type TermVector = Vec<(String, u64)>;

const HEADER_LEN: usize = 8;

/// Append-only blob log buffered in memory until written out
#[derive(Default)]
pub struct BlobLogWriter {
    data: Vec<u8>,
    pointers: Vec<Option<BlobPointer>>,
}

impl BlobLogWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a payload for the next docno
    pub fn append(&mut self, payload: &[u8]) -> BlobPointer {
        let offset = self.data.len() as u64;
        let len = payload.len() as u32;
        let mut hasher = Hasher::new();
        hasher.update(payload);
        let crc32 = hasher.finalize();

        self.data.extend_from_slice(&len.to_le_bytes());
        self.data.extend_from_slice(&crc32.to_le_bytes());
        self.data.extend_from_slice(payload);

        let ptr = BlobPointer::new(offset, len, crc32);
        self.pointers.push(Some(ptr));
        ptr
    }

    /// Record that the next docno has no payload
    pub fn skip(&mut self) {
        self.pointers.push(None);
    }

    pub fn len(&self) -> usize {
        self.pointers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pointers.is_empty()
    }

    /// Consume into (log bytes, serialized pointer table)
    pub fn finish(self) -> io::Result<(Vec<u8>, Vec<u8>)> {
        let pointers = bincode::serialize(&self.pointers)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok((self.data, pointers))
    }
}

/// Read side of a blob log, fully loaded in memory
#[derive(Debug, Default)]
pub struct BlobLogReader {
    data: Vec<u8>,
    pointers: Vec<Option<BlobPointer>>,
}

impl BlobLogReader {
    pub fn new(data: Vec<u8>, pointer_table: &[u8]) -> io::Result<Self> {
        let pointers: Vec<Option<BlobPointer>> = bincode::deserialize(pointer_table)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        for ptr in pointers.iter().flatten() {
            let end = ptr.offset as usize + HEADER_LEN + ptr.len as usize;
            if end > data.len() {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("Blob pointer at {} past end of log", ptr.offset),
                ));
            }
        }

        Ok(Self { data, pointers })
    }

    /// Number of docnos covered by the pointer table
    pub fn len(&self) -> usize {
        self.pointers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pointers.is_empty()
    }

    /// Read the payload of a docno, validating the checksum.
    ///
    /// `Ok(None)` when the document has no record.
    pub fn read(&self, docno: DocNo) -> io::Result<Option<&[u8]>> {
        let ptr = match self.pointers.get(docno.as_usize()).copied().flatten() {
            Some(ptr) => ptr,
            None => return Ok(None),
        };

        let start = ptr.offset as usize;
        let header = &self.data[start..start + HEADER_LEN];
        let mut len_buf = [0u8; 4];
        len_buf.copy_from_slice(&header[0..4]);
        let mut crc_buf = [0u8; 4];
        crc_buf.copy_from_slice(&header[4..8]);
        let len = u32::from_le_bytes(len_buf);
        let stored_crc = u32::from_le_bytes(crc_buf);

        if len != ptr.len {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Blob length mismatch: expected {}, found {}", ptr.len, len),
            ));
        }

        let payload = &self.data[start + HEADER_LEN..start + HEADER_LEN + len as usize];
        let mut hasher = Hasher::new();
        hasher.update(payload);
        let crc = hasher.finalize();
        if crc != stored_crc || crc != ptr.crc32 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Blob checksum mismatch for docno {}", docno),
            ));
        }

        Ok(Some(payload))
    }

    /// Read and decode a bincode payload
    pub fn read_decoded<T: serde::de::DeserializeOwned>(
        &self,
        docno: DocNo,
    ) -> io::Result<Option<T>> {
        match self.read(docno)? {
            Some(bytes) => bincode::deserialize(bytes)
                .map(Some)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e)),
            None => Ok(None),
        }
    }
}
