//! Block-encoded postings
//!
//! Each posting list is a block count, a skip table of `(max_docno, offset)`
//! pairs, then fixed-size blocks of bitpacked docno deltas and term
//! frequencies. Postings are in ascending docno order.

use std::io;

use super::types::{DocNo, Posting, PostingBlock, PostingListMeta, BLOCK_SIZE};

/// Variable-byte encoding for integers
pub fn encode_vbyte(value: u32, output: &mut Vec<u8>) {
    let mut v = value;
    loop {
        let byte = (v & 0x7F) as u8;
        v >>= 7;
        if v == 0 {
            output.push(byte | 0x80); // high bit marks the last byte
            break;
        } else {
            output.push(byte);
        }
    }
}

/// Decode a variable-byte encoded integer
pub fn decode_vbyte(input: &[u8], pos: &mut usize) -> io::Result<u32> {
    let mut result: u32 = 0;
    let mut shift = 0;

    loop {
        let byte = *input.get(*pos).ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "Unexpected end of vbyte")
        })?;
        *pos += 1;

        result |= ((byte & 0x7F) as u32) << shift;

        if byte & 0x80 != 0 {
            return Ok(result);
        }

        shift += 7;
        if shift > 28 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "VByte value too large",
            ));
        }
    }
}

/// Bitpack a block of integers using the width of the largest value
pub fn bitpack_encode(values: &[u32], output: &mut Vec<u8>) {
    let max_val = values.iter().copied().max().unwrap_or(0);
    if values.is_empty() {
        output.push(0);
        return;
    }

    let bits_needed = if max_val == 0 {
        1
    } else {
        32 - max_val.leading_zeros()
    } as u8;

    output.push(bits_needed);

    let mut current: u64 = 0;
    let mut bits_in_current = 0;

    for &value in values {
        current |= (value as u64) << bits_in_current;
        bits_in_current += bits_needed as u32;

        while bits_in_current >= 8 {
            output.push(current as u8);
            current >>= 8;
            bits_in_current -= 8;
        }
    }

    if bits_in_current > 0 {
        output.push(current as u8);
    }
}

/// Decode `count` bitpacked integers
pub fn bitpack_decode(input: &[u8], pos: &mut usize, count: usize) -> io::Result<Vec<u32>> {
    let bits_needed = *input.get(*pos).ok_or_else(|| {
        io::Error::new(io::ErrorKind::UnexpectedEof, "Unexpected end of bitpack")
    })? as u32;
    *pos += 1;

    if bits_needed == 0 {
        return Ok(vec![0; count]);
    }
    if bits_needed > 32 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Invalid bitpack width {}", bits_needed),
        ));
    }

    let total_bits = count as u64 * bits_needed as u64;
    let bytes_needed = ((total_bits + 7) / 8) as usize;
    if *pos + bytes_needed > input.len() {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "Not enough bytes for bitpack",
        ));
    }

    let mut values = Vec::with_capacity(count);
    let mut current: u64 = 0;
    let mut bits_available = 0;
    let mask = (1u64 << bits_needed) - 1;

    for _ in 0..count {
        while bits_available < bits_needed {
            current |= (input[*pos] as u64) << bits_available;
            *pos += 1;
            bits_available += 8;
        }

        values.push((current & mask) as u32);
        current >>= bits_needed;
        bits_available -= bits_needed;
    }

    Ok(values)
}

/// Skip data for one block
#[derive(Clone, Debug, Default)]
pub struct SkipEntry {
    /// Maximum docno in this block
    pub max_docno: DocNo,
    /// Offset of the block relative to the first block
    pub block_offset: u64,
}

/// Writer for posting lists
pub struct PostingsWriter {
    block_data: Vec<u8>,
    skip_entries: Vec<SkipEntry>,
    current_block: PostingBlock,
    doc_frequency: u32,
    total_term_frequency: u64,
    data: Vec<u8>,
}

impl PostingsWriter {
    pub fn new() -> Self {
        Self {
            block_data: Vec::new(),
            skip_entries: Vec::new(),
            current_block: PostingBlock::new(),
            doc_frequency: 0,
            total_term_frequency: 0,
            data: Vec::new(),
        }
    }

    /// Start writing a new posting list
    pub fn start_posting_list(&mut self) {
        self.block_data.clear();
        self.skip_entries.clear();
        self.current_block = PostingBlock::new();
        self.doc_frequency = 0;
        self.total_term_frequency = 0;
    }

    /// Add a posting to the current list; docnos must ascend
    pub fn add_posting(&mut self, posting: Posting) {
        self.doc_frequency += 1;
        self.total_term_frequency += posting.term_frequency as u64;
        self.current_block.push(posting);

        if self.current_block.is_full() {
            self.flush_block();
        }
    }

    /// Finish the current posting list and return its metadata
    pub fn finish_posting_list(&mut self) -> PostingListMeta {
        if !self.current_block.is_empty() {
            self.flush_block();
        }

        let offset = self.data.len() as u64;

        encode_vbyte(self.skip_entries.len() as u32, &mut self.data);
        for skip in &self.skip_entries {
            encode_vbyte(skip.max_docno.0, &mut self.data);
            self.data.extend_from_slice(&skip.block_offset.to_le_bytes());
        }
        self.data.extend_from_slice(&self.block_data);

        PostingListMeta {
            offset,
            length: self.data.len() as u64 - offset,
            doc_frequency: self.doc_frequency,
            total_term_frequency: self.total_term_frequency,
        }
    }

    /// Take the data (consuming the writer)
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    fn flush_block(&mut self) {
        if self.current_block.is_empty() {
            return;
        }

        self.skip_entries.push(SkipEntry {
            max_docno: self.current_block.max_docno,
            block_offset: self.block_data.len() as u64,
        });

        encode_vbyte(self.current_block.len() as u32, &mut self.block_data);

        // Deltas are relative to the previous block's last docno
        let mut prev = self
            .skip_entries
            .len()
            .checked_sub(2)
            .map(|i| self.skip_entries[i].max_docno.0)
            .unwrap_or(0);
        let mut deltas = Vec::with_capacity(self.current_block.len());
        for docno in &self.current_block.docnos {
            deltas.push(docno.0 - prev);
            prev = docno.0;
        }
        bitpack_encode(&deltas, &mut self.block_data);
        bitpack_encode(&self.current_block.term_frequencies, &mut self.block_data);

        self.current_block = PostingBlock::new();
    }
}

impl Default for PostingsWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Reader over the postings file
pub struct PostingsReader {
    data: Vec<u8>,
}

impl PostingsReader {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Get a fresh iterator over the postings for a term
    pub fn get_postings(&self, meta: &PostingListMeta) -> io::Result<PostingIterator<'_>> {
        let start = meta.offset as usize;
        let end = meta
            .offset
            .checked_add(meta.length)
            .map(|e| e as usize)
            .filter(|&e| e <= self.data.len())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    "Posting list extends beyond data",
                )
            })?;

        PostingIterator::new(&self.data[start..end])
    }

    /// Decode every block of a posting list and check it against its metadata
    pub fn validate(&self, meta: &PostingListMeta) -> io::Result<()> {
        let mut iter = self.get_postings(meta)?;
        let mut doc_frequency = 0u64;
        let mut total_term_frequency = 0u64;
        let mut previous: Option<DocNo> = None;

        while iter.load_next_block()? {
            for &(docno, tf) in &iter.current_block {
                if previous.map_or(false, |p| docno <= p) {
                    return Err(invalid_postings(format!(
                        "docno {} out of order",
                        docno.as_u32()
                    )));
                }
                previous = Some(docno);
                doc_frequency += 1;
                total_term_frequency += tf as u64;
            }
        }

        if doc_frequency != meta.doc_frequency as u64
            || total_term_frequency != meta.total_term_frequency
        {
            return Err(invalid_postings(format!(
                "decoded df {} / cf {}, metadata says df {} / cf {}",
                doc_frequency, total_term_frequency, meta.doc_frequency, meta.total_term_frequency
            )));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

fn invalid_postings(reason: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, format!("Invalid posting list: {}", reason))
}

/// Iterator over one posting list, decoding a block at a time.
///
/// Lists of an opened index were fully decoded by
/// [`PostingsReader::validate`], so iteration itself cannot fail.
pub struct PostingIterator<'a> {
    data: &'a [u8],
    pos: usize,
    block_count: usize,
    skip_entries: Vec<SkipEntry>,
    current_block_idx: usize,
    current_block: Vec<(DocNo, u32)>,
    block_pos: usize,
    last_docno: u32,
}

impl<'a> PostingIterator<'a> {
    /// Parse the skip table of a posting list
    pub fn new(data: &'a [u8]) -> io::Result<Self> {
        let mut pos = 0;
        let block_count = decode_vbyte(data, &mut pos)? as usize;

        let mut skip_entries = Vec::with_capacity(block_count);
        for _ in 0..block_count {
            let max_docno = decode_vbyte(data, &mut pos)?;
            let bytes: [u8; 8] = data
                .get(pos..pos + 8)
                .and_then(|b| b.try_into().ok())
                .ok_or_else(|| {
                    io::Error::new(io::ErrorKind::UnexpectedEof, "Truncated skip entry")
                })?;
            pos += 8;

            skip_entries.push(SkipEntry {
                max_docno: DocNo(max_docno),
                block_offset: u64::from_le_bytes(bytes),
            });
        }

        Ok(Self {
            data,
            pos,
            block_count,
            skip_entries,
            current_block_idx: 0,
            current_block: Vec::new(),
            block_pos: 0,
            last_docno: 0,
        })
    }

    /// An iterator over nothing, used for terms missing from the dictionary
    pub fn empty() -> Self {
        Self {
            data: &[],
            pos: 0,
            block_count: 0,
            skip_entries: Vec::new(),
            current_block_idx: 0,
            current_block: Vec::new(),
            block_pos: 0,
            last_docno: 0,
        }
    }

    /// Number of encoded blocks in this list
    pub fn block_count(&self) -> usize {
        self.block_count
    }

    fn load_next_block(&mut self) -> io::Result<bool> {
        if self.current_block_idx >= self.block_count {
            return Ok(false);
        }

        let count = decode_vbyte(self.data, &mut self.pos)? as usize;
        if count > BLOCK_SIZE {
            return Err(invalid_postings(format!("block of {} postings", count)));
        }
        let deltas = bitpack_decode(self.data, &mut self.pos, count)?;
        let tfs = bitpack_decode(self.data, &mut self.pos, count)?;

        self.current_block.clear();
        let mut docno = self.last_docno;
        for (delta, tf) in deltas.into_iter().zip(tfs) {
            docno = docno
                .checked_add(delta)
                .ok_or_else(|| invalid_postings("docno overflow".to_string()))?;
            self.current_block.push((DocNo(docno), tf));
        }

        self.last_docno = self.skip_entries[self.current_block_idx].max_docno.0;
        self.block_pos = 0;
        self.current_block_idx += 1;
        Ok(!self.current_block.is_empty())
    }
}

impl<'a> Iterator for PostingIterator<'a> {
    type Item = (DocNo, u32);

    fn next(&mut self) -> Option<Self::Item> {
        if self.block_pos >= self.current_block.len() {
            match self.load_next_block() {
                Ok(true) => {}
                Ok(false) => return None,
                Err(e) => {
                    tracing::error!("Stopping at undecodable postings block: {}", e);
                    self.current_block_idx = self.block_count;
                    return None;
                }
            }
        }

        let result = self.current_block.get(self.block_pos).copied();
        self.block_pos += 1;
        result
    }
}
