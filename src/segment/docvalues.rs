//! DocValues for columnar, per-document sort keys
//!
//! - numeric: fixed-width little-endian values + null bitmap
//! - keyword: dictionary encoded to ordinals + bitpacked ordinals + null bitmap

use std::collections::HashMap;
use std::io;

use roaring::RoaringBitmap;

use super::postings::{bitpack_decode, bitpack_encode, decode_vbyte, encode_vbyte};
use super::types::{DocNo, ValueKind};

fn read_bitmap(data: &[u8], pos: &mut usize) -> io::Result<RoaringBitmap> {
    let len = decode_vbyte(data, pos)? as usize;
    let bytes = data.get(*pos..*pos + len).ok_or_else(|| {
        io::Error::new(io::ErrorKind::UnexpectedEof, "Truncated null bitmap")
    })?;
    *pos += len;
    RoaringBitmap::deserialize_from(bytes)
}

fn write_bitmap(bitmap: &RoaringBitmap, output: &mut Vec<u8>) -> io::Result<()> {
    let mut bytes = Vec::with_capacity(bitmap.serialized_size());
    bitmap.serialize_into(&mut bytes)?;
    encode_vbyte(bytes.len() as u32, output);
    output.extend(bytes);
    Ok(())
}

/// Numeric column, one optional i64 per docno
#[derive(Clone, Debug, Default)]
pub struct NumericColumn {
    values: Vec<Option<i64>>,
    nulls: RoaringBitmap,
}

impl NumericColumn {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
            nulls: RoaringBitmap::new(),
        }
    }

    /// Add a value for the next docno
    pub fn add(&mut self, value: Option<i64>) {
        if value.is_none() {
            self.nulls.insert(self.values.len() as u32);
        }
        self.values.push(value);
    }

    /// Get value for a docno
    pub fn get(&self, docno: DocNo) -> Option<i64> {
        self.values.get(docno.as_usize()).copied().flatten()
    }

    pub fn serialize(&self) -> io::Result<Vec<u8>> {
        let mut output = Vec::with_capacity(8 * self.values.len() + 16);
        encode_vbyte(self.values.len() as u32, &mut output);
        write_bitmap(&self.nulls, &mut output)?;
        for value in &self.values {
            output.extend_from_slice(&value.unwrap_or(0).to_le_bytes());
        }
        Ok(output)
    }

    pub fn deserialize(data: &[u8]) -> io::Result<Self> {
        let mut pos = 0;
        let count = decode_vbyte(data, &mut pos)? as usize;
        let nulls = read_bitmap(data, &mut pos)?;

        let body = data.get(pos..pos + 8 * count).ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "Truncated numeric column")
        })?;

        let values = body
            .chunks_exact(8)
            .enumerate()
            .map(|(docno, chunk)| {
                let mut bytes = [0u8; 8];
                bytes.copy_from_slice(chunk);
                if nulls.contains(docno as u32) {
                    None
                } else {
                    Some(i64::from_le_bytes(bytes))
                }
            })
            .collect();

        Ok(Self { values, nulls })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Keyword column with dictionary encoding
#[derive(Clone, Debug, Default)]
pub struct KeywordColumn {
    /// Dictionary: ordinal -> keyword
    dictionary: Vec<String>,
    /// Reverse lookup: keyword -> ordinal
    keyword_to_ordinal: HashMap<String, u32>,
    /// Ordinals indexed by docno
    ordinals: Vec<Option<u32>>,
    nulls: RoaringBitmap,
}

impl KeywordColumn {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value for the next docno
    pub fn add(&mut self, value: Option<&str>) {
        let docno = self.ordinals.len() as u32;

        match value {
            Some(keyword) => {
                let ordinal = match self.keyword_to_ordinal.get(keyword) {
                    Some(&ord) => ord,
                    None => {
                        let ord = self.dictionary.len() as u32;
                        self.dictionary.push(keyword.to_string());
                        self.keyword_to_ordinal.insert(keyword.to_string(), ord);
                        ord
                    }
                };
                self.ordinals.push(Some(ordinal));
            }
            None => {
                self.nulls.insert(docno);
                self.ordinals.push(None);
            }
        }
    }

    /// Get value for a docno
    pub fn get(&self, docno: DocNo) -> Option<&str> {
        self.ordinals
            .get(docno.as_usize())
            .copied()
            .flatten()
            .and_then(|ord| self.dictionary.get(ord as usize))
            .map(|s| s.as_str())
    }

    pub fn serialize(&self) -> io::Result<Vec<u8>> {
        let mut output = Vec::new();

        encode_vbyte(self.dictionary.len() as u32, &mut output);
        for keyword in &self.dictionary {
            encode_vbyte(keyword.len() as u32, &mut output);
            output.extend(keyword.as_bytes());
        }

        encode_vbyte(self.ordinals.len() as u32, &mut output);
        write_bitmap(&self.nulls, &mut output)?;

        // 0 encodes null, actual values are ordinal + 1
        let encoded: Vec<u32> = self
            .ordinals
            .iter()
            .map(|ord| ord.map(|o| o + 1).unwrap_or(0))
            .collect();
        bitpack_encode(&encoded, &mut output);

        Ok(output)
    }

    pub fn deserialize(data: &[u8]) -> io::Result<Self> {
        let mut pos = 0;

        let dict_len = decode_vbyte(data, &mut pos)? as usize;
        let mut dictionary = Vec::with_capacity(dict_len);
        let mut keyword_to_ordinal = HashMap::with_capacity(dict_len);

        for i in 0..dict_len {
            let keyword_len = decode_vbyte(data, &mut pos)? as usize;
            let bytes = data.get(pos..pos + keyword_len).ok_or_else(|| {
                io::Error::new(io::ErrorKind::UnexpectedEof, "Truncated keyword")
            })?;
            let keyword = std::str::from_utf8(bytes)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?
                .to_string();
            pos += keyword_len;
            keyword_to_ordinal.insert(keyword.clone(), i as u32);
            dictionary.push(keyword);
        }

        let doc_count = decode_vbyte(data, &mut pos)? as usize;
        let nulls = read_bitmap(data, &mut pos)?;

        let encoded = bitpack_decode(data, &mut pos, doc_count)?;
        let ordinals = encoded
            .into_iter()
            .enumerate()
            .map(|(docno, v)| {
                if nulls.contains(docno as u32) || v == 0 || v as usize > dict_len {
                    None
                } else {
                    Some(v - 1)
                }
            })
            .collect();

        Ok(Self {
            dictionary,
            keyword_to_ordinal,
            ordinals,
            nulls,
        })
    }

    pub fn len(&self) -> usize {
        self.ordinals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordinals.is_empty()
    }
}

/// Named docvalues columns of an index
#[derive(Clone, Debug, Default)]
pub struct DocValuesReader {
    numeric_columns: HashMap<String, NumericColumn>,
    keyword_columns: HashMap<String, KeywordColumn>,
}

impl DocValuesReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_numeric(&mut self, name: String, column: NumericColumn) {
        self.numeric_columns.insert(name, column);
    }

    pub fn add_keyword(&mut self, name: String, column: KeywordColumn) {
        self.keyword_columns.insert(name, column);
    }

    pub fn get_numeric(&self, name: &str) -> Option<&NumericColumn> {
        self.numeric_columns.get(name)
    }

    pub fn get_keyword(&self, name: &str) -> Option<&KeywordColumn> {
        self.keyword_columns.get(name)
    }

    /// Report which kind of column exists under `name`, if any
    pub fn kind_of(&self, name: &str) -> Option<ValueKind> {
        if self.keyword_columns.contains_key(name) {
            Some(ValueKind::Keyword)
        } else if self.numeric_columns.contains_key(name) {
            Some(ValueKind::Numeric)
        } else {
            None
        }
    }

    /// Serialize all columns into a single byte stream.
    pub fn serialize(&self) -> io::Result<Vec<u8>> {
        let mut output = Vec::new();
        encode_vbyte(
            (self.numeric_columns.len() + self.keyword_columns.len()) as u32,
            &mut output,
        );

        let mut columns: Vec<(&String, ValueKind, Vec<u8>)> = Vec::new();
        for (name, column) in &self.numeric_columns {
            columns.push((name, ValueKind::Numeric, column.serialize()?));
        }
        for (name, column) in &self.keyword_columns {
            columns.push((name, ValueKind::Keyword, column.serialize()?));
        }
        columns.sort_by(|a, b| a.0.cmp(b.0));

        for (name, kind, data) in columns {
            output.push(match kind {
                ValueKind::Numeric => 0,
                ValueKind::Keyword => 1,
            });
            encode_vbyte(name.len() as u32, &mut output);
            output.extend(name.as_bytes());
            encode_vbyte(data.len() as u32, &mut output);
            output.extend(data);
        }

        Ok(output)
    }

    /// Deserialize columns from a byte stream.
    pub fn deserialize(data: &[u8]) -> io::Result<Self> {
        if data.is_empty() {
            return Ok(Self::new());
        }

        let mut pos = 0;
        let column_count = decode_vbyte(data, &mut pos)? as usize;
        let mut reader = Self::new();

        for _ in 0..column_count {
            let col_type = data.get(pos).copied().ok_or_else(|| {
                io::Error::new(io::ErrorKind::UnexpectedEof, "Missing column type")
            })?;
            pos += 1;

            let name_len = decode_vbyte(data, &mut pos)? as usize;
            let name_bytes = data.get(pos..pos + name_len).ok_or_else(|| {
                io::Error::new(io::ErrorKind::UnexpectedEof, "Truncated column name")
            })?;
            let name = std::str::from_utf8(name_bytes)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?
                .to_string();
            pos += name_len;

            let data_len = decode_vbyte(data, &mut pos)? as usize;
            let column_data = data.get(pos..pos + data_len).ok_or_else(|| {
                io::Error::new(io::ErrorKind::UnexpectedEof, "Truncated column data")
            })?;
            pos += data_len;

            match col_type {
                0 => reader.add_numeric(name, NumericColumn::deserialize(column_data)?),
                1 => reader.add_keyword(name, KeywordColumn::deserialize(column_data)?),
                other => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("Unknown docvalues column type {}", other),
                    ))
                }
            }
        }

        Ok(reader)
    }
}
