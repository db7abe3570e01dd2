//! BER-TLV Parser
//!
//! Parses BER-TLV (Basic Encoding Rules - Tag Length Value) structures
//! as found in smart card responses. Constructed values are kept as raw
//! bytes and only decoded when a lookup descends into them.

use std::fmt;

use log::debug;
use thiserror::Error;

use super::TLVEncoder;

/// Errors that can occur during TLV parsing and lookup
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TLVError {
    #[error("Unexpected end of data while parsing tag")]
    UnexpectedEndTag,

    #[error("Unexpected end of data while parsing length")]
    UnexpectedEndLength,

    #[error("Unexpected end of data while parsing value")]
    UnexpectedEndValue,

    #[error("Indefinite length encoding is not supported")]
    InvalidLength,

    #[error("Length too large: {0} length bytes")]
    LengthTooLarge(usize),

    #[error("Invalid hex data: {0}")]
    InvalidHex(String),

    #[error("Tag {0} not found")]
    TagNotFound(String),

    #[error("Value of {0} bytes does not fit in an integer")]
    ValueTooLarge(usize),
}

impl TLVError {
    /// True for the errors raised when the buffer ends before a node is complete
    pub fn is_truncated(&self) -> bool {
        matches!(
            self,
            TLVError::UnexpectedEndTag | TLVError::UnexpectedEndLength | TLVError::UnexpectedEndValue
        )
    }
}

/// A BER tag, kept as its encoded bytes (one or more)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag(Vec<u8>);

impl Tag {
    /// Wrap already-encoded tag bytes
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Parse a tag from its hex form, e.g. `"9F36"`
    pub fn from_hex(tag_hex: &str) -> Result<Self, TLVError> {
        hex::decode(tag_hex.trim())
            .map(Self)
            .map_err(|e| TLVError::InvalidHex(e.to_string()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Constructed tags (bit 6 of the first byte) carry nested TLVs
    pub fn is_constructed(&self) -> bool {
        self.0.first().is_some_and(|b| b & 0x20 != 0)
    }

    /// Upper-case hex rendering of the tag bytes
    pub fn to_hex(&self) -> String {
        hex::encode_upper(&self.0)
    }

    /// Compare against a hex tag name, ignoring case
    pub fn matches_hex(&self, tag_hex: &str) -> bool {
        self.to_hex().eq_ignore_ascii_case(tag_hex.trim())
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// A single TLV node
///
/// The value of a constructed node stays encoded; use [`TLV::children`]
/// to decode one level of nesting on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TLV {
    /// The tag bytes
    pub tag: Tag,
    /// The raw value bytes (`length == value.len()`)
    pub value: Vec<u8>,
    /// Length field as it was encoded; BER allows non-minimal long forms
    length_bytes: Vec<u8>,
}

impl TLV {
    pub fn new(tag: Tag, value: Vec<u8>) -> Self {
        let length_bytes = TLVEncoder::encode_length(value.len());
        Self {
            tag,
            value,
            length_bytes,
        }
    }

    /// Declared length of the value
    pub fn length(&self) -> usize {
        self.value.len()
    }

    /// Length field bytes to write when re-encoding this node
    ///
    /// The parsed encoding is kept while it still describes `value`;
    /// otherwise the shortest form is used.
    pub fn length_bytes(&self) -> Vec<u8> {
        match parse_length(&self.length_bytes, 0) {
            Ok((length, used)) if length == self.value.len() && used == self.length_bytes.len() => {
                self.length_bytes.clone()
            }
            _ => TLVEncoder::encode_length(self.value.len()),
        }
    }

    pub fn is_constructed(&self) -> bool {
        self.tag.is_constructed()
    }

    /// Decode the value as a nested TLV list
    pub fn children(&self) -> Result<Vec<TLV>, TLVError> {
        parse_all(&self.value)
    }

    /// Lower-case hex of the value bytes
    pub fn value_hex(&self) -> String {
        hex::encode(&self.value)
    }
}

/// Parse a buffer into consecutive TLV nodes until it is exhausted
///
/// Trailing bytes that do not form a complete node are an error.
pub fn parse_all(data: &[u8]) -> Result<Vec<TLV>, TLVError> {
    let mut result = Vec::new();
    let mut offset = 0;

    while offset < data.len() {
        let (tlv, next) = parse_one(data, offset)?;
        result.push(tlv);
        offset = next;
    }

    Ok(result)
}

/// Parse exactly one node at `offset`, returning it with the offset just past it
pub fn parse_one(data: &[u8], offset: usize) -> Result<(TLV, usize), TLVError> {
    let (tag, length_start) = parse_tag(data, offset)?;
    let (length, offset) = parse_length(data, length_start)?;

    let end = offset
        .checked_add(length)
        .filter(|end| *end <= data.len())
        .ok_or(TLVError::UnexpectedEndValue)?;

    let tlv = TLV {
        tag,
        value: data[offset..end].to_vec(),
        length_bytes: data[length_start..offset].to_vec(),
    };
    Ok((tlv, end))
}

/// Parse a BER tag
///
/// Multi-byte tags are flagged by the low 5 bits of the first byte being
/// all set; continuation bytes follow while bit 8 is set.
fn parse_tag(data: &[u8], offset: usize) -> Result<(Tag, usize), TLVError> {
    let first = *data.get(offset).ok_or(TLVError::UnexpectedEndTag)?;
    let mut bytes = vec![first];
    let mut pos = offset + 1;

    if (first & 0x1F) == 0x1F {
        loop {
            let next = *data.get(pos).ok_or(TLVError::UnexpectedEndTag)?;
            bytes.push(next);
            pos += 1;
            if (next & 0x80) == 0 {
                break;
            }
        }
    }

    Ok((Tag(bytes), pos))
}

/// Parse a BER length (short form, or long form with up to 4 length bytes)
fn parse_length(data: &[u8], offset: usize) -> Result<(usize, usize), TLVError> {
    let first = *data.get(offset).ok_or(TLVError::UnexpectedEndLength)?;

    // Short form (0-127)
    if (first & 0x80) == 0 {
        return Ok((first as usize, offset + 1));
    }

    let num_bytes = (first & 0x7F) as usize;

    if num_bytes == 0 {
        return Err(TLVError::InvalidLength);
    }

    if num_bytes > 4 {
        return Err(TLVError::LengthTooLarge(num_bytes));
    }

    let start = offset + 1;
    let bytes = data
        .get(start..start + num_bytes)
        .ok_or(TLVError::UnexpectedEndLength)?;

    let length = bytes.iter().fold(0usize, |acc, b| (acc << 8) | (*b as usize));
    Ok((length, start + num_bytes))
}

/// Find the first node at this level whose tag matches `tag_hex`
pub fn find_tag<'a>(list: &'a [TLV], tag_hex: &str) -> Option<&'a TLV> {
    list.iter().find(|tlv| tlv.tag.matches_hex(tag_hex))
}

/// Find a tag at this level, else inside each constructed node in order
///
/// Nested values are decoded only while searching. A constructed node whose
/// value is not valid TLV is skipped.
pub fn find_tag_recursive(list: &[TLV], tag_hex: &str) -> Option<TLV> {
    if let Some(found) = find_tag(list, tag_hex) {
        return Some(found.clone());
    }

    for tlv in list.iter().filter(|t| t.is_constructed()) {
        match tlv.children() {
            Ok(children) => {
                if let Some(found) = find_tag_recursive(&children, tag_hex) {
                    return Some(found);
                }
            }
            Err(e) => {
                debug!("Skipping constructed tag {}: {}", tlv.tag, e);
            }
        }
    }

    None
}
