//! BER-TLV Encoder
//!
//! Re-encodes parsed nodes to bytes. Used to build fixtures and to check
//! that parsing is lossless.

use super::{Tag, TLV};

/// TLV Encoder for building BER-TLV structures
pub struct TLVEncoder;

impl TLVEncoder {
    /// Encode a tag-value pair to bytes
    pub fn encode(tag: &Tag, value: &[u8]) -> Vec<u8> {
        let mut result = Vec::with_capacity(tag.as_bytes().len() + 5 + value.len());
        result.extend_from_slice(tag.as_bytes());
        result.extend(Self::encode_length(value.len()));
        result.extend_from_slice(value);
        result
    }

    /// Encode just the length bytes, using the shortest form
    pub fn encode_length(length: usize) -> Vec<u8> {
        if length < 128 {
            return vec![length as u8];
        }

        let bytes: Vec<u8> = (length as u64)
            .to_be_bytes()
            .into_iter()
            .skip_while(|b| *b == 0)
            .collect();

        let mut result = Vec::with_capacity(bytes.len() + 1);
        result.push(0x80 | bytes.len() as u8);
        result.extend(bytes);
        result
    }

    /// Encode a single node, keeping the length form it was parsed with
    pub fn encode_tlv(tlv: &TLV) -> Vec<u8> {
        let length = tlv.length_bytes();
        let mut result = Vec::with_capacity(tlv.tag.as_bytes().len() + length.len() + tlv.value.len());
        result.extend_from_slice(tlv.tag.as_bytes());
        result.extend(length);
        result.extend_from_slice(&tlv.value);
        result
    }

    /// Encode a list of nodes back to back
    pub fn encode_list(tlvs: &[TLV]) -> Vec<u8> {
        tlvs.iter().flat_map(Self::encode_tlv).collect()
    }
}

/// Builder for constructing nested TLV structures
pub struct TLVBuilder {
    data: Vec<u8>,
}

impl TLVBuilder {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Add a primitive TLV
    pub fn add(mut self, tag: &[u8], value: &[u8]) -> Self {
        self.data
            .extend(TLVEncoder::encode(&Tag::from_bytes(tag), value));
        self
    }

    /// Add raw bytes (pre-encoded TLV)
    pub fn add_raw(mut self, data: &[u8]) -> Self {
        self.data.extend_from_slice(data);
        self
    }

    /// Wrap current content in a constructed tag
    pub fn wrap(self, tag: &[u8]) -> Self {
        let wrapped = TLVEncoder::encode(&Tag::from_bytes(tag), &self.data);
        Self { data: wrapped }
    }

    pub fn build(self) -> Vec<u8> {
        self.data
    }

    /// Hex of the bytes built so far, upper-case like captured logs
    pub fn build_hex(self) -> String {
        hex::encode_upper(self.data)
    }
}

impl Default for TLVBuilder {
    fn default() -> Self {
        Self::new()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::tlv::parse_all;
    use proptest::prelude::*;

    /// Tag bytes: one byte, or a `1F` lead byte with continuation bytes
    fn tag_strategy(constructed: bool) -> impl Strategy<Value = Vec<u8>> {
        let flag = if constructed { 0x20 } else { 0x00 };
        prop_oneof![
            (0u8..4, 0u8..0x1F).prop_map(move |(class, number)| vec![(class << 6) | flag | number]),
            (0u8..4, prop::collection::vec(0x80u8..=0xFF, 0..2), 0u8..0x80).prop_map(
                move |(class, middle, last)| {
                    let mut tag = vec![(class << 6) | flag | 0x1F];
                    tag.extend(middle);
                    tag.push(last);
                    tag
                }
            ),
        ]
    }

    /// Length field using `extra` long-form bytes, or the shortest form
    /// when `extra` is 0 or too small for `len`
    fn length_field(len: usize, extra: u8) -> Vec<u8> {
        let needed = (len as u32).to_be_bytes().iter().skip_while(|b| **b == 0).count();
        if extra == 0 || (extra as usize) < needed {
            return TLVEncoder::encode_length(len);
        }
        let bytes = (len as u32).to_be_bytes();
        let mut field = vec![0x80 | extra];
        field.extend_from_slice(&bytes[4 - extra as usize..]);
        field
    }

    fn node_bytes(tag: &[u8], extra: u8, value: &[u8]) -> Vec<u8> {
        let mut out = tag.to_vec();
        out.extend(length_field(value.len(), extra));
        out.extend_from_slice(value);
        out
    }

    fn node_strategy() -> impl Strategy<Value = Vec<u8>> {
        let primitive = (tag_strategy(false), 0u8..=4, prop::collection::vec(any::<u8>(), 0..40))
            .prop_map(|(tag, extra, value)| node_bytes(&tag, extra, &value));

        primitive.prop_recursive(3, 24, 4, |inner| {
            (tag_strategy(true), 0u8..=4, prop::collection::vec(inner, 0..4))
                .prop_map(|(tag, extra, children)| node_bytes(&tag, extra, &children.concat()))
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        #[test]
        fn prop_reencoding_reproduces_buffer(nodes in prop::collection::vec(node_strategy(), 0..6)) {
            let data = nodes.concat();
            let tlvs = parse_all(&data).unwrap();
            prop_assert_eq!(tlvs.len(), nodes.len());
            prop_assert_eq!(TLVEncoder::encode_list(&tlvs), data);

            for tlv in tlvs.iter().filter(|t| t.is_constructed()) {
                let children = tlv.children().unwrap();
                prop_assert_eq!(TLVEncoder::encode_list(&children), tlv.value.clone());
            }
        }
    }
}
