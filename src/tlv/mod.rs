//! TLV (Tag-Length-Value) encoding and decoding
//!
//! This module implements the BER-TLV subset used by ISO 7816 / EMV card
//! responses, plus helpers that work directly on the hex strings found in
//! captured exchange logs.
//!
//! # Example
//! ```
//! use apdu_decoder::tlv::get_tag_value_as_string;
//!
//! let hex = "6F178407A0000000031010A50C500A4D617374657243617264";
//! let label = get_tag_value_as_string(hex, "50", "ascii").unwrap();
//! assert_eq!(label, "MasterCard");
//! ```

mod encoder;
mod parser;

pub use encoder::{TLVBuilder, TLVEncoder};
pub use parser::{find_tag, find_tag_recursive, parse_all, parse_one, Tag, TLVError, TLV};

/// How a tag's raw value is turned into display text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueEncoding {
    /// Bytes interpreted as UTF-8
    Utf8,
    /// Printable ASCII bytes (0x20-0x7E) only
    Ascii,
    /// Upper-case hex digit pairs, for BCD style fields
    Numeric,
    /// Lower-case hex, unchanged
    Raw,
}

impl ValueEncoding {
    /// Map an encoding name from a template; unknown names mean [`ValueEncoding::Raw`]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => ValueEncoding::Utf8,
            "ascii" => ValueEncoding::Ascii,
            "numeric" => ValueEncoding::Numeric,
            _ => ValueEncoding::Raw,
        }
    }

    /// Render raw value bytes in this encoding
    pub fn render(&self, value: &[u8]) -> String {
        match self {
            ValueEncoding::Utf8 => String::from_utf8_lossy(value).into_owned(),
            ValueEncoding::Ascii => printable_ascii(value),
            ValueEncoding::Numeric => hex::encode_upper(value),
            ValueEncoding::Raw => hex::encode(value),
        }
    }
}

/// Keep only printable ASCII bytes (0x20-0x7E)
pub fn printable_ascii(value: &[u8]) -> String {
    value
        .iter()
        .filter(|b| (0x20..=0x7E).contains(*b))
        .map(|b| *b as char)
        .collect()
}

/// Decode a hex string from a log into bytes
pub fn decode_hex(hex_data: &str) -> Result<Vec<u8>, TLVError> {
    hex::decode(hex_data.trim()).map_err(|e| TLVError::InvalidHex(e.to_string()))
}

/// Parse `hex_data` and resolve `tag_hex` at any depth
pub fn lookup(hex_data: &str, tag_hex: &str) -> Result<TLV, TLVError> {
    let data = decode_hex(hex_data)?;
    let tlvs = parse_all(&data)?;
    find_tag_recursive(&tlvs, tag_hex).ok_or_else(|| TLVError::TagNotFound(tag_hex.to_string()))
}

/// Raw value of a tag as lower-case hex
pub fn get_tag_value(hex_data: &str, tag_hex: &str) -> Result<String, TLVError> {
    lookup(hex_data, tag_hex).map(|tlv| tlv.value_hex())
}

/// Value of a tag rendered with a named encoding (`utf-8`, `ascii`, `numeric`)
pub fn get_tag_value_as_string(
    hex_data: &str,
    tag_hex: &str,
    encoding: &str,
) -> Result<String, TLVError> {
    let tlv = lookup(hex_data, tag_hex)?;
    Ok(ValueEncoding::from_name(encoding).render(&tlv.value))
}

/// Value of a tag as a big-endian unsigned integer
pub fn get_tag_value_as_int(hex_data: &str, tag_hex: &str) -> Result<u64, TLVError> {
    let tlv = lookup(hex_data, tag_hex)?;
    if tlv.value.len() > 8 {
        return Err(TLVError::ValueTooLarge(tlv.value.len()));
    }
    Ok(tlv.value.iter().fold(0u64, |acc, b| (acc << 8) | (*b as u64)))
}

/// Integer value of a tag scaled down by `10^decimal_places`
pub fn get_tag_value_as_float(
    hex_data: &str,
    tag_hex: &str,
    decimal_places: u32,
) -> Result<f64, TLVError> {
    let value = get_tag_value_as_int(hex_data, tag_hex)?;
    Ok(value as f64 / 10f64.powi(decimal_places as i32))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SELECT_RESPONSE: &str = "6F178407A0000000031010A50C500A4D617374657243617264";

    #[test]
    fn test_get_tag_value() {
        assert_eq!(get_tag_value("6F068401FF500101", "84").unwrap(), "ff");
        assert_eq!(
            get_tag_value(SELECT_RESPONSE, "84").unwrap(),
            "a0000000031010"
        );
    }

    #[test]
    fn test_get_tag_value_as_ascii() {
        let label = get_tag_value_as_string(SELECT_RESPONSE, "50", "ascii").unwrap();
        assert_eq!(label, "MasterCard");
    }

    #[test]
    fn test_get_tag_value_encodings() {
        let data = TLVBuilder::new()
            .add(&[0x5F, 0x20], b"\x01JOHN/DOE\x7F")
            .add(&[0x5A], &[0x54, 0x13, 0x33, 0x00])
            .build_hex();

        assert_eq!(get_tag_value_as_string(&data, "5F20", "ascii").unwrap(), "JOHN/DOE");
        assert_eq!(get_tag_value_as_string(&data, "5F20", "utf8").unwrap(), "\u{1}JOHN/DOE\u{7f}");
        assert_eq!(get_tag_value_as_string(&data, "5A", "numeric").unwrap(), "54133300");
        assert_eq!(get_tag_value_as_string(&data, "5A", "latin1").unwrap(), "54133300");
        assert_eq!(get_tag_value_as_string(&data, "5a", "UTF-8").unwrap(), "T\u{13}3\u{0}");
    }

    #[test]
    fn test_get_tag_value_as_int_and_float() {
        let data = TLVBuilder::new()
            .add(&[0x9F, 0x36], &[0x00, 0x1A])
            .add(&[0x9F, 0x02], &[0x00, 0x00, 0x00, 0x00, 0x30, 0x39])
            .wrap(&[0x70])
            .build_hex();

        assert_eq!(get_tag_value_as_int(&data, "9F36").unwrap(), 26);
        let amount = get_tag_value_as_float(&data, "9F02", 2).unwrap();
        assert!((amount - 123.45).abs() < 1e-9);
    }

    #[test]
    fn test_get_tag_value_as_int_too_large() {
        let data = TLVBuilder::new().add(&[0xC1], &[0x01; 9]).build_hex();
        assert_eq!(
            get_tag_value_as_int(&data, "C1"),
            Err(TLVError::ValueTooLarge(9))
        );
    }

    #[test]
    fn test_tag_not_found() {
        assert_eq!(
            get_tag_value(SELECT_RESPONSE, "9F38"),
            Err(TLVError::TagNotFound("9F38".to_string()))
        );
    }

    #[test]
    fn test_malformed_hex() {
        assert!(matches!(get_tag_value("6F0", "84"), Err(TLVError::InvalidHex(_))));
        assert!(matches!(get_tag_value("ZZ", "84"), Err(TLVError::InvalidHex(_))));
    }

    #[test]
    fn test_truncated_buffer_propagates() {
        assert_eq!(get_tag_value("6F0884", "84"), Err(TLVError::UnexpectedEndValue));
    }

    #[test]
    fn test_status_word_tail_parses() {
        // A response still carrying its 9000 trailer parses as an empty 90 tag
        let data = TLVBuilder::new()
            .add(&[0x84], &[0x01])
            .wrap(&[0x6F])
            .add_raw(&[0x90, 0x00])
            .build_hex();
        assert_eq!(get_tag_value(&data, "84").unwrap(), "01");
    }
}
