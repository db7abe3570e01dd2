//! Value conversions used by placeholder functions

use once_cell::sync::Lazy;
use regex::Regex;

use super::ast::SliceRange;
use super::ExprError;
use crate::tlv::printable_ascii;

/// Characters outside CJK, Latin, digits, whitespace and common punctuation
static DISALLOWED_CHARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[^\p{Han}\p{Latin}\p{N}\s.,;:!?()\[\]{}'"/+\-*=<>@#$%^&_|\\]+"#)
        .expect("character filter pattern is valid")
});

/// Convert a hex string to its decimal representation
///
/// A leading `0x`/`0X` is dropped, then all spaces.
pub fn hex_to_decimal(hex_str: &str) -> Result<String, ExprError> {
    let trimmed = hex_str.strip_prefix("0x").unwrap_or(hex_str);
    let trimmed = trimmed.strip_prefix("0X").unwrap_or(trimmed);
    let digits = trimmed.replace(' ', "");

    i64::from_str_radix(&digits, 16)
        .map(|n| n.to_string())
        .map_err(|_| ExprError::InvalidHex(hex_str.to_string()))
}

/// Decode hex to display text
///
/// `utf-8`/`utf8` decode as UTF-8; every other encoding, including the
/// default `gbk`, keeps printable ASCII only. The result is then passed
/// through [`clean_string`].
pub fn hex_to_text(hex_str: &str, encoding: &str) -> Result<String, ExprError> {
    let data = hex::decode(hex_str).map_err(|_| ExprError::InvalidHex(hex_str.to_string()))?;

    let text = match encoding.to_ascii_lowercase().as_str() {
        "utf-8" | "utf8" => String::from_utf8_lossy(&data).into_owned(),
        _ => printable_ascii(&data),
    };

    Ok(clean_string(&text))
}

/// Keep CJK, Latin letters, digits, whitespace and common punctuation
pub fn clean_string(text: &str) -> String {
    DISALLOWED_CHARS.replace_all(text, "").into_owned()
}

/// Apply a slice to a string, by character position
///
/// Missing bounds default to the whole string and negative bounds count
/// from the end. Bounds that still fall outside `0 <= start <= end <= len`
/// are an error rather than being clamped.
pub fn apply_slice(value: &str, range: &SliceRange) -> Result<String, ExprError> {
    let chars: Vec<char> = value.chars().collect();
    let len = chars.len() as i64;

    let resolve = |bound: i64| if bound < 0 { len + bound } else { bound };
    let start = resolve(range.start.unwrap_or(0));
    let end = resolve(range.end.unwrap_or(len));

    if start < 0 || end > len || start > end {
        return Err(ExprError::SliceOutOfRange(range.to_string()));
    }

    Ok(chars[start as usize..end as usize].iter().collect())
}

/// Render an arithmetic result: integral values without a fraction,
/// everything else with two decimal places
pub fn format_number(value: f64) -> String {
    if value == value.floor() {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

/// Read an operand as a number, if it is one
pub fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: Option<i64>, end: Option<i64>) -> SliceRange {
        SliceRange { start, end }
    }

    #[test]
    fn test_hex_to_decimal() {
        assert_eq!(hex_to_decimal("0xFF").unwrap(), "255");
        assert_eq!(hex_to_decimal("0X1a").unwrap(), "26");
        assert_eq!(hex_to_decimal(" 1 0").unwrap(), "16");
        assert_eq!(hex_to_decimal("001A").unwrap(), "26");
        assert!(matches!(hex_to_decimal("XYZ"), Err(ExprError::InvalidHex(_))));
        assert!(matches!(hex_to_decimal(""), Err(ExprError::InvalidHex(_))));
    }

    #[test]
    fn test_hex_to_decimal_overflow() {
        assert_eq!(hex_to_decimal("7FFFFFFFFFFFFFFF").unwrap(), i64::MAX.to_string());
        assert!(hex_to_decimal("FFFFFFFFFFFFFFFF").is_err());
    }

    #[test]
    fn test_hex_to_text_default_keeps_printable_ascii() {
        // "Hi" surrounded by control bytes and a high byte
        assert_eq!(hex_to_text("0148690AFF", "gbk").unwrap(), "Hi");
        assert_eq!(hex_to_text("4D617374657243617264", "gbk").unwrap(), "MasterCard");
    }

    #[test]
    fn test_hex_to_text_utf8() {
        // "银行卡" followed by a NUL
        assert_eq!(hex_to_text("E993B6E8A18CE58DA100", "utf-8").unwrap(), "银行卡");
        assert_eq!(hex_to_text("E993B6", "UTF8").unwrap(), "银");
    }

    #[test]
    fn test_hex_to_text_invalid() {
        assert!(matches!(hex_to_text("ABC", "gbk"), Err(ExprError::InvalidHex(_))));
    }

    #[test]
    fn test_clean_string() {
        assert_eq!(clean_string("Card #1: OK!"), "Card #1: OK!");
        assert_eq!(clean_string("a~b`c"), "abc");
        assert_eq!(clean_string("名字 Name"), "名字 Name");
        assert_eq!(clean_string("\u{FFFD}x"), "x");
    }

    #[test]
    fn test_apply_slice() {
        assert_eq!(apply_slice("0123456789", &range(Some(2), Some(6))).unwrap(), "2345");
        assert_eq!(apply_slice("0123456789", &range(None, Some(-2))).unwrap(), "01234567");
        assert_eq!(apply_slice("0123456789", &range(Some(-4), None)).unwrap(), "6789");
        assert_eq!(apply_slice("0123456789", &range(None, None)).unwrap(), "0123456789");
        assert_eq!(apply_slice("0123456789", &range(Some(10), None)).unwrap(), "");
    }

    #[test]
    fn test_apply_slice_out_of_range() {
        assert!(matches!(
            apply_slice("0123456789", &range(Some(6), Some(2))),
            Err(ExprError::SliceOutOfRange(_))
        ));
        assert!(apply_slice("0123456789", &range(Some(0), Some(11))).is_err());
        assert!(apply_slice("0123456789", &range(Some(-11), None)).is_err());
        assert!(apply_slice("", &range(Some(0), Some(2))).is_err());
    }

    #[test]
    fn test_apply_slice_multibyte() {
        assert_eq!(apply_slice("银行卡", &range(Some(1), None)).unwrap(), "行卡");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(15.0), "15");
        assert_eq!(format_number(2.5), "2.50");
        assert_eq!(format_number(-3.0), "-3");
        assert_eq!(format_number(1.0 / 3.0), "0.33");
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("10"), Some(10.0));
        assert_eq!(parse_number("2.5"), Some(2.5));
        assert_eq!(parse_number("1A"), None);
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("inf"), None);
    }
}
