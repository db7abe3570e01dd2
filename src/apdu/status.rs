//! Status Word (SW) table for APDU responses
//!
//! ISO 7816-4 status words indicating command execution results. The
//! description table is built once and never mutated, so it can be read
//! from any number of concurrent renders.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Description returned when neither the code nor its class is known
pub const UNKNOWN_ERROR: &str = "Unknown error code";

/// Status codes treated as a successful command
pub const SUCCESS_CODES: [&str; 3] = ["9000", "9100", "9200"];

const STATUS_DESCRIPTIONS: &[(&str, &str)] = &[
    // Success
    ("9000", "Success"),
    ("9100", "Success with proactive command to follow"),
    ("9200", "Success with data still available"),
    // Normal processing with extra information (61xx)
    ("6100", "Response bytes still available"),
    // Warnings, state of non-volatile memory unchanged (62xx)
    ("6200", "No information given (NV-Ram not changed)"),
    ("6281", "Part of returned data may be corrupted"),
    ("6282", "End of file/record reached before reading Le bytes"),
    ("6283", "Selected file invalidated"),
    ("6284", "Selected file is not valid (FCI not formatted)"),
    ("6285", "Selected file is in termination state"),
    ("6286", "No input data available from a sensor on the card"),
    // Warnings, state of non-volatile memory changed (63xx)
    ("6300", "No information given (NV-Ram changed)"),
    ("6381", "File filled up by the last write"),
    ("63C0", "Verification failed, no retries left"),
    ("63C1", "Verification failed, 1 retry left"),
    ("63C2", "Verification failed, 2 retries left"),
    ("63C3", "Verification failed, 3 retries left"),
    // Execution errors (64xx, 65xx, 66xx)
    ("6400", "Execution error (NV-Ram not changed)"),
    ("6401", "Immediate response required by the card"),
    ("6500", "Execution error (NV-Ram changed)"),
    ("6581", "Memory failure"),
    ("6600", "Security-related issue"),
    // Checking errors (67xx - 6Fxx)
    ("6700", "Wrong length"),
    ("6800", "Functions in CLA not supported"),
    ("6881", "Logical channel not supported"),
    ("6882", "Secure messaging not supported"),
    ("6883", "Last command of the chain expected"),
    ("6884", "Command chaining not supported"),
    ("6900", "Command not allowed"),
    ("6981", "Command incompatible with file structure"),
    ("6982", "Security status not satisfied"),
    ("6983", "Authentication method blocked"),
    ("6984", "Reference data not usable"),
    ("6985", "Conditions of use not satisfied"),
    ("6986", "Command not allowed (no current EF)"),
    ("6987", "Expected secure messaging data objects missing"),
    ("6988", "Incorrect secure messaging data objects"),
    ("6A00", "Wrong parameters P1-P2"),
    ("6A80", "Incorrect parameters in the data field"),
    ("6A81", "Function not supported"),
    ("6A82", "File not found"),
    ("6A83", "Record not found"),
    ("6A84", "Not enough memory space in the file"),
    ("6A85", "Nc inconsistent with TLV structure"),
    ("6A86", "Incorrect parameters P1-P2"),
    ("6A87", "Nc inconsistent with parameters P1-P2"),
    ("6A88", "Referenced data not found"),
    ("6A89", "File already exists"),
    ("6A8A", "DF name already exists"),
    ("6B00", "Wrong parameters P1-P2"),
    ("6C00", "Wrong Le field"),
    ("6D00", "Instruction code not supported or invalid"),
    ("6E00", "Class not supported"),
    ("6F00", "No precise diagnosis"),
    // Proprietary (9xxx)
    ("9240", "Writing to EEPROM not successful"),
    ("9302", "Card locked"),
    ("9400", "No EF selected"),
    ("9402", "Address range exceeded"),
    ("9404", "File ID not found"),
    ("9408", "Selected file type does not match command"),
    ("9802", "No PIN defined"),
    ("9804", "Access conditions not satisfied"),
    ("9835", "Call ASK RANDOM or GIVE RANDOM before this command"),
    ("9840", "Access blocked"),
    ("9E00", "Signature and data length mismatch"),
    ("9F00", "Response bytes available"),
];

static STATUS_TABLE: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| STATUS_DESCRIPTIONS.iter().copied().collect());

/// Check if a status code indicates success (9000, 9100 or 9200)
pub fn is_success_status_code(code: &str) -> bool {
    SUCCESS_CODES
        .iter()
        .any(|ok| ok.eq_ignore_ascii_case(code))
}

/// Look up the description of a status code
///
/// Exact match first, then the class (first byte with `00` appended),
/// then [`UNKNOWN_ERROR`].
pub fn error_description(code: &str) -> &'static str {
    let code = code.to_ascii_uppercase();

    if let Some(description) = STATUS_TABLE.get(code.as_str()).copied() {
        return description;
    }

    if let Some(class) = code.get(..2) {
        if let Some(description) = STATUS_TABLE.get(format!("{class}00").as_str()).copied() {
            return description;
        }
    }

    UNKNOWN_ERROR
}

/// Trailing status code of a hex response (its last 4 characters, upper-cased)
///
/// Responses shorter than 4 characters have no status code.
pub fn status_code_of(response_hex: &str) -> Option<String> {
    let chars: Vec<char> = response_hex.trim_end().chars().collect();
    if chars.len() < 4 {
        return None;
    }
    Some(chars[chars.len() - 4..].iter().collect::<String>().to_ascii_uppercase())
}
