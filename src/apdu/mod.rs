//! APDU (Application Protocol Data Unit) exchange handling
//!
//! This module models what the NFC test device records: the command APDUs it
//! sent and the response APDUs it received, plus the ISO 7816-4 status words
//! that end every response.
//!
//! # Example
//! ```
//! use apdu_decoder::apdu::{is_success_status_code, status_code_of, ResponseLog};
//!
//! let log = ResponseLog::parse("Response:\nIn: 00A40400\nOut: 6A82\n");
//! let sw = status_code_of(&log.outputs[0]).unwrap();
//! assert!(!is_success_status_code(&sw));
//! ```

mod response;
mod status;

pub use response::{Direction, ResponseLog};
pub use status::{
    error_description, is_success_status_code, status_code_of, SUCCESS_CODES, UNKNOWN_ERROR,
};
