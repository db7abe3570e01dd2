//! APDU response log decoder
//!
//! Turns the raw command/response log captured by an NFC APDU runner into
//! a human-readable report, driven by a format template:
//!
//! - BER-TLV parsing of response data (EMV / ISO 7816-4)
//! - A small placeholder expression language over the log entries
//! - Status word gating, with failed responses collected for a debug summary
//!
//! ```no_run
//! use apdu_decoder::{decode, FormatStore, RenderOptions};
//!
//! let store = FormatStore::new("format");
//! let template = store.load("mastercard")?;
//! let log = apdu_decoder::format::load_log("card.apdures".as_ref())?;
//! print!("{}", decode(&log, &template, &RenderOptions::default()));
//! # Ok::<(), apdu_decoder::DecodeError>(())
//! ```

pub mod apdu;
pub mod config;
pub mod decoder;
pub mod error;
pub mod expr;
pub mod format;
pub mod tlv;

pub use apdu::ResponseLog;
pub use config::DecoderConfig;
pub use decoder::{decode, render_all, DecodeContext, ErrorInfo, RenderOptions};
pub use error::DecodeError;
pub use expr::{evaluate_expression, ExprError};
pub use format::FormatStore;
pub use tlv::TLVError;
