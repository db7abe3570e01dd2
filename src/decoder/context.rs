//! Decode context
//!
//! State for one decode pass: the log being read and the APDU failures
//! found while reading it.

use log::debug;

use crate::apdu::{error_description, ResponseLog};

/// A response whose status code was not a success
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    /// Index into the outputs of the log
    pub index: usize,
    /// The trailing status code, e.g. `6A82`
    pub status_code: String,
    /// Description from the status word table
    pub description: String,
}

/// Context for a single decode pass
///
/// Failures are only ever appended. The renderer reads them at the end
/// to build the debug summary.
#[derive(Debug)]
pub struct DecodeContext<'a> {
    log: &'a ResponseLog,
    errors: Vec<ErrorInfo>,
    debug: bool,
}

impl<'a> DecodeContext<'a> {
    pub fn new(log: &'a ResponseLog, debug: bool) -> Self {
        Self {
            log,
            errors: Vec::new(),
            debug,
        }
    }

    /// The log this pass decodes
    pub fn log(&self) -> &'a ResponseLog {
        self.log
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Record a failed response
    pub fn add_error(&mut self, index: usize, status_code: &str) {
        let description = error_description(status_code);
        debug!("Output[{}] returned {} ({})", index, status_code, description);
        self.errors.push(ErrorInfo {
            index,
            status_code: status_code.to_string(),
            description: description.to_string(),
        });
    }

    /// Failures recorded so far, in discovery order
    pub fn errors(&self) -> &[ErrorInfo] {
        &self.errors
    }
}
