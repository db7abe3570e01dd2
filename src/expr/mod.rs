//! Placeholder expression language
//!
//! A template placeholder such as `{O[1]TAG(50), "ascii"}` holds one
//! expression. Supported forms:
//!
//! - `O[n]` / `I[n]`: the nth response / command as hex
//! - `O[n][a:b]`: a character slice of it (bounds optional, negative from the end)
//! - `O[n]TAG(84)`: value of a BER-TLV tag found at any depth, as hex
//! - `O[n]TAG(50), "ascii"`: the same value decoded (`utf-8`, `ascii`, `numeric`)
//! - `h2d(x)`: hex to decimal, where `x` is an expression or literal hex
//! - `hex(x[, "utf-8"])`: hex to text (printable ASCII unless `utf-8`)
//! - `a + b`, `a - b`, `a * b`, `a / b` with parentheses, over numeric results
//!
//! Reading a response whose status word is not a success yields an empty
//! string and records the failure in the [`DecodeContext`].

mod ast;
mod convert;
mod eval;
mod parser;

pub use ast::{BinaryOp, DataRef, Expr, FuncArg, SliceRange};
pub use convert::{apply_slice, clean_string, format_number, hex_to_decimal, hex_to_text};
pub use eval::{evaluate, DEFAULT_TEXT_ENCODING};
pub use parser::{has_top_level_operator, parse_slice_range, ExprParser};

use thiserror::Error;

use crate::decoder::DecodeContext;
use crate::tlv::TLVError;

/// Errors raised while evaluating a single placeholder
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExprError {
    #[error(transparent)]
    Tlv(#[from] TLVError),

    #[error("index out of range: {selector}[{index}] (log has {len})")]
    IndexOutOfRange {
        selector: char,
        index: usize,
        len: usize,
    },

    #[error("slice indices out of range: {0}")]
    SliceOutOfRange(String),

    #[error("invalid slice expression: {0}")]
    InvalidSlice(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("cannot perform arithmetic on non-numeric value '{0}'")]
    NonNumeric(String),

    #[error("error parsing hex value '{0}'")]
    InvalidHex(String),

    #[error("invalid expression: {0}")]
    InvalidExpression(String),
}

/// Parse and evaluate one placeholder expression
pub fn evaluate_expression(text: &str, ctx: &mut DecodeContext<'_>) -> Result<String, ExprError> {
    let expr = ExprParser::parse(text)?;
    evaluate(&expr, ctx)
}
