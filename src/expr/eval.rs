//! Placeholder expression evaluation

use log::debug;

use super::ast::{BinaryOp, DataRef, Expr, FuncArg};
use super::convert::{apply_slice, format_number, hex_to_decimal, hex_to_text, parse_number};
use super::ExprError;
use crate::apdu::{is_success_status_code, status_code_of, Direction};
use crate::decoder::DecodeContext;
use crate::tlv;

/// Encoding used by `hex(...)` when none is given
pub const DEFAULT_TEXT_ENCODING: &str = "gbk";

/// Evaluate an expression tree to its display string
pub fn evaluate(expr: &Expr, ctx: &mut DecodeContext<'_>) -> Result<String, ExprError> {
    match expr {
        Expr::Data(source) => Ok(read(source, ctx)?.unwrap_or_default()),

        Expr::Tag {
            source,
            tag,
            encoding,
        } => {
            let Some(hex_data) = read(source, ctx)? else {
                return Ok(String::new());
            };
            let value = match encoding {
                Some(encoding) => tlv::get_tag_value_as_string(&hex_data, tag, encoding)?,
                None => tlv::get_tag_value(&hex_data, tag)?,
            };
            Ok(value)
        }

        Expr::H2d(arg) => {
            let data = h2d_input(arg, ctx);
            if data.is_empty() {
                return Ok(String::new());
            }
            hex_to_decimal(&data)
        }

        Expr::Hex { arg, encoding } => {
            let data = evaluate(arg, ctx)?;
            if data.is_empty() {
                return Ok(String::new());
            }
            hex_to_text(&data, encoding.as_deref().unwrap_or(DEFAULT_TEXT_ENCODING))
        }

        Expr::Slice { inner, range } => {
            // A gated response yields "" before its slice is checked
            let value = match inner.as_ref() {
                Expr::Data(source) => match read(source, ctx)? {
                    Some(value) => value,
                    None => return Ok(String::new()),
                },
                other => {
                    let value = evaluate(other, ctx)?;
                    if value.is_empty() {
                        return Ok(value);
                    }
                    value
                }
            };
            apply_slice(&value, range)
        }

        Expr::Number(n) => Ok(format_number(*n)),

        Expr::Binary { .. } => evaluate_number(expr, ctx).map(format_number),
    }
}

/// Evaluate an arithmetic operand, promoting it to `f64`
fn evaluate_number(expr: &Expr, ctx: &mut DecodeContext<'_>) -> Result<f64, ExprError> {
    match expr {
        Expr::Number(n) => Ok(*n),
        Expr::Binary { op, lhs, rhs } => {
            let x = evaluate_number(lhs, ctx)?;
            let y = evaluate_number(rhs, ctx)?;
            match op {
                BinaryOp::Add => Ok(x + y),
                BinaryOp::Sub => Ok(x - y),
                BinaryOp::Mul => Ok(x * y),
                BinaryOp::Div => {
                    if y == 0.0 {
                        return Err(ExprError::DivisionByZero);
                    }
                    Ok(x / y)
                }
            }
        }
        other => {
            let value = evaluate(other, ctx)?;
            parse_number(&value).ok_or(ExprError::NonNumeric(value))
        }
    }
}

/// Input text of `h2d(...)`: the evaluated argument, or its literal text
fn h2d_input(arg: &FuncArg, ctx: &mut DecodeContext<'_>) -> String {
    match &arg.expr {
        Some(expr) => match evaluate(expr, ctx) {
            Ok(value) => value,
            Err(e) => {
                debug!("h2d argument '{}' used literally: {}", arg.text, e);
                arg.text.clone()
            }
        },
        None => arg.text.clone(),
    }
}

/// Read one logged entry
///
/// Returns `None` for a response whose status code is not a success; the
/// failure is recorded in the context instead of raising an error.
fn read(source: &DataRef, ctx: &mut DecodeContext<'_>) -> Result<Option<String>, ExprError> {
    let entries = ctx.log().entries(source.direction);
    let value = entries
        .get(source.index)
        .ok_or(ExprError::IndexOutOfRange {
            selector: source.direction.selector(),
            index: source.index,
            len: entries.len(),
        })?;

    if source.direction == Direction::Output {
        if let Some(status) = status_code_of(value) {
            if !is_success_status_code(&status) {
                ctx.add_error(source.index, &status);
                return Ok(None);
            }
        }
    }

    Ok(Some(value.clone()))
}
