//! Placeholder expression tree

use std::fmt;

use crate::apdu::Direction;

/// A reference to one logged command or response, e.g. `O[1]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataRef {
    pub direction: Direction,
    pub index: usize,
}

impl fmt::Display for DataRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.direction.selector(), self.index)
    }
}

/// A `start:end` character range; either side may be omitted or negative
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceRange {
    pub start: Option<i64>,
    pub end: Option<i64>,
}

impl fmt::Display for SliceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(start) = self.start {
            write!(f, "{start}")?;
        }
        f.write_str(":")?;
        if let Some(end) = self.end {
            write!(f, "{end}")?;
        }
        Ok(())
    }
}

/// Argument of `h2d(...)`
///
/// The raw text is kept: when the argument does not parse or fails to
/// evaluate, it is converted as a literal hex string instead.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncArg {
    pub text: String,
    pub expr: Option<Box<Expr>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(BinaryOp::Add),
            '-' => Some(BinaryOp::Sub),
            '*' => Some(BinaryOp::Mul),
            '/' => Some(BinaryOp::Div),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `O[n]` / `I[n]`
    Data(DataRef),
    /// `O[n]TAG(84)` with an optional `, "encoding"`
    Tag {
        source: DataRef,
        tag: String,
        encoding: Option<String>,
    },
    /// `h2d(arg)`: hex to decimal
    H2d(FuncArg),
    /// `hex(arg[, "encoding"])`: hex to text
    Hex {
        arg: Box<Expr>,
        encoding: Option<String>,
    },
    /// Any of the above followed by `[start:end]`
    Slice { inner: Box<Expr>, range: SliceRange },
    /// Numeric literal inside arithmetic
    Number(f64),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}
