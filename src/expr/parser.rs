//! Recursive-descent parser for placeholder expressions
//!
//! ```text
//! expression := sum                      (when a top-level operator exists)
//!             | primary
//! sum        := product (('+' | '-') product)*
//! product    := atom (('*' | '/') atom)*
//! atom       := '(' sum ')' | number | primary
//! primary    := (reference | call) slice?
//! reference  := ('O' | 'I') '[' digits ']' ('TAG(' hexdigits ')' (',' '"' encoding '"')?)?
//! call       := 'h2d(' text ')' | 'hex(' expression (',' encoding)? ')'
//! slice      := '[' int? ':' int? ']'
//! ```
//!
//! Whether an expression is arithmetic is decided up front by scanning for
//! `+ - * /` outside any parentheses; brackets are not tracked, so a
//! negative slice bound such as `O[1][:-2]` also takes the arithmetic path,
//! where a lone operand evaluates to itself.
//!
//! A `TAG(...)` reference takes precedence over the functions around it:
//! outside arithmetic, an expression that contains `O[n]TAG(..)` anywhere
//! evaluates as that tag lookup, keeping only a slice written directly
//! after it. `h2d(O[1]TAG(9F36))` is therefore the raw tag hex.

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use super::ast::{BinaryOp, DataRef, Expr, FuncArg, SliceRange};
use super::ExprError;
use crate::apdu::Direction;

/// Deepest nesting of parentheses, calls and operators accepted in one placeholder
pub const MAX_DEPTH: usize = 64;

static TAG_REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[OI]\[\d+\]TAG\([0-9A-Fa-f]+\)").expect("tag reference pattern is valid"));

/// True if `expr` contains `+ - * /` at parenthesis depth zero
pub fn has_top_level_operator(expr: &str) -> bool {
    let mut depth: i32 = 0;
    for c in expr.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            '+' | '-' | '*' | '/' if depth == 0 => return true,
            _ => {}
        }
    }
    false
}

/// Parse the text between the brackets of a slice, e.g. `2:6` or `:-2`
pub fn parse_slice_range(text: &str) -> Result<SliceRange, ExprError> {
    let parts: Vec<&str> = text.split(':').collect();
    if parts.len() != 2 {
        return Err(ExprError::InvalidSlice(text.to_string()));
    }

    let bound = |part: &str| -> Result<Option<i64>, ExprError> {
        if part.is_empty() {
            Ok(None)
        } else {
            part.parse::<i64>()
                .map(Some)
                .map_err(|_| ExprError::InvalidSlice(text.to_string()))
        }
    };

    Ok(SliceRange {
        start: bound(parts[0])?,
        end: bound(parts[1])?,
    })
}

/// Split function arguments on commas that are outside quotes and parentheses
fn split_args(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0;
    let mut in_quote = false;
    let mut start = 0;

    for (i, c) in text.char_indices() {
        match c {
            '"' => in_quote = !in_quote,
            '(' if !in_quote => depth += 1,
            ')' if !in_quote => depth -= 1,
            ',' if !in_quote && depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Placeholder expression parser
pub struct ExprParser<'a> {
    input: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> ExprParser<'a> {
    /// Parse a complete placeholder expression
    pub fn parse(input: &'a str) -> Result<Expr, ExprError> {
        Self::parse_nested(input, 0)
    }

    fn parse_nested(input: &'a str, depth: usize) -> Result<Expr, ExprError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ExprError::InvalidExpression("empty expression".to_string()));
        }
        if depth > MAX_DEPTH {
            return Err(Self::too_deep());
        }

        let arithmetic = has_top_level_operator(input);
        if !arithmetic {
            if let Some(tag) = Self::embedded_tag(input, depth)? {
                return Ok(tag);
            }
        }

        let mut parser = Self {
            input,
            pos: 0,
            depth,
        };
        let expr = if arithmetic {
            parser.parse_sum()?
        } else {
            parser.parse_primary()?
        };

        parser.skip_whitespace();
        if !parser.is_at_end() {
            return Err(parser.unexpected());
        }
        Ok(expr)
    }

    /// The `O[n]TAG(..)` reference found anywhere in `text`, with an
    /// optional encoding and a slice directly following it
    fn embedded_tag(text: &'a str, depth: usize) -> Result<Option<Expr>, ExprError> {
        let Some(found) = TAG_REFERENCE.find(text) else {
            return Ok(None);
        };
        if found.start() > 0 {
            debug!("'{}' resolves to its tag reference '{}'", text, found.as_str());
        }

        let mut parser = Self {
            input: text,
            pos: found.start(),
            depth,
        };
        let expr = parser.parse_reference()?;
        if parser.peek() == Some('[') {
            let range = parser.parse_slice()?;
            return Ok(Some(Expr::Slice {
                inner: Box::new(expr),
                range,
            }));
        }
        Ok(Some(expr))
    }

    fn parse_sum(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.parse_product()?;
        let mut folds = 0;
        loop {
            self.skip_whitespace();
            match self.peek().and_then(BinaryOp::from_char) {
                Some(op @ (BinaryOp::Add | BinaryOp::Sub)) => {
                    self.enter()?;
                    folds += 1;
                    self.advance();
                    let rhs = self.parse_product()?;
                    lhs = Expr::Binary {
                        op,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    };
                }
                _ => {
                    self.depth -= folds;
                    return Ok(lhs);
                }
            }
        }
    }

    fn parse_product(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.parse_atom()?;
        let mut folds = 0;
        loop {
            self.skip_whitespace();
            match self.peek().and_then(BinaryOp::from_char) {
                Some(op @ (BinaryOp::Mul | BinaryOp::Div)) => {
                    self.enter()?;
                    folds += 1;
                    self.advance();
                    let rhs = self.parse_atom()?;
                    lhs = Expr::Binary {
                        op,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    };
                }
                _ => {
                    self.depth -= folds;
                    return Ok(lhs);
                }
            }
        }
    }

    fn parse_atom(&mut self) -> Result<Expr, ExprError> {
        self.skip_whitespace();
        match self.peek() {
            Some('(') => {
                self.enter()?;
                self.advance();
                let inner = self.parse_sum()?;
                self.skip_whitespace();
                self.expect(')')?;
                self.depth -= 1;
                Ok(inner)
            }
            Some(c) if c.is_ascii_digit() || c == '.' => self.parse_number(),
            _ => self.parse_primary(),
        }
    }

    fn parse_number(&mut self) -> Result<Expr, ExprError> {
        let text = self.take_while(|c| c.is_ascii_digit() || c == '.');
        text.parse::<f64>()
            .map(Expr::Number)
            .map_err(|_| ExprError::InvalidExpression(format!("invalid number '{text}'")))
    }

    fn parse_primary(&mut self) -> Result<Expr, ExprError> {
        let expr = if self.starts_with("h2d(") || self.starts_with("hex(") {
            let is_h2d = self.starts_with("h2d(");
            self.pos += 3;
            let text = self.parse_call_args()?;

            if let Some(tag) = Self::embedded_tag(text, self.depth + 1)? {
                // The tag lookup replaces the call, including its slice
                if self.peek() == Some('[') {
                    self.parse_slice()?;
                }
                return Ok(tag);
            }

            if is_h2d {
                Expr::H2d(FuncArg {
                    text: text.to_string(),
                    expr: ExprParser::parse_nested(text, self.depth + 1).ok().map(Box::new),
                })
            } else {
                Self::build_hex(text, self.depth + 1)?
            }
        } else {
            match self.peek() {
                Some('O' | 'I') => self.parse_reference()?,
                _ => return Err(self.unexpected()),
            }
        };

        if self.peek() == Some('[') {
            let range = self.parse_slice()?;
            return Ok(Expr::Slice {
                inner: Box::new(expr),
                range,
            });
        }
        Ok(expr)
    }

    fn build_hex(text: &'a str, depth: usize) -> Result<Expr, ExprError> {
        let parts = split_args(text);
        if parts.len() > 2 {
            return Err(ExprError::InvalidExpression(
                "invalid number of arguments for hex function".to_string(),
            ));
        }

        let arg = ExprParser::parse_nested(parts[0], depth)?;
        let encoding = parts
            .get(1)
            .map(|p| p.trim().trim_matches(|c| c == '"' || c == '\'').to_string());

        Ok(Expr::Hex {
            arg: Box::new(arg),
            encoding,
        })
    }

    fn parse_reference(&mut self) -> Result<Expr, ExprError> {
        let direction = self
            .peek()
            .and_then(Direction::from_selector)
            .ok_or_else(|| self.unexpected())?;
        self.advance();

        self.expect('[')?;
        let digits = self.take_while(|c| c.is_ascii_digit());
        let index = digits
            .parse::<usize>()
            .map_err(|_| ExprError::InvalidExpression(format!("invalid index '{digits}'")))?;
        self.expect(']')?;

        let source = DataRef { direction, index };

        if !self.starts_with("TAG(") {
            return Ok(Expr::Data(source));
        }

        self.pos += 4;
        let tag = self.take_while(|c| c.is_ascii_hexdigit());
        if tag.is_empty() {
            return Err(self.unexpected());
        }
        self.expect(')')?;

        let encoding = self.parse_encoding();

        Ok(Expr::Tag {
            source,
            tag: tag.to_string(),
            encoding,
        })
    }

    /// Optional `, "encoding"` after a tag; anything else is left unconsumed
    fn parse_encoding(&mut self) -> Option<String> {
        let before = self.pos;
        self.skip_whitespace();
        if self.peek() == Some(',') {
            self.advance();
            self.skip_whitespace();
            if self.peek() == Some('"') {
                self.advance();
                let name = self.take_while(|c| c != '"');
                if !name.is_empty() && self.peek() == Some('"') {
                    self.advance();
                    return Some(name.to_string());
                }
            }
        }
        self.pos = before;
        None
    }

    fn parse_slice(&mut self) -> Result<SliceRange, ExprError> {
        self.expect('[')?;
        let text = self.take_while(|c| c != ']');
        self.expect(']')?;
        parse_slice_range(text)
    }

    /// Consume `( ... )` and return the text between the balanced parentheses
    fn parse_call_args(&mut self) -> Result<&'a str, ExprError> {
        self.expect('(')?;
        let start = self.pos;
        let mut depth = 1;
        let mut in_quote = false;

        while let Some(c) = self.peek() {
            self.advance();
            match c {
                '"' => in_quote = !in_quote,
                '(' if !in_quote => depth += 1,
                ')' if !in_quote => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(&self.input[start..self.pos - 1]);
                    }
                }
                _ => {}
            }
        }

        Err(ExprError::InvalidExpression(format!(
            "unclosed '(' in '{}'",
            self.input
        )))
    }

    // Helper methods

    fn enter(&mut self) -> Result<(), ExprError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(Self::too_deep());
        }
        Ok(())
    }

    fn too_deep() -> ExprError {
        ExprError::InvalidExpression(format!("nested deeper than {MAX_DEPTH} levels"))
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn starts_with(&self, prefix: &str) -> bool {
        self.input[self.pos..].starts_with(prefix)
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.advance();
        }
        &self.input[start..self.pos]
    }

    fn expect(&mut self, expected: char) -> Result<(), ExprError> {
        if self.peek() == Some(expected) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn unexpected(&self) -> ExprError {
        let found = match self.peek() {
            Some(c) => format!("unexpected '{c}'"),
            None => "unexpected end".to_string(),
        };
        ExprError::InvalidExpression(format!("{found} at {} in '{}'", self.pos, self.input))
    }
}
