//! Template rendering
//!
//! The first template line is a title shown in a banner. Every other line
//! is literal text with `{expression}` placeholders.

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::DecodeContext;
use crate::expr::evaluate_expression;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([^}]+)\}").expect("placeholder pattern is valid"));

/// Default banner width, in characters
pub const DEFAULT_BANNER_WIDTH: usize = 50;

/// Per-render settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Append the summary of failed responses
    pub debug: bool,
    /// Width of the title and error banners
    pub banner_width: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            debug: false,
            banner_width: DEFAULT_BANNER_WIDTH,
        }
    }
}

/// Render a whole template against a decode context
///
/// A placeholder that fails to evaluate is logged and left as written.
/// An empty template renders as a banner with an empty title.
pub fn render_all(template: &str, ctx: &mut DecodeContext<'_>, banner_width: usize) -> String {
    let mut lines = template.split('\n').map(|line| line.trim_end_matches('\r'));
    let title = lines.next().unwrap_or_default();

    let mut out = String::new();
    let rule = "=".repeat(banner_width);
    out.push_str(&rule);
    out.push('\n');
    out.push_str(&center_text(title, banner_width));
    out.push('\n');
    out.push_str(&rule);
    out.push('\n');

    for line in lines {
        if !line.is_empty() {
            out.push_str(&render_line(line, ctx));
        }
        out.push('\n');
    }

    if ctx.debug() && !ctx.errors().is_empty() {
        let rule = "-".repeat(banner_width);
        out.push('\n');
        out.push_str(&rule);
        out.push('\n');
        out.push_str("Error Information:\n");
        out.push_str(&rule);
        out.push('\n');

        for error in ctx.errors() {
            out.push_str(&format!(
                "Output[{}]: Error code {} - {}\n",
                error.index, error.status_code, error.description
            ));
        }
    }

    out
}

/// Replace every placeholder on one line
pub fn render_line(line: &str, ctx: &mut DecodeContext<'_>) -> String {
    PLACEHOLDER
        .replace_all(line, |caps: &Captures| {
            let expr = &caps[1];
            match evaluate_expression(expr, ctx) {
                Ok(value) => {
                    debug!("{{{}}} -> {:?}", expr, value);
                    value
                }
                Err(e) => {
                    warn!("Error evaluating expression '{}': {}", expr, e);
                    caps[0].to_string()
                }
            }
        })
        .into_owned()
}

/// Left-pad `text` so it sits in the middle of `width` columns
pub fn center_text(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.to_string();
    }
    let padding = (width - len) / 2;
    format!("{}{}", " ".repeat(padding), text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apdu::ResponseLog;

    /// Stand-in for the device collaborator
    fn load_log() -> String {
        [
            "Filetype: APDU Runner Response",
            "Response:",
            "In: 00A4040007A0000000031010",
            "Out: 6F178407A0000000031010A50C500A4D6173746572436172649000",
            "In: 80CA9F1700",
            "Out: 6A82",
            "In: 80CA9F3600",
            "Out: 9F3602001A9000",
        ]
        .join("\n")
    }

    /// Stand-in for the format store collaborator
    fn load_template(id: &str) -> String {
        match id {
            "card" => "Card Info\n\
                       Label: {O[0]TAG(50), \"ascii\"}\n\
                       AID: {O[0]TAG(84)}\n\
                       \n\
                       PIN tries: {h2d(O[1])}\n\
                       ATC: {h2d(O[2][6:10])}\n\
                       Missing: {O[0]TAG(5F20)}"
                .to_string(),
            _ => String::new(),
        }
    }

    #[test]
    fn test_render_card_template() {
        let log = ResponseLog::parse(&load_log());
        let mut ctx = DecodeContext::new(&log, false);
        let out = render_all(&load_template("card"), &mut ctx, DEFAULT_BANNER_WIDTH);

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "=".repeat(50));
        assert_eq!(lines[1], format!("{}Card Info", " ".repeat(20)));
        assert_eq!(lines[2], "=".repeat(50));
        assert_eq!(lines[3], "Label: MasterCard");
        assert_eq!(lines[4], "AID: a0000000031010");
        assert_eq!(lines[5], "");
        assert_eq!(lines[6], "PIN tries: ");
        assert_eq!(lines[7], "ATC: 26");
        // Failed placeholder stays verbatim
        assert_eq!(lines[8], "Missing: {O[0]TAG(5F20)}");
        assert_eq!(lines.len(), 9);

        // Not in debug mode: no summary, but the failure is still recorded
        assert!(!out.contains("Error Information"));
        assert_eq!(ctx.errors().len(), 1);
    }

    #[test]
    fn test_render_debug_summary() {
        let log = ResponseLog::parse(&load_log());
        let mut ctx = DecodeContext::new(&log, true);
        let out = render_all(&load_template("card"), &mut ctx, DEFAULT_BANNER_WIDTH);

        let expected_tail = format!(
            "\n{rule}\nError Information:\n{rule}\nOutput[1]: Error code 6A82 - File not found\n",
            rule = "-".repeat(50)
        );
        assert!(out.ends_with(&expected_tail), "got:\n{out}");
    }

    #[test]
    fn test_debug_without_failures_has_no_summary() {
        let log = ResponseLog::parse(&load_log());
        let mut ctx = DecodeContext::new(&log, true);
        let out = render_all("Title\nAID: {O[0]TAG(84)}", &mut ctx, 20);
        assert_eq!(
            out,
            format!("{0}\n       Title\n{0}\nAID: a0000000031010\n", "=".repeat(20))
        );
    }

    #[test]
    fn test_empty_template_renders_banner() {
        let log = ResponseLog::default();
        let mut ctx = DecodeContext::new(&log, false);
        assert_eq!(
            render_all(&load_template("missing"), &mut ctx, 10),
            "==========\n     \n==========\n"
        );
    }

    #[test]
    fn test_render_line_multiple_placeholders() {
        let log = ResponseLog::parse("Response:\nOut: 10\nOut: 5\n");
        let mut ctx = DecodeContext::new(&log, false);
        assert_eq!(
            render_line("{O[0]} + {O[1]} = {O[0]+O[1]}, bad: {O[9]}", &mut ctx),
            "10 + 5 = 15, bad: {O[9]}"
        );
    }

    #[test]
    fn test_template_with_crlf() {
        let log = ResponseLog::parse("Response:\r\nOut: 10\r\n");
        let mut ctx = DecodeContext::new(&log, false);
        let out = render_all("T\r\nv={O[0]}\r\n", &mut ctx, 4);
        assert_eq!(out, "====\n T\n====\nv=10\n\n");
    }

    #[test]
    fn test_center_text() {
        assert_eq!(center_text("abc", 9), "   abc");
        assert_eq!(center_text("abcdef", 4), "abcdef");
        assert_eq!(center_text("", 4), "  ");
    }
}
