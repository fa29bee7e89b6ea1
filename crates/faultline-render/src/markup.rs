//! Letter body markup.
//!
//! Letters arrive as plain text with two conventions: `\n` separates lines
//! and `**text**` marks emphasis. Literal `N/A` and `placeholder` tokens left
//! in by the drafting step are removed.

use std::sync::LazyLock;

use regex::Regex;

static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\*\*(.*?)\*\*").expect("static regex"));

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(N/A|placeholder)\b").expect("static regex"));

/// A run of text with uniform weight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub bold: bool,
}

impl Span {
    pub fn regular(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
        }
    }
}

/// One hard line of the letter body.
pub type Line = Vec<Span>;

/// Remove placeholder tokens.
pub fn strip_placeholders(text: &str) -> String {
    PLACEHOLDER.replace_all(text, "").into_owned()
}

/// Escape the characters that are significant in HTML text.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Format a letter body as HTML: `<br>` line breaks, `<strong>` emphasis,
/// placeholders removed.
pub fn format_letter_body(content: &str) -> String {
    let escaped = escape_html(content);
    let with_breaks = escaped.replace('\n', "<br>");
    let emphasised = BOLD.replace_all(&with_breaks, "<strong>$1</strong>");
    strip_placeholders(&emphasised)
}

/// Parse a letter body into lines of weighted spans for page layout.
///
/// Emphasis may span a line break, in which case both halves stay bold.
pub fn parse_letter_body(content: &str) -> Vec<Line> {
    let normalized = content.replace("\r\n", "\n");
    let mut spans = Vec::new();
    let mut last = 0;
    for caps in BOLD.captures_iter(&normalized) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > last {
            spans.push(Span::regular(&normalized[last..whole.start()]));
        }
        spans.push(Span::bold(inner.as_str()));
        last = whole.end();
    }
    if last < normalized.len() {
        spans.push(Span::regular(&normalized[last..]));
    }

    let mut lines: Vec<Line> = vec![Vec::new()];
    for span in spans {
        for (i, piece) in span.text.split('\n').enumerate() {
            if i > 0 {
                lines.push(Vec::new());
            }
            let text = strip_placeholders(piece);
            if text.is_empty() {
                continue;
            }
            if let Some(line) = lines.last_mut() {
                line.push(Span {
                    text,
                    bold: span.bold,
                });
            }
        }
    }
    lines
}
