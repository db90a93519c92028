//! Inline scene markup.
//!
//! Scene content carries the editor's annotation constructs:
//!
//! | Construct          | Meaning                  | Plain text |
//! |--------------------|--------------------------|------------|
//! | `@q{...}q@`        | direct speech            | `"..."`    |
//! | `@Q[Name]{...}Q@`  | special quote for `Name` | `«...»`    |
//! | `@e{...}e@`        | emphasis (italics)       | `...`      |
//! | `@b{...}b@`        | bold                     | `...`      |
//!
//! Constructs nest. Markers that never find their partner are kept
//! verbatim so no text is silently lost.

use std::sync::LazyLock;

use regex::Regex;

/// Regex matching any opening or closing marker.
pub const MARKER_PATTERN: &str = r"@[qeb]\{|@Q\[[^\]\{\}]*\]\{|\}[qQeb]@";

static MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(MARKER_PATTERN).expect("valid regex"));

/// The four construct kinds, keyed by their marker letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Construct {
    Speech,
    SpecialQuote,
    Emphasis,
    Bold,
}

impl Construct {
    fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'q' => Some(Self::Speech),
            'Q' => Some(Self::SpecialQuote),
            'e' => Some(Self::Emphasis),
            'b' => Some(Self::Bold),
            _ => None,
        }
    }

    fn open_glyph(self) -> &'static str {
        match self {
            Self::Speech => "\"",
            Self::SpecialQuote => "«",
            Self::Emphasis | Self::Bold => "",
        }
    }

    fn close_glyph(self) -> &'static str {
        match self {
            Self::Speech => "\"",
            Self::SpecialQuote => "»",
            Self::Emphasis | Self::Bold => "",
        }
    }
}

/// An opener waiting for its closer.
struct Open<'a> {
    construct: Construct,
    /// Byte offset in the output where the open glyph was written.
    at: usize,
    raw: &'a str,
}

/// Convert annotated scene content to plain text.
pub fn to_plain_text(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut stack: Vec<Open<'_>> = Vec::new();
    let mut last = 0;

    for m in MARKER_RE.find_iter(content) {
        out.push_str(&content[last..m.start()]);
        last = m.end();

        let raw = m.as_str();
        if raw.starts_with('@') {
            let Some(construct) = raw.chars().nth(1).and_then(Construct::from_letter) else {
                out.push_str(raw);
                continue;
            };
            stack.push(Open {
                construct,
                at: out.len(),
                raw,
            });
            out.push_str(construct.open_glyph());
        } else {
            let closing = raw.chars().nth(1).and_then(Construct::from_letter);
            match (closing, stack.last()) {
                (Some(c), Some(open)) if open.construct == c => {
                    stack.pop();
                    out.push_str(c.close_glyph());
                }
                _ => out.push_str(raw),
            }
        }
    }
    out.push_str(&content[last..]);

    // Unclosed openers: restore their raw text, innermost first so earlier
    // offsets stay valid.
    while let Some(open) = stack.pop() {
        let glyph_len = open.construct.open_glyph().len();
        out.replace_range(open.at..open.at + glyph_len, open.raw);
    }

    out
}
