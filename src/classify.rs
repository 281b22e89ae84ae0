//! Line classifier: lexical state machine over the whole file.
//!
//! Keywords are recognized only at the start of a line (after indentation
//! and modifier words) and only at the nesting level where they can occur:
//! the class header outside any body, member headers directly inside the
//! class body. Body nesting is tracked through `{` / `}` lines. The class
//! body and member bodies may open and close on indented lines; inside a
//! member body only column-0 braces count, which is how UDL exports lay out
//! member bodies, so braces in indented code never end a body early.

use crate::model::{Category, LogicalLine, MemberKind, SourceLine};
use crate::scan;
use regex::Regex;
use std::sync::LazyLock;

const MODIFIERS: &str = r"(?:(?:private|public|abstract|final)\s+)*";

static RE_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r#"(?i)^\s*{MODIFIERS}class\s+[%\w"]"#)).unwrap()
});

static RE_DIRECTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(?:include|includegenerator|import)\s+\S").unwrap());

/// Member rules, evaluated top to bottom; the first match wins.
static MEMBER_RULES: LazyLock<Vec<(Regex, MemberKind)>> = LazyLock::new(|| {
    [
        ("classmethod", MemberKind::ClassMethod),
        ("clientmethod", MemberKind::ClientMethod),
        ("method", MemberKind::Method),
        ("query", MemberKind::Query),
        ("property|relationship", MemberKind::Property),
        ("parameter", MemberKind::Parameter),
        ("index", MemberKind::Index),
        ("xdata", MemberKind::XData),
        ("storage", MemberKind::Storage),
    ]
    .into_iter()
    .map(|(keyword, kind)| {
        let pattern = format!(r#"(?i)^\s*{MODIFIERS}(?:{keyword})\s+[%\w"]"#);
        (Regex::new(&pattern).unwrap(), kind)
    })
    .collect()
});

/// Result of classifying a whole file.
#[derive(Debug)]
pub struct Classification {
    pub lines: Vec<LogicalLine>,
    pub has_class: bool,
}

#[derive(Default)]
struct Classifier {
    depth: usize,
    class_seen: bool,
    class_closed: bool,
    in_block_comment: bool,
    in_style: bool,
}

/// Classify every line of the file.
pub fn classify(lines: &[SourceLine]) -> Classification {
    let mut c = Classifier::default();
    let mut out = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let depth_before = c.depth;
        let (category, end) = c.step(lines, i);
        out.push(LogicalLine {
            lines: lines[i..end].to_vec(),
            category,
            depth_before,
            depth_after: c.depth,
        });
        i = end;
    }

    Classification {
        lines: out,
        has_class: c.class_seen,
    }
}

/// Match a line against the member rule table.
pub fn member_kind(line: &str) -> Option<MemberKind> {
    MEMBER_RULES
        .iter()
        .find(|(re, _)| re.is_match(line))
        .map(|(_, kind)| *kind)
}

/// `///` introduces a doc comment; `////` and longer runs do not.
pub fn is_doc_comment(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("///") && !trimmed.starts_with("////")
}

fn is_body_delimiter(line: &str) -> bool {
    line.starts_with('{') || line.starts_with('}')
}

impl Classifier {
    /// Classify the line at `start`; returns the category and the index
    /// one past the last physical line consumed.
    fn step(&mut self, lines: &[SourceLine], start: usize) -> (Category, usize) {
        let text = lines[start].text.as_str();
        let trimmed = text.trim_start();
        let single = start + 1;

        if self.in_block_comment {
            if text.contains("*/") {
                self.in_block_comment = false;
                return (Category::BlockCommentEnd, single);
            }
            return (Category::BlockCommentBody, single);
        }

        if self.depth >= 2 {
            return (self.body_line(text), single);
        }

        if trimmed.is_empty() {
            return (Category::Blank, single);
        }

        if is_doc_comment(trimmed) {
            return (Category::DocComment, single);
        }

        if trimmed.starts_with("/*") && !trimmed[2..].contains("*/") {
            self.in_block_comment = true;
            return (Category::BlockCommentStart, single);
        }

        if self.class_seen && !self.class_closed && is_body_delimiter(trimmed) {
            return (self.apply_delimiter(text), single);
        }

        if !self.class_seen {
            if RE_CLASS.is_match(text) {
                self.class_seen = true;
                return (Category::ClassHeader, join_header(lines, start));
            }
            if RE_DIRECTIVE.is_match(text) {
                return (Category::Directive, single);
            }
            return (Category::BodyText, single);
        }

        if self.depth == 1 {
            if let Some(kind) = member_kind(text) {
                return (Category::MemberHeader(kind), join_header(lines, start));
            }
        }

        (Category::BodyText, single)
    }

    /// Lines inside a member body: only column-0 braces matter.
    fn body_line(&mut self, text: &str) -> Category {
        let lower = text.trim_start().to_ascii_lowercase();
        if lower.starts_with("<style") {
            self.in_style = !lower.contains("</style>");
            return Category::BodyText;
        }
        if lower.starts_with("</style") {
            self.in_style = false;
            return Category::BodyText;
        }
        if !self.in_style && is_body_delimiter(text) {
            return self.apply_delimiter(text);
        }
        Category::BodyText
    }

    fn apply_delimiter(&mut self, text: &str) -> Category {
        let net = scan::brace_balance(text);
        let before = self.depth;
        self.depth = (self.depth as i32 + net).max(0) as usize;
        if before >= 1 && self.depth == 0 {
            self.class_closed = true;
        }
        match net {
            n if n > 0 => Category::BodyOpen,
            n if n < 0 => Category::BodyClose,
            _ => Category::BodyText,
        }
    }
}

/// Extend a header over following lines while `(`/`[` remain open.
/// Stops at end of file even if still unbalanced.
fn join_header(lines: &[SourceLine], start: usize) -> usize {
    let mut balance = scan::delimiter_balance(&lines[start].text);
    let mut end = start + 1;
    while balance > 0 && end < lines.len() {
        balance += scan::delimiter_balance(&lines[end].text);
        end += 1;
    }
    end
}
