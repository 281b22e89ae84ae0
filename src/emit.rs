//! Emitter: walks the classified lines in source order and writes the
//! translated text.
//!
//! Nothing is ever dropped. Lines that are not headers, doc comments or
//! body delimiters are copied verbatim, and a header that fails to parse
//! is copied verbatim together with its continuation lines. Its doc block
//! is demoted to plain `//` comments so it cannot attach to another member.
//!
//! Inside the class body, `//` comments and `/* ... */` blocks become `///`
//! lines documenting the next member.

use crate::classify::{self, Classification};
use crate::doc;
use crate::error::{FilterError, Result};
use crate::model::{Category, ClassDeclaration, LogicalLine, MemberKind, Visibility};
use crate::reader::SourceText;
use crate::translate::{self, class, member};
use tracing::{debug, trace, warn};

/// How lines inside the current member body are written.
#[derive(Debug)]
enum BodyMode {
    /// Verbatim: method code, and bodies of members that failed to parse.
    Code,
    /// Collected and written as a code block once the body closes.
    XData {
        language: &'static str,
        declaration: String,
        indent: String,
        content: Vec<String>,
    },
    /// Commented out line by line.
    Storage,
}

/// State threaded through the translation of one file.
#[derive(Debug)]
pub struct TranslationContext {
    class: ClassDeclaration,
    class_comment: Option<String>,
    class_opened: bool,
    class_closed: bool,
    /// A `/*` block was copied verbatim and its `*/` has not been seen.
    comment_open: bool,
    /// Access section currently in effect; `None` until the first member.
    section: Option<Visibility>,
    /// Doc comment lines (and blank lines between them) waiting for the
    /// declaration they document.
    pending: Vec<String>,
    body: BodyMode,
    members: usize,
    out: Vec<String>,
}

/// Translate a whole file. Files without a usable class header come back
/// byte-for-byte unchanged.
pub fn translate(source: &SourceText) -> Vec<u8> {
    match translate_lines(source) {
        Ok(lines) => source.encode(&lines),
        Err(FilterError::NoClassFound) => {
            debug!("No class header found, passing input through");
            source.raw.clone()
        }
        Err(e) => {
            warn!("{e}; passing input through");
            source.raw.clone()
        }
    }
}

/// Translate to output lines, without terminators.
pub fn translate_lines(source: &SourceText) -> Result<Vec<String>> {
    let Classification { lines, has_class } = classify::classify(&source.lines);
    if !has_class {
        return Err(FilterError::NoClassFound);
    }
    let header = lines
        .iter()
        .find(|l| l.category == Category::ClassHeader)
        .ok_or(FilterError::NoClassFound)?;
    let (decl, comment) = class::parse(header)?;

    let mut ctx = TranslationContext::new(decl, comment);
    for idx in 0..lines.len() {
        ctx.step(&lines, idx);
    }
    let depth = lines.last().map(|l| l.depth_after).unwrap_or(0);
    debug!("Translated class {} with {} members", ctx.class.name, ctx.members);
    Ok(ctx.finish(depth))
}

/// Whether the next non-blank line opens a member body.
fn body_follows(lines: &[LogicalLine], idx: usize) -> bool {
    lines[idx + 1..]
        .iter()
        .find(|l| l.category != Category::Blank)
        .is_some_and(|l| l.category == Category::BodyOpen && l.depth_before == 1)
}

fn commented(text: &str) -> String {
    if text.is_empty() {
        "//".to_string()
    } else {
        format!("// {text}")
    }
}

impl TranslationContext {
    pub fn new(class: ClassDeclaration, class_comment: Option<String>) -> Self {
        TranslationContext {
            class,
            class_comment,
            class_opened: false,
            class_closed: false,
            comment_open: false,
            section: None,
            pending: Vec::new(),
            body: BodyMode::Code,
            members: 0,
            out: Vec::new(),
        }
    }

    fn step(&mut self, lines: &[LogicalLine], idx: usize) {
        let logical = &lines[idx];
        match logical.category {
            Category::Blank if self.pending.is_empty() => self.out.push(logical.first().to_string()),
            Category::Blank | Category::DocComment => self.pending.push(logical.first().to_string()),
            Category::Directive => {
                self.flush_pending();
                self.out.push(commented(logical.first().trim()));
            }
            Category::ClassHeader => self.emit_class(logical),
            Category::MemberHeader(kind) => self.emit_member(kind, lines, idx),
            Category::BodyOpen => self.body_open(logical),
            Category::BodyClose => self.body_close(logical),
            Category::BlockCommentStart
            | Category::BlockCommentBody
            | Category::BlockCommentEnd
            | Category::BodyText => {
                if logical.depth_before >= 2 {
                    self.body_line(logical.first());
                } else if logical.depth_before == 1 {
                    self.class_level_line(logical);
                } else {
                    self.flush_pending();
                    self.push_verbatim(logical);
                    match logical.category {
                        Category::BlockCommentStart => self.comment_open = true,
                        Category::BlockCommentEnd => self.comment_open = false,
                        _ => {}
                    }
                }
            }
        }
    }

    /// Non-header line directly inside the class body. Comments are kept
    /// as doc lines for the next member; anything else is copied.
    fn class_level_line(&mut self, logical: &LogicalLine) {
        let indent = logical.indent();
        let trimmed = logical.first().trim();
        match logical.category {
            Category::BlockCommentStart => {
                self.push_comment_doc(indent, trimmed[2..].trim_start_matches('*'), false);
            }
            // continuation lines are aligned under `/*`; that indent is dropped
            Category::BlockCommentBody => {
                self.push_comment_doc("", trimmed.strip_prefix('*').unwrap_or(trimmed), true);
            }
            Category::BlockCommentEnd => {
                let (inner, rest) = trimmed.split_once("*/").unwrap_or((trimmed, ""));
                self.push_comment_doc("", inner.trim_start_matches('*'), false);
                let rest = rest.trim();
                if !rest.is_empty() {
                    self.pending.push(format!("{indent}{rest}"));
                }
            }
            _ if trimmed.starts_with("//") => {
                self.push_comment_doc(indent, trimmed.trim_start_matches('/'), true);
            }
            _ if trimmed.len() >= 4 && trimmed.starts_with("/*") && trimmed.ends_with("*/") => {
                let inner = &trimmed[2..trimmed.len() - 2];
                self.push_comment_doc(indent, inner.trim_matches('*'), false);
            }
            _ => {
                self.flush_pending();
                self.push_verbatim(logical);
            }
        }
    }

    fn push_comment_doc(&mut self, indent: &str, content: &str, keep_empty: bool) {
        let content = content.trim();
        if !content.is_empty() {
            self.pending.push(format!("{indent}/// {content}"));
        } else if keep_empty {
            self.pending.push(format!("{indent}///"));
        }
    }

    fn emit_class(&mut self, logical: &LogicalLine) {
        let rendered = class::render(&self.class, self.class_comment.as_ref());
        let indent = logical.indent().to_string();
        self.flush_pending();
        self.out.extend(rendered.doc.iter().map(|l| format!("{indent}{l}")));
        self.out.push(format!("{indent}{}", rendered.declaration));
    }

    fn emit_member(&mut self, kind: MemberKind, lines: &[LogicalLine], idx: usize) {
        let logical = &lines[idx];
        let decl = match translate::translate_member(kind, logical) {
            Ok(decl) => decl,
            Err(e) => {
                warn!("{e}; passing it through");
                self.flush_pending_plain();
                self.push_verbatim(logical);
                self.body = BodyMode::Code;
                return;
            }
        };

        let has_body = body_follows(lines, idx);
        let rendered = translate::render_member(&decl, has_body);
        let indent = logical.indent().to_string();

        if kind != MemberKind::Storage && self.section != Some(decl.visibility) {
            self.out.push(decl.visibility.specifier().to_string());
            self.section = Some(decl.visibility);
        }
        self.flush_pending();
        self.out.extend(rendered.doc.iter().map(|l| format!("{indent}{l}")));
        self.members += 1;

        self.body = match kind {
            MemberKind::XData if has_body => BodyMode::XData {
                language: member::xdata_language(&decl),
                declaration: rendered.declaration,
                indent,
                content: Vec::new(),
            },
            MemberKind::Storage => {
                self.out.push(format!("{indent}{}", rendered.declaration));
                BodyMode::Storage
            }
            _ => {
                self.out.push(format!("{indent}{}", rendered.declaration));
                BodyMode::Code
            }
        };
    }

    fn body_open(&mut self, logical: &LogicalLine) {
        match logical.depth_before {
            0 => {
                self.flush_pending();
                self.push_verbatim(logical);
                self.enter_class_body();
            }
            1 => {
                self.flush_pending();
                match self.body {
                    BodyMode::Code => self.push_verbatim(logical),
                    BodyMode::Storage => self.out.push(commented(logical.first())),
                    // the braces around an XData body are not part of the block
                    BodyMode::XData { .. } => {}
                }
            }
            _ => self.body_line(logical.first()),
        }
    }

    /// Start the class body; abstract classes get their pure virtual
    /// destructor as the first member.
    fn enter_class_body(&mut self) {
        self.class_opened = true;
        self.section = None;
        if let Some(destructor) = class::abstract_destructor(&self.class) {
            self.out.push(Visibility::Public.specifier().to_string());
            self.out.push(destructor);
            self.section = Some(Visibility::Public);
        }
    }

    fn body_close(&mut self, logical: &LogicalLine) {
        match logical.depth_after {
            0 => {
                self.flush_pending();
                self.out.push(format!("{}}};", logical.indent()));
                self.class_closed = true;
            }
            1 => self.finish_member(logical.first()),
            _ => self.body_line(logical.first()),
        }
    }

    /// A line inside a member body.
    fn body_line(&mut self, text: &str) {
        match &mut self.body {
            BodyMode::Code => self.out.push(text.to_string()),
            BodyMode::Storage => self.out.push(commented(text)),
            BodyMode::XData { content, .. } => content.push(text.to_string()),
        }
    }

    /// Close the current member body with `close`, its closing line.
    fn finish_member(&mut self, close: &str) {
        match std::mem::replace(&mut self.body, BodyMode::Code) {
            BodyMode::Code => self.out.push(close.to_string()),
            BodyMode::Storage => self.out.push(commented(close)),
            BodyMode::XData {
                language,
                declaration,
                indent,
                content,
            } => {
                self.out.push(format!(r"{indent}/// \code{language}"));
                for line in content {
                    if line.is_empty() {
                        self.out.push(format!("{indent}///"));
                    } else {
                        self.out.push(format!("{indent}/// {line}"));
                    }
                }
                self.out.push(format!(r"{indent}/// \endcode"));
                self.out.push(format!("{indent}{declaration}"));
            }
        }
    }

    /// Write the pending doc lines, rewriting each run of `///` lines as
    /// one block.
    fn flush_pending(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        let mut run: Vec<&str> = Vec::new();
        for line in &pending {
            if classify::is_doc_comment(line) {
                run.push(line);
            } else {
                self.emit_doc(&mut run);
                self.out.push(line.clone());
            }
        }
        self.emit_doc(&mut run);
    }

    fn emit_doc(&mut self, run: &mut Vec<&str>) {
        if run.is_empty() {
            return;
        }
        let block = doc::parse_block(run.drain(..));
        trace!("Doc block of {} lines", block.lines.len());
        self.out.extend(doc::render(&block));
    }

    /// Write the pending doc lines as plain `//` comments, tags untouched.
    fn flush_pending_plain(&mut self) {
        for line in std::mem::take(&mut self.pending) {
            let plain = match line.find("///") {
                Some(pos) if classify::is_doc_comment(&line) => {
                    format!("{}//{}", &line[..pos], &line[pos + 3..])
                }
                _ => line,
            };
            self.out.push(plain);
        }
    }

    fn push_verbatim(&mut self, logical: &LogicalLine) {
        self.out.extend(logical.lines.iter().map(|l| l.text.clone()));
    }

    /// Flush what is left and close any bodies still open at end of file.
    fn finish(mut self, depth: usize) -> Vec<String> {
        self.flush_pending();
        if !self.class_closed {
            if self.comment_open {
                self.out.push("*/".to_string());
            }
            if !self.class_opened {
                self.out.push("{".to_string());
                self.enter_class_body();
            }
            for level in (2..=depth).rev() {
                if level == 2 {
                    self.finish_member("}");
                } else {
                    self.body_line("}");
                }
            }
            self.out.push("};".to_string());
        }
        self.out
    }
}
