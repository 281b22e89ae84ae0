//! Declaration translator: parses ObjectScript class and member headers
//! and renders C-like declarations.
//!
//! Parsing works on the joined logical line. Every entry point returns
//! [`FilterError::UnparsableDeclaration`] instead of guessing, so the
//! emitter can fall back to passing the source lines through.

pub mod class;
pub mod member;
pub mod method;

use crate::error::{FilterError, Result};
use crate::model::{Collection, LogicalLine, MemberDeclaration, MemberKind, TypeRef, Visibility};
use crate::scan;
use regex::Regex;
use std::sync::LazyLock;

/// Type used where the source declares none.
pub const PLACEHOLDER_TYPE: &str = "%String";

static RE_IDENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^%?[A-Za-z_][A-Za-z0-9_]*(?:\.%?[A-Za-z_][A-Za-z0-9_]*)*").unwrap()
});

static RE_MODIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(private|public|abstract|final)\s+").unwrap());

/// A translated header: generated doc lines followed by the declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    /// Complete `///` lines, without indentation.
    pub doc: Vec<String>,
    pub declaration: String,
}

/// Translate a member header of the given kind.
pub fn translate_member(kind: MemberKind, logical: &LogicalLine) -> Result<MemberDeclaration> {
    let text = logical.joined();
    let line = logical.number();
    if scan::delimiter_balance(&text) > 0 {
        return Err(FilterError::unparsable(kind.label(), line, "unbalanced delimiters"));
    }
    let parsed = match kind {
        MemberKind::Property => member::parse_property(&text),
        MemberKind::Parameter => member::parse_parameter(&text),
        MemberKind::Index => member::parse_index(&text),
        MemberKind::XData | MemberKind::Storage => member::parse_block(kind, &text),
        MemberKind::Method | MemberKind::ClassMethod | MemberKind::ClientMethod | MemberKind::Query => {
            method::parse(kind, &text)
        }
    };
    parsed.map_err(|reason| FilterError::unparsable(kind.label(), line, reason))
}

/// Render a member declaration. `has_body` controls whether a callable
/// ends in `;` or is left open for the body that follows.
pub fn render_member(decl: &MemberDeclaration, has_body: bool) -> Rendered {
    match decl.kind {
        MemberKind::Property => member::render_property(decl),
        MemberKind::Parameter => member::render_parameter(decl),
        MemberKind::Index => member::render_index(decl),
        MemberKind::XData => member::render_xdata(decl),
        MemberKind::Storage => member::render_storage(decl),
        _ => method::render(decl, has_body),
    }
}

// -- Shared grammar pieces ----------------------------------------------------

pub(crate) type Parse<'a, T> = std::result::Result<(T, &'a str), String>;

/// Identifier, possibly package-qualified and `%`-prefixed.
pub(crate) fn take_ident(s: &str) -> Parse<'_, String> {
    let s = s.trim_start();
    match RE_IDENT.find(s) {
        Some(m) => Ok((m.as_str().to_string(), &s[m.end()..])),
        None => Err(format!("expected identifier at `{}`", preview(s))),
    }
}

/// Leading modifier words (`private`, `abstract`, ...) normalized to the
/// bracket keyword spelling.
pub(crate) fn take_modifiers(s: &str) -> (Vec<String>, &str) {
    let mut rest = s.trim_start();
    let mut found = Vec::new();
    while let Some(caps) = RE_MODIFIER.captures(rest) {
        found.push(capitalize(&caps[1]));
        rest = rest[caps[0].len()..].trim_start();
    }
    (found, rest)
}

/// Member keyword, e.g. `Property` or `Relationship`.
pub(crate) fn take_keyword<'a>(s: &'a str, choices: &[&str]) -> Parse<'a, ()> {
    choices
        .iter()
        .find_map(|kw| scan::strip_word(s, kw))
        .map(|rest| ((), rest))
        .ok_or_else(|| format!("expected {}", choices.join(" or ")))
}

/// `Type`, `Type(params)`, `list Of Type`, `array Of Type`.
pub(crate) fn take_type(s: &str) -> Parse<'_, TypeRef> {
    let s = s.trim_start();
    let (collection, s) = if let Some(rest) = scan::strip_word(s, "list") {
        (Some(Collection::List), rest)
    } else if let Some(rest) = scan::strip_word(s, "array") {
        (Some(Collection::Array), rest)
    } else {
        (None, s)
    };
    let s = match collection {
        Some(_) => scan::strip_word(s, "Of").ok_or("expected `Of` after collection")?,
        None => s,
    };
    let (name, rest) = take_ident(s)?;
    let trimmed = rest.trim_start();
    let (params, rest) = if trimmed.starts_with('(') {
        let (inner, after) = scan::take_balanced(trimmed).ok_or("unbalanced type parameters")?;
        (Some(inner.trim().to_string()), after)
    } else {
        (None, rest)
    };
    Ok((
        TypeRef {
            name,
            collection,
            params,
        },
        rest,
    ))
}

/// Optional `As Type` clause.
pub(crate) fn take_as_type(s: &str) -> Parse<'_, Option<TypeRef>> {
    match scan::strip_word(s.trim_start(), "As") {
        Some(rest) => {
            let (ty, rest) = take_type(rest)?;
            Ok((Some(ty), rest))
        }
        None => Ok((None, s)),
    }
}

/// Optional `[ kw, kw = value ]` list.
pub(crate) fn take_keywords(s: &str) -> Parse<'_, Vec<String>> {
    let trimmed = s.trim_start();
    if !trimmed.starts_with('[') {
        return Ok((Vec::new(), s));
    }
    let (inner, rest) = scan::take_balanced(trimmed).ok_or("unbalanced keyword list")?;
    let keywords = scan::split_top_level(inner, ',')
        .into_iter()
        .map(str::to_string)
        .collect();
    Ok((keywords, rest))
}

/// Accept an optional `;` and an optional trailing `//` comment; anything
/// else left over is an error.
pub(crate) fn finish(s: &str, require_semicolon: bool) -> std::result::Result<Option<String>, String> {
    let mut rest = s.trim();
    match rest.strip_prefix(';') {
        Some(after) => rest = after.trim_start(),
        None if require_semicolon && !rest.is_empty() && !rest.starts_with("//") => {
            return Err(format!("unexpected text `{}`", preview(rest)));
        }
        None => {}
    }
    if rest.is_empty() {
        Ok(None)
    } else if rest.starts_with("//") {
        Ok(Some(rest.to_string()))
    } else {
        Err(format!("unexpected text `{}`", preview(rest)))
    }
}

pub(crate) fn visibility_of(keywords: &[String]) -> Visibility {
    if crate::model::has_keyword(keywords, "Private") {
        Visibility::Private
    } else {
        Visibility::Public
    }
}

/// `\par` doc lines for type parameters and keywords.
pub(crate) fn metadata_lines(type_params: Option<&str>, keywords: &[String]) -> Vec<String> {
    let mut doc = Vec::new();
    if let Some(params) = type_params.filter(|p| !p.is_empty()) {
        doc.push(r"/// \par Type parameters:".to_string());
        doc.push(format!("/// {params}"));
    }
    if !keywords.is_empty() {
        doc.push(r"/// \par Keywords:".to_string());
        doc.push(format!("/// {}", keywords.join(", ")));
    }
    doc
}

pub(crate) fn with_comment(declaration: String, comment: Option<&String>) -> String {
    match comment {
        Some(c) => format!("{declaration} {c}"),
        None => declaration,
    }
}

fn capitalize(word: &str) -> String {
    let lower = word.to_ascii_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

fn preview(s: &str) -> String {
    s.chars().take(24).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, SourceLine};

    fn logical(kind: MemberKind, lines: &[&str]) -> LogicalLine {
        LogicalLine {
            lines: lines
                .iter()
                .enumerate()
                .map(|(i, t)| SourceLine {
                    number: i + 7,
                    text: t.to_string(),
                })
                .collect(),
            category: Category::MemberHeader(kind),
            depth_before: 1,
            depth_after: 1,
        }
    }

    #[test]
    fn parses_type_with_params() {
        let (ty, rest) = take_type("%String(MAXLEN = 50, VALUELIST = \",a,b\") [ Required ]").unwrap();
        assert_eq!(ty.name, "%String");
        assert_eq!(ty.params.as_deref(), Some("MAXLEN = 50, VALUELIST = \",a,b\""));
        assert_eq!(rest.trim(), "[ Required ]");
    }

    #[test]
    fn parses_collection_type() {
        let (ty, _) = take_type("list Of Demo.Item;").unwrap();
        assert_eq!(ty.collection, Some(Collection::List));
        assert_eq!(ty.render(), "list<Demo.Item>");
    }

    #[test]
    fn modifiers_are_normalized() {
        let (mods, rest) = take_modifiers("private ABSTRACT Method X()");
        assert_eq!(mods, vec!["Private", "Abstract"]);
        assert_eq!(rest, "Method X()");
    }

    #[test]
    fn finish_keeps_trailing_comment() {
        assert_eq!(finish(" ; // note", true), Ok(Some("// note".to_string())));
        assert_eq!(finish("", true), Ok(None));
        assert!(finish(" junk", true).is_err());
    }

    #[test]
    fn metadata_lists_params_and_keywords() {
        let doc = metadata_lines(Some("MAXLEN = 5"), &["Required".to_string()]);
        assert_eq!(
            doc,
            vec![
                r"/// \par Type parameters:",
                "/// MAXLEN = 5",
                r"/// \par Keywords:",
                "/// Required",
            ]
        );
    }

    #[test]
    fn unbalanced_member_is_unparsable() {
        let err = translate_member(MemberKind::Method, &logical(MemberKind::Method, &["Method Run(a As %String,"]))
            .unwrap_err();
        match err {
            FilterError::UnparsableDeclaration { line, .. } => assert_eq!(line, 7),
            other => panic!("unexpected error: {other}"),
        }
    }
}
