//! Doc-comment rewriter.
//!
//! Source doc comments tag segments with `@tag`. Tags listed in the alias
//! table become the generator's cross-reference commands (`\Parameter`,
//! `\Property`, ...); every other byte of the line is left untouched.
//!
//! The alias names must match the generator's `ALIASES` configuration,
//! which `--print-aliases` produces from [`Alias::ALL`].

use crate::model::{DocComment, DocLine, TagSegment};
use regex::Regex;
use std::sync::LazyLock;

/// `@tag` at the start of the text or after whitespace.
static RE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|\s)@([A-Za-z][A-Za-z0-9_]*)").unwrap());

/// Generator cross-reference categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alias {
    Parameter,
    Property,
    ClassMethod,
    Method,
    Index,
}

impl Alias {
    pub const ALL: [Alias; 5] = [
        Alias::Parameter,
        Alias::Property,
        Alias::ClassMethod,
        Alias::Method,
        Alias::Index,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Alias::Parameter => "Parameter",
            Alias::Property => "Property",
            Alias::ClassMethod => "ClassMethod",
            Alias::Method => "Method",
            Alias::Index => "Index",
        }
    }

    fn plural(self) -> &'static str {
        match self {
            Alias::Parameter => "Parameters",
            Alias::Property => "Properties",
            Alias::ClassMethod => "Class Methods",
            Alias::Method => "Methods",
            Alias::Index => "Indexes",
        }
    }

    /// Doxyfile `ALIASES` entry defining this alias as an `\xrefitem`.
    pub fn doxygen_definition(self) -> String {
        let key = self.plural().to_ascii_lowercase().replace(' ', "");
        format!(
            "ALIASES += {}=\"\\xrefitem {} \\\"{}\\\" \\\"{}\\\"\"",
            self.name(),
            key,
            self.name(),
            self.plural()
        )
    }
}

/// Result of looking a source tag up in the alias table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagMapping<'a> {
    Alias(Alias),
    Passthrough(&'a str),
}

/// Total mapping from a source tag name to its rendering.
pub fn map_tag(tag: &str) -> TagMapping<'_> {
    match tag.to_ascii_lowercase().as_str() {
        "param" | "parameter" => TagMapping::Alias(Alias::Parameter),
        "property" => TagMapping::Alias(Alias::Property),
        "classmethod" => TagMapping::Alias(Alias::ClassMethod),
        "method" => TagMapping::Alias(Alias::Method),
        "index" => TagMapping::Alias(Alias::Index),
        _ => TagMapping::Passthrough(tag),
    }
}

/// Split one `///` line into its leader and tag segments.
pub fn parse_line(line: &str) -> DocLine {
    let start = line.find("///").map(|p| p + 3).unwrap_or(0);
    let (leader, text) = line.split_at(start);

    let mut segments = Vec::new();
    let mut cursor = 0;
    let mut tag: Option<String> = None;
    for caps in RE_TAG.captures_iter(text) {
        let (Some(ws), Some(name)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        // The separating whitespace stays with the previous segment.
        let at = ws.end();
        if at > cursor || tag.is_some() {
            segments.push(TagSegment {
                tag: tag.take(),
                body: text[cursor..at].to_string(),
            });
        }
        tag = Some(name.as_str().to_string());
        cursor = name.end();
    }
    if cursor < text.len() || tag.is_some() || segments.is_empty() {
        segments.push(TagSegment {
            tag,
            body: text[cursor..].to_string(),
        });
    }

    DocLine {
        leader: leader.to_string(),
        segments,
    }
}

/// Build a doc comment from consecutive `///` lines.
pub fn parse_block<'a>(lines: impl IntoIterator<Item = &'a str>) -> DocComment {
    DocComment {
        lines: lines.into_iter().map(parse_line).collect(),
    }
}

pub fn render_line(line: &DocLine) -> String {
    let mut out = line.leader.clone();
    for segment in &line.segments {
        if let Some(tag) = &segment.tag {
            match map_tag(tag) {
                TagMapping::Alias(alias) => {
                    out.push('\\');
                    out.push_str(alias.name());
                }
                TagMapping::Passthrough(original) => {
                    out.push('@');
                    out.push_str(original);
                }
            }
        }
        out.push_str(&segment.body);
    }
    out
}

pub fn render(doc: &DocComment) -> Vec<String> {
    doc.lines.iter().map(render_line).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewrite_line(line: &str) -> String {
        render_line(&parse_line(line))
    }

    #[test]
    fn param_becomes_parameter_alias() {
        assert_eq!(
            rewrite_line("/// @param name  The  name, verbatim."),
            "/// \\Parameter name  The  name, verbatim."
        );
    }

    #[test]
    fn prose_is_untouched() {
        let line = "  /// Returns <var>x</var> when   done.";
        assert_eq!(rewrite_line(line), line);
    }

    #[test]
    fn unknown_tags_pass_through() {
        let line = "/// @return the count @author someone";
        assert_eq!(rewrite_line(line), line);
    }

    #[test]
    fn email_is_not_a_tag() {
        let line = "/// Contact admin@example.com for access";
        assert_eq!(rewrite_line(line), line);
    }

    #[test]
    fn multiple_segments_on_one_line() {
        let doc = parse_line("/// See @method Save and @property Name.");
        let tags: Vec<Option<&str>> = doc.segments.iter().map(|s| s.tag.as_deref()).collect();
        assert_eq!(tags, vec![None, Some("method"), Some("property")]);
        assert_eq!(
            render_line(&doc),
            "/// See \\Method Save and \\Property Name."
        );
    }

    #[test]
    fn tag_at_line_start_without_space() {
        assert_eq!(rewrite_line("///@index NameIdx"), "///\\Index NameIdx");
    }

    #[test]
    fn tag_matching_is_case_insensitive() {
        assert_eq!(map_tag("ClassMethod"), TagMapping::Alias(Alias::ClassMethod));
        assert_eq!(map_tag("PARAMETER"), TagMapping::Alias(Alias::Parameter));
        assert_eq!(map_tag("see"), TagMapping::Passthrough("see"));
    }

    #[test]
    fn empty_doc_line() {
        assert_eq!(rewrite_line("///"), "///");
    }

    #[test]
    fn block_keeps_line_order() {
        let block = parse_block(["/// first", "/// @param a second"]);
        assert_eq!(block.lines.len(), 2);
        assert_eq!(render(&block), vec!["/// first", "/// \\Parameter a second"]);
    }

    #[test]
    fn alias_definitions() {
        assert_eq!(
            Alias::ClassMethod.doxygen_definition(),
            r#"ALIASES += ClassMethod="\xrefitem classmethods \"ClassMethod\" \"Class Methods\"""#
        );
        assert_eq!(Alias::ALL.len(), 5);
    }
}
