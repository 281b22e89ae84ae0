//! Data members: properties, parameters, indexes, XData and Storage blocks.

use super::{
    finish, metadata_lines, take_as_type, take_ident, take_keyword, take_keywords, take_modifiers,
    visibility_of, with_comment, Rendered, PLACEHOLDER_TYPE,
};
use crate::model::{MemberDeclaration, MemberKind};
use crate::scan;

type Parsed = std::result::Result<MemberDeclaration, String>;

/// `Property Name As Type(params) [ keywords ];`
pub fn parse_property(text: &str) -> Parsed {
    let (mut keywords, rest) = take_modifiers(text);
    let (_, rest) = take_keyword(rest, &["Property", "Relationship"])?;
    let (name, rest) = take_ident(rest)?;
    let (ty, rest) = take_as_type(rest)?;
    let (bracketed, rest) = take_keywords(rest)?;
    keywords.extend(bracketed);
    let comment = finish(rest, true)?;

    let mut decl = MemberDeclaration::new(MemberKind::Property, &name);
    decl.ty = ty;
    decl.visibility = visibility_of(&keywords);
    decl.keywords = keywords;
    decl.trailing_comment = comment;
    Ok(decl)
}

/// `Parameter NAME As Type [ keywords ] = value;`
pub fn parse_parameter(text: &str) -> Parsed {
    let (mut keywords, rest) = take_modifiers(text);
    let (_, rest) = take_keyword(rest, &["Parameter"])?;
    let (name, rest) = take_ident(rest)?;
    let (ty, rest) = take_as_type(rest)?;
    let (bracketed, rest) = take_keywords(rest)?;
    keywords.extend(bracketed);

    let rest = rest.trim_start();
    let (value, comment) = match rest.strip_prefix('=') {
        Some(after) => {
            let (value, tail) = match scan::find_top_level(after, ";") {
                Some(pos) => (&after[..pos], &after[pos..]),
                None => match scan::find_top_level(after, "//") {
                    Some(pos) => (&after[..pos], &after[pos..]),
                    None => (after, ""),
                },
            };
            let value = value.trim();
            if value.is_empty() {
                return Err("missing parameter value".to_string());
            }
            (Some(value.to_string()), finish(tail, true)?)
        }
        None => (None, finish(rest, true)?),
    };

    let mut decl = MemberDeclaration::new(MemberKind::Parameter, &name);
    decl.ty = ty;
    decl.value = value;
    decl.keywords = keywords;
    decl.trailing_comment = comment;
    Ok(decl)
}

/// `Index Name On (A, B As Exact) [ keywords ];`. `On` is optional for
/// extent indexes.
pub fn parse_index(text: &str) -> Parsed {
    let (mut keywords, rest) = take_modifiers(text);
    let (_, rest) = take_keyword(rest, &["Index"])?;
    let (name, rest) = take_ident(rest)?;

    let rest = rest.trim_start();
    let (fields, rest) = match scan::strip_word(rest, "On") {
        Some(after) if after.starts_with('(') => {
            let (inner, after) = scan::take_balanced(after).ok_or("unbalanced index fields")?;
            let mut fields = Vec::new();
            for field in scan::split_top_level(inner, ',') {
                fields.push(take_ident(field)?.0);
            }
            (fields, after)
        }
        Some(after) => {
            let (field, after) = take_ident(after)?;
            // `On Name As Exact` collation
            let after = match scan::strip_word(after.trim_start(), "As") {
                Some(collation) => take_ident(collation)?.1,
                None => after,
            };
            (vec![field], after)
        }
        None => (Vec::new(), rest),
    };

    let (bracketed, rest) = take_keywords(rest)?;
    keywords.extend(bracketed);
    let comment = finish(rest, true)?;

    let mut decl = MemberDeclaration::new(MemberKind::Index, &name);
    decl.index_fields = fields;
    decl.keywords = keywords;
    decl.trailing_comment = comment;
    Ok(decl)
}

/// `XData Name [ MimeType = ... ]` and `Storage Name` block headers.
pub fn parse_block(kind: MemberKind, text: &str) -> Parsed {
    let (mut keywords, rest) = take_modifiers(text);
    let keyword = if kind == MemberKind::XData { "XData" } else { "Storage" };
    let (_, rest) = take_keyword(rest, &[keyword])?;
    let (name, rest) = take_ident(rest)?;
    let (bracketed, rest) = take_keywords(rest)?;
    keywords.extend(bracketed);
    let comment = finish(rest, false)?;

    let mut decl = MemberDeclaration::new(kind, &name);
    decl.keywords = keywords;
    decl.trailing_comment = comment;
    Ok(decl)
}

pub fn render_property(decl: &MemberDeclaration) -> Rendered {
    let ty = decl
        .ty
        .as_ref()
        .map(|t| t.render())
        .unwrap_or_else(|| PLACEHOLDER_TYPE.to_string());
    let params = decl.ty.as_ref().and_then(|t| t.params.as_deref());
    Rendered {
        doc: metadata_lines(params, &decl.keywords),
        declaration: with_comment(format!("{ty} {};", decl.name), decl.trailing_comment.as_ref()),
    }
}

pub fn render_parameter(decl: &MemberDeclaration) -> Rendered {
    let ty = decl
        .ty
        .as_ref()
        .map(|t| t.render())
        .unwrap_or_else(|| inferred_parameter_type(decl.value.as_deref()).to_string());
    let value = decl.value.as_deref().unwrap_or("\"\"");
    let params = decl.ty.as_ref().and_then(|t| t.params.as_deref());
    Rendered {
        doc: metadata_lines(params, &decl.keywords),
        declaration: with_comment(
            format!("const {ty} {} = {value};", decl.name),
            decl.trailing_comment.as_ref(),
        ),
    }
}

/// Type of an untyped parameter, from the shape of its value.
fn inferred_parameter_type(value: Option<&str>) -> &'static str {
    match value {
        Some("0" | "1") => "%Boolean",
        Some(v) if is_integer(v) => "%Integer",
        Some(v) if v.len() >= 2 && v.starts_with('"') && v.ends_with('"') => "%String",
        _ => "auto",
    }
}

fn is_integer(value: &str) -> bool {
    let digits = value.strip_prefix('-').unwrap_or(value);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Indexes have no C++ equivalent: the `\Index` alias line carries the
/// name and covered fields, followed by a no-op declaration.
pub fn render_index(decl: &MemberDeclaration) -> Rendered {
    let mut doc = metadata_lines(None, &decl.keywords);
    if decl.index_fields.is_empty() {
        doc.push(format!(r"/// \Index {}", decl.name));
    } else {
        doc.push(format!(r"/// \Index {} On {}", decl.name, decl.index_fields.join(", ")));
    }
    Rendered {
        doc,
        declaration: with_comment(format!("Index {};", decl.name), decl.trailing_comment.as_ref()),
    }
}

/// Header part of an XData block; the emitter adds the body as a code
/// block once the body has been read.
pub fn render_xdata(decl: &MemberDeclaration) -> Rendered {
    Rendered {
        doc: metadata_lines(None, &decl.keywords),
        declaration: with_comment(format!("XData {};", decl.name), decl.trailing_comment.as_ref()),
    }
}

/// Storage definitions carry no API: the header becomes a plain comment.
pub fn render_storage(decl: &MemberDeclaration) -> Rendered {
    let mut declaration = format!("// Storage {}", decl.name);
    if !decl.keywords.is_empty() {
        declaration.push_str(&format!(" [ {} ]", decl.keywords.join(", ")));
    }
    Rendered {
        doc: Vec::new(),
        declaration: with_comment(declaration, decl.trailing_comment.as_ref()),
    }
}

/// Doxygen code-block language for an XData MIME type.
pub fn xdata_language(decl: &MemberDeclaration) -> &'static str {
    let mime = decl
        .keywords
        .iter()
        .find_map(|k| {
            let (key, value) = k.split_once('=')?;
            key.trim().eq_ignore_ascii_case("MimeType").then(|| value.trim().to_ascii_lowercase())
        })
        .unwrap_or_else(|| "application/xml".to_string());
    if mime.contains("json") {
        "{.json}"
    } else if mime.contains("xml") || mime.contains("html") {
        "{.xml}"
    } else {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_with_type_params_and_keywords() {
        let decl = parse_property("Property Name As %String(MAXLEN = 50) [ Required ];").unwrap();
        let rendered = render_property(&decl);
        assert_eq!(rendered.declaration, "%String Name;");
        assert_eq!(
            rendered.doc,
            vec![
                r"/// \par Type parameters:",
                "/// MAXLEN = 50",
                r"/// \par Keywords:",
                "/// Required",
            ]
        );
    }

    #[test]
    fn untyped_property_uses_placeholder() {
        let decl = parse_property("Property Notes;").unwrap();
        assert_eq!(render_property(&decl).declaration, "%String Notes;");
    }

    #[test]
    fn private_property() {
        let decl = parse_property("Property Secret As %String [ Private ];").unwrap();
        assert_eq!(decl.visibility, crate::model::Visibility::Private);
    }

    #[test]
    fn relationship_is_a_property() {
        let decl =
            parse_property("Relationship Items As Demo.Item [ Cardinality = many, Inverse = Owner ];").unwrap();
        assert_eq!(render_property(&decl).declaration, "Demo.Item Items;");
    }

    #[test]
    fn collection_property() {
        let decl = parse_property("Property Tags As list Of %String;").unwrap();
        assert_eq!(render_property(&decl).declaration, "list<%String> Tags;");
    }

    #[test]
    fn property_keeps_trailing_comment() {
        let decl = parse_property("Property Age As %Integer; // years").unwrap();
        assert_eq!(render_property(&decl).declaration, "%Integer Age; // years");
    }

    #[test]
    fn property_rejects_missing_name() {
        assert!(parse_property("Property As %String;").is_err());
        assert!(parse_property("Property ;").is_err());
        assert!(parse_property("Property X As %String junk;").is_err());
    }

    #[test]
    fn untyped_parameter_type_follows_value() {
        let cases = [
            ("Parameter DEBUG = 1;", "const %Boolean DEBUG = 1;"),
            ("Parameter VERSION = 12;", "const %Integer VERSION = 12;"),
            ("Parameter OFFSET = -3;", "const %Integer OFFSET = -3;"),
            ("Parameter NAME = \"demo\";", "const %String NAME = \"demo\";"),
            ("Parameter RATE = 1.5;", "const auto RATE = 1.5;"),
            ("Parameter NOW = {$ZH};", "const auto NOW = {$ZH};"),
        ];
        for (source, expected) in cases {
            let decl = parse_parameter(source).unwrap();
            assert_eq!(render_parameter(&decl).declaration, expected, "{source}");
        }
    }

    #[test]
    fn typed_parameter_with_string_value() {
        let decl = parse_parameter("Parameter GREETING As %String = \"a;b\";").unwrap();
        assert_eq!(
            render_parameter(&decl).declaration,
            "const %String GREETING = \"a;b\";"
        );
    }

    #[test]
    fn parameter_without_value() {
        let decl = parse_parameter("Parameter EMPTY;").unwrap();
        assert_eq!(render_parameter(&decl).declaration, "const auto EMPTY = \"\";");
    }

    #[test]
    fn parameter_with_keywords_before_value() {
        let decl = parse_parameter("Parameter LIMIT As %Integer [ Final ] = 10; // cap").unwrap();
        let rendered = render_parameter(&decl);
        assert_eq!(rendered.declaration, "const %Integer LIMIT = 10; // cap");
        assert_eq!(rendered.doc, vec![r"/// \par Keywords:", "/// Final"]);
    }

    #[test]
    fn index_on_field_list() {
        let decl = parse_index("Index NameIdx On (Name, Age As Exact) [ Unique ];").unwrap();
        assert_eq!(decl.index_fields, vec!["Name", "Age"]);
        let rendered = render_index(&decl);
        assert_eq!(rendered.declaration, "Index NameIdx;");
        assert_eq!(
            rendered.doc,
            vec![r"/// \par Keywords:", "/// Unique", r"/// \Index NameIdx On Name, Age"]
        );
    }

    #[test]
    fn index_on_single_field_with_collation() {
        let decl = parse_index("Index CodeIdx On Code As SQLUPPER;").unwrap();
        assert_eq!(decl.index_fields, vec!["Code"]);
    }

    #[test]
    fn extent_index_without_fields() {
        let decl = parse_index("Index Ext [ Extent, Type = bitmap ];").unwrap();
        assert!(decl.index_fields.is_empty());
        assert_eq!(render_index(&decl).doc.last().unwrap(), r"/// \Index Ext");
    }

    #[test]
    fn xdata_language_from_mime_type() {
        let decl = parse_block(MemberKind::XData, "XData Cfg [ MimeType = application/json ]").unwrap();
        assert_eq!(xdata_language(&decl), "{.json}");
        let decl = parse_block(MemberKind::XData, "XData Page").unwrap();
        assert_eq!(xdata_language(&decl), "{.xml}");
    }

    #[test]
    fn storage_renders_as_comment() {
        let decl = parse_block(MemberKind::Storage, "Storage Default").unwrap();
        assert_eq!(render_storage(&decl).declaration, "// Storage Default");
    }
}
