//! Class header: `Class Name Extends (A, B) [ keywords ]`.

use super::{finish, metadata_lines, take_ident, take_keyword, take_keywords, take_modifiers, with_comment, Rendered};
use crate::error::{FilterError, Result};
use crate::model::{ClassDeclaration, LogicalLine};
use crate::scan;

/// Parse the class header into a declaration plus its trailing comment.
pub fn parse(logical: &LogicalLine) -> Result<(ClassDeclaration, Option<String>)> {
    let text = logical.joined();
    parse_text(&text).map_err(|reason| FilterError::unparsable("class", logical.number(), reason))
}

fn parse_text(text: &str) -> std::result::Result<(ClassDeclaration, Option<String>), String> {
    if scan::delimiter_balance(text) > 0 {
        return Err("unbalanced delimiters".to_string());
    }
    let (mut keywords, rest) = take_modifiers(text);
    let (_, rest) = take_keyword(rest, &["Class"])?;
    let (name, rest) = take_ident(rest)?;

    let rest = rest.trim_start();
    let (superclasses, rest) = match scan::strip_word(rest, "Extends") {
        Some(after) if after.starts_with('(') => {
            let (inner, after) = scan::take_balanced(after).ok_or("unbalanced superclass list")?;
            let mut supers = Vec::new();
            for piece in scan::split_top_level(inner, ',') {
                let (ident, leftover) = take_ident(piece)?;
                if !leftover.trim().is_empty() {
                    return Err(format!("invalid superclass `{piece}`"));
                }
                supers.push(ident);
            }
            (supers, after)
        }
        Some(after) => {
            let (ident, after) = take_ident(after)?;
            (vec![ident], after)
        }
        None => (Vec::new(), rest),
    };

    let (bracketed, rest) = take_keywords(rest)?;
    keywords.extend(bracketed);
    let comment = finish(rest, false)?;

    Ok((
        ClassDeclaration {
            name,
            superclasses,
            keywords,
        },
        comment,
    ))
}

/// `class Name final : public A, public B`, preceded by keyword metadata.
pub fn render(decl: &ClassDeclaration, comment: Option<&String>) -> Rendered {
    let mut declaration = format!("class {}", decl.name);
    if decl.is_final() {
        declaration.push_str(" final");
    }
    if !decl.superclasses.is_empty() {
        let bases: Vec<String> = decl
            .superclasses
            .iter()
            .map(|s| format!("public {s}"))
            .collect();
        declaration.push_str(" : ");
        declaration.push_str(&bases.join(", "));
    }
    let mut doc = metadata_lines(None, &decl.keywords);
    if decl.is_abstract() {
        doc.push(r"/// \note Abstract class.".to_string());
    }
    Rendered {
        doc,
        declaration: with_comment(declaration, comment),
    }
}

/// `virtual ~Name() = 0;` for abstract classes, named after the last
/// segment of the class name. The pure virtual member is what makes the
/// class abstract in the generated class diagrams.
pub fn abstract_destructor(decl: &ClassDeclaration) -> Option<String> {
    decl.is_abstract().then(|| {
        let short = decl.name.rsplit('.').next().unwrap_or(&decl.name);
        format!("virtual ~{short}() = 0;")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(text: &str) -> ClassDeclaration {
        parse_text(text).unwrap().0
    }

    #[test]
    fn single_superclass() {
        let decl = parse_ok("Class Demo Extends Base");
        assert_eq!(decl.name, "Demo");
        assert_eq!(decl.superclasses, vec!["Base"]);
        assert_eq!(render(&decl, None).declaration, "class Demo : public Base");
    }

    #[test]
    fn multiple_superclasses_and_keywords() {
        let decl = parse_ok("Class Demo.Person Extends (%Persistent, Demo.Base) [ Final, ClassType = persistent ]");
        assert_eq!(decl.superclasses, vec!["%Persistent", "Demo.Base"]);
        let rendered = render(&decl, None);
        assert_eq!(
            rendered.declaration,
            "class Demo.Person final : public %Persistent, public Demo.Base"
        );
        assert_eq!(rendered.doc[1], "/// Final, ClassType = persistent");
    }

    #[test]
    fn no_inheritance() {
        let decl = parse_ok("Class Util.Helpers");
        let rendered = render(&decl, None);
        assert_eq!(rendered.declaration, "class Util.Helpers");
        assert!(rendered.doc.is_empty());
    }

    #[test]
    fn abstract_class_gets_note() {
        let decl = parse_ok("Class Shape Extends %RegisteredObject [ Abstract ]");
        assert!(render(&decl, None).doc.contains(&r"/// \note Abstract class.".to_string()));
    }

    #[test]
    fn abstract_class_gets_pure_virtual_destructor() {
        let decl = parse_ok("Class Geo.Shape Extends %RegisteredObject [ Abstract ]");
        assert_eq!(abstract_destructor(&decl).as_deref(), Some("virtual ~Shape() = 0;"));
        assert_eq!(abstract_destructor(&parse_ok("Class Geo.Circle Extends Geo.Shape")), None);
    }

    #[test]
    fn rejects_garbage_after_header() {
        assert!(parse_text("Class diagram below").is_err());
        assert!(parse_text("class Foo:").is_err());
    }
}
