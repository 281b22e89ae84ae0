//! Callable members: `Method`, `ClassMethod`, `ClientMethod` and `Query`.
//!
//! `Method Name(p1 As T1 = d1, ByRef p2 As T2) As R [ kw ]` renders as
//! `R Name(T1 p1 = d1, T2& p2)`.

use super::{
    finish, metadata_lines, take_as_type, take_ident, take_keyword, take_keywords, take_modifiers,
    visibility_of, with_comment, Rendered, PLACEHOLDER_TYPE,
};
use crate::model::{Argument, MemberDeclaration, MemberKind, PassingMode};
use crate::scan;

pub fn parse(kind: MemberKind, text: &str) -> Result<MemberDeclaration, String> {
    let (mut keywords, rest) = take_modifiers(text);
    let keyword = match kind {
        MemberKind::ClassMethod => "ClassMethod",
        MemberKind::ClientMethod => "ClientMethod",
        MemberKind::Query => "Query",
        _ => "Method",
    };
    let (_, rest) = take_keyword(rest, &[keyword])?;
    let (name, rest) = take_ident(rest)?;

    let trimmed = rest.trim_start();
    let (arguments, rest) = if trimmed.starts_with('(') {
        let (inner, after) = scan::take_balanced(trimmed).ok_or("unbalanced parameter list")?;
        let arguments = scan::split_top_level(inner, ',')
            .into_iter()
            .map(parse_argument)
            .collect::<Result<Vec<_>, _>>()?;
        (arguments, after)
    } else {
        (Vec::new(), rest)
    };

    let (ty, rest) = take_as_type(rest)?;
    let (bracketed, rest) = take_keywords(rest)?;
    keywords.extend(bracketed);
    let comment = finish(rest, false)?;

    let mut decl = MemberDeclaration::new(kind, &name);
    decl.ty = ty;
    decl.arguments = arguments;
    decl.visibility = visibility_of(&keywords);
    decl.keywords = keywords;
    decl.trailing_comment = comment;
    Ok(decl)
}

/// `[ByRef|Output] name[...] [As Type] [= default]`
fn parse_argument(arg: &str) -> Result<Argument, String> {
    let arg = arg.trim();
    let (mode, rest) = if let Some(rest) = scan::strip_word(arg, "ByRef") {
        (PassingMode::ByRef, rest)
    } else if let Some(rest) = scan::strip_word(arg, "Output") {
        (PassingMode::Output, rest)
    } else {
        (PassingMode::Value, arg)
    };

    let (name, rest) = take_ident(rest)?;
    let (variadic, rest) = match rest.trim_start().strip_prefix("...") {
        Some(after) => (true, after),
        None => (false, rest),
    };
    let (ty, rest) = take_as_type(rest)?;

    let rest = rest.trim();
    let default = if rest.is_empty() {
        None
    } else {
        let value = rest
            .strip_prefix('=')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| format!("unexpected text in argument `{arg}`"))?;
        Some(value.to_string())
    };

    Ok(Argument {
        name,
        mode,
        ty,
        default,
        variadic,
    })
}

/// Render the signature; `has_body` leaves off the `;` so the verbatim
/// body that follows reads as an inline definition.
pub fn render(decl: &MemberDeclaration, has_body: bool) -> Rendered {
    let ret = match (&decl.ty, decl.kind) {
        (Some(ty), _) => ty.render(),
        (None, MemberKind::Query) => "%Query".to_string(),
        (None, _) => "void".to_string(),
    };
    let prefix = if decl.kind.is_class_level() {
        "static "
    } else if decl.is_abstract() {
        "virtual "
    } else {
        ""
    };
    let args: Vec<String> = decl.arguments.iter().map(render_argument).collect();
    let mut declaration = format!("{prefix}{ret} {}({})", decl.name, args.join(", "));
    if !has_body {
        declaration.push(';');
    }

    let mut doc = Vec::new();
    if decl.kind == MemberKind::ClientMethod {
        doc.push(
            r"/// \remark Client method: runs in the browser as a method of the client page object."
                .to_string(),
        );
    }
    let params = decl.ty.as_ref().and_then(|t| t.params.as_deref());
    doc.extend(metadata_lines(params, &decl.keywords));

    Rendered {
        doc,
        declaration: with_comment(declaration, decl.trailing_comment.as_ref()),
    }
}

fn render_argument(arg: &Argument) -> String {
    let mut out = match &arg.ty {
        Some(ty) => ty.render(),
        None => PLACEHOLDER_TYPE.to_string(),
    };
    if let Some(params) = arg.ty.as_ref().and_then(|t| t.params.as_deref()) {
        out.push_str(&format!(" /*{}*/", params.replace("*/", "* /")));
    }
    if arg.mode != PassingMode::Value {
        out.push('&');
    }
    out.push(' ');
    out.push_str(&arg.name);
    if arg.variadic {
        out.push_str("...");
    }
    if let Some(default) = &arg.default {
        out.push_str(" = ");
        out.push_str(default);
    }
    out
}
