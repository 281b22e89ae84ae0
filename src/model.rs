//! Data model shared by the classifier, translator, rewriter and emitter.

/// One physical line of the input, without its terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    /// 1-based
    pub number: usize,
    pub text: String,
}

/// Lexical category assigned by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Blank,
    DocComment,
    ClassHeader,
    MemberHeader(MemberKind),
    /// `{` line that raises the body depth.
    BodyOpen,
    /// `}` line that lowers the body depth.
    BodyClose,
    BlockCommentStart,
    /// Line strictly inside a `/* ... */` block.
    BlockCommentBody,
    BlockCommentEnd,
    /// `Include` / `Import` before the class header.
    Directive,
    BodyText,
}

/// One or more physical lines classified as a unit.
///
/// Only headers span several lines (a parameter list continued over
/// following lines); every other logical line wraps exactly one line.
#[derive(Debug, Clone)]
pub struct LogicalLine {
    pub lines: Vec<SourceLine>,
    pub category: Category,
    pub depth_before: usize,
    pub depth_after: usize,
}

impl LogicalLine {
    pub fn number(&self) -> usize {
        self.lines.first().map(|l| l.number).unwrap_or(0)
    }

    /// First physical line, verbatim.
    pub fn first(&self) -> &str {
        self.lines.first().map(|l| l.text.as_str()).unwrap_or("")
    }

    /// Physical lines joined with single spaces, continuation lines trimmed.
    pub fn joined(&self) -> String {
        let mut out = String::new();
        for (i, line) in self.lines.iter().enumerate() {
            if i == 0 {
                out.push_str(line.text.trim_end());
            } else {
                out.push(' ');
                out.push_str(line.text.trim());
            }
        }
        out
    }

    /// Leading whitespace of the first physical line.
    pub fn indent(&self) -> &str {
        let first = self.first();
        &first[..first.len() - first.trim_start().len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Property,
    Method,
    ClassMethod,
    ClientMethod,
    Query,
    Parameter,
    Index,
    XData,
    Storage,
}

impl MemberKind {
    pub fn label(self) -> &'static str {
        match self {
            MemberKind::Property => "property",
            MemberKind::Method => "method",
            MemberKind::ClassMethod => "class method",
            MemberKind::ClientMethod => "client method",
            MemberKind::Query => "query",
            MemberKind::Parameter => "parameter",
            MemberKind::Index => "index",
            MemberKind::XData => "xdata",
            MemberKind::Storage => "storage",
        }
    }

    /// Class-level operations render with `static`.
    pub fn is_class_level(self) -> bool {
        matches!(self, MemberKind::ClassMethod | MemberKind::Query)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

impl Visibility {
    pub fn specifier(self) -> &'static str {
        match self {
            Visibility::Public => "public:",
            Visibility::Private => "private:",
        }
    }
}

/// The single class declared by a file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassDeclaration {
    pub name: String,
    pub superclasses: Vec<String>,
    pub keywords: Vec<String>,
}

impl ClassDeclaration {
    pub fn is_final(&self) -> bool {
        has_keyword(&self.keywords, "Final")
    }

    pub fn is_abstract(&self) -> bool {
        has_keyword(&self.keywords, "Abstract")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    List,
    Array,
}

/// A declared type such as `%String(MAXLEN = 50)` or `list Of Demo.Item`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    pub name: String,
    pub collection: Option<Collection>,
    /// Raw text between the parentheses, if any.
    pub params: Option<String>,
}

impl TypeRef {
    /// C-like spelling without type parameters.
    pub fn render(&self) -> String {
        match self.collection {
            Some(Collection::List) => format!("list<{}>", self.name),
            Some(Collection::Array) => format!("array<{}>", self.name),
            None => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PassingMode {
    #[default]
    Value,
    ByRef,
    Output,
}

/// One entry of a method's formal parameter list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    pub name: String,
    pub mode: PassingMode,
    pub ty: Option<TypeRef>,
    pub default: Option<String>,
    pub variadic: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberDeclaration {
    pub kind: MemberKind,
    pub name: String,
    pub ty: Option<TypeRef>,
    pub arguments: Vec<Argument>,
    pub visibility: Visibility,
    pub keywords: Vec<String>,
    /// Parameter constant value.
    pub value: Option<String>,
    /// Properties covered by an index.
    pub index_fields: Vec<String>,
    /// Same-line `//` comment following the declaration.
    pub trailing_comment: Option<String>,
}

impl MemberDeclaration {
    pub fn new(kind: MemberKind, name: &str) -> Self {
        MemberDeclaration {
            kind,
            name: name.to_string(),
            ty: None,
            arguments: Vec::new(),
            visibility: Visibility::Public,
            keywords: Vec::new(),
            value: None,
            index_fields: Vec::new(),
            trailing_comment: None,
        }
    }

    pub fn is_abstract(&self) -> bool {
        has_keyword(&self.keywords, "Abstract")
    }
}

/// A run of consecutive `///` lines.
#[derive(Debug, Clone, Default)]
pub struct DocComment {
    pub lines: Vec<DocLine>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocLine {
    /// Indentation plus the `///` leader.
    pub leader: String,
    pub segments: Vec<TagSegment>,
}

/// A tag token and the text up to the next tag. The leading prose of a
/// line is a segment without a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSegment {
    pub tag: Option<String>,
    pub body: String,
}

/// Case-insensitive match on the first word of each keyword entry, so
/// `Abstract` matches `[ Abstract ]` but not `[ NotAbstract ]`.
pub fn has_keyword(keywords: &[String], wanted: &str) -> bool {
    keywords.iter().any(|k| {
        let head = k.split(|c: char| c.is_whitespace() || c == '=').next().unwrap_or("");
        head.eq_ignore_ascii_case(wanted) && !k.contains('=')
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(number: usize, text: &str) -> SourceLine {
        SourceLine {
            number,
            text: text.to_string(),
        }
    }

    #[test]
    fn joined_trims_continuations() {
        let logical = LogicalLine {
            lines: vec![line(3, "Method Run("), line(4, "    a As %String,"), line(5, "    b)  ")],
            category: Category::MemberHeader(MemberKind::Method),
            depth_before: 1,
            depth_after: 1,
        };
        assert_eq!(logical.joined(), "Method Run( a As %String, b)");
        assert_eq!(logical.number(), 3);
    }

    #[test]
    fn indent_is_leading_whitespace() {
        let logical = LogicalLine {
            lines: vec![line(1, "\t  Property X;")],
            category: Category::MemberHeader(MemberKind::Property),
            depth_before: 1,
            depth_after: 1,
        };
        assert_eq!(logical.indent(), "\t  ");
    }

    #[test]
    fn keyword_flags() {
        let kws = vec!["Abstract".to_string(), "ClassType = persistent".to_string()];
        assert!(has_keyword(&kws, "abstract"));
        assert!(!has_keyword(&kws, "Final"));
        assert!(!has_keyword(&kws, "ClassType"));
    }

    #[test]
    fn collection_types_render_as_templates() {
        let ty = TypeRef {
            name: "Demo.Item".to_string(),
            collection: Some(Collection::List),
            params: None,
        };
        assert_eq!(ty.render(), "list<Demo.Item>");
    }
}
