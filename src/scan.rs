//! Quote-aware scanning over ObjectScript declaration text.
//!
//! String literals are delimited by `"` and escape a quote by doubling it
//! (`"say ""hi"""`), so toggling on every `"` tracks string state exactly.

/// Net count of `(` and `[` over `)` and `]` outside string literals,
/// up to a trailing `//` comment.
pub fn delimiter_balance(line: &str) -> i32 {
    let mut balance = 0;
    let mut in_string = false;
    for (i, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '/' if !in_string && line[i..].starts_with("//") => break,
            '(' | '[' if !in_string => balance += 1,
            ')' | ']' if !in_string => balance -= 1,
            _ => {}
        }
    }
    balance
}

/// Net count of `{` over `}` outside string literals.
pub fn brace_balance(line: &str) -> i32 {
    let mut balance = 0;
    let mut in_string = false;
    for ch in line.chars() {
        match ch {
            '"' => in_string = !in_string,
            '{' if !in_string => balance += 1,
            '}' if !in_string => balance -= 1,
            _ => {}
        }
    }
    balance
}

/// Byte offset of the first `needle` outside string literals and outside
/// any `(`/`[`/`{` nesting.
pub fn find_top_level(s: &str, needle: &str) -> Option<usize> {
    let mut depth = 0i32;
    let mut in_string = false;
    for (i, ch) in s.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '(' | '[' | '{' if !in_string => depth += 1,
            ')' | ']' | '}' if !in_string => depth -= 1,
            _ if !in_string && depth == 0 && s[i..].starts_with(needle) => return Some(i),
            _ => {}
        }
    }
    None
}

/// Split on `sep` outside string literals and nesting. Pieces are trimmed;
/// empty pieces are dropped.
pub fn split_top_level(s: &str, sep: char) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut depth = 0i32;
    let mut in_string = false;
    let mut start = 0;
    for (i, ch) in s.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '(' | '[' | '{' if !in_string => depth += 1,
            ')' | ']' | '}' if !in_string => depth -= 1,
            c if c == sep && !in_string && depth == 0 => {
                pieces.push(&s[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    pieces.push(&s[start..]);
    pieces
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Given text starting with `(` or `[`, return the text between it and the
/// matching closer, and the remainder after the closer.
pub fn take_balanced(s: &str) -> Option<(&str, &str)> {
    let (open, close) = match s.chars().next()? {
        '(' => ('(', ')'),
        '[' => ('[', ']'),
        _ => return None,
    };
    let mut depth = 0i32;
    let mut in_string = false;
    for (i, ch) in s.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            c if c == open && !in_string => depth += 1,
            c if c == close && !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some((&s[1..i], &s[i + 1..]));
                }
            }
            _ => {}
        }
    }
    None
}

/// Strip a leading case-insensitive keyword that is followed by whitespace
/// or the end of the text. Returns the trimmed remainder.
pub fn strip_word<'a>(s: &'a str, word: &str) -> Option<&'a str> {
    let head = s.get(..word.len())?;
    if !head.eq_ignore_ascii_case(word) {
        return None;
    }
    let rest = &s[word.len()..];
    match rest.chars().next() {
        None => Some(rest),
        Some(c) if c.is_whitespace() => Some(rest.trim_start()),
        Some(_) => None,
    }
}
