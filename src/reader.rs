//! Input loading: encoding and line-ending detection.
//!
//! The raw bytes are kept so a file without a class can be written back
//! unchanged. Translated output is re-encoded with the detected encoding,
//! byte-order mark and line ending.

use crate::error::{FilterError, Result};
use crate::model::SourceLine;
use std::fs;
use std::path::Path;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    /// Fallback for bytes that are not valid UTF-8 (Caché exports are
    /// frequently ISO-8859-1).
    Latin1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SourceText {
    pub raw: Vec<u8>,
    pub encoding: Encoding,
    pub bom: bool,
    pub line_ending: LineEnding,
    pub trailing_newline: bool,
    pub lines: Vec<SourceLine>,
}

/// Read a file from disk.
pub fn read(path: &Path) -> Result<SourceText> {
    let raw = fs::read(path).map_err(|source| FilterError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(decode(raw))
}

/// Decode raw bytes into numbered lines.
pub fn decode(raw: Vec<u8>) -> SourceText {
    let (bom, body) = match raw.strip_prefix(UTF8_BOM) {
        Some(rest) => (true, rest),
        None => (false, raw.as_slice()),
    };

    let (encoding, text) = match std::str::from_utf8(body) {
        Ok(s) => (Encoding::Utf8, s.to_string()),
        Err(_) => (Encoding::Latin1, body.iter().map(|&b| b as char).collect()),
    };

    let line_ending = match text.find('\n') {
        Some(pos) if pos > 0 && text.as_bytes()[pos - 1] == b'\r' => LineEnding::CrLf,
        _ => LineEnding::Lf,
    };

    let trailing_newline = text.ends_with('\n');
    let mut pieces: Vec<&str> = text.split('\n').collect();
    if trailing_newline || text.is_empty() {
        pieces.pop();
    }

    let lines = pieces
        .into_iter()
        .enumerate()
        .map(|(i, piece)| {
            let piece = if line_ending == LineEnding::CrLf {
                piece.strip_suffix('\r').unwrap_or(piece)
            } else {
                piece
            };
            SourceLine {
                number: i + 1,
                text: piece.to_string(),
            }
        })
        .collect();

    SourceText {
        raw,
        encoding,
        bom,
        line_ending,
        trailing_newline,
        lines,
    }
}

impl SourceText {
    /// Join output lines and encode them the way the input was encoded.
    pub fn encode(&self, lines: &[String]) -> Vec<u8> {
        let mut text = lines.join(self.line_ending.as_str());
        if self.trailing_newline && !lines.is_empty() {
            text.push_str(self.line_ending.as_str());
        }

        let mut out = Vec::with_capacity(text.len() + UTF8_BOM.len());
        if self.bom {
            out.extend_from_slice(UTF8_BOM);
        }
        match self.encoding {
            Encoding::Utf8 => out.extend_from_slice(text.as_bytes()),
            Encoding::Latin1 => out.extend(
                text.chars()
                    .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?')),
            ),
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(src: &SourceText) -> Vec<&str> {
        src.lines.iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn splits_lf_lines() {
        let src = decode(b"a\nb\n".to_vec());
        assert_eq!(texts(&src), vec!["a", "b"]);
        assert_eq!(src.line_ending, LineEnding::Lf);
        assert!(src.trailing_newline);
        assert_eq!(src.lines[1].number, 2);
    }

    #[test]
    fn detects_crlf() {
        let src = decode(b"a\r\nb".to_vec());
        assert_eq!(texts(&src), vec!["a", "b"]);
        assert_eq!(src.line_ending, LineEnding::CrLf);
        assert!(!src.trailing_newline);
    }

    #[test]
    fn empty_input_has_no_lines() {
        let src = decode(Vec::new());
        assert!(src.lines.is_empty());
        assert_eq!(src.encode(&[]), Vec::<u8>::new());
    }

    #[test]
    fn falls_back_to_latin1() {
        let src = decode(b"caf\xE9\n".to_vec());
        assert_eq!(src.encoding, Encoding::Latin1);
        assert_eq!(texts(&src), vec!["café"]);
        assert_eq!(src.encode(&["café".to_string()]), b"caf\xE9\n".to_vec());
    }

    #[test]
    fn round_trips_bom_and_crlf() {
        let input = b"\xEF\xBB\xBFone\r\ntwo\r\n".to_vec();
        let src = decode(input.clone());
        assert!(src.bom);
        let lines: Vec<String> = texts(&src).iter().map(|s| s.to_string()).collect();
        assert_eq!(src.encode(&lines), input);
    }
}
