//! Plaintext environment-file codec.
//!
//! Parses and serialises the line-oriented `KEY=VALUE` form stored inside
//! the envelope:
//!
//! ```text
//! # comment
//! KEY=value
//! QUOTED="value with spaces"
//! EMPTY=
//! ```
//!
//! One pair per line. A leading `#` marks a comment. Single- and
//! double-quoted values are unquoted with shell-style escape handling in the
//! double-quoted case. A non-empty, non-comment line without `=` is a parse
//! error identified by its 1-based line number. Serialisation produces a
//! canonical form that round-trips through the parser.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::core::error::Error;
use crate::core::validate::is_valid_var_name;

/// Structured parse errors with 1-based line numbers.
#[derive(Debug, Error)]
pub enum ParseError {
    /// A line had no `=` separator (and was not a comment or blank).
    #[error("line {line}: missing '=' separator")]
    MissingSeparator { line: usize },

    /// A key fails the variable-name rule.
    #[error("line {line}: invalid key '{key}'")]
    InvalidKey { line: usize, key: String },

    /// A quoted value was opened but never closed.
    #[error("line {line}: unterminated quoted value")]
    UnterminatedQuote { line: usize },

    /// The decrypted payload is not UTF-8.
    #[error("environment file is not valid UTF-8")]
    NotUtf8,
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Error::Input(e.to_string())
    }
}

/// Parses the plaintext form into a sorted map. Empty input is the empty map.
pub fn parse(content: &[u8]) -> Result<BTreeMap<String, String>, ParseError> {
    let content = std::str::from_utf8(content).map_err(|_| ParseError::NotUtf8)?;
    let mut vars = BTreeMap::new();

    for (idx, raw_line) in content.lines().enumerate() {
        let line_num = idx + 1;
        let line = raw_line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let eq = line
            .find('=')
            .ok_or(ParseError::MissingSeparator { line: line_num })?;
        let key = line[..eq].trim().to_string();
        let raw_value = line[eq + 1..].trim();

        if !is_valid_var_name(&key) {
            return Err(ParseError::InvalidKey {
                line: line_num,
                key,
            });
        }

        let value = parse_value(raw_value, line_num)?;
        vars.insert(key, value);
    }

    Ok(vars)
}

fn parse_value(raw: &str, line_num: usize) -> Result<String, ParseError> {
    if raw.is_empty() {
        return Ok(String::new());
    }

    match raw.chars().next() {
        Some('"') => {
            if raw.len() < 2 || !is_closed(raw, '"') {
                return Err(ParseError::UnterminatedQuote { line: line_num });
            }
            Ok(unescape(&raw[1..raw.len() - 1]))
        }
        Some('\'') => {
            if raw.len() < 2 || !is_closed(raw, '\'') {
                return Err(ParseError::UnterminatedQuote { line: line_num });
            }
            // Single quotes: literal content, no escape handling.
            Ok(raw[1..raw.len() - 1].to_string())
        }
        _ => Ok(raw.to_string()),
    }
}

fn is_closed(raw: &str, q: char) -> bool {
    raw.len() >= 2 && raw.starts_with(q) && raw.ends_with(q)
}

/// Shell-style escapes inside double quotes: `\n`, `\r`, `\t`, `\\`, `\"`.
/// Unknown sequences keep the backslash literally.
fn unescape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('r') => result.push('\r'),
            Some('t') => result.push('\t'),
            Some('\\') => result.push('\\'),
            Some('"') => result.push('"'),
            Some(c) => {
                result.push('\\');
                result.push(c);
            }
            None => result.push('\\'),
        }
    }
    result
}

/// Serialises a map into the canonical form. Keys emit in lexicographic
/// order; the empty map serialises to empty output.
pub fn serialise<'a>(pairs: impl Iterator<Item = (&'a str, &'a [u8])>) -> String {
    let mut out = String::new();
    for (key, value) in pairs {
        let value = String::from_utf8_lossy(value);
        out.push_str(key);
        out.push('=');
        if needs_quoting(&value) {
            out.push('"');
            out.push_str(&escape(&value));
            out.push('"');
        } else {
            out.push_str(&value);
        }
        out.push('\n');
    }
    out
}

fn needs_quoting(value: &str) -> bool {
    value.chars().any(|c| {
        c.is_whitespace() || c == '"' || c == '\'' || c == '\\' || c == '#'
    })
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse_str(s: &str) -> BTreeMap<String, String> {
        parse(s.as_bytes()).unwrap()
    }

    // ── Basic parsing ────────────────────────────────────────────────────────

    #[test]
    fn test_basic_pairs() {
        let vars = parse_str("KEY1=value1\nKEY2=value2");
        assert_eq!(vars["KEY1"], "value1");
        assert_eq!(vars["KEY2"], "value2");
    }

    #[test]
    fn test_empty_input_is_empty_map() {
        assert!(parse(b"").unwrap().is_empty());
    }

    #[test]
    fn test_comments_and_blanks_skipped() {
        let vars = parse_str("# leading comment\n\nKEY=val\n# trailing");
        assert_eq!(vars.len(), 1);
        assert_eq!(vars["KEY"], "val");
    }

    #[test]
    fn test_empty_value() {
        let vars = parse_str("EMPTY=");
        assert_eq!(vars["EMPTY"], "");
    }

    #[test]
    fn test_whitespace_around_separator() {
        let vars = parse_str("  KEY  =  value  ");
        assert_eq!(vars["KEY"], "value");
    }

    // ── Quoting ──────────────────────────────────────────────────────────────

    #[test]
    fn test_double_quoted_value() {
        let vars = parse_str(r#"KEY="value with spaces""#);
        assert_eq!(vars["KEY"], "value with spaces");
    }

    #[test]
    fn test_single_quoted_value_is_literal() {
        let vars = parse_str(r"KEY='no\nescape'");
        assert_eq!(vars["KEY"], r"no\nescape");
    }

    #[test]
    fn test_double_quote_escapes() {
        let vars = parse_str(r#"KEY="line1\nline2\ttab \"quoted\" back\\slash""#);
        assert_eq!(vars["KEY"], "line1\nline2\ttab \"quoted\" back\\slash");
    }

    #[test]
    fn test_unterminated_quote_errors_with_line() {
        let err = parse(b"OK=1\nBAD=\"unterminated").unwrap_err();
        match err {
            ParseError::UnterminatedQuote { line } => assert_eq!(line, 2),
            e => panic!("expected UnterminatedQuote, got {e:?}"),
        }
    }

    // ── Errors ───────────────────────────────────────────────────────────────

    #[test]
    fn test_missing_separator_errors_with_line() {
        let err = parse(b"A=1\nB=2\nnot a pair").unwrap_err();
        match err {
            ParseError::MissingSeparator { line } => assert_eq!(line, 3),
            e => panic!("expected MissingSeparator, got {e:?}"),
        }
    }

    #[test]
    fn test_invalid_key_rejected() {
        let err = parse(b"1BAD=value").unwrap_err();
        assert!(matches!(err, ParseError::InvalidKey { line: 1, .. }));
    }

    #[test]
    fn test_non_utf8_rejected() {
        let err = parse(&[b'K', b'=', 0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, ParseError::NotUtf8));
    }

    // ── Serialisation ────────────────────────────────────────────────────────

    #[test]
    fn test_serialise_empty_map() {
        assert_eq!(serialise(std::iter::empty()), "");
    }

    #[test]
    fn test_serialise_plain_and_quoted() {
        let pairs: Vec<(&str, &[u8])> = vec![
            ("PLAIN", b"simple"),
            ("SPACED", b"two words"),
            ("EMPTY", b""),
        ];
        let out = serialise(pairs.into_iter());
        assert_eq!(out, "PLAIN=simple\nSPACED=\"two words\"\nEMPTY=\n");
    }

    #[test]
    fn test_roundtrip() {
        let mut original = BTreeMap::new();
        original.insert("PLAIN".to_string(), "value".to_string());
        original.insert("SPACES".to_string(), "a b c".to_string());
        original.insert("QUOTES".to_string(), "say \"hi\"".to_string());
        original.insert("BACKSLASH".to_string(), "c:\\path".to_string());
        original.insert("NEWLINE".to_string(), "line1\nline2".to_string());
        original.insert("TAB".to_string(), "col1\tcol2".to_string());
        original.insert("HASH".to_string(), "a#b".to_string());
        original.insert("EMPTY".to_string(), String::new());

        let text = serialise(
            original
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_bytes())),
        );
        let parsed = parse(text.as_bytes()).unwrap();
        assert_eq!(parsed, original);
    }
}
