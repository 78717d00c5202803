//! Python string literals
//!
//! [`quote`] produces a double-quoted literal made only of printable ASCII
//! that never contains a single quote, so it can sit inside a
//! single-quoted shell argument unchanged. [`parse_prefix`] reads such a
//! literal back.

use std::fmt::Write as _;

/// Quote `text` as a double-quoted Python string literal.
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\'' => out.push_str("\\x27"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            ' '..='~' => out.push(c),
            c if (c as u32) < 0x100 => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c if (c as u32) < 0x10000 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => {
                let _ = write!(out, "\\U{:08x}", c as u32);
            }
        }
    }
    out.push('"');
    out
}

/// Parse a double-quoted literal at the start of `text`.
///
/// Returns the decoded value and the text following the closing quote.
pub fn parse_prefix(text: &str) -> Option<(String, &str)> {
    let body = text.strip_prefix('"')?;
    let mut value = String::new();
    let mut chars = body.char_indices();

    while let Some((idx, c)) = chars.next() {
        match c {
            '"' => return Some((value, &body[idx + 1..])),
            '\\' => {
                let (_, escape) = chars.next()?;
                match escape {
                    '\\' => value.push('\\'),
                    '"' => value.push('"'),
                    '\'' => value.push('\''),
                    'n' => value.push('\n'),
                    'r' => value.push('\r'),
                    't' => value.push('\t'),
                    '0' => value.push('\0'),
                    'x' => value.push(hex_char(&mut chars, 2)?),
                    'u' => value.push(hex_char(&mut chars, 4)?),
                    'U' => value.push(hex_char(&mut chars, 8)?),
                    _ => return None,
                }
            }
            '\n' => return None,
            c => value.push(c),
        }
    }
    None
}

fn hex_char(chars: &mut std::str::CharIndices<'_>, digits: usize) -> Option<char> {
    let mut code = 0u32;
    for _ in 0..digits {
        let (_, c) = chars.next()?;
        code = code * 16 + c.to_digit(16)?;
    }
    char::from_u32(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_is_ascii_without_single_quote() {
        let text = "print('héllo')\n\t\"x\" \\ \u{1F600}\x01";
        let quoted = quote(text);
        assert!(quoted.is_ascii());
        assert!(!quoted.contains('\''));
        assert!(!quoted.contains('\n'));
        assert!(quoted.chars().all(|c| (' '..='~').contains(&c)));
    }

    #[test]
    fn test_quote_known_forms() {
        assert_eq!(quote("a'b"), "\"a\\x27b\"");
        assert_eq!(quote("é"), "\"\\xe9\"");
        assert_eq!(quote("\u{20ac}"), "\"\\u20ac\"");
        assert_eq!(quote("\u{1F600}"), "\"\\U0001f600\"");
    }

    #[test]
    fn test_parse_prefix_reads_quoted_text() {
        let text = "print('héllo')\n\t\"x\" \\ \u{1F600}\x01";
        let line = format!("{},\"exec\")", quote(text));
        let (value, rest) = parse_prefix(&line).unwrap();
        assert_eq!(value, text);
        assert_eq!(rest, ",\"exec\")");
    }

    #[test]
    fn test_parse_prefix_rejects_malformed() {
        assert_eq!(parse_prefix("no quote"), None);
        assert_eq!(parse_prefix("\"unterminated"), None);
        assert_eq!(parse_prefix("\"bad \\q escape\""), None);
        assert_eq!(parse_prefix("\"short \\x4\""), None);
    }
}
