//! lexer.rs - The script-file tokenizer (component H): turns script source
//! text into the token stream the parser (`src/parser.rs`) consumes, per
//! spec.md S6's grammar token list: `STYLE PREPEND APPEND SKIP BREAK MACRO
//! INCLUDE SET NUMBER STRING MATCH SUBST { } ,`.
//!
//! Hand-written line-and-character scanner: a hand-rolled reader rather
//! than a lexer-generator dependency.

use crate::error::RemarkError;

/// One lexical token, carrying the 1-based source line it started on so the
/// parser can build `RemarkError::ScriptParse`/`SemanticError` diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Style,
    Prepend,
    Append,
    Skip,
    Break,
    Macro,
    Include,
    Set,
    Subst,
    Number(i64),
    /// A quoted string with no directly-adjacent flag letters.
    Str(String),
    /// A quoted string immediately followed (no whitespace) by a run of
    /// `g`/`i` flag letters - the `MATCH` token class. Whether it is used
    /// as a regex (match position) or rejected as a misplaced flag suffix
    /// (anywhere else) is a parser decision, not a lexer one.
    Match(String, String),
    LBrace,
    RBrace,
    Comma,
}

pub struct LexedToken {
    pub token: Token,
    pub line: u32,
}

/// Tokenizes `source`. `file` is only used to build diagnostics.
pub fn lex(source: &str, file: &str) -> Result<Vec<LexedToken>, RemarkError> {
    let bytes = source.as_bytes();
    let mut i = 0usize;
    let mut line = 1u32;
    let mut out = Vec::new();

    while i < bytes.len() {
        let c = bytes[i];

        if c == b'\n' {
            line += 1;
            i += 1;
            continue;
        }
        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }
        if c == b'#' {
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
            continue;
        }
        if c == b'{' {
            out.push(LexedToken { token: Token::LBrace, line });
            i += 1;
            continue;
        }
        if c == b'}' {
            out.push(LexedToken { token: Token::RBrace, line });
            i += 1;
            continue;
        }
        if c == b',' {
            out.push(LexedToken { token: Token::Comma, line });
            i += 1;
            continue;
        }
        if c == b'"' {
            let start_line = line;
            let (text, next, consumed_lines) = scan_string(bytes, i, file, line)?;
            i = next;
            line += consumed_lines;

            // Flag suffix: a maximal run of ascii letters immediately
            // following the closing quote, no intervening whitespace.
            let flag_start = i;
            while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
                i += 1;
            }
            if i > flag_start {
                let flags = std::str::from_utf8(&bytes[flag_start..i]).unwrap().to_string();
                out.push(LexedToken { token: Token::Match(text, flags), line: start_line });
            } else {
                out.push(LexedToken { token: Token::Str(text), line: start_line });
            }
            continue;
        }
        if c.is_ascii_digit() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            let text = std::str::from_utf8(&bytes[start..i]).unwrap();
            let n: i64 = text.parse().map_err(|_| RemarkError::ScriptParse {
                file: file.to_string(),
                line,
                msg: format!("malformed number `{text}`"),
            })?;
            out.push(LexedToken { token: Token::Number(n), line });
            continue;
        }
        if c.is_ascii_alphabetic() || c == b'_' {
            let start = i;
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            let word = std::str::from_utf8(&bytes[start..i]).unwrap();
            let token = match word {
                "style" => Token::Style,
                "prepend" => Token::Prepend,
                "append" => Token::Append,
                "skip" => Token::Skip,
                "break" => Token::Break,
                "macro" => Token::Macro,
                "include" => Token::Include,
                "set" => Token::Set,
                "subst" => Token::Subst,
                other => {
                    return Err(RemarkError::ScriptParse {
                        file: file.to_string(),
                        line,
                        msg: format!("unknown keyword `{other}`"),
                    });
                }
            };
            out.push(LexedToken { token, line });
            continue;
        }

        return Err(RemarkError::ScriptParse {
            file: file.to_string(),
            line,
            msg: format!("unexpected character `{}`", c as char),
        });
    }

    Ok(out)
}

/// Scans a `"..."` literal starting at the opening quote (`start`),
/// recognising `\"` and `\\` escapes. Returns the decoded text, the index
/// just past the closing quote, and how many embedded newlines were
/// consumed (so the caller can advance its line counter).
fn scan_string(bytes: &[u8], start: usize, file: &str, line: u32) -> Result<(String, usize, u32), RemarkError> {
    let mut i = start + 1;
    let mut text = Vec::new();
    let mut newlines = 0u32;

    loop {
        if i >= bytes.len() {
            return Err(RemarkError::ScriptParse {
                file: file.to_string(),
                line,
                msg: "unterminated string literal".to_string(),
            });
        }
        match bytes[i] {
            b'"' => {
                i += 1;
                break;
            }
            b'\\' if i + 1 < bytes.len() => {
                let esc = bytes[i + 1];
                match esc {
                    b'"' => text.push(b'"'),
                    b'\\' => text.push(b'\\'),
                    b'n' => text.push(b'\n'),
                    b't' => text.push(b'\t'),
                    other => {
                        text.push(b'\\');
                        text.push(other);
                    }
                }
                i += 2;
            }
            b'\n' => {
                newlines += 1;
                text.push(b'\n');
                i += 1;
            }
            other => {
                text.push(other);
                i += 1;
            }
        }
    }

    let text = String::from_utf8(text).map_err(|_| RemarkError::ScriptParse {
        file: file.to_string(),
        line,
        msg: "string literal is not valid UTF-8".to_string(),
    })?;
    Ok((text, i, newlines))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(src: &str) -> Vec<Token> {
        lex(src, "test.rmk").unwrap().into_iter().map(|t| t.token).collect()
    }

    #[test]
    fn keywords_map_to_their_tokens() {
        assert_eq!(
            toks("style prepend append skip break macro include set subst"),
            vec![
                Token::Style,
                Token::Prepend,
                Token::Append,
                Token::Skip,
                Token::Break,
                Token::Macro,
                Token::Include,
                Token::Set,
                Token::Subst,
            ]
        );
    }

    #[test]
    fn plain_quoted_string_has_no_flags() {
        assert_eq!(toks("\"hello\""), vec![Token::Str("hello".into())]);
    }

    #[test]
    fn adjacent_letters_become_match_flags() {
        assert_eq!(toks("\"foo\"gi"), vec![Token::Match("foo".into(), "gi".into())]);
    }

    #[test]
    fn escaped_quote_and_backslash() {
        assert_eq!(toks(r#""a\"b\\c""#), vec![Token::Str("a\"b\\c".into())]);
    }

    #[test]
    fn numbers_and_punctuation() {
        assert_eq!(
            toks("1, 2 { }"),
            vec![
                Token::Number(1),
                Token::Comma,
                Token::Number(2),
                Token::LBrace,
                Token::RBrace,
            ]
        );
    }

    #[test]
    fn comments_are_skipped_to_end_of_line() {
        assert_eq!(toks("# a comment\nstyle"), vec![Token::Style]);
    }

    #[test]
    fn unknown_keyword_is_a_parse_error() {
        let err = lex("frobnicate", "t.rmk").unwrap_err();
        assert!(err.to_string().contains("frobnicate"));
    }

    #[test]
    fn unterminated_string_is_a_parse_error() {
        let err = lex("\"oops", "t.rmk").unwrap_err();
        assert!(err.to_string().contains("unterminated"));
    }
}
