//! Lexical analyzer for layout source text.
//!
//! Splits source into literal text and `{{ … }}` tags, classifying each tag by
//! its sigil (`#`, `/`, `>`, `!`) and keyword. Argument syntax inside a tag is
//! left to the parser.

use crate::token::{Token, TokenKind};
use trellis_source::{FileId, Span};

/// A lexical error with the span it applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    /// Where the problem is.
    pub span: Span,
    /// What is wrong.
    pub message: String,
}

/// Lexes layout source into a vector of tokens.
///
/// Adjacent text is emitted as a single [`TokenKind::Text`] token. The lexer
/// stops at the first malformed tag.
pub fn lex(source: &str, file: FileId) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer {
        source: source.as_bytes(),
        pos: 0,
        file,
    };
    lexer.lex_all()
}

struct Lexer<'a> {
    source: &'a [u8],
    pos: usize,
    file: FileId,
}

impl Lexer<'_> {
    fn lex_all(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        while self.pos < self.source.len() {
            match find(self.source, b"{{", self.pos) {
                Some(open) if open == self.pos => tokens.push(self.lex_tag()?),
                Some(open) => {
                    tokens.push(self.text(self.pos, open));
                    self.pos = open;
                }
                None => {
                    tokens.push(self.text(self.pos, self.source.len()));
                    self.pos = self.source.len();
                }
            }
        }
        Ok(tokens)
    }

    fn span(&self, start: usize, end: usize) -> Span {
        Span::new(self.file, start as u32, end as u32)
    }

    fn text(&self, start: usize, end: usize) -> Token {
        let span = self.span(start, end);
        Token {
            kind: TokenKind::Text,
            span,
            arg: span,
        }
    }

    fn error(&self, start: usize, end: usize, message: impl Into<String>) -> LexError {
        LexError {
            span: self.span(start, end),
            message: message.into(),
        }
    }

    fn lex_tag(&mut self) -> Result<Token, LexError> {
        let start = self.pos;
        let inner_start = start + 2;
        let close = find(self.source, b"}}", inner_start)
            .ok_or_else(|| self.error(start, inner_start, "unterminated tag: missing '}}'"))?;
        let end = close + 2;
        self.pos = end;

        let (s, e) = trim(self.source, inner_start, close);
        if s == e {
            return Err(self.error(start, end, "empty tag"));
        }

        let (kind, arg_start) = match self.source[s] {
            b'!' => (TokenKind::Comment, s + 1),
            b'>' => (TokenKind::Include, s + 1),
            b'#' => {
                let (word, after) = keyword(self.source, s + 1, e);
                match word {
                    b"if" => (TokenKind::IfOpen, after),
                    b"each" => (TokenKind::EachOpen, after),
                    _ => {
                        let name = String::from_utf8_lossy(word);
                        return Err(self.error(start, end, format!("unknown block '#{name}'")));
                    }
                }
            }
            b'/' => {
                let (word, after) = keyword(self.source, s + 1, e);
                let kind = match word {
                    b"if" => TokenKind::IfClose,
                    b"each" => TokenKind::EachClose,
                    _ => {
                        let name = String::from_utf8_lossy(word);
                        return Err(self.error(start, end, format!("unknown block '/{name}'")));
                    }
                };
                if trim(self.source, after, e).0 != e {
                    return Err(self.error(
                        start,
                        end,
                        format!("{} takes no arguments", kind.describe()),
                    ));
                }
                (kind, after)
            }
            _ if &self.source[s..e] == b"else" => (TokenKind::Else, e),
            _ => (TokenKind::Variable, s),
        };

        let (arg_s, arg_e) = trim(self.source, arg_start, e);
        Ok(Token {
            kind,
            span: self.span(start, end),
            arg: self.span(arg_s, arg_e),
        })
    }
}

/// Finds `needle` in `haystack` at or after `from`.
fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from >= haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| i + from)
}

/// Narrows `[start, end)` past leading and trailing ASCII whitespace.
fn trim(source: &[u8], mut start: usize, mut end: usize) -> (usize, usize) {
    while start < end && source[start].is_ascii_whitespace() {
        start += 1;
    }
    while end > start && source[end - 1].is_ascii_whitespace() {
        end -= 1;
    }
    (start, end)
}

/// Reads an alphabetic keyword starting at `start`, returning it and the offset after it.
fn keyword(source: &[u8], start: usize, end: usize) -> (&[u8], usize) {
    let mut pos = start;
    while pos < end && source[pos].is_ascii_alphabetic() {
        pos += 1;
    }
    (&source[start..pos], pos)
}
