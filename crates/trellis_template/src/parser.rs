//! Recursive descent parser from layout tokens to a [`Node`] tree.
//!
//! Block structure (`#if`/`else`/`/if`, `#each`/`/each`) is matched here, tag
//! arguments are parsed, and include tags are handed to an [`IncludeResolver`]
//! so that included layouts are inlined into the tree as it is built.

use crate::ast::{Node, Segment, VarPath};
use crate::error::CompilationError;
use crate::token::{Token, TokenKind};
use trellis_source::{ResolvedSpan, Span};

/// Compile-session services the parser needs but does not own.
pub(crate) trait IncludeResolver {
    /// Compiles the include `target` written at `span`, returning its nodes.
    fn include(&mut self, target: &str, span: Span) -> Result<Vec<Node>, CompilationError>;

    /// Resolves a span to a line/column location.
    fn locate(&self, span: Span) -> ResolvedSpan;
}

pub(crate) struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    source: &'a str,
    resolver: &'a mut dyn IncludeResolver,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(
        tokens: &'a [Token],
        source: &'a str,
        resolver: &'a mut dyn IncludeResolver,
    ) -> Self {
        Self {
            tokens,
            pos: 0,
            source,
            resolver,
        }
    }

    /// Parses the whole token stream.
    pub(crate) fn parse(mut self) -> Result<Vec<Node>, CompilationError> {
        let (nodes, _) = self.parse_nodes(&[])?;
        Ok(nodes)
    }

    fn syntax(&self, span: Span, message: impl Into<String>) -> CompilationError {
        CompilationError::Syntax {
            location: self.resolver.locate(span),
            message: message.into(),
        }
    }

    fn text(&self, span: Span) -> &'a str {
        &self.source[span.range()]
    }

    /// Parses nodes until a token whose kind is in `stop`, which is consumed
    /// and returned, or until the end of input (`None`).
    fn parse_nodes(
        &mut self,
        stop: &[TokenKind],
    ) -> Result<(Vec<Node>, Option<Token>), CompilationError> {
        let mut nodes = Vec::new();
        while let Some(&token) = self.tokens.get(self.pos) {
            self.pos += 1;
            if stop.contains(&token.kind) {
                return Ok((nodes, Some(token)));
            }
            match token.kind {
                TokenKind::Text => push_text(&mut nodes, self.text(token.span)),
                TokenKind::Comment => {}
                TokenKind::Variable => nodes.push(self.variable(token)?),
                TokenKind::IfOpen => nodes.push(self.if_block(token)?),
                TokenKind::EachOpen => nodes.push(self.each_block(token)?),
                TokenKind::Include => nodes.push(self.include(token)?),
                TokenKind::Else | TokenKind::IfClose | TokenKind::EachClose => {
                    return Err(self.syntax(
                        token.span,
                        format!("unexpected {}", token.kind.describe()),
                    ));
                }
            }
        }
        Ok((nodes, None))
    }

    fn variable(&self, token: Token) -> Result<Node, CompilationError> {
        let arg = self.text(token.arg);
        let (path_text, default) = match arg.find('|') {
            Some(bar) => {
                let literal = arg[bar + 1..].trim();
                let default = parse_string_literal(literal).ok_or_else(|| {
                    self.syntax(
                        token.span,
                        format!("default must be a double-quoted string, found '{literal}'"),
                    )
                })?;
                (arg[..bar].trim(), Some(default))
            }
            None => (arg, None),
        };
        let path = self.path(path_text, token.span)?;
        Ok(Node::Variable { path, default })
    }

    fn if_block(&mut self, open: Token) -> Result<Node, CompilationError> {
        let arg = self.text(open.arg);
        let (negated, cond) = match arg.strip_prefix('!') {
            Some(rest) => (true, rest.trim_start()),
            None => (false, arg),
        };
        let condition = self.path(cond, open.span)?;

        let (then_branch, end) = self.parse_nodes(&[TokenKind::Else, TokenKind::IfClose])?;
        let else_branch = match end.map(|t| t.kind) {
            Some(TokenKind::IfClose) => Vec::new(),
            Some(_) => match self.parse_nodes(&[TokenKind::IfClose])? {
                (nodes, Some(_)) => nodes,
                (_, None) => return Err(self.syntax(open.span, "unclosed {{#if}} block")),
            },
            None => return Err(self.syntax(open.span, "unclosed {{#if}} block")),
        };

        Ok(Node::If {
            condition,
            negated,
            then_branch,
            else_branch,
        })
    }

    fn each_block(&mut self, open: Token) -> Result<Node, CompilationError> {
        let arg = self.text(open.arg);
        let mut parts = arg.split_whitespace();
        let (items, binding) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(items), Some("as"), Some(binding), None) => (items, binding),
            _ => {
                return Err(self.syntax(
                    open.span,
                    "expected {{#each <path> as <name>}}",
                ))
            }
        };
        if !is_identifier(binding) {
            return Err(self.syntax(
                open.span,
                format!("invalid loop binding name '{binding}'"),
            ));
        }
        let items = self.path(items, open.span)?;

        match self.parse_nodes(&[TokenKind::EachClose])? {
            (body, Some(_)) => Ok(Node::Each {
                items,
                binding: binding.to_string(),
                body,
            }),
            (_, None) => Err(self.syntax(open.span, "unclosed {{#each}} block")),
        }
    }

    fn include(&mut self, token: Token) -> Result<Node, CompilationError> {
        let arg = self.text(token.arg);
        let target = parse_string_literal(arg).unwrap_or_else(|| arg.to_string());
        if target.is_empty() {
            return Err(self.syntax(token.span, "include target is empty"));
        }
        let body = self.resolver.include(&target, token.span)?;
        Ok(Node::Include { target, body })
    }

    fn path(&self, text: &str, span: Span) -> Result<VarPath, CompilationError> {
        let invalid = || self.syntax(span, format!("invalid variable path '{text}'"));
        let mut segments = Vec::new();
        for part in text.split('.') {
            if is_identifier(part) {
                segments.push(Segment::Key(part.to_string()));
            } else if !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()) {
                segments.push(Segment::Index(part.parse().map_err(|_| invalid())?));
            } else {
                return Err(invalid());
            }
        }
        VarPath::new(segments).ok_or_else(invalid)
    }
}

/// Appends text, merging with a preceding text node (comments split text runs).
fn push_text(nodes: &mut Vec<Node>, text: &str) {
    if let Some(Node::Text(prev)) = nodes.last_mut() {
        prev.push_str(text);
    } else {
        nodes.push(Node::Text(text.to_string()));
    }
}

fn is_identifier(s: &str) -> bool {
    let mut bytes = s.bytes();
    match bytes.next() {
        Some(b) if b.is_ascii_alphabetic() || b == b'_' => {}
        _ => return false,
    }
    bytes.all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

/// Parses a double-quoted string literal with `\"` and `\\` escapes.
fn parse_string_literal(s: &str) -> Option<String> {
    let inner = s.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next()? {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                other @ ('"' | '\\') => out.push(other),
                _ => return None,
            },
            '"' => return None,
            other => out.push(other),
        }
    }
    Some(out)
}
