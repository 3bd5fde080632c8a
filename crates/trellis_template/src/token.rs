//! Token definitions for the layout lexer.

use trellis_source::Span;

/// The kind of a layout token.
///
/// Tag kinds carry an argument span (see [`Token::arg`]) pointing at the tag's
/// content with the delimiters, sigil, keyword and surrounding whitespace removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// Literal text between tags.
    Text,
    /// `{{ path }}` or `{{ path | "default" }}`.
    Variable,
    /// `{{#if cond}}`.
    IfOpen,
    /// `{{else}}`.
    Else,
    /// `{{/if}}`.
    IfClose,
    /// `{{#each path as name}}`.
    EachOpen,
    /// `{{/each}}`.
    EachClose,
    /// `{{> target}}`.
    Include,
    /// `{{! ... }}`.
    Comment,
}

impl TokenKind {
    /// Returns how the tag is written in source, for error messages.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Text => "text",
            TokenKind::Variable => "variable",
            TokenKind::IfOpen => "{{#if}}",
            TokenKind::Else => "{{else}}",
            TokenKind::IfClose => "{{/if}}",
            TokenKind::EachOpen => "{{#each}}",
            TokenKind::EachClose => "{{/each}}",
            TokenKind::Include => "{{>}}",
            TokenKind::Comment => "comment",
        }
    }
}

/// A token with its kind and source locations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token {
    /// What kind of token this is.
    pub kind: TokenKind,
    /// The whole token, delimiters included.
    pub span: Span,
    /// The token's argument. For text this equals `span`.
    pub arg: Span,
}
