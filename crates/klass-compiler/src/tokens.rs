//! Tokens produced by the [`lexer`](super::lexer).
//!
//! Only structural words are reserved. Modifiers, verbs, operators spelled
//! as words (`in`, `contains`, ...) and criteria keywords are lexed as
//! identifiers and recognized by the parser in context, so they remain
//! usable as member names.

use std::fmt;

use crate::span::Span;

#[derive(Debug, Clone, PartialEq)]
pub enum Token<'a> {
    // Reserved words
    Package,
    Enumeration,
    Class,
    User,
    Interface,
    Association,
    Projection,
    Service,
    Relationship,
    Extends,
    Implements,
    On,
    OrderBy,
    This,
    Null,
    True,
    False,

    Identifier(&'a str),
    StringLiteral(String),
    IntegerLiteral(i64),
    FloatLiteral(f64),

    // Operators
    EqualsEquals,
    NotEquals,
    LessEquals,
    GreaterEquals,
    Less,
    Greater,
    AndAnd,
    OrOr,
    DotDot,

    // Punctuation
    Dot,
    Colon,
    Semicolon,
    Comma,
    Question,
    Star,
    Slash,
    Ampersand,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    LeftParen,
    RightParen,

    // Trivia
    Whitespace,
    Newline,
    LineComment(&'a str),
    BlockComment(&'a str),
}

impl Token<'_> {
    /// The source text of a reserved word, for contexts that accept any word
    /// (URL path segments).
    pub fn reserved_word(&self) -> Option<&'static str> {
        let word = match self {
            Token::Package => "package",
            Token::Enumeration => "enumeration",
            Token::Class => "class",
            Token::User => "user",
            Token::Interface => "interface",
            Token::Association => "association",
            Token::Projection => "projection",
            Token::Service => "service",
            Token::Relationship => "relationship",
            Token::Extends => "extends",
            Token::Implements => "implements",
            Token::On => "on",
            Token::OrderBy => "orderBy",
            Token::This => "this",
            Token::Null => "null",
            Token::True => "true",
            Token::False => "false",
            _ => return None,
        };
        Some(word)
    }

    pub fn is_trivia(&self) -> bool {
        matches!(
            self,
            Token::Whitespace | Token::Newline | Token::LineComment(_) | Token::BlockComment(_)
        )
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(word) = self.reserved_word() {
            return f.write_str(word);
        }
        match self {
            Token::Identifier(name) => f.write_str(name),
            Token::StringLiteral(text) => write!(f, "{text:?}"),
            Token::IntegerLiteral(value) => write!(f, "{value}"),
            Token::FloatLiteral(value) => write!(f, "{value}"),
            Token::EqualsEquals => f.write_str("=="),
            Token::NotEquals => f.write_str("!="),
            Token::LessEquals => f.write_str("<="),
            Token::GreaterEquals => f.write_str(">="),
            Token::Less => f.write_str("<"),
            Token::Greater => f.write_str(">"),
            Token::AndAnd => f.write_str("&&"),
            Token::OrOr => f.write_str("||"),
            Token::DotDot => f.write_str(".."),
            Token::Dot => f.write_str("."),
            Token::Colon => f.write_str(":"),
            Token::Semicolon => f.write_str(";"),
            Token::Comma => f.write_str(","),
            Token::Question => f.write_str("?"),
            Token::Star => f.write_str("*"),
            Token::Slash => f.write_str("/"),
            Token::Ampersand => f.write_str("&"),
            Token::LeftBrace => f.write_str("{"),
            Token::RightBrace => f.write_str("}"),
            Token::LeftBracket => f.write_str("["),
            Token::RightBracket => f.write_str("]"),
            Token::LeftParen => f.write_str("("),
            Token::RightParen => f.write_str(")"),
            Token::Whitespace => f.write_str(" "),
            Token::Newline => f.write_str("\n"),
            Token::LineComment(text) => write!(f, "//{text}"),
            Token::BlockComment(text) => write!(f, "/*{text}*/"),
            _ => Ok(()),
        }
    }
}

/// A token with its byte span in the source text.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedToken<'a> {
    pub token: Token<'a>,
    pub span: Span,
}

impl<'a> PositionedToken<'a> {
    pub fn new(token: Token<'a>, span: Span) -> Self {
        Self { token, span }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_words() {
        assert_eq!(Token::OrderBy.reserved_word(), Some("orderBy"));
        assert_eq!(Token::Identifier("version").reserved_word(), None);
        assert_eq!(Token::User.to_string(), "user");
    }

    #[test]
    fn test_trivia() {
        assert!(Token::BlockComment(" note ").is_trivia());
        assert!(Token::Newline.is_trivia());
        assert!(!Token::Semicolon.is_trivia());
    }
}
