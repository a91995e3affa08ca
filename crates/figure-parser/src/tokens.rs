//! Token definitions produced by the [`lexer`](crate::lexer).

use std::fmt;

use crate::span::Span;

/// Token types for the Figure language
///
/// Whitespace and comments never become tokens; the lexer discards them.
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'src> {
    // Keywords
    Include, // #include or %include

    // Literals
    StringLiteral(String),
    /// Raw body of a `"""` or `'''` string, normalized later.
    MultilineString(&'src str),
    Identifier(&'src str),
    Integer(i64),
    Float(f64),
    /// Alternatives of a `%{a,b,c}` expansion macro.
    Macro(Vec<&'src str>),

    // Punctuation
    SectionEnd,   // []
    At,           // @
    Dot,          // .
    Colon,        // :
    Comma,        // ,
    LeftBracket,  // [
    RightBracket, // ]
    LeftBrace,    // {
    RightBrace,   // }
}

/// A token with position information for winnow integration
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedToken<'src> {
    pub token: Token<'src>,
    pub span: Span,
}

impl<'src> PositionedToken<'src> {
    pub fn new(token: Token<'src>, span: Span) -> Self {
        Self { token, span }
    }
}

impl<'src> std::ops::Deref for PositionedToken<'src> {
    type Target = Token<'src>;

    fn deref(&self) -> &Self::Target {
        &self.token
    }
}

impl fmt::Display for PositionedToken<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.token.fmt(f)
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Include => write!(f, "#include"),

            Token::StringLiteral(s) => write!(f, "{s:?}"),
            Token::MultilineString(_) => write!(f, "multiline string"),
            Token::Identifier(name) => write!(f, "{name}"),
            Token::Integer(n) => write!(f, "{n}"),
            Token::Float(n) => write!(f, "{n:?}"),
            Token::Macro(names) => write!(f, "%{{{}}}", names.join(",")),

            Token::SectionEnd => write!(f, "[]"),
            Token::At => write!(f, "@"),
            Token::Dot => write!(f, "."),
            Token::Colon => write!(f, ":"),
            Token::Comma => write!(f, ","),
            Token::LeftBracket => write!(f, "["),
            Token::RightBracket => write!(f, "]"),
            Token::LeftBrace => write!(f, "{{"),
            Token::RightBrace => write!(f, "}}"),
        }
    }
}
