//! Token kinds and the keyword table the lexer consults when scanning an
//! identifier-shaped run of characters.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;

/// Line/column origin of a token, 1-indexed.
pub type Position = (usize, usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Illegal,
    Eof,

    Ident,
    Int,
    String,

    // arithmetic
    Plus,
    Minus,
    Asterisk,
    Slash,

    // comparison
    Lt,
    Gt,
    Lte,
    Gte,
    Eq,
    NotEq,

    // logical
    And,
    Or,
    Not,

    // prefix-only
    Bang,

    // delimiters
    Dot,
    Comma,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Percent,

    // keywords
    For,
    In,
    Break,
    EndFor,
    True,
    False,
    If,
    Elif,
    Else,
    EndIf,
    Extends,
    Block,
    EndBlock,

    Content,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

static KEYWORDS: Lazy<HashMap<&'static str, TokenKind>> = Lazy::new(|| {
    use TokenKind::*;
    HashMap::from([
        ("for", For),
        ("in", In),
        ("break", Break),
        ("endfor", EndFor),
        ("true", True),
        ("false", False),
        ("if", If),
        ("elif", Elif),
        ("else", Else),
        ("endif", EndIf),
        ("extends", Extends),
        ("block", Block),
        ("endblock", EndBlock),
        ("and", And),
        ("or", Or),
        ("not", Not),
    ])
});

/// Look up an identifier-shaped literal in the keyword table; `Ident` if it
/// isn't a keyword.
pub fn lookup_ident(literal: &str) -> TokenKind {
    KEYWORDS.get(literal).copied().unwrap_or(TokenKind::Ident)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: String,
    pub position: Position,
}

impl Token {
    pub fn new(kind: TokenKind, literal: impl Into<String>, position: Position) -> Self {
        Self {
            kind,
            literal: literal.into(),
            position,
        }
    }

    pub fn line(&self) -> usize {
        self.position.0
    }

    pub fn column(&self) -> usize {
        self.position.1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_are_recognized() {
        assert_eq!(lookup_ident("for"), TokenKind::For);
        assert_eq!(lookup_ident("endblock"), TokenKind::EndBlock);
        assert_eq!(lookup_ident("and"), TokenKind::And);
    }

    #[test]
    fn non_keywords_are_idents() {
        assert_eq!(lookup_ident("foo"), TokenKind::Ident);
        assert_eq!(lookup_ident("forever"), TokenKind::Ident);
    }
}
