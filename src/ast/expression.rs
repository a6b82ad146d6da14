//! Expression nodes produced by the Pratt parser.

use crate::token::Position;

/// A binary or unary operator, carried on [`Expression::Prefix`] and
/// [`Expression::Infix`] as the literal operator text (`+`, `==`, `and`, ...)
/// together with the originating position for error messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operator {
    pub literal: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Ident {
        name: String,
        position: Position,
    },
    Integer {
        value: i64,
        position: Position,
    },
    Boolean {
        value: bool,
        position: Position,
    },
    Str {
        value: String,
        position: Position,
    },
    Prefix {
        op: Operator,
        right: Box<Expression>,
    },
    Infix {
        op: Operator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// `left.key` — `key` is always an identifier.
    Member {
        left: Box<Expression>,
        key: String,
        position: Position,
    },
    /// `left[key]` — `key` is an arbitrary expression.
    Index {
        left: Box<Expression>,
        key: Box<Expression>,
        position: Position,
    },
}

impl Expression {
    pub fn position(&self) -> Position {
        match self {
            Expression::Ident { position, .. }
            | Expression::Integer { position, .. }
            | Expression::Boolean { position, .. }
            | Expression::Str { position, .. }
            | Expression::Member { position, .. }
            | Expression::Index { position, .. } => *position,
            Expression::Prefix { op, .. } => op.position,
            Expression::Infix { op, .. } => op.position,
        }
    }

    /// Fully parenthesized precedence-respecting string form, used by the
    /// round-trip property test and handy for debugging.
    pub fn to_parenthesized_string(&self) -> String {
        match self {
            Expression::Ident { name, .. } => name.clone(),
            Expression::Integer { value, .. } => value.to_string(),
            Expression::Boolean { value, .. } => value.to_string(),
            Expression::Str { value, .. } => format!("\"{value}\""),
            Expression::Prefix { op, right } => {
                format!("({}{})", op.literal, right.to_parenthesized_string())
            }
            Expression::Infix { op, left, right } => format!(
                "({} {} {})",
                left.to_parenthesized_string(),
                op.literal,
                right.to_parenthesized_string()
            ),
            Expression::Member { left, key, .. } => {
                format!("{}.{}", left.to_parenthesized_string(), key)
            }
            Expression::Index { left, key, .. } => format!(
                "{}[{}]",
                left.to_parenthesized_string(),
                key.to_parenthesized_string()
            ),
        }
    }
}
