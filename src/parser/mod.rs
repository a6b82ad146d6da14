//! Recursive-descent block/tag parser with an embedded Pratt expression
//! parser, producing a [`Template`] from a token stream. Every error is
//! recorded and parsing continues best-effort rather than aborting on the
//! first problem.

mod precedence;

use std::rc::Rc;

use indexmap::IndexMap;
use log::debug;

use crate::ast::{Block, Branch, Expression, Loop, NamedBlock, Operator, Tag, Template};
use crate::error::TemplateError;
use crate::lexer::Lexer;
use crate::token::{Position, Token, TokenKind};

use precedence::{infix_precedence, Precedence};

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    template_name: String,
    cur: Token,
    peek: Token,
    errors: Vec<TemplateError>,
    named_block_index: IndexMap<String, Rc<NamedBlock>>,
}

/// Parse a complete template from `source`, returning the AST together with
/// every error encountered along the way (empty if the template is valid).
pub fn parse(template_name: &str, source: &str) -> (Template, Vec<TemplateError>) {
    let mut parser = Parser::new(template_name, source);
    let (blocks, _) = parser.parse_block_list(&[], true);
    let template = Template {
        name: template_name.to_string(),
        source: Rc::from(source),
        blocks,
        named_block_index: parser.named_block_index,
    };
    (template, parser.errors)
}

impl<'a> Parser<'a> {
    fn new(template_name: &str, source: &'a str) -> Self {
        let mut lexer = Lexer::new(source);
        let cur = lexer.next_token();
        let peek = lexer.next_token();
        Self {
            lexer,
            template_name: template_name.to_string(),
            cur,
            peek,
            errors: vec![],
            named_block_index: IndexMap::new(),
        }
    }

    fn advance(&mut self) {
        let next = self.lexer.next_token();
        self.cur = std::mem::replace(&mut self.peek, next);
    }

    fn error(&mut self, position: Position, message: impl Into<String>) {
        self.errors
            .push(TemplateError::parse(self.template_name.clone(), position, message));
    }

    /// Require `self.cur` to have `kind`; consumes it and returns `true`, or
    /// records a diagnostic and returns `false` without advancing.
    fn expect(&mut self, kind: TokenKind) -> bool {
        if self.cur.kind == kind {
            self.advance();
            true
        } else {
            self.error(
                self.cur.position,
                format!("expected '{}', got '{}'", kind, self.cur.kind),
            );
            false
        }
    }

    fn expect_ident(&mut self) -> Option<String> {
        if self.cur.kind == TokenKind::Ident {
            let name = self.cur.literal.clone();
            self.advance();
            Some(name)
        } else {
            self.error(
                self.cur.position,
                format!("expected identifier, got '{}'", self.cur.kind),
            );
            None
        }
    }

    /// Skip the remainder of a malformed tag, up to and including its
    /// closing `%}`, so a single bad tag doesn't cascade into spurious
    /// errors for everything that follows it.
    fn skip_tag_tail(&mut self) {
        while !matches!(self.cur.kind, TokenKind::Percent | TokenKind::Eof) {
            self.advance();
        }
        if self.cur.kind == TokenKind::Percent {
            self.advance();
        }
        if self.cur.kind == TokenKind::RBrace {
            self.advance();
        }
    }

    /// Skip the remainder of a malformed `{{ ... }}`, up to and including
    /// its closing `}}`.
    fn synchronize_variable(&mut self) {
        while !matches!(self.cur.kind, TokenKind::RBrace | TokenKind::Eof) {
            self.advance();
        }
        if self.cur.kind == TokenKind::RBrace {
            self.advance();
        }
        if self.cur.kind == TokenKind::RBrace {
            self.advance();
        }
    }

    // ---- block-level grammar -------------------------------------------------

    /// Parse blocks until either EOF or a tag keyword in `stop` is reached.
    /// Returns the parsed blocks and the stop-set keyword that ended the
    /// scan (`TokenKind::Eof` if none of `stop` was found). `top_level`
    /// gates whether an `extends` tag here can be "the first block".
    fn parse_block_list(&mut self, stop: &[TokenKind], top_level: bool) -> (Vec<Block>, TokenKind) {
        let mut blocks = vec![];
        loop {
            match self.cur.kind {
                TokenKind::Eof => {
                    if !stop.is_empty() {
                        self.error(
                            self.cur.position,
                            format!("unexpected end of input, expected one of {stop:?}"),
                        );
                    }
                    return (blocks, TokenKind::Eof);
                }
                TokenKind::Content => {
                    blocks.push(Block::Content {
                        text: self.cur.literal.clone(),
                        position: self.cur.position,
                    });
                    self.advance();
                }
                TokenKind::LBrace if self.peek.kind == TokenKind::LBrace => {
                    match self.parse_variable_block() {
                        Some(block) => blocks.push(block),
                        None => self.synchronize_variable(),
                    }
                }
                TokenKind::LBrace if self.peek.kind == TokenKind::Percent => {
                    self.advance(); // {
                    self.advance(); // %, cur is now the tag keyword

                    if stop.contains(&self.cur.kind) {
                        return (blocks, self.cur.kind);
                    }

                    let is_first = top_level && blocks.is_empty();
                    debug!(
                        "parsing tag '{}' at {:?}",
                        self.cur.kind, self.cur.position
                    );
                    let parsed = match self.cur.kind {
                        TokenKind::For => self.parse_for_tag(),
                        TokenKind::If => self.parse_if_tag(),
                        TokenKind::Block => self.parse_named_block_tag(),
                        TokenKind::Extends => self.parse_extends_tag(is_first),
                        TokenKind::Break => self.parse_break_tag(),
                        TokenKind::EndFor
                        | TokenKind::EndIf
                        | TokenKind::EndBlock
                        | TokenKind::Elif
                        | TokenKind::Else => {
                            self.error(
                                self.cur.position,
                                format!("'{}' has no matching opening tag", self.cur.kind),
                            );
                            self.skip_tag_tail();
                            None
                        }
                        _ => {
                            self.error(
                                self.cur.position,
                                format!("unexpected tag '{}'", self.cur.literal),
                            );
                            self.skip_tag_tail();
                            None
                        }
                    };
                    if let Some(block) = parsed {
                        blocks.push(block);
                    }
                }
                TokenKind::LBrace => {
                    self.error(
                        self.cur.position,
                        "expected '{' or '%' to follow '{'".to_string(),
                    );
                    self.advance();
                }
                _ => {
                    self.error(
                        self.cur.position,
                        format!("unexpected token '{}' at block position", self.cur.kind),
                    );
                    self.advance();
                }
            }
        }
    }

    fn parse_variable_block(&mut self) -> Option<Block> {
        let position = self.cur.position;
        self.advance(); // {
        self.advance(); // {, cur now first token of the expression
        let expr = self.parse_expression(Precedence::Lowest)?;
        if !self.expect(TokenKind::RBrace) {
            return None;
        }
        if !self.expect(TokenKind::RBrace) {
            return None;
        }
        Some(Block::Variable { expr, position })
    }

    fn parse_for_tag(&mut self) -> Option<Block> {
        self.advance(); // for
        let item = self.expect_ident()?;
        if !self.expect(TokenKind::In) {
            return None;
        }
        let sequence = self.parse_expression(Precedence::Lowest)?;
        if !self.expect(TokenKind::Percent) {
            return None;
        }
        if !self.expect(TokenKind::RBrace) {
            return None;
        }
        let (subblocks, closed_with) = self.parse_block_list(&[TokenKind::EndFor], false);
        if closed_with == TokenKind::EndFor {
            self.advance(); // endfor
            self.expect(TokenKind::Percent);
            self.expect(TokenKind::RBrace);
        }
        Some(Block::Tag(Tag::For(Loop {
            item,
            sequence,
            subblocks,
        })))
    }

    fn parse_if_tag(&mut self) -> Option<Block> {
        let branch = self.parse_if_or_elif_branch()?;
        Some(Block::Tag(Tag::If(branch)))
    }

    fn parse_if_or_elif_branch(&mut self) -> Option<Branch> {
        self.advance(); // if | elif
        let condition = self.parse_expression(Precedence::Lowest)?;
        if !self.expect(TokenKind::Percent) {
            return None;
        }
        if !self.expect(TokenKind::RBrace) {
            return None;
        }
        let (subblocks, closed_with) =
            self.parse_block_list(&[TokenKind::Elif, TokenKind::Else, TokenKind::EndIf], false);
        let next = match closed_with {
            TokenKind::Elif => Some(Box::new(self.parse_if_or_elif_branch()?)),
            TokenKind::Else => Some(Box::new(self.parse_else_branch()?)),
            TokenKind::EndIf => {
                self.advance(); // endif
                self.expect(TokenKind::Percent);
                self.expect(TokenKind::RBrace);
                None
            }
            _ => None, // Eof: parse_block_list already recorded the error
        };
        Some(Branch {
            condition: Some(condition),
            subblocks,
            next,
        })
    }

    fn parse_else_branch(&mut self) -> Option<Branch> {
        self.advance(); // else
        if !self.expect(TokenKind::Percent) {
            return None;
        }
        if !self.expect(TokenKind::RBrace) {
            return None;
        }
        let (subblocks, closed_with) = self.parse_block_list(&[TokenKind::EndIf], false);
        if closed_with == TokenKind::EndIf {
            self.advance(); // endif
            self.expect(TokenKind::Percent);
            self.expect(TokenKind::RBrace);
        }
        Some(Branch {
            condition: None,
            subblocks,
            next: None,
        })
    }

    fn parse_named_block_tag(&mut self) -> Option<Block> {
        self.advance(); // block
        let name = self.expect_ident()?;
        if !self.expect(TokenKind::Percent) {
            return None;
        }
        if !self.expect(TokenKind::RBrace) {
            return None;
        }
        let (subblocks, closed_with) = self.parse_block_list(&[TokenKind::EndBlock], false);
        if closed_with == TokenKind::EndBlock {
            self.advance(); // endblock
            self.expect(TokenKind::Percent);
            self.expect(TokenKind::RBrace);
        }
        let node = Rc::new(NamedBlock {
            name: name.clone(),
            subblocks,
        });
        debug!("registering named block '{name}' in template '{}'", self.template_name);
        self.named_block_index.insert(name, Rc::clone(&node));
        Some(Block::Tag(Tag::Block(node)))
    }

    fn parse_extends_tag(&mut self, is_first: bool) -> Option<Block> {
        let position = self.cur.position;
        if !is_first {
            self.error(position, "'extends' must be the first block in a template");
        }
        self.advance(); // extends
        if self.cur.kind != TokenKind::String {
            self.error(
                self.cur.position,
                format!("expected a quoted template name after 'extends', got '{}'", self.cur.kind),
            );
            return None;
        }
        let parent = strip_quotes(&self.cur.literal);
        self.advance();
        if !self.expect(TokenKind::Percent) {
            return None;
        }
        if !self.expect(TokenKind::RBrace) {
            return None;
        }
        Some(Block::Tag(Tag::Extends { parent, position }))
    }

    fn parse_break_tag(&mut self) -> Option<Block> {
        let position = self.cur.position;
        self.advance(); // break
        if !self.expect(TokenKind::Percent) {
            return None;
        }
        if !self.expect(TokenKind::RBrace) {
            return None;
        }
        Some(Block::Tag(Tag::Break { position }))
    }

    // ---- Pratt expression grammar --------------------------------------------

    fn parse_expression(&mut self, precedence: Precedence) -> Option<Expression> {
        let mut left = self.parse_prefix()?;
        while infix_precedence(self.cur.kind) > precedence {
            left = self.parse_infix(left)?;
        }
        Some(left)
    }

    fn parse_prefix(&mut self) -> Option<Expression> {
        match self.cur.kind {
            TokenKind::Ident => {
                let name = self.cur.literal.clone();
                let position = self.cur.position;
                self.advance();
                Some(Expression::Ident { name, position })
            }
            TokenKind::Int => {
                let position = self.cur.position;
                let literal = self.cur.literal.clone();
                self.advance();
                match literal.parse::<i64>() {
                    Ok(value) => Some(Expression::Integer { value, position }),
                    Err(_) => {
                        self.error(position, format!("invalid integer literal '{literal}'"));
                        None
                    }
                }
            }
            TokenKind::True | TokenKind::False => {
                let value = self.cur.kind == TokenKind::True;
                let position = self.cur.position;
                self.advance();
                Some(Expression::Boolean { value, position })
            }
            TokenKind::String => {
                let position = self.cur.position;
                let raw = self.cur.literal.clone();
                self.advance();
                Some(Expression::Str {
                    value: strip_quotes(&raw),
                    position,
                })
            }
            TokenKind::LParen => {
                self.advance(); // (
                let expr = self.parse_expression(Precedence::Lowest)?;
                if !self.expect(TokenKind::RParen) {
                    return None;
                }
                Some(expr)
            }
            TokenKind::Bang | TokenKind::Minus | TokenKind::Not => {
                let literal = self.cur.literal.clone();
                let position = self.cur.position;
                self.advance();
                let right = self.parse_expression(Precedence::Prefix)?;
                Some(Expression::Prefix {
                    op: Operator { literal, position },
                    right: Box::new(right),
                })
            }
            _ => {
                self.error(
                    self.cur.position,
                    format!("'{}' not recognized as prefix", self.cur.kind),
                );
                None
            }
        }
    }

    fn parse_infix(&mut self, left: Expression) -> Option<Expression> {
        match self.cur.kind {
            TokenKind::Dot => {
                let position = self.cur.position;
                self.check_left_shape(&left, position)?;
                self.advance(); // .
                let key = self.expect_ident()?;
                Some(Expression::Member {
                    left: Box::new(left),
                    key,
                    position,
                })
            }
            TokenKind::LBracket => {
                let position = self.cur.position;
                self.check_left_shape(&left, position)?;
                self.advance(); // [
                let key = self.parse_expression(Precedence::Lowest)?;
                if !self.expect(TokenKind::RBracket) {
                    return None;
                }
                Some(Expression::Index {
                    left: Box::new(left),
                    key: Box::new(key),
                    position,
                })
            }
            _ => {
                let literal = self.cur.literal.clone();
                let position = self.cur.position;
                let precedence = infix_precedence(self.cur.kind);
                self.advance();
                let right = self.parse_expression(precedence)?;
                Some(Expression::Infix {
                    op: Operator { literal, position },
                    left: Box::new(left),
                    right: Box::new(right),
                })
            }
        }
    }

    fn check_left_shape(&mut self, left: &Expression, position: Position) -> Option<()> {
        match left {
            Expression::Ident { .. } | Expression::Member { .. } | Expression::Index { .. } => {
                Some(())
            }
            _ => {
                self.error(
                    position,
                    "left-hand side of member/index access must be an identifier, member, or index expression",
                );
                None
            }
        }
    }
}

fn strip_quotes(s: &str) -> String {
    s.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(s)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(src: &str) -> Template {
        let (template, errors) = parse("t", src);
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
        template
    }

    #[test]
    fn content_only_template() {
        let template = parse_ok("hello, world");
        assert_eq!(template.blocks.len(), 1);
        assert!(matches!(&template.blocks[0], Block::Content { text, .. } if text == "hello, world"));
    }

    #[test]
    fn precedence_round_trip() {
        let (template, errors) = parse("t", "{{ foo.bar + bar[0].baz * foo.bar.baz }}");
        assert!(errors.is_empty(), "{errors:?}");
        let Block::Variable { expr, .. } = &template.blocks[0] else {
            panic!("expected a variable block");
        };
        assert_eq!(
            expr.to_parenthesized_string(),
            "(foo.bar + (bar[0].baz * foo.bar.baz))"
        );
    }

    #[test]
    fn simple_arithmetic_precedence() {
        let (template, errors) = parse("t", "{{ a + b * c }}");
        assert!(errors.is_empty());
        let Block::Variable { expr, .. } = &template.blocks[0] else {
            panic!()
        };
        assert_eq!(expr.to_parenthesized_string(), "(a + (b * c))");
    }

    #[test]
    fn if_elif_else_chain() {
        let template = parse_ok("{% if foo %}a{% elif bar %}b{% else %}c{% endif %}");
        assert_eq!(template.blocks.len(), 1);
        let Block::Tag(Tag::If(branch)) = &template.blocks[0] else {
            panic!("expected an if tag");
        };
        assert!(branch.condition.is_some());
        let elif = branch.next.as_ref().unwrap();
        assert!(elif.condition.is_some());
        let else_branch = elif.next.as_ref().unwrap();
        assert!(else_branch.condition.is_none());
        assert!(else_branch.next.is_none());
    }

    #[test]
    fn named_blocks_are_indexed_at_any_depth() {
        let template =
            parse_ok("{% if x %}{% block inner %}hi{% endblock %}{% endif %}");
        assert!(template.named_block_index.contains_key("inner"));
    }

    #[test]
    fn extends_must_be_first() {
        let (_, errors) = parse("t", "hi{% extends \"base\" %}");
        assert!(errors.iter().any(|e| e.to_string().contains("must be the first block")));
    }

    #[test]
    fn mismatched_close_is_an_error() {
        let (_, errors) = parse("t", "{% for v in xs %}{{ v }}{% endif %}");
        assert!(!errors.is_empty());
    }

    #[test]
    fn unterminated_tag_is_an_error() {
        let (_, errors) = parse("t", "{% for v in xs %}{{ v }}");
        assert!(errors.iter().any(|e| e.to_string().contains("unexpected end of input")));
    }
}
