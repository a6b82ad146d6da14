//! Root of the AST: a single parsed template.

use std::rc::Rc;

use indexmap::IndexMap;

use super::{Block, NamedBlock};

#[derive(Debug, Clone)]
pub struct Template {
    pub name: String,
    pub source: Rc<str>,
    pub blocks: Vec<Block>,
    /// Maps `{% block NAME %}` names to their node, registered at parse
    /// time regardless of nesting depth.
    pub named_block_index: IndexMap<String, Rc<NamedBlock>>,
}

impl Template {
    /// The parent name if this template's first block is `{% extends "..." %}`.
    pub fn extends(&self) -> Option<&str> {
        match self.blocks.first() {
            Some(Block::Tag(super::Tag::Extends { parent, .. })) => Some(parent.as_str()),
            _ => None,
        }
    }
}
