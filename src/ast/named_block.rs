//! `{% block name %} ... {% endblock %}`, eligible for override by a child
//! template.

use super::Block;

#[derive(Debug, Clone)]
pub struct NamedBlock {
    pub name: String,
    pub subblocks: Vec<Block>,
}
