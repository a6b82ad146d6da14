//! `{% for item in seq %} ... {% endfor %}`.

use super::{Block, Expression};

#[derive(Debug, Clone)]
pub struct Loop {
    pub item: String,
    pub sequence: Expression,
    pub subblocks: Vec<Block>,
}
