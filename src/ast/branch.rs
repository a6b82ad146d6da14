//! One arm of an `if`/`elif`/`else` chain.

use super::{Block, Expression};

/// A missing `condition` denotes the terminal `else` branch. Branches form a
/// singly-linked chain through `next`: `if` -> `elif` -> ... -> `else`.
#[derive(Debug, Clone)]
pub struct Branch {
    pub condition: Option<Expression>,
    pub subblocks: Vec<Block>,
    pub next: Option<Box<Branch>>,
}
