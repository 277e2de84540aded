use crate::compile::tree::Node;

/// A distinct set of Node instances.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scope {
    pub data: Vec<Node>,
}

impl Scope {
    /// Create a new Scope.
    #[inline]
    pub fn new() -> Self {
        Self { data: vec![] }
    }
}
