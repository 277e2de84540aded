use super::Scope;

/// A compiled [`Template`] that can be rendered against a context stack.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    /// The name of the [`Template`].
    pub name: Option<String>,
    /// The Abstract Syntax Tree generated during compilation.
    pub scope: Scope,
    /// The source text from which this [`Template`] was generated.
    ///
    /// Text nodes and section bodies refer to regions of this text.
    pub source: String,
}

