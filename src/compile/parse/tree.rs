use crate::{compile::Scope, region::Region, syntax::Delimiters};
use std::fmt::Display;

/// The Abstract Syntax Tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Raw text.
    Text(Text),
    /// Render a value from the context stack.
    Variable(Variable),
    /// Render a scope conditionally or repeatedly.
    Section(Section),
    /// Render another template.
    Partial(Partial),
}

/// Literal text copied to the output.
#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    /// Location of the text within the template source.
    pub region: Region,
    /// True when the text ends a line, which means the next write should be
    /// indented if a partial is being rendered.
    pub end_of_line: bool,
}

/// A `{{name}}`, `{{{name}}}` or `{{&name}}` tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub key: Key,
    /// True when the value is written without HTML escaping.
    pub unescaped: bool,
}

/// A `{{#name}}...{{/name}}` or `{{^name}}...{{/name}}` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub key: Key,
    pub inverted: bool,
    /// The delimiters that were active when the section was opened.
    ///
    /// Text returned from a section lambda is parsed with these.
    pub delimiters: Delimiters,
    /// Location of the raw text between the open and close tags.
    pub inner: Region,
    pub scope: Scope,
}

/// A `{{>name}}` tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Partial {
    /// Name of the template to render.
    pub name: String,
    /// Whitespace written before every line of the partial.
    ///
    /// Only a standalone partial tag has an indent.
    pub indent: String,
    /// Location of the tag.
    pub region: Region,
}

/// A dotted key that locates a value on the context stack.
///
/// The implicit key `.` has an empty path and refers to the top of the stack.
#[derive(Debug, Clone, PartialEq)]
pub struct Key {
    pub path: Vec<String>,
    /// Location of the key text within the template source.
    pub region: Region,
}

impl Key {
    /// Create a new [`Key`] from already validated key text.
    pub fn new(text: &str, region: Region) -> Self {
        let path = if text == "." {
            vec![]
        } else {
            text.split('.').map(String::from).collect()
        };

        Self { path, region }
    }

    /// Return true if this is the implicit key `.`.
    #[inline]
    pub fn is_implicit(&self) -> bool {
        self.path.is_empty()
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_implicit() {
            return write!(f, ".");
        }

        write!(f, "{}", self.path.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::Key;
    use crate::region::Region;

    #[test]
    fn test_key_path() {
        let key = Key::new("person.name", Region::new(0..11));

        assert_eq!(key.path, vec!["person", "name"]);
        assert_eq!(key.to_string(), "person.name");
        assert!(!key.is_implicit());
    }

    #[test]
    fn test_key_implicit() {
        let key = Key::new(".", Region::new(2..3));

        assert!(key.is_implicit());
        assert_eq!(key.to_string(), ".");
    }
}
