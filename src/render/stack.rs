use crate::{compile::Key, value::Value};

/// The context stack that keys are resolved against.
///
/// Frames are pushed when a section is entered, and popped when it is left.
#[derive(Debug, Default)]
pub struct Stack {
    data: Vec<Value>,
}

impl Stack {
    /// Create a new [`Stack`] from the given contexts.
    ///
    /// The first context is placed on top, so it is searched first.
    pub fn new(contexts: &[Value]) -> Self {
        Self {
            data: contexts.iter().rev().cloned().collect(),
        }
    }

    /// Push a new frame onto the [`Stack`].
    #[inline]
    pub fn push(&mut self, value: Value) {
        self.data.push(value);
    }

    /// Remove the top frame from the [`Stack`].
    #[inline]
    pub fn pop(&mut self) -> Option<Value> {
        self.data.pop()
    }

    /// Return the top frame.
    #[inline]
    pub fn top(&self) -> Option<&Value> {
        self.data.last()
    }

    /// Resolve the given [`Key`].
    ///
    /// The implicit key returns the top frame. Otherwise the first segment is
    /// searched for from the top frame down, and each following segment is
    /// resolved only against the value found for the segment before it.
    pub fn resolve(&self, key: &Key) -> Option<Value> {
        let Some((first, rest)) = key.path.split_first() else {
            return self.top().cloned();
        };

        let mut value = self
            .data
            .iter()
            .rev()
            .find_map(|frame| frame.lookup(first))?;
        for segment in rest {
            value = value.lookup(segment)?;
        }

        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::Stack;
    use crate::{compile::Key, region::Region, value::Value};
    use serde_json::json;

    fn key(text: &str) -> Key {
        Key::new(text, Region::default())
    }

    #[test]
    fn test_first_context_wins() {
        let stack = Stack::new(&[json!({"a": "first"}).into(), json!({"a": "second", "b": "second"}).into()]);

        assert_eq!(stack.resolve(&key("a")).map(|v| v.stringify()), Some("first".into()));
        assert_eq!(stack.resolve(&key("b")).map(|v| v.stringify()), Some("second".into()));
    }

    #[test]
    fn test_push_shadows() {
        let mut stack = Stack::new(&[json!({"one": "one", "two": "two"}).into()]);
        stack.push(json!({"one": "shadowed one"}).into());

        assert_eq!(stack.resolve(&key("one")).map(|v| v.stringify()), Some("shadowed one".into()));
        assert_eq!(stack.resolve(&key("two")).map(|v| v.stringify()), Some("two".into()));
        stack.pop();

        assert_eq!(stack.resolve(&key("one")).map(|v| v.stringify()), Some("one".into()));
    }

    #[test]
    fn test_implicit_is_top() {
        let mut stack = Stack::new(&[]);
        assert!(stack.resolve(&key(".")).is_none());

        stack.push(Value::from("top"));
        assert_eq!(stack.resolve(&key(".")).map(|v| v.stringify()), Some("top".into()));
    }

    #[test]
    fn test_dotted_chain_failure_is_local() {
        let mut stack = Stack::new(&[json!({"a": {"b": {"c": "outer"}}}).into()]);
        stack.push(json!({"a": {"x": 1}}).into());

        assert!(stack.resolve(&key("a.b.c")).is_none());
    }

    #[test]
    fn test_null_is_unresolved() {
        let stack = Stack::new(&[json!({"a": "outer"}).into()]);
        let mut inner = Stack::new(&[json!({"a": "outer"}).into()]);
        inner.push(json!({"a": null}).into());

        assert!(stack.resolve(&key("a")).is_some());
        assert_eq!(inner.resolve(&key("a")).map(|v| v.stringify()), Some("outer".into()));
    }
}
