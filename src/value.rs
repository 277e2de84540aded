//! Host data that templates are rendered against.
//!
//! Every context frame is a [`Value`]. Conversions exist for the common Rust
//! types, for anything that implements `serde::Serialize`, and for callables
//! used as lambdas. Types with computed or named members can implement
//! [`Object`] to be resolved by name.
use crate::log::{Error, ErrorKind};
use serde::Serialize;
use serde_json::Number;
use std::{
    collections::{BTreeMap, HashMap},
    fmt::{Debug, Display, Formatter, Result as FmtResult},
    sync::Arc,
};

/// A record whose members can be looked up by name.
///
/// # Examples
///
/// ```
/// use stache::{Object, Value};
///
/// #[derive(Debug)]
/// struct Person {
///     first: String,
///     last: String,
/// }
///
/// impl Object for Person {
///     fn field(&self, name: &str) -> Option<Value> {
///         match name {
///             "first" => Some(self.first.clone().into()),
///             "last" => Some(self.last.clone().into()),
///             _ => None,
///         }
///     }
///
///     fn method(&self, name: &str) -> Option<Value> {
///         match name {
///             "full" => Some(format!("{} {}", self.first, self.last).into()),
///             _ => None,
///         }
///     }
/// }
///
/// let person = Value::object(Person { first: "Ada".into(), last: "Lovelace".into() });
/// assert_eq!(person.lookup("full").unwrap().stringify(), "Ada Lovelace");
/// ```
pub trait Object: Debug + Send + Sync {
    /// Return the stored member with the given name.
    fn field(&self, name: &str) -> Option<Value>;

    /// Return the result of the computed member with the given name.
    ///
    /// Consulted before [`field`][`Object::field`], so a computed member
    /// shadows a stored one of the same name.
    fn method(&self, name: &str) -> Option<Value> {
        let _ = name;
        None
    }
}

/// A zero argument callable that stands in for a variable.
///
/// The returned text is parsed as a template and rendered against the current
/// context stack.
#[derive(Clone)]
pub struct Lambda(Arc<dyn Fn() -> String + Send + Sync>);

impl Lambda {
    /// Invoke the callable.
    #[inline]
    pub fn call(&self) -> String {
        (self.0)()
    }
}

impl Debug for Lambda {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "Lambda")
    }
}

/// A callable that receives the raw text of a section.
///
/// The returned text is parsed with the delimiters active at the section and
/// rendered against the current context stack.
#[derive(Clone)]
pub struct SectionLambda(Arc<dyn Fn(&str) -> String + Send + Sync>);

impl SectionLambda {
    /// Invoke the callable with the raw section text.
    #[inline]
    pub fn call(&self, text: &str) -> String {
        (self.0)(text)
    }
}

impl Debug for SectionLambda {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "SectionLambda")
    }
}

/// Data that a template can be rendered against.
///
/// Lists and maps are reference counted, so cloning a `Value` to push it onto
/// the context stack does not copy its contents.
#[derive(Clone, Debug, Default)]
pub enum Value {
    /// Absent data.
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    List(Arc<Vec<Value>>),
    Map(Arc<BTreeMap<String, Value>>),
    /// A record with named members.
    Object(Arc<dyn Object>),
    /// A zero argument callable.
    Lambda(Lambda),
    /// A callable that receives the raw text of a section.
    SectionLambda(SectionLambda),
}

impl Value {
    /// Create a [`Value::Lambda`] from the given function.
    ///
    /// # Examples
    ///
    /// ```
    /// use stache::{compile, render, Store, Template, Value};
    /// use std::collections::HashMap;
    ///
    /// let template = compile("Hello, {{greet}}!").unwrap();
    /// let partials: HashMap<String, Template> = HashMap::new();
    /// let store = Store::new()
    ///     .with_must("planet", "world")
    ///     .with_value("greet", Value::lambda(|| "{{planet}}".to_string()));
    ///
    /// let output = render(&template, &partials, &[store.into()]);
    /// assert_eq!(output.unwrap(), "Hello, world!");
    /// ```
    pub fn lambda<F>(f: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Value::Lambda(Lambda(Arc::new(f)))
    }

    /// Create a [`Value::SectionLambda`] from the given function.
    pub fn section_lambda<F>(f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Value::SectionLambda(SectionLambda(Arc::new(f)))
    }

    /// Create a [`Value::Object`] from the given [`Object`].
    pub fn object<T>(object: T) -> Self
    where
        T: Object + 'static,
    {
        Value::Object(Arc::new(object))
    }

    /// Convert any serializable value into a [`Value`].
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if the serialization fails, such as when a map has
    /// non-string keys.
    pub fn serialize<T>(value: &T) -> Result<Self, Error>
    where
        T: Serialize + ?Sized,
    {
        serde_json::to_value(value)
            .map(Value::from)
            .map_err(|e| Error::build(ErrorKind::Serialize).with_help(e.to_string()))
    }

    /// Return true if this is [`Value::Null`].
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Return true if the value should cause a section to render.
    ///
    /// A zero argument lambda is invoked and its raw result decides. Maps and
    /// objects are truthy even when empty.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(bool) => *bool,
            Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
            Value::String(string) => !string.is_empty(),
            Value::List(list) => !list.is_empty(),
            Value::Map(_) | Value::Object(_) => true,
            Value::Lambda(lambda) => !lambda.call().is_empty(),
            Value::SectionLambda(_) => true,
        }
    }

    /// Return the elements if this is a list.
    #[inline]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(list) => Some(list.as_slice()),
            _ => None,
        }
    }

    /// Return the callable if this is a zero argument lambda.
    #[inline]
    pub fn as_callable_0(&self) -> Option<&Lambda> {
        match self {
            Value::Lambda(lambda) => Some(lambda),
            _ => None,
        }
    }

    /// Return the callable if this is a section lambda.
    #[inline]
    pub fn as_callable_1(&self) -> Option<&SectionLambda> {
        match self {
            Value::SectionLambda(lambda) => Some(lambda),
            _ => None,
        }
    }

    /// Resolve a single name against this value.
    ///
    /// Maps are searched by key and objects by member, with computed members
    /// taking precedence. A member that resolves to [`Value::Null`] counts as
    /// missing.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        let found = match self {
            Value::Map(map) => map.get(name).cloned(),
            Value::Object(object) => object.method(name).or_else(|| object.field(name)),
            _ => None,
        };

        found.filter(|value| !value.is_null())
    }

    /// Return the text representation used by variable tags.
    #[inline]
    pub fn stringify(&self) -> String {
        self.to_string()
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Value::Null | Value::Object(_) | Value::Lambda(_) | Value::SectionLambda(_) => Ok(()),
            Value::Bool(bool) => write!(f, "{bool}"),
            Value::Number(number) => write_number(f, number),
            Value::String(string) => write!(f, "{string}"),
            Value::List(list) => {
                write!(f, "[")?;
                let mut iter = list.iter();
                if let Some(item) = iter.next() {
                    write!(f, "{item}")?;
                    for item in iter {
                        write!(f, ", {item}")?;
                    }
                }
                write!(f, "]")
            }
            Value::Map(map) => {
                write!(f, "{{")?;
                let mut iter = map.iter();
                if let Some((key, value)) = iter.next() {
                    write!(f, "{key}: {value}")?;
                    for (key, value) in iter {
                        write!(f, ", {key}: {value}")?;
                    }
                }
                write!(f, "}}")
            }
        }
    }
}

/// Write a number in its shortest form.
///
/// Floats holding a whole number are written without a fraction.
fn write_number(f: &mut Formatter<'_>, number: &Number) -> FmtResult {
    if let Some(int) = number.as_i64() {
        return write!(f, "{int}");
    }
    if let Some(uint) = number.as_u64() {
        return write!(f, "{uint}");
    }
    match number.as_f64() {
        Some(float) if float.fract() == 0.0 && float.abs() < 1e15 => {
            write!(f, "{}", float as i64)
        }
        Some(float) => write!(f, "{float}"),
        None => write!(f, "{number}"),
    }
}

macro_rules! from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Number(Number::from(value))
                }
            }
        )*
    };
}

from_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl From<f64> for Value {
    /// Non-finite floats become [`Value::Null`].
    fn from(value: f64) -> Self {
        Number::from_f64(value).map(Value::Number).unwrap_or_default()
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::from(f64::from(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl<T> From<Vec<T>> for Value
where
    T: Into<Value>,
{
    fn from(value: Vec<T>) -> Self {
        Value::List(Arc::new(value.into_iter().map(Into::into).collect()))
    }
}

impl<T> From<HashMap<String, T>> for Value
where
    T: Into<Value>,
{
    fn from(value: HashMap<String, T>) -> Self {
        Value::Map(Arc::new(
            value.into_iter().map(|(k, v)| (k, v.into())).collect(),
        ))
    }
}

impl<T> From<BTreeMap<String, T>> for Value
where
    T: Into<Value>,
{
    fn from(value: BTreeMap<String, T>) -> Self {
        Value::Map(Arc::new(
            value.into_iter().map(|(k, v)| (k, v.into())).collect(),
        ))
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

impl<T> From<Box<T>> for Value
where
    T: Into<Value>,
{
    fn from(value: Box<T>) -> Self {
        (*value).into()
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(bool) => Value::Bool(bool),
            serde_json::Value::Number(number) => Value::Number(number),
            serde_json::Value::String(string) => Value::String(string),
            serde_json::Value::Array(array) => array.into(),
            serde_json::Value::Object(object) => Value::Map(Arc::new(
                object.into_iter().map(|(k, v)| (k, v.into())).collect(),
            )),
        }
    }
}
