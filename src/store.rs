use crate::{log::Error, value::Value};
use serde::Serialize;
use std::{collections::BTreeMap, sync::Arc};

/// Provides storage for data that templates can be rendered against.
///
/// A Store becomes a single map shaped context frame through
/// `Value::from(store)`.
#[derive(Debug, Clone, Default)]
pub struct Store {
    data: BTreeMap<String, Value>,
}

impl Store {
    /// Create a new Store.
    #[inline]
    pub fn new() -> Self {
        Self {
            data: BTreeMap::new(),
        }
    }

    /// Insert the value into the Store.
    ///
    /// # Errors
    ///
    /// Returns an error if the serialization fails.
    pub fn insert<S, T>(&mut self, key: S, value: T) -> Result<(), Error>
    where
        S: Into<String>,
        T: Serialize,
    {
        let value = Value::serialize(&value)?;
        self.data.insert(key.into(), value);

        Ok(())
    }

    /// Insert the value into the Store.
    ///
    /// # Panics
    ///
    /// Will panic if the serialization fails.
    #[inline]
    pub fn insert_must<S, T>(&mut self, key: S, value: T)
    where
        S: Into<String>,
        T: Serialize,
    {
        if let Err(error) = self.insert(key, value) {
            panic!("{error:#}");
        }
    }

    /// Insert a [`Value`] into the Store without serializing it.
    ///
    /// Lambdas and objects can only be inserted this way.
    #[inline]
    pub fn insert_value<S, T>(&mut self, key: S, value: T)
    where
        S: Into<String>,
        T: Into<Value>,
    {
        self.data.insert(key.into(), value.into());
    }

    /// Insert the value into the Store.
    ///
    /// Returns the Store, so additional methods may be chained.
    ///
    /// # Errors
    ///
    /// Returns an error if the serialization fails.
    pub fn with<S, T>(mut self, key: S, value: T) -> Result<Self, Error>
    where
        S: Into<String>,
        T: Serialize,
    {
        self.insert(key, value)?;
        Ok(self)
    }

    /// Insert the value into the Store.
    ///
    /// Returns the Store, so additional methods may be chained.
    ///
    /// # Panics
    ///
    /// Will panic if the serialization fails.
    #[inline]
    pub fn with_must<S, T>(mut self, key: S, value: T) -> Self
    where
        S: Into<String>,
        T: Serialize,
    {
        self.insert_must(key, value);
        self
    }

    /// Insert a [`Value`] into the Store without serializing it.
    ///
    /// Returns the Store, so additional methods may be chained.
    #[inline]
    pub fn with_value<S, T>(mut self, key: S, value: T) -> Self
    where
        S: Into<String>,
        T: Into<Value>,
    {
        self.insert_value(key, value);
        self
    }

    /// Get the value of the given key, if any.
    #[inline]
    pub fn get(&self, index: &str) -> Option<&Value> {
        self.data.get(index)
    }
}

impl From<Store> for Value {
    fn from(store: Store) -> Self {
        Value::Map(Arc::new(store.data))
    }
}
