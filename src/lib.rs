//! Stache - Mustache Template Engine
//!
//! Templates are compiled into a [`Template`] and rendered against a stack of
//! [`Value`] contexts. Named templates stored in an [`Engine`] can be
//! included by other templates as partials.
//!
//! ```
//! use serde_json::json;
//! use stache::{Engine, Value};
//!
//! let mut engine = Engine::default();
//! engine.add_template("item", "- {{name}}\n").unwrap();
//! engine.add_template("list", "{{#items}}\n  {{>item}}\n{{/items}}").unwrap();
//!
//! let data: Value = json!({"items": [{"name": "one"}, {"name": "two"}]}).into();
//! let output = engine.render_named("list", &[data]).unwrap();
//! assert_eq!(output, "  - one\n  - two\n");
//! ```

#[cfg(feature = "tracing")]
macro_rules! debug {
    ($($tt:tt)*) => {
        tracing::debug!($($tt)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! debug {
    ($($tt:tt)*) => {};
}

#[cfg(feature = "tracing")]
macro_rules! trace {
    ($($tt:tt)*) => {
        tracing::trace!($($tt)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace {
    ($($tt:tt)*) => {};
}

mod compile;
mod config;
mod engine;
mod log;
mod region;
mod render;
mod store;
mod syntax;
mod value;

pub use compile::{
    compile, parse, scan, tree, Key, Kind, Lexer, Node, Parser, Scope, Template, Token,
};
pub use config::{Config, DEFAULT_MAX_PARTIAL_DEPTH};
pub use engine::Engine;
pub use log::{Error, ErrorKind, Pointer, Visual};
pub use region::{Position, Region};
pub use render::{render, Registry, Renderer};
pub use store::Store;
pub use syntax::{Delimiters, DEFAULT_LEFT, DEFAULT_RIGHT};
pub use value::{Lambda, Object, SectionLambda, Value};
