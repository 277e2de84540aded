mod pipe;
mod stack;

pub use pipe::Pipe;
pub use stack::Stack;

use crate::{
    compile::{
        tree::{Key, Node, Partial, Section, Variable},
        Parser, Scope, Template,
    },
    config::Config,
    log::{error_context_miss, error_missing_partial, error_partial_depth, error_write, Error},
    syntax::Delimiters,
    value::Value,
};
use std::{collections::HashMap, fmt::Write};

/// A source of named templates, used to resolve partials.
pub trait Registry {
    /// Return the [`Template`] with the given name, if any.
    fn get_template(&self, name: &str) -> Option<&Template>;
}

impl Registry for HashMap<String, Template> {
    #[inline]
    fn get_template(&self, name: &str) -> Option<&Template> {
        self.get(name)
    }
}

/// Render a [`Template`].
///
/// Provides a shortcut to quickly render a `Template` with the default
/// [`Config`], resolving partials from the given [`Registry`].
///
/// The first context is searched first.
///
/// # Examples
///
/// ```
/// use stache::{compile, render, Store, Template};
/// use std::collections::HashMap;
///
/// let template = compile("hello, {{ name }}!");
/// assert!(template.is_ok());
///
/// let partials: HashMap<String, Template> = HashMap::new();
/// let store = Store::new().with_must("name", "taylor");
/// let output = render(&template.unwrap(), &partials, &[store.into()]);
/// assert_eq!(output.unwrap(), "hello, taylor!");
/// ```
pub fn render(
    template: &Template,
    registry: &dyn Registry,
    contexts: &[Value],
) -> Result<String, Error> {
    Renderer::new(registry, &Config::default(), contexts).render(template)
}

pub struct Renderer<'render> {
    /// Registry that partials are resolved from.
    registry: &'render dyn Registry,
    config: &'render Config,
    /// The context stack that keys are resolved against.
    stack: Stack,
    /// Number of partials currently being rendered.
    depth: usize,
}

impl<'render> Renderer<'render> {
    /// Create a new Renderer with the given contexts.
    ///
    /// The first context is searched first.
    pub fn new(
        registry: &'render dyn Registry,
        config: &'render Config,
        contexts: &[Value],
    ) -> Self {
        Renderer {
            registry,
            config,
            stack: Stack::new(contexts),
            depth: 0,
        }
    }

    /// Render the [`Template`] and return the output.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if a partial is nested too deeply, if a lambda
    /// returns text that cannot be compiled, or in strict mode, if a key or
    /// partial cannot be found.
    pub fn render(&mut self, template: &Template) -> Result<String, Error> {
        let mut buffer = String::with_capacity(template.source.len());
        self.render_into(template, &mut buffer)?;

        Ok(buffer)
    }

    /// Render the [`Template`] into the given buffer.
    ///
    /// When an [`Error`] is returned, the output rendered before it remains in
    /// the buffer.
    ///
    /// # Errors
    ///
    /// See [`render`][`Renderer::render`].
    pub fn render_into(&mut self, template: &Template, buffer: &mut String) -> Result<(), Error> {
        let mut pipe = Pipe::new(buffer);

        self.render_template(template, &mut pipe)
    }

    /// Render the [`Template`], attaching its name to any [`Error`].
    fn render_template(&mut self, template: &Template, pipe: &mut Pipe) -> Result<(), Error> {
        self.render_scope(template, &template.scope, pipe)
            .map_err(|error| match &template.name {
                Some(name) => error.with_name(name),
                None => error,
            })
    }

    /// Render the given [`Scope`], which belongs to the given [`Template`].
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if any of the [`Node`] instances in the `Scope`
    /// cannot be rendered.
    fn render_scope(
        &mut self,
        template: &Template,
        scope: &Scope,
        pipe: &mut Pipe,
    ) -> Result<(), Error> {
        for node in scope.data.iter() {
            match node {
                Node::Text(text) => pipe
                    .write_text(text.region.literal(&template.source), text.end_of_line)
                    .map_err(|_| error_write())?,
                Node::Variable(variable) => self.render_variable(template, variable, pipe)?,
                Node::Section(section) => self.render_section(template, section, pipe)?,
                Node::Partial(partial) => self.render_partial(template, partial, pipe)?,
            }
        }

        Ok(())
    }

    /// Render a variable, compiling and rendering the result first if the
    /// value is a lambda.
    fn render_variable(
        &mut self,
        template: &Template,
        variable: &Variable,
        pipe: &mut Pipe,
    ) -> Result<(), Error> {
        let value = self.resolve(template, &variable.key)?;
        let text = match value.as_callable_0() {
            Some(lambda) => {
                self.expand_lambda(&variable.key, &lambda.call(), &Delimiters::default())?
            }
            None => value.stringify(),
        };

        if variable.unescaped {
            pipe.write_str(&text)
        } else {
            pipe.write_escaped(&text)
        }
        .map_err(|_| error_write())
    }

    /// Render a section.
    ///
    /// An inverted section renders its scope once when the value is falsey.
    /// Otherwise a list renders the scope once per element, a section lambda
    /// replaces the scope with its own output, and any other truthy value
    /// renders the scope once with the value pushed onto the stack.
    fn render_section(
        &mut self,
        template: &Template,
        section: &Section,
        pipe: &mut Pipe,
    ) -> Result<(), Error> {
        let value = self.resolve(template, &section.key)?;

        if section.inverted {
            let truthy = match value.as_callable_0() {
                Some(lambda) => !self
                    .expand_lambda(&section.key, &lambda.call(), &Delimiters::default())?
                    .is_empty(),
                None => value.is_truthy(),
            };
            if !truthy {
                self.render_scope(template, &section.scope, pipe)?;
            }

            return Ok(());
        }

        match value {
            Value::SectionLambda(lambda) => {
                let text = lambda.call(section.inner.literal(&template.source));
                let expansion = self.compile_lambda(&section.key, &text, &section.delimiters)?;

                self.render_template(&expansion, pipe)
            }
            Value::Lambda(lambda) => {
                let text =
                    self.expand_lambda(&section.key, &lambda.call(), &Delimiters::default())?;
                if text.is_empty() {
                    return Ok(());
                }

                self.render_frame(template, &section.scope, Value::String(text), pipe)
            }
            Value::List(list) => {
                for item in list.iter() {
                    self.render_frame(template, &section.scope, item.clone(), pipe)?;
                }

                Ok(())
            }
            value if value.is_truthy() => {
                self.render_frame(template, &section.scope, value, pipe)
            }
            _ => Ok(()),
        }
    }

    /// Render the [`Scope`] with the value pushed onto the stack.
    ///
    /// The value is popped even if rendering fails.
    fn render_frame(
        &mut self,
        template: &Template,
        scope: &Scope,
        value: Value,
        pipe: &mut Pipe,
    ) -> Result<(), Error> {
        self.stack.push(value);
        let result = self.render_scope(template, scope, pipe);
        self.stack.pop();

        result
    }

    /// Render a partial, indenting each of its lines by the indent of the tag.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if rendering the partial would exceed the maximum
    /// depth, or in strict mode, if the partial is not registered.
    fn render_partial(
        &mut self,
        template: &Template,
        partial: &Partial,
        pipe: &mut Pipe,
    ) -> Result<(), Error> {
        let registry = self.registry;
        let Some(target) = registry.get_template(&partial.name) else {
            if self.config.strict() {
                return Err(error_missing_partial(
                    &template.source,
                    &partial.name,
                    partial.region,
                ));
            }
            debug!(name = %partial.name, "missing partial rendered as empty");

            return Ok(());
        };

        let max = self.config.max_partial_depth();
        if self.depth >= max {
            return Err(error_partial_depth(
                &template.source,
                &partial.name,
                partial.region,
                max,
            ));
        }
        trace!(name = %partial.name, depth = self.depth + 1, "entering partial");

        let previous = pipe.increase_indent(&partial.indent);
        self.depth += 1;
        let result = self.render_template(target, pipe);
        self.depth -= 1;
        pipe.restore_indent(previous);

        result
    }

    /// Resolve the [`Key`] against the stack.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] in strict mode when the key cannot be resolved.
    fn resolve(&self, template: &Template, key: &Key) -> Result<Value, Error> {
        match self.stack.resolve(key) {
            Some(value) => Ok(value),
            None if self.config.strict() => Err(error_context_miss(&template.source, key)),
            None => {
                debug!(key = %key, "context miss rendered as empty");

                Ok(Value::Null)
            }
        }
    }

    /// Compile text returned by the lambda found at the given [`Key`].
    ///
    /// The result is named after the key, so errors point into the lambda's
    /// output rather than the template that called it.
    fn compile_lambda(
        &self,
        key: &Key,
        text: &str,
        delimiters: &Delimiters,
    ) -> Result<Template, Error> {
        trace!(key = %key, text, delimiters = %delimiters, "compiling lambda output");

        Parser::new(text, delimiters.clone()).compile(Some(&format!("lambda `{key}`")))
    }

    /// Compile and render text returned by a lambda, and return the output.
    fn expand_lambda(
        &mut self,
        key: &Key,
        text: &str,
        delimiters: &Delimiters,
    ) -> Result<String, Error> {
        let expansion = self.compile_lambda(key, text, delimiters)?;
        let mut buffer = String::with_capacity(expansion.source.len());
        let mut pipe = Pipe::new(&mut buffer);
        self.render_template(&expansion, &mut pipe)?;

        Ok(buffer)
    }
}
