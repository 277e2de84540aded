use crate::{
    compile::{Parser, Template},
    config::Config,
    log::{Error, ErrorKind},
    render::{Registry, Renderer},
    syntax::Delimiters,
    value::Value,
};
use std::collections::HashMap;

/// Facilitates compiling and rendering templates, and provides storage
/// for named templates that can be included as partials.
///
/// Adding templates requires `&mut self` while rendering only requires
/// `&self`, so an `Engine` can be shared between threads once it is filled.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: Config,
    /// Templates that this Engine is aware of.
    templates: HashMap<String, Template>,
}

impl Engine {
    /// Create a new instance of [`Engine`] with the given [`Config`].
    #[inline]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            templates: HashMap::new(),
        }
    }

    /// Return the [`Config`] used when rendering.
    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Return a mutable reference to the [`Config`] used when rendering.
    #[inline]
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Compile a new [`Template`].
    ///
    /// The `Template` is not stored, use [`add_template`][`Engine::add_template`]
    /// to make it available as a partial.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when compilation fails, which most likely means the source
    /// contains invalid syntax.
    ///
    /// # Examples
    ///
    /// ```
    /// use stache::Engine;
    ///
    /// let engine = Engine::default();
    /// let template = engine.compile("hello, {{ name }}!");
    /// assert!(template.is_ok());
    /// ```
    #[inline]
    pub fn compile(&self, text: &str) -> Result<Template, Error> {
        Parser::new(text, Delimiters::default()).compile(None)
    }

    /// Compile a new [`Template`].
    ///
    /// # Panics
    ///
    /// Panics when compilation fails, which most likely means the source
    /// contains invalid syntax.
    ///
    /// # Examples
    ///
    /// ```
    /// use stache::Engine;
    ///
    /// let engine = Engine::default();
    /// let template = engine.compile_must("hello, {{ name }}!");
    /// ```
    #[inline]
    pub fn compile_must(&self, text: &str) -> Template {
        match self.compile(text) {
            Ok(template) => template,
            Err(error) => panic!("{error:#}"),
        }
    }

    /// Render a [`Template`] against the given contexts.
    ///
    /// The first context is searched first.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if rendering fails, see [`Renderer::render`].
    ///
    /// # Examples
    ///
    /// ```
    /// use stache::{Store, Engine};
    ///
    /// let engine = Engine::default();
    /// let template = engine.compile_must("hello, {{ name }}!");
    /// let result = engine.render(&template, &[Store::new().with_must("name", "taylor").into()]);
    ///
    /// assert_eq!(result.unwrap(), "hello, taylor!")
    /// ```
    #[inline]
    pub fn render(&self, template: &Template, contexts: &[Value]) -> Result<String, Error> {
        Renderer::new(self, &self.config, contexts).render(template)
    }

    /// Render the named [`Template`] against the given contexts.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if no `Template` has the given name, or if
    /// rendering fails.
    pub fn render_named(&self, name: &str, contexts: &[Value]) -> Result<String, Error> {
        self.render(self.get_template_or_err(name)?, contexts)
    }

    /// Render the named [`Template`] against the given contexts into the given
    /// buffer.
    ///
    /// When rendering fails, the output rendered before the failure remains in
    /// the buffer.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if no `Template` has the given name, or if
    /// rendering fails.
    pub fn render_named_into(
        &self,
        name: &str,
        contexts: &[Value],
        buffer: &mut String,
    ) -> Result<(), Error> {
        let template = self.get_template_or_err(name)?;

        Renderer::new(self, &self.config, contexts).render_into(template, buffer)
    }

    /// Compile and store a new [`Template`] with the given name.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when a `Template` with the given name already exists,
    /// or when compilation fails, which most likely means the source contains invalid
    /// syntax.
    ///
    /// # Examples
    ///
    /// ```
    /// use stache::Engine;
    ///
    /// let mut engine = Engine::default();
    /// let result = engine.add_template("template_name", "hello, {{ name }}!");
    /// assert!(result.is_ok());
    ///
    /// let second = engine.add_template("template_name", "hello again");
    /// assert!(second.is_err());
    /// ```
    pub fn add_template<S>(&mut self, name: S, text: &str) -> Result<(), Error>
    where
        S: Into<String>,
    {
        let name = name.into();
        if self.templates.contains_key(&name) {
            return Err(Error::build(ErrorKind::DuplicateTemplate)
                .with_name(name.as_str())
                .with_help(format!(
                    "template with name `{name}` already exists in engine, \
                    overwrite it with `.set_template`"
                )));
        }

        self.set_template(name, text)
    }

    /// Compile and store a new [`Template`] with the given name.
    ///
    /// If a `Template` with the given name already exists in the [`Engine`],
    /// it is overwritten.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when compilation fails, which most likely means the source
    /// contains invalid syntax.
    ///
    /// # Examples
    ///
    /// ```
    /// use stache::Engine;
    ///
    /// let mut engine = Engine::default();
    /// engine.set_template("template_name", "hello, {{ name }}!").unwrap();
    /// engine.set_template("template_name", "hello again").unwrap();
    /// ```
    pub fn set_template<S>(&mut self, name: S, text: &str) -> Result<(), Error>
    where
        S: Into<String>,
    {
        let name = name.into();
        let template = Parser::new(text, Delimiters::default()).compile(Some(&name))?;

        self.templates.insert(name, template);
        Ok(())
    }

    /// Return the named [`Template`].
    ///
    /// # Examples
    ///
    /// ```
    /// use stache::Engine;
    ///
    /// let mut engine = Engine::default();
    /// engine.add_template("template_name", "hello, {{ name }}!").unwrap();
    ///
    /// let template = engine.get_template("template_name");
    /// assert!(template.is_some());
    /// ```
    #[inline]
    pub fn get_template(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    /// Return the named [`Template`], or an [`Error`] if it does not exist.
    fn get_template_or_err(&self, name: &str) -> Result<&Template, Error> {
        self.get_template(name).ok_or_else(|| {
            Error::build(ErrorKind::MissingTemplate).with_help(format!(
                "template with name `{name}` not found in engine, \
                add it with `.add_template`"
            ))
        })
    }
}

impl Registry for Engine {
    #[inline]
    fn get_template(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::Engine;
    use crate::{config::Config, log::ErrorKind, value::Value, Store};
    use serde_json::json;
    use std::{
        collections::HashMap,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
    };

    #[test]
    fn test_duplicate_template() {
        let mut engine = Engine::default();
        engine.add_template("one", "a").unwrap();
        let error = engine.add_template("one", "b").unwrap_err();

        assert_eq!(error.kind(), ErrorKind::DuplicateTemplate);
        assert!(engine.set_template("one", "c").is_ok());
        assert_eq!(engine.render_named("one", &[]).unwrap(), "c");
    }

    #[test]
    fn test_missing_template() {
        let error = Engine::default().render_named("nope", &[]).unwrap_err();

        assert_eq!(error.kind(), ErrorKind::MissingTemplate);
    }

    #[test]
    fn test_compile_error_carries_name() {
        let error = Engine::default()
            .add_template("broken", "line\n{{#open}}")
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::UnclosedSection);
        assert_eq!(error.get_name(), Some("broken"));
        assert_eq!(error.position().map(|p| p.line), Some(2));
    }

    #[test]
    fn test_engine_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}

        assert_send_sync::<Engine>();
    }

    #[test]
    fn test_comments() {
        let cases = [
            ("12345{{! Comment Block! }}67890", "1234567890"),
            (
                "12345{{!\n  This is a\n  multi-line comment...\n}}67890\n",
                "1234567890\n",
            ),
            ("Begin.\n{{! Comment Block! }}\nEnd.\n", "Begin.\nEnd.\n"),
            (
                "Begin.\n  {{! Indented Comment Block! }}\nEnd.\n",
                "Begin.\nEnd.\n",
            ),
            ("|\r\n{{! Standalone Comment }}\r\n|", "|\r\n|"),
            ("  {{! I'm Still Standalone }}\n!", "!"),
            ("!\n  {{! I'm Still Standalone }}", "!\n"),
            (
                "Begin.\n{{!\nSomething's going on here...\n}}\nEnd.\n",
                "Begin.\nEnd.\n",
            ),
            ("  12 {{! 34 }}\n", "  12 \n"),
            ("12345 {{! Comment Block! }} 67890", "12345  67890"),
        ];

        for (template, expect) in cases {
            assert_eq!(helper_render(template, &[], json!({}).into()), expect);
        }
    }

    #[test]
    fn test_delimiters() {
        let data: Value = json!({"text": "Hey!", "section": true, "data": "I got interpolated.", "value": "yes"}).into();

        assert_eq!(helper_render("{{=<% %>=}}(<%text%>)", &[], data.clone()), "(Hey!)");
        assert_eq!(helper_render("({{=[ ]=}}[text])", &[], data.clone()), "(Hey!)");
        assert_eq!(
            helper_render(
                "[\n{{#section}}\n  {{data}}\n  |data|\n{{/section}}\n\n{{= | | =}}\n|#section|\n  {{data}}\n  |data|\n|/section|\n]\n",
                &[],
                data.clone()
            ),
            "[\n  I got interpolated.\n  |data|\n\n  {{data}}\n  I got interpolated.\n]\n"
        );
        assert_eq!(
            helper_render("Begin.\n{{=@ @=}}\nEnd.\n", &[], data.clone()),
            "Begin.\nEnd.\n"
        );
        assert_eq!(helper_render("  | {{=@ @=}} |\n", &[], data.clone()), "  |  |\n");
        assert_eq!(
            helper_render(
                "[ {{>include}} ]\n{{= | | =}}\n[ |>include| ]\n",
                &[("include", ".{{value}}.")],
                data.clone()
            ),
            "[ .yes. ]\n[ .yes. ]\n"
        );
        assert_eq!(
            helper_render(
                "[ {{>include}} ]\n[ .{{value}}.  .|value|. ]\n",
                &[("include", ".{{value}}. {{= | | =}} .|value|.")],
                data
            ),
            "[ .yes.  .yes. ]\n[ .yes.  .|value|. ]\n"
        );
    }

    #[test]
    fn test_interpolation() {
        let data: Value = json!({
            "subject": "world",
            "forbidden": "& \" < >",
            "mph": 85,
            "power": 1.21,
            "cannot": null,
            "person": {"name": "Joe"},
            "a": {"b": {"c": {"d": {"e": {"name": "Phil"}}}}},
            "b": {"c": {"d": {"e": {"name": "Wrong"}}}},
            "broken": {"b": {}},
            "c": {"name": "Jim"},
            "string": "---"
        })
        .into();
        let cases = [
            ("Hello, {{subject}}!", "Hello, world!"),
            (
                "These characters should be HTML escaped: {{forbidden}}",
                "These characters should be HTML escaped: &amp; &quot; &lt; &gt;",
            ),
            ("{{{forbidden}}} {{&forbidden}}", "& \" < > & \" < >"),
            ("\"{{mph}} miles an hour!\"", "\"85 miles an hour!\""),
            ("{{power}}", "1.21"),
            ("I ({{cannot}}) be seen!", "I () be seen!"),
            (
                "\"{{person.name}}\" == \"{{#person}}{{name}}{{/person}}\"",
                "\"Joe\" == \"Joe\"",
            ),
            ("{{a.b.c.d.e.name}}", "Phil"),
            ("\"{{broken.b.c.name}}\" == \"\"", "\"\" == \"\""),
            ("\"{{#a}}{{b.c.d.e.name}}{{/a}}\" == \"Phil\"", "\"Phil\" == \"Phil\""),
            ("{{#broken}}{{b.c}}{{/broken}}", ""),
            ("  {{string}}\n", "  ---\n"),
            ("|{{ subject }}|", "|world|"),
        ];

        for (template, expect) in cases {
            assert_eq!(helper_render(template, &[], data.clone()), expect);
        }

        assert_eq!(helper_render("Hello, {{.}}!", &[], "world".into()), "Hello, world!");
    }

    #[test]
    fn test_inverted() {
        let data: Value = json!({
            "boolean": false,
            "context": {"name": "Joe"},
            "list": [{"n": 1}, {"n": 2}, {"n": 3}],
            "empty": []
        })
        .into();
        let cases = [
            (
                "\"{{^boolean}}This should be rendered.{{/boolean}}\"",
                "\"This should be rendered.\"",
            ),
            ("\"{{^context}}Hi {{name}}.{{/context}}\"", "\"\""),
            ("\"{{^list}}{{n}}{{/list}}\"", "\"\""),
            ("\"{{^empty}}Yay lists!{{/empty}}\"", "\"Yay lists!\""),
            (
                "| A {{^boolean}}B {{^boolean}}C{{/boolean}} D{{/boolean}} E |",
                "| A B C D E |",
            ),
            (
                "| This Is\n{{^boolean}}\n|\n{{/boolean}}\n| A Line\n",
                "| This Is\n|\n| A Line\n",
            ),
            ("[{{^missing}}Found key 'missing'!{{/missing}}]", "[Found key 'missing'!]"),
        ];

        for (template, expect) in cases {
            assert_eq!(helper_render(template, &[], data.clone()), expect);
        }
    }

    #[test]
    fn test_partials() {
        let cases = [
            ("\"{{>text}}\"", ("text", "from partial"), json!({}), "\"from partial\""),
            ("\"{{>missing}}\"", ("text", ""), json!({}), "\"\""),
            ("\"{{>partial}}\"", ("partial", "*{{text}}*"), json!({"text": "content"}), "\"*content*\""),
            (
                "{{>node}}",
                ("node", "{{content}}<{{#nodes}}{{>node}}{{/nodes}}>"),
                json!({"content": "X", "nodes": [{"content": "Y", "nodes": []}]}),
                "X<Y<>>",
            ),
            ("| {{>partial}} |", ("partial", "\t|\t"), json!({}), "| \t|\t |"),
            ("  {{data}}  {{> partial}}\n", ("partial", ">\n>"), json!({"data": "|"}), "  |  >\n>\n"),
            ("|\r\n{{>partial}}\r\n|", ("partial", ">"), json!({}), "|\r\n>|"),
            ("  {{>partial}}\n>", ("partial", ">\n>"), json!({}), "  >\n  >>"),
            (
                "\\\n {{>partial}}\n/\n",
                ("partial", "|\n{{{content}}}\n|\n"),
                json!({"content": "<\n->"}),
                "\\\n |\n <\n->\n |\n/\n",
            ),
            ("|{{> partial }}|", ("partial", "[]"), json!({}), "|[]|"),
        ];

        for (template, partial, data, expect) in cases {
            assert_eq!(helper_render(template, &[partial], data.into()), expect);
        }
    }

    #[test]
    fn test_sections() {
        let data: Value = json!({
            "boolean": true,
            "context": {"name": "Joe"},
            "list": [{"item": 1}, {"item": 2}, {"item": 3}],
            "two": "second",
            "strings": ["a", "b", "c", "d", "e"],
            "decimals": [1.10, 2.20, 3.30, 4.40, 5.50],
            "lists": [[1, 2, 3], ["a", "b", "c"]],
            "a": {"b": {"c": true}}
        })
        .into();
        let cases = [
            (
                "\"{{#boolean}}This should be rendered.{{/boolean}}\"",
                "\"This should be rendered.\"",
            ),
            ("\"{{#context}}Hi {{name}}.{{/context}}\"", "\"Hi Joe.\""),
            ("\"{{#list}}{{item}}{{/list}}\"", "\"123\""),
            (
                "{{#boolean}}\n* first\n{{/boolean}}\n* {{two}}\n{{#boolean}}\n* third\n{{/boolean}}\n",
                "* first\n* second\n* third\n",
            ),
            ("\"{{#strings}}({{.}}){{/strings}}\"", "\"(a)(b)(c)(d)(e)\""),
            ("\"{{#decimals}}({{.}}){{/decimals}}\"", "\"(1.1)(2.2)(3.3)(4.4)(5.5)\""),
            ("\"{{#lists}}({{#.}}{{.}}{{/.}}){{/lists}}\"", "\"(123)(abc)\""),
            ("\"{{#a.b.c}}Here{{/a.b.c}}\" == \"Here\"", "\"Here\" == \"Here\""),
            (
                " {{#boolean}}YES{{/boolean}}\n {{#boolean}}GOOD{{/boolean}}\n",
                " YES\n GOOD\n",
            ),
            (
                "| This Is\n  {{#boolean}}\n|\n  {{/boolean}}\n| A Line\n",
                "| This Is\n|\n| A Line\n",
            ),
            ("|\r\n{{#boolean}}\r\n{{/boolean}}\r\n|", "|\r\n|"),
            ("  {{#boolean}}\n#{{/boolean}}\n/", "#\n/"),
            ("#{{#boolean}}\n/\n  {{/boolean}}", "#\n/\n"),
            ("[{{#missing}}Found key 'missing'!{{/missing}}]", "[]"),
        ];

        for (template, expect) in cases {
            assert_eq!(helper_render(template, &[], data.clone()), expect);
        }
    }

    #[test]
    fn test_lambdas() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let data = Store::new()
            .with_must("planet", "world")
            .with_value("plain", Value::lambda(|| "world".to_string()))
            .with_value("expand", Value::lambda(|| "{{planet}}".to_string()))
            .with_value("alternate", Value::lambda(|| "|planet| => {{planet}}".to_string()))
            .with_value(
                "count",
                Value::lambda(move || (counter.fetch_add(1, Ordering::SeqCst) + 1).to_string()),
            )
            .with_value("angle", Value::lambda(|| ">".to_string()))
            .with_value(
                "check",
                Value::section_lambda(|text| if text == "{{x}}" { "yes" } else { "no" }.to_string()),
            )
            .with_value("wrap", Value::section_lambda(|text| format!("{text}{{{{planet}}}}{text}")))
            .with_value("underscore", Value::section_lambda(|text| format!("__{text}__")))
            .with_value("never", Value::section_lambda(|_| String::new()));
        let data: Value = data.into();

        let cases = [
            ("Hello, {{plain}}!", "Hello, world!"),
            ("Hello, {{expand}}!", "Hello, world!"),
            ("{{= | | =}}\nHello, (|&alternate|)!", "Hello, (|planet| => world)!"),
            ("{{count}} == {{{count}}} == {{count}}", "1 == 2 == 3"),
            ("<{{angle}}{{{angle}}}", "<&gt;>"),
            ("<{{#check}}{{x}}{{/check}}>", "<yes>"),
            ("<{{#wrap}}-{{/wrap}}>", "<-world->"),
            (
                "{{#underscore}}FILE{{/underscore}} != {{#underscore}}LINE{{/underscore}}",
                "__FILE__ != __LINE__",
            ),
            ("<{{^never}}{{static}}{{/never}}>", "<>"),
        ];

        for (template, expect) in cases {
            assert_eq!(helper_render(template, &[], data.clone()), expect);
        }
    }

    #[test]
    fn test_depth_guard() {
        let mut engine = Engine::new(Config::new().with_max_partial_depth(50));
        engine.add_template("loop", "{{>loop}}").unwrap();
        let error = engine.render_named("loop", &[]).unwrap_err();

        assert_eq!(error.kind(), ErrorKind::MaxPartialDepth);
        assert_eq!(error.get_name(), Some("loop"));
    }

    #[test]
    fn test_default_depth_guard_in_section() {
        let mut engine = Engine::default();
        engine.add_template("loop", "{{#a}}{{>loop}}{{/a}}").unwrap();
        let error = engine
            .render_named("loop", &[json!({"a": true}).into()])
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::MaxPartialDepth);
        assert_eq!(error.get_name(), Some("loop"));
    }

    #[test]
    fn test_default_depth_allows_deep_nesting() {
        let mut engine = Engine::default();
        engine.add_template("node", "{{#child}}<{{>node}}>{{/child}}").unwrap();

        let mut data = json!({"child": false});
        for _ in 0..100 {
            data = json!({"child": data});
        }
        let output = engine.render_named("node", &[data.into()]).unwrap();

        assert_eq!(output, format!("{}{}", "<".repeat(100), ">".repeat(100)));
    }

    #[test]
    fn test_strict_mode() {
        let mut engine = Engine::new(Config::new().with_strict(true));
        engine.add_template("main", "Hi {{name}}, {{missing}}!").unwrap();
        engine.add_template("outer", "[{{>absent}}]").unwrap();

        let mut buffer = String::new();
        let error = engine
            .render_named_into("main", &[json!({"name": "Ada"}).into()], &mut buffer)
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::ContextMiss);
        assert_eq!(error.get_name(), Some("main"));
        assert_eq!(buffer, "Hi Ada, ");

        let error = engine.render_named("outer", &[]).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::MissingPartial);

        engine.config_mut().set_strict(false);
        assert_eq!(engine.render_named("outer", &[]).unwrap(), "[]");
    }

    #[test]
    fn test_empty_map_is_truthy() {
        assert_eq!(helper_render("{{#m}}yes{{/m}}", &[], json!({"m": {}}).into()), "yes");
    }

    #[test]
    fn test_object_context() {
        #[derive(Debug)]
        struct Account {
            owner: String,
            balance: i64,
        }

        impl crate::Object for Account {
            fn field(&self, name: &str) -> Option<Value> {
                match name {
                    "owner" => Some(self.owner.as_str().into()),
                    "balance" => Some(self.balance.into()),
                    _ => None,
                }
            }

            fn method(&self, name: &str) -> Option<Value> {
                match name {
                    "overdrawn" => Some((self.balance < 0).into()),
                    _ => None,
                }
            }
        }

        let mut data = HashMap::new();
        data.insert(
            "account".to_string(),
            Value::object(Account {
                owner: "Ada".into(),
                balance: -5,
            }),
        );

        assert_eq!(
            helper_render(
                "{{#account}}{{owner}}: {{balance}}{{#overdrawn}} (overdrawn){{/overdrawn}}{{/account}}",
                &[],
                data.into()
            ),
            "Ada: -5 (overdrawn)"
        );
    }

    /// Register the partials in a new Engine, then render the template against
    /// the data.
    fn helper_render(template: &str, partials: &[(&str, &str)], data: Value) -> String {
        let mut engine = Engine::default();
        for (name, text) in partials {
            engine.add_template(*name, text).unwrap();
        }
        let template = engine.compile(template).unwrap();

        engine.render(&template, &[data]).unwrap()
    }
}
