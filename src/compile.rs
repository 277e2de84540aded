mod lex;
mod parse;
mod template;

pub use crate::compile::{
    lex::{token, Lexer},
    parse::{scope::Scope, tree, Parser},
    template::Template,
};
pub use crate::compile::{
    lex::token::{Kind, Token},
    parse::tree::{Key, Node},
};

use crate::{log::Error, syntax::Delimiters};

/// Compile a [`Template`] from the given text.
///
/// Provides a shortcut to quickly compile a `Template` without creating
/// an `Engine`.
///
/// # Examples
///
/// ```
/// use stache::compile;
///
/// let template = compile("{{ name }}");
/// assert!(template.is_ok())
/// ```
pub fn compile(text: &str) -> Result<Template, Error> {
    Parser::new(text, Delimiters::default()).compile(None)
}

/// Compile a named [`Template`] from the given text, starting with the given
/// [`Delimiters`].
///
/// # Examples
///
/// ```
/// use stache::{parse, Delimiters};
///
/// let template = parse("page", "<% title %>", Delimiters::new("<%", "%>")).unwrap();
/// assert_eq!(template.name.as_deref(), Some("page"));
/// ```
pub fn parse(name: &str, text: &str, delimiters: Delimiters) -> Result<Template, Error> {
    Parser::new(text, delimiters).compile(Some(name))
}

/// Read the given text as a list of [`Token`] instances.
///
/// Standalone tags have already taken over the whitespace around them.
///
/// # Examples
///
/// ```
/// use stache::{scan, Delimiters, Kind};
///
/// let tokens = scan("Hi {{name}}", Delimiters::default()).unwrap();
/// assert_eq!(tokens[1].kind, Kind::Variable);
/// ```
pub fn scan(text: &str, delimiters: Delimiters) -> Result<Vec<Token>, Error> {
    let mut lexer = Lexer::new(text, delimiters);
    let mut tokens = vec![];
    while let Some(token) = lexer.next()? {
        tokens.push(token);
    }

    Ok(tokens)
}
