//! Stache parser.
//!
//! Utilizes a Lexer to receive instances of Token, which it uses to construct
//! a new Template containing the Abstract Syntax Tree.
//!
//! Sections are parsed by recursion, so the open tag of every section is
//! matched against its close tag before the section is added to its parent.
pub mod scope;
pub mod tree;

use crate::{
    compile::{
        lex::{
            token::{Kind, Token},
            Lexer,
        },
        parse::tree::{Key, Node, Partial, Section, Text, Variable},
        Scope, Template,
    },
    log::{Error, ErrorKind},
    region::Region,
    syntax::Delimiters,
};

pub struct Parser<'source> {
    /// Lexer used to pull from source as tokens instead of raw text.
    lexer: Lexer<'source>,
}

impl<'source> Parser<'source> {
    /// Create a new Parser from the given source, starting with the given
    /// [`Delimiters`].
    #[inline]
    pub fn new(source: &'source str, delimiters: Delimiters) -> Self {
        Self {
            lexer: Lexer::new(source, delimiters),
        }
    }

    /// Compile the template.
    ///
    /// Returns a new Template, which can be rendered against a context stack.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] describing the first problem found in the source.
    /// When a name is given, the error carries it.
    pub fn compile(mut self, name: Option<&str>) -> Result<Template, Error> {
        let scope = match self.parse_scope(None) {
            Ok((scope, _)) => scope,
            Err(error) => {
                return Err(match name {
                    Some(name) => error.with_name(name),
                    None => error,
                })
            }
        };

        debug!(
            name = name.unwrap_or("<anonymous>"),
            nodes = scope.data.len(),
            "compiled template"
        );

        Ok(Template {
            name: name.map(String::from),
            scope,
            source: self.lexer.source.to_string(),
        })
    }

    /// Parse nodes until the close tag of the given parent section, or the end
    /// of source when there is no parent.
    ///
    /// Returns the [`Scope`] and the close tag that ended it.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if a close tag does not match the parent, or if the
    /// source ends while the parent is still open.
    fn parse_scope(&mut self, parent: Option<&Token>) -> Result<(Scope, Option<Token>), Error> {
        let mut scope = Scope::new();

        while let Some(token) = self.lexer.next()? {
            let node = match token.kind {
                Kind::Text | Kind::TextEndOfLine => Node::Text(Text {
                    region: token.region,
                    end_of_line: token.kind == Kind::TextEndOfLine,
                }),
                Kind::Variable | Kind::UnescapedVariable => Node::Variable(Variable {
                    key: Key::new(&token.text, token.key),
                    unescaped: token.kind == Kind::UnescapedVariable,
                }),
                Kind::SectionOpen | Kind::SectionOpenInverted => {
                    Node::Section(self.parse_section(token)?)
                }
                Kind::Partial => Node::Partial(Partial {
                    name: token.text,
                    indent: token.indent,
                    region: token.key,
                }),
                Kind::SectionClose => {
                    return match parent {
                        Some(open) if open.text == token.text => Ok((scope, Some(token))),
                        Some(open) => Err(Error::build(ErrorKind::UnexpectedClose)
                            .with_pointer(self.lexer.source, token.key)
                            .with_help(format!(
                                "expected section `{}` to be closed first, it was opened at {}:{}",
                                open.text, open.line, open.column
                            ))),
                        None => Err(Error::build(ErrorKind::UnexpectedClose)
                            .with_pointer(self.lexer.source, token.key)
                            .with_help(format!(
                                "section `{}` is not open, remove this tag or open it before",
                                token.text
                            ))),
                    };
                }
                Kind::Comment | Kind::SetDelimiters => continue,
            };

            scope.data.push(node);
        }

        match parent {
            Some(open) => Err(Error::build(ErrorKind::UnclosedSection)
                .with_pointer(self.lexer.source, open.key)
                .with_help(format!(
                    "did you close the `{}` section opened at {}:{}?",
                    open.text, open.line, open.column
                ))),
            None => Ok((scope, None)),
        }
    }

    /// Parse the body of a section opened by the given token.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if the body is invalid or never closed.
    fn parse_section(&mut self, open: Token) -> Result<Section, Error> {
        let (scope, close) = self.parse_scope(Some(&open))?;
        let inner_end = close.map_or(self.lexer.source.len(), |close| close.region.begin);

        Ok(Section {
            key: Key::new(&open.text, open.key),
            inverted: open.kind == Kind::SectionOpenInverted,
            delimiters: open.delimiters.unwrap_or_default(),
            inner: Region::new(open.region.end..inner_end),
            scope,
        })
    }
}
