use super::{Pointer, RED, RESET};
use crate::{
    log::Visual,
    region::{Position, Region},
};
use std::fmt::{Debug, Display, Formatter, Result};

/// Classifies an [`Error`].
///
/// Scan and parse errors abort compilation of a template. Render errors abort
/// rendering, except [`ErrorKind::ContextMiss`] and [`ErrorKind::MissingPartial`],
/// which are only raised when strict mode is enabled.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ErrorKind {
    /// A tag was opened but its closing delimiter was never found.
    UnterminatedTag,
    /// A tag that requires a key has nothing but whitespace inside.
    EmptyKey,
    /// A key contains characters or dots in positions that are not allowed.
    InvalidKey,
    /// The body of a set delimiters tag is not a pair of delimiters.
    InvalidDelimiters,
    /// The end of source was reached while a section was still open.
    UnclosedSection,
    /// A close tag does not match the open section, or there is no open section.
    UnexpectedClose,
    /// A key could not be resolved against the context stack.
    ContextMiss,
    /// A partial is not present in the registry.
    MissingPartial,
    /// Partials nested deeper than the configured maximum.
    MaxPartialDepth,
    /// Writing to the output buffer failed.
    Write,
    /// Host data could not be converted into a `Value`.
    Serialize,
    /// A template with the same name is already registered.
    DuplicateTemplate,
    /// No template with the requested name is registered.
    MissingTemplate,
}

impl ErrorKind {
    /// Return true if this kind is raised while scanning or parsing.
    pub fn is_compile(&self) -> bool {
        matches!(
            self,
            ErrorKind::UnterminatedTag
                | ErrorKind::EmptyKey
                | ErrorKind::InvalidKey
                | ErrorKind::InvalidDelimiters
                | ErrorKind::UnclosedSection
                | ErrorKind::UnexpectedClose
        )
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let reason = match self {
            ErrorKind::UnterminatedTag => "unterminated tag",
            ErrorKind::EmptyKey => "empty key",
            ErrorKind::InvalidKey => "invalid key",
            ErrorKind::InvalidDelimiters => "invalid delimiters",
            ErrorKind::UnclosedSection => "unclosed section",
            ErrorKind::UnexpectedClose => "unexpected close tag",
            ErrorKind::ContextMiss => "context miss",
            ErrorKind::MissingPartial => "missing partial",
            ErrorKind::MaxPartialDepth => "maximum partial depth exceeded",
            ErrorKind::Write => "write failure",
            ErrorKind::Serialize => "value is unserializable",
            ErrorKind::DuplicateTemplate => "duplicate template",
            ErrorKind::MissingTemplate => "missing template",
        };

        write!(f, "{reason}")
    }
}

/// Describes an error, and allows adding a contextual help text and visualization.
///
/// # Examples
///
/// Creating an [`Error`] that includes a [`Visual`] of type [`Pointer`]:
///
/// ```
/// use stache::{Error, ErrorKind, Region};
///
/// let error = Error::build(ErrorKind::UnexpectedClose)
///     .with_pointer("{{#one}}{{/two}}", Region::new(8..16))
///     .with_name("template.txt")
///     .with_help("expected `{{/one}}`");
///
/// assert_eq!(error.position().map(|p| p.column), Some(9));
/// ```
///
/// When printed with `println!("{:#}", error)` the [`Error`] produces this output:
///
/// ```text
/// error: unexpected close tag
///   --> template.txt:1:9
///    |
///  1 | {{#one}}{{/two}}
///    |         ^^^^^^^^
///    |
///   = help: expected `{{/one}}`
/// ```
pub struct Error {
    /// Classification of the [`Error`].
    kind: ErrorKind,
    /// Describes the cause of the [`Error`].
    reason: String,
    /// A visualization to help illustrate the [`Error`].
    visual: Option<Box<dyn Visual>>,
    /// Where in the source text the [`Error`] occurred.
    position: Option<Position>,
    /// Additional information to display with the [`Error`].
    help: Option<String>,
    /// The name of the Template that the [`Error`] comes from.
    name: Option<String>,
}

impl Error {
    /// Create a new [`Error`] of the given kind.
    ///
    /// The reason text defaults to a description of the kind. The additional
    /// fields may be populated using the various methods defined on `Error`.
    ///
    /// # Examples
    ///
    /// ```
    /// use stache::{Error, ErrorKind};
    ///
    /// let error = Error::build(ErrorKind::MissingPartial)
    ///     .with_help("partial `header` is not registered");
    ///
    /// assert_eq!(error.to_string(), "error: missing partial");
    /// ```
    pub fn build(kind: ErrorKind) -> Self {
        Error {
            kind,
            reason: kind.to_string(),
            visual: None,
            position: None,
            help: None,
            name: None,
        }
    }

    /// Set the reason text, which is a short summary of the [`Error`].
    pub fn with_reason<T>(mut self, text: T) -> Self
    where
        T: Into<String>,
    {
        self.reason = text.into();

        self
    }

    /// Set the name text, which is the name of the [`Template`][`crate::Template`]
    /// that the [`Error`] is related to.
    ///
    /// A name that was already set is kept, so the innermost template wins
    /// when an error travels out of nested partials.
    pub fn with_name<T>(mut self, text: T) -> Self
    where
        T: Into<String>,
    {
        if self.name.is_none() {
            self.name = Some(text.into());
        }

        self
    }

    /// Set the [`Visual`], which is a visualization that helps illustrate the
    /// cause of the error.
    pub fn with_visual(mut self, visual: impl Visual + 'static) -> Self {
        self.visual = Some(Box::new(visual));

        self
    }

    /// Set the visualization to a new [`Pointer`] with the given source text and
    /// [`Region`], and record the [`Position`] where the `Region` begins.
    ///
    /// This is a shortcut method for creating a `Pointer` yourself and then
    /// setting it to the `with_visual` method.
    pub fn with_pointer<T>(mut self, source: &str, region: T) -> Self
    where
        T: Into<Region>,
    {
        let region = region.into();
        self.position = Some(region.position(source));
        self.visual = Some(Box::new(Pointer::new(source, region)));

        self
    }

    /// Set the help text, which is contextual information to accompany the
    /// reason text.
    pub fn with_help<T>(mut self, text: T) -> Self
    where
        T: Into<String>,
    {
        self.help = Some(text.into());

        self
    }

    /// Return the [`ErrorKind`] of the error.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Return the reason text.
    #[inline]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Return the help text, if any.
    #[inline]
    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Return the one indexed line and column where the error occurred, if known.
    #[inline]
    pub fn position(&self) -> Option<Position> {
        self.position
    }

    /// Return the name of the `Template` that the error is related to.
    #[inline]
    pub fn get_name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        if !f.alternate() {
            writeln!(f, "{self:#}")?;
        }
        f.debug_struct("Error")
            .field("kind", &self.kind)
            .field("reason", &self.reason)
            .field("position", &self.position)
            .field("name", &self.name)
            .field("visual", &self.visual)
            .field("help", &self.help)
            .finish()?;

        Ok(())
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        if !f.alternate() {
            return write!(f, "error: {}", self.reason);
        }

        let header = format!("{RED}error{RESET}");
        write!(f, "{header}: {}", self.reason)?;

        match &self.visual {
            Some(visual) => visual.display(f, self.name.as_deref(), self.help.as_deref()),
            None => {
                if let Some(help) = &self.help {
                    write!(f, "\n  = help: {help}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for Error {}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.reason == other.reason
            && self.position == other.position
            && self.help == other.help
            && self.name == other.name
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, ErrorKind};
    use crate::region::Position;

    #[test]
    fn test_position_from_pointer() {
        let error =
            Error::build(ErrorKind::EmptyKey).with_pointer("a\nb {{ }}", 4..9);

        assert_eq!(error.position(), Some(Position::new(2, 3)));
    }

    #[test]
    fn test_name_keeps_innermost() {
        let error = Error::build(ErrorKind::ContextMiss)
            .with_name("partial")
            .with_name("main");

        assert_eq!(error.get_name(), Some("partial"));
    }

    #[test]
    fn test_plain_display() {
        let error = Error::build(ErrorKind::UnclosedSection).with_help("close it");

        assert_eq!(error.to_string(), "error: unclosed section");
    }

    #[test]
    fn test_compile_kinds() {
        assert!(ErrorKind::InvalidDelimiters.is_compile());
        assert!(!ErrorKind::MaxPartialDepth.is_compile());
    }
}
