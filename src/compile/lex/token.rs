use crate::{region::Region, syntax::Delimiters};
use std::fmt::Display;

/// Classifies a [`Token`] emitted by the Lexer.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Kind {
    /// Literal text that does not end a line.
    Text,
    /// Literal text ending in `\n` or `\r\n`, terminator included.
    TextEndOfLine,
    /// `{{name}}`
    Variable,
    /// `{{{name}}}` or `{{&name}}`
    UnescapedVariable,
    /// `{{#name}}`
    SectionOpen,
    /// `{{^name}}`
    SectionOpenInverted,
    /// `{{/name}}`
    SectionClose,
    /// `{{>name}}`
    Partial,
    /// `{{!text}}`
    Comment,
    /// `{{=left right=}}`
    SetDelimiters,
}

impl Kind {
    /// Return true if this is literal text.
    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self, Kind::Text | Kind::TextEndOfLine)
    }

    /// Return true if a tag of this kind can stand alone on a line, which
    /// removes the line's surrounding whitespace from the output.
    ///
    /// Variables never stand alone.
    #[inline]
    pub fn is_standalone(&self) -> bool {
        matches!(
            self,
            Kind::SectionOpen
                | Kind::SectionOpenInverted
                | Kind::SectionClose
                | Kind::Partial
                | Kind::Comment
                | Kind::SetDelimiters
        )
    }
}

impl Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Kind::Text => write!(f, "text"),
            Kind::TextEndOfLine => write!(f, "text (end of line)"),
            Kind::Variable => write!(f, "variable"),
            Kind::UnescapedVariable => write!(f, "unescaped variable"),
            Kind::SectionOpen => write!(f, "section open (#)"),
            Kind::SectionOpenInverted => write!(f, "inverted section open (^)"),
            Kind::SectionClose => write!(f, "section close (/)"),
            Kind::Partial => write!(f, "partial (>)"),
            Kind::Comment => write!(f, "comment (!)"),
            Kind::SetDelimiters => write!(f, "set delimiters (=)"),
        }
    }
}

/// A classified span of a template.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Token {
    pub kind: Kind,
    /// The literal text, or the trimmed body of a tag.
    pub text: String,
    /// The area consumed by the token.
    ///
    /// A standalone tag covers its whole line, including the surrounding
    /// whitespace and the line terminator.
    pub region: Region,
    /// The area of `text` within the source.
    pub key: Region,
    /// One indexed line where the token begins.
    pub line: usize,
    /// One indexed column where the token begins.
    pub column: usize,
    /// Whitespace preceding a standalone partial.
    pub indent: String,
    /// The delimiters active when a section was opened.
    pub delimiters: Option<Delimiters>,
}

impl Token {
    /// Return true if this token is `Text` or `TextEndOfLine` and contains only
    /// spaces and tabs, not counting the line terminator.
    pub(crate) fn is_blank(&self) -> bool {
        if !self.kind.is_text() {
            return false;
        }
        let text = match self.text.strip_suffix('\n') {
            Some(line) => line.strip_suffix('\r').unwrap_or(line),
            None => &self.text,
        };

        text.chars().all(|c| c == ' ' || c == '\t')
    }
}
