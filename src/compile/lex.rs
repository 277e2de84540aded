pub mod token;

use crate::{
    compile::lex::token::{Kind, Token},
    log::{Error, ErrorKind},
    region::Region,
    syntax::{Delimiters, Finder, Marker},
};
use std::collections::VecDeque;

/// Provides methods to read a source string as [`Token`] instances.
///
/// The source is read one line at a time. Once a full line is buffered, the
/// Lexer decides whether it holds a standalone tag, and if so, the whitespace
/// around that tag is dropped from the stream.
pub struct Lexer<'source> {
    /// Reference to the source text.
    pub source: &'source str,
    /// Position within source.
    pub cursor: usize,
    /// The active delimiters.
    delimiters: Delimiters,
    /// Compiled [`Finder`] that searches for the active left delimiter or a
    /// line feed.
    ///
    /// Rebuilt whenever a set delimiters tag is read.
    finder: Finder,
    /// Tokens of the most recently read line that have not been returned.
    buffer: VecDeque<Token>,
    /// Offset that `line` and `column` describe.
    located: usize,
    /// One indexed line at `located`.
    line: usize,
    /// One indexed column at `located`, in characters.
    column: usize,
}

impl<'source> Lexer<'source> {
    /// Create a new [`Lexer`] from the given source, starting with the given
    /// [`Delimiters`].
    #[inline]
    pub fn new(source: &'source str, delimiters: Delimiters) -> Self {
        Self {
            source,
            cursor: 0,
            finder: delimiters.to_finder(),
            delimiters,
            buffer: VecDeque::new(),
            located: 0,
            line: 1,
            column: 1,
        }
    }

    /// Return the next [`Token`].
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when a tag is unterminated, has an empty or invalid
    /// key, or is a malformed set delimiters tag.
    pub fn next(&mut self) -> Result<Option<Token>, Error> {
        loop {
            // Always prefer taking from the buffer when possible.
            if let Some(next) = self.buffer.pop_front() {
                return Ok(Some(next));
            }
            if self.cursor >= self.source.len() {
                return Ok(None);
            }

            self.lex_line()?;
        }
    }

    /// Read every [`Token`] up to and including the next line feed that is
    /// not inside of a tag, and store them in the buffer.
    fn lex_line(&mut self) -> Result<(), Error> {
        let line_begin = self.cursor;
        let mut tokens = vec![];

        loop {
            let from = self.cursor;
            match self.finder.next(self.source, from) {
                Some((marker, begin, end)) => match marker {
                    Marker::Newline => {
                        tokens.push(self.lex_text(from..end, Kind::TextEndOfLine));
                        self.cursor = end;

                        break;
                    }
                    Marker::Open => {
                        if begin > from {
                            tokens.push(self.lex_text(from..begin, Kind::Text));
                        }
                        tokens.push(self.lex_tag(begin, end)?);
                    }
                },
                None => {
                    let end = self.source.len();
                    if end > from {
                        tokens.push(self.lex_text(from..end, Kind::Text));
                    }
                    self.cursor = end;

                    break;
                }
            }
        }

        let line = Region::new(line_begin..self.cursor);
        self.buffer.extend(elide_standalone(tokens, line));

        Ok(())
    }

    /// Return a text [`Token`] of the given kind covering the given range.
    fn lex_text<T>(&mut self, region: T, kind: Kind) -> Token
    where
        T: Into<Region>,
    {
        let region = region.into();
        let (line, column) = self.locate(region.begin);

        Token {
            kind,
            text: region.literal(self.source).to_string(),
            region,
            key: region,
            line,
            column,
            indent: String::new(),
            delimiters: None,
        }
    }

    /// Return a tag [`Token`], where `begin..inner` is the left delimiter.
    ///
    /// The character after the left delimiter decides the kind of tag, and
    /// moves the cursor past the closing delimiter.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when the closing delimiter is missing, or when the
    /// body of the tag is not valid for its kind.
    fn lex_tag(&mut self, begin: usize, inner: usize) -> Result<Token, Error> {
        let source = self.source;
        let right = self.delimiters.right();
        let (kind, body_begin, closer) = match source.as_bytes().get(inner) {
            Some(b'{') => (Kind::UnescapedVariable, inner + 1, ["}", right].concat()),
            Some(b'=') => (Kind::SetDelimiters, inner + 1, ["=", right].concat()),
            Some(b'&') => (Kind::UnescapedVariable, inner + 1, right.to_string()),
            Some(b'#') => (Kind::SectionOpen, inner + 1, right.to_string()),
            Some(b'^') => (Kind::SectionOpenInverted, inner + 1, right.to_string()),
            Some(b'/') => (Kind::SectionClose, inner + 1, right.to_string()),
            Some(b'>') => (Kind::Partial, inner + 1, right.to_string()),
            Some(b'!') => (Kind::Comment, inner + 1, right.to_string()),
            _ => (Kind::Variable, inner, right.to_string()),
        };

        let body_end = match source.get(body_begin..).and_then(|s| s.find(&closer)) {
            Some(offset) => body_begin + offset,
            None => {
                return Err(Error::build(ErrorKind::UnterminatedTag)
                    .with_pointer(source, begin..inner)
                    .with_help(format!(
                        "this {kind} tag is never closed, expected `{closer}`"
                    )));
            }
        };
        let end = body_end + closer.len();

        let body = &source[body_begin..body_end];
        let text = body.trim();
        let key_begin = body_begin + (body.len() - body.trim_start().len());
        let key = if text.is_empty() {
            Region::new(begin..end)
        } else {
            Region::new(key_begin..key_begin + text.len())
        };

        match kind {
            Kind::Comment => {}
            Kind::SetDelimiters => {
                self.delimiters = parse_delimiters(source, text, key)?;
                self.finder = self.delimiters.to_finder();
            }
            Kind::Partial => validate_partial(source, text, key)?,
            _ => validate_key(source, text, key)?,
        }

        let delimiters = match kind {
            Kind::SectionOpen | Kind::SectionOpenInverted => Some(self.delimiters.clone()),
            _ => None,
        };
        let (line, column) = self.locate(begin);
        self.cursor = end;

        Ok(Token {
            kind,
            text: text.to_string(),
            region: Region::new(begin..end),
            key,
            line,
            column,
            indent: String::new(),
            delimiters,
        })
    }

    /// Return the one indexed line and column of the given offset.
    ///
    /// Offsets must be given in increasing order, so that only the text
    /// between the previous offset and this one is counted.
    fn locate(&mut self, offset: usize) -> (usize, usize) {
        let skipped = self.source.get(self.located..offset).unwrap_or_default();
        match memchr::memrchr(b'\n', skipped.as_bytes()) {
            Some(last) => {
                self.line += memchr::memchr_iter(b'\n', skipped.as_bytes()).count();
                self.column = skipped[last + 1..].chars().count() + 1;
            }
            None => self.column += skipped.chars().count(),
        }
        self.located = offset;

        (self.line, self.column)
    }
}

/// Return the tokens of a line, with the whitespace around a standalone tag
/// removed.
///
/// A line is standalone when it holds exactly one tag, that tag is allowed to
/// stand alone, and every other token is blank. The remaining tag takes over
/// the [`Region`] of the whole line, and a partial keeps the whitespace before
/// it as its indent.
fn elide_standalone(mut tokens: Vec<Token>, line: Region) -> Vec<Token> {
    let mut tags = tokens.iter().enumerate().filter(|(_, t)| !t.kind.is_text());
    let index = match (tags.next(), tags.next()) {
        (Some((index, tag)), None) if tag.kind.is_standalone() => index,
        _ => return tokens,
    };
    if !tokens.iter().filter(|t| t.kind.is_text()).all(Token::is_blank) {
        return tokens;
    }

    let indent = match tokens.first() {
        Some(first) if first.kind == Kind::Text => first.text.clone(),
        _ => String::new(),
    };
    let mut tag = tokens.swap_remove(index);
    if tag.kind == Kind::Partial {
        tag.indent = indent;
    }
    tag.region = line;

    vec![tag]
}

/// Return the [`Delimiters`] described by the body of a set delimiters tag.
///
/// # Errors
///
/// Returns an [`Error`] if the body is not two whitespace separated parts.
fn parse_delimiters(source: &str, text: &str, key: Region) -> Result<Delimiters, Error> {
    let parts = text.split_whitespace().collect::<Vec<_>>();

    match parts.as_slice() {
        [left, right] => Ok(Delimiters::new(*left, *right)),
        _ => Err(Error::build(ErrorKind::InvalidDelimiters)
            .with_pointer(source, key)
            .with_help("expected a left and right delimiter separated by whitespace, like `{{=<% %>=}}`")),
    }
}

/// Validate the name of a partial.
///
/// # Errors
///
/// Returns an [`Error`] if the name is empty or contains whitespace.
fn validate_partial(source: &str, text: &str, key: Region) -> Result<(), Error> {
    if text.is_empty() {
        return Err(Error::build(ErrorKind::EmptyKey)
            .with_pointer(source, key)
            .with_help("expected the name of a partial"));
    }
    if text.contains(char::is_whitespace) {
        return Err(Error::build(ErrorKind::InvalidKey)
            .with_pointer(source, key)
            .with_help(format!("partial name `{text}` cannot contain whitespace")));
    }

    Ok(())
}

/// Validate a dotted key.
///
/// A key is either a single `.`, or one or more segments separated by `.`,
/// where every segment is made of identifier characters.
///
/// # Errors
///
/// Returns an [`Error`] if the key is empty or malformed.
fn validate_key(source: &str, text: &str, key: Region) -> Result<(), Error> {
    if text.is_empty() {
        return Err(Error::build(ErrorKind::EmptyKey)
            .with_pointer(source, key)
            .with_help("expected a key, like `name` or `person.name`"));
    }
    if text == "." {
        return Ok(());
    }

    for segment in text.split('.') {
        if segment.is_empty() {
            return Err(Error::build(ErrorKind::InvalidKey)
                .with_pointer(source, key)
                .with_help(format!(
                    "key `{text}` has a leading, trailing or doubled `.`"
                )));
        }
        if let Some(c) = segment.chars().find(|c| !is_key_continue(*c)) {
            return Err(Error::build(ErrorKind::InvalidKey)
                .with_pointer(source, key)
                .with_help(format!("key `{text}` cannot contain `{c}`")));
        }
    }

    Ok(())
}

/// Return true if the given character may appear in a key segment, meaning an
/// `xid_continue`.
fn is_key_continue(c: char) -> bool {
    unicode_ident::is_xid_continue(c)
}
