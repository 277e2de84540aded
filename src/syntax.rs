//! Delimiters that identify tags within templates.
//!
//! A template starts out with `{{` and `}}`. A set delimiters tag such as
//! `{{=<% %>=}}` swaps the pair for the remainder of that template; the change
//! never crosses into or out of partials.
use memchr::memmem;
use std::fmt::Display;

/// The default left delimiter.
pub const DEFAULT_LEFT: &str = "{{";
/// The default right delimiter.
pub const DEFAULT_RIGHT: &str = "}}";

/// Markers searched for in the text between tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// The active left delimiter, which begins a tag.
    Open,
    /// A line feed, which ends a line of text.
    Newline,
}

/// Searches source text for the next [`Marker`].
pub struct Finder {
    open: memmem::Finder<'static>,
}

impl Finder {
    /// Create a new [`Finder`] for the given left delimiter.
    pub fn new(left: &str) -> Self {
        Self {
            open: memmem::Finder::new(left.as_bytes()).into_owned(),
        }
    }

    /// Return the first [`Marker`] at or after `from`, along with the range it
    /// occupies.
    ///
    /// When both markers are present the earlier one wins.
    pub fn next(&self, source: &str, from: usize) -> Option<(Marker, usize, usize)> {
        let haystack = source.as_bytes().get(from..)?;
        let open = self.open.find(haystack);
        let newline = memchr::memchr(b'\n', haystack);

        match (open, newline) {
            (Some(open), Some(newline)) if newline < open => {
                Some((Marker::Newline, from + newline, from + newline + 1))
            }
            (Some(open), _) => {
                let end = from + open + self.open.needle().len();
                Some((Marker::Open, from + open, end))
            }
            (None, Some(newline)) => Some((Marker::Newline, from + newline, from + newline + 1)),
            (None, None) => None,
        }
    }
}

/// A pair of left and right delimiters.
///
/// # Examples
///
/// ```
/// use stache::Delimiters;
///
/// let delimiters = Delimiters::new("<%", "%>");
/// assert_eq!(delimiters.left(), "<%");
/// assert_eq!(Delimiters::default().to_string(), "{{ }}");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiters {
    left: String,
    right: String,
}

impl Delimiters {
    /// Create a new [`Delimiters`] pair.
    #[inline]
    pub fn new<T>(left: T, right: T) -> Self
    where
        T: Into<String>,
    {
        Self {
            left: left.into(),
            right: right.into(),
        }
    }

    /// Return the left delimiter.
    #[inline]
    pub fn left(&self) -> &str {
        &self.left
    }

    /// Return the right delimiter.
    #[inline]
    pub fn right(&self) -> &str {
        &self.right
    }

    /// Return a [`Finder`] that searches for the left delimiter or a line
    /// feed, whichever comes first.
    #[inline]
    pub fn to_finder(&self) -> Finder {
        Finder::new(&self.left)
    }
}

impl Default for Delimiters {
    fn default() -> Self {
        Self::new(DEFAULT_LEFT, DEFAULT_RIGHT)
    }
}

impl Display for Delimiters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.left, self.right)
    }
}
