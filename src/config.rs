/// The default maximum depth of nested partials.
///
/// Every level of nesting is a few stack frames deep, so this stays well
/// within the stack of a spawned thread. Raise it only when rendering on a
/// thread with a larger stack.
pub const DEFAULT_MAX_PARTIAL_DEPTH: usize = 256;

/// Options that change how templates are rendered.
///
/// # Examples
///
/// ```
/// use stache::Config;
///
/// let config = Config::new().with_strict(true).with_max_partial_depth(16);
/// assert!(config.strict());
/// assert_eq!(config.max_partial_depth(), 16);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// When true, a key that cannot be resolved or a partial that is not
    /// registered is an error instead of rendering as empty.
    strict: bool,
    /// Nested partials deeper than this are an error.
    max_partial_depth: usize,
}

impl Config {
    /// Create a new [`Config`] with the default options.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set strict mode.
    ///
    /// Returns the Config, so additional methods may be chained.
    #[inline]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Set strict mode.
    #[inline]
    pub fn set_strict(&mut self, strict: bool) {
        self.strict = strict;
    }

    /// Return true if strict mode is enabled.
    #[inline]
    pub fn strict(&self) -> bool {
        self.strict
    }

    /// Set the maximum depth of nested partials.
    ///
    /// Returns the Config, so additional methods may be chained.
    #[inline]
    pub fn with_max_partial_depth(mut self, depth: usize) -> Self {
        self.max_partial_depth = depth;
        self
    }

    /// Set the maximum depth of nested partials.
    #[inline]
    pub fn set_max_partial_depth(&mut self, depth: usize) {
        self.max_partial_depth = depth;
    }

    /// Return the maximum depth of nested partials.
    #[inline]
    pub fn max_partial_depth(&self) -> usize {
        self.max_partial_depth
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            strict: false,
            max_partial_depth: DEFAULT_MAX_PARTIAL_DEPTH,
        }
    }
}
