use std::fmt::{Result, Write};

/// Wraps some underlying buffer by providing methods that write to it
/// in different formats.
///
/// The Pipe also tracks the indent of the partial being rendered. After text
/// that ends a line is written, the indent is written before the next
/// non-empty write.
pub struct Pipe<'buffer> {
    buffer: &'buffer mut String,
    /// Whitespace written at the beginning of every line.
    indent: String,
    /// True when the indent must be written before the next write.
    indent_next: bool,
}

impl<'buffer> Pipe<'buffer> {
    /// Create a new Pipe that writes to the given buffer.
    pub fn new(buffer: &'buffer mut String) -> Self {
        Self {
            buffer,
            indent: String::new(),
            indent_next: false,
        }
    }

    /// Write literal template text.
    ///
    /// When `end_of_line` is true the following write is indented.
    pub fn write_text(&mut self, text: &str, end_of_line: bool) -> Result {
        self.write_str(text)?;
        if end_of_line {
            self.indent_next = true;
        }

        Ok(())
    }

    /// Write the text with the HTML special characters `&`, `<`, `>`, `"`
    /// and `'` escaped.
    pub fn write_escaped(&mut self, text: &str) -> Result {
        if text.is_empty() {
            return Ok(());
        }
        self.write_indent()?;

        let mut last = 0;
        for (index, c) in text.char_indices() {
            let escaped = match c {
                '&' => "&amp;",
                '<' => "&lt;",
                '>' => "&gt;",
                '"' => "&quot;",
                '\'' => "&#39;",
                _ => continue,
            };
            self.buffer.write_str(&text[last..index])?;
            self.buffer.write_str(escaped)?;
            last = index + c.len_utf8();
        }

        self.buffer.write_str(&text[last..])
    }

    /// Append the given whitespace to the indent, and return the length of the
    /// indent before it was changed.
    ///
    /// Pass the returned length to [`restore_indent`][`Pipe::restore_indent`]
    /// when the partial is finished.
    pub fn increase_indent(&mut self, indent: &str) -> usize {
        let previous = self.indent.len();
        if !indent.is_empty() {
            self.indent.push_str(indent);
            self.indent_next = true;
        }

        previous
    }

    /// Truncate the indent to the given length.
    #[inline]
    pub fn restore_indent(&mut self, length: usize) {
        self.indent.truncate(length);
    }

    /// Write the pending indent, if any.
    fn write_indent(&mut self) -> Result {
        if self.indent_next {
            self.indent_next = false;
            self.buffer.write_str(&self.indent)?;
        }

        Ok(())
    }
}

impl Write for Pipe<'_> {
    /// Write the text unescaped, after any pending indent.
    ///
    /// Empty text is ignored and leaves the indent pending.
    #[inline]
    fn write_str(&mut self, s: &str) -> Result {
        if s.is_empty() {
            return Ok(());
        }
        self.write_indent()?;

        Write::write_str(self.buffer, s)
    }
}

#[cfg(test)]
mod tests {
    use super::Pipe;
    use std::fmt::Write;

    #[test]
    fn test_write_escaped() {
        let mut buffer = String::new();
        let mut pipe = Pipe::new(&mut buffer);
        pipe.write_escaped("<a href=\"x\">Tom & Jerry's</a>").unwrap();

        assert_eq!(
            buffer,
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;"
        );
    }

    #[test]
    fn test_indent_after_end_of_line() {
        let mut buffer = String::new();
        let mut pipe = Pipe::new(&mut buffer);
        let previous = pipe.increase_indent("  ");
        pipe.write_text("one\n", true).unwrap();
        pipe.write_str("").unwrap();
        pipe.write_text("two\n", true).unwrap();
        pipe.restore_indent(previous);
        pipe.write_text("three", false).unwrap();

        assert_eq!(buffer, "  one\n  two\nthree");
    }

    #[test]
    fn test_empty_indent_does_not_arm() {
        let mut buffer = String::new();
        let mut pipe = Pipe::new(&mut buffer);
        pipe.write_text("a", false).unwrap();
        pipe.increase_indent("");
        pipe.write_escaped("b").unwrap();

        assert_eq!(buffer, "ab");
    }
}
