#![warn(missing_docs)]
//! Input text for the thicket GLL parser.
//!
//! The parser addresses its input by character, not by byte. [`Input`] keeps the original text around
//! (regex terminals need it) together with a table of byte offsets so both views are cheap.

use std::fmt::Display;

/// An immutable, character-indexed piece of text.
///
/// Valid offsets are `0..=len()`, where `len()` is the end-of-input sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Input {
	text: String,
	chars: Vec<char>,
	/// Byte offset of every character, plus one trailing entry for the end of the text.
	offsets: Vec<usize>,
}

impl Input {
	/// Construct a new `Input` from any string-like value.
	#[must_use]
	pub fn new(text: impl Into<String>) -> Self {
		let text = text.into();
		let mut chars = Vec::with_capacity(text.len());
		let mut offsets = Vec::with_capacity(text.len() + 1);
		for (offset, c) in text.char_indices() {
			chars.push(c);
			offsets.push(offset);
		}
		offsets.push(text.len());
		Self { text, chars, offsets }
	}

	/// The empty input.
	#[must_use]
	pub fn empty() -> Self {
		Self::new(String::new())
	}

	/// The character at offset `i`, or `None` at (or past) the end of input.
	#[must_use]
	pub fn char_at(&self, i: usize) -> Option<char> {
		self.chars.get(i).copied()
	}

	/// The amount of characters in the input.
	#[must_use]
	pub fn len(&self) -> usize {
		self.chars.len()
	}

	/// Whether this input has no characters at all.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.chars.is_empty()
	}

	/// Whether offset `i` is the end-of-input sentinel (or beyond it).
	#[must_use]
	pub fn is_end(&self, i: usize) -> bool {
		i >= self.len()
	}

	/// The text between character offsets `start` and `end`.
	///
	/// Offsets are clamped to the input, so an inverted or out of bounds range yields an empty string.
	#[must_use]
	pub fn sub_sequence(&self, start: usize, end: usize) -> &str {
		let end = end.min(self.len());
		let start = start.min(end);
		&self.text[self.offsets[start]..self.offsets[end]]
	}

	/// Does the input contain `expected` starting at character offset `i`?
	#[must_use]
	pub fn starts_with_at(&self, i: usize, expected: &str) -> bool {
		i <= self.len() && self.text[self.offsets[i]..].starts_with(expected)
	}

	/// The full underlying text.
	#[must_use]
	pub fn as_str(&self) -> &str {
		&self.text
	}

	/// Byte offset of character offset `i`, if `i` is within `0..=len()`.
	#[must_use]
	pub fn byte_offset(&self, i: usize) -> Option<usize> {
		self.offsets.get(i).copied()
	}

	/// Character offset of byte offset `byte`, if `byte` lies on a character boundary.
	#[must_use]
	pub fn char_offset(&self, byte: usize) -> Option<usize> {
		self.offsets.binary_search(&byte).ok()
	}

	/// 1-based line and column of character offset `i`.
	///
	/// The end-of-input sentinel maps to the position right after the last character.
	#[must_use]
	pub fn line_column(&self, i: usize) -> (usize, usize) {
		let mut line = 1;
		let mut column = 1;
		for c in self.chars.iter().take(i) {
			if *c == '\n' {
				line += 1;
				column = 1;
			} else {
				column += 1;
			}
		}
		(line, column)
	}
}

impl From<&str> for Input {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}

impl From<String> for Input {
	fn from(value: String) -> Self {
		Self::new(value)
	}
}

impl Display for Input {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.text)
	}
}

#[cfg(test)]
mod tests {
	use super::Input;
	use pretty_assertions::assert_eq;

	#[test]
	fn test_char_indexing() {
		let input = Input::new("aλb");
		assert_eq!(3, input.len());
		assert_eq!(Some('λ'), input.char_at(1));
		assert_eq!(None, input.char_at(3));
		assert!(input.is_end(3));
		assert_eq!(Some(3), input.byte_offset(2));
		assert_eq!(Some(2), input.char_offset(3));
		assert_eq!(None, input.char_offset(2));
	}

	#[test]
	fn test_sub_sequence() {
		let input = Input::new("hello λ world");
		assert_eq!("λ", input.sub_sequence(6, 7));
		assert_eq!("world", input.sub_sequence(8, 100));
		assert_eq!("", input.sub_sequence(5, 2));
	}

	#[test]
	fn test_starts_with_at() {
		let input = Input::new("abcabd");
		assert!(input.starts_with_at(3, "ab"));
		assert!(!input.starts_with_at(3, "abc"));
		assert!(input.starts_with_at(6, ""));
		assert!(!input.starts_with_at(7, ""));
	}

	#[test]
	fn test_line_column() {
		let input = Input::new("ab\ncd\n");
		assert_eq!((1, 1), input.line_column(0));
		assert_eq!((1, 3), input.line_column(2));
		assert_eq!((2, 1), input.line_column(3));
		assert_eq!((2, 2), input.line_column(4));
		assert_eq!((3, 1), input.line_column(6));
	}

	#[test]
	fn test_empty() {
		let input = Input::empty();
		assert!(input.is_empty());
		assert!(input.is_end(0));
		assert_eq!("", input.sub_sequence(0, 0));
	}
}
