use std::fmt::Display;
use std::hash::{Hash, Hasher};

use itertools::Itertools;
use regex_automata::{meta::Regex, Anchored, Input as SearchInput};
use thicket_input::Input;

use crate::{GrammarError, GrammarResult};

/// Something that can be matched directly against the input.
///
/// Every variant answers the same question: starting at character offset `i`, how many characters does this terminal
/// consume (if any)?
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Terminal {
	/// A single character.
	Char(char),
	/// A literal string. The empty literal is an explicit epsilon.
	Literal(String),
	/// A character class, as a list of inclusive ranges.
	Ranges(Vec<(char, char)>),
	/// A regular expression (see [`RegexTerminal`]).
	Regex(RegexTerminal),
}

impl Terminal {
	/// A terminal matching exactly `c`.
	#[must_use]
	pub const fn char(c: char) -> Self {
		Self::Char(c)
	}

	/// A terminal matching exactly `text`.
	#[must_use]
	pub fn literal(text: impl Into<String>) -> Self {
		Self::Literal(text.into())
	}

	/// A terminal matching any character in `lo..=hi`.
	#[must_use]
	pub fn range(lo: char, hi: char) -> Self {
		Self::Ranges(vec![(lo, hi)])
	}

	/// A terminal matching any character in any of the given ranges.
	///
	/// # Errors
	/// Returns [`GrammarError::EmptyCharClass`] if no ranges were given.
	pub fn ranges(ranges: Vec<(char, char)>) -> GrammarResult<Self> {
		if ranges.is_empty() {
			Err(GrammarError::EmptyCharClass)
		} else {
			Ok(Self::Ranges(ranges))
		}
	}

	/// A terminal matching the regular expression `pattern`.
	///
	/// # Errors
	/// Returns [`GrammarError::InvalidRegex`] if `pattern` can not be compiled.
	pub fn regex(pattern: &str) -> GrammarResult<Self> {
		Ok(Self::Regex(RegexTerminal::new(pattern)?))
	}

	/// Try to match this terminal at character offset `i`.
	///
	/// Returns the amount of characters consumed, or `None` if the terminal does not match.
	#[must_use]
	pub fn matches(&self, input: &Input, i: usize) -> Option<usize> {
		match self {
			Self::Char(c) => (input.char_at(i) == Some(*c)).then_some(1),
			Self::Literal(text) => input.starts_with_at(i, text).then(|| text.chars().count()),
			Self::Ranges(ranges) => {
				let c = input.char_at(i)?;
				ranges.iter().any(|(lo, hi)| (*lo..=*hi).contains(&c)).then_some(1)
			},
			Self::Regex(regex) => regex.matches(input, i),
		}
	}

	/// Can this terminal match without consuming anything?
	#[must_use]
	pub fn is_nullable(&self) -> bool {
		match self {
			Self::Char(_) | Self::Ranges(_) => false,
			Self::Literal(text) => text.is_empty(),
			Self::Regex(regex) => regex.is_nullable(),
		}
	}
}

impl Display for Terminal {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Char(c) => write!(f, "'{}'", c.escape_debug()),
			Self::Literal(text) if text.is_empty() => write!(f, "ε"),
			Self::Literal(text) => write!(f, "\"{}\"", text.escape_debug()),
			Self::Ranges(ranges) => {
				let inner = ranges.iter().map(|(lo, hi)| if lo == hi {
					lo.escape_debug().to_string()
				} else {
					format!("{}-{}", lo.escape_debug(), hi.escape_debug())
				}).join("");
				write!(f, "[{inner}]")
			},
			Self::Regex(regex) => write!(f, "/{}/", regex.pattern()),
		}
	}
}

#[derive(Debug, Clone)]
/// A terminal backed by a compiled regex.
///
/// Identity is the pattern. Matching is always anchored at the requested offset.
pub struct RegexTerminal {
	pattern: String,
	regex: Regex,
}

impl RegexTerminal {
	/// Compile `pattern`.
	///
	/// # Errors
	/// Returns [`GrammarError::InvalidRegex`] if `pattern` can not be compiled.
	pub fn new(pattern: &str) -> GrammarResult<Self> {
		let regex = Regex::new(pattern).map_err(|source| GrammarError::InvalidRegex { pattern: pattern.to_owned(), source: Box::new(source) })?;
		Ok(Self { pattern: pattern.to_owned(), regex })
	}

	/// The pattern this terminal was compiled from.
	#[must_use]
	pub fn pattern(&self) -> &str {
		&self.pattern
	}

	fn matches(&self, input: &Input, i: usize) -> Option<usize> {
		let start = input.byte_offset(i)?;
		let search = SearchInput::new(input.as_str()).range(start..).anchored(Anchored::Yes);
		let found = self.regex.search(&search)?;
		Some(input.char_offset(found.end())? - i)
	}

	fn is_nullable(&self) -> bool {
		self.regex.is_match(SearchInput::new("").anchored(Anchored::Yes))
	}
}

impl PartialEq for RegexTerminal {
	fn eq(&self, other: &Self) -> bool {
		self.pattern == other.pattern
	}
}

impl Eq for RegexTerminal {}

impl Hash for RegexTerminal {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.pattern.hash(state);
	}
}
