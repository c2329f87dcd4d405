/// In which order descriptors that share an input offset are processed.
///
/// Descriptors at lower offsets are always processed first. The order within one offset does not change the result
/// of a parse, only the order in which nodes are created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DrainOrder {
	/// Most recently scheduled first.
	#[default]
	Lifo,
	/// Least recently scheduled first.
	Fifo,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Knobs to tune a single parse.
///
/// The defaults are what you want for normal use.
pub struct ParseConfig {
	/// Ignore the first set when choosing possible alternatives to parse.
	///
	/// Every alternative is then tried, and only fails once it hits a terminal that does not match.
	pub no_first: bool,
	/// See [`DrainOrder`].
	pub drain_order: DrainOrder,
	/// Abort once more than this many descriptors have been scheduled.
	pub max_descriptors: Option<usize>,
}

impl ParseConfig {
	/// The default configuration.
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Set [`ParseConfig::no_first`].
	#[must_use]
	pub const fn no_first(mut self, no_first: bool) -> Self {
		self.no_first = no_first;
		self
	}

	/// Set [`ParseConfig::drain_order`].
	#[must_use]
	pub const fn drain_order(mut self, drain_order: DrainOrder) -> Self {
		self.drain_order = drain_order;
		self
	}

	/// Set [`ParseConfig::max_descriptors`].
	#[must_use]
	pub const fn max_descriptors(mut self, max_descriptors: Option<usize>) -> Self {
		self.max_descriptors = max_descriptors;
		self
	}
}
