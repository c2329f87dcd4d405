#![warn(missing_docs)]
//! A GLL parsing engine.
//!
//! Given a [`GrammarGraph`] and an [`Input`], [`parse`] finds every derivation of the input from a start nonterminal
//! and returns them as a shared packed parse forest ([`Sppf`]). Any context-free grammar is accepted, including
//! ambiguous and left-recursive ones.
//!
//! # Example
//! ```
//! use thicket_gll::parse;
//! use thicket_grammar::{GrammarBuilder, Symbol};
//! use thicket_input::Input;
//!
//! let grammar = GrammarBuilder::new()
//!     .rule("E", vec![Symbol::nonterminal("E"), Symbol::char('+'), Symbol::nonterminal("E")])
//!     .rule("E", vec![Symbol::char('a')])
//!     .build()
//!     .unwrap();
//! let success = parse(&Input::new("a+a+a"), &grammar, "E").unwrap();
//! assert!(success.forest().is_ambiguous(success.root()));
//! ```

/// Parse configuration.
pub mod config;
/// The shared packed parse forest.
pub mod sppf;
/// Statistics about a finished parse.
pub mod stats;

mod descriptor;
mod execute;
mod gss;
mod state;

use std::fmt::Display;
use std::time::Instant;

use thiserror::Error;
use thicket_grammar::{GrammarError, GrammarGraph, SlotId};
use thicket_input::Input;

pub use config::{DrainOrder, ParseConfig};
pub use sppf::{Sppf, SppfCounts, SppfNode, SppfNodeIndex};
pub use stats::ParseStatistics;

use state::GllState;

/// The call a parse error happened in: which nonterminal, called at which offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallContext {
	/// The [`thicket_grammar::NonterminalSlot`] that was called.
	pub nonterminal: SlotId,
	/// Where it was called.
	pub index: usize,
}

/// The furthest point a failed parse got to.
///
/// These are raw coordinates. Use the grammar to name the slot and [`Input::line_column`] to locate the offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParseError {
	/// The slot at which parsing could not continue. For a terminal that did not match, this is the terminal slot.
	pub slot: SlotId,
	/// The input offset at which parsing could not continue.
	pub index: usize,
	/// The call the error happened in.
	pub context: CallContext,
}

impl Display for ParseError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "Unable to continue at slot {} at offset {} (in call of {} at {})", self.slot, self.index, self.context.nonterminal, self.context.index)
	}
}

#[derive(Debug, Error)]
/// Everything that can make a parse fail.
pub enum GllError {
	/// The input is not in the language of the grammar.
	#[error("{0}")]
	Parse(ParseError),
	/// The requested start symbol does not exist.
	#[error("Unknown start symbol `{0}`")]
	UnknownStartSymbol(String),
	/// The grammar graph is malformed.
	#[error(transparent)]
	Grammar(#[from] GrammarError),
	/// The parse scheduled more descriptors than [`ParseConfig::max_descriptors`] allows.
	#[error("Parse aborted after scheduling more than {limit} descriptors")]
	DescriptorLimit {
		/// The limit that was exceeded.
		limit: usize,
	},
	/// An SPPF node without extent was used where one was needed.
	#[error("SPPF node {0:?} has no extent")]
	Spanless(SppfNodeIndex),
}

/// Result type for everything in this crate.
pub type GllResult<T> = Result<T, GllError>;

/// A successful parse.
#[derive(Debug)]
pub struct ParseSuccess {
	root: SppfNodeIndex,
	forest: Sppf,
	statistics: ParseStatistics,
}

impl ParseSuccess {
	/// The nonterminal node for the start symbol spanning the whole input.
	#[must_use]
	pub const fn root(&self) -> SppfNodeIndex {
		self.root
	}

	/// The forest. Besides the derivations of the root, this also holds every partial result found along the way.
	#[must_use]
	pub const fn forest(&self) -> &Sppf {
		&self.forest
	}

	/// See [`ParseStatistics`].
	#[must_use]
	pub const fn statistics(&self) -> &ParseStatistics {
		&self.statistics
	}

	/// Take ownership of the forest.
	#[must_use]
	pub fn into_forest(self) -> Sppf {
		self.forest
	}
}

/// Parse `input` starting from nonterminal `start` with the default [`ParseConfig`].
///
/// # Errors
/// See [`parse_with_config`].
pub fn parse(input: &Input, grammar: &GrammarGraph, start: &str) -> GllResult<ParseSuccess> {
	parse_with_config(input, grammar, start, &ParseConfig::default())
}

/// Parse `input` starting from nonterminal `start`.
///
/// The grammar graph is only borrowed. Any amount of parses can run over the same graph at the same time.
///
/// # Errors
/// * [`GllError::Grammar`] if the graph does not validate.
/// * [`GllError::UnknownStartSymbol`] if `start` is not a nonterminal of the graph.
/// * [`GllError::DescriptorLimit`] if the configured limit was hit.
/// * [`GllError::Parse`] if the input could not be parsed, pointing at the furthest point parsing got to.
pub fn parse_with_config(input: &Input, grammar: &GrammarGraph, start: &str, config: &ParseConfig) -> GllResult<ParseSuccess> {
	grammar.validate()?;
	let start = grammar.nonterminal(start).ok_or_else(|| GllError::UnknownStartSymbol(start.to_owned()))?;
	log::info!("Parsing {} characters", input.len());
	let timer = Instant::now();
	let mut state = GllState::init(grammar, input, start, config)?;
	state.main()?;
	state.finish(timer.elapsed())
}

#[cfg(test)]
mod tests {
	use std::collections::{BTreeMap, BTreeSet};

	use super::{parse, parse_with_config, DrainOrder, GllError, ParseConfig, Sppf, SppfNode, SppfNodeIndex};
	use thicket_grammar::{GrammarBuilder, GrammarGraph, GrammarSlot, Symbol, Terminal};
	use thicket_input::Input;
	use pretty_assertions::assert_eq;

	type Canonical = BTreeMap<SppfNode, BTreeSet<(SppfNode, Vec<SppfNode>)>>;

	/// Every node reachable from `root`, with its packed children, independent of node indices.
	fn canonical(forest: &Sppf, root: SppfNodeIndex) -> Canonical {
		let mut found = BTreeMap::new();
		for ix in forest.reachable(root) {
			let node = *forest.node(ix).expect("reachable");
			if node.is_packed() {
				continue;
			}
			let packed = forest.children(ix).into_iter().map(|p| {
				let children = forest.children(p).into_iter().map(|c| *forest.node(c).expect("child")).collect();
				(*forest.node(p).expect("packed"), children)
			}).collect();
			found.insert(node, packed);
		}
		found
	}

	/// Every reachable derivation step fits together and stays inside the input.
	fn assert_sound(forest: &Sppf, root: SppfNodeIndex, len: usize) {
		assert_eq!(Some((0, len)), forest.span(root));
		for ix in forest.reachable(root) {
			let node = forest.node(ix).expect("reachable");
			if node.is_packed() {
				continue;
			}
			let (left, right) = forest.span(ix).expect("symbol nodes have a span");
			assert!(left <= right && right <= len);
			for packed in forest.children(ix) {
				let spans: Vec<_> = forest.children(packed).into_iter().map(|c| forest.span(c).expect("child span")).collect();
				match spans.as_slice() {
					[(l, r)] => assert_eq!((left, right), (*l, *r)),
					[(l, m), (n, r)] => {
						assert_eq!(m, n);
						assert_eq!((left, right), (*l, *r));
					},
					other => panic!("Packed node with {} children", other.len()),
				}
			}
		}
	}

	fn single_a() -> GrammarGraph {
		GrammarBuilder::new().rule("A", vec![Symbol::char('a')]).build().expect("valid grammar")
	}

	fn stars() -> GrammarGraph {
		GrammarBuilder::new()
			.rule("S", vec![Symbol::nonterminal("A*"), Symbol::nonterminal("A*")])
			.rule("A*", vec![Symbol::nonterminal("A*"), Symbol::nonterminal("A")])
			.rule("A*", vec![])
			.rule("A", vec![Symbol::char('a')])
			.build()
			.expect("valid grammar")
	}

	fn right_recursive() -> GrammarGraph {
		GrammarBuilder::new()
			.rule("A", vec![Symbol::char('a'), Symbol::nonterminal("A")])
			.rule("A", vec![Symbol::char('a')])
			.build()
			.expect("valid grammar")
	}

	fn expressions() -> GrammarGraph {
		GrammarBuilder::new()
			.rule("E", vec![Symbol::nonterminal("E"), Symbol::char('+'), Symbol::nonterminal("E")])
			.rule("E", vec![Symbol::char('a')])
			.build()
			.expect("valid grammar")
	}

	#[test]
	fn test_single_terminal() {
		let grammar = single_a();
		let success = parse(&Input::new("a"), &grammar, "A").expect("parses");
		let forest = success.forest();
		let root = success.root();
		assert_eq!(Some((0, 1)), forest.span(root));
		assert!(!forest.is_ambiguous(root));
		let packed = forest.children(root);
		assert_eq!(1, packed.len());
		let children = forest.children(packed[0]);
		assert_eq!(1, children.len());
		assert!(matches!(forest.node(children[0]), Some(SppfNode::Terminal { left: 0, right: 1, .. })));
	}

	#[test]
	fn test_nullable_empty_input() {
		let grammar = stars();
		let success = parse(&Input::empty(), &grammar, "S").expect("parses");
		assert_eq!(Some((0, 0)), success.forest().span(success.root()));
		assert!(success.statistics().epsilon_nodes > 0);
		assert_sound(success.forest(), success.root(), 0);
	}

	#[test]
	fn test_nullable_ambiguous() {
		let grammar = stars();
		let success = parse(&Input::new("aaa"), &grammar, "S").expect("parses");
		let forest = success.forest();
		assert!(forest.is_ambiguous(success.root()));
		// The split between both A* can be at any of the 4 offsets.
		assert_eq!(4, forest.children(success.root()).len());
		assert_sound(forest, success.root(), 3);
	}

	#[test]
	fn test_terminal_mismatch() {
		let grammar = single_a();
		let a = grammar.slots().find(|(_, s)| matches!(s, GrammarSlot::Terminal(_))).map(|(id, _)| id).expect("terminal slot");
		for config in [ParseConfig::default(), ParseConfig::default().no_first(true)] {
			match parse_with_config(&Input::new("b"), &grammar, "A", &config) {
				Err(GllError::Parse(error)) => {
					assert_eq!(0, error.index);
					assert_eq!(a, error.slot);
				},
				other => panic!("Expected a parse error, got {other:?}"),
			}
		}
	}

	#[test]
	fn test_linear_gss() {
		let grammar = right_recursive();
		let success = parse(&Input::new("aaaa"), &grammar, "A").expect("parses");
		assert_eq!(5, success.statistics().gss_nodes);
		let success = parse(&Input::new("aaaaaaaa"), &grammar, "A").expect("parses");
		assert_eq!(9, success.statistics().gss_nodes);
		assert_sound(success.forest(), success.root(), 8);
	}

	#[test]
	fn test_left_recursion_and_ambiguity() {
		let grammar = expressions();
		let success = parse(&Input::new("a+a+a"), &grammar, "E").expect("parses");
		let forest = success.forest();
		assert_eq!(2, forest.children(success.root()).len());
		assert_eq!(1, success.statistics().ambiguous_nodes);
		assert_sound(forest, success.root(), 5);
	}

	#[test]
	fn test_drain_order_does_not_matter() {
		let cases = [(stars(), "S", "aaaa"), (expressions(), "E", "a+a+a+a"), (right_recursive(), "A", "aaa")];
		for (grammar, start, text) in cases {
			let input = Input::new(text);
			let lifo = parse_with_config(&input, &grammar, start, &ParseConfig::new().drain_order(DrainOrder::Lifo)).expect("parses");
			let fifo = parse_with_config(&input, &grammar, start, &ParseConfig::new().drain_order(DrainOrder::Fifo)).expect("parses");
			assert_eq!(canonical(lifo.forest(), lifo.root()), canonical(fifo.forest(), fifo.root()));
		}
	}

	#[test]
	fn test_first_set_does_not_change_forest() {
		let grammar = expressions();
		let input = Input::new("a+a+a");
		let with = parse(&input, &grammar, "E").expect("parses");
		let without = parse_with_config(&input, &grammar, "E", &ParseConfig::new().no_first(true)).expect("parses");
		assert_eq!(canonical(with.forest(), with.root()), canonical(without.forest(), without.root()));
	}

	#[test]
	fn test_nodes_are_unique() {
		let grammar = stars();
		let success = parse(&Input::new("aaa"), &grammar, "S").expect("parses");
		let forest = success.forest();
		let mut seen = BTreeSet::new();
		for ix in forest.graph().node_indices() {
			let node = *forest.node(ix).expect("exists");
			if !node.is_packed() {
				assert!(seen.insert(node));
				assert_eq!(Some(ix), forest.find(&node));
			}
		}
	}

	#[test]
	fn test_cyclic_nullable_grammar_terminates() {
		let grammar = GrammarBuilder::new()
			.rule("S", vec![Symbol::nonterminal("S"), Symbol::nonterminal("S")])
			.rule("S", vec![Symbol::char('a')])
			.rule("S", vec![])
			.build()
			.expect("valid grammar");
		let success = parse(&Input::new("aaa"), &grammar, "S").expect("parses");
		assert!(success.forest().is_ambiguous(success.root()));
	}

	#[test]
	fn test_furthest_error() {
		let grammar = GrammarBuilder::new()
			.rule("S", vec![Symbol::char('a'), Symbol::char('b'), Symbol::char('c')])
			.rule("S", vec![Symbol::char('a'), Symbol::char('x')])
			.build()
			.expect("valid grammar");
		let c = grammar.slots().find(|(_, s)| s.label() == "'c'").map(|(id, _)| id).expect("terminal slot");
		match parse(&Input::new("abd"), &grammar, "S") {
			Err(GllError::Parse(error)) => {
				assert_eq!(2, error.index);
				assert_eq!(c, error.slot);
			},
			other => panic!("Expected a parse error, got {other:?}"),
		}
	}

	#[test]
	fn test_trailing_input() {
		let grammar = single_a();
		match parse(&Input::new("aa"), &grammar, "A") {
			Err(GllError::Parse(error)) => assert_eq!(1, error.index),
			other => panic!("Expected a parse error, got {other:?}"),
		}
	}

	#[test]
	fn test_shared_prefixes() {
		let build = |share| GrammarBuilder::new()
			.share_prefixes(share)
			.rule("A", vec![Symbol::char('a'), Symbol::char('b')])
			.rule("A", vec![Symbol::char('a'), Symbol::char('c')])
			.rule("A", vec![Symbol::char('a')])
			.build()
			.expect("valid grammar");
		for share in [true, false] {
			let grammar = build(share);
			for text in ["ab", "ac", "a"] {
				let success = parse(&Input::new(text), &grammar, "A").expect("parses");
				assert_eq!(1, success.forest().children(success.root()).len());
			}
			assert!(parse(&Input::new("ad"), &grammar, "A").is_err());
		}
	}

	#[test]
	fn test_terminal_kinds() {
		let number = Terminal::regex("[0-9]+").expect("valid regex");
		let grammar = GrammarBuilder::new()
			.rule("S", vec![Symbol::Terminal(number.clone()), Symbol::literal(" + "), Symbol::Terminal(number), Symbol::range('a', 'z')])
			.build()
			.expect("valid grammar");
		let success = parse(&Input::new("12 + 345x"), &grammar, "S").expect("parses");
		let forest = success.forest();
		let terminals: Vec<_> = forest.graph().node_indices()
			.filter(|ix| matches!(forest.node(*ix), Some(SppfNode::Terminal { .. })))
			.filter_map(|ix| forest.span(ix))
			.collect();
		assert_eq!(vec![(0, 2), (2, 5), (5, 8), (8, 9)], terminals);
	}

	#[test]
	fn test_unknown_start_symbol() {
		let grammar = single_a();
		assert!(matches!(parse(&Input::new("a"), &grammar, "B"), Err(GllError::UnknownStartSymbol(name)) if name == "B"));
	}

	#[test]
	fn test_invalid_graph() {
		use indexmap::IndexMap;
		use thicket_grammar::{GrammarError, NonterminalSlot, SlotId};

		let mut start = NonterminalSlot::new("A");
		start.first_slots.push(SlotId::new(4));
		let grammar = GrammarGraph::new(vec![GrammarSlot::Nonterminal(start)], IndexMap::from([("A".to_string(), SlotId::new(0))]));
		assert!(matches!(parse(&Input::new("a"), &grammar, "A"), Err(GllError::Grammar(GrammarError::MissingSlot(_)))));
	}

	#[test]
	fn test_descriptor_limit() {
		let grammar = stars();
		let config = ParseConfig::new().max_descriptors(Some(3));
		assert!(matches!(parse_with_config(&Input::new("aaaa"), &grammar, "S", &config), Err(GllError::DescriptorLimit { limit: 3 })));
		let success = parse_with_config(&Input::new("aaaa"), &grammar, "S", &ParseConfig::new().max_descriptors(Some(10_000))).expect("parses");
		assert!(success.statistics().descriptors <= 10_000);
	}

	#[test]
	fn test_concurrent_parses() {
		let grammar = expressions();
		let texts = ["a", "a+a", "a+a+a", "a+"];
		let results: Vec<bool> = std::thread::scope(|scope| {
			let handles: Vec<_> = texts.iter().map(|text| {
				let grammar = &grammar;
				scope.spawn(move || parse(&Input::new(*text), grammar, "E").is_ok())
			}).collect();
			handles.into_iter().map(|h| h.join().expect("no panics")).collect()
		});
		assert_eq!(vec![true, true, true, false], results);
	}
}
