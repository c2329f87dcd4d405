#![warn(missing_docs)]
//! Grammar slot graphs for the thicket GLL parser.
//!
//! A grammar is consumed by the parser as a graph of slots: one [`NonterminalSlot`] per nonterminal, one
//! [`BodySlot`] per position inside an alternative, one [`TerminalSlot`] per distinct terminal and one [`EndSlot`] per
//! alternative. The [`GrammarBuilder`] creates such a graph out of plain BNF rules and precomputes the nullability
//! and first sets the parser uses to reject alternatives early.

/// The builder turning rules into a [`GrammarGraph`].
pub mod builder;
/// The finalized, read-only [`GrammarGraph`].
pub mod graph;
/// The slot types.
pub mod slot;
/// Terminals and how they match input.
pub mod terminal;

use thiserror::Error;

pub use crate::builder::{GrammarBuilder, Symbol};
pub use crate::graph::GrammarGraph;
pub use crate::slot::{BodySlot, EndSlot, GrammarSlot, NonterminalSlot, SlotId, SlotKind, TerminalSlot, Transition};
pub use crate::terminal::{RegexTerminal, Terminal};

/// Everything that can go wrong while building or inspecting a [`GrammarGraph`].
#[derive(Debug, Error)]
pub enum GrammarError {
	/// A rule refers to a nonterminal that has no alternatives.
	#[error("nonterminal `{name}` is used in a rule for `{head}` but never defined")]
	UndefinedNonterminal {
		/// The missing nonterminal.
		name: String,
		/// The head of the rule it was used in.
		head: String,
	},
	/// A regex terminal failed to compile.
	#[error("invalid regex /{pattern}/")]
	InvalidRegex {
		/// The offending pattern.
		pattern: String,
		/// Why it failed.
		#[source]
		source: Box<regex_automata::meta::BuildError>,
	},
	/// A character class was created without any ranges.
	#[error("character class without any ranges")]
	EmptyCharClass,
	/// The graph refers to a slot that does not exist.
	#[error("grammar graph refers to missing slot {0}")]
	MissingSlot(SlotId),
	/// The graph refers to a slot of the wrong kind.
	#[error("slot {slot} was expected to be a {expected} slot")]
	WrongSlotKind {
		/// The offending slot.
		slot: SlotId,
		/// What it should have been.
		expected: SlotKind,
	},
}

/// Result type for everything grammar related.
pub type GrammarResult<T> = Result<T, GrammarError>;
