use std::collections::BTreeSet;
use std::fmt::Display;

use crate::terminal::Terminal;

/// Handle to a slot in a [`GrammarGraph`](crate::GrammarGraph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(usize);

impl SlotId {
	/// Wrap a raw index into the slot arena.
	#[must_use]
	pub const fn new(index: usize) -> Self {
		Self(index)
	}

	/// The raw index into the slot arena.
	#[must_use]
	pub const fn index(self) -> usize {
		self.0
	}
}

impl Display for SlotId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// The kinds a [`GrammarSlot`] can be. Mostly used for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
	/// See [`NonterminalSlot`].
	Nonterminal,
	/// See [`BodySlot`].
	Body,
	/// See [`TerminalSlot`].
	Terminal,
	/// See [`EndSlot`].
	End,
}

impl Display for SlotKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Nonterminal => write!(f, "nonterminal"),
			Self::Body => write!(f, "body"),
			Self::Terminal => write!(f, "terminal"),
			Self::End => write!(f, "end"),
		}
	}
}

/// A state of the parsing automaton.
///
/// The set of variants is closed. The parser dispatches on it with a plain `match`.
#[derive(Debug, Clone)]
pub enum GrammarSlot {
	/// Entry point of a nonterminal.
	Nonterminal(NonterminalSlot),
	/// A position inside one (or, with prefix sharing, several) alternatives.
	Body(BodySlot),
	/// A terminal that transitions can consume.
	Terminal(TerminalSlot),
	/// The completed end of one alternative.
	End(EndSlot),
}

impl GrammarSlot {
	/// What kind of slot this is.
	#[must_use]
	pub const fn kind(&self) -> SlotKind {
		match self {
			Self::Nonterminal(_) => SlotKind::Nonterminal,
			Self::Body(_) => SlotKind::Body,
			Self::Terminal(_) => SlotKind::Terminal,
			Self::End(_) => SlotKind::End,
		}
	}

	/// Could parsing from this slot onward succeed without consuming input?
	///
	/// For a [`TerminalSlot`] this asks whether the terminal itself is nullable.
	#[must_use]
	pub fn is_nullable(&self) -> bool {
		match self {
			Self::Nonterminal(s) => s.nullable,
			Self::Body(s) => s.nullable,
			Self::Terminal(s) => s.terminal.is_nullable(),
			Self::End(_) => true,
		}
	}

	/// A human readable representation of this slot, e.g. `A ::= 'a' • A`.
	#[must_use]
	pub fn label(&self) -> &str {
		match self {
			Self::Nonterminal(s) => &s.name,
			Self::Body(s) => &s.label,
			Self::Terminal(s) => &s.label,
			Self::End(s) => &s.label,
		}
	}
}

impl Display for GrammarSlot {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.label())
	}
}

#[derive(Debug, Clone)]
/// The slot representing a nonterminal as a whole.
pub struct NonterminalSlot {
	/// Name of the nonterminal.
	pub name: String,
	/// The first slot of each alternative.
	///
	/// These are [`BodySlot`]s, or [`EndSlot`]s for empty alternatives. With prefix sharing, several alternatives
	/// may start in the same slot.
	pub first_slots: Vec<SlotId>,
	/// Can this nonterminal derive the empty string?
	pub nullable: bool,
	/// Every terminal slot this nonterminal can start with.
	pub first: BTreeSet<SlotId>,
}

impl NonterminalSlot {
	/// A nonterminal without alternatives.
	#[must_use]
	pub fn new(name: impl Into<String>) -> Self {
		Self { name: name.into(), first_slots: Vec::new(), nullable: false, first: BTreeSet::new() }
	}
}

#[derive(Debug, Clone)]
/// A position inside the body of a rule (`A ::= α • β` with β non-empty).
pub struct BodySlot {
	/// The [`NonterminalSlot`] this body belongs to.
	pub head: SlotId,
	/// How many symbols have been consumed in the alternative(s) passing through this slot.
	pub position: usize,
	/// The outgoing transitions. A slot with more than one transition is a branch point.
	pub transitions: Vec<Transition>,
	/// Can the remainder (β) derive the empty string?
	pub nullable: bool,
	/// Every terminal slot the remainder (β) can start with.
	pub first: BTreeSet<SlotId>,
	/// Human readable representation.
	pub label: String,
}

impl BodySlot {
	/// A body slot without transitions.
	#[must_use]
	pub fn new(head: SlotId, position: usize, label: impl Into<String>) -> Self {
		Self { head, position, transitions: Vec::new(), nullable: false, first: BTreeSet::new(), label: label.into() }
	}

	/// The terminal this slot expects, if its only way forward is a single terminal.
	///
	/// Used to point errors at the terminal instead of at the slot.
	#[must_use]
	pub fn expected_terminal(&self, graph: &crate::GrammarGraph) -> Option<SlotId> {
		match self.transitions.as_slice() {
			[t] if matches!(graph.slot(t.symbol), Ok(GrammarSlot::Terminal(_))) => Some(t.symbol),
			_ => None
		}
	}
}

#[derive(Debug, Clone)]
/// A terminal, lifted into the slot graph so that transitions, SPPF nodes and errors can all refer to it by [`SlotId`].
pub struct TerminalSlot {
	/// The terminal to match.
	pub terminal: Terminal,
	/// Human readable representation.
	pub label: String,
}

impl TerminalSlot {
	/// Wrap a terminal.
	#[must_use]
	pub fn new(terminal: Terminal) -> Self {
		let label = terminal.to_string();
		Self { terminal, label }
	}
}

#[derive(Debug, Clone)]
/// The end of an alternative (`A ::= α •`).
pub struct EndSlot {
	/// The [`NonterminalSlot`] this alternative belongs to.
	pub head: SlotId,
	/// Which alternative of the head this is, in declaration order.
	pub alternative: usize,
	/// Human readable representation.
	pub label: String,
}

impl EndSlot {
	/// Construct an end slot.
	#[must_use]
	pub fn new(head: SlotId, alternative: usize, label: impl Into<String>) -> Self {
		Self { head, alternative, label: label.into() }
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// A single edge in the slot graph: consume `symbol`, end up in `dest`.
pub struct Transition {
	/// A [`TerminalSlot`] or a [`NonterminalSlot`].
	pub symbol: SlotId,
	/// A [`BodySlot`] or an [`EndSlot`].
	pub dest: SlotId,
}

impl Transition {
	/// Construct a transition.
	#[must_use]
	pub const fn new(symbol: SlotId, dest: SlotId) -> Self {
		Self { symbol, dest }
	}
}
