use indexmap::IndexMap;
use thicket_input::Input;

use crate::slot::{BodySlot, EndSlot, GrammarSlot, NonterminalSlot, SlotId, SlotKind, TerminalSlot};
use crate::{GrammarError, GrammarResult};

/// The finalized grammar slot graph.
///
/// This is the read-only structure a parse runs on. It never changes once built, so one graph can back any number
/// of (concurrent) parses.
#[derive(Debug, Clone, Default)]
pub struct GrammarGraph {
	slots: Vec<GrammarSlot>,
	registry: IndexMap<String, SlotId>,
}

impl GrammarGraph {
	/// Assemble a graph from raw parts.
	///
	/// This is the entrypoint for external builders. Nothing is checked here; call [`GrammarGraph::validate`]
	/// (the parser always does) to find dangling references.
	#[must_use]
	pub fn new(slots: Vec<GrammarSlot>, registry: IndexMap<String, SlotId>) -> Self {
		Self { slots, registry }
	}

	/// Get any slot.
	///
	/// # Errors
	/// Returns [`GrammarError::MissingSlot`] if `id` is not in this graph.
	pub fn slot(&self, id: SlotId) -> GrammarResult<&GrammarSlot> {
		self.slots.get(id.index()).ok_or(GrammarError::MissingSlot(id))
	}

	/// Get a slot that must be a [`NonterminalSlot`].
	///
	/// # Errors
	/// Returns an error if the slot is missing or of the wrong kind.
	pub fn nonterminal_slot(&self, id: SlotId) -> GrammarResult<&NonterminalSlot> {
		match self.slot(id)? {
			GrammarSlot::Nonterminal(s) => Ok(s),
			_ => Err(GrammarError::WrongSlotKind { slot: id, expected: SlotKind::Nonterminal })
		}
	}

	/// Get a slot that must be a [`BodySlot`].
	///
	/// # Errors
	/// Returns an error if the slot is missing or of the wrong kind.
	pub fn body_slot(&self, id: SlotId) -> GrammarResult<&BodySlot> {
		match self.slot(id)? {
			GrammarSlot::Body(s) => Ok(s),
			_ => Err(GrammarError::WrongSlotKind { slot: id, expected: SlotKind::Body })
		}
	}

	/// Get a slot that must be a [`TerminalSlot`].
	///
	/// # Errors
	/// Returns an error if the slot is missing or of the wrong kind.
	pub fn terminal_slot(&self, id: SlotId) -> GrammarResult<&TerminalSlot> {
		match self.slot(id)? {
			GrammarSlot::Terminal(s) => Ok(s),
			_ => Err(GrammarError::WrongSlotKind { slot: id, expected: SlotKind::Terminal })
		}
	}

	/// Get a slot that must be an [`EndSlot`].
	///
	/// # Errors
	/// Returns an error if the slot is missing or of the wrong kind.
	pub fn end_slot(&self, id: SlotId) -> GrammarResult<&EndSlot> {
		match self.slot(id)? {
			GrammarSlot::End(s) => Ok(s),
			_ => Err(GrammarError::WrongSlotKind { slot: id, expected: SlotKind::End })
		}
	}

	/// Look up a nonterminal by name.
	#[must_use]
	pub fn nonterminal(&self, name: &str) -> Option<SlotId> {
		self.registry.get(name).copied()
	}

	/// All registered nonterminals, in declaration order.
	pub fn nonterminals(&self) -> impl Iterator<Item = (&str, SlotId)> {
		self.registry.iter().map(|(name, id)| (name.as_str(), *id))
	}

	/// All slots together with their ids.
	pub fn slots(&self) -> impl Iterator<Item = (SlotId, &GrammarSlot)> {
		self.slots.iter().enumerate().map(|(i, s)| (SlotId::new(i), s))
	}

	/// The amount of slots in this graph.
	#[must_use]
	pub fn len(&self) -> usize {
		self.slots.len()
	}

	/// Whether this graph has no slots at all.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.slots.is_empty()
	}

	/// Try to match terminal slot `terminal` at offset `i`. Returns the amount of characters consumed.
	///
	/// # Errors
	/// Returns an error if `terminal` is not a [`TerminalSlot`].
	pub fn matches(&self, terminal: SlotId, input: &Input, i: usize) -> GrammarResult<Option<usize>> {
		Ok(self.terminal_slot(terminal)?.terminal.matches(input, i))
	}

	/// The first-set pre-test.
	///
	/// Passes if parsing from `id` could succeed at offset `i` as far as a single terminal of lookahead can tell: the slot is
	/// nullable, or one of its first terminals matches.
	///
	/// # Errors
	/// Returns an error if `id` or one of its first terminals is missing.
	pub fn test(&self, id: SlotId, input: &Input, i: usize) -> GrammarResult<bool> {
		let first = match self.slot(id)? {
			GrammarSlot::Nonterminal(s) if !s.nullable => &s.first,
			GrammarSlot::Body(s) if !s.nullable => &s.first,
			GrammarSlot::Terminal(s) => return Ok(s.terminal.is_nullable() || s.terminal.matches(input, i).is_some()),
			_ => return Ok(true),
		};
		for terminal in first {
			if self.matches(*terminal, input, i)?.is_some() {
				return Ok(true);
			}
		}
		Ok(false)
	}

	/// Check that every reference in the graph points at an existing slot of the right kind.
	///
	/// # Errors
	/// Returns the first dangling or ill-typed reference found.
	pub fn validate(&self) -> GrammarResult<()> {
		for id in self.registry.values() {
			self.nonterminal_slot(*id)?;
		}
		for slot in &self.slots {
			match slot {
				GrammarSlot::Nonterminal(s) => {
					for first in &s.first_slots {
						self.expect_continuation(*first)?;
					}
					self.expect_terminals(s.first.iter())?;
				},
				GrammarSlot::Body(s) => {
					self.nonterminal_slot(s.head)?;
					for t in &s.transitions {
						match self.slot(t.symbol)? {
							GrammarSlot::Terminal(_) | GrammarSlot::Nonterminal(_) => {},
							_ => return Err(GrammarError::WrongSlotKind { slot: t.symbol, expected: SlotKind::Terminal }),
						}
						self.expect_continuation(t.dest)?;
					}
					self.expect_terminals(s.first.iter())?;
				},
				GrammarSlot::End(s) => {
					self.nonterminal_slot(s.head)?;
				},
				GrammarSlot::Terminal(_) => {},
			}
		}
		Ok(())
	}

	fn expect_continuation(&self, id: SlotId) -> GrammarResult<()> {
		match self.slot(id)? {
			GrammarSlot::Body(_) | GrammarSlot::End(_) => Ok(()),
			_ => Err(GrammarError::WrongSlotKind { slot: id, expected: SlotKind::Body })
		}
	}

	fn expect_terminals<'b>(&self, ids: impl Iterator<Item = &'b SlotId>) -> GrammarResult<()> {
		for id in ids {
			self.terminal_slot(*id)?;
		}
		Ok(())
	}
}
