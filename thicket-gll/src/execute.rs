use thicket_grammar::{BodySlot, EndSlot, GrammarError, GrammarSlot, NonterminalSlot, SlotId, SlotKind, TerminalSlot};

use crate::{gss::GssNodeIndex, sppf::SppfNodeIndex, state::GllState, GllResult};

/// The code run when a descriptor for a slot is processed.
///
/// `id` is the slot being executed, `gss` the call it is executed in, `index` the current input offset and `sppf`
/// whatever has been parsed of the current alternative so far.
pub(crate) trait Execute {
	fn execute(&self, id: SlotId, state: &mut GllState<'_>, gss: GssNodeIndex, index: usize, sppf: Option<SppfNodeIndex>) -> GllResult<()>;
}

impl Execute for GrammarSlot {
	fn execute(&self, id: SlotId, state: &mut GllState<'_>, gss: GssNodeIndex, index: usize, sppf: Option<SppfNodeIndex>) -> GllResult<()> {
		match self {
			Self::Nonterminal(s) => s.execute(id, state, gss, index, sppf),
			Self::Body(s) => s.execute(id, state, gss, index, sppf),
			Self::Terminal(s) => s.execute(id, state, gss, index, sppf),
			Self::End(s) => s.execute(id, state, gss, index, sppf),
		}
	}
}

impl Execute for NonterminalSlot {
	fn execute(&self, _: SlotId, state: &mut GllState<'_>, gss: GssNodeIndex, index: usize, _: Option<SppfNodeIndex>) -> GllResult<()> {
		let grammar = state.grammar();
		for first in &self.first_slots {
			if state.config().no_first || grammar.test(*first, state.input(), index)? {
				state.add(*first, gss, index, None)?;
			} else {
				// End slots always pass the test, so this is a body slot.
				let expected = grammar.body_slot(*first)?.expected_terminal(grammar).unwrap_or(*first);
				state.record_error(expected, index, gss);
			}
		}
		Ok(())
	}
}

impl Execute for BodySlot {
	fn execute(&self, _: SlotId, state: &mut GllState<'_>, gss: GssNodeIndex, index: usize, sppf: Option<SppfNodeIndex>) -> GllResult<()> {
		let grammar = state.grammar();
		let direct = self.transitions.len() == 1;
		for transition in &self.transitions {
			match grammar.slot(transition.symbol)? {
				GrammarSlot::Terminal(terminal) => {
					let Some(length) = terminal.terminal.matches(state.input(), index) else {
						state.record_error(transition.symbol, index, gss);
						continue;
					};
					let right = index + length;
					let node = state.get_node_t(transition.symbol, index, right);
					let next = state.get_node_p(transition.dest, sppf, node)?;
					if direct {
						if state.claim(transition.dest, gss, right, Some(next))? {
							grammar.slot(transition.dest)?.execute(transition.dest, state, gss, right, Some(next))?;
						}
					} else {
						state.add(transition.dest, gss, right, Some(next))?;
					}
				},
				GrammarSlot::Nonterminal(_) => {
					state.create(transition.dest, transition.symbol, gss, index, sppf)?;
				},
				_ => return Err(GrammarError::WrongSlotKind { slot: transition.symbol, expected: SlotKind::Terminal }.into())
			}
		}
		Ok(())
	}
}

impl Execute for EndSlot {
	fn execute(&self, id: SlotId, state: &mut GllState<'_>, gss: GssNodeIndex, index: usize, sppf: Option<SppfNodeIndex>) -> GllResult<()> {
		let node = match sppf {
			Some(node) => node,
			None => state.get_node_e(id, self.head, index),
		};
		if gss == state.gss_root() && !state.input().is_end(index) {
			state.record_error(id, index, gss);
		}
		state.pop(gss, index, node)
	}
}

impl Execute for TerminalSlot {
	fn execute(&self, id: SlotId, _: &mut GllState<'_>, _: GssNodeIndex, _: usize, _: Option<SppfNodeIndex>) -> GllResult<()> {
		Err(GrammarError::WrongSlotKind { slot: id, expected: SlotKind::Body }.into())
	}
}
