use std::time::Duration;

use thicket_grammar::{GrammarError, GrammarGraph, GrammarSlot, SlotId, SlotKind};
use thicket_input::Input;

use crate::{
	config::ParseConfig,
	descriptor::{Descriptor, DescriptorTable},
	execute::Execute,
	gss::{Gss, GssEdge, GssNodeIndex},
	sppf::{Sppf, SppfNode, SppfNodeIndex},
	stats::ParseStatistics,
	CallContext, GllError, GllResult, ParseError, ParseSuccess,
};

/// The state object for the GLL parse process.
///
/// This object handles the bulk of the GLL parsing. It owns the [`Gss`], the [`Sppf`] and the descriptor sets of a
/// single parse, holds the common methods from the original paper, and keeps track of the furthest error.
///
/// Nothing in here outlives the parse. The grammar and the input are only borrowed.
pub(crate) struct GllState<'a> {
	// Main structures
	grammar: &'a GrammarGraph,
	input: &'a Input,
	config: &'a ParseConfig,
	gss: Gss,
	sppf: Sppf,
	// Memoization
	descriptors: DescriptorTable, // R and U
	// Pointers
	start: SlotId,
	gss_root: GssNodeIndex, // Points to <start, 0>
	error: Option<ParseError>,
}

impl<'a> GllState<'a> {
	/// Initialize the state and seed the start descriptor.
	pub(crate) fn init(grammar: &'a GrammarGraph, input: &'a Input, start: SlotId, config: &'a ParseConfig) -> GllResult<Self> {
		let mut gss = Gss::default();
		let (gss_root, _) = gss.get_or_create(start, 0);
		let mut state = Self {
			grammar,
			input,
			config,
			gss,
			sppf: Sppf::default(),
			descriptors: DescriptorTable::new(config.drain_order),
			start,
			gss_root,
			error: None,
		};
		state.add(start, gss_root, 0, None)?;
		Ok(state)
	}

	pub(crate) const fn grammar(&self) -> &'a GrammarGraph {
		self.grammar
	}

	pub(crate) const fn input(&self) -> &'a Input {
		self.input
	}

	pub(crate) const fn config(&self) -> &'a ParseConfig {
		self.config
	}

	pub(crate) const fn gss_root(&self) -> GssNodeIndex {
		self.gss_root
	}

	/// Schedule a descriptor.
	///
	/// `add` from the original paper.
	pub(crate) fn add(&mut self, slot: SlotId, gss: GssNodeIndex, index: usize, sppf: Option<SppfNodeIndex>) -> GllResult<()> {
		if self.descriptors.schedule(Descriptor::new(slot, gss, index, sppf)) {
			log::trace!("Scheduled {} at {}", self.slot_label(slot), index);
			self.check_limit()?;
		}
		Ok(())
	}

	/// Claim a descriptor that will be executed directly instead of going through the worklist.
	///
	/// Returns whether it had not been seen before.
	pub(crate) fn claim(&mut self, slot: SlotId, gss: GssNodeIndex, index: usize, sppf: Option<SppfNodeIndex>) -> GllResult<bool> {
		let fresh = self.descriptors.claim(Descriptor::new(slot, gss, index, sppf));
		if fresh {
			self.check_limit()?;
		}
		Ok(fresh)
	}

	fn check_limit(&self) -> GllResult<()> {
		match self.config.max_descriptors {
			Some(limit) if self.descriptors.len() > limit => Err(GllError::DescriptorLimit { limit }),
			_ => Ok(())
		}
	}

	/// Call nonterminal `callee` at `index` from `caller`, continuing at `return_slot` once it completes.
	///
	/// This is the `create` method in the original paper. Completions the callee already has are replayed over the
	/// new edge immediately. A callee that did not exist yet is executed straight away.
	pub(crate) fn create(&mut self, return_slot: SlotId, callee: SlotId, caller: GssNodeIndex, index: usize, sppf: Option<SppfNodeIndex>) -> GllResult<GssNodeIndex> {
		let (v, created) = self.gss.get_or_create(callee, index);
		if created {
			log::trace!("Created GSS node {}", self.gss_label(v));
		}
		if self.gss.add_edge(v, GssEdge { return_slot, sppf }, caller) {
			log::trace!("Added GSS edge {} -> {}", self.gss_label(v), self.gss_label(caller));
			for completion in self.gss.completions(v) {
				let (_, right) = self.span(completion)?;
				let y = self.get_node_p(return_slot, sppf, completion)?;
				self.add(return_slot, caller, right, Some(y))?;
			}
		}
		if created {
			let grammar = self.grammar;
			grammar.slot(callee)?.execute(callee, self, v, index, None)?;
		}
		Ok(v)
	}

	/// Pop context back after a nonterminal was parsed.
	///
	/// `pop` from the original paper. `node` is the completed nonterminal node ending at `index`.
	pub(crate) fn pop(&mut self, gss: GssNodeIndex, index: usize, node: SppfNodeIndex) -> GllResult<()> {
		if !self.gss.add_completion(gss, node) {
			return Ok(());
		}
		for (edge, caller) in self.gss.edges(gss) {
			let y = self.get_node_p(edge.return_slot, edge.sppf, node)?;
			self.add(edge.return_slot, caller, index, Some(y))?;
		}
		Ok(())
	}

	/// Combine what was parsed so far (`left`) with what was just parsed (`right`) into the node for `slot`.
	///
	/// `get_node_p` from the original paper.
	pub(crate) fn get_node_p(&mut self, slot: SlotId, left: Option<SppfNodeIndex>, right: SppfNodeIndex) -> GllResult<SppfNodeIndex> {
		let grammar = self.grammar;
		let (k, j) = self.span(right)?;
		match (grammar.slot(slot)?, left) {
			(GrammarSlot::End(end), left) => {
				let i = match left {
					Some(left) => self.span(left)?.0,
					None => k,
				};
				let node = self.sppf.nonterminal_node(end.head, i, j);
				self.sppf.packed_node(node, slot, k, left, right);
				Ok(node)
			},
			(GrammarSlot::Body(_), None) => Ok(right),
			(GrammarSlot::Body(_), Some(left)) => {
				let (i, _) = self.span(left)?;
				let node = self.sppf.intermediate_node(slot, i, j);
				self.sppf.packed_node(node, slot, k, Some(left), right);
				Ok(node)
			},
			_ => Err(GrammarError::WrongSlotKind { slot, expected: SlotKind::Body }.into())
		}
	}

	/// Find or create the terminal node for a match of `slot` from `left` to `right`.
	///
	/// `get_node_t` from the original paper.
	pub(crate) fn get_node_t(&mut self, slot: SlotId, left: usize, right: usize) -> SppfNodeIndex {
		self.sppf.terminal_node(slot, left, right)
	}

	/// The nonterminal node for an empty alternative of `head` at `index`, with an epsilon child.
	pub(crate) fn get_node_e(&mut self, end: SlotId, head: SlotId, index: usize) -> SppfNodeIndex {
		let node = self.sppf.nonterminal_node(head, index, index);
		let epsilon = self.sppf.epsilon_node(index);
		self.sppf.packed_node(node, end, index, None, epsilon);
		node
	}

	fn span(&self, ix: SppfNodeIndex) -> GllResult<(usize, usize)> {
		self.sppf.span(ix).ok_or(GllError::Spanless(ix))
	}

	/// Record a parse error candidate. Only the furthest one is kept; on a tie, the first one stays.
	pub(crate) fn record_error(&mut self, slot: SlotId, index: usize, gss: GssNodeIndex) {
		if self.error.is_some_and(|e| e.index >= index) {
			return;
		}
		let context = self.gss.node(gss).map_or(
			CallContext { nonterminal: self.start, index: 0 },
			|n| CallContext { nonterminal: n.slot, index: n.index }
		);
		let error = ParseError { slot, index, context };
		log::debug!("New furthest error: {} at {} ({})", self.slot_label(slot), index, self.gss_label(gss));
		self.error = Some(error);
	}

	/// Run the parsing process.
	///
	/// Once this has finished running, we either completed parsing or ran out of things to try.
	pub(crate) fn main(&mut self) -> GllResult<()> {
		let grammar = self.grammar;
		while let Some(Descriptor { slot, gss, index, sppf }) = self.descriptors.next() {
			log::trace!("Processing {} at {} in {}", self.slot_label(slot), index, self.gss_label(gss));
			grammar.slot(slot)?.execute(slot, self, gss, index, sppf)?;
		}
		Ok(())
	}

	/// Extract the result of a finished parse.
	pub(crate) fn finish(self, duration: Duration) -> GllResult<ParseSuccess> {
		debug_assert!(!self.descriptors.has_next(), "Finished with pending descriptors");
		let root = self.sppf.find(&SppfNode::Nonterminal { slot: self.start, left: 0, right: self.input.len() });
		let statistics = self.statistics(duration);
		if let Some(root) = root {
			log::info!("Parsed {} characters in {:?}", self.input.len(), duration);
			log::debug!("Statistics:\n{statistics}");
			Ok(ParseSuccess { root, forest: self.sppf, statistics })
		} else {
			let error = self.error.unwrap_or(ParseError {
				slot: self.start,
				index: 0,
				context: CallContext { nonterminal: self.start, index: 0 },
			});
			log::info!("Parse failed: {error}");
			Err(GllError::Parse(error))
		}
	}

	fn statistics(&self, duration: Duration) -> ParseStatistics {
		let counts = self.sppf.counts();
		ParseStatistics {
			descriptors: self.descriptors.len(),
			gss_nodes: self.gss.node_count(),
			gss_edges: self.gss.edge_count(),
			terminal_nodes: counts.terminal,
			epsilon_nodes: counts.epsilon,
			nonterminal_nodes: counts.nonterminal,
			intermediate_nodes: counts.intermediate,
			packed_nodes: counts.packed,
			ambiguous_nodes: counts.ambiguous,
			duration,
		}
	}

	fn slot_label(&self, slot: SlotId) -> String {
		self.grammar.slot(slot).map_or_else(|_| slot.to_string(), ToString::to_string)
	}

	fn gss_label(&self, gss: GssNodeIndex) -> String {
		self.gss.node(gss).map_or_else(|| format!("{gss:?}"), |n| n.to_string(self.grammar))
	}
}
