use std::collections::{HashMap, HashSet};

use indexmap::IndexSet;
use petgraph::{Graph, Directed, graph::{DefaultIx, NodeIndex}, visit::EdgeRef};
use thicket_grammar::{GrammarGraph, SlotId};

use crate::sppf::SppfNodeIndex;

pub(crate) type GssNodeIndex = NodeIndex<GssIx>;

type GssIx = DefaultIx;

pub(crate) type GssGraph = Graph<GssNode, GssEdge, Directed, GssIx>;

/// A call of a nonterminal at some input offset.
#[derive(Debug)]
pub(crate) struct GssNode {
	pub(crate) slot: SlotId,
	pub(crate) index: usize,
	/// Every SPPF node this call has been completed with. `P` in the original paper.
	completions: IndexSet<SppfNodeIndex>,
}

impl GssNode {
	fn new(slot: SlotId, index: usize) -> Self {
		Self { slot, index, completions: IndexSet::new() }
	}

	pub(crate) fn to_string(&self, grammar: &GrammarGraph) -> String {
		let label = grammar.slot(self.slot).map_or_else(|_| self.slot.to_string(), |s| s.label().to_owned());
		format!("[{},{}]", label, self.index)
	}
}

/// Where to continue once the call at the source of this edge completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct GssEdge {
	pub(crate) return_slot: SlotId,
	/// What the caller had parsed so far.
	pub(crate) sppf: Option<SppfNodeIndex>,
}

/// The graph structured stack.
///
/// Edges point from the called node back to its caller.
#[derive(Debug, Default)]
pub(crate) struct Gss {
	graph: GssGraph,
	nodes: HashMap<(SlotId, usize), GssNodeIndex>,
	edges: HashSet<(GssNodeIndex, GssEdge, GssNodeIndex)>,
}

impl Gss {
	/// Find or create the node for `slot` at `index`. Also returns whether it is new.
	pub(crate) fn get_or_create(&mut self, slot: SlotId, index: usize) -> (GssNodeIndex, bool) {
		if let Some(ix) = self.nodes.get(&(slot, index)) {
			(*ix, false)
		} else {
			let ix = self.graph.add_node(GssNode::new(slot, index));
			self.nodes.insert((slot, index), ix);
			(ix, true)
		}
	}

	/// Add an edge from `callee` to `caller`, unless an identical one already exists. Returns whether it was added.
	pub(crate) fn add_edge(&mut self, callee: GssNodeIndex, edge: GssEdge, caller: GssNodeIndex) -> bool {
		if self.edges.insert((callee, edge, caller)) {
			self.graph.add_edge(callee, caller, edge);
			true
		} else {
			false
		}
	}

	/// Record that `node` was completed with `sppf`. Returns whether this completion is new.
	pub(crate) fn add_completion(&mut self, node: GssNodeIndex, sppf: SppfNodeIndex) -> bool {
		self.graph.node_weight_mut(node).is_some_and(|n| n.completions.insert(sppf))
	}

	/// A snapshot of the completions of `node`, in the order they were found.
	pub(crate) fn completions(&self, node: GssNodeIndex) -> Vec<SppfNodeIndex> {
		self.graph.node_weight(node).map(|n| n.completions.iter().copied().collect()).unwrap_or_default()
	}

	/// A snapshot of the outgoing edges of `node`, together with the caller each leads to.
	pub(crate) fn edges(&self, node: GssNodeIndex) -> Vec<(GssEdge, GssNodeIndex)> {
		self.graph.edges(node).map(|e| (*e.weight(), e.target())).collect()
	}

	pub(crate) fn node(&self, ix: GssNodeIndex) -> Option<&GssNode> {
		self.graph.node_weight(ix)
	}

	pub(crate) fn node_count(&self) -> usize {
		self.graph.node_count()
	}

	pub(crate) fn edge_count(&self) -> usize {
		self.graph.edge_count()
	}
}
