use std::collections::HashMap;

use petgraph::{Graph, Directed, graph::{DefaultIx, NodeIndex}, visit::{Dfs, EdgeRef}};
use thicket_grammar::{GrammarGraph, SlotId};

/// SPPF nodes are stored in a graph, references to them are stored as integer
pub type SppfNodeIndex = NodeIndex<SppfIx>;

type SppfIx = DefaultIx;

/// The raw storage of a [`Sppf`].
///
/// Edges point from a symbol or intermediate node to its packed children, and from a packed node to its (one or two) children.
pub type SppfGraph = Graph<SppfNode, (), Directed, SppfIx>;

/// A node in the shared packed parse forest.
///
/// Every variant except [`SppfNode::Packed`] is its own identity: two nodes with the same fields are the same node.
/// Packed nodes are only unique underneath their parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SppfNode {
	/// A matched terminal, spanning `left..right`.
	Terminal {
		/// The terminal slot that matched.
		slot: SlotId,
		/// Left extent.
		left: usize,
		/// Right extent.
		right: usize,
	},
	/// The empty derivation at `position`.
	Epsilon {
		/// Where in the input the derivation happened.
		position: usize,
	},
	/// A complete derivation of a nonterminal.
	Nonterminal {
		/// The nonterminal slot.
		slot: SlotId,
		/// Left extent.
		left: usize,
		/// Right extent.
		right: usize,
	},
	/// A partial derivation of an alternative, up to a body slot.
	Intermediate {
		/// The body slot the derivation has reached.
		slot: SlotId,
		/// Left extent.
		left: usize,
		/// Right extent.
		right: usize,
	},
	/// One way of deriving its parent.
	Packed {
		/// The slot that was reached by this derivation.
		slot: SlotId,
		/// The offset at which the left child ends and the right child starts.
		pivot: usize,
	},
}

impl SppfNode {
	/// Left extent of this node. Packed nodes have none.
	#[must_use]
	pub const fn left_extent(&self) -> Option<usize> {
		match self {
			Self::Terminal { left, .. } | Self::Nonterminal { left, .. } | Self::Intermediate { left, .. } => Some(*left),
			Self::Epsilon { position } => Some(*position),
			Self::Packed { .. } => None,
		}
	}

	/// Right extent of this node. Packed nodes have none.
	#[must_use]
	pub const fn right_extent(&self) -> Option<usize> {
		match self {
			Self::Terminal { right, .. } | Self::Nonterminal { right, .. } | Self::Intermediate { right, .. } => Some(*right),
			Self::Epsilon { position } => Some(*position),
			Self::Packed { .. } => None,
		}
	}

	/// Whether this is a [`SppfNode::Packed`].
	#[must_use]
	pub const fn is_packed(&self) -> bool {
		matches!(self, Self::Packed { .. })
	}

	/// The slot this node refers to, if any.
	#[must_use]
	pub const fn slot(&self) -> Option<SlotId> {
		match self {
			Self::Terminal { slot, .. } | Self::Nonterminal { slot, .. } | Self::Intermediate { slot, .. } | Self::Packed { slot, .. } => Some(*slot),
			Self::Epsilon { .. } => None,
		}
	}

	/// Human readable representation, using the slot labels from `grammar`.
	#[must_use]
	pub fn to_string(&self, grammar: &GrammarGraph) -> String {
		let label = |slot: &SlotId| grammar.slot(*slot).map_or_else(|_| slot.to_string(), |s| s.label().to_owned());
		match self {
			Self::Terminal { slot, left, right } | Self::Nonterminal { slot, left, right } | Self::Intermediate { slot, left, right } => {
				format!("({},{},{})", label(slot), left, right)
			},
			Self::Epsilon { position } => format!("(ε,{position},{position})"),
			Self::Packed { slot, pivot } => format!("({}, {})", label(slot), pivot),
		}
	}
}

/// Node counts per kind, see [`Sppf::counts`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SppfCounts {
	/// [`SppfNode::Terminal`] nodes.
	pub terminal: usize,
	/// [`SppfNode::Epsilon`] nodes.
	pub epsilon: usize,
	/// [`SppfNode::Nonterminal`] nodes.
	pub nonterminal: usize,
	/// [`SppfNode::Intermediate`] nodes.
	pub intermediate: usize,
	/// [`SppfNode::Packed`] nodes.
	pub packed: usize,
	/// Nodes with more than one packed child.
	pub ambiguous: usize,
}

/// The shared packed parse forest.
///
/// While parsing, nodes are only ever added and interned, never changed or removed. Once the parse is done, the
/// forest is handed out read-only.
#[derive(Debug, Default)]
pub struct Sppf {
	graph: SppfGraph,
	nodes: HashMap<SppfNode, SppfNodeIndex>,
	packed: HashMap<(SppfNodeIndex, SlotId, usize), SppfNodeIndex>,
}

impl Sppf {
	pub(crate) fn terminal_node(&mut self, slot: SlotId, left: usize, right: usize) -> SppfNodeIndex {
		self.find_or_create(SppfNode::Terminal { slot, left, right })
	}

	pub(crate) fn epsilon_node(&mut self, position: usize) -> SppfNodeIndex {
		self.find_or_create(SppfNode::Epsilon { position })
	}

	pub(crate) fn nonterminal_node(&mut self, slot: SlotId, left: usize, right: usize) -> SppfNodeIndex {
		self.find_or_create(SppfNode::Nonterminal { slot, left, right })
	}

	pub(crate) fn intermediate_node(&mut self, slot: SlotId, left: usize, right: usize) -> SppfNodeIndex {
		self.find_or_create(SppfNode::Intermediate { slot, left, right })
	}

	fn find_or_create(&mut self, candidate: SppfNode) -> SppfNodeIndex {
		if let Some(ix) = self.nodes.get(&candidate) {
			*ix
		} else {
			let ix = self.graph.add_node(candidate);
			self.nodes.insert(candidate, ix);
			ix
		}
	}

	/// Find or create the packed node `(slot, pivot)` underneath `parent`.
	///
	/// The children are only attached when the packed node is new. Returns whether it was.
	pub(crate) fn packed_node(&mut self, parent: SppfNodeIndex, slot: SlotId, pivot: usize, left: Option<SppfNodeIndex>, right: SppfNodeIndex) -> bool {
		let key = (parent, slot, pivot);
		if self.packed.contains_key(&key) {
			return false;
		}
		let ix = self.graph.add_node(SppfNode::Packed { slot, pivot });
		if let Some(left) = left {
			self.graph.add_edge(ix, left, ());
		}
		self.graph.add_edge(ix, right, ());
		self.add_packed_child(parent, ix);
		self.packed.insert(key, ix);
		true
	}

	fn add_packed_child(&mut self, parent: SppfNodeIndex, packed: SppfNodeIndex) {
		self.graph.add_edge(parent, packed, ());
	}

	/// Get the node behind an index.
	#[must_use]
	pub fn node(&self, ix: SppfNodeIndex) -> Option<&SppfNode> {
		self.graph.node_weight(ix)
	}

	/// Find the index of a (non-packed) node, if it exists in this forest.
	#[must_use]
	pub fn find(&self, node: &SppfNode) -> Option<SppfNodeIndex> {
		self.nodes.get(node).copied()
	}

	/// The `(left, right)` extent of a node.
	#[must_use]
	pub fn span(&self, ix: SppfNodeIndex) -> Option<(usize, usize)> {
		let node = self.node(ix)?;
		Some((node.left_extent()?, node.right_extent()?))
	}

	/// Ordered outgoing neighbours of `ix`.
	///
	/// For a symbol or intermediate node these are its packed children in the order they were found. For a packed
	/// node these are its left (if any) and right child.
	#[must_use]
	pub fn children(&self, ix: SppfNodeIndex) -> Vec<SppfNodeIndex> {
		let mut edges: Vec<_> = self.graph.edges(ix).map(|e| (e.id(), e.target())).collect();
		edges.sort_unstable_by_key(|(id, _)| *id);
		edges.into_iter().map(|(_, target)| target).collect()
	}

	/// Does this node have more than one derivation?
	#[must_use]
	pub fn is_ambiguous(&self, ix: SppfNodeIndex) -> bool {
		!self.node(ix).is_some_and(SppfNode::is_packed) && self.graph.edges(ix).nth(1).is_some()
	}

	/// Every ambiguous node in the forest.
	#[must_use]
	pub fn ambiguous_nodes(&self) -> Vec<SppfNodeIndex> {
		self.graph.node_indices().filter(|ix| self.is_ambiguous(*ix)).collect()
	}

	/// Every node reachable from `root`, in depth first order.
	#[must_use]
	pub fn reachable(&self, root: SppfNodeIndex) -> Vec<SppfNodeIndex> {
		let mut found = Vec::new();
		if self.node(root).is_none() {
			return found;
		}
		let mut dfs = Dfs::new(&self.graph, root);
		while let Some(ix) = dfs.next(&self.graph) {
			found.push(ix);
		}
		found
	}

	/// Count the nodes in this forest, by kind.
	#[must_use]
	pub fn counts(&self) -> SppfCounts {
		let mut counts = SppfCounts::default();
		for ix in self.graph.node_indices() {
			match self.graph[ix] {
				SppfNode::Terminal { .. } => counts.terminal += 1,
				SppfNode::Epsilon { .. } => counts.epsilon += 1,
				SppfNode::Nonterminal { .. } => counts.nonterminal += 1,
				SppfNode::Intermediate { .. } => counts.intermediate += 1,
				SppfNode::Packed { .. } => counts.packed += 1,
			}
			if self.is_ambiguous(ix) {
				counts.ambiguous += 1;
			}
		}
		counts
	}

	/// Total amount of nodes, packed ones included.
	#[must_use]
	pub fn len(&self) -> usize {
		self.graph.node_count()
	}

	/// Whether the forest has no nodes at all.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.graph.node_count() == 0
	}

	/// The underlying graph, for custom traversals.
	#[must_use]
	pub const fn graph(&self) -> &SppfGraph {
		&self.graph
	}
}
