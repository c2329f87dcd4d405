use std::fmt::Display;
use std::time::Duration;

/// Bookkeeping about a finished parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStatistics {
	/// Distinct descriptors processed.
	pub descriptors: usize,
	/// GSS nodes created.
	pub gss_nodes: usize,
	/// GSS edges created.
	pub gss_edges: usize,
	/// Terminal nodes in the forest.
	pub terminal_nodes: usize,
	/// Epsilon nodes in the forest.
	pub epsilon_nodes: usize,
	/// Nonterminal nodes in the forest.
	pub nonterminal_nodes: usize,
	/// Intermediate nodes in the forest.
	pub intermediate_nodes: usize,
	/// Packed nodes in the forest.
	pub packed_nodes: usize,
	/// Forest nodes with more than one packed child.
	pub ambiguous_nodes: usize,
	/// Wall clock time spent parsing.
	pub duration: Duration,
}

impl Display for ParseStatistics {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		writeln!(f, "Parse time:          {:?}", self.duration)?;
		writeln!(f, "Descriptors:         {}", self.descriptors)?;
		writeln!(f, "GSS nodes:           {}", self.gss_nodes)?;
		writeln!(f, "GSS edges:           {}", self.gss_edges)?;
		writeln!(f, "Terminal nodes:      {}", self.terminal_nodes)?;
		writeln!(f, "Epsilon nodes:       {}", self.epsilon_nodes)?;
		writeln!(f, "Nonterminal nodes:   {}", self.nonterminal_nodes)?;
		writeln!(f, "Intermediate nodes:  {}", self.intermediate_nodes)?;
		writeln!(f, "Packed nodes:        {}", self.packed_nodes)?;
		write!(f, "Ambiguous nodes:     {}", self.ambiguous_nodes)
	}
}
