use std::collections::{BTreeSet, HashMap};
use std::fmt::Display;

use indexmap::IndexMap;
use itertools::Itertools;

use crate::graph::GrammarGraph;
use crate::slot::{BodySlot, EndSlot, GrammarSlot, NonterminalSlot, SlotId, TerminalSlot, Transition};
use crate::terminal::Terminal;
use crate::{GrammarError, GrammarResult};

/// A symbol in the body of a rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Symbol {
	/// Match a terminal directly.
	Terminal(Terminal),
	/// Call a nonterminal by name.
	Nonterminal(String),
}

impl Symbol {
	/// Refer to the nonterminal called `name`.
	#[must_use]
	pub fn nonterminal(name: impl Into<String>) -> Self {
		Self::Nonterminal(name.into())
	}

	/// Shorthand for [`Terminal::char`].
	#[must_use]
	pub const fn char(c: char) -> Self {
		Self::Terminal(Terminal::char(c))
	}

	/// Shorthand for [`Terminal::literal`].
	#[must_use]
	pub fn literal(text: impl Into<String>) -> Self {
		Self::Terminal(Terminal::literal(text))
	}

	/// Shorthand for [`Terminal::range`].
	#[must_use]
	pub fn range(lo: char, hi: char) -> Self {
		Self::Terminal(Terminal::range(lo, hi))
	}
}

impl From<Terminal> for Symbol {
	fn from(value: Terminal) -> Self {
		Self::Terminal(value)
	}
}

impl Display for Symbol {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Terminal(t) => t.fmt(f),
			Self::Nonterminal(n) => f.write_str(n),
		}
	}
}

/// Builds a [`GrammarGraph`] out of plain BNF rules.
///
/// Rules are lists of [`Symbol`]s. Adding several rules with the same head adds alternatives. There is no EBNF here;
/// repetition has to be written out as recursion.
///
/// # Example
/// ```
/// use thicket_grammar::{GrammarBuilder, Symbol};
///
/// let graph = GrammarBuilder::new()
///     .rule("A", vec![Symbol::char('a'), Symbol::nonterminal("A")])
///     .rule("A", vec![Symbol::char('a')])
///     .build()
///     .unwrap();
/// assert!(graph.nonterminal("A").is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct GrammarBuilder {
	rules: IndexMap<String, Vec<Vec<Symbol>>>,
	share_prefixes: bool,
}

impl GrammarBuilder {
	/// A builder without any rules.
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Let alternatives of the same nonterminal share the slots of their common prefix.
	///
	/// With this set, `A ::= 'a' 'b' | 'a' 'c'` produces one slot after `'a'` with two outgoing transitions.
	#[must_use]
	pub const fn share_prefixes(mut self, share: bool) -> Self {
		self.share_prefixes = share;
		self
	}

	/// Add the alternative `head ::= body`.
	#[must_use]
	pub fn rule(mut self, head: impl Into<String>, body: Vec<Symbol>) -> Self {
		self.add_rule(head, body);
		self
	}

	/// Add the alternative `head ::= body` in place.
	pub fn add_rule(&mut self, head: impl Into<String>, body: Vec<Symbol>) -> &mut Self {
		self.rules.entry(head.into()).or_default().push(body);
		self
	}

	/// Resolve all rules into a [`GrammarGraph`].
	///
	/// # Errors
	/// Returns [`GrammarError::UndefinedNonterminal`] if a rule refers to a nonterminal without any alternatives.
	pub fn build(self) -> GrammarResult<GrammarGraph> {
		let mut assembler = Assembler::default();
		for name in self.rules.keys() {
			let id = assembler.push(GrammarSlot::Nonterminal(NonterminalSlot::new(name.clone())));
			assembler.registry.insert(name.clone(), id);
		}
		for (head, alternatives) in &self.rules {
			assembler.alternatives(head, alternatives, self.share_prefixes)?;
		}
		assembler.compute_first();
		log::debug!("Built grammar graph with {} slots for {} nonterminals", assembler.slots.len(), assembler.registry.len());
		Ok(GrammarGraph::new(assembler.slots, assembler.registry))
	}
}

#[derive(Default)]
struct Assembler {
	slots: Vec<GrammarSlot>,
	registry: IndexMap<String, SlotId>,
	terminals: HashMap<Terminal, SlotId>,
}

impl Assembler {
	fn push(&mut self, slot: GrammarSlot) -> SlotId {
		self.slots.push(slot);
		SlotId::new(self.slots.len() - 1)
	}

	fn resolve(&mut self, head: &str, symbol: &Symbol) -> GrammarResult<SlotId> {
		match symbol {
			Symbol::Nonterminal(name) => self.registry.get(name).copied().ok_or_else(|| GrammarError::UndefinedNonterminal {
				name: name.clone(),
				head: head.to_owned()
			}),
			Symbol::Terminal(terminal) => {
				if let Some(id) = self.terminals.get(terminal) {
					Ok(*id)
				} else {
					let id = self.push(GrammarSlot::Terminal(TerminalSlot::new(terminal.clone())));
					self.terminals.insert(terminal.clone(), id);
					Ok(id)
				}
			}
		}
	}

	fn alternatives(&mut self, head: &str, alternatives: &[Vec<Symbol>], share: bool) -> GrammarResult<()> {
		let head_id = self.resolve(head, &Symbol::nonterminal(head))?;
		let mut first_slots = Vec::new();
		let mut shared_root = None;
		for (alternative, body) in alternatives.iter().enumerate() {
			let names: Vec<String> = body.iter().map(ToString::to_string).collect();
			if body.is_empty() {
				let end = self.push(GrammarSlot::End(EndSlot::new(head_id, alternative, dotted(head, &names, 0))));
				first_slots.push(end);
				continue;
			}
			let mut current = if let Some(root) = shared_root {
				self.mark_shared(root, head, &names, 0);
				root
			} else {
				let root = self.push(GrammarSlot::Body(BodySlot::new(head_id, 0, dotted(head, &names, 0))));
				first_slots.push(root);
				if share {
					shared_root = Some(root);
				}
				root
			};
			for (position, symbol) in body.iter().enumerate() {
				let symbol = self.resolve(head, symbol)?;
				let next = position + 1;
				if next == body.len() {
					let end = self.push(GrammarSlot::End(EndSlot::new(head_id, alternative, dotted(head, &names, next))));
					self.add_transition(current, Transition::new(symbol, end));
					continue;
				}
				let shared = if share { self.shared_dest(current, symbol) } else { None };
				current = if let Some(dest) = shared {
					self.mark_shared(dest, head, &names, next);
					dest
				} else {
					let dest = self.push(GrammarSlot::Body(BodySlot::new(head_id, next, dotted(head, &names, next))));
					self.add_transition(current, Transition::new(symbol, dest));
					dest
				};
			}
		}
		if let Some(GrammarSlot::Nonterminal(nt)) = self.slots.get_mut(head_id.index()) {
			nt.first_slots = first_slots;
		}
		Ok(())
	}

	fn add_transition(&mut self, from: SlotId, transition: Transition) {
		if let Some(GrammarSlot::Body(body)) = self.slots.get_mut(from.index()) {
			body.transitions.push(transition);
		}
	}

	/// An existing transition from `from` on `symbol` that leads into another body slot.
	fn shared_dest(&self, from: SlotId, symbol: SlotId) -> Option<SlotId> {
		let Some(GrammarSlot::Body(body)) = self.slots.get(from.index()) else {
			return None;
		};
		body.transitions.iter()
			.filter(|t| t.symbol == symbol)
			.map(|t| t.dest)
			.find(|dest| matches!(self.slots.get(dest.index()), Some(GrammarSlot::Body(_))))
	}

	fn mark_shared(&mut self, id: SlotId, head: &str, names: &[String], dot: usize) {
		if let Some(GrammarSlot::Body(body)) = self.slots.get_mut(id.index()) {
			let prefix = names[..dot].iter().map(String::as_str).chain(["•", "…"]).join(" ");
			body.label = format!("{head} ::= {prefix}");
		}
	}

	/// Fixpoint over nullability and first sets of every nonterminal and body slot.
	fn compute_first(&mut self) {
		let mut nullable: Vec<bool> = self.slots.iter().map(|slot| match slot {
			GrammarSlot::Terminal(_) | GrammarSlot::End(_) => slot.is_nullable(),
			_ => false
		}).collect();
		let mut first: Vec<BTreeSet<SlotId>> = self.slots.iter().enumerate().map(|(i, slot)| match slot {
			GrammarSlot::Terminal(_) => BTreeSet::from([SlotId::new(i)]),
			_ => BTreeSet::new()
		}).collect();
		let mut changed = true;
		while changed {
			changed = false;
			for (i, slot) in self.slots.iter().enumerate() {
				let (is_nullable, set) = match slot {
					GrammarSlot::Nonterminal(nt) => {
						let mut set = BTreeSet::new();
						for f in &nt.first_slots {
							set.extend(first[f.index()].iter().copied());
						}
						(nt.first_slots.iter().any(|f| nullable[f.index()]), set)
					},
					GrammarSlot::Body(body) => {
						let mut set = BTreeSet::new();
						let mut is_nullable = false;
						for t in &body.transitions {
							let (symbol, dest) = (t.symbol.index(), t.dest.index());
							set.extend(first[symbol].iter().copied());
							if nullable[symbol] {
								set.extend(first[dest].iter().copied());
								is_nullable |= nullable[dest];
							}
						}
						(is_nullable, set)
					},
					GrammarSlot::Terminal(_) | GrammarSlot::End(_) => continue,
				};
				if is_nullable != nullable[i] || set.len() != first[i].len() {
					nullable[i] = is_nullable;
					first[i] = set;
					changed = true;
				}
			}
		}
		for (i, slot) in self.slots.iter_mut().enumerate() {
			match slot {
				GrammarSlot::Nonterminal(nt) => {
					nt.nullable = nullable[i];
					nt.first = std::mem::take(&mut first[i]);
				},
				GrammarSlot::Body(body) => {
					body.nullable = nullable[i];
					body.first = std::mem::take(&mut first[i]);
				},
				GrammarSlot::Terminal(_) | GrammarSlot::End(_) => {},
			}
		}
	}
}

fn dotted(head: &str, names: &[String], dot: usize) -> String {
	let body = names[..dot].iter().map(String::as_str)
		.chain(std::iter::once("•"))
		.chain(names[dot..].iter().map(String::as_str))
		.join(" ");
	format!("{head} ::= {body}")
}

#[cfg(test)]
mod tests {
	use super::{GrammarBuilder, Symbol};
	use crate::slot::GrammarSlot;
	use crate::{GrammarError, GrammarGraph, SlotId};
	use pretty_assertions::assert_eq;

	fn star_grammar() -> GrammarGraph {
		GrammarBuilder::new()
			.rule("S", vec![Symbol::nonterminal("A*"), Symbol::nonterminal("A*")])
			.rule("A*", vec![Symbol::nonterminal("A*"), Symbol::nonterminal("A")])
			.rule("A*", vec![])
			.rule("A", vec![Symbol::char('a')])
			.build()
			.expect("valid grammar")
	}

	fn first_labels(graph: &GrammarGraph, first: &std::collections::BTreeSet<SlotId>) -> Vec<String> {
		first.iter().map(|id| graph.slot(*id).expect("first set points at a slot").to_string()).collect()
	}

	#[test]
	fn test_chain_layout() {
		let graph = GrammarBuilder::new()
			.rule("A", vec![Symbol::char('a'), Symbol::nonterminal("A")])
			.build()
			.expect("valid grammar");
		let a = graph.nonterminal("A").expect("A is registered");
		let nt = graph.nonterminal_slot(a).expect("A is a nonterminal");
		assert_eq!(1, nt.first_slots.len());
		let first = graph.body_slot(nt.first_slots[0]).expect("alternative starts in a body slot");
		assert_eq!("A ::= • 'a' A", first.label);
		assert_eq!(1, first.transitions.len());
		let second = graph.body_slot(first.transitions[0].dest).expect("chain continues");
		assert_eq!("A ::= 'a' • A", second.label);
		assert_eq!(1, second.position);
		assert_eq!(a, second.transitions[0].symbol);
		let end = graph.end_slot(second.transitions[0].dest).expect("chain ends");
		assert_eq!("A ::= 'a' A •", end.label);
		assert_eq!(a, end.head);
		assert!(graph.validate().is_ok());
	}

	#[test]
	fn test_empty_alternative_is_an_end_slot() {
		let graph = star_grammar();
		let star = graph.nonterminal("A*").expect("A* is registered");
		let nt = graph.nonterminal_slot(star).expect("A* is a nonterminal");
		assert_eq!(2, nt.first_slots.len());
		let end = graph.end_slot(nt.first_slots[1]).expect("empty alternative");
		assert_eq!(1, end.alternative);
		assert_eq!("A* ::= •", end.label);
	}

	#[test]
	fn test_nullable_and_first() {
		let graph = star_grammar();
		let s = graph.nonterminal_slot(graph.nonterminal("S").expect("registered")).expect("nonterminal");
		let star = graph.nonterminal_slot(graph.nonterminal("A*").expect("registered")).expect("nonterminal");
		let a = graph.nonterminal_slot(graph.nonterminal("A").expect("registered")).expect("nonterminal");
		assert!(s.nullable);
		assert!(star.nullable);
		assert!(!a.nullable);
		assert_eq!(vec!["'a'".to_string()], first_labels(&graph, &s.first));
		assert_eq!(vec!["'a'".to_string()], first_labels(&graph, &star.first));
		let recursive = graph.body_slot(star.first_slots[0]).expect("body slot");
		assert!(!recursive.nullable);
		assert_eq!(vec!["'a'".to_string()], first_labels(&graph, &recursive.first));
	}

	#[test]
	fn test_terminals_are_interned() {
		let graph = GrammarBuilder::new()
			.rule("S", vec![Symbol::char('a'), Symbol::char('a')])
			.rule("S", vec![Symbol::char('a')])
			.build()
			.expect("valid grammar");
		let terminals = graph.slots().filter(|(_, s)| matches!(s, GrammarSlot::Terminal(_))).count();
		assert_eq!(1, terminals);
	}

	#[test]
	fn test_shared_prefixes_branch() {
		let graph = GrammarBuilder::new()
			.share_prefixes(true)
			.rule("A", vec![Symbol::char('a'), Symbol::char('b')])
			.rule("A", vec![Symbol::char('a'), Symbol::char('c')])
			.rule("A", vec![Symbol::char('a')])
			.build()
			.expect("valid grammar");
		let nt = graph.nonterminal_slot(graph.nonterminal("A").expect("registered")).expect("nonterminal");
		assert_eq!(1, nt.first_slots.len());
		let root = graph.body_slot(nt.first_slots[0]).expect("shared root");
		assert_eq!("A ::= • …", root.label);
		assert_eq!(2, root.transitions.len());
		let after_a = graph.body_slot(root.transitions[0].dest).expect("shared body slot");
		assert_eq!("A ::= 'a' • …", after_a.label);
		assert_eq!(2, after_a.transitions.len());
		assert!(graph.end_slot(root.transitions[1].dest).is_ok());
		assert!(graph.validate().is_ok());
	}

	#[test]
	fn test_unshared_prefixes_do_not_branch() {
		let graph = GrammarBuilder::new()
			.rule("A", vec![Symbol::char('a'), Symbol::char('b')])
			.rule("A", vec![Symbol::char('a'), Symbol::char('c')])
			.build()
			.expect("valid grammar");
		let nt = graph.nonterminal_slot(graph.nonterminal("A").expect("registered")).expect("nonterminal");
		assert_eq!(2, nt.first_slots.len());
		for first in &nt.first_slots {
			assert_eq!(1, graph.body_slot(*first).expect("body slot").transitions.len());
		}
	}

	#[test]
	fn test_undefined_nonterminal() {
		let result = GrammarBuilder::new()
			.rule("S", vec![Symbol::nonterminal("B")])
			.build();
		assert!(matches!(result, Err(GrammarError::UndefinedNonterminal { name, head }) if name == "B" && head == "S"));
	}
}
