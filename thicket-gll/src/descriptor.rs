use std::collections::{BTreeMap, HashSet, VecDeque};

use derivative::Derivative;
use thicket_grammar::SlotId;

use crate::{config::DrainOrder, gss::GssNodeIndex, sppf::SppfNodeIndex};

#[derive(Debug, Clone, Copy, Eq, Derivative)]
#[derivative(PartialEq, Hash)]
/// A GLL Descriptor
///
/// Identity is `(slot, gss, index)`. The SPPF node is fully determined by those three, so it takes no part in
/// comparisons.
pub(crate) struct Descriptor {
	/// The slot to continue from.
	pub(crate) slot: SlotId,
	/// The gss node this descriptor belongs to.
	pub(crate) gss: GssNodeIndex,
	/// The input pointer when this descriptor was made.
	pub(crate) index: usize,
	/// What has been parsed of the current alternative so far.
	#[derivative(PartialEq="ignore")]
	#[derivative(Hash="ignore")]
	pub(crate) sppf: Option<SppfNodeIndex>,
}

impl Descriptor {
	pub(crate) const fn new(slot: SlotId, gss: GssNodeIndex, index: usize, sppf: Option<SppfNodeIndex>) -> Self {
		Self { slot, gss, index, sppf }
	}
}

/// The worklist (`R`) together with every descriptor ever seen (`U`).
#[derive(Debug, Default)]
pub(crate) struct DescriptorTable {
	seen: HashSet<Descriptor>,
	pending: BTreeMap<usize, VecDeque<Descriptor>>,
	order: DrainOrder,
	/// Offset of the last descriptor handed out.
	drained: usize,
}

impl DescriptorTable {
	pub(crate) fn new(order: DrainOrder) -> Self {
		Self { order, ..Default::default() }
	}

	/// Mark `d` as seen without queueing it. Returns whether it was unseen.
	///
	/// The caller is expected to process `d` itself.
	pub(crate) fn claim(&mut self, d: Descriptor) -> bool {
		if let Some(existing) = self.seen.get(&d) {
			debug_assert_eq!(existing.sppf, d.sppf, "Descriptor seen twice with different SPPF nodes");
			return false;
		}
		debug_assert!(d.index >= self.drained, "Descriptor scheduled behind the worklist");
		self.seen.insert(d);
		true
	}

	/// Queue `d` unless it was seen before. Returns whether it was queued.
	pub(crate) fn schedule(&mut self, d: Descriptor) -> bool {
		if self.claim(d) {
			self.pending.entry(d.index).or_default().push_back(d);
			true
		} else {
			false
		}
	}

	/// The next descriptor to process: lowest offset first, [`DrainOrder`] within an offset.
	pub(crate) fn next(&mut self) -> Option<Descriptor> {
		let mut entry = self.pending.first_entry()?;
		let queue = entry.get_mut();
		let d = match self.order {
			DrainOrder::Lifo => queue.pop_back(),
			DrainOrder::Fifo => queue.pop_front(),
		};
		if queue.is_empty() {
			entry.remove();
		}
		if let Some(d) = d {
			self.drained = d.index;
		}
		d
	}

	pub(crate) fn has_next(&self) -> bool {
		!self.pending.is_empty()
	}

	/// How many distinct descriptors were ever seen.
	pub(crate) fn len(&self) -> usize {
		self.seen.len()
	}
}
