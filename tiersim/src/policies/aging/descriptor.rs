//! Descriptor

// Imports
use crate::tier_trace::Tier;

/// Aging state of a tracked block.
///
/// Slow tier descriptors track a cache line, while fast tier descriptors
/// track a physical fast slot.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Descriptor {
	/// Block id (cache line for the slow tier, slot index for the fast tier)
	block_id: u64,

	/// Tier the block lives in
	location: Tier,

	/// Queue level
	level: usize,

	/// Reference count
	ref_count: u64,

	/// Cycle of the last access
	last_access: u64,
}

impl Descriptor {
	/// Creates a descriptor at level 0, first accessed at `cycle`
	pub fn new(block_id: u64, location: Tier, ref_count: u64, cycle: u64) -> Self {
		Self {
			block_id,
			location,
			level: 0,
			ref_count,
			last_access: cycle,
		}
	}

	/// Records an access at `cycle`.
	///
	/// The reference count only increases if more than `debounce` cycles
	/// passed since the last access.
	pub fn access(&mut self, cycle: u64, debounce: u64) {
		if cycle.saturating_sub(self.last_access) > debounce {
			self.ref_count += 1;
		}
		self.last_access = cycle;
	}

	/// Returns the block id
	pub fn block_id(&self) -> u64 {
		self.block_id
	}

	/// Returns the tier the block lives in
	pub fn location(&self) -> Tier {
		self.location
	}

	/// Returns the queue level
	pub fn level(&self) -> usize {
		self.level
	}

	/// Returns the reference count
	pub fn ref_count(&self) -> u64 {
		self.ref_count
	}

	/// Returns the cycle of the last access
	pub fn last_access(&self) -> u64 {
		self.last_access
	}

	pub(super) fn set_level(&mut self, level: usize) {
		self.level = level;
	}

	pub(super) fn set_ref_count(&mut self, ref_count: u64) {
		self.ref_count = ref_count;
	}

	pub(super) fn set_last_access(&mut self, cycle: u64) {
		self.last_access = cycle;
	}
}
