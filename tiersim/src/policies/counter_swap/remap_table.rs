//! Remap table

// Imports
use {
	crate::addr::{EntryIdx, RemapIdx},
	std::collections::{hash_map, HashMap},
};

/// Remap table.
///
/// Holds one entry per fast slot. Entries are only materialized once their
/// slot is first accessed; until then they're empty with a zeroed counter.
#[derive(Debug)]
pub struct RemapTable {
	/// Entries, by their slot
	entries: HashMap<RemapIdx, RemapEntry>,

	/// Counter value at which a migration is triggered
	promotion_threshold: i8,

	/// Lowest value the counter saturates at
	counter_floor: CounterFloor,
}

impl RemapTable {
	/// Creates an empty remap table
	pub fn new(promotion_threshold: i8, counter_floor: CounterFloor) -> Self {
		Self {
			entries: HashMap::new(),
			promotion_threshold,
			counter_floor,
		}
	}

	/// Observes an access to candidate `entry_idx` of slot `remap_idx`
	pub fn observe(&mut self, remap_idx: RemapIdx, entry_idx: EntryIdx) -> Decision {
		self.entries
			.entry(remap_idx)
			.or_default()
			.observe(entry_idx, self.promotion_threshold, self.counter_floor)
	}

	/// Returns the entry of `remap_idx`
	pub fn get(&self, remap_idx: RemapIdx) -> RemapEntry {
		self.entries.get(&remap_idx).copied().unwrap_or_default()
	}

	/// Returns the entry of `remap_idx`, materializing it if necessary
	pub fn get_mut(&mut self, remap_idx: RemapIdx) -> &mut RemapEntry {
		self.entries.entry(remap_idx).or_default()
	}

	/// Returns an iterator over all materialized entries
	pub fn iter(&self) -> hash_map::Iter<'_, RemapIdx, RemapEntry> {
		self.entries.iter()
	}

	/// Returns the number of slots that have a resident candidate
	pub fn occupancy(&self) -> u64 {
		self.entries.values().filter(|entry| !entry.is_empty()).count() as u64
	}
}

/// Placement decision for an access
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Decision {
	/// Accessed candidate is resident in the fast tier
	Hit,

	/// Accessed candidate is in the slow tier and stays there
	Miss,

	/// Accessed candidate should be migrated into the fast tier now
	MigrateNow,
}

/// Lowest value a remap entry's counter saturates at
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CounterFloor {
	/// Saturate at `0`
	#[default]
	Zero,

	/// Saturate at `i8::MIN`, so resident hits can bank pressure below zero
	#[serde(rename = "i8-min")]
	I8Min,
}

impl CounterFloor {
	/// Returns the floor's value
	pub fn value(self) -> i8 {
		match self {
			Self::Zero => 0,
			Self::I8Min => i8::MIN,
		}
	}
}

/// Remap entry
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
pub struct RemapEntry {
	/// Candidate currently resident in the fast slot
	resident: Option<EntryIdx>,

	/// Migration counter, shared by all candidates
	counter: i8,
}

impl RemapEntry {
	/// Observes an access to `entry_idx` and updates the counter.
	///
	/// Resident accesses relieve migration pressure, while non-resident ones
	/// build it up until `promotion_threshold` is reached.
	pub fn observe(&mut self, entry_idx: EntryIdx, promotion_threshold: i8, counter_floor: CounterFloor) -> Decision {
		if self.resident == Some(entry_idx) {
			self.counter = self.counter.saturating_sub(1).max(counter_floor.value());
			return Decision::Hit;
		}

		self.counter = self.counter.saturating_add(1);
		match self.counter >= promotion_threshold {
			true => Decision::MigrateNow,
			false => Decision::Miss,
		}
	}

	/// Makes `entry_idx` the only resident candidate and resets the counter
	pub fn install(&mut self, entry_idx: EntryIdx) {
		self.reset_resident();
		self.resident = Some(entry_idx);
		self.reset_counter();
	}

	/// Clears the resident candidate
	pub fn reset_resident(&mut self) {
		self.resident = None;
	}

	/// Resets the counter
	pub fn reset_counter(&mut self) {
		self.counter = 0;
	}

	/// Returns the resident candidate
	pub fn resident(&self) -> Option<EntryIdx> {
		self.resident
	}

	/// Returns the counter
	pub fn counter(&self) -> i8 {
		self.counter
	}

	/// Returns if no candidate is resident
	pub fn is_empty(&self) -> bool {
		self.resident.is_none()
	}
}
