//! Victim queue

// Imports
use {
	super::descriptor::Descriptor,
	crate::{addr::CacheLine, tier_trace::Tier},
	std::collections::{HashMap, VecDeque},
};

/// Victim queue.
///
/// FIFO of fast slots, initially in slot order. The front is the next slot
/// to be replaced, and the caller re-enqueues it once it holds its new line.
///
/// Slots that were never handed out always precede re-enqueued ones, so
/// they aren't materialized until they reach the front.
#[derive(Debug)]
pub struct VictimQueue {
	/// Number of fast slots
	num_slots: u64,

	/// Slots handed out so far, by index
	slots: Vec<FastSlot>,

	/// Slots re-enqueued after being handed out
	recycled: VecDeque<SlotIdx>,

	/// Slots, by their resident line
	residents: HashMap<CacheLine, SlotIdx>,
}

impl VictimQueue {
	/// Creates a victim queue holding every one of `num_slots` slots
	pub fn new(num_slots: u64) -> Self {
		Self {
			num_slots,
			slots: vec![],
			recycled: VecDeque::new(),
			residents: HashMap::new(),
		}
	}

	/// Pops the next slot to replace
	pub fn select_victim(&mut self) -> Option<SlotIdx> {
		let next_fresh = self.slots.len() as u64;
		if next_fresh < self.num_slots {
			self.slots.push(FastSlot {
				descriptor: Descriptor::new(next_fresh, Tier::Fast, 0, 0),
				resident:   None,
			});
			return Some(SlotIdx(next_fresh));
		}

		self.recycled.pop_front()
	}

	/// Re-enqueues a slot at the tail.
	///
	/// # Panics
	/// Panics if `slot` was never handed out.
	pub fn enqueue(&mut self, slot: SlotIdx) {
		assert!(
			self.slot_ref(slot).is_some(),
			"Enqueued slot {slot:?} was never handed out"
		);
		self.recycled.push_back(slot);
	}

	/// Installs `cache_line` in `slot` at `cycle`, returning the line it evicted, if any.
	///
	/// # Panics
	/// Panics if `slot` was never handed out.
	pub fn install(&mut self, slot: SlotIdx, cache_line: CacheLine, cycle: u64) -> Option<CacheLine> {
		let fast_slot = self.slot_mut(slot);
		let evicted = fast_slot.resident.replace(cache_line);
		fast_slot.descriptor.set_ref_count(1);
		fast_slot.descriptor.set_last_access(cycle);

		if let Some(evicted) = evicted {
			self.residents.remove(&evicted);
		}
		self.residents.insert(cache_line, slot);

		evicted
	}

	/// Registers an access to the line resident in `slot`.
	///
	/// # Panics
	/// Panics if `slot` was never handed out.
	pub fn touch(&mut self, slot: SlotIdx, cycle: u64) {
		self.slot_mut(slot).descriptor.access(cycle, 0);
	}

	/// Returns the slot holding `cache_line`, if any
	pub fn find(&self, cache_line: CacheLine) -> Option<SlotIdx> {
		self.residents.get(&cache_line).copied()
	}

	/// Returns a slot, if it was ever handed out
	pub fn slot_ref(&self, slot: SlotIdx) -> Option<&FastSlot> {
		usize::try_from(slot.0).ok().and_then(|idx| self.slots.get(idx))
	}

	/// Returns all slots handed out so far
	pub fn slots(&self) -> &[FastSlot] {
		&self.slots
	}

	/// Returns the number of slots queued
	pub fn len(&self) -> u64 {
		(self.num_slots - self.slots.len() as u64) + self.recycled.len() as u64
	}

	/// Returns if no slots are queued
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Returns the number of slots holding a line
	pub fn occupancy(&self) -> u64 {
		self.residents.len() as u64
	}

	fn slot_mut(&mut self, slot: SlotIdx) -> &mut FastSlot {
		usize::try_from(slot.0)
			.ok()
			.and_then(|idx| self.slots.get_mut(idx))
			.expect("Slot was never handed out")
	}
}

/// Fast slot
#[derive(Clone, Debug)]
pub struct FastSlot {
	/// Descriptor
	descriptor: Descriptor,

	/// Resident line
	resident: Option<CacheLine>,
}

impl FastSlot {
	/// Returns the descriptor
	pub fn descriptor(&self) -> &Descriptor {
		&self.descriptor
	}

	/// Returns the resident line
	pub fn resident(&self) -> Option<CacheLine> {
		self.resident
	}
}

/// Fast slot index
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash, Debug)]
pub struct SlotIdx(u64);

impl SlotIdx {
	/// Returns the index as a `u64`
	pub fn to_u64(self) -> u64 {
		self.0
	}
}
