//! Multi-queue.
//!
//! Slow tier lines are tracked across several priority levels, each an
//! ordered queue (head = oldest untouched, tail = most recently touched).
//!
//! Descriptors live in an arena and the queues are intrusive doubly-linked
//! lists over arena indices, so a descriptor can be unlinked from the middle
//! of any level in `O(1)`.

// Imports
use {
	super::descriptor::Descriptor,
	crate::{addr::CacheLine, tier_trace::Tier},
	std::collections::HashMap,
};

/// Maximum number of levels
pub const MAX_LEVELS: usize = 32;

/// Multi-queue
#[derive(Debug)]
pub struct MultiQueue {
	/// Descriptor arena
	nodes: Vec<Option<Node>>,

	/// Free arena indices
	free: Vec<DescriptorIdx>,

	/// Levels
	levels: Vec<Level>,

	/// Descriptors, by their cache line
	index: HashMap<CacheLine, DescriptorIdx>,

	/// Migration cost, in cycles, used to debounce accesses
	migration_cost: u64,

	/// Cycles a descriptor may go untouched before being demoted
	life_time: u64,
}

impl MultiQueue {
	/// Creates an empty multi-queue with `levels` levels.
	///
	/// # Panics
	/// Panics if `levels` isn't within `1..=MAX_LEVELS`.
	pub fn new(levels: usize, migration_cost: u64, life_time: u64) -> Self {
		assert!(
			(1..=MAX_LEVELS).contains(&levels),
			"Level count must be within 1..={MAX_LEVELS}, found {levels}"
		);

		Self {
			nodes: vec![],
			free: vec![],
			levels: vec![Level::default(); levels],
			index: HashMap::new(),
			migration_cost,
			life_time,
		}
	}

	/// Registers an access to `cache_line` at `cycle`.
	///
	/// Untracked lines start being tracked at level 0. Tracked lines may have
	/// their reference count increased and move to the tail of their level.
	pub fn on_access(&mut self, cache_line: CacheLine, cycle: u64) -> DescriptorIdx {
		let Some(&idx) = self.index.get(&cache_line) else {
			let descriptor = Descriptor::new(cache_line.to_u64(), Tier::Slow, 1, cycle);
			let idx = self.alloc(descriptor);
			self.push_back(0, idx);
			self.index.insert(cache_line, idx);
			return idx;
		};

		let migration_cost = self.migration_cost;
		let descriptor = self.get_mut(idx);
		let debounce = self::debounce(migration_cost, descriptor.level());
		descriptor.access(cycle, debounce);

		let level = descriptor.level();
		self.unlink(idx);
		self.push_back(level, idx);

		idx
	}

	/// Inspects the head of `level` at `cycle`.
	///
	/// Expired heads are demoted (or, at level 0, stop being tracked), while
	/// others are promoted if their reference count warrants a higher level.
	pub fn sweep(&mut self, level: usize, cycle: u64) -> Option<SweepOutcome> {
		let idx = self.levels.get(level)?.head?;
		let descriptor = *self.get(idx);

		// If it expired, demote it
		if cycle.saturating_sub(descriptor.last_access()) > self.life_time {
			let Some(lower_level) = level.checked_sub(1) else {
				let descriptor = self.remove(idx);
				return Some(SweepOutcome::Removed(descriptor));
			};

			// Note: The refreshed reference count gives it a grace period
			//       so it doesn't get immediately demoted again.
			let ref_count = match level > 1 {
				true => (1 << (level - 1)) + 1,
				false => 0,
			};
			self.unlink(idx);
			let descriptor = self.get_mut(idx);
			descriptor.set_level(lower_level);
			descriptor.set_ref_count(ref_count);
			descriptor.set_last_access(cycle);
			self.push_back(lower_level, idx);

			return Some(SweepOutcome::Demoted {
				idx,
				from: level,
				to: lower_level,
			});
		}

		// Else check if it should be promoted
		let target_level = self.target_level(descriptor.ref_count());
		if target_level <= level {
			return None;
		}

		self.unlink(idx);
		self.get_mut(idx).set_level(target_level);
		self.push_back(target_level, idx);

		Some(SweepOutcome::Promoted {
			idx,
			from: level,
			to: target_level,
		})
	}

	/// Stops tracking a descriptor, returning it.
	///
	/// # Panics
	/// Panics if `idx` isn't a tracked descriptor.
	pub fn remove(&mut self, idx: DescriptorIdx) -> Descriptor {
		self.unlink(idx);
		let node = self.nodes[idx.0].take().expect("Descriptor index was free");
		self.free.push(idx);
		self.index.remove(&CacheLine::new(node.descriptor.block_id()));

		node.descriptor
	}

	/// Returns a descriptor.
	///
	/// # Panics
	/// Panics if `idx` isn't a tracked descriptor.
	pub fn get(&self, idx: DescriptorIdx) -> &Descriptor {
		&self.node(idx).descriptor
	}

	/// Returns the descriptors of `level`, from head to tail
	pub fn level_iter(&self, level: usize) -> impl Iterator<Item = &Descriptor> + '_ {
		let mut cur = self.levels.get(level).and_then(|level| level.head);
		std::iter::from_fn(move || {
			let node = self.node(cur?);
			cur = node.next;
			Some(&node.descriptor)
		})
	}

	/// Returns all tracked descriptors
	pub fn iter(&self) -> impl Iterator<Item = &Descriptor> + '_ {
		self.nodes.iter().flatten().map(|node| &node.descriptor)
	}

	/// Returns the number of descriptors in `level`
	pub fn level_len(&self, level: usize) -> usize {
		self.levels.get(level).map_or(0, |level| level.len)
	}

	/// Returns the number of levels
	pub fn levels(&self) -> usize {
		self.levels.len()
	}

	/// Returns the number of tracked descriptors
	pub fn len(&self) -> usize {
		self.index.len()
	}

	/// Returns if no descriptors are tracked
	pub fn is_empty(&self) -> bool {
		self.index.is_empty()
	}

	/// Returns the smallest level `L` such that `2^(L+1) >= ref_count`, capped at the top level
	fn target_level(&self, ref_count: u64) -> usize {
		let top_level = self.levels.len() - 1;
		(0..top_level)
			.find(|&level| (1 << (level + 1)) >= ref_count)
			.unwrap_or(top_level)
	}

	/// Allocates a node in the arena
	fn alloc(&mut self, descriptor: Descriptor) -> DescriptorIdx {
		let node = Node {
			descriptor,
			prev: None,
			next: None,
		};

		match self.free.pop() {
			Some(idx) => {
				self.nodes[idx.0] = Some(node);
				idx
			},
			None => {
				self.nodes.push(Some(node));
				DescriptorIdx(self.nodes.len() - 1)
			},
		}
	}

	/// Appends a node to the tail of `level`.
	///
	/// The node must be unlinked.
	fn push_back(&mut self, level: usize, idx: DescriptorIdx) {
		let prev_tail = self.levels[level].tail;
		{
			let node = self.node_mut(idx);
			node.descriptor.set_level(level);
			node.prev = prev_tail;
			node.next = None;
		}

		match prev_tail {
			Some(prev_tail) => self.node_mut(prev_tail).next = Some(idx),
			None => self.levels[level].head = Some(idx),
		}

		let level = &mut self.levels[level];
		level.tail = Some(idx);
		level.len += 1;
	}

	/// Unlinks a node from its level
	fn unlink(&mut self, idx: DescriptorIdx) {
		let (level, prev, next) = {
			let node = self.node_mut(idx);
			(node.descriptor.level(), node.prev.take(), node.next.take())
		};

		match prev {
			Some(prev) => self.node_mut(prev).next = next,
			None => self.levels[level].head = next,
		}
		match next {
			Some(next) => self.node_mut(next).prev = prev,
			None => self.levels[level].tail = prev,
		}

		self.levels[level].len -= 1;
	}

	fn get_mut(&mut self, idx: DescriptorIdx) -> &mut Descriptor {
		&mut self.node_mut(idx).descriptor
	}

	fn node(&self, idx: DescriptorIdx) -> &Node {
		self.nodes[idx.0].as_ref().expect("Descriptor index was free")
	}

	fn node_mut(&mut self, idx: DescriptorIdx) -> &mut Node {
		self.nodes[idx.0].as_mut().expect("Descriptor index was free")
	}
}

/// Cycles within which repeated accesses at `level` don't count as new references
fn debounce(migration_cost: u64, level: usize) -> u64 {
	migration_cost >> (level + 1)
}

/// Descriptor index
#[derive(PartialEq, Eq, Clone, Copy, Hash, Debug)]
pub struct DescriptorIdx(usize);

/// Outcome of [`MultiQueue::sweep`]
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum SweepOutcome {
	/// Descriptor moved to a higher level
	Promoted { idx: DescriptorIdx, from: usize, to: usize },

	/// Descriptor expired and moved to a lower level
	Demoted { idx: DescriptorIdx, from: usize, to: usize },

	/// Descriptor expired at level 0 and is no longer tracked
	Removed(Descriptor),
}

/// Arena node
#[derive(Clone, Debug)]
struct Node {
	/// Descriptor
	descriptor: Descriptor,

	// Level links
	prev: Option<DescriptorIdx>,
	next: Option<DescriptorIdx>,
}

/// Level
#[derive(Clone, Copy, Default, Debug)]
struct Level {
	// Queue ends
	head: Option<DescriptorIdx>,
	tail: Option<DescriptorIdx>,

	/// Length
	len: usize,
}
