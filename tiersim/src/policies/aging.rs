//! Aging policy.
//!
//! Slow tier lines are aged across the levels of a multi-queue, swept one
//! level per simulated cycle. Once an accessed line sits at or above the hot
//! level, it's migrated into the fast slot at the front of the victim queue.

// Modules
pub mod descriptor;
pub mod multi_queue;
pub mod victim_queue;

// Exports
pub use self::{
	descriptor::Descriptor,
	multi_queue::{DescriptorIdx, MultiQueue, SweepOutcome},
	victim_queue::{FastSlot, SlotIdx, VictimQueue},
};

// Imports
use {
	crate::{
		addr::{Geometry, RemapIdx},
		migration::{MigrationExecutor, MigrationRequest},
		sim::{self, Access},
		tier_trace::{Tier, TierSink},
	},
	anyhow::Context,
	itertools::Itertools,
	std::fmt,
};

/// Aging policy
#[derive(Debug)]
pub struct Aging {
	/// Geometry
	geometry: Geometry,

	/// Multi-queue of slow tier lines
	multi_queue: MultiQueue,

	/// Victim queue of fast slots
	victim_queue: VictimQueue,

	/// Level at which accessed lines are migrated
	hot_level: usize,

	/// Next level to sweep
	sweep_hand: usize,

	/// Next cycle to sweep at
	next_sweep_cycle: u64,
}

impl Aging {
	/// Creates the policy with every fast slot empty
	pub fn new(geometry: Geometry, config: Config) -> Self {
		Self {
			geometry,
			multi_queue: MultiQueue::new(config.mq_length, config.migration_cost, config.life_time),
			victim_queue: VictimQueue::new(geometry.num_fast_slots()),
			hot_level: config.hot_level,
			sweep_hand: 0,
			next_sweep_cycle: 0,
		}
	}

	/// Returns the multi-queue
	pub fn multi_queue(&self) -> &MultiQueue {
		&self.multi_queue
	}

	/// Returns the victim queue
	pub fn victim_queue(&self) -> &VictimQueue {
		&self.victim_queue
	}

	/// Returns the fast tier address of `slot`
	fn slot_addr(&self, slot: SlotIdx) -> u64 {
		self.geometry.translate(RemapIdx::new(slot.to_u64()))
	}
}

impl sim::Policy for Aging {
	fn handle_access(
		&mut self,
		access: Access,
		executor: &mut MigrationExecutor,
		sink: &mut dyn TierSink,
	) -> Result<(), anyhow::Error> {
		let Access { record, decomposed } = access;
		let cache_line = decomposed.cache_line;
		let cycle = executor.cycle();

		// If it's already in the fast tier, just access it there
		if let Some(slot) = self.victim_queue.find(cache_line) {
			self.victim_queue.touch(slot, cycle);
			return executor
				.access(sink, Tier::Fast, self.slot_addr(slot), record.kind)
				.context("Unable to access fast tier");
		}

		// Else age it and check if it's hot enough to migrate
		let idx = self.multi_queue.on_access(cache_line, cycle);
		let level = self.multi_queue.get(idx).level();
		if level < self.hot_level {
			return executor
				.access(sink, Tier::Slow, record.addr, record.kind)
				.context("Unable to access slow tier");
		}

		let slot = self
			.victim_queue
			.select_victim()
			.context("Victim queue had no fast slots")?;
		let evicted_addr = self
			.victim_queue
			.slot_ref(slot)
			.and_then(FastSlot::resident)
			.map(|evicted| self.geometry.line_addr(evicted));

		tracing::trace!(?cache_line, level, ?slot, ?evicted_addr, "Line is hot");
		executor
			.migrate(sink, MigrationRequest {
				cache_line,
				addr: record.addr,
				kind: record.kind,
				fast_addr: self.slot_addr(slot),
				evicted_addr,
			})
			.context("Unable to migrate line")?;

		// Note: Lines in the fast tier are tracked by their slot, and the evicted
		//       line starts being aged afresh on its next access.
		self.multi_queue.remove(idx);
		self.victim_queue.install(slot, cache_line, cycle);
		self.victim_queue.enqueue(slot);

		Ok(())
	}

	fn advance(&mut self, cycle: u64) {
		let levels = self.multi_queue.levels();
		while self.next_sweep_cycle <= cycle {
			// Note: Sweeping an empty multi-queue does nothing, so skip straight to `cycle`.
			if self.multi_queue.is_empty() {
				let skipped = cycle - self.next_sweep_cycle + 1;
				self.sweep_hand = ((self.sweep_hand as u64 + skipped % levels as u64) % levels as u64) as usize;
				self.next_sweep_cycle = cycle + 1;
				break;
			}

			let outcome = self.multi_queue.sweep(self.sweep_hand, self.next_sweep_cycle);
			if let Some(outcome) = outcome {
				tracing::trace!(?outcome, cycle = self.next_sweep_cycle, "Swept level {}", self.sweep_hand);
			}
			self.sweep_hand = (self.sweep_hand + 1) % levels;
			self.next_sweep_cycle += 1;
		}
	}

	fn fast_occupancy(&self) -> u64 {
		self.victim_queue.occupancy()
	}

	fn fmt_debug(&mut self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
		// Note: Start with a newline, since we're a multi-line output
		f.pad("\n")?;

		let occupancy = self.victim_queue.occupancy();
		let capacity = self.geometry.num_fast_slots();
		let occupancy_percentage = 100.0 * (occupancy as f64 / capacity as f64);
		writeln!(f, "Fast slots: {occupancy} / {capacity} ({occupancy_percentage:.2}%)")?;

		let level_lens = (0..self.multi_queue.levels())
			.map(|level| self.multi_queue.level_len(level))
			.join(" / ");
		writeln!(f, "Tracked lines: {} ({level_lens})", self.multi_queue.len())?;

		let ref_counts = self
			.multi_queue
			.iter()
			.map(|descriptor| descriptor.ref_count() as f64)
			.collect::<average::Variance>();
		let (min_ref_count, max_ref_count) = self
			.multi_queue
			.iter()
			.map(Descriptor::ref_count)
			.minmax()
			.into_option()
			.unwrap_or((0, 0));
		writeln!(
			f,
			"Average reference count: {:.4} ± {:.4} ({min_ref_count}..={max_ref_count})",
			ref_counts.mean(),
			ref_counts.error()
		)?;

		let slot_ref_counts = self
			.victim_queue
			.slots()
			.iter()
			.map(|slot| slot.descriptor().ref_count() as f64)
			.collect::<average::Variance>();
		writeln!(
			f,
			"Average fast slot reference count: {:.4} ± {:.4}",
			slot_ref_counts.mean(),
			slot_ref_counts.error()
		)?;

		Ok(())
	}
}

/// Configuration
#[derive(Clone, Copy, Debug)]
pub struct Config {
	/// Migration cost, in cycles
	pub migration_cost: u64,

	/// Number of levels
	pub mq_length: usize,

	/// Cycles a line may go untouched before being demoted
	pub life_time: u64,

	/// Level at which accessed lines are migrated
	pub hot_level: usize,
}

#[cfg(test)]
mod tests {
	use {
		super::*,
		crate::{
			addr::CacheLine,
			sim::Policy,
			tier_trace::TierOp,
			trace::{AccessKind, Record},
		},
	};

	/// 64B lines, 4 fast slots, 16KiB slow tier
	fn policy(hot_level: usize) -> Aging {
		let geometry = Geometry::new(64, 256, 16384).unwrap();
		Aging::new(geometry, Config {
			migration_cost: 2,
			mq_length: 4,
			life_time: 1000,
			hot_level,
		})
	}

	fn run(policy: &mut Aging, executor: &mut MigrationExecutor, addr: u64, kind: AccessKind, cycle: u64) -> Vec<TierOp> {
		let mut ops = vec![];
		let cycle = executor.sync(cycle);
		policy.advance(cycle);

		let access = Access {
			record:     Record { addr, kind, cycle },
			decomposed: policy.geometry.decompose(addr),
		};
		policy.handle_access(access, executor, &mut ops).unwrap();
		ops
	}

	#[test]
	fn hot_level_0_migrates_immediately() {
		let mut policy = self::policy(0);
		let mut executor = MigrationExecutor::new();

		let ops = self::run(&mut policy, &mut executor, 0x1000, AccessKind::Write, 0);
		assert_eq!(ops, [TierOp {
			tier:  Tier::Fast,
			addr:  0,
			kind:  AccessKind::Write,
			cycle: 0,
		}]);
		assert_eq!(policy.fast_occupancy(), 1);
		assert!(policy.multi_queue().is_empty());

		let ops = self::run(&mut policy, &mut executor, 0x1010, AccessKind::Read, 5);
		assert_eq!(ops, [TierOp {
			tier:  Tier::Fast,
			addr:  0,
			kind:  AccessKind::Read,
			cycle: 5,
		}]);
	}

	#[test]
	fn cold_lines_stay_in_slow_tier() {
		let mut policy = self::policy(2);
		let mut executor = MigrationExecutor::new();

		let ops = self::run(&mut policy, &mut executor, 0x1000, AccessKind::Read, 0);
		assert_eq!(ops.len(), 1);
		assert_eq!(ops[0].tier, Tier::Slow);
		assert_eq!(ops[0].addr, 0x1000);
		assert_eq!(policy.multi_queue().len(), 1);
	}

	#[test]
	fn sweeps_promote_until_hot() {
		let mut policy = self::policy(1);
		let mut executor = MigrationExecutor::new();

		// Every spaced access counts as a reference, and sweeps
		// promote the line to level 1 once it has 3 references
		let mut tiers = vec![];
		for cycle in [0, 10, 20, 30, 40] {
			let ops = self::run(&mut policy, &mut executor, 0x1000, AccessKind::Read, cycle);
			tiers.push(ops.last().map(|op| op.tier));
		}

		assert_eq!(tiers, [
			Some(Tier::Slow),
			Some(Tier::Slow),
			Some(Tier::Slow),
			Some(Tier::Fast),
			Some(Tier::Fast)
		]);
		assert_eq!(executor.statistics().total_migrations(), 1);
	}

	#[test]
	fn victims_are_replaced_round_robin() {
		let mut policy = self::policy(0);
		let mut executor = MigrationExecutor::new();

		// Fill all 4 slots, then a 5th line evicts the first one
		for line in 0..5 {
			self::run(&mut policy, &mut executor, 0x1000 + line * 64, AccessKind::Write, 0);
		}

		assert_eq!(policy.victim_queue().find(CacheLine::new(0x1000 / 64)), None);
		assert!(policy.victim_queue().find(CacheLine::new(0x1000 / 64 + 4)).is_some());
		assert_eq!(
			policy.victim_queue().slots()[0].resident(),
			Some(CacheLine::new(0x1000 / 64 + 4))
		);

		let statistics = executor.statistics();
		assert_eq!(statistics.installs(), 4);
		assert_eq!(statistics.swaps(), 1);
	}

	#[test]
	fn swap_writes_back_evicted_line() {
		let mut policy = self::policy(0);
		let mut executor = MigrationExecutor::new();
		for line in 0..4 {
			self::run(&mut policy, &mut executor, line * 64, AccessKind::Write, 0);
		}

		let start = executor.cycle();
		let ops = self::run(&mut policy, &mut executor, 0x2008, AccessKind::Read, 0);
		assert_eq!(ops, [
			TierOp {
				tier:  Tier::Slow,
				addr:  0x2008,
				kind:  AccessKind::Read,
				cycle: start,
			},
			TierOp {
				tier:  Tier::Fast,
				addr:  0,
				kind:  AccessKind::Read,
				cycle: start,
			},
			TierOp {
				tier:  Tier::Slow,
				addr:  0,
				kind:  AccessKind::Write,
				cycle: start + 1,
			},
			TierOp {
				tier:  Tier::Fast,
				addr:  0,
				kind:  AccessKind::Write,
				cycle: start + 1,
			},
		]);
	}

	#[test]
	fn idle_lines_age_out() {
		let mut policy = self::policy(3);
		let mut executor = MigrationExecutor::new();
		self::run(&mut policy, &mut executor, 0x1000, AccessKind::Read, 0);
		assert_eq!(policy.multi_queue().len(), 1);

		policy.advance(2000);
		assert!(policy.multi_queue().is_empty());
	}
}
