//! Migration executor.
//!
//! Owns the simulated output clock and turns placement decisions into tier
//! operations. Operations emitted together in one group share a cycle, and
//! each group advances the clock by one.

// Imports
use {
	crate::{
		addr::CacheLine,
		statistics::{self, Statistics},
		tier_trace::{Tier, TierOp, TierSink},
		trace::AccessKind,
	},
	anyhow::Context,
};

/// Migration executor
#[derive(Debug)]
pub struct MigrationExecutor {
	/// Current output cycle
	cycle: u64,

	/// Statistics
	statistics: Statistics,
}

impl MigrationExecutor {
	/// Creates an executor starting at cycle 0
	pub fn new() -> Self {
		Self {
			cycle:      0,
			statistics: Statistics::new(),
		}
	}

	/// Returns the current output cycle
	pub fn cycle(&self) -> u64 {
		self.cycle
	}

	/// Catches the output clock up to `input_cycle`.
	///
	/// The clock never moves backwards, so gaps left by earlier migrations are absorbed.
	pub fn sync(&mut self, input_cycle: u64) -> u64 {
		self.cycle = self.cycle.max(input_cycle);
		self.cycle
	}

	/// Performs an access that doesn't migrate anything.
	pub fn access(
		&mut self,
		sink: &mut dyn TierSink,
		tier: Tier,
		addr: u64,
		kind: AccessKind,
	) -> Result<(), anyhow::Error> {
		self.emit_group(sink, &[(tier, addr, kind)])?;
		self.statistics.register_access(tier);

		Ok(())
	}

	/// Migrates a line into the fast tier, evicting the resident line, if any.
	///
	/// Returns the number of operation groups emitted (i.e. cycles spent).
	pub fn migrate(&mut self, sink: &mut dyn TierSink, request: MigrationRequest) -> Result<u64, anyhow::Error> {
		let start_cycle = self.cycle;
		let MigrationRequest {
			cache_line,
			addr,
			kind,
			fast_addr,
			evicted_addr,
		} = request;
		tracing::trace!(?cache_line, addr, ?kind, fast_addr, ?evicted_addr, "Migrating");

		let groups = match evicted_addr {
			// Empty slot: reads must fetch the line before installing it,
			// writes supply the data themselves.
			None => {
				let mut groups = 0;
				if kind == AccessKind::Read {
					self.emit_group(sink, &[(Tier::Slow, addr, AccessKind::Read)])
						.context("Unable to fetch line from slow tier")?;
					groups += 1;
				}
				self.emit_group(sink, &[(Tier::Fast, fast_addr, AccessKind::Write)])
					.context("Unable to install line in fast tier")?;

				groups + 1
			},

			// Occupied slot: drain the resident line (reading the new line concurrently
			// on reads), then write both lines back to their new tiers.
			Some(evicted_addr) => {
				let read_res = match kind {
					AccessKind::Write => self.emit_group(sink, &[(Tier::Fast, fast_addr, AccessKind::Read)]),
					AccessKind::Read => self.emit_group(sink, &[
						(Tier::Slow, addr, AccessKind::Read),
						(Tier::Fast, fast_addr, AccessKind::Read),
					]),
				};
				read_res.context("Unable to read lines being swapped")?;
				self.emit_group(sink, &[
					(Tier::Slow, evicted_addr, AccessKind::Write),
					(Tier::Fast, fast_addr, AccessKind::Write),
				])
				.context("Unable to write back swapped lines")?;

				2
			},
		};

		self.statistics.register_migration(cache_line, statistics::Migration {
			cycle: start_cycle,
			fast_addr,
			evicted_addr,
		});

		Ok(groups)
	}

	/// Returns the statistics
	pub fn statistics(&self) -> &Statistics {
		&self.statistics
	}

	/// Emits a group of operations at the current cycle, then advances it.
	///
	/// # Errors
	/// Returns an error, without emitting anything, if the cycle would overflow.
	fn emit_group(&mut self, sink: &mut dyn TierSink, ops: &[(Tier, u64, AccessKind)]) -> Result<(), anyhow::Error> {
		let next_cycle = self
			.cycle
			.checked_add(1)
			.with_context(|| format!("Output cycle overflowed past {}", self.cycle))?;

		for &(tier, addr, kind) in ops {
			sink.emit(TierOp {
				tier,
				addr,
				kind,
				cycle: self.cycle,
			})?;
			self.statistics.register_op(tier);
		}
		self.cycle = next_cycle;

		Ok(())
	}
}

impl Default for MigrationExecutor {
	fn default() -> Self {
		Self::new()
	}
}

/// Request to migrate a line into the fast tier
#[derive(Clone, Copy, Debug)]
pub struct MigrationRequest {
	/// Line being migrated
	pub cache_line: CacheLine,

	/// Address of the access that triggered the migration
	pub addr: u64,

	/// Kind of the access that triggered the migration
	pub kind: AccessKind,

	/// Fast tier address the line will be installed at
	pub fast_addr: u64,

	/// Slow tier address of the line currently occupying `fast_addr`, if any
	pub evicted_addr: Option<u64>,
}

#[cfg(test)]
mod tests {
	use super::*;

	fn op(tier: Tier, addr: u64, kind: AccessKind, cycle: u64) -> TierOp {
		TierOp {
			tier,
			addr,
			kind,
			cycle,
		}
	}

	fn request(kind: AccessKind, evicted_addr: Option<u64>) -> MigrationRequest {
		MigrationRequest {
			cache_line: CacheLine::new(0x81),
			addr: 0x2040,
			kind,
			fast_addr: 0x40,
			evicted_addr,
		}
	}

	#[test]
	fn sync_never_goes_backwards() {
		let mut executor = MigrationExecutor::new();
		assert_eq!(executor.sync(10), 10);
		assert_eq!(executor.sync(4), 10);
		assert_eq!(executor.sync(12), 12);
	}

	#[test]
	fn cycle_overflow_is_an_error() {
		let mut executor = MigrationExecutor::new();
		let mut ops = vec![];
		executor.sync(u64::MAX - 1);
		executor
			.access(&mut ops, Tier::Fast, 0x40, AccessKind::Read)
			.unwrap();
		assert_eq!(executor.cycle(), u64::MAX);

		assert!(executor
			.migrate(&mut ops, self::request(AccessKind::Read, None))
			.is_err());
		assert!(executor.access(&mut ops, Tier::Slow, 0x40, AccessKind::Read).is_err());
		assert_eq!(ops, [self::op(Tier::Fast, 0x40, AccessKind::Read, u64::MAX - 1)]);
		assert_eq!(executor.cycle(), u64::MAX);
	}

	#[test]
	fn plain_access_costs_one_cycle() {
		let mut executor = MigrationExecutor::new();
		let mut ops = vec![];
		executor.sync(5);
		executor
			.access(&mut ops, Tier::Slow, 0x1234, AccessKind::Write)
			.unwrap();

		assert_eq!(ops, [op(Tier::Slow, 0x1234, AccessKind::Write, 5)]);
		assert_eq!(executor.cycle(), 6);
		assert_eq!(executor.statistics().slow_accesses(), 1);
	}

	#[test]
	fn install_on_write_costs_one_group() {
		let mut executor = MigrationExecutor::new();
		let mut ops = vec![];
		let groups = executor.migrate(&mut ops, request(AccessKind::Write, None)).unwrap();

		assert_eq!(groups, 1);
		assert_eq!(executor.cycle(), 1);
		assert_eq!(ops, [op(Tier::Fast, 0x40, AccessKind::Write, 0)]);
	}

	#[test]
	fn install_on_read_fetches_first() {
		let mut executor = MigrationExecutor::new();
		let mut ops = vec![];
		let groups = executor.migrate(&mut ops, request(AccessKind::Read, None)).unwrap();

		assert_eq!(groups, 2);
		assert_eq!(executor.cycle(), 2);
		assert_eq!(ops, [
			op(Tier::Slow, 0x2040, AccessKind::Read, 0),
			op(Tier::Fast, 0x40, AccessKind::Write, 1),
		]);
		assert_eq!(executor.statistics().installs(), 1);
	}

	#[test]
	fn swap_on_write() {
		let mut executor = MigrationExecutor::new();
		let mut ops = vec![];
		let groups = executor
			.migrate(&mut ops, request(AccessKind::Write, Some(0x1040)))
			.unwrap();

		assert_eq!(groups, 2);
		assert_eq!(ops, [
			op(Tier::Fast, 0x40, AccessKind::Read, 0),
			op(Tier::Slow, 0x1040, AccessKind::Write, 1),
			op(Tier::Fast, 0x40, AccessKind::Write, 1),
		]);
	}

	#[test]
	fn swap_on_read_overlaps_reads() {
		let mut executor = MigrationExecutor::new();
		let mut ops = vec![];
		executor.sync(100);
		let groups = executor
			.migrate(&mut ops, request(AccessKind::Read, Some(0x1040)))
			.unwrap();

		assert_eq!(groups, 2);
		assert_eq!(executor.cycle(), 102);
		assert_eq!(ops, [
			op(Tier::Slow, 0x2040, AccessKind::Read, 100),
			op(Tier::Fast, 0x40, AccessKind::Read, 100),
			op(Tier::Slow, 0x1040, AccessKind::Write, 101),
			op(Tier::Fast, 0x40, AccessKind::Write, 101),
		]);

		let statistics = executor.statistics();
		assert_eq!(statistics.swaps(), 1);
		assert_eq!(statistics.ops(Tier::Fast), 2);
		assert_eq!(statistics.ops(Tier::Slow), 2);
		assert_eq!(statistics.migrations()[&CacheLine::new(0x81)].len(), 1);
	}
}
