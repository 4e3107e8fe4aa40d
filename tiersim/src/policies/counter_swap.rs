//! Counter-swap policy.
//!
//! Each fast slot is direct-mapped to a fixed set of slow-tier candidates,
//! which share a saturating counter. Sustained accesses to a non-resident
//! candidate push the counter up until it reaches the promotion threshold,
//! at which point that candidate is swapped into the fast slot.

// Modules
pub mod remap_table;

// Exports
pub use self::remap_table::{CounterFloor, Decision, RemapEntry, RemapTable};

// Imports
use {
	crate::{
		addr::Geometry,
		migration::{MigrationExecutor, MigrationRequest},
		sim::{self, Access},
		tier_trace::{Tier, TierSink},
	},
	anyhow::Context,
	itertools::Itertools,
	std::fmt,
};

/// Counter-swap policy
#[derive(Debug)]
pub struct CounterSwap {
	/// Geometry
	geometry: Geometry,

	/// Remap table
	remap_table: RemapTable,
}

impl CounterSwap {
	/// Creates the policy with an empty remap table
	pub fn new(geometry: Geometry, config: Config) -> Self {
		Self {
			geometry,
			remap_table: RemapTable::new(config.promotion_threshold, config.counter_floor),
		}
	}

	/// Returns the remap table
	pub fn remap_table(&self) -> &RemapTable {
		&self.remap_table
	}
}

impl sim::Policy for CounterSwap {
	fn handle_access(
		&mut self,
		access: Access,
		executor: &mut MigrationExecutor,
		sink: &mut dyn TierSink,
	) -> Result<(), anyhow::Error> {
		let Access { record, decomposed } = access;
		let fast_addr = self.geometry.translate(decomposed.remap_idx);

		match self.remap_table.observe(decomposed.remap_idx, decomposed.entry_idx) {
			Decision::Hit => executor
				.access(sink, Tier::Fast, fast_addr, record.kind)
				.context("Unable to access fast tier"),
			Decision::Miss => executor
				.access(sink, Tier::Slow, record.addr, record.kind)
				.context("Unable to access slow tier"),
			Decision::MigrateNow => {
				let geometry = self.geometry;
				let entry = self.remap_table.get_mut(decomposed.remap_idx);
				let evicted_addr = entry
					.resident()
					.map(|resident| geometry.reconstruct(decomposed.remap_idx, resident));

				tracing::trace!(?decomposed, prev_resident = ?entry.resident(), "Counter reached threshold");
				executor
					.migrate(sink, MigrationRequest {
						cache_line: decomposed.cache_line,
						addr: record.addr,
						kind: record.kind,
						fast_addr,
						evicted_addr,
					})
					.context("Unable to migrate line")?;
				entry.install(decomposed.entry_idx);

				Ok(())
			},
		}
	}

	fn fast_occupancy(&self) -> u64 {
		self.remap_table.occupancy()
	}

	fn fmt_debug(&mut self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
		// Note: Start with a newline, since we're a multi-line output
		f.pad("\n")?;

		let touched = self.remap_table.iter().len();
		let occupancy = self.remap_table.occupancy();
		let capacity = self.geometry.num_fast_slots();
		let occupancy_percentage = 100.0 * (occupancy as f64 / capacity as f64);
		writeln!(
			f,
			"Fast slots: {occupancy} / {capacity} ({occupancy_percentage:.2}%), {touched} touched"
		)?;

		let counters = self
			.remap_table
			.iter()
			.map(|(_, entry)| entry.counter() as f64)
			.collect::<average::Variance>();
		let (min_counter, max_counter) = self
			.remap_table
			.iter()
			.map(|(_, entry)| entry.counter())
			.minmax()
			.into_option()
			.unwrap_or((0, 0));
		writeln!(
			f,
			"Average counter: {:.4} ± {:.4} ({min_counter}..={max_counter})",
			counters.mean(),
			counters.error()
		)?;

		Ok(())
	}
}

/// Configuration
#[derive(Clone, Copy, Debug)]
pub struct Config {
	/// Counter value at which a migration is triggered
	pub promotion_threshold: i8,

	/// Lowest value the counter saturates at
	pub counter_floor: CounterFloor,
}
