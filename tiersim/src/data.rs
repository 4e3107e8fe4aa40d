//! Output data

// Imports
use {
	crate::{sim::RunOutput, statistics::Statistics, tier_trace::Tier},
	std::{collections::BTreeMap, ops::Range},
};

/// Output data
#[derive(Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[derive(bincode::Encode, bincode::Decode)]
pub struct Data {
	pub records:        u64,
	pub time_span:      Option<Range<u64>>,
	pub final_cycle:    u64,
	pub fast_occupancy: u64,
	pub accesses:       Accesses,
	pub migrations:     Migrations,
}

impl Data {
	/// Collects the output data of a run
	pub fn new(run_output: RunOutput, statistics: &Statistics, fast_occupancy: u64) -> Self {
		Self {
			records: run_output.records,
			time_span: run_output.time_span,
			final_cycle: run_output.final_cycle,
			fast_occupancy,
			accesses: Accesses {
				fast_hits:     statistics.fast_hits(),
				slow_accesses: statistics.slow_accesses(),
				fast_ops:      statistics.ops(Tier::Fast),
				slow_ops:      statistics.ops(Tier::Slow),
			},
			migrations: Migrations {
				installs:   statistics.installs(),
				swaps:      statistics.swaps(),
				migrations: statistics
					.migrations()
					.iter()
					.map(|(cache_line, migrations)| {
						let migrations = migrations
							.iter()
							.map(|migration| Migration {
								cycle:        migration.cycle,
								fast_addr:    migration.fast_addr,
								evicted_addr: migration.evicted_addr,
							})
							.collect();

						(cache_line.to_u64(), migrations)
					})
					.collect(),
			},
		}
	}
}

/// Access counts
#[derive(Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[derive(bincode::Encode, bincode::Decode)]
pub struct Accesses {
	pub fast_hits:     u64,
	pub slow_accesses: u64,
	pub fast_ops:      u64,
	pub slow_ops:      u64,
}

/// Migrations
#[derive(Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[derive(bincode::Encode, bincode::Decode)]
pub struct Migrations {
	pub installs: u64,
	pub swaps:    u64,

	// Note: We use a `BTreeMap` so the output is always sorted by cache line.
	pub migrations: BTreeMap<u64, Vec<Migration>>,
}

/// Migration
#[derive(Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[derive(bincode::Encode, bincode::Decode)]
pub struct Migration {
	pub cycle:        u64,
	pub fast_addr:    u64,
	pub evicted_addr: Option<u64>,
}
