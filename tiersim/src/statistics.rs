//! Statistics

// Imports
use {
	crate::{addr::CacheLine, tier_trace::Tier},
	std::collections::HashMap,
};

/// Statistics
#[derive(Clone, Debug)]
pub struct Statistics {
	/// Accesses served by the fast tier without migrating
	fast_hits: u64,

	/// Accesses served by the slow tier without migrating
	slow_accesses: u64,

	/// Migrations into an empty fast slot
	installs: u64,

	/// Migrations that evicted a resident line
	swaps: u64,

	// Operations emitted per tier
	fast_ops: u64,
	slow_ops: u64,

	/// Migrations, by the cache line that was moved into the fast tier
	migrations: HashMap<CacheLine, Vec<Migration>>,
}

impl Statistics {
	/// Creates new, empty, statistics
	pub fn new() -> Self {
		Self {
			fast_hits:     0,
			slow_accesses: 0,
			installs:      0,
			swaps:         0,
			fast_ops:      0,
			slow_ops:      0,
			migrations:    HashMap::new(),
		}
	}

	/// Registers an access that didn't migrate anything
	pub fn register_access(&mut self, tier: Tier) {
		match tier {
			Tier::Fast => self.fast_hits += 1,
			Tier::Slow => self.slow_accesses += 1,
		}
	}

	/// Registers an operation emitted to a tier
	pub fn register_op(&mut self, tier: Tier) {
		match tier {
			Tier::Fast => self.fast_ops += 1,
			Tier::Slow => self.slow_ops += 1,
		}
	}

	/// Registers a migration of `cache_line` into the fast tier
	pub fn register_migration(&mut self, cache_line: CacheLine, migration: Migration) {
		match migration.evicted_addr {
			Some(_) => self.swaps += 1,
			None => self.installs += 1,
		}
		self.migrations.entry(cache_line).or_default().push(migration);
	}

	/// Returns the number of fast tier hits
	pub fn fast_hits(&self) -> u64 {
		self.fast_hits
	}

	/// Returns the number of slow tier accesses
	pub fn slow_accesses(&self) -> u64 {
		self.slow_accesses
	}

	/// Returns the number of migrations into empty slots
	pub fn installs(&self) -> u64 {
		self.installs
	}

	/// Returns the number of swaps
	pub fn swaps(&self) -> u64 {
		self.swaps
	}

	/// Returns the total number of migrations
	pub fn total_migrations(&self) -> u64 {
		self.installs + self.swaps
	}

	/// Returns the number of operations emitted to `tier`
	pub fn ops(&self, tier: Tier) -> u64 {
		match tier {
			Tier::Fast => self.fast_ops,
			Tier::Slow => self.slow_ops,
		}
	}

	/// Returns all migrations
	pub fn migrations(&self) -> &HashMap<CacheLine, Vec<Migration>> {
		&self.migrations
	}
}

impl Default for Statistics {
	fn default() -> Self {
		Self::new()
	}
}

/// A migration into the fast tier
#[derive(Clone, Copy, Debug)]
pub struct Migration {
	/// Cycle at which the migration started
	pub cycle: u64,

	/// Fast tier address the line was installed at
	pub fast_addr: u64,

	/// Slow tier address of the evicted line, if any
	pub evicted_addr: Option<u64>,
}
