//! Two-tier memory controller simulator (`tiersim`)
//!
//! Replays a trace of memory accesses, deciding per access whether its cache
//! line lives in the small fast tier or the large slow tier, and emits the
//! resulting per-tier access traces, including the cost of migrations.

// Modules
pub mod addr;
pub mod config;
pub mod data;
pub mod migration;
pub mod policies;
pub mod sim;
pub mod statistics;
pub mod tier_trace;
pub mod trace;

// Exports
pub use self::{
	addr::Geometry,
	migration::MigrationExecutor,
	sim::{Policy, Simulator},
	tier_trace::{TierSink, TierTraces},
	trace::TraceReader,
};
