//! Simulator

// Imports
use {
	crate::{
		addr::{Decomposed, Geometry},
		migration::MigrationExecutor,
		tier_trace::TierSink,
		trace::{self, TraceReader},
	},
	anyhow::Context,
	std::{
		fmt,
		io,
		ops::Range,
		time::{Duration, Instant},
	},
};

/// Simulator
#[derive(Debug)]
pub struct Simulator {
	/// Geometry
	geometry: Geometry,

	/// Debug output period
	///
	/// Interval in which to output debug output for the policy
	debug_output_period: Duration,
}

impl Simulator {
	/// Creates a new simulator
	pub fn new(geometry: Geometry, debug_output_period: Duration) -> Self {
		Self {
			geometry,
			debug_output_period,
		}
	}

	/// Replays all records from `trace_reader` through `policy`.
	///
	/// Tier operations are emitted to `sink`, with `executor` keeping the output clock.
	pub fn run<P: Policy + ?Sized>(
		&mut self,
		trace_reader: &mut TraceReader<impl io::BufRead>,
		policy: &mut P,
		executor: &mut MigrationExecutor,
		sink: &mut dyn TierSink,
	) -> Result<RunOutput, anyhow::Error> {
		// Note: We start in the past so that we output right away at the start
		let mut last_debug_time = Instant::now()
			.checked_sub(self.debug_output_period)
			.unwrap_or_else(Instant::now);

		let mut records = 0;
		let mut first_time = None;
		let mut last_time = None;
		while let Some(record) = trace_reader.read_next().context("Unable to read next record")? {
			let line_number = trace_reader.line_number();
			anyhow::ensure!(
				self.geometry.contains(record.addr),
				"Address {:#x} on line {line_number} lies outside of the slow tier",
				record.addr
			);

			// Note: The output clock can absorb out-of-order records, but they're
			//       likely a broken trace, so warn about them.
			if let Some(last_time) = last_time {
				if record.cycle < last_time {
					tracing::warn!(line_number, cycle = record.cycle, last_time, "Record is out of order");
				}
			}
			first_time.get_or_insert(record.cycle);
			last_time = Some(record.cycle);

			// Catch up the clock and let the policy do any housekeeping until now
			let cycle = executor.sync(record.cycle);
			policy.advance(cycle);

			let access = Access {
				record,
				decomposed: self.geometry.decompose(record.addr),
			};
			tracing::trace!(?access, cycle, "Handling access");
			policy
				.handle_access(access, executor, sink)
				.with_context(|| format!("Unable to handle access on line {line_number}"))?;
			records += 1;

			// Then show debug output, if it's been long enough
			let cur_time = Instant::now();
			if cur_time.duration_since(last_debug_time) >= self.debug_output_period {
				tracing::info!(
					"[{records} records, cycle {}] Debug: {}",
					executor.cycle(),
					tiersim_util::DisplayWrapper::new(|f| policy.fmt_debug(f))
				);
				last_debug_time = cur_time;
			}
		}

		Ok(RunOutput {
			records,
			time_span: first_time.zip(last_time).map(|(first, last)| first..last.saturating_add(1)),
			final_cycle: executor.cycle(),
		})
	}
}

/// Output for [`Simulator::run`]
#[derive(Clone, Debug)]
pub struct RunOutput {
	/// Records replayed
	pub records: u64,

	/// Input cycle span
	pub time_span: Option<Range<u64>>,

	/// Output cycle after the last operation
	pub final_cycle: u64,
}

/// Placement policy
pub trait Policy {
	/// Handles an access, emitting its tier operations through `executor`
	fn handle_access(
		&mut self,
		access: Access,
		executor: &mut MigrationExecutor,
		sink: &mut dyn TierSink,
	) -> Result<(), anyhow::Error>;

	/// Performs any per-cycle housekeeping up to (and including) `cycle`
	fn advance(&mut self, _cycle: u64) {}

	/// Returns the number of fast slots currently holding a line
	fn fast_occupancy(&self) -> u64;

	/// Formats debug output to `f`.
	fn fmt_debug(&mut self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error>;
}

/// Access
#[derive(Clone, Copy, Debug)]
pub struct Access {
	/// Record that originated this access
	pub record: trace::Record,

	/// Decomposed address
	pub decomposed: Decomposed,
}
