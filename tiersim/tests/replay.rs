//! End-to-end trace replays

// Imports
use {
	std::{io, time::Duration},
	tiersim::{config::Config, data::Data, MigrationExecutor, Simulator, TierTraces, TraceReader},
};

/// Output of replaying a trace
struct Replay {
	fast:     String,
	slow:     String,
	executor: MigrationExecutor,
	data:     Data,
}

fn replay(config: &str, trace: &str) -> Result<Replay, anyhow::Error> {
	let config = serde_json::from_str::<Config>(config)?;
	config.validate()?;
	let geometry = config.geometry()?;

	let mut sim = Simulator::new(geometry, Duration::from_secs(3600));
	let mut policy = config.build_policy(geometry)?;
	let mut executor = MigrationExecutor::new();
	let mut reader = TraceReader::new(io::Cursor::new(trace));
	let mut traces = TierTraces::new(vec![], vec![]);

	let run_output = sim.run(&mut reader, &mut *policy, &mut executor, &mut traces)?;
	let (fast, slow) = traces.finish()?;
	let data = Data::new(run_output, executor.statistics(), policy.fast_occupancy());

	Ok(Replay {
		fast: String::from_utf8(fast)?,
		slow: String::from_utf8(slow)?,
		executor,
		data,
	})
}

/// 4 fast slots, 4 candidates per slot
const COUNTER_SWAP_CONFIG: &str = r#"{
	"geometry": { "cache_line_size": 64, "fast_capacity": 256, "slow_capacity": 1024 },
	"policy": { "kind": "counter-swap", "promotion_threshold": 2 }
}"#;

#[test]
fn counter_swap_installs_then_swaps() {
	let trace = "\
0x00000100 READ 10
0x00000104 READ 20
0x00000108 WRITE 21
0x00000200 WRITE 30
0x00000200 WRITE 31
0x00000104 READ 32
";
	let replay = self::replay(COUNTER_SWAP_CONFIG, trace).unwrap();

	assert_eq!(
		replay.fast,
		"\
0x00000000 WRITE 21
0x00000000 WRITE 22
0x00000000 READ 31
0x00000000 WRITE 32
"
	);
	assert_eq!(
		replay.slow,
		"\
0x00000100 READ 10
0x00000104 READ 20
0x00000200 WRITE 30
0x00000100 WRITE 32
0x00000104 READ 33
"
	);

	let statistics = replay.executor.statistics();
	assert_eq!(statistics.total_migrations(), 2);
	assert_eq!(statistics.installs(), 1);
	assert_eq!(statistics.swaps(), 1);

	assert_eq!(replay.data.records, 6);
	assert_eq!(replay.data.time_span, Some(10..33));
	assert_eq!(replay.data.final_cycle, 34);
	assert_eq!(replay.data.fast_occupancy, 1);
	assert_eq!(replay.data.accesses.fast_hits, 1);
	assert_eq!(replay.data.accesses.slow_accesses, 3);
	assert_eq!(replay.data.accesses.fast_ops, 4);
	assert_eq!(replay.data.accesses.slow_ops, 5);

	let swaps = &replay.data.migrations.migrations[&(0x200 / 64)];
	assert_eq!(swaps.len(), 1);
	assert_eq!(swaps[0].cycle, 31);
	assert_eq!(swaps[0].evicted_addr, Some(0x100));
}

#[test]
fn aging_migrates_hot_lines() {
	let config = r#"{
		"geometry": { "cache_line_size": 64, "fast_capacity": 256, "slow_capacity": 1024 },
		"policy": { "kind": "aging", "migration_cost": 2, "mq_length": 4, "life_time": 1000, "hot_level": 0 }
	}"#;
	let trace = "\
0x00000000 WRITE 0
0x00000040 READ 5
0x00000048 READ 7
";
	let replay = self::replay(config, trace).unwrap();

	assert_eq!(
		replay.fast,
		"\
0x00000000 WRITE 0
0x00000040 WRITE 6
0x00000040 READ 7
"
	);
	assert_eq!(replay.slow, "0x00000040 READ 5\n");
	assert_eq!(replay.data.fast_occupancy, 2);
	assert_eq!(replay.data.migrations.installs, 2);
}

#[test]
fn empty_trace_produces_nothing() {
	let replay = self::replay(COUNTER_SWAP_CONFIG, "").unwrap();
	assert!(replay.fast.is_empty());
	assert!(replay.slow.is_empty());
	assert_eq!(replay.data.records, 0);
	assert_eq!(replay.data.time_span, None);
}

#[test]
fn out_of_range_address_is_fatal() {
	let err = match self::replay(COUNTER_SWAP_CONFIG, "0x00000100 READ 1\n0x00000400 READ 2\n") {
		Ok(_) => panic!("Replay should have failed"),
		Err(err) => format!("{err:#}"),
	};
	assert!(err.contains("line 2"), "Unexpected error: {err}");
	assert!(err.contains("outside of the slow tier"), "Unexpected error: {err}");
}

#[test]
fn cycle_overflow_is_fatal() {
	let err = match self::replay(COUNTER_SWAP_CONFIG, "0x40 READ 18446744073709551615\n") {
		Ok(_) => panic!("Replay should have failed"),
		Err(err) => format!("{err:#}"),
	};
	assert!(err.contains("line 1"), "Unexpected error: {err}");
	assert!(err.contains("Output cycle overflowed"), "Unexpected error: {err}");
}

#[test]
fn malformed_line_reports_line_number() {
	let err = match self::replay(COUNTER_SWAP_CONFIG, "0x00000100 READ 1\nnot a record\n") {
		Ok(_) => panic!("Replay should have failed"),
		Err(err) => format!("{err:#}"),
	};
	assert!(err.contains("Unable to parse line 2"), "Unexpected error: {err}");
}
