//! Two-tier memory controller simulator (`tiersim`)

// Modules
mod args;

// Imports
use {
	self::args::{Args, OutputFormat},
	anyhow::Context,
	clap::Parser,
	std::{
		fs,
		io::{BufReader, BufWriter},
		path::{Path, PathBuf},
		time::Duration,
	},
	tiersim::{config::Config, data, tier_trace::Tier, MigrationExecutor, Simulator, TierTraces, TraceReader},
	tiersim_util::logger,
};

fn main() -> Result<(), anyhow::Error> {
	// Get arguments
	let args = Args::parse();
	logger::pre_init::debug(format!("Args: {args:?}"));

	// Initialize logging
	logger::init(args.log_file.as_deref(), args.log_file_append);

	// Read the config file, or use the default
	let config = match &args.config_file {
		Some(config_file) => {
			let config_file = fs::File::open(config_file)
				.with_context(|| format!("Unable to open config file {config_file:?}"))?;
			serde_json::from_reader::<_, Config>(BufReader::new(config_file)).context("Unable to parse config file")?
		},
		None => Config::default(),
	};
	config.validate().context("Invalid config")?;
	tracing::debug!(?config, "Loaded config");
	let geometry = config.geometry().context("Unable to build geometry")?;

	// Open all files before building any simulation state
	let trace_file = fs::File::open(&args.trace_file)
		.with_context(|| format!("Unable to open trace file {:?}", args.trace_file))?;
	let mut trace_reader = TraceReader::new(BufReader::new(trace_file));

	let fast_trace_path = args
		.fast_trace_file
		.clone()
		.unwrap_or_else(|| self::tier_trace_path(&args.trace_file, "RL"));
	let slow_trace_path = args
		.slow_trace_file
		.clone()
		.unwrap_or_else(|| self::tier_trace_path(&args.trace_file, "LP"));
	let fast_trace_file = fs::File::create(&fast_trace_path)
		.with_context(|| format!("Unable to create fast tier trace file {fast_trace_path:?}"))?;
	let slow_trace_file = fs::File::create(&slow_trace_path)
		.with_context(|| format!("Unable to create slow tier trace file {slow_trace_path:?}"))?;
	let mut tier_traces = TierTraces::new(BufWriter::new(fast_trace_file), BufWriter::new(slow_trace_file));

	// Run the simulator
	let mut sim = Simulator::new(geometry, Duration::from_secs_f64(config.debug_output_period_secs));
	let mut policy = config.build_policy(geometry).context("Unable to build policy")?;
	let mut executor = MigrationExecutor::new();
	tracing::info!(trace_file = ?args.trace_file, "Started simulation");
	let run_output = sim
		.run(&mut trace_reader, &mut *policy, &mut executor, &mut tier_traces)
		.with_context(|| format!("Unable to simulate trace {:?}", args.trace_file))?;
	tier_traces.finish().context("Unable to finish tier traces")?;

	let statistics = executor.statistics();
	tracing::info!(
		records = run_output.records,
		final_cycle = run_output.final_cycle,
		migrations = statistics.total_migrations(),
		swaps = statistics.swaps(),
		fast_ops = statistics.ops(Tier::Fast),
		slow_ops = statistics.ops(Tier::Slow),
		fast_occupancy = policy.fast_occupancy(),
		"Finished simulation"
	);

	if let Some(output_path) = &args.output_file {
		let data = data::Data::new(run_output, statistics, policy.fast_occupancy());
		let output_file = fs::File::create(output_path).context("Unable to create output file")?;
		let mut output_file = BufWriter::new(output_file);
		match args.output_format {
			OutputFormat::Json => serde_json::to_writer(output_file, &data).context("Unable to write to output file")?,
			OutputFormat::Bincode => {
				bincode::encode_into_std_write(&data, &mut output_file, bincode::config::standard())
					.context("Unable to write to output file")?;
			},
		}
	}

	Ok(())
}

/// Returns the default tier trace path for `trace_path`, as `<stem>_<suffix>.trace`
fn tier_trace_path(trace_path: &Path, suffix: &str) -> PathBuf {
	let stem = trace_path
		.file_stem()
		.map_or_else(|| "trace".into(), |stem| stem.to_string_lossy());
	trace_path.with_file_name(format!("{stem}_{suffix}.trace"))
}
