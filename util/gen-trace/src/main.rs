//! Generates synthetic memory access traces for `tiersim`

// Imports
use {
	anyhow::Context,
	clap::Parser,
	rand::{rngs::StdRng, Rng, SeedableRng},
	std::{
		fs,
		io::{self, BufWriter, Write},
		path::PathBuf,
	},
	tiersim::{tier_trace::TierTraceWriter, trace::AccessKind},
};

fn main() -> Result<(), anyhow::Error> {
	let args = Args::parse();
	anyhow::ensure!(args.cache_line_size.is_power_of_two(), "Cache line size must be a power of two");
	anyhow::ensure!(args.lines != 0, "Must generate over at least 1 line");
	anyhow::ensure!(args.cycle_step != 0, "Cycle step must be non-zero");
	anyhow::ensure!(
		(0.0..=1.0).contains(&args.write_ratio),
		"Write ratio must be within 0..=1, found {}",
		args.write_ratio
	);
	anyhow::ensure!(
		(0.0..=1.0).contains(&args.hot_probability),
		"Hot probability must be within 0..=1, found {}",
		args.hot_probability
	);

	let writer: Box<dyn Write> = match &args.output {
		Some(output) => Box::new(fs::File::create(output).with_context(|| format!("Unable to create {output:?}"))?),
		None => Box::new(io::stdout().lock()),
	};
	let mut writer = TierTraceWriter::new(BufWriter::new(writer));

	let mut rng = match args.seed {
		Some(seed) => StdRng::seed_from_u64(seed),
		None => StdRng::from_entropy(),
	};

	// Note: The hot set always covers at least a single line.
	let hot_lines = ((args.lines as f64 * args.hot_fraction) as u64).clamp(1, args.lines);
	for idx in 0..args.records {
		let line = match args.pattern {
			Pattern::Sequential => idx % args.lines,
			Pattern::Uniform => rng.gen_range(0..args.lines),
			Pattern::HotSet => match rng.gen_bool(args.hot_probability) {
				true => rng.gen_range(0..hot_lines),
				false => rng.gen_range(0..args.lines),
			},
		};

		let offset = rng.gen_range(0..args.cache_line_size);
		let addr = args.base_addr + line * args.cache_line_size + offset;
		let kind = match rng.gen_bool(args.write_ratio) {
			true => AccessKind::Write,
			false => AccessKind::Read,
		};

		writer
			.write(addr, kind, idx * args.cycle_step)
			.context("Unable to write record")?;
	}

	writer.finish().context("Unable to finish trace")?;

	Ok(())
}

/// Arguments
#[derive(Debug)]
#[derive(clap::Parser)]
struct Args {
	/// Output file.
	///
	/// If not specified, the trace is written to stdout.
	#[clap(long = "output", short = 'o')]
	output: Option<PathBuf>,

	/// Access pattern
	#[clap(long = "pattern", value_enum, default_value_t = Pattern::HotSet)]
	pattern: Pattern,

	/// Number of records
	#[clap(long = "records", default_value_t = 100_000)]
	records: u64,

	/// Number of distinct lines accessed
	#[clap(long = "lines", default_value_t = 4096)]
	lines: u64,

	/// Cache line size
	#[clap(long = "cache-line-size", default_value_t = 64)]
	cache_line_size: u64,

	/// Address of the first line
	#[clap(long = "base-addr", default_value_t = 0)]
	base_addr: u64,

	/// Cycles between records
	#[clap(long = "cycle-step", default_value_t = 10)]
	cycle_step: u64,

	/// Fraction of accesses that are writes
	#[clap(long = "write-ratio", default_value_t = 0.3)]
	write_ratio: f64,

	/// Fraction of the lines making up the hot set
	#[clap(long = "hot-fraction", default_value_t = 0.05)]
	hot_fraction: f64,

	/// Probability of an access going to the hot set
	#[clap(long = "hot-probability", default_value_t = 0.9)]
	hot_probability: f64,

	/// Random seed
	#[clap(long = "seed")]
	seed: Option<u64>,
}

/// Access pattern
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[derive(clap::ValueEnum)]
enum Pattern {
	/// Lines in order, wrapping around
	Sequential,

	/// Uniformly random lines
	Uniform,

	/// Mostly lines from a small hot set
	HotSet,
}
