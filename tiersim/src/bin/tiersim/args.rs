//! Arguments

// Imports
use std::path::PathBuf;

/// Arguments
#[derive(Debug)]
#[derive(clap::Parser)]
pub struct Args {
	/// Log file
	///
	/// Specifies a file to perform verbose logging to.
	/// You can use `RUST_LOG_FILE` to set filtering options
	#[clap(long = "log-file")]
	pub log_file: Option<PathBuf>,

	/// Whether to append to the log file
	#[clap(long = "log-file-append")]
	pub log_file_append: bool,

	/// Trace file
	pub trace_file: PathBuf,

	/// Config file
	///
	/// If not specified, the default configuration is used.
	#[clap(long = "config")]
	pub config_file: Option<PathBuf>,

	/// Fast tier trace output.
	///
	/// Defaults to `<trace>_RL.trace` next to the trace file.
	#[clap(long = "fast-trace")]
	pub fast_trace_file: Option<PathBuf>,

	/// Slow tier trace output.
	///
	/// Defaults to `<trace>_LP.trace` next to the trace file.
	#[clap(long = "slow-trace")]
	pub slow_trace_file: Option<PathBuf>,

	/// Output file
	#[clap(long = "output")]
	pub output_file: Option<PathBuf>,

	/// Output file format
	#[clap(long = "output-format", value_enum, default_value_t = OutputFormat::Json)]
	pub output_format: OutputFormat,
}

/// Output format
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[derive(clap::ValueEnum)]
pub enum OutputFormat {
	Json,
	Bincode,
}
