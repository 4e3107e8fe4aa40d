//! Logger

// Imports
use {
	std::{fs, path::Path, sync::Mutex},
	tracing::Level,
	tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, EnvFilter},
};

/// Messages logged before the logger was initialized
static PRE_INIT_MESSAGES: Mutex<Vec<(Level, String)>> = Mutex::new(Vec::new());

/// Initializes the logger.
///
/// Logs to stderr, filtered by `RUST_LOG` (`info` by default), and,
/// if `log_file` is given, to it as well, filtered by `RUST_LOG_FILE`
/// (`debug` by default).
///
/// Any messages queued in [`pre_init`] are emitted afterwards.
pub fn init(log_file: Option<&Path>, log_file_append: bool) {
	let term_layer = fmt::layer()
		.with_writer(std::io::stderr)
		.with_filter(self::env_filter("RUST_LOG", LevelFilter::INFO));

	// Note: If we can't open the log file, we still want the terminal
	//       logging, so just warn about it once we're set up.
	let mut file_err = None;
	let file_layer = log_file.and_then(|log_file| {
		let file = fs::OpenOptions::new()
			.create(true)
			.write(true)
			.append(log_file_append)
			.truncate(!log_file_append)
			.open(log_file);

		match file {
			Ok(file) => Some(
				fmt::layer()
					.with_ansi(false)
					.with_writer(Mutex::new(file))
					.with_filter(self::env_filter("RUST_LOG_FILE", LevelFilter::DEBUG)),
			),
			Err(err) => {
				file_err = Some((log_file.to_path_buf(), err));
				None
			},
		}
	});

	tracing_subscriber::registry().with(term_layer).with(file_layer).init();

	if let Some((path, err)) = file_err {
		tracing::warn!(?path, ?err, "Unable to open log file, logging only to stderr");
	}

	// Finally emit everything that was logged before we were ready
	let messages = match PRE_INIT_MESSAGES.lock() {
		Ok(mut messages) => std::mem::take(&mut *messages),
		Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
	};
	for (level, message) in messages {
		match level {
			level if level == Level::TRACE => tracing::trace!("{message}"),
			level if level == Level::DEBUG => tracing::debug!("{message}"),
			level if level == Level::INFO => tracing::info!("{message}"),
			level if level == Level::WARN => tracing::warn!("{message}"),
			_ => tracing::error!("{message}"),
		}
	}
}

/// Creates an env filter from `var`, defaulting to `default`
fn env_filter(var: &str, default: LevelFilter) -> EnvFilter {
	EnvFilter::builder()
		.with_default_directive(default.into())
		.with_env_var(var)
		.from_env_lossy()
}

/// Logging before the logger is initialized
pub mod pre_init {
	// Imports
	use {super::PRE_INIT_MESSAGES, tracing::Level};

	/// Queues a message at `level`
	fn push(level: Level, message: String) {
		let mut messages = match PRE_INIT_MESSAGES.lock() {
			Ok(messages) => messages,
			Err(poisoned) => poisoned.into_inner(),
		};
		messages.push((level, message));
	}

	/// Queues a debug message
	pub fn debug(message: impl Into<String>) {
		self::push(Level::DEBUG, message.into());
	}
}
