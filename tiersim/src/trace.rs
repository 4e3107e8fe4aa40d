//! Input trace parsing.
//!
//! Each line holds a hexadecimal address (`0x`/`0X` prefixed), an access
//! kind (`READ` or `WRITE`) and, at the end of the line, a decimal cycle.

// Imports
use {anyhow::Context, std::io, tiersim_util::ReadTrimmedLine};

/// Trace reader
#[derive(Clone, Debug)]
pub struct TraceReader<R> {
	/// Reader
	reader: R,

	/// Current line buffer
	line: String,

	/// Lines read so far
	lines_read: u64,
}

impl<R: io::BufRead> TraceReader<R> {
	/// Creates a trace reader
	pub fn new(reader: R) -> Self {
		Self {
			reader,
			line: String::new(),
			lines_read: 0,
		}
	}

	/// Reads the next record.
	///
	/// # Errors
	/// Returns an error (mentioning the line number) if the line is missing
	/// any of its tokens, or if unable to read from the underlying reader.
	pub fn read_next(&mut self) -> Result<Option<Record>, anyhow::Error> {
		let has_line = self
			.reader
			.read_trimmed_line(&mut self.line)
			.with_context(|| format!("Unable to read line {}", self.lines_read + 1))?;
		if !has_line {
			return Ok(None);
		}
		self.lines_read += 1;

		let record = Record::parse(&self.line)
			.with_context(|| format!("Unable to parse line {}: {:?}", self.lines_read, self.line))?;
		Ok(Some(record))
	}

	/// Returns the number of the last line read (1-based)
	pub fn line_number(&self) -> u64 {
		self.lines_read
	}
}

/// Record
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Record {
	/// Address
	pub addr: u64,

	/// Access kind
	pub kind: AccessKind,

	/// Input cycle
	pub cycle: u64,
}

impl Record {
	/// Parses a record from a trace line
	pub fn parse(line: &str) -> Result<Self, anyhow::Error> {
		let addr = self::find_hex_addr(line).context("Missing address")?;
		let addr = u64::from_str_radix(addr, 16).context("Unable to parse address")?;

		let kind = self::find_access_kind(line).context("Missing access kind")?;

		let cycle = self::find_trailing_cycle(line).context("Missing cycle")?;
		let cycle = cycle.parse::<u64>().context("Unable to parse cycle")?;

		Ok(Self { addr, kind, cycle })
	}
}

/// Access kind
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum AccessKind {
	/// Read
	Read,

	/// Write
	Write,
}

impl AccessKind {
	/// Returns the trace token for this kind
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Read => "READ",
			Self::Write => "WRITE",
		}
	}
}

/// Finds the leftmost `0x`/`0X` prefixed hex number and returns its digits
fn find_hex_addr(line: &str) -> Option<&str> {
	let bytes = line.as_bytes();
	(0..bytes.len().saturating_sub(2)).find_map(|idx| {
		let is_prefix = bytes[idx] == b'0' && matches!(bytes[idx + 1], b'x' | b'X');
		if !is_prefix {
			return None;
		}

		let digits = &line[idx + 2..];
		let len = digits.bytes().take_while(u8::is_ascii_hexdigit).count();
		(len > 0).then(|| &digits[..len])
	})
}

/// Finds the leftmost `READ` or `WRITE` token
fn find_access_kind(line: &str) -> Option<AccessKind> {
	match (line.find("READ"), line.find("WRITE")) {
		(Some(read), Some(write)) if write < read => Some(AccessKind::Write),
		(Some(_), _) => Some(AccessKind::Read),
		(None, Some(_)) => Some(AccessKind::Write),
		(None, None) => None,
	}
}

/// Finds the decimal digits at the very end of the line
fn find_trailing_cycle(line: &str) -> Option<&str> {
	let start = line.trim_end_matches(|ch: char| ch.is_ascii_digit()).len();
	let digits = &line[start..];
	(!digits.is_empty()).then_some(digits)
}
