//! Tier traces

// Imports
use {crate::trace::AccessKind, anyhow::Context, std::io};

/// Memory tier
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Tier {
	/// Small, fast tier
	Fast,

	/// Large, slow tier
	Slow,
}

/// An operation on one of the tiers
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct TierOp {
	/// Tier
	pub tier: Tier,

	/// Address within the tier
	pub addr: u64,

	/// Access kind
	pub kind: AccessKind,

	/// Simulated cycle
	pub cycle: u64,
}

/// Receiver of tier operations
pub trait TierSink {
	/// Emits an operation
	fn emit(&mut self, op: TierOp) -> Result<(), anyhow::Error>;
}

impl TierSink for Vec<TierOp> {
	fn emit(&mut self, op: TierOp) -> Result<(), anyhow::Error> {
		self.push(op);
		Ok(())
	}
}

/// Tier trace writer
#[derive(Debug)]
pub struct TierTraceWriter<W> {
	/// Writer
	writer: W,

	/// Lines written
	lines_written: u64,
}

impl<W: io::Write> TierTraceWriter<W> {
	/// Creates a new writer
	pub fn new(writer: W) -> Self {
		Self {
			writer,
			lines_written: 0,
		}
	}

	/// Writes an operation as a trace line
	pub fn write(&mut self, addr: u64, kind: AccessKind, cycle: u64) -> Result<(), anyhow::Error> {
		writeln!(self.writer, "0x{addr:08X} {} {cycle}", kind.as_str()).context("Unable to write trace line")?;
		self.lines_written += 1;

		Ok(())
	}

	/// Returns the number of lines written
	pub fn lines_written(&self) -> u64 {
		self.lines_written
	}

	/// Flushes and returns the inner writer
	pub fn finish(mut self) -> Result<W, anyhow::Error> {
		self.writer.flush().context("Unable to flush writer")?;
		Ok(self.writer)
	}
}

/// Fast and slow tier trace writers
#[derive(Debug)]
pub struct TierTraces<W> {
	/// Fast tier
	pub fast: TierTraceWriter<W>,

	/// Slow tier
	pub slow: TierTraceWriter<W>,
}

impl<W: io::Write> TierTraces<W> {
	/// Creates both writers
	pub fn new(fast: W, slow: W) -> Self {
		Self {
			fast: TierTraceWriter::new(fast),
			slow: TierTraceWriter::new(slow),
		}
	}

	/// Flushes both writers
	pub fn finish(self) -> Result<(W, W), anyhow::Error> {
		let fast = self.fast.finish().context("Unable to finish fast tier trace")?;
		let slow = self.slow.finish().context("Unable to finish slow tier trace")?;
		Ok((fast, slow))
	}
}

impl<W: io::Write> TierSink for TierTraces<W> {
	fn emit(&mut self, op: TierOp) -> Result<(), anyhow::Error> {
		let (writer, name) = match op.tier {
			Tier::Fast => (&mut self.fast, "fast"),
			Tier::Slow => (&mut self.slow, "slow"),
		};

		writer
			.write(op.addr, op.kind, op.cycle)
			.with_context(|| format!("Unable to write {name} tier operation"))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn formats_lines() {
		let mut writer = TierTraceWriter::new(vec![]);
		writer.write(0x1f40, AccessKind::Read, 7).unwrap();
		writer.write(0xdead_beef, AccessKind::Write, 1234).unwrap();
		assert_eq!(writer.lines_written(), 2);

		let output = String::from_utf8(writer.finish().unwrap()).unwrap();
		assert_eq!(output, "0x00001F40 READ 7\n0xDEADBEEF WRITE 1234\n");
	}

	#[test]
	fn routes_by_tier() {
		let mut traces = TierTraces::new(vec![], vec![]);
		traces
			.emit(TierOp {
				tier:  Tier::Fast,
				addr:  0x40,
				kind:  AccessKind::Write,
				cycle: 1,
			})
			.unwrap();
		traces
			.emit(TierOp {
				tier:  Tier::Slow,
				addr:  0x1000,
				kind:  AccessKind::Read,
				cycle: 2,
			})
			.unwrap();

		let (fast, slow) = traces.finish().unwrap();
		assert_eq!(String::from_utf8(fast).unwrap(), "0x00000040 WRITE 1\n");
		assert_eq!(String::from_utf8(slow).unwrap(), "0x00001000 READ 2\n");
	}
}
