//! Utilities

// Modules
pub mod logger;

// Imports
use std::{cell::RefCell, fmt, io};

/// Extension trait for `R: io::BufRead` types to read a line without its terminator
#[extend::ext(name = ReadTrimmedLine)]
pub impl<R: io::BufRead> R {
	/// Reads the next line into `line`, replacing its contents and
	/// stripping any trailing `\n` or `\r\n`.
	///
	/// Returns `Ok(false)` once the reader is exhausted.
	fn read_trimmed_line(&mut self, line: &mut String) -> Result<bool, io::Error> {
		line.clear();
		if self.read_line(line)? == 0 {
			return Ok(false);
		}

		if line.ends_with('\n') {
			line.pop();
			if line.ends_with('\r') {
				line.pop();
			}
		}

		Ok(true)
	}
}

/// [`fmt::Display`] helper to display using a `FnMut(&mut fmt::Formatter)`
pub struct DisplayWrapper<F: FnMut(&mut fmt::Formatter) -> fmt::Result>(RefCell<F>);

impl<F: FnMut(&mut fmt::Formatter) -> fmt::Result> DisplayWrapper<F> {
	/// Creates a new display wrapper
	#[must_use]
	pub const fn new(func: F) -> Self {
		Self(RefCell::new(func))
	}
}

impl<F: FnMut(&mut fmt::Formatter) -> fmt::Result> fmt::Display for DisplayWrapper<F> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		// Note: `f` cannot be re-entrant, so this cannot fail
		self.0.borrow_mut()(f)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn read_trimmed_line_strips_terminators() {
		let mut reader = io::Cursor::new("0x10 READ 1\r\n0x20 WRITE 2\nlast");
		let mut line = String::new();

		assert!(reader.read_trimmed_line(&mut line).unwrap());
		assert_eq!(line, "0x10 READ 1");
		assert!(reader.read_trimmed_line(&mut line).unwrap());
		assert_eq!(line, "0x20 WRITE 2");
		assert!(reader.read_trimmed_line(&mut line).unwrap());
		assert_eq!(line, "last");
		assert!(!reader.read_trimmed_line(&mut line).unwrap());
	}

	#[test]
	fn display_wrapper_formats() {
		let value = 5;
		let s = DisplayWrapper::new(|f| write!(f, "value={value}")).to_string();
		assert_eq!(s, "value=5");
	}
}
