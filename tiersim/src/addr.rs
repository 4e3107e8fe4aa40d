//! Address decomposition

// Imports
use std::fmt;

/// Tier geometry.
///
/// Fixes how byte addresses map onto cache lines, fast-tier slots and
/// the slow-tier candidates that alias each slot.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Geometry {
	/// `log2(cache line size)`
	cache_line_bits: u32,

	/// `log2(number of fast slots)`
	fast_slot_bits: u32,

	/// Number of slow-tier candidates per fast slot
	slow_per_fast: u64,
}

impl Geometry {
	/// Creates a geometry from the cache line size and both tier capacities, in bytes.
	///
	/// # Errors
	/// Returns an error if any size isn't a power of two, or if
	/// `cache_line_size <= fast_capacity <= slow_capacity` doesn't hold.
	pub fn new(cache_line_size: u64, fast_capacity: u64, slow_capacity: u64) -> Result<Self, anyhow::Error> {
		anyhow::ensure!(
			cache_line_size.is_power_of_two(),
			"Cache line size must be a power of two, found {cache_line_size}"
		);
		anyhow::ensure!(
			fast_capacity.is_power_of_two(),
			"Fast tier capacity must be a power of two, found {fast_capacity}"
		);
		anyhow::ensure!(
			slow_capacity.is_power_of_two(),
			"Slow tier capacity must be a power of two, found {slow_capacity}"
		);
		anyhow::ensure!(
			fast_capacity >= cache_line_size,
			"Fast tier capacity ({fast_capacity}) must hold at least one cache line ({cache_line_size})"
		);
		anyhow::ensure!(
			slow_capacity >= fast_capacity,
			"Slow tier capacity ({slow_capacity}) must be at least the fast tier capacity ({fast_capacity})"
		);

		let cache_line_bits = cache_line_size.trailing_zeros();
		let fast_slot_bits = (fast_capacity / cache_line_size).trailing_zeros();
		Ok(Self {
			cache_line_bits,
			fast_slot_bits,
			slow_per_fast: slow_capacity / fast_capacity,
		})
	}

	/// Splits `addr` into its cache line, remap index and entry index
	pub fn decompose(&self, addr: u64) -> Decomposed {
		let cache_line = CacheLine(addr >> self.cache_line_bits);
		Decomposed {
			cache_line,
			remap_idx: RemapIdx(cache_line.0 & (self.num_fast_slots() - 1)),
			entry_idx: EntryIdx(cache_line.0 >> self.fast_slot_bits),
		}
	}

	/// Returns the fast-tier address of a slot.
	///
	/// Fast-tier addresses only have slot granularity, so any offset within
	/// the original cache line is lost.
	pub fn translate(&self, remap_idx: RemapIdx) -> u64 {
		remap_idx.0 << self.cache_line_bits
	}

	/// Reconstructs the slow-tier address of candidate `entry_idx` of slot `remap_idx`
	pub fn reconstruct(&self, remap_idx: RemapIdx, entry_idx: EntryIdx) -> u64 {
		(entry_idx.0 << (self.cache_line_bits + self.fast_slot_bits)) | (remap_idx.0 << self.cache_line_bits)
	}

	/// Returns the slow-tier address of the start of `cache_line`
	pub fn line_addr(&self, cache_line: CacheLine) -> u64 {
		cache_line.0 << self.cache_line_bits
	}

	/// Returns if `addr` lies within the slow tier
	pub fn contains(&self, addr: u64) -> bool {
		self.decompose(addr).entry_idx.0 < self.slow_per_fast
	}

	/// Returns the cache line size, in bytes
	pub fn cache_line_size(&self) -> u64 {
		1 << self.cache_line_bits
	}

	/// Returns the number of fast-tier slots
	pub fn num_fast_slots(&self) -> u64 {
		1 << self.fast_slot_bits
	}

	/// Returns the number of slow-tier candidates aliasing each fast slot
	pub fn slow_per_fast(&self) -> u64 {
		self.slow_per_fast
	}
}

/// A decomposed address
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Decomposed {
	/// Cache line
	pub cache_line: CacheLine,

	/// Fast slot this line maps to
	pub remap_idx: RemapIdx,

	/// Which of the slot's candidates this line is
	pub entry_idx: EntryIdx,
}

/// Cache line address (byte address without the line offset)
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub struct CacheLine(u64);

impl CacheLine {
	/// Creates a cache line from its index
	pub const fn new(line: u64) -> Self {
		Self(line)
	}

	/// Returns the cache line as a `u64`
	pub fn to_u64(self) -> u64 {
		self.0
	}
}

impl fmt::Debug for CacheLine {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("CacheLine").field(&format_args!("{:#x}", self.0)).finish()
	}
}

/// Remap index, selects a fast-tier slot
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash, Debug)]
pub struct RemapIdx(u64);

impl RemapIdx {
	/// Creates a remap index
	pub const fn new(idx: u64) -> Self {
		Self(idx)
	}

	/// Returns the index as a `u64`
	pub fn to_u64(self) -> u64 {
		self.0
	}
}

/// Entry index, selects one of the slow-tier candidates of a slot
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash, Debug)]
pub struct EntryIdx(u64);

impl EntryIdx {
	/// Creates an entry index
	pub const fn new(idx: u64) -> Self {
		Self(idx)
	}

	/// Returns the index as a `u64`
	pub fn to_u64(self) -> u64 {
		self.0
	}
}
