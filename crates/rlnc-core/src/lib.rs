#![no_std]
#[cfg(any(feature = "std", test))]
extern crate std;

extern crate alloc;

pub mod error;
pub mod trace;

pub use error::{CodingError, CodingResult};
pub use trace::{CallbackTrace, FilteredTrace, NoopTrace, TraceSink, Tracer, Zone};

/// Bytes used on the wire for one GF(2^8) coefficient.
pub const COEFFICIENT_WIDTH: usize = 1;

/// Caps the generation size so one decode stays bounded (O(k^2) matrix).
pub const MAX_SYMBOLS: usize = 4096;

pub const MAX_SYMBOL_SIZE: usize = 1 << 20;

/// Shape of one generation: `max_symbols` symbols of `max_symbol_size` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoderConfig {
    max_symbols: usize,
    max_symbol_size: usize,
}

impl CoderConfig {
    pub fn new(max_symbols: usize, max_symbol_size: usize) -> CodingResult<Self> {
        if max_symbols == 0 {
            return Err(CodingError::InvalidConfig { reason: "generation needs at least one symbol" });
        }
        if max_symbols > MAX_SYMBOLS {
            return Err(CodingError::InvalidConfig { reason: "too many symbols per generation" });
        }
        if max_symbol_size == 0 {
            return Err(CodingError::InvalidConfig { reason: "symbol size must be non-zero" });
        }
        if max_symbol_size > MAX_SYMBOL_SIZE {
            return Err(CodingError::InvalidConfig { reason: "symbol size too large" });
        }
        Ok(Self { max_symbols, max_symbol_size })
    }

    /// Smallest generation holding `data_len` bytes in symbols of `max_symbol_size`.
    pub fn for_data(data_len: usize, max_symbol_size: usize) -> CodingResult<Self> {
        if max_symbol_size == 0 {
            return Err(CodingError::InvalidConfig { reason: "symbol size must be non-zero" });
        }
        let symbols = data_len.div_ceil(max_symbol_size).max(1);
        Self::new(symbols, max_symbol_size)
    }

    #[inline]
    pub fn max_symbols(&self) -> usize {
        self.max_symbols
    }

    #[inline]
    pub fn max_symbol_size(&self) -> usize {
        self.max_symbol_size
    }

    /// Total data capacity of the generation.
    #[inline]
    pub fn block_size(&self) -> usize {
        self.max_symbols * self.max_symbol_size
    }

    #[inline]
    pub fn coefficients_size(&self) -> usize {
        self.max_symbols * COEFFICIENT_WIDTH
    }

    /// Wire size of one payload: [ coefficients | symbol ].
    #[inline]
    pub fn payload_size(&self) -> usize {
        self.coefficients_size() + self.max_symbol_size
    }
}
