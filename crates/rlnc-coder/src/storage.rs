use alloc::vec::Vec;

use rlnc_core::{CoderConfig, CodingError, CodingResult};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// The symbol buffers of one generation.
///
/// One contiguous block of `max_symbols * max_symbol_size` bytes, plus a
/// flag per slot telling whether the slot holds its final value.
#[derive(Debug, Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymbolStorage {
    #[zeroize(skip)]
    config: CoderConfig,
    block: Vec<u8>,
    #[zeroize(skip)]
    decoded: Vec<bool>,
    #[zeroize(skip)]
    decoded_count: usize,
}

impl SymbolStorage {
    pub fn new(config: CoderConfig) -> Self {
        Self {
            config,
            block: alloc::vec![0u8; config.block_size()],
            decoded: alloc::vec![false; config.max_symbols()],
            decoded_count: 0,
        }
    }

    pub fn config(&self) -> &CoderConfig {
        &self.config
    }

    /// Stores an original symbol and marks its slot as known.
    pub fn set_symbol(&mut self, index: usize, bytes: &[u8]) -> CodingResult<()> {
        let size = self.config.max_symbol_size();
        if bytes.len() != size {
            return Err(CodingError::SizeMismatch { expected: size, actual: bytes.len() });
        }
        self.check_index(index)?;
        self.block[index * size..(index + 1) * size].copy_from_slice(bytes);
        self.set_decoded(index);
        Ok(())
    }

    /// Fills every slot from one buffer of exactly `block_size()` bytes.
    pub fn set_symbols(&mut self, buffer: &[u8]) -> CodingResult<()> {
        if buffer.len() != self.block.len() {
            return Err(CodingError::SizeMismatch { expected: self.block.len(), actual: buffer.len() });
        }
        self.block.copy_from_slice(buffer);
        self.decoded.fill(true);
        self.decoded_count = self.decoded.len();
        Ok(())
    }

    /// Current content of slot `index`, final or not.
    pub fn symbol(&self, index: usize) -> Option<&[u8]> {
        let size = self.config.max_symbol_size();
        self.block.get(index * size..(index + 1) * size)
    }

    pub(crate) fn symbol_mut(&mut self, index: usize) -> Option<&mut [u8]> {
        let size = self.config.max_symbol_size();
        self.block.get_mut(index * size..(index + 1) * size)
    }

    pub(crate) fn set_decoded(&mut self, index: usize) {
        if let Some(flag) = self.decoded.get_mut(index) {
            if !*flag {
                *flag = true;
                self.decoded_count += 1;
            }
        }
    }

    pub fn is_symbol_decoded(&self, index: usize) -> bool {
        self.decoded.get(index).copied().unwrap_or(false)
    }

    pub fn symbols_decoded(&self) -> usize {
        self.decoded_count
    }

    pub fn is_complete(&self) -> bool {
        self.decoded_count == self.decoded.len()
    }

    /// The whole block, slots in index order.
    pub fn as_bytes(&self) -> &[u8] {
        &self.block
    }

    /// Snapshot of all slots. Safe at any time; slots that are not decoded
    /// yet hold whatever partial data they currently have.
    pub fn copy_all(&self) -> Vec<u8> {
        self.block.clone()
    }

    /// Copies the block into the front of `out`.
    pub fn copy_into(&self, out: &mut [u8]) -> CodingResult<()> {
        if out.len() < self.block.len() {
            return Err(CodingError::SizeMismatch { expected: self.block.len(), actual: out.len() });
        }
        out[..self.block.len()].copy_from_slice(&self.block);
        Ok(())
    }

    fn check_index(&self, index: usize) -> CodingResult<()> {
        if index >= self.config.max_symbols() {
            return Err(CodingError::SymbolIndexOutOfRange { index, symbols: self.config.max_symbols() });
        }
        Ok(())
    }
}
