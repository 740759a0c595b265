use alloc::vec::Vec;

use rlnc_core::{CoderConfig, CodingError, CodingResult};
use zeroize::Zeroize;

/// One coded symbol together with the coefficients that produced it.
/// Maps to wire format: [ coefficients | symbol ]
///
/// Both sides know the generation shape, so the wire form carries no length
/// prefix.
#[derive(Clone, Debug, PartialEq, Eq, Zeroize)]
pub struct Payload {
    coefficients: Vec<u8>, // one GF(2^8) element per symbol slot
    symbol: Vec<u8>,
}

impl Payload {
    pub fn new(coefficients: Vec<u8>, symbol: Vec<u8>) -> Self {
        Self { coefficients, symbol }
    }

    /// Uncoded symbol `index` with a unit coefficient vector.
    pub fn systematic(symbols: usize, index: usize, symbol: &[u8]) -> CodingResult<Self> {
        if index >= symbols {
            return Err(CodingError::SymbolIndexOutOfRange { index, symbols });
        }
        let mut coefficients = alloc::vec![0u8; symbols];
        coefficients[index] = 1;
        Ok(Self { coefficients, symbol: symbol.to_vec() })
    }

    pub fn coefficients(&self) -> &[u8] {
        &self.coefficients
    }

    pub fn symbol(&self) -> &[u8] {
        &self.symbol
    }

    /// Index of the carried symbol when the coefficient vector is a unit vector.
    pub fn systematic_index(&self) -> Option<usize> {
        let mut found = None;
        for (i, &c) in self.coefficients.iter().enumerate() {
            match c {
                0 => {}
                1 if found.is_none() => found = Some(i),
                _ => return None,
            }
        }
        found
    }

    pub fn encoded_len(&self) -> usize {
        self.coefficients.len() + self.symbol.len()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        out.extend_from_slice(&self.coefficients);
        out.extend_from_slice(&self.symbol);
        out
    }

    /// Serializes into the front of `buf`, returning the bytes written.
    pub fn write_to(&self, buf: &mut [u8]) -> CodingResult<usize> {
        let len = self.encoded_len();
        if buf.len() < len {
            return Err(CodingError::SizeMismatch { expected: len, actual: buf.len() });
        }
        let (head, tail) = buf.split_at_mut(self.coefficients.len());
        head.copy_from_slice(&self.coefficients);
        tail[..self.symbol.len()].copy_from_slice(&self.symbol);
        Ok(len)
    }

    /// Parses a payload for the generation described by `config`.
    pub fn from_bytes(config: &CoderConfig, bytes: &[u8]) -> CodingResult<Self> {
        if bytes.len() != config.payload_size() {
            return Err(CodingError::SizeMismatch { expected: config.payload_size(), actual: bytes.len() });
        }
        let (coefficients, symbol) = bytes.split_at(config.coefficients_size());
        Ok(Self {
            coefficients: coefficients.to_vec(),
            symbol: symbol.to_vec(),
        })
    }

    /// True when the shape matches `config`.
    pub fn fits(&self, config: &CoderConfig) -> bool {
        self.coefficients.len() == config.max_symbols() && self.symbol.len() == config.max_symbol_size()
    }
}
