//! Systematic random linear network coding over GF(2^8).
//!
//! An [`Encoder`] sends each symbol of a generation once uncoded, then random
//! linear combinations. A [`Decoder`] absorbs whatever arrives, in any order
//! and with any losses, and completes once it has seen as many independent
//! payloads as there are symbols.
#![no_std]
#[cfg(any(feature = "std", test))]
extern crate std;

extern crate alloc;

mod decoder;
mod encoder;
mod payload;
mod storage;

pub use decoder::{Decoder, DecoderState};
pub use encoder::Encoder;
pub use payload::Payload;
pub use storage::SymbolStorage;

pub use rlnc_core::{CoderConfig, CodingError, CodingResult, TraceSink, Zone};
