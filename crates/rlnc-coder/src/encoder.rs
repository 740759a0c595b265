#![forbid(unsafe_code)]

use alloc::format;
use alloc::vec::Vec;

use log::debug;
use rand_chacha::ChaCha20Rng;
use rand_core::{RngCore, SeedableRng};
use rlnc_core::trace::hex_row;
use rlnc_core::{CoderConfig, CodingError, CodingResult, Tracer, Zone};
use rlnc_math::{row_add_scaled, Gf256};

use crate::payload::Payload;
use crate::storage::SymbolStorage;

/// Systematic random linear encoder for one generation.
///
/// Sends every original symbol once, uncoded, in index order, then switches
/// to random linear combinations of all symbols for as long as it is asked.
pub struct Encoder {
    config: CoderConfig,
    storage: SymbolStorage,
    rng: ChaCha20Rng,
    systematic: bool,
    next_systematic: usize,
    coded_sent: u64,
    tracer: Tracer,
}

impl Encoder {
    /// Encoder whose coefficient generator is seeded from OS entropy.
    #[cfg(feature = "std")]
    pub fn new(config: CoderConfig) -> Self {
        Self::with_rng(config, ChaCha20Rng::from_entropy())
    }

    /// Encoder with a deterministic coefficient generator.
    pub fn with_seed(config: CoderConfig, seed: u64) -> Self {
        Self::with_rng(config, ChaCha20Rng::seed_from_u64(seed))
    }

    fn with_rng(config: CoderConfig, rng: ChaCha20Rng) -> Self {
        Self {
            config,
            storage: SymbolStorage::new(config),
            rng,
            systematic: true,
            next_systematic: 0,
            coded_sent: 0,
            tracer: Tracer::new(),
        }
    }

    pub fn set_seed(&mut self, seed: u64) {
        self.rng = ChaCha20Rng::seed_from_u64(seed);
    }

    /// Loads the whole generation. Restarts the systematic pass.
    pub fn set_symbols(&mut self, data: &[u8]) -> CodingResult<()> {
        self.storage.set_symbols(data)?;
        self.next_systematic = 0;
        self.coded_sent = 0;
        debug!("encoder loaded {} symbols of {} bytes", self.config.max_symbols(), self.config.max_symbol_size());
        Ok(())
    }

    pub fn set_symbol(&mut self, index: usize, data: &[u8]) -> CodingResult<()> {
        self.storage.set_symbol(index, data)
    }

    /// Number of symbols initialized so far.
    pub fn rank(&self) -> usize {
        self.storage.symbols_decoded()
    }

    pub fn is_systematic_on(&self) -> bool {
        self.systematic
    }

    pub fn set_systematic_on(&mut self) {
        self.systematic = true;
    }

    pub fn set_systematic_off(&mut self) {
        self.systematic = false;
    }

    /// True while the next payload will be an uncoded symbol.
    pub fn in_systematic_phase(&self) -> bool {
        self.systematic && self.next_systematic < self.config.max_symbols()
    }

    /// Produces the next payload.
    ///
    /// Fails only while some symbol is still uninitialized.
    pub fn write_payload(&mut self) -> CodingResult<Payload> {
        if !self.storage.is_complete() {
            return Err(CodingError::NotFullyInitialized {
                initialized: self.storage.symbols_decoded(),
                symbols: self.config.max_symbols(),
            });
        }

        let payload = if self.in_systematic_phase() {
            let index = self.next_systematic;
            self.next_systematic += 1;
            let symbol = self.storage.symbol(index).unwrap_or_default();
            Payload::systematic(self.config.max_symbols(), index, symbol)?
        } else {
            if self.coded_sent == 0 {
                debug!("encoder entering coded phase after {} systematic symbols", self.next_systematic);
                let sent = self.next_systematic;
                self.tracer.emit(Zone::EncoderPhase, || format!("coded phase, {} systematic sent", sent));
            }
            self.coded_sent += 1;
            self.coded_payload()
        };

        self.tracer.emit(Zone::OutputSymbolCoefficients, || hex_row(payload.coefficients()));
        Ok(payload)
    }

    /// Same as [`write_payload`](Self::write_payload), already serialized.
    pub fn encode(&mut self) -> CodingResult<Vec<u8>> {
        Ok(self.write_payload()?.to_bytes())
    }

    fn coded_payload(&mut self) -> Payload {
        let k = self.config.max_symbols();
        let mut coefficients = alloc::vec![0u8; k];
        // Uniform over non-zero vectors.
        loop {
            self.rng.fill_bytes(&mut coefficients);
            if coefficients.iter().any(|&c| c != 0) {
                break;
            }
        }

        let mut symbol = alloc::vec![0u8; self.config.max_symbol_size()];
        for (i, &c) in coefficients.iter().enumerate() {
            if let Some(src) = self.storage.symbol(i) {
                row_add_scaled(&mut symbol, src, Gf256(c));
            }
        }
        Payload::new(coefficients, symbol)
    }

    pub fn config(&self) -> &CoderConfig {
        &self.config
    }

    pub fn symbols(&self) -> usize {
        self.config.max_symbols()
    }

    pub fn symbol_size(&self) -> usize {
        self.config.max_symbol_size()
    }

    pub fn block_size(&self) -> usize {
        self.config.block_size()
    }

    pub fn payload_size(&self) -> usize {
        self.config.payload_size()
    }

    pub fn trace<F>(&mut self, callback: F)
    where
        F: FnMut(Zone, &str) + Send + 'static,
    {
        self.tracer.set_callback(callback);
    }

    pub fn filtered_trace<P, F>(&mut self, predicate: P, callback: F)
    where
        P: Fn(Zone) -> bool + Send + 'static,
        F: FnMut(Zone, &str) + Send + 'static,
    {
        self.tracer.set_filtered(predicate, callback);
    }

    pub fn clear_trace(&mut self) {
        self.tracer.clear();
    }

    pub fn has_trace(&self) -> bool {
        self.tracer.is_active()
    }
}
