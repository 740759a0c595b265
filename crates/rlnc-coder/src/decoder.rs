#![forbid(unsafe_code)]

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Write;

use log::{debug, error, info, trace, warn};
use rand_chacha::ChaCha20Rng;
use rand_core::{RngCore, SeedableRng};
use rlnc_core::trace::hex_row;
use rlnc_core::{CoderConfig, CodingError, CodingResult, Tracer, Zone};
use rlnc_math::{row_add_scaled, row_scale, CodingMatrix, Gf256};

use crate::payload::Payload;
use crate::storage::SymbolStorage;

/// Progress of a decoder. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DecoderState {
    Empty,
    Partial,
    Complete,
}

/// Incremental Gauss-Jordan decoder for one generation.
///
/// Row `i` of the matrix is the pivot row for symbol `i`, stored next to
/// slot `i` of the symbol storage. The rows present are kept in reduced row
/// echelon form after every payload: each pivot row has a one in its own
/// column and zeros in every other pivot column. A pivot row whose
/// non-pivot columns are zero as well is a decoded symbol.
pub struct Decoder {
    config: CoderConfig,
    matrix: CodingMatrix,
    storage: SymbolStorage,
    pivots: Vec<bool>,
    rank: usize,
    payloads_read: u64,
    rng: ChaCha20Rng,
    tracer: Tracer,
}

impl Decoder {
    #[cfg(feature = "std")]
    pub fn new(config: CoderConfig) -> Self {
        Self::with_rng(config, ChaCha20Rng::from_entropy())
    }

    /// Decoder whose recoding coefficients come from a seeded generator.
    pub fn with_seed(config: CoderConfig, seed: u64) -> Self {
        Self::with_rng(config, ChaCha20Rng::seed_from_u64(seed))
    }

    fn with_rng(config: CoderConfig, rng: ChaCha20Rng) -> Self {
        let k = config.max_symbols();
        Self {
            config,
            matrix: CodingMatrix::new(k, k),
            storage: SymbolStorage::new(config),
            pivots: alloc::vec![false; k],
            rank: 0,
            payloads_read: 0,
            rng,
            tracer: Tracer::new(),
        }
    }

    pub fn set_seed(&mut self, seed: u64) {
        self.rng = ChaCha20Rng::seed_from_u64(seed);
    }

    /// Absorbs one payload. Returns whether it raised the rank.
    ///
    /// Never fails: dependent payloads, payloads arriving after completion
    /// and payloads shaped for another generation are dropped.
    pub fn read_payload(&mut self, payload: &Payload) -> bool {
        self.payloads_read += 1;

        if !payload.fits(&self.config) {
            warn!(
                "dropping payload with {} coefficients and {} data bytes, generation is {}x{}",
                payload.coefficients().len(),
                payload.symbol().len(),
                self.config.max_symbols(),
                self.config.max_symbol_size()
            );
            self.tracer.emit(Zone::RedundantSymbol, || String::from("malformed payload dropped"));
            return false;
        }

        self.tracer.emit(Zone::InputSymbolCoefficients, || hex_row(payload.coefficients()));

        if self.is_complete() {
            self.tracer.emit(Zone::RedundantSymbol, || String::from("decoder already complete"));
            return false;
        }

        match payload.systematic_index() {
            Some(index) => self.absorb_uncoded(index, payload.symbol()),
            None => self.absorb_coded(payload.coefficients().to_vec(), payload.symbol().to_vec()),
        }
    }

    /// Parses and absorbs a serialized payload.
    pub fn decode(&mut self, bytes: &[u8]) -> CodingResult<bool> {
        let payload = Payload::from_bytes(&self.config, bytes)?;
        Ok(self.read_payload(&payload))
    }

    /// Absorbs original symbol `index` whose position is known out of band.
    pub fn read_uncoded_symbol(&mut self, index: usize, symbol: &[u8]) -> CodingResult<bool> {
        if symbol.len() != self.config.max_symbol_size() {
            return Err(CodingError::SizeMismatch { expected: self.config.max_symbol_size(), actual: symbol.len() });
        }
        if index >= self.config.max_symbols() {
            return Err(CodingError::SymbolIndexOutOfRange { index, symbols: self.config.max_symbols() });
        }
        self.payloads_read += 1;
        Ok(self.absorb_uncoded(index, symbol))
    }

    fn absorb_uncoded(&mut self, index: usize, symbol: &[u8]) -> bool {
        if self.storage.is_symbol_decoded(index) {
            self.tracer.emit(Zone::RedundantSymbol, || format!("symbol {} already decoded", index));
            return false;
        }
        let mut coefficients = alloc::vec![0u8; self.config.max_symbols()];
        coefficients[index] = 1;
        if self.pivots[index] {
            // Column taken by a coded row; the unit vector still carries
            // information about that row's other columns.
            return self.absorb_coded(coefficients, symbol.to_vec());
        }
        self.insert_pivot(index, &coefficients, symbol);
        true
    }

    fn absorb_coded(&mut self, mut coefficients: Vec<u8>, mut symbol: Vec<u8>) -> bool {
        // Work on owned copies; nothing is committed until the pivot is known.
        for p in 0..self.config.max_symbols() {
            let factor = Gf256(coefficients[p]);
            if factor.is_zero() || !self.pivots[p] {
                continue;
            }
            row_add_scaled(&mut coefficients, self.matrix.row(p), factor);
            if let Some(src) = self.storage.symbol(p) {
                row_add_scaled(&mut symbol, src, factor);
            }
            trace!("reduced incoming row by pivot {} (factor {:#04x})", p, factor.0);
            self.tracer.emit(Zone::RowReduction, || format!("subtract {:#04x} * row {}", factor.0, p));
        }

        let Some(pivot) = coefficients.iter().position(|&c| c != 0) else {
            self.tracer.emit(Zone::RedundantSymbol, || String::from("linearly dependent, dropped"));
            return false;
        };

        let inv = match Gf256(coefficients[pivot]).invert() {
            Ok(inv) => inv,
            Err(err) => {
                error!("pivot {} normalization failed: {}", pivot, err);
                debug_assert!(false, "leading coefficient of a reduced row is zero");
                return false;
            }
        };
        row_scale(&mut coefficients, inv);
        row_scale(&mut symbol, inv);

        self.insert_pivot(pivot, &coefficients, &symbol);
        true
    }

    /// Commits a normalized row as pivot `pivot`.
    ///
    /// `coefficients` must be zero in every existing pivot column. Its column
    /// is cleared from the existing rows first so the matrix stays reduced.
    fn insert_pivot(&mut self, pivot: usize, coefficients: &[u8], symbol: &[u8]) {
        let k = self.config.max_symbols();

        for r in 0..k {
            if !self.pivots[r] {
                continue;
            }
            let factor = Gf256(self.matrix.row(r)[pivot]);
            if factor.is_zero() {
                continue;
            }
            row_add_scaled(self.matrix.row_mut(r), coefficients, factor);
            if let Some(dst) = self.storage.symbol_mut(r) {
                row_add_scaled(dst, symbol, factor);
            }
            self.tracer.emit(Zone::RowReduction, || format!("back-substitute pivot {} into row {}", pivot, r));
            self.refresh_decoded(r);
        }

        self.matrix.row_mut(pivot).copy_from_slice(coefficients);
        if let Some(dst) = self.storage.symbol_mut(pivot) {
            dst.copy_from_slice(symbol);
        }
        self.pivots[pivot] = true;
        self.rank += 1;
        self.refresh_decoded(pivot);

        debug!("pivot {} found, rank {}/{}", pivot, self.rank, k);
        let rank = self.rank;
        self.tracer.emit(Zone::PivotFound, || format!("pivot {} rank {}/{}", pivot, rank, k));

        if self.tracer.enabled(Zone::DecoderState) {
            let state = self.render_state();
            self.tracer.emit(Zone::DecoderState, || state);
        }

        if self.rank == k {
            info!("generation of {} symbols decoded after {} payloads", k, self.payloads_read);
            let read = self.payloads_read;
            self.tracer.emit(Zone::DecoderComplete, || format!("complete after {} payloads", read));
        }
    }

    fn refresh_decoded(&mut self, r: usize) {
        if self.storage.is_symbol_decoded(r) {
            return;
        }
        let unit = self
            .matrix
            .row(r)
            .iter()
            .enumerate()
            .all(|(c, &v)| if c == r { v == 1 } else { v == 0 });
        if unit {
            self.storage.set_decoded(r);
        }
    }

    /// One line per symbol: `U` decoded, `C` pivot still coded, `?` missing.
    fn render_state(&self) -> String {
        let mut out = String::new();
        for r in 0..self.config.max_symbols() {
            let status = if self.storage.is_symbol_decoded(r) {
                'U'
            } else if self.pivots[r] {
                'C'
            } else {
                '?'
            };
            let _ = writeln!(out, "{:>4} {}: {}", r, status, hex_row(self.matrix.row(r)));
        }
        out
    }

    /// A random combination of the rows received so far, without decoding.
    /// `None` until the first innovative payload.
    pub fn recode(&mut self) -> Option<Payload> {
        if self.rank == 0 {
            return None;
        }

        let rows: Vec<usize> = (0..self.config.max_symbols()).filter(|&r| self.pivots[r]).collect();
        let mut local = alloc::vec![0u8; rows.len()];
        // Rows are independent, so only the all-zero draw gives a zero vector.
        loop {
            self.rng.fill_bytes(&mut local);
            if local.iter().any(|&a| a != 0) {
                break;
            }
        }

        let mut coefficients = alloc::vec![0u8; self.config.max_symbols()];
        let mut symbol = alloc::vec![0u8; self.config.max_symbol_size()];
        for (&r, &alpha) in rows.iter().zip(&local) {
            let alpha = Gf256(alpha);
            row_add_scaled(&mut coefficients, self.matrix.row(r), alpha);
            if let Some(src) = self.storage.symbol(r) {
                row_add_scaled(&mut symbol, src, alpha);
            }
        }

        self.tracer.emit(Zone::OutputSymbolCoefficients, || hex_row(&coefficients));
        Some(Payload::new(coefficients, symbol))
    }

    pub fn state(&self) -> DecoderState {
        match self.rank {
            0 => DecoderState::Empty,
            r if r == self.config.max_symbols() => DecoderState::Complete,
            _ => DecoderState::Partial,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.rank == self.config.max_symbols()
    }

    /// True once at least one symbol is fully decoded.
    pub fn is_partially_complete(&self) -> bool {
        self.storage.symbols_decoded() > 0
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn symbols_decoded(&self) -> usize {
        self.storage.symbols_decoded()
    }

    pub fn is_symbol_pivot(&self, index: usize) -> bool {
        self.pivots.get(index).copied().unwrap_or(false)
    }

    pub fn is_symbol_decoded(&self, index: usize) -> bool {
        self.storage.is_symbol_decoded(index)
    }

    /// Symbol `index` if it is fully decoded.
    pub fn decoded_symbol(&self, index: usize) -> Option<&[u8]> {
        if self.storage.is_symbol_decoded(index) {
            self.storage.symbol(index)
        } else {
            None
        }
    }

    /// Coefficient row currently held for `index`, if it is a pivot.
    pub fn coefficients(&self, index: usize) -> Option<&[u8]> {
        if self.is_symbol_pivot(index) {
            Some(self.matrix.row(index))
        } else {
            None
        }
    }

    pub fn payloads_read(&self) -> u64 {
        self.payloads_read
    }

    /// Everything recovered so far. Exact only once complete.
    pub fn copy_symbols(&self) -> Vec<u8> {
        self.storage.copy_all()
    }

    pub fn copy_symbols_into(&self, out: &mut [u8]) -> CodingResult<()> {
        self.storage.copy_into(out)
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
