//! Diagnostic side channel for coders.
//!
//! A coder owns a [`Tracer`] which forwards zone events to an injected
//! [`TraceSink`]. The default sink is disabled, so messages are never
//! formatted unless someone is listening.

use alloc::boxed::Box;
use alloc::string::String;
use core::fmt;

/// Instrumentation points inside the encoder and decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Zone {
    /// Coefficients of a payload entering the decoder.
    InputSymbolCoefficients,
    /// One elimination step against an existing pivot row.
    RowReduction,
    /// A new pivot column was claimed.
    PivotFound,
    /// Payload reduced to zero and was dropped.
    RedundantSymbol,
    /// Per-row summary of the decoding matrix.
    DecoderState,
    /// Rank reached the generation size.
    DecoderComplete,
    /// Coefficients of a payload leaving an encoder or recoder.
    OutputSymbolCoefficients,
    /// Systematic/coded phase changes.
    EncoderPhase,
}

impl Zone {
    pub const ALL: [Zone; 8] = [
        Zone::InputSymbolCoefficients,
        Zone::RowReduction,
        Zone::PivotFound,
        Zone::RedundantSymbol,
        Zone::DecoderState,
        Zone::DecoderComplete,
        Zone::OutputSymbolCoefficients,
        Zone::EncoderPhase,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Zone::InputSymbolCoefficients => "input_symbol_coefficients",
            Zone::RowReduction => "row_reduction",
            Zone::PivotFound => "pivot_found",
            Zone::RedundantSymbol => "redundant_symbol",
            Zone::DecoderState => "decoder_state",
            Zone::DecoderComplete => "decoder_complete",
            Zone::OutputSymbolCoefficients => "output_symbol_coefficients",
            Zone::EncoderPhase => "encoder_phase",
        }
    }

    /// Looks a zone up by its trace name.
    pub fn from_name(name: &str) -> Option<Zone> {
        Zone::ALL.iter().copied().find(|z| z.name() == name)
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Receiver of zone events.
pub trait TraceSink {
    /// Whether `zone` should be reported at all. Checked before formatting.
    fn enabled(&self, _zone: Zone) -> bool {
        true
    }

    fn trace(&mut self, zone: Zone, message: &str);
}

/// The default sink. Reports nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTrace;

impl TraceSink for NoopTrace {
    fn enabled(&self, _zone: Zone) -> bool {
        false
    }

    fn trace(&mut self, _zone: Zone, _message: &str) {}
}

/// Forwards every zone to a closure.
pub struct CallbackTrace<F> {
    callback: F,
}

impl<F: FnMut(Zone, &str)> CallbackTrace<F> {
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F: FnMut(Zone, &str)> TraceSink for CallbackTrace<F> {
    fn trace(&mut self, zone: Zone, message: &str) {
        (self.callback)(zone, message)
    }
}

/// Only lets zones accepted by `predicate` through to `inner`.
pub struct FilteredTrace<P, S> {
    predicate: P,
    inner: S,
}

impl<P: Fn(Zone) -> bool, S: TraceSink> FilteredTrace<P, S> {
    pub fn new(predicate: P, inner: S) -> Self {
        Self { predicate, inner }
    }
}

impl<P: Fn(Zone) -> bool, S: TraceSink> TraceSink for FilteredTrace<P, S> {
    fn enabled(&self, zone: Zone) -> bool {
        (self.predicate)(zone) && self.inner.enabled(zone)
    }

    fn trace(&mut self, zone: Zone, message: &str) {
        if (self.predicate)(zone) {
            self.inner.trace(zone, message);
        }
    }
}

/// Owned handle to the active sink of one coder.
pub struct Tracer {
    sink: Box<dyn TraceSink + Send>,
    active: bool,
}

impl Tracer {
    pub fn new() -> Self {
        Self { sink: Box::new(NoopTrace), active: false }
    }

    pub fn set_sink(&mut self, sink: Box<dyn TraceSink + Send>) {
        self.sink = sink;
        self.active = true;
    }

    pub fn set_callback<F>(&mut self, callback: F)
    where
        F: FnMut(Zone, &str) + Send + 'static,
    {
        self.set_sink(Box::new(CallbackTrace::new(callback)));
    }

    pub fn set_filtered<P, F>(&mut self, predicate: P, callback: F)
    where
        P: Fn(Zone) -> bool + Send + 'static,
        F: FnMut(Zone, &str) + Send + 'static,
    {
        self.set_sink(Box::new(FilteredTrace::new(predicate, CallbackTrace::new(callback))));
    }

    pub fn clear(&mut self) {
        self.sink = Box::new(NoopTrace);
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    #[inline]
    pub fn enabled(&self, zone: Zone) -> bool {
        self.active && self.sink.enabled(zone)
    }

    /// Reports `zone`, building the message only if the sink wants it.
    #[inline]
    pub fn emit<M>(&mut self, zone: Zone, message: M)
    where
        M: FnOnce() -> String,
    {
        if self.enabled(zone) {
            let text = message();
            self.sink.trace(zone, &text);
        }
    }
}

impl Default for Tracer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Tracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracer").field("active", &self.active).finish()
    }
}

/// Renders coefficients as space separated hex, the way trace messages show them.
pub fn hex_row(bytes: &[u8]) -> String {
    use core::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{:02x}", b);
    }
    out
}
