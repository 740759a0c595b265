use thiserror::Error;

pub type CodingResult<T> = Result<T, CodingError>;

/// Failures raised by the coding engine.
///
/// Redundant payloads are not errors; the decoder absorbs them silently.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodingError {
    /// A caller supplied buffer has the wrong length.
    #[error("size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("symbol index {index} out of range for generation of {symbols} symbols")]
    SymbolIndexOutOfRange { index: usize, symbols: usize },

    /// Inverse of the zero element was requested. Pivot selection never
    /// asks for this, so seeing it means the elimination is broken.
    #[error("division by zero in GF(2^8)")]
    DivisionByZero,

    #[error("encoder not fully initialized: {initialized} of {symbols} symbols set")]
    NotFullyInitialized { initialized: usize, symbols: usize },

    #[error("invalid coder configuration: {reason}")]
    InvalidConfig { reason: &'static str },
}
