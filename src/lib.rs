//! Set-reconciliation and reconstruction of fixed-length DNA k-mers with
//! invertible Bloom lookup tables and rolling tabulation hashes.
//!
//! The crate is organized as three layers:
//! - a packed 2-bit k-mer codec plus a tabulation hash with O(1) rolling
//!   and substitution updates ([`kmerpump::kmer`], [`kmerpump::tabulation`]),
//! - a multi-table XOR sketch with peeling decode and a tabu cycle-breaker
//!   ([`kmerpump::table`], [`kmerpump::sketch`]),
//! - the "pump": a DFS over rolling-hash edges that expands decoded seed
//!   k-mers into the full input set ([`kmerpump::pump`]), composed into
//!   experiment pipelines in [`kmerpump::pipeline`].

pub mod cli;
pub mod kmerpump;

/// Shorthand `Result` alias for the core operations of this crate.
pub type Result<T, E = SketchError> = std::result::Result<T, E>;

/// Errors raised by the codec, hashers, and sketch layers.
///
/// Incomplete sketch decode is *not* an error: `decode` returns whatever it
/// peeled and callers compare against the expected count.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SketchError {
    /// Bad nucleotide character, empty sequence, zero length, zero
    /// sampling modulus, or zero tables.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// K-mer position or cell index out of range.
    #[error("position {pos} out of bounds for length {len}")]
    OutOfBounds { pos: usize, len: usize },

    /// XOR of items of different lengths.
    #[error("length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },
}
