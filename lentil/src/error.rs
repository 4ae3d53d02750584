//! Error taxonomy for the interblock engine.

use thiserror::Error;

/// Errors raised at the fallible boundaries of the engine.
///
/// Everything here is fail-fast: the caller decides whether to abort the
/// run or discard the candidate move that triggered it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InterblockError {
    /// A matrix or vector does not have the `B`-sized shape every index
    /// in the engine assumes
    #[error("shape mismatch: expected {expected_rows}x{expected_cols}, found {rows}x{cols}")]
    ShapeMismatch {
        /// rows we expected
        expected_rows: usize,
        /// columns we expected
        expected_cols: usize,
        /// rows we found
        rows: usize,
        /// columns we found
        cols: usize,
    },

    /// A block id falls outside `0..num_blocks`
    #[error("block {block} out of range for {num_blocks} blocks")]
    BlockOutOfRange {
        /// offending block id
        block: usize,
        /// number of blocks
        num_blocks: usize,
    },

    /// A vertex id falls outside `0..num_vertices`
    #[error("vertex {vertex} out of range for {num_vertices} vertices")]
    VertexOutOfRange {
        /// offending vertex id
        vertex: usize,
        /// number of vertices
        num_vertices: usize,
    },

    /// The cached degree of a block disagrees with the matrix mass
    #[error("inconsistent degree for block {block}: cached {cached}, matrix says {actual}")]
    InconsistentDegree {
        /// block whose degree drifted
        block: usize,
        /// value held in the degree vector
        cached: i64,
        /// value recomputed from the matrix
        actual: i64,
    },

    /// A log-domain term met a non-positive count
    #[error("log term evaluated on non-positive count {0}")]
    DegenerateLog(i64),

    /// A move was scored against an older state than the live one
    #[error("stale evaluation: computed at generation {evaluated}, state is at {current}")]
    StaleEvaluation {
        /// generation the move was scored against
        evaluated: u64,
        /// generation of the live state
        current: u64,
    },

    /// An entropy was requested with no blocks or no edges
    #[error("empty block model: {num_blocks} blocks, total edge weight {total_weight}")]
    EmptyBlockSet {
        /// number of blocks
        num_blocks: usize,
        /// total edge weight
        total_weight: i64,
    },
}

/// Check that `block < num_blocks`.
pub(crate) fn check_block(block: usize, num_blocks: usize) -> anyhow::Result<()> {
    if block >= num_blocks {
        return Err(InterblockError::BlockOutOfRange { block, num_blocks }.into());
    }
    Ok(())
}
