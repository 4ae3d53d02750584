//! Incremental computation engine for degree-corrected stochastic block
//! model (SBM) partitioning.
//!
//! Given a directed, edge-weighted graph and an assignment of vertices to
//! `B` blocks, the engine keeps the `B×B` interblock edge-count matrix and
//! supplies the arithmetic an outer search loop needs to compare
//! partitions: block degrees, the two-part description length
//! ("entropy"), the change in it caused by moving one vertex or merging
//! two blocks, and the Hastings correction for asymmetric proposals.
//!
//! Candidate edits are computed against a read-only matrix; the only
//! writer is the commit step.
//!
//! # Matrix convention
//!
//! `M[dst, src]`: rows are in-going mass, columns are out-going mass.

#![deny(missing_docs)]
#![deny(warnings)]

/// Error taxonomy
pub mod error;

/// Directed adjacency lists built from `(src, dst, weight)` triples
pub mod graph;

/// Block-count maps and per-vertex neighborhoods
pub mod neighborhood;

/// The `B×B` interblock matrix: building, neighbor queries, commit
pub mod edge_counts;

/// Block out/in/total degrees
pub mod degrees;

/// Row/column algebra for single-vertex moves and block merges
pub mod update;

/// Proposal distributions over neighbor blocks
pub mod proposal;

/// Delta and overall description length
pub mod entropy;

/// Hastings correction for neighbor-driven proposals
pub mod hastings;

/// Matrix + degrees with read-only evaluation and a single writer
pub mod state;


pub use degrees::BlockDegrees;
pub use edge_counts::{BlockNeighbors, EdgeCountMatrix};
pub use error::InterblockError;
pub use graph::{Adjacency, WeightedEdge};
pub use neighborhood::{BlockCounts, VertexNeighborhood};
pub use state::{InterblockOptions, InterblockState, MoveEvaluation};
pub use update::{InterblockUpdate, MoveResult};
