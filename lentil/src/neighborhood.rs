//! Block-count maps describing how a vertex's edges spread over blocks.

use crate::error::InterblockError;
use crate::graph::Adjacency;
use fnv::FnvHashMap;

/// Sparse map from neighbor block to signed edge mass. Absent key = 0.
pub type BlockCounts = FnvHashMap<usize, i64>;

/// Sum two block-count maps key by key.
pub fn merge_counts(a: &BlockCounts, b: &BlockCounts) -> BlockCounts {
    let mut out = a.clone();
    for (&t, &w) in b {
        *out.entry(t).or_insert(0) += w;
    }
    out
}

/// Incident edges of one vertex, grouped by the *current* block of the
/// other endpoint.
///
/// A self-loop `v -> v` lands in both maps under `v`'s own block and is
/// also reported separately as `self_weight`, since after a move it no
/// longer behaves like an ordinary neighbor edge.
#[derive(Debug, Clone, Default)]
pub struct VertexNeighborhood {
    /// The vertex
    pub vertex: usize,
    /// Its current block
    pub block: usize,
    /// Block of destination -> weight of out-edges
    pub out_counts: BlockCounts,
    /// Block of source -> weight of in-edges
    pub in_counts: BlockCounts,
    /// Weight of `v -> v` edges
    pub self_weight: i64,
    /// Out-degree of the vertex
    pub k_out: i64,
    /// In-degree of the vertex
    pub k_in: i64,
    /// `k_out + k_in`
    pub k: i64,
}

impl VertexNeighborhood {
    /// Group the edges of `vertex` by neighbor block.
    ///
    /// * `adjacency` - the graph
    /// * `partition` - current block of every vertex
    /// * `vertex` - the vertex about to move
    pub fn collect(
        adjacency: &Adjacency,
        partition: &[usize],
        vertex: usize,
    ) -> anyhow::Result<Self> {
        let num_vertices = adjacency.num_vertices();
        if vertex >= num_vertices {
            return Err(InterblockError::VertexOutOfRange {
                vertex,
                num_vertices,
            }
            .into());
        }
        if partition.len() != num_vertices {
            return Err(InterblockError::ShapeMismatch {
                expected_rows: num_vertices,
                expected_cols: 1,
                rows: partition.len(),
                cols: 1,
            }
            .into());
        }

        let mut nb = VertexNeighborhood {
            vertex,
            block: partition[vertex],
            ..Default::default()
        };

        for &(dst, w) in adjacency.out_neighbors(vertex) {
            *nb.out_counts.entry(partition[dst]).or_insert(0) += w;
            nb.k_out += w;
            if dst == vertex {
                nb.self_weight += w;
            }
        }
        for &(src, w) in adjacency.in_neighbors(vertex) {
            *nb.in_counts.entry(partition[src]).or_insert(0) += w;
            nb.k_in += w;
        }
        nb.k = nb.k_out + nb.k_in;
        Ok(nb)
    }

    /// Per-block total (out + in) weight between the vertex and each
    /// neighbor block
    pub fn total_counts(&self) -> BlockCounts {
        merge_counts(&self.out_counts, &self.in_counts)
    }

    /// Sorted neighbor blocks
    pub fn neighbor_blocks(&self) -> Vec<usize> {
        let mut blocks: Vec<usize> = self
            .out_counts
            .keys()
            .chain(self.in_counts.keys())
            .copied()
            .collect();
        blocks.sort_unstable();
        blocks.dedup();
        blocks
    }
}
