//! Interblock edge-count matrix.
//!
//! Convention: `M[dst, src]` holds the total weight of edges whose source
//! vertex sits in block `src` and whose destination vertex sits in block
//! `dst`. Row `b` is therefore the mass flowing *into* `b` (indexed by
//! source block) and column `b` the mass flowing *out of* `b` (indexed by
//! destination block).

use crate::error::{check_block, InterblockError};
use crate::graph::WeightedEdge;
use crate::neighborhood::BlockCounts;
use crate::update::MoveResult;
use log::{debug, trace};
use ndarray::{Array2, ArrayView1};

/// B×B matrix of non-negative interblock edge counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeCountMatrix {
    counts: Array2<i64>,
}

/// Neighbor blocks of one block, read directly off the matrix.
#[derive(Debug, Clone, Default)]
pub struct BlockNeighbors {
    /// Destination block -> mass sent there by this block
    pub out_counts: BlockCounts,
    /// Source block -> mass received from there by this block
    pub in_counts: BlockCounts,
    /// Sorted union of the keys of `out_counts` and `in_counts`
    pub neighbors: Vec<usize>,
    /// Out-degree of the block
    pub k_out: i64,
    /// In-degree of the block
    pub k_in: i64,
    /// `k_out + k_in`
    pub k: i64,
}

impl EdgeCountMatrix {
    /// All-zero matrix for `num_blocks` blocks
    pub fn zeros(num_blocks: usize) -> Self {
        EdgeCountMatrix {
            counts: Array2::zeros((num_blocks, num_blocks)),
        }
    }

    /// Wrap an existing count array, which must be `num_blocks` square
    /// and free of negative entries.
    pub fn from_array(counts: Array2<i64>, num_blocks: usize) -> anyhow::Result<Self> {
        let (rows, cols) = counts.dim();
        if rows != num_blocks || cols != num_blocks {
            return Err(InterblockError::ShapeMismatch {
                expected_rows: num_blocks,
                expected_cols: num_blocks,
                rows,
                cols,
            }
            .into());
        }
        if let Some(((dst, src), &x)) = counts.indexed_iter().find(|(_, x)| **x < 0) {
            anyhow::bail!("negative edge count {} at ({}, {})", x, dst, src);
        }
        Ok(EdgeCountMatrix { counts })
    }

    /// Aggregate a vertex-level graph into block counts.
    ///
    /// * `edges` - `(src, dst, weight)` triples; self-loops and multi-edges accumulate
    /// * `partition` - block of every vertex, each in `0..num_blocks`
    /// * `num_blocks` - number of blocks `B`
    pub fn from_partition<I>(edges: I, partition: &[usize], num_blocks: usize) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = WeightedEdge>,
    {
        let mut matrix = Self::zeros(num_blocks);
        matrix.accumulate(edges, partition)?;
        Ok(matrix)
    }

    /// Add `M[partition[dst], partition[src]] += weight` for every edge.
    pub fn accumulate<I>(&mut self, edges: I, partition: &[usize]) -> anyhow::Result<()>
    where
        I: IntoIterator<Item = WeightedEdge>,
    {
        let num_blocks = self.num_blocks();
        if let Some(&b) = partition.iter().find(|&&b| b >= num_blocks) {
            return Err(InterblockError::BlockOutOfRange {
                block: b,
                num_blocks,
            }
            .into());
        }

        let num_vertices = partition.len();
        let mut num_edges = 0usize;
        for (src, dst, w) in edges {
            for v in [src, dst] {
                if v >= num_vertices {
                    return Err(InterblockError::VertexOutOfRange {
                        vertex: v,
                        num_vertices,
                    }
                    .into());
                }
            }
            if w <= 0 {
                anyhow::bail!("edge {} -> {} has non-positive weight {}", src, dst, w);
            }
            self.counts[(partition[dst], partition[src])] += w;
            num_edges += 1;
        }

        debug!(
            "accumulated {} edges into {}x{} interblock matrix",
            num_edges, num_blocks, num_blocks
        );
        Ok(())
    }

    /// Number of blocks `B`
    pub fn num_blocks(&self) -> usize {
        self.counts.nrows()
    }

    /// Edge mass from block `src` into block `dst`
    #[inline]
    pub fn get(&self, dst: usize, src: usize) -> i64 {
        self.counts[(dst, src)]
    }

    /// Row `block`: mass into `block`, indexed by source block
    pub fn row(&self, block: usize) -> ArrayView1<'_, i64> {
        self.counts.row(block)
    }

    /// Column `block`: mass out of `block`, indexed by destination block
    pub fn col(&self, block: usize) -> ArrayView1<'_, i64> {
        self.counts.column(block)
    }

    /// Underlying dense array
    pub fn as_array(&self) -> &Array2<i64> {
        &self.counts
    }

    /// Total edge weight held in the matrix
    pub fn total(&self) -> i64 {
        self.counts.sum()
    }

    /// Neighbor blocks and degree contributions of `block`.
    ///
    /// Only non-zero entries of column `block` (out) and row `block` (in)
    /// are reported. The block itself is listed when it has self mass.
    pub fn block_neighbors(&self, block: usize) -> BlockNeighbors {
        let mut out = BlockNeighbors::default();

        for (dst, &x) in self.col(block).iter().enumerate() {
            if x != 0 {
                out.out_counts.insert(dst, x);
                out.k_out += x;
            }
        }
        for (src, &x) in self.row(block).iter().enumerate() {
            if x != 0 {
                out.in_counts.insert(src, x);
                out.k_in += x;
            }
        }
        out.k = out.k_out + out.k_in;

        let mut neighbors: Vec<usize> = out
            .out_counts
            .keys()
            .chain(out.in_counts.keys())
            .copied()
            .collect();
        neighbors.sort_unstable();
        neighbors.dedup();
        out.neighbors = neighbors;
        out
    }

    /// Overwrite rows and columns `r` and `s` with a computed move.
    ///
    /// This is the only way the live matrix changes after construction;
    /// call it only once the move has been accepted. The matrix cannot
    /// tell whether `result` was computed against its current contents;
    /// [`InterblockState`](crate::state::InterblockState) tracks that.
    pub fn commit(&mut self, result: &MoveResult) -> anyhow::Result<()> {
        let num_blocks = self.num_blocks();
        let (r, s) = (result.r, result.s);
        check_block(r, num_blocks)?;
        check_block(s, num_blocks)?;

        for v in [&result.r_row, &result.r_col, &result.s_row, &result.s_col] {
            if v.len() != num_blocks {
                return Err(InterblockError::ShapeMismatch {
                    expected_rows: num_blocks,
                    expected_cols: 1,
                    rows: v.len(),
                    cols: 1,
                }
                .into());
            }
        }

        // the four vectors overlap at the (r|s, r|s) cells and must agree there
        debug_assert_eq!(result.r_row[r], result.r_col[r]);
        debug_assert_eq!(result.r_row[s], result.s_col[r]);
        debug_assert_eq!(result.s_row[r], result.r_col[s]);
        debug_assert_eq!(result.s_row[s], result.s_col[s]);

        self.counts.row_mut(r).assign(&result.r_row);
        self.counts.column_mut(r).assign(&result.r_col);
        self.counts.row_mut(s).assign(&result.s_row);
        self.counts.column_mut(s).assign(&result.s_col);

        debug_assert!(self.counts.iter().all(|&x| x >= 0));
        trace!("committed move {} -> {}", r, s);
        Ok(())
    }
}
