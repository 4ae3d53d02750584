//! Move-update algebra for the interblock matrix.
//!
//! Both kinds of edit, a single vertex moving from block `r` to `s` and
//! block `r` being folded into `s`, touch only rows and columns `r` and
//! `s`. They are computed against a read-only matrix and returned as a
//! [`MoveResult`]; nothing is written until
//! [`EdgeCountMatrix::commit`](crate::edge_counts::EdgeCountMatrix::commit).

use crate::edge_counts::EdgeCountMatrix;
use crate::error::check_block;
use crate::neighborhood::{BlockCounts, VertexNeighborhood};
use ndarray::Array1;

/// A candidate edit of the block structure.
#[derive(Debug, Clone)]
pub enum InterblockUpdate {
    /// Move one vertex from block `r` to block `s`
    SingleMove {
        /// current block of the vertex
        r: usize,
        /// proposed block
        s: usize,
        /// neighbor block -> weight of the vertex's out-edges
        out_counts: BlockCounts,
        /// neighbor block -> weight of the vertex's in-edges
        in_counts: BlockCounts,
        /// weight of the vertex's self-loops
        self_weight: i64,
    },
    /// Absorb all of block `r` into block `s`
    AgglomerativeMerge {
        /// block being eliminated
        r: usize,
        /// block receiving the mass
        s: usize,
    },
}

/// New rows and columns of blocks `r` and `s` after an update.
///
/// All other rows and columns are unchanged. Cells in the `{r, s}`
/// sub-block appear in both a row and a column and agree there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveResult {
    /// source block
    pub r: usize,
    /// destination block
    pub s: usize,
    /// new row `r` (mass into `r`, by source block)
    pub r_row: Array1<i64>,
    /// new column `r` (mass out of `r`, by destination block)
    pub r_col: Array1<i64>,
    /// new row `s`
    pub s_row: Array1<i64>,
    /// new column `s`
    pub s_col: Array1<i64>,
}

impl InterblockUpdate {
    /// Move the vertex described by `neighborhood` into block `s`.
    pub fn single_move(neighborhood: &VertexNeighborhood, s: usize) -> Self {
        InterblockUpdate::SingleMove {
            r: neighborhood.block,
            s,
            out_counts: neighborhood.out_counts.clone(),
            in_counts: neighborhood.in_counts.clone(),
            self_weight: neighborhood.self_weight,
        }
    }

    /// Fold block `r` into block `s`.
    pub fn merge(r: usize, s: usize) -> Self {
        InterblockUpdate::AgglomerativeMerge { r, s }
    }

    /// `(r, s)`
    pub fn blocks(&self) -> (usize, usize) {
        match *self {
            InterblockUpdate::SingleMove { r, s, .. } => (r, s),
            InterblockUpdate::AgglomerativeMerge { r, s } => (r, s),
        }
    }

    /// Check that `r`, `s` and every key of the block-count maps lie in
    /// `0..num_blocks`.
    pub fn validate(&self, num_blocks: usize) -> anyhow::Result<()> {
        let (r, s) = self.blocks();
        check_block(r, num_blocks)?;
        check_block(s, num_blocks)?;
        if let InterblockUpdate::SingleMove {
            out_counts,
            in_counts,
            ..
        } = self
        {
            for &t in out_counts.keys().chain(in_counts.keys()) {
                check_block(t, num_blocks)?;
            }
        }
        Ok(())
    }

    /// Compute the four changed vectors against `matrix`.
    ///
    /// # Panics
    ///
    /// If [`validate`](Self::validate) would fail for `matrix.num_blocks()`.
    pub fn compute(&self, matrix: &EdgeCountMatrix) -> MoveResult {
        match self {
            InterblockUpdate::SingleMove {
                r,
                s,
                out_counts,
                in_counts,
                self_weight,
            } => single_move(matrix, *r, *s, out_counts, in_counts, *self_weight),
            InterblockUpdate::AgglomerativeMerge { r, s } => merge(matrix, *r, *s),
        }
    }
}

impl MoveResult {
    /// Current rows and columns of `r` and `s`, i.e. the no-op update
    pub fn unchanged(matrix: &EdgeCountMatrix, r: usize, s: usize) -> Self {
        MoveResult {
            r,
            s,
            r_row: matrix.row(r).to_owned(),
            r_col: matrix.col(r).to_owned(),
            s_row: matrix.row(s).to_owned(),
            s_col: matrix.col(s).to_owned(),
        }
    }

    /// Total mass carried by the `r` and `s` rows and columns, counting
    /// each cell of the `{r, s}` sub-block once.
    pub fn mass(&self) -> i64 {
        let (r, s) = (self.r, self.s);
        let rows = self.r_row.sum() + self.s_row.sum();
        let cols: i64 = self
            .r_col
            .iter()
            .zip(self.s_col.iter())
            .enumerate()
            .filter(|&(i, _)| i != r && i != s)
            .map(|(_, (&a, &b))| a + b)
            .sum();
        rows + cols
    }
}

/// Vertex `v` leaves `r` for `s`.
///
/// An out-edge `v -> u` with `u` in block `t` moves cell `(t, r)` to
/// `(t, s)`; an in-edge `u -> v` moves `(r, t)` to `(s, t)`. When `t` is
/// `r` or `s` the cell also lives in row/column `r` or `s`, so both
/// copies are patched. A self-loop is listed under `r` in both maps,
/// which takes `2w` off `(r, r)` and puts `w` on each of `(r, s)` and
/// `(s, r)`; the loop really goes from `(r, r)` to `(s, s)`, so all four
/// cells are corrected afterwards.
fn single_move(
    matrix: &EdgeCountMatrix,
    r: usize,
    s: usize,
    out_counts: &BlockCounts,
    in_counts: &BlockCounts,
    self_weight: i64,
) -> MoveResult {
    let mut res = MoveResult::unchanged(matrix, r, s);
    if r == s {
        return res;
    }

    for (&t, &w) in out_counts {
        res.r_col[t] -= w;
        res.s_col[t] += w;
        if t == r {
            res.r_row[r] -= w;
            res.r_row[s] += w;
        }
        if t == s {
            res.s_row[r] -= w;
            res.s_row[s] += w;
        }
    }

    for (&t, &w) in in_counts {
        res.r_row[t] -= w;
        res.s_row[t] += w;
        if t == r {
            res.r_col[r] -= w;
            res.r_col[s] += w;
        }
        if t == s {
            res.s_col[r] -= w;
            res.s_col[s] += w;
        }
    }

    if self_weight != 0 {
        res.r_row[r] += self_weight;
        res.r_col[r] += self_weight;
        res.r_row[s] -= self_weight;
        res.s_col[r] -= self_weight;
        res.s_row[r] -= self_weight;
        res.r_col[s] -= self_weight;
        res.s_row[s] += self_weight;
        res.s_col[s] += self_weight;
    }

    debug_assert!(
        [&res.r_row, &res.r_col, &res.s_row, &res.s_col]
            .iter()
            .all(|v| v.iter().all(|&x| x >= 0)),
        "move {} -> {} drove a count negative",
        r,
        s
    );
    res
}

/// Block `r` disappears into `s`.
///
/// Row and column `r` become zero. Row/column `s` become the sum of the
/// old `r` and `s` rows/columns, except that the four cells
/// `(r,r)`, `(r,s)`, `(s,r)`, `(s,s)` all collapse onto `(s,s)`.
fn merge(matrix: &EdgeCountMatrix, r: usize, s: usize) -> MoveResult {
    if r == s {
        return MoveResult::unchanged(matrix, r, s);
    }

    let num_blocks = matrix.num_blocks();
    let mut s_row = &matrix.row(s) + &matrix.row(r);
    let mut s_col = &matrix.col(s) + &matrix.col(r);

    let inside = matrix.get(r, r) + matrix.get(r, s) + matrix.get(s, r) + matrix.get(s, s);
    s_row[r] = 0;
    s_row[s] = inside;
    s_col[r] = 0;
    s_col[s] = inside;

    MoveResult {
        r,
        s,
        r_row: Array1::zeros(num_blocks),
        r_col: Array1::zeros(num_blocks),
        s_row,
        s_col,
    }
}
