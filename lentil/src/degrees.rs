//! Block degrees derived from the interblock matrix.
//!
//! With `M[dst, src]`, row sums are in-degrees and column sums are
//! out-degrees. Everything downstream depends on this mapping.

use crate::edge_counts::EdgeCountMatrix;
use crate::error::InterblockError;
use crate::update::InterblockUpdate;
use ndarray::{Array1, Axis};

/// Out-, in- and total degree of every block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDegrees {
    /// Column sums of `M`
    pub d_out: Array1<i64>,
    /// Row sums of `M`
    pub d_in: Array1<i64>,
    /// `d_out + d_in`
    pub d: Array1<i64>,
}

impl BlockDegrees {
    /// Derive degree vectors from scratch.
    pub fn from_matrix(matrix: &EdgeCountMatrix) -> Self {
        let counts = matrix.as_array();
        let d_in = counts.sum_axis(Axis(1));
        let d_out = counts.sum_axis(Axis(0));
        let d = &d_out + &d_in;
        BlockDegrees { d_out, d_in, d }
    }

    /// Number of blocks
    pub fn num_blocks(&self) -> usize {
        self.d.len()
    }

    /// Degrees after `update`, without rescanning the matrix.
    ///
    /// A single move shifts the vertex's own out/in degree from `r` to
    /// `s`; a merge hands all of `r`'s degree to `s`.
    pub fn after_update(&self, update: &InterblockUpdate) -> Self {
        let mut out = self.clone();
        let (r, s) = update.blocks();
        if r == s {
            return out;
        }

        let (k_out, k_in): (i64, i64) = match update {
            InterblockUpdate::SingleMove {
                out_counts,
                in_counts,
                ..
            } => (out_counts.values().sum(), in_counts.values().sum()),
            InterblockUpdate::AgglomerativeMerge { .. } => (self.d_out[r], self.d_in[r]),
        };

        out.d_out[r] -= k_out;
        out.d_out[s] += k_out;
        out.d_in[r] -= k_in;
        out.d_in[s] += k_in;
        out.d[r] = out.d_out[r] + out.d_in[r];
        out.d[s] = out.d_out[s] + out.d_in[s];

        debug_assert!(out.d_out[r] >= 0 && out.d_in[r] >= 0);
        out
    }

    /// Compare against degrees recomputed from `matrix`.
    pub fn verify(&self, matrix: &EdgeCountMatrix) -> anyhow::Result<()> {
        let fresh = Self::from_matrix(matrix);
        if fresh.num_blocks() != self.num_blocks() {
            return Err(InterblockError::ShapeMismatch {
                expected_rows: fresh.num_blocks(),
                expected_cols: 1,
                rows: self.num_blocks(),
                cols: 1,
            }
            .into());
        }

        let cached = self.d_out.iter().chain(self.d_in.iter());
        let actual = fresh.d_out.iter().chain(fresh.d_in.iter());
        let num_blocks = self.num_blocks();

        for (i, (&c, &a)) in cached.zip(actual).enumerate() {
            if c != a {
                return Err(InterblockError::InconsistentDegree {
                    block: i % num_blocks,
                    cached: c,
                    actual: a,
                }
                .into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_axes_follow_convention() {
        // 3 units from block 0 into block 1, 1 unit inside block 0
        let m = EdgeCountMatrix::from_array(array![[1, 0], [3, 0]], 2).unwrap();
        let deg = BlockDegrees::from_matrix(&m);

        assert_eq!(deg.d_out, array![4, 0]);
        assert_eq!(deg.d_in, array![1, 3]);
        assert_eq!(deg.d, array![5, 3]);
    }

    #[test]
    fn test_merge_degrees() {
        let m = EdgeCountMatrix::from_array(array![[1, 2, 0], [0, 3, 1], [4, 0, 5]], 3).unwrap();
        let deg = BlockDegrees::from_matrix(&m);
        let merged = deg.after_update(&InterblockUpdate::merge(0, 2));

        assert_eq!(merged.d_out[0], 0);
        assert_eq!(merged.d_in[0], 0);
        assert_eq!(merged.d_out[2], deg.d_out[0] + deg.d_out[2]);
        assert_eq!(merged.d_in[2], deg.d_in[0] + deg.d_in[2]);
        assert_eq!(merged.d[1], deg.d[1]);
        assert_eq!(merged.d_out.sum(), deg.d_out.sum());
    }

    #[test]
    fn test_verify_reports_drift() {
        let m = EdgeCountMatrix::from_array(array![[1, 2], [0, 3]], 2).unwrap();
        let mut deg = BlockDegrees::from_matrix(&m);
        assert!(deg.verify(&m).is_ok());

        deg.d_in[1] = 0;
        let err = deg.verify(&m).unwrap_err();
        assert_eq!(
            err.downcast_ref::<InterblockError>(),
            Some(&InterblockError::InconsistentDegree {
                block: 1,
                cached: 0,
                actual: 3
            })
        );
    }
}
