//! Hastings correction for neighbor-driven block proposals.
//!
//! A vertex is moved by picking one of its neighbors (block `t`) and then
//! a block in proportion to the edge mass it shares with `t`, smoothed by
//! one pseudo-count per block:
//!
//! ```text
//! p(s | t) = (M[t, s] + M[s, t] + 1) / (d[t] + B)
//! ```
//!
//! The reverse move uses the same rule on the post-move state, so the two
//! directions are generally not equally likely.

use crate::degrees::BlockDegrees;
use crate::edge_counts::EdgeCountMatrix;
use crate::neighborhood::{merge_counts, BlockCounts};
use ndarray::ArrayView1;

/// Ratio `p_backward / p_forward` for moving a vertex from `r` to `s`.
///
/// * `s` - proposed block
/// * `matrix` - the live matrix, before the move
/// * `r_row`, `r_col` - row and column of `r` after the move
/// * `old` - degrees matching `matrix`
/// * `new` - degrees after the move
/// * `out_counts`, `in_counts` - the moving vertex's edges by neighbor block
///
/// Returns 1.0 for a vertex without neighbors, whose proposal does not
/// depend on the block structure at all.
#[allow(clippy::too_many_arguments)]
pub fn hastings_correction(
    s: usize,
    matrix: &EdgeCountMatrix,
    r_row: ArrayView1<i64>,
    r_col: ArrayView1<i64>,
    old: &BlockDegrees,
    new: &BlockDegrees,
    out_counts: &BlockCounts,
    in_counts: &BlockCounts,
) -> f64 {
    let num_blocks = matrix.num_blocks() as f64;
    let counts = merge_counts(out_counts, in_counts);

    let mut p_forward = 0.0;
    let mut p_backward = 0.0;
    for (&t, &w) in &counts {
        let w = w as f64;
        let fwd_mass = (matrix.get(t, s) + matrix.get(s, t) + 1) as f64;
        let bwd_mass = (r_row[t] + r_col[t] + 1) as f64;
        p_forward += w * fwd_mass / (old.d[t] as f64 + num_blocks);
        p_backward += w * bwd_mass / (new.d[t] as f64 + num_blocks);
    }

    if p_forward == 0.0 {
        return 1.0;
    }
    p_backward / p_forward
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::update::InterblockUpdate;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn counts(pairs: &[(usize, i64)]) -> BlockCounts {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_symmetric_move_gives_one() {
        // r row/col after the move carry exactly what s shared with t before
        let m = EdgeCountMatrix::from_array(array![[2, 1, 3], [1, 2, 0], [3, 0, 4]], 3).unwrap();
        let deg = BlockDegrees::from_matrix(&m);
        let r_row = m.row(2).to_owned();
        let r_col = m.col(2).to_owned();
        let out_c = counts(&[(0, 2)]);
        let in_c = counts(&[(0, 1)]);

        let ratio = hastings_correction(2, &m, r_row.view(), r_col.view(), &deg, &deg, &out_c, &in_c);
        assert_abs_diff_eq!(ratio, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_hand_computed_ratio() {
        let m = EdgeCountMatrix::from_array(array![[1, 1], [1, 1]], 2).unwrap();
        let deg = BlockDegrees::from_matrix(&m);
        let out_c = counts(&[(1, 1)]);
        let in_c = counts(&[(0, 1)]);
        let update = InterblockUpdate::SingleMove {
            r: 0,
            s: 1,
            out_counts: out_c.clone(),
            in_counts: in_c.clone(),
            self_weight: 0,
        };
        let res = update.compute(&m);
        let new_deg = deg.after_update(&update);

        // forward: t=0 -> (M[0,1] + M[1,0] + 1) / (4 + 2), t=1 -> (M[1,1] + M[1,1] + 1) / (4 + 2)
        let fwd = 3.0 / 6.0 + 3.0 / 6.0;
        // backward: new d = [2, 6]; r_row = [0,1], r_col = [0,1]
        let bwd = (0.0 + 0.0 + 1.0) / (2.0 + 2.0) + (1.0 + 1.0 + 1.0) / (6.0 + 2.0);
        let ratio = hastings_correction(
            1,
            &m,
            res.r_row.view(),
            res.r_col.view(),
            &deg,
            &new_deg,
            &out_c,
            &in_c,
        );
        assert_abs_diff_eq!(ratio, bwd / fwd, epsilon = 1e-12);
    }

    #[test]
    fn test_isolated_vertex() {
        let m = EdgeCountMatrix::from_array(array![[1, 0], [0, 1]], 2).unwrap();
        let deg = BlockDegrees::from_matrix(&m);
        let empty = BlockCounts::default();
        let r_row = m.row(0).to_owned();
        let r_col = m.col(0).to_owned();
        let ratio = hastings_correction(1, &m, r_row.view(), r_col.view(), &deg, &deg, &empty, &empty);
        assert_eq!(ratio, 1.0);
    }
}
