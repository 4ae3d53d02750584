//! Description length of a degree-corrected Poisson block model.
//!
//! # Per-cell likelihood term
//!
//! ```text
//! term(dst, src) = M[dst, src] * ln(M[dst, src] / d_in[dst] / d_out[src])
//! ```
//!
//! Cells with zero count contribute nothing and are never passed to `ln`.
//!
//! # Model term
//!
//! With `x = B²/E`,
//!
//! ```text
//! model = E * (1 + x) * ln(1 + x) - x * ln(x) + N * ln(B)
//! ```

use crate::degrees::BlockDegrees;
use crate::edge_counts::EdgeCountMatrix;
use crate::error::InterblockError;
use crate::update::MoveResult;
use ndarray::ArrayView1;

/// `count * ln(count / d_in_dst / d_out_src)` for a non-zero cell
#[inline]
fn cell_term(count: i64, d_in_dst: i64, d_out_src: i64) -> f64 {
    debug_assert!(count > 0, "{}", InterblockError::DegenerateLog(count));
    debug_assert!(
        d_in_dst >= count && d_out_src >= count,
        "cell {} exceeds its block degrees ({}, {})",
        count,
        d_in_dst,
        d_out_src
    );
    let c = count as f64;
    c * (c / d_in_dst as f64 / d_out_src as f64).ln()
}

/// Sum of terms over row `dst`, i.e. over all sources
fn row_terms(row: ArrayView1<i64>, dst: usize, degrees: &BlockDegrees) -> f64 {
    let d_in = degrees.d_in[dst];
    row.iter()
        .enumerate()
        .filter(|&(_, &x)| x != 0)
        .map(|(src, &x)| cell_term(x, d_in, degrees.d_out[src]))
        .sum()
}

/// Sum of terms over column `src`, skipping rows `r` and `s`
fn col_terms(col: ArrayView1<i64>, src: usize, r: usize, s: usize, degrees: &BlockDegrees) -> f64 {
    let d_out = degrees.d_out[src];
    col.iter()
        .enumerate()
        .filter(|&(dst, &x)| x != 0 && dst != r && dst != s)
        .map(|(dst, &x)| cell_term(x, degrees.d_in[dst], d_out))
        .sum()
}

/// Change in description length caused by a computed move.
///
/// Only cells in rows/columns `r` and `s` change. Rows are summed in
/// full; columns skip the `r` and `s` entries, which the rows already
/// cover. The model term is unchanged since `B`, `N` and `E` are.
///
/// * `matrix` - the live matrix, before the move
/// * `result` - rows/columns after the move
/// * `old` - degrees matching `matrix`
/// * `new` - degrees after the move
///
/// Negative means the move lowers the description length.
pub fn delta_entropy(
    matrix: &EdgeCountMatrix,
    result: &MoveResult,
    old: &BlockDegrees,
    new: &BlockDegrees,
) -> f64 {
    let (r, s) = (result.r, result.s);
    if r == s {
        return 0.0;
    }

    let new_terms = row_terms(result.r_row.view(), r, new)
        + row_terms(result.s_row.view(), s, new)
        + col_terms(result.r_col.view(), r, r, s, new)
        + col_terms(result.s_col.view(), s, r, s, new);

    let old_terms = row_terms(matrix.row(r), r, old)
        + row_terms(matrix.row(s), s, old)
        + col_terms(matrix.col(r), r, r, s, old)
        + col_terms(matrix.col(s), s, r, s, old);

    old_terms - new_terms
}

/// Negative log-likelihood part: `-Σ term` over every non-zero cell
pub fn data_entropy(matrix: &EdgeCountMatrix, degrees: &BlockDegrees) -> f64 {
    let s: f64 = matrix
        .as_array()
        .indexed_iter()
        .filter(|&(_, &x)| x != 0)
        .map(|((dst, src), &x)| cell_term(x, degrees.d_in[dst], degrees.d_out[src]))
        .sum();
    -s
}

/// Model-complexity part for `B` blocks, `N` vertices and total weight `E`
pub fn model_entropy(
    num_blocks: usize,
    num_vertices: usize,
    total_weight: i64,
) -> anyhow::Result<f64> {
    if num_blocks == 0 || total_weight <= 0 {
        return Err(InterblockError::EmptyBlockSet {
            num_blocks,
            total_weight,
        }
        .into());
    }
    let e = total_weight as f64;
    let b = num_blocks as f64;
    let x = b * b / e;
    Ok(e * (1.0 + x) * (1.0 + x).ln() - x * x.ln() + num_vertices as f64 * b.ln())
}

/// Full description length of the current partition, from scratch.
///
/// * `matrix` - interblock matrix
/// * `degrees` - degrees matching `matrix`
/// * `num_vertices` - number of vertices `N`
pub fn overall_entropy(
    matrix: &EdgeCountMatrix,
    degrees: &BlockDegrees,
    num_vertices: usize,
) -> anyhow::Result<f64> {
    let model = model_entropy(matrix.num_blocks(), num_vertices, matrix.total())?;
    Ok(model + data_entropy(matrix, degrees))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::update::InterblockUpdate;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_zero_cells_contribute_nothing() {
        let m = EdgeCountMatrix::from_array(array![[2, 0, 0], [0, 0, 0], [0, 0, 3]], 3).unwrap();
        let deg = BlockDegrees::from_matrix(&m);
        let s = data_entropy(&m, &deg);

        assert!(s.is_finite());
        // each diagonal cell: -c * ln(c / c / c) = c * ln(c)
        assert_abs_diff_eq!(s, 2.0 * 2f64.ln() + 3.0 * 3f64.ln(), epsilon = 1e-12);

        let empty = EdgeCountMatrix::zeros(3);
        let deg = BlockDegrees::from_matrix(&empty);
        assert_eq!(data_entropy(&empty, &deg), 0.0);
    }

    #[test]
    fn test_model_entropy() {
        // B = 2, E = 4, N = 4: x = 1
        let expected = 4.0 * 2.0 * 2f64.ln() - 0.0 + 4.0 * 2f64.ln();
        assert_abs_diff_eq!(model_entropy(2, 4, 4).unwrap(), expected, epsilon = 1e-12);
        assert!(model_entropy(0, 4, 4).is_err());
        assert!(model_entropy(2, 4, 0).is_err());
    }

    #[test]
    fn test_delta_matches_recomputation_for_merge() {
        let m = EdgeCountMatrix::from_array(array![[3, 1, 0], [2, 4, 1], [0, 2, 5]], 3).unwrap();
        let deg = BlockDegrees::from_matrix(&m);
        let before = overall_entropy(&m, &deg, 10).unwrap();

        let update = InterblockUpdate::merge(2, 1);
        let res = update.compute(&m);
        let new_deg = deg.after_update(&update);
        let delta = delta_entropy(&m, &res, &deg, &new_deg);

        let mut merged = m.clone();
        merged.commit(&res).unwrap();
        let after = overall_entropy(&merged, &BlockDegrees::from_matrix(&merged), 10).unwrap();

        assert_abs_diff_eq!(after, before + delta, epsilon = 1e-9);
    }

    #[test]
    fn test_noop_delta_is_zero() {
        let m = EdgeCountMatrix::from_array(array![[3, 1], [2, 4]], 2).unwrap();
        let deg = BlockDegrees::from_matrix(&m);
        let res = InterblockUpdate::merge(1, 1).compute(&m);
        assert_eq!(delta_entropy(&m, &res, &deg, &deg), 0.0);
    }
}
