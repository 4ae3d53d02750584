//! Neighbor-sampling distributions for the proposal step.

use crate::degrees::BlockDegrees;
use crate::edge_counts::EdgeCountMatrix;
use crate::error::{check_block, InterblockError};
use ndarray::Array1;

/// Probability of proposing each block, given neighbor block `block`.
///
/// Proportional to the total (in + out) mass shared with `block`:
/// `(M[:, block] + M[block, :]) / d[block]`. The self cell is counted
/// from both sides, which is exactly what makes it sum to one.
pub fn neighbor_probabilities(
    matrix: &EdgeCountMatrix,
    degrees: &BlockDegrees,
    block: usize,
) -> anyhow::Result<Array1<f64>> {
    check_block(block, matrix.num_blocks())?;

    let mass = &matrix.col(block) + &matrix.row(block);
    let total = mass.sum();
    if degrees.d[block] != total {
        return Err(InterblockError::InconsistentDegree {
            block,
            cached: degrees.d[block],
            actual: total,
        }
        .into());
    }
    if total == 0 {
        anyhow::bail!("block {} has no incident edges to propose from", block);
    }

    let d = total as f64;
    Ok(mass.mapv(|x| x as f64 / d))
}

/// Same as [`neighbor_probabilities`] with block `exclude` ruled out and
/// the rest renormalised, as needed when a block proposes a merge
/// partner other than itself.
///
/// Returns `None` when nothing but `exclude` shares mass with `block`.
pub fn merge_probabilities(
    matrix: &EdgeCountMatrix,
    degrees: &BlockDegrees,
    block: usize,
    exclude: usize,
) -> anyhow::Result<Option<Array1<f64>>> {
    check_block(exclude, matrix.num_blocks())?;
    let mut prob = neighbor_probabilities(matrix, degrees, block)?;
    prob[exclude] = 0.0;

    let total = prob.sum();
    if total <= 0.0 {
        return Ok(None);
    }
    prob /= total;
    Ok(Some(prob))
}
