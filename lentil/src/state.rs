//! Live interblock state: one matrix, its degrees, and a single writer.
//!
//! Evaluating candidates borrows the state immutably, so any number of
//! them can be scored at once (see [`InterblockState::evaluate_all`]).
//! Only [`InterblockState::commit`] needs `&mut self`.

use crate::degrees::BlockDegrees;
use crate::edge_counts::EdgeCountMatrix;
use crate::entropy::{delta_entropy, overall_entropy};
use crate::error::InterblockError;
use crate::graph::WeightedEdge;
use crate::hastings::hastings_correction;
use crate::update::{InterblockUpdate, MoveResult};
use log::{debug, info};
use rayon::prelude::*;

/// Options for the interblock state.
#[derive(Debug, Clone)]
pub struct InterblockOptions {
    /// Re-derive degrees from the matrix after every commit and fail on
    /// drift from the incrementally updated ones. Default: false
    pub verify_degrees: bool,
    /// Smallest chunk of candidates handed to one rayon task. Default: 256
    pub min_chunk_size: usize,
}

impl Default for InterblockOptions {
    fn default() -> Self {
        InterblockOptions {
            verify_degrees: false,
            min_chunk_size: 256,
        }
    }
}

/// A scored candidate, ready to be committed if accepted.
#[derive(Debug, Clone)]
pub struct MoveEvaluation {
    /// New rows/columns of `r` and `s`
    pub result: MoveResult,
    /// Block degrees after the move
    pub degrees: BlockDegrees,
    /// Change in description length (negative is better)
    pub delta_entropy: f64,
    /// `p_backward / p_forward`; only defined for single-vertex moves
    pub hastings: Option<f64>,
    /// Generation of the state this was computed against
    pub generation: u64,
}

/// Interblock matrix together with its degree vectors.
#[derive(Debug, Clone)]
pub struct InterblockState {
    matrix: EdgeCountMatrix,
    degrees: BlockDegrees,
    options: InterblockOptions,
    generation: u64,
}

impl InterblockState {
    /// Wrap a matrix and derive its degrees.
    pub fn new(matrix: EdgeCountMatrix, options: InterblockOptions) -> Self {
        let degrees = BlockDegrees::from_matrix(&matrix);
        InterblockState {
            matrix,
            degrees,
            options,
            generation: 0,
        }
    }

    /// Build the matrix from a graph and a partition.
    ///
    /// * `edges` - `(src, dst, weight)` triples
    /// * `partition` - block of every vertex
    /// * `num_blocks` - number of blocks `B`
    /// * `options` - see [`InterblockOptions`]
    pub fn from_partition<I>(
        edges: I,
        partition: &[usize],
        num_blocks: usize,
        options: InterblockOptions,
    ) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = WeightedEdge>,
    {
        let matrix = EdgeCountMatrix::from_partition(edges, partition, num_blocks)?;
        info!(
            "interblock state: {} vertices, {} blocks, total weight {}",
            partition.len(),
            num_blocks,
            matrix.total()
        );
        Ok(Self::new(matrix, options))
    }

    /// The live matrix
    pub fn matrix(&self) -> &EdgeCountMatrix {
        &self.matrix
    }

    /// Degrees of the live matrix
    pub fn degrees(&self) -> &BlockDegrees {
        &self.degrees
    }

    /// Number of blocks
    pub fn num_blocks(&self) -> usize {
        self.matrix.num_blocks()
    }

    /// Number of commits applied so far
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Score a candidate without touching the state.
    pub fn evaluate(&self, update: &InterblockUpdate) -> anyhow::Result<MoveEvaluation> {
        update.validate(self.num_blocks())?;
        let result = update.compute(&self.matrix);
        let degrees = self.degrees.after_update(update);
        let delta_entropy = delta_entropy(&self.matrix, &result, &self.degrees, &degrees);

        let hastings = match update {
            InterblockUpdate::SingleMove {
                s,
                out_counts,
                in_counts,
                ..
            } => Some(hastings_correction(
                *s,
                &self.matrix,
                result.r_row.view(),
                result.r_col.view(),
                &self.degrees,
                &degrees,
                out_counts,
                in_counts,
            )),
            InterblockUpdate::AgglomerativeMerge { .. } => None,
        };

        Ok(MoveEvaluation {
            result,
            degrees,
            delta_entropy,
            hastings,
            generation: self.generation,
        })
    }

    /// Score many candidates in parallel against the same state.
    ///
    /// Output order matches `updates`. All results share the current
    /// generation, so at most one of them can be committed.
    pub fn evaluate_all(
        &self,
        updates: &[InterblockUpdate],
    ) -> anyhow::Result<Vec<MoveEvaluation>> {
        let chunk_size = std::cmp::max(
            self.options.min_chunk_size.max(1),
            updates.len() / rayon::current_num_threads().max(1),
        );

        updates
            .par_chunks(chunk_size)
            .flat_map(|chunk| chunk.iter().map(|u| self.evaluate(u)).collect::<Vec<_>>())
            .collect::<anyhow::Result<Vec<_>>>()
    }

    /// Apply an accepted move.
    ///
    /// The evaluation must come from the current generation; anything
    /// computed before an earlier commit is rejected. On error the state
    /// is left as it was.
    pub fn commit(&mut self, evaluation: MoveEvaluation) -> anyhow::Result<()> {
        if evaluation.generation != self.generation {
            return Err(InterblockError::StaleEvaluation {
                evaluated: evaluation.generation,
                current: self.generation,
            }
            .into());
        }

        if self.options.verify_degrees {
            let mut next = self.matrix.clone();
            next.commit(&evaluation.result)?;
            evaluation.degrees.verify(&next)?;
            self.matrix = next;
        } else {
            self.matrix.commit(&evaluation.result)?;
        }
        self.degrees = evaluation.degrees;
        self.generation += 1;

        debug!(
            "commit {} -> {}: delta entropy {:.6}",
            evaluation.result.r, evaluation.result.s, evaluation.delta_entropy
        );
        Ok(())
    }

    /// Full description length of the live partition
    pub fn entropy(&self, num_vertices: usize) -> anyhow::Result<f64> {
        overall_entropy(&self.matrix, &self.degrees, num_vertices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn two_triangles() -> (Vec<WeightedEdge>, Vec<usize>) {
        let edges = vec![
            (0, 1, 1),
            (1, 2, 1),
            (2, 0, 1),
            (3, 4, 1),
            (4, 5, 1),
            (5, 3, 1),
            (2, 3, 1),
        ];
        (edges, vec![0, 0, 1, 1, 1, 0])
    }

    #[test]
    fn test_evaluate_does_not_mutate() {
        let (edges, partition) = two_triangles();
        let state =
            InterblockState::from_partition(edges, &partition, 2, InterblockOptions::default())
                .unwrap();
        let before = state.matrix().clone();

        let eval = state.evaluate(&InterblockUpdate::merge(1, 0)).unwrap();
        assert!(eval.hastings.is_none());
        assert_eq!(state.matrix(), &before);
    }

    #[test]
    fn test_commit_tracks_entropy() {
        let (edges, partition) = two_triangles();
        let options = InterblockOptions {
            verify_degrees: true,
            ..Default::default()
        };
        let mut state = InterblockState::from_partition(edges, &partition, 3, options).unwrap();
        let n = partition.len();
        let s0 = state.entropy(n).unwrap();

        let eval = state.evaluate(&InterblockUpdate::merge(1, 2)).unwrap();
        let delta = eval.delta_entropy;
        state.commit(eval).unwrap();

        assert_abs_diff_eq!(state.entropy(n).unwrap(), s0 + delta, epsilon = 1e-9);
        assert_eq!(state.degrees(), &BlockDegrees::from_matrix(state.matrix()));
    }

    #[test]
    fn test_batch_evaluations_go_stale_after_commit() {
        let (edges, _) = two_triangles();
        let partition = vec![0, 0, 1, 1, 2, 2];
        let options = InterblockOptions {
            verify_degrees: true,
            ..Default::default()
        };
        let mut state =
            InterblockState::from_partition(edges.clone(), &partition, 3, options).unwrap();

        let batch = [InterblockUpdate::merge(0, 1), InterblockUpdate::merge(2, 1)];
        let mut evals = state.evaluate_all(&batch).unwrap().into_iter();
        let first = evals.next().unwrap();
        let second = evals.next().unwrap();

        state.commit(first).unwrap();
        assert_eq!(state.generation(), 1);
        let after_first = state.matrix().clone();

        let err = state.commit(second).unwrap_err();
        assert_eq!(
            err.downcast_ref::<InterblockError>(),
            Some(&InterblockError::StaleEvaluation {
                evaluated: 0,
                current: 1
            })
        );
        assert_eq!(state.matrix(), &after_first);
        assert_eq!(state.generation(), 1);

        // re-scoring against the live state works
        let fresh_eval = state.evaluate(&batch[1]).unwrap();
        state.commit(fresh_eval).unwrap();
        let truth = EdgeCountMatrix::from_partition(edges, &[1, 1, 1, 1, 1, 1], 3).unwrap();
        assert_eq!(state.matrix(), &truth);
        assert_eq!(state.degrees(), &BlockDegrees::from_matrix(&truth));
    }

    #[test]
    fn test_failed_degree_check_leaves_state_untouched() {
        let (edges, partition) = two_triangles();
        let options = InterblockOptions {
            verify_degrees: true,
            ..Default::default()
        };
        let mut state = InterblockState::from_partition(edges, &partition, 2, options).unwrap();
        let matrix_before = state.matrix().clone();
        let degrees_before = state.degrees().clone();

        let mut eval = state.evaluate(&InterblockUpdate::merge(1, 0)).unwrap();
        eval.degrees.d_in[0] += 1;
        let err = state.commit(eval).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<InterblockError>(),
            Some(InterblockError::InconsistentDegree { .. })
        ));
        assert_eq!(state.matrix(), &matrix_before);
        assert_eq!(state.degrees(), &degrees_before);
        assert_eq!(state.generation(), 0);
    }

    #[test]
    fn test_evaluate_rejects_unknown_block() {
        let (edges, partition) = two_triangles();
        let state =
            InterblockState::from_partition(edges, &partition, 2, InterblockOptions::default())
                .unwrap();

        let err = state.evaluate(&InterblockUpdate::merge(0, 5)).unwrap_err();
        assert_eq!(
            err.downcast_ref::<InterblockError>(),
            Some(&InterblockError::BlockOutOfRange {
                block: 5,
                num_blocks: 2
            })
        );
    }
}
