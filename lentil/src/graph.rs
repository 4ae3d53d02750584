//! Directed weighted adjacency built from an edge list.
//!
//! The engine itself only ever needs `(src, dst, weight)` triples. This
//! adjacency exists so that a vertex's incident edges can be grouped by
//! neighbor block when preparing a single-vertex move.

use crate::error::InterblockError;

/// A directed weighted edge `(src, dst, weight)`
pub type WeightedEdge = (usize, usize, i64);

/// Out- and in-neighbor lists for every vertex.
///
/// Multi-edges are kept as separate entries; a self-loop `v -> v`
/// shows up once in `out_neighbors[v]` and once in `in_neighbors[v]`.
#[derive(Debug, Clone, Default)]
pub struct Adjacency {
    out_neighbors: Vec<Vec<(usize, i64)>>,
    in_neighbors: Vec<Vec<(usize, i64)>>,
    total_weight: i64,
}

impl Adjacency {
    /// Build adjacency lists for `num_vertices` vertices.
    ///
    /// * `num_vertices` - number of vertices `N`
    /// * `edges` - directed edges with positive integer weights
    pub fn from_edges<I>(num_vertices: usize, edges: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = WeightedEdge>,
    {
        let mut out_neighbors = vec![Vec::new(); num_vertices];
        let mut in_neighbors = vec![Vec::new(); num_vertices];
        let mut total_weight = 0;

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
            out_neighbors[src].push((dst, w));
            in_neighbors[dst].push((src, w));
            total_weight += w;
        }

        Ok(Adjacency {
            out_neighbors,
            in_neighbors,
            total_weight,
        })
    }

    /// Number of vertices
    pub fn num_vertices(&self) -> usize {
        self.out_neighbors.len()
    }

    /// Sum of all edge weights
    pub fn total_weight(&self) -> i64 {
        self.total_weight
    }

    /// Edges leaving `v` as `(dst, weight)`
    pub fn out_neighbors(&self, v: usize) -> &[(usize, i64)] {
        &self.out_neighbors[v]
    }

    /// Edges entering `v` as `(src, weight)`
    pub fn in_neighbors(&self, v: usize) -> &[(usize, i64)] {
        &self.in_neighbors[v]
    }

    /// Iterate over every edge as a `(src, dst, weight)` triple.
    pub fn edges(&self) -> impl Iterator<Item = WeightedEdge> + '_ {
        self.out_neighbors
            .iter()
            .enumerate()
            .flat_map(|(src, nbrs)| nbrs.iter().map(move |&(dst, w)| (src, dst, w)))
    }
}
