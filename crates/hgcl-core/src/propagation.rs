//! Dense propagation operators for graph and hypergraph message passing.
//!
//! Both convolution primitives reduce to `P @ (X W)` for a fixed N×N operator
//! `P` built on the host:
//!
//! | Operator | Formula |
//! |----------|---------|
//! | [`PropagationMatrix::gcn`] | `D^-1/2 (A + I) D^-1/2`, self-loops added only where missing |
//! | [`PropagationMatrix::hypergraph`] | `D^-1 H B^-1 H^T` with node degree `D`, hyperedge degree `B` |
//!
//! Entry `[i, j]` is the weight of the message from node `j` into node `i`.
//! Duplicate edges accumulate. Zero degrees produce zero rows instead of
//! infinities.

use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};

use crate::similarity::HyperedgeIncidence;

/// Row-major dense N×N propagation operator.
#[derive(Clone, Debug, PartialEq)]
pub struct PropagationMatrix {
    values: Vec<f32>,
    n: usize,
}

impl PropagationMatrix {
    /// Symmetrically normalized adjacency with self-loops.
    ///
    /// Messages flow from `source` to `target` of each stored edge; degrees
    /// are counted at the target.
    pub fn gcn(edges: &[(usize, usize)], n: usize) -> Self {
        let mut weights = vec![0.0f64; n * n];
        let mut has_loop = vec![false; n];
        for &(src, dst) in edges {
            weights[dst * n + src] += 1.0;
            if src == dst {
                has_loop[src] = true;
            }
        }
        for (i, looped) in has_loop.iter().enumerate() {
            if !looped {
                weights[i * n + i] += 1.0;
            }
        }

        let deg_inv_sqrt: Vec<f64> = (0..n)
            .map(|i| {
                let deg: f64 = weights[i * n..(i + 1) * n].iter().sum();
                if deg > 0.0 {
                    deg.powf(-0.5)
                } else {
                    0.0
                }
            })
            .collect();

        let values = weights
            .iter()
            .enumerate()
            .map(|(idx, &w)| {
                let (i, j) = (idx / n, idx % n);
                (deg_inv_sqrt[i] * w * deg_inv_sqrt[j]) as f32
            })
            .collect();

        Self { values, n }
    }

    /// Two-stage hypergraph operator: nodes to hyperedges (mean by `B^-1`),
    /// then hyperedges back to nodes (mean by `D^-1`).
    pub fn hypergraph(incidence: &HyperedgeIncidence) -> Self {
        let n = incidence.n_nodes();
        let n_edges = incidence.n_hyperedges();

        let mut node_degree = vec![0.0f64; n];
        let mut members: Vec<Vec<usize>> = vec![Vec::new(); n_edges];
        for &(node, edge) in incidence.pairs() {
            node_degree[node] += 1.0;
            members[edge].push(node);
        }

        let mut weights = vec![0.0f64; n * n];
        for nodes in &members {
            if nodes.is_empty() {
                continue;
            }
            let b_inv = 1.0 / nodes.len() as f64;
            for &v in nodes {
                let d_inv = if node_degree[v] > 0.0 {
                    1.0 / node_degree[v]
                } else {
                    0.0
                };
                for &u in nodes {
                    weights[v * n + u] += d_inv * b_inv;
                }
            }
        }

        Self {
            values: weights.into_iter().map(|w| w as f32).collect(),
            n,
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.n
    }

    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.values[row * self.n + col]
    }

    /// Sum of one row (total incoming message weight).
    pub fn row_sum(&self, row: usize) -> f32 {
        self.values[row * self.n..(row + 1) * self.n].iter().sum()
    }

    /// Upload to a backend as an \[N, N\] tensor.
    pub fn to_tensor<B: Backend>(&self, device: &B::Device) -> Tensor<B, 2> {
        Tensor::from_data(TensorData::new(self.values.clone(), [self.n, self.n]), device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::build_knn_hypergraph;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_gcn_path_graph_weights() {
        // 0 - 1 - 2, stored in both directions
        let edges = [(0, 1), (1, 0), (1, 2), (2, 1)];
        let p = PropagationMatrix::gcn(&edges, 3);
        // deg = [2, 3, 2] with self-loops
        assert_relative_eq!(p.get(0, 0), 0.5, epsilon = 1e-6);
        assert_relative_eq!(p.get(1, 1), 1.0 / 3.0, epsilon = 1e-6);
        assert_relative_eq!(p.get(0, 1), 1.0 / 6.0f32.sqrt(), epsilon = 1e-6);
        assert_relative_eq!(p.get(1, 0), p.get(0, 1), epsilon = 1e-7);
        assert_eq!(p.get(0, 2), 0.0);
    }

    #[test]
    fn test_gcn_isolated_node_keeps_self_loop() {
        let p = PropagationMatrix::gcn(&[], 2);
        assert_relative_eq!(p.get(0, 0), 1.0);
        assert_relative_eq!(p.get(1, 1), 1.0);
        assert_eq!(p.get(0, 1), 0.0);
    }

    #[test]
    fn test_gcn_existing_self_loop_not_doubled() {
        let p = PropagationMatrix::gcn(&[(0, 0)], 1);
        assert_relative_eq!(p.get(0, 0), 1.0);
    }

    #[test]
    fn test_hypergraph_rows_are_stochastic() {
        let x = array![[1.0f32, 0.0], [0.9, 0.1], [0.0, 1.0], [0.2, 0.8], [0.5, 0.5]];
        let incidence = build_knn_hypergraph(&x, 2, 2).unwrap();
        let p = PropagationMatrix::hypergraph(&incidence);
        for row in 0..5 {
            assert_relative_eq!(p.row_sum(row), 1.0, epsilon = 1e-5);
        }
    }
}
