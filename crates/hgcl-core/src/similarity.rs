//! Feature-similarity hypergraph construction.
//!
//! Each node spawns one hyperedge membership per nearest neighbour in cosine
//! similarity of its raw features:
//!
//! ```text
//! sim[i,j] = dot(x[i], x[j]) / (max(||x[i]||, eps) * max(||x[j]||, eps))
//! incidence = { (i, j) : j in top_k(sim[i, :]), j != i }
//! ```
//!
//! The all-pairs similarity is evaluated one row batch at a time, as a
//! `[batch_size, N]` block `X_batch X^T` in f64, so peak memory stays at
//! `batch_size * N` scores.
//!
//! The node itself is excluded by identity, not by rank, so duplicate or
//! all-zero rows never displace a real neighbour.

use ndarray::{s, Array2, ArrayView1, Axis};
use std::cmp::Ordering;

use crate::error::{HgclError, Result};

const NORM_EPS: f64 = 1e-8;

/// k-NN hypergraph incidence list: `(node, hyperedge)` pairs, where the
/// hyperedge id is the index of the neighbouring node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HyperedgeIncidence {
    pairs: Vec<(usize, usize)>,
    n_nodes: usize,
    k: usize,
}

impl HyperedgeIncidence {
    /// All incidence pairs, grouped by node, neighbours in descending similarity.
    pub fn pairs(&self) -> &[(usize, usize)] {
        &self.pairs
    }

    /// Number of incidence pairs (`N * k`).
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn n_nodes(&self) -> usize {
        self.n_nodes
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Number of hyperedge ids, `max(hyperedge) + 1`.
    pub fn n_hyperedges(&self) -> usize {
        self.pairs.iter().map(|&(_, e)| e + 1).max().unwrap_or(0)
    }

    /// Neighbours selected for one node.
    pub fn neighbors(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.pairs[node * self.k..(node + 1) * self.k]
            .iter()
            .map(|&(_, e)| e)
    }
}

/// L2-normalize rows in f64, clamping tiny norms to `eps`.
fn normalize_rows(features: &Array2<f32>) -> Array2<f64> {
    let mut normed = features.mapv(f64::from);
    for mut row in normed.axis_iter_mut(Axis(0)) {
        let norm = row.dot(&row).sqrt().max(NORM_EPS);
        row.mapv_inplace(|v| v / norm);
    }
    normed
}

/// Highest-similarity first; lower index wins ties.
fn rank(a: &(usize, f64), b: &(usize, f64)) -> Ordering {
    b.1.total_cmp(&a.1).then(a.0.cmp(&b.0))
}

/// Cosine similarities of rows `start..end` against every row, \[end - start, N\].
fn similarity_block(normed: &Array2<f64>, start: usize, end: usize) -> Array2<f64> {
    normed.slice(s![start..end, ..]).dot(&normed.t())
}

/// Top `k` columns of one similarity row, skipping column `row`.
fn top_k_excluding_self(
    row: usize,
    scores: ArrayView1<'_, f64>,
    k: usize,
    scratch: &mut Vec<(usize, f64)>,
) -> Vec<usize> {
    scratch.clear();
    scratch.extend(
        scores
            .iter()
            .copied()
            .enumerate()
            .filter(|&(j, _)| j != row),
    );
    if k < scratch.len() {
        scratch.select_nth_unstable_by(k - 1, rank);
        scratch.truncate(k);
    }
    scratch.sort_by(rank);
    scratch.iter().map(|&(j, _)| j).collect()
}

/// Build the k-NN similarity hypergraph of a feature matrix.
///
/// # Arguments
/// * `features` - Node features \[N, F\]
/// * `k` - Neighbours per node, `1 <= k < N`
/// * `batch_size` - Rows scored per similarity batch
///
/// # Returns
/// Exactly `N * k` incidence pairs, none of which pairs a node with itself.
pub fn build_knn_hypergraph(
    features: &Array2<f32>,
    k: usize,
    batch_size: usize,
) -> Result<HyperedgeIncidence> {
    let n = features.nrows();
    if k == 0 {
        return Err(HgclError::config("k-NN hypergraph needs k >= 1"));
    }
    if k >= n {
        return Err(HgclError::config(format!(
            "k-NN hypergraph needs k < N, got k={k} with N={n}"
        )));
    }
    if batch_size == 0 {
        return Err(HgclError::config("k-NN batch size must be positive"));
    }

    let normed = normalize_rows(features);
    let mut pairs = Vec::with_capacity(n * k);
    let mut scratch = Vec::with_capacity(n);

    for start in (0..n).step_by(batch_size) {
        let end = (start + batch_size).min(n);
        log::debug!("k-NN similarity batch {}..{} of {}", start, end, n);
        let block = similarity_block(&normed, start, end);
        for (offset, scores) in block.axis_iter(Axis(0)).enumerate() {
            let i = start + offset;
            let neighbors = top_k_excluding_self(i, scores, k, &mut scratch);
            pairs.extend(neighbors.into_iter().map(|j| (i, j)));
        }
    }

    Ok(HyperedgeIncidence { pairs, n_nodes: n, k })
}
