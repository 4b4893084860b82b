//! Synthetic citation-like graphs: Gaussian feature clusters on a
//! stochastic block model.

use hgcl_core::{GraphData, HgclError, Result};
use hgcl_samplers::RngKey;
use ndarray::Array2;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

/// Parameters of a synthetic dataset.
///
/// Node `i` belongs to class `i % n_classes`, so every contiguous split range
/// longer than `n_classes` sees every class.
#[derive(Clone, Debug, PartialEq)]
pub struct SyntheticGraph {
    pub n_nodes: usize,
    pub n_features: usize,
    pub n_classes: usize,
    /// Edge probability between two nodes of the same class.
    pub p_in: f64,
    /// Edge probability between two nodes of different classes.
    pub p_out: f64,
    /// Scale of the class centres.
    pub separation: f32,
    /// Standard deviation of the per-node feature noise.
    pub noise_std: f32,
    /// Fraction of nodes in the training split.
    pub train_fraction: f64,
    /// Fraction of nodes in the validation split; the rest is test.
    pub val_fraction: f64,
    pub seed: u64,
}

impl Default for SyntheticGraph {
    fn default() -> Self {
        Self {
            n_nodes: 120,
            n_features: 16,
            n_classes: 3,
            p_in: 0.1,
            p_out: 0.01,
            separation: 2.0,
            noise_std: 1.0,
            train_fraction: 0.2,
            val_fraction: 0.3,
            seed: 0,
        }
    }
}

impl SyntheticGraph {
    pub fn new(n_nodes: usize, n_features: usize, n_classes: usize) -> Self {
        Self {
            n_nodes,
            n_features,
            n_classes,
            ..Self::default()
        }
    }

    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub const fn with_edge_probabilities(mut self, p_in: f64, p_out: f64) -> Self {
        self.p_in = p_in;
        self.p_out = p_out;
        self
    }

    pub const fn with_noise(mut self, separation: f32, noise_std: f32) -> Self {
        self.separation = separation;
        self.noise_std = noise_std;
        self
    }

    /// Split boundaries `(train_end, val_end)`.
    fn split_points(&self) -> (usize, usize) {
        let n = self.n_nodes as f64;
        let train_end = (n * self.train_fraction).round() as usize;
        let val_end = (n * (self.train_fraction + self.val_fraction)).round() as usize;
        (train_end.min(self.n_nodes), val_end.min(self.n_nodes))
    }

    /// Sample a dataset. Same parameters, same dataset.
    pub fn generate(&self) -> Result<GraphData> {
        if self.n_classes == 0 || self.n_features == 0 {
            return Err(HgclError::config(
                "synthetic graph needs at least one class and one feature",
            ));
        }
        for (name, p) in [("p_in", self.p_in), ("p_out", self.p_out)] {
            if !(0.0..=1.0).contains(&p) {
                return Err(HgclError::config(format!("{name} must be in [0, 1], got {p}")));
            }
        }

        let mut rng = RngKey::new(self.seed).rng();
        let n = self.n_nodes;

        let centres = Array2::from_shape_simple_fn((self.n_classes, self.n_features), || {
            let z: f32 = StandardNormal.sample(&mut rng);
            z * self.separation
        });
        let labels: Vec<usize> = (0..n).map(|i| i % self.n_classes).collect();
        let mut features = Array2::<f32>::zeros((n, self.n_features));
        for (i, mut row) in features.rows_mut().into_iter().enumerate() {
            for (j, value) in row.iter_mut().enumerate() {
                let z: f32 = StandardNormal.sample(&mut rng);
                *value = centres[[labels[i], j]] + self.noise_std * z;
            }
        }

        let mut edges = Vec::new();
        for i in 0..n {
            for j in (i + 1)..n {
                let p = if labels[i] == labels[j] { self.p_in } else { self.p_out };
                if rng.gen::<f64>() < p {
                    edges.push((i, j));
                    edges.push((j, i));
                }
            }
        }

        let (train_end, val_end) = self.split_points();
        let (train, val, test) =
            GraphData::range_masks(n, 0..train_end, train_end..val_end, val_end..n);
        log::debug!(
            "synthetic graph: {} nodes, {} directed edges, {} classes",
            n,
            edges.len(),
            self.n_classes
        );
        GraphData::new(features, edges, labels, train, val, test)
    }
}
