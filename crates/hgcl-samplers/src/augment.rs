//! Stochastic graph augmentation.
//!
//! One augmented view is produced per forward pass and shared by both
//! encoder views:
//!
//! - **Feature masking**: every entry of `X` is zeroed independently with
//!   probability `mask_ratio` (kept iff `u > mask_ratio`, `u ~ U[0, 1)`).
//! - **Edge dropping**: every undirected edge is removed independently with
//!   probability `edge_drop_ratio`. Only the stored `(s, d)` with `s <= d` are
//!   sampled; each survivor is emitted together with its reverse, so the
//!   result is symmetric by construction.
//!
//! Node order and count are never changed, which keeps the index-aligned
//! positive pairs of the contrastive loss valid. A ratio of exactly zero is the
//! identity and consumes no random numbers.

use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};
use rand::Rng;

/// Augmented input consumed by both encoder views.
#[derive(Clone, Debug)]
pub struct AugmentedGraph<B: Backend> {
    pub features: Tensor<B, 2>,
    pub edges: Vec<(usize, usize)>,
}

/// Feature-masking and edge-dropping ratios.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Augmentation {
    pub mask_ratio: f32,
    pub edge_drop_ratio: f32,
}

impl Augmentation {
    pub const fn new(mask_ratio: f32, edge_drop_ratio: f32) -> Self {
        Self {
            mask_ratio,
            edge_drop_ratio,
        }
    }

    /// No-op augmentation.
    pub const fn identity() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Sample a {0, 1} keep-mask of `n_rows * n_cols` entries, or `None` when
    /// masking is disabled.
    pub fn sample_feature_mask<R: Rng>(
        &self,
        n_rows: usize,
        n_cols: usize,
        rng: &mut R,
    ) -> Option<Vec<f32>> {
        if self.mask_ratio <= 0.0 {
            return None;
        }
        let ratio = self.mask_ratio;
        Some(
            (0..n_rows * n_cols)
                .map(|_| if rng.gen::<f32>() > ratio { 1.0 } else { 0.0 })
                .collect(),
        )
    }

    /// Zero a random subset of feature entries.
    pub fn mask_features<B: Backend, R: Rng>(
        &self,
        features: Tensor<B, 2>,
        rng: &mut R,
    ) -> Tensor<B, 2> {
        let [n, f] = features.dims();
        match self.sample_feature_mask(n, f, rng) {
            Some(mask) => {
                let mask = TensorData::new(mask, [n, f]);
                let mask = Tensor::<B, 2>::from_data(mask, &features.device());
                features * mask
            }
            None => features,
        }
    }

    /// Drop undirected edges, keeping the result symmetric.
    pub fn drop_edges<R: Rng>(
        &self,
        edges: &[(usize, usize)],
        rng: &mut R,
    ) -> Vec<(usize, usize)> {
        if self.edge_drop_ratio <= 0.0 {
            return edges.to_vec();
        }
        let p = self.edge_drop_ratio;
        let kept: Vec<(usize, usize)> = edges
            .iter()
            .copied()
            .filter(|&(s, d)| s <= d)
            .filter(|_| rng.gen::<f32>() >= p)
            .collect();

        let mut out = Vec::with_capacity(kept.len() * 2);
        out.extend_from_slice(&kept);
        out.extend(kept.iter().filter(|&&(s, d)| s != d).map(|&(s, d)| (d, s)));
        log::trace!("edge dropping kept {} of {} directed edges", out.len(), edges.len());
        out
    }

    /// Produce the shared augmented view for one forward pass.
    pub fn apply<B: Backend, R: Rng>(
        &self,
        features: &Tensor<B, 2>,
        edges: &[(usize, usize)],
        rng: &mut R,
    ) -> AugmentedGraph<B> {
        let features = self.mask_features(features.clone(), rng);
        let edges = self.drop_edges(edges, rng);
        AugmentedGraph { features, edges }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::RngKey;
    use std::collections::HashSet;

    fn ring(n: usize) -> Vec<(usize, usize)> {
        (0..n)
            .flat_map(|i| {
                let j = (i + 1) % n;
                [(i, j), (j, i)]
            })
            .collect()
    }

    #[test]
    fn test_dropped_edges_stay_symmetric() {
        let aug = Augmentation::new(0.0, 0.5);
        let mut rng = RngKey::new(3).rng();
        let dropped = aug.drop_edges(&ring(50), &mut rng);
        let set: HashSet<(usize, usize)> = dropped.iter().copied().collect();
        for &(s, d) in &dropped {
            assert!(set.contains(&(d, s)), "edge ({s}, {d}) lost its reverse");
        }
        assert!(dropped.len() < 100);
        assert!(!dropped.is_empty());
    }

    #[test]
    fn test_zero_ratio_is_identity() {
        let aug = Augmentation::identity();
        let mut rng = RngKey::new(0).rng();
        let edges = ring(6);
        assert_eq!(aug.drop_edges(&edges, &mut rng), edges);
        assert!(aug.sample_feature_mask(4, 4, &mut rng).is_none());
    }

    #[test]
    fn test_successive_calls_resample() {
        let aug = Augmentation::new(0.3, 0.2);
        let mut rng = RngKey::new(9).rng();
        let first = aug.sample_feature_mask(32, 32, &mut rng).unwrap();
        let second = aug.sample_feature_mask(32, 32, &mut rng).unwrap();
        assert_ne!(first, second);

        let edges = ring(100);
        let e1 = aug.drop_edges(&edges, &mut rng);
        let e2 = aug.drop_edges(&edges, &mut rng);
        assert_ne!(e1, e2);
    }

    #[test]
    fn test_mask_ratio_is_respected_on_average() {
        let aug = Augmentation::new(0.3, 0.0);
        let mut rng = RngKey::new(1).rng();
        let mask = aug.sample_feature_mask(200, 50, &mut rng).unwrap();
        let zeroed = mask.iter().filter(|&&m| m == 0.0).count() as f32 / mask.len() as f32;
        assert!((zeroed - 0.3).abs() < 0.02, "zeroed fraction {zeroed}");
    }
}
