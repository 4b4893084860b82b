//! The graph dataset aggregate consumed by training.
//!
//! [`GraphData`] bundles node features, the plain edge list, labels and the
//! three split masks. It is immutable after construction; [`GraphData::new`]
//! validates every invariant the training pipeline relies on.

use ndarray::{Array2, ArrayView1};

use crate::error::{HgclError, Result};

/// Which split mask to read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Split {
    Train,
    Validation,
    Test,
}

/// Node features, structure, labels and splits of one graph.
#[derive(Clone, Debug)]
pub struct GraphData {
    /// Node features \[N, F\].
    pub features: Array2<f32>,
    /// Directed-as-stored edges `(source, target)`.
    pub edges: Vec<(usize, usize)>,
    /// One class label per node.
    pub labels: Vec<usize>,
    pub train_mask: Vec<bool>,
    pub val_mask: Vec<bool>,
    pub test_mask: Vec<bool>,
}

impl GraphData {
    /// Build and validate a dataset.
    pub fn new(
        features: Array2<f32>,
        edges: Vec<(usize, usize)>,
        labels: Vec<usize>,
        train_mask: Vec<bool>,
        val_mask: Vec<bool>,
        test_mask: Vec<bool>,
    ) -> Result<Self> {
        let data = Self {
            features,
            edges,
            labels,
            train_mask,
            val_mask,
            test_mask,
        };
        data.validate()?;
        Ok(data)
    }

    /// Masks covering the contiguous index ranges `[start, end)` of each split.
    pub fn range_masks(
        n_nodes: usize,
        train: std::ops::Range<usize>,
        val: std::ops::Range<usize>,
        test: std::ops::Range<usize>,
    ) -> (Vec<bool>, Vec<bool>, Vec<bool>) {
        let mask = |r: &std::ops::Range<usize>| (0..n_nodes).map(|i| r.contains(&i)).collect();
        (mask(&train), mask(&val), mask(&test))
    }

    pub fn n_nodes(&self) -> usize {
        self.features.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    pub fn n_edges(&self) -> usize {
        self.edges.len()
    }

    /// Number of classes, `max(label) + 1`.
    pub fn n_classes(&self) -> usize {
        self.labels.iter().copied().max().map_or(0, |m| m + 1)
    }

    pub fn mask(&self, split: Split) -> &[bool] {
        match split {
            Split::Train => &self.train_mask,
            Split::Validation => &self.val_mask,
            Split::Test => &self.test_mask,
        }
    }

    /// Node indices selected by a split.
    pub fn indices(&self, split: Split) -> Vec<usize> {
        self.mask(split)
            .iter()
            .enumerate()
            .filter_map(|(i, &m)| m.then_some(i))
            .collect()
    }

    pub fn feature_row(&self, node: usize) -> ArrayView1<'_, f32> {
        self.features.row(node)
    }

    /// Check shapes, finiteness, edge ranges and split disjointness.
    pub fn validate(&self) -> Result<()> {
        let n = self.n_nodes();
        if n == 0 {
            return Err(HgclError::data("graph has no nodes"));
        }
        if self.labels.len() != n {
            return Err(HgclError::data(format!(
                "label vector has {} entries for {} nodes",
                self.labels.len(),
                n
            )));
        }
        if let Some((idx, v)) = self
            .features
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite())
        {
            let f = self.n_features().max(1);
            return Err(HgclError::data(format!(
                "non-finite feature value {} at node {}, column {}",
                v,
                idx / f,
                idx % f
            )));
        }
        if let Some(&(s, t)) = self.edges.iter().find(|&&(s, t)| s >= n || t >= n) {
            return Err(HgclError::data(format!(
                "edge ({s}, {t}) references a node outside 0..{n}"
            )));
        }
        for (name, mask) in [
            ("train", &self.train_mask),
            ("validation", &self.val_mask),
            ("test", &self.test_mask),
        ] {
            if mask.len() != n {
                return Err(HgclError::data(format!(
                    "{name} mask has length {} for {n} nodes",
                    mask.len()
                )));
            }
        }
        if !self.train_mask.iter().any(|&m| m) {
            return Err(HgclError::data("train mask selects no nodes"));
        }
        if !self.val_mask.iter().any(|&m| m) {
            return Err(HgclError::data("validation mask selects no nodes"));
        }
        let overlap = (0..n).find(|&i| {
            let hits = [self.train_mask[i], self.val_mask[i], self.test_mask[i]];
            hits.iter().filter(|&&h| h).count() > 1
        });
        if let Some(i) = overlap {
            return Err(HgclError::data(format!(
                "node {i} belongs to more than one split"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn tiny(n: usize) -> (Array2<f32>, Vec<usize>) {
        (Array2::from_elem((n, 2), 1.0), vec![0; n])
    }

    #[test]
    fn test_range_masks_are_disjoint() {
        let (train, val, test) = GraphData::range_masks(10, 0..3, 3..6, 7..10);
        assert_eq!(train.iter().filter(|&&m| m).count(), 3);
        assert_eq!(val.iter().filter(|&&m| m).count(), 3);
        assert_eq!(test.iter().filter(|&&m| m).count(), 3);
        assert!(!train[6] && !val[6] && !test[6]);
    }

    #[test]
    fn test_rejects_overlapping_masks() {
        let (x, y) = tiny(6);
        let (train, val, test) = GraphData::range_masks(6, 0..3, 2..4, 4..6);
        let err = GraphData::new(x, vec![(0, 1)], y, train, val, test).unwrap_err();
        assert!(matches!(err, HgclError::InvalidData(_)));
    }

    #[test]
    fn test_rejects_non_finite_features() {
        let (mut x, y) = tiny(4);
        x[[2, 1]] = f32::NAN;
        let (train, val, test) = GraphData::range_masks(4, 0..1, 1..2, 2..4);
        assert!(GraphData::new(x, vec![], y, train, val, test).is_err());
    }

    #[test]
    fn test_rejects_out_of_range_edges_and_short_masks() {
        let (x, y) = tiny(4);
        let (train, val, test) = GraphData::range_masks(4, 0..1, 1..2, 2..4);
        assert!(GraphData::new(x.clone(), vec![(0, 4)], y.clone(), train.clone(), val.clone(), test)
            .is_err());
        assert!(GraphData::new(x, vec![], y, train, val, vec![false; 3]).is_err());
    }

    #[test]
    fn test_indices_and_classes() {
        let x = Array2::zeros((5, 3));
        let (train, val, test) = GraphData::range_masks(5, 0..2, 2..3, 3..5);
        let data = GraphData::new(x, vec![(0, 1), (1, 0)], vec![0, 2, 1, 1, 0], train, val, test)
            .unwrap();
        assert_eq!(data.indices(Split::Train), vec![0, 1]);
        assert_eq!(data.indices(Split::Test), vec![3, 4]);
        assert_eq!(data.n_classes(), 3);
        assert_eq!(data.n_edges(), 2);
    }
}
