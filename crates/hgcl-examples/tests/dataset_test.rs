//! NPZ bundles, embedding files and synthetic data through the pipeline.

use std::fs::File;

use hgcl_core::{build_knn_hypergraph, HgclError, Split};
use hgcl_examples::{
    load_embeddings_npy, load_npz_dataset, save_embeddings_npy, save_npz_dataset,
    SyntheticGraph,
};
use ndarray::{Array1, Array2};
use ndarray_npy::NpzWriter;
use tempfile::tempdir;

#[test]
fn test_bundle_round_trip_keeps_everything() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("graph.npz");
    let data = SyntheticGraph::new(40, 5, 4).with_seed(3).generate().unwrap();

    save_npz_dataset(&path, &data).unwrap();
    let loaded = load_npz_dataset(&path).unwrap();

    assert_eq!(loaded.features, data.features);
    assert_eq!(loaded.edges, data.edges);
    assert_eq!(loaded.labels, data.labels);
    assert_eq!(loaded.train_mask, data.train_mask);
    assert_eq!(loaded.val_mask, data.val_mask);
    assert_eq!(loaded.test_mask, data.test_mask);
}

#[test]
fn test_bundle_without_masks_uses_planetoid_split() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nomask.npz");
    let n = 700;
    // f64 features as numpy writes them by default.
    let x = Array2::<f64>::from_shape_fn((n, 3), |(i, j)| ((i + j) % 5) as f64);
    let edge_index = Array2::<i64>::from_shape_fn((2, 4), |(r, c)| (c + r) as i64);
    let y: Array1<i64> = (0..n as i64).map(|i| i % 3).collect();

    let mut npz = NpzWriter::new(File::create(&path).unwrap());
    npz.add_array("x", &x).unwrap();
    npz.add_array("edge_index", &edge_index).unwrap();
    npz.add_array("y", &y).unwrap();
    npz.finish().unwrap();

    let data = load_npz_dataset(&path).unwrap();
    assert_eq!(data.features[[4, 2]], 1.0);
    assert_eq!(data.edges, vec![(0, 1), (1, 2), (2, 3), (3, 4)]);
    assert_eq!(data.indices(Split::Train), (0..140).collect::<Vec<_>>());
    assert_eq!(data.indices(Split::Validation).len(), 500);
    assert_eq!(data.indices(Split::Test), (640..700).collect::<Vec<_>>());
}

#[test]
fn test_missing_array_is_data_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("partial.npz");
    let mut npz = NpzWriter::new(File::create(&path).unwrap());
    npz.add_array("x", &Array2::<f32>::zeros((3, 2))).unwrap();
    npz.finish().unwrap();

    let err = load_npz_dataset(&path).unwrap_err();
    assert!(matches!(err, HgclError::InvalidData(msg) if msg.contains("edge_index")));
}

#[test]
fn test_negative_label_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("negative.npz");
    let mut npz = NpzWriter::new(File::create(&path).unwrap());
    npz.add_array("x", &Array2::<f32>::zeros((3, 2))).unwrap();
    npz.add_array("edge_index", &Array2::<i64>::zeros((2, 1))).unwrap();
    npz.add_array("y", &Array1::from(vec![0i64, -1, 1])).unwrap();
    npz.finish().unwrap();

    assert!(matches!(
        load_npz_dataset(&path),
        Err(HgclError::InvalidData(_))
    ));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempdir().unwrap();
    let result = load_npz_dataset(&dir.path().join("absent.npz"));
    assert!(matches!(result, Err(HgclError::Io(_))));
}

#[test]
fn test_embeddings_npy_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("best_embeddings.npy");
    let embedding = Array2::from_shape_fn((6, 4), |(i, j)| i as f32 - 0.5 * j as f32);

    save_embeddings_npy(&path, &embedding).unwrap();
    assert_eq!(load_embeddings_npy(&path).unwrap(), embedding);
}

#[test]
fn test_ten_node_synthetic_graph_gives_twenty_incidences() {
    let data = SyntheticGraph::new(10, 3, 2).generate().unwrap();
    let incidence = build_knn_hypergraph(&data.features, 2, 4).unwrap();
    assert_eq!(incidence.len(), 20);
    assert!(incidence.pairs().iter().all(|&(node, edge)| node != edge));
}
