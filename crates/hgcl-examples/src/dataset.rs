//! NPZ dataset bundles and `.npy` embedding files.
//!
//! # Bundle layout
//!
//! | Name | Shape | Dtype | Description |
//! |------|-------|-------|-------------|
//! | `x` | \[N, F\] | f32 or f64 | Node features |
//! | `edge_index` | \[2, E\] | i64 | Directed edges, source row then target row |
//! | `y` | \[N\] | i64 | Class labels |
//! | `train_mask` | \[N\] | bool | Optional |
//! | `val_mask` | \[N\] | bool | Optional |
//! | `test_mask` | \[N\] | bool | Optional |
//!
//! Entries may be stored with or without the `.npy` suffix that
//! `numpy.savez` appends. Missing masks fall back to the Planetoid split:
//! the first 140 nodes train, the next 500 validate, the last 1000 test.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::ops::Range;
use std::path::Path;

use hgcl_core::{GraphData, HgclError, Result};
use ndarray::{Array1, Array2};
use ndarray_npy::{read_npy, write_npy, NpzReader, NpzWriter};

pub const PLANETOID_TRAIN: usize = 140;
pub const PLANETOID_VAL: usize = 500;
pub const PLANETOID_TEST: usize = 1000;

/// Index ranges of the Planetoid split, clamped so they stay disjoint for
/// graphs smaller than 1640 nodes.
pub fn planetoid_ranges(n_nodes: usize) -> (Range<usize>, Range<usize>, Range<usize>) {
    let train_end = PLANETOID_TRAIN.min(n_nodes);
    let val_end = (PLANETOID_TRAIN + PLANETOID_VAL).min(n_nodes);
    let test_start = n_nodes.saturating_sub(PLANETOID_TEST).max(val_end);
    (0..train_end, train_end..val_end, test_start..n_nodes)
}

fn entry_name(names: &[String], key: &str) -> Option<String> {
    let suffixed = format!("{key}.npy");
    names
        .iter()
        .find(|name| name.as_str() == key || *name == &suffixed)
        .cloned()
}

fn require(names: &[String], key: &str) -> Result<String> {
    entry_name(names, key)
        .ok_or_else(|| HgclError::data(format!("NPZ bundle has no '{key}' array")))
}

fn read_features<R: Read + Seek>(npz: &mut NpzReader<R>, name: &str) -> Result<Array2<f32>> {
    match npz.by_name::<_, ndarray::Ix2>(name) {
        Ok(x) => Ok(x),
        Err(f32_err) => {
            let wide: Array2<f64> = npz.by_name(name).map_err(|_| f32_err)?;
            Ok(wide.mapv(|v| v as f32))
        }
    }
}

fn read_mask<R: Read + Seek>(
    npz: &mut NpzReader<R>,
    names: &[String],
    key: &str,
) -> Result<Option<Vec<bool>>> {
    match entry_name(names, key) {
        Some(name) => {
            let mask: Array1<bool> = npz.by_name(&name)?;
            Ok(Some(mask.to_vec()))
        }
        None => Ok(None),
    }
}

fn to_index(value: i64, what: &str) -> Result<usize> {
    usize::try_from(value).map_err(|_| HgclError::data(format!("negative {what}: {value}")))
}

/// Load a citation-graph bundle from an `.npz` file.
///
/// # Errors
///
/// Fails if the file cannot be read, a required array is missing or has the
/// wrong dtype, an index is negative, or the assembled [`GraphData`] does not
/// validate.
pub fn load_npz_dataset(path: &Path) -> Result<GraphData> {
    let file = File::open(path)?;
    let mut npz = NpzReader::new(BufReader::new(file))?;
    let names = npz.names()?;

    let features = read_features(&mut npz, &require(&names, "x")?)?;
    let edge_index: Array2<i64> = npz.by_name(&require(&names, "edge_index")?)?;
    let y: Array1<i64> = npz.by_name(&require(&names, "y")?)?;

    if edge_index.nrows() != 2 {
        return Err(HgclError::data(format!(
            "edge_index must have 2 rows, got {}",
            edge_index.nrows()
        )));
    }
    let edges = edge_index
        .columns()
        .into_iter()
        .map(|col| {
            let src = to_index(col[0], "edge endpoint")?;
            let dst = to_index(col[1], "edge endpoint")?;
            Ok((src, dst))
        })
        .collect::<Result<Vec<_>>>()?;
    let labels = y
        .iter()
        .map(|&label| to_index(label, "label"))
        .collect::<Result<Vec<_>>>()?;

    let n = features.nrows();
    let train = read_mask(&mut npz, &names, "train_mask")?;
    let val = read_mask(&mut npz, &names, "val_mask")?;
    let test = read_mask(&mut npz, &names, "test_mask")?;
    let (train_mask, val_mask, test_mask) = match (train, val, test) {
        (Some(train), Some(val), Some(test)) => (train, val, test),
        (None, None, None) => {
            let (train, val, test) = planetoid_ranges(n);
            log::info!(
                "no split masks in {}, using train {:?}, val {:?}, test {:?}",
                path.display(),
                train,
                val,
                test
            );
            GraphData::range_masks(n, train, val, test)
        }
        _ => {
            return Err(HgclError::data(
                "NPZ bundle must carry all three split masks or none",
            ))
        }
    };

    log::info!(
        "Loaded {}: {} nodes, {} features, {} edges",
        path.display(),
        n,
        features.ncols(),
        edges.len()
    );
    GraphData::new(features, edges, labels, train_mask, val_mask, test_mask)
}

/// Write a dataset as an NPZ bundle readable by [`load_npz_dataset`].
pub fn save_npz_dataset(path: &Path, data: &GraphData) -> Result<()> {
    let n_edges = data.n_edges();
    let mut edge_index = Array2::<i64>::zeros((2, n_edges));
    for (e, &(s, d)) in data.edges.iter().enumerate() {
        edge_index[[0, e]] = s as i64;
        edge_index[[1, e]] = d as i64;
    }
    let y: Array1<i64> = data.labels.iter().map(|&l| l as i64).collect();

    let mut npz = NpzWriter::new(File::create(path)?);
    npz.add_array("x", &data.features)?;
    npz.add_array("edge_index", &edge_index)?;
    npz.add_array("y", &y)?;
    npz.add_array("train_mask", &Array1::from(data.train_mask.clone()))?;
    npz.add_array("val_mask", &Array1::from(data.val_mask.clone()))?;
    npz.add_array("test_mask", &Array1::from(data.test_mask.clone()))?;
    npz.finish()?;
    Ok(())
}

/// Save an \[N, D\] embedding matrix as `.npy`.
pub fn save_embeddings_npy(path: &Path, embedding: &Array2<f32>) -> Result<()> {
    write_npy(path, embedding)?;
    Ok(())
}

pub fn load_embeddings_npy(path: &Path) -> Result<Array2<f32>> {
    Ok(read_npy(path)?)
}
