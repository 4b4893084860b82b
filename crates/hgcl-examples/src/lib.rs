//! # hgcl-examples utilities
//!
//! Shared utilities for the HGCL examples: loading citation-graph bundles,
//! generating synthetic graphs and persisting embeddings.
//!
//! ```rust,ignore
//! use hgcl_examples::{load_npz_dataset, save_embeddings_npy};
//! use hgcl_train::{ConsoleObserver, Trainer};
//!
//! let data = load_npz_dataset(Path::new("cora.npz"))?;
//! let report = Trainer::new(HgclConfig::default())?.fit(&data, &mut [&mut ConsoleObserver])?;
//! save_embeddings_npy(Path::new("best_embeddings.npy"), &report.best_embedding)?;
//! ```

pub mod dataset;
pub mod synthetic;

pub use dataset::{
    load_embeddings_npy, load_npz_dataset, planetoid_ranges, save_embeddings_npy,
    save_npz_dataset,
};
pub use synthetic::SyntheticGraph;

/// File name of the persisted best embedding.
pub const EMBEDDINGS_FILE: &str = "best_embeddings.npy";
