//! # hgcl-core
//!
//! Core types for HGCL, hypergraph contrastive learning on citation graphs.
//!
//! This crate provides everything the model and training crates share:
//!
//! - [`GraphData`]: node features, edge list, labels and split masks
//! - [`HgclConfig`]: hyperparameters of a run, loadable from TOML
//! - [`PathConfig`]: data/output directory resolution
//! - [`build_knn_hypergraph`]: feature-similarity k-NN hypergraph incidence
//! - [`PropagationMatrix`]: dense GCN and hypergraph propagation operators
//! - [`HgclError`]: the error type shared by every crate
//!
//! ## Backends
//!
//! Training runs on `Autodiff<NdArray>` by default:
//!
//! ```rust,ignore
//! use hgcl_core::backend::{init_cpu_device, TrainBackend};
//!
//! let device = init_cpu_device();
//! ```

pub mod backend;
pub mod config;
pub mod data;
pub mod error;
pub mod propagation;
pub mod similarity;

pub use backend::*;
pub use config::*;
pub use data::*;
pub use error::*;
pub use propagation::*;
pub use similarity::*;
