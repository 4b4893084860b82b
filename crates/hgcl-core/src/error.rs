//! Error types for HGCL.

use thiserror::Error;

/// Error type shared by every HGCL crate.
#[derive(Error, Debug)]
pub enum HgclError {
    /// Invalid hyperparameters (k vs node count, widths, ratios).
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Malformed input data (split masks, non-finite features, edge indices).
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Tensor data could not be converted between the backend and the host.
    #[error("Tensor error: {0}")]
    Tensor(String),

    /// The linear-probe solver rejected its input.
    #[error("Linear probe error: {0}")]
    Probe(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// NPY read error.
    #[error("NPY read error: {0}")]
    NpyRead(#[from] ndarray_npy::ReadNpyError),

    /// NPY write error.
    #[error("NPY write error: {0}")]
    NpyWrite(#[from] ndarray_npy::WriteNpyError),

    /// NPZ read error.
    #[error("NPZ error: {0}")]
    Npz(#[from] ndarray_npy::ReadNpzError),

    /// NPZ write error.
    #[error("NPZ write error: {0}")]
    NpzWrite(#[from] ndarray_npy::WriteNpzError),

    /// TOML parse error.
    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type for HGCL operations.
pub type Result<T> = std::result::Result<T, HgclError>;

impl HgclError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn data(msg: impl Into<String>) -> Self {
        Self::InvalidData(msg.into())
    }
}

impl From<burn::tensor::DataError> for HgclError {
    fn from(err: burn::tensor::DataError) -> Self {
        Self::Tensor(format!("{err:?}"))
    }
}
