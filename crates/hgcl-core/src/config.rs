//! Run and path configuration for HGCL.
//!
//! Two layers of configuration live here:
//!
//! - [`HgclConfig`]: every hyperparameter of a training run (epochs, widths,
//!   augmentation ratios, diffusion schedule, k-NN settings, seed). Defaults
//!   reproduce the reference citation-network setup and can be loaded from a
//!   TOML file.
//! - [`PathConfig`]: where datasets are read from and embeddings are written.
//!
//! Paths can be configured via:
//! 1. CLI arguments (highest priority)
//! 2. Environment variables
//! 3. Paths file (`<config dir>/hgcl/paths.toml`)
//! 4. Default system directories
//!
//! # Example
//!
//! ```ignore
//! use hgcl_core::config::{HgclConfig, PathConfig};
//!
//! let run = HgclConfig::default().with_epochs(200).with_knn_k(10);
//! run.validate()?;
//!
//! let paths = PathConfig::builder().base_dir("/data/hgcl").build();
//! let out = paths.output_dir().join("best_embeddings.npy");
//! ```

use clap::Parser;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{HgclError, Result};

// =============================================================================
// Run Configuration
// =============================================================================

/// Hyperparameters of a single HGCL training run.
///
/// # Example TOML
///
/// ```toml
/// epochs = 300
/// learning_rate = 0.001
/// knn_k = 10
/// seed = 7
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HgclConfig {
    /// Maximum number of training epochs.
    pub epochs: usize,
    /// Initial AdamW learning rate.
    pub learning_rate: f64,
    /// InfoNCE temperature.
    pub temperature: f32,
    /// Probability of zeroing each feature entry.
    pub mask_ratio: f32,
    /// Probability of dropping each undirected edge.
    pub edge_drop_ratio: f32,
    /// Number of diffusion steps T.
    pub diffusion_steps: usize,
    /// First noise variance of the linear schedule.
    pub beta_start: f64,
    /// Last noise variance of the linear schedule.
    pub beta_end: f64,
    /// Weight of the contrastive term; the diffusion term gets `1 - gamma`.
    pub gamma: f32,
    /// Width of the message-passing layers.
    pub hidden_channels: usize,
    /// Width of the projected embedding.
    pub embedding_dim: usize,
    /// Neighbours per node in the similarity hypergraph.
    pub knn_k: usize,
    /// Rows per similarity batch when building the hypergraph.
    pub knn_batch_size: usize,
    /// Epochs without improvement before early stopping.
    pub patience: usize,
    /// AdamW weight decay.
    pub weight_decay: f32,
    /// Non-improving epochs tolerated before the learning rate is reduced.
    pub plateau_patience: usize,
    /// Multiplicative learning-rate reduction on plateau.
    pub plateau_factor: f64,
    /// Inverse L2 regularization strength of the linear probe.
    pub probe_c: f64,
    /// Row-averaged gradient tolerance for judging the linear probe converged.
    pub probe_tol: f64,
    /// Seed for every stochastic component of the run.
    pub seed: u64,
}

impl Default for HgclConfig {
    fn default() -> Self {
        Self {
            epochs: 500,
            learning_rate: 0.001,
            temperature: 0.7,
            mask_ratio: 0.3,
            edge_drop_ratio: 0.2,
            diffusion_steps: 20,
            beta_start: 1e-4,
            beta_end: 0.02,
            gamma: 0.8,
            hidden_channels: 512,
            embedding_dim: 256,
            knn_k: 15,
            knn_batch_size: 512,
            patience: 30,
            weight_decay: 1e-5,
            plateau_patience: 10,
            plateau_factor: 0.5,
            probe_c: 1.0,
            probe_tol: 1e-4,
            seed: 42,
        }
    }
}

impl HgclConfig {
    /// Small widths and few epochs, for smoke runs and tests.
    pub fn dev() -> Self {
        Self {
            epochs: 20,
            hidden_channels: 32,
            embedding_dim: 16,
            knn_k: 3,
            knn_batch_size: 64,
            patience: 5,
            plateau_patience: 3,
            ..Self::default()
        }
    }

    /// Load a run configuration from a TOML file. Missing keys take defaults.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to a pretty TOML string.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| HgclError::config(e.to_string()))
    }

    /// Builder: set epoch count.
    pub const fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    /// Builder: set learning rate.
    pub const fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    /// Builder: set augmentation ratios.
    pub const fn with_augmentation(mut self, mask_ratio: f32, edge_drop_ratio: f32) -> Self {
        self.mask_ratio = mask_ratio;
        self.edge_drop_ratio = edge_drop_ratio;
        self
    }

    /// Builder: set the loss-mixing weight.
    pub const fn with_gamma(mut self, gamma: f32) -> Self {
        self.gamma = gamma;
        self
    }

    /// Builder: set hidden and embedding widths.
    pub const fn with_widths(mut self, hidden: usize, embedding: usize) -> Self {
        self.hidden_channels = hidden;
        self.embedding_dim = embedding;
        self
    }

    /// Builder: set k-NN neighbour count.
    pub const fn with_knn_k(mut self, k: usize) -> Self {
        self.knn_k = k;
        self
    }

    /// Builder: set early-stopping patience.
    pub const fn with_patience(mut self, patience: usize) -> Self {
        self.patience = patience;
        self
    }

    /// Builder: set seed.
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check the data-independent constraints.
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(HgclError::config("epochs must be at least 1"));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(HgclError::config(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !(self.temperature > 0.0 && self.temperature.is_finite()) {
            return Err(HgclError::config(format!(
                "temperature must be positive, got {}",
                self.temperature
            )));
        }
        for (name, ratio) in [
            ("mask_ratio", self.mask_ratio),
            ("edge_drop_ratio", self.edge_drop_ratio),
        ] {
            if !(0.0..1.0).contains(&ratio) {
                return Err(HgclError::config(format!(
                    "{name} must lie in [0, 1), got {ratio}"
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(HgclError::config(format!(
                "gamma must lie in [0, 1], got {}",
                self.gamma
            )));
        }
        if self.diffusion_steps == 0 {
            return Err(HgclError::config("diffusion_steps must be at least 1"));
        }
        if !(self.beta_start > 0.0 && self.beta_start <= self.beta_end && self.beta_end < 1.0) {
            return Err(HgclError::config(format!(
                "noise schedule needs 0 < beta_start <= beta_end < 1, got {}..{}",
                self.beta_start, self.beta_end
            )));
        }
        if self.hidden_channels == 0 || self.embedding_dim == 0 {
            return Err(HgclError::config("hidden and embedding widths must be non-zero"));
        }
        if self.knn_k == 0 {
            return Err(HgclError::config("knn_k must be at least 1"));
        }
        if self.knn_batch_size == 0 {
            return Err(HgclError::config("knn_batch_size must be at least 1"));
        }
        if self.patience == 0 {
            return Err(HgclError::config("patience must be at least 1"));
        }
        if !(self.plateau_factor > 0.0 && self.plateau_factor < 1.0) {
            return Err(HgclError::config(format!(
                "plateau_factor must lie in (0, 1), got {}",
                self.plateau_factor
            )));
        }
        if self.weight_decay < 0.0 || self.probe_c <= 0.0 || self.probe_tol <= 0.0 {
            return Err(HgclError::config(
                "weight_decay must be >= 0, probe_c and probe_tol must be > 0",
            ));
        }
        Ok(())
    }

    /// Check constraints that depend on the dataset shape.
    pub fn validate_for(&self, n_nodes: usize, n_features: usize) -> Result<()> {
        self.validate()?;
        if n_features == 0 {
            return Err(HgclError::config("feature width must be non-zero"));
        }
        if self.knn_k >= n_nodes {
            return Err(HgclError::config(format!(
                "knn_k ({}) must be smaller than the node count ({})",
                self.knn_k, n_nodes
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Path Configuration
// =============================================================================

/// Directory flags shared by every HGCL binary.
#[derive(Parser, Debug, Clone, Default)]
pub struct PathArgs {
    /// Directory holding dataset bundles
    #[arg(long, env = "HGCL_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Directory receiving embeddings and reports
    #[arg(long, env = "HGCL_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Root for both directories (`<base>/data`, `<base>/output`)
    #[arg(long, env = "HGCL_BASE_DIR")]
    pub base_dir: Option<PathBuf>,

    /// Path config file, default `<config dir>/hgcl/paths.toml`
    #[arg(long, env = "HGCL_PATHS_FILE")]
    pub paths_file: Option<PathBuf>,
}

/// On-disk form of [`PathArgs`].
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PathConfigFile {
    pub data_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub base_dir: Option<PathBuf>,
}

/// Resolved data and output directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathConfig {
    data_dir: PathBuf,
    output_dir: PathBuf,
}

impl PathConfig {
    /// Resolve each directory as: explicit flag, then `base_dir`, then the
    /// paths file, then the OS default. Flags already include their `HGCL_*`
    /// environment variables through clap.
    pub fn from_path_args(args: PathArgs) -> Self {
        let file = load_paths_file(args.paths_file.as_deref());
        let base = args.base_dir.or(file.base_dir);
        let (default_data, default_output) = default_dirs();

        let resolve = |explicit: Option<PathBuf>,
                       sub: &str,
                       from_file: Option<PathBuf>,
                       default: PathBuf| {
            explicit
                .or_else(|| base.as_ref().map(|b| b.join(sub)))
                .or(from_file)
                .unwrap_or(default)
        };

        PathConfig {
            data_dir: resolve(args.data_dir, "data", file.data_dir, default_data),
            output_dir: resolve(args.output_dir, "output", file.output_dir, default_output),
        }
    }

    pub fn builder() -> PathConfigBuilder {
        PathConfigBuilder::default()
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Create both directories if missing.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        fs::create_dir_all(&self.output_dir)
    }

    pub fn print_summary(&self) {
        println!("HGCL Path Configuration:");
        println!("  Data:   {:?}", self.data_dir);
        println!("  Output: {:?}", self.output_dir);
    }
}

impl Default for PathConfig {
    fn default() -> Self {
        let (data_dir, output_dir) = default_dirs();
        PathConfig {
            data_dir,
            output_dir,
        }
    }
}

fn default_dirs() -> (PathBuf, PathBuf) {
    match ProjectDirs::from("", "", "hgcl") {
        Some(dirs) => (dirs.data_dir().to_path_buf(), dirs.data_dir().join("output")),
        None => {
            let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            (cwd.join(".hgcl/data"), cwd.join("output"))
        }
    }
}

/// A missing file yields defaults; an unreadable one is logged and ignored.
fn load_paths_file(path: Option<&Path>) -> PathConfigFile {
    let path = match path.map(PathBuf::from).or_else(|| {
        ProjectDirs::from("", "", "hgcl").map(|dirs| dirs.config_dir().join("paths.toml"))
    }) {
        Some(path) if path.exists() => path,
        _ => return PathConfigFile::default(),
    };

    match fs::read_to_string(&path).map(|s| toml::from_str::<PathConfigFile>(&s)) {
        Ok(Ok(file)) => file,
        Ok(Err(e)) => {
            log::warn!("Ignoring malformed path config {:?}: {}", path, e);
            PathConfigFile::default()
        }
        Err(e) => {
            log::warn!("Could not read path config {:?}: {}", path, e);
            PathConfigFile::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PathConfigBuilder {
    data_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    base_dir: Option<PathBuf>,
}

impl PathConfigBuilder {
    pub fn data_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.data_dir = Some(path.into());
        self
    }

    pub fn output_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    pub fn base_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.base_dir = Some(path.into());
        self
    }

    pub fn build(self) -> PathConfig {
        let (data, output) = match &self.base_dir {
            Some(base) => (base.join("data"), base.join("output")),
            None => default_dirs(),
        };
        PathConfig {
            data_dir: self.data_dir.unwrap_or(data),
            output_dir: self.output_dir.unwrap_or(output),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_run_config_is_valid() {
        let config = HgclConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.knn_k, 15);
        assert_eq!(config.diffusion_steps, 20);
        assert!((config.gamma - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_probe_settings_must_be_positive() {
        let mut config = HgclConfig::dev();
        config.probe_tol = 0.0;
        assert!(matches!(config.validate(), Err(HgclError::InvalidConfig(_))));
        config.probe_tol = 1e-4;
        config.probe_c = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_paths_keep_output_apart_from_data() {
        let config = PathConfig::default();
        assert!(config.output_dir().ends_with("output"));
        assert_ne!(config.output_dir(), config.data_dir());
    }

    #[test]
    fn test_knn_k_must_be_below_node_count() {
        let config = HgclConfig::default().with_knn_k(10);
        assert!(config.validate_for(11, 3).is_ok());
        assert!(matches!(
            config.validate_for(10, 3),
            Err(HgclError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_bad_ratios_and_widths() {
        assert!(HgclConfig::default().with_augmentation(1.0, 0.2).validate().is_err());
        assert!(HgclConfig::default().with_augmentation(0.3, -0.1).validate().is_err());
        assert!(HgclConfig::default().with_widths(0, 16).validate().is_err());
        assert!(HgclConfig::default().with_gamma(1.5).validate().is_err());
        assert!(HgclConfig::default().with_gamma(1.0).validate().is_ok());
    }

    #[test]
    fn test_toml_round_trip_with_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.toml");
        fs::write(&path, "epochs = 12\nknn_k = 4\nseed = 9\n").unwrap();

        let config = HgclConfig::from_toml_file(&path).unwrap();
        assert_eq!(config.epochs, 12);
        assert_eq!(config.knn_k, 4);
        assert_eq!(config.seed, 9);
        assert_eq!(config.hidden_channels, HgclConfig::default().hidden_channels);

        let text = config.to_toml_string().unwrap();
        let reparsed: HgclConfig = toml::from_str(&text).unwrap();
        assert_eq!(reparsed, config);
    }

    #[test]
    fn test_explicit_dirs_win_over_base() {
        let config = PathConfig::builder()
            .base_dir("/srv/hgcl")
            .data_dir("/mnt/datasets")
            .build();
        assert_eq!(config.data_dir(), Path::new("/mnt/datasets"));
        assert_eq!(config.output_dir(), Path::new("/srv/hgcl/output"));
    }

    #[test]
    fn test_paths_file_fills_unset_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("paths.toml");
        fs::write(&file, "output_dir = \"/tmp/hgcl-out\"\n").unwrap();

        let config = PathConfig::from_path_args(PathArgs {
            data_dir: Some(dir.path().join("data")),
            paths_file: Some(file),
            ..PathArgs::default()
        });
        assert_eq!(config.data_dir(), dir.path().join("data"));
        assert_eq!(config.output_dir(), Path::new("/tmp/hgcl-out"));
    }

    #[test]
    fn test_base_dir_arg_places_both_dirs() {
        let config = PathConfig::from_path_args(PathArgs {
            base_dir: Some(PathBuf::from("/Volumes/External/hgcl")),
            paths_file: Some(PathBuf::from("/nonexistent/paths.toml")),
            ..PathArgs::default()
        });
        assert_eq!(config.data_dir(), Path::new("/Volumes/External/hgcl/data"));
        assert_eq!(config.output_dir(), Path::new("/Volumes/External/hgcl/output"));
    }
}
