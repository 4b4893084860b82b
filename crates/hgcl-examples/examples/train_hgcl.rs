//! Train HGCL on a citation graph and save the best node embeddings.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --example train_hgcl -- --dataset data/cora.npz
//!
//! # Override hyperparameters or load them from TOML:
//! cargo run --release --example train_hgcl -- \
//!     --dataset data/cora.npz --run-config hgcl.toml --epochs 200 --gamma 0.9
//!
//! # Keep all files on another disk:
//! HGCL_BASE_DIR=/Volumes/External/hgcl cargo run --release --example train_hgcl
//! ```
//!
//! Without `--dataset` the bundle `cora.npz` in the data directory is used.
//! `--synthetic` trains on a generated graph instead.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use hgcl_core::config::{PathArgs, PathConfig};
use hgcl_core::HgclConfig;
use hgcl_examples::{load_npz_dataset, save_embeddings_npy, SyntheticGraph, EMBEDDINGS_FILE};
use hgcl_train::{ConsoleObserver, Trainer};

/// HGCL - hypergraph contrastive learning with diffusion denoising
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Train HGCL node embeddings")]
struct Args {
    /// NPZ dataset bundle (x, edge_index, y, optional masks)
    #[arg(long, short = 'd')]
    dataset: Option<PathBuf>,

    /// Train on a synthetic graph instead of a dataset file
    #[arg(long, conflicts_with = "dataset")]
    synthetic: bool,

    /// TOML file with run hyperparameters
    #[arg(long, env = "HGCL_RUN_CONFIG")]
    run_config: Option<PathBuf>,

    /// Number of training epochs
    #[arg(long, short = 'e', env = "HGCL_EPOCHS")]
    epochs: Option<usize>,

    /// Learning rate
    #[arg(long, short = 'l', env = "HGCL_LR")]
    learning_rate: Option<f64>,

    /// Weight of the contrastive loss
    #[arg(long)]
    gamma: Option<f32>,

    /// Feature-mask ratio
    #[arg(long)]
    mask_ratio: Option<f32>,

    /// Edge-drop ratio
    #[arg(long)]
    edge_drop_ratio: Option<f32>,

    /// Neighbours per node in the similarity hypergraph
    #[arg(long, short = 'k')]
    knn_k: Option<usize>,

    /// Early-stopping patience
    #[arg(long)]
    patience: Option<usize>,

    /// Random seed
    #[arg(long, short = 's')]
    seed: Option<u64>,

    /// Path configuration (data and output directories)
    #[command(flatten)]
    paths: PathArgs,
}

impl Args {
    fn run_config(&self) -> Result<HgclConfig> {
        let mut config = match &self.run_config {
            Some(path) => HgclConfig::from_toml_file(path)
                .with_context(|| format!("Failed to load run config {}", path.display()))?,
            None => HgclConfig::default(),
        };
        if let Some(epochs) = self.epochs {
            config.epochs = epochs;
        }
        if let Some(lr) = self.learning_rate {
            config.learning_rate = lr;
        }
        if let Some(gamma) = self.gamma {
            config.gamma = gamma;
        }
        if let Some(ratio) = self.mask_ratio {
            config.mask_ratio = ratio;
        }
        if let Some(ratio) = self.edge_drop_ratio {
            config.edge_drop_ratio = ratio;
        }
        if let Some(k) = self.knn_k {
            config.knn_k = k;
        }
        if let Some(patience) = self.patience {
            config.patience = patience;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        config.validate().context("Invalid run configuration")?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let paths = PathConfig::from_path_args(args.paths.clone());
    paths.print_summary();
    paths
        .ensure_dirs()
        .context("Failed to create HGCL directories")?;

    let config = args.run_config()?;

    println!("=== Loading Data ===");
    let data = if args.synthetic {
        SyntheticGraph::default()
            .with_seed(config.seed)
            .generate()
            .context("Failed to generate synthetic graph")?
    } else {
        let path = args
            .dataset
            .clone()
            .unwrap_or_else(|| paths.data_dir().join("cora.npz"));
        load_npz_dataset(&path)
            .with_context(|| format!("Failed to load dataset {}", path.display()))?
    };
    println!(
        "Nodes: {}, Features: {}, Edges: {}, Classes: {}",
        data.n_nodes(),
        data.n_features(),
        data.n_edges(),
        data.n_classes()
    );

    println!("\n=== Training ===");
    println!(
        "epochs={}, lr={}, gamma={}, k={}, patience={}, seed={}",
        config.epochs,
        config.learning_rate,
        config.gamma,
        config.knn_k,
        config.patience,
        config.seed
    );
    let start = Instant::now();
    let trainer = Trainer::new(config).context("Failed to create trainer")?;
    let report = trainer
        .fit(&data, &mut [&mut ConsoleObserver])
        .context("Training failed")?;
    println!("Training took {:.1}s", start.elapsed().as_secs_f64());
    log::info!("{}", report.summary());

    let out_path = paths.output_dir().join(EMBEDDINGS_FILE);
    save_embeddings_npy(&out_path, &report.best_embedding)
        .with_context(|| format!("Failed to save embeddings to {}", out_path.display()))?;
    println!("Best embeddings saved to {}", out_path.display());

    Ok(())
}
