//! Smoke run of the full pipeline on a small synthetic graph.
//!
//! Run with: cargo run --example synthetic_smoke
//!
//! The generated graph goes through an NPZ bundle under the output directory,
//! so the loader runs as well.

use anyhow::{Context, Result};
use hgcl_core::config::PathConfig;
use hgcl_core::HgclConfig;
use hgcl_examples::{
    load_embeddings_npy, load_npz_dataset, save_embeddings_npy, save_npz_dataset,
    SyntheticGraph, EMBEDDINGS_FILE,
};
use hgcl_train::{HistoryObserver, Trainer};

fn main() -> Result<()> {
    env_logger::init();

    let out_dir = PathConfig::default().output_dir().join("synthetic_smoke");
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    println!("=== Synthetic Graph ===");
    let generated = SyntheticGraph::default().with_seed(7).generate()?;
    let bundle = out_dir.join("synthetic.npz");
    save_npz_dataset(&bundle, &generated)?;
    let data = load_npz_dataset(&bundle)?;
    println!(
        "{} nodes, {} edges, {} classes -> {}",
        data.n_nodes(),
        data.n_edges(),
        data.n_classes(),
        bundle.display()
    );

    println!("\n=== Training (dev config) ===");
    let config = HgclConfig::dev().with_epochs(10);
    let mut history = HistoryObserver::new();
    let report = Trainer::new(config)?.fit(&data, &mut [&mut history])?;
    for record in &history.epochs {
        println!("{}", record.progress_line());
    }
    print!("{report}");

    let path = out_dir.join(EMBEDDINGS_FILE);
    save_embeddings_npy(&path, &report.best_embedding)?;
    let reloaded = load_embeddings_npy(&path)?;
    anyhow::ensure!(
        reloaded == report.best_embedding,
        "embedding changed on round trip"
    );
    println!("Best embeddings saved to {}", path.display());
    Ok(())
}
