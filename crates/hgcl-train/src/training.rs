//! The HGCL training loop.
//!
//! Per epoch:
//!
//! 1. training forward pass (autodiff backend), backward, AdamW step
//! 2. evaluation forward pass on the inner backend with fresh random draws
//! 3. linear-probe validation accuracy of the evaluation embedding
//! 4. plateau scheduler step on the validation accuracy
//! 5. best-state update; on improvement the test accuracy is re-evaluated
//!    on the new best embedding
//! 6. stop once patience runs out, otherwise continue to the epoch budget
//!
//! If no epoch ever improved, the last validation embedding becomes the best
//! and its test accuracy is evaluated.

use std::fmt;

use burn::module::AutodiffModule;
use burn::optim::{AdamWConfig, GradientsParams, Optimizer};
use ndarray::Array2;

use hgcl_core::backend::{init_cpu_device, CpuBackend, TrainBackend};
use hgcl_core::{build_knn_hypergraph, GraphData, HgclConfig, HgclError, Result, Split};
use hgcl_models::{GraphInputs, HgclModel, HgclModelConfig, HgclObjective};
use hgcl_samplers::RngKey;

use crate::early_stopping::{EarlyStopping, TrainingState};
use crate::evaluation::{embedding_to_array, EmbeddingEvaluator, LinearProbe};
use crate::observer::TrainingObserver;
use crate::scheduler::PlateauScheduler;

const ADAM_EPSILON: f32 = 1e-8;

/// Everything measured in one epoch.
#[derive(Clone, Debug, PartialEq)]
pub struct EpochRecord {
    /// 1-based.
    pub epoch: usize,
    pub loss: f32,
    pub contrastive_loss: f32,
    pub diffusion_loss: f32,
    pub val_acc: f64,
    /// Test accuracy of the best embedding so far.
    pub best_test_acc: f64,
    /// Rate after this epoch's scheduler step.
    pub lr: f64,
    pub state: TrainingState,
}

impl EpochRecord {
    pub fn progress_line(&self) -> String {
        format!(
            "Epoch {:03}, Loss: {:.4}, Val Acc: {:.4}, Best Test Acc: {:.4}, LR: {:.6}",
            self.epoch, self.loss, self.val_acc, self.best_test_acc, self.lr
        )
    }
}

/// Outcome of a training run.
#[derive(Clone, Debug)]
pub struct TrainingReport {
    pub history: Vec<EpochRecord>,
    pub best_val_acc: f64,
    /// Test accuracy of [`best_embedding`](Self::best_embedding).
    pub test_acc: f64,
    /// 1-based epoch of the best embedding, `None` when the fallback was used.
    pub best_epoch: Option<usize>,
    pub final_state: TrainingState,
    /// \[N, D\] graph-view embedding with the best validation accuracy.
    pub best_embedding: Array2<f32>,
    /// The best embedding is the last validation embedding because no epoch improved.
    pub used_fallback: bool,
    pub n_incidences: usize,
}

impl TrainingReport {
    pub fn epochs_run(&self) -> usize {
        self.history.len()
    }

    pub fn early_stopped(&self) -> bool {
        self.final_state == TrainingState::EarlyStopped
    }

    pub fn summary(&self) -> String {
        format!(
            "Training: {} epochs, best val acc={:.4} at epoch {}, test acc={:.4}, {}",
            self.epochs_run(),
            self.best_val_acc,
            self.best_epoch.map_or_else(|| "-".to_string(), |e| e.to_string()),
            self.test_acc,
            self.final_state
        )
    }
}

impl fmt::Display for TrainingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TrainingReport:")?;
        writeln!(f, "  Epochs trained: {}", self.epochs_run())?;
        match self.best_epoch {
            Some(epoch) => writeln!(f, "  Best epoch: {}", epoch)?,
            None => writeln!(f, "  Best epoch: none (last embedding used)")?,
        }
        writeln!(f, "  Best val acc: {:.4}", self.best_val_acc)?;
        writeln!(f, "  Test acc: {:.4}", self.test_acc)?;
        writeln!(f, "  Final state: {}", self.final_state)?;
        if let Some(last) = self.history.last() {
            writeln!(f, "  Final loss: {:.4}", last.loss)?;
            writeln!(f, "  Final LR: {:.6}", last.lr)?;
        }
        Ok(())
    }
}

/// Runs the HGCL training loop with a pluggable evaluator.
#[derive(Clone, Debug)]
pub struct Trainer<E = LinearProbe> {
    config: HgclConfig,
    evaluator: E,
}

impl Trainer<LinearProbe> {
    /// Trainer scoring embeddings with the configured linear probe.
    pub fn new(config: HgclConfig) -> Result<Self> {
        let probe = LinearProbe::from_config(&config);
        Self::with_evaluator(config, probe)
    }
}

impl<E: EmbeddingEvaluator> Trainer<E> {
    pub fn with_evaluator(config: HgclConfig, evaluator: E) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, evaluator })
    }

    pub fn config(&self) -> &HgclConfig {
        &self.config
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    /// Train on `data` and return the best embedding with its accuracies.
    pub fn fit(
        &self,
        data: &GraphData,
        observers: &mut [&mut dyn TrainingObserver],
    ) -> Result<TrainingReport> {
        let config = &self.config;
        data.validate()?;
        config.validate_for(data.n_nodes(), data.n_features())?;

        log::info!(
            "Building hypergraph (k={}, batch={}) for {} nodes",
            config.knn_k,
            config.knn_batch_size,
            data.n_nodes()
        );
        let incidence =
            build_knn_hypergraph(&data.features, config.knn_k, config.knn_batch_size)?;
        log::info!("Hypergraph built with {} incidences", incidence.len());

        let device = init_cpu_device();
        let train_inputs = GraphInputs::<TrainBackend>::new(data, &incidence, &device);
        let eval_inputs = GraphInputs::<CpuBackend>::new(data, &incidence, &device);

        let mut rng = RngKey::new(config.seed).rng();
        let mut model: HgclModel<TrainBackend> =
            HgclModelConfig::from_config(config, data.n_features()).init(&mut rng, &device);
        let objective = HgclObjective::from_config(config)?;

        let mut optim = AdamWConfig::new()
            .with_weight_decay(config.weight_decay)
            .with_epsilon(ADAM_EPSILON)
            .init::<TrainBackend, HgclModel<TrainBackend>>();
        let mut scheduler = PlateauScheduler::new(
            config.learning_rate,
            config.plateau_factor,
            config.plateau_patience,
        );
        let mut stopping = EarlyStopping::new(config.patience);

        let mut history = Vec::with_capacity(config.epochs);
        let mut best_embedding: Option<Array2<f32>> = None;
        let mut last_embedding: Option<Array2<f32>> = None;
        let mut test_acc = 0.0;

        for epoch in 1..=config.epochs {
            let out = objective.forward(&model, &train_inputs, &mut rng);
            let loss = out.loss_value();
            let (contrastive_loss, diffusion_loss) =
                (out.contrastive_value(), out.diffusion_value());
            let grads = GradientsParams::from_grads(out.loss.backward(), &model);
            model = optim.step(scheduler.lr(), model, grads);

            let eval_model = model.valid();
            let eval_out = objective.forward(&eval_model, &eval_inputs, &mut rng);
            let embedding = embedding_to_array(eval_out.embedding)?;
            let val_acc = self.evaluator.accuracy(&embedding, data, Split::Validation)?;

            if let Some(lr) = scheduler.step(val_acc) {
                log::debug!("epoch {}: plateau, learning rate now {}", epoch, lr);
                for obs in observers.iter_mut() {
                    obs.on_lr_reduced(epoch, lr);
                }
            }

            let state = stopping.record(val_acc, f64::from(loss));
            if stopping.improved() {
                test_acc = self.evaluator.accuracy(&embedding, data, Split::Test)?;
                best_embedding = Some(embedding.clone());
            }
            last_embedding = Some(embedding);

            let record = EpochRecord {
                epoch,
                loss,
                contrastive_loss,
                diffusion_loss,
                val_acc,
                best_test_acc: test_acc,
                lr: scheduler.lr(),
                state,
            };
            for obs in observers.iter_mut() {
                obs.on_epoch(&record);
            }
            history.push(record);

            if stopping.should_stop() {
                log::info!("patience {} exhausted at epoch {}", config.patience, epoch);
                for obs in observers.iter_mut() {
                    obs.on_early_stop(epoch);
                }
                break;
            }
        }
        let final_state = stopping.exhaust();

        let (best_embedding, used_fallback) = match (best_embedding, last_embedding) {
            (Some(best), _) => (best, false),
            (None, Some(last)) => {
                log::warn!("no epoch improved validation accuracy; using the last embedding");
                test_acc = self.evaluator.accuracy(&last, data, Split::Test)?;
                (last, true)
            }
            (None, None) => {
                return Err(HgclError::config("training ran zero epochs"));
            }
        };

        let report = TrainingReport {
            history,
            best_val_acc: stopping.best_val_acc(),
            test_acc,
            best_epoch: stopping.best_epoch(),
            final_state,
            best_embedding,
            used_fallback,
            n_incidences: incidence.len(),
        };
        log::info!("{}", report.summary());
        for obs in observers.iter_mut() {
            obs.on_finish(&report);
        }
        Ok(report)
    }
}
