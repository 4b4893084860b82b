use crate::training::{EpochRecord, TrainingReport};

/// Interface for objects that watch a training run.
///
/// Every hook has a no-op default, so an observer only implements what it
/// reports on. Hooks fire in this order within one epoch:
/// [`on_lr_reduced`](Self::on_lr_reduced), [`on_epoch`](Self::on_epoch),
/// [`on_early_stop`](Self::on_early_stop).
pub trait TrainingObserver {
    /// The plateau scheduler lowered the learning rate.
    fn on_lr_reduced(&mut self, _epoch: usize, _lr: f64) {}

    /// One epoch finished.
    fn on_epoch(&mut self, _record: &EpochRecord) {}

    /// Patience ran out at `epoch`.
    fn on_early_stop(&mut self, _epoch: usize) {}

    /// The run finished and the report is final.
    fn on_finish(&mut self, _report: &TrainingReport) {}
}

/// Prints progress to stdout.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleObserver;

impl TrainingObserver for ConsoleObserver {
    fn on_lr_reduced(&mut self, _epoch: usize, lr: f64) {
        println!("Learning rate reduced to {:.6}", lr);
    }

    fn on_epoch(&mut self, record: &EpochRecord) {
        println!("{}", record.progress_line());
    }

    fn on_early_stop(&mut self, epoch: usize) {
        println!("Early stopping at epoch {}", epoch);
    }

    fn on_finish(&mut self, report: &TrainingReport) {
        println!("\n=== Final Results ===");
        println!("Best Validation Accuracy: {:.4}", report.best_val_acc);
        println!("Test Accuracy: {:.4}", report.test_acc);
    }
}

/// Keeps everything it observes in memory.
#[derive(Clone, Debug, Default)]
pub struct HistoryObserver {
    pub epochs: Vec<EpochRecord>,
    pub lr_reductions: Vec<(usize, f64)>,
    pub early_stop_epoch: Option<usize>,
    pub finished: bool,
}

impl HistoryObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn val_accuracies(&self) -> Vec<f64> {
        self.epochs.iter().map(|r| r.val_acc).collect()
    }
}

impl TrainingObserver for HistoryObserver {
    fn on_lr_reduced(&mut self, epoch: usize, lr: f64) {
        self.lr_reductions.push((epoch, lr));
    }

    fn on_epoch(&mut self, record: &EpochRecord) {
        self.epochs.push(record.clone());
    }

    fn on_early_stop(&mut self, epoch: usize) {
        self.early_stop_epoch = Some(epoch);
    }

    fn on_finish(&mut self, _report: &TrainingReport) {
        self.finished = true;
    }
}
