//! Best-state tracking and early stopping, independent of the model.
//!
//! ```text
//! Running --record--> Improved | Stagnant --...--> EarlyStopped | Exhausted
//! ```
//!
//! An epoch improves when validation accuracy strictly rises, or when it
//! ties the best so far and the training loss is strictly lower than the
//! loss recorded with that best. Either way the stagnation counter resets;
//! any other epoch increments it. The run stops early once the counter
//! reaches `patience`.

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TrainingState {
    /// No epoch recorded yet.
    Running,
    /// The last epoch produced a new best.
    Improved,
    /// The last epoch did not improve.
    Stagnant,
    /// Patience ran out.
    EarlyStopped,
    /// The epoch budget ran out.
    Exhausted,
}

impl TrainingState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::EarlyStopped | Self::Exhausted)
    }
}

impl fmt::Display for TrainingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Running => "running",
            Self::Improved => "improved",
            Self::Stagnant => "stagnant",
            Self::EarlyStopped => "early stopped",
            Self::Exhausted => "exhausted",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EarlyStopping {
    patience: usize,
    counter: usize,
    best_val_acc: f64,
    best_loss: f64,
    best_epoch: Option<usize>,
    epochs_seen: usize,
    state: TrainingState,
}

impl EarlyStopping {
    /// Start with best accuracy 0 and best loss +inf.
    pub fn new(patience: usize) -> Self {
        Self {
            patience,
            counter: 0,
            best_val_acc: 0.0,
            best_loss: f64::INFINITY,
            best_epoch: None,
            epochs_seen: 0,
            state: TrainingState::Running,
        }
    }

    /// Apply the best-state rule to one epoch. Returns `Improved` or
    /// `Stagnant`, or `EarlyStopped` when this epoch used up the patience.
    pub fn record(&mut self, val_acc: f64, loss: f64) -> TrainingState {
        self.epochs_seen += 1;
        let improved = val_acc > self.best_val_acc
            || (val_acc == self.best_val_acc && loss < self.best_loss);

        if improved {
            self.best_val_acc = val_acc;
            self.best_loss = loss;
            self.best_epoch = Some(self.epochs_seen);
            self.counter = 0;
            self.state = TrainingState::Improved;
        } else {
            self.counter += 1;
            self.state = TrainingState::Stagnant;
        }

        if self.counter >= self.patience {
            self.state = TrainingState::EarlyStopped;
        }
        self.state
    }

    /// Whether the last [`record`](Self::record) produced a new best.
    pub fn improved(&self) -> bool {
        self.counter == 0 && self.best_epoch == Some(self.epochs_seen)
    }

    /// Mark the epoch budget as spent, unless already stopped.
    pub fn exhaust(&mut self) -> TrainingState {
        if !self.state.is_terminal() {
            self.state = TrainingState::Exhausted;
        }
        self.state
    }

    pub fn should_stop(&self) -> bool {
        self.state == TrainingState::EarlyStopped
    }

    pub fn state(&self) -> TrainingState {
        self.state
    }

    pub fn counter(&self) -> usize {
        self.counter
    }

    pub fn best_val_acc(&self) -> f64 {
        self.best_val_acc
    }

    pub fn best_loss(&self) -> f64 {
        self.best_loss
    }

    /// 1-based epoch of the current best, if any.
    pub fn best_epoch(&self) -> Option<usize> {
        self.best_epoch
    }
}
