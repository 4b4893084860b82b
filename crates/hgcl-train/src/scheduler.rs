/// Reduce-on-plateau learning-rate schedule for a metric that should rise.
///
/// A metric counts as better when `metric > best * (1 + threshold)`. Every
/// other epoch is a bad epoch; once more than `patience` bad epochs have
/// accumulated the rate is multiplied by `factor` and the count restarts.
#[derive(Clone, Debug, PartialEq)]
pub struct PlateauScheduler {
    lr: f64,
    factor: f64,
    patience: usize,
    threshold: f64,
    min_delta: f64,
    best: f64,
    bad_epochs: usize,
}

impl PlateauScheduler {
    pub fn new(lr: f64, factor: f64, patience: usize) -> Self {
        Self {
            lr,
            factor,
            patience,
            threshold: 1e-4,
            min_delta: 1e-8,
            best: f64::NEG_INFINITY,
            bad_epochs: 0,
        }
    }

    /// Builder: relative improvement threshold.
    pub const fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn lr(&self) -> f64 {
        self.lr
    }

    pub fn best(&self) -> f64 {
        self.best
    }

    pub fn bad_epochs(&self) -> usize {
        self.bad_epochs
    }

    /// Observe one epoch's metric. Returns the new rate when it was lowered.
    pub fn step(&mut self, metric: f64) -> Option<f64> {
        if metric > self.best * (1.0 + self.threshold) {
            self.best = metric;
            self.bad_epochs = 0;
        } else {
            self.bad_epochs += 1;
        }

        if self.bad_epochs > self.patience {
            self.bad_epochs = 0;
            let reduced = self.lr * self.factor;
            if self.lr - reduced > self.min_delta {
                self.lr = reduced;
                return Some(reduced);
            }
        }
        None
    }
}
