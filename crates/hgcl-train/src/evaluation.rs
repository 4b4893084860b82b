//! Linear-probe evaluation of frozen embeddings.
//!
//! A multinomial logistic regression with intercept is fitted on the
//! training rows and scored on another split. The fit is smartcore's
//! `LogisticRegression` (L-BFGS in f64) with `alpha = 1 / C`, so it
//! minimizes
//!
//! ```text
//! f(W, b) = 0.5 * ||W||^2 + C * sum_i CE(softmax(x_i W + b), y_i)
//! ```
//!
//! up to the constant factor `C`. Convergence is judged after the fit from
//! the gradient of that objective. Fixed embeddings and labels always give
//! the same classifier and the same accuracy.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use log::{debug, warn};
use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2, Axis};
use smartcore::linalg::basic::arrays::{Array, Array2 as _, MutArray};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::logistic_regression::{LogisticRegression, LogisticRegressionParameters};

use hgcl_core::{GraphData, HgclConfig, HgclError, Result, Split};

/// Anything that can score an embedding on a split.
pub trait EmbeddingEvaluator {
    /// Classification accuracy of `embedding` on `split`, in `[0, 1]`.
    fn accuracy(&self, embedding: &Array2<f32>, data: &GraphData, split: Split) -> Result<f64>;
}

/// Copy a \[N, D\] tensor to the host.
pub fn embedding_to_array<B: Backend>(embedding: Tensor<B, 2>) -> Result<Array2<f32>> {
    let [n, d] = embedding.dims();
    let values = embedding.into_data().to_vec::<f32>()?;
    Array2::from_shape_vec((n, d), values).map_err(|e| HgclError::Tensor(e.to_string()))
}

/// Solver settings of the probe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearProbe {
    /// Inverse L2 strength `C`.
    pub c: f64,
    /// Converged once `max|grad| / n_rows <= tol`, with the gradient of
    /// `sum CE + 0.5 / C * ||W||^2`.
    pub tol: f64,
}

impl Default for LinearProbe {
    fn default() -> Self {
        Self { c: 1.0, tol: 1e-4 }
    }
}

/// A fitted classifier.
#[derive(Clone, Debug)]
pub struct ProbeFit {
    /// \[D, K\]
    pub weights: Array2<f64>,
    /// \[K\]. Classes absent from the training rows get `-inf` and are
    /// never predicted.
    pub intercept: Array1<f64>,
    /// `0.5 * ||W||^2 + C * sum CE` at the returned parameters.
    pub objective: f64,
    /// Row-averaged `max|grad|` at the returned parameters.
    pub grad_max: f64,
    pub converged: bool,
}

impl ProbeFit {
    fn scores(&self, row: ArrayView1<'_, f32>) -> Array1<f64> {
        let x = row.mapv(f64::from);
        x.dot(&self.weights) + &self.intercept
    }

    /// Most probable class; ties go to the lower class index.
    pub fn predict_row(&self, row: ArrayView1<'_, f32>) -> usize {
        let scores = self.scores(row);
        let mut best = 0;
        for (k, &s) in scores.iter().enumerate() {
            if s > scores[best] {
                best = k;
            }
        }
        best
    }

    /// Fraction of `rows` whose prediction matches `labels`.
    pub fn accuracy(
        &self,
        embedding: ArrayView2<'_, f32>,
        labels: &[usize],
        rows: &[usize],
    ) -> Result<f64> {
        if rows.is_empty() {
            return Err(HgclError::data("cannot score an empty evaluation mask"));
        }
        let correct = rows
            .iter()
            .filter(|&&i| self.predict_row(embedding.row(i)) == labels[i])
            .count();
        Ok(correct as f64 / rows.len() as f64)
    }
}

/// Summed cross-entropy of `softmax(x w + b)` against `y` and its gradient
/// with respect to `(w, b)`.
fn cross_entropy(
    x: &Array2<f64>,
    y: &[usize],
    w: &Array2<f64>,
    b: &Array1<f64>,
) -> (f64, Array2<f64>, Array1<f64>) {
    let mut residual = x.dot(w) + b;
    let mut value = 0.0;
    for (mut logits, &label) in residual.axis_iter_mut(Axis(0)).zip(y) {
        let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let label_logit = logits[label];
        logits.mapv_inplace(|z| (z - max).exp());
        let total = logits.sum();
        value += total.ln() + max - label_logit;
        logits.mapv_inplace(|p| p / total);
        logits[label] -= 1.0;
    }
    let grad_w = x.t().dot(&residual);
    let grad_b = residual.sum_axis(Axis(0));
    (value, grad_w, grad_b)
}

fn design_matrix(x: &Array2<f64>) -> DenseMatrix<f64> {
    let mut dm = DenseMatrix::<f64>::zeros(x.nrows(), x.ncols());
    for ((i, j), &v) in x.indexed_iter() {
        dm.set((i, j), v);
    }
    dm
}

impl LinearProbe {
    pub fn new(c: f64, tol: f64) -> Self {
        Self { c, tol }
    }

    pub fn from_config(config: &HgclConfig) -> Self {
        Self::new(config.probe_c, config.probe_tol)
    }

    /// Fit on the given rows of `embedding`.
    pub fn fit(
        &self,
        embedding: ArrayView2<'_, f32>,
        labels: &[usize],
        rows: &[usize],
        n_classes: usize,
    ) -> Result<ProbeFit> {
        if rows.is_empty() {
            return Err(HgclError::data("linear probe needs at least one training row"));
        }
        if n_classes == 0 {
            return Err(HgclError::data("linear probe needs at least one class"));
        }
        if let Some(&bad) = rows.iter().find(|&&i| labels[i] >= n_classes) {
            return Err(HgclError::data(format!(
                "label {} of node {} is outside {} classes",
                labels[bad], bad, n_classes
            )));
        }

        let d = embedding.ncols();
        let x = embedding.select(Axis(0), rows).mapv(f64::from);
        let mut present: Vec<usize> = rows.iter().map(|&i| labels[i]).collect();
        present.sort_unstable();
        present.dedup();
        let local: Vec<usize> = rows
            .iter()
            .filter_map(|&i| present.binary_search(&labels[i]).ok())
            .collect();
        let m = present.len();

        let mut w = Array2::<f64>::zeros((d, m));
        let mut b = Array1::<f64>::zeros(m);
        // Column 0 stays pinned at zero in the two-class parameterization.
        let mut pinned = 0;
        if m > 1 {
            let alpha = 1.0 / self.c;
            let y: Vec<i32> = local.iter().map(|&c| c as i32).collect();
            let params = LogisticRegressionParameters::<f64>::default().with_alpha(alpha);
            let model = LogisticRegression::<f64, i32, DenseMatrix<f64>, Vec<i32>>::fit(
                &design_matrix(&x),
                &y,
                params,
            )
            .map_err(|e| HgclError::Probe(e.to_string()))?;

            let coef = model.coefficients();
            let bias = model.intercept();
            let (fitted, _) = coef.shape();
            pinned = match m.checked_sub(fitted) {
                Some(p @ (0 | 1)) => p,
                _ => {
                    return Err(HgclError::Probe(format!(
                        "solver returned {fitted} coefficient rows for {m} classes"
                    )))
                }
            };
            for r in 0..fitted {
                for j in 0..d {
                    w[[j, pinned + r]] = *coef.get((r, j));
                }
                b[pinned + r] = *bias.get((r, 0));
            }
        }

        let (ce, mut grad_w, grad_b) = cross_entropy(&x, &local, &w, &b);
        grad_w.scaled_add(1.0 / self.c, &w);
        let grad_max = grad_w
            .slice(s![.., pinned..])
            .iter()
            .chain(grad_b.slice(s![pinned..]).iter())
            .fold(0.0f64, |acc, g| acc.max(g.abs()))
            / rows.len() as f64;
        let objective = 0.5 * w.iter().map(|v| v * v).sum::<f64>() + self.c * ce;

        let converged = grad_max <= self.tol;
        if converged {
            debug!(
                "linear probe fitted {} classes on {} rows (objective {:.4})",
                m,
                rows.len(),
                objective
            );
        } else {
            warn!(
                "linear probe did not converge: max|grad| = {:.3e} exceeds tol {:.1e}",
                grad_max, self.tol
            );
        }

        let mut weights = Array2::<f64>::zeros((d, n_classes));
        let mut intercept = Array1::from_elem(n_classes, f64::NEG_INFINITY);
        for (c, &class) in present.iter().enumerate() {
            weights.column_mut(class).assign(&w.column(c));
            intercept[class] = b[c];
        }
        Ok(ProbeFit {
            weights,
            intercept,
            objective,
            grad_max,
            converged,
        })
    }

    /// Fit on the training split of `data`.
    pub fn fit_train(&self, embedding: &Array2<f32>, data: &GraphData) -> Result<ProbeFit> {
        check_rows(embedding, data)?;
        self.fit(
            embedding.view(),
            &data.labels,
            &data.indices(Split::Train),
            data.n_classes(),
        )
    }
}

fn check_rows(embedding: &Array2<f32>, data: &GraphData) -> Result<()> {
    if embedding.nrows() != data.n_nodes() {
        return Err(HgclError::data(format!(
            "embedding has {} rows for {} nodes",
            embedding.nrows(),
            data.n_nodes()
        )));
    }
    Ok(())
}

impl EmbeddingEvaluator for LinearProbe {
    fn accuracy(&self, embedding: &Array2<f32>, data: &GraphData, split: Split) -> Result<f64> {
        let rows = data.indices(split);
        if rows.is_empty() {
            return Err(HgclError::data(format!("{split:?} mask selects no nodes")));
        }
        let fit = self.fit_train(embedding, data)?;
        fit.accuracy(embedding.view(), &data.labels, &rows)
    }
}
