//! The HGCL model and its stochastic training objective.
//!
//! [`HgclModel`] owns every learned parameter: two [`DualViewEncoder`]
//! instances and the [`DiffusionDenoiser`]. [`HgclObjective`] owns everything
//! that is fixed for the run (augmentation ratios, diffusion schedule,
//! temperature, loss weight) and runs one full forward pass:
//!
//! ```text
//! x', E'  = augment(x, E)                       shared by both views
//! h_x     = graph_view(x', A(E'))
//! h_y     = hyper_view(x', A(E'), H)
//! L_c     = contrastive(h_x, h_y)
//! h_t     = sqrt(ac[t]) h_x + sqrt(1 - ac[t]) eps
//! L_d     = mse(denoiser(h_t, A(E'), t / T), h_x)
//! L       = gamma L_c + (1 - gamma) L_d
//! ```
//!
//! The graph-view embedding `h_x` is returned detached as the node
//! representation.

use burn::module::Module;
use burn::tensor::backend::Backend;
use burn::tensor::{ElementConversion, Tensor, TensorData};
use rand::Rng;

use hgcl_core::{GraphData, HgclConfig, HyperedgeIncidence, PropagationMatrix, Result};
use hgcl_samplers::{add_noise, Augmentation, DiffusionSchedule};

use crate::denoiser::DiffusionDenoiser;
use crate::encoder::DualViewEncoder;
use crate::loss::{combined_loss, contrastive_loss, diffusion_loss};

/// Layer widths of an [`HgclModel`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HgclModelConfig {
    pub in_channels: usize,
    pub hidden_channels: usize,
    pub embedding_dim: usize,
}

impl HgclModelConfig {
    pub const fn new(in_channels: usize, hidden_channels: usize, embedding_dim: usize) -> Self {
        Self {
            in_channels,
            hidden_channels,
            embedding_dim,
        }
    }

    pub fn from_config(config: &HgclConfig, n_features: usize) -> Self {
        Self::new(n_features, config.hidden_channels, config.embedding_dim)
    }

    /// Initialize all parameters from the run's generator.
    ///
    /// Draw order is fixed: graph view, hypergraph view, denoiser.
    pub fn init<B: Backend, R: Rng>(&self, rng: &mut R, device: &B::Device) -> HgclModel<B> {
        let graph_view = DualViewEncoder::new(
            self.in_channels,
            self.hidden_channels,
            self.embedding_dim,
            rng,
            device,
        );
        let hyper_view = DualViewEncoder::new(
            self.in_channels,
            self.hidden_channels,
            self.embedding_dim,
            rng,
            device,
        );
        let denoiser = DiffusionDenoiser::new(self.embedding_dim, rng, device);
        let model = HgclModel {
            graph_view,
            hyper_view,
            denoiser,
        };
        log::debug!(
            "HGCL model {}->{}->{} with {} parameters",
            self.in_channels,
            self.hidden_channels,
            self.embedding_dim,
            model.num_params()
        );
        model
    }
}

#[derive(Module, Debug)]
pub struct HgclModel<B: Backend> {
    /// Encoder called without the hypergraph.
    pub graph_view: DualViewEncoder<B>,
    /// Encoder called with the hypergraph.
    pub hyper_view: DualViewEncoder<B>,
    pub denoiser: DiffusionDenoiser<B>,
}

/// Static inputs of one graph uploaded to a backend.
#[derive(Clone, Debug)]
pub struct GraphInputs<B: Backend> {
    /// Node features \[N, F\].
    pub features: Tensor<B, 2>,
    /// Un-augmented edge list.
    pub edges: Vec<(usize, usize)>,
    /// Normalized adjacency of the un-augmented graph \[N, N\].
    pub graph_op: Tensor<B, 2>,
    /// Hypergraph operator of the k-NN incidence \[N, N\].
    pub hyper_op: Tensor<B, 2>,
}

impl<B: Backend> GraphInputs<B> {
    pub fn new(data: &GraphData, incidence: &HyperedgeIncidence, device: &B::Device) -> Self {
        let n = data.n_nodes();
        let values: Vec<f32> = data.features.iter().copied().collect();
        let features = Tensor::from_data(TensorData::new(values, [n, data.n_features()]), device);
        Self {
            features,
            edges: data.edges.clone(),
            graph_op: PropagationMatrix::gcn(&data.edges, n).to_tensor(device),
            hyper_op: PropagationMatrix::hypergraph(incidence).to_tensor(device),
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.features.dims()[0]
    }
}

/// Result of one objective evaluation.
#[derive(Clone, Debug)]
pub struct ObjectiveOutput<B: Backend> {
    pub loss: Tensor<B, 1>,
    pub contrastive: Tensor<B, 1>,
    pub diffusion: Tensor<B, 1>,
    /// Detached graph-view embedding \[N, D\].
    pub embedding: Tensor<B, 2>,
    /// Diffusion timestep drawn for this pass.
    pub timestep: usize,
}

impl<B: Backend> ObjectiveOutput<B> {
    pub fn loss_value(&self) -> f32 {
        self.loss.clone().into_scalar().elem::<f32>()
    }

    pub fn contrastive_value(&self) -> f32 {
        self.contrastive.clone().into_scalar().elem::<f32>()
    }

    pub fn diffusion_value(&self) -> f32 {
        self.diffusion.clone().into_scalar().elem::<f32>()
    }
}

/// Non-learned part of the model: augmentation, noise schedule and loss weights.
#[derive(Clone, Debug, PartialEq)]
pub struct HgclObjective {
    pub augmentation: Augmentation,
    pub schedule: DiffusionSchedule,
    pub temperature: f32,
    pub gamma: f32,
}

impl HgclObjective {
    pub fn from_config(config: &HgclConfig) -> Result<Self> {
        Ok(Self {
            augmentation: Augmentation::new(config.mask_ratio, config.edge_drop_ratio),
            schedule: DiffusionSchedule::linear(
                config.diffusion_steps,
                config.beta_start,
                config.beta_end,
            )?,
            temperature: config.temperature,
            gamma: config.gamma,
        })
    }

    /// Builder: replace the augmentation ratios.
    pub fn with_augmentation(mut self, augmentation: Augmentation) -> Self {
        self.augmentation = augmentation;
        self
    }

    /// Builder: replace the contrastive weight.
    pub fn with_gamma(mut self, gamma: f32) -> Self {
        self.gamma = gamma;
        self
    }

    /// Run one forward pass with fresh augmentation and noise.
    pub fn forward<B: Backend, R: Rng>(
        &self,
        model: &HgclModel<B>,
        inputs: &GraphInputs<B>,
        rng: &mut R,
    ) -> ObjectiveOutput<B> {
        let device = inputs.features.device();
        let augmented = self.augmentation.apply(&inputs.features, &inputs.edges, rng);
        let graph_op = if self.augmentation.edge_drop_ratio > 0.0 {
            PropagationMatrix::gcn(&augmented.edges, inputs.n_nodes()).to_tensor(&device)
        } else {
            inputs.graph_op.clone()
        };

        let h_x = model
            .graph_view
            .forward(augmented.features.clone(), graph_op.clone(), None);
        let h_y = model.hyper_view.forward(
            augmented.features,
            graph_op.clone(),
            Some(inputs.hyper_op.clone()),
        );
        let contrastive = contrastive_loss(h_x.clone(), h_y, self.temperature);

        let noised = add_noise(&self.schedule, h_x.clone(), rng);
        let predicted = model
            .denoiser
            .forward(noised.noisy, graph_op, noised.t_normalized);
        let diffusion = diffusion_loss(predicted, h_x.clone());

        let loss = combined_loss(contrastive.clone(), diffusion.clone(), self.gamma);
        ObjectiveOutput {
            loss,
            contrastive,
            diffusion,
            embedding: h_x.detach(),
            timestep: noised.timestep,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hgcl_core::backend::{init_cpu_device, CpuBackend};
    use hgcl_core::build_knn_hypergraph;
    use hgcl_samplers::RngKey;
    use ndarray::Array2;

    fn tiny_graph() -> GraphData {
        let features = Array2::from_shape_fn((6, 4), |(i, j)| {
            ((i * 7 + j * 3) % 5) as f32 / 4.0 + if i < 3 { 1.0 } else { 0.0 }
        });
        let mut edges = Vec::new();
        for (a, b) in [(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3), (2, 3)] {
            edges.push((a, b));
            edges.push((b, a));
        }
        let (train, val, test) = GraphData::range_masks(6, 0..2, 2..4, 4..6);
        GraphData::new(features, edges, vec![0, 0, 0, 1, 1, 1], train, val, test).unwrap()
    }

    #[test]
    fn test_objective_reports_finite_loss_parts() {
        let device = init_cpu_device();
        let data = tiny_graph();
        let incidence = build_knn_hypergraph(&data.features, 2, 4).unwrap();
        let inputs = GraphInputs::<CpuBackend>::new(&data, &incidence, &device);

        let config = HgclConfig::dev().with_widths(8, 4);
        let mut rng = RngKey::new(config.seed).rng();
        let model =
            HgclModelConfig::from_config(&config, 4).init::<CpuBackend, _>(&mut rng, &device);
        let objective = HgclObjective::from_config(&config).unwrap();

        let out = objective.forward(&model, &inputs, &mut rng);
        assert_eq!(out.embedding.dims(), [6, 4]);
        assert!(out.loss_value().is_finite());
        let expected = 0.8 * out.contrastive_value() + 0.2 * out.diffusion_value();
        assert!((out.loss_value() - expected).abs() < 1e-4);
        assert!(out.timestep < config.diffusion_steps);
    }
}
