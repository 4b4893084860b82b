use burn::module::Module;
use burn::nn::{LayerNorm, LayerNormConfig};
use burn::tensor::activation::relu;
use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};
use rand::Rng;

use crate::layers::{GraphConv, SeededLinear};

/// Predicts the clean embedding from a noised one.
///
/// The timestep `t / T` is lifted to a \[1, C\] embedding by a two-layer MLP
/// and broadcast-added to every node before two graph convolutions:
///
/// ```text
/// h = h_noisy + time_mlp(t)
/// out = conv2(relu(ln(conv1(h, A))), A)
/// ```
#[derive(Module, Debug)]
pub struct DiffusionDenoiser<B: Backend> {
    pub time_in: SeededLinear<B>,
    pub time_out: SeededLinear<B>,
    pub conv1: GraphConv<B>,
    pub conv2: GraphConv<B>,
    pub ln: LayerNorm<B>,
}

impl<B: Backend> DiffusionDenoiser<B> {
    pub fn new<R: Rng>(channels: usize, rng: &mut R, device: &B::Device) -> Self {
        Self {
            time_in: SeededLinear::new(1, channels, rng, device),
            time_out: SeededLinear::new(channels, channels, rng, device),
            conv1: GraphConv::new(channels, channels, rng, device),
            conv2: GraphConv::new(channels, channels, rng, device),
            ln: LayerNormConfig::new(channels).init(device),
        }
    }

    /// Timestep embedding \[1, C\].
    pub fn embed_timestep(&self, t_normalized: f32, device: &B::Device) -> Tensor<B, 2> {
        let t = Tensor::<B, 2>::from_data(TensorData::new(vec![t_normalized], [1, 1]), device);
        self.time_out.forward(relu(self.time_in.forward(t)))
    }

    /// # Arguments
    /// * `h_noisy` - Noised embedding \[N, C\]
    /// * `graph_op` - Normalized adjacency of the augmented graph \[N, N\]
    /// * `t_normalized` - Timestep divided by the step count, in `[0, 1)`
    pub fn forward(
        &self,
        h_noisy: Tensor<B, 2>,
        graph_op: Tensor<B, 2>,
        t_normalized: f32,
    ) -> Tensor<B, 2> {
        let t_emb = self.embed_timestep(t_normalized, &h_noisy.device());
        let h = h_noisy + t_emb;
        let h = relu(self.ln.forward(self.conv1.forward(h, graph_op.clone())));
        self.conv2.forward(h, graph_op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hgcl_core::backend::{init_cpu_device, CpuBackend};
    use hgcl_samplers::RngKey;

    #[test]
    fn test_prediction_matches_input_shape() {
        let device = init_cpu_device();
        let denoiser = DiffusionDenoiser::<CpuBackend>::new(4, &mut RngKey::new(0).rng(), &device);
        let h = Tensor::<CpuBackend, 2>::ones([6, 4], &device);
        let op = Tensor::<CpuBackend, 2>::ones([6, 6], &device).div_scalar(6.0);
        assert_eq!(denoiser.forward(h, op, 0.5).dims(), [6, 4]);
    }

    #[test]
    fn test_timestep_embedding_depends_on_t() {
        let device = init_cpu_device();
        let denoiser = DiffusionDenoiser::<CpuBackend>::new(16, &mut RngKey::new(4).rng(), &device);
        let early = denoiser.embed_timestep(0.0, &device);
        let late = denoiser.embed_timestep(0.95, &device);
        assert_eq!(early.dims(), [1, 16]);
        assert_ne!(
            early.into_data().to_vec::<f32>().unwrap(),
            late.into_data().to_vec::<f32>().unwrap()
        );
    }
}
