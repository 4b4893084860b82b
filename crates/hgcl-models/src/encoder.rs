//! Dual-view graph encoder.
//!
//! ```text
//! h1 = relu(ln1(gcn2(relu(ln1(gcn1(x, A))), A)))
//! h2 = relu(ln2(hgc2(relu(ln2(hgc1(x, H))), H)))       (hypergraph view only)
//! h  = (h1 + h2) / 2  or  h1
//! z  = proj2(relu(proj1(h)))
//! ```
//!
//! One layer norm is shared by both graph layers and one by both hypergraph
//! layers. The same type is instantiated twice with independent weights: the
//! graph view is called without a hypergraph operator, the hypergraph view
//! with one.

use burn::module::Module;
use burn::nn::{LayerNorm, LayerNormConfig};
use burn::tensor::activation::relu;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use rand::Rng;

use crate::layers::{GraphConv, HypergraphConv, SeededLinear};

#[derive(Module, Debug)]
pub struct DualViewEncoder<B: Backend> {
    pub gcn1: GraphConv<B>,
    pub gcn2: GraphConv<B>,
    pub hgc1: HypergraphConv<B>,
    pub hgc2: HypergraphConv<B>,
    pub ln1: LayerNorm<B>,
    pub ln2: LayerNorm<B>,
    pub proj1: SeededLinear<B>,
    pub proj2: SeededLinear<B>,
}

impl<B: Backend> DualViewEncoder<B> {
    pub fn new<R: Rng>(
        in_channels: usize,
        hidden_channels: usize,
        out_channels: usize,
        rng: &mut R,
        device: &B::Device,
    ) -> Self {
        Self {
            gcn1: GraphConv::new(in_channels, hidden_channels, rng, device),
            gcn2: GraphConv::new(hidden_channels, hidden_channels, rng, device),
            hgc1: HypergraphConv::new(in_channels, hidden_channels, rng, device),
            hgc2: HypergraphConv::new(hidden_channels, hidden_channels, rng, device),
            ln1: LayerNormConfig::new(hidden_channels).init(device),
            ln2: LayerNormConfig::new(hidden_channels).init(device),
            proj1: SeededLinear::new(hidden_channels, out_channels, rng, device),
            proj2: SeededLinear::new(out_channels, out_channels, rng, device),
        }
    }

    /// Encode nodes into \[N, out_channels\] embeddings.
    ///
    /// # Arguments
    /// * `x` - Node features \[N, F\]
    /// * `graph_op` - Normalized adjacency \[N, N\]
    /// * `hyper_op` - Hypergraph operator \[N, N\], enabling the hypergraph path
    pub fn forward(
        &self,
        x: Tensor<B, 2>,
        graph_op: Tensor<B, 2>,
        hyper_op: Option<Tensor<B, 2>>,
    ) -> Tensor<B, 2> {
        let h1 = relu(self.ln1.forward(self.gcn1.forward(x.clone(), graph_op.clone())));
        let h1 = relu(self.ln1.forward(self.gcn2.forward(h1, graph_op)));

        let h = match hyper_op {
            Some(op) => {
                let h2 = relu(self.ln2.forward(self.hgc1.forward(x, op.clone())));
                let h2 = relu(self.ln2.forward(self.hgc2.forward(h2, op)));
                (h1 + h2).div_scalar(2.0)
            }
            None => h1,
        };

        self.proj2.forward(relu(self.proj1.forward(h)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hgcl_core::backend::{init_cpu_device, CpuBackend};
    use hgcl_samplers::RngKey;

    #[test]
    fn test_both_paths_share_output_width() {
        let device = init_cpu_device();
        let encoder =
            DualViewEncoder::<CpuBackend>::new(6, 8, 4, &mut RngKey::new(0).rng(), &device);
        let x = Tensor::<CpuBackend, 2>::ones([5, 6], &device);
        let op = Tensor::<CpuBackend, 2>::ones([5, 5], &device).div_scalar(5.0);

        let graph_only = encoder.forward(x.clone(), op.clone(), None);
        let with_hyper = encoder.forward(x, op.clone(), Some(op));
        assert_eq!(graph_only.dims(), [5, 4]);
        assert_eq!(with_hyper.dims(), [5, 4]);
    }

    #[test]
    fn test_hypergraph_path_changes_output() {
        let device = init_cpu_device();
        let encoder =
            DualViewEncoder::<CpuBackend>::new(3, 8, 4, &mut RngKey::new(2).rng(), &device);
        let x = Tensor::<CpuBackend, 2>::from_data(
            burn::tensor::TensorData::new(
                vec![1.0f32, 0.0, 0.5, 0.0, 1.0, 0.2, 0.3, 0.3, 1.0],
                [3, 3],
            ),
            &device,
        );
        let eye = Tensor::<CpuBackend, 2>::from_data(
            burn::tensor::TensorData::new(
                vec![1.0f32, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
                [3, 3],
            ),
            &device,
        );
        let mean = Tensor::<CpuBackend, 2>::ones([3, 3], &device).div_scalar(3.0);

        let a = encoder.forward(x.clone(), eye.clone(), None);
        let b = encoder.forward(x, eye, Some(mean));
        let a = a.into_data().to_vec::<f32>().unwrap();
        let b = b.into_data().to_vec::<f32>().unwrap();
        assert_ne!(a, b);
    }
}
