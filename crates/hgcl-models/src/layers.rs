//! Learned primitives with seed-driven initialization.
//!
//! Weights are drawn from the run's own generator instead of the backend RNG,
//! so two runs with the same seed start from bit-identical parameters on any
//! backend.

use burn::module::{Module, Param};
use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};
use rand::Rng;

fn uniform_tensor<B: Backend, R: Rng, const D: usize>(
    shape: [usize; D],
    bound: f32,
    rng: &mut R,
    device: &B::Device,
) -> Tensor<B, D> {
    let count: usize = shape.iter().product();
    let values: Vec<f32> = (0..count).map(|_| rng.gen_range(-bound..=bound)).collect();
    Tensor::from_data(TensorData::new(values, shape), device)
}

/// Dense affine layer `y = x W + b`, weight stored as \[d_in, d_out\].
///
/// Both weight and bias start from `U(-1/sqrt(d_in), 1/sqrt(d_in))`.
#[derive(Module, Debug)]
pub struct SeededLinear<B: Backend> {
    pub weight: Param<Tensor<B, 2>>,
    pub bias: Param<Tensor<B, 1>>,
}

impl<B: Backend> SeededLinear<B> {
    pub fn new<R: Rng>(d_in: usize, d_out: usize, rng: &mut R, device: &B::Device) -> Self {
        let bound = 1.0 / (d_in.max(1) as f32).sqrt();
        Self {
            weight: Param::from_tensor(uniform_tensor([d_in, d_out], bound, rng, device)),
            bias: Param::from_tensor(uniform_tensor([d_out], bound, rng, device)),
        }
    }

    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        input.matmul(self.weight.val()) + self.bias.val().unsqueeze()
    }

    pub fn d_out(&self) -> usize {
        self.weight.val().dims()[1]
    }
}

/// Message-passing convolution over a fixed dense operator:
///
/// ```text
/// out = P @ (X W) + b
/// ```
///
/// `W` is Glorot-uniform, `b` starts at zero. The operator decides the
/// flavour: the normalized adjacency gives a graph convolution, the
/// incidence-derived operator gives a hypergraph convolution.
#[derive(Module, Debug)]
pub struct PropagationConv<B: Backend> {
    pub weight: Param<Tensor<B, 2>>,
    pub bias: Param<Tensor<B, 1>>,
}

/// Convolution over `D^-1/2 (A + I) D^-1/2`.
pub type GraphConv<B> = PropagationConv<B>;

/// Convolution over `D^-1 H B^-1 H^T`.
pub type HypergraphConv<B> = PropagationConv<B>;

impl<B: Backend> PropagationConv<B> {
    pub fn new<R: Rng>(d_in: usize, d_out: usize, rng: &mut R, device: &B::Device) -> Self {
        let bound = (6.0 / (d_in + d_out).max(1) as f32).sqrt();
        Self {
            weight: Param::from_tensor(uniform_tensor([d_in, d_out], bound, rng, device)),
            bias: Param::from_tensor(Tensor::zeros([d_out], device)),
        }
    }

    /// # Arguments
    /// * `x` - Node features \[N, d_in\]
    /// * `operator` - Propagation operator \[N, N\]
    pub fn forward(&self, x: Tensor<B, 2>, operator: Tensor<B, 2>) -> Tensor<B, 2> {
        operator.matmul(x.matmul(self.weight.val())) + self.bias.val().unsqueeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use hgcl_core::backend::{init_cpu_device, CpuBackend};
    use hgcl_samplers::RngKey;

    #[test]
    fn test_seeded_linear_is_reproducible() {
        let device = init_cpu_device();
        let a = SeededLinear::<CpuBackend>::new(4, 3, &mut RngKey::new(7).rng(), &device);
        let b = SeededLinear::<CpuBackend>::new(4, 3, &mut RngKey::new(7).rng(), &device);
        assert_eq!(
            a.weight.val().into_data().to_vec::<f32>().unwrap(),
            b.weight.val().into_data().to_vec::<f32>().unwrap()
        );
        assert_eq!(a.d_out(), 3);
    }

    #[test]
    fn test_linear_output_shape() {
        let device = init_cpu_device();
        let layer = SeededLinear::<CpuBackend>::new(5, 2, &mut RngKey::new(0).rng(), &device);
        let out = layer.forward(Tensor::ones([7, 5], &device));
        assert_eq!(out.dims(), [7, 2]);
    }

    #[test]
    fn test_identity_operator_reduces_to_linear_map() {
        let device = init_cpu_device();
        let conv = PropagationConv::<CpuBackend>::new(3, 2, &mut RngKey::new(1).rng(), &device);
        let x = Tensor::<CpuBackend, 2>::from_data(
            TensorData::new(vec![1.0f32, 2.0, 3.0, -1.0, 0.5, 0.0], [2, 3]),
            &device,
        );
        let eye = Tensor::<CpuBackend, 2>::from_data(
            TensorData::new(vec![1.0f32, 0.0, 0.0, 1.0], [2, 2]),
            &device,
        );
        let propagated = conv.forward(x.clone(), eye).into_data().to_vec::<f32>().unwrap();
        let direct = x.matmul(conv.weight.val()).into_data().to_vec::<f32>().unwrap();
        for (p, d) in propagated.iter().zip(&direct) {
            assert_relative_eq!(*p, *d, epsilon = 1e-6);
        }
    }
}
