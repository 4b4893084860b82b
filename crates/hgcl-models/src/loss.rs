//! Training objectives.
//!
//! ## Contrastive (InfoNCE, index-aligned)
//!
//! ```text
//! z1, z2 = normalize(z1), normalize(z2)
//! pos[i] = <z1[i], z2[i]> / tau
//! neg    = z1 z2^T / tau,   neg[i, i] = -9e15
//! L      = -mean_i(pos[i] - logsumexp_j neg[i, j])
//! ```
//!
//! ## Diffusion
//!
//! Mean squared error between the denoiser output and the clean embedding.
//!
//! ## Combined
//!
//! `gamma * contrastive + (1 - gamma) * diffusion`

use burn::nn::loss::{MseLoss, Reduction};
use burn::tensor::backend::Backend;
use burn::tensor::{Bool, Tensor, TensorData};

const NORMALIZE_EPS: f32 = 1e-12;
const MASKED_LOGIT: f32 = -9e15;

/// Scale rows to unit L2 norm, clamping tiny norms to `eps`.
pub fn l2_normalize<B: Backend>(z: Tensor<B, 2>) -> Tensor<B, 2> {
    let norm = z
        .clone()
        .powf_scalar(2.0)
        .sum_dim(1)
        .sqrt()
        .clamp_min(NORMALIZE_EPS);
    z / norm
}

/// Row-wise `log(sum(exp(x)))` with max subtraction, shape \[N, 1\].
pub fn logsumexp_rows<B: Backend>(x: Tensor<B, 2>) -> Tensor<B, 2> {
    let max = x.clone().max_dim(1).detach();
    (x - max.clone()).exp().sum_dim(1).log() + max
}

fn diagonal_mask<B: Backend>(n: usize, device: &B::Device) -> Tensor<B, 2, Bool> {
    let values: Vec<bool> = (0..n * n).map(|idx| idx / n == idx % n).collect();
    Tensor::from_data(TensorData::new(values, [n, n]), device)
}

/// Index-aligned InfoNCE between two views, returns a one-element tensor.
///
/// Row `i` of `z1` and row `i` of `z2` are the positive pair. Every row of
/// `z2`, the masked diagonal included, enters the denominator.
pub fn contrastive_loss<B: Backend>(
    z1: Tensor<B, 2>,
    z2: Tensor<B, 2>,
    temperature: f32,
) -> Tensor<B, 1> {
    let [n, _] = z1.dims();
    let device = z1.device();
    let z1 = l2_normalize(z1);
    let z2 = l2_normalize(z2);

    let positives = (z1.clone() * z2.clone()).sum_dim(1).div_scalar(temperature);
    let negatives = z1
        .matmul(z2.transpose())
        .div_scalar(temperature)
        .mask_fill(diagonal_mask::<B>(n, &device), MASKED_LOGIT);

    (positives - logsumexp_rows(negatives)).mean().neg()
}

/// Mean squared error between prediction and clean target.
pub fn diffusion_loss<B: Backend>(predicted: Tensor<B, 2>, clean: Tensor<B, 2>) -> Tensor<B, 1> {
    MseLoss::new().forward(predicted, clean, Reduction::Mean)
}

/// `gamma * contrastive + (1 - gamma) * diffusion`.
pub fn combined_loss<B: Backend>(
    contrastive: Tensor<B, 1>,
    diffusion: Tensor<B, 1>,
    gamma: f32,
) -> Tensor<B, 1> {
    contrastive.mul_scalar(gamma) + diffusion.mul_scalar(1.0 - gamma)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use hgcl_core::backend::{init_cpu_device, CpuBackend};

    fn matrix(values: Vec<f32>, shape: [usize; 2]) -> Tensor<CpuBackend, 2> {
        Tensor::from_data(TensorData::new(values, shape), &init_cpu_device())
    }

    fn scalar(t: Tensor<CpuBackend, 1>) -> f32 {
        t.into_data().to_vec::<f32>().unwrap()[0]
    }

    fn identity(n: usize) -> Tensor<CpuBackend, 2> {
        let values = (0..n * n).map(|i| if i / n == i % n { 1.0 } else { 0.0 }).collect();
        matrix(values, [n, n])
    }

    #[test]
    fn test_orthonormal_identical_views_beat_mixed_views() {
        let tau = 0.7f32;
        let loss = scalar(contrastive_loss(identity(4), identity(4), tau));
        // pos = 1/tau, off-diagonal logits are 0, masked diagonal vanishes
        let expected = -(1.0 / tau - 3.0f32.ln());
        assert_relative_eq!(loss, expected, epsilon = 1e-5);

        let mixed = matrix(
            vec![0.5, 0.5, 0.5, 0.5, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.2, 0.0, 0.3, 1.0],
            [4, 4],
        );
        let worse = scalar(contrastive_loss(identity(4), mixed, tau));
        assert!(worse > loss);
    }

    #[test]
    fn test_swapping_views_with_symmetric_similarity() {
        // z2 = z1 * diag(1, -1, 1) keeps z1 z2^T symmetric.
        let z1 = matrix(vec![1.0, 2.0, 0.5, -0.3, 0.7, 1.1, 0.9, -1.2, 0.4], [3, 3]);
        let z2 = z1.clone() * matrix(vec![1.0, -1.0, 1.0], [1, 3]);
        let ab = scalar(contrastive_loss(z1.clone(), z2.clone(), 0.5));
        let ba = scalar(contrastive_loss(z2, z1, 0.5));
        assert_relative_eq!(ab, ba, epsilon = 1e-5);
    }

    #[test]
    fn test_scale_invariance_from_normalization() {
        let z1 = matrix(vec![1.0, 2.0, -1.0, 0.5, 3.0, 1.0], [3, 2]);
        let z2 = matrix(vec![0.5, 1.0, 1.0, -1.0, 2.0, 2.0], [3, 2]);
        let base = scalar(contrastive_loss(z1.clone(), z2.clone(), 0.7));
        let scaled = scalar(contrastive_loss(z1.mul_scalar(10.0), z2, 0.7));
        assert_relative_eq!(base, scaled, epsilon = 1e-5);
    }

    #[test]
    fn test_diffusion_loss_zero_on_exact_reconstruction() {
        let clean = matrix(vec![0.1, -0.2, 0.3, 0.4], [2, 2]);
        assert_relative_eq!(scalar(diffusion_loss(clean.clone(), clean.clone())), 0.0);
        let off = clean.clone().add_scalar(1.0);
        assert_relative_eq!(scalar(diffusion_loss(off, clean)), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_combined_loss_weights() {
        let device = init_cpu_device();
        let c = Tensor::<CpuBackend, 1>::from_data(TensorData::new(vec![2.0f32], [1]), &device);
        let d = Tensor::<CpuBackend, 1>::from_data(TensorData::new(vec![10.0f32], [1]), &device);
        assert_relative_eq!(scalar(combined_loss(c.clone(), d.clone(), 0.8)), 3.6, epsilon = 1e-5);
        assert_relative_eq!(scalar(combined_loss(c, d, 1.0)), 2.0);
    }

    #[test]
    fn test_logsumexp_is_stable_for_large_logits() {
        let x = matrix(vec![1000.0, 1000.0, -9e15, 0.0], [2, 2]);
        let lse = logsumexp_rows(x).into_data().to_vec::<f32>().unwrap();
        assert_relative_eq!(lse[0], 1000.0 + 2.0f32.ln(), epsilon = 1e-3);
        assert_relative_eq!(lse[1], 0.0, epsilon = 1e-6);
    }
}
