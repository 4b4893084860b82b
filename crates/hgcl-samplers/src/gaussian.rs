//! Forward diffusion noising.
//!
//! ```text
//! x_t = sqrt(alpha_cum[t]) * x_0 + sqrt(1 - alpha_cum[t]) * eps,   eps ~ N(0, I)
//! ```
//!
//! The Gaussian draw comes from the run's own generator through
//! `rand_distr::StandardNormal`, so noising is reproducible from the seed and
//! independent of the backend's internal RNG.

use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};
use rand::Rng;
use rand_distr::StandardNormal;

use crate::schedule::DiffusionSchedule;

/// One noised sample together with the timestep that produced it.
#[derive(Clone, Debug)]
pub struct NoisedEmbedding<B: Backend> {
    pub noisy: Tensor<B, 2>,
    pub timestep: usize,
    /// `t / T`, the denoiser's conditioning scalar.
    pub t_normalized: f32,
}

/// Draw a standard normal tensor of the given shape.
pub fn standard_normal<B: Backend, R: Rng>(
    shape: [usize; 2],
    rng: &mut R,
    device: &B::Device,
) -> Tensor<B, 2> {
    let values: Vec<f32> = (0..shape[0] * shape[1])
        .map(|_| rng.sample(StandardNormal))
        .collect();
    Tensor::from_data(TensorData::new(values, shape), device)
}

/// Noise `clean` at an explicit timestep.
pub fn add_noise_at<B: Backend, R: Rng>(
    schedule: &DiffusionSchedule,
    clean: Tensor<B, 2>,
    t: usize,
    rng: &mut R,
) -> Tensor<B, 2> {
    let (signal, noise_scale) = schedule.coefficients(t);
    let eps = standard_normal::<B, R>(clean.dims(), rng, &clean.device());
    clean.mul_scalar(signal) + eps.mul_scalar(noise_scale)
}

/// Draw `t ~ U{0..T}` and noise `clean` at that step.
pub fn add_noise<B: Backend, R: Rng>(
    schedule: &DiffusionSchedule,
    clean: Tensor<B, 2>,
    rng: &mut R,
) -> NoisedEmbedding<B> {
    let timestep = schedule.sample_timestep(rng);
    let noisy = add_noise_at(schedule, clean, timestep, rng);
    NoisedEmbedding {
        noisy,
        timestep,
        t_normalized: schedule.normalized(timestep),
    }
}
