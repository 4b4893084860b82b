use hgcl_core::error::{HgclError, Result};
use rand::Rng;

/// Linear-beta forward diffusion schedule.
///
/// ```text
/// beta[t]      = linspace(beta_start, beta_end, T)[t]
/// alpha_cum[t] = prod_{s <= t} (1 - beta[s])
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DiffusionSchedule {
    betas: Vec<f64>,
    alpha_cum: Vec<f64>,
}

impl DiffusionSchedule {
    /// Build a schedule with `steps` timesteps.
    ///
    /// Requires `steps >= 1` and `0 < beta_start <= beta_end < 1`.
    pub fn linear(steps: usize, beta_start: f64, beta_end: f64) -> Result<Self> {
        if steps == 0 {
            return Err(HgclError::config("diffusion schedule needs at least one step"));
        }
        if !(beta_start > 0.0 && beta_start <= beta_end && beta_end < 1.0) {
            return Err(HgclError::config(format!(
                "diffusion betas must satisfy 0 < start <= end < 1, got {beta_start}..{beta_end}"
            )));
        }

        let betas: Vec<f64> = if steps == 1 {
            vec![beta_start]
        } else {
            let step = (beta_end - beta_start) / (steps - 1) as f64;
            (0..steps).map(|i| beta_start + step * i as f64).collect()
        };

        let alpha_cum = betas
            .iter()
            .scan(1.0f64, |acc, beta| {
                *acc *= 1.0 - beta;
                Some(*acc)
            })
            .collect();

        Ok(Self { betas, alpha_cum })
    }

    /// Number of timesteps `T`.
    pub fn steps(&self) -> usize {
        self.betas.len()
    }

    pub fn beta(&self, t: usize) -> f64 {
        self.betas[t]
    }

    pub fn alpha_cumprod(&self, t: usize) -> f64 {
        self.alpha_cum[t]
    }

    /// Draw a timestep uniformly from `0..T`.
    pub fn sample_timestep<R: Rng>(&self, rng: &mut R) -> usize {
        rng.gen_range(0..self.steps())
    }

    /// Timestep conditioning value `t / T` fed to the denoiser.
    pub fn normalized(&self, t: usize) -> f32 {
        t as f32 / self.steps() as f32
    }

    /// Signal and noise coefficients `(sqrt(ac), sqrt(1 - ac))` at `t`.
    pub fn coefficients(&self, t: usize) -> (f32, f32) {
        let ac = self.alpha_cum[t];
        (ac.sqrt() as f32, (1.0 - ac).sqrt() as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::RngKey;
    use approx::assert_relative_eq;

    #[test]
    fn test_linear_schedule_endpoints() {
        let s = DiffusionSchedule::linear(100, 1e-4, 0.02).unwrap();
        assert_eq!(s.steps(), 100);
        assert_relative_eq!(s.beta(0), 1e-4);
        assert_relative_eq!(s.beta(99), 0.02, epsilon = 1e-12);
        assert_relative_eq!(s.alpha_cumprod(0), 1.0 - 1e-4);
    }

    #[test]
    fn test_alpha_cumprod_is_decreasing() {
        let s = DiffusionSchedule::linear(50, 1e-4, 0.02).unwrap();
        for t in 1..s.steps() {
            assert!(s.alpha_cumprod(t) < s.alpha_cumprod(t - 1));
        }
        let (signal, noise) = s.coefficients(49);
        assert_relative_eq!(signal * signal + noise * noise, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_timesteps_stay_in_range() {
        let s = DiffusionSchedule::linear(10, 1e-4, 0.02).unwrap();
        let mut rng = RngKey::new(5).rng();
        for _ in 0..200 {
            let t = s.sample_timestep(&mut rng);
            assert!(t < 10);
            assert!(s.normalized(t) < 1.0);
        }
    }

    #[test]
    fn test_invalid_schedules_rejected() {
        assert!(DiffusionSchedule::linear(0, 1e-4, 0.02).is_err());
        assert!(DiffusionSchedule::linear(10, 0.0, 0.02).is_err());
        assert!(DiffusionSchedule::linear(10, 0.05, 0.02).is_err());
        assert!(DiffusionSchedule::linear(10, 1e-4, 1.0).is_err());
        assert!(DiffusionSchedule::linear(1, 0.01, 0.01).is_ok());
    }
}
