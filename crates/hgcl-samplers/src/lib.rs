//! # hgcl-samplers
//!
//! Every stochastic step of an HGCL run, driven by one seeded generator:
//!
//! - **RNG key**: [`RngKey`] starts the run's single [`HgclRng`]
//! - **Augmentation**: feature masking and symmetric edge dropping via [`Augmentation`]
//! - **Diffusion schedule**: linear betas and cumulative alphas via [`DiffusionSchedule`]
//! - **Noising**: the forward diffusion step via [`add_noise`]
//!
//! ```rust
//! use hgcl_samplers::{Augmentation, DiffusionSchedule, RngKey};
//!
//! let mut rng = RngKey::new(42).rng();
//! let schedule = DiffusionSchedule::linear(20, 1e-4, 0.02).unwrap();
//! let t = schedule.sample_timestep(&mut rng);
//! assert!(t < 20);
//!
//! let aug = Augmentation::new(0.3, 0.2);
//! let edges = aug.drop_edges(&[(0, 1), (1, 0)], &mut rng);
//! assert!(edges.len() == 0 || edges.len() == 2);
//! ```

pub mod augment;
pub mod gaussian;
pub mod rng;
pub mod schedule;

pub use augment::*;
pub use gaussian::*;
pub use rng::*;
pub use schedule::*;
