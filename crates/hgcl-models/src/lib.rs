//! # hgcl-models
//!
//! Learned components of HGCL and the objective that trains them.
//!
//! - [`SeededLinear`], [`GraphConv`], [`HypergraphConv`]: seed-initialized primitives
//! - [`DualViewEncoder`]: two message-passing layers per view plus a projection head
//! - [`DiffusionDenoiser`]: timestep-conditioned graph denoiser
//! - [`contrastive_loss`], [`diffusion_loss`], [`combined_loss`]
//! - [`HgclModel`] and [`HgclObjective`]: parameters and the stochastic forward pass
//!
//! ```rust,ignore
//! use hgcl_models::{GraphInputs, HgclModelConfig, HgclObjective};
//!
//! let inputs = GraphInputs::<TrainBackend>::new(&data, &incidence, &device);
//! let model = HgclModelConfig::from_config(&config, data.n_features()).init(&mut rng, &device);
//! let objective = HgclObjective::from_config(&config)?;
//! let out = objective.forward(&model, &inputs, &mut rng);
//! let grads = out.loss.backward();
//! ```

pub mod denoiser;
pub mod encoder;
pub mod layers;
pub mod loss;
pub mod model;

pub use denoiser::*;
pub use encoder::*;
pub use layers::*;
pub use loss::*;
pub use model::*;
