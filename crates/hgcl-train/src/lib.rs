//! # hgcl-train
//!
//! Training and evaluation for HGCL.
//!
//! - [`Trainer`]: the epoch loop, AdamW updates and best-embedding tracking
//! - [`EarlyStopping`] and [`TrainingState`]: the explicit stopping state machine
//! - [`PlateauScheduler`]: reduce-on-plateau learning rate
//! - [`LinearProbe`]: multinomial logistic regression scored on frozen embeddings
//! - [`TrainingObserver`]: progress hooks, with [`ConsoleObserver`] and [`HistoryObserver`]
//!
//! ```rust,ignore
//! use hgcl_train::{ConsoleObserver, Trainer};
//!
//! let trainer = Trainer::new(HgclConfig::default())?;
//! let report = trainer.fit(&data, &mut [&mut ConsoleObserver])?;
//! println!("{}", report);
//! ```

pub mod early_stopping;
pub mod evaluation;
pub mod observer;
pub mod scheduler;
pub mod training;

pub use early_stopping::*;
pub use evaluation::*;
pub use observer::*;
pub use scheduler::*;
pub use training::*;
