//! # era-shrinkage: Empirical-Bayes shrinkage of first-year ERA
//!
//! **Version**: 0.1.0
//!
//! Raw first-year earned run averages are noisy for pitchers with few innings.
//! This crate fits a Gamma prior to the first-year per-inning rates of
//! established pitchers, updates it per player with the conjugate
//! Gamma-Poisson rule, and checks whether the shrunk estimate predicts the
//! rest of the career better than the raw one.
//!
//! ## Pipeline
//!
//! ```text
//! season rows ──> aggregate ──> first-year summaries ──> fit_prior ──> GammaPrior
//!                     │                    │                               │
//!                     │                    └──────────> posterior <────────┘
//!                     ▼                                     │
//!            career summaries ──────────> evaluate <────────┘ ──> RMSE naive vs bayes
//! ```
//!
//! ## Design Principles
//!
//! - **Per-inning units**: the Gamma lives on ER/IP; ×9 only when reporting ERA
//! - **Order independence**: every collection is sorted by player id before a barrier
//! - **Fail loudly**: a prior that cannot be fitted halts the run
//!
//! ## Example Usage
//!
//! ```rust
//! use era_shrinkage::{Pipeline, PlayerSeasonRecord};
//!
//! let rows = vec![
//!     PlayerSeasonRecord::new("a", 1960, 10, 90),
//!     PlayerSeasonRecord::new("a", 1961, 40, 600),
//!     PlayerSeasonRecord::new("b", 1960, 25, 120),
//!     PlayerSeasonRecord::new("b", 1961, 60, 450),
//!     PlayerSeasonRecord::new("c", 1960, 2, 3),
//!     PlayerSeasonRecord::new("c", 1961, 50, 420),
//! ];
//!
//! let output = Pipeline::default().run(&rows)?;
//! println!("prior mean ERA {:.2}", output.prior.mean_era());
//! println!(
//!     "RMSE naive {:.3} vs bayes {:.3}",
//!     output.evaluation.rmse_naive(),
//!     output.evaluation.rmse_bayes()
//! );
//! # Ok::<(), era_shrinkage::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod aggregate;
pub mod config;
pub mod distribution;
pub mod error;
pub mod evaluation;
pub mod pipeline;
pub mod posterior;
pub mod prior;
pub mod record;
pub mod report;
pub mod sample;
pub mod storage;
pub mod table;
pub mod topk;

pub use config::ModelConfig;
pub use distribution::Gamma;
pub use error::{Error, Result};
pub use evaluation::{Evaluation, EvaluationRecord};
pub use pipeline::{Pipeline, PipelineBuilder, PipelineOutput};
pub use posterior::{PlayerPosterior, PosteriorEngine, PosteriorInterval};
pub use prior::GammaPrior;
pub use record::{Period, PlayerIdentity, PlayerPeriodSummary, PlayerSeasonRecord, Roster};
pub use report::{RunReport, RunStatus};
pub use storage::StorageEngine;
pub use topk::SortOrder;
