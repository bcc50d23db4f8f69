//! Error types for era-shrinkage
//!
//! Failure classes:
//! - **Data**: malformed input rejected at ingestion (`InvalidInput`)
//! - **Estimation**: the prior cannot be fitted; fatal to the run
//! - **Undefined rate**: a single record with zero innings, excluded locally
//!
//! A player missing from one side of the evaluation join is not an error.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// era-shrinkage error types
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or missing input field (null, negative count, bad schema, bad config)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Prior population is empty or too small to estimate a variance
    #[error(
        "Prior estimation failed: {available} player(s) above {min_innings} first-year innings, \
         at least 2 required\nLower min_prior_innings or supply more seasons"
    )]
    EmptyPriorPopulation {
        /// Innings threshold used for the prior population
        min_innings: f64,
        /// Number of players that passed the threshold
        available: usize,
    },

    /// Sample variance of the prior population is zero or negative
    #[error("Prior estimation failed: degenerate variance {variance} (all rates identical?)")]
    DegenerateVariance {
        /// Computed sample variance
        variance: f64,
    },

    /// Moment-matching quadratic has no positive root
    #[error("Prior estimation failed: no positive rate root for mean {mean}, variance {variance}")]
    NoPositiveRoot {
        /// Sample mean of per-inning rates
        mean: f64,
        /// Sample variance of per-inning rates
        variance: f64,
    },

    /// Distribution parameter outside its domain
    #[error("Invalid hyperparameter {param} = {value}: must be {constraint}")]
    InvalidHyperparameter {
        /// Parameter name
        param: String,
        /// Offending value
        value: String,
        /// Constraint that was violated
        constraint: String,
    },

    /// A rate was requested for a record with zero innings pitched
    #[error("Rate undefined for player {player_id}: zero innings pitched")]
    UndefinedRate {
        /// Player identifier
        player_id: String,
    },

    /// No player survived the evaluation join
    #[error("Evaluation population empty: no player with career innings above {min_innings}")]
    EmptyEvaluation {
        /// Career innings threshold used for evaluation
        min_innings: f64,
    },

    /// Storage error (Parquet/Arrow)
    #[error("Storage error: {0}")]
    StorageError(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Parquet error
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// JSON (de)serialisation error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// True for failures of the prior fit (the run cannot continue).
    #[must_use]
    pub const fn is_estimation_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyPriorPopulation { .. }
                | Self::DegenerateVariance { .. }
                | Self::NoPositiveRoot { .. }
        )
    }

    /// True for input rejected at ingestion.
    #[must_use]
    pub const fn is_data_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}
