//! Model configuration
//!
//! Every tunable of a run lives here so a run report can record exactly
//! what produced it. Missing JSON fields take their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::posterior::DEFAULT_CREDIBLE_LEVEL;
use crate::{Error, Result};

/// Default innings threshold for the prior population (strict >).
pub const DEFAULT_MIN_PRIOR_INNINGS: f64 = 20.0;

/// Default career innings threshold for evaluation (strict >).
pub const DEFAULT_MIN_CAREER_INNINGS: f64 = 5.0;

/// Default first season considered (inclusive).
pub const DEFAULT_START_YEAR: i32 = 1945;

/// Configuration for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Prior population: first-year innings must exceed this
    pub min_prior_innings: f64,
    /// Evaluation population: career innings must exceed this
    pub min_career_innings: f64,
    /// Seasons before this year are dropped before debut years are derived
    pub start_year: i32,
    /// Central credible mass of the reported interval
    pub credible_level: f64,
    /// Size of the illustrative posterior sample
    pub sample_size: usize,
    /// Seed of the illustrative posterior sample
    pub sample_seed: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            min_prior_innings: DEFAULT_MIN_PRIOR_INNINGS,
            min_career_innings: DEFAULT_MIN_CAREER_INNINGS,
            start_year: DEFAULT_START_YEAR,
            credible_level: DEFAULT_CREDIBLE_LEVEL,
            sample_size: 20,
            sample_seed: 123,
        }
    }
}

impl ModelConfig {
    /// Start from the defaults.
    #[must_use]
    pub fn builder() -> ModelConfigBuilder {
        ModelConfigBuilder::default()
    }

    /// Parse and validate a JSON document.
    ///
    /// # Errors
    /// `Json` on malformed input, `InvalidInput` on out-of-range values.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    ///
    /// # Errors
    /// `Io` if the file cannot be read, otherwise see [`Self::from_json_str`].
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check value ranges.
    ///
    /// # Errors
    /// `InvalidInput` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if !(self.min_prior_innings >= 0.0 && self.min_prior_innings.is_finite()) {
            return Err(Error::InvalidInput(format!(
                "min_prior_innings must be finite and >= 0, got {}",
                self.min_prior_innings
            )));
        }
        if !(self.min_career_innings >= 0.0 && self.min_career_innings.is_finite()) {
            return Err(Error::InvalidInput(format!(
                "min_career_innings must be finite and >= 0, got {}",
                self.min_career_innings
            )));
        }
        if !(self.credible_level > 0.0 && self.credible_level < 1.0) {
            return Err(Error::InvalidInput(format!(
                "credible_level must be in (0, 1), got {}",
                self.credible_level
            )));
        }
        if self.sample_size == 0 {
            return Err(Error::InvalidInput(
                "sample_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Consuming builder for [`ModelConfig`].
#[derive(Debug, Default)]
pub struct ModelConfigBuilder {
    config: ModelConfig,
}

impl ModelConfigBuilder {
    /// Prior innings threshold.
    #[must_use]
    pub fn min_prior_innings(mut self, innings: f64) -> Self {
        self.config.min_prior_innings = innings;
        self
    }

    /// Career innings threshold.
    #[must_use]
    pub fn min_career_innings(mut self, innings: f64) -> Self {
        self.config.min_career_innings = innings;
        self
    }

    /// First season considered.
    #[must_use]
    pub fn start_year(mut self, year: i32) -> Self {
        self.config.start_year = year;
        self
    }

    /// Credible interval mass.
    #[must_use]
    pub fn credible_level(mut self, level: f64) -> Self {
        self.config.credible_level = level;
        self
    }

    /// Illustrative sample size and seed.
    #[must_use]
    pub fn sample(mut self, size: usize, seed: u64) -> Self {
        self.config.sample_size = size;
        self.config.sample_seed = seed;
        self
    }

    /// Validate and build.
    ///
    /// # Errors
    /// See [`ModelConfig::validate`].
    pub fn build(self) -> Result<ModelConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
