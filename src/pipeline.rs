//! End-to-end run: cutoff → aggregation → prior → posteriors → evaluation
//!
//! Two barriers order the stages: the prior needs every first-year summary,
//! and the RMSE needs every evaluation record. Within a stage players are
//! independent.

use serde::{Deserialize, Serialize};
use tracing::{info, info_span};

use crate::aggregate::{aggregate, seasons_from};
use crate::config::ModelConfig;
use crate::evaluation::Evaluation;
use crate::posterior::{PlayerPosterior, PosteriorEngine, PosteriorInterval};
use crate::prior::GammaPrior;
use crate::record::{Period, PlayerPeriodSummary, PlayerSeasonRecord};
use crate::sample::illustrative_sample;
use crate::storage::StorageEngine;
use crate::Result;

/// Everything a run produces, each collection sorted by player id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutput {
    /// Fitted prior
    pub prior: GammaPrior,
    /// Debut-season summaries
    pub first_year: Vec<PlayerPeriodSummary>,
    /// Post-debut summaries
    pub career: Vec<PlayerPeriodSummary>,
    /// One posterior per first-year summary
    pub posteriors: Vec<PlayerPosterior>,
    /// Naive vs. Bayes comparison
    pub evaluation: Evaluation,
}

impl PipelineOutput {
    /// Posterior for a player, if one was produced.
    #[must_use]
    pub fn posterior(&self, player_id: &str) -> Option<&PlayerPosterior> {
        self.posteriors
            .binary_search_by(|p| p.player_id.as_str().cmp(player_id))
            .ok()
            .map(|i| &self.posteriors[i])
    }

    /// Seeded subset of posterior intervals for display.
    #[must_use]
    pub fn sample_intervals(&self, size: usize, seed: u64) -> Vec<PosteriorInterval> {
        illustrative_sample(&self.posteriors, size, seed)
            .into_iter()
            .map(PlayerPosterior::interval)
            .collect()
    }
}

/// Configured pipeline.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: ModelConfig,
}

impl Pipeline {
    /// Builder starting from the default configuration.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Run over in-memory season rows.
    ///
    /// # Errors
    /// Estimation errors from the prior fit, `EmptyEvaluation`, or
    /// `InvalidHyperparameter` for a bad credible level.
    pub fn run(&self, records: &[PlayerSeasonRecord]) -> Result<PipelineOutput> {
        let config = &self.config;

        let (first_year, career) = {
            let _span = info_span!("aggregate", rows = records.len()).entered();
            let seasons = seasons_from(records, config.start_year);
            let first_year = aggregate(&seasons, Period::FirstYear);
            let career = aggregate(&seasons, Period::CareerRemainder);
            info!(
                start_year = config.start_year,
                kept_rows = seasons.len(),
                first_year = first_year.len(),
                career = career.len(),
                "aggregated seasons"
            );
            (first_year, career)
        };

        let prior = {
            let _span = info_span!("fit_prior", min_innings = config.min_prior_innings).entered();
            GammaPrior::fit(&first_year, config.min_prior_innings)?
        };

        let posteriors = {
            let _span = info_span!("posterior", players = first_year.len()).entered();
            PosteriorEngine::new(prior, config.credible_level)?.posteriors(&first_year)?
        };

        let evaluation = {
            let _span = info_span!("evaluate", min_innings = config.min_career_innings).entered();
            Evaluation::evaluate(&posteriors, &first_year, &career, config.min_career_innings)?
        };

        Ok(PipelineOutput {
            prior,
            first_year,
            career,
            posteriors,
            evaluation,
        })
    }

    /// Run over the pitching rows held by a storage engine.
    ///
    /// # Errors
    /// `InvalidInput` for malformed rows, otherwise see [`Self::run`].
    pub fn run_storage(&self, storage: &StorageEngine) -> Result<PipelineOutput> {
        let records = storage.season_records()?;
        self.run(&records)
    }
}

/// Builder for [`Pipeline`].
#[derive(Debug, Default)]
pub struct PipelineBuilder {
    config: ModelConfig,
}

impl PipelineBuilder {
    /// Replace the whole configuration.
    #[must_use]
    pub fn config(mut self, config: ModelConfig) -> Self {
        self.config = config;
        self
    }

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

    /// Build the pipeline.
    ///
    /// # Errors
    /// `InvalidInput` when the configuration fails validation.
    pub fn build(self) -> Result<Pipeline> {
        self.config.validate()?;
        Ok(Pipeline {
            config: self.config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<PlayerSeasonRecord> {
        // (id, debut ER, debut outs, later ER, later outs)
        let players = [
            ("a", 10, 90, 40, 600),
            ("b", 25, 120, 60, 450),
            ("c", 8, 75, 30, 330),
            ("d", 30, 150, 90, 900),
            ("e", 2, 3, 50, 420),
        ];
        players
            .iter()
            .flat_map(|&(id, er1, outs1, er2, outs2)| {
                vec![
                    PlayerSeasonRecord::new(id, 1960, er1, outs1),
                    PlayerSeasonRecord::new(id, 1961, er2, outs2),
                ]
            })
            .collect()
    }

    #[test]
    fn test_run_produces_every_stage() {
        let output = Pipeline::default().run(&rows()).unwrap();
        assert_eq!(output.first_year.len(), 5);
        assert_eq!(output.career.len(), 5);
        assert_eq!(output.posteriors.len(), 5);
        assert_eq!(output.evaluation.len(), 5);
        assert!(output.posterior("e").is_some());
        assert!(output.posterior("zz").is_none());
    }

    #[test]
    fn test_small_sample_is_pulled_toward_prior() {
        let output = Pipeline::default().run(&rows()).unwrap();
        let e = output.posterior("e").unwrap();
        let raw = e.raw_era.unwrap();
        assert!((raw - 18.0).abs() < 1e-12);
        let prior_mean = output.prior.mean_era();
        assert!((e.median_era - prior_mean).abs() < (raw - prior_mean).abs());
    }

    #[test]
    fn test_start_year_cutoff_can_empty_prior() {
        let pipeline = Pipeline::builder().start_year(1962).build().unwrap();
        let err = pipeline.run(&rows()).unwrap_err();
        assert!(err.is_estimation_error());
    }

    #[test]
    fn test_sample_intervals_deterministic() {
        let output = Pipeline::default().run(&rows()).unwrap();
        let a = output.sample_intervals(3, 123);
        let b = output.sample_intervals(3, 123);
        assert_eq!(a, b);
        assert_eq!(a.len(), 3);
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        assert!(Pipeline::builder().min_career_innings(-5.0).build().is_err());
    }
}
