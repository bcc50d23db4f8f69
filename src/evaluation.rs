//! Evaluation: naive vs. shrunk first-year ERA against career ERA
//!
//! Inner join of posteriors, raw first-year summaries and career-remainder
//! summaries on player id, restricted to career innings above a threshold.
//! Players missing from any side simply drop out; this favours longer
//! careers and is expected.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::posterior::PlayerPosterior;
use crate::record::PlayerPeriodSummary;
use crate::topk::{top_k_by, SortOrder};
use crate::{Error, Result};

/// One evaluated player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    /// Player identifier
    pub player_id: String,
    /// First-year innings behind both estimates
    pub first_year_innings: f64,
    /// Career-remainder innings behind the ground truth
    pub career_innings: f64,
    /// Career-remainder ERA (ground truth)
    pub career_era: f64,
    /// Raw first-year ERA
    pub naive_era: f64,
    /// Posterior median ERA
    pub bayes_era: f64,
    /// (career − naive)²
    pub naive_se: f64,
    /// (career − bayes)²
    pub bayes_se: f64,
    /// naive_se − bayes_se; positive when shrinkage helped
    pub se_diff: f64,
}

impl EvaluationRecord {
    /// Build a record from the three joined values.
    #[must_use]
    pub fn new(
        player_id: impl Into<String>,
        first_year_innings: f64,
        career_innings: f64,
        career_era: f64,
        naive_era: f64,
        bayes_era: f64,
    ) -> Self {
        let naive_se = squared_error(career_era, naive_era);
        let bayes_se = squared_error(career_era, bayes_era);
        Self {
            player_id: player_id.into(),
            first_year_innings,
            career_innings,
            career_era,
            naive_era,
            bayes_era,
            naive_se,
            bayes_se,
            se_diff: naive_se - bayes_se,
        }
    }
}

/// (truth − estimate)²
#[must_use]
pub fn squared_error(truth: f64, estimate: f64) -> f64 {
    let d = truth - estimate;
    d * d
}

/// sqrt(mean of squared errors); `None` when empty.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn rmse(squared_errors: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, n) = squared_errors
        .into_iter()
        .fold((0.0, 0usize), |(s, n), se| (s + se, n + 1));
    (n > 0).then(|| (sum / n as f64).sqrt())
}

/// Evaluated population plus RMSE summaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    records: Vec<EvaluationRecord>,
    rmse_naive: f64,
    rmse_bayes: f64,
}

impl Evaluation {
    /// Join and score.
    ///
    /// Records are sorted by player id. The RMSE reduction runs only after
    /// every record exists.
    ///
    /// # Errors
    /// `EmptyEvaluation` when no player qualifies.
    pub fn evaluate(
        posteriors: &[PlayerPosterior],
        first_year: &[PlayerPeriodSummary],
        career: &[PlayerPeriodSummary],
        min_career_innings: f64,
    ) -> Result<Self> {
        let first_by_id: FxHashMap<&str, &PlayerPeriodSummary> = first_year
            .iter()
            .map(|s| (s.player_id.as_str(), s))
            .collect();
        let career_by_id: FxHashMap<&str, &PlayerPeriodSummary> = career
            .iter()
            .filter(|s| s.innings() > min_career_innings)
            .map(|s| (s.player_id.as_str(), s))
            .collect();

        let mut records: Vec<EvaluationRecord> = posteriors
            .iter()
            .filter_map(|post| {
                let id = post.player_id.as_str();
                let first = first_by_id.get(id)?;
                let career = career_by_id.get(id)?;
                let naive_era = first.era().ok()?;
                let career_era = career.era().ok()?;
                Some(EvaluationRecord::new(
                    id,
                    first.innings(),
                    career.innings(),
                    career_era,
                    naive_era,
                    post.median_era,
                ))
            })
            .collect();
        records.sort_by(|a, b| a.player_id.cmp(&b.player_id));

        debug!(
            posteriors = posteriors.len(),
            qualifying_careers = career_by_id.len(),
            joined = records.len(),
            "evaluation join"
        );

        let rmse_naive = rmse(records.iter().map(|r| r.naive_se)).ok_or(Error::EmptyEvaluation {
            min_innings: min_career_innings,
        })?;
        let rmse_bayes = rmse(records.iter().map(|r| r.bayes_se)).ok_or(Error::EmptyEvaluation {
            min_innings: min_career_innings,
        })?;

        info!(
            players = records.len(),
            rmse_naive, rmse_bayes, "evaluated estimates against career ERA"
        );

        Ok(Self {
            records,
            rmse_naive,
            rmse_bayes,
        })
    }

    /// Evaluated records, sorted by player id.
    #[must_use]
    pub fn records(&self) -> &[EvaluationRecord] {
        &self.records
    }

    /// Number of evaluated players.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Always false for a constructed evaluation.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// RMSE of the raw first-year ERA.
    #[must_use]
    pub const fn rmse_naive(&self) -> f64 {
        self.rmse_naive
    }

    /// RMSE of the posterior median ERA.
    #[must_use]
    pub const fn rmse_bayes(&self) -> f64 {
        self.rmse_bayes
    }

    /// `rmse_naive − rmse_bayes`; positive when shrinkage wins.
    #[must_use]
    pub fn rmse_improvement(&self) -> f64 {
        self.rmse_naive - self.rmse_bayes
    }

    /// Top `k` records by `se_diff`.
    ///
    /// `Descending` surfaces the biggest Bayesian improvements,
    /// `Ascending` the biggest regressions.
    #[must_use]
    pub fn ranked(&self, k: usize, order: SortOrder) -> Vec<&EvaluationRecord> {
        top_k_by(&self.records, k, order, |r| r.se_diff)
    }
}
