//! Posterior engine: closed-form Gamma-Poisson update per player
//!
//! **Prior**: Gamma(α₀, β₀) over the per-inning rate λ
//! **Likelihood**: ER ~ Poisson(λ · IP)
//! **Posterior**: Gamma(α₀ + ER, β₀ + IP)
//!
//! Point estimate is the posterior median, interval bounds are the central
//! credible quantiles; all three are multiplied by 9 only when reported.
//! Each player depends on the shared prior and their own counts alone.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::distribution::{check_level, Gamma};
use crate::prior::GammaPrior;
use crate::record::{PlayerPeriodSummary, ERA_INNINGS};
use crate::{Error, Result};

/// Default central credible mass.
pub const DEFAULT_CREDIBLE_LEVEL: f64 = 0.95;

/// Posterior for one player's first-year performance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerPosterior {
    /// Player identifier
    pub player_id: String,
    /// First-year earned runs
    pub earned_runs: u64,
    /// First-year innings pitched
    pub innings: f64,
    /// Posterior shape α₀ + ER
    pub shape: f64,
    /// Posterior rate β₀ + IP
    pub rate: f64,
    /// Raw first-year ERA (`None` without innings)
    pub raw_era: Option<f64>,
    /// Posterior median ERA (the point estimate)
    pub median_era: f64,
    /// Posterior mean ERA
    pub mean_era: f64,
    /// Lower credible bound, ERA scale
    pub lower_era: f64,
    /// Upper credible bound, ERA scale
    pub upper_era: f64,
    /// True when the player contributed no innings (estimate is the prior's)
    pub prior_only: bool,
}

impl PlayerPosterior {
    /// Posterior distribution over the per-inning rate.
    #[must_use]
    pub const fn distribution(&self) -> Gamma {
        Gamma::from_validated(self.shape, self.rate)
    }

    /// Triple for interval plots.
    #[must_use]
    pub fn interval(&self) -> PosteriorInterval {
        PosteriorInterval {
            player_id: self.player_id.clone(),
            lower: self.lower_era,
            median: self.median_era,
            upper: self.upper_era,
            raw_era: self.raw_era,
            innings: self.innings,
        }
    }

    /// Width of the credible interval in ERA units.
    #[must_use]
    pub fn interval_width(&self) -> f64 {
        self.upper_era - self.lower_era
    }
}

/// (lower, median, upper) with the raw rate and data quantity, for plotting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosteriorInterval {
    /// Player identifier
    pub player_id: String,
    /// Lower credible bound (ERA)
    pub lower: f64,
    /// Posterior median (ERA)
    pub median: f64,
    /// Upper credible bound (ERA)
    pub upper: f64,
    /// Raw first-year ERA
    pub raw_era: Option<f64>,
    /// Innings pitched behind the estimate
    pub innings: f64,
}

/// Applies one prior to many players.
#[derive(Debug, Clone, Copy)]
pub struct PosteriorEngine {
    prior: GammaPrior,
    level: f64,
}

impl PosteriorEngine {
    /// Engine with a central credible interval of `level`.
    ///
    /// # Errors
    /// `InvalidHyperparameter` unless `0 < level < 1`.
    pub fn new(prior: GammaPrior, level: f64) -> Result<Self> {
        Ok(Self {
            prior,
            level: check_level(level)?,
        })
    }

    /// The shared prior.
    #[must_use]
    pub const fn prior(&self) -> GammaPrior {
        self.prior
    }

    /// Posterior from raw counts.
    ///
    /// # Errors
    /// Propagates quantile errors (none for a valid prior and finite counts).
    pub fn posterior_from_counts(
        &self,
        player_id: &str,
        earned_runs: u64,
        innings: f64,
    ) -> Result<PlayerPosterior> {
        if !(innings >= 0.0 && innings.is_finite()) {
            return Err(Error::InvalidInput(format!(
                "innings for {player_id} must be finite and non-negative, got {innings}"
            )));
        }

        #[allow(clippy::cast_precision_loss)]
        let er = earned_runs as f64;
        let posterior = Gamma::new(self.prior.shape() + er, self.prior.rate() + innings)?;

        let median = posterior.quantile(0.5)?;
        let (lower, upper) = posterior.credible_interval(self.level)?;

        Ok(PlayerPosterior {
            player_id: player_id.to_string(),
            earned_runs,
            innings,
            shape: posterior.shape(),
            rate: posterior.rate(),
            raw_era: (innings > 0.0).then(|| er / innings * ERA_INNINGS),
            median_era: median * ERA_INNINGS,
            mean_era: posterior.mean() * ERA_INNINGS,
            lower_era: lower * ERA_INNINGS,
            upper_era: upper * ERA_INNINGS,
            prior_only: innings == 0.0,
        })
    }

    /// Posterior for one first-year summary.
    ///
    /// # Errors
    /// See [`Self::posterior_from_counts`].
    pub fn posterior(&self, summary: &PlayerPeriodSummary) -> Result<PlayerPosterior> {
        self.posterior_from_counts(&summary.player_id, summary.earned_runs, summary.innings())
    }

    /// Posteriors for every summary, sorted by player id.
    ///
    /// # Errors
    /// First error encountered.
    pub fn posteriors(&self, summaries: &[PlayerPeriodSummary]) -> Result<Vec<PlayerPosterior>> {
        #[cfg(feature = "parallel")]
        let mut posteriors = self.posteriors_parallel(summaries)?;
        #[cfg(not(feature = "parallel"))]
        let mut posteriors = self.posteriors_sequential(summaries)?;

        posteriors.sort_by(|a, b| a.player_id.cmp(&b.player_id));

        let prior_only = posteriors.iter().filter(|p| p.prior_only).count();
        if prior_only > 0 {
            debug!(prior_only, "players with no innings received the prior");
        }
        info!(players = posteriors.len(), "computed posteriors");
        Ok(posteriors)
    }

    #[cfg_attr(feature = "parallel", allow(dead_code))]
    fn posteriors_sequential(&self, summaries: &[PlayerPeriodSummary]) -> Result<Vec<PlayerPosterior>> {
        summaries.iter().map(|s| self.posterior(s)).collect()
    }

    #[cfg(feature = "parallel")]
    fn posteriors_parallel(&self, summaries: &[PlayerPeriodSummary]) -> Result<Vec<PlayerPosterior>> {
        use rayon::prelude::*;
        summaries.par_iter().map(|s| self.posterior(s)).collect()
    }
}
