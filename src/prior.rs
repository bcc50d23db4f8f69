//! Empirical-Bayes prior: Gamma hyperparameters by method of moments
//!
//! Fitted on per-inning rates (ER / IP) of first-year summaries above an
//! innings threshold. With m the sample mean and v the sample variance,
//! the Gamma moment identities give `m·r − v·r² = 0`, whose positive root
//! is `r = m / v`; the shape is `m · r`.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::distribution::Gamma;
use crate::record::{PlayerPeriodSummary, ERA_INNINGS};
use crate::{Error, Result};

/// Sample mean and (n − 1) variance of a set of rates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateMoments {
    /// Number of rates
    pub count: usize,
    /// Sample mean
    pub mean: f64,
    /// Unbiased sample variance
    pub variance: f64,
}

impl RateMoments {
    /// Two-pass mean/variance.
    ///
    /// Returns `None` for fewer than two values (variance undefined).
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn from_rates(rates: &[f64]) -> Option<Self> {
        if rates.len() < 2 {
            return None;
        }
        let n = rates.len() as f64;
        let mean = rates.iter().sum::<f64>() / n;
        let ss: f64 = rates.iter().map(|r| (r - mean) * (r - mean)).sum();
        Some(Self {
            count: rates.len(),
            mean,
            variance: ss / (n - 1.0),
        })
    }
}

/// Positive root `r` of `mean·r − variance·r² = 0`.
///
/// # Errors
/// `DegenerateVariance` for variance ≤ 0, `NoPositiveRoot` when mean ≤ 0.
pub fn solve_rate_root(mean: f64, variance: f64) -> Result<f64> {
    if !(variance > 0.0 && variance.is_finite()) {
        return Err(Error::DegenerateVariance { variance });
    }
    // roots: 0 and mean / variance; only the non-trivial one is kept
    let root = mean / variance;
    if !(root > 0.0 && root.is_finite()) {
        return Err(Error::NoPositiveRoot { mean, variance });
    }
    Ok(root)
}

/// Gamma prior over the per-inning earned-run rate.
///
/// Written once per run and shared read-only by every posterior.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GammaPrior {
    shape: f64,
    rate: f64,
}

impl GammaPrior {
    /// Create a prior from known hyperparameters.
    ///
    /// # Errors
    /// `InvalidHyperparameter` unless both are finite and > 0.
    pub fn new(shape: f64, rate: f64) -> Result<Self> {
        let gamma = Gamma::new(shape, rate)?;
        Ok(Self {
            shape: gamma.shape(),
            rate: gamma.rate(),
        })
    }

    /// Fit by method of moments from per-inning rates.
    ///
    /// # Errors
    /// `EmptyPriorPopulation` for fewer than two rates, otherwise see [`solve_rate_root`].
    pub fn from_rates(rates: &[f64]) -> Result<Self> {
        let moments = RateMoments::from_rates(rates).ok_or(Error::EmptyPriorPopulation {
            min_innings: 0.0,
            available: rates.len(),
        })?;
        Self::from_moments(&moments)
    }

    /// Solve hyperparameters from precomputed moments.
    ///
    /// # Errors
    /// `DegenerateVariance` or `NoPositiveRoot`.
    pub fn from_moments(moments: &RateMoments) -> Result<Self> {
        let rate = solve_rate_root(moments.mean, moments.variance)?;
        let shape = moments.mean * rate;
        Self::new(shape, rate)
    }

    /// Fit from first-year summaries whose innings exceed `min_innings`.
    ///
    /// # Errors
    /// Any estimation error; the run must halt.
    pub fn fit(first_year: &[PlayerPeriodSummary], min_innings: f64) -> Result<Self> {
        let rates: Vec<f64> = first_year
            .iter()
            .filter(|s| s.innings() > min_innings)
            .filter_map(|s| s.rate().ok())
            .collect();

        debug!(
            candidates = first_year.len(),
            qualifying = rates.len(),
            min_innings,
            "prior population filtered"
        );

        let moments = RateMoments::from_rates(&rates).ok_or(Error::EmptyPriorPopulation {
            min_innings,
            available: rates.len(),
        })?;
        let prior = Self::from_moments(&moments)?;

        info!(
            players = moments.count,
            mean_era = moments.mean * ERA_INNINGS,
            shape = prior.shape,
            rate = prior.rate,
            "fitted gamma prior"
        );
        Ok(prior)
    }

    /// Shape α₀.
    #[must_use]
    pub const fn shape(&self) -> f64 {
        self.shape
    }

    /// Rate β₀ (in innings).
    #[must_use]
    pub const fn rate(&self) -> f64 {
        self.rate
    }

    /// The prior as a distribution over the per-inning rate.
    #[must_use]
    pub const fn distribution(&self) -> Gamma {
        // fields were validated through Gamma::new at construction
        Gamma::from_validated(self.shape, self.rate)
    }

    /// Prior mean on the ERA scale.
    #[must_use]
    pub fn mean_era(&self) -> f64 {
        self.shape / self.rate * ERA_INNINGS
    }

    /// Prior median on the ERA scale.
    ///
    /// # Errors
    /// Propagates quantile errors (none for a valid prior).
    pub fn median_era(&self) -> Result<f64> {
        Ok(self.distribution().quantile(0.5)? * ERA_INNINGS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Period;

    fn summary(id: &str, er: u64, outs: u64) -> PlayerPeriodSummary {
        PlayerPeriodSummary {
            player_id: id.to_string(),
            period: Period::FirstYear,
            earned_runs: er,
            outs,
            seasons: 1,
        }
    }

    #[test]
    fn test_moments_known_values() {
        let m = RateMoments::from_rates(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert!((m.mean - 2.5).abs() < 1e-12);
        assert!((m.variance - 5.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_fit_recovers_moments() {
        let rates = [0.3, 0.45, 0.5, 0.6, 0.35];
        let prior = GammaPrior::from_rates(&rates).unwrap();
        let m = RateMoments::from_rates(&rates).unwrap();
        let dist = prior.distribution();
        assert!((dist.mean() - m.mean).abs() < 1e-12);
        assert!((dist.variance() - m.variance).abs() < 1e-12);
    }

    #[test]
    fn test_fit_applies_strict_innings_filter() {
        // 60 outs = exactly 20 innings: excluded by the strict filter
        let first = vec![
            summary("a", 10, 90),
            summary("b", 12, 90),
            summary("c", 50, 60),
        ];
        let prior = GammaPrior::fit(&first, 20.0).unwrap();
        let expected = GammaPrior::from_rates(&[10.0 / 30.0, 12.0 / 30.0]).unwrap();
        assert_eq!(prior, expected);
    }

    #[test]
    fn test_single_player_is_estimation_error() {
        let err = GammaPrior::fit(&[summary("a", 10, 90)], 20.0).unwrap_err();
        assert!(err.is_estimation_error());
        assert!(matches!(err, Error::EmptyPriorPopulation { available: 1, .. }));
    }

    #[test]
    fn test_empty_population_is_estimation_error() {
        let err = GammaPrior::fit(&[summary("a", 1, 3)], 20.0).unwrap_err();
        assert!(matches!(err, Error::EmptyPriorPopulation { available: 0, .. }));
    }

    #[test]
    fn test_zero_variance_is_estimation_error() {
        let first = vec![summary("a", 15, 90), summary("b", 15, 90), summary("c", 30, 180)];
        let err = GammaPrior::fit(&first, 20.0).unwrap_err();
        assert!(matches!(err, Error::DegenerateVariance { .. }));
        assert!(err.is_estimation_error());
    }

    #[test]
    fn test_zero_mean_has_no_positive_root() {
        let err = solve_rate_root(0.0, 1.0).unwrap_err();
        assert!(matches!(err, Error::NoPositiveRoot { .. }));
    }

    #[test]
    fn test_prior_rejects_invalid_hyperparameters() {
        assert!(GammaPrior::new(-1.0, 2.0).is_err());
        assert!(GammaPrior::new(1.0, 0.0).is_err());
    }

    #[test]
    fn test_mean_era_scaling() {
        let prior = GammaPrior::new(50.0, 90.0).unwrap();
        assert!((prior.mean_era() - 5.0).abs() < 1e-12);
        let median = prior.median_era().unwrap();
        assert!(median < prior.mean_era());
        assert!(median > 4.5);
    }
}
