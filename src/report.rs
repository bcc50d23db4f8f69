//! Run report: the lifecycle and headline results of one pipeline execution
//!
//! Timestamps live here only, never in the estimation outputs, so repeated
//! runs over the same input still produce identical posteriors.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ModelConfig;
use crate::pipeline::PipelineOutput;
use crate::prior::GammaPrior;
use crate::Result;

/// Status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Created but not yet started.
    Pending,
    /// Currently executing.
    Running,
    /// Completed with an evaluation.
    Succeeded,
    /// Halted with an error.
    Failed,
}

/// Headline numbers of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Fitted prior
    pub prior: GammaPrior,
    /// Prior mean on the ERA scale
    pub prior_mean_era: f64,
    /// Players with a first-year summary
    pub first_year_players: usize,
    /// Players with a career-remainder summary
    pub career_players: usize,
    /// Players evaluated
    pub evaluated_players: usize,
    /// RMSE of the raw first-year ERA
    pub rmse_naive: f64,
    /// RMSE of the posterior median ERA
    pub rmse_bayes: f64,
}

impl RunSummary {
    /// Summarize a pipeline output.
    #[must_use]
    pub fn from_output(output: &PipelineOutput) -> Self {
        Self {
            prior: output.prior,
            prior_mean_era: output.prior.mean_era(),
            first_year_players: output.first_year.len(),
            career_players: output.career.len(),
            evaluated_players: output.evaluation.len(),
            rmse_naive: output.evaluation.rmse_naive(),
            rmse_bayes: output.evaluation.rmse_bayes(),
        }
    }
}

/// One execution of the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunReport {
    run_id: String,
    config: ModelConfig,
    status: RunStatus,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    summary: Option<RunSummary>,
    error: Option<String>,
}

impl RunReport {
    /// New report in `Pending` status.
    #[must_use]
    pub fn new(run_id: impl Into<String>, config: ModelConfig) -> Self {
        Self {
            run_id: run_id.into(),
            config,
            status: RunStatus::Pending,
            started_at: None,
            ended_at: None,
            summary: None,
            error: None,
        }
    }

    /// Run identifier.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Configuration the run used.
    #[must_use]
    pub const fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> RunStatus {
        self.status
    }

    /// Start timestamp, once started.
    #[must_use]
    pub const fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// End timestamp, once finished.
    #[must_use]
    pub const fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    /// Results of a successful run.
    #[must_use]
    pub const fn summary(&self) -> Option<&RunSummary> {
        self.summary.as_ref()
    }

    /// Error message of a failed run.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Pending → Running.
    pub fn start(&mut self) {
        self.status = RunStatus::Running;
        self.started_at = Some(Utc::now());
    }

    /// Finish with results.
    pub fn succeed(&mut self, output: &PipelineOutput) {
        self.summary = Some(RunSummary::from_output(output));
        self.status = RunStatus::Succeeded;
        self.ended_at = Some(Utc::now());
    }

    /// Finish with an error.
    pub fn fail(&mut self, error: &crate::Error) {
        self.error = Some(error.to_string());
        self.status = RunStatus::Failed;
        self.ended_at = Some(Utc::now());
    }

    /// Pretty JSON.
    ///
    /// # Errors
    /// Serialization failure.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write pretty JSON to `path`.
    ///
    /// # Errors
    /// Serialization or I/O failure.
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_starts_pending() {
        let report = RunReport::new("run-1", ModelConfig::default());
        assert_eq!(report.status(), RunStatus::Pending);
        assert!(report.started_at().is_none());
        assert!(report.summary().is_none());
    }

    #[test]
    fn test_failed_lifecycle_records_error() {
        let mut report = RunReport::new("run-1", ModelConfig::default());
        report.start();
        assert_eq!(report.status(), RunStatus::Running);
        report.fail(&crate::Error::DegenerateVariance { variance: 0.0 });
        assert_eq!(report.status(), RunStatus::Failed);
        assert!(report.ended_at().is_some());
        assert!(report.error().unwrap().contains("variance"));
    }

    #[test]
    fn test_json_round_trip() {
        let mut report = RunReport::new("run-2", ModelConfig::default());
        report.start();
        let json = report.to_json().unwrap();
        let back: RunReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
        assert!(json.contains("\"Running\""));
    }
}
