//! Arrow tables for the presentation layer
//!
//! Stable schemas for summaries, posteriors and evaluation records so that
//! table formatters and plotters can consume `RecordBatch`es (or the Parquet
//! files written from them) without depending on the typed records.

use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, RecordBatch, StringArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};

use crate::evaluation::EvaluationRecord;
use crate::posterior::PlayerPosterior;
use crate::record::{PlayerPeriodSummary, Roster};
use crate::{Error, Result};

/// Column index of `se_diff` in [`evaluation_schema`].
pub const EVALUATION_SE_DIFF_COLUMN: usize = 9;

/// Column index of `median_era` in [`posterior_schema`].
pub const POSTERIOR_MEDIAN_COLUMN: usize = 6;

fn to_i64(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

fn build(schema: SchemaRef, columns: Vec<ArrayRef>) -> Result<RecordBatch> {
    RecordBatch::try_new(schema, columns)
        .map_err(|e| Error::StorageError(format!("Failed to build table: {e}")))
}

/// Schema of [`summaries_to_batch`].
#[must_use]
pub fn summary_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("player_id", DataType::Utf8, false),
        Field::new("name", DataType::Utf8, false),
        Field::new("period", DataType::Utf8, false),
        Field::new("earned_runs", DataType::Int64, false),
        Field::new("outs", DataType::Int64, false),
        Field::new("innings", DataType::Float64, false),
        Field::new("era", DataType::Float64, true),
    ]))
}

/// Period summaries as a table.
///
/// # Errors
/// Arrow construction failure.
pub fn summaries_to_batch(summaries: &[PlayerPeriodSummary], roster: &Roster) -> Result<RecordBatch> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(
            summaries.iter().map(|s| s.player_id.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            summaries.iter().map(|s| roster.display_name(&s.player_id)),
        )),
        Arc::new(StringArray::from_iter_values(
            summaries.iter().map(|s| s.period.label()),
        )),
        Arc::new(Int64Array::from_iter_values(
            summaries.iter().map(|s| to_i64(s.earned_runs)),
        )),
        Arc::new(Int64Array::from_iter_values(
            summaries.iter().map(|s| to_i64(s.outs)),
        )),
        Arc::new(Float64Array::from_iter_values(
            summaries.iter().map(PlayerPeriodSummary::innings),
        )),
        Arc::new(Float64Array::from_iter(
            summaries.iter().map(|s| s.era().ok()),
        )),
    ];
    build(summary_schema(), columns)
}

/// Schema of [`posteriors_to_batch`].
#[must_use]
pub fn posterior_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("player_id", DataType::Utf8, false),
        Field::new("name", DataType::Utf8, false),
        Field::new("earned_runs", DataType::Int64, false),
        Field::new("innings", DataType::Float64, false),
        Field::new("shape", DataType::Float64, false),
        Field::new("rate", DataType::Float64, false),
        Field::new("median_era", DataType::Float64, false),
        Field::new("lower_era", DataType::Float64, false),
        Field::new("upper_era", DataType::Float64, false),
        Field::new("raw_era", DataType::Float64, true),
        Field::new("prior_only", DataType::Boolean, false),
    ]))
}

/// Posteriors as a table.
///
/// # Errors
/// Arrow construction failure.
pub fn posteriors_to_batch(posteriors: &[PlayerPosterior], roster: &Roster) -> Result<RecordBatch> {
    let f = |get: fn(&PlayerPosterior) -> f64| -> ArrayRef {
        Arc::new(Float64Array::from_iter_values(posteriors.iter().map(get)))
    };
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(
            posteriors.iter().map(|p| p.player_id.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            posteriors.iter().map(|p| roster.display_name(&p.player_id)),
        )),
        Arc::new(Int64Array::from_iter_values(
            posteriors.iter().map(|p| to_i64(p.earned_runs)),
        )),
        f(|p| p.innings),
        f(|p| p.shape),
        f(|p| p.rate),
        f(|p| p.median_era),
        f(|p| p.lower_era),
        f(|p| p.upper_era),
        Arc::new(Float64Array::from_iter(posteriors.iter().map(|p| p.raw_era))),
        Arc::new(BooleanArray::from(
            posteriors.iter().map(|p| p.prior_only).collect::<Vec<bool>>(),
        )),
    ];
    build(posterior_schema(), columns)
}

/// Schema of [`evaluations_to_batch`].
#[must_use]
pub fn evaluation_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("player_id", DataType::Utf8, false),
        Field::new("name", DataType::Utf8, false),
        Field::new("first_year_innings", DataType::Float64, false),
        Field::new("career_innings", DataType::Float64, false),
        Field::new("career_era", DataType::Float64, false),
        Field::new("naive_era", DataType::Float64, false),
        Field::new("bayes_era", DataType::Float64, false),
        Field::new("naive_se", DataType::Float64, false),
        Field::new("bayes_se", DataType::Float64, false),
        Field::new("se_diff", DataType::Float64, false),
    ]))
}

/// Evaluation records as a table; rank with `TopKSelection` on
/// [`EVALUATION_SE_DIFF_COLUMN`].
///
/// # Errors
/// Arrow construction failure.
pub fn evaluations_to_batch(records: &[EvaluationRecord], roster: &Roster) -> Result<RecordBatch> {
    let f = |get: fn(&EvaluationRecord) -> f64| -> ArrayRef {
        Arc::new(Float64Array::from_iter_values(records.iter().map(get)))
    };
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.player_id.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| roster.display_name(&r.player_id)),
        )),
        f(|r| r.first_year_innings),
        f(|r| r.career_innings),
        f(|r| r.career_era),
        f(|r| r.naive_era),
        f(|r| r.bayes_era),
        f(|r| r.naive_se),
        f(|r| r.bayes_se),
        f(|r| r.se_diff),
    ];
    build(evaluation_schema(), columns)
}
