//! `era-shrinkage` command line
//!
//! ```text
//! era-shrinkage <pitching.parquet> [--people FILE] [--config FILE]
//!               [--out FILE] [--tables DIR] [--top N]
//! ```
//!
//! Logging is controlled by `RUST_LOG` (default `info`).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use era_shrinkage::evaluation::EvaluationRecord;
use era_shrinkage::table::{evaluations_to_batch, posteriors_to_batch, summaries_to_batch};
use era_shrinkage::{
    storage, ModelConfig, Pipeline, PipelineOutput, Roster, RunReport, SortOrder, StorageEngine,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "era-shrinkage")]
#[command(about = "Empirical-Bayes shrinkage of first-year pitcher ERA")]
#[command(version)]
struct Args {
    /// Pitching table (playerID, yearID, ER, IPouts) as Parquet
    pitching: PathBuf,

    /// People table (playerID, nameFirst, nameLast) for display names
    #[arg(long)]
    people: Option<PathBuf>,

    /// Model configuration JSON
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the run report JSON here
    #[arg(long)]
    out: Option<PathBuf>,

    /// Write summary, posterior and evaluation tables as Parquet into this directory
    #[arg(long)]
    tables: Option<PathBuf>,

    /// Rows in each ranked table
    #[arg(long, default_value_t = 10)]
    top: usize,
}

fn print_ranked(title: &str, records: &[&EvaluationRecord], roster: &Roster) {
    println!("{title}");
    println!(
        "  {:<24} {:>7} {:>7} {:>7} {:>7} {:>9}",
        "player", "IP", "naive", "bayes", "career", "se_diff"
    );
    for r in records {
        println!(
            "  {:<24} {:>7.1} {:>7.2} {:>7.2} {:>7.2} {:>9.3}",
            roster.display_name(&r.player_id),
            r.first_year_innings,
            r.naive_era,
            r.bayes_era,
            r.career_era,
            r.se_diff
        );
    }
    println!();
}

fn print_output(output: &PipelineOutput, config: &ModelConfig, roster: &Roster, top: usize) {
    let prior = output.prior;
    println!(
        "Prior: Gamma(shape = {:.3}, rate = {:.3}) over ER per inning, mean ERA {:.2}",
        prior.shape(),
        prior.rate(),
        prior.mean_era()
    );
    let eval = &output.evaluation;
    println!(
        "Evaluated {} pitchers (career innings > {}): RMSE naive {:.3}, bayes {:.3}",
        eval.len(),
        config.min_career_innings,
        eval.rmse_naive(),
        eval.rmse_bayes()
    );
    println!();

    print_ranked(
        "Largest improvements from shrinkage",
        &eval.ranked(top, SortOrder::Descending),
        roster,
    );
    print_ranked(
        "Largest regressions from shrinkage",
        &eval.ranked(top, SortOrder::Ascending),
        roster,
    );

    println!(
        "Posterior intervals (sample of {}, seed {})",
        config.sample_size, config.sample_seed
    );
    println!(
        "  {:<24} {:>7} {:>7} {:>7} {:>7} {:>7}",
        "player", "IP", "raw", "lower", "median", "upper"
    );
    for interval in output.sample_intervals(config.sample_size, config.sample_seed) {
        let raw = interval
            .raw_era
            .map_or_else(|| "-".to_string(), |e| format!("{e:.2}"));
        println!(
            "  {:<24} {:>7.1} {:>7} {:>7.2} {:>7.2} {:>7.2}",
            roster.display_name(&interval.player_id),
            interval.innings,
            raw,
            interval.lower,
            interval.median,
            interval.upper
        );
    }
}

fn write_tables(dir: &Path, output: &PipelineOutput, roster: &Roster) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let tables = [
        ("first_year.parquet", summaries_to_batch(&output.first_year, roster)?),
        ("career.parquet", summaries_to_batch(&output.career, roster)?),
        ("posteriors.parquet", posteriors_to_batch(&output.posteriors, roster)?),
        (
            "evaluation.parquet",
            evaluations_to_batch(output.evaluation.records(), roster)?,
        ),
    ];
    for (name, batch) in tables {
        let path = dir.join(name);
        storage::write_parquet(&path, &[batch])
            .with_context(|| format!("writing {}", path.display()))?;
    }
    info!(dir = %dir.display(), "wrote result tables");
    Ok(())
}

fn run(args: &Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => ModelConfig::from_path(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ModelConfig::default(),
    };

    let mut storage = StorageEngine::load_parquet(&args.pitching)
        .with_context(|| format!("loading pitching table {}", args.pitching.display()))?;
    if let Some(people) = &args.people {
        storage
            .load_people_parquet(people)
            .with_context(|| format!("loading people table {}", people.display()))?;
    }
    let roster = Roster::from_identities(storage.identities()?);

    let pipeline = Pipeline::builder().config(config.clone()).build()?;
    let run_id = format!("era-{}", chrono::Utc::now().format("%Y%m%dT%H%M%S"));
    let mut report = RunReport::new(run_id, config.clone());
    report.start();

    let result = pipeline.run_storage(&storage);
    match &result {
        Ok(output) => report.succeed(output),
        Err(e) => report.fail(e),
    }
    if let Some(out) = &args.out {
        report
            .write_json(out)
            .with_context(|| format!("writing run report {}", out.display()))?;
        info!(path = %out.display(), "wrote run report");
    }

    let output = result.context("pipeline failed")?;
    print_output(&output, &config, &roster, args.top);
    if let Some(dir) = &args.tables {
        write_tables(dir, &output, &roster)?;
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    if let Err(e) = run(&args) {
        error!("{e:#}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_defaults() {
        let args = Args::try_parse_from(["era-shrinkage", "pitching.parquet"]).unwrap();
        assert_eq!(args.pitching, PathBuf::from("pitching.parquet"));
        assert_eq!(args.top, 10);
        assert!(args.people.is_none());
        assert!(args.config.is_none());
        assert!(args.out.is_none());
        assert!(args.tables.is_none());
    }

    #[test]
    fn test_parse_all_options() {
        let args = Args::try_parse_from([
            "era-shrinkage",
            "pitching.parquet",
            "--people",
            "people.parquet",
            "--config",
            "model.json",
            "--out",
            "report.json",
            "--tables",
            "out",
            "--top",
            "25",
        ])
        .unwrap();
        assert_eq!(args.people, Some(PathBuf::from("people.parquet")));
        assert_eq!(args.config, Some(PathBuf::from("model.json")));
        assert_eq!(args.out, Some(PathBuf::from("report.json")));
        assert_eq!(args.tables, Some(PathBuf::from("out")));
        assert_eq!(args.top, 25);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(Args::try_parse_from(["era-shrinkage"]).is_err());
        assert!(Args::try_parse_from(["era-shrinkage", "p.parquet", "--top", "many"]).is_err());
        assert!(Args::try_parse_from(["era-shrinkage", "p.parquet", "--bogus"]).is_err());
        assert!(Args::try_parse_from(["era-shrinkage", "a.parquet", "b.parquet"]).is_err());
    }
}
