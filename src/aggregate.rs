//! Record aggregation: season rows → per-player period summaries
//!
//! Each player's year number is derived from that player's own seasons
//! (`year - debut + 1`), so the result does not depend on input order.
//! Players are independent; with the `parallel` feature they are summarised
//! on the rayon pool and re-sorted by id afterwards.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::record::{Period, PlayerPeriodSummary, PlayerSeasonRecord};

/// Debut year for a player's seasons (minimum observed year).
#[must_use]
pub fn debut_year(seasons: &[&PlayerSeasonRecord]) -> Option<i32> {
    seasons.iter().map(|s| s.year).min()
}

/// 1-based year number of `year` relative to `debut`.
#[must_use]
pub const fn year_number(year: i32, debut: i32) -> i32 {
    year - debut + 1
}

/// Summarise one player's seasons for `period`.
///
/// Returns `None` when the period holds no outs.
#[must_use]
pub fn summarize_player(
    player_id: &str,
    seasons: &[&PlayerSeasonRecord],
    period: Period,
) -> Option<PlayerPeriodSummary> {
    let debut = debut_year(seasons)?;

    let mut earned_runs: u64 = 0;
    let mut outs: u64 = 0;
    let mut years: Vec<i32> = Vec::new();

    for season in seasons
        .iter()
        .filter(|s| period.contains(year_number(s.year, debut)))
    {
        earned_runs += u64::from(season.earned_runs);
        outs += u64::from(season.outs);
        years.push(season.year);
    }

    if outs == 0 {
        return None;
    }

    years.sort_unstable();
    years.dedup();

    Some(PlayerPeriodSummary {
        player_id: player_id.to_string(),
        period,
        earned_runs,
        outs,
        seasons: u32::try_from(years.len()).unwrap_or(u32::MAX),
    })
}

/// Group season rows by player id.
#[must_use]
pub fn group_by_player(records: &[PlayerSeasonRecord]) -> FxHashMap<&str, Vec<&PlayerSeasonRecord>> {
    let mut groups: FxHashMap<&str, Vec<&PlayerSeasonRecord>> = FxHashMap::default();
    for record in records {
        groups.entry(record.player_id.as_str()).or_default().push(record);
    }
    groups
}

type PlayerGroup<'a> = (&'a str, Vec<&'a PlayerSeasonRecord>);

#[cfg_attr(feature = "parallel", allow(dead_code))]
fn summarize_sequential(groups: &[PlayerGroup<'_>], period: Period) -> Vec<PlayerPeriodSummary> {
    groups
        .iter()
        .filter_map(|(id, seasons)| summarize_player(id, seasons, period))
        .collect()
}

#[cfg(feature = "parallel")]
fn summarize_parallel(groups: &[PlayerGroup<'_>], period: Period) -> Vec<PlayerPeriodSummary> {
    use rayon::prelude::*;
    groups
        .par_iter()
        .filter_map(|(id, seasons)| summarize_player(id, seasons, period))
        .collect()
}

/// Aggregate season rows into one summary per player for `period`.
///
/// Output is sorted by player id.
#[must_use]
pub fn aggregate(records: &[PlayerSeasonRecord], period: Period) -> Vec<PlayerPeriodSummary> {
    let groups: Vec<PlayerGroup<'_>> = group_by_player(records).into_iter().collect();
    let players = groups.len();

    #[cfg(feature = "parallel")]
    let mut summaries = summarize_parallel(&groups, period);
    #[cfg(not(feature = "parallel"))]
    let mut summaries = summarize_sequential(&groups, period);

    summaries.sort_by(|a, b| a.player_id.cmp(&b.player_id));

    debug!(
        period = period.label(),
        players,
        summaries = summaries.len(),
        "aggregated season rows"
    );
    summaries
}

/// Drop seasons before `start_year` (inclusive cutoff).
#[must_use]
pub fn seasons_from(records: &[PlayerSeasonRecord], start_year: i32) -> Vec<PlayerSeasonRecord> {
    records
        .iter()
        .filter(|r| r.year >= start_year)
        .cloned()
        .collect()
}
