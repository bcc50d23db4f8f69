//! Core records: season input rows, player identities and per-period summaries

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Number of outs in one inning.
pub const OUTS_PER_INNING: f64 = 3.0;

/// Innings in a regulation game; converts a per-inning rate to ERA.
pub const ERA_INNINGS: f64 = 9.0;

/// One pitching row for one player in one season (one stint).
///
/// Immutable source of truth. Counts are validated non-negative at ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerSeasonRecord {
    /// Player identifier
    pub player_id: String,
    /// Season year
    pub year: i32,
    /// Earned runs allowed
    pub earned_runs: u32,
    /// Outs recorded while pitching
    pub outs: u32,
}

impl PlayerSeasonRecord {
    /// Create a season record.
    #[must_use]
    pub fn new(player_id: impl Into<String>, year: i32, earned_runs: u32, outs: u32) -> Self {
        Self {
            player_id: player_id.into(),
            year,
            earned_runs,
            outs,
        }
    }

    /// Innings pitched (outs / 3).
    #[must_use]
    pub fn innings(&self) -> f64 {
        f64::from(self.outs) / OUTS_PER_INNING
    }
}

/// Player identity (display only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerIdentity {
    /// Player identifier
    pub player_id: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
}

impl PlayerIdentity {
    /// Create a player identity.
    #[must_use]
    pub fn new(
        player_id: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            player_id: player_id.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }

    /// "First Last", trimmed.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Id → identity lookup used when rendering tables.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    people: FxHashMap<String, PlayerIdentity>,
}

impl Roster {
    /// Build a roster; a later duplicate id replaces an earlier one.
    #[must_use]
    pub fn from_identities(identities: impl IntoIterator<Item = PlayerIdentity>) -> Self {
        let people = identities
            .into_iter()
            .map(|p| (p.player_id.clone(), p))
            .collect();
        Self { people }
    }

    /// Number of known players.
    #[must_use]
    pub fn len(&self) -> usize {
        self.people.len()
    }

    /// True if no identities are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }

    /// Identity for a player, if known.
    #[must_use]
    pub fn get(&self, player_id: &str) -> Option<&PlayerIdentity> {
        self.people.get(player_id)
    }

    /// Full name, or the bare id when the player is unknown.
    #[must_use]
    pub fn display_name(&self, player_id: &str) -> String {
        self.get(player_id)
            .map_or_else(|| player_id.to_string(), PlayerIdentity::full_name)
    }
}

/// Career period a summary covers, relative to each player's own debut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    /// Debut season only (year number 1)
    FirstYear,
    /// Every season after the debut (year number >= 2)
    CareerRemainder,
}

impl Period {
    /// Whether a season with the given 1-based year number belongs to this period.
    #[must_use]
    pub const fn contains(self, year_number: i32) -> bool {
        match self {
            Self::FirstYear => year_number == 1,
            Self::CareerRemainder => year_number > 1,
        }
    }

    /// Short label for tables and logs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::FirstYear => "first_year",
            Self::CareerRemainder => "career",
        }
    }
}

/// Summed counts for one player over one period.
///
/// Only built when the period has at least one out recorded; absence means
/// "no data", never "zero rate".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerPeriodSummary {
    /// Player identifier
    pub player_id: String,
    /// Period covered
    pub period: Period,
    /// Total earned runs
    pub earned_runs: u64,
    /// Total outs recorded
    pub outs: u64,
    /// Distinct seasons aggregated
    pub seasons: u32,
}

impl PlayerPeriodSummary {
    /// Innings pitched (outs / 3).
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn innings(&self) -> f64 {
        self.outs as f64 / OUTS_PER_INNING
    }

    /// Earned runs as a float, for the conjugate update.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn earned_runs_f64(&self) -> f64 {
        self.earned_runs as f64
    }

    /// Earned runs per inning (the Poisson-rate scale).
    ///
    /// # Errors
    /// `UndefinedRate` when no outs were recorded.
    pub fn rate(&self) -> Result<f64> {
        if self.outs == 0 {
            return Err(Error::UndefinedRate {
                player_id: self.player_id.clone(),
            });
        }
        Ok(self.earned_runs_f64() / self.innings())
    }

    /// Earned run average (9 × ER / IP).
    ///
    /// # Errors
    /// `UndefinedRate` when no outs were recorded.
    pub fn era(&self) -> Result<f64> {
        self.rate().map(|r| r * ERA_INNINGS)
    }
}
