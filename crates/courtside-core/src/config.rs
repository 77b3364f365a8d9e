//! Engine configuration
//!
//! Settings the aggregator needs that are deployment data rather than rules:
//! the weekly window length, the overtime marker in game status text and the
//! configured rivalry matchups.

use crate::error::{Error, Result};
use crate::TeamId;
use serde::{Deserialize, Serialize};

/// A historic matchup between two teams, matched in either home/away order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rivalry {
    pub first: TeamId,
    pub second: TeamId,
}

impl Rivalry {
    /// Create a new rivalry
    pub fn new(first: TeamId, second: TeamId) -> Self {
        Self { first, second }
    }

    /// Whether a game between `home` and `away` is this matchup
    pub fn matches(&self, home: TeamId, away: TeamId) -> bool {
        (home == self.first && away == self.second) || (home == self.second && away == self.first)
    }
}

/// Longest accepted weekly window, in days
pub const MAX_WINDOW_DAYS: u32 = 3650;

/// Settings for fact aggregation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Length of the trailing window for the weekly review count
    pub weekly_window_days: u32,
    /// Substring of a game's status text that marks an overtime finish
    pub overtime_marker: String,
    /// Number of teams in the league; the standard coverage rule asks for
    /// one review of each
    pub league_team_count: usize,
    /// Configured historic matchups
    pub rivalries: Vec<Rivalry>,
}

impl EngineConfig {
    /// Check the settings for values that would make facts meaningless
    pub fn validate(&self) -> Result<()> {
        if self.weekly_window_days == 0 || self.weekly_window_days > MAX_WINDOW_DAYS {
            return Err(Error::InvalidConfig(format!(
                "weekly_window_days must be between 1 and {MAX_WINDOW_DAYS}, found {}",
                self.weekly_window_days
            )));
        }
        if self.league_team_count == 0 {
            return Err(Error::InvalidConfig(
                "league_team_count must be at least 1".to_string(),
            ));
        }
        if self.overtime_marker.is_empty() {
            return Err(Error::InvalidConfig(
                "overtime_marker must not be empty".to_string(),
            ));
        }
        if let Some(r) = self.rivalries.iter().find(|r| r.first == r.second) {
            return Err(Error::InvalidConfig(format!(
                "rivalry pairs {} with itself",
                r.first
            )));
        }
        Ok(())
    }

    /// Whether a game between `home` and `away` is a configured rivalry
    pub fn is_rivalry(&self, home: TeamId, away: TeamId) -> bool {
        self.rivalries.iter().any(|r| r.matches(home, away))
    }

    /// Weekly window as a duration
    pub fn weekly_window(&self) -> chrono::Duration {
        chrono::Duration::days(self.weekly_window_days as i64)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            weekly_window_days: 7,
            overtime_marker: "OT".to_string(),
            league_team_count: 30,
            rivalries: Vec::new(),
        }
    }
}
