//! User tiers derived from experience
//!
//! Tiers are ordered. A user starts as [`Tier::Rookie`] with zero experience
//! and only ever moves forward, since experience never decreases.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the six ordered user tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum Tier {
    #[default]
    Rookie,
    RolePlayer,
    SixthMan,
    Starter,
    FranchisePlayer,
    Goat,
}

impl Tier {
    /// All tiers in ascending order
    pub const ALL: [Tier; 6] = [
        Tier::Rookie,
        Tier::RolePlayer,
        Tier::SixthMan,
        Tier::Starter,
        Tier::FranchisePlayer,
        Tier::Goat,
    ];

    /// Display label shown on profiles
    pub fn label(&self) -> &'static str {
        match self {
            Tier::Rookie => "Rookie",
            Tier::RolePlayer => "Role Player",
            Tier::SixthMan => "Sixth Man",
            Tier::Starter => "Starter",
            Tier::FranchisePlayer => "Franchise Player",
            Tier::Goat => "GOAT",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Minimum experience required for a tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierThreshold {
    pub tier: Tier,
    pub min_xp: u64,
}

/// Ordered mapping from experience threshold to tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierTable {
    thresholds: Vec<TierThreshold>,
}

/// A user's position within the tier ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierProgress {
    /// Tier the experience currently qualifies for
    pub current: Tier,
    /// Next tier, `None` at the top of the ladder
    pub next: Option<Tier>,
    /// Experience earned beyond the current tier's threshold
    pub xp_into_tier: u64,
    /// Experience between the current and next thresholds
    pub xp_span: Option<u64>,
}

impl TierProgress {
    /// Percentage towards the next tier (100 at the top tier)
    pub fn percent(&self) -> u8 {
        match self.xp_span {
            Some(span) if span > 0 => ((self.xp_into_tier.min(span) * 100) / span) as u8,
            _ => 100,
        }
    }
}

impl TierTable {
    /// The standard ladder: Rookie 0, Role Player 100, Sixth Man 250,
    /// Starter 500, Franchise Player 1000, GOAT 2500
    pub fn standard() -> Self {
        let thresholds = [0, 100, 250, 500, 1000, 2500]
            .into_iter()
            .zip(Tier::ALL)
            .map(|(min_xp, tier)| TierThreshold { tier, min_xp })
            .collect();
        Self { thresholds }
    }

    /// Build a table from explicit thresholds, validating their order
    pub fn new(thresholds: Vec<TierThreshold>) -> Result<Self> {
        let table = Self { thresholds };
        table.validate()?;
        Ok(table)
    }

    /// Check that the table covers every tier once, starts at zero and is
    /// strictly ascending
    pub fn validate(&self) -> Result<()> {
        if self.thresholds.len() != Tier::ALL.len() {
            return Err(Error::InvalidConfig(format!(
                "tier table must list {} tiers, found {}",
                Tier::ALL.len(),
                self.thresholds.len()
            )));
        }
        for (expected, threshold) in Tier::ALL.iter().zip(&self.thresholds) {
            if threshold.tier != *expected {
                return Err(Error::InvalidConfig(format!(
                    "tier table out of order: expected {}, found {}",
                    expected, threshold.tier
                )));
            }
        }
        if self.thresholds[0].min_xp != 0 {
            return Err(Error::InvalidConfig(
                "lowest tier must start at 0 XP".to_string(),
            ));
        }
        for pair in self.thresholds.windows(2) {
            if pair[1].min_xp <= pair[0].min_xp {
                return Err(Error::InvalidConfig(format!(
                    "threshold for {} must exceed threshold for {}",
                    pair[1].tier, pair[0].tier
                )));
            }
        }
        Ok(())
    }

    /// Thresholds in ascending order
    pub fn thresholds(&self) -> &[TierThreshold] {
        &self.thresholds
    }

    /// Minimum experience for a tier
    pub fn threshold(&self, tier: Tier) -> u64 {
        self.thresholds
            .iter()
            .find(|t| t.tier == tier)
            .map(|t| t.min_xp)
            .unwrap_or(0)
    }

    /// Highest tier whose threshold is at or below `xp`
    pub fn tier_for(&self, xp: u64) -> Tier {
        self.thresholds
            .iter()
            .take_while(|t| t.min_xp <= xp)
            .last()
            .map(|t| t.tier)
            .unwrap_or_default()
    }

    /// Progress of `xp` through the ladder
    pub fn progress(&self, xp: u64) -> TierProgress {
        let current = self.tier_for(xp);
        let floor = self.threshold(current);
        let next = self.thresholds.iter().find(|t| t.min_xp > xp);
        TierProgress {
            current,
            next: next.map(|t| t.tier),
            xp_into_tier: xp - floor,
            xp_span: next.map(|t| t.min_xp - floor),
        }
    }
}

impl Default for TierTable {
    fn default() -> Self {
        Self::standard()
    }
}
