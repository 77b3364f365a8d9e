//! Consistency auditing for experience and tiers
//!
//! Checks the two invariants the grant path maintains: a user's experience
//! equals the sum of rewards over their grants, and their tier is the highest
//! one that experience reaches.

use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::session::{ActivitySource, Backend, GrantLedger};
use crate::tier::{Tier, TierTable};
use crate::{AchievementId, UserId};

/// Outcome of auditing one user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditReport {
    pub user: UserId,
    pub grant_count: usize,
    pub recorded_xp: u64,
    /// Sum of rewards over grants that resolve in the catalog
    pub expected_xp: u64,
    pub recorded_tier: Tier,
    pub expected_tier: Tier,
    /// Grants whose achievement is missing from the catalog
    pub unknown_grants: Vec<AchievementId>,
}

impl AuditReport {
    pub fn xp_consistent(&self) -> bool {
        self.recorded_xp == self.expected_xp
    }

    pub fn tier_consistent(&self) -> bool {
        self.recorded_tier == self.expected_tier
    }

    /// Every invariant holds
    pub fn is_consistent(&self) -> bool {
        self.xp_consistent() && self.tier_consistent() && self.unknown_grants.is_empty()
    }
}

/// Auditor for a backend's grant ledger
pub struct Auditor<'a, B> {
    backend: &'a B,
    catalog: &'a Catalog,
    tiers: &'a TierTable,
}

impl<'a, B: Backend> Auditor<'a, B> {
    /// Create a new auditor
    pub fn new(backend: &'a B, catalog: &'a Catalog, tiers: &'a TierTable) -> Self {
        Self {
            backend,
            catalog,
            tiers,
        }
    }

    /// Audit a single user
    pub fn audit(&self, user: UserId) -> Result<AuditReport> {
        let session = self.backend.begin()?;
        let record = session.user(user)?.ok_or(Error::UserNotFound(user))?;
        let grants = session.grants_for(user)?;

        let mut expected_xp = 0u64;
        let mut unknown_grants = Vec::new();
        for grant in &grants {
            match self.catalog.get(grant.achievement) {
                Some(def) => expected_xp += def.xp_reward as u64,
                None => unknown_grants.push(grant.achievement),
            }
        }

        Ok(AuditReport {
            user,
            grant_count: grants.len(),
            recorded_xp: record.experience_points,
            expected_xp,
            recorded_tier: record.tier,
            expected_tier: self.tiers.tier_for(record.experience_points),
            unknown_grants,
        })
    }

    /// Audit several users, returning only the inconsistent reports
    pub fn find_inconsistent(&self, users: impl IntoIterator<Item = UserId>) -> Result<Vec<AuditReport>> {
        let mut reports = Vec::new();
        for user in users {
            let report = self.audit(user)?;
            if !report.is_consistent() {
                reports.push(report);
            }
        }
        Ok(reports)
    }
}
