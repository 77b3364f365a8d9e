//! Storage seam: the unit of work the engine runs inside
//!
//! The engine never talks to a database directly. A [`Backend`] hands out
//! [`Session`]s; each session is one transaction that can read activity
//! ([`ActivitySource`]) and append grants ([`GrantLedger`]). Nothing a session
//! writes is visible to others until [`Session::commit`]; dropping a session
//! discards its writes.
//!
//! Backends must make `insert_grant_if_absent` atomic with respect to other
//! sessions, either through a storage-level uniqueness constraint on
//! `(user, achievement)` or by serializing writers. That is what keeps two
//! concurrent evaluations from granting the same achievement twice.

use crate::activity::{ReviewRecord, UserRecord};
use crate::error::Result;
use crate::{AchievementId, Tier, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Permanent record that a user unlocked an achievement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantRecord {
    pub user: UserId,
    pub achievement: AchievementId,
    pub granted_at: DateTime<Utc>,
}

impl GrantRecord {
    /// Create a new grant record
    pub fn new(user: UserId, achievement: AchievementId, granted_at: DateTime<Utc>) -> Self {
        Self {
            user,
            achievement,
            granted_at,
        }
    }
}

/// Read access to a user's activity
pub trait ActivitySource {
    /// Fetch a user, `None` if the id does not resolve
    fn user(&self, id: UserId) -> Result<Option<UserRecord>>;

    /// Every review authored by a user, each with its linked game if present
    fn reviews_by(&self, author: UserId) -> Result<Vec<ReviewRecord>>;

    /// Number of comments a user has written
    fn comments_authored(&self, author: UserId) -> Result<u64>;

    /// Number of users this user follows
    fn following_count(&self, user: UserId) -> Result<u64>;

    /// Number of users following this user
    fn follower_count(&self, user: UserId) -> Result<u64>;
}

/// Append-only grant table plus the user fields only the engine writes
pub trait GrantLedger {
    /// Ids of every achievement already granted to a user
    fn granted_achievements(&self, user: UserId) -> Result<BTreeSet<AchievementId>>;

    /// Every grant record of a user
    fn grants_for(&self, user: UserId) -> Result<Vec<GrantRecord>>;

    /// Insert a grant unless one exists for the same `(user, achievement)`.
    ///
    /// Returns `false` when the grant already existed, including when a
    /// uniqueness conflict was detected by storage.
    fn insert_grant_if_absent(&mut self, grant: &GrantRecord) -> Result<bool>;

    /// Add experience to a user, returning the new total
    fn add_experience(&mut self, user: UserId, amount: u32) -> Result<u64>;

    /// Store a user's tier
    fn set_tier(&mut self, user: UserId, tier: Tier) -> Result<()>;
}

/// One transaction over activity and grants
pub trait Session: ActivitySource + GrantLedger {
    /// Make this session's writes durable and visible
    fn commit(self) -> Result<()>
    where
        Self: Sized;
}

/// Source of sessions
pub trait Backend {
    type Session<'a>: Session
    where
        Self: 'a;

    /// Start a new session
    fn begin(&self) -> Result<Self::Session<'_>>;
}
