//! User, achievement and grant models for database storage.

use courtside_core::{AchievementDef, AchievementId, GrantRecord, TeamId, Tier, UserId, UserRecord};
use native_db::*;
use native_model::{native_model, Model};
use serde::{Deserialize, Serialize};

use super::{from_millis, to_millis};

/// Stored user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 1, version = 1)]
#[native_db]
pub struct StoredUser {
    /// Primary key - user ID.
    #[primary_key]
    pub id: u64,
    /// Unique login name.
    #[secondary_key(unique)]
    pub username: String,
    /// Accumulated experience.
    pub experience_points: u64,
    /// Current tier.
    pub tier: Tier,
    /// Favorite team ID.
    pub favorite_team_id: Option<u64>,
}

impl StoredUser {
    /// Create from a user record.
    pub fn from_record(record: &UserRecord) -> Self {
        Self {
            id: record.id.raw(),
            username: record.username.clone(),
            experience_points: record.experience_points,
            tier: record.tier,
            favorite_team_id: record.favorite_team.map(|t| t.raw()),
        }
    }

    /// Convert to a user record.
    pub fn to_record(&self) -> UserRecord {
        UserRecord {
            id: UserId::new(self.id),
            username: self.username.clone(),
            experience_points: self.experience_points,
            tier: self.tier,
            favorite_team: self.favorite_team_id.map(TeamId::new),
        }
    }
}

/// Stored achievement definition, seeded from the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 2, version = 1)]
#[native_db]
pub struct StoredAchievement {
    /// Primary key - achievement ID.
    #[primary_key]
    pub id: u32,
    /// Display name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Experience reward.
    pub xp_reward: u32,
}

impl StoredAchievement {
    /// Create from a catalog definition.
    pub fn from_def(def: &AchievementDef) -> Self {
        Self {
            id: def.id.raw(),
            name: def.name.clone(),
            description: def.description.clone(),
            xp_reward: def.xp_reward,
        }
    }

    /// Convert to a catalog definition.
    pub fn to_def(&self) -> AchievementDef {
        AchievementDef::new(
            AchievementId::new(self.id),
            self.name.clone(),
            self.description.clone(),
            self.xp_reward,
        )
    }
}

/// Stored grant of an achievement to a user.
///
/// The primary key is the `(user, achievement)` pair, so the table itself
/// rejects a second grant of the same achievement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 3, version = 1)]
#[native_db]
pub struct StoredGrant {
    /// Primary key - composite of user and achievement.
    #[primary_key]
    pub key: String,
    /// Granted user.
    #[secondary_key]
    pub user_id: u64,
    /// Granted achievement.
    pub achievement_id: u32,
    /// Grant time (unix epoch milliseconds).
    pub granted_at: i64,
}

impl StoredGrant {
    /// Primary key for a `(user, achievement)` pair.
    pub fn key_for(user: UserId, achievement: AchievementId) -> String {
        format!("{}:{}", user.raw(), achievement.raw())
    }

    /// Create from a grant record.
    pub fn from_record(record: &GrantRecord) -> Self {
        Self {
            key: Self::key_for(record.user, record.achievement),
            user_id: record.user.raw(),
            achievement_id: record.achievement.raw(),
            granted_at: to_millis(record.granted_at),
        }
    }

    /// Convert to a grant record.
    pub fn to_record(&self) -> GrantRecord {
        GrantRecord::new(
            UserId::new(self.user_id),
            AchievementId::new(self.achievement_id),
            from_millis(self.granted_at),
        )
    }
}

/// Stored ID sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 4, version = 1)]
#[native_db]
pub struct StoredSequence {
    /// Sequence name, one row per table.
    #[primary_key]
    pub name: String,
    /// Last ID handed out.
    pub last: u64,
}
