//! Common query patterns for the database.

use crate::error::{Error, Result};
use crate::models::*;
use crate::store::Store;
use chrono::{DateTime, Utc};
use courtside_core::{AchievementDef, AchievementId, ReviewId, UserId};
use tracing::warn;

/// An achievement a user holds, with its definition.
#[derive(Debug, Clone, PartialEq)]
pub struct UnlockedAchievement {
    pub achievement: AchievementDef,
    pub granted_at: DateTime<Utc>,
}

impl Store {
    /// Get all seeded achievement definitions, in id order.
    pub fn achievements(&self) -> Result<Vec<AchievementDef>> {
        let r = self.db.r_transaction()?;
        let scan = r.scan().primary::<StoredAchievement>()?;
        let iter = scan.all()?;
        let defs: std::result::Result<Vec<StoredAchievement>, _> = iter.collect();
        let defs = defs.map_err(|e| Error::Database(e.to_string()))?;
        Ok(defs.iter().map(StoredAchievement::to_def).collect())
    }

    /// Achievements a user has unlocked, oldest grant first.
    ///
    /// Grants whose achievement is missing from the seeded table are skipped.
    pub fn unlocked_achievements(&self, user: UserId) -> Result<Vec<UnlockedAchievement>> {
        let r = self.db.r_transaction()?;
        let scan = r.scan().secondary::<StoredGrant>(StoredGrantKey::user_id)?;
        let iter = scan.start_with(user.raw())?;
        let grants: std::result::Result<Vec<StoredGrant>, _> = iter.collect();
        let mut grants = grants.map_err(|e| Error::Database(e.to_string()))?;
        grants.sort_by_key(|g| (g.granted_at, g.achievement_id));

        let mut unlocked = Vec::with_capacity(grants.len());
        for grant in grants {
            let stored: Option<StoredAchievement> = r.get().primary(grant.achievement_id)?;
            match stored {
                Some(def) => unlocked.push(UnlockedAchievement {
                    achievement: def.to_def(),
                    granted_at: grant.to_record().granted_at,
                }),
                None => warn!(
                    user = %user,
                    achievement = %AchievementId::new(grant.achievement_id),
                    "Grant refers to an achievement that was never seeded"
                ),
            }
        }
        Ok(unlocked)
    }

    /// Number of reviews a user has written.
    pub fn count_reviews_by(&self, user: UserId) -> Result<usize> {
        let r = self.db.r_transaction()?;
        let scan = r.scan().secondary::<StoredReview>(StoredReviewKey::user_id)?;
        let iter = scan.start_with(user.raw())?;
        Ok(iter.count())
    }

    /// Load a review by ID.
    pub fn load_review(&self, id: ReviewId) -> Result<Option<StoredReview>> {
        let r = self.db.r_transaction()?;
        Ok(r.get().primary(id.raw())?)
    }

    /// Users following `user`.
    pub fn followers_of(&self, user: UserId) -> Result<Vec<UserId>> {
        let r = self.db.r_transaction()?;
        let scan = r.scan().secondary::<StoredFollow>(StoredFollowKey::followed_id)?;
        let iter = scan.start_with(user.raw())?;
        let follows: std::result::Result<Vec<StoredFollow>, _> = iter.collect();
        let follows = follows.map_err(|e| Error::Database(e.to_string()))?;
        Ok(follows.into_iter().map(|f| UserId::new(f.follower_id)).collect())
    }

    /// Users `user` follows.
    pub fn following_of(&self, user: UserId) -> Result<Vec<UserId>> {
        let r = self.db.r_transaction()?;
        let scan = r.scan().secondary::<StoredFollow>(StoredFollowKey::follower_id)?;
        let iter = scan.start_with(user.raw())?;
        let follows: std::result::Result<Vec<StoredFollow>, _> = iter.collect();
        let follows = follows.map_err(|e| Error::Database(e.to_string()))?;
        Ok(follows.into_iter().map(|f| UserId::new(f.followed_id)).collect())
    }

    /// Comments on a review.
    pub fn comments_on(&self, review: ReviewId) -> Result<Vec<StoredComment>> {
        let r = self.db.r_transaction()?;
        let scan = r.scan().secondary::<StoredComment>(StoredCommentKey::review_id)?;
        let iter = scan.start_with(review.raw())?;
        let comments: std::result::Result<Vec<StoredComment>, _> = iter.collect();
        comments.map_err(|e| Error::Database(e.to_string()))
    }
}
