//! Engine sessions over native_db read-write transactions.
//!
//! native_db allows one writer at a time, so a session started while another
//! is open waits for it to commit or drop. Check-then-insert of a grant inside
//! one session is therefore atomic; the grant primary key backs that up.

use crate::error::{Error, Result};
use crate::models::*;
use crate::store::Store;
use courtside_core::{
    AchievementId, ActivitySource, Backend, GameId, GrantLedger, GrantRecord, ReviewRecord,
    Session, Tier, UserId, UserRecord,
};
use native_db::transaction::RwTransaction;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// One engine unit of work.
///
/// Dropping the session without [`Session::commit`] aborts the transaction.
pub struct DbSession<'a> {
    rw: RwTransaction<'a>,
}

impl<'a> DbSession<'a> {
    pub(crate) fn new(rw: RwTransaction<'a>) -> Self {
        Self { rw }
    }

    fn stored_user(&self, id: UserId) -> Result<Option<StoredUser>> {
        Ok(self.rw.get().primary(id.raw())?)
    }

    fn require_user(&self, id: UserId) -> Result<StoredUser> {
        self.stored_user(id)?
            .ok_or_else(|| Error::Core(courtside_core::Error::UserNotFound(id)))
    }

    fn stored_grants(&self, user: UserId) -> Result<Vec<StoredGrant>> {
        let scan = self
            .rw
            .scan()
            .secondary::<StoredGrant>(StoredGrantKey::user_id)?;
        let iter = scan.start_with(user.raw())?;
        let grants: std::result::Result<Vec<StoredGrant>, _> = iter.collect();
        grants.map_err(|e| Error::Database(e.to_string()))
    }

    fn stored_reviews(&self, author: UserId) -> Result<Vec<StoredReview>> {
        let scan = self
            .rw
            .scan()
            .secondary::<StoredReview>(StoredReviewKey::user_id)?;
        let iter = scan.start_with(author.raw())?;
        let reviews: std::result::Result<Vec<StoredReview>, _> = iter.collect();
        reviews.map_err(|e| Error::Database(e.to_string()))
    }

    fn count_follows(&self, key: StoredFollowKey, user: UserId) -> Result<u64> {
        let scan = self.rw.scan().secondary::<StoredFollow>(key)?;
        let iter = scan.start_with(user.raw())?;
        Ok(iter.count() as u64)
    }
}

impl ActivitySource for DbSession<'_> {
    fn user(&self, id: UserId) -> courtside_core::Result<Option<UserRecord>> {
        Ok(self.stored_user(id)?.map(|u| u.to_record()))
    }

    fn reviews_by(&self, author: UserId) -> courtside_core::Result<Vec<ReviewRecord>> {
        let stored = self.stored_reviews(author)?;

        let mut games: BTreeMap<u64, Option<StoredGame>> = BTreeMap::new();
        let mut reviews = Vec::with_capacity(stored.len());
        for review in stored {
            if !games.contains_key(&review.game_id) {
                let game: Option<StoredGame> =
                    self.rw.get().primary(review.game_id).map_err(Error::from)?;
                if game.is_none() {
                    debug!(
                        review = review.id,
                        game = %GameId::new(review.game_id),
                        "Review references a missing game"
                    );
                }
                games.insert(review.game_id, game);
            }
            let game = games
                .get(&review.game_id)
                .and_then(|g| g.as_ref())
                .map(StoredGame::to_record);
            reviews.push(review.to_record(game));
        }
        Ok(reviews)
    }

    fn comments_authored(&self, author: UserId) -> courtside_core::Result<u64> {
        let scan = self
            .rw
            .scan()
            .secondary::<StoredComment>(StoredCommentKey::user_id)
            .map_err(Error::from)?;
        let iter = scan.start_with(author.raw()).map_err(Error::from)?;
        Ok(iter.count() as u64)
    }

    fn following_count(&self, user: UserId) -> courtside_core::Result<u64> {
        Ok(self.count_follows(StoredFollowKey::follower_id, user)?)
    }

    fn follower_count(&self, user: UserId) -> courtside_core::Result<u64> {
        Ok(self.count_follows(StoredFollowKey::followed_id, user)?)
    }
}

impl GrantLedger for DbSession<'_> {
    fn granted_achievements(&self, user: UserId) -> courtside_core::Result<BTreeSet<AchievementId>> {
        Ok(self
            .stored_grants(user)?
            .into_iter()
            .map(|g| AchievementId::new(g.achievement_id))
            .collect())
    }

    fn grants_for(&self, user: UserId) -> courtside_core::Result<Vec<GrantRecord>> {
        let mut grants: Vec<GrantRecord> = self
            .stored_grants(user)?
            .iter()
            .map(StoredGrant::to_record)
            .collect();
        grants.sort_by_key(|g| (g.granted_at, g.achievement));
        Ok(grants)
    }

    fn insert_grant_if_absent(&mut self, grant: &GrantRecord) -> courtside_core::Result<bool> {
        let stored = StoredGrant::from_record(grant);
        let existing: Option<StoredGrant> = self
            .rw
            .get()
            .primary(stored.key.clone())
            .map_err(Error::from)?;
        if existing.is_some() {
            return Ok(false);
        }
        match self.rw.insert(stored).map_err(Error::from) {
            Ok(()) => Ok(true),
            Err(Error::DuplicateKey(_)) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn add_experience(&mut self, user: UserId, amount: u32) -> courtside_core::Result<u64> {
        let current = self.require_user(user)?;
        let mut updated = current.clone();
        updated.experience_points = current.experience_points.saturating_add(u64::from(amount));
        let total = updated.experience_points;
        self.rw.update(current, updated).map_err(Error::from)?;
        Ok(total)
    }

    fn set_tier(&mut self, user: UserId, tier: Tier) -> courtside_core::Result<()> {
        let current = self.require_user(user)?;
        let mut updated = current.clone();
        updated.tier = tier;
        self.rw.update(current, updated).map_err(Error::from)?;
        Ok(())
    }
}

impl Session for DbSession<'_> {
    fn commit(self) -> courtside_core::Result<()> {
        self.rw.commit().map_err(Error::from)?;
        Ok(())
    }
}

impl Backend for Store {
    type Session<'a> = DbSession<'a>
    where
        Self: 'a;

    fn begin(&self) -> courtside_core::Result<DbSession<'_>> {
        let rw = self.db.rw_transaction().map_err(Error::from)?;
        Ok(DbSession::new(rw))
    }
}
