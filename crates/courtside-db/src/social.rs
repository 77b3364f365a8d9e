//! Social actions that feed the achievement engine.
//!
//! Every action commits its own effect first and then runs an evaluation pass
//! for each user whose facts it changed. Evaluation problems are logged by the
//! engine and never undo or fail the action.

use crate::error::{Error, Result};
use crate::models::*;
use crate::store::{next_id, Store};
use chrono::{DateTime, Utc};
use courtside_core::{Definitions, Engine, GameId, Rating, ReviewId, SideRatings, UserId};
use tracing::debug;

/// Input for a new review.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub game: GameId,
    pub overall: Rating,
    pub home: SideRatings,
    pub away: SideRatings,
    pub body: String,
}

impl NewReview {
    /// A review with only an overall rating.
    pub fn new(game: GameId, overall: Rating) -> Self {
        Self {
            game,
            overall,
            home: SideRatings::default(),
            away: SideRatings::default(),
            body: String::new(),
        }
    }

    /// Attach attack/defense ratings for both sides.
    pub fn with_sides(mut self, home: SideRatings, away: SideRatings) -> Self {
        self.home = home;
        self.away = away;
        self
    }

    /// Attach review text.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }
}

/// Store plus engine: the entry point request handlers call.
pub struct Courtside {
    engine: Engine<Store>,
}

impl Courtside {
    /// Create with the standard definitions.
    pub fn new(store: Store) -> Result<Self> {
        Self::with_definitions(store, Definitions::standard())
    }

    /// Create with custom definitions, seeding their catalog.
    pub fn with_definitions(store: Store, defs: Definitions) -> Result<Self> {
        store.seed_catalog(&defs.catalog)?;
        Ok(Self {
            engine: Engine::with_definitions(store, defs),
        })
    }

    pub fn store(&self) -> &Store {
        self.engine.backend()
    }

    pub fn engine(&self) -> &Engine<Store> {
        &self.engine
    }

    /// Publish a review, then evaluate its author.
    pub fn post_review(&self, author: UserId, review: NewReview) -> Result<ReviewId> {
        self.post_review_at(author, review, Utc::now())
    }

    /// [`Courtside::post_review`] with an explicit clock reading.
    pub fn post_review_at(
        &self,
        author: UserId,
        review: NewReview,
        at: DateTime<Utc>,
    ) -> Result<ReviewId> {
        let rw = self.store().db.rw_transaction()?;
        require_user(&rw, author)?;
        let id = ReviewId::new(next_id(&rw, "review")?);
        rw.insert(StoredReview {
            id: id.raw(),
            user_id: author.raw(),
            game_id: review.game.raw(),
            overall: review.overall.half_points(),
            home_attack: half_points(review.home.attack),
            home_defense: half_points(review.home.defense),
            away_attack: half_points(review.away.attack),
            away_defense: half_points(review.away.defense),
            body: review.body,
            like_count: 0,
            created_at: to_millis(at),
        })?;
        rw.commit()?;
        debug!(user = %author, review = %id, game = %review.game, "Review posted");

        self.engine.evaluate_at(author, at);
        Ok(id)
    }

    /// Follow a user, then evaluate both ends of the edge.
    ///
    /// Following yourself or following twice does nothing and returns `false`.
    pub fn follow(&self, follower: UserId, followed: UserId) -> Result<bool> {
        if follower == followed {
            debug!(user = %follower, "Ignoring self-follow");
            return Ok(false);
        }
        let now = Utc::now();
        let rw = self.store().db.rw_transaction()?;
        require_user(&rw, follower)?;
        require_user(&rw, followed)?;
        let existing: Option<StoredFollow> =
            rw.get().primary(StoredFollow::key_for(follower, followed))?;
        if existing.is_some() {
            return Ok(false);
        }
        rw.insert(StoredFollow::new(follower, followed, now))?;
        rw.commit()?;
        debug!(follower = %follower, followed = %followed, "Follow added");

        self.engine.evaluate_at(follower, now);
        self.engine.evaluate_at(followed, now);
        Ok(true)
    }

    /// Remove a follow edge. Achievements already granted stay.
    pub fn unfollow(&self, follower: UserId, followed: UserId) -> Result<bool> {
        let rw = self.store().db.rw_transaction()?;
        let existing: Option<StoredFollow> =
            rw.get().primary(StoredFollow::key_for(follower, followed))?;
        let Some(edge) = existing else {
            return Ok(false);
        };
        rw.remove(edge)?;
        rw.commit()?;
        debug!(follower = %follower, followed = %followed, "Follow removed");
        Ok(true)
    }

    /// Comment on a review, then evaluate the commenter.
    pub fn comment(&self, author: UserId, review: ReviewId, body: &str) -> Result<u64> {
        let now = Utc::now();
        let rw = self.store().db.rw_transaction()?;
        require_user(&rw, author)?;
        require_review(&rw, review)?;
        let id = next_id(&rw, "comment")?;
        rw.insert(StoredComment {
            id,
            user_id: author.raw(),
            review_id: review.raw(),
            body: body.to_string(),
            created_at: to_millis(now),
        })?;
        rw.commit()?;
        debug!(user = %author, review = %review, "Comment added");

        self.engine.evaluate_at(author, now);
        Ok(id)
    }

    /// Like a review, then evaluate its author and the liker.
    ///
    /// Liking twice does nothing. Returns the review's like count.
    pub fn like(&self, user: UserId, review: ReviewId) -> Result<u64> {
        let now = Utc::now();
        let rw = self.store().db.rw_transaction()?;
        require_user(&rw, user)?;
        let target = require_review(&rw, review)?;
        let key = StoredLike::key_for(user, review);
        let existing: Option<StoredLike> = rw.get().primary(key.clone())?;
        if existing.is_some() {
            return Ok(target.like_count);
        }
        rw.insert(StoredLike {
            key,
            user_id: user.raw(),
            review_id: review.raw(),
            created_at: to_millis(now),
        })?;
        let mut updated = target.clone();
        updated.like_count += 1;
        let likes = updated.like_count;
        let author = UserId::new(target.user_id);
        rw.update(target, updated)?;
        rw.commit()?;
        debug!(user = %user, review = %review, likes, "Like added");

        self.engine.evaluate_at(author, now);
        if author != user {
            self.engine.evaluate_at(user, now);
        }
        Ok(likes)
    }

    /// Withdraw a like. Achievements already granted stay.
    pub fn unlike(&self, user: UserId, review: ReviewId) -> Result<u64> {
        let rw = self.store().db.rw_transaction()?;
        let target = require_review(&rw, review)?;
        let existing: Option<StoredLike> = rw.get().primary(StoredLike::key_for(user, review))?;
        let Some(like) = existing else {
            return Ok(target.like_count);
        };
        rw.remove(like)?;
        let mut updated = target.clone();
        updated.like_count = target.like_count.saturating_sub(1);
        let likes = updated.like_count;
        rw.update(target, updated)?;
        rw.commit()?;
        debug!(user = %user, review = %review, likes, "Like removed");
        Ok(likes)
    }
}

fn require_user(rw: &native_db::transaction::RwTransaction<'_>, user: UserId) -> Result<StoredUser> {
    let stored: Option<StoredUser> = rw.get().primary(user.raw())?;
    stored.ok_or_else(|| Error::NotFound(user.to_string()))
}

fn require_review(
    rw: &native_db::transaction::RwTransaction<'_>,
    review: ReviewId,
) -> Result<StoredReview> {
    let stored: Option<StoredReview> = rw.get().primary(review.raw())?;
    stored.ok_or_else(|| Error::NotFound(review.to_string()))
}
