//! Activity aggregation
//!
//! Turns a user's raw activity into the fact bundle every rule predicate
//! reads. Aggregation is a pure read: it walks the review list once and never
//! writes through the session it is given.

use crate::activity::{ReviewRecord, UserRecord};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::session::ActivitySource;
use crate::{ReviewId, TeamId, UserId};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

/// Facts about a single review
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewFacts {
    pub review: ReviewId,
    pub is_max_rating: bool,
    pub is_overtime_game: bool,
    pub like_count: u64,
    pub is_favorite_team_game: bool,
    pub is_detailed: bool,
    pub is_rivalry_game: bool,
    /// `None` when the review's game did not resolve
    pub home_team: Option<TeamId>,
    pub away_team: Option<TeamId>,
    pub created_at: DateTime<Utc>,
}

/// Counters supplied directly by storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SocialCounts {
    pub comments_authored: u64,
    pub following: u64,
    pub followers: u64,
}

/// Everything the rule set observes about one user at one instant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityFacts {
    pub user: UserId,
    pub total_reviews: u64,
    pub total_comments_authored: u64,
    pub total_following: u64,
    pub total_followers: u64,
    pub reviews: Vec<ReviewFacts>,
    /// Union of home and away teams across reviewed games
    pub teams_covered: BTreeSet<TeamId>,
    /// Reviews created inside the trailing weekly window
    pub reviews_in_window: u64,
    pub favorite_team_reviews: u64,
    pub detailed_reviews: u64,
    /// Highest like count on any single review
    pub max_review_likes: u64,
    pub any_max_rating: bool,
    pub any_overtime_game: bool,
    pub any_rivalry_game: bool,
}

impl ActivityFacts {
    /// Facts for a user with no activity at all
    pub fn empty(user: UserId) -> Self {
        Self {
            user,
            total_reviews: 0,
            total_comments_authored: 0,
            total_following: 0,
            total_followers: 0,
            reviews: Vec::new(),
            teams_covered: BTreeSet::new(),
            reviews_in_window: 0,
            favorite_team_reviews: 0,
            detailed_reviews: 0,
            max_review_likes: 0,
            any_max_rating: false,
            any_overtime_game: false,
            any_rivalry_game: false,
        }
    }
}

/// Builds [`ActivityFacts`] from activity records
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    config: EngineConfig,
}

impl Aggregator {
    /// Create an aggregator with the given settings
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Read a user's activity from `source` and summarize it as of `now`
    pub fn collect<S>(&self, source: &S, user: &UserRecord, now: DateTime<Utc>) -> Result<ActivityFacts>
    where
        S: ActivitySource + ?Sized,
    {
        let reviews = source.reviews_by(user.id)?;
        let counts = SocialCounts {
            comments_authored: source.comments_authored(user.id)?,
            following: source.following_count(user.id)?,
            followers: source.follower_count(user.id)?,
        };
        Ok(self.summarize(user, counts, &reviews, now))
    }

    /// Summarize already loaded activity in a single pass over the reviews
    pub fn summarize(
        &self,
        user: &UserRecord,
        counts: SocialCounts,
        reviews: &[ReviewRecord],
        now: DateTime<Utc>,
    ) -> ActivityFacts {
        let window_start = now
            .checked_sub_signed(self.config.weekly_window())
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let mut facts = ActivityFacts::empty(user.id);
        facts.total_reviews = reviews.len() as u64;
        facts.total_comments_authored = counts.comments_authored;
        facts.total_following = counts.following;
        facts.total_followers = counts.followers;

        for review in reviews {
            let review_facts = self.review_facts(user, review);

            if let (Some(home), Some(away)) = (review_facts.home_team, review_facts.away_team) {
                facts.teams_covered.insert(home);
                facts.teams_covered.insert(away);
            }
            if review_facts.created_at >= window_start {
                facts.reviews_in_window += 1;
            }
            if review_facts.is_favorite_team_game {
                facts.favorite_team_reviews += 1;
            }
            if review_facts.is_detailed {
                facts.detailed_reviews += 1;
            }
            facts.max_review_likes = facts.max_review_likes.max(review_facts.like_count);
            facts.any_max_rating |= review_facts.is_max_rating;
            facts.any_overtime_game |= review_facts.is_overtime_game;
            facts.any_rivalry_game |= review_facts.is_rivalry_game;

            facts.reviews.push(review_facts);
        }

        facts
    }

    /// Facts for one review. A review whose game did not resolve contributes
    /// no game-derived facts.
    pub fn review_facts(&self, user: &UserRecord, review: &ReviewRecord) -> ReviewFacts {
        let game = review.game.as_ref();
        let is_overtime_game = game
            .map(|g| g.status.contains(self.config.overtime_marker.as_str()))
            .unwrap_or(false);
        let is_favorite_team_game = match (user.favorite_team, game) {
            (Some(team), Some(g)) => g.involves(team),
            _ => false,
        };
        let is_rivalry_game = game
            .map(|g| self.config.is_rivalry(g.home_team, g.away_team))
            .unwrap_or(false);

        ReviewFacts {
            review: review.id,
            is_max_rating: review.overall.is_max(),
            is_overtime_game,
            like_count: review.like_count,
            is_favorite_team_game,
            is_detailed: review.is_detailed(),
            is_rivalry_game,
            home_team: game.map(|g| g.home_team),
            away_team: game.map(|g| g.away_team),
            created_at: review.created_at,
        }
    }
}
