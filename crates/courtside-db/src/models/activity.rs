//! Game and social activity models for database storage.

use courtside_core::{
    GameId, GameRecord, Rating, ReviewId, ReviewRecord, SideRatings, TeamId, UserId,
};
use native_db::*;
use native_model::{native_model, Model};
use serde::{Deserialize, Serialize};

use super::{from_millis, to_millis};

/// Stored game, as imported from the statistics provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 10, version = 1)]
#[native_db]
pub struct StoredGame {
    /// Primary key - game ID.
    #[primary_key]
    pub id: u64,
    /// Home team ID.
    pub home_team_id: u64,
    /// Away team ID.
    pub away_team_id: u64,
    /// Provider status text (e.g. "Final", "Final/OT").
    pub status: String,
}

impl StoredGame {
    /// Create from a game record.
    pub fn from_record(record: &GameRecord) -> Self {
        Self {
            id: record.id.raw(),
            home_team_id: record.home_team.raw(),
            away_team_id: record.away_team.raw(),
            status: record.status.clone(),
        }
    }

    /// Convert to a game record.
    pub fn to_record(&self) -> GameRecord {
        GameRecord::new(
            GameId::new(self.id),
            TeamId::new(self.home_team_id),
            TeamId::new(self.away_team_id),
            self.status.clone(),
        )
    }
}

/// Stored game review.
///
/// Ratings are kept as half-point counts (see [`Rating`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 11, version = 1)]
#[native_db]
pub struct StoredReview {
    /// Primary key - review ID.
    #[primary_key]
    pub id: u64,
    /// Author.
    #[secondary_key]
    pub user_id: u64,
    /// Reviewed game.
    pub game_id: u64,
    /// Overall rating.
    pub overall: u8,
    /// Home attack rating.
    pub home_attack: Option<u8>,
    /// Home defense rating.
    pub home_defense: Option<u8>,
    /// Away attack rating.
    pub away_attack: Option<u8>,
    /// Away defense rating.
    pub away_defense: Option<u8>,
    /// Review text.
    pub body: String,
    /// Number of likes received.
    pub like_count: u64,
    /// Creation time (unix epoch milliseconds).
    pub created_at: i64,
}

impl StoredReview {
    /// Convert to a review record, attaching the linked game if it resolved.
    ///
    /// Ratings that fail to decode are treated as absent rather than failing
    /// the whole review.
    pub fn to_record(&self, game: Option<GameRecord>) -> ReviewRecord {
        let rating = |half: Option<u8>| half.and_then(|h| Rating::from_half_points(h).ok());
        ReviewRecord {
            id: ReviewId::new(self.id),
            author: UserId::new(self.user_id),
            game_id: GameId::new(self.game_id),
            game,
            overall: rating(Some(self.overall)).unwrap_or(Rating::MIN),
            home: SideRatings {
                attack: rating(self.home_attack),
                defense: rating(self.home_defense),
            },
            away: SideRatings {
                attack: rating(self.away_attack),
                defense: rating(self.away_defense),
            },
            like_count: self.like_count,
            created_at: from_millis(self.created_at),
        }
    }
}

/// Stored follow edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 12, version = 1)]
#[native_db]
pub struct StoredFollow {
    /// Primary key - composite of follower and followed.
    #[primary_key]
    pub key: String,
    /// Following user.
    #[secondary_key]
    pub follower_id: u64,
    /// Followed user.
    #[secondary_key]
    pub followed_id: u64,
    /// Follow time (unix epoch milliseconds).
    pub created_at: i64,
}

impl StoredFollow {
    /// Primary key for a follow edge.
    pub fn key_for(follower: UserId, followed: UserId) -> String {
        format!("{}:{}", follower.raw(), followed.raw())
    }

    /// Create a new follow edge.
    pub fn new(follower: UserId, followed: UserId, at: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            key: Self::key_for(follower, followed),
            follower_id: follower.raw(),
            followed_id: followed.raw(),
            created_at: to_millis(at),
        }
    }
}

/// Stored comment on a review.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 13, version = 1)]
#[native_db]
pub struct StoredComment {
    /// Primary key - comment ID.
    #[primary_key]
    pub id: u64,
    /// Author.
    #[secondary_key]
    pub user_id: u64,
    /// Commented review.
    #[secondary_key]
    pub review_id: u64,
    /// Comment text.
    pub body: String,
    /// Creation time (unix epoch milliseconds).
    pub created_at: i64,
}

/// Stored like of a review.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 14, version = 1)]
#[native_db]
pub struct StoredLike {
    /// Primary key - composite of user and review.
    #[primary_key]
    pub key: String,
    /// Liking user.
    pub user_id: u64,
    /// Liked review.
    #[secondary_key]
    pub review_id: u64,
    /// Like time (unix epoch milliseconds).
    pub created_at: i64,
}

impl StoredLike {
    /// Primary key for a like.
    pub fn key_for(user: UserId, review: ReviewId) -> String {
        format!("{}:{}", user.raw(), review.raw())
    }
}

pub(crate) fn half_points(rating: Option<Rating>) -> Option<u8> {
    rating.map(|r| r.half_points())
}
