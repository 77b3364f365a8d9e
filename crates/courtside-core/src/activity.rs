//! Activity records read from storage
//!
//! These are the shapes the storage collaborator hands to the aggregator. The
//! engine only reads them.

use crate::{GameId, Rating, ReviewId, TeamId, Tier, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The parts of a user the engine reads and updates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
    /// Sum of rewards over every granted achievement
    pub experience_points: u64,
    pub tier: Tier,
    pub favorite_team: Option<TeamId>,
}

impl UserRecord {
    /// A new user: Rookie with no experience
    pub fn new(id: UserId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            experience_points: 0,
            tier: Tier::Rookie,
            favorite_team: None,
        }
    }

    /// Set the favorite team
    pub fn with_favorite_team(mut self, team: TeamId) -> Self {
        self.favorite_team = Some(team);
        self
    }
}

/// A game as seen from a review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    pub id: GameId,
    pub home_team: TeamId,
    pub away_team: TeamId,
    /// Free-form status text from the statistics provider, e.g. `"Final/OT"`
    pub status: String,
}

impl GameRecord {
    /// Create a new game record
    pub fn new(id: GameId, home_team: TeamId, away_team: TeamId, status: impl Into<String>) -> Self {
        Self {
            id,
            home_team,
            away_team,
            status: status.into(),
        }
    }

    /// Whether either side is `team`
    pub fn involves(&self, team: TeamId) -> bool {
        self.home_team == team || self.away_team == team
    }
}

/// Attack and defense sub-ratings for one side of a game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SideRatings {
    pub attack: Option<Rating>,
    pub defense: Option<Rating>,
}

impl SideRatings {
    /// Both sub-ratings given
    pub fn new(attack: Rating, defense: Rating) -> Self {
        Self {
            attack: Some(attack),
            defense: Some(defense),
        }
    }

    /// Whether both an attack and a defense rating are present
    pub fn is_complete(&self) -> bool {
        self.attack.is_some() && self.defense.is_some()
    }
}

/// A user's review of a game, with its linked game when one resolves
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub id: ReviewId,
    pub author: UserId,
    pub game_id: GameId,
    /// `None` when the referenced game no longer resolves
    pub game: Option<GameRecord>,
    pub overall: Rating,
    pub home: SideRatings,
    pub away: SideRatings,
    pub like_count: u64,
    pub created_at: DateTime<Utc>,
}

impl ReviewRecord {
    /// Whether at least one side carries both attack and defense ratings
    pub fn is_detailed(&self) -> bool {
        self.home.is_complete() || self.away.is_complete()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(home: SideRatings, away: SideRatings) -> ReviewRecord {
        ReviewRecord {
            id: ReviewId(1),
            author: UserId(1),
            game_id: GameId(1),
            game: None,
            overall: Rating::MAX,
            home,
            away,
            like_count: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_detailed_needs_both_ratings_on_one_side() {
        let four = Rating::from_f64(4.0).unwrap();
        let half_home = SideRatings {
            attack: Some(four),
            defense: None,
        };
        let half_away = SideRatings {
            attack: None,
            defense: Some(four),
        };
        assert!(!review(half_home, half_away).is_detailed());
        assert!(review(SideRatings::new(four, four), SideRatings::default()).is_detailed());
        assert!(review(SideRatings::default(), SideRatings::new(four, four)).is_detailed());
    }

    #[test]
    fn test_game_involves() {
        let game = GameRecord::new(GameId(9), TeamId(1), TeamId(2), "Final");
        assert!(game.involves(TeamId(1)));
        assert!(game.involves(TeamId(2)));
        assert!(!game.involves(TeamId(3)));
    }

    #[test]
    fn test_new_user_is_rookie() {
        let user = UserRecord::new(UserId(3), "ana");
        assert_eq!(user.experience_points, 0);
        assert_eq!(user.tier, Tier::Rookie);
        assert_eq!(user.favorite_team, None);
    }
}
