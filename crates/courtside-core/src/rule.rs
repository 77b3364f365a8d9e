//! Achievement rules
//!
//! A rule pairs an achievement id with a [`Criterion`] over
//! [`ActivityFacts`]. Criteria are plain data so that the rule set can be
//! listed, loaded from scripts and tested without any storage.
//!
//! Every criterion is monotonic in facts that only grow over a user's
//! lifetime, so a rule that is satisfied once stays satisfied. Like counts are
//! the exception (likes can be withdrawn); an achievement unlocked by likes is
//! kept even if the review later drops below the threshold.

use crate::catalog::{ids, Catalog};
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::facts::ActivityFacts;
use crate::AchievementId;
use serde::{Deserialize, Serialize};

/// Condition an achievement is unlocked by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Criterion {
    /// At least this many reviews written
    ReviewCount(u64),
    /// At least this many comments written
    CommentCount(u64),
    /// Following at least this many users
    FollowingCount(u64),
    /// Followed by at least this many users
    FollowerCount(u64),
    /// Some review gave the maximum rating
    AnyMaxRating,
    /// Some reviewed game went to overtime
    AnyOvertimeGame,
    /// Some review received at least this many likes
    AnyReviewLikes(u64),
    /// Some reviewed game is a configured rivalry
    AnyRivalryGame,
    /// At least this many reviews of games involving the favorite team
    FavoriteTeamReviews(u64),
    /// At least this many reviews with attack and defense ratings
    DetailedReviews(u64),
    /// Reviewed games covering at least this many distinct teams
    DistinctTeams(usize),
    /// At least this many reviews inside the weekly window
    ReviewsInWindow(u64),
}

impl Criterion {
    /// Evaluate against a fact bundle
    pub fn is_met(&self, facts: &ActivityFacts) -> bool {
        match *self {
            Criterion::ReviewCount(n) => facts.total_reviews >= n,
            Criterion::CommentCount(n) => facts.total_comments_authored >= n,
            Criterion::FollowingCount(n) => facts.total_following >= n,
            Criterion::FollowerCount(n) => facts.total_followers >= n,
            Criterion::AnyMaxRating => facts.any_max_rating,
            Criterion::AnyOvertimeGame => facts.any_overtime_game,
            Criterion::AnyReviewLikes(n) => facts.max_review_likes >= n,
            Criterion::AnyRivalryGame => facts.any_rivalry_game,
            Criterion::FavoriteTeamReviews(n) => facts.favorite_team_reviews >= n,
            Criterion::DetailedReviews(n) => facts.detailed_reviews >= n,
            Criterion::DistinctTeams(n) => facts.teams_covered.len() >= n,
            Criterion::ReviewsInWindow(n) => facts.reviews_in_window >= n,
        }
    }
}

/// An achievement and the criterion that unlocks it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub achievement: AchievementId,
    pub criterion: Criterion,
}

impl Rule {
    pub fn new(achievement: AchievementId, criterion: Criterion) -> Self {
        Self {
            achievement,
            criterion,
        }
    }
}

/// Ordered list of rules
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Rules for the standard catalog with default settings
    pub fn standard() -> Self {
        Self::standard_for(&EngineConfig::default())
    }

    /// Rules for the standard catalog; league coverage asks for every one of
    /// `config.league_team_count` teams
    pub fn standard_for(config: &EngineConfig) -> Self {
        use Criterion::*;
        let rules = vec![
            Rule::new(ids::FIRST_REVIEW, ReviewCount(1)),
            Rule::new(ids::TEN_REVIEWS, ReviewCount(10)),
            Rule::new(ids::FIFTY_REVIEWS, ReviewCount(50)),
            Rule::new(ids::HUNDRED_REVIEWS, ReviewCount(100)),
            Rule::new(ids::FIRST_COMMENT, CommentCount(1)),
            Rule::new(ids::SOCIAL, FollowingCount(5)),
            Rule::new(ids::TEN_FOLLOWERS, FollowerCount(10)),
            Rule::new(ids::TWENTY_FIVE_FOLLOWERS, FollowerCount(25)),
            Rule::new(ids::MAX_RATING, AnyMaxRating),
            Rule::new(ids::OVERTIME_GAME, AnyOvertimeGame),
            Rule::new(ids::TEN_LIKES, AnyReviewLikes(10)),
            Rule::new(ids::FIFTY_LIKES, AnyReviewLikes(50)),
            Rule::new(ids::RIVALRY_GAME, AnyRivalryGame),
            Rule::new(ids::FAVORITE_TEAM_REVIEW, FavoriteTeamReviews(1)),
            Rule::new(ids::FAVORITE_TEAM_EXPERT, FavoriteTeamReviews(25)),
            Rule::new(ids::DETAILED_REVIEWS, DetailedReviews(25)),
            Rule::new(ids::LEAGUE_COVERAGE, DistinctTeams(config.league_team_count)),
            Rule::new(ids::WEEKLY_MARATHON, ReviewsInWindow(5)),
        ];
        Self { rules }
    }

    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn push(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Achievements whose criteria hold, in rule order, without duplicates
    pub fn satisfied(&self, facts: &ActivityFacts) -> Vec<AchievementId> {
        let mut unlocked = Vec::new();
        for rule in &self.rules {
            if rule.criterion.is_met(facts) && !unlocked.contains(&rule.achievement) {
                unlocked.push(rule.achievement);
            }
        }
        unlocked
    }

    /// Rule targets missing from `catalog`
    pub fn dangling(&self, catalog: &Catalog) -> Vec<AchievementId> {
        self.rules
            .iter()
            .map(|r| r.achievement)
            .filter(|id| !catalog.contains(*id))
            .collect()
    }

    /// Fail if any rule targets an achievement missing from `catalog`
    pub fn validate_against(&self, catalog: &Catalog) -> Result<()> {
        match self.dangling(catalog).first() {
            Some(id) => Err(Error::UnknownAchievement(*id)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TeamId, UserId};

    fn facts() -> ActivityFacts {
        ActivityFacts::empty(UserId(1))
    }

    #[test]
    fn test_standard_rules_cover_catalog() {
        let rules = RuleSet::standard();
        let catalog = Catalog::standard();
        assert_eq!(rules.len(), catalog.len());
        assert!(rules.validate_against(&catalog).is_ok());
        for def in catalog.iter() {
            assert!(rules.iter().any(|r| r.achievement == def.id), "no rule for {}", def.id);
        }
    }

    #[test]
    fn test_review_count_threshold_exact() {
        let rules = RuleSet::standard();
        let mut f = facts();

        f.total_reviews = 9;
        let unlocked = rules.satisfied(&f);
        assert!(unlocked.contains(&ids::FIRST_REVIEW));
        assert!(!unlocked.contains(&ids::TEN_REVIEWS));

        f.total_reviews = 10;
        assert!(rules.satisfied(&f).contains(&ids::TEN_REVIEWS));
    }

    #[test]
    fn test_nothing_for_empty_facts() {
        assert!(RuleSet::standard().satisfied(&facts()).is_empty());
    }

    #[test]
    fn test_social_thresholds() {
        let rules = RuleSet::standard();
        let mut f = facts();
        f.total_following = 4;
        f.total_followers = 24;
        let unlocked = rules.satisfied(&f);
        assert!(!unlocked.contains(&ids::SOCIAL));
        assert!(unlocked.contains(&ids::TEN_FOLLOWERS));
        assert!(!unlocked.contains(&ids::TWENTY_FIVE_FOLLOWERS));

        f.total_following = 5;
        f.total_followers = 25;
        let unlocked = rules.satisfied(&f);
        assert!(unlocked.contains(&ids::SOCIAL));
        assert!(unlocked.contains(&ids::TWENTY_FIVE_FOLLOWERS));
    }

    #[test]
    fn test_like_thresholds() {
        let mut f = facts();
        f.max_review_likes = 49;
        let unlocked = RuleSet::standard().satisfied(&f);
        assert!(unlocked.contains(&ids::TEN_LIKES));
        assert!(!unlocked.contains(&ids::FIFTY_LIKES));
    }

    #[test]
    fn test_league_coverage() {
        let mut f = facts();
        f.teams_covered = (1..=29).map(TeamId).collect();
        assert!(!RuleSet::standard().satisfied(&f).contains(&ids::LEAGUE_COVERAGE));
        f.teams_covered.insert(TeamId(30));
        assert!(RuleSet::standard().satisfied(&f).contains(&ids::LEAGUE_COVERAGE));
    }

    #[test]
    fn test_league_coverage_follows_team_count() {
        let config = EngineConfig {
            league_team_count: 29,
            ..EngineConfig::default()
        };
        let rules = RuleSet::standard_for(&config);
        let mut f = facts();
        f.teams_covered = (1..=28).map(TeamId).collect();
        assert!(!rules.satisfied(&f).contains(&ids::LEAGUE_COVERAGE));
        f.teams_covered.insert(TeamId(29));
        assert!(rules.satisfied(&f).contains(&ids::LEAGUE_COVERAGE));
    }

    #[test]
    fn test_duplicate_targets_reported_once() {
        let rules = RuleSet::new(vec![
            Rule::new(ids::SOCIAL, Criterion::FollowingCount(5)),
            Rule::new(ids::SOCIAL, Criterion::FollowerCount(1)),
        ]);
        let mut f = facts();
        f.total_following = 5;
        f.total_followers = 1;
        assert_eq!(rules.satisfied(&f), vec![ids::SOCIAL]);
    }

    #[test]
    fn test_dangling_rule_detected() {
        let mut rules = RuleSet::standard();
        rules.push(Rule::new(AchievementId::new(42), Criterion::AnyMaxRating));
        let err = rules.validate_against(&Catalog::standard()).unwrap_err();
        assert!(matches!(err, Error::UnknownAchievement(id) if id.raw() == 42));
    }

    #[test]
    fn test_rules_ron() {
        let rules: RuleSet = ron::from_str(
            r#"[
                (achievement: 1, criterion: ReviewCount(1)),
                (achievement: 18, criterion: DistinctTeams(30)),
                (achievement: 7, criterion: AnyMaxRating),
            ]"#,
        )
        .unwrap();
        assert_eq!(rules.len(), 3);
        assert_eq!(rules.iter().nth(2).unwrap().criterion, Criterion::AnyMaxRating);
    }
}
