//! Achievement engine
//!
//! Entry point called after every qualifying social action. One evaluation
//! pass:
//!
//! ```text
//! begin session ── load user ── aggregate facts ── read granted ids
//!        │
//!        └── for each satisfied, not yet granted achievement:
//!               begin session ── apply_grant ── commit
//! ```
//!
//! Each grant runs in its own session, so a failing grant never undoes the
//! ones before it. Facts are recomputed from scratch on every pass, which is
//! why anything skipped now is picked up on the user's next action.

use crate::catalog::Catalog;
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::facts::{ActivityFacts, Aggregator};
use crate::grant::{apply_grant, GrantOutcome, TierChange};
use crate::rule::RuleSet;
use crate::session::{ActivitySource, Backend, GrantLedger, Session};
use crate::tier::TierTable;
use crate::{AchievementId, UserId};
use chrono::{DateTime, Utc};
use tracing::{debug, error, warn};

/// Catalog, rules, tiers and settings the engine runs with
#[derive(Debug, Clone, Default)]
pub struct Definitions {
    pub catalog: Catalog,
    pub rules: RuleSet,
    pub tiers: TierTable,
    pub config: EngineConfig,
}

impl Definitions {
    /// The standard catalog, rule set, tier ladder and default settings
    pub fn standard() -> Self {
        Self {
            catalog: Catalog::standard(),
            rules: RuleSet::standard(),
            tiers: TierTable::standard(),
            config: EngineConfig::default(),
        }
    }

    /// Check every part and their cross references
    pub fn validate(&self) -> Result<()> {
        self.tiers.validate()?;
        self.config.validate()?;
        self.rules.validate_against(&self.catalog)
    }
}

/// An achievement unlocked during an evaluation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unlock {
    pub achievement: AchievementId,
    pub xp_awarded: u32,
    pub experience: u64,
    pub promotion: Option<TierChange>,
}

/// Whether an evaluation found a user to evaluate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationStatus {
    Evaluated,
    UserMissing,
}

/// What one evaluation pass did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub user: UserId,
    pub status: EvaluationStatus,
    pub unlocked: Vec<Unlock>,
    /// Satisfied achievements that could not be granted on this pass
    pub failed: Vec<AchievementId>,
}

impl Evaluation {
    fn new(user: UserId, status: EvaluationStatus) -> Self {
        Self {
            user,
            status,
            unlocked: Vec::new(),
            failed: Vec::new(),
        }
    }

    /// Ids unlocked on this pass
    pub fn unlocked_ids(&self) -> Vec<AchievementId> {
        self.unlocked.iter().map(|u| u.achievement).collect()
    }

    /// Total experience awarded on this pass
    pub fn xp_awarded(&self) -> u64 {
        self.unlocked.iter().map(|u| u.xp_awarded as u64).sum()
    }

    /// Last tier reached on this pass, if the user was promoted
    pub fn promotion(&self) -> Option<TierChange> {
        let mut changes = self.unlocked.iter().filter_map(|u| u.promotion);
        let first = changes.next()?;
        let last = changes.last().unwrap_or(first);
        Some(TierChange {
            from: first.from,
            to: last.to,
        })
    }
}

/// Rule engine bound to a storage backend
pub struct Engine<B> {
    backend: B,
    aggregator: Aggregator,
    catalog: Catalog,
    rules: RuleSet,
    tiers: TierTable,
}

impl<B: Backend> Engine<B> {
    /// Create an engine with the standard definitions
    pub fn new(backend: B) -> Self {
        Self::with_definitions(backend, Definitions::standard())
    }

    /// Create an engine with custom definitions.
    ///
    /// Rules pointing outside the catalog are reported here and again each
    /// time they fire; they never grant anything.
    pub fn with_definitions(backend: B, defs: Definitions) -> Self {
        for id in defs.rules.dangling(&defs.catalog) {
            error!(achievement = %id, "Rule targets an achievement missing from the catalog");
        }
        Self {
            backend,
            aggregator: Aggregator::new(defs.config),
            catalog: defs.catalog,
            rules: defs.rules,
            tiers: defs.tiers,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn tiers(&self) -> &TierTable {
        &self.tiers
    }

    pub fn config(&self) -> &EngineConfig {
        self.aggregator.config()
    }

    /// Evaluate every rule for `user` and grant what is newly satisfied.
    ///
    /// Never fails: problems are logged and the pass ends early. The caller's
    /// primary action is unaffected either way.
    pub fn evaluate(&self, user: UserId) {
        self.evaluate_at(user, Utc::now());
    }

    /// [`Engine::evaluate`] with an explicit clock reading
    pub fn evaluate_at(&self, user: UserId, now: DateTime<Utc>) {
        match self.try_evaluate_at(user, now) {
            Ok(evaluation) if !evaluation.failed.is_empty() => {
                warn!(
                    user = %user,
                    failed = evaluation.failed.len(),
                    "Some achievements could not be granted this pass"
                );
            }
            Ok(_) => {}
            Err(e) => {
                warn!(user = %user, error = %e, "Achievement evaluation failed");
            }
        }
    }

    /// Run one evaluation pass and report what it did
    pub fn try_evaluate(&self, user: UserId) -> Result<Evaluation> {
        self.try_evaluate_at(user, Utc::now())
    }

    /// [`Engine::try_evaluate`] with an explicit clock reading
    pub fn try_evaluate_at(&self, user: UserId, now: DateTime<Utc>) -> Result<Evaluation> {
        let (facts, granted) = {
            let session = self.backend.begin()?;
            let Some(facts) = self.collect(&session, user, now)? else {
                debug!(user = %user, "Evaluation skipped: user not found");
                return Ok(Evaluation::new(user, EvaluationStatus::UserMissing));
            };
            let granted = session.granted_achievements(user)?;
            (facts, granted)
        };

        let mut evaluation = Evaluation::new(user, EvaluationStatus::Evaluated);
        for achievement in self.rules.satisfied(&facts) {
            if granted.contains(&achievement) {
                continue;
            }
            match self.grant_at(user, achievement, now) {
                Ok(GrantOutcome::Granted {
                    xp_awarded,
                    experience,
                    promotion,
                }) => evaluation.unlocked.push(Unlock {
                    achievement,
                    xp_awarded,
                    experience,
                    promotion,
                }),
                Ok(GrantOutcome::AlreadyGranted) => {}
                Err(e @ Error::UnknownAchievement(_)) => {
                    error!(user = %user, achievement = %achievement, error = %e, "Catalog defect");
                    evaluation.failed.push(achievement);
                }
                Err(e) => {
                    warn!(user = %user, achievement = %achievement, error = %e, "Grant failed");
                    evaluation.failed.push(achievement);
                }
            }
        }
        Ok(evaluation)
    }

    /// Current fact bundle for a user, `None` if the user does not exist
    pub fn facts(&self, user: UserId, now: DateTime<Utc>) -> Result<Option<ActivityFacts>> {
        let session = self.backend.begin()?;
        self.collect(&session, user, now)
    }

    /// Grant one achievement to a user, idempotently
    pub fn grant(&self, user: UserId, achievement: AchievementId) -> Result<GrantOutcome> {
        self.grant_at(user, achievement, Utc::now())
    }

    fn grant_at(&self, user: UserId, achievement: AchievementId, at: DateTime<Utc>) -> Result<GrantOutcome> {
        let def = self.catalog.require(achievement)?;
        let mut session = self.backend.begin()?;
        let outcome = apply_grant(&mut session, &self.tiers, user, def, at)?;
        if outcome.is_granted() {
            session.commit()?;
        }
        Ok(outcome)
    }

    fn collect<S>(&self, session: &S, user: UserId, now: DateTime<Utc>) -> Result<Option<ActivityFacts>>
    where
        S: ActivitySource,
    {
        match session.user(user)? {
            Some(record) => self.aggregator.collect(session, &record, now).map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ids, AchievementDef};
    use crate::config::Rivalry;
    use crate::rule::{Criterion, Rule};
    use crate::testing::{init_tracing, MemoryBackend};
    use crate::tier::Tier;
    use crate::TeamId;
    use chrono::Duration;

    fn engine() -> Engine<MemoryBackend> {
        Engine::new(MemoryBackend::new())
    }

    fn sum_of_grants(engine: &Engine<MemoryBackend>, user: UserId) -> u64 {
        engine
            .backend()
            .grants(user)
            .iter()
            .map(|g| engine.catalog().get(g.achievement).unwrap().xp_reward as u64)
            .sum()
    }

    #[test]
    fn test_first_review_with_max_rating() {
        let engine = engine();
        let db = engine.backend();
        let user = db.add_user("ana");
        let game = db.game(1, 2, "Final");
        db.review(user, Some(game), 5.0);

        let evaluation = engine.try_evaluate(user).unwrap();
        let mut unlocked = evaluation.unlocked_ids();
        unlocked.sort();
        assert_eq!(unlocked, vec![ids::FIRST_REVIEW, ids::MAX_RATING]);
        assert_eq!(evaluation.xp_awarded(), 30);

        let record = db.user_record(user);
        assert_eq!(record.experience_points, 30);
        assert_eq!(record.tier, Tier::Rookie);
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let engine = engine();
        let db = engine.backend();
        let user = db.add_user("ana");
        db.review(user, None, 5.0);
        db.comment(user);

        engine.evaluate(user);
        let after_first = db.user_record(user);
        let grants_first = db.grants(user).len();

        for _ in 0..5 {
            let evaluation = engine.try_evaluate(user).unwrap();
            assert!(evaluation.unlocked.is_empty());
        }
        assert_eq!(db.user_record(user), after_first);
        assert_eq!(db.grants(user).len(), grants_first);
    }

    #[test]
    fn test_social_unlocks_once() {
        let engine = engine();
        let db = engine.backend();
        let user = db.add_user("ana");
        let others: Vec<UserId> = (0..6).map(|i| db.add_user(&format!("u{}", i))).collect();

        for other in &others[..4] {
            db.follow(user, *other);
            assert!(engine.try_evaluate(user).unwrap().unlocked.is_empty());
        }

        db.follow(user, others[4]);
        assert_eq!(engine.try_evaluate(user).unwrap().unlocked_ids(), vec![ids::SOCIAL]);
        assert_eq!(db.user_record(user).experience_points, 25);

        db.follow(user, others[5]);
        assert!(engine.try_evaluate(user).unwrap().unlocked.is_empty());
        assert_eq!(db.user_record(user).experience_points, 25);
    }

    #[test]
    fn test_review_milestones_unlock_as_thresholds_cross() {
        let engine = engine();
        let db = engine.backend();
        let user = db.add_user("ana");
        let milestones = [
            (1, ids::FIRST_REVIEW),
            (10, ids::TEN_REVIEWS),
            (50, ids::FIFTY_REVIEWS),
            (100, ids::HUNDRED_REVIEWS),
        ];
        let long_ago = Utc::now() - Duration::days(60);

        for n in 1..=100u64 {
            db.review_at(user, None, 3.0, long_ago);
            let unlocked = engine.try_evaluate(user).unwrap().unlocked_ids();
            match milestones.iter().find(|(at, _)| *at == n) {
                Some((_, id)) => assert_eq!(unlocked, vec![*id], "at review {}", n),
                None => assert!(unlocked.is_empty(), "unexpected unlock at review {}", n),
            }
        }

        assert_eq!(db.grants(user).len(), 4);
        assert_eq!(db.user_record(user).experience_points, 10 + 50 + 200 + 400);
        assert_eq!(db.user_record(user).tier, Tier::Starter);
        assert_eq!(db.user_record(user).experience_points, sum_of_grants(&engine, user));
    }

    #[test]
    fn test_reaching_100_xp_promotes() {
        let engine = engine();
        let db = engine.backend();
        let user = db.add_user("ana");
        db.set_experience(user, 90);
        db.force_grant(user, ids::MAX_RATING);
        db.review(user, None, 3.0);

        let evaluation = engine.try_evaluate(user).unwrap();
        assert_eq!(evaluation.unlocked_ids(), vec![ids::FIRST_REVIEW]);
        assert_eq!(
            evaluation.promotion(),
            Some(TierChange {
                from: Tier::Rookie,
                to: Tier::RolePlayer
            })
        );
        assert_eq!(db.user_record(user).experience_points, 100);
        assert_eq!(db.user_record(user).tier, Tier::RolePlayer);
    }

    #[test]
    fn test_overtime_unlocks_only_after_review() {
        let engine = engine();
        let db = engine.backend();
        let user = db.add_user("ana");
        db.review(user, Some(db.game(1, 2, "Final")), 3.0);

        engine.evaluate(user);
        assert!(!db.grants(user).iter().any(|g| g.achievement == ids::OVERTIME_GAME));

        db.review(user, Some(db.game(3, 4, "Final/OT")), 3.0);
        let evaluation = engine.try_evaluate(user).unwrap();
        assert_eq!(evaluation.unlocked_ids(), vec![ids::OVERTIME_GAME]);
    }

    #[test]
    fn test_likes_grant_is_kept_when_likes_drop() {
        let engine = engine();
        let db = engine.backend();
        let user = db.add_user("ana");
        let review = db.review(user, None, 3.0);
        db.set_likes(review, 10);
        engine.evaluate(user);
        assert_eq!(db.user_record(user).experience_points, 10 + 100);

        db.set_likes(review, 3);
        let evaluation = engine.try_evaluate(user).unwrap();
        assert!(evaluation.unlocked.is_empty());
        assert!(db.grants(user).iter().any(|g| g.achievement == ids::TEN_LIKES));
        assert_eq!(db.user_record(user).experience_points, 110);
    }

    #[test]
    fn test_missing_user_is_noop() {
        init_tracing();
        let engine = engine();
        let evaluation = engine.try_evaluate(UserId(999)).unwrap();
        assert_eq!(evaluation.status, EvaluationStatus::UserMissing);
        assert!(evaluation.unlocked.is_empty());
        engine.evaluate(UserId(999));
    }

    #[test]
    fn test_dangling_rule_does_not_block_others() {
        init_tracing();
        let mut defs = Definitions::standard();
        defs.rules
            .push(Rule::new(AchievementId::new(77), Criterion::ReviewCount(1)));
        let engine = Engine::with_definitions(MemoryBackend::new(), defs);
        let db = engine.backend();
        let user = db.add_user("ana");
        db.review(user, None, 3.0);

        let evaluation = engine.try_evaluate(user).unwrap();
        assert_eq!(evaluation.unlocked_ids(), vec![ids::FIRST_REVIEW]);
        assert_eq!(evaluation.failed, vec![AchievementId::new(77)]);
        assert_eq!(db.user_record(user).experience_points, 10);
    }

    #[test]
    fn test_grant_unknown_achievement_is_config_error() {
        let engine = engine();
        let user = engine.backend().add_user("ana");
        let err = engine.grant(user, AchievementId::new(500)).unwrap_err();
        assert!(err.is_config_defect());
    }

    #[test]
    fn test_weekly_marathon() {
        let engine = engine();
        let db = engine.backend();
        let user = db.add_user("ana");
        let now = Utc::now();
        for days in [0, 1, 2, 3] {
            db.review_at(user, None, 3.0, now - Duration::days(days));
        }
        db.review_at(user, None, 3.0, now - Duration::days(8));
        engine.evaluate_at(user, now);
        assert!(!db.grants(user).iter().any(|g| g.achievement == ids::WEEKLY_MARATHON));

        db.review_at(user, None, 3.0, now);
        let evaluation = engine.try_evaluate_at(user, now).unwrap();
        assert_eq!(evaluation.unlocked_ids(), vec![ids::WEEKLY_MARATHON]);
    }

    #[test]
    fn test_unbounded_window_evaluates_without_panic() {
        let mut defs = Definitions::standard();
        defs.config.weekly_window_days = u32::MAX;
        let engine = Engine::with_definitions(MemoryBackend::new(), defs);
        let db = engine.backend();
        let user = db.add_user("ana");
        let now = Utc::now();
        for years in 0..5 {
            db.review_at(user, None, 3.0, now - Duration::days(365 * years));
        }

        let evaluation = engine.try_evaluate_at(user, now).unwrap();
        assert!(evaluation.unlocked_ids().contains(&ids::WEEKLY_MARATHON));
    }

    #[test]
    fn test_rivalry_and_favorite_team() {
        let mut defs = Definitions::standard();
        defs.config.rivalries = vec![Rivalry::new(TeamId(2), TeamId(14))];
        let engine = Engine::with_definitions(MemoryBackend::new(), defs);
        let db = engine.backend();
        let user = db.add_user("ana");
        db.set_favorite_team(user, TeamId(14));
        db.review(user, Some(db.game(14, 2, "Final")), 3.0);

        let mut unlocked = engine.try_evaluate(user).unwrap().unlocked_ids();
        unlocked.sort();
        assert_eq!(
            unlocked,
            vec![ids::FIRST_REVIEW, ids::FAVORITE_TEAM_REVIEW, ids::RIVALRY_GAME]
        );
    }

    #[test]
    fn test_league_coverage() {
        let engine = engine();
        let db = engine.backend();
        let user = db.add_user("ana");
        let long_ago = Utc::now() - Duration::days(60);
        for team in (1..=28).step_by(2) {
            db.review_at(user, Some(db.game(team, team + 1, "Final")), 3.0, long_ago);
        }
        engine.evaluate(user);
        assert!(!db.grants(user).iter().any(|g| g.achievement == ids::LEAGUE_COVERAGE));

        db.review_at(user, Some(db.game(29, 30, "Final")), 3.0, long_ago);
        let evaluation = engine.try_evaluate(user).unwrap();
        assert!(evaluation.unlocked_ids().contains(&ids::LEAGUE_COVERAGE));
    }

    #[test]
    fn test_sum_invariant_across_actions() {
        let engine = engine();
        let db = engine.backend();
        let user = db.add_user("ana");
        let fans: Vec<UserId> = (0..25).map(|i| db.add_user(&format!("fan{}", i))).collect();

        for (i, fan) in fans.iter().enumerate() {
            db.follow(*fan, user);
            if i % 3 == 0 {
                db.review(user, Some(db.game(1, 2, "Final/2OT")), 5.0);
            }
            engine.evaluate(user);
            assert_eq!(db.user_record(user).experience_points, sum_of_grants(&engine, user));
            let record = db.user_record(user);
            assert_eq!(record.tier, engine.tiers().tier_for(record.experience_points));
        }
    }

    #[test]
    fn test_custom_catalog_rewards() {
        let mut defs = Definitions::standard();
        defs.catalog = Catalog::from_defs([AchievementDef::new(ids::FIRST_REVIEW, "Debut", "", 150)]).unwrap();
        defs.rules = RuleSet::new(vec![Rule::new(ids::FIRST_REVIEW, Criterion::ReviewCount(1))]);
        assert!(defs.validate().is_ok());

        let engine = Engine::with_definitions(MemoryBackend::new(), defs);
        let db = engine.backend();
        let user = db.add_user("ana");
        db.review(user, None, 5.0);
        engine.evaluate(user);
        assert_eq!(db.user_record(user).experience_points, 150);
        assert_eq!(db.user_record(user).tier, Tier::RolePlayer);
    }
}
