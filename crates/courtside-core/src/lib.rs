//! Courtside Core - Achievement engine for a game review network
//!
//! After every qualifying social action (review, follow, comment, like) the
//! engine re-evaluates the rule set against the user's activity, grants newly
//! unlocked achievements exactly once, accumulates experience and recomputes
//! the user's tier.
//!
//! - `Catalog` / `RuleSet` - achievements and the criteria that unlock them
//! - `TierTable` - experience thresholds for the six user tiers
//! - `Aggregator` - builds the `ActivityFacts` bundle rules read
//! - `apply_grant` - idempotent grant, reward and tier recomputation
//! - `Engine` - runs a full evaluation pass against a `Backend`
//! - `Auditor` - checks experience and tier invariants
//!
//! ## Storage
//!
//! Storage is reached only through the traits in [`session`]. A backend must
//! enforce uniqueness of `(user, achievement)` grants at the storage level;
//! see `courtside-db` for the native_db implementation.

mod activity;
mod audit;
pub mod catalog;
mod config;
mod engine;
mod error;
mod facts;
mod grant;
mod identity;
mod rating;
pub mod rule;
pub mod session;
mod tier;

#[cfg(test)]
mod testing;

pub use activity::{GameRecord, ReviewRecord, SideRatings, UserRecord};
pub use audit::{AuditReport, Auditor};
pub use catalog::{AchievementDef, Catalog};
pub use config::{EngineConfig, Rivalry};
pub use engine::{Definitions, Engine, Evaluation, EvaluationStatus, Unlock};
pub use error::{Error, Result};
pub use facts::{ActivityFacts, Aggregator, ReviewFacts, SocialCounts};
pub use grant::{apply_grant, recompute_tier, GrantOutcome, TierChange};
pub use identity::{AchievementId, GameId, ReviewId, TeamId, UserId};
pub use rating::Rating;
pub use rule::{Criterion, Rule, RuleSet};
pub use session::{ActivitySource, Backend, GrantLedger, GrantRecord, Session};
pub use tier::{Tier, TierProgress, TierTable, TierThreshold};
