//! Grant and reward application
//!
//! Granting is the only path that changes a user's experience or tier:
//! 1. insert the grant if absent (the idempotence gate),
//! 2. add the achievement's reward, only when the insert happened,
//! 3. recompute the tier.
//!
//! All three run inside the caller's session, so they commit or vanish
//! together.

use crate::catalog::AchievementDef;
use crate::error::{Error, Result};
use crate::session::{ActivitySource, GrantLedger, GrantRecord};
use crate::tier::{Tier, TierTable};
use crate::UserId;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

/// A tier transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierChange {
    pub from: Tier,
    pub to: Tier,
}

/// Result of a grant attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantOutcome {
    /// The grant was recorded and its reward applied
    Granted {
        xp_awarded: u32,
        /// Experience total after the reward
        experience: u64,
        promotion: Option<TierChange>,
    },
    /// A grant for this pair already existed; nothing changed
    AlreadyGranted,
}

impl GrantOutcome {
    pub fn is_granted(&self) -> bool {
        matches!(self, GrantOutcome::Granted { .. })
    }
}

/// Record a grant of `def` to `user` and apply its reward inside `session`
pub fn apply_grant<S>(
    session: &mut S,
    tiers: &TierTable,
    user: UserId,
    def: &AchievementDef,
    at: DateTime<Utc>,
) -> Result<GrantOutcome>
where
    S: ActivitySource + GrantLedger + ?Sized,
{
    let record = GrantRecord::new(user, def.id, at);
    if !session.insert_grant_if_absent(&record)? {
        debug!(user = %user, achievement = %def.id, "Achievement already granted");
        return Ok(GrantOutcome::AlreadyGranted);
    }

    let experience = session.add_experience(user, def.xp_reward)?;
    info!(
        user = %user,
        achievement = %def.id,
        name = %def.name,
        xp = def.xp_reward,
        experience,
        "Achievement granted"
    );

    let promotion = recompute_tier(session, tiers, user)?;
    Ok(GrantOutcome::Granted {
        xp_awarded: def.xp_reward,
        experience,
        promotion,
    })
}

/// Bring a user's stored tier in line with their experience.
///
/// Tiers only move forward. A stored tier above what the experience supports
/// is left untouched and reported, since experience never decreases and such
/// a state means the tier table changed underneath existing users.
pub fn recompute_tier<S>(session: &mut S, tiers: &TierTable, user: UserId) -> Result<Option<TierChange>>
where
    S: ActivitySource + GrantLedger + ?Sized,
{
    let record = session.user(user)?.ok_or(Error::UserNotFound(user))?;
    let target = tiers.tier_for(record.experience_points);

    if target == record.tier {
        return Ok(None);
    }
    if target < record.tier {
        warn!(
            user = %user,
            stored = %record.tier,
            computed = %target,
            experience = record.experience_points,
            "Stored tier above experience; not downgrading"
        );
        return Ok(None);
    }

    session.set_tier(user, target)?;
    info!(user = %user, from = %record.tier, to = %target, "Tier promotion");
    Ok(Some(TierChange {
        from: record.tier,
        to: target,
    }))
}
