//! In-memory backend for unit tests
//!
//! One mutex guards the whole state, so sessions are serialized the way a
//! single-writer store serializes write transactions. A session works on a
//! staged copy and swaps it in on commit.

use crate::activity::{GameRecord, ReviewRecord, SideRatings, UserRecord};
use crate::error::{Error, Result};
use crate::session::{ActivitySource, Backend, GrantLedger, GrantRecord, Session};
use crate::{AchievementId, GameId, Rating, ReviewId, TeamId, Tier, UserId};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

/// Route engine logs to the test harness; `RUST_LOG` picks the level.
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    next_id: u64,
    users: BTreeMap<UserId, UserRecord>,
    reviews: Vec<ReviewRecord>,
    comments: BTreeMap<UserId, u64>,
    follows: BTreeSet<(UserId, UserId)>,
    grants: BTreeMap<(UserId, AchievementId), GrantRecord>,
}

impl MemoryState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug, Default)]
pub(crate) struct MemoryBackend {
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap()
    }

    pub fn add_user(&self, username: &str) -> UserId {
        let mut state = self.lock();
        let id = UserId(state.next_id());
        state.users.insert(id, UserRecord::new(id, username));
        id
    }

    pub fn set_favorite_team(&self, user: UserId, team: TeamId) {
        self.lock().users.get_mut(&user).unwrap().favorite_team = Some(team);
    }

    pub fn set_experience(&self, user: UserId, xp: u64) {
        self.lock().users.get_mut(&user).unwrap().experience_points = xp;
    }

    pub fn set_tier(&self, user: UserId, tier: Tier) {
        self.lock().users.get_mut(&user).unwrap().tier = tier;
    }

    pub fn user_record(&self, user: UserId) -> UserRecord {
        self.lock().users[&user].clone()
    }

    pub fn grants(&self, user: UserId) -> Vec<GrantRecord> {
        self.lock()
            .grants
            .values()
            .filter(|g| g.user == user)
            .cloned()
            .collect()
    }

    /// Insert a grant row without touching experience
    pub fn force_grant(&self, user: UserId, achievement: AchievementId) {
        self.lock().grants.insert(
            (user, achievement),
            GrantRecord::new(user, achievement, Utc::now()),
        );
    }

    pub fn game(&self, home: u64, away: u64, status: &str) -> GameRecord {
        let id = GameId(self.lock().next_id());
        GameRecord::new(id, TeamId(home), TeamId(away), status)
    }

    pub fn review(&self, author: UserId, game: Option<GameRecord>, overall: f64) -> ReviewId {
        self.review_at(author, game, overall, Utc::now())
    }

    pub fn review_at(
        &self,
        author: UserId,
        game: Option<GameRecord>,
        overall: f64,
        created_at: DateTime<Utc>,
    ) -> ReviewId {
        let mut state = self.lock();
        let id = ReviewId(state.next_id());
        state.reviews.push(ReviewRecord {
            id,
            author,
            game_id: game.as_ref().map(|g| g.id).unwrap_or(GameId(0)),
            game,
            overall: Rating::from_f64(overall).unwrap(),
            home: SideRatings::default(),
            away: SideRatings::default(),
            like_count: 0,
            created_at,
        });
        id
    }

    pub fn set_likes(&self, review: ReviewId, likes: u64) {
        let mut state = self.lock();
        let record = state.reviews.iter_mut().find(|r| r.id == review).unwrap();
        record.like_count = likes;
    }

    pub fn comment(&self, author: UserId) {
        *self.lock().comments.entry(author).or_insert(0) += 1;
    }

    pub fn follow(&self, follower: UserId, followed: UserId) {
        self.lock().follows.insert((follower, followed));
    }
}

pub(crate) struct MemorySession<'a> {
    guard: MutexGuard<'a, MemoryState>,
    staged: MemoryState,
}

impl Backend for MemoryBackend {
    type Session<'a> = MemorySession<'a>;

    fn begin(&self) -> Result<MemorySession<'_>> {
        let guard = self
            .state
            .lock()
            .map_err(|e| Error::Storage(e.to_string()))?;
        let staged = guard.clone();
        Ok(MemorySession { guard, staged })
    }
}

impl ActivitySource for MemorySession<'_> {
    fn user(&self, id: UserId) -> Result<Option<UserRecord>> {
        Ok(self.staged.users.get(&id).cloned())
    }

    fn reviews_by(&self, author: UserId) -> Result<Vec<ReviewRecord>> {
        Ok(self
            .staged
            .reviews
            .iter()
            .filter(|r| r.author == author)
            .cloned()
            .collect())
    }

    fn comments_authored(&self, author: UserId) -> Result<u64> {
        Ok(self.staged.comments.get(&author).copied().unwrap_or(0))
    }

    fn following_count(&self, user: UserId) -> Result<u64> {
        Ok(self.staged.follows.iter().filter(|(f, _)| *f == user).count() as u64)
    }

    fn follower_count(&self, user: UserId) -> Result<u64> {
        Ok(self.staged.follows.iter().filter(|(_, f)| *f == user).count() as u64)
    }
}

impl GrantLedger for MemorySession<'_> {
    fn granted_achievements(&self, user: UserId) -> Result<BTreeSet<AchievementId>> {
        Ok(self
            .staged
            .grants
            .keys()
            .filter(|(u, _)| *u == user)
            .map(|(_, a)| *a)
            .collect())
    }

    fn grants_for(&self, user: UserId) -> Result<Vec<GrantRecord>> {
        Ok(self
            .staged
            .grants
            .values()
            .filter(|g| g.user == user)
            .cloned()
            .collect())
    }

    fn insert_grant_if_absent(&mut self, grant: &GrantRecord) -> Result<bool> {
        let key = (grant.user, grant.achievement);
        if self.staged.grants.contains_key(&key) {
            return Ok(false);
        }
        self.staged.grants.insert(key, grant.clone());
        Ok(true)
    }

    fn add_experience(&mut self, user: UserId, amount: u32) -> Result<u64> {
        let record = self
            .staged
            .users
            .get_mut(&user)
            .ok_or(Error::UserNotFound(user))?;
        record.experience_points += amount as u64;
        Ok(record.experience_points)
    }

    fn set_tier(&mut self, user: UserId, tier: Tier) -> Result<()> {
        let record = self
            .staged
            .users
            .get_mut(&user)
            .ok_or(Error::UserNotFound(user))?;
        record.tier = tier;
        Ok(())
    }
}

impl Session for MemorySession<'_> {
    fn commit(mut self) -> Result<()> {
        *self.guard = std::mem::take(&mut self.staged);
        Ok(())
    }
}
