//! Database store wrapper.

use crate::error::{Error, Result};
use crate::models::*;
use courtside_core::{Catalog, GameRecord, TeamId, UserId, UserRecord};
use native_db::transaction::RwTransaction;
use native_db::*;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, info};

// Static models for the database
static MODELS: LazyLock<Models> = LazyLock::new(|| {
    let mut models = Models::new();
    models.define::<StoredUser>().unwrap();
    models.define::<StoredAchievement>().unwrap();
    models.define::<StoredGrant>().unwrap();
    models.define::<StoredSequence>().unwrap();
    models.define::<StoredGame>().unwrap();
    models.define::<StoredReview>().unwrap();
    models.define::<StoredFollow>().unwrap();
    models.define::<StoredComment>().unwrap();
    models.define::<StoredLike>().unwrap();
    models
});

/// Database store for users, activity and grants.
pub struct Store {
    pub(crate) db: Database<'static>,
}

impl Store {
    /// Open or create a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Builder::new()
            .create(&MODELS, path.as_ref())
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(Self { db })
    }

    /// Create an in-memory database.
    pub fn in_memory() -> Result<Self> {
        let db = Builder::new()
            .create_in_memory(&MODELS)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(Self { db })
    }

    /// Seed the achievement table from a catalog.
    ///
    /// Existing rows are left alone, so seeding on every startup is safe.
    /// Returns the number of definitions inserted.
    pub fn seed_catalog(&self, catalog: &Catalog) -> Result<usize> {
        let rw = self.db.rw_transaction()?;
        let mut inserted = 0;
        for def in catalog.iter() {
            let existing: Option<StoredAchievement> = rw.get().primary(def.id.raw())?;
            if existing.is_none() {
                rw.insert(StoredAchievement::from_def(def))?;
                inserted += 1;
            }
        }
        rw.commit()?;
        if inserted > 0 {
            info!(inserted, total = catalog.len(), "Seeded achievement catalog");
        }
        Ok(inserted)
    }

    /// Register a new user as a Rookie with no experience.
    pub fn create_user(&self, username: &str, favorite_team: Option<TeamId>) -> Result<UserId> {
        if username.trim().is_empty() {
            return Err(Error::Invalid("username must not be empty".into()));
        }
        let rw = self.db.rw_transaction()?;
        let id = UserId::new(next_id(&rw, "user")?);
        let mut record = UserRecord::new(id, username);
        record.favorite_team = favorite_team;
        rw.insert(StoredUser::from_record(&record))?;
        rw.commit()?;
        debug!(user = %id, username, "User created");
        Ok(id)
    }

    /// Change a user's favorite team.
    pub fn set_favorite_team(&self, user: UserId, team: Option<TeamId>) -> Result<()> {
        let rw = self.db.rw_transaction()?;
        let current: StoredUser = rw
            .get()
            .primary(user.raw())?
            .ok_or_else(|| Error::NotFound(user.to_string()))?;
        let mut updated = current.clone();
        updated.favorite_team_id = team.map(|t| t.raw());
        rw.update(current, updated)?;
        rw.commit()?;
        Ok(())
    }

    /// Load a user by ID.
    pub fn load_user(&self, user: UserId) -> Result<Option<UserRecord>> {
        let r = self.db.r_transaction()?;
        let stored: Option<StoredUser> = r.get().primary(user.raw())?;
        Ok(stored.map(|s| s.to_record()))
    }

    /// Load a user by username.
    pub fn find_user(&self, username: &str) -> Result<Option<UserRecord>> {
        let r = self.db.r_transaction()?;
        let stored: Option<StoredUser> = r
            .get()
            .secondary(StoredUserKey::username, username.to_string())?;
        Ok(stored.map(|s| s.to_record()))
    }

    /// Insert or refresh a game from the statistics provider.
    pub fn save_game(&self, game: &GameRecord) -> Result<()> {
        let rw = self.db.rw_transaction()?;
        rw.upsert(StoredGame::from_record(game))?;
        rw.commit()?;
        Ok(())
    }

    /// Load a game by ID.
    pub fn load_game(&self, id: courtside_core::GameId) -> Result<Option<GameRecord>> {
        let r = self.db.r_transaction()?;
        let stored: Option<StoredGame> = r.get().primary(id.raw())?;
        Ok(stored.map(|s| s.to_record()))
    }

    /// Remove a game. Reviews of it stay and lose their game facts.
    pub fn delete_game(&self, id: courtside_core::GameId) -> Result<()> {
        let rw = self.db.rw_transaction()?;
        let stored: Option<StoredGame> = rw.get().primary(id.raw())?;
        if let Some(s) = stored {
            rw.remove(s)?;
        }
        rw.commit()?;
        Ok(())
    }
}

/// Hand out the next ID of a named sequence inside `rw`.
pub(crate) fn next_id(rw: &RwTransaction<'_>, name: &str) -> Result<u64> {
    let current: Option<StoredSequence> = rw.get().primary(name.to_string())?;
    let next = match current {
        Some(seq) => {
            let mut updated = seq.clone();
            updated.last += 1;
            let next = updated.last;
            rw.update(seq, updated)?;
            next
        }
        None => {
            rw.insert(StoredSequence {
                name: name.to_string(),
                last: 1,
            })?;
            1
        }
    };
    Ok(next)
}
