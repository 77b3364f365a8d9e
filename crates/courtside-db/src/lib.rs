//! Courtside DB - Database layer using native_db
//!
//! Provides persistent storage for:
//! - Users, their experience and tier
//! - Games, reviews, follows, comments and likes
//! - The seeded achievement catalog and the grant table
//!
//! [`Store`] implements the engine's storage seam: every engine session is a
//! native_db read-write transaction, and grants are keyed by
//! `(user, achievement)` so storage itself rejects a second grant.
//! [`Courtside`] runs the social actions and evaluates achievements after each.

mod error;
mod models;
mod queries;
mod session;
mod social;
mod store;

pub use error::{Error, Result};
pub use models::{StoredComment, StoredReview};
pub use queries::UnlockedAchievement;
pub use session::DbSession;
pub use social::{Courtside, NewReview};
pub use store::Store;
