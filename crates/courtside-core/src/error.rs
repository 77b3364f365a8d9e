//! Error types for courtside-core

use crate::{AchievementId, UserId};
use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    /// A rule or grant referenced an achievement missing from the catalog.
    ///
    /// This is a deployment defect (catalog and rule set out of sync), never a
    /// property of user data.
    #[error("Achievement not in catalog: {0}")]
    UnknownAchievement(AchievementId),

    #[error("User not found: {0}")]
    UserNotFound(UserId),

    #[error("Invalid rating: {0}")]
    InvalidRating(f64),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failure reported by the storage collaborator.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl Error {
    /// Whether this error indicates a catalog/rule mismatch rather than a
    /// runtime condition
    pub fn is_config_defect(&self) -> bool {
        matches!(self, Error::UnknownAchievement(_) | Error::InvalidConfig(_))
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
