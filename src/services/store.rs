use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Action, ActionKind, Match, Page, PairKey, Profile, ProfileFilter};

/// Errors raised by a storage backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Constraint violation: {0}")]
    Conflict(String),

    #[error("Record references missing profile {0}")]
    MissingReference(Uuid),
}

/// Persistence for dog profiles
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn insert_profile(&self, profile: &Profile) -> Result<(), StoreError>;

    async fn find_profile(&self, id: Uuid) -> Result<Option<Profile>, StoreError>;

    /// Fetch several profiles at once. Unknown ids are left out of the result.
    async fn find_profiles(&self, ids: &[Uuid]) -> Result<Vec<Profile>, StoreError>;

    /// Newest-first listing
    async fn list_profiles(
        &self,
        filter: ProfileFilter,
        page: Page,
    ) -> Result<Vec<Profile>, StoreError>;
}

/// Persistence for swipe actions and matches
#[async_trait]
pub trait MatchStore: Send + Sync {
    async fn insert_action(&self, action: &Action) -> Result<(), StoreError>;

    /// Most recent action from `from_profile` toward `to_profile` of the given kind
    async fn find_action(
        &self,
        from_profile: Uuid,
        to_profile: Uuid,
        kind: ActionKind,
    ) -> Result<Option<Action>, StoreError>;

    async fn find_match(&self, pair: PairKey) -> Result<Option<Match>, StoreError>;

    /// Store `candidate` unless a match for the same pair already exists.
    ///
    /// Returns the stored match and whether it was newly created. The check
    /// and the insert are a single atomic step.
    async fn insert_match_if_absent(&self, candidate: &Match) -> Result<(Match, bool), StoreError>;

    /// Newest-first matches involving `profile_id`
    async fn list_matches(&self, profile_id: Uuid) -> Result<Vec<Match>, StoreError>;

    async fn health_check(&self) -> Result<bool, StoreError>;
}
