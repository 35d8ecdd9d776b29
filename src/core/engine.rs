use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::core::validation::ActionSubmission;
use crate::models::{
    Action, ActionKind, ActionOutcome, Caller, Match, MatchDetails, Page, PairKey, Profile,
    ProfileFilter,
};
use crate::services::{MatchStore, ProfileStore, StoreError};

/// Errors returned by engine operations
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Paging bounds for the discover listing
#[derive(Debug, Clone, Copy)]
pub struct DiscoverLimits {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl DiscoverLimits {
    /// Requested limit, defaulted and clamped to `1..=max_limit`
    pub fn resolve(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.default_limit)
            .clamp(1, self.max_limit.max(1))
    }
}

impl Default for DiscoverLimits {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 50,
        }
    }
}

/// Records swipe actions and derives mutual matches
///
/// # Flow
/// 1. Validate the submission and check the caller owns the swiping dog
/// 2. Append the action
/// 3. For likes, look for the reciprocal like
/// 4. Insert the match for the pair unless one already exists
#[derive(Clone)]
pub struct MatchEngine {
    profiles: Arc<dyn ProfileStore>,
    store: Arc<dyn MatchStore>,
    limits: DiscoverLimits,
}

impl MatchEngine {
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        store: Arc<dyn MatchStore>,
        limits: DiscoverLimits,
    ) -> Self {
        Self {
            profiles,
            store,
            limits,
        }
    }

    async fn existing_profile(&self, id: Uuid) -> Result<Profile, EngineError> {
        self.profiles
            .find_profile(id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("dog {} does not exist", id)))
    }

    async fn owned_profile(&self, caller: &Caller, id: Uuid) -> Result<Profile, EngineError> {
        let profile = self.existing_profile(id).await?;
        if !profile.is_owned_by(caller) {
            return Err(EngineError::Forbidden(format!(
                "dog {} does not belong to the caller",
                id
            )));
        }
        Ok(profile)
    }

    /// Append a like or pass. Never deduplicates repeated submissions.
    pub async fn record_action(
        &self,
        caller: &Caller,
        submission: ActionSubmission,
    ) -> Result<Action, EngineError> {
        submission.check()?;
        self.owned_profile(caller, submission.from_profile).await?;
        self.existing_profile(submission.to_profile).await?;

        let action = Action::new(submission.from_profile, submission.to_profile, submission.kind);
        self.store.insert_action(&action).await?;

        tracing::debug!(
            "Recorded action {}: {} -> {} ({})",
            action.id,
            action.from_profile,
            action.to_profile,
            action.kind
        );

        Ok(action)
    }

    /// Return the match for the pair if both sides have liked each other,
    /// creating it on first detection.
    pub async fn derive_match(
        &self,
        from_profile: Uuid,
        to_profile: Uuid,
    ) -> Result<Option<Match>, EngineError> {
        Ok(self.derive(from_profile, to_profile).await?.map(|(m, _)| m))
    }

    async fn derive(
        &self,
        from_profile: Uuid,
        to_profile: Uuid,
    ) -> Result<Option<(Match, bool)>, EngineError> {
        if from_profile == to_profile {
            return Err(EngineError::Validation(
                "a dog cannot match itself".to_string(),
            ));
        }

        let reciprocal = self
            .store
            .find_action(to_profile, from_profile, ActionKind::Like)
            .await?;
        if reciprocal.is_none() {
            return Ok(None);
        }

        let pair = PairKey::new(from_profile, to_profile);
        if let Some(existing) = self.store.find_match(pair).await? {
            return Ok(Some((existing, false)));
        }

        match self.store.insert_match_if_absent(&Match::new(pair)).await {
            Ok((stored, created)) => {
                if created {
                    tracing::info!(
                        "New match {} between {} and {}",
                        stored.id,
                        stored.profile_a,
                        stored.profile_b
                    );
                }
                Ok(Some((stored, created)))
            }
            // Lost a race against a concurrent insert; the pair is matched either way
            Err(StoreError::Conflict(reason)) => {
                tracing::debug!("Match insert conflict for {:?}: {}", pair, reason);
                let existing = self
                    .store
                    .find_match(pair)
                    .await?
                    .ok_or(EngineError::Store(StoreError::Conflict(reason)))?;
                Ok(Some((existing, false)))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Record an action and, for likes, derive the match
    pub async fn submit_action(
        &self,
        caller: &Caller,
        submission: ActionSubmission,
    ) -> Result<ActionOutcome, EngineError> {
        let action = self.record_action(caller, submission).await?;

        let derived = match action.kind {
            ActionKind::Like => self.derive(action.from_profile, action.to_profile).await?,
            ActionKind::Pass => None,
        };

        let match_created = derived.as_ref().map_or(false, |(_, created)| *created);
        Ok(ActionOutcome {
            action,
            matched: derived.map(|(m, _)| m),
            match_created,
        })
    }

    /// Every match involving `profile_id`, with both dogs populated
    pub async fn list_matches(
        &self,
        caller: &Caller,
        profile_id: Uuid,
    ) -> Result<Vec<MatchDetails>, EngineError> {
        self.owned_profile(caller, profile_id).await?;

        let matches = self.store.list_matches(profile_id).await?;
        if matches.is_empty() {
            return Ok(vec![]);
        }

        let ids: Vec<Uuid> = matches
            .iter()
            .flat_map(|m| [m.profile_a, m.profile_b])
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let by_id: HashMap<Uuid, Profile> = self
            .profiles
            .find_profiles(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let lookup = |id: Uuid| {
            by_id
                .get(&id)
                .cloned()
                .ok_or(EngineError::Store(StoreError::MissingReference(id)))
        };

        matches
            .into_iter()
            .map(|m| -> Result<MatchDetails, EngineError> {
                Ok(MatchDetails {
                    id: m.id,
                    profile_a: lookup(m.profile_a)?,
                    profile_b: lookup(m.profile_b)?,
                    created_at: m.created_at,
                })
            })
            .collect()
    }

    /// Dogs other than `profile_id`, newest first
    pub async fn list_discoverable(
        &self,
        caller: &Caller,
        profile_id: Uuid,
        page: u32,
        limit: Option<u32>,
    ) -> Result<Vec<Profile>, EngineError> {
        self.owned_profile(caller, profile_id).await?;

        let page = Page::numbered(page.max(1), self.limits.resolve(limit));
        let profiles = self
            .profiles
            .list_profiles(ProfileFilter::excluding(profile_id), page)
            .await?;

        tracing::debug!(
            "Discover for {}: {} dogs (offset {}, limit {})",
            profile_id,
            profiles.len(),
            page.offset,
            page.limit
        );

        Ok(profiles)
    }
}
