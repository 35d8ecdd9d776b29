use async_trait::async_trait;
use moka::future::{Cache, CacheBuilder};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::models::{Page, Profile, ProfileFilter};
use crate::services::store::{ProfileStore, StoreError};

/// Read-through cache in front of a profile store
///
/// Profiles are never updated after creation, so single-profile lookups are
/// served from memory once loaded. Listings always go to the backing store.
pub struct ProfileCache {
    inner: Arc<dyn ProfileStore>,
    profiles: Cache<Uuid, Profile>,
}

impl ProfileCache {
    pub fn new(inner: Arc<dyn ProfileStore>, max_entries: u64, ttl_secs: u64) -> Self {
        let profiles = CacheBuilder::new(max_entries)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { inner, profiles }
    }
}

#[async_trait]
impl ProfileStore for ProfileCache {
    async fn insert_profile(&self, profile: &Profile) -> Result<(), StoreError> {
        self.inner.insert_profile(profile).await?;
        self.profiles.insert(profile.id, profile.clone()).await;
        Ok(())
    }

    async fn find_profile(&self, id: Uuid) -> Result<Option<Profile>, StoreError> {
        if let Some(profile) = self.profiles.get(&id).await {
            tracing::trace!("Profile cache hit: {}", id);
            return Ok(Some(profile));
        }

        let found = self.inner.find_profile(id).await?;
        if let Some(profile) = &found {
            self.profiles.insert(id, profile.clone()).await;
        }
        Ok(found)
    }

    async fn find_profiles(&self, ids: &[Uuid]) -> Result<Vec<Profile>, StoreError> {
        let mut found = Vec::with_capacity(ids.len());
        let mut missing = Vec::new();

        for id in ids {
            match self.profiles.get(id).await {
                Some(profile) => found.push(profile),
                None => missing.push(*id),
            }
        }

        if !missing.is_empty() {
            tracing::trace!("Profile cache miss for {} ids", missing.len());
            for profile in self.inner.find_profiles(&missing).await? {
                self.profiles.insert(profile.id, profile.clone()).await;
                found.push(profile);
            }
        }

        Ok(found)
    }

    async fn list_profiles(
        &self,
        filter: ProfileFilter,
        page: Page,
    ) -> Result<Vec<Profile>, StoreError> {
        self.inner.list_profiles(filter, page).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Location;
    use crate::services::memory::MemoryStore;

    fn dog(name: &str) -> Profile {
        Profile {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            name: name.to_string(),
            age: None,
            breed: Some("beagle".to_string()),
            gender: None,
            energy: Some("high".to_string()),
            temperament: vec!["playful".to_string()],
            vaccinated: None,
            images: vec![],
            caption: None,
            location: Location::default(),
            created_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_read_through_lookup() {
        let backing = Arc::new(MemoryStore::new());
        let rex = dog("Rex");
        backing.insert_profile(&rex).await.unwrap();

        let cache = ProfileCache::new(backing.clone(), 100, 60);
        assert_eq!(cache.find_profile(rex.id).await.unwrap(), Some(rex.clone()));
        assert!(cache.find_profile(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_batch_lookup_mixes_hits_and_misses() {
        let backing = Arc::new(MemoryStore::new());
        let rex = dog("Rex");
        let luna = dog("Luna");
        backing.insert_profile(&rex).await.unwrap();
        backing.insert_profile(&luna).await.unwrap();

        let cache = ProfileCache::new(backing, 100, 60);
        cache.find_profile(rex.id).await.unwrap();

        let found = cache
            .find_profiles(&[rex.id, luna.id, Uuid::new_v4()])
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().any(|p| p.id == luna.id));
    }
}
