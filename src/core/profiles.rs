use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::core::engine::EngineError;
use crate::models::{Caller, CreateDogRequest, Location, Page, Profile, ProfileFilter};
use crate::services::ProfileStore;

const OWNED_BATCH: u32 = 100;

/// Dog profile operations used by the app around the matching engine:
/// creation, lookup, "my dogs" and the community feed.
#[derive(Clone)]
pub struct ProfileService {
    profiles: Arc<dyn ProfileStore>,
    feed_limit: u32,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ProfileService {
    pub fn new(profiles: Arc<dyn ProfileStore>, feed_limit: u32) -> Self {
        Self {
            profiles,
            feed_limit: feed_limit.max(1),
        }
    }

    /// Create a dog owned by the caller
    pub async fn create_profile(
        &self,
        caller: &Caller,
        req: CreateDogRequest,
    ) -> Result<Profile, EngineError> {
        req.validate()
            .map_err(|e| EngineError::Validation(e.to_string()))?;

        let name = req.name.trim().to_string();
        if name.is_empty() {
            return Err(EngineError::Validation("name is required".to_string()));
        }

        let profile = Profile {
            id: Uuid::new_v4(),
            owner_id: caller.user_id,
            name,
            age: req.age,
            breed: non_empty(req.breed),
            gender: non_empty(req.gender),
            energy: non_empty(req.energy),
            temperament: req
                .temperament
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            vaccinated: req.vaccinated,
            images: req.images,
            caption: non_empty(req.caption),
            location: Location {
                city: non_empty(req.city),
                zip: non_empty(req.zip),
            },
            created_at: chrono::Utc::now(),
        };

        self.profiles.insert_profile(&profile).await?;
        tracing::info!("Created dog {} ({}) for owner {}", profile.id, profile.name, caller.user_id);

        Ok(profile)
    }

    pub async fn get_profile(&self, id: Uuid) -> Result<Profile, EngineError> {
        self.profiles
            .find_profile(id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("dog {} does not exist", id)))
    }

    /// Every dog owned by the caller, newest first
    pub async fn list_owned(&self, caller: &Caller) -> Result<Vec<Profile>, EngineError> {
        let filter = ProfileFilter::owned_by(caller.user_id);
        let mut owned = Vec::new();
        let mut page = 1;

        loop {
            let batch = self
                .profiles
                .list_profiles(filter, Page::numbered(page, OWNED_BATCH))
                .await?;
            let exhausted = batch.len() < OWNED_BATCH as usize;
            owned.extend(batch);

            if exhausted {
                return Ok(owned);
            }
            page += 1;
        }
    }

    /// Most recent dogs across all owners
    pub async fn community_feed(&self) -> Result<Vec<Profile>, EngineError> {
        Ok(self
            .profiles
            .list_profiles(ProfileFilter::all(), Page::first(self.feed_limit))
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::MemoryStore;

    fn request(name: &str) -> CreateDogRequest {
        CreateDogRequest {
            name: name.to_string(),
            age: Some(4),
            breed: Some("  ".to_string()),
            gender: Some("male".to_string()),
            energy: None,
            temperament: vec!["calm".to_string(), "".to_string()],
            vaccinated: Some(true),
            images: vec![],
            caption: None,
            city: Some("Denver".to_string()),
            zip: None,
        }
    }

    #[tokio::test]
    async fn test_create_assigns_owner_and_trims() {
        let service = ProfileService::new(Arc::new(MemoryStore::new()), 50);
        let caller = Caller::new(Uuid::new_v4());

        let profile = service.create_profile(&caller, request(" Biscuit ")).await.unwrap();
        assert_eq!(profile.owner_id, caller.user_id);
        assert_eq!(profile.name, "Biscuit");
        assert_eq!(profile.breed, None);
        assert_eq!(profile.temperament, vec!["calm".to_string()]);
        assert_eq!(profile.location.city.as_deref(), Some("Denver"));

        let owned = service.list_owned(&caller).await.unwrap();
        assert_eq!(owned.len(), 1);
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let service = ProfileService::new(Arc::new(MemoryStore::new()), 50);
        let caller = Caller::new(Uuid::new_v4());

        let result = service.create_profile(&caller, request("   ")).await;
        assert!(matches!(result, Err(EngineError::Validation(_))));
        assert!(service.community_feed().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_feed_respects_limit() {
        let service = ProfileService::new(Arc::new(MemoryStore::new()), 3);
        let caller = Caller::new(Uuid::new_v4());
        for i in 0..5 {
            service
                .create_profile(&caller, request(&format!("Dog {}", i)))
                .await
                .unwrap();
        }

        assert_eq!(service.community_feed().await.unwrap().len(), 3);
        assert!(matches!(
            service.get_profile(Uuid::new_v4()).await,
            Err(EngineError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_owned_returns_every_dog() {
        let service = ProfileService::new(Arc::new(MemoryStore::new()), 20);
        let caller = Caller::new(Uuid::new_v4());
        let stranger = Caller::new(Uuid::new_v4());
        for i in 0..(OWNED_BATCH + 20) {
            service
                .create_profile(&caller, request(&format!("Dog {}", i)))
                .await
                .unwrap();
        }
        service.create_profile(&stranger, request("Stray")).await.unwrap();

        let owned = service.list_owned(&caller).await.unwrap();
        assert_eq!(owned.len(), (OWNED_BATCH + 20) as usize);
        assert!(owned.iter().all(|p| p.owner_id == caller.user_id));

        let mut ids: Vec<Uuid> = owned.iter().map(|p| p.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), owned.len());
    }
}
