use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{Action, ActionKind, Match, Page, PairKey, Profile, ProfileFilter};
use crate::services::store::{MatchStore, ProfileStore, StoreError};

#[derive(Default)]
struct MemoryState {
    profiles: HashMap<Uuid, Profile>,
    actions: Vec<Action>,
    matches: HashMap<PairKey, Match>,
}

/// In-process store for development and tests
///
/// Everything lives behind one lock, so `insert_match_if_absent` is atomic.
/// Data is lost when the process exits.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored actions (for diagnostics and tests)
    pub async fn action_count(&self) -> usize {
        self.state.read().await.actions.len()
    }

    /// Number of stored matches (for diagnostics and tests)
    pub async fn match_count(&self) -> usize {
        self.state.read().await.matches.len()
    }
}

fn newest_first<T, F>(items: &mut [T], key: F)
where
    F: Fn(&T) -> (chrono::DateTime<chrono::Utc>, Uuid),
{
    items.sort_by(|a, b| {
        let (a_at, a_id) = key(a);
        let (b_at, b_id) = key(b);
        b_at.cmp(&a_at).then_with(|| a_id.cmp(&b_id))
    });
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn insert_profile(&self, profile: &Profile) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if state.profiles.contains_key(&profile.id) {
            return Err(StoreError::Conflict(format!("dog {} already exists", profile.id)));
        }
        state.profiles.insert(profile.id, profile.clone());
        Ok(())
    }

    async fn find_profile(&self, id: Uuid) -> Result<Option<Profile>, StoreError> {
        Ok(self.state.read().await.profiles.get(&id).cloned())
    }

    async fn find_profiles(&self, ids: &[Uuid]) -> Result<Vec<Profile>, StoreError> {
        let state = self.state.read().await;
        Ok(ids.iter().filter_map(|id| state.profiles.get(id).cloned()).collect())
    }

    async fn list_profiles(
        &self,
        filter: ProfileFilter,
        page: Page,
    ) -> Result<Vec<Profile>, StoreError> {
        let state = self.state.read().await;
        let mut profiles: Vec<Profile> = state
            .profiles
            .values()
            .filter(|p| filter.accepts(p))
            .cloned()
            .collect();
        newest_first(&mut profiles, |p| (p.created_at, p.id));

        Ok(profiles
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .collect())
    }
}

#[async_trait]
impl MatchStore for MemoryStore {
    async fn insert_action(&self, action: &Action) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        for id in [action.from_profile, action.to_profile] {
            if !state.profiles.contains_key(&id) {
                return Err(StoreError::MissingReference(id));
            }
        }
        state.actions.push(action.clone());
        Ok(())
    }

    async fn find_action(
        &self,
        from_profile: Uuid,
        to_profile: Uuid,
        kind: ActionKind,
    ) -> Result<Option<Action>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .actions
            .iter()
            .rev()
            .find(|a| a.from_profile == from_profile && a.to_profile == to_profile && a.kind == kind)
            .cloned())
    }

    async fn find_match(&self, pair: PairKey) -> Result<Option<Match>, StoreError> {
        Ok(self.state.read().await.matches.get(&pair).cloned())
    }

    async fn insert_match_if_absent(&self, candidate: &Match) -> Result<(Match, bool), StoreError> {
        let mut state = self.state.write().await;
        let pair = candidate.pair();
        if let Some(existing) = state.matches.get(&pair) {
            return Ok((existing.clone(), false));
        }

        let stored = Match {
            profile_a: pair.low(),
            profile_b: pair.high(),
            ..candidate.clone()
        };
        state.matches.insert(pair, stored.clone());
        Ok((stored, true))
    }

    async fn list_matches(&self, profile_id: Uuid) -> Result<Vec<Match>, StoreError> {
        let state = self.state.read().await;
        let mut matches: Vec<Match> = state
            .matches
            .values()
            .filter(|m| m.involves(profile_id))
            .cloned()
            .collect();
        newest_first(&mut matches, |m| (m.created_at, m.id));
        Ok(matches)
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Location;

    fn dog(owner: Uuid, name: &str) -> Profile {
        Profile {
            id: Uuid::new_v4(),
            owner_id: owner,
            name: name.to_string(),
            age: Some(3),
            breed: None,
            gender: None,
            energy: None,
            temperament: vec![],
            vaccinated: Some(true),
            images: vec![],
            caption: None,
            location: Location::default(),
            created_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_match_if_absent_keeps_first() {
        let store = MemoryStore::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let (first, created) = store
            .insert_match_if_absent(&Match::new(PairKey::new(a, b)))
            .await
            .unwrap();
        assert!(created);

        let (second, created) = store
            .insert_match_if_absent(&Match::new(PairKey::new(b, a)))
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(first.id, second.id);
        assert_eq!(store.match_count().await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_racing_inserts_create_exactly_one_match() {
        const RACERS: usize = 16;

        let store = std::sync::Arc::new(MemoryStore::new());
        let pair = PairKey::new(Uuid::new_v4(), Uuid::new_v4());
        let start = std::sync::Arc::new(tokio::sync::Barrier::new(RACERS));

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..RACERS {
            let store = store.clone();
            let start = start.clone();
            tasks.spawn(async move {
                start.wait().await;
                store.insert_match_if_absent(&Match::new(pair)).await
            });
        }

        let mut created = 0;
        let mut ids = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let (stored, was_created) = joined.unwrap().unwrap();
            if was_created {
                created += 1;
            }
            ids.push(stored.id);
        }

        assert_eq!(created, 1);
        assert!(ids.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(store.match_count().await, 1);
    }

    #[tokio::test]
    async fn test_action_requires_known_profiles() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let rex = dog(owner, "Rex");
        store.insert_profile(&rex).await.unwrap();

        let stranger = Uuid::new_v4();
        let result = store
            .insert_action(&Action::new(rex.id, stranger, ActionKind::Like))
            .await;
        assert!(matches!(result, Err(StoreError::MissingReference(id)) if id == stranger));
        assert_eq!(store.action_count().await, 0);
    }

    #[tokio::test]
    async fn test_list_profiles_filters_and_pages() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();
        let mine = dog(owner, "Mine");
        store.insert_profile(&mine).await.unwrap();
        for i in 0..5 {
            store.insert_profile(&dog(other, &format!("Dog {}", i))).await.unwrap();
        }

        let owned = store
            .list_profiles(ProfileFilter::owned_by(owner), Page::first(10))
            .await
            .unwrap();
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].id, mine.id);

        let first = store
            .list_profiles(ProfileFilter::excluding(mine.id), Page::numbered(1, 3))
            .await
            .unwrap();
        let second = store
            .list_profiles(ProfileFilter::excluding(mine.id), Page::numbered(2, 3))
            .await
            .unwrap();
        assert_eq!(first.len(), 3);
        assert_eq!(second.len(), 2);
        assert!(first.iter().chain(second.iter()).all(|p| p.id != mine.id));
    }
}
