use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;
use uuid::Uuid;

use crate::models::{Action, ActionKind, Location, Match, Page, PairKey, Profile, ProfileFilter};
use crate::services::store::{MatchStore, ProfileStore, StoreError};

const PROFILE_COLUMNS: &str = r#"
    id, owner_id, name, age, breed, gender, energy, temperament,
    vaccinated, images, caption, city, zip, created_at
"#;

/// PostgreSQL-backed store for profiles, actions and matches
///
/// Matches are keyed by the normalized pair `(profile_a, profile_b)` with a
/// unique constraint, so concurrent reciprocal likes cannot create two rows.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect and run pending migrations
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a store from settings, filling in pool defaults
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }
}

fn profile_from_row(row: &PgRow) -> Result<Profile, sqlx::Error> {
    Ok(Profile {
        id: row.try_get("id")?,
        owner_id: row.try_get("owner_id")?,
        name: row.try_get("name")?,
        age: row.try_get("age")?,
        breed: row.try_get("breed")?,
        gender: row.try_get("gender")?,
        energy: row.try_get("energy")?,
        temperament: row.try_get("temperament")?,
        vaccinated: row.try_get("vaccinated")?,
        images: row.try_get("images")?,
        caption: row.try_get("caption")?,
        location: Location {
            city: row.try_get("city")?,
            zip: row.try_get("zip")?,
        },
        created_at: row.try_get("created_at")?,
    })
}

fn action_from_row(row: &PgRow) -> Result<Action, sqlx::Error> {
    Ok(Action {
        id: row.try_get("id")?,
        from_profile: row.try_get("from_profile")?,
        to_profile: row.try_get("to_profile")?,
        kind: row.try_get("kind")?,
        created_at: row.try_get("created_at")?,
    })
}

fn match_from_row(row: &PgRow) -> Result<Match, sqlx::Error> {
    Ok(Match {
        id: row.try_get("id")?,
        profile_a: row.try_get("profile_a")?,
        profile_b: row.try_get("profile_b")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Map unique-key and foreign-key violations to `StoreError::Conflict`
fn classify(err: sqlx::Error) -> StoreError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() || db_err.is_foreign_key_violation() {
            return StoreError::Conflict(db_err.message().to_string());
        }
    }
    StoreError::SqlxError(err)
}

#[async_trait]
impl ProfileStore for PostgresStore {
    async fn insert_profile(&self, profile: &Profile) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO dogs (id, owner_id, name, age, breed, gender, energy, temperament,
                              vaccinated, images, caption, city, zip, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        "#;

        sqlx::query(query)
            .bind(profile.id)
            .bind(profile.owner_id)
            .bind(&profile.name)
            .bind(profile.age)
            .bind(&profile.breed)
            .bind(&profile.gender)
            .bind(&profile.energy)
            .bind(&profile.temperament)
            .bind(profile.vaccinated)
            .bind(&profile.images)
            .bind(&profile.caption)
            .bind(&profile.location.city)
            .bind(&profile.location.zip)
            .bind(profile.created_at)
            .execute(&self.pool)
            .await
            .map_err(classify)?;

        tracing::debug!("Inserted dog {} for owner {}", profile.id, profile.owner_id);
        Ok(())
    }

    async fn find_profile(&self, id: Uuid) -> Result<Option<Profile>, StoreError> {
        let query = format!("SELECT {} FROM dogs WHERE id = $1", PROFILE_COLUMNS);

        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(profile_from_row).transpose()?)
    }

    async fn find_profiles(&self, ids: &[Uuid]) -> Result<Vec<Profile>, StoreError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let query = format!("SELECT {} FROM dogs WHERE id = ANY($1)", PROFILE_COLUMNS);

        let rows = sqlx::query(&query)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        let profiles = rows.iter().map(profile_from_row).collect::<Result<Vec<_>, _>>()?;
        Ok(profiles)
    }

    async fn list_profiles(
        &self,
        filter: ProfileFilter,
        page: Page,
    ) -> Result<Vec<Profile>, StoreError> {
        // NULL parameters disable the corresponding filter
        let query = format!(
            r#"
            SELECT {}
            FROM dogs
            WHERE ($1::uuid IS NULL OR owner_id = $1)
              AND ($2::uuid IS NULL OR id <> $2)
            ORDER BY created_at DESC, id
            LIMIT $3 OFFSET $4
            "#,
            PROFILE_COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(filter.owner_id)
            .bind(filter.exclude_id)
            .bind(i64::from(page.limit))
            .bind(i64::from(page.offset))
            .fetch_all(&self.pool)
            .await?;

        let profiles = rows.iter().map(profile_from_row).collect::<Result<Vec<_>, _>>()?;
        Ok(profiles)
    }
}

#[async_trait]
impl MatchStore for PostgresStore {
    async fn insert_action(&self, action: &Action) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO actions (id, from_profile, to_profile, kind, created_at)
            VALUES ($1, $2, $3, $4, $5)
        "#;

        sqlx::query(query)
            .bind(action.id)
            .bind(action.from_profile)
            .bind(action.to_profile)
            .bind(action.kind)
            .bind(action.created_at)
            .execute(&self.pool)
            .await
            .map_err(classify)?;

        tracing::debug!(
            "Recorded action: {} -> {} ({})",
            action.from_profile,
            action.to_profile,
            action.kind
        );

        Ok(())
    }

    async fn find_action(
        &self,
        from_profile: Uuid,
        to_profile: Uuid,
        kind: ActionKind,
    ) -> Result<Option<Action>, StoreError> {
        let query = r#"
            SELECT id, from_profile, to_profile, kind, created_at
            FROM actions
            WHERE from_profile = $1 AND to_profile = $2 AND kind = $3
            ORDER BY created_at DESC
            LIMIT 1
        "#;

        let row = sqlx::query(query)
            .bind(from_profile)
            .bind(to_profile)
            .bind(kind)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(action_from_row).transpose()?)
    }

    async fn find_match(&self, pair: PairKey) -> Result<Option<Match>, StoreError> {
        let query = r#"
            SELECT id, profile_a, profile_b, created_at
            FROM matches
            WHERE profile_a = $1 AND profile_b = $2
        "#;

        let row = sqlx::query(query)
            .bind(pair.low())
            .bind(pair.high())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(match_from_row).transpose()?)
    }

    async fn insert_match_if_absent(&self, candidate: &Match) -> Result<(Match, bool), StoreError> {
        let pair = candidate.pair();

        // ON CONFLICT returns no row when another request won the race
        let query = r#"
            INSERT INTO matches (id, profile_a, profile_b, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (profile_a, profile_b) DO NOTHING
            RETURNING id, profile_a, profile_b, created_at
        "#;

        let inserted = sqlx::query(query)
            .bind(candidate.id)
            .bind(pair.low())
            .bind(pair.high())
            .bind(candidate.created_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(classify)?;

        if let Some(row) = inserted {
            return Ok((match_from_row(&row)?, true));
        }

        match self.find_match(pair).await? {
            Some(existing) => Ok((existing, false)),
            None => Err(StoreError::Conflict(format!(
                "match for {} / {} neither inserted nor found",
                pair.low(),
                pair.high()
            ))),
        }
    }

    async fn list_matches(&self, profile_id: Uuid) -> Result<Vec<Match>, StoreError> {
        let query = r#"
            SELECT id, profile_a, profile_b, created_at
            FROM matches
            WHERE profile_a = $1 OR profile_b = $1
            ORDER BY created_at DESC
        "#;

        let rows = sqlx::query(query)
            .bind(profile_id)
            .fetch_all(&self.pool)
            .await?;

        let matches = rows.iter().map(match_from_row).collect::<Result<Vec<_>, _>>()?;

        tracing::debug!("Profile {} has {} matches", profile_id, matches.len());
        Ok(matches)
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}
