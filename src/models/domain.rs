use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Dog profile. Owned by a user, referenced by the matching engine by id only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub age: Option<i16>,
    #[serde(default)]
    pub breed: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub energy: Option<String>,
    #[serde(default)]
    pub temperament: Vec<String>,
    #[serde(default)]
    pub vaccinated: Option<bool>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub location: Location,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    pub fn is_owned_by(&self, caller: &Caller) -> bool {
        self.owner_id == caller.user_id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub zip: Option<String>,
}

/// Verified identity of the user making a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Uuid,
}

impl Caller {
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }
}

/// Direction-carrying swipe decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "action_kind", rename_all = "lowercase")]
pub enum ActionKind {
    Like,
    Pass,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Like => "like",
            ActionKind::Pass => "pass",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "like" => Ok(ActionKind::Like),
            "pass" => Ok(ActionKind::Pass),
            other => Err(format!("unknown action '{}', expected one of: like, pass", other)),
        }
    }
}

/// A single like/pass event from one profile toward another. Never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub id: Uuid,
    pub from_profile: Uuid,
    pub to_profile: Uuid,
    pub kind: ActionKind,
    pub created_at: DateTime<Utc>,
}

impl Action {
    pub fn new(from_profile: Uuid, to_profile: Uuid, kind: ActionKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            from_profile,
            to_profile,
            kind,
            created_at: Utc::now(),
        }
    }
}

/// Unordered pair of profile ids, stored as (low, high)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey {
    low: Uuid,
    high: Uuid,
}

impl PairKey {
    pub fn new(a: Uuid, b: Uuid) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    pub fn low(&self) -> Uuid {
        self.low
    }

    pub fn high(&self) -> Uuid {
        self.high
    }
}

/// Symmetric record of two profiles that liked each other.
///
/// `profile_a` is always the lower id of the pair, so the same two profiles
/// always produce the same stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: Uuid,
    pub profile_a: Uuid,
    pub profile_b: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Match {
    pub fn new(pair: PairKey) -> Self {
        Self {
            id: Uuid::new_v4(),
            profile_a: pair.low(),
            profile_b: pair.high(),
            created_at: Utc::now(),
        }
    }

    pub fn pair(&self) -> PairKey {
        PairKey::new(self.profile_a, self.profile_b)
    }

    pub fn involves(&self, profile_id: Uuid) -> bool {
        self.profile_a == profile_id || self.profile_b == profile_id
    }

    /// The other side of the match, seen from `profile_id`
    pub fn partner_of(&self, profile_id: Uuid) -> Option<Uuid> {
        if self.profile_a == profile_id {
            Some(self.profile_b)
        } else if self.profile_b == profile_id {
            Some(self.profile_a)
        } else {
            None
        }
    }
}

/// Match with both referenced profiles populated
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchDetails {
    pub id: Uuid,
    pub profile_a: Profile,
    pub profile_b: Profile,
    pub created_at: DateTime<Utc>,
}

/// Result of submitting a swipe
#[derive(Debug, Clone)]
pub struct ActionOutcome {
    pub action: Action,
    pub matched: Option<Match>,
    pub match_created: bool,
}

/// Which profiles a listing should return
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileFilter {
    pub owner_id: Option<Uuid>,
    pub exclude_id: Option<Uuid>,
}

impl ProfileFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn owned_by(owner_id: Uuid) -> Self {
        Self {
            owner_id: Some(owner_id),
            exclude_id: None,
        }
    }

    pub fn excluding(profile_id: Uuid) -> Self {
        Self {
            owner_id: None,
            exclude_id: Some(profile_id),
        }
    }

    pub fn accepts(&self, profile: &Profile) -> bool {
        self.owner_id.map_or(true, |owner| profile.owner_id == owner)
            && self.exclude_id.map_or(true, |id| profile.id != id)
    }
}

/// Offset/limit window over a newest-first listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: u32,
    pub limit: u32,
}

impl Page {
    pub fn first(limit: u32) -> Self {
        Self { offset: 0, limit }
    }

    /// Build a page from a 1-based page number
    pub fn numbered(page: u32, limit: u32) -> Self {
        Self {
            offset: page.saturating_sub(1).saturating_mul(limit),
            limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_key_is_order_independent() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(PairKey::new(a, b), PairKey::new(b, a));
        assert!(PairKey::new(a, b).low() <= PairKey::new(a, b).high());
    }

    #[test]
    fn test_action_kind_parsing() {
        assert_eq!("like".parse::<ActionKind>(), Ok(ActionKind::Like));
        assert_eq!(" PASS ".parse::<ActionKind>(), Ok(ActionKind::Pass));
        assert!("superlike".parse::<ActionKind>().is_err());
    }

    #[test]
    fn test_match_partner() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let m = Match::new(PairKey::new(a, b));
        assert_eq!(m.partner_of(a), Some(b));
        assert_eq!(m.partner_of(b), Some(a));
        assert_eq!(m.partner_of(Uuid::new_v4()), None);
    }

    #[test]
    fn test_numbered_page() {
        assert_eq!(Page::numbered(1, 20), Page { offset: 0, limit: 20 });
        assert_eq!(Page::numbered(3, 20), Page { offset: 40, limit: 20 });
        assert_eq!(Page::numbered(0, 20), Page { offset: 0, limit: 20 });
    }
}
