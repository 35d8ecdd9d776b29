use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to record a like or pass
///
/// Missing fields deserialize to empty strings so they are reported as
/// validation errors rather than JSON errors.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RecordActionRequest {
    #[validate(length(min = 1, message = "fromDog is required"))]
    #[serde(default, rename = "fromDog", alias = "from_dog")]
    pub from_dog: String,
    #[validate(length(min = 1, message = "toDog is required"))]
    #[serde(default, rename = "toDog", alias = "to_dog")]
    pub to_dog: String,
    #[validate(length(min = 1, message = "action is required"))]
    #[serde(default)]
    pub action: String,
}

/// Request to create a dog profile
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateDogRequest {
    #[validate(length(min = 1, max = 100))]
    #[serde(default)]
    pub name: String,
    #[validate(range(min = 0, max = 40))]
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
    pub city: Option<String>,
    #[serde(default)]
    pub zip: Option<String>,
}

/// Paging parameters for the discover listing
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DiscoverQuery {
    #[validate(range(min = 1))]
    #[serde(default = "default_page")]
    pub page: u32,
    #[validate(range(min = 1))]
    #[serde(default)]
    pub limit: Option<u32>,
}

fn default_page() -> u32 {
    1
}

impl Default for DiscoverQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: None,
        }
    }
}
