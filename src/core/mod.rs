// Core engine exports
pub mod engine;
pub mod profiles;
pub mod validation;

pub use engine::{DiscoverLimits, EngineError, MatchEngine};
pub use profiles::ProfileService;
pub use validation::{parse_profile_id, ActionSubmission};
