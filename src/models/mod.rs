// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    Action, ActionKind, ActionOutcome, Caller, Location, Match, MatchDetails, Page, PairKey,
    Profile, ProfileFilter,
};
pub use requests::{CreateDogRequest, DiscoverQuery, RecordActionRequest};
pub use responses::{ActionResponse, ErrorResponse, HealthResponse};
