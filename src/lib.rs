//! PawMatch - like/pass and mutual-match service for the PawSocial dog app
//!
//! Dogs swipe on each other; when two dogs have liked each other a single,
//! symmetric match is recorded for the pair. Storage sits behind the
//! [`services::ProfileStore`] and [`services::MatchStore`] traits, with a
//! PostgreSQL and an in-memory implementation.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{ActionSubmission, EngineError, MatchEngine, ProfileService};
pub use models::{Action, ActionKind, Caller, Match, MatchDetails, PairKey, Profile};
