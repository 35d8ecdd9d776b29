// Service exports
pub mod auth;
pub mod cache;
pub mod memory;
pub mod postgres;
pub mod store;

pub use auth::{AuthError, TokenVerifier};
pub use cache::ProfileCache;
pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use store::{MatchStore, ProfileStore, StoreError};
