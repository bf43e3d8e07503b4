//! Core of the FitTrack client: identity session, profile cache, onboarding,
//! workout sessions and the dashboard state machine.

pub mod auth;
pub mod models;
pub mod services;
pub mod storage;

pub use auth::{AuthError, AuthGateway, Identity, SessionStore};
pub use models::UserProfile;
pub use storage::{ProfileRepository, StorageError};
