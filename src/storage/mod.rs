// Local profile cache: repository seam plus in-memory and fallback implementations

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, RwLock};
use thiserror::Error;

use crate::models::UserProfile;

/// Key the profile record is stored under
pub const PROFILE_KEY: &str = "userData";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Local storage unavailable: {0}")]
    Unavailable(String),
    #[error("Stored profile is corrupt: {0}")]
    Corrupt(String),
}

/// Durable home of the single profile record. Saves overwrite the whole record.
pub trait ProfileRepository: Send + Sync {
    fn load(&self) -> Result<Option<UserProfile>, StorageError>;

    fn save(&self, profile: &UserProfile) -> Result<(), StorageError>;
}

/// Profile kept only for the life of the process
#[derive(Debug, Default)]
pub struct InMemoryProfileRepository {
    profile: RwLock<Option<UserProfile>>,
}

impl InMemoryProfileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(profile: UserProfile) -> Self {
        Self {
            profile: RwLock::new(Some(profile)),
        }
    }
}

impl ProfileRepository for InMemoryProfileRepository {
    fn load(&self) -> Result<Option<UserProfile>, StorageError> {
        let profile = self
            .profile
            .read()
            .map_err(|_| StorageError::Unavailable("profile lock poisoned".to_string()))?;
        Ok(profile.clone())
    }

    fn save(&self, profile: &UserProfile) -> Result<(), StorageError> {
        let mut slot = self
            .profile
            .write()
            .map_err(|_| StorageError::Unavailable("profile lock poisoned".to_string()))?;
        *slot = Some(profile.clone());
        Ok(())
    }
}

/// Wraps a durable repository and degrades to memory when it becomes unavailable.
///
/// Once degraded, every later call is served from memory for the rest of the
/// session and `warning()` describes what happened. An unreadable record is not
/// a reason to degrade: it loads as no profile and the next save overwrites it.
pub struct FallbackProfileRepository<R> {
    primary: R,
    memory: InMemoryProfileRepository,
    degraded: AtomicBool,
    warning: Mutex<Option<String>>,
}

impl<R: ProfileRepository> FallbackProfileRepository<R> {
    pub fn new(primary: R) -> Self {
        Self {
            primary,
            memory: InMemoryProfileRepository::new(),
            degraded: AtomicBool::new(false),
            warning: Mutex::new(None),
        }
    }

    /// Start in memory-only mode, e.g. when the durable store could not be opened
    pub fn degraded(primary: R, reason: impl Into<String>) -> Self {
        let repo = Self::new(primary);
        repo.degrade(reason.into());
        repo
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::SeqCst)
    }

    /// User-facing warning about the local store, if any
    pub fn warning(&self) -> Option<String> {
        self.warning.lock().ok().and_then(|w| w.clone())
    }

    fn set_warning(&self, message: String) {
        if let Ok(mut warning) = self.warning.lock() {
            *warning = Some(message);
        }
    }

    fn degrade(&self, reason: String) {
        tracing::warn!("Local storage unavailable, keeping profile in memory: {}", reason);
        if !self.degraded.swap(true, Ordering::SeqCst) {
            self.set_warning(format!(
                "Local storage unavailable ({reason}); changes will not survive a restart"
            ));
        }
    }

    fn handle(&self, error: StorageError) {
        match error {
            StorageError::Unavailable(reason) => self.degrade(reason),
            StorageError::Corrupt(reason) => {
                tracing::warn!("Ignoring unreadable stored profile: {}", reason);
                self.set_warning("Saved profile could not be read and will be replaced".to_string());
            }
        }
    }
}

impl<R: ProfileRepository> ProfileRepository for FallbackProfileRepository<R> {
    fn load(&self) -> Result<Option<UserProfile>, StorageError> {
        if self.is_degraded() {
            return self.memory.load();
        }
        match self.primary.load() {
            Ok(profile) => {
                if let Some(ref p) = profile {
                    self.memory.save(p)?;
                }
                Ok(profile)
            }
            Err(e) => {
                self.handle(e);
                self.memory.load()
            }
        }
    }

    fn save(&self, profile: &UserProfile) -> Result<(), StorageError> {
        self.memory.save(profile)?;
        if self.is_degraded() {
            return Ok(());
        }
        if let Err(e) = self.primary.save(profile) {
            self.handle(e);
        }
        Ok(())
    }
}

impl<T: ProfileRepository + ?Sized> ProfileRepository for std::sync::Arc<T> {
    fn load(&self) -> Result<Option<UserProfile>, StorageError> {
        (**self).load()
    }

    fn save(&self, profile: &UserProfile) -> Result<(), StorageError> {
        (**self).save(profile)
    }
}
