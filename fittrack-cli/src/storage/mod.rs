// Local storage backed by the sled embedded database

use anyhow::{Context, Result};
use fittrack::models::{UserProfile, WeeklyActivity, WeightLog, WeightSample};
use fittrack::storage::{
    FallbackProfileRepository, InMemoryProfileRepository, ProfileRepository, StorageError, PROFILE_KEY,
};
use serde::{Deserialize, Serialize};
use sled::Db;
use std::path::PathBuf;
use std::sync::Arc;

const PROFILE_TREE: &str = "profile";
const ACTIVITY_TREE: &str = "activity";
const WEIGHTS_TREE: &str = "weights";

const ACTIVITY_KEY: &str = "weekly";

/// Stored weekly counters. The goal itself always comes from the config.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredActivity {
    weekly_streak: u32,
    completed_this_week: u32,
}

/// Storage manager for the local embedded database
pub struct Storage {
    db: Db,
}

impl Storage {
    /// Database directory (<config dir>/db, or $FITTRACK_DB_PATH)
    pub fn db_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var("FITTRACK_DB_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_dir = crate::config::Config::config_dir()?;
        Ok(config_dir.join("db"))
    }

    /// Initialize storage with sled database
    pub fn init() -> Result<Self> {
        Self::init_with_path(Self::db_path()?)
    }

    /// Initialize storage at a custom path
    pub fn init_with_path(path: PathBuf) -> Result<Self> {
        tracing::debug!("Opening sled database at {:?}", path);

        let db = sled::open(path).context("Failed to open sled database")?;

        Ok(Self { db })
    }

    /// Throwaway database, removed on drop
    pub fn temporary() -> Result<Self> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .context("Failed to open temporary database")?;
        Ok(Self { db })
    }

    fn tree(&self, name: &str) -> Result<sled::Tree> {
        self.db
            .open_tree(name)
            .with_context(|| format!("Failed to open {} tree", name))
    }

    /// Load the weekly counters, applying the configured goal
    pub fn load_activity(&self, weekly_goal: u32) -> Result<WeeklyActivity> {
        let tree = self.tree(ACTIVITY_TREE)?;

        match tree.get(ACTIVITY_KEY).context("Failed to read weekly activity")? {
            Some(value) => {
                let stored: StoredActivity =
                    serde_json::from_slice(&value).context("Failed to deserialize weekly activity")?;
                Ok(WeeklyActivity::from_parts(
                    stored.weekly_streak,
                    stored.completed_this_week,
                    weekly_goal,
                ))
            }
            None => Ok(WeeklyActivity::with_goal(weekly_goal)),
        }
    }

    pub fn save_activity(&self, activity: &WeeklyActivity) -> Result<()> {
        let tree = self.tree(ACTIVITY_TREE)?;

        let value = serde_json::to_vec(&StoredActivity {
            weekly_streak: activity.weekly_streak(),
            completed_this_week: activity.completed_this_week(),
        })
        .context("Failed to serialize weekly activity")?;

        tree.insert(ACTIVITY_KEY, value)
            .context("Failed to save weekly activity")?;

        self.db.flush().context("Failed to flush database")?;

        tracing::debug!(
            "Saved weekly activity (streak {}, {} this week)",
            activity.weekly_streak(),
            activity.completed_this_week()
        );
        Ok(())
    }

    /// Weight history ordered by week
    pub fn load_weights(&self) -> Result<WeightLog> {
        let tree = self.tree(WEIGHTS_TREE)?;

        let mut samples = Vec::new();

        for item in tree.iter() {
            let (_key, value) = item.context("Failed to iterate weights")?;
            let sample: WeightSample =
                serde_json::from_slice(&value).context("Failed to deserialize weight sample")?;
            samples.push(sample);
        }

        Ok(WeightLog::from_samples(samples))
    }

    /// Write one sample, keyed by its week
    pub fn save_weight(&self, sample: &WeightSample) -> Result<()> {
        let tree = self.tree(WEIGHTS_TREE)?;

        let value = serde_json::to_vec(sample).context("Failed to serialize weight sample")?;

        tree.insert(sample.week_index.to_be_bytes(), value)
            .context("Failed to save weight sample")?;

        self.db.flush().context("Failed to flush database")?;

        tracing::debug!("Saved weight for week {}", sample.week_index);
        Ok(())
    }

    /// Forget weekly activity and weight history
    pub fn clear_progress(&self) -> Result<()> {
        for name in [ACTIVITY_TREE, WEIGHTS_TREE] {
            self.tree(name)?
                .clear()
                .with_context(|| format!("Failed to clear {} tree", name))?;
        }
        Ok(())
    }

    /// Write every sample in the log
    pub fn save_weights(&self, log: &WeightLog) -> Result<()> {
        for sample in log.samples() {
            self.save_weight(sample)?;
        }
        Ok(())
    }
}

impl ProfileRepository for Storage {
    fn load(&self) -> Result<Option<UserProfile>, StorageError> {
        let tree = self
            .db
            .open_tree(PROFILE_TREE)
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;

        let Some(value) = tree
            .get(PROFILE_KEY)
            .map_err(|e| StorageError::Unavailable(e.to_string()))?
        else {
            return Ok(None);
        };

        serde_json::from_slice(&value)
            .map(Some)
            .map_err(|e| StorageError::Corrupt(e.to_string()))
    }

    fn save(&self, profile: &UserProfile) -> Result<(), StorageError> {
        let value = serde_json::to_vec(profile).map_err(|e| StorageError::Corrupt(e.to_string()))?;

        let tree = self
            .db
            .open_tree(PROFILE_TREE)
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;

        let previous = tree
            .insert(PROFILE_KEY, value)
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;

        // Streak and weights belong to whoever owned the replaced profile
        let previous_uid = previous
            .and_then(|v| serde_json::from_slice::<UserProfile>(&v).ok())
            .and_then(|p| p.uid);
        if let (Some(old), Some(new)) = (&previous_uid, &profile.uid) {
            if old != new {
                self.clear_progress()
                    .map_err(|e| StorageError::Unavailable(format!("{:#}", e)))?;
                tracing::info!("Profile now belongs to {}, cleared previous progress", new);
            }
        }

        self.db
            .flush()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;

        tracing::debug!("Saved profile for {:?}", profile.uid);
        Ok(())
    }
}

/// Profile cache that falls back to memory when the database misbehaves
pub type ProfileCache = FallbackProfileRepository<Arc<dyn ProfileRepository>>;

/// Open the database and wrap it as the profile cache.
///
/// When the database cannot be opened the cache starts degraded and no
/// storage handle is returned; progress then lives in memory only.
pub fn open_profile_cache() -> (Arc<ProfileCache>, Option<Arc<Storage>>) {
    match Storage::init() {
        Ok(storage) => {
            let storage = Arc::new(storage);
            let primary: Arc<dyn ProfileRepository> = storage.clone();
            (Arc::new(FallbackProfileRepository::new(primary)), Some(storage))
        }
        Err(e) => {
            let primary: Arc<dyn ProfileRepository> = Arc::new(InMemoryProfileRepository::new());
            let cache = FallbackProfileRepository::degraded(primary, format!("{:#}", e));
            (Arc::new(cache), None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_round_trip() -> Result<()> {
        let storage = Storage::temporary()?;
        assert_eq!(storage.load()?, None);

        let profile = UserProfile {
            uid: Some("uid-1".to_string()),
            name: "Jane".to_string(),
            ..Default::default()
        };
        storage.save(&profile)?;

        assert_eq!(storage.load()?, Some(profile));
        Ok(())
    }

    #[test]
    fn test_profile_is_stored_as_camel_case_json() -> Result<()> {
        let storage = Storage::temporary()?;
        storage.save(&UserProfile {
            onboarding_completed: true,
            ..Default::default()
        })?;

        let raw = storage.tree(PROFILE_TREE)?.get(PROFILE_KEY)?.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&raw)?;
        assert_eq!(json["onboardingCompleted"], serde_json::json!(true));
        assert!(json.get("password").is_none());
        Ok(())
    }

    #[test]
    fn test_corrupt_profile_is_reported() -> Result<()> {
        let storage = Storage::temporary()?;
        storage.tree(PROFILE_TREE)?.insert(PROFILE_KEY, &b"not json"[..])?;

        assert!(matches!(storage.load(), Err(StorageError::Corrupt(_))));
        Ok(())
    }

    #[test]
    fn test_activity_defaults_and_round_trip() -> Result<()> {
        let storage = Storage::temporary()?;
        assert_eq!(storage.load_activity(4)?, WeeklyActivity::with_goal(4));

        let mut activity = WeeklyActivity::from_parts(2, 1, 4);
        activity.record_completion();
        storage.save_activity(&activity)?;

        assert_eq!(storage.load_activity(4)?, activity);
        // A smaller goal from the config renormalises the count
        assert_eq!(storage.load_activity(2)?.completed_this_week(), 0);
        Ok(())
    }

    #[test]
    fn test_weights_are_ordered_by_week() -> Result<()> {
        let storage = Storage::temporary()?;

        let mut log = WeightLog::new();
        for w in [75.0, 74.6, 74.1] {
            log.append(w)?;
        }
        storage.save_weights(&log)?;

        let loaded = storage.load_weights()?;
        let weeks: Vec<u32> = loaded.samples().iter().map(|s| s.week_index).collect();
        assert_eq!(weeks, vec![1, 2, 3]);
        assert_eq!(loaded.latest().map(|s| s.weight), Some(74.1));
        Ok(())
    }

    #[test]
    fn test_new_owner_starts_without_previous_progress() -> Result<()> {
        let storage = Storage::temporary()?;
        let owner = |uid: &str| UserProfile {
            uid: Some(uid.to_string()),
            ..Default::default()
        };

        storage.save(&owner("uid-1"))?;
        let mut activity = WeeklyActivity::with_goal(4);
        activity.record_completion();
        storage.save_activity(&activity)?;
        let mut log = WeightLog::new();
        log.append(80.0)?;
        storage.save_weights(&log)?;

        // Same account saving again keeps its history
        storage.save(&owner("uid-1"))?;
        assert_eq!(storage.load_activity(4)?.completed_this_week(), 1);

        storage.save(&owner("uid-2"))?;
        assert_eq!(storage.load_activity(4)?, WeeklyActivity::with_goal(4));
        assert!(storage.load_weights()?.is_empty());
        Ok(())
    }
}
