use anyhow::{Context, Result};
use fittrack::auth::Identity;
use fittrack::models::DEFAULT_WEEKLY_WORKOUT_GOAL;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub identity: IdentityConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub dashboard: DashboardConfig,

    #[serde(default)]
    pub ui: UiConfig,
}

/// Identity Toolkit style endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_token_url")]
    pub token_url: String,

    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Google id token exchanged on social sign-in
    #[serde(default)]
    pub google_id_token: String,
}

/// Signed-in identity and its tokens
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub uid: String,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub display_name: String,

    #[serde(default)]
    pub id_token: String,

    #[serde(default)]
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_weekly_goal")]
    pub weekly_workout_goal: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_tick_rate")]
    pub tick_rate_ms: u64,
}

// Default value functions
fn default_base_url() -> String {
    "https://identitytoolkit.googleapis.com/v1".to_string()
}

fn default_token_url() -> String {
    "https://securetoken.googleapis.com/v1".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_weekly_goal() -> u32 {
    DEFAULT_WEEKLY_WORKOUT_GOAL
}

fn default_tick_rate() -> u64 {
    100
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            token_url: default_token_url(),
            timeout_seconds: default_timeout(),
            google_id_token: String::new(),
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            weekly_workout_goal: default_weekly_goal(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            tick_rate_ms: default_tick_rate(),
        }
    }
}

impl Config {
    /// Config directory (~/.fittrack/, or $FITTRACK_HOME)
    pub fn config_dir() -> Result<PathBuf> {
        if let Ok(home) = std::env::var("FITTRACK_HOME") {
            return Ok(PathBuf::from(home));
        }
        let home = dirs::home_dir().context("Could not find home directory")?;
        Ok(home.join(".fittrack"))
    }

    /// Config file path (<config dir>/config.toml)
    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file
    pub fn load() -> Result<Self> {
        let config_file = Self::config_file()?;

        if !config_file.exists() {
            tracing::debug!("Config file not found, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&config_file).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_dir = Self::config_dir()?;
        fs::create_dir_all(&config_dir).context("Failed to create config directory")?;

        let config_file = Self::config_file()?;
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&config_file, contents).context("Failed to write config file")?;

        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        !self.session.uid.is_empty() && !self.session.id_token.is_empty()
    }

    /// Remember the signed-in identity together with its tokens
    pub fn set_session(&mut self, identity: &Identity, id_token: String, refresh_token: String) {
        self.session = SessionConfig {
            uid: identity.uid.clone(),
            email: identity.email.clone().unwrap_or_default(),
            display_name: identity.display_name.clone().unwrap_or_default(),
            id_token,
            refresh_token,
        };
    }

    /// Identity restored from the stored session
    pub fn session_identity(&self) -> Option<Identity> {
        if !self.is_authenticated() {
            return None;
        }
        let mut identity = Identity::new(self.session.uid.clone());
        if !self.session.email.is_empty() {
            identity = identity.with_email(self.session.email.clone());
        }
        if !self.session.display_name.is_empty() {
            identity = identity.with_display_name(self.session.display_name.clone());
        }
        Some(identity)
    }

    pub fn clear_session(&mut self) {
        self.session = SessionConfig::default();
    }
}
