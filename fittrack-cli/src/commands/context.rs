use anyhow::Result;
use fittrack::auth::{AuthGateway, InMemoryAuthGateway, SessionStore};
use std::sync::Arc;

use crate::api::IdentityClient;
use crate::config::Config;

/// Configuration and collaborators shared by the commands
pub struct CommandContext {
    pub config: Config,
    pub offline: bool,
}

impl CommandContext {
    pub fn load(offline: bool) -> Result<Self> {
        Ok(Self {
            config: Config::load()?,
            offline,
        })
    }

    /// Identity gateway for this run
    pub fn gateway(&self) -> Result<Arc<dyn AuthGateway>> {
        if self.offline {
            tracing::info!("Offline mode, accepting any credentials locally");
            return Ok(Arc::new(InMemoryAuthGateway::permissive()));
        }

        if self.config.identity.api_key.is_empty() {
            tracing::warn!("No identity API key configured; requests will likely be rejected");
        }
        Ok(Arc::new(IdentityClient::new(self.config.clone())?))
    }

    pub fn session(&self) -> Result<Arc<SessionStore>> {
        Ok(Arc::new(SessionStore::new(self.gateway()?)))
    }
}
