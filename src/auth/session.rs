use std::sync::Arc;
use tokio::sync::watch;

use super::{AuthError, AuthGateway, Identity};

/// What the rest of the app may know about the signed-in user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub identity: Option<Identity>,
    pub loading: bool,
}

impl SessionSnapshot {
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }
}

/// Current identity plus loading status, observable through a watch channel.
pub struct SessionStore {
    gateway: Arc<dyn AuthGateway>,
    state: watch::Sender<SessionSnapshot>,
}

impl SessionStore {
    /// Starts in the loading state until `restore` runs
    pub fn new(gateway: Arc<dyn AuthGateway>) -> Self {
        let (state, _) = watch::channel(SessionSnapshot {
            identity: None,
            loading: true,
        });
        Self { gateway, state }
    }

    pub fn gateway(&self) -> Arc<dyn AuthGateway> {
        Arc::clone(&self.gateway)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    /// Ask the gateway for a surviving session. Failures leave the user signed out.
    pub async fn restore(&self) -> SessionSnapshot {
        self.state.send_modify(|s| s.loading = true);

        let identity = match self.gateway.current_user().await {
            Ok(identity) => identity,
            Err(e) => {
                tracing::warn!("Could not restore identity session: {}", e);
                None
            }
        };

        if let Some(ref identity) = identity {
            tracing::info!("Restored session for {}", identity.uid);
        }

        self.state.send_modify(|s| {
            // A sign-in that finished while restoring wins
            if identity.is_some() || s.identity.is_none() {
                s.identity = identity;
            }
            s.loading = false;
        });
        self.snapshot()
    }

    /// Record an identity returned by a successful authentication
    pub fn set_identity(&self, identity: Identity) {
        tracing::debug!("Session identity set to {}", identity.uid);
        self.state.send_replace(SessionSnapshot {
            identity: Some(identity),
            loading: false,
        });
    }

    /// Sign out through the gateway; the identity is only dropped on success.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        self.gateway.sign_out().await?;
        self.clear();
        Ok(())
    }

    pub fn clear(&self) {
        self.state.send_replace(SessionSnapshot {
            identity: None,
            loading: false,
        });
    }
}
