use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

use super::{AuthError, AuthGateway, Identity};

#[derive(Debug, Clone)]
struct Account {
    uid: String,
    password: String,
    display_name: Option<String>,
}

#[derive(Debug, Default)]
struct State {
    accounts: HashMap<String, Account>,
    current: Option<Identity>,
    social_identity: Option<Identity>,
    queued_failures: VecDeque<AuthError>,
}

/// Identity gateway kept entirely in process memory.
///
/// Backs the `--offline` mode of the client and the flow tests. A permissive
/// gateway registers unknown emails on first sign-in.
#[derive(Debug, Default)]
pub struct InMemoryAuthGateway {
    state: Mutex<State>,
    permissive: bool,
    calls: AtomicUsize,
}

impl InMemoryAuthGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept any credentials, creating the account when it does not exist
    pub fn permissive() -> Self {
        Self {
            permissive: true,
            ..Self::default()
        }
    }

    /// Pre-register an account
    pub fn with_account(mut self, email: &str, password: &str, display_name: Option<&str>) -> Self {
        {
            let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
            state.accounts.insert(
                email.to_lowercase(),
                Account {
                    uid: Uuid::new_v4().to_string(),
                    password: password.to_string(),
                    display_name: display_name.map(str::to_string),
                },
            );
        }
        self
    }

    /// Identity returned by the social provider shortcut
    pub fn with_social_identity(mut self, identity: Identity) -> Self {
        self.state.get_mut().unwrap_or_else(PoisonError::into_inner).social_identity = Some(identity);
        self
    }

    /// Make the next call fail with `error`
    pub fn fail_next(&self, error: AuthError) -> Result<(), AuthError> {
        self.lock()?.queued_failures.push_back(error);
        Ok(())
    }

    /// Number of gateway calls made so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// uid registered for an email, if any
    pub fn uid_for(&self, email: &str) -> Option<String> {
        let state = self.lock().ok()?;
        state.accounts.get(&email.to_lowercase()).map(|a| a.uid.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, AuthError> {
        self.state
            .lock()
            .map_err(|_| AuthError::Service("identity state poisoned".to_string()))
    }

    fn enter(&self) -> Result<MutexGuard<'_, State>, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.lock()?;
        if let Some(error) = state.queued_failures.pop_front() {
            return Err(error);
        }
        Ok(state)
    }
}

fn identity_for(email: &str, account: &Account) -> Identity {
    Identity {
        uid: account.uid.clone(),
        email: Some(email.to_string()),
        display_name: account.display_name.clone(),
    }
}

#[async_trait]
impl AuthGateway for InMemoryAuthGateway {
    async fn create_account(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let mut state = self.enter()?;
        let key = email.to_lowercase();
        if state.accounts.contains_key(&key) {
            return Err(AuthError::EmailAlreadyExists);
        }
        if password.len() < 6 {
            return Err(AuthError::WeakPassword(
                "Password should be at least 6 characters".to_string(),
            ));
        }

        let account = Account {
            uid: Uuid::new_v4().to_string(),
            password: password.to_string(),
            display_name: None,
        };
        let identity = identity_for(email, &account);
        state.accounts.insert(key, account);
        state.current = Some(identity.clone());
        Ok(identity)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let mut state = self.enter()?;
        let key = email.to_lowercase();

        if !state.accounts.contains_key(&key) && self.permissive {
            state.accounts.insert(
                key.clone(),
                Account {
                    uid: Uuid::new_v4().to_string(),
                    password: password.to_string(),
                    display_name: None,
                },
            );
        }

        let identity = match state.accounts.get(&key) {
            Some(account) if account.password == password || self.permissive => identity_for(email, account),
            _ => return Err(AuthError::InvalidCredentials),
        };
        state.current = Some(identity.clone());
        Ok(identity)
    }

    async fn sign_in_with_provider(&self) -> Result<Identity, AuthError> {
        let mut state = self.enter()?;
        let identity = state
            .social_identity
            .clone()
            .ok_or_else(|| AuthError::ProviderUnavailable("no social provider configured".to_string()))?;
        state.current = Some(identity.clone());
        Ok(identity)
    }

    async fn update_display_name(&self, identity: &Identity, name: &str) -> Result<Identity, AuthError> {
        let mut state = self.enter()?;
        for account in state.accounts.values_mut() {
            if account.uid == identity.uid {
                account.display_name = Some(name.to_string());
            }
        }
        let updated = identity.clone().with_display_name(name);
        if state.current.as_ref().map(|c| c.uid == identity.uid).unwrap_or(false) {
            state.current = Some(updated.clone());
        }
        Ok(updated)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let mut state = self.enter()?;
        state.current = None;
        Ok(())
    }

    async fn current_user(&self) -> Result<Option<Identity>, AuthError> {
        let state = self.enter()?;
        Ok(state.current.clone())
    }
}
