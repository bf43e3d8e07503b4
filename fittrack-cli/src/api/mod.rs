use anyhow::{Context, Result};
use async_trait::async_trait;
use fittrack::auth::{AuthError, AuthGateway, Identity};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::config::Config;

mod error;
mod retry;

pub use error::ApiError;
pub use retry::{RetryConfig, Retryable};

/// Email/password payload for sign-up and sign-in
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

/// Credential exchange with the Google identity provider
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IdpRequest {
    post_body: String,
    request_uri: String,
    return_secure_token: bool,
    return_idp_credential: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateProfileRequest<'a> {
    id_token: &'a str,
    display_name: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupRequest<'a> {
    id_token: &'a str,
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    grant_type: &'a str,
    refresh_token: &'a str,
}

/// Account fields returned by the identity service
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    pub local_id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl AccountInfo {
    fn identity(&self) -> Identity {
        Identity {
            uid: self.local_id.clone(),
            email: self.email.clone().filter(|e| !e.is_empty()),
            display_name: self.display_name.clone().filter(|n| !n.is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<AccountInfo>,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
}

/// Identity Toolkit REST client. Implements the identity gateway used by the
/// onboarding flow and keeps the signed-in session in the config file.
pub struct IdentityClient {
    client: Client,
    config: Arc<Mutex<Config>>,
    retry_config: RetryConfig,
}

impl IdentityClient {
    pub fn new(config: Config) -> Result<Self> {
        Self::with_retry_config(config, RetryConfig::default())
    }

    /// Create a client with custom retry configuration
    pub fn with_retry_config(config: Config, retry_config: RetryConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.identity.timeout_seconds);

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            config: Arc::new(Mutex::new(config)),
            retry_config,
        })
    }

    /// Copy of the current configuration, including the stored session
    pub fn config(&self) -> Result<Config, AuthError> {
        Ok(self.lock_config()?.clone())
    }

    fn lock_config(&self) -> Result<MutexGuard<'_, Config>, AuthError> {
        self.config
            .lock()
            .map_err(|_| AuthError::Service("configuration lock poisoned".to_string()))
    }

    fn accounts_url(&self, method: &str) -> Result<String, AuthError> {
        let config = self.lock_config()?;
        Ok(format!(
            "{}/accounts:{}?key={}",
            config.identity.base_url.trim_end_matches('/'),
            method,
            config.identity.api_key
        ))
    }

    fn token_url(&self) -> Result<String, AuthError> {
        let config = self.lock_config()?;
        Ok(format!(
            "{}/token?key={}",
            config.identity.token_url.trim_end_matches('/'),
            config.identity.api_key
        ))
    }

    /// POST a JSON body, retrying transient failures
    async fn post_json<B, R>(&self, url: &str, body: &B) -> Result<R, ApiError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let payload = serde_json::to_value(body).map_err(|e| ApiError::Unknown(e.to_string()))?;

        self.retry_config
            .execute(|| {
                let client = self.client.clone();
                let url = url.to_string();
                let payload = payload.clone();
                async move {
                    let response = client.post(&url).json(&payload).send().await?;
                    let status = response.status();

                    if status.is_success() {
                        response
                            .json::<R>()
                            .await
                            .map_err(|e| ApiError::Unknown(format!("Failed to parse response: {}", e)))
                    } else {
                        let error_text = response.text().await.unwrap_or_default();
                        Err(ApiError::from_status(status, error_text))
                    }
                }
            })
            .await
    }

    /// Remember the account as the signed-in session and persist it
    fn store_session(&self, account: &AccountInfo) -> Result<Identity, AuthError> {
        let identity = account.identity();
        let mut config = self.lock_config()?;

        let id_token = account.id_token.clone().unwrap_or_else(|| config.session.id_token.clone());
        let refresh_token = account
            .refresh_token
            .clone()
            .unwrap_or_else(|| config.session.refresh_token.clone());
        config.set_session(&identity, id_token, refresh_token);

        if let Err(e) = config.save() {
            tracing::warn!("Could not persist session: {}", e);
        }
        Ok(identity)
    }

    fn clear_session(&self) -> Result<(), AuthError> {
        let mut config = self.lock_config()?;
        config.clear_session();
        if let Err(e) = config.save() {
            tracing::warn!("Could not persist sign-out: {}", e);
        }
        Ok(())
    }

    async fn lookup(&self, id_token: &str) -> Result<Option<Identity>, ApiError> {
        let url = self.accounts_url("lookup").map_err(|e| ApiError::Unknown(e.to_string()))?;
        let response: LookupResponse = self.post_json(&url, &LookupRequest { id_token }).await?;
        Ok(response.users.first().map(AccountInfo::identity))
    }

    /// Exchange the refresh token for a new id token
    async fn refresh(&self, refresh_token: &str) -> Result<String, ApiError> {
        let url = self.token_url().map_err(|e| ApiError::Unknown(e.to_string()))?;
        let response: RefreshResponse = self
            .post_json(
                &url,
                &RefreshRequest {
                    grant_type: "refresh_token",
                    refresh_token,
                },
            )
            .await?;

        if let Ok(mut config) = self.lock_config() {
            config.session.id_token = response.id_token.clone();
            config.session.refresh_token = response.refresh_token;
            if let Err(e) = config.save() {
                tracing::warn!("Could not persist refreshed token: {}", e);
            }
        }
        tracing::debug!("Refreshed identity token");
        Ok(response.id_token)
    }
}

#[async_trait]
impl AuthGateway for IdentityClient {
    async fn create_account(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let url = self.accounts_url("signUp")?;
        tracing::debug!("Creating account for {}", email);

        let account: AccountInfo = self
            .post_json(
                &url,
                &PasswordRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await?;

        tracing::info!("Created account {}", account.local_id);
        self.store_session(&account)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let url = self.accounts_url("signInWithPassword")?;
        tracing::debug!("Signing in as {}", email);

        let account: AccountInfo = self
            .post_json(
                &url,
                &PasswordRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await?;

        tracing::info!("Signed in as {}", account.local_id);
        self.store_session(&account)
    }

    async fn sign_in_with_provider(&self) -> Result<Identity, AuthError> {
        let google_id_token = self.lock_config()?.identity.google_id_token.clone();
        if google_id_token.is_empty() {
            return Err(AuthError::ProviderUnavailable(
                "set identity.google_id_token in the config file".to_string(),
            ));
        }
        let url = self.accounts_url("signInWithIdp")?;

        let request = IdpRequest {
            post_body: format!("id_token={}&providerId=google.com", google_id_token),
            request_uri: "http://localhost".to_string(),
            return_secure_token: true,
            return_idp_credential: true,
        };

        let account: AccountInfo = self.post_json(&url, &request).await.map_err(|e| {
            tracing::warn!("Google sign-in failed: {}", e);
            match AuthError::from(e) {
                err if err.is_transient() => err,
                err => AuthError::ProviderRejected(err.to_string()),
            }
        })?;

        tracing::info!("Signed in with Google as {}", account.local_id);
        self.store_session(&account)
    }

    async fn update_display_name(&self, identity: &Identity, name: &str) -> Result<Identity, AuthError> {
        let id_token = {
            let config = self.lock_config()?;
            if config.session.uid != identity.uid || config.session.id_token.is_empty() {
                return Err(AuthError::NotSignedIn);
            }
            config.session.id_token.clone()
        };
        let url = self.accounts_url("update")?;

        let mut account: AccountInfo = self
            .post_json(
                &url,
                &UpdateProfileRequest {
                    id_token: &id_token,
                    display_name: name,
                    return_secure_token: true,
                },
            )
            .await?;

        if account.email.is_none() {
            account.email = identity.email.clone();
        }
        if account.display_name.is_none() {
            account.display_name = Some(name.to_string());
        }
        self.store_session(&account)
    }

    /// The service keeps no server-side session, so this only forgets the tokens
    async fn sign_out(&self) -> Result<(), AuthError> {
        self.clear_session()?;
        tracing::info!("Cleared stored session");
        Ok(())
    }

    async fn current_user(&self) -> Result<Option<Identity>, AuthError> {
        let (stored, id_token, refresh_token) = {
            let config = self.lock_config()?;
            match config.session_identity() {
                Some(identity) => (
                    identity,
                    config.session.id_token.clone(),
                    config.session.refresh_token.clone(),
                ),
                None => return Ok(None),
            }
        };

        let result = match self.lookup(&id_token).await {
            Err(e) if e.is_expired_token() && !refresh_token.is_empty() => {
                tracing::debug!("Identity token expired, refreshing");
                match self.refresh(&refresh_token).await {
                    Ok(new_token) => self.lookup(&new_token).await,
                    Err(e) => Err(e),
                }
            }
            other => other,
        };

        match result {
            Ok(Some(identity)) if identity.uid == stored.uid => Ok(Some(Identity {
                email: identity.email.or(stored.email),
                display_name: identity.display_name.or(stored.display_name),
                uid: identity.uid,
            })),
            Ok(_) => {
                tracing::info!("Stored session no longer matches an account");
                self.clear_session()?;
                Ok(None)
            }
            Err(e) if e.is_retryable() => {
                tracing::warn!("Identity service unreachable, using stored session: {}", e);
                Ok(Some(stored))
            }
            Err(e) => {
                tracing::info!("Stored session rejected: {}", e);
                self.clear_session()?;
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_client_creation() {
        let client = IdentityClient::new(Config::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_accounts_url_includes_key() {
        let mut config = Config::default();
        config.identity.api_key = "k123".to_string();
        config.identity.base_url = "http://localhost:9099/v1/".to_string();
        let client = IdentityClient::new(config).unwrap();

        assert_eq!(
            client.accounts_url("signUp").unwrap(),
            "http://localhost:9099/v1/accounts:signUp?key=k123"
        );
    }

    #[test]
    fn test_account_info_ignores_empty_fields() {
        let account: AccountInfo =
            serde_json::from_str(r#"{"localId":"u1","email":"a@b.co","displayName":""}"#).unwrap();
        let identity = account.identity();
        assert_eq!(identity.uid, "u1");
        assert_eq!(identity.email.as_deref(), Some("a@b.co"));
        assert_eq!(identity.display_name, None);
    }
}
