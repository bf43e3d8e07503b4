// Identity collaborator seam: the gateway trait, its in-memory double and the session store

pub mod errors;
pub mod memory;
pub mod models;
pub mod session;

use async_trait::async_trait;

pub use errors::AuthError;
pub use memory::InMemoryAuthGateway;
pub use models::{AuthRequest, Credentials, Identity};
pub use session::{SessionSnapshot, SessionStore};

/// The only path from the flows to the external identity service.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Create a new email/password account and sign it in
    async fn create_account(&self, email: &str, password: &str) -> Result<Identity, AuthError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError>;

    /// Sign in through the configured social identity provider
    async fn sign_in_with_provider(&self) -> Result<Identity, AuthError>;

    async fn update_display_name(&self, identity: &Identity, name: &str) -> Result<Identity, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Identity restored from the provider's own session, if any
    async fn current_user(&self) -> Result<Option<Identity>, AuthError>;

    /// Account creation followed by the display-name update
    async fn sign_up(&self, email: &str, password: &str, name: &str) -> Result<Identity, AuthError> {
        let identity = self.create_account(email, password).await?;
        if name.trim().is_empty() {
            return Ok(identity);
        }
        self.update_display_name(&identity, name.trim()).await
    }
}

/// Run one authentication request against a gateway
pub async fn authenticate(gateway: &dyn AuthGateway, request: &AuthRequest) -> Result<Identity, AuthError> {
    tracing::debug!("Dispatching {} request", request.kind());
    match request {
        AuthRequest::SignIn(credentials) => gateway.sign_in(&credentials.email, &credentials.password).await,
        AuthRequest::SignUp { credentials, name } => {
            gateway
                .sign_up(&credentials.email, &credentials.password, name)
                .await
        }
        AuthRequest::SocialProvider => gateway.sign_in_with_provider().await,
    }
}
