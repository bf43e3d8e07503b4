use thiserror::Error;

/// Failures reported by the identity collaborator.
///
/// The `Display` text is what the user sees; none of these are fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("An account with this email already exists")]
    EmailAlreadyExists,
    #[error("Password is too weak: {0}")]
    WeakPassword(String),
    #[error("Too many attempts, try again later")]
    RateLimitExceeded,
    #[error("Network error: {0}")]
    Network(String),
    #[error("Identity service error: {0}")]
    Service(String),
    #[error("Failed to sign in with Google. Please try again.")]
    ProviderRejected(String),
    #[error("Social sign-in is not available: {0}")]
    ProviderUnavailable(String),
    #[error("Not signed in")]
    NotSignedIn,
    #[error("Another sign-in attempt is still in progress")]
    AuthenticationInFlight,
}

impl AuthError {
    /// Failures worth retrying with backoff
    pub fn is_transient(&self) -> bool {
        matches!(self, AuthError::Network(_) | AuthError::Service(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_facing_messages() {
        assert_eq!(AuthError::InvalidCredentials.to_string(), "Invalid email or password");
        assert_eq!(
            AuthError::ProviderRejected("popup closed".to_string()).to_string(),
            "Failed to sign in with Google. Please try again."
        );
    }

    #[test]
    fn test_transient_classification() {
        assert!(AuthError::Network("timeout".to_string()).is_transient());
        assert!(AuthError::Service("503".to_string()).is_transient());
        assert!(!AuthError::InvalidCredentials.is_transient());
        assert!(!AuthError::AuthenticationInFlight.is_transient());
    }
}
