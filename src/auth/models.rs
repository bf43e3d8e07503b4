use serde::{Deserialize, Serialize};
use std::fmt;

/// Signed-in identity as reported by the identity collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub uid: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl Identity {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: None,
            display_name: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// Email/password pair typed on the login or signup step.
///
/// Never serialized; dropped as soon as authentication succeeds.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn clear_password(&mut self) {
        self.password.clear();
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// How an authentication attempt reaches the identity collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthRequest {
    SignIn(Credentials),
    SignUp { credentials: Credentials, name: String },
    SocialProvider,
}

impl AuthRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            AuthRequest::SignIn(_) => "sign_in",
            AuthRequest::SignUp { .. } => "sign_up",
            AuthRequest::SocialProvider => "social_provider",
        }
    }
}
