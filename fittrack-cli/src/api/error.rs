use fittrack::auth::AuthError;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// HTTP-level errors from the identity service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Not authorized: {0}")]
    Unauthorized(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Error code reported in the service's JSON error body, e.g. `EMAIL_EXISTS`
    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

impl ApiError {
    pub fn from_status(status: StatusCode, message: String) -> Self {
        let code = serde_json::from_str::<ErrorEnvelope>(&message)
            .ok()
            .map(|e| e.error.message)
            .filter(|m| !m.is_empty());

        let msg = if let Some(ref code) = code {
            code.clone()
        } else if message.is_empty() {
            status.canonical_reason().unwrap_or("Unknown error").to_string()
        } else {
            message
        };

        match status {
            StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited(msg),
            StatusCode::BAD_REQUEST if code.is_some() => ApiError::Rejected(msg),
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized(msg),
            StatusCode::FORBIDDEN => ApiError::Unauthorized(msg),
            StatusCode::NOT_FOUND => ApiError::NotFound(msg),
            StatusCode::BAD_REQUEST => ApiError::BadRequest(msg),
            status if status.is_server_error() => ApiError::ServerError(msg),
            status if status.is_client_error() => ApiError::BadRequest(msg),
            _ => ApiError::Unknown(msg),
        }
    }

    /// Worth another attempt after a backoff
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::NetworkError(_) | ApiError::ServerError(_))
    }

    /// The id token is no longer accepted and must be refreshed
    pub fn is_expired_token(&self) -> bool {
        match self {
            ApiError::Unauthorized(_) => true,
            ApiError::Rejected(code) => code.starts_with("INVALID_ID_TOKEN") || code.starts_with("TOKEN_EXPIRED"),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.is_request() {
            ApiError::NetworkError(err.to_string())
        } else {
            ApiError::Unknown(err.to_string())
        }
    }
}

impl From<ApiError> for AuthError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Rejected(code) => auth_error_for_code(&code),
            ApiError::RateLimited(_) => AuthError::RateLimitExceeded,
            ApiError::Unauthorized(_) => AuthError::NotSignedIn,
            ApiError::NetworkError(msg) => AuthError::Network(msg),
            ApiError::ServerError(msg)
            | ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Unknown(msg) => AuthError::Service(msg),
        }
    }
}

/// Map a service error code to the message shown to the user
fn auth_error_for_code(code: &str) -> AuthError {
    let (name, detail) = match code.split_once(" : ") {
        Some((name, detail)) => (name.trim(), detail.trim()),
        None => (code.trim(), ""),
    };

    match name {
        "EMAIL_EXISTS" => AuthError::EmailAlreadyExists,
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "INVALID_EMAIL"
        | "USER_DISABLED" => AuthError::InvalidCredentials,
        "WEAK_PASSWORD" => AuthError::WeakPassword(if detail.is_empty() {
            "Password should be at least 6 characters".to_string()
        } else {
            detail.to_string()
        }),
        "TOO_MANY_ATTEMPTS_TRY_LATER" => AuthError::RateLimitExceeded,
        "INVALID_IDP_RESPONSE" => AuthError::ProviderRejected(code.to_string()),
        "INVALID_ID_TOKEN" | "TOKEN_EXPIRED" | "USER_NOT_FOUND" => AuthError::NotSignedIn,
        _ => AuthError::Service(code.to_string()),
    }
}
