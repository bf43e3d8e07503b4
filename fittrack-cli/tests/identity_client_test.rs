use anyhow::Result;
use fittrack::auth::{AuthError, AuthGateway, Identity};
use fittrack_cli::api::{IdentityClient, RetryConfig};
use fittrack_cli::config::Config;
use mockito::{Matcher, Server, ServerGuard};
use serial_test::serial;
use tempfile::TempDir;

fn fast_retry() -> RetryConfig {
    RetryConfig {
        max_retries: 3,
        initial_delay_ms: 1,
        max_delay_ms: 5,
        backoff_factor: 2.0,
    }
}

/// Point the config directory at a fresh temp dir for the test
fn isolated_home() -> TempDir {
    let home = TempDir::new().expect("temp dir");
    std::env::set_var("FITTRACK_HOME", home.path());
    home
}

fn config_for(server: &ServerGuard) -> Config {
    let mut config = Config::default();
    config.identity.api_key = "test-key".to_string();
    config.identity.base_url = format!("{}/v1", server.url());
    config.identity.token_url = format!("{}/v1", server.url());
    config
}

fn signed_in(mut config: Config, id_token: &str) -> Config {
    let identity = Identity::new("uid-1").with_email("jane@example.com");
    config.set_session(&identity, id_token.to_string(), "refresh-1".to_string());
    config
}

const ACCOUNT_BODY: &str = r#"{
    "localId": "uid-1",
    "email": "jane@example.com",
    "displayName": "",
    "idToken": "id-1",
    "refreshToken": "refresh-1"
}"#;

#[tokio::test]
#[serial]
async fn test_sign_in_stores_session() -> Result<()> {
    let _home = isolated_home();
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/accounts:signInWithPassword")
        .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
        .match_body(Matcher::PartialJsonString(
            r#"{"email":"jane@example.com","password":"secret1","returnSecureToken":true}"#.to_string(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(ACCOUNT_BODY)
        .create_async()
        .await;

    let client = IdentityClient::with_retry_config(config_for(&server), fast_retry())?;
    let identity = client.sign_in("jane@example.com", "secret1").await?;

    mock.assert_async().await;
    assert_eq!(identity.uid, "uid-1");
    assert_eq!(identity.email.as_deref(), Some("jane@example.com"));
    assert_eq!(identity.display_name, None);

    let saved = Config::load()?;
    assert_eq!(saved.session.uid, "uid-1");
    assert_eq!(saved.session.id_token, "id-1");
    assert_eq!(saved.session.refresh_token, "refresh-1");
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_sign_up_maps_email_exists() -> Result<()> {
    let _home = isolated_home();
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/accounts:signUp")
        .match_query(Matcher::Any)
        .with_status(400)
        .with_body(r#"{"error":{"code":400,"message":"EMAIL_EXISTS"}}"#)
        .expect(1)
        .create_async()
        .await;

    let client = IdentityClient::with_retry_config(config_for(&server), fast_retry())?;
    let result = client.create_account("jane@example.com", "secret1").await;

    mock.assert_async().await;
    assert_eq!(result, Err(AuthError::EmailAlreadyExists));
    assert!(!Config::load()?.is_authenticated());
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_wrong_password_is_not_retried() -> Result<()> {
    let _home = isolated_home();
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/accounts:signInWithPassword")
        .match_query(Matcher::Any)
        .with_status(400)
        .with_body(r#"{"error":{"code":400,"message":"INVALID_LOGIN_CREDENTIALS"}}"#)
        .expect(1)
        .create_async()
        .await;

    let client = IdentityClient::with_retry_config(config_for(&server), fast_retry())?;
    let result = client.sign_in("jane@example.com", "wrong").await;

    mock.assert_async().await;
    assert_eq!(result, Err(AuthError::InvalidCredentials));
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_server_errors_are_retried() -> Result<()> {
    let _home = isolated_home();
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/accounts:signInWithPassword")
        .match_query(Matcher::Any)
        .with_status(503)
        .with_body("Service Unavailable")
        .expect(3)
        .create_async()
        .await;

    let client = IdentityClient::with_retry_config(config_for(&server), fast_retry())?;
    let result = client.sign_in("jane@example.com", "secret1").await;

    mock.assert_async().await;
    assert!(matches!(result, Err(AuthError::Service(_))));
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_sign_up_sets_display_name() -> Result<()> {
    let _home = isolated_home();
    let mut server = Server::new_async().await;
    let sign_up = server
        .mock("POST", "/v1/accounts:signUp")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(ACCOUNT_BODY)
        .create_async()
        .await;
    let update = server
        .mock("POST", "/v1/accounts:update")
        .match_query(Matcher::Any)
        .match_body(Matcher::PartialJsonString(
            r#"{"idToken":"id-1","displayName":"Jane"}"#.to_string(),
        ))
        .with_status(200)
        .with_body(r#"{"localId":"uid-1","email":"jane@example.com","displayName":"Jane"}"#)
        .create_async()
        .await;

    let client = IdentityClient::with_retry_config(config_for(&server), fast_retry())?;
    let identity = client.sign_up("jane@example.com", "secret1", "Jane").await?;

    sign_up.assert_async().await;
    update.assert_async().await;
    assert_eq!(identity.display_name.as_deref(), Some("Jane"));
    // Tokens from sign-up survive an update response without them
    assert_eq!(client.config()?.session.id_token, "id-1");
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_current_user_refreshes_expired_token() -> Result<()> {
    let _home = isolated_home();
    let mut server = Server::new_async().await;
    let expired = server
        .mock("POST", "/v1/accounts:lookup")
        .match_query(Matcher::Any)
        .match_body(Matcher::PartialJsonString(r#"{"idToken":"old-token"}"#.to_string()))
        .with_status(400)
        .with_body(r#"{"error":{"code":400,"message":"INVALID_ID_TOKEN"}}"#)
        .create_async()
        .await;
    let refresh = server
        .mock("POST", "/v1/token")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"id_token":"new-token","refresh_token":"refresh-2"}"#)
        .create_async()
        .await;
    let lookup = server
        .mock("POST", "/v1/accounts:lookup")
        .match_query(Matcher::Any)
        .match_body(Matcher::PartialJsonString(r#"{"idToken":"new-token"}"#.to_string()))
        .with_status(200)
        .with_body(r#"{"users":[{"localId":"uid-1","email":"jane@example.com","displayName":"Jane"}]}"#)
        .create_async()
        .await;

    let config = signed_in(config_for(&server), "old-token");
    let client = IdentityClient::with_retry_config(config, fast_retry())?;
    let identity = client.current_user().await?;

    expired.assert_async().await;
    refresh.assert_async().await;
    lookup.assert_async().await;
    assert_eq!(identity.map(|i| i.display_name), Some(Some("Jane".to_string())));

    let session = client.config()?.session;
    assert_eq!(session.id_token, "new-token");
    assert_eq!(session.refresh_token, "refresh-2");
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_current_user_clears_rejected_session() -> Result<()> {
    let _home = isolated_home();
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/v1/accounts:lookup")
        .match_query(Matcher::Any)
        .with_status(400)
        .with_body(r#"{"error":{"code":400,"message":"USER_NOT_FOUND"}}"#)
        .create_async()
        .await;

    let client = IdentityClient::with_retry_config(signed_in(config_for(&server), "id-1"), fast_retry())?;

    assert_eq!(client.current_user().await?, None);
    assert!(!client.config()?.is_authenticated());
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_current_user_trusts_stored_session_when_offline() -> Result<()> {
    let _home = isolated_home();
    let mut config = Config::default();
    config.identity.api_key = "test-key".to_string();
    // Nothing listens on port 9
    config.identity.base_url = "http://127.0.0.1:9/v1".to_string();
    config.identity.timeout_seconds = 2;

    let client = IdentityClient::with_retry_config(signed_in(config, "id-1"), fast_retry())?;
    let identity = client.current_user().await?;

    assert_eq!(identity.map(|i| i.uid), Some("uid-1".to_string()));
    assert!(client.config()?.is_authenticated());
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_social_sign_in_requires_configured_token() -> Result<()> {
    let _home = isolated_home();
    let server = Server::new_async().await;
    let client = IdentityClient::with_retry_config(config_for(&server), fast_retry())?;

    let result = client.sign_in_with_provider().await;
    assert!(matches!(result, Err(AuthError::ProviderUnavailable(_))));
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_social_sign_in_rejection_message() -> Result<()> {
    let _home = isolated_home();
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/v1/accounts:signInWithIdp")
        .match_query(Matcher::Any)
        .with_status(400)
        .with_body(r#"{"error":{"code":400,"message":"INVALID_IDP_RESPONSE"}}"#)
        .create_async()
        .await;

    let mut config = config_for(&server);
    config.identity.google_id_token = "google-token".to_string();
    let client = IdentityClient::with_retry_config(config, fast_retry())?;

    let err = client.sign_in_with_provider().await.unwrap_err();
    assert_eq!(err.to_string(), "Failed to sign in with Google. Please try again.");
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_sign_out_forgets_tokens() -> Result<()> {
    let _home = isolated_home();
    let server = Server::new_async().await;
    let client = IdentityClient::with_retry_config(signed_in(config_for(&server), "id-1"), fast_retry())?;

    client.sign_out().await?;

    assert!(!client.config()?.is_authenticated());
    assert!(!Config::load()?.is_authenticated());
    Ok(())
}
