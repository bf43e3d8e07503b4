mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use async_trait::async_trait;
use mockall::mock;
use pretty_assertions::assert_eq;

use fittrack::auth::{AuthError, AuthGateway, Identity, InMemoryAuthGateway};
use fittrack::models::{FitnessGoal, InputError};
use fittrack::services::{AuthMethod, OnboardingError, OnboardingFlow, OnboardingStep};
use fittrack::storage::{InMemoryProfileRepository, ProfileRepository};

use common::*;

mock! {
    pub Gateway {}

    #[async_trait]
    impl AuthGateway for Gateway {
        async fn create_account(&self, email: &str, password: &str) -> Result<Identity, AuthError>;
        async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError>;
        async fn sign_in_with_provider(&self) -> Result<Identity, AuthError>;
        async fn update_display_name(&self, identity: &Identity, name: &str) -> Result<Identity, AuthError>;
        async fn sign_out(&self) -> Result<(), AuthError>;
        async fn current_user(&self) -> Result<Option<Identity>, AuthError>;
    }
}

#[tokio::test]
async fn test_full_onboarding_persists_completed_profile() {
    init_test_logging();
    let repo = repository();
    let gateway = gateway_with_jane();
    let mut flow = OnboardingFlow::resume(repo.clone());

    flow.set_email(EMAIL).unwrap();
    flow.set_password(PASSWORD).unwrap();
    let step = flow.authenticate(gateway.as_ref(), AuthMethod::Credentials).await.unwrap();
    assert_eq!(step, OnboardingStep::BiometricsInput);

    // Persisted after login, not yet complete
    let cached = repo.load().unwrap().unwrap();
    assert_eq!(cached.email, EMAIL);
    assert_eq!(cached.name, "Jane");
    assert!(!cached.onboarding_completed);

    fill_profile(&mut flow);
    assert!(!repo.load().unwrap().unwrap().onboarding_completed);

    assert_eq!(flow.next().unwrap(), OnboardingStep::Completed);
    let cached = repo.load().unwrap().unwrap();
    assert!(cached.onboarding_completed);
    assert_eq!(cached.bmi, Some(23.1));
    assert_eq!(cached.uid, gateway.uid_for(EMAIL));
    assert_eq!(flow.credentials().password, "");
}

#[tokio::test]
async fn test_failed_login_stays_on_prompt() {
    let repo = repository();
    let gateway = gateway_with_jane();
    let mut flow = OnboardingFlow::resume(repo.clone());

    flow.set_email(EMAIL).unwrap();
    flow.set_password("wrong-password").unwrap();
    let result = flow.authenticate(gateway.as_ref(), AuthMethod::Credentials).await;

    assert_matches!(result, Err(OnboardingError::Auth(AuthError::InvalidCredentials)));
    assert_eq!(flow.step(), OnboardingStep::LoginPrompt);
    assert_eq!(flow.error(), Some("Invalid email or password"));
    assert!(!flow.is_auth_in_flight());
    assert_eq!(repo.load().unwrap(), None);
}

#[tokio::test]
async fn test_signup_sets_display_name() {
    let repo = repository();
    let gateway = Arc::new(InMemoryAuthGateway::new());
    let mut flow = OnboardingFlow::resume_at_signup(repo.clone());

    flow.set_name("Sam").unwrap();
    flow.set_email("sam@example.com").unwrap();
    flow.set_password("secret1").unwrap();
    flow.authenticate(gateway.as_ref(), AuthMethod::Credentials).await.unwrap();

    assert_eq!(flow.step(), OnboardingStep::BiometricsInput);
    assert_eq!(repo.load().unwrap().unwrap().name, "Sam");
}

#[tokio::test]
async fn test_signup_with_taken_email() {
    let gateway = gateway_with_jane();
    let mut flow = OnboardingFlow::resume_at_signup(repository());

    flow.set_email(EMAIL).unwrap();
    flow.set_password("another1").unwrap();
    let result = flow.authenticate(gateway.as_ref(), AuthMethod::Credentials).await;

    assert_matches!(result, Err(OnboardingError::Auth(AuthError::EmailAlreadyExists)));
    assert_eq!(flow.step(), OnboardingStep::SignupPrompt);
}

#[test]
fn test_second_attempt_while_in_flight_is_rejected() {
    let mut flow = OnboardingFlow::resume(repository());
    flow.set_email(EMAIL).unwrap();
    flow.set_password(PASSWORD).unwrap();

    flow.begin_authentication(AuthMethod::Credentials).unwrap();
    assert_matches!(
        flow.begin_authentication(AuthMethod::SocialProvider),
        Err(OnboardingError::Auth(AuthError::AuthenticationInFlight))
    );
    assert_matches!(
        flow.toggle_auth_mode(),
        Err(OnboardingError::Auth(AuthError::AuthenticationInFlight))
    );

    let step = flow.finish_authentication(Ok(Identity::new("uid-9").with_email(EMAIL))).unwrap();
    assert_eq!(step, OnboardingStep::BiometricsInput);
}

#[tokio::test]
async fn test_social_sign_in_uses_provider_identity() {
    let mut gateway = MockGateway::new();
    gateway.expect_sign_in_with_provider().times(1).returning(|| {
        Ok(Identity::new("google-1")
            .with_email("g@example.com")
            .with_display_name("Gee"))
    });
    gateway.expect_sign_in().never();

    let repo = repository();
    let mut flow = OnboardingFlow::resume(repo.clone());
    flow.authenticate(&gateway, AuthMethod::SocialProvider).await.unwrap();

    let cached = repo.load().unwrap().unwrap();
    assert_eq!(cached.uid.as_deref(), Some("google-1"));
    assert_eq!(cached.email, "g@example.com");
    assert_eq!(cached.name, "Gee");
}

#[tokio::test]
async fn test_social_sign_in_failure_message() {
    let mut gateway = MockGateway::new();
    gateway
        .expect_sign_in_with_provider()
        .returning(|| Err(AuthError::ProviderRejected("popup closed".to_string())));

    let mut flow = OnboardingFlow::resume(repository());
    assert!(flow.authenticate(&gateway, AuthMethod::SocialProvider).await.is_err());
    assert_eq!(flow.error(), Some("Failed to sign in with Google. Please try again."));
    assert_eq!(flow.step(), OnboardingStep::LoginPrompt);
}

#[test]
fn test_resume_partial_profile_at_biometrics() {
    let mut partial = completed_profile("uid-1");
    partial.onboarding_completed = false;
    partial.height = None;
    let repo = Arc::new(InMemoryProfileRepository::with_profile(partial));

    let flow = OnboardingFlow::resume(repo);
    assert_eq!(flow.step(), OnboardingStep::BiometricsInput);
    assert_eq!(flow.draft().weight, "75");
    assert_eq!(flow.draft().goal, Some(FitnessGoal::MuscleGain));
}

#[test]
fn test_completed_profile_skips_onboarding() {
    let repo = Arc::new(InMemoryProfileRepository::with_profile(completed_profile("uid-1")));
    let flow = OnboardingFlow::resume(repo);
    assert!(flow.is_complete());
}

#[tokio::test]
async fn test_reauthentication_with_same_uid_returns_to_completed() {
    let gateway = gateway_with_jane();
    let uid = gateway.uid_for(EMAIL).unwrap();
    let repo = Arc::new(InMemoryProfileRepository::with_profile(completed_profile(&uid)));

    let mut flow = OnboardingFlow::reauthenticate(repo.clone());
    assert_eq!(flow.step(), OnboardingStep::LoginPrompt);
    assert_eq!(flow.credentials().email, EMAIL);

    flow.set_password(PASSWORD).unwrap();
    let step = flow.authenticate(gateway.as_ref(), AuthMethod::Credentials).await.unwrap();

    assert_eq!(step, OnboardingStep::Completed);
    assert!(repo.load().unwrap().unwrap().onboarding_completed);
}

#[tokio::test]
async fn test_reauthentication_as_someone_else_restarts_profile() {
    let gateway = gateway_with_jane();
    let repo = Arc::new(InMemoryProfileRepository::with_profile(completed_profile("someone-else")));

    let mut flow = OnboardingFlow::reauthenticate(repo.clone());
    flow.set_email(EMAIL).unwrap();
    flow.set_password(PASSWORD).unwrap();
    let step = flow.authenticate(gateway.as_ref(), AuthMethod::Credentials).await.unwrap();

    assert_eq!(step, OnboardingStep::BiometricsInput);
    let cached = repo.load().unwrap().unwrap();
    assert!(!cached.onboarding_completed);
    assert_eq!(cached.bmi, None);
}

#[test]
fn test_missing_duration_blocks_completion() {
    let repo = repository();
    let mut flow = OnboardingFlow::resume(repo.clone());
    flow.set_email(EMAIL).unwrap();
    flow.set_password(PASSWORD).unwrap();
    flow.begin_authentication(AuthMethod::Credentials).unwrap();
    flow.finish_authentication(Ok(Identity::new("uid-1"))).unwrap();

    flow.set_height("180").unwrap();
    flow.set_weight("75").unwrap();
    flow.next().unwrap();
    flow.select_goal(FitnessGoal::Flexibility).unwrap();
    flow.next().unwrap();
    flow.select_plan(fittrack::models::PlanTier::Beginner).unwrap();
    flow.next().unwrap();

    assert_matches!(
        flow.next(),
        Err(OnboardingError::Input(InputError::Missing { field: "workoutDuration" }))
    );
    assert_eq!(flow.step(), OnboardingStep::DurationSelection);
    assert!(!repo.load().unwrap().unwrap().onboarding_completed);
}
