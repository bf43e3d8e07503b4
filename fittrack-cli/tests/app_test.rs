use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use fittrack::auth::{AuthGateway, InMemoryAuthGateway, SessionStore};
use fittrack::models::UserProfile;
use fittrack::services::{DashboardView, OnboardingStep};
use fittrack::storage::{FallbackProfileRepository, InMemoryProfileRepository, ProfileRepository};
use fittrack_cli::storage::ProfileCache;
use fittrack_cli::ui::{App, Screen};
use std::sync::Arc;

fn cache_with(profile: Option<UserProfile>) -> Arc<ProfileCache> {
    let memory = match profile {
        Some(profile) => InMemoryProfileRepository::with_profile(profile),
        None => InMemoryProfileRepository::new(),
    };
    let primary: Arc<dyn ProfileRepository> = Arc::new(memory);
    Arc::new(FallbackProfileRepository::new(primary))
}

fn app_with(gateway: InMemoryAuthGateway, profile: Option<UserProfile>) -> Result<(App, Arc<ProfileCache>)> {
    let gateway: Arc<dyn AuthGateway> = Arc::new(gateway);
    let session = Arc::new(SessionStore::new(gateway));
    let profiles = cache_with(profile);
    let app = App::new(session, profiles.clone(), None, 4)?;
    Ok((app, profiles))
}

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

async fn press(app: &mut App, code: KeyCode) -> Result<()> {
    app.handle_key(key(code)).await
}

async fn type_text(app: &mut App, text: &str) -> Result<()> {
    for c in text.chars() {
        press(app, KeyCode::Char(c)).await?;
    }
    Ok(())
}

fn onboarding_step(app: &App) -> Option<OnboardingStep> {
    match &app.screen {
        Screen::Onboarding(screen) => Some(screen.flow.step()),
        _ => None,
    }
}

fn dashboard_view(app: &App) -> Option<DashboardView> {
    match &app.screen {
        Screen::Dashboard(screen) => Some(screen.state.view()),
        _ => None,
    }
}

/// Wait until no authentication attempt is in flight
async fn settle(app: &mut App) {
    while matches!(&app.screen, Screen::Onboarding(s) if s.flow.is_auth_in_flight()) {
        if !app.wait_for_event().await {
            break;
        }
    }
}

fn completed_profile() -> UserProfile {
    UserProfile {
        uid: Some("uid-1".to_string()),
        email: "jane@example.com".to_string(),
        name: "Jane".to_string(),
        height: Some(180.0),
        weight: Some(75.0),
        onboarding_completed: true,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_onboarding_through_to_a_rated_workout() -> Result<()> {
    let (mut app, profiles) = app_with(InMemoryAuthGateway::permissive(), None)?;
    app.start();
    assert_eq!(onboarding_step(&app), Some(OnboardingStep::LoginPrompt));

    type_text(&mut app, "jane@example.com").await?;
    press(&mut app, KeyCode::Tab).await?;
    type_text(&mut app, "secret1").await?;
    press(&mut app, KeyCode::Enter).await?;
    settle(&mut app).await;
    assert_eq!(onboarding_step(&app), Some(OnboardingStep::BiometricsInput));

    type_text(&mut app, "180").await?;
    press(&mut app, KeyCode::Tab).await?;
    type_text(&mut app, "75").await?;
    press(&mut app, KeyCode::Enter).await?;
    assert_eq!(onboarding_step(&app), Some(OnboardingStep::GoalSelection));

    // Goal, plan and duration take the highlighted first option
    press(&mut app, KeyCode::Enter).await?;
    press(&mut app, KeyCode::Enter).await?;
    press(&mut app, KeyCode::Enter).await?;

    assert_eq!(dashboard_view(&app), Some(DashboardView::Summary));
    let stored = profiles.load()?.expect("profile cached");
    assert!(stored.onboarding_completed);
    assert_eq!(stored.bmi, Some(23.1));

    press(&mut app, KeyCode::Char('s')).await?;
    assert_eq!(dashboard_view(&app), Some(DashboardView::Exercise));
    for _ in 0..4 {
        press(&mut app, KeyCode::Char('n')).await?;
    }
    assert_eq!(dashboard_view(&app), Some(DashboardView::RatingPrompt));

    press(&mut app, KeyCode::Char('2')).await?;
    assert_eq!(dashboard_view(&app), Some(DashboardView::Summary));
    let Screen::Dashboard(screen) = &app.screen else {
        panic!("expected dashboard");
    };
    assert_eq!(screen.state.activity().completed_this_week(), 1);
    assert!(screen.message.is_some());
    Ok(())
}

#[tokio::test]
async fn test_completed_profile_without_session_asks_to_sign_in() -> Result<()> {
    let (mut app, _profiles) = app_with(InMemoryAuthGateway::new(), Some(completed_profile()))?;
    app.start();

    // Dashboard waits for the session restore
    assert!(matches!(app.screen, Screen::Loading));

    assert!(app.wait_for_event().await);
    assert_eq!(onboarding_step(&app), Some(OnboardingStep::LoginPrompt));
    Ok(())
}

#[tokio::test]
async fn test_signing_back_in_returns_to_dashboard() -> Result<()> {
    let gateway = InMemoryAuthGateway::new().with_account("jane@example.com", "secret1", Some("Jane"));
    let uid = gateway.uid_for("jane@example.com").expect("registered");
    let profile = UserProfile {
        uid: Some(uid),
        ..completed_profile()
    };
    let (mut app, _profiles) = app_with(gateway, Some(profile))?;
    app.start();
    app.wait_for_event().await;

    // Email is pre-filled from the cached profile
    press(&mut app, KeyCode::Tab).await?;
    type_text(&mut app, "secret1").await?;
    press(&mut app, KeyCode::Enter).await?;
    settle(&mut app).await;

    assert_eq!(dashboard_view(&app), Some(DashboardView::Summary));
    Ok(())
}

#[tokio::test]
async fn test_logout_keeps_profile_and_returns_to_login() -> Result<()> {
    let gateway = InMemoryAuthGateway::new().with_account("jane@example.com", "secret1", Some("Jane"));
    let identity = gateway.sign_in("jane@example.com", "secret1").await?;
    let profile = UserProfile {
        uid: Some(identity.uid.clone()),
        ..completed_profile()
    };
    let (mut app, profiles) = app_with(gateway, Some(profile))?;
    app.start();
    // The gateway still holds the signed-in user
    app.wait_for_event().await;
    assert_eq!(dashboard_view(&app), Some(DashboardView::Summary));
    assert!(app.session().is_authenticated());

    press(&mut app, KeyCode::Char('p')).await?;
    assert_eq!(dashboard_view(&app), Some(DashboardView::Profile));
    press(&mut app, KeyCode::Char('o')).await?;

    assert_eq!(onboarding_step(&app), Some(OnboardingStep::LoginPrompt));
    assert!(!app.session().is_authenticated());
    assert!(profiles.load()?.map(|p| p.onboarding_completed).unwrap_or(false));
    Ok(())
}

#[tokio::test]
async fn test_weight_entry_updates_chart() -> Result<()> {
    let gateway = InMemoryAuthGateway::new().with_account("jane@example.com", "secret1", None);
    gateway.sign_in("jane@example.com", "secret1").await?;
    let (mut app, _profiles) = app_with(gateway, Some(completed_profile()))?;
    app.start();
    app.wait_for_event().await;

    press(&mut app, KeyCode::Char('w')).await?;
    type_text(&mut app, "74.2").await?;
    press(&mut app, KeyCode::Enter).await?;

    let Screen::Dashboard(screen) = &app.screen else {
        panic!("expected dashboard");
    };
    // Week 1 was seeded from the onboarding weight
    assert_eq!(screen.state.weights().len(), 2);
    assert_eq!(screen.message.as_deref(), Some("Week 2: 74.2 kg"));
    assert!(screen.weight_input.is_none());
    Ok(())
}

#[tokio::test]
async fn test_ctrl_c_quits_from_any_screen() -> Result<()> {
    let (mut app, _profiles) = app_with(InMemoryAuthGateway::new(), None)?;
    app.start();

    app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL))
        .await?;
    assert!(app.should_quit);
    Ok(())
}
