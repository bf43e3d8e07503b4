mod common;

use std::sync::Arc;

use pretty_assertions::assert_eq;
use rand::rngs::mock::StepRng;

use fittrack::auth::{AuthError, InMemoryAuthGateway, SessionStore};
use fittrack::models::{CompletionRating, InputError, WeeklyActivity, WeightLog};
use fittrack::services::{
    guard, initial_route, DashboardState, DashboardView, Navigation, Route, RouteDecision,
};
use fittrack::storage::{InMemoryProfileRepository, ProfileRepository};

use common::*;

fn dashboard() -> DashboardState {
    DashboardState::with_rng(
        completed_profile("uid-1"),
        WeeklyActivity::from_parts(1, 3, 4),
        WeightLog::new(),
        &mut StepRng::new(0, 1),
    )
}

#[test]
fn test_profile_overlay_takes_precedence() {
    let mut state = dashboard();
    state.start_workout(0).unwrap();
    assert_eq!(state.view(), DashboardView::Exercise);

    state.open_profile();
    assert_eq!(state.view(), DashboardView::Profile);

    state.close_profile();
    assert_eq!(state.view(), DashboardView::Exercise);
}

#[test]
fn test_workout_round_trip_through_dashboard() {
    let mut state = dashboard();
    state.start_workout(0).unwrap();

    let mut last = Navigation::Unchanged;
    while state.view() == DashboardView::Exercise {
        last = state.next_exercise();
    }
    assert_eq!(last, Navigation::EnteredRatingPrompt);
    assert_eq!(state.view(), DashboardView::RatingPrompt);

    let completed = state.rate_workout(CompletionRating::Mid).unwrap();
    assert!(completed.streak_incremented);
    assert_eq!(state.activity().weekly_streak(), 2);
    assert_eq!(state.activity().completed_this_week(), 0);
    assert_eq!(state.view(), DashboardView::Summary);
}

#[test]
fn test_weight_entries_take_next_week() {
    let mut state = dashboard();
    assert_eq!(state.add_weight("74.5").unwrap().week_index, 2);

    let sample = state.add_weight(" 74.2 ").unwrap();
    assert_eq!(sample.week_index, 3);
    assert_eq!(sample.weight, 74.2);
    assert_eq!(state.weights().bounds(), Some((74.2, 75.0)));
}

#[test]
fn test_bad_weight_leaves_chart_unchanged() {
    let mut state = dashboard();
    let before = state.weights().clone();

    assert!(matches!(
        state.add_weight("heavy"),
        Err(InputError::NotANumber { field: "weight", .. })
    ));
    assert!(state.add_weight("-3").is_err());
    assert_eq!(state.weights(), &before);
}

#[test]
fn test_greeting_falls_back_to_user() {
    let mut profile = completed_profile("uid-1");
    profile.name.clear();
    let state = DashboardState::with_rng(
        profile,
        WeeklyActivity::default(),
        WeightLog::new(),
        &mut StepRng::new(0, 1),
    );
    assert_eq!(state.greeting(None), "Hi, User!");
}

#[test]
fn test_logout_keeps_cached_profile() {
    tokio_test::block_on(async {
        let repo = Arc::new(InMemoryProfileRepository::with_profile(completed_profile("uid-1")));
        let gateway = gateway_with_jane();
        let session = SessionStore::new(gateway.clone());
        session.set_identity(fittrack::auth::Identity::new("uid-1"));

        let mut state = dashboard();
        state.open_profile();
        let route = state.logout(&session).await.unwrap();

        assert_eq!(route, Route::Entry);
        assert!(!state.is_profile_open());
        assert!(!session.snapshot().is_authenticated());

        // Completed cache still routes to the dashboard, whose guard sends an
        // anonymous visitor back to the entry screen.
        let cached = repo.load().unwrap();
        assert_eq!(initial_route(cached.as_ref()), Route::Dashboard);
        assert_eq!(
            guard(Route::Dashboard, &session.snapshot(), cached.as_ref()),
            RouteDecision::Redirect(Route::Entry)
        );
    });
}

#[test]
fn test_failed_logout_keeps_session() {
    tokio_test::block_on(async {
        let gateway = Arc::new(InMemoryAuthGateway::new());
        let session = SessionStore::new(gateway.clone());
        session.set_identity(fittrack::auth::Identity::new("uid-1"));
        gateway.fail_next(AuthError::Network("offline".to_string())).unwrap();

        let mut state = dashboard();
        assert!(state.logout(&session).await.is_err());
        assert!(session.snapshot().is_authenticated());
    });
}
