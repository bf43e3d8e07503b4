use std::fmt;

use crate::auth::SessionSnapshot;
use crate::models::UserProfile;

/// Logical screens of the app
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Login and profile onboarding
    Entry,
    Dashboard,
    Signup,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Entry => write!(f, "/"),
            Route::Dashboard => write!(f, "/dashboard"),
            Route::Signup => write!(f, "/signup"),
        }
    }
}

/// Outcome of entering a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Show(Route),
    Redirect(Route),
    /// Session still restoring; show a loading screen
    Loading,
}

/// First screen after start-up, decided from the cached profile alone.
///
/// A completed profile goes straight to the dashboard even when nobody is
/// signed in; the dashboard guard then takes over.
pub fn initial_route(cached: Option<&UserProfile>) -> Route {
    match cached {
        Some(profile) if profile.onboarding_completed => Route::Dashboard,
        _ => Route::Entry,
    }
}

/// Apply the access rules for a requested route
pub fn guard(requested: Route, session: &SessionSnapshot, cached: Option<&UserProfile>) -> RouteDecision {
    match requested {
        Route::Dashboard if session.loading => RouteDecision::Loading,
        Route::Dashboard if !session.is_authenticated() => {
            tracing::debug!("Unauthenticated dashboard access, redirecting to {}", Route::Entry);
            RouteDecision::Redirect(Route::Entry)
        }
        Route::Entry
            if session.is_authenticated() && cached.map(|p| p.onboarding_completed).unwrap_or(false) =>
        {
            RouteDecision::Redirect(Route::Dashboard)
        }
        route => RouteDecision::Show(route),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Identity;

    fn signed_in() -> SessionSnapshot {
        SessionSnapshot {
            identity: Some(Identity::new("uid-1")),
            loading: false,
        }
    }

    fn completed() -> UserProfile {
        UserProfile {
            onboarding_completed: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_initial_route_follows_cache() {
        assert_eq!(initial_route(None), Route::Entry);
        assert_eq!(initial_route(Some(&UserProfile::default())), Route::Entry);
        assert_eq!(initial_route(Some(&completed())), Route::Dashboard);
    }

    #[test]
    fn test_dashboard_requires_identity() {
        let signed_out = SessionSnapshot::default();
        assert_eq!(
            guard(Route::Dashboard, &signed_out, Some(&completed())),
            RouteDecision::Redirect(Route::Entry)
        );
        assert_eq!(
            guard(Route::Dashboard, &signed_in(), None),
            RouteDecision::Show(Route::Dashboard)
        );
    }

    #[test]
    fn test_dashboard_waits_for_session() {
        let loading = SessionSnapshot {
            identity: None,
            loading: true,
        };
        assert_eq!(guard(Route::Dashboard, &loading, None), RouteDecision::Loading);
    }

    #[test]
    fn test_entry_with_completed_profile_and_identity_goes_to_dashboard() {
        assert_eq!(
            guard(Route::Entry, &signed_in(), Some(&completed())),
            RouteDecision::Redirect(Route::Dashboard)
        );
        assert_eq!(
            guard(Route::Entry, &SessionSnapshot::default(), Some(&completed())),
            RouteDecision::Show(Route::Entry)
        );
        assert_eq!(
            guard(Route::Signup, &SessionSnapshot::default(), None),
            RouteDecision::Show(Route::Signup)
        );
    }
}
