// Flow controllers behind the screens

pub mod dashboard_service;
pub mod onboarding_service;
pub mod routing_service;
pub mod workout_session_service;

pub use dashboard_service::{select_view, DashboardState, DashboardView, ENCOURAGEMENT_MESSAGES};
pub use onboarding_service::{AuthMethod, OnboardingError, OnboardingFlow, OnboardingStep, ProfileDraft};
pub use routing_service::{guard, initial_route, Route, RouteDecision};
pub use workout_session_service::{CompletedWorkout, Navigation, SessionError, SessionState, WorkoutSession};
