#![allow(dead_code)]

use std::sync::{Arc, Once};

use fittrack::auth::InMemoryAuthGateway;
use fittrack::models::{FitnessGoal, PlanTier, ProgramDuration, UserProfile};
use fittrack::services::OnboardingFlow;
use fittrack::storage::InMemoryProfileRepository;

static INIT: Once = Once::new();

/// Initialize test logging; RUST_LOG overrides the default level
pub fn init_test_logging() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
            )
            .with_test_writer()
            .init();
    });
}

pub const EMAIL: &str = "jane@example.com";
pub const PASSWORD: &str = "hunter22";

pub fn repository() -> Arc<InMemoryProfileRepository> {
    Arc::new(InMemoryProfileRepository::new())
}

pub fn gateway_with_jane() -> Arc<InMemoryAuthGateway> {
    Arc::new(InMemoryAuthGateway::new().with_account(EMAIL, PASSWORD, Some("Jane")))
}

pub fn completed_profile(uid: &str) -> UserProfile {
    UserProfile {
        uid: Some(uid.to_string()),
        email: EMAIL.to_string(),
        name: "Jane".to_string(),
        age: Some(30),
        height: Some(180.0),
        weight: Some(75.0),
        goal: Some(FitnessGoal::MuscleGain),
        workout_plan: Some(PlanTier::Intermediate),
        workout_duration: Some(ProgramDuration::TwelveWeeks),
        bmi: Some(23.1),
        onboarding_completed: true,
        ..Default::default()
    }
}

/// Walk the profile steps after a successful authentication
pub fn fill_profile(flow: &mut OnboardingFlow) {
    flow.set_height("180").unwrap();
    flow.set_weight("75").unwrap();
    flow.set_age("30").unwrap();
    flow.next().unwrap();
    flow.select_goal(FitnessGoal::MuscleGain).unwrap();
    flow.next().unwrap();
    flow.select_plan(PlanTier::Intermediate).unwrap();
    flow.next().unwrap();
    flow.select_duration(ProgramDuration::TwelveWeeks).unwrap();
}
