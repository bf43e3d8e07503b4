use rand::seq::SliceRandom;
use rand::Rng;

use crate::auth::{AuthError, Identity, SessionStore};
use crate::models::{
    CompletionRating, InputError, UserProfile, WeeklyActivity, WeightLog, WeightSample, WorkoutPlan,
};
use crate::services::routing_service::Route;
use crate::services::workout_session_service::{CompletedWorkout, Navigation, SessionError, WorkoutSession};

pub const ENCOURAGEMENT_MESSAGES: [&str; 4] = [
    "You're doing great! Keep pushing!",
    "Every workout brings you closer to your goals!",
    "Stay consistent, stay strong!",
    "You've got this! Another week, another victory!",
];

/// The single view the dashboard shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardView {
    Profile,
    RatingPrompt,
    Exercise,
    Summary,
}

/// Choose the visible view. Checked in fixed order: profile overlay, pending
/// rating, active workout, then the summary.
pub fn select_view(profile_open: bool, session: &WorkoutSession) -> DashboardView {
    if profile_open {
        DashboardView::Profile
    } else if session.is_awaiting_rating() {
        DashboardView::RatingPrompt
    } else if session.is_active() {
        DashboardView::Exercise
    } else {
        DashboardView::Summary
    }
}

/// Aggregate state behind the dashboard
#[derive(Debug, Clone)]
pub struct DashboardState {
    profile: UserProfile,
    profile_open: bool,
    session: WorkoutSession,
    activity: WeeklyActivity,
    weights: WeightLog,
    plans: Vec<WorkoutPlan>,
    encouragement: &'static str,
}

impl DashboardState {
    pub fn new(profile: UserProfile, activity: WeeklyActivity, weights: WeightLog) -> Self {
        Self::with_rng(profile, activity, weights, &mut rand::thread_rng())
    }

    /// Same as `new` with a caller-supplied source for the encouragement pick
    pub fn with_rng<R: Rng + ?Sized>(
        profile: UserProfile,
        activity: WeeklyActivity,
        mut weights: WeightLog,
        rng: &mut R,
    ) -> Self {
        if weights.is_empty() {
            if let Some(weight) = profile.weight {
                if weights.append(weight).is_ok() {
                    tracing::debug!("Seeded weight log with onboarding weight {}", weight);
                }
            }
        }

        let encouragement = ENCOURAGEMENT_MESSAGES
            .choose(rng)
            .copied()
            .unwrap_or(ENCOURAGEMENT_MESSAGES[0]);

        Self {
            profile,
            profile_open: false,
            session: WorkoutSession::new(),
            activity,
            weights,
            plans: WorkoutPlan::catalog(),
            encouragement,
        }
    }

    pub fn view(&self) -> DashboardView {
        select_view(self.profile_open, &self.session)
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn session(&self) -> &WorkoutSession {
        &self.session
    }

    pub fn activity(&self) -> &WeeklyActivity {
        &self.activity
    }

    pub fn weights(&self) -> &WeightLog {
        &self.weights
    }

    pub fn plans(&self) -> &[WorkoutPlan] {
        &self.plans
    }

    pub fn encouragement(&self) -> &'static str {
        self.encouragement
    }

    pub fn is_profile_open(&self) -> bool {
        self.profile_open
    }

    /// "Hi, Name!" using the identity's display name, then the profile name
    pub fn greeting(&self, identity: Option<&Identity>) -> String {
        let name = identity
            .and_then(|i| i.display_name.as_deref())
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| self.profile.display_name());
        format!("Hi, {}!", name)
    }

    pub fn open_profile(&mut self) {
        self.profile_open = true;
    }

    pub fn close_profile(&mut self) {
        self.profile_open = false;
    }

    pub fn start_workout(&mut self, plan_index: usize) -> Result<(), SessionError> {
        let plan = self
            .plans
            .get(plan_index)
            .cloned()
            .ok_or(SessionError::UnknownPlan(plan_index))?;
        self.session.start(plan)
    }

    pub fn next_exercise(&mut self) -> Navigation {
        self.session.next()
    }

    pub fn previous_exercise(&mut self) -> Navigation {
        self.session.previous()
    }

    pub fn cancel_workout(&mut self) -> Navigation {
        self.session.cancel()
    }

    /// Rate the finished workout; updates the weekly counters
    pub fn rate_workout(&mut self, rating: CompletionRating) -> Result<CompletedWorkout, SessionError> {
        self.session.rate(rating, &mut self.activity)
    }

    /// Add a weight typed on the chart. Bad input leaves the chart unchanged.
    pub fn add_weight(&mut self, input: &str) -> Result<WeightSample, InputError> {
        match self.weights.append_input(input) {
            Ok(sample) => {
                tracing::debug!("Recorded weight {} for week {}", sample.weight, sample.week_index);
                Ok(sample.clone())
            }
            Err(e) => {
                tracing::debug!("Ignoring weight input: {}", e);
                Err(e)
            }
        }
    }

    /// Sign out and return the route to show next.
    ///
    /// The cached profile is left in place, so the next start-up still goes
    /// to the dashboard.
    pub async fn logout(&mut self, session: &SessionStore) -> Result<Route, AuthError> {
        session.sign_out().await?;
        self.profile_open = false;
        tracing::info!("Signed out");
        Ok(Route::Entry)
    }
}
