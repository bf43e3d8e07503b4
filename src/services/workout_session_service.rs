use thiserror::Error;

use crate::models::{CompletionRating, WeeklyActivity, WorkoutPlan, WorkoutProgress};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Workout plan \"{0}\" has no exercises")]
    EmptyPlan(String),
    #[error("A workout is already in progress")]
    AlreadyActive,
    #[error("No workout is waiting for a rating")]
    NotAwaitingRating,
    #[error("No workout plan at position {0}")]
    UnknownPlan(usize),
}

/// Where the workout session currently is
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Inactive,
    ExerciseBrowsing(WorkoutProgress),
    RatingPrompt(WorkoutProgress),
}

/// Result of a navigation call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Moved,
    /// Already at the boundary, or nothing to navigate
    Unchanged,
    EnteredRatingPrompt,
    Cancelled,
}

/// Summary of a finished workout
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedWorkout {
    pub plan_name: String,
    pub rating: CompletionRating,
    pub streak_incremented: bool,
    pub activity: WeeklyActivity,
}

/// Workout execution: browse exercises, then rate the session.
///
/// Progress lives only in memory and is discarded on completion or cancel.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutSession {
    state: SessionState,
}

impl Default for WorkoutSession {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkoutSession {
    pub fn new() -> Self {
        Self {
            state: SessionState::Inactive,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.state, SessionState::Inactive)
    }

    pub fn is_awaiting_rating(&self) -> bool {
        matches!(self.state, SessionState::RatingPrompt(_))
    }

    pub fn progress(&self) -> Option<&WorkoutProgress> {
        match &self.state {
            SessionState::Inactive => None,
            SessionState::ExerciseBrowsing(p) | SessionState::RatingPrompt(p) => Some(p),
        }
    }

    pub fn start(&mut self, plan: WorkoutPlan) -> Result<(), SessionError> {
        if self.is_active() {
            return Err(SessionError::AlreadyActive);
        }
        let name = plan.name.clone();
        let progress = WorkoutProgress::new(plan).ok_or_else(|| SessionError::EmptyPlan(name.clone()))?;
        tracing::debug!("Starting workout {}", name);
        self.state = SessionState::ExerciseBrowsing(progress);
        Ok(())
    }

    /// Next exercise; on the last one this asks for the rating instead
    pub fn next(&mut self) -> Navigation {
        let state = std::mem::replace(&mut self.state, SessionState::Inactive);
        let (state, nav) = match state {
            SessionState::ExerciseBrowsing(mut progress) => {
                if progress.advance() {
                    (SessionState::ExerciseBrowsing(progress), Navigation::Moved)
                } else {
                    tracing::debug!("Last exercise of {} reached, asking for rating", progress.plan().name);
                    (SessionState::RatingPrompt(progress), Navigation::EnteredRatingPrompt)
                }
            }
            other => (other, Navigation::Unchanged),
        };
        self.state = state;
        nav
    }

    pub fn previous(&mut self) -> Navigation {
        match &mut self.state {
            SessionState::ExerciseBrowsing(progress) => {
                if progress.retreat() {
                    Navigation::Moved
                } else {
                    Navigation::Unchanged
                }
            }
            _ => Navigation::Unchanged,
        }
    }

    /// Abandon the workout without counting it
    pub fn cancel(&mut self) -> Navigation {
        if !self.is_active() {
            return Navigation::Unchanged;
        }
        if let Some(progress) = self.progress() {
            tracing::debug!("Workout {} abandoned", progress.plan().name);
        }
        self.state = SessionState::Inactive;
        Navigation::Cancelled
    }

    /// Record the rating and count the workout towards the week.
    ///
    /// The counters are computed on a copy and written back in one step.
    pub fn rate(
        &mut self,
        rating: CompletionRating,
        activity: &mut WeeklyActivity,
    ) -> Result<CompletedWorkout, SessionError> {
        let SessionState::RatingPrompt(progress) = &mut self.state else {
            return Err(SessionError::NotAwaitingRating);
        };
        progress.completion_rating = Some(rating);

        let mut updated = *activity;
        let streak_incremented = updated.record_completion();
        let completed = CompletedWorkout {
            plan_name: progress.plan().name.clone(),
            rating,
            streak_incremented,
            activity: updated,
        };

        *activity = updated;
        self.state = SessionState::Inactive;

        tracing::info!(
            "Workout {} completed with rating {} ({}/{} this week, streak {})",
            completed.plan_name,
            rating.ordinal(),
            updated.completed_this_week(),
            updated.weekly_goal(),
            updated.weekly_streak()
        );
        Ok(completed)
    }
}
