use serde::{Deserialize, Serialize};

pub const DEFAULT_WEEKLY_WORKOUT_GOAL: u32 = 4;

/// Weekly streak and progress counters.
///
/// `completed_this_week` stays strictly below `weekly_goal`: reaching the goal
/// bumps the streak and resets the count in the same call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyActivity {
    weekly_streak: u32,
    completed_this_week: u32,
    weekly_goal: u32,
}

impl Default for WeeklyActivity {
    fn default() -> Self {
        Self::with_goal(DEFAULT_WEEKLY_WORKOUT_GOAL)
    }
}

impl WeeklyActivity {
    /// A goal of zero is raised to one
    pub fn with_goal(weekly_goal: u32) -> Self {
        Self {
            weekly_streak: 0,
            completed_this_week: 0,
            weekly_goal: weekly_goal.max(1),
        }
    }

    /// Rebuild counters from stored values, normalising anything out of range
    pub fn from_parts(weekly_streak: u32, completed_this_week: u32, weekly_goal: u32) -> Self {
        let weekly_goal = weekly_goal.max(1);
        Self {
            weekly_streak,
            completed_this_week: completed_this_week % weekly_goal,
            weekly_goal,
        }
    }

    pub fn weekly_streak(&self) -> u32 {
        self.weekly_streak
    }

    pub fn completed_this_week(&self) -> u32 {
        self.completed_this_week
    }

    pub fn weekly_goal(&self) -> u32 {
        self.weekly_goal
    }

    /// Count one finished workout. Returns true when the streak went up.
    pub fn record_completion(&mut self) -> bool {
        let completed = self.completed_this_week + 1;
        if completed == self.weekly_goal {
            self.weekly_streak += 1;
            self.completed_this_week = 0;
            true
        } else {
            self.completed_this_week = completed;
            false
        }
    }

    pub fn progress_percentage(&self) -> f64 {
        self.completed_this_week as f64 / self.weekly_goal as f64 * 100.0
    }
}
