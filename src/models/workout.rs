use serde::{Deserialize, Serialize};
use std::fmt;

/// A single exercise inside a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub name: String,
    pub target_sets: u32,
    pub target_reps: u32,
    pub illustration_ref: String,
}

impl Exercise {
    pub fn new(name: &str, target_sets: u32, target_reps: u32) -> Self {
        let slug = name
            .to_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .collect::<String>();
        Self {
            name: name.to_string(),
            target_sets,
            target_reps,
            illustration_ref: format!("illustrations/{}.svg", slug.trim_matches('-')),
        }
    }

    /// "3 sets x 10 reps"
    pub fn prescription(&self) -> String {
        format!("{} sets x {} reps", self.target_sets, self.target_reps)
    }
}

/// Static workout plan from the bundled catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutPlan {
    pub name: String,
    pub exercises: Vec<Exercise>,
}

impl WorkoutPlan {
    pub fn new(name: &str, exercises: Vec<Exercise>) -> Self {
        Self {
            name: name.to_string(),
            exercises,
        }
    }

    pub fn len(&self) -> usize {
        self.exercises.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }

    /// Bundled, read-only plan catalog
    pub fn catalog() -> Vec<WorkoutPlan> {
        vec![
            WorkoutPlan::new(
                "Upper Body Strength",
                vec![
                    Exercise::new("Bench Press", 3, 10),
                    Exercise::new("Pull-ups", 3, 8),
                    Exercise::new("Shoulder Press", 3, 10),
                    Exercise::new("Tricep Dips", 3, 12),
                ],
            ),
            WorkoutPlan::new(
                "Lower Body Power",
                vec![
                    Exercise::new("Squats", 4, 8),
                    Exercise::new("Deadlifts", 3, 8),
                    Exercise::new("Leg Press", 3, 12),
                    Exercise::new("Calf Raises", 3, 15),
                ],
            ),
        ]
    }
}

/// Post-workout rating on a three point scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionRating {
    Low,
    Mid,
    High,
}

impl CompletionRating {
    pub const ALL: [CompletionRating; 3] = [
        CompletionRating::Low,
        CompletionRating::Mid,
        CompletionRating::High,
    ];

    /// Ordinal stored for the rating (1/3/5)
    pub fn ordinal(&self) -> u8 {
        match self {
            CompletionRating::Low => 1,
            CompletionRating::Mid => 3,
            CompletionRating::High => 5,
        }
    }
}

impl fmt::Display for CompletionRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionRating::Low => write!(f, "Tough"),
            CompletionRating::Mid => write!(f, "Okay"),
            CompletionRating::High => write!(f, "Great"),
        }
    }
}

/// Progress through one plan. Lives only as long as the session.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutProgress {
    plan: WorkoutPlan,
    current_exercise_index: usize,
    pub completion_rating: Option<CompletionRating>,
}

impl WorkoutProgress {
    /// Returns `None` for a plan without exercises.
    pub fn new(plan: WorkoutPlan) -> Option<Self> {
        if plan.is_empty() {
            return None;
        }
        Some(Self {
            plan,
            current_exercise_index: 0,
            completion_rating: None,
        })
    }

    pub fn plan(&self) -> &WorkoutPlan {
        &self.plan
    }

    pub fn current_exercise_index(&self) -> usize {
        self.current_exercise_index
    }

    pub fn current_exercise(&self) -> &Exercise {
        &self.plan.exercises[self.current_exercise_index]
    }

    pub fn is_last_exercise(&self) -> bool {
        self.current_exercise_index + 1 == self.plan.len()
    }

    /// Step forward; returns false when already on the last exercise.
    pub fn advance(&mut self) -> bool {
        if self.is_last_exercise() {
            return false;
        }
        self.current_exercise_index += 1;
        true
    }

    /// Step back; returns false when already on the first exercise.
    pub fn retreat(&mut self) -> bool {
        if self.current_exercise_index == 0 {
            return false;
        }
        self.current_exercise_index -= 1;
        true
    }

    /// Percentage of the plan reached, counting the current exercise
    pub fn progress_percentage(&self) -> f64 {
        (self.current_exercise_index + 1) as f64 / self.plan.len() as f64 * 100.0
    }
}
