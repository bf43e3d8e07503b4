use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::InputError;

/// Fitness goal picked during onboarding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FitnessGoal {
    WeightLoss,
    MuscleGain,
    Endurance,
    Flexibility,
}

impl FitnessGoal {
    pub const ALL: [FitnessGoal; 4] = [
        FitnessGoal::WeightLoss,
        FitnessGoal::MuscleGain,
        FitnessGoal::Endurance,
        FitnessGoal::Flexibility,
    ];

    /// Label shown in selection lists
    pub fn label(&self) -> &'static str {
        match self {
            FitnessGoal::WeightLoss => "Weight Loss",
            FitnessGoal::MuscleGain => "Muscle Gain",
            FitnessGoal::Endurance => "Improve Endurance",
            FitnessGoal::Flexibility => "Increase Flexibility",
        }
    }
}

impl fmt::Display for FitnessGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FitnessGoal::WeightLoss => "weight-loss",
            FitnessGoal::MuscleGain => "muscle-gain",
            FitnessGoal::Endurance => "endurance",
            FitnessGoal::Flexibility => "flexibility",
        };
        write!(f, "{s}")
    }
}

impl FromStr for FitnessGoal {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "weight-loss" => Ok(FitnessGoal::WeightLoss),
            "muscle-gain" => Ok(FitnessGoal::MuscleGain),
            "endurance" => Ok(FitnessGoal::Endurance),
            "flexibility" => Ok(FitnessGoal::Flexibility),
            _ => Err(InputError::UnknownOption {
                field: "goal",
                value: s.to_string(),
            }),
        }
    }
}

/// Workout plan difficulty tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    Beginner,
    Intermediate,
    Advanced,
}

impl PlanTier {
    pub const ALL: [PlanTier; 3] = [PlanTier::Beginner, PlanTier::Intermediate, PlanTier::Advanced];

    pub fn label(&self) -> &'static str {
        match self {
            PlanTier::Beginner => "Beginner",
            PlanTier::Intermediate => "Intermediate",
            PlanTier::Advanced => "Advanced",
        }
    }
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label().to_lowercase())
    }
}

impl FromStr for PlanTier {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Ok(PlanTier::Beginner),
            "intermediate" => Ok(PlanTier::Intermediate),
            "advanced" => Ok(PlanTier::Advanced),
            _ => Err(InputError::UnknownOption {
                field: "workoutPlan",
                value: s.to_string(),
            }),
        }
    }
}

/// Program length in weeks. Serialized as the bare number of weeks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ProgramDuration {
    FourWeeks,
    EightWeeks,
    TwelveWeeks,
    SixteenWeeks,
}

impl ProgramDuration {
    pub const ALL: [ProgramDuration; 4] = [
        ProgramDuration::FourWeeks,
        ProgramDuration::EightWeeks,
        ProgramDuration::TwelveWeeks,
        ProgramDuration::SixteenWeeks,
    ];

    pub fn weeks(&self) -> u8 {
        match self {
            ProgramDuration::FourWeeks => 4,
            ProgramDuration::EightWeeks => 8,
            ProgramDuration::TwelveWeeks => 12,
            ProgramDuration::SixteenWeeks => 16,
        }
    }

    pub fn label(&self) -> String {
        format!("{} weeks", self.weeks())
    }
}

impl From<ProgramDuration> for u8 {
    fn from(value: ProgramDuration) -> Self {
        value.weeks()
    }
}

impl TryFrom<u8> for ProgramDuration {
    type Error = InputError;

    fn try_from(weeks: u8) -> Result<Self, Self::Error> {
        match weeks {
            4 => Ok(ProgramDuration::FourWeeks),
            8 => Ok(ProgramDuration::EightWeeks),
            12 => Ok(ProgramDuration::TwelveWeeks),
            16 => Ok(ProgramDuration::SixteenWeeks),
            other => Err(InputError::UnknownOption {
                field: "workoutDuration",
                value: other.to_string(),
            }),
        }
    }
}

impl FromStr for ProgramDuration {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_end_matches("weeks").trim();
        let weeks: u8 = trimmed.parse().map_err(|_| InputError::UnknownOption {
            field: "workoutDuration",
            value: s.to_string(),
        })?;
        ProgramDuration::try_from(weeks)
    }
}

/// Body mass index: weight(kg) / height(m)², rounded to one decimal.
///
/// Callers validate inputs first; both must be finite and positive.
pub fn calculate_bmi(height_cm: f64, weight_kg: f64) -> f64 {
    let height_m = height_cm / 100.0;
    let bmi = weight_kg / (height_m * height_m);
    (bmi * 10.0).round() / 10.0
}

/// Profile record kept in the local cache under the `userData` key.
///
/// Built up across onboarding steps; the password never lives here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub goal: Option<FitnessGoal>,
    #[serde(default, rename = "workoutPlan")]
    pub workout_plan: Option<PlanTier>,
    #[serde(default, rename = "workoutDuration")]
    pub workout_duration: Option<ProgramDuration>,
    #[serde(default)]
    pub bmi: Option<f64>,
    #[serde(default)]
    pub onboarding_completed: bool,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    /// Name used in greetings, falling back to "User"
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            "User"
        } else {
            &self.name
        }
    }

    /// Derived BMI, when both biometrics are known
    pub fn derived_bmi(&self) -> Option<f64> {
        match (self.height, self.weight) {
            (Some(h), Some(w)) if h > 0.0 && w > 0.0 => Some(calculate_bmi(h, w)),
            _ => None,
        }
    }

    /// Stamp the record before it is written out
    pub fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }
}
