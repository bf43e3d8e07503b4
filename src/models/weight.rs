use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::InputError;

/// One point on the weight chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightSample {
    pub week_index: u32,
    pub weight: f64,
    pub recorded_at: DateTime<Utc>,
}

/// Append-only, week-ordered weight history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightLog {
    samples: Vec<WeightSample>,
}

impl WeightLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from stored samples, re-sorted by week
    pub fn from_samples(mut samples: Vec<WeightSample>) -> Self {
        samples.sort_by_key(|s| s.week_index);
        Self { samples }
    }

    pub fn samples(&self) -> &[WeightSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn latest(&self) -> Option<&WeightSample> {
        self.samples.last()
    }

    /// Append a measured weight as the next week
    pub fn append(&mut self, weight: f64) -> Result<&WeightSample, InputError> {
        if !weight.is_finite() || weight <= 0.0 {
            return Err(InputError::OutOfRange {
                field: "weight",
                value: weight.to_string(),
            });
        }
        let week_index = self.samples.len() as u32 + 1;
        self.samples.push(WeightSample {
            week_index,
            weight,
            recorded_at: Utc::now(),
        });
        Ok(&self.samples[self.samples.len() - 1])
    }

    /// Parse user text and append it. Unparseable input leaves the log untouched.
    pub fn append_input(&mut self, input: &str) -> Result<&WeightSample, InputError> {
        let weight = parse_measurement("weight", input)?;
        self.append(weight)
    }

    /// Lowest and highest recorded weight, used for chart bounds
    pub fn bounds(&self) -> Option<(f64, f64)> {
        let mut iter = self.samples.iter().map(|s| s.weight);
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), w| (lo.min(w), hi.max(w))))
    }
}

/// Parse a positive, finite number typed by the user
pub fn parse_measurement(field: &'static str, input: &str) -> Result<f64, InputError> {
    let trimmed = input.trim();
    let value: f64 = trimmed.parse().map_err(|_| InputError::NotANumber {
        field,
        value: input.to_string(),
    })?;
    if !value.is_finite() || value <= 0.0 {
        return Err(InputError::OutOfRange {
            field,
            value: input.to_string(),
        });
    }
    Ok(value)
}
