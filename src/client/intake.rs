//! The profile intake questionnaire, as typed by the user.

use thiserror::Error;

use crate::client::schema::ProfileIntake;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IntakeError {
    #[error("Please fill in all required fields: {}", .0.join(", "))]
    Missing(Vec<&'static str>),
    #[error("{field} must be a number, got {value:?}")]
    NotANumber { field: &'static str, value: String },
}

/// Raw form input; every field is required.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntakeForm {
    pub age: String,
    pub gender: String,
    pub height: String,
    pub weight: String,
    pub goal: String,
    pub diet_preference: String,
    pub activity_level: String,
    pub workout_time: String,
}

impl IntakeForm {
    /// Checks that every field is filled and converts the numeric ones.
    pub fn validate(&self) -> Result<ProfileIntake, IntakeError> {
        let fields = [
            ("age", &self.age),
            ("gender", &self.gender),
            ("height", &self.height),
            ("weight", &self.weight),
            ("goal", &self.goal),
            ("diet_preference", &self.diet_preference),
            ("activity_level", &self.activity_level),
            ("workout_time", &self.workout_time),
        ];
        let missing: Vec<&'static str> = fields
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(IntakeError::Missing(missing));
        }

        Ok(ProfileIntake {
            age: number("age", &self.age)?,
            gender: self.gender.trim().to_string(),
            height: number("height", &self.height)?,
            weight: number("weight", &self.weight)?,
            goal: self.goal.trim().to_string(),
            diet_preference: self.diet_preference.trim().to_string(),
            activity_level: self.activity_level.trim().to_string(),
            workout_time: self.workout_time.trim().to_string(),
        })
    }
}

fn number<T: std::str::FromStr>(field: &'static str, raw: &str) -> Result<T, IntakeError> {
    raw.trim().parse().map_err(|_| IntakeError::NotANumber {
        field,
        value: raw.to_string(),
    })
}
