//! Typed records for the backend's JSON API.
//!
//! Every endpoint answers with an envelope carrying a boolean `success` and,
//! on failure, a `message`. [`decode`] checks the envelope first and only
//! then deserializes the payload, so a schema violation surfaces as
//! [`ApiError::Schema`] instead of leaking nulls to the caller.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::http::response::StatusCode;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to backend failed: {0:#}")]
    Transport(#[from] anyhow::Error),

    #[error("response (status {status}) is not JSON: {source}")]
    NotJson {
        status: u16,
        #[source]
        source: serde_json::Error,
    },

    #[error("backend reported failure (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("response does not match the expected schema: {0}")]
    Schema(#[source] serde_json::Error),
}

impl ApiError {
    /// The backend's own failure message, when it sent one.
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            ApiError::Rejected { message, .. } => Some(message),
            _ => None,
        }
    }
}

/// Validates the `success` envelope of `body` and deserializes it as `T`.
///
/// A missing or non-boolean `success` flag counts as a schema violation.
pub fn decode<T: DeserializeOwned>(status: StatusCode, body: &[u8]) -> Result<T, ApiError> {
    let value: Value = serde_json::from_slice(body).map_err(|source| ApiError::NotJson {
        status: status.as_u16(),
        source,
    })?;

    let envelope: Envelope = serde_json::from_value(value.clone()).map_err(ApiError::Schema)?;
    if !envelope.success {
        return Err(ApiError::Rejected {
            status: status.as_u16(),
            message: envelope
                .message
                .unwrap_or_else(|| "Request failed".to_string()),
        });
    }

    serde_json::from_value(value).map_err(ApiError::Schema)
}

#[derive(Debug, Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    message: Option<String>,
}

/// Payload-less acknowledgement (`{"success": true, "message": ...}`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HealthStatus {
    pub message: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    /// Whether the intake form has been submitted.
    #[serde(default)]
    pub profile_complete: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Answer to `/api/login` and `/api/register`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuthResponse {
    pub user: User,
    #[serde(default)]
    pub message: Option<String>,
}

/// The intake questionnaire as the backend stores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileIntake {
    pub age: u32,
    pub gender: String,
    pub height: f64,
    pub weight: f64,
    pub goal: String,
    pub diet_preference: String,
    pub activity_level: String,
    pub workout_time: String,
}

/// A stored profile: the intake plus what the backend derived from it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StoredProfile {
    #[serde(flatten)]
    pub intake: ProfileIntake,
    #[serde(default)]
    pub target_calories: Option<f64>,
}

/// Answer to `GET /api/profile`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProfileResponse {
    pub user: User,
    #[serde(default)]
    pub profile: Option<StoredProfile>,
}

/// Answer to `POST /api/profile`. The generated plans are kept opaque; the
/// dedicated endpoints return them in typed form.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProfileSaved {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub diet_plan: Option<Value>,
    #[serde(default)]
    pub workout_plan: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub calories_consumed: f64,
    pub calories_target: f64,
    pub calories_burned: f64,
    pub workouts_completed: u32,
    pub workouts_planned: u32,
    #[serde(default)]
    pub calories_planned: Option<f64>,
}

impl DashboardStats {
    /// Shown when the stats cannot be fetched.
    pub fn fallback() -> Self {
        Self {
            calories_consumed: 0.0,
            calories_target: 2000.0,
            calories_burned: 0.0,
            workouts_completed: 0,
            workouts_planned: 0,
            calories_planned: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct DashboardStatsResponse {
    pub stats: DashboardStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodItem {
    pub name: String,
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub fat: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MacroTotals {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

/// Answer to `GET /api/diet-plan`: food items grouped by meal type, in the
/// order the backend listed the meals.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DietPlan {
    #[serde(deserialize_with = "ordered_meals")]
    pub meals: Vec<(String, Vec<FoodItem>)>,
    pub totals: MacroTotals,
}

fn ordered_meals<'de, D>(deserializer: D) -> Result<Vec<(String, Vec<FoodItem>)>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    // serde_json's preserve_order keeps the backend's key order here
    let map = serde_json::Map::<String, Value>::deserialize(deserializer)?;
    map.into_iter()
        .map(|(meal, items)| {
            serde_json::from_value(items)
                .map(|items| (meal, items))
                .map_err(serde::de::Error::custom)
        })
        .collect()
}

/// Reps are a count (`12`) or a range/description (`"8-10"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reps {
    Count(u32),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub name: String,
    #[serde(default)]
    pub sets: Option<u32>,
    #[serde(default)]
    pub reps: Option<Reps>,
    /// Minutes.
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub calories: Option<f64>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, alias = "muscleGroups")]
    pub muscle_groups: Vec<String>,
    #[serde(default)]
    pub instructions: Option<String>,
}

/// A workout as returned by `GET` and `POST /api/workout-plan`.
///
/// The stored plan names itself `name`, a freshly generated one
/// `workout_name`; both are accepted. Missing totals are summed from the
/// exercises.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorkoutPlan {
    #[serde(alias = "workout_name")]
    pub name: String,
    pub exercises: Vec<Exercise>,
    #[serde(default)]
    total_duration: Option<f64>,
    #[serde(default)]
    total_calories: Option<f64>,
}

impl WorkoutPlan {
    pub fn new(name: impl Into<String>, exercises: Vec<Exercise>) -> Self {
        Self {
            name: name.into(),
            exercises,
            total_duration: None,
            total_calories: None,
        }
    }

    /// Total minutes.
    pub fn total_duration(&self) -> f64 {
        self.total_duration
            .unwrap_or_else(|| self.exercises.iter().filter_map(|e| e.duration).sum())
    }

    pub fn total_calories(&self) -> f64 {
        self.total_calories
            .unwrap_or_else(|| self.exercises.iter().filter_map(|e| e.calories).sum())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct WorkoutPlanResponse {
    pub workout: WorkoutPlan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutType {
    FullBody,
    UpperBody,
    LowerBody,
    Cardio,
    Hiit,
    Yoga,
}

/// Body of `POST /api/workout-plan`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutCustomization {
    /// Minutes.
    pub duration: u32,
    pub difficulty: Difficulty,
    pub focus_areas: Vec<String>,
    pub equipment: Vec<String>,
    pub workout_type: WorkoutType,
}

impl Default for WorkoutCustomization {
    fn default() -> Self {
        Self {
            duration: 30,
            difficulty: Difficulty::Intermediate,
            focus_areas: Vec::new(),
            equipment: Vec::new(),
            workout_type: WorkoutType::FullBody,
        }
    }
}

impl WorkoutCustomization {
    /// Adds `area` if absent, removes it if present.
    pub fn toggle_focus_area(&mut self, area: &str) {
        toggle(&mut self.focus_areas, area);
    }

    pub fn toggle_equipment(&mut self, equipment: &str) {
        toggle(&mut self.equipment, equipment);
    }
}

fn toggle(list: &mut Vec<String>, item: &str) {
    match list.iter().position(|x| x == item) {
        Some(index) => {
            list.remove(index);
        }
        None => list.push(item.to_string()),
    }
}

/// Daily series from `GET /api/progress-data`. Absent series are empty.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProgressData {
    #[serde(default)]
    pub dates: Vec<String>,
    #[serde(default)]
    pub weights: Vec<f64>,
    #[serde(default)]
    pub calories_consumed: Vec<f64>,
    #[serde(default)]
    pub calories_burned: Vec<f64>,
    #[serde(default)]
    pub workouts_completed: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct ProgressResponse {
    pub data: ProgressData,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_envelope_carries_message() {
        let err = decode::<Ack>(
            StatusCode::UNAUTHORIZED,
            br#"{"success": false, "message": "Not authenticated"}"#,
        )
        .unwrap_err();

        assert!(matches!(err, ApiError::Rejected { status: 401, .. }));
        assert_eq!(err.backend_message(), Some("Not authenticated"));
    }

    #[test]
    fn missing_success_flag_is_schema_error() {
        let err = decode::<Ack>(StatusCode::OK, br#"{"message": "hi"}"#).unwrap_err();
        assert!(matches!(err, ApiError::Schema(_)));
    }

    #[test]
    fn non_json_body() {
        let err = decode::<Ack>(StatusCode::OK, b"<html>").unwrap_err();
        assert!(matches!(err, ApiError::NotJson { status: 200, .. }));
    }

    #[test]
    fn diet_plan_keeps_meal_order() {
        let body = br#"{
            "success": true,
            "meals": {
                "breakfast": [{"name": "Oatmeal", "calories": 350, "protein": 12, "carbs": 54, "fat": 8}],
                "lunch": [{"name": "Quinoa bowl", "calories": 500, "protein": 15, "carbs": 65, "fat": 12}],
                "dinner": []
            },
            "totals": {"calories": 850, "protein": 27, "carbs": 119, "fat": 20}
        }"#;

        let plan: DietPlan = decode(StatusCode::OK, body).unwrap();
        let order: Vec<_> = plan.meals.iter().map(|(meal, _)| meal.as_str()).collect();

        assert_eq!(order, vec!["breakfast", "lunch", "dinner"]);
        assert_eq!(plan.totals.calories, 850.0);
    }

    #[test]
    fn generated_workout_uses_workout_name() {
        let body = br#"{"success": true, "workout": {
            "workout_name": "Quick HIIT",
            "exercises": [
                {"name": "Burpees", "sets": 3, "reps": "10-12", "duration": 5, "calories": 60},
                {"name": "Plank", "sets": 2, "reps": 1, "duration": 3}
            ]
        }}"#;

        let response: WorkoutPlanResponse = decode(StatusCode::OK, body).unwrap();
        let plan = response.workout;

        assert_eq!(plan.name, "Quick HIIT");
        assert_eq!(plan.total_duration(), 8.0);
        assert_eq!(plan.total_calories(), 60.0);
        assert_eq!(plan.exercises[0].reps, Some(Reps::Text("10-12".into())));
        assert_eq!(plan.exercises[1].reps, Some(Reps::Count(1)));
    }

    #[test]
    fn customization_serializes_snake_case() {
        let mut custom = WorkoutCustomization::default();
        custom.toggle_focus_area("Core");
        custom.toggle_equipment("Dumbbells");
        custom.toggle_equipment("Dumbbells");

        let json = serde_json::to_value(&custom).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "duration": 30,
                "difficulty": "intermediate",
                "focus_areas": ["Core"],
                "equipment": [],
                "workout_type": "full_body"
            })
        );
    }
}
