//! Shapes the dashboard panels read, derived from the typed records.

use crate::client::schema::{DietPlan, FoodItem, MacroTotals, ProgressData, WorkoutPlan};

const MEAL_TIMES: [&str; 3] = ["8:00 AM", "1:00 PM", "7:00 PM"];

#[derive(Debug, Clone, PartialEq)]
pub struct MealView {
    pub meal: String,
    pub time: &'static str,
    pub calories: f64,
    pub items: Vec<FoodItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DietPlanView {
    pub total_calories: f64,
    pub macros: MacroTotals,
    pub meals: Vec<MealView>,
}

impl From<DietPlan> for DietPlanView {
    /// Meals get their time slot by position; the third and later share the
    /// evening slot.
    fn from(plan: DietPlan) -> Self {
        let meals = plan
            .meals
            .into_iter()
            .enumerate()
            .map(|(index, (meal, items))| MealView {
                time: MEAL_TIMES[index.min(MEAL_TIMES.len() - 1)],
                calories: items.iter().map(|item| item.calories).sum(),
                meal,
                items,
            })
            .collect();

        Self {
            total_calories: plan.totals.calories,
            macros: plan.totals,
            meals,
        }
    }
}

/// Tracks which exercises of a plan the user ticked off.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutSession {
    pub plan: WorkoutPlan,
    completed: Vec<usize>,
}

impl WorkoutSession {
    pub fn new(plan: WorkoutPlan) -> Self {
        Self {
            plan,
            completed: Vec::new(),
        }
    }

    /// Marks exercise `index` done. Out-of-range and repeated indices are ignored.
    pub fn complete(&mut self, index: usize) {
        if index < self.plan.exercises.len() && !self.completed.contains(&index) {
            self.completed.push(index);
        }
    }

    pub fn is_completed(&self, index: usize) -> bool {
        self.completed.contains(&index)
    }

    /// Share of exercises completed, 0-100. An empty plan is 0.
    pub fn progress_percent(&self) -> f64 {
        let total = self.plan.exercises.len();
        if total == 0 {
            return 0.0;
        }
        self.completed.len() as f64 / total as f64 * 100.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSummary {
    /// First weight in the series, 0 if none.
    pub start_weight: f64,
    /// Last weight in the series, 0 if none.
    pub current_weight: f64,
    /// Intake summed over the series divided by seven, rounded.
    pub average_daily_calories: f64,
    /// Days with at least one workout.
    pub active_days: usize,
}

impl ProgressSummary {
    pub fn from_data(data: &ProgressData) -> Self {
        let average_daily_calories = if data.calories_consumed.is_empty() {
            0.0
        } else {
            (data.calories_consumed.iter().sum::<f64>() / 7.0).round()
        };

        Self {
            start_weight: data.weights.first().copied().unwrap_or(0.0),
            current_weight: data.weights.last().copied().unwrap_or(0.0),
            average_daily_calories,
            active_days: data.workouts_completed.iter().filter(|w| **w > 0.0).count(),
        }
    }

    /// Progress toward `target_weight` in percent of the way from the start
    /// weight. `None` when start and target coincide.
    pub fn weight_progress_percent(&self, target_weight: f64) -> Option<f64> {
        let span = self.start_weight - target_weight;
        if span == 0.0 {
            return None;
        }
        Some((self.start_weight - self.current_weight) / span * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::schema::Exercise;

    fn food(name: &str, calories: f64) -> FoodItem {
        FoodItem {
            name: name.into(),
            calories,
            protein: 0.0,
            carbs: 0.0,
            fat: 0.0,
        }
    }

    fn exercise(name: &str) -> Exercise {
        Exercise {
            name: name.into(),
            sets: Some(3),
            reps: None,
            duration: Some(5.0),
            calories: Some(40.0),
            completed: false,
            muscle_groups: vec![],
            instructions: None,
        }
    }

    #[test]
    fn meals_get_slots_and_sums() {
        let plan = DietPlan {
            meals: vec![
                ("breakfast".into(), vec![food("Eggs", 200.0), food("Toast", 150.0)]),
                ("lunch".into(), vec![food("Salad", 400.0)]),
                ("dinner".into(), vec![food("Salmon", 600.0)]),
                ("snack".into(), vec![food("Apple", 52.0)]),
            ],
            totals: MacroTotals {
                calories: 1402.0,
                ..Default::default()
            },
        };

        let view = DietPlanView::from(plan);

        assert_eq!(view.total_calories, 1402.0);
        assert_eq!(view.meals[0].time, "8:00 AM");
        assert_eq!(view.meals[0].calories, 350.0);
        assert_eq!(view.meals[1].time, "1:00 PM");
        assert_eq!(view.meals[2].time, "7:00 PM");
        assert_eq!(view.meals[3].time, "7:00 PM");
    }

    #[test]
    fn workout_progress_counts_each_exercise_once() {
        let plan = WorkoutPlan::new("Full Body", vec![exercise("Squats"), exercise("Plank")]);
        let mut session = WorkoutSession::new(plan);

        session.complete(0);
        session.complete(0);
        session.complete(7);

        assert!(session.is_completed(0));
        assert_eq!(session.progress_percent(), 50.0);
    }

    #[test]
    fn progress_summary_of_week() {
        let data = ProgressData {
            dates: vec![],
            weights: vec![82.0, 81.5, 81.0],
            calories_consumed: vec![2100.0, 1900.0, 2000.0],
            calories_burned: vec![],
            workouts_completed: vec![1.0, 0.0, 2.0],
        };

        let summary = ProgressSummary::from_data(&data);

        assert_eq!(summary.start_weight, 82.0);
        assert_eq!(summary.current_weight, 81.0);
        assert_eq!(summary.average_daily_calories, 857.0);
        assert_eq!(summary.active_days, 2);
        assert_eq!(summary.weight_progress_percent(72.0), Some(10.0));
    }

    #[test]
    fn empty_progress_is_zeroed() {
        let summary = ProgressSummary::from_data(&ProgressData::default());

        assert_eq!(summary.start_weight, 0.0);
        assert_eq!(summary.current_weight, 0.0);
        assert_eq!(summary.average_daily_calories, 0.0);
        assert_eq!(summary.weight_progress_percent(0.0), None);
    }
}
