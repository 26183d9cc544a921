//! Records handed to the mobile shells. Indices cross the boundary as `u32`,
//! timestamps as unix seconds and days as `YYYY-MM-DD` strings.

use chrono::NaiveDate;

use crate::backend::WorkoutSummary;
use crate::nutrition::{MacroTotals, Nutrients};
use crate::session::models::Exercise;
use crate::session::{
    RestCountdown, RunningState, SessionEvent, SessionMetrics, WorkoutSession,
};
use crate::tracking::{FoodEntry, Meal, Measurement};
use crate::uniffi_interface::errors::KineticError;

const DAY_FORMAT: &str = "%Y-%m-%d";

pub(crate) fn parse_day(text: &str) -> Result<NaiveDate, KineticError> {
    NaiveDate::parse_from_str(text.trim(), DAY_FORMAT)
        .map_err(|e| KineticError::Validation(format!("invalid date '{}': {}", text, e)))
}

fn format_day(day: NaiveDate) -> String {
    day.format(DAY_FORMAT).to_string()
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct RestStatus {
    pub exercise_index: u32,
    pub total_seconds: u32,
    pub remaining_seconds: u32,
}

impl From<RestCountdown> for RestStatus {
    fn from(rest: RestCountdown) -> Self {
        RestStatus {
            exercise_index: rest.exercise_index as u32,
            total_seconds: rest.total_seconds,
            remaining_seconds: rest.remaining_seconds,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct ActiveWorkout {
    pub routine_id: Option<String>,
    pub routine_name: Option<String>,
    pub running_state: RunningState,
    pub elapsed_seconds: u64,
    pub started_at_unix: Option<i64>,
    pub exercises: Vec<Exercise>,
    pub rest: Option<RestStatus>,
    pub metrics: SessionMetrics,
}

impl From<WorkoutSession> for ActiveWorkout {
    fn from(session: WorkoutSession) -> Self {
        let metrics = SessionMetrics::from_exercises(&session.logged_exercises);
        ActiveWorkout {
            routine_id: session.active_routine.as_ref().map(|r| r.id.clone()),
            routine_name: session.active_routine.map(|r| r.name),
            running_state: session.running_state,
            elapsed_seconds: session.elapsed_seconds,
            started_at_unix: session.started_at.map(|t| t.timestamp()),
            exercises: session.logged_exercises,
            rest: session.rest.map(RestStatus::from),
            metrics,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct WorkoutHistoryItem {
    pub id: i64,
    pub routine_name: String,
    pub performed_at_unix: i64,
    pub duration_seconds: u64,
    pub set_count: u32,
    pub total_volume: f64,
}

impl From<WorkoutSummary> for WorkoutHistoryItem {
    fn from(w: WorkoutSummary) -> Self {
        WorkoutHistoryItem {
            id: w.id,
            routine_name: w.routine_name,
            performed_at_unix: w.performed_at.timestamp(),
            duration_seconds: w.duration_seconds,
            set_count: w.set_count,
            total_volume: w.total_volume,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FoodLogEntry {
    pub id: Option<i64>,
    pub eaten_on: String,
    pub meal: Meal,
    pub product_code: Option<String>,
    pub name: String,
    pub grams: f64,
    pub per_100g: Nutrients,
    /// Filled in on the way out, ignored on the way in.
    pub totals: MacroTotals,
}

impl From<FoodEntry> for FoodLogEntry {
    fn from(entry: FoodEntry) -> Self {
        FoodLogEntry {
            totals: entry.macros(),
            id: entry.id,
            eaten_on: format_day(entry.eaten_on),
            meal: entry.meal,
            product_code: entry.product_code,
            name: entry.name,
            grams: entry.grams,
            per_100g: entry.per_100g,
        }
    }
}

impl TryFrom<FoodLogEntry> for FoodEntry {
    type Error = KineticError;

    fn try_from(entry: FoodLogEntry) -> Result<Self, KineticError> {
        Ok(FoodEntry {
            id: entry.id,
            eaten_on: parse_day(&entry.eaten_on)?,
            meal: entry.meal,
            product_code: entry.product_code,
            name: entry.name,
            grams: entry.grams,
            per_100g: entry.per_100g,
        })
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct MeasurementEntry {
    pub id: Option<i64>,
    pub measured_on: String,
    pub weight_kg: Option<f64>,
    pub body_fat_percent: Option<f64>,
    pub waist_cm: Option<f64>,
    pub chest_cm: Option<f64>,
    pub arm_cm: Option<f64>,
    pub notes: Option<String>,
}

impl From<Measurement> for MeasurementEntry {
    fn from(m: Measurement) -> Self {
        MeasurementEntry {
            id: m.id,
            measured_on: format_day(m.measured_on),
            weight_kg: m.weight_kg,
            body_fat_percent: m.body_fat_percent,
            waist_cm: m.waist_cm,
            chest_cm: m.chest_cm,
            arm_cm: m.arm_cm,
            notes: m.notes,
        }
    }
}

impl TryFrom<MeasurementEntry> for Measurement {
    type Error = KineticError;

    fn try_from(m: MeasurementEntry) -> Result<Self, KineticError> {
        Ok(Measurement {
            id: m.id,
            measured_on: parse_day(&m.measured_on)?,
            weight_kg: m.weight_kg,
            body_fat_percent: m.body_fat_percent,
            waist_cm: m.waist_cm,
            chest_cm: m.chest_cm,
            arm_cm: m.arm_cm,
            notes: m.notes,
        })
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct NutritionSummary {
    pub date: String,
    pub consumed: MacroTotals,
    /// Absent until a profile is saved.
    pub calorie_goal: Option<f64>,
    pub remaining_calories: Option<f64>,
}

#[derive(Debug, Clone, uniffi::Enum)]
pub enum WorkoutEvent {
    Started,
    Ticked { elapsed_seconds: u64 },
    Paused,
    Resumed,
    Discarded,
    Saved { workout_id: i64 },
    RestStarted { exercise_index: u32, seconds: u32 },
    RestTicked { remaining_seconds: u32 },
    RestFinished,
    RestSkipped,
}

impl From<SessionEvent> for WorkoutEvent {
    fn from(event: SessionEvent) -> Self {
        match event {
            SessionEvent::Started => WorkoutEvent::Started,
            SessionEvent::Ticked(elapsed_seconds) => WorkoutEvent::Ticked { elapsed_seconds },
            SessionEvent::Paused => WorkoutEvent::Paused,
            SessionEvent::Resumed => WorkoutEvent::Resumed,
            SessionEvent::Discarded => WorkoutEvent::Discarded,
            SessionEvent::Saved(workout_id) => WorkoutEvent::Saved { workout_id },
            SessionEvent::RestStarted {
                exercise_index,
                seconds,
            } => WorkoutEvent::RestStarted {
                exercise_index: exercise_index as u32,
                seconds,
            },
            SessionEvent::RestTicked(remaining_seconds) => {
                WorkoutEvent::RestTicked { remaining_seconds }
            }
            SessionEvent::RestFinished => WorkoutEvent::RestFinished,
            SessionEvent::RestSkipped => WorkoutEvent::RestSkipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn food_entry_days_cross_as_text() {
        let entry = FoodLogEntry {
            id: None,
            eaten_on: "2026-10-19".into(),
            meal: Meal::Dinner,
            product_code: None,
            name: "Salmon".into(),
            grams: 150.0,
            per_100g: Nutrients {
                kcal: Some(208.0),
                protein_g: 20.0,
                carbs_g: 0.0,
                fat_g: 13.0,
            },
            totals: MacroTotals::default(),
        };
        let core = FoodEntry::try_from(entry).unwrap();
        assert_eq!(core.eaten_on, NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());

        let back = FoodLogEntry::from(core);
        assert_eq!(back.eaten_on, "2026-10-19");
        assert_eq!(back.totals.calories, 312.0);
    }

    #[test]
    fn bad_day_is_a_validation_error() {
        assert!(matches!(
            parse_day("19/10/2026"),
            Err(KineticError::Validation(_))
        ));
    }
}
