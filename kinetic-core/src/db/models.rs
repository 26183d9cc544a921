use diesel::prelude::*;

use crate::db::schema;

// Routine models
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::routines)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RoutineRow {
    pub id: String,
    pub name: String,
}

#[derive(Insertable)]
#[diesel(table_name = schema::routines)]
pub struct NewRoutine<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = schema::routine_exercises)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RoutineExerciseRow {
    pub id: String,
    pub routine_id: String,
    pub position: i32,
    pub name: String,
    pub rest_time_seconds: Option<i32>,
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = schema::routine_sets)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RoutineSetRow {
    pub id: String,
    pub routine_exercise_id: String,
    pub position: i32,
    pub planned_weight: String,
    pub planned_reps: String,
}

// Workout history models
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::workout_sessions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct WorkoutSessionRow {
    pub id: i64,
    pub routine_id: Option<String>,
    pub routine_name: String,
    pub started_at: String,
    pub duration_seconds: i64,
}

#[derive(Insertable)]
#[diesel(table_name = schema::workout_sessions)]
pub struct NewWorkoutSession<'a> {
    pub routine_id: Option<&'a str>,
    pub routine_name: &'a str,
    pub started_at: String,
    pub duration_seconds: i64,
}

#[derive(Insertable)]
#[diesel(table_name = schema::session_exercises)]
pub struct NewSessionExercise<'a> {
    pub session_id: i64,
    pub position: i32,
    pub name: &'a str,
    pub rest_time_seconds: Option<i32>,
}

#[derive(Insertable)]
#[diesel(table_name = schema::session_sets)]
pub struct NewSessionSet<'a> {
    pub session_exercise_id: i64,
    pub position: i32,
    pub weight: f64,
    pub reps: i32,
    pub weight_text: &'a str,
    pub reps_text: &'a str,
}

// Profile and tracking models
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = schema::profile)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ProfileRow {
    pub id: i32,
    pub display_name: String,
    pub sex: String,
    pub age_years: i32,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub activity_level: String,
    pub goal: String,
    pub updated_at: i64,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::measurements)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MeasurementRow {
    pub id: i64,
    pub measured_on: String,
    pub weight_kg: Option<f64>,
    pub body_fat_percent: Option<f64>,
    pub waist_cm: Option<f64>,
    pub chest_cm: Option<f64>,
    pub arm_cm: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Insertable)]
#[diesel(table_name = schema::measurements)]
pub struct NewMeasurement<'a> {
    pub measured_on: String,
    pub weight_kg: Option<f64>,
    pub body_fat_percent: Option<f64>,
    pub waist_cm: Option<f64>,
    pub chest_cm: Option<f64>,
    pub arm_cm: Option<f64>,
    pub notes: Option<&'a str>,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::food_entries)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct FoodEntryRow {
    pub id: i64,
    pub eaten_on: String,
    pub meal: String,
    pub product_code: Option<String>,
    pub name: String,
    pub grams: f64,
    pub kcal_per_100g: Option<f64>,
    pub protein_per_100g: f64,
    pub carbs_per_100g: f64,
    pub fat_per_100g: f64,
}

#[derive(Insertable)]
#[diesel(table_name = schema::food_entries)]
pub struct NewFoodEntry<'a> {
    pub eaten_on: String,
    pub meal: &'a str,
    pub product_code: Option<&'a str>,
    pub name: &'a str,
    pub grams: f64,
    pub kcal_per_100g: Option<f64>,
    pub protein_per_100g: f64,
    pub carbs_per_100g: f64,
    pub fat_per_100g: f64,
}
