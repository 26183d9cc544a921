use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use diesel::prelude::*;
use diesel::result::Error as DieselError;

use crate::backend::{WorkoutRecord, WorkoutSummary};
use crate::db::models::{
    FoodEntryRow, MeasurementRow, NewFoodEntry, NewMeasurement, NewRoutine, NewSessionExercise,
    NewSessionSet, NewWorkoutSession, ProfileRow, RoutineExerciseRow, RoutineRow, RoutineSetRow,
    WorkoutSessionRow,
};
use crate::db::schema::{
    food_entries, measurements, profile, routine_exercises, routine_sets, routines,
    session_exercises, session_sets, workout_sessions,
};
use crate::nutrition::Nutrients;
use crate::session::models::{Exercise, Routine, SetValues, WorkoutSet};
use crate::tracking::{FoodEntry, Measurement, Profile};

const DATE_FORMAT: &str = "%Y-%m-%d";
const PROFILE_ID: i32 = 1;

fn decode_error<E>(e: E) -> DieselError
where
    E: std::error::Error + Send + Sync + 'static,
{
    DieselError::DeserializationError(Box::new(e))
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_date(text: &str) -> QueryResult<NaiveDate> {
    NaiveDate::parse_from_str(text, DATE_FORMAT).map_err(decode_error)
}

fn parse_timestamp(text: &str) -> QueryResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(decode_error)
}

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

// Workout history
pub fn insert_workout(conn: &mut SqliteConnection, record: &WorkoutRecord) -> QueryResult<i64> {
    conn.transaction::<_, DieselError, _>(|conn| {
        let session_id: i64 = diesel::insert_into(workout_sessions::table)
            .values(&NewWorkoutSession {
                routine_id: record.routine_id.as_deref(),
                routine_name: &record.routine_name,
                started_at: record
                    .started_at
                    .to_rfc3339_opts(SecondsFormat::Secs, true),
                duration_seconds: i64::try_from(record.duration_seconds).unwrap_or(i64::MAX),
            })
            .returning(workout_sessions::id)
            .get_result(conn)?;

        for (position, exercise) in record.exercises.iter().enumerate() {
            let exercise_id: i64 = diesel::insert_into(session_exercises::table)
                .values(&NewSessionExercise {
                    session_id,
                    position: position as i32,
                    name: &exercise.name,
                    rest_time_seconds: exercise.rest_time_seconds.map(to_i32),
                })
                .returning(session_exercises::id)
                .get_result(conn)?;

            let sets: Vec<NewSessionSet> = exercise
                .sets
                .iter()
                .map(|set| NewSessionSet {
                    session_exercise_id: exercise_id,
                    position: to_i32(set.position),
                    weight: set.weight,
                    reps: to_i32(set.reps),
                    weight_text: &set.weight_text,
                    reps_text: &set.reps_text,
                })
                .collect();
            if !sets.is_empty() {
                diesel::insert_into(session_sets::table)
                    .values(&sets)
                    .execute(conn)?;
            }
        }

        Ok(session_id)
    })
}

pub fn list_workouts(conn: &mut SqliteConnection, limit: u32) -> QueryResult<Vec<WorkoutSummary>> {
    let rows = workout_sessions::table
        .order((workout_sessions::started_at.desc(), workout_sessions::id.desc()))
        .limit(i64::from(limit))
        .select(WorkoutSessionRow::as_select())
        .load(conn)?;

    rows.into_iter()
        .map(|row| {
            let sets: Vec<(f64, i32)> = session_sets::table
                .inner_join(session_exercises::table)
                .filter(session_exercises::session_id.eq(row.id))
                .select((session_sets::weight, session_sets::reps))
                .load(conn)?;
            Ok(WorkoutSummary {
                id: row.id,
                routine_name: row.routine_name,
                performed_at: parse_timestamp(&row.started_at)?,
                duration_seconds: u64::try_from(row.duration_seconds).unwrap_or(0),
                set_count: sets.len() as u32,
                total_volume: sets.iter().map(|(w, r)| w * f64::from(*r)).sum(),
            })
        })
        .collect()
}

fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.trim().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Sets of the most recent saved session that contains the exercise, matched
/// case-insensitively by name.
pub fn previous_performance(
    conn: &mut SqliteConnection,
    exercise_name: &str,
) -> QueryResult<Vec<SetValues>> {
    let latest: Option<i64> = session_exercises::table
        .inner_join(workout_sessions::table)
        .filter(
            session_exercises::name
                .like(escape_like(exercise_name))
                .escape('\\'),
        )
        .order((
            workout_sessions::started_at.desc(),
            workout_sessions::id.desc(),
            session_exercises::position.asc(),
        ))
        .select(session_exercises::id)
        .first(conn)
        .optional()?;

    let Some(exercise_id) = latest else {
        return Ok(vec![]);
    };

    let sets: Vec<(String, String)> = session_sets::table
        .filter(session_sets::session_exercise_id.eq(exercise_id))
        .order(session_sets::position.asc())
        .select((session_sets::weight_text, session_sets::reps_text))
        .load(conn)?;
    Ok(sets
        .into_iter()
        .map(|(weight, reps)| SetValues { weight, reps })
        .collect())
}

// Routines
fn insert_routine_children(conn: &mut SqliteConnection, routine: &Routine) -> QueryResult<()> {
    for (position, exercise) in routine.exercises.iter().enumerate() {
        diesel::insert_into(routine_exercises::table)
            .values(&RoutineExerciseRow {
                id: exercise.id.clone(),
                routine_id: routine.id.clone(),
                position: position as i32,
                name: exercise.name.trim().to_string(),
                rest_time_seconds: exercise.rest_time_seconds.map(to_i32),
            })
            .execute(conn)?;

        let sets: Vec<RoutineSetRow> = exercise
            .planned_sets
            .iter()
            .enumerate()
            .map(|(position, set)| RoutineSetRow {
                id: set.id.clone(),
                routine_exercise_id: exercise.id.clone(),
                position: position as i32,
                planned_weight: set.planned_weight.clone(),
                planned_reps: set.planned_reps.clone(),
            })
            .collect();
        if !sets.is_empty() {
            diesel::insert_into(routine_sets::table)
                .values(&sets)
                .execute(conn)?;
        }
    }
    Ok(())
}

fn delete_routine_children(conn: &mut SqliteConnection, routine_id: &str) -> QueryResult<()> {
    let exercise_ids = routine_exercises::table
        .filter(routine_exercises::routine_id.eq(routine_id))
        .select(routine_exercises::id);
    diesel::delete(routine_sets::table.filter(routine_sets::routine_exercise_id.eq_any(exercise_ids)))
        .execute(conn)?;
    diesel::delete(routine_exercises::table.filter(routine_exercises::routine_id.eq(routine_id)))
        .execute(conn)?;
    Ok(())
}

pub fn insert_routine(conn: &mut SqliteConnection, routine: &Routine) -> QueryResult<()> {
    conn.transaction::<_, DieselError, _>(|conn| {
        let now = Utc::now().timestamp();
        diesel::insert_into(routines::table)
            .values(&NewRoutine {
                id: &routine.id,
                name: routine.name.trim(),
                created_at: now,
                updated_at: now,
            })
            .execute(conn)?;
        insert_routine_children(conn, routine)
    })
}

/// Rewrites a routine and its exercises. Returns false when it does not exist.
pub fn replace_routine(conn: &mut SqliteConnection, routine: &Routine) -> QueryResult<bool> {
    conn.transaction::<_, DieselError, _>(|conn| {
        let updated = diesel::update(routines::table.find(&routine.id))
            .set((
                routines::name.eq(routine.name.trim()),
                routines::updated_at.eq(Utc::now().timestamp()),
            ))
            .execute(conn)?;
        if updated == 0 {
            return Ok(false);
        }
        delete_routine_children(conn, &routine.id)?;
        insert_routine_children(conn, routine)?;
        Ok(true)
    })
}

fn assemble_routine(conn: &mut SqliteConnection, row: RoutineRow) -> QueryResult<Routine> {
    let exercise_rows = routine_exercises::table
        .filter(routine_exercises::routine_id.eq(&row.id))
        .order(routine_exercises::position.asc())
        .select(RoutineExerciseRow::as_select())
        .load(conn)?;

    let mut exercises = Vec::with_capacity(exercise_rows.len());
    for exercise in exercise_rows {
        let planned_sets = routine_sets::table
            .filter(routine_sets::routine_exercise_id.eq(&exercise.id))
            .order(routine_sets::position.asc())
            .select(RoutineSetRow::as_select())
            .load(conn)?
            .into_iter()
            .map(|set| WorkoutSet {
                planned_weight: set.planned_weight,
                planned_reps: set.planned_reps,
                logged_weight: None,
                logged_reps: None,
                completed: false,
                id: set.id,
            })
            .collect();
        exercises.push(Exercise {
            name: exercise.name,
            planned_sets,
            logged_sets: Vec::new(),
            rest_time_seconds: exercise
                .rest_time_seconds
                .and_then(|s| u32::try_from(s).ok()),
            id: exercise.id,
        });
    }

    Ok(Routine {
        id: row.id,
        name: row.name,
        exercises,
    })
}

pub fn load_routines(conn: &mut SqliteConnection) -> QueryResult<Vec<Routine>> {
    let rows = routines::table
        .order(routines::name.asc())
        .select(RoutineRow::as_select())
        .load(conn)?;
    rows.into_iter()
        .map(|row| assemble_routine(conn, row))
        .collect()
}

pub fn load_routine(conn: &mut SqliteConnection, routine_id: &str) -> QueryResult<Option<Routine>> {
    let row = routines::table
        .find(routine_id)
        .select(RoutineRow::as_select())
        .first(conn)
        .optional()?;
    row.map(|row| assemble_routine(conn, row)).transpose()
}

pub fn delete_routine(conn: &mut SqliteConnection, routine_id: &str) -> QueryResult<bool> {
    conn.transaction::<_, DieselError, _>(|conn| {
        delete_routine_children(conn, routine_id)?;
        let deleted = diesel::delete(routines::table.find(routine_id)).execute(conn)?;
        Ok(deleted > 0)
    })
}

// Profile
pub fn load_profile(conn: &mut SqliteConnection) -> QueryResult<Option<Profile>> {
    let row = profile::table
        .find(PROFILE_ID)
        .select(ProfileRow::as_select())
        .first(conn)
        .optional()?;
    row.map(|row| {
        Ok(Profile {
            display_name: row.display_name,
            sex: row.sex.parse().map_err(decode_error)?,
            age_years: u32::try_from(row.age_years).unwrap_or(0),
            height_cm: row.height_cm,
            weight_kg: row.weight_kg,
            activity_level: row.activity_level.parse().map_err(decode_error)?,
            goal: row.goal.parse().map_err(decode_error)?,
        })
    })
    .transpose()
}

pub fn save_profile(conn: &mut SqliteConnection, value: &Profile) -> QueryResult<()> {
    diesel::replace_into(profile::table)
        .values(&ProfileRow {
            id: PROFILE_ID,
            display_name: value.display_name.clone(),
            sex: value.sex.as_str().to_string(),
            age_years: to_i32(value.age_years),
            height_cm: value.height_cm,
            weight_kg: value.weight_kg,
            activity_level: value.activity_level.as_str().to_string(),
            goal: value.goal.as_str().to_string(),
            updated_at: Utc::now().timestamp(),
        })
        .execute(conn)?;
    Ok(())
}

// Measurements
pub fn insert_measurement(conn: &mut SqliteConnection, value: &Measurement) -> QueryResult<i64> {
    diesel::insert_into(measurements::table)
        .values(&NewMeasurement {
            measured_on: format_date(value.measured_on),
            weight_kg: value.weight_kg,
            body_fat_percent: value.body_fat_percent,
            waist_cm: value.waist_cm,
            chest_cm: value.chest_cm,
            arm_cm: value.arm_cm,
            notes: value.notes.as_deref(),
        })
        .returning(measurements::id)
        .get_result(conn)
}

pub fn load_measurements(conn: &mut SqliteConnection, limit: u32) -> QueryResult<Vec<Measurement>> {
    measurements::table
        .order((measurements::measured_on.desc(), measurements::id.desc()))
        .limit(i64::from(limit))
        .select(MeasurementRow::as_select())
        .load(conn)?
        .into_iter()
        .map(|row| {
            Ok(Measurement {
                id: Some(row.id),
                measured_on: parse_date(&row.measured_on)?,
                weight_kg: row.weight_kg,
                body_fat_percent: row.body_fat_percent,
                waist_cm: row.waist_cm,
                chest_cm: row.chest_cm,
                arm_cm: row.arm_cm,
                notes: row.notes,
            })
        })
        .collect()
}

// Food log
pub fn insert_food_entry(conn: &mut SqliteConnection, entry: &FoodEntry) -> QueryResult<i64> {
    diesel::insert_into(food_entries::table)
        .values(&NewFoodEntry {
            eaten_on: format_date(entry.eaten_on),
            meal: entry.meal.as_str(),
            product_code: entry.product_code.as_deref(),
            name: entry.name.trim(),
            grams: entry.grams,
            kcal_per_100g: entry.per_100g.kcal,
            protein_per_100g: entry.per_100g.protein_g,
            carbs_per_100g: entry.per_100g.carbs_g,
            fat_per_100g: entry.per_100g.fat_g,
        })
        .returning(food_entries::id)
        .get_result(conn)
}

pub fn load_food_entries(conn: &mut SqliteConnection, day: NaiveDate) -> QueryResult<Vec<FoodEntry>> {
    food_entries::table
        .filter(food_entries::eaten_on.eq(format_date(day)))
        .order(food_entries::id.asc())
        .select(FoodEntryRow::as_select())
        .load(conn)?
        .into_iter()
        .map(|row| {
            Ok(FoodEntry {
                id: Some(row.id),
                eaten_on: parse_date(&row.eaten_on)?,
                meal: row.meal.parse().map_err(decode_error)?,
                product_code: row.product_code,
                name: row.name,
                grams: row.grams,
                per_100g: Nutrients {
                    kcal: row.kcal_per_100g,
                    protein_g: row.protein_per_100g,
                    carbs_g: row.carbs_per_100g,
                    fat_g: row.fat_per_100g,
                },
            })
        })
        .collect()
}

pub fn delete_food_entry(conn: &mut SqliteConnection, entry_id: i64) -> QueryResult<bool> {
    let deleted = diesel::delete(food_entries::table.find(entry_id)).execute(conn)?;
    Ok(deleted > 0)
}
