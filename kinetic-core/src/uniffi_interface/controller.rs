use std::future::Future;
use std::sync::Arc;

use chrono::Local;
use log::{debug, info, warn};
use tokio::sync::broadcast::error::RecvError;

use crate::backend::Backend;
use crate::catalog::{CatalogExercise, ExerciseCatalog};
use crate::config::DEFAULT_USER_AGENT;
use crate::db::SqliteBackend;
use crate::food::openfoodfacts::DEFAULT_BASE_URL;
use crate::food::{FoodDatabase, FoodLookup, OpenFoodFacts, ProductDetails, ProductSummary};
use crate::nutrition::MacroTotals;
use crate::runtime::global_runtime;
use crate::session::models::{Exercise, Routine};
use crate::session::{SessionMetrics, SetToggle, WorkoutSessionManager};
use crate::tracking::{FoodEntry, Measurement, Profile};
use crate::uniffi_interface::errors::KineticError;
use crate::uniffi_interface::objects::{
    ActiveWorkout, FoodLogEntry, MeasurementEntry, NutritionSummary, WorkoutEvent,
    WorkoutHistoryItem, parse_day,
};

/// Receives session events on a runtime worker thread.
#[uniffi::export(with_foreign)]
pub trait SessionObserver: Send + Sync {
    fn on_event(&self, event: WorkoutEvent);
}

/// Runs `fut` on the global runtime. The returned future can be polled by any
/// executor, which is what the foreign async bridges need.
async fn on_runtime<T, F>(fut: F) -> Result<T, KineticError>
where
    T: Send + 'static,
    F: Future<Output = Result<T, KineticError>> + Send + 'static,
{
    global_runtime()?.spawn(fut).await?
}

#[derive(uniffi::Object)]
pub struct KineticController {
    backend: Arc<SqliteBackend>,
    food: Arc<FoodLookup<OpenFoodFacts>>,
    session: WorkoutSessionManager,
}

#[uniffi::export]
impl KineticController {
    #[uniffi::constructor]
    pub fn new(
        db_path: String,
        food_user_agent: Option<String>,
    ) -> Result<Arc<Self>, KineticError> {
        let rt = global_runtime()?;
        let backend = SqliteBackend::open(&db_path)?;
        let agent = food_user_agent.unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
        let food = OpenFoodFacts::new(DEFAULT_BASE_URL, &agent)?;
        info!("Controller ready with database {}", db_path);

        Ok(Arc::new(Self {
            backend: Arc::new(backend),
            food: Arc::new(FoodLookup::new(food)),
            session: WorkoutSessionManager::new(rt.handle().clone()),
        }))
    }

    // Active workout
    pub async fn start_routine(&self, routine_id: String) -> Result<ActiveWorkout, KineticError> {
        let backend = self.backend.clone();
        let session = self.session.clone();
        on_runtime(async move {
            let routine = backend
                .get_routine(&routine_id)
                .await?
                .ok_or_else(|| KineticError::NotFound(format!("routine {}", routine_id)))?;
            session.start_workout(routine);
            session.load_previous_performance(backend.as_ref()).await;
            Ok(session.snapshot().into())
        })
        .await
    }

    pub async fn start_freestyle(
        &self,
        name: Option<String>,
        exercise_names: Vec<String>,
    ) -> Result<ActiveWorkout, KineticError> {
        let backend = self.backend.clone();
        let session = self.session.clone();
        on_runtime(async move {
            let exercises = exercise_names
                .into_iter()
                .filter(|n| !n.trim().is_empty())
                .map(|n| Exercise::new(n.trim(), vec![], None))
                .collect();
            session.start_freestyle(name, exercises);
            session.load_previous_performance(backend.as_ref()).await;
            Ok(session.snapshot().into())
        })
        .await
    }

    pub fn pause_workout(&self) {
        self.session.pause_workout();
    }

    pub fn resume_workout(&self) {
        self.session.resume_workout();
    }

    pub fn discard_workout(&self) {
        self.session.discard_workout();
    }

    /// Returns the id of the stored workout.
    pub async fn save_workout(&self) -> Result<i64, KineticError> {
        let backend = self.backend.clone();
        let session = self.session.clone();
        on_runtime(async move { Ok(session.save_workout(backend.as_ref()).await?) }).await
    }

    pub fn active_workout(&self) -> ActiveWorkout {
        self.session.snapshot().into()
    }

    pub fn metrics(&self) -> SessionMetrics {
        self.session.metrics()
    }

    pub fn update_exercises(&self, exercises: Vec<Exercise>) -> Result<(), KineticError> {
        Ok(self.session.update_logged_exercises(exercises)?)
    }

    pub fn add_exercise(
        &self,
        name: String,
        rest_time_seconds: Option<u32>,
    ) -> Result<u32, KineticError> {
        let exercise = Exercise::new(name.trim(), vec![], rest_time_seconds);
        Ok(self.session.add_exercise(exercise)? as u32)
    }

    pub fn remove_exercise(&self, exercise_index: u32) -> Result<(), KineticError> {
        self.session.remove_exercise(exercise_index as usize)?;
        Ok(())
    }

    /// Returns the id of the new set.
    pub fn add_set(&self, exercise_index: u32) -> Result<String, KineticError> {
        Ok(self.session.add_set(exercise_index as usize)?)
    }

    pub fn remove_set(&self, exercise_index: u32, set_index: u32) -> Result<(), KineticError> {
        self.session
            .remove_set(exercise_index as usize, set_index as usize)?;
        Ok(())
    }

    pub fn update_set(
        &self,
        exercise_index: u32,
        set_index: u32,
        weight: Option<String>,
        reps: Option<String>,
    ) -> Result<(), KineticError> {
        Ok(self.session.update_set_values(
            exercise_index as usize,
            set_index as usize,
            weight,
            reps,
        )?)
    }

    pub fn set_rest_time(
        &self,
        exercise_index: u32,
        seconds: Option<u32>,
    ) -> Result<(), KineticError> {
        Ok(self
            .session
            .set_rest_time(exercise_index as usize, seconds)?)
    }

    pub fn toggle_set(&self, exercise_index: u32, set_index: u32) -> Result<SetToggle, KineticError> {
        Ok(self
            .session
            .toggle_set_completion(exercise_index as usize, set_index as usize)?)
    }

    pub fn skip_rest(&self) -> bool {
        self.session.skip_rest()
    }

    /// Returns the new remaining time, or nothing when no rest is running.
    pub fn extend_rest(&self, seconds: u32) -> Option<u32> {
        self.session.extend_rest(seconds)
    }

    /// Forwards session events to `observer` until the controller goes away.
    pub fn observe(&self, observer: Arc<dyn SessionObserver>) -> Result<(), KineticError> {
        let mut events = self.session.subscribe();
        global_runtime()?.spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => observer.on_event(event.into()),
                    Err(RecvError::Lagged(missed)) => {
                        warn!("Session observer missed {} events", missed)
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            debug!("Session observer detached");
        });
        Ok(())
    }

    // Routines and history
    pub async fn routines(&self) -> Result<Vec<Routine>, KineticError> {
        let backend = self.backend.clone();
        on_runtime(async move { Ok(backend.list_routines().await?) }).await
    }

    /// Creates the routine, or rewrites it when one with the same id exists.
    pub async fn save_routine(&self, routine: Routine) -> Result<String, KineticError> {
        let backend = self.backend.clone();
        on_runtime(async move {
            if backend.get_routine(&routine.id).await?.is_some() {
                backend.update_routine(&routine).await?;
                Ok(routine.id)
            } else {
                Ok(backend.create_routine(&routine).await?)
            }
        })
        .await
    }

    pub async fn delete_routine(&self, routine_id: String) -> Result<bool, KineticError> {
        let backend = self.backend.clone();
        on_runtime(async move { Ok(backend.delete_routine(&routine_id).await?) }).await
    }

    pub async fn history(&self, limit: u32) -> Result<Vec<WorkoutHistoryItem>, KineticError> {
        let backend = self.backend.clone();
        on_runtime(async move {
            let workouts = backend.list_workouts(limit).await?;
            Ok(workouts.into_iter().map(WorkoutHistoryItem::from).collect())
        })
        .await
    }

    // Profile and measurements
    pub async fn profile(&self) -> Result<Option<Profile>, KineticError> {
        let backend = self.backend.clone();
        on_runtime(async move { Ok(backend.get_profile().await?) }).await
    }

    pub async fn save_profile(&self, profile: Profile) -> Result<(), KineticError> {
        let backend = self.backend.clone();
        on_runtime(async move { Ok(backend.save_profile(&profile).await?) }).await
    }

    pub async fn add_measurement(&self, entry: MeasurementEntry) -> Result<i64, KineticError> {
        let backend = self.backend.clone();
        on_runtime(async move {
            let measurement = Measurement::try_from(entry)?;
            Ok(backend.add_measurement(&measurement).await?)
        })
        .await
    }

    pub async fn measurements(&self, limit: u32) -> Result<Vec<MeasurementEntry>, KineticError> {
        let backend = self.backend.clone();
        on_runtime(async move {
            let measurements = backend.list_measurements(limit).await?;
            Ok(measurements.into_iter().map(MeasurementEntry::from).collect())
        })
        .await
    }

    // Food
    pub async fn search_food(&self, query: String) -> Result<Vec<ProductSummary>, KineticError> {
        let food = self.food.clone();
        on_runtime(async move { Ok(food.search(&query).await?) }).await
    }

    pub async fn lookup_product(&self, code: String) -> Result<Option<ProductDetails>, KineticError> {
        let food = self.food.clone();
        on_runtime(async move { Ok(food.product(&code).await?) }).await
    }

    pub async fn log_food(&self, entry: FoodLogEntry) -> Result<i64, KineticError> {
        let backend = self.backend.clone();
        on_runtime(async move {
            let entry = FoodEntry::try_from(entry)?;
            Ok(backend.add_food_entry(&entry).await?)
        })
        .await
    }

    pub async fn food_log(&self, date: String) -> Result<Vec<FoodLogEntry>, KineticError> {
        let backend = self.backend.clone();
        on_runtime(async move {
            let entries = backend.list_food_entries(parse_day(&date)?).await?;
            Ok(entries.into_iter().map(FoodLogEntry::from).collect())
        })
        .await
    }

    pub async fn delete_food_entry(&self, id: i64) -> Result<bool, KineticError> {
        let backend = self.backend.clone();
        on_runtime(async move { Ok(backend.delete_food_entry(id).await?) }).await
    }

    /// Totals eaten on `date` (today when absent) against the profile's goal.
    pub async fn nutrition_summary(
        &self,
        date: Option<String>,
    ) -> Result<NutritionSummary, KineticError> {
        let backend = self.backend.clone();
        on_runtime(async move {
            let day = match date {
                Some(d) => parse_day(&d)?,
                None => Local::now().date_naive(),
            };
            let entries = backend.list_food_entries(day).await?;
            let consumed = MacroTotals::from_entries(&entries);
            let calorie_goal = match backend.get_profile().await? {
                Some(profile) => Some(profile.calorie_goal()?),
                None => None,
            };
            Ok(NutritionSummary {
                date: day.format("%Y-%m-%d").to_string(),
                consumed,
                calorie_goal,
                remaining_calories: calorie_goal.map(|goal| goal - consumed.calories),
            })
        })
        .await
    }

    // Catalog
    pub fn catalog_search(&self, query: String) -> Vec<CatalogExercise> {
        ExerciseCatalog::bundled()
            .search(&query)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn catalog_exercise(&self, id: String) -> Option<CatalogExercise> {
        ExerciseCatalog::bundled().get(&id).cloned()
    }

    pub fn catalog_muscles(&self) -> Vec<String> {
        ExerciseCatalog::bundled().muscles()
    }
}

#[uniffi::export]
pub fn format_elapsed(seconds: u64) -> String {
    crate::session::format_elapsed(seconds)
}
