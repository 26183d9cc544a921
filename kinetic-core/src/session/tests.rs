use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::runtime::Handle;
use tokio::time;

use super::*;
use crate::backend::{Backend, MockBackend, WorkoutRecord, WorkoutSummary};
use crate::error::{BackendError, SessionError, ValidationError};
use crate::tracking::{FoodEntry, Measurement, Profile};

fn manager() -> WorkoutSessionManager {
    WorkoutSessionManager::new(Handle::current())
}

fn push_day(rest: Option<u32>) -> Routine {
    Routine::new(
        "Push Day",
        vec![Exercise::new(
            "Bench Press",
            vec![WorkoutSet::planned("50", "10"), WorkoutSet::planned("50", "10")],
            rest,
        )],
    )
}

/// Persists workouts after a delay, recording what it was given.
#[derive(Default)]
struct SlowBackend {
    saved: Mutex<Vec<WorkoutRecord>>,
}

const SLOW_SAVE: Duration = Duration::from_secs(2);

#[async_trait]
impl Backend for SlowBackend {
    async fn persist_workout(&self, record: &WorkoutRecord) -> Result<i64, BackendError> {
        time::sleep(SLOW_SAVE).await;
        let mut saved = self.saved.lock().unwrap();
        saved.push(record.clone());
        Ok(saved.len() as i64)
    }

    async fn list_workouts(&self, _limit: u32) -> Result<Vec<WorkoutSummary>, BackendError> {
        Ok(vec![])
    }

    async fn previous_performance(&self, _name: &str) -> Result<Vec<SetValues>, BackendError> {
        Ok(vec![])
    }

    async fn create_routine(&self, routine: &Routine) -> Result<String, BackendError> {
        Ok(routine.id.clone())
    }

    async fn update_routine(&self, _routine: &Routine) -> Result<(), BackendError> {
        Ok(())
    }

    async fn list_routines(&self) -> Result<Vec<Routine>, BackendError> {
        Ok(vec![])
    }

    async fn get_routine(&self, _id: &str) -> Result<Option<Routine>, BackendError> {
        Ok(None)
    }

    async fn delete_routine(&self, _id: &str) -> Result<bool, BackendError> {
        Ok(false)
    }

    async fn get_profile(&self) -> Result<Option<Profile>, BackendError> {
        Ok(None)
    }

    async fn save_profile(&self, _profile: &Profile) -> Result<(), BackendError> {
        Ok(())
    }

    async fn add_measurement(&self, _measurement: &Measurement) -> Result<i64, BackendError> {
        Ok(1)
    }

    async fn list_measurements(&self, _limit: u32) -> Result<Vec<Measurement>, BackendError> {
        Ok(vec![])
    }

    async fn add_food_entry(&self, _entry: &FoodEntry) -> Result<i64, BackendError> {
        Ok(1)
    }

    async fn list_food_entries(&self, _day: NaiveDate) -> Result<Vec<FoodEntry>, BackendError> {
        Ok(vec![])
    }

    async fn delete_food_entry(&self, _id: i64) -> Result<bool, BackendError> {
        Ok(false)
    }
}

/// Sleeps on the paused clock, landing half a second past the last whole tick.
async fn run_for(seconds: u64) {
    time::sleep(Duration::from_secs(seconds) + Duration::from_millis(500)).await;
}

fn log_set(manager: &WorkoutSessionManager, set_index: usize, weight: &str, reps: &str) {
    manager
        .update_set_values(0, set_index, Some(weight.into()), Some(reps.into()))
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn start_seeds_logged_sets_from_routine() {
    let manager = manager();
    manager.start_workout(push_day(None));

    let session = manager.snapshot();
    assert_eq!(session.running_state, RunningState::Running);
    assert_eq!(session.elapsed_seconds, 0);
    assert_eq!(session.active_routine.as_ref().unwrap().name, "Push Day");

    let sets = &session.logged_exercises[0].logged_sets;
    assert_eq!(sets.len(), 2);
    assert!(sets.iter().all(|s| !s.completed));
    assert!(sets.iter().all(|s| s.logged_weight.as_deref() == Some("")));
    assert_ne!(sets[0].id, sets[1].id);
}

#[tokio::test(start_paused = true)]
async fn elapsed_time_advances_only_while_running() {
    let manager = manager();
    manager.start_workout(push_day(None));

    run_for(3).await;
    assert_eq!(manager.elapsed_seconds(), 3);

    manager.pause_workout();
    run_for(5).await;
    assert_eq!(manager.elapsed_seconds(), 3);
    assert_eq!(manager.running_state(), RunningState::Paused);

    manager.resume_workout();
    run_for(2).await;
    assert_eq!(manager.elapsed_seconds(), 5);
}

#[tokio::test(start_paused = true)]
async fn pause_and_resume_are_idempotent() {
    let manager = manager();
    manager.start_workout(push_day(None));

    manager.resume_workout();
    manager.resume_workout();
    run_for(2).await;
    assert_eq!(manager.elapsed_seconds(), 2);

    manager.pause_workout();
    manager.pause_workout();
    run_for(2).await;
    assert_eq!(manager.elapsed_seconds(), 2);

    manager.resume_workout();
    run_for(1).await;
    assert_eq!(manager.elapsed_seconds(), 3);
}

#[tokio::test(start_paused = true)]
async fn pause_and_resume_do_nothing_when_idle() {
    let manager = manager();
    manager.pause_workout();
    manager.resume_workout();
    run_for(3).await;
    assert_eq!(manager.snapshot(), WorkoutSession::default());
}

#[tokio::test(start_paused = true)]
async fn discard_always_returns_to_idle() {
    let manager = manager();

    manager.discard_workout();
    assert_eq!(manager.running_state(), RunningState::Idle);

    manager.start_workout(push_day(None));
    run_for(4).await;
    manager.discard_workout();
    let session = manager.snapshot();
    assert_eq!(session.running_state, RunningState::Idle);
    assert_eq!(session.elapsed_seconds, 0);
    assert!(session.logged_exercises.is_empty());
    assert!(session.active_routine.is_none());

    manager.start_workout(push_day(None));
    manager.pause_workout();
    manager.discard_workout();
    assert_eq!(manager.snapshot(), WorkoutSession::default());

    run_for(3).await;
    assert_eq!(manager.elapsed_seconds(), 0);
}

#[tokio::test(start_paused = true)]
async fn starting_again_resets_elapsed_time() {
    let manager = manager();
    manager.start_workout(push_day(None));
    run_for(7).await;
    assert_eq!(manager.elapsed_seconds(), 7);

    manager.start_freestyle(None, vec![Exercise::new("Plank", vec![], None)]);
    let session = manager.snapshot();
    assert_eq!(session.elapsed_seconds, 0);
    assert_eq!(session.active_routine.unwrap().name, "Freestyle Workout");

    run_for(2).await;
    assert_eq!(manager.elapsed_seconds(), 2);
}

#[tokio::test(start_paused = true)]
async fn completing_a_logged_set_updates_metrics() {
    let manager = manager();
    manager.start_workout(push_day(None));

    log_set(&manager, 0, "50", "10");
    let toggle = manager.toggle_set_completion(0, 0).unwrap();
    assert!(toggle.completed);
    assert!(!toggle.backfilled);
    assert_eq!(toggle.rest_started, None);

    let metrics = manager.metrics();
    assert_eq!(metrics.total_volume, 500.0);
    assert_eq!(metrics.sets_performed, 1);
    assert_eq!(metrics.progress_percentage, 50);
}

#[tokio::test(start_paused = true)]
async fn uncompleting_keeps_logged_values() {
    let manager = manager();
    manager.start_workout(push_day(None));
    log_set(&manager, 1, "52.5", "8");

    manager.toggle_set_completion(0, 1).unwrap();
    let toggle = manager.toggle_set_completion(0, 1).unwrap();
    assert!(!toggle.completed);

    let set = manager.logged_exercises()[0].logged_sets[1].clone();
    assert!(!set.completed);
    assert_eq!(set.logged_weight.as_deref(), Some("52.5"));
    assert_eq!(set.logged_reps.as_deref(), Some("8"));
}

#[tokio::test(start_paused = true)]
async fn empty_set_cannot_be_completed_without_history() {
    let manager = manager();
    manager.start_workout(push_day(Some(60)));
    let before = manager.snapshot();

    let err = manager.toggle_set_completion(0, 0).unwrap_err();
    assert_eq!(err, SessionError::Validation(ValidationError::EmptySetValues));
    assert_eq!(manager.snapshot(), before);
    assert!(manager.rest_countdown().is_none());

    // A weight alone is not enough either.
    manager
        .update_set_values(0, 0, Some("50".into()), None)
        .unwrap();
    assert!(manager.toggle_set_completion(0, 0).is_err());
}

#[tokio::test(start_paused = true)]
async fn empty_set_is_backfilled_from_previous_performance() {
    let manager = manager();
    manager.start_workout(push_day(None));
    manager.set_previous_performance(
        [(
            "bench press".to_string(),
            vec![SetValues {
                weight: "47.5".into(),
                reps: "9".into(),
            }],
        )]
        .into_iter()
        .collect(),
    );

    let toggle = manager.toggle_set_completion(0, 1).unwrap();
    assert!(toggle.completed);
    assert!(toggle.backfilled);

    let set = manager.logged_exercises()[0].logged_sets[1].clone();
    assert_eq!(set.logged_weight.as_deref(), Some("47.5"));
    assert_eq!(set.logged_reps.as_deref(), Some("9"));
}

#[tokio::test(start_paused = true)]
async fn previous_performance_is_loaded_from_backend() {
    let manager = manager();
    manager.start_workout(push_day(None));

    let mut backend = MockBackend::new();
    backend
        .expect_previous_performance()
        .times(1)
        .returning(|name| {
            if name == "Bench Press" {
                Ok(vec![SetValues {
                    weight: "60".into(),
                    reps: "5".into(),
                }])
            } else {
                Ok(vec![])
            }
        });
    manager.load_previous_performance(&backend).await;

    let toggle = manager.toggle_set_completion(0, 0).unwrap();
    assert!(toggle.backfilled);
    assert_eq!(manager.metrics().total_volume, 300.0);
}

#[tokio::test(start_paused = true)]
async fn completing_a_set_starts_the_rest_countdown() {
    let manager = manager();
    manager.start_workout(push_day(Some(30)));
    log_set(&manager, 0, "50", "10");
    log_set(&manager, 1, "50", "10");

    let toggle = manager.toggle_set_completion(0, 0).unwrap();
    assert_eq!(toggle.rest_started, Some(30));
    run_for(10).await;
    assert_eq!(manager.rest_countdown().unwrap().remaining_seconds, 20);

    // A second completion replaces the running countdown.
    manager.toggle_set_completion(0, 1).unwrap();
    assert_eq!(manager.rest_countdown().unwrap().remaining_seconds, 30);
    run_for(29).await;
    assert_eq!(manager.rest_countdown().unwrap().remaining_seconds, 1);
    run_for(1).await;
    assert!(manager.rest_countdown().is_none());
}

#[tokio::test(start_paused = true)]
async fn skipping_rest_cancels_the_countdown() {
    let manager = manager();
    manager.start_workout(push_day(Some(90)));
    log_set(&manager, 0, "50", "10");
    manager.toggle_set_completion(0, 0).unwrap();

    assert_eq!(manager.extend_rest(15), Some(105));
    assert!(manager.skip_rest());
    assert!(!manager.skip_rest());
    run_for(5).await;
    assert!(manager.rest_countdown().is_none());
    assert_eq!(manager.extend_rest(15), None);
}

#[tokio::test(start_paused = true)]
async fn save_persists_only_completed_sets_and_resets() {
    let manager = manager();
    manager.start_workout(push_day(Some(60)));
    log_set(&manager, 0, "50", "10");
    log_set(&manager, 1, "55", "6");
    manager.toggle_set_completion(0, 0).unwrap();
    run_for(42).await;

    let mut backend = MockBackend::new();
    backend
        .expect_persist_workout()
        .times(1)
        .withf(|record| {
            record.routine_name == "Push Day"
                && record.duration_seconds == 42
                && record.set_count() == 1
                && record.exercises[0].sets[0].weight == 50.0
                && record.exercises[0].sets[0].reps == 10
        })
        .returning(|_| Ok(7));

    let mut events = manager.subscribe();
    assert_eq!(manager.save_workout(&backend).await, Ok(7));
    assert_eq!(manager.snapshot(), WorkoutSession::default());
    assert_eq!(events.recv().await.unwrap(), SessionEvent::Saved(7));

    run_for(3).await;
    assert_eq!(manager.elapsed_seconds(), 0);
}

#[tokio::test(start_paused = true)]
async fn failed_save_preserves_the_session() {
    let manager = manager();
    manager.start_workout(push_day(None));
    log_set(&manager, 0, "50", "10");
    manager.toggle_set_completion(0, 0).unwrap();
    run_for(5).await;
    let before = manager.snapshot();

    let mut backend = MockBackend::new();
    backend
        .expect_persist_workout()
        .times(1)
        .returning(|_| Err(BackendError::Transport("offline".into())));

    let err = manager.save_workout(&backend).await.unwrap_err();
    assert!(matches!(err, SessionError::Backend(BackendError::Transport(_))));
    assert_eq!(manager.snapshot(), before);
    assert!(!manager.is_saving());

    // Still running, so the retry can include the extra time.
    run_for(1).await;
    assert_eq!(manager.elapsed_seconds(), 6);
}

#[tokio::test(start_paused = true)]
async fn failed_save_of_paused_workout_stays_paused() {
    let manager = manager();
    manager.start_workout(push_day(None));
    log_set(&manager, 0, "50", "10");
    manager.toggle_set_completion(0, 0).unwrap();
    manager.pause_workout();

    let mut backend = MockBackend::new();
    backend
        .expect_persist_workout()
        .returning(|_| Err(BackendError::Constraint("duplicate".into())));

    assert!(manager.save_workout(&backend).await.is_err());
    assert_eq!(manager.running_state(), RunningState::Paused);
}

#[tokio::test(start_paused = true)]
async fn save_requires_an_active_workout_with_completed_sets() {
    let manager = manager();
    let backend = MockBackend::new();

    assert_eq!(
        manager.save_workout(&backend).await,
        Err(SessionError::NoActiveWorkout)
    );

    manager.start_workout(push_day(None));
    assert_eq!(
        manager.save_workout(&backend).await,
        Err(SessionError::Validation(ValidationError::NothingToSave))
    );
    assert_eq!(manager.running_state(), RunningState::Running);
}

#[tokio::test(start_paused = true)]
async fn edits_require_an_active_workout() {
    let manager = manager();
    assert_eq!(
        manager.update_logged_exercises(vec![]),
        Err(SessionError::NoActiveWorkout)
    );
    assert_eq!(
        manager.toggle_set_completion(0, 0),
        Err(SessionError::NoActiveWorkout)
    );
}

#[tokio::test(start_paused = true)]
async fn set_and_exercise_edits() {
    let manager = manager();
    manager.start_workout(push_day(None));

    let id = manager.add_set(0).unwrap();
    let sets = manager.logged_exercises()[0].logged_sets.clone();
    assert_eq!(sets.len(), 3);
    assert_eq!(sets[2].id, id);
    assert_eq!(sets[2].planned_weight, "50");

    let first_id = sets[0].id.clone();
    log_set(&manager, 0, "45", "12");
    assert_eq!(manager.logged_exercises()[0].logged_sets[0].id, first_id);

    let removed = manager.remove_set(0, 2).unwrap();
    assert_eq!(removed.id, id);
    assert!(matches!(
        manager.remove_set(0, 5),
        Err(SessionError::SetNotFound { .. })
    ));

    let index = manager
        .add_exercise(Exercise::new(
            "Overhead Press",
            vec![WorkoutSet::planned("30", "8")],
            Some(120),
        ))
        .unwrap();
    assert_eq!(index, 1);
    assert_eq!(manager.logged_exercises()[1].logged_sets.len(), 1);

    manager
        .replace_exercise(1, Exercise::new("Dumbbell Press", vec![], None))
        .unwrap();
    assert_eq!(manager.logged_exercises()[1].name, "Dumbbell Press");

    manager.set_rest_time(0, Some(75)).unwrap();
    assert_eq!(manager.logged_exercises()[0].rest_time_seconds, Some(75));

    manager.remove_exercise(1).unwrap();
    assert_eq!(manager.logged_exercises().len(), 1);
    assert_eq!(
        manager.remove_exercise(3),
        Err(SessionError::ExerciseNotFound(3))
    );
}

#[tokio::test(start_paused = true)]
async fn update_replaces_logged_exercises() {
    let manager = manager();
    manager.start_workout(push_day(None));

    let mut exercises = manager.logged_exercises();
    exercises[0].logged_sets.truncate(1);
    manager.update_logged_exercises(exercises.clone()).unwrap();
    assert_eq!(manager.logged_exercises(), exercises);
    assert_eq!(manager.metrics().planned_sets, 2);
}

#[tokio::test(start_paused = true)]
async fn subscribers_see_lifecycle_events() {
    let manager = manager();
    let mut events = manager.subscribe();

    manager.start_workout(push_day(None));
    assert_eq!(events.recv().await.unwrap(), SessionEvent::Started);

    run_for(1).await;
    assert_eq!(events.recv().await.unwrap(), SessionEvent::Ticked(1));

    manager.pause_workout();
    assert_eq!(events.recv().await.unwrap(), SessionEvent::Paused);
    manager.discard_workout();
    assert_eq!(events.recv().await.unwrap(), SessionEvent::Discarded);
}

#[tokio::test(start_paused = true)]
async fn edits_are_refused_while_a_save_is_in_flight() {
    let manager = manager();
    manager.start_workout(push_day(None));
    log_set(&manager, 0, "50", "10");
    log_set(&manager, 1, "55", "8");
    manager.toggle_set_completion(0, 0).unwrap();

    let backend = Arc::new(SlowBackend::default());
    let save = tokio::spawn({
        let manager = manager.clone();
        let backend = backend.clone();
        async move { manager.save_workout(backend.as_ref()).await }
    });
    time::sleep(Duration::from_millis(500)).await;
    assert!(manager.is_saving());

    assert_eq!(
        manager.toggle_set_completion(0, 1),
        Err(SessionError::SaveInProgress)
    );
    assert_eq!(
        manager.update_set_values(0, 1, Some("60".into()), None),
        Err(SessionError::SaveInProgress)
    );
    assert_eq!(manager.add_set(0), Err(SessionError::SaveInProgress));
    assert_eq!(
        manager.save_workout(backend.as_ref()).await,
        Err(SessionError::SaveInProgress)
    );
    manager.resume_workout();
    assert_eq!(manager.running_state(), RunningState::Paused);

    assert_eq!(save.await.unwrap(), Ok(1));
    let saved = backend.saved.lock().unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].set_count(), 1);
    assert_eq!(manager.running_state(), RunningState::Idle);
}

#[tokio::test(start_paused = true)]
async fn rest_stops_when_its_exercise_is_replaced() {
    let manager = manager();
    manager.start_workout(push_day(Some(60)));
    log_set(&manager, 0, "50", "10");
    manager.toggle_set_completion(0, 0).unwrap();
    assert!(manager.rest_countdown().is_some());

    // Rewriting the list with the same exercises keeps the countdown.
    manager
        .update_logged_exercises(manager.logged_exercises())
        .unwrap();
    assert_eq!(manager.rest_countdown().unwrap().exercise_index, 0);

    manager
        .replace_exercise(0, Exercise::new("Dumbbell Press", vec![], Some(60)))
        .unwrap();
    assert!(manager.rest_countdown().is_none());
    run_for(5).await;
    assert!(manager.rest_countdown().is_none());
}

#[tokio::test(start_paused = true)]
async fn rest_stops_when_exercises_are_swapped_out() {
    let manager = manager();
    manager.start_workout(push_day(Some(60)));
    log_set(&manager, 0, "50", "10");
    manager.toggle_set_completion(0, 0).unwrap();

    let squat = Exercise::new("Squat", vec![WorkoutSet::planned("100", "5")], None).seeded();
    let mut exercises = manager.logged_exercises();
    exercises.insert(0, squat);
    manager.update_logged_exercises(exercises).unwrap();
    assert!(manager.rest_countdown().is_none());
}

#[tokio::test(start_paused = true)]
async fn toggling_a_missing_exercise_reports_the_exercise() {
    let manager = manager();
    manager.start_workout(push_day(None));

    assert_eq!(
        manager.toggle_set_completion(4, 0),
        Err(SessionError::ExerciseNotFound(4))
    );
    assert_eq!(
        manager.update_set_values(4, 0, Some("50".into()), None),
        Err(SessionError::ExerciseNotFound(4))
    );
    assert_eq!(
        manager.toggle_set_completion(0, 9),
        Err(SessionError::SetNotFound {
            exercise_index: 0,
            set_index: 9
        })
    );
}
