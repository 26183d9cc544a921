pub mod models;
pub mod operations;
pub mod schema;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::{QueryResult, SqliteConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use log::{debug, error, info};

use crate::backend::{Backend, WorkoutRecord, WorkoutSummary};
use crate::error::BackendError;
use crate::session::models::{Routine, SetValues};
use crate::tracking::{FoodEntry, Measurement, Profile};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

#[derive(Debug)]
struct SqlitePragmas;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )
        .map_err(diesel::r2d2::Error::QueryError)
    }
}

impl From<DieselError> for BackendError {
    fn from(e: DieselError) -> Self {
        match e {
            DieselError::DatabaseError(
                kind @ (DatabaseErrorKind::UniqueViolation
                | DatabaseErrorKind::ForeignKeyViolation
                | DatabaseErrorKind::NotNullViolation
                | DatabaseErrorKind::CheckViolation),
                info,
            ) => BackendError::Constraint(format!("{:?}: {}", kind, info.message())),
            other => BackendError::Transport(other.to_string()),
        }
    }
}

/// SQLite-backed persistence. Cloning shares the connection pool.
#[derive(Clone)]
pub struct SqliteBackend {
    pool: DbPool,
}

impl SqliteBackend {
    /// Opens (creating if needed) the database at `path` and applies pending
    /// migrations.
    pub fn open(path: &str) -> Result<Self> {
        let in_memory = path == ":memory:";
        let manager = ConnectionManager::<SqliteConnection>::new(path);
        let pool = Pool::builder()
            // Every in-memory connection is its own database.
            .max_size(if in_memory { 1 } else { 8 })
            .connection_customizer(Box::new(SqlitePragmas))
            .build(manager)
            .with_context(|| format!("Failed to open database at {}", path))?;

        let mut pooled = pool.get().context("Failed to acquire a connection")?;
        let conn: &mut SqliteConnection = &mut pooled;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))?;
        for version in &applied {
            info!("Applied migration: {}", version);
        }
        debug!("Database ready at {}", path);

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    async fn run<T, F>(&self, op: F) -> Result<T, BackendError>
    where
        T: Send + 'static,
        F: FnOnce(&mut SqliteConnection) -> QueryResult<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        let result = tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|e| BackendError::Transport(e.to_string()))?;
            op(&mut *conn).map_err(BackendError::from)
        })
        .await
        .map_err(|e| BackendError::Transport(e.to_string()))?;

        if let Err(e) = &result {
            error!("Database operation failed: {}", e);
        }
        result
    }
}

#[async_trait]
impl Backend for SqliteBackend {
    async fn persist_workout(&self, record: &WorkoutRecord) -> Result<i64, BackendError> {
        let record = record.clone();
        let id = self
            .run(move |conn| operations::insert_workout(conn, &record))
            .await?;
        info!("Workout saved with id {}", id);
        Ok(id)
    }

    async fn list_workouts(&self, limit: u32) -> Result<Vec<WorkoutSummary>, BackendError> {
        self.run(move |conn| operations::list_workouts(conn, limit))
            .await
    }

    async fn previous_performance(
        &self,
        exercise_name: &str,
    ) -> Result<Vec<SetValues>, BackendError> {
        let name = exercise_name.to_string();
        self.run(move |conn| operations::previous_performance(conn, &name))
            .await
    }

    async fn create_routine(&self, routine: &Routine) -> Result<String, BackendError> {
        routine.validate()?;
        let routine = routine.clone();
        self.run(move |conn| {
            operations::insert_routine(conn, &routine)?;
            Ok(routine.id)
        })
        .await
    }

    async fn update_routine(&self, routine: &Routine) -> Result<(), BackendError> {
        routine.validate()?;
        let id = routine.id.clone();
        let routine = routine.clone();
        let found = self
            .run(move |conn| operations::replace_routine(conn, &routine))
            .await?;
        if found {
            Ok(())
        } else {
            Err(BackendError::Constraint(format!(
                "routine {} does not exist",
                id
            )))
        }
    }

    async fn list_routines(&self) -> Result<Vec<Routine>, BackendError> {
        self.run(operations::load_routines).await
    }

    async fn get_routine(&self, id: &str) -> Result<Option<Routine>, BackendError> {
        let id = id.to_string();
        self.run(move |conn| operations::load_routine(conn, &id))
            .await
    }

    async fn delete_routine(&self, id: &str) -> Result<bool, BackendError> {
        let id = id.to_string();
        self.run(move |conn| operations::delete_routine(conn, &id))
            .await
    }

    async fn get_profile(&self) -> Result<Option<Profile>, BackendError> {
        self.run(operations::load_profile).await
    }

    async fn save_profile(&self, profile: &Profile) -> Result<(), BackendError> {
        profile.bmr()?;
        let profile = profile.clone();
        self.run(move |conn| operations::save_profile(conn, &profile))
            .await
    }

    async fn add_measurement(&self, measurement: &Measurement) -> Result<i64, BackendError> {
        measurement.validate()?;
        let measurement = measurement.clone();
        self.run(move |conn| operations::insert_measurement(conn, &measurement))
            .await
    }

    async fn list_measurements(&self, limit: u32) -> Result<Vec<Measurement>, BackendError> {
        self.run(move |conn| operations::load_measurements(conn, limit))
            .await
    }

    async fn add_food_entry(&self, entry: &FoodEntry) -> Result<i64, BackendError> {
        entry.validate()?;
        let entry = entry.clone();
        self.run(move |conn| operations::insert_food_entry(conn, &entry))
            .await
    }

    async fn list_food_entries(&self, day: NaiveDate) -> Result<Vec<FoodEntry>, BackendError> {
        self.run(move |conn| operations::load_food_entries(conn, day))
            .await
    }

    async fn delete_food_entry(&self, id: i64) -> Result<bool, BackendError> {
        self.run(move |conn| operations::delete_food_entry(conn, id))
            .await
    }
}
