//! Bundled exercise reference data.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use log::error;
use serde::{Deserialize, Serialize};

const BUNDLED_EXERCISES_JSON: &str = include_str!("exercises.json");

static BUNDLED: LazyLock<ExerciseCatalog> = LazyLock::new(|| {
    let exercises = serde_json::from_str(BUNDLED_EXERCISES_JSON).unwrap_or_else(|e| {
        error!("Failed to parse bundled exercise catalog: {}", e);
        Vec::new()
    });
    ExerciseCatalog::new(exercises)
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct CatalogExercise {
    pub id: String,
    pub name: String,
    pub target_muscles: Vec<String>,
    #[serde(default)]
    pub secondary_muscles: Vec<String>,
    pub equipment: String,
    #[serde(default)]
    pub instructions: Vec<String>,
    /// Paths relative to the app's image bundle.
    #[serde(default)]
    pub images: Vec<String>,
}

impl CatalogExercise {
    pub fn works(&self, muscle: &str) -> bool {
        self.target_muscles
            .iter()
            .chain(&self.secondary_muscles)
            .any(|m| m.eq_ignore_ascii_case(muscle.trim()))
    }

    fn matches_term(&self, term: &str) -> bool {
        self.name.to_lowercase().contains(term)
            || self.equipment.to_lowercase().contains(term)
            || self
                .target_muscles
                .iter()
                .any(|m| m.to_lowercase().contains(term))
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExerciseCatalog {
    exercises: Vec<CatalogExercise>,
}

impl ExerciseCatalog {
    pub fn new(mut exercises: Vec<CatalogExercise>) -> Self {
        exercises.sort_by(|a, b| a.name.cmp(&b.name));
        Self { exercises }
    }

    /// The catalog compiled into the binary.
    pub fn bundled() -> &'static ExerciseCatalog {
        &BUNDLED
    }

    pub fn all(&self) -> &[CatalogExercise] {
        &self.exercises
    }

    pub fn len(&self) -> usize {
        self.exercises.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&CatalogExercise> {
        self.exercises.iter().find(|e| e.id == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&CatalogExercise> {
        let name = name.trim();
        self.exercises
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(name))
    }

    /// Exercises matching every whitespace-separated term against name,
    /// equipment or target muscle. An empty query matches everything.
    pub fn search(&self, text: &str) -> Vec<&CatalogExercise> {
        let terms: Vec<String> = text.split_whitespace().map(str::to_lowercase).collect();
        self.exercises
            .iter()
            .filter(|e| terms.iter().all(|t| e.matches_term(t)))
            .collect()
    }

    pub fn by_muscle(&self, muscle: &str) -> Vec<&CatalogExercise> {
        self.exercises.iter().filter(|e| e.works(muscle)).collect()
    }

    pub fn by_equipment(&self, equipment: &str) -> Vec<&CatalogExercise> {
        let equipment = equipment.trim();
        self.exercises
            .iter()
            .filter(|e| e.equipment.eq_ignore_ascii_case(equipment))
            .collect()
    }

    /// Every muscle named in the catalog, sorted.
    pub fn muscles(&self) -> Vec<String> {
        self.exercises
            .iter()
            .flat_map(|e| e.target_muscles.iter().chain(&e.secondary_muscles))
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
