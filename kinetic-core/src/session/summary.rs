//! Metrics derived from the logged sets. Computed on demand, never stored.

use serde::{Deserialize, Serialize};

use crate::session::WorkoutSessionManager;
use crate::session::models::Exercise;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct SessionMetrics {
    /// Sum of weight x reps over completed sets.
    pub total_volume: f64,
    pub sets_performed: u32,
    pub planned_sets: u32,
    /// Completed share of the planned sets, 0-100.
    pub progress_percentage: u32,
}

impl SessionMetrics {
    pub fn from_exercises(exercises: &[Exercise]) -> Self {
        let total_volume = exercises
            .iter()
            .flat_map(Exercise::completed_sets)
            .map(|s| s.volume())
            .sum();
        let sets_performed = exercises
            .iter()
            .map(|e| e.completed_sets().count())
            .sum::<usize>() as u32;
        let planned_sets = exercises
            .iter()
            .map(|e| e.planned_sets.len())
            .sum::<usize>() as u32;

        let progress_percentage = if planned_sets == 0 {
            0
        } else {
            let ratio = f64::from(sets_performed) / f64::from(planned_sets) * 100.0;
            ratio.round().min(100.0) as u32
        };

        Self {
            total_volume,
            sets_performed,
            planned_sets,
            progress_percentage,
        }
    }
}

impl WorkoutSessionManager {
    pub fn metrics(&self) -> SessionMetrics {
        SessionMetrics::from_exercises(&self.lock().session.logged_exercises)
    }
}

/// `h:mm:ss` for an hour or more, `m:ss` below.
pub fn format_elapsed(seconds: u64) -> String {
    let (h, m, s) = (seconds / 3600, (seconds % 3600) / 60, seconds % 60);
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{}:{:02}", m, s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::models::WorkoutSet;

    #[test]
    fn no_completed_sets_means_zero_volume() {
        let exercise = Exercise::new("Squat", vec![WorkoutSet::planned("100", "5")], None).seeded();
        let metrics = SessionMetrics::from_exercises(&[exercise]);
        assert_eq!(metrics.total_volume, 0.0);
        assert_eq!(metrics.sets_performed, 0);
        assert_eq!(metrics.progress_percentage, 0);
    }

    #[test]
    fn progress_is_zero_without_planned_sets() {
        let mut exercise = Exercise::new("Dips", vec![], None);
        let mut set = WorkoutSet::planned("0", "12");
        set.completed = true;
        exercise.logged_sets.push(set);

        let metrics = SessionMetrics::from_exercises(&[exercise]);
        assert_eq!(metrics.sets_performed, 1);
        assert_eq!(metrics.progress_percentage, 0);
    }

    #[test]
    fn progress_rounds() {
        let mut exercise = Exercise::new(
            "Row",
            vec![
                WorkoutSet::planned("40", "10"),
                WorkoutSet::planned("40", "10"),
                WorkoutSet::planned("40", "10"),
            ],
            None,
        )
        .seeded();
        exercise.logged_sets[0].completed = true;
        exercise.logged_sets[0].logged_weight = Some("40".into());
        exercise.logged_sets[0].logged_reps = Some("10".into());

        let metrics = SessionMetrics::from_exercises(&[exercise]);
        assert_eq!(metrics.progress_percentage, 33);
        assert_eq!(metrics.total_volume, 400.0);
    }

    #[test]
    fn formats_elapsed_time() {
        assert_eq!(format_elapsed(0), "0:00");
        assert_eq!(format_elapsed(75), "1:15");
        assert_eq!(format_elapsed(3_726), "1:02:06");
    }
}
