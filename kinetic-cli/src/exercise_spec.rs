//! Parses exercise definitions given on the command line, in the form
//! `NAME=SETSxREPS[@WEIGHT][/REST]`, e.g. `Bench Press=3x8@60/90`.

use anyhow::{Context, Result, bail};
use kinetic::session::{Exercise, WorkoutSet};

const MAX_SETS: u32 = 50;

pub fn parse_exercise_spec(spec: &str) -> Result<Exercise> {
    let (name, scheme) = spec
        .split_once('=')
        .with_context(|| format!("'{}' is missing '=SETSxREPS'", spec))?;
    let name = name.trim();
    if name.is_empty() {
        bail!("'{}' has no exercise name", spec);
    }

    let (scheme, rest) = match scheme.split_once('/') {
        Some((scheme, rest)) => {
            let seconds: u32 = rest
                .trim()
                .parse()
                .with_context(|| format!("invalid rest time '{}'", rest))?;
            (scheme, Some(seconds).filter(|s| *s > 0))
        }
        None => (scheme, None),
    };

    let (scheme, weight) = match scheme.split_once('@') {
        Some((scheme, weight)) => (scheme, weight.trim()),
        None => (scheme, ""),
    };

    let (sets, reps) = scheme
        .trim()
        .split_once(['x', 'X'])
        .with_context(|| format!("'{}' should look like SETSxREPS", scheme))?;
    let sets: u32 = sets
        .trim()
        .parse()
        .with_context(|| format!("invalid set count '{}'", sets))?;
    if sets == 0 || sets > MAX_SETS {
        bail!("set count must be between 1 and {}", MAX_SETS);
    }
    let reps = reps.trim();
    if reps.is_empty() {
        bail!("'{}' has no rep target", spec);
    }

    let planned = (0..sets)
        .map(|_| WorkoutSet::planned(weight, reps))
        .collect();
    Ok(Exercise::new(name, planned, rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_spec() {
        let exercise = parse_exercise_spec("Bench Press=3x8@60/90").unwrap();
        assert_eq!(exercise.name, "Bench Press");
        assert_eq!(exercise.planned_sets.len(), 3);
        assert_eq!(exercise.planned_sets[0].planned_weight, "60");
        assert_eq!(exercise.planned_sets[2].planned_reps, "8");
        assert_eq!(exercise.rest_time_seconds, Some(90));
        assert!(exercise.logged_sets.is_empty());
    }

    #[test]
    fn weight_and_rest_are_optional() {
        let exercise = parse_exercise_spec("Pull-Up = 4 X 6-8").unwrap();
        assert_eq!(exercise.planned_sets.len(), 4);
        assert_eq!(exercise.planned_sets[0].planned_weight, "");
        assert_eq!(exercise.planned_sets[0].planned_reps, "6-8");
        assert_eq!(exercise.rest_time_seconds, None);
    }

    #[test]
    fn set_ids_are_distinct() {
        let exercise = parse_exercise_spec("Squat=2x5@100").unwrap();
        assert_ne!(exercise.planned_sets[0].id, exercise.planned_sets[1].id);
    }

    #[test]
    fn rejects_malformed_specs() {
        for spec in [
            "Bench Press",
            "=3x8",
            "Row=3",
            "Row=0x8",
            "Row=x8",
            "Row=3x",
            "Row=3x8/soon",
        ] {
            assert!(parse_exercise_spec(spec).is_err(), "{} should fail", spec);
        }
    }
}
