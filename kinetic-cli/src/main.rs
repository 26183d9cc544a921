mod exercise_spec;
mod workout_screen;

use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use log::{LevelFilter, debug};
use tokio::runtime::Handle;

use kinetic::backend::Backend;
use kinetic::catalog::ExerciseCatalog;
use kinetic::config::Config;
use kinetic::db::SqliteBackend;
use kinetic::food::{FoodDatabase, FoodLookup, OpenFoodFacts};
use kinetic::logging::{init_logger, parse_level};
use kinetic::nutrition::{ActivityLevel, Goal, MacroTotals, Sex};
use kinetic::session::{Exercise, Routine, WorkoutSessionManager, format_elapsed};
use kinetic::tracking::{FoodEntry, Meal, Measurement, Profile};

use crate::exercise_spec::parse_exercise_spec;
use crate::workout_screen::{WorkoutOutcome, run_workout_screen};

#[derive(Parser, Debug)]
#[command(version, about = "Kinetic - Workout and Nutrition Tracker", long_about = None)]
struct Args {
    /// SQLite database file (overrides DATABASE_URL)
    #[arg(short, long, global = true)]
    database: Option<String>,
    /// Log level: off, error, warn, info, debug, trace (overrides KINETIC_LOG)
    #[arg(long, global = true, value_parser = parse_log_level)]
    log: Option<LevelFilter>,
    #[command(subcommand)]
    command: Commands,
}

fn parse_log_level(s: &str) -> Result<LevelFilter, String> {
    parse_level(s).ok_or_else(|| format!("unknown log level '{}'", s))
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage workout routines
    #[command(subcommand)]
    Routine(RoutineCommand),
    /// Interactive workout tracking
    Workout {
        /// Routine to follow
        routine_id: Option<String>,
        /// Start without a routine
        #[arg(short, long, conflicts_with = "routine_id")]
        freestyle: bool,
        /// Name of a freestyle workout
        #[arg(short, long, requires = "freestyle")]
        name: Option<String>,
    },
    /// List saved workouts
    History {
        #[arg(short, long, default_value_t = 20)]
        limit: u32,
    },
    /// Search products and keep a food log
    #[command(subcommand)]
    Food(FoodCommand),
    /// Body stats used for calorie targets
    #[command(subcommand)]
    Profile(ProfileCommand),
    /// Body measurements
    #[command(subcommand)]
    Measure(MeasureCommand),
    /// Browse the bundled exercise catalog
    Catalog {
        /// Free text, e.g. "barbell squat"
        query: Option<String>,
        #[arg(short, long)]
        muscle: Option<String>,
        #[arg(short, long)]
        equipment: Option<String>,
        /// Show instructions for each match
        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(Subcommand, Debug)]
enum RoutineCommand {
    List,
    Show {
        id: String,
    },
    /// Exercises as NAME=SETSxREPS[@WEIGHT][/REST], e.g. "Bench Press=3x8@60/90"
    Create {
        name: String,
        #[arg(required = true)]
        exercises: Vec<String>,
    },
    Delete {
        id: String,
    },
}

#[derive(Subcommand, Debug)]
enum FoodCommand {
    Search {
        query: String,
    },
    Lookup {
        code: String,
    },
    /// Log an amount of a product by barcode
    Log {
        code: String,
        #[arg(short, long)]
        grams: f64,
        #[arg(short, long, default_value = "snack")]
        meal: Meal,
        /// Day as YYYY-MM-DD, today when omitted
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Show a day's log against the calorie goal
    Today {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    Remove {
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
enum ProfileCommand {
    Show,
    Set {
        #[arg(long)]
        name: String,
        #[arg(long)]
        sex: Sex,
        #[arg(long)]
        age: u32,
        #[arg(long)]
        height_cm: f64,
        #[arg(long)]
        weight_kg: f64,
        #[arg(long, default_value = "moderately_active")]
        activity: ActivityLevel,
        #[arg(long, default_value = "maintain")]
        goal: Goal,
    },
}

#[derive(Subcommand, Debug)]
enum MeasureCommand {
    Add {
        #[arg(long)]
        weight_kg: Option<f64>,
        #[arg(long)]
        body_fat: Option<f64>,
        #[arg(long)]
        waist_cm: Option<f64>,
        #[arg(long)]
        chest_cm: Option<f64>,
        #[arg(long)]
        arm_cm: Option<f64>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    List {
        #[arg(short, long, default_value_t = 10)]
        limit: u32,
    },
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn print_routine(routine: &Routine) {
    println!("{} ({})", routine.name, routine.id);
    for exercise in &routine.exercises {
        let rest = exercise
            .rest_time_seconds
            .map(|s| format!(", rest {}s", s))
            .unwrap_or_default();
        println!("\t{}{}", exercise.name, rest);
        for (idx, set) in exercise.planned_sets.iter().enumerate() {
            println!(
                "\t\t{}: {} x {}",
                idx + 1,
                if set.planned_weight.is_empty() {
                    "-"
                } else {
                    set.planned_weight.as_str()
                },
                set.planned_reps
            );
        }
    }
}

fn print_totals(label: &str, totals: &MacroTotals) {
    println!(
        "{:<10} {:>7.0} kcal  P {:>5.1} g  C {:>5.1} g  F {:>5.1} g",
        label, totals.calories, totals.protein_g, totals.carbs_g, totals.fat_g
    );
}

async fn routine_command(backend: &SqliteBackend, command: RoutineCommand) -> Result<()> {
    match command {
        RoutineCommand::List => {
            let routines = backend.list_routines().await?;
            if routines.is_empty() {
                println!("No routines yet. Create one with 'kinetic routine create'.");
            }
            for routine in routines {
                println!(
                    "{}, {} ({} exercises, {} sets)",
                    routine.id,
                    routine.name,
                    routine.exercises.len(),
                    routine.planned_set_count()
                );
            }
        }
        RoutineCommand::Show { id } => match backend.get_routine(&id).await? {
            Some(routine) => print_routine(&routine),
            None => bail!("No routine with id {}", id),
        },
        RoutineCommand::Create { name, exercises } => {
            let exercises = exercises
                .iter()
                .map(|spec| parse_exercise_spec(spec))
                .collect::<Result<Vec<Exercise>>>()?;
            let routine = Routine::new(name, exercises);
            let id = backend.create_routine(&routine).await?;
            println!("Created routine {}", id);
        }
        RoutineCommand::Delete { id } => {
            if backend.delete_routine(&id).await? {
                println!("Deleted routine {}", id);
            } else {
                bail!("No routine with id {}", id);
            }
        }
    }
    Ok(())
}

async fn workout_command(
    backend: &SqliteBackend,
    routine_id: Option<String>,
    freestyle: bool,
    name: Option<String>,
) -> Result<()> {
    let manager = WorkoutSessionManager::new(Handle::current());
    match routine_id {
        Some(id) => {
            let routine = backend
                .get_routine(&id)
                .await?
                .with_context(|| format!("No routine with id {}", id))?;
            manager.start_workout(routine);
        }
        None if freestyle => manager.start_freestyle(name, vec![]),
        None => bail!("Give a routine id or --freestyle"),
    }
    manager.load_previous_performance(backend).await;

    let terminal = ratatui::init();
    let result = run_workout_screen(terminal, manager.clone(), backend).await;
    ratatui::restore();

    match result? {
        WorkoutOutcome::Saved(id) => println!("Workout saved as #{}", id),
        WorkoutOutcome::Discarded => println!("Workout discarded"),
        WorkoutOutcome::Quit => {
            manager.discard_workout();
            println!("Exited without saving");
        }
    }
    Ok(())
}

async fn food_command(
    backend: &SqliteBackend,
    food: &FoodLookup<OpenFoodFacts>,
    command: FoodCommand,
) -> Result<()> {
    match command {
        FoodCommand::Search { query } => {
            let products = food.search(&query).await?;
            if products.is_empty() {
                println!("No products found for '{}'", query);
            }
            for product in products {
                println!(
                    "{}, {}{}",
                    product.code,
                    product.name,
                    product
                        .brand
                        .map(|b| format!(" ({})", b))
                        .unwrap_or_default()
                );
            }
        }
        FoodCommand::Lookup { code } => {
            let product = food
                .product(&code)
                .await?
                .with_context(|| format!("No product with code {}", code))?;
            println!("{} ({})", product.name, product.code);
            if let Some(serving) = &product.serving_size {
                println!("Serving: {}", serving);
            }
            print_totals("per 100 g", &product.per_100g.for_amount(100.0));
        }
        FoodCommand::Log {
            code,
            grams,
            meal,
            date,
        } => {
            let product = food
                .product(&code)
                .await?
                .with_context(|| format!("No product with code {}", code))?;
            let entry = FoodEntry {
                id: None,
                eaten_on: date.unwrap_or_else(today),
                meal,
                product_code: Some(product.code),
                name: product.name,
                grams,
                per_100g: product.per_100g,
            };
            let totals = entry.macros();
            let id = backend.add_food_entry(&entry).await?;
            println!("Logged #{} {} g of {} to {}", id, grams, entry.name, meal);
            print_totals("", &totals);
        }
        FoodCommand::Today { date } => {
            let day = date.unwrap_or_else(today);
            let entries = backend.list_food_entries(day).await?;
            println!("Food log for {}", day);
            for entry in &entries {
                println!(
                    "#{} {:<9} {:<30} {:>6.0} g",
                    entry.id.unwrap_or_default(),
                    entry.meal.as_str(),
                    entry.name,
                    entry.grams
                );
            }
            let consumed = MacroTotals::from_entries(&entries);
            print_totals("Total", &consumed);
            if let Some(profile) = backend.get_profile().await? {
                let goal = profile.calorie_goal()?;
                println!(
                    "Goal {:.0} kcal, {:.0} kcal left",
                    goal,
                    goal - consumed.calories
                );
            }
        }
        FoodCommand::Remove { id } => {
            if backend.delete_food_entry(id).await? {
                println!("Removed entry #{}", id);
            } else {
                bail!("No food entry #{}", id);
            }
        }
    }
    Ok(())
}

async fn profile_command(backend: &SqliteBackend, command: ProfileCommand) -> Result<()> {
    match command {
        ProfileCommand::Show => match backend.get_profile().await? {
            Some(profile) => {
                println!(
                    "{}: {}, {} years, {:.0} cm, {:.1} kg",
                    profile.display_name,
                    profile.sex.as_str(),
                    profile.age_years,
                    profile.height_cm,
                    profile.weight_kg
                );
                println!(
                    "Activity {}, goal {}",
                    profile.activity_level.as_str(),
                    profile.goal.as_str()
                );
                println!(
                    "BMR {:.0} kcal, TDEE {:.0} kcal, target {:.0} kcal",
                    profile.bmr()?,
                    profile.tdee()?,
                    profile.calorie_goal()?
                );
            }
            None => println!("No profile yet. Set one with 'kinetic profile set'."),
        },
        ProfileCommand::Set {
            name,
            sex,
            age,
            height_cm,
            weight_kg,
            activity,
            goal,
        } => {
            let profile = Profile {
                display_name: name,
                sex,
                age_years: age,
                height_cm,
                weight_kg,
                activity_level: activity,
                goal,
            };
            backend.save_profile(&profile).await?;
            println!(
                "Profile saved, daily target {:.0} kcal",
                profile.calorie_goal()?
            );
        }
    }
    Ok(())
}

async fn measure_command(backend: &SqliteBackend, command: MeasureCommand) -> Result<()> {
    match command {
        MeasureCommand::Add {
            weight_kg,
            body_fat,
            waist_cm,
            chest_cm,
            arm_cm,
            notes,
            date,
        } => {
            let measurement = Measurement {
                id: None,
                measured_on: date.unwrap_or_else(today),
                weight_kg,
                body_fat_percent: body_fat,
                waist_cm,
                chest_cm,
                arm_cm,
                notes,
            };
            let id = backend.add_measurement(&measurement).await?;
            println!("Recorded measurement #{}", id);
        }
        MeasureCommand::List { limit } => {
            let fmt = |label: &str, v: Option<f64>| {
                v.map(|v| format!(" {} {:.1}", label, v)).unwrap_or_default()
            };
            for m in backend.list_measurements(limit).await? {
                println!(
                    "{}{}{}{}{}{}",
                    m.measured_on,
                    fmt("weight", m.weight_kg),
                    fmt("bf%", m.body_fat_percent),
                    fmt("waist", m.waist_cm),
                    fmt("chest", m.chest_cm),
                    fmt("arm", m.arm_cm)
                );
            }
        }
    }
    Ok(())
}

fn catalog_command(
    query: Option<String>,
    muscle: Option<String>,
    equipment: Option<String>,
    verbose: bool,
) {
    let catalog = ExerciseCatalog::bundled();
    let matches: Vec<_> = catalog
        .search(query.as_deref().unwrap_or_default())
        .into_iter()
        .filter(|e| muscle.as_deref().is_none_or(|m| e.works(m)))
        .filter(|e| {
            equipment
                .as_deref()
                .is_none_or(|eq| e.equipment.eq_ignore_ascii_case(eq))
        })
        .collect();

    if matches.is_empty() {
        println!(
            "No exercises found. Known muscles: {}",
            catalog.muscles().join(", ")
        );
    }
    for exercise in matches {
        println!(
            "{}, {} [{}] {}",
            exercise.id,
            exercise.name,
            exercise.equipment,
            exercise.target_muscles.join("/")
        );
        if verbose {
            for (idx, step) in exercise.instructions.iter().enumerate() {
                println!("\t{}. {}", idx + 1, step);
            }
        }
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    dotenv().ok();
    let args = Args::parse();

    let mut config = Config::from_env()?;
    if let Some(database) = args.database {
        config.database_url = database;
    }
    if let Some(level) = args.log {
        config.log_level = level;
    }
    init_logger(config.log_level);
    debug!("Using database {}", config.database_url);

    match args.command {
        Commands::Catalog {
            query,
            muscle,
            equipment,
            verbose,
        } => {
            catalog_command(query, muscle, equipment, verbose);
            Ok(())
        }
        command => {
            let backend = SqliteBackend::open(&config.database_url)?;
            run(&config, &backend, command).await
        }
    }
}

async fn run(config: &Config, backend: &SqliteBackend, command: Commands) -> Result<()> {
    match command {
        Commands::Routine(command) => routine_command(backend, command).await,
        Commands::Workout {
            routine_id,
            freestyle,
            name,
        } => workout_command(backend, routine_id, freestyle, name).await,
        Commands::History { limit } => {
            let workouts = backend.list_workouts(limit).await?;
            if workouts.is_empty() {
                println!("No saved workouts");
            }
            for workout in workouts {
                println!(
                    "{}, {} - {} ({}, {} sets, {:.0} kg)",
                    workout.id,
                    workout.routine_name,
                    workout
                        .performed_at
                        .with_timezone(&Local)
                        .format("%Y-%m-%d %H:%M"),
                    format_elapsed(workout.duration_seconds),
                    workout.set_count,
                    workout.total_volume
                );
            }
            Ok(())
        }
        Commands::Food(command) => {
            let source =
                OpenFoodFacts::new(&config.food_api_base_url, &config.food_api_user_agent)?;
            food_command(backend, &FoodLookup::new(source), command).await
        }
        Commands::Profile(command) => profile_command(backend, command).await,
        Commands::Measure(command) => measure_command(backend, command).await,
        Commands::Catalog { .. } => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn parses_routine_create() {
        let args = Args::try_parse_from([
            "kinetic",
            "routine",
            "create",
            "Push",
            "Bench Press=3x8@60/90",
            "Dips=3x10",
        ])
        .unwrap();
        match args.command {
            Commands::Routine(RoutineCommand::Create { name, exercises }) => {
                assert_eq!(name, "Push");
                assert_eq!(exercises.len(), 2);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn parses_food_log_with_meal_and_date() {
        let args = Args::try_parse_from([
            "kinetic",
            "--database",
            "/tmp/test.db",
            "food",
            "log",
            "3017620422003",
            "--grams",
            "30",
            "--meal",
            "breakfast",
            "--date",
            "2026-10-19",
        ])
        .unwrap();
        assert_eq!(args.database.as_deref(), Some("/tmp/test.db"));
        match args.command {
            Commands::Food(FoodCommand::Log {
                grams, meal, date, ..
            }) => {
                assert_eq!(grams, 30.0);
                assert_eq!(meal, Meal::Breakfast);
                assert_eq!(date, NaiveDate::from_ymd_opt(2026, 10, 19));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn profile_enums_parse_from_text() {
        let args = Args::try_parse_from([
            "kinetic",
            "profile",
            "set",
            "--name",
            "sam",
            "--sex",
            "female",
            "--age",
            "31",
            "--height-cm",
            "165",
            "--weight-kg",
            "60",
            "--goal",
            "cut",
        ])
        .unwrap();
        match args.command {
            Commands::Profile(ProfileCommand::Set {
                sex,
                activity,
                goal,
                ..
            }) => {
                assert_eq!(sex, Sex::Female);
                assert_eq!(activity, ActivityLevel::ModeratelyActive);
                assert_eq!(goal, Goal::LoseWeight);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn freestyle_conflicts_with_routine() {
        assert!(Args::try_parse_from(["kinetic", "workout", "abc", "--freestyle"]).is_err());
        assert!(Args::try_parse_from(["kinetic", "--log", "chatty", "history"]).is_err());
    }
}
