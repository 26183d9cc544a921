//! Calorie and macro arithmetic: BMR, TDEE, calorie goals and food log totals.
//!
//! BMR uses the Mifflin-St Jeor equation:
//! `10 * weight_kg + 6.25 * height_cm - 5 * age + s`, with `s = +5` for men and
//! `s = -161` for women. TDEE multiplies BMR by the usual activity factors.

use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

const KCAL_PER_G_PROTEIN: f64 = 4.0;
const KCAL_PER_G_CARBS: f64 = 4.0;
const KCAL_PER_G_FAT: f64 = 9.0;
const MIN_CALORIE_GOAL: f64 = 1200.0;

fn unknown(field: &'static str, value: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field,
        reason: format!("unknown value '{}'", value),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "uniffi", derive(uniffi::Enum))]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }
}

impl FromStr for Sex {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" => Ok(Sex::Male),
            "female" | "f" => Ok(Sex::Female),
            other => Err(unknown("sex", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "uniffi", derive(uniffi::Enum))]
pub enum ActivityLevel {
    Sedentary,
    LightlyActive,
    ModeratelyActive,
    VeryActive,
    ExtraActive,
}

impl ActivityLevel {
    pub fn factor(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::LightlyActive => 1.375,
            ActivityLevel::ModeratelyActive => 1.55,
            ActivityLevel::VeryActive => 1.725,
            ActivityLevel::ExtraActive => 1.9,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "sedentary",
            ActivityLevel::LightlyActive => "lightly_active",
            ActivityLevel::ModeratelyActive => "moderately_active",
            ActivityLevel::VeryActive => "very_active",
            ActivityLevel::ExtraActive => "extra_active",
        }
    }
}

impl FromStr for ActivityLevel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "sedentary" => Ok(ActivityLevel::Sedentary),
            "lightly_active" | "light" => Ok(ActivityLevel::LightlyActive),
            "moderately_active" | "moderate" => Ok(ActivityLevel::ModeratelyActive),
            "very_active" | "very" => Ok(ActivityLevel::VeryActive),
            "extra_active" | "extra" => Ok(ActivityLevel::ExtraActive),
            other => Err(unknown("activity level", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "uniffi", derive(uniffi::Enum))]
pub enum Goal {
    LoseWeight,
    Maintain,
    GainMuscle,
}

impl Goal {
    /// Daily calorie offset applied to TDEE.
    pub fn adjustment(&self) -> f64 {
        match self {
            Goal::LoseWeight => -500.0,
            Goal::Maintain => 0.0,
            Goal::GainMuscle => 300.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Goal::LoseWeight => "lose_weight",
            Goal::Maintain => "maintain",
            Goal::GainMuscle => "gain_muscle",
        }
    }
}

impl FromStr for Goal {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "lose_weight" | "lose" | "cut" => Ok(Goal::LoseWeight),
            "maintain" | "maintenance" => Ok(Goal::Maintain),
            "gain_muscle" | "gain" | "bulk" => Ok(Goal::GainMuscle),
            other => Err(unknown("goal", other)),
        }
    }
}

/// Nutrient content per 100 g (or 100 ml) of a product.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct Nutrients {
    pub kcal: Option<f64>,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

impl Nutrients {
    /// Energy per 100 g, derived from macros when the product does not state it.
    pub fn energy_kcal(&self) -> f64 {
        self.kcal.unwrap_or(
            self.protein_g * KCAL_PER_G_PROTEIN
                + self.carbs_g * KCAL_PER_G_CARBS
                + self.fat_g * KCAL_PER_G_FAT,
        )
    }

    /// Totals for an eaten amount.
    pub fn for_amount(&self, grams: f64) -> MacroTotals {
        let factor = grams.max(0.0) / 100.0;
        MacroTotals {
            calories: self.energy_kcal() * factor,
            protein_g: self.protein_g * factor,
            carbs_g: self.carbs_g * factor,
            fat_g: self.fat_g * factor,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct MacroTotals {
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

impl Add for MacroTotals {
    type Output = MacroTotals;

    fn add(self, rhs: MacroTotals) -> MacroTotals {
        MacroTotals {
            calories: self.calories + rhs.calories,
            protein_g: self.protein_g + rhs.protein_g,
            carbs_g: self.carbs_g + rhs.carbs_g,
            fat_g: self.fat_g + rhs.fat_g,
        }
    }
}

impl Sum for MacroTotals {
    fn sum<I: Iterator<Item = MacroTotals>>(iter: I) -> Self {
        iter.fold(MacroTotals::default(), Add::add)
    }
}

impl fmt::Display for MacroTotals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.0} kcal | P {:.1}g | C {:.1}g | F {:.1}g",
            self.calories, self.protein_g, self.carbs_g, self.fat_g
        )
    }
}

pub fn bmr_mifflin_st_jeor(
    weight_kg: f64,
    height_cm: f64,
    age_years: u32,
    sex: Sex,
) -> Result<f64, ValidationError> {
    if !(20.0..=400.0).contains(&weight_kg) {
        return Err(ValidationError::InvalidValue {
            field: "weight",
            reason: "must be between 20 and 400 kg".into(),
        });
    }
    if !(100.0..=250.0).contains(&height_cm) {
        return Err(ValidationError::InvalidValue {
            field: "height",
            reason: "must be between 100 and 250 cm".into(),
        });
    }
    if !(10..=120).contains(&age_years) {
        return Err(ValidationError::InvalidValue {
            field: "age",
            reason: "must be between 10 and 120 years".into(),
        });
    }

    let offset = match sex {
        Sex::Male => 5.0,
        Sex::Female => -161.0,
    };
    Ok(10.0 * weight_kg + 6.25 * height_cm - 5.0 * f64::from(age_years) + offset)
}

pub fn tdee(bmr: f64, activity: ActivityLevel) -> f64 {
    bmr * activity.factor()
}

/// Daily calorie target for a goal, never below 1200 kcal.
pub fn calorie_goal(tdee: f64, goal: Goal) -> f64 {
    (tdee + goal.adjustment()).max(MIN_CALORIE_GOAL).round()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mifflin_st_jeor_matches_reference_values() {
        // 10*80 + 6.25*180 - 5*30 + 5
        let male = bmr_mifflin_st_jeor(80.0, 180.0, 30, Sex::Male).unwrap();
        assert!((male - 1780.0).abs() < f64::EPSILON);

        // 10*60 + 6.25*165 - 5*25 - 161
        let female = bmr_mifflin_st_jeor(60.0, 165.0, 25, Sex::Female).unwrap();
        assert!((female - 1345.25).abs() < 1e-9);
    }

    #[test]
    fn rejects_out_of_range_inputs() {
        assert!(bmr_mifflin_st_jeor(5.0, 180.0, 30, Sex::Male).is_err());
        assert!(bmr_mifflin_st_jeor(80.0, 180.0, 5, Sex::Male).is_err());
    }

    #[test]
    fn calorie_goal_applies_adjustment_and_floor() {
        let daily = tdee(1780.0, ActivityLevel::ModeratelyActive);
        assert!((daily - 2759.0).abs() < 1e-9);
        assert_eq!(calorie_goal(daily, Goal::LoseWeight), 2259.0);
        assert_eq!(calorie_goal(daily, Goal::GainMuscle), 3059.0);
        assert_eq!(calorie_goal(1300.0, Goal::LoseWeight), 1200.0);
    }

    #[test]
    fn macros_scale_by_amount() {
        let oats = Nutrients {
            kcal: None,
            protein_g: 13.0,
            carbs_g: 60.0,
            fat_g: 7.0,
        };
        let totals = oats.for_amount(50.0);
        assert_eq!(totals.protein_g, 6.5);
        assert_eq!(totals.carbs_g, 30.0);
        assert_eq!(totals.calories, (13.0 * 4.0 + 60.0 * 4.0 + 7.0 * 9.0) / 2.0);

        let sum: MacroTotals = [totals, totals].into_iter().sum();
        assert_eq!(sum.fat_g, 7.0);
    }

    #[test]
    fn parses_enum_names() {
        assert_eq!("lightly-active".parse::<ActivityLevel>(), Ok(ActivityLevel::LightlyActive));
        assert_eq!("bulk".parse::<Goal>(), Ok(Goal::GainMuscle));
        assert!("robot".parse::<Sex>().is_err());
    }
}
