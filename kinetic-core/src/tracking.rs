//! Profile, body measurements and food log records.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::nutrition::{
    self, ActivityLevel, Goal, MacroTotals, Nutrients, Sex, bmr_mifflin_st_jeor,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct Profile {
    pub display_name: String,
    pub sex: Sex,
    pub age_years: u32,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub activity_level: ActivityLevel,
    pub goal: Goal,
}

impl Profile {
    pub fn bmr(&self) -> Result<f64, ValidationError> {
        bmr_mifflin_st_jeor(self.weight_kg, self.height_cm, self.age_years, self.sex)
    }

    pub fn tdee(&self) -> Result<f64, ValidationError> {
        Ok(nutrition::tdee(self.bmr()?, self.activity_level))
    }

    pub fn calorie_goal(&self) -> Result<f64, ValidationError> {
        Ok(nutrition::calorie_goal(self.tdee()?, self.goal))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub id: Option<i64>,
    pub measured_on: NaiveDate,
    pub weight_kg: Option<f64>,
    pub body_fat_percent: Option<f64>,
    pub waist_cm: Option<f64>,
    pub chest_cm: Option<f64>,
    pub arm_cm: Option<f64>,
    pub notes: Option<String>,
}

impl Measurement {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let metrics = [
            ("weight", self.weight_kg),
            ("body fat", self.body_fat_percent),
            ("waist", self.waist_cm),
            ("chest", self.chest_cm),
            ("arm", self.arm_cm),
        ];
        if metrics.iter().all(|(_, v)| v.is_none()) {
            return Err(ValidationError::InvalidValue {
                field: "measurement",
                reason: "at least one metric is required".into(),
            });
        }
        for (field, value) in metrics {
            if let Some(v) = value {
                if !v.is_finite() || v <= 0.0 {
                    return Err(ValidationError::InvalidValue {
                        field,
                        reason: format!("{} is not a positive number", v),
                    });
                }
            }
        }
        if self.body_fat_percent.is_some_and(|bf| bf >= 100.0) {
            return Err(ValidationError::InvalidValue {
                field: "body fat",
                reason: "must be below 100%".into(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "uniffi", derive(uniffi::Enum))]
pub enum Meal {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl Meal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Meal::Breakfast => "breakfast",
            Meal::Lunch => "lunch",
            Meal::Dinner => "dinner",
            Meal::Snack => "snack",
        }
    }
}

impl fmt::Display for Meal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Meal {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "breakfast" => Ok(Meal::Breakfast),
            "lunch" => Ok(Meal::Lunch),
            "dinner" => Ok(Meal::Dinner),
            "snack" | "snacks" => Ok(Meal::Snack),
            other => Err(ValidationError::InvalidValue {
                field: "meal",
                reason: format!("unknown value '{}'", other),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodEntry {
    pub id: Option<i64>,
    pub eaten_on: NaiveDate,
    pub meal: Meal,
    pub product_code: Option<String>,
    pub name: String,
    pub grams: f64,
    pub per_100g: Nutrients,
}

impl FoodEntry {
    pub fn macros(&self) -> MacroTotals {
        self.per_100g.for_amount(self.grams)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "food name",
                reason: "must not be empty".into(),
            });
        }
        if !self.grams.is_finite() || self.grams <= 0.0 {
            return Err(ValidationError::InvalidValue {
                field: "amount",
                reason: "must be a positive number of grams".into(),
            });
        }
        Ok(())
    }
}

impl MacroTotals {
    /// Macro totals over a day's entries.
    pub fn from_entries(entries: &[FoodEntry]) -> Self {
        entries.iter().map(FoodEntry::macros).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    #[test]
    fn profile_calorie_goal() {
        let profile = Profile {
            display_name: "sam".into(),
            sex: Sex::Male,
            age_years: 30,
            height_cm: 180.0,
            weight_kg: 80.0,
            activity_level: ActivityLevel::Sedentary,
            goal: Goal::Maintain,
        };
        // 1780 * 1.2
        assert_eq!(profile.calorie_goal().unwrap(), 2136.0);
    }

    #[test]
    fn measurement_needs_a_positive_metric() {
        let empty = Measurement {
            measured_on: day(),
            ..Default::default()
        };
        assert!(empty.validate().is_err());

        let negative = Measurement {
            weight_kg: Some(-3.0),
            ..empty.clone()
        };
        assert!(negative.validate().is_err());

        let ok = Measurement {
            weight_kg: Some(81.2),
            body_fat_percent: Some(18.0),
            ..empty
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn daily_totals_sum_entries() {
        let entry = |grams| FoodEntry {
            id: None,
            eaten_on: day(),
            meal: Meal::Lunch,
            product_code: None,
            name: "Rice".into(),
            grams,
            per_100g: Nutrients {
                kcal: Some(130.0),
                protein_g: 2.7,
                carbs_g: 28.0,
                fat_g: 0.3,
            },
        };
        let totals = MacroTotals::from_entries(&[entry(100.0), entry(200.0)]);
        assert!((totals.calories - 390.0).abs() < 1e-9);
        assert!((totals.carbs_g - 84.0).abs() < 1e-9);
        assert_eq!(MacroTotals::from_entries(&[]), MacroTotals::default());
    }
}
