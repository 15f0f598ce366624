use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

use crate::error::{PantryError, Result};

/// Energy and macronutrient content, per serving of a food.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Macronutrients {
    calories: f64,
    protein: f64,
    carbohydrates: f64,
    fat: f64,
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn check(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(PantryError::validation(format!(
            "{} must be a finite number",
            field
        )));
    }
    if value < 0.0 {
        return Err(PantryError::validation(format!(
            "{} cannot be negative",
            field
        )));
    }
    Ok(())
}

impl Macronutrients {
    pub fn new(calories: f64, protein: f64, carbohydrates: f64, fat: f64) -> Result<Self> {
        check("calories", calories)?;
        check("protein", protein)?;
        check("carbohydrates", carbohydrates)?;
        check("fat", fat)?;
        Ok(Self {
            calories,
            protein,
            carbohydrates,
            fat,
        })
    }

    pub fn zero() -> Self {
        Self {
            calories: 0.0,
            protein: 0.0,
            carbohydrates: 0.0,
            fat: 0.0,
        }
    }

    pub fn calories(&self) -> f64 {
        self.calories
    }

    pub fn protein(&self) -> f64 {
        self.protein
    }

    pub fn carbohydrates(&self) -> f64 {
        self.carbohydrates
    }

    pub fn fat(&self) -> f64 {
        self.fat
    }

    /// Scale every value by `ratio`, rounding each to one decimal place.
    pub fn scale(&self, ratio: f64) -> Result<Self> {
        if !ratio.is_finite() || ratio < 0.0 {
            return Err(PantryError::validation(format!(
                "scale ratio must be a non-negative number, got {}",
                ratio
            )));
        }
        Ok(Self {
            calories: round_one_decimal(self.calories * ratio),
            protein: round_one_decimal(self.protein * ratio),
            carbohydrates: round_one_decimal(self.carbohydrates * ratio),
            fat: round_one_decimal(self.fat * ratio),
        })
    }
}

impl Default for Macronutrients {
    fn default() -> Self {
        Self::zero()
    }
}

impl Add for Macronutrients {
    type Output = Macronutrients;

    fn add(self, other: Macronutrients) -> Macronutrients {
        Macronutrients {
            calories: self.calories + other.calories,
            protein: self.protein + other.protein,
            carbohydrates: self.carbohydrates + other.carbohydrates,
            fat: self.fat + other.fat,
        }
    }
}

impl fmt::Display for Macronutrients {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} kcal, protein {} g, carbs {} g, fat {} g",
            self.calories, self.protein, self.carbohydrates, self.fat
        )
    }
}
