use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::macronutrients::Macronutrients;
use super::quantity::{Quantity, QuantityType, Unit};
use crate::error::{PantryError, Result};
use crate::time;

pub const MAX_NAME_LENGTH: usize = 200;
pub const MAX_DESCRIPTION_LENGTH: usize = 1000;
pub const MAX_BRAND_LENGTH: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FoodCategory {
    Fruit,
    Vegetable,
    Grain,
    Protein,
    Dairy,
    Fat,
    Beverage,
    Snack,
    Condiment,
    Other,
}

impl FoodCategory {
    pub const ALL: [FoodCategory; 10] = [
        FoodCategory::Fruit,
        FoodCategory::Vegetable,
        FoodCategory::Grain,
        FoodCategory::Protein,
        FoodCategory::Dairy,
        FoodCategory::Fat,
        FoodCategory::Beverage,
        FoodCategory::Snack,
        FoodCategory::Condiment,
        FoodCategory::Other,
    ];
}

impl fmt::Display for FoodCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FoodCategory::Fruit => "FRUIT",
            FoodCategory::Vegetable => "VEGETABLE",
            FoodCategory::Grain => "GRAIN",
            FoodCategory::Protein => "PROTEIN",
            FoodCategory::Dairy => "DAIRY",
            FoodCategory::Fat => "FAT",
            FoodCategory::Beverage => "BEVERAGE",
            FoodCategory::Snack => "SNACK",
            FoodCategory::Condiment => "CONDIMENT",
            FoodCategory::Other => "OTHER",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for FoodCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        FoodCategory::ALL
            .into_iter()
            .find(|c| c.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!(
                    "Invalid food category '{}'. Valid options: fruit, vegetable, grain, protein, dairy, fat, beverage, snack, condiment, other",
                    s
                )
            })
    }
}

/// Physical state of a food.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FoodState {
    Solid,
    Liquid,
    Powder,
}

impl fmt::Display for FoodState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FoodState::Solid => write!(f, "SOLID"),
            FoodState::Liquid => write!(f, "LIQUID"),
            FoodState::Powder => write!(f, "POWDER"),
        }
    }
}

impl FromStr for FoodState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SOLID" => Ok(FoodState::Solid),
            "LIQUID" => Ok(FoodState::Liquid),
            "POWDER" => Ok(FoodState::Powder),
            _ => Err(format!(
                "Invalid food state '{}'. Valid options: solid, liquid, powder",
                s
            )),
        }
    }
}

/// Input for [`Food::create`].
#[derive(Debug, Clone)]
pub struct NewFood {
    pub name: String,
    pub description: Option<String>,
    pub macronutrients: Macronutrients,
    pub serving_size: f64,
    pub state: FoodState,
    pub category: FoodCategory,
    pub default_quantity_type: QuantityType,
    pub default_unit: Unit,
    pub brand: Option<String>,
    pub barcode: Option<String>,
}

impl NewFood {
    /// Macronutrients are given per `serving_size` of `default_unit`.
    pub fn new(
        name: impl Into<String>,
        macronutrients: Macronutrients,
        serving_size: f64,
        default_unit: Unit,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            macronutrients,
            serving_size,
            state: FoodState::Solid,
            category: FoodCategory::Other,
            default_quantity_type: default_unit.quantity_type(),
            default_unit,
            brand: None,
            barcode: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_category(mut self, category: FoodCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_state(mut self, state: FoodState) -> Self {
        self.state = state;
        self
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn with_barcode(mut self, barcode: impl Into<String>) -> Self {
        self.barcode = Some(barcode.into());
        self
    }
}

/// Persisted field set of a food, used to reconstruct it.
#[derive(Debug, Clone)]
pub struct FoodProps {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub macronutrients: Macronutrients,
    pub serving_size: f64,
    pub state: FoodState,
    pub category: FoodCategory,
    pub default_quantity_type: QuantityType,
    pub default_unit: Unit,
    pub brand: Option<String>,
    pub barcode: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A food definition. Aggregate root; every change returns a new value.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Food {
    id: String,
    name: String,
    description: Option<String>,
    macronutrients: Macronutrients,
    serving_size: f64,
    state: FoodState,
    category: FoodCategory,
    default_quantity_type: QuantityType,
    default_unit: Unit,
    brand: Option<String>,
    barcode: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Food {
    pub fn create(new: NewFood) -> Result<Self> {
        let now = time::now();
        Self::reconstruct(FoodProps {
            id: Uuid::new_v4().to_string(),
            name: new.name,
            description: new.description,
            macronutrients: new.macronutrients,
            serving_size: new.serving_size,
            state: new.state,
            category: new.category,
            default_quantity_type: new.default_quantity_type,
            default_unit: new.default_unit,
            brand: new.brand,
            barcode: new.barcode,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn reconstruct(props: FoodProps) -> Result<Self> {
        let food = Self {
            id: props.id,
            name: props.name.trim().to_string(),
            description: normalize_optional(props.description),
            macronutrients: props.macronutrients,
            serving_size: props.serving_size,
            state: props.state,
            category: props.category,
            default_quantity_type: props.default_quantity_type,
            default_unit: props.default_unit,
            brand: normalize_optional(props.brand),
            barcode: normalize_optional(props.barcode),
            created_at: props.created_at,
            updated_at: props.updated_at,
        };
        food.validate()?;
        Ok(food)
    }

    fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(PantryError::validation("food id cannot be empty"));
        }
        if self.name.is_empty() {
            return Err(PantryError::validation("food name cannot be empty"));
        }
        if self.name.chars().count() > MAX_NAME_LENGTH {
            return Err(PantryError::validation(format!(
                "food name cannot exceed {} characters",
                MAX_NAME_LENGTH
            )));
        }
        if let Some(description) = &self.description {
            if description.chars().count() > MAX_DESCRIPTION_LENGTH {
                return Err(PantryError::validation(format!(
                    "food description cannot exceed {} characters",
                    MAX_DESCRIPTION_LENGTH
                )));
            }
        }
        if let Some(brand) = &self.brand {
            if brand.chars().count() > MAX_BRAND_LENGTH {
                return Err(PantryError::validation(format!(
                    "brand cannot exceed {} characters",
                    MAX_BRAND_LENGTH
                )));
            }
        }
        if let Some(barcode) = &self.barcode {
            let valid_length = (8..=14).contains(&barcode.len());
            if !valid_length || !barcode.bytes().all(|b| b.is_ascii_digit()) {
                return Err(PantryError::validation(format!(
                    "barcode must be 8 to 14 digits, got '{}'",
                    barcode
                )));
            }
        }
        if !self.serving_size.is_finite() || self.serving_size <= 0.0 {
            return Err(PantryError::validation(format!(
                "serving size must be greater than zero, got {}",
                self.serving_size
            )));
        }
        if !self.default_quantity_type.accepts(self.default_unit) {
            return Err(PantryError::validation(format!(
                "default unit {} is not valid for quantity type {}",
                self.default_unit, self.default_quantity_type
            )));
        }
        if self.updated_at < self.created_at {
            return Err(PantryError::validation(
                "updated_at cannot be earlier than created_at",
            ));
        }
        Ok(())
    }

    fn touched(&self, change: impl FnOnce(&mut Food)) -> Result<Self> {
        let mut next = self.clone();
        change(&mut next);
        next.updated_at = time::next_after(self.updated_at);
        next.validate()?;
        Ok(next)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn macronutrients(&self) -> &Macronutrients {
        &self.macronutrients
    }

    pub fn serving_size(&self) -> f64 {
        self.serving_size
    }

    pub fn state(&self) -> FoodState {
        self.state
    }

    pub fn category(&self) -> FoodCategory {
        self.category
    }

    pub fn default_quantity_type(&self) -> QuantityType {
        self.default_quantity_type
    }

    pub fn default_unit(&self) -> Unit {
        self.default_unit
    }

    pub fn brand(&self) -> Option<&str> {
        self.brand.as_deref()
    }

    pub fn barcode(&self) -> Option<&str> {
        self.barcode.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Macronutrients for `amount` of the default unit.
    pub fn macronutrients_for_amount(&self, amount: f64) -> Result<Macronutrients> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(PantryError::validation(format!(
                "amount must be a non-negative number, got {}",
                amount
            )));
        }
        self.macronutrients.scale(amount / self.serving_size)
    }

    pub fn macronutrients_for(&self, quantity: &Quantity) -> Result<Macronutrients> {
        let in_default_unit = quantity.convert_to(self.default_unit)?;
        self.macronutrients_for_amount(in_default_unit.amount())
    }

    pub fn update_name(&self, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        self.touched(|f| f.name = name.trim().to_string())
    }

    pub fn update_description(&self, description: Option<String>) -> Result<Self> {
        self.touched(|f| f.description = normalize_optional(description))
    }

    pub fn update_macronutrients(&self, macronutrients: Macronutrients) -> Result<Self> {
        self.touched(|f| f.macronutrients = macronutrients)
    }

    pub fn update_serving_size(&self, serving_size: f64) -> Result<Self> {
        self.touched(|f| f.serving_size = serving_size)
    }

    pub fn update_category(&self, category: FoodCategory) -> Result<Self> {
        self.touched(|f| f.category = category)
    }

    pub fn update_state(&self, state: FoodState) -> Result<Self> {
        self.touched(|f| f.state = state)
    }

    pub fn update_brand(&self, brand: Option<String>) -> Result<Self> {
        self.touched(|f| f.brand = normalize_optional(brand))
    }

    pub fn update_barcode(&self, barcode: Option<String>) -> Result<Self> {
        self.touched(|f| f.barcode = normalize_optional(barcode))
    }

    pub fn update_default_unit(&self, quantity_type: QuantityType, unit: Unit) -> Result<Self> {
        self.touched(|f| {
            f.default_quantity_type = quantity_type;
            f.default_unit = unit;
        })
    }
}

impl fmt::Display for Food {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        writeln!(f, "{}", "=".repeat(self.name.chars().count()))?;
        writeln!(f, "ID: {}", self.id)?;
        writeln!(f, "Category: {}  State: {}", self.category, self.state)?;
        if let Some(brand) = &self.brand {
            writeln!(f, "Brand: {}", brand)?;
        }
        if let Some(barcode) = &self.barcode {
            writeln!(f, "Barcode: {}", barcode)?;
        }
        writeln!(
            f,
            "Per {} {}: {}",
            self.serving_size,
            self.default_unit.symbol(),
            self.macronutrients
        )?;
        if let Some(description) = &self.description {
            writeln!(f, "\n{}", description)?;
        }
        Ok(())
    }
}
