use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{PantryError, Result};

/// How a food is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuantityType {
    ByWeight,
    ByVolume,
    ByUnit,
}

impl QuantityType {
    pub fn units(&self) -> &'static [Unit] {
        match self {
            QuantityType::ByWeight => &[Unit::Gram, Unit::Kilogram],
            QuantityType::ByVolume => &[Unit::Milliliter, Unit::Liter],
            QuantityType::ByUnit => &[Unit::Piece, Unit::Serving],
        }
    }

    pub fn accepts(&self, unit: Unit) -> bool {
        unit.quantity_type() == *self
    }
}

impl fmt::Display for QuantityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuantityType::ByWeight => write!(f, "BY_WEIGHT"),
            QuantityType::ByVolume => write!(f, "BY_VOLUME"),
            QuantityType::ByUnit => write!(f, "BY_UNIT"),
        }
    }
}

impl FromStr for QuantityType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().replace('-', "_").as_str() {
            "BY_WEIGHT" | "WEIGHT" => Ok(QuantityType::ByWeight),
            "BY_VOLUME" | "VOLUME" => Ok(QuantityType::ByVolume),
            "BY_UNIT" | "UNIT" => Ok(QuantityType::ByUnit),
            _ => Err(format!(
                "Invalid quantity type '{}'. Valid options: by_weight, by_volume, by_unit",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Unit {
    Gram,
    Kilogram,
    Milliliter,
    Liter,
    Piece,
    Serving,
}

impl Unit {
    pub fn quantity_type(&self) -> QuantityType {
        match self {
            Unit::Gram | Unit::Kilogram => QuantityType::ByWeight,
            Unit::Milliliter | Unit::Liter => QuantityType::ByVolume,
            Unit::Piece | Unit::Serving => QuantityType::ByUnit,
        }
    }

    /// Multiplier to the smallest unit of the same type (grams, milliliters).
    pub fn to_base_factor(&self) -> f64 {
        match self {
            Unit::Kilogram | Unit::Liter => 1000.0,
            Unit::Gram | Unit::Milliliter | Unit::Piece | Unit::Serving => 1.0,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Unit::Gram => "g",
            Unit::Kilogram => "kg",
            Unit::Milliliter => "ml",
            Unit::Liter => "l",
            Unit::Piece => "pc",
            Unit::Serving => "serving",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Gram => write!(f, "GRAM"),
            Unit::Kilogram => write!(f, "KILOGRAM"),
            Unit::Milliliter => write!(f, "MILLILITER"),
            Unit::Liter => write!(f, "LITER"),
            Unit::Piece => write!(f, "PIECE"),
            Unit::Serving => write!(f, "SERVING"),
        }
    }
}

impl FromStr for Unit {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gram" | "grams" | "g" => Ok(Unit::Gram),
            "kilogram" | "kilograms" | "kg" => Ok(Unit::Kilogram),
            "milliliter" | "milliliters" | "ml" => Ok(Unit::Milliliter),
            "liter" | "liters" | "l" => Ok(Unit::Liter),
            "piece" | "pieces" | "pc" => Ok(Unit::Piece),
            "serving" | "servings" => Ok(Unit::Serving),
            _ => Err(format!(
                "Invalid unit '{}'. Valid options: gram, kilogram, milliliter, liter, piece, serving",
                s
            )),
        }
    }
}

/// An amount of something, in a unit compatible with its measurement type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Quantity {
    amount: f64,
    unit: Unit,
    quantity_type: QuantityType,
}

impl Quantity {
    pub fn new(amount: f64, unit: Unit, quantity_type: QuantityType) -> Result<Self> {
        if !amount.is_finite() {
            return Err(PantryError::validation("quantity amount must be a finite number"));
        }
        if amount < 0.0 {
            return Err(PantryError::validation(format!(
                "quantity amount cannot be negative, got {}",
                amount
            )));
        }
        if !quantity_type.accepts(unit) {
            return Err(PantryError::validation(format!(
                "unit {} is not valid for quantity type {}",
                unit, quantity_type
            )));
        }
        Ok(Self {
            amount,
            unit,
            quantity_type,
        })
    }

    /// Build a quantity whose type is implied by the unit.
    pub fn of(amount: f64, unit: Unit) -> Result<Self> {
        Self::new(amount, unit, unit.quantity_type())
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn quantity_type(&self) -> QuantityType {
        self.quantity_type
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0.0
    }

    pub fn add(&self, other: &Quantity) -> Result<Self> {
        self.require_same_unit(other, "add")?;
        Self::new(self.amount + other.amount, self.unit, self.quantity_type)
    }

    pub fn subtract(&self, other: &Quantity) -> Result<Self> {
        self.require_same_unit(other, "subtract")?;
        let remaining = self.amount - other.amount;
        if remaining < 0.0 {
            return Err(PantryError::validation(format!(
                "cannot subtract {} {} from {} {}",
                other.amount,
                other.unit.symbol(),
                self.amount,
                self.unit.symbol()
            )));
        }
        Self::new(remaining, self.unit, self.quantity_type)
    }

    pub fn with_amount(&self, amount: f64) -> Result<Self> {
        Self::new(amount, self.unit, self.quantity_type)
    }

    pub fn scale(&self, factor: f64) -> Result<Self> {
        if !factor.is_finite() || factor < 0.0 {
            return Err(PantryError::validation(format!(
                "scale factor must be a non-negative number, got {}",
                factor
            )));
        }
        Self::new(self.amount * factor, self.unit, self.quantity_type)
    }

    /// Express this quantity in another unit of the same type.
    pub fn convert_to(&self, unit: Unit) -> Result<Self> {
        if unit.quantity_type() != self.quantity_type {
            return Err(PantryError::validation(format!(
                "cannot convert {} to {}",
                self.unit, unit
            )));
        }
        let amount = self.amount * self.unit.to_base_factor() / unit.to_base_factor();
        Self::new(amount, unit, self.quantity_type)
    }

    fn require_same_unit(&self, other: &Quantity, operation: &str) -> Result<()> {
        if self.unit != other.unit {
            return Err(PantryError::validation(format!(
                "cannot {} quantities with different units ({} and {})",
                operation, self.unit, other.unit
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.unit.symbol())
    }
}
