use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use super::expiration_date::ExpirationDate;
use super::food::Food;
use super::macronutrients::Macronutrients;
use super::quantity::Quantity;
use crate::error::{PantryError, Result};
use crate::time;

pub const MAX_LOCATION_LENGTH: usize = 100;
pub const MAX_NOTES_LENGTH: usize = 500;

/// Input for [`PantryItem::create`].
#[derive(Debug, Clone)]
pub struct NewPantryItem {
    pub food: Arc<Food>,
    pub quantity: Quantity,
    pub expiration: ExpirationDate,
    pub purchased_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

impl NewPantryItem {
    pub fn new(food: Arc<Food>, quantity: Quantity, expiration: ExpirationDate) -> Self {
        Self {
            food,
            quantity,
            expiration,
            purchased_at: None,
            location: None,
            notes: None,
        }
    }

    pub fn with_purchased_at(mut self, purchased_at: DateTime<Utc>) -> Self {
        self.purchased_at = Some(purchased_at);
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Persisted field set of a pantry item. `food_id` names the food the
/// caller must supply on reconstruction.
#[derive(Debug, Clone)]
pub struct PantryItemProps {
    pub id: String,
    pub food_id: String,
    pub quantity: Quantity,
    pub expiration: ExpirationDate,
    pub purchased_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Stock of one food in the pantry. Aggregate root referencing a [`Food`].
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PantryItem {
    id: String,
    food: Arc<Food>,
    quantity: Quantity,
    expiration: ExpirationDate,
    purchased_at: Option<DateTime<Utc>>,
    location: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl PantryItem {
    pub fn create(new: NewPantryItem) -> Result<Self> {
        let now = time::now();
        let item = Self {
            id: Uuid::new_v4().to_string(),
            food: new.food,
            quantity: new.quantity,
            expiration: new.expiration,
            purchased_at: new.purchased_at.map(time::truncate),
            location: normalize_optional(new.location),
            notes: normalize_optional(new.notes),
            created_at: now,
            updated_at: now,
        };
        item.validate()?;
        Ok(item)
    }

    /// Rebuild from storage. `food` must be the food named by `props.food_id`.
    pub fn reconstruct(props: PantryItemProps, food: Arc<Food>) -> Result<Self> {
        if food.id() != props.food_id {
            return Err(PantryError::ReferenceIntegrity(format!(
                "pantry item {} references food {} but food {} was supplied",
                props.id,
                props.food_id,
                food.id()
            )));
        }
        let item = Self {
            id: props.id,
            food,
            quantity: props.quantity,
            expiration: props.expiration,
            purchased_at: props.purchased_at,
            location: normalize_optional(props.location),
            notes: normalize_optional(props.notes),
            created_at: props.created_at,
            updated_at: props.updated_at,
        };
        item.validate()?;
        Ok(item)
    }

    fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(PantryError::validation("pantry item id cannot be empty"));
        }
        if self.quantity.quantity_type() != self.food.default_quantity_type() {
            return Err(PantryError::validation(format!(
                "quantity type {} does not match {} measured {}",
                self.quantity.quantity_type(),
                self.food.name(),
                self.food.default_quantity_type()
            )));
        }
        if let Some(location) = &self.location {
            if location.chars().count() > MAX_LOCATION_LENGTH {
                return Err(PantryError::validation(format!(
                    "location cannot exceed {} characters",
                    MAX_LOCATION_LENGTH
                )));
            }
        }
        if let Some(notes) = &self.notes {
            if notes.chars().count() > MAX_NOTES_LENGTH {
                return Err(PantryError::validation(format!(
                    "notes cannot exceed {} characters",
                    MAX_NOTES_LENGTH
                )));
            }
        }
        if self.updated_at < self.created_at {
            return Err(PantryError::validation(
                "updated_at cannot be earlier than created_at",
            ));
        }
        Ok(())
    }

    fn touched(&self, change: impl FnOnce(&mut PantryItem)) -> Result<Self> {
        let mut next = self.clone();
        change(&mut next);
        next.updated_at = time::next_after(self.updated_at);
        next.validate()?;
        Ok(next)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn food(&self) -> &Arc<Food> {
        &self.food
    }

    pub fn food_id(&self) -> &str {
        self.food.id()
    }

    pub fn quantity(&self) -> &Quantity {
        &self.quantity
    }

    pub fn expiration(&self) -> &ExpirationDate {
        &self.expiration
    }

    pub fn purchased_at(&self) -> Option<DateTime<Utc>> {
        self.purchased_at
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_expired(&self) -> bool {
        self.expiration.is_expired()
    }

    pub fn is_expired_at(&self, reference: DateTime<Utc>) -> bool {
        self.expiration.is_expired_at(reference)
    }

    pub fn days_until_expiration(&self) -> i64 {
        self.expiration.days_until_expiration()
    }

    pub fn days_until_expiration_at(&self, reference: DateTime<Utc>) -> i64 {
        self.expiration.days_until_expiration_at(reference)
    }

    pub fn is_expiring_soon(&self, threshold_days: i64) -> bool {
        self.expiration.is_expiring_soon(threshold_days)
    }

    pub fn is_expiring_soon_at(&self, threshold_days: i64, reference: DateTime<Utc>) -> bool {
        self.expiration.is_expiring_soon_at(threshold_days, reference)
    }

    pub fn is_safety_critical(&self) -> bool {
        self.expiration.is_safety_critical()
    }

    /// True when the remaining amount is at or below `threshold`.
    pub fn is_low(&self, threshold: f64) -> bool {
        self.quantity.amount() <= threshold
    }

    pub fn is_empty(&self) -> bool {
        self.quantity.is_zero()
    }

    /// Macronutrients of the whole remaining quantity.
    pub fn macronutrients(&self) -> Result<Macronutrients> {
        self.food.macronutrients_for(&self.quantity)
    }

    /// Take `amount` (in the item's unit) out of the pantry.
    pub fn consume(&self, amount: f64) -> Result<Self> {
        let taken = self.quantity.with_amount(amount)?;
        let remaining = self.quantity.subtract(&taken)?;
        self.touched(|item| item.quantity = remaining)
    }

    pub fn add_quantity(&self, amount: f64) -> Result<Self> {
        let added = self.quantity.with_amount(amount)?;
        let total = self.quantity.add(&added)?;
        self.touched(|item| item.quantity = total)
    }

    pub fn update_quantity(&self, quantity: Quantity) -> Result<Self> {
        self.touched(|item| item.quantity = quantity)
    }

    pub fn update_expiration(&self, expiration: ExpirationDate) -> Result<Self> {
        self.touched(|item| item.expiration = expiration)
    }

    pub fn update_location(&self, location: Option<String>) -> Result<Self> {
        self.touched(|item| item.location = normalize_optional(location))
    }

    pub fn update_notes(&self, notes: Option<String>) -> Result<Self> {
        self.touched(|item| item.notes = normalize_optional(notes))
    }

    /// Point at a newer version of the same food.
    pub fn with_food(&self, food: Arc<Food>) -> Result<Self> {
        if food.id() != self.food.id() {
            return Err(PantryError::ReferenceIntegrity(format!(
                "pantry item {} cannot switch from food {} to food {}",
                self.id,
                self.food.id(),
                food.id()
            )));
        }
        self.touched(|item| item.food = food)
    }
}

impl fmt::Display for PantryItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} ({})",
            self.food.name(),
            self.quantity,
            self.expiration
        )?;
        if let Some(location) = &self.location {
            write!(f, " @ {}", location)?;
        }
        Ok(())
    }
}
