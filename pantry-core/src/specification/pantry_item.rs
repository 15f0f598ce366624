use chrono::{DateTime, Utc};

use super::fragment::{unique_param, QueryFragment};
use super::Specification;
use crate::models::{ExpirationType, PantryItem};
use crate::time;

#[derive(Debug, Clone)]
pub struct PantryItemByIdSpecification {
    id: String,
    param: String,
}

impl PantryItemByIdSpecification {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            param: unique_param("item_id"),
        }
    }
}

impl Specification<PantryItem> for PantryItemByIdSpecification {
    fn is_satisfied_by(&self, item: &PantryItem) -> bool {
        item.id() == self.id
    }

    fn to_query_fragment(&self) -> QueryFragment {
        QueryFragment::new(format!("id = :{}", self.param))
            .with_param(self.param.clone(), self.id.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct PantryItemByFoodIdSpecification {
    food_id: String,
    param: String,
}

impl PantryItemByFoodIdSpecification {
    pub fn new(food_id: impl Into<String>) -> Self {
        Self {
            food_id: food_id.into(),
            param: unique_param("food_id"),
        }
    }
}

impl Specification<PantryItem> for PantryItemByFoodIdSpecification {
    fn is_satisfied_by(&self, item: &PantryItem) -> bool {
        item.food_id() == self.food_id
    }

    fn to_query_fragment(&self) -> QueryFragment {
        QueryFragment::new(format!("food_id = :{}", self.param))
            .with_param(self.param.clone(), self.food_id.as_str())
    }
}

/// Storage location, compared ignoring ASCII case.
#[derive(Debug, Clone)]
pub struct PantryItemByLocationSpecification {
    location: String,
    param: String,
}

impl PantryItemByLocationSpecification {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into().trim().to_ascii_lowercase(),
            param: unique_param("location"),
        }
    }
}

impl Specification<PantryItem> for PantryItemByLocationSpecification {
    fn is_satisfied_by(&self, item: &PantryItem) -> bool {
        item.location()
            .map(|l| l.to_ascii_lowercase() == self.location)
            .unwrap_or(false)
    }

    fn to_query_fragment(&self) -> QueryFragment {
        QueryFragment::new(format!(
            "location IS NOT NULL AND LOWER(location) = :{}",
            self.param
        ))
            .with_param(self.param.clone(), self.location.as_str())
    }
}

/// Items whose expiration date has passed.
///
/// Without a pinned reference instant, "now" is read each time the
/// specification is evaluated.
#[derive(Debug, Clone)]
pub struct ExpiredSpecification {
    reference: Option<DateTime<Utc>>,
    param: String,
}

impl ExpiredSpecification {
    pub fn new() -> Self {
        Self {
            reference: None,
            param: unique_param("expired_before"),
        }
    }

    pub fn at(reference: DateTime<Utc>) -> Self {
        Self {
            reference: Some(time::clamp(time::truncate(reference))),
            ..Self::new()
        }
    }

    fn reference(&self) -> DateTime<Utc> {
        self.reference.unwrap_or_else(time::now)
    }
}

impl Default for ExpiredSpecification {
    fn default() -> Self {
        Self::new()
    }
}

impl Specification<PantryItem> for ExpiredSpecification {
    fn is_satisfied_by(&self, item: &PantryItem) -> bool {
        item.is_expired_at(self.reference())
    }

    fn to_query_fragment(&self) -> QueryFragment {
        QueryFragment::new(format!("expiration_date < :{}", self.param))
            .with_param(self.param.clone(), time::to_storage(&self.reference()))
    }
}

/// Complement of [`ExpiredSpecification`].
#[derive(Debug, Clone)]
pub struct NotExpiredSpecification {
    reference: Option<DateTime<Utc>>,
    param: String,
}

impl NotExpiredSpecification {
    pub fn new() -> Self {
        Self {
            reference: None,
            param: unique_param("valid_from"),
        }
    }

    pub fn at(reference: DateTime<Utc>) -> Self {
        Self {
            reference: Some(time::clamp(time::truncate(reference))),
            ..Self::new()
        }
    }

    fn reference(&self) -> DateTime<Utc> {
        self.reference.unwrap_or_else(time::now)
    }
}

impl Default for NotExpiredSpecification {
    fn default() -> Self {
        Self::new()
    }
}

impl Specification<PantryItem> for NotExpiredSpecification {
    fn is_satisfied_by(&self, item: &PantryItem) -> bool {
        !item.is_expired_at(self.reference())
    }

    fn to_query_fragment(&self) -> QueryFragment {
        QueryFragment::new(format!("expiration_date >= :{}", self.param))
            .with_param(self.param.clone(), time::to_storage(&self.reference()))
    }
}

/// Items with between 0 and `days` whole days (rounded up) left.
///
/// That window is the half-open interval `(reference - 1 day,
/// reference + days]`, which is what the SQL form selects.
#[derive(Debug, Clone)]
pub struct ExpiringSoonSpecification {
    days: i64,
    reference: Option<DateTime<Utc>>,
    from_param: String,
    until_param: String,
}

impl ExpiringSoonSpecification {
    pub fn new(days: i64) -> Self {
        Self {
            days,
            reference: None,
            from_param: unique_param("expiring_from"),
            until_param: unique_param("expiring_until"),
        }
    }

    pub fn at(days: i64, reference: DateTime<Utc>) -> Self {
        Self {
            reference: Some(time::clamp(time::truncate(reference))),
            ..Self::new(days)
        }
    }

    pub fn days(&self) -> i64 {
        self.days
    }

    fn reference(&self) -> DateTime<Utc> {
        self.reference.unwrap_or_else(time::now)
    }
}

impl Specification<PantryItem> for ExpiringSoonSpecification {
    fn is_satisfied_by(&self, item: &PantryItem) -> bool {
        item.is_expiring_soon_at(self.days, self.reference())
    }

    fn to_query_fragment(&self) -> QueryFragment {
        let reference = self.reference();
        let from = time::add_days(reference, -1);
        let until = time::add_days(reference, self.days);
        QueryFragment::new(format!(
            "expiration_date > :{} AND expiration_date <= :{}",
            self.from_param, self.until_param
        ))
        .with_param(self.from_param.clone(), time::to_storage(&from))
        .with_param(self.until_param.clone(), time::to_storage(&until))
    }
}

/// Items with at most `threshold` left, in the item's own unit.
#[derive(Debug, Clone)]
pub struct LowQuantitySpecification {
    threshold: f64,
    param: String,
}

impl LowQuantitySpecification {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            param: unique_param("low_threshold"),
        }
    }
}

impl Specification<PantryItem> for LowQuantitySpecification {
    fn is_satisfied_by(&self, item: &PantryItem) -> bool {
        item.is_low(self.threshold)
    }

    fn to_query_fragment(&self) -> QueryFragment {
        QueryFragment::new(format!("quantity_amount <= :{}", self.param))
            .with_param(self.param.clone(), self.threshold)
    }
}

#[derive(Debug, Clone, Default)]
pub struct EmptySpecification;

impl EmptySpecification {
    pub fn new() -> Self {
        EmptySpecification
    }
}

impl Specification<PantryItem> for EmptySpecification {
    fn is_satisfied_by(&self, item: &PantryItem) -> bool {
        item.is_empty()
    }

    fn to_query_fragment(&self) -> QueryFragment {
        QueryFragment::new("quantity_amount = 0")
    }
}

/// Items carrying a use-by date.
#[derive(Debug, Clone)]
pub struct SafetyCriticalSpecification {
    param: String,
}

impl SafetyCriticalSpecification {
    pub fn new() -> Self {
        Self {
            param: unique_param("expiration_type"),
        }
    }
}

impl Default for SafetyCriticalSpecification {
    fn default() -> Self {
        Self::new()
    }
}

impl Specification<PantryItem> for SafetyCriticalSpecification {
    fn is_satisfied_by(&self, item: &PantryItem) -> bool {
        item.is_safety_critical()
    }

    fn to_query_fragment(&self) -> QueryFragment {
        QueryFragment::new(format!("expiration_type = :{}", self.param))
            .with_param(self.param.clone(), ExpirationType::UseBy.to_string())
    }
}
