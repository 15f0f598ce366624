//! Pantry Core Library
//!
//! Local persistence for foods and pantry stock: value objects, entities,
//! composable specifications, row mappers, SQLite repositories and a unit
//! of work.

pub mod db;
pub mod error;
pub mod mappers;
pub mod models;
pub mod specification;
pub mod time;

pub use db::{
    Database, FoodRepository, Page, PantryItemRepository, RunResult, SqlValue, TransactionState,
    UnitOfWork,
};
pub use error::{PantryError, Result};
pub use mappers::{FoodMapper, FoodRow, PantryItemMapper, PantryItemRow};
pub use models::{
    ExpirationDate, ExpirationType, Food, FoodCategory, FoodProps, FoodState, Macronutrients,
    NewFood, NewPantryItem, PantryItem, PantryItemProps, Quantity, QuantityType, Unit,
};
pub use specification::{QueryFragment, Spec, Specification, SpecificationExt};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
