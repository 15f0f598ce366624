use crate::db::SqlValue;
use crate::error::Result;
use crate::models::{Food, FoodProps, Macronutrients};
use crate::time;

use super::parse_column;

/// One row of the `foods` table.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct FoodRow {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub calories: f64,
    pub protein: f64,
    pub carbohydrates: f64,
    pub fat: f64,
    pub serving_size: f64,
    pub state: String,
    pub category: String,
    pub default_quantity_type: String,
    pub default_unit: String,
    pub brand: Option<String>,
    pub barcode: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl FoodRow {
    pub const TABLE: &'static str = "foods";

    pub const COLUMNS: [&'static str; 16] = [
        "id",
        "name",
        "description",
        "calories",
        "protein",
        "carbohydrates",
        "fat",
        "serving_size",
        "state",
        "category",
        "default_quantity_type",
        "default_unit",
        "brand",
        "barcode",
        "created_at",
        "updated_at",
    ];

    /// Bound values in `COLUMNS` order.
    pub fn values(&self) -> [SqlValue; 16] {
        [
            self.id.as_str().into(),
            self.name.as_str().into(),
            self.description.clone().into(),
            self.calories.into(),
            self.protein.into(),
            self.carbohydrates.into(),
            self.fat.into(),
            self.serving_size.into(),
            self.state.as_str().into(),
            self.category.as_str().into(),
            self.default_quantity_type.as_str().into(),
            self.default_unit.as_str().into(),
            self.brand.clone().into(),
            self.barcode.clone().into(),
            self.created_at.as_str().into(),
            self.updated_at.as_str().into(),
        ]
    }

    pub fn placeholders() -> String {
        super::placeholders(Self::COLUMNS.len())
    }

    pub fn insert_sql() -> String {
        super::insert_sql(Self::TABLE, &Self::COLUMNS)
    }

    pub fn update_sql() -> String {
        super::update_sql(Self::TABLE, &Self::COLUMNS)
    }

    /// Values for [`FoodRow::update_sql`]: every column after `id`, then `id`.
    pub fn update_values(&self) -> Vec<SqlValue> {
        let [id, rest @ ..] = self.values();
        let mut values = rest.to_vec();
        values.push(id);
        values
    }

    pub fn select_sql() -> String {
        super::select_sql(Self::TABLE, &Self::COLUMNS)
    }
}

pub struct FoodMapper;

impl FoodMapper {
    pub fn to_persistence(food: &Food) -> FoodRow {
        let macros = food.macronutrients();
        FoodRow {
            id: food.id().to_string(),
            name: food.name().to_string(),
            description: food.description().map(str::to_string),
            calories: macros.calories(),
            protein: macros.protein(),
            carbohydrates: macros.carbohydrates(),
            fat: macros.fat(),
            serving_size: food.serving_size(),
            state: food.state().to_string(),
            category: food.category().to_string(),
            default_quantity_type: food.default_quantity_type().to_string(),
            default_unit: food.default_unit().to_string(),
            brand: food.brand().map(str::to_string),
            barcode: food.barcode().map(str::to_string),
            created_at: time::to_storage(&food.created_at()),
            updated_at: time::to_storage(&food.updated_at()),
        }
    }

    /// Rebuild a food from its row. A row that no longer satisfies the
    /// food invariants is a validation error.
    pub fn to_domain(row: FoodRow) -> Result<Food> {
        Food::reconstruct(FoodProps {
            macronutrients: Macronutrients::new(
                row.calories,
                row.protein,
                row.carbohydrates,
                row.fat,
            )?,
            state: parse_column("state", &row.state)?,
            category: parse_column("category", &row.category)?,
            default_quantity_type: parse_column(
                "default_quantity_type",
                &row.default_quantity_type,
            )?,
            default_unit: parse_column("default_unit", &row.default_unit)?,
            created_at: time::from_storage(&row.created_at)?,
            updated_at: time::from_storage(&row.updated_at)?,
            id: row.id,
            name: row.name,
            description: row.description,
            serving_size: row.serving_size,
            brand: row.brand,
            barcode: row.barcode,
        })
    }
}
