use std::sync::Arc;

use crate::db::SqlValue;
use crate::error::Result;
use crate::models::{ExpirationDate, Food, PantryItem, PantryItemProps, Quantity};
use crate::time;

use super::parse_column;

/// One row of the `pantry_items` table.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct PantryItemRow {
    pub id: String,
    pub food_id: String,
    pub quantity_amount: f64,
    pub quantity_unit: String,
    pub quantity_type: String,
    pub expiration_date: String,
    pub expiration_type: String,
    pub purchased_at: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl PantryItemRow {
    pub const TABLE: &'static str = "pantry_items";

    pub const COLUMNS: [&'static str; 12] = [
        "id",
        "food_id",
        "quantity_amount",
        "quantity_unit",
        "quantity_type",
        "expiration_date",
        "expiration_type",
        "purchased_at",
        "location",
        "notes",
        "created_at",
        "updated_at",
    ];

    pub fn values(&self) -> [SqlValue; 12] {
        [
            self.id.as_str().into(),
            self.food_id.as_str().into(),
            self.quantity_amount.into(),
            self.quantity_unit.as_str().into(),
            self.quantity_type.as_str().into(),
            self.expiration_date.as_str().into(),
            self.expiration_type.as_str().into(),
            self.purchased_at.clone().into(),
            self.location.clone().into(),
            self.notes.clone().into(),
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

pub struct PantryItemMapper;

impl PantryItemMapper {
    pub fn to_persistence(item: &PantryItem) -> PantryItemRow {
        let quantity = item.quantity();
        let expiration = item.expiration();
        PantryItemRow {
            id: item.id().to_string(),
            food_id: item.food_id().to_string(),
            quantity_amount: quantity.amount(),
            quantity_unit: quantity.unit().to_string(),
            quantity_type: quantity.quantity_type().to_string(),
            expiration_date: time::to_storage(&expiration.date()),
            expiration_type: expiration.expiration_type().to_string(),
            purchased_at: item.purchased_at().as_ref().map(time::to_storage),
            location: item.location().map(str::to_string),
            notes: item.notes().map(str::to_string),
            created_at: time::to_storage(&item.created_at()),
            updated_at: time::to_storage(&item.updated_at()),
        }
    }

    /// Rebuild an item from its row and the food it references.
    pub fn to_domain(row: PantryItemRow, food: Arc<Food>) -> Result<PantryItem> {
        let quantity = Quantity::new(
            row.quantity_amount,
            parse_column("quantity_unit", &row.quantity_unit)?,
            parse_column("quantity_type", &row.quantity_type)?,
        )?;
        let expiration = ExpirationDate::new(
            time::from_storage(&row.expiration_date)?,
            parse_column("expiration_type", &row.expiration_type)?,
        );
        let purchased_at = row
            .purchased_at
            .as_deref()
            .map(time::from_storage)
            .transpose()?;

        PantryItem::reconstruct(
            PantryItemProps {
                id: row.id,
                food_id: row.food_id,
                quantity,
                expiration,
                purchased_at,
                location: row.location,
                notes: row.notes,
                created_at: time::from_storage(&row.created_at)?,
                updated_at: time::from_storage(&row.updated_at)?,
            },
            food,
        )
    }
}
