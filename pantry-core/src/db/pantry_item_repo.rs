use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::food_repo::clamp_i64;
use super::{CountRow, Database, FoodRepository, Page, SqlValue};
use crate::error::{PantryError, Result};
use crate::mappers::{PantryItemMapper, PantryItemRow};
use crate::models::{Food, PantryItem};
use crate::specification::{
    ExpiredSpecification, ExpiringSoonSpecification, PantryItemByFoodIdSpecification,
    Specification, TrueSpecification,
};

const ORDER_BY: &str = "ORDER BY created_at DESC, id";

/// Pantry items, always returned with the food they reference.
#[derive(Clone)]
pub struct PantryItemRepository {
    db: Arc<Database>,
    foods: FoodRepository,
}

impl PantryItemRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            foods: FoodRepository::new(db.clone()),
            db,
        }
    }

    /// Insert `item`. Referencing a food that is not stored fails with
    /// `ReferenceIntegrity`.
    pub async fn save(&self, item: &PantryItem) -> Result<()> {
        let row = PantryItemMapper::to_persistence(item);
        self.db.run(&PantryItemRow::insert_sql(), &row.values()).await?;
        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<PantryItem> {
        self.find_by_id_or_null(id)
            .await?
            .ok_or_else(|| PantryError::not_found("PantryItem", id))
    }

    pub async fn find_by_id_or_null(&self, id: &str) -> Result<Option<PantryItem>> {
        let sql = format!("{} WHERE id = ?", PantryItemRow::select_sql());
        let row: Option<PantryItemRow> = self.db.get_one(&sql, &[SqlValue::from(id)]).await?;
        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Items matching `spec`, newest first.
    pub async fn find<S>(&self, spec: &S) -> Result<Vec<PantryItem>>
    where
        S: Specification<PantryItem> + ?Sized,
    {
        let (filter, params) = spec.to_query_fragment().to_positional()?;
        let sql = format!(
            "{} WHERE {} {}",
            PantryItemRow::select_sql(),
            filter,
            ORDER_BY
        );
        let rows: Vec<PantryItemRow> = self.db.get_all(&sql, &params).await?;
        self.hydrate(rows).await
    }

    pub async fn find_all(&self) -> Result<Vec<PantryItem>> {
        self.find(&TrueSpecification::<PantryItem>::new()).await
    }

    pub async fn find_by_food_id(&self, food_id: &str) -> Result<Vec<PantryItem>> {
        self.find(&PantryItemByFoodIdSpecification::new(food_id))
            .await
    }

    /// Items with `days` or fewer whole days left.
    pub async fn find_expiring_soon(&self, days: i64) -> Result<Vec<PantryItem>> {
        self.find(&ExpiringSoonSpecification::new(days)).await
    }

    pub async fn find_expired(&self) -> Result<Vec<PantryItem>> {
        self.find(&ExpiredSpecification::new()).await
    }

    pub async fn update(&self, item: &PantryItem) -> Result<()> {
        let row = PantryItemMapper::to_persistence(item);
        let result = self
            .db
            .run(&PantryItemRow::update_sql(), &row.update_values())
            .await?;
        if result.rows_affected == 0 {
            return Err(PantryError::not_found("PantryItem", item.id()));
        }
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.db
            .run("DELETE FROM pantry_items WHERE id = ?", &[SqlValue::from(id)])
            .await?;
        Ok(())
    }

    /// Remove every item of one food; returns how many were removed.
    pub async fn delete_by_food_id(&self, food_id: &str) -> Result<u64> {
        let result = self
            .db
            .run(
                "DELETE FROM pantry_items WHERE food_id = ?",
                &[SqlValue::from(food_id)],
            )
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn count<S>(&self, spec: &S) -> Result<u64>
    where
        S: Specification<PantryItem> + ?Sized,
    {
        let (filter, params) = spec.to_query_fragment().to_positional()?;
        let sql = format!("SELECT COUNT(*) AS count FROM pantry_items WHERE {}", filter);
        let row: Option<CountRow> = self.db.get_one(&sql, &params).await?;
        Ok(row.map(|r| r.count as u64).unwrap_or(0))
    }

    pub async fn exists(&self, id: &str) -> Result<bool> {
        let row: Option<CountRow> = self
            .db
            .get_one(
                "SELECT COUNT(*) AS count FROM pantry_items WHERE id = ?",
                &[SqlValue::from(id)],
            )
            .await?;
        Ok(row.map(|r| r.count > 0).unwrap_or(false))
    }

    pub async fn find_with_pagination<S>(
        &self,
        spec: &S,
        skip: u64,
        take: u64,
    ) -> Result<Page<PantryItem>>
    where
        S: Specification<PantryItem> + ?Sized,
    {
        let total = self.count(spec).await?;
        let (filter, mut params) = spec.to_query_fragment().to_positional()?;
        let sql = format!(
            "{} WHERE {} {} LIMIT ? OFFSET ?",
            PantryItemRow::select_sql(),
            filter,
            ORDER_BY
        );
        params.push(SqlValue::Integer(clamp_i64(take)));
        params.push(SqlValue::Integer(clamp_i64(skip)));
        let rows: Vec<PantryItemRow> = self.db.get_all(&sql, &params).await?;
        let items = self.hydrate(rows).await?;
        Ok(Page { items, total })
    }

    /// Attach foods to rows with one lookup over the distinct food ids.
    /// Row order is kept; a row whose food is gone fails the whole read.
    async fn hydrate(&self, rows: Vec<PantryItemRow>) -> Result<Vec<PantryItem>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut seen: HashSet<&str> = HashSet::with_capacity(rows.len());
        let food_ids: Vec<String> = rows
            .iter()
            .filter(|row| seen.insert(row.food_id.as_str()))
            .map(|row| row.food_id.clone())
            .collect();

        let foods: HashMap<String, Arc<Food>> = self
            .foods
            .find_by_ids(&food_ids)
            .await?
            .into_iter()
            .map(|food| (food.id().to_string(), Arc::new(food)))
            .collect();

        rows.into_iter()
            .map(|row| {
                let food = foods.get(&row.food_id).cloned().ok_or_else(|| {
                    PantryError::ReferenceIntegrity(format!(
                        "pantry item {} references missing food {}",
                        row.id, row.food_id
                    ))
                })?;
                PantryItemMapper::to_domain(row, food)
            })
            .collect()
    }
}
