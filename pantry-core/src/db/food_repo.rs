use std::sync::Arc;

use super::{CountRow, Database, Page, SqlValue};
use crate::error::{PantryError, Result};
use crate::mappers::{placeholders, FoodMapper, FoodRow};
use crate::models::Food;
use crate::specification::{Specification, TrueSpecification};

const ORDER_BY: &str = "ORDER BY name, id";

/// Upper bound on ids bound into one `IN (...)` list.
const ID_BATCH: usize = 500;

#[derive(Clone)]
pub struct FoodRepository {
    db: Arc<Database>,
}

impl FoodRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn save(&self, food: &Food) -> Result<()> {
        let row = FoodMapper::to_persistence(food);
        self.db.run(&FoodRow::insert_sql(), &row.values()).await?;
        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Food> {
        self.find_by_id_or_null(id)
            .await?
            .ok_or_else(|| PantryError::not_found("Food", id))
    }

    pub async fn find_by_id_or_null(&self, id: &str) -> Result<Option<Food>> {
        let sql = format!("{} WHERE id = ?", FoodRow::select_sql());
        let row: Option<FoodRow> = self.db.get_one(&sql, &[SqlValue::from(id)]).await?;
        row.map(FoodMapper::to_domain).transpose()
    }

    /// Foods matching `spec`, ordered by name.
    pub async fn find<S>(&self, spec: &S) -> Result<Vec<Food>>
    where
        S: Specification<Food> + ?Sized,
    {
        let (filter, params) = spec.to_query_fragment().to_positional()?;
        let sql = format!("{} WHERE {} {}", FoodRow::select_sql(), filter, ORDER_BY);
        let rows: Vec<FoodRow> = self.db.get_all(&sql, &params).await?;
        rows.into_iter().map(FoodMapper::to_domain).collect()
    }

    pub async fn find_all(&self) -> Result<Vec<Food>> {
        self.find(&TrueSpecification::<Food>::new()).await
    }

    /// Every food whose id is in `ids`. Unknown ids are skipped.
    pub async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<Food>> {
        let mut foods = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(ID_BATCH) {
            let sql = format!(
                "{} WHERE id IN ({}) {}",
                FoodRow::select_sql(),
                placeholders(chunk.len()),
                ORDER_BY
            );
            let params: Vec<SqlValue> = chunk.iter().map(|id| id.as_str().into()).collect();
            let rows: Vec<FoodRow> = self.db.get_all(&sql, &params).await?;
            for row in rows {
                foods.push(FoodMapper::to_domain(row)?);
            }
        }
        Ok(foods)
    }

    /// Replace the stored row of `food`. Fails with `NotFound` when no row has its id.
    pub async fn update(&self, food: &Food) -> Result<()> {
        let row = FoodMapper::to_persistence(food);
        let result = self
            .db
            .run(&FoodRow::update_sql(), &row.update_values())
            .await?;
        if result.rows_affected == 0 {
            return Err(PantryError::not_found("Food", food.id()));
        }
        Ok(())
    }

    /// Delete a food and the pantry items that reference it. Absent ids are ignored.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let params = [SqlValue::from(id)];
        let items = self
            .db
            .run("DELETE FROM pantry_items WHERE food_id = ?", &params)
            .await?;
        let foods = self.db.run("DELETE FROM foods WHERE id = ?", &params).await?;
        tracing::debug!(
            food_id = id,
            deleted = foods.rows_affected,
            pantry_items = items.rows_affected,
            "deleted food"
        );
        Ok(())
    }

    pub async fn count<S>(&self, spec: &S) -> Result<u64>
    where
        S: Specification<Food> + ?Sized,
    {
        let (filter, params) = spec.to_query_fragment().to_positional()?;
        let sql = format!("SELECT COUNT(*) AS count FROM foods WHERE {}", filter);
        let row: Option<CountRow> = self.db.get_one(&sql, &params).await?;
        Ok(row.map(|r| r.count as u64).unwrap_or(0))
    }

    pub async fn exists(&self, id: &str) -> Result<bool> {
        let row: Option<CountRow> = self
            .db
            .get_one(
                "SELECT COUNT(*) AS count FROM foods WHERE id = ?",
                &[SqlValue::from(id)],
            )
            .await?;
        Ok(row.map(|r| r.count > 0).unwrap_or(false))
    }

    /// `take` foods matching `spec` after skipping `skip`, plus the unpaged total.
    pub async fn find_with_pagination<S>(
        &self,
        spec: &S,
        skip: u64,
        take: u64,
    ) -> Result<Page<Food>>
    where
        S: Specification<Food> + ?Sized,
    {
        let total = self.count(spec).await?;
        let (filter, mut params) = spec.to_query_fragment().to_positional()?;
        let sql = format!(
            "{} WHERE {} {} LIMIT ? OFFSET ?",
            FoodRow::select_sql(),
            filter,
            ORDER_BY
        );
        params.push(SqlValue::Integer(clamp_i64(take)));
        params.push(SqlValue::Integer(clamp_i64(skip)));
        let rows: Vec<FoodRow> = self.db.get_all(&sql, &params).await?;
        let items = rows
            .into_iter()
            .map(FoodMapper::to_domain)
            .collect::<Result<Vec<_>>>()?;
        Ok(Page { items, total })
    }
}

pub(crate) fn clamp_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FoodCategory, Macronutrients, NewFood, Unit};
    use crate::specification::{
        FoodByCategorySpecification, FoodNameContainsSpecification, MacronutrientField,
        MinMacronutrientSpecification, SpecificationExt,
    };
    use tempfile::TempDir;

    struct TestContext {
        repo: FoodRepository,
        db: Arc<Database>,
        _temp_dir: TempDir,
    }

    async fn setup_repo() -> TestContext {
        let temp_dir = TempDir::new().unwrap();
        let db = Arc::new(Database::open(temp_dir.path().join("test.db")).await.unwrap());
        TestContext {
            repo: FoodRepository::new(db.clone()),
            db,
            _temp_dir: temp_dir,
        }
    }

    fn food(name: &str, category: FoodCategory, protein: f64) -> Food {
        Food::create(
            NewFood::new(
                name,
                Macronutrients::new(100.0, protein, 5.0, 2.0).unwrap(),
                100.0,
                Unit::Gram,
            )
            .with_category(category),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_save_and_find_by_id() {
        let ctx = setup_repo().await;
        let oats = food("Oats", FoodCategory::Grain, 13.0);
        ctx.repo.save(&oats).await.unwrap();

        let fetched = ctx.repo.find_by_id(oats.id()).await.unwrap();
        assert_eq!(fetched, oats);
    }

    #[tokio::test]
    async fn test_find_by_id_missing() {
        let ctx = setup_repo().await;
        let err = ctx.repo.find_by_id("missing").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(ctx.repo.find_by_id_or_null("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_duplicate_id_is_storage_error() {
        let ctx = setup_repo().await;
        let oats = food("Oats", FoodCategory::Grain, 13.0);
        ctx.repo.save(&oats).await.unwrap();
        assert!(matches!(
            ctx.repo.save(&oats).await,
            Err(PantryError::Storage(_))
        ));
    }

    #[tokio::test]
    async fn test_find_by_specification_sorted_by_name() {
        let ctx = setup_repo().await;
        for f in [
            food("Tofu", FoodCategory::Protein, 8.0),
            food("Chicken", FoodCategory::Protein, 31.0),
            food("Apple", FoodCategory::Fruit, 0.3),
            food("Beef", FoodCategory::Protein, 26.0),
        ] {
            ctx.repo.save(&f).await.unwrap();
        }

        let proteins = ctx
            .repo
            .find(&FoodByCategorySpecification::new(FoodCategory::Protein))
            .await
            .unwrap();
        let names: Vec<&str> = proteins.iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["Beef", "Chicken", "Tofu"]);

        let lean = FoodByCategorySpecification::new(FoodCategory::Protein)
            .and(&MinMacronutrientSpecification::new(MacronutrientField::Protein, 20.0));
        let found = ctx.repo.find(&lean).await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(ctx.repo.count(&lean).await.unwrap(), 2);

        let all = ctx.repo.find_all().await.unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(all[0].name(), "Apple");
    }

    #[tokio::test]
    async fn test_name_search_ignores_case_and_wildcards() {
        let ctx = setup_repo().await;
        ctx.repo
            .save(&food("Peanut Butter", FoodCategory::Fat, 25.0))
            .await
            .unwrap();
        ctx.repo
            .save(&food("100% Juice", FoodCategory::Beverage, 0.0))
            .await
            .unwrap();

        let found = ctx
            .repo
            .find(&FoodNameContainsSpecification::new("BUTTER"))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);

        let found = ctx
            .repo
            .find(&FoodNameContainsSpecification::new("0%"))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name(), "100% Juice");
    }

    #[tokio::test]
    async fn test_update() {
        let ctx = setup_repo().await;
        let oats = food("Oats", FoodCategory::Grain, 13.0);
        ctx.repo.save(&oats).await.unwrap();

        let renamed = oats.update_name("Rolled Oats").unwrap();
        ctx.repo.update(&renamed).await.unwrap();

        let fetched = ctx.repo.find_by_id(oats.id()).await.unwrap();
        assert_eq!(fetched.name(), "Rolled Oats");
        assert_eq!(fetched.updated_at(), renamed.updated_at());
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let ctx = setup_repo().await;
        let never_saved = food("Ghost", FoodCategory::Other, 0.0);
        let err = ctx.repo.update(&never_saved).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let ctx = setup_repo().await;
        let oats = food("Oats", FoodCategory::Grain, 13.0);
        ctx.repo.save(&oats).await.unwrap();
        assert!(ctx.repo.exists(oats.id()).await.unwrap());

        ctx.repo.delete(oats.id()).await.unwrap();
        assert!(!ctx.repo.exists(oats.id()).await.unwrap());
        ctx.repo.delete(oats.id()).await.unwrap();
    }

    #[tokio::test]
    async fn test_pagination() {
        let ctx = setup_repo().await;
        for name in ["A", "B", "C", "D", "E"] {
            ctx.repo
                .save(&food(name, FoodCategory::Snack, 1.0))
                .await
                .unwrap();
        }
        ctx.repo
            .save(&food("Z", FoodCategory::Fruit, 1.0))
            .await
            .unwrap();

        let spec = FoodByCategorySpecification::new(FoodCategory::Snack);
        let first = ctx.repo.find_with_pagination(&spec, 0, 2).await.unwrap();
        let second = ctx.repo.find_with_pagination(&spec, 2, 2).await.unwrap();

        assert_eq!(second.items.len(), 2);
        assert_eq!(second.total, 5);
        let names: Vec<&str> = second.items.iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["C", "D"]);
        assert_ne!(first.items, second.items);

        let tail = ctx.repo.find_with_pagination(&spec, 4, 10).await.unwrap();
        assert_eq!(tail.items.len(), 1);
    }

    #[tokio::test]
    async fn test_find_by_ids() {
        let ctx = setup_repo().await;
        let a = food("A", FoodCategory::Other, 1.0);
        let b = food("B", FoodCategory::Other, 1.0);
        ctx.repo.save(&a).await.unwrap();
        ctx.repo.save(&b).await.unwrap();

        let ids = vec![b.id().to_string(), "unknown".to_string(), a.id().to_string()];
        let found = ctx.repo.find_by_ids(&ids).await.unwrap();
        assert_eq!(found.len(), 2);
        assert!(ctx.repo.find_by_ids(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_row_surfaces_validation_error() {
        let ctx = setup_repo().await;
        let oats = food("Oats", FoodCategory::Grain, 13.0);
        ctx.repo.save(&oats).await.unwrap();
        ctx.db
            .run(
                "UPDATE foods SET default_unit = 'FURLONG' WHERE id = ?",
                &[SqlValue::from(oats.id())],
            )
            .await
            .unwrap();

        assert!(matches!(
            ctx.repo.find_by_id(oats.id()).await,
            Err(PantryError::Validation(_))
        ));
    }
}
