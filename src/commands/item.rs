use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use clap::{Args, Subcommand};
use pantry_core::models::{ExpirationDate, Food, NewPantryItem, PantryItem, Quantity, Unit};
use pantry_core::specification::{
    FoodNameContainsSpecification, LowQuantitySpecification, PantryItemByFoodIdSpecification,
    PantryItemByLocationSpecification, Spec, SpecificationExt, TrueSpecification,
};
use pantry_core::{time, PantryItemRepository, UnitOfWork};
use std::sync::Arc;

use super::food::{find_food, NutritionArgs};
use super::{confirm, truncate, OutputFormat};
use crate::config::Config;

#[derive(Args)]
pub struct ItemCommand {
    #[command(subcommand)]
    pub command: ItemSubcommand,
}

#[derive(Subcommand)]
pub enum ItemSubcommand {
    /// Stock a food in the pantry
    Add {
        /// Food ID (UUID) or name
        food: String,

        /// Amount to stock
        amount: f64,

        /// Unit of the amount (default: the food's default unit)
        #[arg(long)]
        unit: Option<Unit>,

        /// Expiration date (YYYY-MM-DD)
        #[arg(long)]
        expires: NaiveDate,

        /// The date is a use-by date rather than best-before
        #[arg(long)]
        use_by: bool,

        /// Where the item is kept
        #[arg(long)]
        location: Option<String>,

        /// Notes
        #[arg(long)]
        notes: Option<String>,

        /// Purchase date (YYYY-MM-DD)
        #[arg(long)]
        purchased: Option<NaiveDate>,

        /// Create the food too, from the nutrition options
        #[arg(long)]
        new_food: bool,

        #[command(flatten)]
        nutrition: NutritionArgs,
    },

    /// List pantry items
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Only items kept at this location
        #[arg(long)]
        location: Option<String>,

        /// Only items of this food (ID or name)
        #[arg(long)]
        food: Option<String>,

        /// Number of items to skip
        #[arg(long, default_value_t = 0)]
        skip: u64,

        /// Maximum number of items to show
        #[arg(long)]
        take: Option<u64>,
    },

    /// Use up part of an item
    Consume {
        /// Pantry item ID
        id: String,

        /// Amount consumed, in the item's unit
        amount: f64,
    },

    /// Add more of an item
    Restock {
        /// Pantry item ID
        id: String,

        /// Amount added, in the item's unit
        amount: f64,

        /// New expiration date (YYYY-MM-DD)
        #[arg(long)]
        expires: Option<NaiveDate>,

        /// The new date is a use-by date rather than best-before
        #[arg(long, requires = "expires")]
        use_by: bool,
    },

    /// Items expiring within a number of days
    Expiring {
        /// Window in days (default: expiring_soon_days from config)
        #[arg(long)]
        days: Option<i64>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Items past their expiration date
    Expired {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Items running low
    Low {
        /// Amount at or below which an item counts as low (default: low_stock_threshold from config)
        #[arg(long)]
        threshold: Option<f64>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Remove an item from the pantry
    Remove {
        /// Pantry item ID
        id: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

impl ItemCommand {
    pub async fn run(
        &self,
        uow: &UnitOfWork,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let repo = uow.pantry_items();

        match &self.command {
            ItemSubcommand::Add {
                food,
                amount,
                unit,
                expires,
                use_by,
                location,
                notes,
                purchased,
                new_food,
                nutrition,
            } => {
                let stock = Stock {
                    amount: *amount,
                    unit: *unit,
                    expiration: expiration(*expires, *use_by),
                    location: location.clone(),
                    notes: notes.clone(),
                    purchased_at: purchased.map(start_of_day),
                };

                let item = if *new_food {
                    add_with_new_food(uow, food, nutrition, stock).await?
                } else {
                    if !nutrition.is_empty() {
                        return Err("Nutrition options can only be used with --new-food".into());
                    }
                    let food = Arc::new(find_food(uow.foods(), food).await?);
                    let item = stock.into_item(food)?;
                    repo.save(&item).await?;
                    item
                };

                println!("Added to pantry:");
                println!("  {}", item);
                println!("  ID: {}", item.id());
                Ok(())
            }

            ItemSubcommand::List {
                format,
                location,
                food,
                skip,
                take,
            } => {
                let mut spec: Spec<PantryItem> = TrueSpecification::<PantryItem>::new().boxed();
                if let Some(location) = location {
                    spec = spec.and(&PantryItemByLocationSpecification::new(location));
                }
                if let Some(food) = food {
                    let food = find_food(uow.foods(), food).await?;
                    spec = spec.and(&PantryItemByFoodIdSpecification::new(food.id()));
                }

                let page = repo
                    .find_with_pagination(&spec, *skip, take.unwrap_or(u64::MAX))
                    .await?;
                print_items(&page.items, page.total, format)
            }

            ItemSubcommand::Consume { id, amount } => {
                let item = repo.find_by_id(id).await?;
                let updated = item.consume(*amount)?;
                repo.update(&updated).await?;

                println!(
                    "Consumed {} {} of {}; {} left",
                    amount,
                    updated.quantity().unit().symbol(),
                    updated.food().name(),
                    updated.quantity()
                );
                if updated.is_empty() {
                    println!("Item is now empty. Remove it with 'pantry item remove {}'", id);
                }
                Ok(())
            }

            ItemSubcommand::Restock {
                id,
                amount,
                expires,
                use_by,
            } => {
                let item = repo.find_by_id(id).await?;
                let mut updated = item.add_quantity(*amount)?;
                if let Some(expires) = expires {
                    updated = updated.update_expiration(expiration(*expires, *use_by))?;
                }
                repo.update(&updated).await?;

                println!("Restocked {}; now {}", updated.food().name(), updated.quantity());
                Ok(())
            }

            ItemSubcommand::Expiring { days, format } => {
                let days = days.unwrap_or(config.expiring_soon_days.value);
                if days < 0 {
                    return Err("Days cannot be negative".into());
                }
                let items = repo.find_expiring_soon(days).await?;
                print_items(&items, items.len() as u64, format)
            }

            ItemSubcommand::Expired { format } => {
                let items = repo.find_expired().await?;
                print_items(&items, items.len() as u64, format)
            }

            ItemSubcommand::Low { threshold, format } => {
                let threshold = threshold.unwrap_or(config.low_stock_threshold.value);
                if !threshold.is_finite() || threshold < 0.0 {
                    return Err("Threshold must be a non-negative number".into());
                }
                let items = repo.find(&LowQuantitySpecification::new(threshold)).await?;
                print_items(&items, items.len() as u64, format)
            }

            ItemSubcommand::Remove { id, force } => remove(repo, id, *force).await,
        }
    }
}

/// Everything needed to stock a food except the food itself.
struct Stock {
    amount: f64,
    unit: Option<Unit>,
    expiration: ExpirationDate,
    location: Option<String>,
    notes: Option<String>,
    purchased_at: Option<DateTime<Utc>>,
}

impl Stock {
    fn unit_for(&self, food: &Food) -> Unit {
        self.unit.unwrap_or_else(|| food.default_unit())
    }

    fn into_item(self, food: Arc<Food>) -> pantry_core::Result<PantryItem> {
        let quantity = Quantity::of(self.amount, self.unit_for(&food))?;
        let mut new = NewPantryItem::new(food, quantity, self.expiration);
        if let Some(location) = self.location {
            new = new.with_location(location);
        }
        if let Some(notes) = self.notes {
            new = new.with_notes(notes);
        }
        if let Some(purchased_at) = self.purchased_at {
            new = new.with_purchased_at(purchased_at);
        }
        PantryItem::create(new)
    }
}

/// Create a food and its first pantry item in one transaction.
async fn add_with_new_food(
    uow: &UnitOfWork,
    name: &str,
    nutrition: &NutritionArgs,
    stock: Stock,
) -> Result<PantryItem, Box<dyn std::error::Error>> {
    let name = name.trim();
    let existing = uow
        .foods()
        .find(&FoodNameContainsSpecification::new(name))
        .await?;
    if existing.iter().any(|f| f.name().eq_ignore_ascii_case(name)) {
        return Err(format!("A food named '{}' already exists; drop --new-food", name).into());
    }

    let unit = stock.unit.unwrap_or(Unit::Gram);
    let food = Arc::new(Food::create(nutrition.to_new_food(name, unit)?)?);
    let item = stock.into_item(food.clone())?;

    let item = uow
        .execute(move |uow| {
            Box::pin(async move {
                uow.foods().save(&food).await?;
                uow.pantry_items().save(&item).await?;
                Ok(item)
            })
        })
        .await?;
    Ok(item)
}

async fn remove(
    repo: &PantryItemRepository,
    id: &str,
    force: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let item = repo.find_by_id(id).await?;

    if !force && !confirm(&format!("Remove '{}'?", item))? {
        println!("Removal cancelled.");
        return Ok(());
    }

    repo.delete(item.id()).await?;
    println!("Removed: {}", item);
    Ok(())
}

fn expiration(date: NaiveDate, use_by: bool) -> ExpirationDate {
    let last_moment = match date.succ_opt() {
        Some(next) => start_of_day(next) - Duration::milliseconds(1),
        None => time::add_days(start_of_day(date), 1),
    };
    if use_by {
        ExpirationDate::use_by(last_moment)
    } else {
        ExpirationDate::best_before(last_moment)
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

fn expiry_label(item: &PantryItem) -> String {
    let date = item.expiration().date().format("%Y-%m-%d");
    if item.is_expired() {
        format!("{} (expired)", date)
    } else {
        format!("{} ({}d)", date, item.days_until_expiration())
    }
}

fn print_items(
    items: &[PantryItem],
    total: u64,
    format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    if items.is_empty() {
        println!("No pantry items found");
        return Ok(());
    }

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(items)?);
        }
        OutputFormat::Text => {
            println!(
                "{:<36}  {:<24}  {:>12}  {:<18}  {:>8}  LOCATION",
                "ID", "FOOD", "QUANTITY", "EXPIRES", "KCAL"
            );
            println!("{}", "-".repeat(120));
            for item in items {
                let kcal = item
                    .macronutrients()
                    .map(|m| m.calories().to_string())
                    .unwrap_or_else(|_| "-".to_string());
                let safety = if item.is_safety_critical() { "!" } else { "" };
                println!(
                    "{:<36}  {:<24}  {:>12}  {:<18}  {:>8}  {}",
                    item.id(),
                    truncate(item.food().name(), 24),
                    item.quantity().to_string(),
                    format!("{}{}", expiry_label(item), safety),
                    kcal,
                    item.location().unwrap_or("")
                );
            }
            if total > items.len() as u64 {
                println!("\nShowing {} of {} item(s)", items.len(), total);
            } else {
                println!("\nTotal: {} item(s)", items.len());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pantry_core::models::{ExpirationType, Macronutrients, NewFood};
    use pantry_core::Database;
    use tempfile::TempDir;

    struct TestContext {
        uow: UnitOfWork,
        config: Config,
        _temp_dir: TempDir,
    }

    async fn setup() -> TestContext {
        let temp_dir = TempDir::new().unwrap();
        let db = Arc::new(Database::open(temp_dir.path().join("pantry.db")).await.unwrap());
        let config = Config::load(Some(temp_dir.path().join("missing.yaml"))).unwrap();
        TestContext {
            uow: UnitOfWork::new(db),
            config,
            _temp_dir: temp_dir,
        }
    }

    fn add(food: &str, amount: f64, new_food: bool, nutrition: NutritionArgs) -> ItemCommand {
        ItemCommand {
            command: ItemSubcommand::Add {
                food: food.to_string(),
                amount,
                unit: None,
                expires: (Utc::now() + Duration::days(10)).date_naive(),
                use_by: false,
                location: Some("Cupboard".to_string()),
                notes: None,
                purchased: None,
                new_food,
                nutrition,
            },
        }
    }

    #[test]
    fn test_expiration_covers_whole_day() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let exp = expiration(date, true);
        assert_eq!(exp.expiration_type(), ExpirationType::UseBy);
        assert_eq!(exp.date().date_naive(), date);
        assert_eq!(
            exp.date(),
            Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap() - Duration::milliseconds(1)
        );
    }

    #[test]
    fn test_expiration_far_future_is_storable() {
        let exp = expiration(NaiveDate::MAX, false);
        assert_eq!(time::to_storage(&exp.date()), "9999-12-31T23:59:59.999Z");
    }

    #[tokio::test]
    async fn test_expiring_accepts_any_window() {
        let ctx = setup().await;
        add("Oats", 500.0, true, NutritionArgs::default())
            .run(&ctx.uow, &ctx.config)
            .await
            .unwrap();

        ItemCommand {
            command: ItemSubcommand::Expiring {
                days: Some(i64::MAX),
                format: OutputFormat::Json,
            },
        }
        .run(&ctx.uow, &ctx.config)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_add_with_new_food_creates_both() {
        let ctx = setup().await;
        let nutrition = NutritionArgs {
            calories: Some(364.0),
            ..Default::default()
        };

        add("Flour", 1000.0, true, nutrition)
            .run(&ctx.uow, &ctx.config)
            .await
            .unwrap();

        let foods = ctx.uow.foods().find_all().await.unwrap();
        assert_eq!(foods.len(), 1);
        let items = ctx.uow.pantry_items().find_by_food_id(foods[0].id()).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity().amount(), 1000.0);
        assert_eq!(items[0].location(), Some("Cupboard"));
    }

    #[tokio::test]
    async fn test_add_new_food_rejects_existing_name() {
        let ctx = setup().await;
        let rice = Food::create(NewFood::new("Rice", Macronutrients::zero(), 100.0, Unit::Gram))
            .unwrap();
        ctx.uow.foods().save(&rice).await.unwrap();

        let err = add("rice", 500.0, true, NutritionArgs::default())
            .run(&ctx.uow, &ctx.config)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(ctx.uow.foods().find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_existing_food_uses_default_unit() {
        let ctx = setup().await;
        let milk = Food::create(NewFood::new(
            "Milk",
            Macronutrients::zero(),
            250.0,
            Unit::Milliliter,
        ))
        .unwrap();
        ctx.uow.foods().save(&milk).await.unwrap();

        add("milk", 750.0, false, NutritionArgs::default())
            .run(&ctx.uow, &ctx.config)
            .await
            .unwrap();

        let items = ctx.uow.pantry_items().find_all().await.unwrap();
        assert_eq!(items[0].quantity().unit(), Unit::Milliliter);
    }

    #[tokio::test]
    async fn test_add_missing_food_without_new_food_fails() {
        let ctx = setup().await;
        let err = add("Quinoa", 200.0, false, NutritionArgs::default())
            .run(&ctx.uow, &ctx.config)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Food not found: Quinoa");
        assert!(ctx.uow.pantry_items().find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_consume_and_restock() {
        let ctx = setup().await;
        add("Oats", 500.0, true, NutritionArgs::default())
            .run(&ctx.uow, &ctx.config)
            .await
            .unwrap();
        let id = ctx.uow.pantry_items().find_all().await.unwrap()[0]
            .id()
            .to_string();

        ItemCommand {
            command: ItemSubcommand::Consume {
                id: id.clone(),
                amount: 200.0,
            },
        }
        .run(&ctx.uow, &ctx.config)
        .await
        .unwrap();

        let too_much = ItemCommand {
            command: ItemSubcommand::Consume {
                id: id.clone(),
                amount: 1000.0,
            },
        }
        .run(&ctx.uow, &ctx.config)
        .await;
        assert!(too_much.is_err());

        ItemCommand {
            command: ItemSubcommand::Restock {
                id: id.clone(),
                amount: 50.0,
                expires: None,
                use_by: false,
            },
        }
        .run(&ctx.uow, &ctx.config)
        .await
        .unwrap();

        let item = ctx.uow.pantry_items().find_by_id(&id).await.unwrap();
        assert_eq!(item.quantity().amount(), 350.0);
    }
}
