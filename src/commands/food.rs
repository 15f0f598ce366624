use clap::{Args, Subcommand};
use pantry_core::models::{Food, FoodCategory, FoodState, Macronutrients, NewFood, Unit};
use pantry_core::specification::{
    FoodByCategorySpecification, FoodByStateSpecification, FoodNameContainsSpecification,
    MacronutrientField, MaxMacronutrientSpecification, MinMacronutrientSpecification, Spec,
    SpecificationExt, TrueSpecification,
};
use pantry_core::FoodRepository;
use uuid::Uuid;

use super::{confirm, truncate, OutputFormat};

#[derive(Args)]
pub struct FoodCommand {
    #[command(subcommand)]
    pub command: FoodSubcommand,
}

/// Nutrition facts given on the command line, per serving.
#[derive(Args, Default)]
pub struct NutritionArgs {
    /// Calories per serving
    #[arg(long)]
    pub calories: Option<f64>,

    /// Protein per serving, in grams
    #[arg(long)]
    pub protein: Option<f64>,

    /// Carbohydrates per serving, in grams
    #[arg(long)]
    pub carbs: Option<f64>,

    /// Fat per serving, in grams
    #[arg(long)]
    pub fat: Option<f64>,

    /// Serving size the nutrition values refer to (default: 100)
    #[arg(long)]
    pub serving_size: Option<f64>,

    /// Food category
    #[arg(long)]
    pub category: Option<FoodCategory>,
}

impl NutritionArgs {
    pub fn is_empty(&self) -> bool {
        self.calories.is_none()
            && self.protein.is_none()
            && self.carbs.is_none()
            && self.fat.is_none()
            && self.serving_size.is_none()
            && self.category.is_none()
    }

    /// A new food named `name` measured in `unit`. Missing values default to zero.
    pub fn to_new_food(&self, name: &str, unit: Unit) -> pantry_core::Result<NewFood> {
        let macronutrients = Macronutrients::new(
            self.calories.unwrap_or(0.0),
            self.protein.unwrap_or(0.0),
            self.carbs.unwrap_or(0.0),
            self.fat.unwrap_or(0.0),
        )?;
        let mut new = NewFood::new(
            name.trim(),
            macronutrients,
            self.serving_size.unwrap_or(100.0),
            unit,
        );
        if let Some(category) = self.category {
            new = new.with_category(category);
        }
        Ok(new)
    }
}

#[derive(Subcommand)]
pub enum FoodSubcommand {
    /// Add a new food
    Add {
        /// Name of the food
        name: String,

        #[command(flatten)]
        nutrition: NutritionArgs,

        /// Unit the serving size is measured in
        #[arg(long, default_value = "gram")]
        unit: Unit,

        /// Physical state (solid, liquid, powder)
        #[arg(long)]
        state: Option<FoodState>,

        /// Brand name
        #[arg(long)]
        brand: Option<String>,

        /// Barcode
        #[arg(long)]
        barcode: Option<String>,

        /// Free-form description
        #[arg(long)]
        description: Option<String>,
    },

    /// List foods
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Filter by category
        #[arg(long)]
        category: Option<FoodCategory>,

        /// Filter by physical state
        #[arg(long)]
        state: Option<FoodState>,

        /// Only foods with at least this much protein per serving
        #[arg(long)]
        min_protein: Option<f64>,

        /// Only foods with at most this many calories per serving
        #[arg(long)]
        max_calories: Option<f64>,

        /// Number of foods to skip
        #[arg(long, default_value_t = 0)]
        skip: u64,

        /// Maximum number of foods to show
        #[arg(long)]
        take: Option<u64>,
    },

    /// Show a food's details
    Show {
        /// Food ID (UUID) or name
        identifier: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Find foods whose name contains a term
    Search {
        /// Case-insensitive search term
        term: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Rename a food
    Rename {
        /// Food ID (UUID) or name
        identifier: String,

        /// New name
        name: String,
    },

    /// Delete a food and everything stocked of it
    Delete {
        /// Food ID (UUID) or name
        identifier: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

impl FoodCommand {
    pub async fn run(&self, repo: &FoodRepository) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            FoodSubcommand::Add {
                name,
                nutrition,
                unit,
                state,
                brand,
                barcode,
                description,
            } => {
                if name.trim().is_empty() {
                    return Err("Food name cannot be empty".into());
                }

                let mut new = nutrition.to_new_food(name, *unit)?;
                if let Some(state) = state {
                    new = new.with_state(*state);
                }
                if let Some(brand) = brand {
                    new = new.with_brand(brand);
                }
                if let Some(barcode) = barcode {
                    new = new.with_barcode(barcode);
                }
                if let Some(description) = description {
                    new = new.with_description(description);
                }

                let food = Food::create(new)?;
                repo.save(&food).await?;
                println!("Created food:");
                println!("{}", food);
                Ok(())
            }

            FoodSubcommand::List {
                format,
                category,
                state,
                min_protein,
                max_calories,
                skip,
                take,
            } => {
                let mut spec: Spec<Food> = TrueSpecification::<Food>::new().boxed();
                if let Some(category) = category {
                    spec = spec.and(&FoodByCategorySpecification::new(*category));
                }
                if let Some(state) = state {
                    spec = spec.and(&FoodByStateSpecification::new(*state));
                }
                if let Some(min) = min_protein {
                    spec = spec.and(&MinMacronutrientSpecification::new(
                        MacronutrientField::Protein,
                        *min,
                    ));
                }
                if let Some(max) = max_calories {
                    spec = spec.and(&MaxMacronutrientSpecification::new(
                        MacronutrientField::Calories,
                        *max,
                    ));
                }

                let (foods, total) = match take {
                    Some(take) => {
                        let page = repo.find_with_pagination(&spec, *skip, *take).await?;
                        (page.items, page.total)
                    }
                    None => {
                        let foods: Vec<Food> = repo
                            .find(&spec)
                            .await?
                            .into_iter()
                            .skip(usize::try_from(*skip).unwrap_or(usize::MAX))
                            .collect();
                        let total = repo.count(&spec).await?;
                        (foods, total)
                    }
                };

                print_foods(&foods, total, format)
            }

            FoodSubcommand::Show { identifier, format } => {
                let food = find_food(repo, identifier).await?;
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&food)?);
                    }
                    OutputFormat::Text => {
                        print!("{}", food);
                        println!(
                            "Created: {}  Updated: {}",
                            food.created_at().format("%Y-%m-%d %H:%M"),
                            food.updated_at().format("%Y-%m-%d %H:%M")
                        );
                    }
                }
                Ok(())
            }

            FoodSubcommand::Search { term, format } => {
                if term.trim().is_empty() {
                    return Err("Search term cannot be empty".into());
                }
                let spec = FoodNameContainsSpecification::new(term.trim());
                let foods = repo.find(&spec).await?;
                let total = foods.len() as u64;
                print_foods(&foods, total, format)
            }

            FoodSubcommand::Rename { identifier, name } => {
                let food = find_food(repo, identifier).await?;
                let renamed = food.update_name(name.trim())?;
                repo.update(&renamed).await?;
                println!("Renamed food: {} -> {}", food.name(), renamed.name());
                Ok(())
            }

            FoodSubcommand::Delete { identifier, force } => {
                let food = find_food(repo, identifier).await?;

                if !force {
                    let prompt = format!("Delete food '{}' and its pantry items?", food.name());
                    if !confirm(&prompt)? {
                        println!("Deletion cancelled.");
                        return Ok(());
                    }
                }

                repo.delete(food.id()).await?;
                println!("Deleted food: {}", food.name());
                Ok(())
            }
        }
    }
}

/// Look a food up by UUID, falling back to a case-insensitive exact name match.
pub async fn find_food(
    repo: &FoodRepository,
    identifier: &str,
) -> Result<Food, Box<dyn std::error::Error>> {
    if Uuid::parse_str(identifier).is_ok() {
        if let Some(food) = repo.find_by_id_or_null(identifier).await? {
            return Ok(food);
        }
    }

    let name = identifier.trim();
    let mut matches: Vec<Food> = repo
        .find(&FoodNameContainsSpecification::new(name))
        .await?
        .into_iter()
        .filter(|f| f.name().eq_ignore_ascii_case(name))
        .collect();

    match matches.len() {
        0 => Err(format!("Food not found: {}", identifier).into()),
        1 => Ok(matches.remove(0)),
        n => Err(format!(
            "{} foods are named '{}'; use the food ID instead",
            n, identifier
        )
        .into()),
    }
}

fn print_foods(
    foods: &[Food],
    total: u64,
    format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    if foods.is_empty() {
        println!("No foods found");
        return Ok(());
    }

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(foods)?);
        }
        OutputFormat::Text => {
            println!(
                "{:<36}  {:<30}  {:<10}  {:>8}  SERVING",
                "ID", "NAME", "CATEGORY", "KCAL"
            );
            println!("{}", "-".repeat(100));
            for food in foods {
                println!(
                    "{:<36}  {:<30}  {:<10}  {:>8}  {} {}",
                    food.id(),
                    truncate(food.name(), 30),
                    food.category().to_string(),
                    food.macronutrients().calories(),
                    food.serving_size(),
                    food.default_unit().symbol()
                );
            }
            if total > foods.len() as u64 {
                println!("\nShowing {} of {} food(s)", foods.len(), total);
            } else {
                println!("\nTotal: {} food(s)", foods.len());
            }
        }
    }
    Ok(())
}
