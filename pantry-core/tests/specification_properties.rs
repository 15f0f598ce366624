//! Property tests for specifications and mappers.
//!
//! The storage checks run every generated dataset through a fresh in-memory
//! database and compare what the SQL filter returns with what the in-memory
//! predicate accepts.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use pantry_core::models::{
    ExpirationDate, ExpirationType, Food, FoodCategory, FoodState, Macronutrients, NewFood,
    NewPantryItem, PantryItem, Quantity, Unit,
};
use pantry_core::specification::{
    EmptySpecification, ExpiredSpecification, ExpiringSoonSpecification, FoodByBarcodeSpecification,
    FoodByBrandSpecification, FoodByCategorySpecification, FoodNameContainsSpecification, LowQuantitySpecification,
    MacronutrientField, MaxMacronutrientSpecification, MinMacronutrientSpecification,
    NotExpiredSpecification, PantryItemByLocationSpecification, SafetyCriticalSpecification,
    Spec, Specification, SpecificationExt,
};
use pantry_core::{Database, FoodMapper, FoodRepository, PantryItemMapper, PantryItemRepository};
use proptest::prelude::*;

const BRANDS: [&str; 2] = ["Acme", "Fizz"];
const BARCODES: [&str; 2] = ["5449000000996", "4006381333931"];
const AMOUNTS: [f64; 6] = [0.0, 0.5, 1.0, 2.5, 5.0, 10.0];
const LOCATIONS: [Option<&str>; 4] = [Some("Fridge"), Some("fridge"), Some("Cupboard"), None];

fn reference() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

fn arb_category() -> impl Strategy<Value = FoodCategory> {
    prop::sample::select(FoodCategory::ALL.to_vec())
}

fn arb_macros() -> impl Strategy<Value = Macronutrients> {
    (0u32..900, 0u32..60, 0u32..90, 0u32..40).prop_map(|(c, p, carbs, f)| {
        Macronutrients::new(c as f64, p as f64, carbs as f64 / 2.0, f as f64 / 4.0).unwrap()
    })
}

fn arb_food() -> impl Strategy<Value = Food> {
    (
        "[A-Za-z][A-Za-z ]{0,20}",
        arb_macros(),
        arb_category(),
        prop_oneof![Just(FoodState::Solid), Just(FoodState::Liquid), Just(FoodState::Powder)],
        prop::option::of(prop::sample::select(BRANDS.to_vec())),
        prop::option::of(prop::sample::select(BARCODES.to_vec())),
    )
        .prop_map(|(name, macros, category, state, brand, barcode)| {
            let mut new = NewFood::new(name, macros, 100.0, Unit::Gram)
                .with_category(category)
                .with_state(state);
            if let Some(brand) = brand {
                new = new.with_brand(brand);
            }
            if let Some(barcode) = barcode {
                new = new.with_barcode(barcode);
            }
            Food::create(new).unwrap()
        })
}

#[derive(Debug, Clone)]
struct ItemSeed {
    amount: f64,
    offset_hours: i64,
    use_by: bool,
    location: Option<&'static str>,
}

fn arb_item_seed() -> impl Strategy<Value = ItemSeed> {
    (
        prop::sample::select(AMOUNTS.to_vec()),
        -96i64..=240,
        any::<bool>(),
        prop::sample::select(LOCATIONS.to_vec()),
    )
        .prop_map(|(amount, offset_hours, use_by, location)| ItemSeed {
            amount,
            offset_hours,
            use_by,
            location,
        })
}

fn build_item(food: &Arc<Food>, seed: &ItemSeed) -> PantryItem {
    let date = reference() + Duration::hours(seed.offset_hours);
    let expiration = if seed.use_by {
        ExpirationDate::new(date, ExpirationType::UseBy)
    } else {
        ExpirationDate::new(date, ExpirationType::BestBefore)
    };
    let mut new = NewPantryItem::new(
        food.clone(),
        Quantity::of(seed.amount, Unit::Gram).unwrap(),
        expiration,
    );
    if let Some(location) = seed.location {
        new = new.with_location(location);
    }
    PantryItem::create(new).unwrap()
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn ids<'a>(ids: impl Iterator<Item = &'a str>) -> BTreeSet<String> {
    ids.map(str::to_string).collect()
}

/// Store `items`, then check that every specification selects the same ids
/// from storage as it accepts in memory.
async fn assert_items_agree(
    items: &[PantryItem],
    specs: &[Spec<PantryItem>],
) -> Result<(), TestCaseError> {
    let db = Arc::new(Database::open_in_memory().await.unwrap());
    let foods = FoodRepository::new(db.clone());
    let repo = PantryItemRepository::new(db);

    let mut saved_foods = BTreeSet::new();
    for item in items {
        if saved_foods.insert(item.food_id().to_string()) {
            foods.save(item.food()).await.unwrap();
        }
        repo.save(item).await.unwrap();
    }

    for spec in specs {
        let expected = ids(items
            .iter()
            .filter(|i| spec.is_satisfied_by(i))
            .map(|i| i.id()));
        let stored = repo.find(spec).await.unwrap();
        let actual = ids(stored.iter().map(|i| i.id()));
        prop_assert_eq!(&actual, &expected, "spec {:?}", spec);
        prop_assert_eq!(repo.count(spec).await.unwrap(), expected.len() as u64);
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_food_round_trip(food in arb_food()) {
        let row = FoodMapper::to_persistence(&food);
        let rebuilt = FoodMapper::to_domain(row).unwrap();
        prop_assert_eq!(rebuilt, food);
    }

    #[test]
    fn prop_pantry_item_round_trip(food in arb_food(), seed in arb_item_seed()) {
        let food = Arc::new(food);
        let item = build_item(&food, &seed);
        let rebuilt = PantryItemMapper::to_domain(
            PantryItemMapper::to_persistence(&item),
            food,
        )
        .unwrap();
        prop_assert_eq!(rebuilt, item);
    }

    #[test]
    fn prop_composites_follow_boolean_logic(
        seed in arb_item_seed(),
        threshold in prop::sample::select(AMOUNTS.to_vec()),
        days in 0i64..8,
    ) {
        let food = Arc::new(Food::create(NewFood::new("Rice", Macronutrients::zero(), 100.0, Unit::Gram)).unwrap());
        let item = build_item(&food, &seed);

        let a = LowQuantitySpecification::new(threshold);
        let b = ExpiringSoonSpecification::at(days, reference());
        let c = SafetyCriticalSpecification::new();
        let (pa, pb, pc) = (a.is_satisfied_by(&item), b.is_satisfied_by(&item), c.is_satisfied_by(&item));

        prop_assert_eq!(a.and(&b).is_satisfied_by(&item), pa && pb);
        prop_assert_eq!(a.or(&b).is_satisfied_by(&item), pa || pb);
        prop_assert_eq!(a.not().is_satisfied_by(&item), !pa);
        prop_assert_eq!(
            a.and(&b.or(&c.not())).not().is_satisfied_by(&item),
            !(pa && (pb || !pc))
        );
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_pantry_specs_agree_with_storage(
        seeds in prop::collection::vec(arb_item_seed(), 1..12),
        threshold in prop::sample::select(AMOUNTS.to_vec()),
        days in 0i64..8,
    ) {
        let food = Arc::new(Food::create(NewFood::new("Rice", Macronutrients::zero(), 100.0, Unit::Gram)).unwrap());
        let items: Vec<PantryItem> = seeds.iter().map(|s| build_item(&food, s)).collect();

        let low = LowQuantitySpecification::new(threshold);
        let soon = ExpiringSoonSpecification::at(days, reference());
        let specs = vec![
            low.boxed(),
            soon.boxed(),
            ExpiredSpecification::at(reference()).boxed(),
            NotExpiredSpecification::at(reference()).boxed(),
            EmptySpecification::new().boxed(),
            SafetyCriticalSpecification::new().boxed(),
            PantryItemByLocationSpecification::new("FRIDGE").boxed(),
            PantryItemByLocationSpecification::new("FRIDGE").not(),
            ExpiringSoonSpecification::at(3_000_000, reference()).boxed(),
            low.and(&soon.not()),
            LowQuantitySpecification::new(threshold).and(&low.not()).or(&soon),
        ];

        runtime().block_on(assert_items_agree(&items, &specs))?;
    }

    #[test]
    fn prop_food_specs_agree_with_storage(
        foods in prop::collection::vec(arb_food(), 1..10),
        category in arb_category(),
        min_protein in 0u32..60,
        term in "[a-z]{1,2}",
        brand in prop::sample::select(BRANDS.to_vec()),
        barcode in prop::sample::select(BARCODES.to_vec()),
    ) {
        let spec_list: Vec<Spec<Food>> = vec![
            FoodByCategorySpecification::new(category).boxed(),
            MinMacronutrientSpecification::new(MacronutrientField::Protein, min_protein as f64).boxed(),
            MaxMacronutrientSpecification::new(MacronutrientField::Protein, min_protein as f64).boxed(),
            FoodNameContainsSpecification::new(term.clone()).boxed(),
            FoodByCategorySpecification::new(category)
                .or(&MinMacronutrientSpecification::new(MacronutrientField::Fat, 5.0)),
            FoodByBrandSpecification::new(brand).boxed(),
            FoodByBrandSpecification::new(brand).not(),
            FoodByBarcodeSpecification::new(barcode).not(),
            FoodByBrandSpecification::new(brand)
                .not()
                .and(&FoodByBarcodeSpecification::new(barcode).not()),
        ];

        runtime().block_on(async {
            let db = Arc::new(Database::open_in_memory().await.unwrap());
            let repo = FoodRepository::new(db);
            for food in &foods {
                repo.save(food).await.unwrap();
            }
            for spec in &spec_list {
                let expected = ids(foods.iter().filter(|f| spec.is_satisfied_by(f)).map(|f| f.id()));
                let stored = repo.find(spec).await.unwrap();
                let actual = ids(stored.iter().map(|f| f.id()));
                prop_assert_eq!(&actual, &expected, "spec {:?}", spec);
            }
            Ok(())
        })?;
    }
}
