use super::fragment::{unique_param, QueryFragment};
use super::Specification;
use crate::models::{Food, FoodCategory, FoodState, Macronutrients};

#[derive(Debug, Clone)]
pub struct FoodByIdSpecification {
    id: String,
    param: String,
}

impl FoodByIdSpecification {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            param: unique_param("food_id"),
        }
    }
}

impl Specification<Food> for FoodByIdSpecification {
    fn is_satisfied_by(&self, food: &Food) -> bool {
        food.id() == self.id
    }

    fn to_query_fragment(&self) -> QueryFragment {
        QueryFragment::new(format!("id = :{}", self.param))
            .with_param(self.param.clone(), self.id.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct FoodByCategorySpecification {
    category: FoodCategory,
    param: String,
}

impl FoodByCategorySpecification {
    pub fn new(category: FoodCategory) -> Self {
        Self {
            category,
            param: unique_param("category"),
        }
    }
}

impl Specification<Food> for FoodByCategorySpecification {
    fn is_satisfied_by(&self, food: &Food) -> bool {
        food.category() == self.category
    }

    fn to_query_fragment(&self) -> QueryFragment {
        QueryFragment::new(format!("category = :{}", self.param))
            .with_param(self.param.clone(), self.category.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct FoodByStateSpecification {
    state: FoodState,
    param: String,
}

impl FoodByStateSpecification {
    pub fn new(state: FoodState) -> Self {
        Self {
            state,
            param: unique_param("state"),
        }
    }
}

impl Specification<Food> for FoodByStateSpecification {
    fn is_satisfied_by(&self, food: &Food) -> bool {
        food.state() == self.state
    }

    fn to_query_fragment(&self) -> QueryFragment {
        QueryFragment::new(format!("state = :{}", self.param))
            .with_param(self.param.clone(), self.state.to_string())
    }
}

/// Case-insensitive (ASCII) substring match on the food name.
#[derive(Debug, Clone)]
pub struct FoodNameContainsSpecification {
    term: String,
    param: String,
}

impl FoodNameContainsSpecification {
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into().to_ascii_lowercase(),
            param: unique_param("name_term"),
        }
    }
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl Specification<Food> for FoodNameContainsSpecification {
    fn is_satisfied_by(&self, food: &Food) -> bool {
        food.name().to_ascii_lowercase().contains(&self.term)
    }

    fn to_query_fragment(&self) -> QueryFragment {
        QueryFragment::new(format!("LOWER(name) LIKE :{} ESCAPE '\\'", self.param))
            .with_param(self.param.clone(), format!("%{}%", escape_like(&self.term)))
    }
}

/// One of the four macronutrient columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacronutrientField {
    Calories,
    Protein,
    Carbohydrates,
    Fat,
}

impl MacronutrientField {
    pub fn column(&self) -> &'static str {
        match self {
            MacronutrientField::Calories => "calories",
            MacronutrientField::Protein => "protein",
            MacronutrientField::Carbohydrates => "carbohydrates",
            MacronutrientField::Fat => "fat",
        }
    }

    pub fn value_of(&self, macronutrients: &Macronutrients) -> f64 {
        match self {
            MacronutrientField::Calories => macronutrients.calories(),
            MacronutrientField::Protein => macronutrients.protein(),
            MacronutrientField::Carbohydrates => macronutrients.carbohydrates(),
            MacronutrientField::Fat => macronutrients.fat(),
        }
    }
}

/// Foods with at least `min` of a macronutrient per serving.
#[derive(Debug, Clone)]
pub struct MinMacronutrientSpecification {
    field: MacronutrientField,
    min: f64,
    param: String,
}

impl MinMacronutrientSpecification {
    pub fn new(field: MacronutrientField, min: f64) -> Self {
        Self {
            field,
            min,
            param: unique_param(&format!("min_{}", field.column())),
        }
    }
}

impl Specification<Food> for MinMacronutrientSpecification {
    fn is_satisfied_by(&self, food: &Food) -> bool {
        self.field.value_of(food.macronutrients()) >= self.min
    }

    fn to_query_fragment(&self) -> QueryFragment {
        QueryFragment::new(format!("{} >= :{}", self.field.column(), self.param))
            .with_param(self.param.clone(), self.min)
    }
}

/// Foods with at most `max` of a macronutrient per serving.
#[derive(Debug, Clone)]
pub struct MaxMacronutrientSpecification {
    field: MacronutrientField,
    max: f64,
    param: String,
}

impl MaxMacronutrientSpecification {
    pub fn new(field: MacronutrientField, max: f64) -> Self {
        Self {
            field,
            max,
            param: unique_param(&format!("max_{}", field.column())),
        }
    }
}

impl Specification<Food> for MaxMacronutrientSpecification {
    fn is_satisfied_by(&self, food: &Food) -> bool {
        self.field.value_of(food.macronutrients()) <= self.max
    }

    fn to_query_fragment(&self) -> QueryFragment {
        QueryFragment::new(format!("{} <= :{}", self.field.column(), self.param))
            .with_param(self.param.clone(), self.max)
    }
}

#[derive(Debug, Clone)]
pub struct FoodByBrandSpecification {
    brand: String,
    param: String,
}

impl FoodByBrandSpecification {
    pub fn new(brand: impl Into<String>) -> Self {
        Self {
            brand: brand.into(),
            param: unique_param("brand"),
        }
    }
}

impl Specification<Food> for FoodByBrandSpecification {
    fn is_satisfied_by(&self, food: &Food) -> bool {
        food.brand() == Some(self.brand.as_str())
    }

    fn to_query_fragment(&self) -> QueryFragment {
        QueryFragment::new(format!("brand IS NOT NULL AND brand = :{}", self.param))
            .with_param(self.param.clone(), self.brand.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct FoodByBarcodeSpecification {
    barcode: String,
    param: String,
}

impl FoodByBarcodeSpecification {
    pub fn new(barcode: impl Into<String>) -> Self {
        Self {
            barcode: barcode.into(),
            param: unique_param("barcode"),
        }
    }
}

impl Specification<Food> for FoodByBarcodeSpecification {
    fn is_satisfied_by(&self, food: &Food) -> bool {
        food.barcode() == Some(self.barcode.as_str())
    }

    fn to_query_fragment(&self) -> QueryFragment {
        QueryFragment::new(format!("barcode IS NOT NULL AND barcode = :{}", self.param))
            .with_param(self.param.clone(), self.barcode.as_str())
    }
}
