mod expiration_date;
mod food;
mod macronutrients;
mod pantry_item;
mod quantity;

pub use expiration_date::{ExpirationDate, ExpirationType};
pub use food::{Food, FoodCategory, FoodProps, FoodState, NewFood, MAX_NAME_LENGTH};
pub use macronutrients::Macronutrients;
pub use pantry_item::{NewPantryItem, PantryItem, PantryItemProps};
pub use quantity::{Quantity, QuantityType, Unit};
