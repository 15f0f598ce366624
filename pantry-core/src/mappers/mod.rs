//! Entity ⇄ row translation.
//!
//! Row structs list their columns once in `COLUMNS`; `values()` returns a
//! fixed-size array of the same length in the same order, so the column
//! list, the placeholders and the bound values cannot drift apart.

mod food_mapper;
mod pantry_item_mapper;

pub use food_mapper::{FoodMapper, FoodRow};
pub use pantry_item_mapper::{PantryItemMapper, PantryItemRow};

use std::str::FromStr;

use crate::error::{PantryError, Result};

pub(crate) fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

fn insert_sql(table: &str, columns: &[&str]) -> String {
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        columns.join(", "),
        placeholders(columns.len())
    )
}

/// `UPDATE` of every column but the leading `id`, keyed by `id`.
fn update_sql(table: &str, columns: &[&str]) -> String {
    let assignments: Vec<String> = columns[1..]
        .iter()
        .map(|column| format!("{} = ?", column))
        .collect();
    format!(
        "UPDATE {} SET {} WHERE id = ?",
        table,
        assignments.join(", ")
    )
}

fn select_sql(table: &str, columns: &[&str]) -> String {
    format!("SELECT {} FROM {}", columns.join(", "), table)
}

fn parse_column<T>(column: &str, value: &str) -> Result<T>
where
    T: FromStr<Err = String>,
{
    value
        .parse()
        .map_err(|e: String| PantryError::validation(format!("column {}: {}", column, e)))
}
