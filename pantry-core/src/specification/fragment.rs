use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::db::SqlValue;
use crate::error::{PantryError, Result};

static NEXT_PARAM: AtomicU64 = AtomicU64::new(1);

/// A parameter name no other specification instance uses, e.g. `category_17`.
pub(crate) fn unique_param(prefix: &str) -> String {
    format!("{}_{}", prefix, NEXT_PARAM.fetch_add(1, Ordering::Relaxed))
}

/// A WHERE-clause fragment with `:name` placeholders and the values to bind.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryFragment {
    pub sql: String,
    pub params: BTreeMap<String, SqlValue>,
}

impl QueryFragment {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn and(self, other: QueryFragment) -> Self {
        Self::join(self, "AND", other)
    }

    pub fn or(self, other: QueryFragment) -> Self {
        Self::join(self, "OR", other)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self {
            sql: format!("NOT ({})", self.sql),
            params: self.params,
        }
    }

    fn join(left: QueryFragment, operator: &str, right: QueryFragment) -> Self {
        let mut params = left.params;
        params.extend(right.params);
        Self {
            sql: format!("({}) {} ({})", left.sql, operator, right.sql),
            params,
        }
    }

    /// Rewrite `:name` placeholders to `?` and collect the values in the
    /// order they appear. Quoted literals are left alone.
    pub fn to_positional(&self) -> Result<(String, Vec<SqlValue>)> {
        let mut sql = String::with_capacity(self.sql.len());
        let mut values = Vec::new();
        let mut chars = self.sql.chars().peekable();
        let mut in_quote = false;

        while let Some(c) = chars.next() {
            if c == '\'' {
                in_quote = !in_quote;
                sql.push(c);
                continue;
            }
            let starts_name = matches!(chars.peek(), Some(n) if n.is_ascii_alphabetic() || *n == '_');
            if c == ':' && !in_quote && starts_name {
                let mut name = String::new();
                while let Some(n) = chars.peek() {
                    if n.is_ascii_alphanumeric() || *n == '_' {
                        name.push(*n);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value = self.params.get(&name).ok_or_else(|| {
                    PantryError::validation(format!("no value bound for parameter :{}", name))
                })?;
                values.push(value.clone());
                sql.push('?');
                continue;
            }
            sql.push(c);
        }

        Ok((sql, values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_param_names_differ() {
        let a = unique_param("category");
        let b = unique_param("category");
        assert_ne!(a, b);
        assert!(a.starts_with("category_"));
    }

    #[test]
    fn test_composition_parenthesizes_operands() {
        let a = QueryFragment::new("a = :a").with_param("a", 1i64);
        let b = QueryFragment::new("b = :b").with_param("b", 2i64);
        let c = QueryFragment::new("c = :c").with_param("c", 3i64);

        let combined = a.and(b.or(c)).not();
        assert_eq!(combined.sql, "NOT ((a = :a) AND ((b = :b) OR (c = :c)))");
        assert_eq!(combined.params.len(), 3);
    }

    #[test]
    fn test_to_positional_orders_values_by_appearance() {
        let fragment = QueryFragment::new("b = :second AND a = :first OR c = :second")
            .with_param("first", "one")
            .with_param("second", "two");
        let (sql, values) = fragment.to_positional().unwrap();
        assert_eq!(sql, "b = ? AND a = ? OR c = ?");
        assert_eq!(
            values,
            vec![
                SqlValue::from("two"),
                SqlValue::from("one"),
                SqlValue::from("two")
            ]
        );
    }

    #[test]
    fn test_to_positional_skips_quoted_text() {
        let fragment =
            QueryFragment::new("name LIKE :term ESCAPE '\\' AND note = 'a:b'").with_param("term", "%x%");
        let (sql, values) = fragment.to_positional().unwrap();
        assert_eq!(sql, "name LIKE ? ESCAPE '\\' AND note = 'a:b'");
        assert_eq!(values.len(), 1);
    }

    #[test]
    fn test_to_positional_unbound_name_fails() {
        let fragment = QueryFragment::new("id = :missing");
        assert!(matches!(
            fragment.to_positional(),
            Err(PantryError::Validation(_))
        ));
    }
}
