use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Sqlite};

pub const INGREDIENT_COLUMNS: &str = "id, name, measurement_unit";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
}

/// An ingredient as it appears inside a recipe, with the recipe's amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct IngredientAmount {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

/// Insert a catalog row unless the (name, unit) pair exists already.
/// Returns the new id, or `None` when the row was skipped.
pub async fn insert<'c, E>(executor: E, name: &str, unit: &str) -> Result<Option<i64>, sqlx::Error>
where
    E: sqlx::Executor<'c, Database = Sqlite>,
{
    sqlx::query_scalar(
        r#"
        INSERT INTO ingredients (name, measurement_unit, name_lower)
        VALUES (?, ?, ?)
        ON CONFLICT (name, measurement_unit) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(name)
    .bind(unit)
    .bind(name.to_lowercase())
    .fetch_optional(executor)
    .await
}

/// Lowercased LIKE pattern matching names that start with `input`, for use
/// against the `name_lower` column.
pub fn name_prefix_pattern(input: &str) -> String {
    like_prefix(&input.to_lowercase())
}

/// Escape `%`, `_` and `\` so user input can be used as a literal LIKE prefix.
pub fn like_prefix(input: &str) -> String {
    let mut pattern = String::with_capacity(input.len() + 1);
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
