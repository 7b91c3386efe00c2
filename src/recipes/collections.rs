//! Favorites and shopping cart share one implementation, parameterized by
//! the [`RecipeCollection`] they store into.

use std::collections::HashSet;

use sqlx::SqlitePool;

use crate::error::{is_unique_violation, AppError};
use crate::models::{CollectionEntry, Recipe};
use crate::views::RecipeSummary;

pub trait RecipeCollection {
    /// Table holding `(user_id, recipe_id, created_at)` rows.
    const TABLE: &'static str;
    const ALREADY_PRESENT: &'static str;
    const NOT_PRESENT: &'static str;
}

pub struct Favorites;

impl RecipeCollection for Favorites {
    const TABLE: &'static str = "favorites";
    const ALREADY_PRESENT: &'static str = "Recipe is already in favorites";
    const NOT_PRESENT: &'static str = "Recipe is not in your favorites";
}

pub struct ShoppingCart;

impl RecipeCollection for ShoppingCart {
    const TABLE: &'static str = "shopping_cart";
    const ALREADY_PRESENT: &'static str = "Recipe is already in the shopping cart";
    const NOT_PRESENT: &'static str = "Recipe is not in your shopping cart";
}

/// Insert `recipe` into the user's collection. The table's primary key is what
/// detects a duplicate, so two racing adds still yield exactly one row.
pub async fn add<C: RecipeCollection>(
    db: &SqlitePool,
    user_id: i64,
    recipe: &Recipe,
) -> Result<RecipeSummary, AppError> {
    let entry = CollectionEntry::new(user_id, recipe.id);
    let result = sqlx::query(&format!(
        "INSERT INTO {} (user_id, recipe_id, created_at) VALUES (?, ?, ?)",
        C::TABLE
    ))
    .bind(entry.user_id)
    .bind(entry.recipe_id)
    .bind(&entry.created_at)
    .execute(db)
    .await;

    match result {
        Ok(_) => {
            tracing::info!(collection = C::TABLE, user_id, recipe_id = recipe.id, "recipe added");
            Ok(RecipeSummary::from(recipe))
        }
        Err(e) if is_unique_violation(&e) => Err(AppError::Conflict(C::ALREADY_PRESENT.to_string())),
        Err(e) => Err(e.into()),
    }
}

pub async fn remove<C: RecipeCollection>(
    db: &SqlitePool,
    user_id: i64,
    recipe_id: i64,
) -> Result<(), AppError> {
    let result = sqlx::query(&format!(
        "DELETE FROM {} WHERE user_id = ? AND recipe_id = ?",
        C::TABLE
    ))
    .bind(user_id)
    .bind(recipe_id)
    .execute(db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotMember(C::NOT_PRESENT.to_string()));
    }

    tracing::info!(collection = C::TABLE, user_id, recipe_id, "recipe removed");
    Ok(())
}

pub async fn recipe_ids<C: RecipeCollection>(
    db: &SqlitePool,
    user_id: i64,
) -> Result<HashSet<i64>, sqlx::Error> {
    let ids: Vec<i64> = sqlx::query_scalar(&format!(
        "SELECT recipe_id FROM {} WHERE user_id = ?",
        C::TABLE
    ))
    .bind(user_id)
    .fetch_all(db)
    .await?;

    Ok(ids.into_iter().collect())
}
