pub mod builder;
pub mod collections;
pub mod filter;
pub mod shopping_list;

use sqlx::SqlitePool;

use crate::error::AppError;
use crate::models::{Recipe, User};

pub async fn find_recipe(db: &SqlitePool, id: i64) -> Result<Recipe, AppError> {
    sqlx::query_as("SELECT * FROM recipes WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or(AppError::NotFound)
}

/// Only the author or a staff member may change or delete a recipe.
pub fn ensure_can_edit(user: &User, recipe: &Recipe) -> Result<(), AppError> {
    if user.is_staff || recipe.author_id == user.id {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}
