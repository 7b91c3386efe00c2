use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::error::AppError;
use crate::extract::AppQuery;
use crate::models::ingredient::{name_prefix_pattern, INGREDIENT_COLUMNS};
use crate::models::Ingredient;
use crate::AppState;

#[derive(Deserialize)]
pub struct IngredientQuery {
    name: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ingredients", get(list_ingredients))
        .route("/ingredients/{id}", get(show_ingredient))
}

/// Lists the catalog, optionally narrowed to names starting with `?name=`,
/// ignoring case.
async fn list_ingredients(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<IngredientQuery>,
) -> Result<impl IntoResponse, AppError> {
    let ingredients: Vec<Ingredient> = match query.name.as_deref().map(str::trim) {
        Some(prefix) if !prefix.is_empty() => {
            sqlx::query_as(&format!(
                "SELECT {INGREDIENT_COLUMNS} FROM ingredients \
                 WHERE name_lower LIKE ? ESCAPE '\\' ORDER BY name, measurement_unit"
            ))
            .bind(name_prefix_pattern(prefix))
            .fetch_all(&state.db)
            .await?
        }
        _ => {
            sqlx::query_as(&format!(
                "SELECT {INGREDIENT_COLUMNS} FROM ingredients ORDER BY name, measurement_unit"
            ))
            .fetch_all(&state.db)
            .await?
        }
    };
    Ok(Json(ingredients))
}

async fn show_ingredient(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let ingredient: Option<Ingredient> =
        sqlx::query_as(&format!("SELECT {INGREDIENT_COLUMNS} FROM ingredients WHERE id = ?"))
            .bind(id)
            .fetch_optional(&state.db)
            .await?;
    ingredient.map(Json).ok_or(AppError::NotFound)
}
