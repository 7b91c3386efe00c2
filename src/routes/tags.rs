use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use crate::error::AppError;
use crate::models::Tag;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tags", get(list_tags))
        .route("/tags/{id}", get(show_tag))
}

async fn list_tags(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let tags: Vec<Tag> = sqlx::query_as("SELECT * FROM tags ORDER BY name ASC")
        .fetch_all(&state.db)
        .await?;
    Ok(Json(tags))
}

async fn show_tag(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let tag: Option<Tag> = sqlx::query_as("SELECT * FROM tags WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.db)
        .await?;
    tag.map(Json).ok_or(AppError::NotFound)
}
