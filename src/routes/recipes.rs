use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::auth::{AuthUser, MaybeUser};
use crate::error::AppError;
use crate::extract::{AppJson, AppQuery};
use crate::models::{Recipe, User};
use crate::recipes::builder::{self, RecipePayload};
use crate::recipes::collections::{self, Favorites, RecipeCollection, ShoppingCart};
use crate::recipes::filter::RecipeFilter;
use crate::recipes::{ensure_can_edit, find_recipe, shopping_list};
use crate::viewer::Viewer;
use crate::views::{recipe_view, RecipeView};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(list_recipes).post(create_recipe))
        .route("/recipes/download_shopping_cart", get(download_shopping_cart))
        .route(
            "/recipes/{id}",
            get(show_recipe).patch(update_recipe).delete(delete_recipe),
        )
        .route(
            "/recipes/{id}/favorite",
            post(add_to::<Favorites>).delete(remove_from::<Favorites>),
        )
        .route(
            "/recipes/{id}/shopping_cart",
            post(add_to::<ShoppingCart>).delete(remove_from::<ShoppingCart>),
        )
}

async fn list_recipes(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    AppQuery(params): AppQuery<Vec<(String, String)>>,
) -> Result<impl IntoResponse, AppError> {
    let filter = RecipeFilter::from_pairs(&params)?;
    let viewer = Viewer::load(&state.db, user.as_ref()).await?;

    let mut query = filter.query(viewer.user_id);
    let recipes: Vec<Recipe> = query.build_query_as::<Recipe>().fetch_all(&state.db).await?;

    let mut views = Vec::with_capacity(recipes.len());
    for recipe in recipes {
        views.push(recipe_view(&state.db, recipe, &viewer).await?);
    }
    Ok(Json(views))
}

async fn show_recipe(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let recipe = find_recipe(&state.db, id).await?;
    let viewer = Viewer::load(&state.db, user.as_ref()).await?;
    Ok(Json(recipe_view(&state.db, recipe, &viewer).await?))
}

async fn create_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppJson(payload): AppJson<RecipePayload>,
) -> Result<impl IntoResponse, AppError> {
    let id = builder::create(&state, &user, payload).await?;
    let view = render(&state, id, Some(&user)).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn update_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<RecipePayload>,
) -> Result<impl IntoResponse, AppError> {
    let recipe = find_recipe(&state.db, id).await?;
    ensure_can_edit(&user, &recipe)?;

    builder::update(&state, &recipe, payload).await?;
    Ok(Json(render(&state, id, Some(&user)).await?))
}

async fn delete_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let recipe = find_recipe(&state.db, id).await?;
    ensure_can_edit(&user, &recipe)?;

    builder::delete(&state, &recipe).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn render(
    state: &AppState,
    id: i64,
    user: Option<&User>,
) -> Result<RecipeView, AppError> {
    let recipe = find_recipe(&state.db, id).await?;
    let viewer = Viewer::load(&state.db, user).await?;
    Ok(recipe_view(&state.db, recipe, &viewer).await?)
}

async fn add_to<C: RecipeCollection>(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let recipe = find_recipe(&state.db, id).await?;
    let summary = collections::add::<C>(&state.db, user.id, &recipe).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

async fn remove_from<C: RecipeCollection>(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let recipe = find_recipe(&state.db, id).await?;
    collections::remove::<C>(&state.db, user.id, recipe.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn download_shopping_cart(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let items = shopping_list::aggregate(&state.db, user.id).await?;
    let report = shopping_list::render(&items);

    let headers = [
        (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", shopping_list::FILENAME),
        ),
    ];
    Ok((headers, report))
}
