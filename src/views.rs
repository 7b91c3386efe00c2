use serde::Serialize;
use sqlx::SqlitePool;

use crate::image::media_url;
use crate::models::user::USER_COLUMNS;
use crate::models::{IngredientAmount, Recipe, Tag, User};
use crate::viewer::Viewer;

#[derive(Debug, Serialize)]
pub struct UserView {
    pub email: String,
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

impl UserView {
    pub fn new(user: &User, viewer: &Viewer) -> Self {
        Self::with_subscribed(user, viewer.follows(user.id))
    }

    pub fn with_subscribed(user: &User, is_subscribed: bool) -> Self {
        Self {
            email: user.email.clone(),
            id: user.id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_subscribed,
        }
    }
}

/// Compact recipe shape used by collections and author feeds.
#[derive(Debug, Serialize)]
pub struct RecipeSummary {
    pub id: i64,
    pub name: String,
    pub image: String,
    pub cooking_time: i64,
}

impl From<&Recipe> for RecipeSummary {
    fn from(recipe: &Recipe) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name.clone(),
            image: media_url(&recipe.image),
            cooking_time: recipe.cooking_time,
        }
    }
}

/// Full read representation of a recipe aggregate.
#[derive(Debug, Serialize)]
pub struct RecipeView {
    pub id: i64,
    pub tags: Vec<Tag>,
    pub author: UserView,
    pub ingredients: Vec<IngredientAmount>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i64,
}

pub async fn recipe_view(
    db: &SqlitePool,
    recipe: Recipe,
    viewer: &Viewer,
) -> Result<RecipeView, sqlx::Error> {
    let author: User = sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(recipe.author_id)
        .fetch_one(db)
        .await?;

    let tags: Vec<Tag> = sqlx::query_as(
        r#"
        SELECT t.id, t.name, t.color, t.slug
        FROM tags t
        JOIN recipe_tags rt ON rt.tag_id = t.id
        WHERE rt.recipe_id = ?
        ORDER BY t.id
        "#,
    )
    .bind(recipe.id)
    .fetch_all(db)
    .await?;

    let ingredients: Vec<IngredientAmount> = sqlx::query_as(
        r#"
        SELECT i.id, i.name, i.measurement_unit, ri.amount
        FROM recipe_ingredients ri
        JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE ri.recipe_id = ?
        ORDER BY i.name
        "#,
    )
    .bind(recipe.id)
    .fetch_all(db)
    .await?;

    Ok(RecipeView {
        id: recipe.id,
        tags,
        author: UserView::new(&author, viewer),
        ingredients,
        is_favorited: viewer.has_favorited(recipe.id),
        is_in_shopping_cart: viewer.has_in_cart(recipe.id),
        image: media_url(&recipe.image),
        name: recipe.name,
        text: recipe.text,
        cooking_time: recipe.cooking_time,
    })
}

/// An author together with their recipes, as shown on the subscriptions page.
#[derive(Debug, Serialize)]
pub struct AuthorFeed {
    #[serde(flatten)]
    pub author: UserView,
    pub recipes: Vec<RecipeSummary>,
    pub recipes_count: i64,
}

pub async fn author_feed(
    db: &SqlitePool,
    author: &User,
    is_subscribed: bool,
    recipes_limit: Option<i64>,
) -> Result<AuthorFeed, sqlx::Error> {
    // SQLite treats a negative LIMIT as "no limit"
    let recipes: Vec<Recipe> = sqlx::query_as(
        "SELECT * FROM recipes WHERE author_id = ? ORDER BY created_at DESC, id DESC LIMIT ?",
    )
    .bind(author.id)
    .bind(recipes_limit.unwrap_or(-1))
    .fetch_all(db)
    .await?;

    let recipes_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recipes WHERE author_id = ?")
        .bind(author.id)
        .fetch_one(db)
        .await?;

    Ok(AuthorFeed {
        author: UserView::with_subscribed(author, is_subscribed),
        recipes: recipes.iter().map(RecipeSummary::from).collect(),
        recipes_count,
    })
}
