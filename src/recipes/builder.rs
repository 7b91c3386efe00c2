//! Validation and atomic persistence of recipe aggregates.
//!
//! A recipe row, its tag links and its ingredient amounts are written in a
//! single transaction. Validation happens up front so that nothing is written
//! for a rejected payload, and the transaction rolls back on drop if any later
//! step fails.

use std::collections::HashSet;

use chrono::Utc;
use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::error::{AppError, FieldErrors};
use crate::image::{self, DecodedImage};
use crate::models::{Recipe, RecipeIngredient, User};
use crate::AppState;

const MAX_NAME_LEN: usize = 200;
/// Upper bound for ingredient amounts and cooking time, keeping cart sums well
/// inside i64.
pub const MAX_QUANTITY: i64 = 32_000;

#[derive(Debug, Clone, Deserialize)]
pub struct IngredientEntry {
    pub id: i64,
    pub amount: i64,
}

/// Request body for both creating and updating a recipe.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RecipePayload {
    pub name: String,
    pub text: String,
    pub cooking_time: i64,
    pub image: Option<String>,
    pub tags: Vec<i64>,
    pub ingredients: Vec<IngredientEntry>,
}

/// A payload that passed every check not requiring the database.
///
/// `I` is `DecodedImage` for a new recipe and `Option<DecodedImage>` for an
/// update, where the stored image is kept when none is sent.
#[derive(Debug)]
pub struct ValidRecipe<I> {
    pub name: String,
    pub text: String,
    pub cooking_time: i64,
    pub image: I,
    pub tags: Vec<i64>,
    pub ingredients: Vec<IngredientEntry>,
}

/// Validate a payload for a new recipe; the image is mandatory.
pub fn validate_new(payload: RecipePayload) -> Result<ValidRecipe<DecodedImage>, AppError> {
    let (mut errors, recipe) = check_fields(payload);
    match recipe.image {
        Some(image) if errors.is_empty() => Ok(ValidRecipe {
            name: recipe.name,
            text: recipe.text,
            cooking_time: recipe.cooking_time,
            image,
            tags: recipe.tags,
            ingredients: recipe.ingredients,
        }),
        image => {
            // A malformed image already carries its own message
            if image.is_none() && !errors.contains_key("image") {
                errors.insert("image", vec!["Image is required".to_string()]);
            }
            Err(AppError::Validation(errors))
        }
    }
}

/// Validate a payload replacing an existing recipe; the image is optional.
pub fn validate_update(payload: RecipePayload) -> Result<ValidRecipe<Option<DecodedImage>>, AppError> {
    let (errors, recipe) = check_fields(payload);
    if errors.is_empty() {
        Ok(recipe)
    } else {
        Err(AppError::Validation(errors))
    }
}

fn check_fields(payload: RecipePayload) -> (FieldErrors, ValidRecipe<Option<DecodedImage>>) {
    let mut errors = FieldErrors::new();
    let mut fail = |field: &'static str, msg: String| errors.entry(field).or_default().push(msg);

    let name = payload.name.trim().to_string();
    if name.is_empty() {
        fail("name", "Name is required".to_string());
    } else if name.chars().count() > MAX_NAME_LEN {
        fail("name", format!("Name must be at most {MAX_NAME_LEN} characters"));
    }

    let text = payload.text.trim().to_string();
    if text.is_empty() {
        fail("text", "Description is required".to_string());
    }

    if !(1..=MAX_QUANTITY).contains(&payload.cooking_time) {
        fail(
            "cooking_time",
            format!("Cooking time must be between 1 and {MAX_QUANTITY} minutes"),
        );
    }

    if payload.tags.is_empty() {
        fail("tags", "At least one tag is required".to_string());
    } else if has_duplicates(payload.tags.iter().copied()) {
        fail("tags", "Tags must not repeat".to_string());
    }

    if payload.ingredients.is_empty() {
        fail("ingredients", "At least one ingredient is required".to_string());
    } else {
        if has_duplicates(payload.ingredients.iter().map(|i| i.id)) {
            fail("ingredients", "Ingredients must not repeat".to_string());
        }
        if let Some(bad) = payload
            .ingredients
            .iter()
            .find(|i| !(1..=MAX_QUANTITY).contains(&i.amount))
        {
            fail(
                "ingredients",
                format!(
                    "Amount for ingredient {} must be between 1 and {MAX_QUANTITY}",
                    bad.id
                ),
            );
        }
    }

    let image = match payload.image.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => match image::decode_data_uri(raw) {
            Ok(decoded) => Some(decoded),
            Err(msg) => {
                fail("image", msg.to_string());
                None
            }
        },
        _ => None,
    };

    let recipe = ValidRecipe {
        name,
        text,
        cooking_time: payload.cooking_time,
        image,
        tags: payload.tags,
        ingredients: payload.ingredients,
    };
    (errors, recipe)
}

fn has_duplicates(ids: impl Iterator<Item = i64>) -> bool {
    let mut seen = HashSet::new();
    ids.into_iter().any(|id| !seen.insert(id))
}

/// Create a recipe authored by `author` and return its id.
pub async fn create(state: &AppState, author: &User, payload: RecipePayload) -> Result<i64, AppError> {
    let recipe = validate_new(payload)?;

    let mut tx = state.db.begin().await?;
    check_references(&mut tx, &recipe.tags, &recipe.ingredients).await?;

    let stored = image::save(&state.media_root, &recipe.image).await?;

    let outcome = async {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO recipes (author_id, name, image, text, cooking_time, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(author.id)
        .bind(&recipe.name)
        .bind(&stored)
        .bind(&recipe.text)
        .bind(recipe.cooking_time)
        .bind(Utc::now().to_rfc3339())
        .fetch_one(&mut *tx)
        .await?;

        insert_associations(&mut tx, id, &recipe.tags, &recipe.ingredients).await?;
        Ok::<_, AppError>(id)
    }
    .await;

    let id = match outcome {
        Ok(id) => id,
        Err(e) => {
            image::remove(&state.media_root, &stored).await;
            return Err(e);
        }
    };

    if let Err(e) = tx.commit().await {
        image::remove(&state.media_root, &stored).await;
        return Err(e.into());
    }

    tracing::info!(recipe_id = id, author_id = author.id, "recipe created");
    Ok(id)
}

/// Replace a recipe's fields and its whole tag and ingredient sets.
/// Callers must have checked that the acting user may edit `existing`.
pub async fn update(state: &AppState, existing: &Recipe, payload: RecipePayload) -> Result<(), AppError> {
    let recipe = validate_update(payload)?;

    let mut tx = state.db.begin().await?;
    check_references(&mut tx, &recipe.tags, &recipe.ingredients).await?;

    let new_image = match &recipe.image {
        Some(decoded) => Some(image::save(&state.media_root, decoded).await?),
        None => None,
    };
    let image_path = new_image.as_deref().unwrap_or(&existing.image);

    let outcome = async {
        sqlx::query("UPDATE recipes SET name = ?, image = ?, text = ?, cooking_time = ? WHERE id = ?")
            .bind(&recipe.name)
            .bind(image_path)
            .bind(&recipe.text)
            .bind(recipe.cooking_time)
            .bind(existing.id)
            .execute(&mut *tx)
            .await?;

        clear_associations(&mut tx, existing.id).await?;
        insert_associations(&mut tx, existing.id, &recipe.tags, &recipe.ingredients).await?;
        Ok::<_, AppError>(())
    }
    .await;

    let outcome = match outcome {
        Ok(()) => tx.commit().await.map_err(AppError::from),
        Err(e) => Err(e),
    };

    if let Err(e) = outcome {
        if let Some(path) = &new_image {
            image::remove(&state.media_root, path).await;
        }
        return Err(e);
    }

    if new_image.is_some() {
        image::remove(&state.media_root, &existing.image).await;
    }

    tracing::info!(recipe_id = existing.id, "recipe updated");
    Ok(())
}

/// Delete a recipe; associations, favorites and cart rows cascade.
pub async fn delete(state: &AppState, recipe: &Recipe) -> Result<(), AppError> {
    sqlx::query("DELETE FROM recipes WHERE id = ?")
        .bind(recipe.id)
        .execute(&state.db)
        .await?;

    image::remove(&state.media_root, &recipe.image).await;
    tracing::info!(recipe_id = recipe.id, "recipe deleted");
    Ok(())
}

/// Every referenced tag and ingredient must exist.
async fn check_references(
    conn: &mut SqliteConnection,
    tags: &[i64],
    ingredients: &[IngredientEntry],
) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();

    let missing_tags = missing_ids(conn, "tags", tags).await?;
    if !missing_tags.is_empty() {
        errors.insert("tags", missing_messages(&missing_tags));
    }

    let ingredient_ids: Vec<i64> = ingredients.iter().map(|i| i.id).collect();
    let missing_ingredients = missing_ids(conn, "ingredients", &ingredient_ids).await?;
    if !missing_ingredients.is_empty() {
        errors.insert("ingredients", missing_messages(&missing_ingredients));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

async fn missing_ids(
    conn: &mut SqliteConnection,
    table: &str,
    ids: &[i64],
) -> Result<Vec<i64>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT id FROM {table} WHERE id IN ("));
    let mut separated = qb.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");

    let found: HashSet<i64> = qb
        .build_query_scalar::<i64>()
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .collect();

    Ok(ids.iter().copied().filter(|id| !found.contains(id)).collect())
}

fn missing_messages(ids: &[i64]) -> Vec<String> {
    ids.iter()
        .map(|id| format!("Invalid pk \"{id}\" - object does not exist."))
        .collect()
}

async fn clear_associations(conn: &mut SqliteConnection, recipe_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = ?")
        .bind(recipe_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = ?")
        .bind(recipe_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

async fn insert_associations(
    conn: &mut SqliteConnection,
    recipe_id: i64,
    tags: &[i64],
    ingredients: &[IngredientEntry],
) -> Result<(), sqlx::Error> {
    let mut tag_rows = QueryBuilder::<Sqlite>::new("INSERT INTO recipe_tags (recipe_id, tag_id) ");
    tag_rows.push_values(tags, |mut row, tag_id| {
        row.push_bind(recipe_id).push_bind(*tag_id);
    });
    tag_rows.build().execute(&mut *conn).await?;

    let rows: Vec<RecipeIngredient> = ingredients
        .iter()
        .map(|entry| RecipeIngredient {
            recipe_id,
            ingredient_id: entry.id,
            amount: entry.amount,
        })
        .collect();

    let mut ingredient_rows = QueryBuilder::<Sqlite>::new(
        "INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) ",
    );
    ingredient_rows.push_values(rows, |mut row, item| {
        row.push_bind(item.recipe_id)
            .push_bind(item.ingredient_id)
            .push_bind(item.amount);
    });
    ingredient_rows.build().execute(&mut *conn).await?;

    Ok(())
}
