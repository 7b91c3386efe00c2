use std::fs;

use anyhow::{bail, Context};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::auth::hash_password;
use crate::models::ingredient;
use crate::models::tag::NewTag;
use crate::models::user::validate_username;

#[derive(Deserialize)]
struct IngredientRecord {
    name: String,
    measurement_unit: String,
}

/// Load `[{"name": ..., "measurement_unit": ...}]` into the ingredient catalog.
/// Rows already present are skipped. Returns how many rows were inserted.
pub async fn load_ingredients(pool: &SqlitePool, file_path: &str) -> anyhow::Result<u64> {
    let content =
        fs::read_to_string(file_path).with_context(|| format!("failed to read {file_path}"))?;
    let records: Vec<IngredientRecord> =
        serde_json::from_str(&content).with_context(|| format!("invalid ingredient file {file_path}"))?;

    let mut inserted = 0;
    let mut tx = pool.begin().await?;

    for record in records {
        let name = record.name.trim();
        let unit = record.measurement_unit.trim();
        if name.is_empty() || unit.is_empty() {
            tracing::warn!(name, unit, "skipping incomplete ingredient");
            continue;
        }

        if ingredient::insert(&mut *tx, name, unit).await?.is_some() {
            inserted += 1;
        }
    }

    tx.commit().await?;
    tracing::info!(inserted, file = file_path, "ingredients loaded");
    Ok(inserted)
}

pub async fn create_tag(pool: &SqlitePool, name: &str, color: &str, slug: &str) -> anyhow::Result<i64> {
    let tag = match NewTag::new(name, color, slug) {
        Ok(tag) => tag,
        Err(msg) => bail!(msg),
    };

    let id = sqlx::query_scalar("INSERT INTO tags (name, color, slug) VALUES (?, ?, ?) RETURNING id")
        .bind(&tag.name)
        .bind(&tag.color)
        .bind(&tag.slug)
        .fetch_one(pool)
        .await
        .with_context(|| format!("failed to create tag {:?}", tag.name))?;

    Ok(id)
}

pub struct NewUser<'a> {
    pub email: &'a str,
    pub username: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub password: &'a str,
    pub is_staff: bool,
}

pub async fn create_user(pool: &SqlitePool, user: NewUser<'_>) -> anyhow::Result<i64> {
    if let Some(msg) = validate_username(user.username) {
        bail!("invalid username {:?}: {msg}", user.username);
    }
    if !user.email.contains('@') {
        bail!("invalid email {:?}", user.email);
    }
    if user.password.is_empty() {
        bail!("password must not be empty");
    }

    let password_hash = hash_password(user.password)?;
    let id = sqlx::query_scalar(
        r#"
        INSERT INTO users (email, username, first_name, last_name, password_hash, is_staff, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(user.email.trim().to_lowercase())
    .bind(user.username)
    .bind(user.first_name)
    .bind(user.last_name)
    .bind(&password_hash)
    .bind(user.is_staff)
    .bind(chrono::Utc::now().to_rfc3339())
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to create user {:?}", user.username))?;

    Ok(id)
}
