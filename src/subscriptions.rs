use sqlx::SqlitePool;

use crate::error::{is_unique_violation, AppError};
use crate::models::{Subscription, User};
use crate::views::{self, AuthorFeed};

/// Follow `author`. Self-subscription is refused before the store is touched.
pub async fn subscribe(
    db: &SqlitePool,
    user: &User,
    author: &User,
    recipes_limit: Option<i64>,
) -> Result<AuthorFeed, AppError> {
    if user.id == author.id {
        return Err(AppError::field("author", "You cannot subscribe to yourself"));
    }

    let subscription = Subscription::new(user.id, author.id);
    let result = sqlx::query("INSERT INTO subscriptions (user_id, author_id, created_at) VALUES (?, ?, ?)")
        .bind(subscription.user_id)
        .bind(subscription.author_id)
        .bind(&subscription.created_at)
        .execute(db)
        .await;

    match result {
        Ok(_) => {}
        Err(e) if is_unique_violation(&e) => {
            return Err(AppError::Conflict(
                "You are already subscribed to this author".to_string(),
            ));
        }
        Err(e) => return Err(e.into()),
    }

    tracing::info!(user_id = user.id, author_id = author.id, "subscribed");
    Ok(views::author_feed(db, author, true, recipes_limit).await?)
}

pub async fn unsubscribe(db: &SqlitePool, user: &User, author: &User) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM subscriptions WHERE user_id = ? AND author_id = ?")
        .bind(user.id)
        .bind(author.id)
        .execute(db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotMember(
            "You are not subscribed to this author".to_string(),
        ));
    }

    tracing::info!(user_id = user.id, author_id = author.id, "unsubscribed");
    Ok(())
}

/// Every author `user` follows, each with their latest recipes.
pub async fn list(
    db: &SqlitePool,
    user: &User,
    recipes_limit: Option<i64>,
) -> Result<Vec<AuthorFeed>, AppError> {
    let authors: Vec<User> = sqlx::query_as(
        r#"
        SELECT u.id, u.email, u.username, u.first_name, u.last_name, u.is_staff, u.created_at
        FROM users u
        JOIN subscriptions s ON s.author_id = u.id
        WHERE s.user_id = ?
        ORDER BY s.created_at DESC, u.id
        "#,
    )
    .bind(user.id)
    .fetch_all(db)
    .await?;

    let mut feeds = Vec::with_capacity(authors.len());
    for author in &authors {
        feeds.push(views::author_feed(db, author, true, recipes_limit).await?);
    }
    Ok(feeds)
}

/// Validate an optional `recipes_limit` query value.
pub fn parse_limit(raw: Option<&str>) -> Result<Option<i64>, AppError> {
    match raw {
        None | Some("") => Ok(None),
        Some(value) => match value.parse::<i64>() {
            Ok(limit) if limit >= 0 => Ok(Some(limit)),
            _ => Err(AppError::field(
                "recipes_limit",
                "recipes_limit must be a non-negative integer",
            )),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_recipes_limit() {
        assert_eq!(parse_limit(None).unwrap(), None);
        assert_eq!(parse_limit(Some("")).unwrap(), None);
        assert_eq!(parse_limit(Some("3")).unwrap(), Some(3));
        assert!(parse_limit(Some("-1")).is_err());
        assert!(parse_limit(Some("three")).is_err());
    }
}
