use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::auth::{hash_password, AuthUser, MaybeUser};
use crate::error::{is_unique_violation, AppError, FieldErrors};
use crate::extract::{AppJson, AppQuery};
use crate::models::user::{validate_username, USER_COLUMNS};
use crate::models::User;
use crate::subscriptions;
use crate::viewer::Viewer;
use crate::views::UserView;
use crate::AppState;

const MAX_NAME_LEN: usize = 150;
const MAX_EMAIL_LEN: usize = 254;

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct SignUpForm {
    email: String,
    username: String,
    first_name: String,
    last_name: String,
    password: String,
}

#[derive(Deserialize)]
pub struct FeedQuery {
    recipes_limit: Option<String>,
}

fn validate_sign_up(form: &SignUpForm) -> FieldErrors {
    let mut errors = FieldErrors::new();

    let email = form.email.trim();
    if email.is_empty() || !email.contains('@') {
        errors.insert("email", vec!["Enter a valid email address".to_string()]);
    } else if email.len() > MAX_EMAIL_LEN {
        errors.insert("email", vec![format!("Email must be at most {MAX_EMAIL_LEN} characters")]);
    }

    if let Some(msg) = validate_username(&form.username) {
        errors.insert("username", vec![msg.to_string()]);
    }

    for (field, value) in [("first_name", &form.first_name), ("last_name", &form.last_name)] {
        if value.trim().is_empty() {
            errors.insert(field, vec!["This field is required".to_string()]);
        } else if value.chars().count() > MAX_NAME_LEN {
            errors.insert(field, vec![format!("Must be at most {MAX_NAME_LEN} characters")]);
        }
    }

    if form.password.is_empty() {
        errors.insert("password", vec!["Password is required".to_string()]);
    }

    errors
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(sign_up))
        .route("/users/me", get(me))
        .route("/users/subscriptions", get(list_subscriptions))
        .route("/users/{id}", get(show_user))
        .route("/users/{id}/subscribe", post(subscribe).delete(unsubscribe))
}

pub async fn find_user(db: &SqlitePool, id: i64) -> Result<User, AppError> {
    sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or(AppError::NotFound)
}

/// `field` is a fixed column name, never user input.
async fn value_taken(db: &SqlitePool, field: &str, value: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(&format!("SELECT EXISTS(SELECT 1 FROM users WHERE {field} = ?)"))
        .bind(value)
        .fetch_one(db)
        .await
}

async fn sign_up(
    State(state): State<AppState>,
    AppJson(form): AppJson<SignUpForm>,
) -> Result<impl IntoResponse, AppError> {
    let mut errors = validate_sign_up(&form);

    let email = form.email.trim().to_lowercase();
    for (field, value) in [("email", email.as_str()), ("username", form.username.as_str())] {
        if value_taken(&state.db, field, value).await? {
            errors
                .entry(field)
                .or_default()
                .push(format!("A user with that {field} already exists"));
        }
    }

    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let password_hash = hash_password(&form.password)?;
    let result = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO users (email, username, first_name, last_name, password_hash, is_staff, created_at)
        VALUES (?, ?, ?, ?, ?, 0, ?)
        RETURNING id
        "#,
    )
    .bind(&email)
    .bind(&form.username)
    .bind(form.first_name.trim())
    .bind(form.last_name.trim())
    .bind(&password_hash)
    .bind(Utc::now().to_rfc3339())
    .fetch_one(&state.db)
    .await;

    let id = match result {
        Ok(id) => id,
        Err(e) if is_unique_violation(&e) => {
            return Err(AppError::Conflict("A user with these credentials already exists".into()));
        }
        Err(e) => return Err(e.into()),
    };

    let user = find_user(&state.db, id).await?;
    tracing::info!(user_id = id, "user registered");
    Ok((StatusCode::CREATED, Json(UserView::with_subscribed(&user, false))))
}

async fn list_users(
    State(state): State<AppState>,
    MaybeUser(viewer_user): MaybeUser,
) -> Result<impl IntoResponse, AppError> {
    let viewer = Viewer::load(&state.db, viewer_user.as_ref()).await?;
    let users: Vec<User> = sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))
        .fetch_all(&state.db)
        .await?;
    let views: Vec<UserView> = users.iter().map(|u| UserView::new(u, &viewer)).collect();
    Ok(Json(views))
}

async fn me(AuthUser(user): AuthUser) -> impl IntoResponse {
    Json(UserView::with_subscribed(&user, false))
}

async fn show_user(
    State(state): State<AppState>,
    MaybeUser(viewer_user): MaybeUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user = find_user(&state.db, id).await?;
    let viewer = Viewer::load(&state.db, viewer_user.as_ref()).await?;
    Ok(Json(UserView::new(&user, &viewer)))
}

async fn subscribe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    AppQuery(query): AppQuery<FeedQuery>,
) -> Result<impl IntoResponse, AppError> {
    let author = find_user(&state.db, id).await?;
    let limit = subscriptions::parse_limit(query.recipes_limit.as_deref())?;
    let feed = subscriptions::subscribe(&state.db, &user, &author, limit).await?;
    Ok((StatusCode::CREATED, Json(feed)))
}

async fn unsubscribe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let author = find_user(&state.db, id).await?;
    subscriptions::unsubscribe(&state.db, &user, &author).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_subscriptions(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppQuery(query): AppQuery<FeedQuery>,
) -> Result<impl IntoResponse, AppError> {
    let limit = subscriptions::parse_limit(query.recipes_limit.as_deref())?;
    Ok(Json(subscriptions::list(&state.db, &user, limit).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> SignUpForm {
        SignUpForm {
            email: "cook@example.com".into(),
            username: "cook".into(),
            first_name: "Ann".into(),
            last_name: "Cook".into(),
            password: "s3cret-pass".into(),
        }
    }

    #[test]
    fn valid_sign_up_has_no_errors() {
        assert!(validate_sign_up(&form()).is_empty());
    }

    #[test]
    fn sign_up_reports_each_bad_field() {
        let bad = SignUpForm {
            email: "not-an-email".into(),
            username: "me".into(),
            first_name: " ".into(),
            password: String::new(),
            ..form()
        };
        let errors = validate_sign_up(&bad);
        for field in ["email", "username", "first_name", "password"] {
            assert!(errors.contains_key(field), "missing error for {field}");
        }
        assert!(!errors.contains_key("last_name"));
    }
}
