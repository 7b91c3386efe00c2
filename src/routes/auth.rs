use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::auth::{login_user, logout_user, verify_password, AuthUser};
use crate::error::AppError;
use crate::extract::AppJson;
use crate::models::user::USER_COLUMNS;
use crate::models::User;
use crate::views::UserView;
use crate::AppState;

#[derive(Deserialize)]
pub struct LoginForm {
    email: String,
    password: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

async fn login(
    State(state): State<AppState>,
    session: Session,
    AppJson(form): AppJson<LoginForm>,
) -> Result<impl IntoResponse, AppError> {
    let row: Option<(i64, String)> =
        sqlx::query_as("SELECT id, password_hash FROM users WHERE email = ?")
            .bind(form.email.trim().to_lowercase())
            .fetch_optional(&state.db)
            .await?;

    let invalid = || AppError::BadRequest("Invalid email or password".to_string());

    let Some((user_id, hash)) = row else {
        return Err(invalid());
    };
    if !verify_password(&form.password, &hash)? {
        tracing::info!(user_id, "rejected login");
        return Err(invalid());
    }

    let user: User = sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(user_id)
        .fetch_one(&state.db)
        .await?;

    let view = UserView::with_subscribed(&user, false);
    login_user(&session, user.id).await?;
    tracing::info!(user_id, "user logged in");

    Ok(Json(view))
}

async fn logout(
    session: Session,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    logout_user(&session).await?;
    tracing::info!(user_id = user.id, "user logged out");
    Ok(StatusCode::NO_CONTENT)
}
