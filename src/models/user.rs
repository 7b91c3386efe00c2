use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Column list for reading users without their password hash.
pub const USER_COLUMNS: &str = "id, email, username, first_name, last_name, is_staff, created_at";

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.@+-]+$").expect("valid username pattern"));

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,
    pub created_at: String,
}

/// Returns a message describing why `username` is unacceptable, if it is.
pub fn validate_username(username: &str) -> Option<&'static str> {
    if username.is_empty() {
        return Some("Username is required");
    }
    if username.chars().count() > 150 {
        return Some("Username must be at most 150 characters");
    }
    if username.eq_ignore_ascii_case("me") {
        return Some("Username \"me\" is reserved");
    }
    if !USERNAME_RE.is_match(username) {
        return Some("Username may contain only letters, digits and @/./+/-/_");
    }
    None
}
