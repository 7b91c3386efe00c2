use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Subscription {
    pub user_id: i64,
    pub author_id: i64,
    pub created_at: String,
}

impl Subscription {
    pub fn new(user_id: i64, author_id: i64) -> Self {
        Self {
            user_id,
            author_id,
            created_at: Utc::now().to_rfc3339(),
        }
    }
}
