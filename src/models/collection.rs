use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One recipe held in a user's favorites or shopping cart.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CollectionEntry {
    pub user_id: i64,
    pub recipe_id: i64,
    pub created_at: String,
}

impl CollectionEntry {
    pub fn new(user_id: i64, recipe_id: i64) -> Self {
        Self {
            user_id,
            recipe_id,
            created_at: Utc::now().to_rfc3339(),
        }
    }
}
