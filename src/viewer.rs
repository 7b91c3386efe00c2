use std::collections::HashSet;

use sqlx::SqlitePool;

use crate::models::User;
use crate::recipes::collections::{self, Favorites, ShoppingCart};

/// What the acting viewer has favorited, carted and followed.
///
/// Loaded once per request and consulted while rendering read views, so the
/// `is_favorited` / `is_in_shopping_cart` / `is_subscribed` flags never need
/// per-row queries. An anonymous viewer has empty sets.
#[derive(Debug, Default)]
pub struct Viewer {
    pub user_id: Option<i64>,
    favorites: HashSet<i64>,
    cart: HashSet<i64>,
    following: HashSet<i64>,
}

impl Viewer {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub async fn load(db: &SqlitePool, user: Option<&User>) -> Result<Self, sqlx::Error> {
        let Some(user) = user else {
            return Ok(Self::anonymous());
        };

        let favorites = collections::recipe_ids::<Favorites>(db, user.id).await?;
        let cart = collections::recipe_ids::<ShoppingCart>(db, user.id).await?;
        let following: Vec<i64> =
            sqlx::query_scalar("SELECT author_id FROM subscriptions WHERE user_id = ?")
                .bind(user.id)
                .fetch_all(db)
                .await?;

        Ok(Self {
            user_id: Some(user.id),
            favorites,
            cart,
            following: following.into_iter().collect(),
        })
    }

    pub fn has_favorited(&self, recipe_id: i64) -> bool {
        self.favorites.contains(&recipe_id)
    }

    pub fn has_in_cart(&self, recipe_id: i64) -> bool {
        self.cart.contains(&recipe_id)
    }

    pub fn follows(&self, author_id: i64) -> bool {
        self.following.contains(&author_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_viewer_sees_nothing() {
        let viewer = Viewer::anonymous();
        assert_eq!(viewer.user_id, None);
        assert!(!viewer.has_favorited(1));
        assert!(!viewer.has_in_cart(1));
        assert!(!viewer.follows(1));
    }
}
