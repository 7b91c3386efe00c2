use sqlx::{QueryBuilder, Sqlite};

use crate::error::AppError;

/// Query-string filters accepted by the recipe list.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    pub author: Option<i64>,
    /// Tag slugs; a recipe matches when it carries any of them.
    pub tags: Vec<String>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

impl RecipeFilter {
    pub fn from_pairs(pairs: &[(String, String)]) -> Result<Self, AppError> {
        let mut filter = RecipeFilter::default();
        for (key, value) in pairs {
            match key.as_str() {
                "author" => {
                    let id = value
                        .parse()
                        .map_err(|_| AppError::field("author", "Author must be a user id"))?;
                    filter.author = Some(id);
                }
                "tags" => filter.tags.push(value.clone()),
                "is_favorited" => filter.is_favorited = parse_flag("is_favorited", value)?,
                "is_in_shopping_cart" => {
                    filter.is_in_shopping_cart = parse_flag("is_in_shopping_cart", value)?
                }
                // Unknown parameters are ignored, like any other query string noise
                _ => {}
            }
        }
        Ok(filter)
    }

    /// Build the listing query for a viewer. Collection flags match nothing for
    /// anonymous viewers.
    pub fn query(&self, viewer_id: Option<i64>) -> QueryBuilder<'_, Sqlite> {
        let mut qb = QueryBuilder::new("SELECT r.* FROM recipes r WHERE 1 = 1");

        if let Some(author) = self.author {
            qb.push(" AND r.author_id = ").push_bind(author);
        }

        if !self.tags.is_empty() {
            qb.push(
                " AND r.id IN (SELECT rt.recipe_id FROM recipe_tags rt \
                 JOIN tags t ON t.id = rt.tag_id WHERE t.slug IN (",
            );
            let mut slugs = qb.separated(", ");
            for slug in &self.tags {
                slugs.push_bind(slug.as_str());
            }
            slugs.push_unseparated("))");
        }

        for (enabled, table) in [
            (self.is_favorited, "favorites"),
            (self.is_in_shopping_cart, "shopping_cart"),
        ] {
            if !enabled {
                continue;
            }
            match viewer_id {
                Some(user_id) => {
                    qb.push(format!(" AND r.id IN (SELECT recipe_id FROM {table} WHERE user_id = "))
                        .push_bind(user_id)
                        .push(")");
                }
                None => {
                    qb.push(" AND 0");
                }
            }
        }

        qb.push(" ORDER BY r.created_at DESC, r.id DESC");
        qb
    }
}

fn parse_flag(field: &'static str, value: &str) -> Result<bool, AppError> {
    match value {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        _ => Err(AppError::field(field, "Expected 0 or 1")),
    }
}
