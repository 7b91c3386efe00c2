use std::fmt::Write;

use sqlx::{FromRow, SqlitePool};

pub const HEADER: &str = "Shopping list:";
pub const FILENAME: &str = "shopping_cart.txt";

/// One purchase line: an ingredient with its amount summed across the cart.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ShoppingItem {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

/// Sum ingredient amounts over every recipe in the user's cart, one row per
/// (name, measurement unit).
pub async fn aggregate(db: &SqlitePool, user_id: i64) -> Result<Vec<ShoppingItem>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT i.name, i.measurement_unit, CAST(SUM(ri.amount) AS INTEGER) AS amount
        FROM shopping_cart sc
        JOIN recipe_ingredients ri ON ri.recipe_id = sc.recipe_id
        JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE sc.user_id = ?
        GROUP BY i.name, i.measurement_unit
        ORDER BY i.name, i.measurement_unit
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
}

pub fn render(items: &[ShoppingItem]) -> String {
    let mut report = String::from(HEADER);
    report.push('\n');
    for item in items {
        // Writing into a String cannot fail
        let _ = writeln!(report, "{} - {}, {}", item.name, item.amount, item.measurement_unit);
    }
    report
}
