pub mod collection;
pub mod ingredient;
pub mod recipe;
pub mod subscription;
pub mod tag;
pub mod user;

pub use collection::CollectionEntry;
pub use ingredient::{Ingredient, IngredientAmount};
pub use recipe::{Recipe, RecipeIngredient};
pub use subscription::Subscription;
pub use tag::Tag;
pub use user::User;
