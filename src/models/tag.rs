use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

static COLOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#([A-Fa-f0-9]{3}){1,2}$").expect("valid color pattern"));
static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("valid slug pattern"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub color: String,
    pub slug: String,
}

/// A tag that has passed validation but is not stored yet.
#[derive(Debug, Clone)]
pub struct NewTag {
    pub name: String,
    pub color: String,
    pub slug: String,
}

impl NewTag {
    pub fn new(name: &str, color: &str, slug: &str) -> Result<Self, String> {
        let name = name.trim();
        if name.is_empty() {
            return Err("tag name is required".to_string());
        }
        if !COLOR_RE.is_match(color) {
            return Err(format!("invalid color {color:?}, expected #RGB or #RRGGBB"));
        }
        if !SLUG_RE.is_match(slug) {
            return Err(format!("invalid slug {slug:?}"));
        }
        Ok(Self {
            name: name.to_string(),
            color: color.to_uppercase(),
            slug: slug.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_short_and_long_hex_colors() {
        assert!(NewTag::new("Breakfast", "#E26C2D", "breakfast").is_ok());
        assert_eq!(NewTag::new("Lunch", "#abc", "lunch").unwrap().color, "#ABC");
    }

    #[test]
    fn rejects_bad_colors_and_slugs() {
        assert!(NewTag::new("Dinner", "E26C2D", "dinner").is_err());
        assert!(NewTag::new("Dinner", "#E26C2", "dinner").is_err());
        assert!(NewTag::new("Dinner", "#GGGGGG", "dinner").is_err());
        assert!(NewTag::new("Dinner", "#000", "din ner").is_err());
        assert!(NewTag::new("  ", "#000", "dinner").is_err());
    }
}
