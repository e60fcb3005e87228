use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use utoipa::ToSchema;
use validator::Validate;

use crate::models::Todo;

pub const DEFAULT_COLOR: &str = "#3B82F6";

static HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("valid color pattern"));

fn validate_hex_color(color: &str) -> Result<(), validator::ValidationError> {
    if !HEX_COLOR.is_match(color) {
        return Err(validator::ValidationError::new("invalid_hex_color"));
    }
    Ok(())
}

/// User-defined grouping of todos
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i32,
    pub name: String,
    /// `#RRGGBB`
    pub color: String,
    pub icon: String,
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
}

/// A category together with the todos filed under it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CategoryWithTodos {
    #[serde(flatten)]
    pub category: Category,
    pub todos: Vec<Todo>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Validate, ToSchema)]
pub struct CreateCategory {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// Defaults to `#3B82F6`
    #[validate(custom(function = "validate_hex_color"))]
    pub color: Option<String>,
    #[validate(length(max = 50))]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate, ToSchema)]
pub struct UpdateCategory {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(custom(function = "validate_hex_color"))]
    pub color: Option<String>,
    #[validate(length(max = 50))]
    pub icon: Option<String>,
}

/// Category ready for persistence, defaults applied
#[derive(Debug, Clone, PartialEq)]
pub struct NewCategory {
    pub user_id: i32,
    pub name: String,
    pub color: String,
    pub icon: String,
}

impl NewCategory {
    pub fn new(user_id: i32, input: CreateCategory) -> Self {
        Self {
            user_id,
            name: input.name,
            color: input.color.unwrap_or_else(|| DEFAULT_COLOR.to_string()),
            icon: input.icon.unwrap_or_default(),
        }
    }
}
