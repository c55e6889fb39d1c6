use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Represents a product in the catalog
///
/// Products are the scope-matching keys for discount rules: a rule's
/// must-have and adjustment scopes reference products and categories by ID.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Product {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Day Pass")]
    pub name: String,
    #[schema(example = 2)]
    pub category_id: Option<i32>,
    /// Unit price in dollars
    #[schema(value_type = f64, example = 15.0)]
    pub price: Decimal,
    #[schema(example = "Single-day gym access")]
    pub description: String,
    #[schema(example = true)]
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Represents the data needed to create a new product
///
/// Used for POST /api/products requests; id and timestamps are generated.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateProduct {
    #[validate(length(min = 1, max = 120, message = "Name must be 1-120 characters"))]
    #[schema(example = "Day Pass")]
    pub name: String,
    #[schema(example = 2)]
    pub category_id: Option<i32>,
    /// Unit price in dollars
    #[schema(value_type = f64, example = 15.0)]
    pub price: Decimal,
    #[schema(example = "Single-day gym access")]
    #[serde(default)]
    pub description: String,
    #[schema(example = true)]
    pub active: Option<bool>,
}

/// Represents the data for updating an existing product
///
/// All fields are optional to support partial updates
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateProduct {
    #[validate(length(min = 1, max = 120, message = "Name must be 1-120 characters"))]
    #[schema(example = "Updated Name")]
    pub name: Option<String>,
    #[schema(example = 3)]
    pub category_id: Option<i32>,
    /// Unit price in dollars
    #[schema(value_type = f64, example = 18.5)]
    pub price: Option<Decimal>,
    #[schema(example = "Updated description")]
    pub description: Option<String>,
    #[schema(example = false)]
    pub active: Option<bool>,
}

/// Represents a product category
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Category {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Memberships")]
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Represents the data needed to create a category
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCategory {
    #[validate(length(min = 1, max = 80, message = "Name must be 1-80 characters"))]
    #[schema(example = "Memberships")]
    pub name: String,
}
