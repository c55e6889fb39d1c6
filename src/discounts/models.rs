// Discount rule definitions
// A discount (or surcharge) carries a must-have scope, an ordered list of
// adjustment entries, usage limits, and an availability window. Structured
// sub-objects live in JSONB columns; limits are flat nullable columns.

use chrono::{DateTime, Utc};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::sync::OnceLock;
use uuid::Uuid;
use validator::Validate;

use crate::discounts::error::{DiscountError, DiscountResult};
use crate::discounts::types::{AdjustmentKind, AdjustmentMode, DaysOfWeek, FrequencyPeriod};

/// Product/category scope for must-have clauses and adjustment targeting
///
/// An empty scope (no products, no categories) matches every line item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    #[serde(default)]
    pub products: Vec<i32>,
    #[serde(default)]
    pub categories: Vec<i32>,
}

impl Scope {
    pub fn is_empty(&self) -> bool {
        self.products.is_empty() && self.categories.is_empty()
    }
}

/// One entry in a discount's ordered adjustment list
///
/// The entry's own scope selects which line items it adjusts; `value` is a
/// percentage or fixed amount depending on `kind`, optionally capped by
/// `max_amount`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentEntry {
    #[serde(flatten)]
    pub scope: Scope,
    pub kind: AdjustmentKind,
    pub value: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_amount: Option<Decimal>,
}

/// Discount rule definition as stored in the database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Discount {
    pub id: Uuid,
    pub name: String,
    /// Optional public-facing code, stored uppercase, unique when present
    pub code: Option<String>,
    pub description: Option<String>,
    pub mode: AdjustmentMode,
    #[sqlx(json)]
    pub musts: Scope,
    #[sqlx(json)]
    pub adjustments: Vec<AdjustmentEntry>,
    pub usage_limit: Option<i32>,
    pub per_customer_limit: Option<i32>,
    pub frequency_count: Option<i32>,
    pub frequency_period: Option<FrequencyPeriod>,
    #[sqlx(json)]
    pub days_of_week: DaysOfWeek,
    pub starts_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub require_customer: bool,
    pub archived_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Discount {
    /// Column list shared by every discount SELECT
    pub(crate) const COLUMNS: &'static str = "id, name, code, description, mode, musts, \
         adjustments, usage_limit, per_customer_limit, frequency_count, frequency_period, \
         days_of_week, starts_at, expires_at, require_customer, archived_at, created_at, \
         updated_at";

    /// Frequency limit as a (count, period) pair when both parts are set
    pub fn frequency(&self) -> Option<(i32, FrequencyPeriod)> {
        match (self.frequency_count, self.frequency_period) {
            (Some(count), Some(period)) => Some((count, period)),
            _ => None,
        }
    }
}

/// Request DTO for creating a discount rule
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateDiscountRequest {
    #[validate(length(min = 1, max = 120, message = "Name must be 1-120 characters"))]
    pub name: String,
    pub code: Option<String>,
    pub description: Option<String>,
    pub mode: AdjustmentMode,
    #[serde(default)]
    pub musts: Scope,
    pub adjustments: Vec<AdjustmentEntry>,
    #[validate(range(min = 1, message = "Usage limit must be at least 1"))]
    pub usage_limit: Option<i32>,
    #[validate(range(min = 1, message = "Per-customer limit must be at least 1"))]
    pub per_customer_limit: Option<i32>,
    #[validate(range(min = 1, message = "Frequency count must be at least 1"))]
    pub frequency_count: Option<i32>,
    pub frequency_period: Option<FrequencyPeriod>,
    #[serde(default)]
    pub days_of_week: DaysOfWeek,
    pub starts_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub require_customer: bool,
}

/// Request DTO for updating a discount rule
///
/// All fields optional to support partial updates; omitted fields keep
/// their current values.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateDiscountRequest {
    #[validate(length(min = 1, max = 120, message = "Name must be 1-120 characters"))]
    pub name: Option<String>,
    pub code: Option<String>,
    pub description: Option<String>,
    pub musts: Option<Scope>,
    pub adjustments: Option<Vec<AdjustmentEntry>>,
    #[validate(range(min = 1, message = "Usage limit must be at least 1"))]
    pub usage_limit: Option<i32>,
    #[validate(range(min = 1, message = "Per-customer limit must be at least 1"))]
    pub per_customer_limit: Option<i32>,
    #[validate(range(min = 1, message = "Frequency count must be at least 1"))]
    pub frequency_count: Option<i32>,
    pub frequency_period: Option<FrequencyPeriod>,
    pub days_of_week: Option<DaysOfWeek>,
    pub starts_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub require_customer: Option<bool>,
}

fn code_pattern() -> &'static Regex {
    static CODE_RE: OnceLock<Regex> = OnceLock::new();
    CODE_RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]{2,31}$").expect("hard-coded pattern compiles")
    })
}

/// Normalize a public discount code to its stored form (uppercase)
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Cross-field validation of a discount definition
///
/// Configuration errors are rejected here, at creation/update time, so a
/// malformed rule never reaches the engine at checkout time.
pub fn validate_definition(
    code: Option<&str>,
    adjustments: &[AdjustmentEntry],
    frequency_count: Option<i32>,
    frequency_period: Option<FrequencyPeriod>,
    days_of_week: &DaysOfWeek,
    starts_at: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
) -> DiscountResult<()> {
    if let Some(code) = code {
        if !code_pattern().is_match(code.trim()) {
            return Err(DiscountError::InvalidDefinition(format!(
                "Code '{}' must be 3-32 characters of letters, digits, '-' or '_'",
                code
            )));
        }
    }

    if adjustments.is_empty() {
        return Err(DiscountError::InvalidDefinition(
            "At least one adjustment entry is required".to_string(),
        ));
    }

    for entry in adjustments {
        if entry.value <= Decimal::ZERO {
            return Err(DiscountError::InvalidDefinition(
                "Adjustment value must be positive".to_string(),
            ));
        }
        if entry.kind == AdjustmentKind::Percent && entry.value > Decimal::ONE_HUNDRED {
            return Err(DiscountError::InvalidDefinition(
                "Percentage adjustment cannot exceed 100%".to_string(),
            ));
        }
        if let Some(max_amount) = entry.max_amount {
            if max_amount <= Decimal::ZERO {
                return Err(DiscountError::InvalidDefinition(
                    "Adjustment cap must be positive".to_string(),
                ));
            }
        }
    }

    if frequency_count.is_some() != frequency_period.is_some() {
        return Err(DiscountError::InvalidDefinition(
            "Frequency count and period must be set together".to_string(),
        ));
    }

    if !days_of_week.any_enabled() {
        return Err(DiscountError::InvalidDefinition(
            "At least one day of the week must be enabled".to_string(),
        ));
    }

    if let (Some(starts_at), Some(expires_at)) = (starts_at, expires_at) {
        if starts_at > expires_at {
            return Err(DiscountError::InvalidDefinition(
                "Start date must not be after expiry date".to_string(),
            ));
        }
    }

    Ok(())
}
