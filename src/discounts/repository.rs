// Repository for discount rule definitions
//
// Structured sub-objects (scopes, adjustment entries, day map) live in
// JSONB columns; everything else is a plain column. Discounts are archived
// rather than deleted so historical usage records stay resolvable.

use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::discounts::error::{DiscountError, DiscountResult};
use crate::discounts::models::{
    normalize_code, validate_definition, CreateDiscountRequest, Discount, UpdateDiscountRequest,
};

/// Repository for discount CRUD
#[derive(Clone)]
pub struct DiscountRepository {
    pool: PgPool,
}

impl DiscountRepository {
    /// Create a new DiscountRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new discount rule
    ///
    /// The definition is validated here so a malformed rule never reaches
    /// the engine at checkout time.
    pub async fn create(&self, request: &CreateDiscountRequest) -> DiscountResult<Discount> {
        validate_definition(
            request.code.as_deref(),
            &request.adjustments,
            request.frequency_count,
            request.frequency_period,
            &request.days_of_week,
            request.starts_at,
            request.expires_at,
        )?;

        let code = request.code.as_deref().map(normalize_code);
        if let Some(ref code) = code {
            if self.code_in_use(code, None).await? {
                return Err(DiscountError::DuplicateCode(code.clone()));
            }
        }

        let query = format!(
            r#"
            INSERT INTO discounts
                (id, name, code, description, mode, musts, adjustments, usage_limit,
                 per_customer_limit, frequency_count, frequency_period, days_of_week,
                 starts_at, expires_at, require_customer)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING {}
            "#,
            Discount::COLUMNS
        );

        let discount = sqlx::query_as::<_, Discount>(&query)
            .bind(Uuid::new_v4())
            .bind(&request.name)
            .bind(code)
            .bind(&request.description)
            .bind(request.mode)
            .bind(Json(&request.musts))
            .bind(Json(&request.adjustments))
            .bind(request.usage_limit)
            .bind(request.per_customer_limit)
            .bind(request.frequency_count)
            .bind(request.frequency_period)
            .bind(Json(&request.days_of_week))
            .bind(request.starts_at)
            .bind(request.expires_at)
            .bind(request.require_customer)
            .fetch_one(&self.pool)
            .await?;

        Ok(discount)
    }

    /// Find a discount by ID
    pub async fn find_by_id(&self, id: Uuid) -> DiscountResult<Option<Discount>> {
        let query = format!("SELECT {} FROM discounts WHERE id = $1", Discount::COLUMNS);
        let discount = sqlx::query_as::<_, Discount>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(discount)
    }

    /// Find a discount by its public code (case-insensitive)
    pub async fn find_by_code(&self, code: &str) -> DiscountResult<Option<Discount>> {
        let query = format!("SELECT {} FROM discounts WHERE code = $1", Discount::COLUMNS);
        let discount = sqlx::query_as::<_, Discount>(&query)
            .bind(normalize_code(code))
            .fetch_optional(&self.pool)
            .await?;

        Ok(discount)
    }

    /// List discounts, newest first
    pub async fn list(&self, include_archived: bool) -> DiscountResult<Vec<Discount>> {
        let query = if include_archived {
            format!(
                "SELECT {} FROM discounts ORDER BY created_at DESC",
                Discount::COLUMNS
            )
        } else {
            format!(
                "SELECT {} FROM discounts WHERE archived_at IS NULL ORDER BY created_at DESC",
                Discount::COLUMNS
            )
        };

        let discounts = sqlx::query_as::<_, Discount>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(discounts)
    }

    /// Update a discount, keeping current values for omitted fields
    pub async fn update(
        &self,
        id: Uuid,
        request: &UpdateDiscountRequest,
    ) -> DiscountResult<Discount> {
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or(DiscountError::NotFound(id))?;

        let name = request.name.clone().unwrap_or(existing.name);
        let code = match &request.code {
            Some(code) => Some(normalize_code(code)),
            None => existing.code,
        };
        let description = request.description.clone().or(existing.description);
        let musts = request.musts.clone().unwrap_or(existing.musts);
        let adjustments = request.adjustments.clone().unwrap_or(existing.adjustments);
        let usage_limit = request.usage_limit.or(existing.usage_limit);
        let per_customer_limit = request.per_customer_limit.or(existing.per_customer_limit);
        let frequency_count = request.frequency_count.or(existing.frequency_count);
        let frequency_period = request.frequency_period.or(existing.frequency_period);
        let days_of_week = request.days_of_week.unwrap_or(existing.days_of_week);
        let starts_at = request.starts_at.or(existing.starts_at);
        let expires_at = request.expires_at.or(existing.expires_at);
        let require_customer = request.require_customer.unwrap_or(existing.require_customer);

        validate_definition(
            code.as_deref(),
            &adjustments,
            frequency_count,
            frequency_period,
            &days_of_week,
            starts_at,
            expires_at,
        )?;

        if let Some(ref code) = code {
            if self.code_in_use(code, Some(id)).await? {
                return Err(DiscountError::DuplicateCode(code.clone()));
            }
        }

        let query = format!(
            r#"
            UPDATE discounts
            SET name = $1, code = $2, description = $3, musts = $4, adjustments = $5,
                usage_limit = $6, per_customer_limit = $7, frequency_count = $8,
                frequency_period = $9, days_of_week = $10, starts_at = $11,
                expires_at = $12, require_customer = $13, updated_at = NOW()
            WHERE id = $14
            RETURNING {}
            "#,
            Discount::COLUMNS
        );

        let discount = sqlx::query_as::<_, Discount>(&query)
            .bind(&name)
            .bind(&code)
            .bind(&description)
            .bind(Json(&musts))
            .bind(Json(&adjustments))
            .bind(usage_limit)
            .bind(per_customer_limit)
            .bind(frequency_count)
            .bind(frequency_period)
            .bind(Json(&days_of_week))
            .bind(starts_at)
            .bind(expires_at)
            .bind(require_customer)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(discount)
    }

    /// Archive a discount
    ///
    /// Soft delete: the rule stops being eligible immediately but stays
    /// referencable from past usage records. Archiving twice is a no-op.
    pub async fn archive(&self, id: Uuid) -> DiscountResult<Discount> {
        let query = format!(
            r#"
            UPDATE discounts
            SET archived_at = COALESCE(archived_at, NOW()), updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            Discount::COLUMNS
        );

        let discount = sqlx::query_as::<_, Discount>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DiscountError::NotFound(id))?;

        Ok(discount)
    }

    /// Whether a normalized code is taken by another discount
    async fn code_in_use(&self, code: &str, exclude_id: Option<Uuid>) -> DiscountResult<bool> {
        let exists: Option<bool> = match exclude_id {
            Some(exclude_id) => {
                sqlx::query_scalar(
                    "SELECT EXISTS(SELECT 1 FROM discounts WHERE code = $1 AND id != $2)",
                )
                .bind(code)
                .bind(exclude_id)
                .fetch_one(&self.pool)
                .await?
            }
            None => {
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM discounts WHERE code = $1)")
                    .bind(code)
                    .fetch_one(&self.pool)
                    .await?
            }
        };

        Ok(exists.unwrap_or(false))
    }
}
