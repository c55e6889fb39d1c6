// HTTP handlers for discount rule administration

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::discounts::error::DiscountError;
use crate::discounts::models::{CreateDiscountRequest, Discount, UpdateDiscountRequest};
use crate::AppState;

/// Query parameters for GET /api/discounts
#[derive(Debug, Deserialize)]
pub struct ListDiscountsParams {
    /// Include archived rules in the listing
    #[serde(default)]
    pub include_archived: bool,
}

/// Handler for POST /api/discounts
/// Creates a new discount/surcharge rule
pub async fn create_discount(
    State(state): State<AppState>,
    Json(payload): Json<CreateDiscountRequest>,
) -> Result<(StatusCode, Json<Discount>), DiscountError> {
    tracing::debug!("Creating discount: {}", payload.name);
    payload.validate()?;

    let discount = state.engine.repository().create(&payload).await?;

    tracing::info!("Created discount {} ({})", discount.name, discount.id);
    Ok((StatusCode::CREATED, Json(discount)))
}

/// Handler for GET /api/discounts
pub async fn list_discounts(
    State(state): State<AppState>,
    Query(params): Query<ListDiscountsParams>,
) -> Result<Json<Vec<Discount>>, DiscountError> {
    let discounts = state
        .engine
        .repository()
        .list(params.include_archived)
        .await?;

    tracing::debug!("Retrieved {} discounts", discounts.len());
    Ok(Json(discounts))
}

/// Handler for GET /api/discounts/:id
pub async fn get_discount(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Discount>, DiscountError> {
    let discount = state
        .engine
        .repository()
        .find_by_id(id)
        .await?
        .ok_or(DiscountError::NotFound(id))?;

    Ok(Json(discount))
}

/// Handler for PUT /api/discounts/:id
pub async fn update_discount(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDiscountRequest>,
) -> Result<Json<Discount>, DiscountError> {
    payload.validate()?;

    let discount = state.engine.repository().update(id, &payload).await?;

    tracing::info!("Updated discount {}", id);
    Ok(Json(discount))
}

/// Handler for DELETE /api/discounts/:id
/// Archives the rule instead of deleting it; past usage records stay
/// resolvable and the rule immediately stops being eligible
pub async fn archive_discount(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Discount>, DiscountError> {
    let discount = state.engine.repository().archive(id).await?;

    tracing::info!("Archived discount {}", id);
    Ok(Json(discount))
}
