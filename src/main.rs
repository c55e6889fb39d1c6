mod checkout;
mod customers;
mod db;
mod discounts;
mod error;
mod models;
mod query;
mod validation;

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use validator::Validate;

use discounts::AdjustmentEngine;
use error::ApiError;
use models::{Category, CreateCategory, CreateProduct, Product, UpdateProduct};
use query::{QueryParams, QueryValidator, SQLQueryBuilder};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        create_product,
        get_product_by_id,
        update_product,
        delete_product,
        create_category,
        get_all_categories,
    ),
    components(
        schemas(Product, CreateProduct, UpdateProduct, Category, CreateCategory)
    ),
    tags(
        (name = "catalog", description = "Product catalog management endpoints")
    ),
    info(
        title = "Gym POS API",
        version = "1.0.0",
        description = "Point-of-sale backend with a discount/adjustment rule engine",
    )
)]
struct ApiDoc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub engine: Arc<AdjustmentEngine>,
}

/// Handler for POST /api/products
/// Creates a new catalog product
#[utoipa::path(
    post,
    path = "/api/products",
    request_body = CreateProduct,
    responses(
        (status = 201, description = "Product created successfully", body = Product),
        (status = 400, description = "Invalid input data"),
        (status = 409, description = "Duplicate product name"),
        (status = 500, description = "Internal server error")
    ),
    tag = "catalog"
)]
async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProduct>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    tracing::debug!("Creating new product: {}", payload.name);

    payload.validate()?;
    validation::validate_price(payload.price).map_err(|_| ApiError::InvalidInput {
        message: "Price must not be negative".to_string(),
    })?;

    if db::check_duplicate_product(&state.db, &payload.name).await? {
        tracing::warn!("Attempt to create duplicate product: {}", payload.name);
        return Err(ApiError::Conflict {
            message: format!("Product with name '{}' already exists", payload.name),
        });
    }

    let product = sqlx::query_as::<_, Product>(
        r#"
        INSERT INTO products (name, category_id, price, description, active)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, name, category_id, price, description, active, created_at, updated_at
        "#,
    )
    .bind(&payload.name)
    .bind(payload.category_id)
    .bind(payload.price)
    .bind(&payload.description)
    .bind(payload.active.unwrap_or(true))
    .fetch_one(&state.db)
    .await?;

    tracing::info!("Successfully created product with id: {}", product.id);
    Ok((StatusCode::CREATED, Json(product)))
}

/// Handler for GET /api/products
/// Supports search, category and price filtering, sorting, and pagination
async fn get_products_with_query(
    Query(params): Query<QueryParams>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Product>>, ApiError> {
    tracing::debug!("Fetching products with query parameters: {:?}", params);

    let validated = QueryValidator::validate(params).map_err(|e| ApiError::InvalidInput {
        message: e.to_string(),
    })?;

    let mut builder = SQLQueryBuilder::new();

    if let Some(search) = validated.search {
        builder.add_search_filter(&search);
    }
    if let Some(category) = validated.category {
        builder.add_category_filter(category);
    }
    builder.add_price_range(validated.min_price, validated.max_price);
    if validated.active_only {
        builder.add_active_only();
    }

    if let Some(sort_field) = validated.sort_field {
        builder.set_sort(sort_field, validated.sort_order);
    }
    builder.set_pagination(validated.page, validated.limit);

    let (query_str, params) = builder.build();

    let mut query = sqlx::query_as::<_, Product>(&query_str);
    for param in params {
        query = query.bind(param);
    }

    let products = query.fetch_all(&state.db).await?;

    tracing::debug!("Query returned {} products", products.len());
    Ok(Json(products))
}

/// Handler for GET /api/products/:id
/// Retrieves a specific product by ID
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(
        ("id" = i32, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product found", body = Product),
        (status = 404, description = "Product not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "catalog"
)]
async fn get_product_by_id(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Product>, ApiError> {
    tracing::debug!("Fetching product with id: {}", id);

    let product = sqlx::query_as::<_, Product>(
        r#"
        SELECT id, name, category_id, price, description, active, created_at, updated_at
        FROM products
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| {
        tracing::debug!("Product with id {} not found", id);
        ApiError::NotFound {
            resource: "Product".to_string(),
            id: id.to_string(),
        }
    })?;

    Ok(Json(product))
}

/// Handler for PUT /api/products/:id
/// Updates an existing product
#[utoipa::path(
    put,
    path = "/api/products/{id}",
    params(
        ("id" = i32, Path, description = "Product ID")
    ),
    request_body = UpdateProduct,
    responses(
        (status = 200, description = "Product updated successfully", body = Product),
        (status = 400, description = "Invalid input data"),
        (status = 404, description = "Product not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "catalog"
)]
async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateProduct>,
) -> Result<Json<Product>, ApiError> {
    tracing::debug!("Updating product with id: {}", id);

    payload.validate()?;
    if let Some(price) = payload.price {
        validation::validate_price(price).map_err(|_| ApiError::InvalidInput {
            message: "Price must not be negative".to_string(),
        })?;
    }

    // Transaction keeps the duplicate check and update atomic
    let mut tx = state.db.begin().await?;

    let existing = sqlx::query_as::<_, Product>(
        r#"
        SELECT id, name, category_id, price, description, active, created_at, updated_at
        FROM products
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::NotFound {
        resource: "Product".to_string(),
        id: id.to_string(),
    })?;

    if let Some(ref new_name) = payload.name {
        if new_name != &existing.name {
            let duplicate_exists: Option<bool> = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM products WHERE name = $1 AND id != $2)",
            )
            .bind(new_name)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

            if duplicate_exists.unwrap_or(false) {
                tracing::warn!("Attempt to rename product {} to duplicate name: {}", id, new_name);
                return Err(ApiError::Conflict {
                    message: format!("Product with name '{}' already exists", new_name),
                });
            }
        }
    }

    let updated = sqlx::query_as::<_, Product>(
        r#"
        UPDATE products
        SET name = $1,
            category_id = $2,
            price = $3,
            description = $4,
            active = $5,
            updated_at = NOW()
        WHERE id = $6
        RETURNING id, name, category_id, price, description, active, created_at, updated_at
        "#,
    )
    .bind(payload.name.unwrap_or(existing.name))
    .bind(payload.category_id.or(existing.category_id))
    .bind(payload.price.unwrap_or(existing.price))
    .bind(payload.description.unwrap_or(existing.description))
    .bind(payload.active.unwrap_or(existing.active))
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!("Successfully updated product with id: {}", id);
    Ok(Json(updated))
}

/// Handler for DELETE /api/products/:id
#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    params(
        ("id" = i32, Path, description = "Product ID")
    ),
    responses(
        (status = 204, description = "Product deleted successfully"),
        (status = 404, description = "Product not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "catalog"
)]
async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    tracing::debug!("Deleting product with id: {}", id);

    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound {
            resource: "Product".to_string(),
            id: id.to_string(),
        });
    }

    tracing::info!("Successfully deleted product with id: {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for POST /api/categories
#[utoipa::path(
    post,
    path = "/api/categories",
    request_body = CreateCategory,
    responses(
        (status = 201, description = "Category created successfully", body = Category),
        (status = 400, description = "Invalid input data"),
        (status = 409, description = "Duplicate category name"),
        (status = 500, description = "Internal server error")
    ),
    tag = "catalog"
)]
async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CreateCategory>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    payload.validate()?;

    if db::check_duplicate_category(&state.db, &payload.name).await? {
        return Err(ApiError::Conflict {
            message: format!("Category with name '{}' already exists", payload.name),
        });
    }

    let category = sqlx::query_as::<_, Category>(
        r#"
        INSERT INTO categories (name)
        VALUES ($1)
        RETURNING id, name, created_at
        "#,
    )
    .bind(&payload.name)
    .fetch_one(&state.db)
    .await?;

    tracing::info!("Successfully created category with id: {}", category.id);
    Ok((StatusCode::CREATED, Json(category)))
}

/// Handler for GET /api/categories
#[utoipa::path(
    get,
    path = "/api/categories",
    responses(
        (status = 200, description = "List of all categories", body = Vec<Category>),
        (status = 500, description = "Internal server error")
    ),
    tag = "catalog"
)]
async fn get_all_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, ApiError> {
    let categories = sqlx::query_as::<_, Category>(
        r#"
        SELECT id, name, created_at
        FROM categories
        ORDER BY name
        "#,
    )
    .fetch_all(&state.db)
    .await?;

    Ok(Json(categories))
}

/// Creates and configures the application router
/// Maps all API endpoints to their handlers and adds CORS middleware
fn create_router(db: PgPool) -> Router {
    use tower_http::cors::{Any, CorsLayer};

    let engine = Arc::new(AdjustmentEngine::new(db.clone()));
    let state = AppState { db, engine };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Catalog
        .route("/api/products", post(create_product))
        .route("/api/products", get(get_products_with_query))
        .route("/api/products/:id", get(get_product_by_id))
        .route("/api/products/:id", put(update_product))
        .route("/api/products/:id", delete(delete_product))
        .route("/api/categories", post(create_category))
        .route("/api/categories", get(get_all_categories))
        // Customers and store credit
        .route("/api/customers", post(customers::handlers::create_customer))
        .route("/api/customers", get(customers::handlers::list_customers))
        .route("/api/customers/:id", get(customers::handlers::get_customer))
        .route("/api/customers/:id", put(customers::handlers::update_customer))
        .route(
            "/api/customers/:id/credits",
            get(customers::handlers::get_credit_history),
        )
        .route(
            "/api/customers/:id/credits",
            post(customers::handlers::add_credit),
        )
        // Discount rules
        .route("/api/discounts", post(discounts::handlers::create_discount))
        .route("/api/discounts", get(discounts::handlers::list_discounts))
        .route("/api/discounts/:id", get(discounts::handlers::get_discount))
        .route("/api/discounts/:id", put(discounts::handlers::update_discount))
        .route(
            "/api/discounts/:id",
            delete(discounts::handlers::archive_discount),
        )
        // Checkout
        .route("/api/checkout/quote", post(checkout::handlers::quote))
        .route("/api/checkout/commit", post(checkout::handlers::commit))
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("Gym POS API - Starting...");

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());

    tracing::info!("Connecting to database...");
    let db_pool = db::create_pool(&database_url)
        .await
        .expect("Failed to create database pool");

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations completed successfully");

    let app = create_router(db_pool);

    let addr = format!("{}:{}", host, port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Gym POS API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app).await.expect("Server error");
}

#[cfg(test)]
mod tests;
