use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::products::{CreateProductRequest, ProductList, UpdateProductRequest},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Product, Review},
    response::{ApiResponse, Meta},
    state::AppState,
};

// Product rows are always served joined with their category/subsection names
// and review aggregates.
const PRODUCT_SELECT: &str = r#"
    SELECT p.id, p.name, p.description, p.price, p.stock_count,
           p.category_id, p.subsection_id, p.images, p.features, p.image_labels,
           c.name AS category_name, c.slug AS category_slug,
           s.name AS subsection_name, s.slug AS subsection_slug,
           COALESCE(rv.review_count, 0) AS review_count,
           COALESCE(rv.rating_avg, 0)::float8 AS rating_avg,
           p.created_at
    FROM products p
    LEFT JOIN categories c ON p.category_id = c.id
    LEFT JOIN category_subsections s ON p.subsection_id = s.id
    LEFT JOIN (
        SELECT product_id, COUNT(*) AS review_count, AVG(rating) AS rating_avg
        FROM reviews
        GROUP BY product_id
    ) rv ON rv.product_id = p.id
"#;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReviewRequest {
    pub name: String,
    pub rating: Option<i32>,
    pub comment: String,
}

#[derive(Debug, serde::Serialize, ToSchema)]
pub struct ReviewList {
    pub items: Vec<Review>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products))
        .route("/", post(create_product))
        .route("/{id}", get(get_product))
        .route("/{id}", put(update_product))
        .route("/{id}", delete(delete_product))
        .route("/{id}/reviews", get(list_reviews))
        .route("/{id}/reviews", post(create_review))
}

async fn fetch_product(pool: &DbPool, id: i64) -> AppResult<Product> {
    let sql = format!("{PRODUCT_SELECT} WHERE p.id = $1");
    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    product.ok_or(AppError::NotFound)
}

#[utoipa::path(
    get,
    path = "/api/products",
    responses(
        (status = 200, description = "List products", body = ApiResponse<ProductList>)
    ),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let sql = format!("{PRODUCT_SELECT} ORDER BY p.created_at DESC");
    let items = sqlx::query_as::<_, Product>(&sql)
        .fetch_all(&state.pool)
        .await?;

    let total = items.len() as i64;
    let data = ProductList { items };
    Ok(Json(ApiResponse::success(
        "Products",
        data,
        Some(Meta::new(1, total, total)),
    )))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(
        ("id" = i64, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Get product", body = ApiResponse<Product>),
        (status = 404, description = "Product not found"),
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let product = fetch_product(&state.pool, id).await?;
    Ok(Json(ApiResponse::success("Product", product, None)))
}

#[utoipa::path(
    post,
    path = "/api/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Create product", body = ApiResponse<Product>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateProductRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Product>>)> {
    ensure_admin(&user)?;

    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Name is required".into()));
    }

    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO products
            (name, description, price, stock_count, category_id, subsection_id,
             images, features, image_labels)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING id
        "#,
    )
    .bind(name)
    .bind(payload.description)
    .bind(payload.price.unwrap_or(0))
    .bind(payload.stock_count.unwrap_or(0))
    .bind(payload.category_id)
    .bind(payload.subsection_id)
    .bind(&payload.images)
    .bind(&payload.features)
    .bind(&payload.image_labels)
    .fetch_one(&state.pool)
    .await?;

    let product = fetch_product(&state.pool, id).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.id),
        "admin",
        "product_created",
        Some("products"),
        Some(serde_json::json!({ "product_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Product created",
            product,
            Some(Meta::empty()),
        )),
    ))
}

#[utoipa::path(
    put,
    path = "/api/products/{id}",
    params(
        ("id" = i64, Path, description = "Product ID")
    ),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Updated product", body = ApiResponse<Product>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateProductRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    ensure_admin(&user)?;

    let existing = fetch_product(&state.pool, id).await?;

    let name = payload.name.unwrap_or(existing.name);
    let description = payload.description.or(existing.description);
    let price = payload.price.unwrap_or(existing.price);
    let stock_count = payload.stock_count.unwrap_or(existing.stock_count);
    let category_id = payload.category_id.or(existing.category_id);
    let subsection_id = payload.subsection_id.or(existing.subsection_id);
    // Array fields are replaced only when the body carries them.
    let images = payload.images.unwrap_or(existing.images);
    let features = payload.features.unwrap_or(existing.features);
    let image_labels = payload.image_labels.unwrap_or(existing.image_labels);

    sqlx::query(
        r#"
        UPDATE products
        SET name = $2, description = $3, price = $4, stock_count = $5,
            category_id = $6, subsection_id = $7,
            images = $8, features = $9, image_labels = $10
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(description)
    .bind(price)
    .bind(stock_count)
    .bind(category_id)
    .bind(subsection_id)
    .bind(&images)
    .bind(&features)
    .bind(&image_labels)
    .execute(&state.pool)
    .await?;

    let product = fetch_product(&state.pool, id).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.id),
        "admin",
        "product_updated",
        Some("products"),
        Some(serde_json::json!({ "product_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(Json(ApiResponse::success(
        "Updated",
        product,
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    params(
        ("id" = i64, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Deleted product"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    ensure_admin(&user)?;

    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.id),
        "admin",
        "product_deleted",
        Some("products"),
        Some(serde_json::json!({ "product_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(Json(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}/reviews",
    params(
        ("id" = i64, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "List reviews", body = ApiResponse<ReviewList>)
    ),
    tag = "Reviews"
)]
pub async fn list_reviews(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<ReviewList>>> {
    let items = sqlx::query_as::<_, Review>(
        r#"
        SELECT id, product_id, name, rating, comment, created_at
        FROM reviews
        WHERE product_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(ApiResponse::success(
        "Reviews",
        ReviewList { items },
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    post,
    path = "/api/products/{id}/reviews",
    params(
        ("id" = i64, Path, description = "Product ID")
    ),
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Create review", body = ApiResponse<Review>),
        (status = 400, description = "Invalid review"),
    ),
    tag = "Reviews"
)]
pub async fn create_review(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<CreateReviewRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Review>>)> {
    let name = payload.name.trim();
    let comment = payload.comment.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Name is required".into()));
    }
    if comment.is_empty() {
        return Err(AppError::BadRequest("Comment is required".into()));
    }
    let rating = match payload.rating {
        Some(r) if (1..=5).contains(&r) => r,
        _ => return Err(AppError::BadRequest("Rating must be 1-5".into())),
    };

    let review = sqlx::query_as::<_, Review>(
        r#"
        INSERT INTO reviews (product_id, name, rating, comment)
        VALUES ($1, $2, $3, $4)
        RETURNING id, product_id, name, rating, comment, created_at
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(rating)
    .bind(comment)
    .fetch_one(&state.pool)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Review created",
            review,
            Some(Meta::empty()),
        )),
    ))
}
