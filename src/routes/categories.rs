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
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Category, Subsection},
    response::{ApiResponse, Meta},
    state::AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CategoryRequest {
    pub name: String,
    pub slug: String,
    pub image: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SubsectionRequest {
    pub name: String,
    pub slug: String,
}

#[derive(Debug, serde::Serialize, ToSchema)]
pub struct CategoryList {
    pub items: Vec<Category>,
}

#[derive(Debug, serde::Serialize, ToSchema)]
pub struct SubsectionList {
    pub items: Vec<Subsection>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories))
        .route("/", post(create_category))
        .route("/{id}", put(update_category))
        .route("/{id}", delete(delete_category))
        .route("/{id}/subsections", get(list_subsections))
        .route("/{id}/subsections", post(create_subsection))
}

pub fn subsection_router() -> Router<AppState> {
    Router::new()
        .route("/{id}", put(update_subsection))
        .route("/{id}", delete(delete_subsection))
}

#[utoipa::path(
    get,
    path = "/api/categories",
    responses(
        (status = 200, description = "List categories with product counts", body = ApiResponse<CategoryList>)
    ),
    tag = "Categories"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<CategoryList>>> {
    let items = sqlx::query_as::<_, Category>(
        r#"
        SELECT c.id, c.name, c.slug, c.image, COUNT(p.id) AS product_count, c.created_at
        FROM categories c
        LEFT JOIN products p ON p.category_id = c.id
        GROUP BY c.id
        ORDER BY c.name
        "#,
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(ApiResponse::success(
        "Categories",
        CategoryList { items },
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    post,
    path = "/api/categories",
    request_body = CategoryRequest,
    responses(
        (status = 201, description = "Create category", body = ApiResponse<Category>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Categories"
)]
pub async fn create_category(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CategoryRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Category>>)> {
    ensure_admin(&user)?;
    validate_name_slug(&payload.name, &payload.slug)?;

    let category = sqlx::query_as::<_, Category>(
        r#"
        INSERT INTO categories (name, slug, image)
        VALUES ($1, $2, $3)
        RETURNING id, name, slug, image, 0::int8 AS product_count, created_at
        "#,
    )
    .bind(payload.name.trim())
    .bind(payload.slug.trim())
    .bind(payload.image)
    .fetch_one(&state.pool)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.id),
        "admin",
        "category_created",
        Some("categories"),
        Some(serde_json::json!({ "category_id": category.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Category created",
            category,
            Some(Meta::empty()),
        )),
    ))
}

#[utoipa::path(
    put,
    path = "/api/categories/{id}",
    params(("id" = i64, Path, description = "Category ID")),
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "Update category", body = ApiResponse<Category>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Category not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Categories"
)]
pub async fn update_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<CategoryRequest>,
) -> AppResult<Json<ApiResponse<Category>>> {
    ensure_admin(&user)?;
    validate_name_slug(&payload.name, &payload.slug)?;

    let category = sqlx::query_as::<_, Category>(
        r#"
        UPDATE categories
        SET name = $2, slug = $3, image = $4
        WHERE id = $1
        RETURNING id, name, slug, image,
                  (SELECT COUNT(*) FROM products WHERE category_id = categories.id) AS product_count,
                  created_at
        "#,
    )
    .bind(id)
    .bind(payload.name.trim())
    .bind(payload.slug.trim())
    .bind(payload.image)
    .fetch_optional(&state.pool)
    .await?;
    let category = match category {
        Some(c) => c,
        None => return Err(AppError::NotFound),
    };

    Ok(Json(ApiResponse::success(
        "Updated",
        category,
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    params(("id" = i64, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Deleted category"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Category not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Categories"
)]
pub async fn delete_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    ensure_admin(&user)?;

    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    Ok(Json(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    get,
    path = "/api/categories/{id}/subsections",
    params(("id" = i64, Path, description = "Category ID")),
    responses(
        (status = 200, description = "List subsections", body = ApiResponse<SubsectionList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Categories"
)]
pub async fn list_subsections(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<SubsectionList>>> {
    ensure_admin(&user)?;

    let items = sqlx::query_as::<_, Subsection>(
        r#"
        SELECT id, category_id, name, slug, created_at
        FROM category_subsections
        WHERE category_id = $1
        ORDER BY name
        "#,
    )
    .bind(id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(ApiResponse::success(
        "Subsections",
        SubsectionList { items },
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    post,
    path = "/api/categories/{id}/subsections",
    params(("id" = i64, Path, description = "Category ID")),
    request_body = SubsectionRequest,
    responses(
        (status = 201, description = "Create subsection", body = ApiResponse<Subsection>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Categories"
)]
pub async fn create_subsection(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<SubsectionRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Subsection>>)> {
    ensure_admin(&user)?;
    validate_name_slug(&payload.name, &payload.slug)?;

    let subsection = sqlx::query_as::<_, Subsection>(
        r#"
        INSERT INTO category_subsections (category_id, name, slug)
        VALUES ($1, $2, $3)
        RETURNING id, category_id, name, slug, created_at
        "#,
    )
    .bind(id)
    .bind(payload.name.trim())
    .bind(payload.slug.trim())
    .fetch_one(&state.pool)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Subsection created",
            subsection,
            Some(Meta::empty()),
        )),
    ))
}

#[utoipa::path(
    put,
    path = "/api/subsections/{id}",
    params(("id" = i64, Path, description = "Subsection ID")),
    request_body = SubsectionRequest,
    responses(
        (status = 200, description = "Update subsection", body = ApiResponse<Subsection>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Subsection not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Categories"
)]
pub async fn update_subsection(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<SubsectionRequest>,
) -> AppResult<Json<ApiResponse<Subsection>>> {
    ensure_admin(&user)?;
    validate_name_slug(&payload.name, &payload.slug)?;

    let subsection = sqlx::query_as::<_, Subsection>(
        r#"
        UPDATE category_subsections
        SET name = $2, slug = $3
        WHERE id = $1
        RETURNING id, category_id, name, slug, created_at
        "#,
    )
    .bind(id)
    .bind(payload.name.trim())
    .bind(payload.slug.trim())
    .fetch_optional(&state.pool)
    .await?;
    let subsection = match subsection {
        Some(s) => s,
        None => return Err(AppError::NotFound),
    };

    Ok(Json(ApiResponse::success(
        "Updated",
        subsection,
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    delete,
    path = "/api/subsections/{id}",
    params(("id" = i64, Path, description = "Subsection ID")),
    responses(
        (status = 200, description = "Deleted subsection"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Subsection not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Categories"
)]
pub async fn delete_subsection(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    ensure_admin(&user)?;

    let result = sqlx::query("DELETE FROM category_subsections WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    Ok(Json(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    )))
}

fn validate_name_slug(name: &str, slug: &str) -> Result<(), AppError> {
    if name.trim().is_empty() || slug.trim().is_empty() {
        return Err(AppError::BadRequest("Name and slug are required".into()));
    }
    Ok(())
}
