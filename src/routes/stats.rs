use axum::{Json, Router, extract::State, routing::get};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    middleware::auth::{AuthUser, ensure_admin},
    order_number::format_order_number,
    response::{ApiResponse, Meta},
    state::AppState,
};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopProduct {
    pub id: i64,
    pub name: String,
    pub price: i64,
    pub review_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecentOrder {
    pub id: i64,
    pub order_number: String,
    pub customer: String,
    pub total: i64,
    pub status: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecentContact {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub status: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsData {
    pub product_count: i64,
    pub category_count: i64,
    pub total_value: i64,
    pub top_products: Vec<TopProduct>,
    pub recent_orders: Vec<RecentOrder>,
    pub recent_contacts: Vec<RecentContact>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(stats))
}

#[utoipa::path(
    get,
    path = "/api/stats",
    responses(
        (status = 200, description = "Dashboard aggregates (admin only)", body = ApiResponse<StatsData>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Stats"
)]
pub async fn stats(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<StatsData>>> {
    ensure_admin(&user)?;

    let (product_count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
        .fetch_one(&state.pool)
        .await?;
    let (category_count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM categories")
        .fetch_one(&state.pool)
        .await?;
    let (total_value,): (i64,) = sqlx::query_as(
        "SELECT COALESCE(SUM(price * stock_count), 0)::int8 FROM products",
    )
    .fetch_one(&state.pool)
    .await?;

    let top_products = sqlx::query_as::<_, (i64, String, i64, i64)>(
        r#"
        SELECT p.id, p.name, p.price, COALESCE(rv.review_count, 0) AS review_count
        FROM products p
        LEFT JOIN (
            SELECT product_id, COUNT(*) AS review_count
            FROM reviews
            GROUP BY product_id
        ) rv ON rv.product_id = p.id
        ORDER BY review_count DESC, p.created_at DESC
        LIMIT 5
        "#,
    )
    .fetch_all(&state.pool)
    .await?
    .into_iter()
    .map(|(id, name, price, review_count)| TopProduct {
        id,
        name,
        price,
        review_count,
    })
    .collect();

    let recent_orders = sqlx::query_as::<_, (i64, String, i64, String, DateTime<Utc>)>(
        r#"
        SELECT id, customer_name, total, status, created_at
        FROM orders
        ORDER BY created_at DESC
        LIMIT 5
        "#,
    )
    .fetch_all(&state.pool)
    .await?
    .into_iter()
    .map(|(id, customer, total, status, date)| RecentOrder {
        id,
        order_number: format_order_number(id),
        customer,
        total,
        status,
        date,
    })
    .collect();

    let recent_contacts = sqlx::query_as::<_, (i64, String, String, Option<String>, String, DateTime<Utc>)>(
        r#"
        SELECT id, name, email, subject, status, created_at
        FROM contact_messages
        ORDER BY created_at DESC
        LIMIT 5
        "#,
    )
    .fetch_all(&state.pool)
    .await?
    .into_iter()
    .map(|(id, name, email, subject, status, date)| RecentContact {
        id,
        name,
        email,
        subject,
        status,
        date,
    })
    .collect();

    let data = StatsData {
        product_count,
        category_count,
        total_value,
        top_products,
        recent_orders,
        recent_contacts,
    };

    Ok(Json(ApiResponse::success("Stats", data, Some(Meta::empty()))))
}
