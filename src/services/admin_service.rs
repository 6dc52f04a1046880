use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};

use crate::{
    audit::log_audit,
    dto::orders::{AdminOrderSummary, OrderDetail, OrderList, UpdateOrderRequest},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Order, OrderItem},
    order_number::format_order_number,
    response::{ApiResponse, Meta},
    services::order_service::build_order_detail,
    state::AppState,
    entity::orders::{ActiveModel as OrderActive, Entity as Orders, Model as OrderModel},
};

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;

    #[allow(clippy::type_complexity)]
    let rows: Vec<(
        i64,
        String,
        String,
        String,
        i64,
        i64,
        String,
        String,
        String,
        DateTime<Utc>,
    )> = sqlx::query_as(
        r#"
        SELECT
            o.id,
            o.customer_name,
            o.email,
            o.phone,
            COALESCE(SUM(oi.quantity), 0)::int8 AS items_qty,
            o.total,
            o.status,
            o.payment_method,
            o.payment_status,
            o.created_at
        FROM orders o
        LEFT JOIN order_items oi ON oi.order_id = o.id
        GROUP BY o.id
        ORDER BY o.created_at DESC
        LIMIT 200
        "#,
    )
    .fetch_all(&state.pool)
    .await?;

    let items = rows
        .into_iter()
        .map(
            |(id, customer, email, phone, items, total, status, payment_method, payment_status, date)| {
                AdminOrderSummary {
                    id,
                    order_number: format_order_number(id),
                    customer,
                    email,
                    phone,
                    items,
                    total,
                    status,
                    payment_method,
                    payment_status,
                    date,
                }
            },
        )
        .collect();

    Ok(ApiResponse::success(
        "Orders",
        OrderList { items },
        Some(Meta::empty()),
    ))
}

pub async fn get_order_admin(
    state: &AppState,
    user: &AuthUser,
    id: i64,
) -> AppResult<ApiResponse<OrderDetail>> {
    ensure_admin(user)?;

    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let items = sqlx::query_as::<_, OrderItem>(
        "SELECT * FROM order_items WHERE order_id = $1 ORDER BY id ASC",
    )
    .bind(order.id)
    .fetch_all(&state.pool)
    .await?;

    Ok(ApiResponse::success(
        "Order found",
        build_order_detail(order, items),
        Some(Meta::empty()),
    ))
}

/// Post-hoc mutation of `status` / `payment_status` only. Totals and items
/// are never recomputed here.
pub async fn update_order(
    state: &AppState,
    user: &AuthUser,
    id: i64,
    payload: UpdateOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;

    let next_status = payload
        .status
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned);
    let next_payment_status = payload
        .payment_status
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned);

    if next_status.is_none() && next_payment_status.is_none() {
        return Err(AppError::BadRequest("No fields to update".into()));
    }

    let existing = Orders::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let mut active: OrderActive = existing.into();
    if let Some(status) = next_status {
        active.status = Set(status);
    }
    if let Some(payment_status) = next_payment_status {
        active.payment_status = Set(payment_status);
    }
    let order = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.id),
        "admin",
        "order_updated",
        Some("orders"),
        Some(serde_json::json!({
            "order_id": order.id,
            "status": order.status,
            "payment_status": order.payment_status,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order updated",
        order_from_entity(order),
        Some(Meta::empty()),
    ))
}

fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        customer_id: model.customer_id,
        customer_name: model.customer_name,
        email: model.email,
        phone: model.phone,
        street: model.street,
        city: model.city,
        region: model.region,
        status: model.status,
        payment_method: model.payment_method,
        payment_status: model.payment_status,
        subtotal: model.subtotal,
        shipping: model.shipping,
        tax: model.tax,
        total: model.total,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
