use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait};
use serde_json::Value;

use crate::{
    audit::log_audit,
    dto::orders::{
        MyOrderList, MyOrderSummary, OrderCustomer, OrderDetail, OrderItemInput, OrderItemView,
        PlaceOrderRequest, PlaceOrderResponse,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_customer},
    models::{Order, OrderItem},
    order_number::{format_order_number, parse_order_number},
    response::{ApiResponse, Meta},
    state::AppState,
    entity::{
        order_items::ActiveModel as OrderItemActive,
        orders::ActiveModel as OrderActive,
        products::{Column as ProdCol, Entity as Products},
    },
};

/// An order line that survived payload normalization: a resolvable product id
/// and a strictly positive quantity.
#[derive(Debug, PartialEq, Eq)]
pub struct NormalizedItem {
    pub product_id: i64,
    pub quantity: i32,
}

/// Lenient numeric coercion for optional payload fields: JSON numbers
/// (including integral floats) and numeric strings are accepted, everything
/// else resolves to `None`.
pub fn coerce_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            let f = n.as_f64()?;
            if f.is_finite() && f.fract() == 0.0 && (i64::MIN as f64..=i64::MAX as f64).contains(&f)
            {
                Some(f as i64)
            } else {
                None
            }
        }),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<i64>().ok()
        }
        _ => None,
    }
}

/// Drop lines with a missing/non-positive product id or quantity. Dropped
/// lines disappear silently; they are never zero-filled or merged.
pub fn normalize_items(items: &[OrderItemInput]) -> Vec<NormalizedItem> {
    items
        .iter()
        .filter_map(|item| {
            let product_id = coerce_i64(&item.product_id).filter(|id| *id > 0)?;
            let quantity = coerce_i64(&item.quantity)
                .filter(|q| *q > 0 && *q <= i32::MAX as i64)? as i32;
            Some(NormalizedItem {
                product_id,
                quantity,
            })
        })
        .collect()
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

/// Validate the checkout payload, price it against the live catalog, and
/// atomically persist the order header plus its lines.
///
/// The product lookup, header insert, and line inserts share one transaction;
/// an unknown product id or any storage failure rolls the whole order back.
/// Prices always come from the product rows read inside the transaction, never
/// from the client. Stock is not reserved or decremented here.
pub async fn place_order(
    state: &AppState,
    user: &AuthUser,
    payload: PlaceOrderRequest,
) -> AppResult<ApiResponse<PlaceOrderResponse>> {
    ensure_customer(user)?;

    let customer_name = non_empty(payload.customer.full_name.as_deref())
        .or_else(|| non_empty(user.name.as_deref()));
    let email =
        non_empty(payload.customer.email.as_deref()).or_else(|| non_empty(user.email.as_deref()));
    let phone = non_empty(payload.customer.phone.as_deref());
    let street = non_empty(payload.customer.street.as_deref());
    let city = non_empty(payload.customer.city.as_deref());
    let region = non_empty(payload.customer.region.as_deref());

    let (customer_name, email, phone, street, city) =
        match (customer_name, email, phone, street, city) {
            (Some(n), Some(e), Some(p), Some(s), Some(c)) => (n, e, p, s, c),
            _ => {
                return Err(AppError::BadRequest(
                    "Missing required customer fields".into(),
                ));
            }
        };

    let payment_method = non_empty(payload.payment_method.as_deref())
        .ok_or_else(|| AppError::BadRequest("Payment method is required".into()))?;
    let payment_status =
        non_empty(payload.payment_status.as_deref()).unwrap_or_else(|| "pending".into());
    let status = non_empty(payload.status.as_deref()).unwrap_or_else(|| "pending".into());

    // Optional money fields are lenient: anything non-numeric means zero.
    let shipping = coerce_i64(&payload.shipping).unwrap_or(0).max(0);
    let tax = coerce_i64(&payload.tax).unwrap_or(0).max(0);

    if payload.items.is_empty() {
        return Err(AppError::BadRequest("Order items are required".into()));
    }
    let items = normalize_items(&payload.items);
    if items.is_empty() {
        return Err(AppError::BadRequest("Invalid order items".into()));
    }

    let txn = state.orm.begin().await?;

    let product_ids: Vec<i64> = items
        .iter()
        .map(|i| i.product_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    // One batch lookup for the whole cart; a missing id aborts the order.
    let products: HashMap<i64, (String, i64)> = Products::find()
        .filter(ProdCol::Id.is_in(product_ids))
        .all(&txn)
        .await?
        .into_iter()
        .map(|p| (p.id, (p.name, p.price)))
        .collect();

    let mut subtotal: i64 = 0;
    let mut lines = Vec::with_capacity(items.len());
    for item in &items {
        let (name, unit_price) = products
            .get(&item.product_id)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown product id: {}", item.product_id)))?;
        let line_total = unit_price * item.quantity as i64;
        subtotal += line_total;
        lines.push((item.product_id, name.clone(), item.quantity, *unit_price, line_total));
    }

    let total = subtotal + shipping + tax;

    let order = OrderActive {
        id: NotSet,
        customer_id: Set(Some(user.id)),
        customer_name: Set(customer_name),
        email: Set(email),
        phone: Set(phone),
        street: Set(street),
        city: Set(city),
        region: Set(region),
        status: Set(status.clone()),
        payment_method: Set(payment_method),
        payment_status: Set(payment_status.clone()),
        subtotal: Set(subtotal),
        shipping: Set(shipping),
        tax: Set(tax),
        total: Set(total),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    for (product_id, product_name, quantity, unit_price, line_total) in lines {
        OrderItemActive {
            id: NotSet,
            order_id: Set(order.id),
            product_id: Set(product_id),
            product_name: Set(product_name),
            quantity: Set(quantity),
            unit_price: Set(unit_price),
            line_total: Set(line_total),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.id),
        "customer",
        "order_placed",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "total": total })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order placed",
        PlaceOrderResponse {
            id: order.id,
            order_number: format_order_number(order.id),
            total,
            status,
            payment_status,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_my_orders(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<MyOrderList>> {
    ensure_customer(user)?;

    let rows: Vec<(i64, i64, String, String, DateTime<Utc>)> = sqlx::query_as(
        r#"
        SELECT id, total, status, payment_status, created_at
        FROM orders
        WHERE customer_id = $1
        ORDER BY created_at DESC
        LIMIT 200
        "#,
    )
    .bind(user.id)
    .fetch_all(&state.pool)
    .await?;

    let items = rows
        .into_iter()
        .map(|(id, total, status, payment_status, date)| MyOrderSummary {
            id,
            order_number: format_order_number(id),
            total,
            status,
            payment_status,
            date,
        })
        .collect();

    Ok(ApiResponse::success(
        "Ok",
        MyOrderList { items },
        Some(Meta::empty()),
    ))
}

pub async fn get_my_order(
    state: &AppState,
    user: &AuthUser,
    order_number: &str,
) -> AppResult<ApiResponse<OrderDetail>> {
    ensure_customer(user)?;

    let order_id = parse_order_number(order_number)
        .ok_or_else(|| AppError::BadRequest("Invalid order number".into()))?;

    let order = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE id = $1 AND customer_id = $2",
    )
    .bind(order_id)
    .bind(user.id)
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
        "Ok",
        build_order_detail(order, items),
        Some(Meta::empty()),
    ))
}

pub(crate) fn build_order_detail(order: Order, items: Vec<OrderItem>) -> OrderDetail {
    OrderDetail {
        id: order.id,
        order_number: format_order_number(order.id),
        customer: OrderCustomer {
            name: order.customer_name,
            email: order.email,
            phone: order.phone,
            street: order.street,
            city: order.city,
            region: order.region,
        },
        status: order.status,
        payment_method: order.payment_method,
        payment_status: order.payment_status,
        subtotal: order.subtotal,
        shipping: order.shipping,
        tax: order.tax,
        total: order.total,
        created_at: order.created_at,
        items: items
            .into_iter()
            .map(|it| OrderItemView {
                id: it.id,
                product_id: it.product_id,
                name: it.product_name,
                quantity: it.quantity,
                unit_price: it.unit_price,
                line_total: it.line_total,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(product_id: Value, quantity: Value) -> OrderItemInput {
        OrderItemInput {
            product_id,
            quantity,
        }
    }

    #[test]
    fn coerces_numbers_and_numeric_strings() {
        assert_eq!(coerce_i64(&json!(42)), Some(42));
        assert_eq!(coerce_i64(&json!(-3)), Some(-3));
        assert_eq!(coerce_i64(&json!(7.0)), Some(7));
        assert_eq!(coerce_i64(&json!("19")), Some(19));
        assert_eq!(coerce_i64(&json!(" 5 ")), Some(5));
    }

    #[test]
    fn coercion_rejects_non_numeric_values() {
        assert_eq!(coerce_i64(&Value::Null), None);
        assert_eq!(coerce_i64(&json!("")), None);
        assert_eq!(coerce_i64(&json!("abc")), None);
        assert_eq!(coerce_i64(&json!(2.5)), None);
        assert_eq!(coerce_i64(&json!(true)), None);
        assert_eq!(coerce_i64(&json!([1])), None);
    }

    #[test]
    fn drops_invalid_lines_keeps_valid_ones() {
        let items = vec![
            item(json!(7), json!(2)),
            item(json!(7), json!(-1)),
            item(json!(0), json!(3)),
            item(Value::Null, json!(1)),
            item(json!(9), json!("abc")),
        ];
        let normalized = normalize_items(&items);
        assert_eq!(
            normalized,
            vec![NormalizedItem {
                product_id: 7,
                quantity: 2
            }]
        );
    }

    #[test]
    fn duplicate_product_lines_are_kept_separate() {
        let items = vec![item(json!(4), json!(1)), item(json!(4), json!(2))];
        let normalized = normalize_items(&items);
        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized[0].quantity, 1);
        assert_eq!(normalized[1].quantity, 2);
    }

    #[test]
    fn all_invalid_lines_normalize_to_empty() {
        let items = vec![item(json!("x"), json!(2)), item(json!(3), json!(0))];
        assert!(normalize_items(&items).is_empty());
    }
}
