use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Checkout payload. `shipping`, `tax` and the item fields are accepted as
/// loose JSON values; anything non-numeric is coerced, not rejected.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    #[serde(default)]
    pub customer: OrderCustomerInput,
    pub payment_method: Option<String>,
    pub payment_status: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub shipping: serde_json::Value,
    #[serde(default)]
    pub tax: serde_json::Value,
    #[serde(default)]
    pub items: Vec<OrderItemInput>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderCustomerInput {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemInput {
    #[serde(default)]
    pub product_id: serde_json::Value,
    #[serde(default)]
    pub quantity: serde_json::Value,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderResponse {
    pub id: i64,
    pub order_number: String,
    pub total: i64,
    pub status: String,
    pub payment_status: String,
}

/// Row shape of the admin order listing: header fields plus the summed
/// item quantity, with the derived order number.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminOrderSummary {
    pub id: i64,
    pub order_number: String,
    pub customer: String,
    pub email: String,
    pub phone: String,
    pub items: i64,
    pub total: i64,
    pub status: String,
    pub payment_method: String,
    pub payment_status: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MyOrderSummary {
    pub id: i64,
    pub order_number: String,
    pub total: i64,
    pub status: String,
    pub payment_status: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderCustomer {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub street: String,
    pub city: String,
    pub region: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemView {
    pub id: i64,
    pub product_id: i64,
    pub name: String,
    pub quantity: i32,
    pub unit_price: i64,
    pub line_total: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    pub id: i64,
    pub order_number: String,
    pub customer: OrderCustomer,
    pub status: String,
    pub payment_method: String,
    pub payment_status: String,
    pub subtotal: i64,
    pub shipping: i64,
    pub tax: i64,
    pub total: i64,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItemView>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<AdminOrderSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MyOrderList {
    pub items: Vec<MyOrderSummary>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderRequest {
    pub status: Option<String>,
    pub payment_status: Option<String>,
}
