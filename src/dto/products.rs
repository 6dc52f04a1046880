use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Product;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub stock_count: Option<i32>,
    pub category_id: Option<i64>,
    pub subsection_id: Option<i64>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub image_labels: Vec<String>,
}

/// Partial update; array fields are replaced only when present in the body.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub stock_count: Option<i32>,
    pub category_id: Option<i64>,
    pub subsection_id: Option<i64>,
    pub images: Option<Vec<String>>,
    pub features: Option<Vec<String>>,
    pub image_labels: Option<Vec<String>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductList {
    pub items: Vec<Product>,
}
