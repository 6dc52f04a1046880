use axum::Router;

use crate::state::AppState;

pub mod auth;
pub mod categories;
pub mod contact;
pub mod customers;
pub mod doc;
pub mod health;
pub mod orders;
pub mod products;
pub mod stats;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/customer", customers::router())
        .nest("/products", products::router())
        .nest("/categories", categories::router())
        .nest("/subsections", categories::subsection_router())
        .nest("/contact", contact::router())
        .nest("/orders", orders::router())
        .nest("/me/orders", orders::me_router())
        .nest("/stats", stats::router())
}
