use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{AdminLoginRequest, AuthSession, CustomerLoginRequest, CustomerSignupRequest, SessionUser},
        orders::{
            AdminOrderSummary, MyOrderList, MyOrderSummary, OrderCustomer, OrderCustomerInput,
            OrderDetail, OrderItemInput, OrderItemView, OrderList, PlaceOrderRequest,
            PlaceOrderResponse, UpdateOrderRequest,
        },
        products::{CreateProductRequest, ProductList, UpdateProductRequest},
    },
    models::{Category, ContactMessage, Order, Product, Review, Subsection},
    response::{ApiResponse, Meta},
    routes::{
        auth, categories, contact, customers, health, orders, products as product_routes, stats,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::me,
        customers::signup,
        customers::login,
        customers::me,
        product_routes::list_products,
        product_routes::get_product,
        product_routes::create_product,
        product_routes::update_product,
        product_routes::delete_product,
        product_routes::list_reviews,
        product_routes::create_review,
        categories::list_categories,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        categories::list_subsections,
        categories::create_subsection,
        categories::update_subsection,
        categories::delete_subsection,
        contact::create_message,
        contact::list_messages,
        contact::update_message_status,
        orders::place_order,
        orders::list_all_orders,
        orders::get_order_admin,
        orders::update_order,
        orders::list_my_orders,
        orders::get_my_order,
        stats::stats
    ),
    components(
        schemas(
            health::HealthData,
            AdminLoginRequest,
            CustomerSignupRequest,
            CustomerLoginRequest,
            SessionUser,
            AuthSession,
            Product,
            Category,
            Subsection,
            Review,
            ContactMessage,
            Order,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            product_routes::CreateReviewRequest,
            product_routes::ReviewList,
            categories::CategoryRequest,
            categories::SubsectionRequest,
            categories::CategoryList,
            categories::SubsectionList,
            contact::CreateContactRequest,
            contact::UpdateContactStatusRequest,
            contact::ContactCreated,
            contact::ContactList,
            PlaceOrderRequest,
            OrderCustomerInput,
            OrderItemInput,
            PlaceOrderResponse,
            AdminOrderSummary,
            MyOrderSummary,
            OrderCustomer,
            OrderItemView,
            OrderDetail,
            OrderList,
            MyOrderList,
            UpdateOrderRequest,
            stats::TopProduct,
            stats::RecentOrder,
            stats::RecentContact,
            stats::StatsData,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<OrderDetail>,
            ApiResponse<OrderList>,
            ApiResponse<MyOrderList>,
            ApiResponse<PlaceOrderResponse>,
            ApiResponse<AuthSession>,
            ApiResponse<stats::StatsData>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Back-office authentication"),
        (name = "Customer", description = "Storefront accounts"),
        (name = "Products", description = "Catalog endpoints"),
        (name = "Reviews", description = "Product reviews"),
        (name = "Categories", description = "Category and subsection endpoints"),
        (name = "Contact", description = "Contact form endpoints"),
        (name = "Orders", description = "Checkout and order management"),
        (name = "Stats", description = "Back-office dashboard aggregates"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
