use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};

use crate::{
    dto::auth::{AuthSession, CustomerLoginRequest, CustomerSignupRequest, SessionUser},
    error::AppResult,
    middleware::auth::{AuthUser, ensure_customer},
    response::{ApiResponse, Meta},
    services::auth_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/me", get(me))
}

#[utoipa::path(
    post,
    path = "/api/customer/signup",
    request_body = CustomerSignupRequest,
    responses(
        (status = 201, description = "Customer account created", body = ApiResponse<AuthSession>),
        (status = 409, description = "Email already exists")
    ),
    tag = "Customer"
)]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<CustomerSignupRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<AuthSession>>)> {
    let resp = auth_service::customer_signup(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/api/customer/login",
    request_body = CustomerLoginRequest,
    responses(
        (status = 200, description = "Customer login", body = ApiResponse<AuthSession>),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Customer"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<CustomerLoginRequest>,
) -> AppResult<Json<ApiResponse<AuthSession>>> {
    let resp = auth_service::customer_login(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/customer/me",
    responses(
        (status = 200, description = "Current customer identity", body = ApiResponse<SessionUser>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Customer"
)]
pub async fn me(user: AuthUser) -> AppResult<Json<ApiResponse<SessionUser>>> {
    ensure_customer(&user)?;
    let data = SessionUser {
        id: user.id,
        name: user.name,
        email: user.email,
        role: user.role,
    };
    Ok(Json(ApiResponse::success("Ok", data, Some(Meta::empty()))))
}
