use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dto::auth::{AdminLoginRequest, AuthSession, SessionUser},
    error::AppResult,
    middleware::auth::{AuthUser, ensure_admin},
    response::{ApiResponse, Meta},
    services::auth_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/me", get(me))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = AdminLoginRequest,
    responses(
        (status = 200, description = "Admin login", body = ApiResponse<AuthSession>),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<AdminLoginRequest>,
) -> AppResult<Json<ApiResponse<AuthSession>>> {
    let resp = auth_service::admin_login(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current admin identity", body = ApiResponse<SessionUser>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn me(user: AuthUser) -> AppResult<Json<ApiResponse<SessionUser>>> {
    ensure_admin(&user)?;
    let data = SessionUser {
        id: user.id,
        name: user.name,
        email: user.email,
        role: user.role,
    };
    Ok(Json(ApiResponse::success("Ok", data, Some(Meta::empty()))))
}
