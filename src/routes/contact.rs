use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::ContactMessage,
    response::{ApiResponse, Meta},
    state::AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateContactRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub message: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateContactStatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactCreated {
    pub id: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ContactList {
    pub items: Vec<ContactMessage>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_message))
        .route("/", get(list_messages))
        .route("/{id}", patch(update_message_status))
}

#[utoipa::path(
    post,
    path = "/api/contact",
    request_body = CreateContactRequest,
    responses(
        (status = 201, description = "Submit contact message", body = ApiResponse<ContactCreated>),
        (status = 400, description = "Missing required fields"),
    ),
    tag = "Contact"
)]
pub async fn create_message(
    State(state): State<AppState>,
    Json(payload): Json<CreateContactRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<ContactCreated>>)> {
    let name = payload.name.trim();
    let email = payload.email.trim();
    let message = payload.message.trim();
    if name.is_empty() || email.is_empty() || message.is_empty() {
        return Err(AppError::BadRequest(
            "Name, email, and message are required".into(),
        ));
    }

    let phone = payload.phone.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let subject = payload
        .subject
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO contact_messages (name, email, phone, subject, message)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(name)
    .bind(email)
    .bind(phone)
    .bind(subject)
    .bind(message)
    .fetch_one(&state.pool)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Message received",
            ContactCreated { id },
            Some(Meta::empty()),
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/api/contact",
    responses(
        (status = 200, description = "List contact messages", body = ApiResponse<ContactList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Contact"
)]
pub async fn list_messages(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<ContactList>>> {
    ensure_admin(&user)?;

    let items = sqlx::query_as::<_, ContactMessage>(
        r#"
        SELECT id, name, email, phone, subject, message, status, created_at
        FROM contact_messages
        ORDER BY created_at DESC
        LIMIT 200
        "#,
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(ApiResponse::success(
        "Messages",
        ContactList { items },
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    patch,
    path = "/api/contact/{id}",
    params(("id" = i64, Path, description = "Message ID")),
    request_body = UpdateContactStatusRequest,
    responses(
        (status = 200, description = "Update message status"),
        (status = 400, description = "Invalid status"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Message not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Contact"
)]
pub async fn update_message_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateContactStatusRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    ensure_admin(&user)?;

    let status = payload.status.trim();
    if status.is_empty() {
        return Err(AppError::BadRequest("Status is required".into()));
    }
    if !matches!(status, "new" | "completed") {
        return Err(AppError::BadRequest("Invalid status".into()));
    }

    let result = sqlx::query("UPDATE contact_messages SET status = $2 WHERE id = $1")
        .bind(id)
        .bind(status)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    Ok(Json(ApiResponse::success(
        "Updated",
        serde_json::json!({}),
        Some(Meta::empty()),
    )))
}
