use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;

use crate::{
    audit::log_audit,
    dto::auth::{
        AdminLoginRequest, AuthSession, Claims, CustomerLoginRequest, CustomerSignupRequest,
        SessionUser,
    },
    error::{AppError, AppResult},
    response::{ApiResponse, Meta},
    state::AppState,
};

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

fn sign_token(state: &AppState, user: &SessionUser) -> AppResult<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::days(7))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user.id.to_string(),
        role: user.role.clone(),
        name: user.name.clone(),
        email: user.email.clone(),
        exp: expiration.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(state.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;

    Ok(format!("Bearer {token}"))
}

pub async fn admin_login(
    state: &AppState,
    payload: AdminLoginRequest,
) -> AppResult<ApiResponse<AuthSession>> {
    let username = payload.username.trim();
    if username.is_empty() || payload.password.is_empty() {
        return Err(AppError::BadRequest(
            "Username and password required".into(),
        ));
    }

    let row: Option<(i64, String, String, String)> = sqlx::query_as(
        "SELECT id, username, password_hash, role FROM users WHERE username = $1",
    )
    .bind(username)
    .fetch_optional(&state.pool)
    .await?;

    // Same rejection whether the user is missing or the password is wrong.
    let (id, username, password_hash, role) = row.ok_or(AppError::Unauthorized)?;
    if !verify_password(&payload.password, &password_hash) {
        return Err(AppError::Unauthorized);
    }

    let user = SessionUser {
        id,
        name: Some(username),
        email: None,
        role,
    };
    let token = sign_token(state, &user)?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.id),
        "admin",
        "admin_login",
        Some("users"),
        None,
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Logged in",
        AuthSession { token, user },
        Some(Meta::empty()),
    ))
}

pub async fn customer_signup(
    state: &AppState,
    payload: CustomerSignupRequest,
) -> AppResult<ApiResponse<AuthSession>> {
    let full_name = payload.full_name.trim();
    let email = payload.email.trim().to_lowercase();
    if full_name.is_empty() || email.is_empty() || payload.password.is_empty() {
        return Err(AppError::BadRequest(
            "Full name, email, and password are required".into(),
        ));
    }

    let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM customers WHERE email = $1")
        .bind(&email)
        .fetch_optional(&state.pool)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict("Email already exists".into()));
    }

    let password_hash = hash_password(&payload.password)?;

    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO customers (full_name, email, password_hash)
        VALUES ($1, $2, $3)
        RETURNING id
        "#,
    )
    .bind(full_name)
    .bind(&email)
    .bind(password_hash)
    .fetch_one(&state.pool)
    .await?;

    let user = SessionUser {
        id,
        name: Some(full_name.to_owned()),
        email: Some(email),
        role: "customer".into(),
    };
    let token = sign_token(state, &user)?;

    Ok(ApiResponse::success(
        "Account created",
        AuthSession { token, user },
        Some(Meta::empty()),
    ))
}

pub async fn customer_login(
    state: &AppState,
    payload: CustomerLoginRequest,
) -> AppResult<ApiResponse<AuthSession>> {
    let email = payload.email.trim().to_lowercase();
    if email.is_empty() || payload.password.is_empty() {
        return Err(AppError::BadRequest("Email and password required".into()));
    }

    let row: Option<(i64, String, String)> = sqlx::query_as(
        "SELECT id, full_name, password_hash FROM customers WHERE email = $1",
    )
    .bind(&email)
    .fetch_optional(&state.pool)
    .await?;

    let (id, full_name, password_hash) = row.ok_or(AppError::Unauthorized)?;
    if !verify_password(&payload.password, &password_hash) {
        return Err(AppError::Unauthorized);
    }

    let user = SessionUser {
        id,
        name: Some(full_name),
        email: Some(email),
        role: "customer".into(),
    };
    let token = sign_token(state, &user)?;

    Ok(ApiResponse::success(
        "Logged in",
        AuthSession { token, user },
        Some(Meta::empty()),
    ))
}
