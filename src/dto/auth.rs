use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AdminLoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSignupRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CustomerLoginRequest {
    pub email: String,
    pub password: String,
}

/// Identity as embedded in the token, echoed back by the `/me` endpoints.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: i64,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthSession {
    pub token: String,
    pub user: SessionUser,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub exp: usize,
}
