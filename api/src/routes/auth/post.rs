use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::{Role, generate_jwt};
use crate::response::ApiResponse;
use common::format_validation_errors;
use common::state::AppState;
use db::models::{admin, kid};

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, Default)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: String,
    pub user: UserInfo,
}

#[derive(Debug, Serialize, Default)]
pub struct UserInfo {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub role: String,
    pub avatar: Option<String>,
}

/// POST /api/auth/login
///
/// Unified login for admins and kids. The admin table is checked first;
/// if the email is unknown there, the kid table is tried. A successful kid
/// login records `last_login` on a best-effort basis.
///
/// ### Request Body
/// ```json
/// {
///   "email": "user@example.com",
///   "password": "strongpassword"
/// }
/// ```
///
/// ### Responses
///
/// - `200 OK`
/// ```json
/// {
///   "success": true,
///   "data": {
///     "token": "jwt_token_here",
///     "expires_at": "2026-03-01T11:00:00+00:00",
///     "user": { "id": 1, "name": "Sam", "email": "user@example.com", "role": "kid", "avatar": null }
///   },
///   "message": "Login successful"
/// }
/// ```
///
/// - `401 Unauthorized`
/// ```json
/// {
///   "success": false,
///   "message": "Invalid credentials"
/// }
/// ```
pub async fn login(
    State(app_state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    if let Err(validation_errors) = req.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<LoginResponse>::error(
                format_validation_errors(&validation_errors),
            )),
        );
    }

    let db = app_state.db();

    match admin::Model::find_by_email(db, &req.email).await {
        Ok(Some(admin)) => {
            if !admin.verify_password(&req.password) {
                return invalid_credentials();
            }
            let (token, expires_at) = generate_jwt(admin.id, Role::Admin);
            let response = LoginResponse {
                token,
                expires_at,
                user: UserInfo {
                    id: admin.id,
                    name: admin.name,
                    email: Some(admin.email),
                    role: Role::Admin.to_string(),
                    avatar: admin.avatar,
                },
            };
            (
                StatusCode::OK,
                Json(ApiResponse::success(response, "Login successful")),
            )
        }
        Ok(None) => match kid::Model::find_by_email(db, &req.email).await {
            Ok(Some(kid)) => {
                if !kid.verify_password(&req.password) {
                    return invalid_credentials();
                }
                if let Err(e) = kid::Model::touch_last_login(db, kid.id).await {
                    tracing::warn!("Failed to update last_login for kid {}: {}", kid.id, e);
                }
                let (token, expires_at) = generate_jwt(kid.id, Role::Kid);
                let response = LoginResponse {
                    token,
                    expires_at,
                    user: UserInfo {
                        id: kid.id,
                        name: kid.name,
                        email: kid.email,
                        role: Role::Kid.to_string(),
                        avatar: kid.avatar,
                    },
                };
                (
                    StatusCode::OK,
                    Json(ApiResponse::success(response, "Login successful")),
                )
            }
            Ok(None) => invalid_credentials(),
            Err(e) => database_error(e),
        },
        Err(e) => database_error(e),
    }
}

fn invalid_credentials() -> (StatusCode, Json<ApiResponse<LoginResponse>>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(ApiResponse::error("Invalid credentials")),
    )
}

fn database_error(e: sea_orm::DbErr) -> (StatusCode, Json<ApiResponse<LoginResponse>>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::error(format!("Database error: {e}"))),
    )
}
