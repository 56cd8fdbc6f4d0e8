//! Kid profile updates.

use axum::{
    Extension, Json,
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde::Serialize;

use crate::auth::AuthUser;
use crate::response::ApiResponse;
use crate::routes::common::{collect_multipart, parse_date_input};
use crate::services::storage;
use common::state::AppState;
use db::models::kid;
use db::password;

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ApiResponse::<crate::auth::guards::Empty>::error(message)),
    )
        .into_response()
}

#[derive(Debug, Serialize)]
pub struct ProfileUpdateResponse {
    pub kid_name: String,
    pub avatar: Option<String>,
    pub email: Option<String>,
}

/// PUT /api/kid/profile
///
/// Updates the querying kid's profile from a multipart form. Text fields:
/// `name`, `email`, `parent_phone`, `date_of_birth`, `old_password`,
/// `new_password`; an optional `avatar` file replaces the stored image.
/// Changing the password requires the old one.
///
/// ### Responses
///
/// - `200 OK` → `"Profile updated successfully"`
/// - `400 Bad Request` → missing old password, or no password on record
/// - `401 Unauthorized` → `"Invalid old password"`
/// - `404 Not Found` → `"Kid not found"`
/// - `409 Conflict` → email or parent phone already taken by another kid
pub async fn update_profile(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    multipart: Multipart,
) -> Response {
    let (fields, files) = match collect_multipart(multipart).await {
        Ok(parts) => parts,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, msg),
    };

    let db = app_state.db();
    let existing = match kid::Entity::find_by_id(claims.sub).one(db).await {
        Ok(Some(kid)) => kid,
        Ok(None) => return error_response(StatusCode::NOT_FOUND, "Kid not found"),
        Err(e) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {e}"),
            );
        }
    };

    let mut active = kid::ActiveModel {
        id: Set(claims.sub),
        updated_at: Set(Utc::now()),
        ..Default::default()
    };

    if let Some(name) = fields.get("name").filter(|v| !v.is_empty()) {
        active.name = Set(name.clone());
    }
    if let Some(email) = fields.get("email").filter(|v| !v.is_empty()) {
        if existing.email.as_deref() != Some(email.as_str()) {
            match kid::Model::find_by_email(db, email).await {
                Ok(Some(_)) => {
                    return error_response(
                        StatusCode::CONFLICT,
                        "A kid with this email already exists",
                    );
                }
                Ok(None) => {}
                Err(e) => {
                    return error_response(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        format!("Database error: {e}"),
                    );
                }
            }
        }
        active.email = Set(Some(email.clone()));
    }
    if let Some(phone) = fields.get("parent_phone").filter(|v| !v.is_empty()) {
        if existing.parent_phone.as_deref() != Some(phone.as_str()) {
            match kid::Model::find_by_parent_phone(db, phone).await {
                Ok(Some(_)) => {
                    return error_response(
                        StatusCode::CONFLICT,
                        "A profile with this parent phone already exists",
                    );
                }
                Ok(None) => {}
                Err(e) => {
                    return error_response(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        format!("Database error: {e}"),
                    );
                }
            }
        }
        active.parent_phone = Set(Some(phone.clone()));
    }
    if let Some(raw) = fields.get("date_of_birth").filter(|v| !v.is_empty()) {
        match parse_date_input(raw) {
            Some(dt) => active.date_of_birth = Set(Some(dt)),
            None => return error_response(StatusCode::BAD_REQUEST, "Invalid date format"),
        }
    }

    if let Some(avatar) = files.iter().find(|f| f.field == "avatar") {
        match storage::save_upload(storage::AVATARS_DIR, &avatar.filename, &avatar.bytes).await {
            Ok(url) => active.avatar = Set(Some(url)),
            Err(e) => {
                return error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Failed to store avatar: {e}"),
                );
            }
        }
    }

    if let Some(new_password) = fields.get("new_password").filter(|v| !v.is_empty()) {
        let Some(old_password) = fields.get("old_password").filter(|v| !v.is_empty()) else {
            return error_response(StatusCode::BAD_REQUEST, "Old password is required");
        };
        if existing.password_hash.is_none() {
            return error_response(StatusCode::BAD_REQUEST, "No password set for this account");
        }
        if !existing.verify_password(old_password) {
            return error_response(StatusCode::UNAUTHORIZED, "Invalid old password");
        }
        match password::hash_password(new_password) {
            Ok(hash) => active.password_hash = Set(Some(hash)),
            Err(e) => {
                return error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Password hash error: {e}"),
                );
            }
        }
    }

    let replaces_avatar = files.iter().any(|f| f.field == "avatar");

    match active.update(db).await {
        Ok(updated) => {
            if replaces_avatar {
                if let Some(old) = existing.avatar.as_deref() {
                    storage::remove_upload(old).await;
                }
            }
            (
                StatusCode::OK,
                Json(ApiResponse::success(
                    ProfileUpdateResponse {
                        kid_name: updated.name,
                        avatar: updated.avatar,
                        email: updated.email,
                    },
                    "Profile updated successfully",
                )),
            )
                .into_response()
        }
        Err(e) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Database error: {e}"),
        ),
    }
}
