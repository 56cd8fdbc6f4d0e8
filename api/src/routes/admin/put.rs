//! Admin edit endpoints: comics and the admin's own profile.

use axum::{
    Extension, Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde::Serialize;

use crate::auth::{AuthUser, Role};
use crate::response::ApiResponse;
use crate::routes::common::{
    ComicResponse, collect_multipart, parse_date_input, parse_document_urls,
};
use crate::services::storage;
use common::state::AppState;
use db::models::{admin, comic};
use db::password;

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ApiResponse::<crate::auth::guards::Empty>::error(message)),
    )
        .into_response()
}

fn db_error(e: sea_orm::DbErr) -> Response {
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Database error: {e}"),
    )
}

/// PUT /api/admin/comics/{comic_id}
///
/// Partially updates a comic from a multipart form. Only provided fields
/// change; a new `cover_image` or `documents` upload replaces the stored
/// URLs. Field names match comic creation.
///
/// ### Responses
///
/// - `200 OK` → the updated comic
/// - `404 Not Found` → `"Comic not found"`
pub async fn update_comic(
    State(app_state): State<AppState>,
    Path(comic_id): Path<i64>,
    multipart: Multipart,
) -> Response {
    let (fields, files) = match collect_multipart(multipart).await {
        Ok(parts) => parts,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, msg),
    };

    let db = app_state.db();
    let existing = match comic::Entity::find_by_id(comic_id).one(db).await {
        Ok(Some(comic)) => comic,
        Ok(None) => return error_response(StatusCode::NOT_FOUND, "Comic not found"),
        Err(e) => return db_error(e),
    };

    let mut active = comic::ActiveModel {
        id: Set(comic_id),
        updated_at: Set(Utc::now()),
        ..Default::default()
    };

    if let Some(title) = fields.get("title").filter(|v| !v.is_empty()) {
        active.title = Set(title.clone());
    }
    if let Some(subtitle) = fields.get("subtitle").filter(|v| !v.is_empty()) {
        active.subtitle = Set(subtitle.clone());
    }
    if let Some(description) = fields.get("description").filter(|v| !v.is_empty()) {
        active.description = Set(description.clone());
    }
    if let Some(category) = fields.get("category").filter(|v| !v.is_empty()) {
        active.category = Set(Some(category.clone()));
    }
    if let Some(raw) = fields.get("submission_deadline").filter(|v| !v.is_empty()) {
        if let Some(deadline) = parse_date_input(raw) {
            active.submission_deadline = Set(Some(deadline));
        }
    }
    let parse_int = |key: &str| {
        fields
            .get(key)
            .filter(|v| !v.is_empty())
            .and_then(|v| v.parse::<i32>().ok())
    };
    if let Some(bonus) = parse_int("bonus") {
        active.bonus = Set(bonus);
    }
    if let Some(total_marks) = parse_int("total_marks") {
        active.total_marks = Set(total_marks);
    }
    if let Some(max_uploads) = parse_int("max_uploads") {
        active.max_uploads = Set(max_uploads);
    }

    let mut cover_url = None;
    let mut document_urls = Vec::new();
    for file in &files {
        let saved = storage::save_upload(storage::COMICS_DIR, &file.filename, &file.bytes).await;
        let url = match saved {
            Ok(url) => url,
            Err(e) => {
                return error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Failed to store file: {e}"),
                );
            }
        };
        match file.field.as_str() {
            "cover_image" => cover_url = Some(url),
            "documents" => document_urls.push(url),
            _ => {}
        }
    }
    let replaces_cover = cover_url.is_some();
    let replaces_documents = !document_urls.is_empty();
    if let Some(url) = cover_url {
        active.image = Set(url);
    }
    if replaces_documents {
        active.document = Set(Some(
            serde_json::to_string(&document_urls).unwrap_or_else(|_| "[]".into()),
        ));
    }

    match active.update(db).await {
        Ok(updated) => {
            if replaces_cover && !existing.image.is_empty() {
                storage::remove_upload(&existing.image).await;
            }
            if replaces_documents {
                for url in parse_document_urls(existing.document.as_deref()) {
                    storage::remove_upload(&url).await;
                }
            }
            (
                StatusCode::OK,
                Json(ApiResponse::success(
                    ComicResponse::from(updated),
                    "Comic updated successfully",
                )),
            )
                .into_response()
        }
        Err(e) => db_error(e),
    }
}

#[derive(Debug, Serialize)]
pub struct AdminProfileResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
    pub avatar: Option<String>,
}

/// PUT /api/admin/profile
///
/// Updates the authenticated admin's own profile from a multipart form.
/// Text fields: `name`, `email`, `old_password`, `new_password`; an
/// optional `avatar` file replaces the stored image. Changing the password
/// requires the old one.
///
/// ### Responses
///
/// - `200 OK` → the updated profile
/// - `400 Bad Request` → `"Old password is required to set a new one"`
/// - `401 Unauthorized` → `"Invalid old password"`
/// - `404 Not Found` → stale token pointing at a deleted admin
pub async fn update_admin_profile(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    multipart: Multipart,
) -> Response {
    let (fields, files) = match collect_multipart(multipart).await {
        Ok(parts) => parts,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, msg),
    };

    let db = app_state.db();
    let existing = match admin::Entity::find_by_id(claims.sub).one(db).await {
        Ok(Some(admin)) => admin,
        Ok(None) => {
            return error_response(
                StatusCode::NOT_FOUND,
                "Admin record not found. Please log out and log back in to refresh your session.",
            );
        }
        Err(e) => return db_error(e),
    };

    let mut active = admin::ActiveModel {
        id: Set(claims.sub),
        updated_at: Set(Utc::now()),
        ..Default::default()
    };

    if let Some(name) = fields.get("name").filter(|v| !v.is_empty()) {
        active.name = Set(name.clone());
    }
    if let Some(email) = fields.get("email").filter(|v| !v.is_empty()) {
        active.email = Set(email.clone());
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
            return error_response(
                StatusCode::BAD_REQUEST,
                "Old password is required to set a new one",
            );
        };
        if !existing.verify_password(old_password) {
            return error_response(StatusCode::UNAUTHORIZED, "Invalid old password");
        }
        match password::hash_password(new_password) {
            Ok(hash) => active.password_hash = Set(hash),
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
                    AdminProfileResponse {
                        id: updated.id,
                        name: updated.name,
                        email: updated.email,
                        role: Role::Admin.to_string(),
                        avatar: updated.avatar,
                    },
                    "Profile updated successfully",
                )),
            )
                .into_response()
        }
        Err(e) => db_error(e),
    }
}
