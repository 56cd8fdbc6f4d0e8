//! Admin login, comic/kid creation, and submission grading.

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde::Deserialize;
use validator::Validate;

use crate::auth::{Role, generate_jwt};
use crate::response::ApiResponse;
use crate::routes::auth::post::{LoginResponse, UserInfo};
use crate::routes::common::{
    ComicResponse, SubmissionResponse, collect_multipart, default_avatar, parse_date_input,
};
use crate::services::storage;
use common::state::AppState;
use common::format_validation_errors;
use db::models::submission::{self, SubmissionStatus};
use db::models::{admin, comic, kid};
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

#[derive(Debug, Deserialize, Validate)]
pub struct AdminLoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// POST /api/admin/login
///
/// Admin-only login.
///
/// ### Responses
///
/// - `200 OK` → token and the admin's profile
/// - `401 Unauthorized` → `"Invalid credentials"`
pub async fn admin_login(
    State(app_state): State<AppState>,
    Json(req): Json<AdminLoginRequest>,
) -> Response {
    if let Err(e) = req.validate() {
        return error_response(StatusCode::BAD_REQUEST, format_validation_errors(&e));
    }

    let admin = match admin::Model::find_by_email(app_state.db(), &req.email).await {
        Ok(Some(admin)) => admin,
        Ok(None) => return error_response(StatusCode::UNAUTHORIZED, "Invalid credentials"),
        Err(e) => return db_error(e),
    };

    if !admin.verify_password(&req.password) {
        return error_response(StatusCode::UNAUTHORIZED, "Invalid credentials");
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
        .into_response()
}

/// POST /api/admin/comics
///
/// Creates a comic from a multipart form. Text fields: `title`, `subtitle`,
/// `description` (all required), `category`, `submission_deadline`, `bonus`,
/// `total_marks`, `max_uploads`. Files: `cover_image` (single) and
/// `documents` (repeatable).
///
/// ### Responses
///
/// - `201 Created` → the stored comic
/// - `400 Bad Request` → `"Title, subtitle, and description are required"`
pub async fn create_comic(
    State(app_state): State<AppState>,
    multipart: Multipart,
) -> Response {
    let (fields, files) = match collect_multipart(multipart).await {
        Ok(parts) => parts,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, msg),
    };

    let title = fields.get("title").filter(|v| !v.is_empty());
    let subtitle = fields.get("subtitle").filter(|v| !v.is_empty());
    let description = fields.get("description").filter(|v| !v.is_empty());
    let (Some(title), Some(subtitle), Some(description)) = (title, subtitle, description) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Title, subtitle, and description are required",
        );
    };

    let mut cover_url = String::new();
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
            "cover_image" => cover_url = url,
            "documents" => document_urls.push(url),
            _ => {}
        }
    }

    let document = if document_urls.is_empty() {
        None
    } else {
        Some(serde_json::to_string(&document_urls).unwrap_or_else(|_| "[]".into()))
    };

    let deadline = fields
        .get("submission_deadline")
        .filter(|v| !v.is_empty())
        .and_then(|raw| parse_date_input(raw));

    let parse_int = |key: &str, default: i32| {
        fields
            .get(key)
            .filter(|v| !v.is_empty())
            .and_then(|v| v.parse::<i32>().ok())
            .unwrap_or(default)
    };

    let now = Utc::now();
    let active = comic::ActiveModel {
        title: Set(title.clone()),
        subtitle: Set(subtitle.clone()),
        description: Set(description.clone()),
        image: Set(cover_url),
        category: Set(fields.get("category").filter(|v| !v.is_empty()).cloned()),
        submission_deadline: Set(deadline),
        bonus: Set(parse_int("bonus", 0)),
        total_marks: Set(parse_int("total_marks", 0)),
        max_uploads: Set(parse_int("max_uploads", 1)),
        document: Set(document),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    match active.insert(app_state.db()).await {
        Ok(comic) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(
                ComicResponse::from(comic),
                "Comic created successfully",
            )),
        )
            .into_response(),
        Err(e) => db_error(e),
    }
}

/// POST /api/admin/kids
///
/// Creates a kid from a multipart form. Text fields: `name` and
/// `parent_phone` (required), `email`, `gender`, `father_name`,
/// `mother_name`, `date_of_birth`, `password`. Files: optional `avatar`.
///
/// ### Responses
///
/// - `201 Created` → the new kid
/// - `400 Bad Request` → missing required fields, or
///   `"Email or Parent Phone already exists"`
pub async fn create_kid(State(app_state): State<AppState>, multipart: Multipart) -> Response {
    let (fields, files) = match collect_multipart(multipart).await {
        Ok(parts) => parts,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, msg),
    };

    let name = fields.get("name").filter(|v| !v.is_empty());
    let parent_phone = fields.get("parent_phone").filter(|v| !v.is_empty());
    let (Some(name), Some(parent_phone)) = (name, parent_phone) else {
        return error_response(StatusCode::BAD_REQUEST, "Name and Parent Phone are required");
    };

    let db = app_state.db();

    match kid::Model::find_by_parent_phone(db, parent_phone).await {
        Ok(Some(_)) => {
            return error_response(StatusCode::BAD_REQUEST, "Email or Parent Phone already exists");
        }
        Ok(None) => {}
        Err(e) => return db_error(e),
    }
    if let Some(email) = fields.get("email").filter(|v| !v.is_empty()) {
        match kid::Model::find_by_email(db, email).await {
            Ok(Some(_)) => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    "Email or Parent Phone already exists",
                );
            }
            Ok(None) => {}
            Err(e) => return db_error(e),
        }
    }

    let date_of_birth = match fields.get("date_of_birth").filter(|v| !v.is_empty()) {
        Some(raw) => match parse_date_input(raw) {
            Some(dt) => Some(dt),
            None => return error_response(StatusCode::BAD_REQUEST, "Invalid date format"),
        },
        None => None,
    };

    let password_hash = match fields.get("password").filter(|v| !v.is_empty()) {
        Some(pw) => match password::hash_password(pw) {
            Ok(hash) => Some(hash),
            Err(e) => {
                return error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Password hash error: {e}"),
                );
            }
        },
        None => None,
    };

    let avatar = match files.iter().find(|f| f.field == "avatar") {
        Some(file) => {
            match storage::save_upload(storage::AVATARS_DIR, &file.filename, &file.bytes).await {
                Ok(url) => url,
                Err(e) => {
                    return error_response(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        format!("Failed to store avatar: {e}"),
                    );
                }
            }
        }
        None => default_avatar(name),
    };

    let now = Utc::now();
    let active = kid::ActiveModel {
        name: Set(name.clone()),
        email: Set(fields.get("email").filter(|v| !v.is_empty()).cloned()),
        parent_phone: Set(Some(parent_phone.clone())),
        password_hash: Set(password_hash),
        avatar: Set(Some(avatar)),
        gender: Set(fields.get("gender").filter(|v| !v.is_empty()).cloned()),
        father_name: Set(fields.get("father_name").filter(|v| !v.is_empty()).cloned()),
        mother_name: Set(fields.get("mother_name").filter(|v| !v.is_empty()).cloned()),
        date_of_birth: Set(date_of_birth),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    match active.insert(db).await {
        Ok(kid) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(kid, "Kid created successfully")),
        )
            .into_response(),
        Err(e) => db_error(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct GradeRequest {
    pub marks: Option<i32>,
}

/// POST /api/admin/submissions/{submission_id}/grade
///
/// Assigns marks to a submission and moves it to `graded`.
///
/// ### Request Body
/// ```json
/// { "marks": 85 }
/// ```
///
/// ### Responses
///
/// - `200 OK` → the graded submission
/// - `400 Bad Request` → `"Marks are required"`
/// - `404 Not Found` → `"Submission not found"`
pub async fn grade_submission(
    State(app_state): State<AppState>,
    Path(submission_id): Path<i64>,
    Json(req): Json<GradeRequest>,
) -> Response {
    let Some(marks) = req.marks else {
        return error_response(StatusCode::BAD_REQUEST, "Marks are required");
    };

    let db = app_state.db();
    match submission::Entity::find_by_id(submission_id).one(db).await {
        Ok(Some(_)) => {}
        Ok(None) => return error_response(StatusCode::NOT_FOUND, "Submission not found"),
        Err(e) => return db_error(e),
    }

    let active = submission::ActiveModel {
        id: Set(submission_id),
        marks: Set(Some(marks)),
        status: Set(SubmissionStatus::Graded),
        updated_at: Set(Utc::now()),
        ..Default::default()
    };

    match active.update(db).await {
        Ok(updated) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                SubmissionResponse::from(updated),
                "Submission graded successfully",
            )),
        )
            .into_response(),
        Err(e) => db_error(e),
    }
}
