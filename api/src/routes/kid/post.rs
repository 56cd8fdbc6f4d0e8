//! Kid login/signup flows and assignment submission.

use axum::{
    Extension, Json,
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::{AuthUser, Role, generate_jwt};
use crate::response::ApiResponse;
use crate::routes::common::{SubmissionResponse, collect_multipart, parse_date_input};
use crate::services::email::{EmailService, generate_verification_code};
use crate::services::storage;
use common::state::AppState;
use common::{config, format_validation_errors};
use db::models::kid;
use db::models::submission::{self, SubmissionStatus};
use db::models::comic;
use db::password;

lazy_static::lazy_static! {
    static ref PHONE_REGEX: regex::Regex = regex::Regex::new(r"^\+?[0-9]{7,15}$").unwrap();
}

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

#[derive(Debug, Serialize)]
pub struct KidTokenResponse {
    pub token: String,
    pub expires_at: String,
    pub kid: kid::Model,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CheckProfileRequest {
    #[validate(regex(path = *PHONE_REGEX, message = "Invalid phone number format"))]
    pub parent_phone: String,

    #[validate(length(min = 1, message = "Date of birth is required"))]
    pub date_of_birth: String,
}

/// POST /api/kid/check
///
/// Logs a kid in by parent phone number and date of birth.
///
/// ### Request Body
/// ```json
/// {
///   "parent_phone": "+27821234567",
///   "date_of_birth": "2015-06-01"
/// }
/// ```
///
/// ### Responses
///
/// - `200 OK` → token plus the kid's profile
/// - `401 Unauthorized` → `"Invalid date of birth"`
/// - `404 Not Found` → `"This phone number is not registered"`
pub async fn check_profile(
    State(app_state): State<AppState>,
    Json(req): Json<CheckProfileRequest>,
) -> Response {
    if let Err(e) = req.validate() {
        return error_response(StatusCode::BAD_REQUEST, format_validation_errors(&e));
    }

    let db = app_state.db();
    let kid = match kid::Model::find_by_parent_phone(db, &req.parent_phone).await {
        Ok(Some(kid)) => kid,
        Ok(None) => {
            return error_response(
                StatusCode::NOT_FOUND,
                "This phone number is not registered",
            );
        }
        Err(e) => return db_error(e),
    };

    let Some(recorded_dob) = kid.date_of_birth else {
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Date of birth missing in record",
        );
    };

    let Some(given_dob) = parse_date_input(&req.date_of_birth) else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid date format");
    };

    if given_dob.date_naive() != recorded_dob.date_naive() {
        return error_response(StatusCode::UNAUTHORIZED, "Invalid date of birth");
    }

    if let Err(e) = kid::Model::touch_last_login(db, kid.id).await {
        tracing::warn!("Failed to update last_login for kid {}: {}", kid.id, e);
    }

    let (token, expires_at) = generate_jwt(kid.id, Role::Kid);
    (
        StatusCode::OK,
        Json(ApiResponse::success(
            KidTokenResponse {
                token,
                expires_at,
                kid,
            },
            "Profile verified successfully",
        )),
    )
        .into_response()
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateKidRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[validate(regex(path = *PHONE_REGEX, message = "Invalid phone number format"))]
    pub parent_phone: String,

    #[validate(length(min = 1, message = "Date of birth is required"))]
    pub date_of_birth: String,

    #[serde(default)]
    pub confirm: bool,
}

/// POST /api/kid/create
///
/// Creates a phone-based kid profile. The client must set `confirm: true`
/// to acknowledge the new-profile prompt.
///
/// ### Responses
///
/// - `201 Created` → token plus the new profile
/// - `400 Bad Request` → `"Profile creation must be confirmed"`
/// - `409 Conflict` → `"A profile with this parent phone already exists"`
pub async fn create_kid(
    State(app_state): State<AppState>,
    Json(req): Json<CreateKidRequest>,
) -> Response {
    if !req.confirm {
        return error_response(StatusCode::BAD_REQUEST, "Profile creation must be confirmed");
    }
    if let Err(e) = req.validate() {
        return error_response(StatusCode::BAD_REQUEST, format_validation_errors(&e));
    }

    let Some(date_of_birth) = parse_date_input(&req.date_of_birth) else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid date format");
    };

    let db = app_state.db();
    match kid::Model::find_by_parent_phone(db, &req.parent_phone).await {
        Ok(Some(_)) => {
            return error_response(
                StatusCode::CONFLICT,
                "A profile with this parent phone already exists",
            );
        }
        Ok(None) => {}
        Err(e) => return db_error(e),
    }

    let now = Utc::now();
    let active = kid::ActiveModel {
        name: Set(req.name.clone()),
        parent_phone: Set(Some(req.parent_phone.clone())),
        date_of_birth: Set(Some(date_of_birth)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    match active.insert(db).await {
        Ok(kid) => {
            let (token, expires_at) = generate_jwt(kid.id, Role::Kid);
            (
                StatusCode::CREATED,
                Json(ApiResponse::success(
                    KidTokenResponse {
                        token,
                        expires_at,
                        kid,
                    },
                    "Kid profile created successfully",
                )),
            )
                .into_response()
        }
        Err(e) => db_error(e),
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Serialize, Default)]
pub struct SignupResponse {
    pub email: String,
}

/// POST /api/kid/signup
///
/// Email signup step 1: creates an unverified kid and emails a 6-digit
/// verification code.
///
/// ### Responses
///
/// - `201 Created` → `"Step 1 complete: Please verify your email"`
/// - `409 Conflict` → `"A kid with this email already exists"`
pub async fn signup(State(app_state): State<AppState>, Json(req): Json<SignupRequest>) -> Response {
    if let Err(e) = req.validate() {
        return error_response(StatusCode::BAD_REQUEST, format_validation_errors(&e));
    }

    let db = app_state.db();
    match kid::Model::find_by_email(db, &req.email).await {
        Ok(Some(_)) => {
            return error_response(StatusCode::CONFLICT, "A kid with this email already exists");
        }
        Ok(None) => {}
        Err(e) => return db_error(e),
    }

    let hash = match password::hash_password(&req.password) {
        Ok(h) => h,
        Err(e) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Password hash error: {e}"),
            );
        }
    };

    let code = generate_verification_code();
    let expires = Utc::now() + Duration::minutes(config::otp_expiry_minutes() as i64);

    let now = Utc::now();
    let active = kid::ActiveModel {
        name: Set(req.full_name.clone()),
        email: Set(Some(req.email.clone())),
        password_hash: Set(Some(hash)),
        is_verified: Set(false),
        verification_code: Set(Some(code.clone())),
        verification_code_expires: Set(Some(expires)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let kid = match active.insert(db).await {
        Ok(kid) => kid,
        Err(e) => return db_error(e),
    };

    if let Err(e) = EmailService::send_verification_email(&req.email, &kid.name, &code).await {
        tracing::warn!("Failed to send verification email to {}: {}", req.email, e);
    }

    (
        StatusCode::CREATED,
        Json(ApiResponse::success(
            SignupResponse { email: req.email },
            "Step 1 complete: Please verify your email",
        )),
    )
        .into_response()
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyEmailRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(equal = 6, message = "Verification code must be 6 digits"))]
    pub code: String,
}

/// POST /api/kid/verify-email
///
/// Email signup step 2: checks the verification code and marks the kid as
/// verified. The code is single-use and cleared on success.
///
/// ### Responses
///
/// - `200 OK` → `"Email verified successfully"`
/// - `400 Bad Request` → already verified, wrong code, or expired code
/// - `404 Not Found` → `"Kid not found"`
pub async fn verify_email(
    State(app_state): State<AppState>,
    Json(req): Json<VerifyEmailRequest>,
) -> Response {
    if let Err(e) = req.validate() {
        return error_response(StatusCode::BAD_REQUEST, format_validation_errors(&e));
    }

    let db = app_state.db();
    let kid = match kid::Model::find_by_email(db, &req.email).await {
        Ok(Some(kid)) => kid,
        Ok(None) => return error_response(StatusCode::NOT_FOUND, "Kid not found"),
        Err(e) => return db_error(e),
    };

    if kid.is_verified {
        return error_response(StatusCode::BAD_REQUEST, "Email already verified");
    }

    if kid.verification_code.as_deref() != Some(req.code.as_str()) {
        return error_response(StatusCode::BAD_REQUEST, "Invalid verification code");
    }

    if let Some(expires) = kid.verification_code_expires {
        if expires < Utc::now() {
            return error_response(StatusCode::BAD_REQUEST, "Verification code expired");
        }
    }

    let active = kid::ActiveModel {
        id: Set(kid.id),
        is_verified: Set(true),
        verification_code: Set(None),
        verification_code_expires: Set(None),
        updated_at: Set(Utc::now()),
        ..Default::default()
    };

    match active.update(db).await {
        Ok(_) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                crate::auth::guards::Empty,
                "Email verified successfully",
            )),
        )
            .into_response(),
        Err(e) => db_error(e),
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CompleteProfileRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    pub father_name: Option<String>,
    pub mother_name: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<String>,
}

/// POST /api/kid/complete-profile
///
/// Email signup step 3: fills in parent details on a verified kid, records
/// the login, and issues a token.
///
/// ### Responses
///
/// - `200 OK` → token plus the completed profile
/// - `400 Bad Request` → `"User not found or not verified"`
pub async fn complete_profile(
    State(app_state): State<AppState>,
    Json(req): Json<CompleteProfileRequest>,
) -> Response {
    if let Err(e) = req.validate() {
        return error_response(StatusCode::BAD_REQUEST, format_validation_errors(&e));
    }

    let db = app_state.db();
    let kid = match kid::Model::find_by_email(db, &req.email).await {
        Ok(Some(kid)) if kid.is_verified => kid,
        Ok(_) => return error_response(StatusCode::BAD_REQUEST, "User not found or not verified"),
        Err(e) => return db_error(e),
    };

    let date_of_birth = match req.date_of_birth.as_deref() {
        Some(raw) => match parse_date_input(raw) {
            Some(dt) => Some(dt),
            None => return error_response(StatusCode::BAD_REQUEST, "Invalid date format"),
        },
        None => None,
    };

    let mut active = kid::ActiveModel {
        id: Set(kid.id),
        father_name: Set(req.father_name.clone()),
        mother_name: Set(req.mother_name.clone()),
        gender: Set(req.gender.clone()),
        last_login: Set(Some(Utc::now())),
        updated_at: Set(Utc::now()),
        ..Default::default()
    };
    if date_of_birth.is_some() {
        active.date_of_birth = Set(date_of_birth);
    }

    match active.update(db).await {
        Ok(updated) => {
            let (token, expires_at) = generate_jwt(updated.id, Role::Kid);
            (
                StatusCode::OK,
                Json(ApiResponse::success(
                    KidTokenResponse {
                        token,
                        expires_at,
                        kid: updated,
                    },
                    "Profile completed successfully",
                )),
            )
                .into_response()
        }
        Err(e) => db_error(e),
    }
}

/// POST /api/kid/submit
///
/// Submits work for a comic as a multipart form. Text fields: `comic_id`
/// (required), `description`, `comments`. Files arrive under the `files`
/// field, capped at the comic's `max_uploads`.
///
/// ### Responses
///
/// - `201 Created` → the stored submission
/// - `400 Bad Request` → too many files, or
///   `"You have already submitted for this comic."`
/// - `404 Not Found` → `"Comic not found"`
pub async fn submit_assignment(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    multipart: Multipart,
) -> Response {
    let (fields, files) = match collect_multipart(multipart).await {
        Ok(parts) => parts,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, msg),
    };

    let Some(comic_id) = fields.get("comic_id").and_then(|v| v.parse::<i64>().ok()) else {
        return error_response(StatusCode::BAD_REQUEST, "Comic ID is required");
    };

    let db = app_state.db();
    let comic = match comic::Entity::find_by_id(comic_id).one(db).await {
        Ok(Some(comic)) => comic,
        Ok(None) => return error_response(StatusCode::NOT_FOUND, "Comic not found"),
        Err(e) => return db_error(e),
    };

    if files.len() > comic.max_uploads as usize {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!(
                "Maximum {} files allowed for this assignment",
                comic.max_uploads
            ),
        );
    }

    let existing = submission::Entity::find()
        .filter(submission::Column::KidId.eq(claims.sub))
        .filter(submission::Column::ComicId.eq(comic_id))
        .one(db)
        .await;
    match existing {
        Ok(Some(_)) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "You have already submitted for this comic.",
            );
        }
        Ok(None) => {}
        Err(e) => return db_error(e),
    }

    let mut file_urls = Vec::with_capacity(files.len());
    for file in &files {
        match storage::save_upload(storage::SUBMISSIONS_DIR, &file.filename, &file.bytes).await {
            Ok(url) => file_urls.push(url),
            Err(e) => {
                return error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Failed to store file: {e}"),
                );
            }
        }
    }

    let now = Utc::now();
    let active = submission::ActiveModel {
        kid_id: Set(claims.sub),
        comic_id: Set(comic_id),
        description: Set(fields.get("description").cloned()),
        comments: Set(fields.get("comments").cloned()),
        files: Set(serde_json::to_string(&file_urls).unwrap_or_else(|_| "[]".into())),
        status: Set(SubmissionStatus::Pending),
        submission_date: Set(now),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    match active.insert(db).await {
        Ok(submission) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(
                SubmissionResponse::from(submission),
                "Assignment submitted successfully",
            )),
        )
            .into_response(),
        Err(e) => db_error(e),
    }
}
