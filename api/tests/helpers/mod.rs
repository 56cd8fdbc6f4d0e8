#![allow(dead_code)]

use api::auth::{Role, generate_jwt};
use api::routes::routes;
use axum::{Router, body::Body, http::Request, http::header::CONTENT_TYPE, response::Response};
use chrono::{DateTime, Utc};
use common::state::AppState;
use db::models::submission::{self, SubmissionStatus};
use db::models::{admin, comic, kid};
use db::password;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use serde_json::Value;
use std::sync::Once;

static INIT: Once = Once::new();

/// Points the config singleton at test values before anything reads it.
pub fn init_test_env() {
    INIT.call_once(|| {
        let storage = std::env::temp_dir().join("comicroom-test-uploads");
        std::fs::create_dir_all(&storage).expect("Failed to create test storage dir");
        unsafe {
            std::env::set_var("DATABASE_PATH", "sqlite::memory:");
            std::env::set_var("JWT_SECRET", "test-secret");
            std::env::set_var("STORAGE_ROOT", storage.to_str().unwrap());
            std::env::set_var("LOG_TO_STDOUT", "false");
        }
    });
}

pub fn make_app(db: DatabaseConnection) -> Router {
    init_test_env();
    Router::new().nest("/api", routes(AppState::new(db)))
}

pub fn bearer(subject_id: i64, role: Role) -> String {
    init_test_env();
    let (token, _) = generate_jwt(subject_id, role);
    format!("Bearer {token}")
}

pub async fn get_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

pub fn json_request(method: &str, uri: &str, payload: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(payload).unwrap()))
        .unwrap()
}

const BOUNDARY: &str = "test-boundary-7MA4YWxkTrZu0gW";

/// Builds a multipart/form-data body; returns (content type, body bytes).
pub fn multipart_body(
    fields: &[(&str, &str)],
    files: &[(&str, &str, &[u8])],
) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    for (name, filename, bytes) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}

pub async fn seed_admin(
    db: &DatabaseConnection,
    name: &str,
    email: &str,
    pw: &str,
) -> admin::Model {
    admin::Model::create(db, name, email, pw)
        .await
        .expect("Failed to seed admin")
}

pub async fn seed_phone_kid(
    db: &DatabaseConnection,
    name: &str,
    phone: &str,
    dob: DateTime<Utc>,
) -> kid::Model {
    let now = Utc::now();
    kid::ActiveModel {
        name: Set(name.to_string()),
        parent_phone: Set(Some(phone.to_string())),
        date_of_birth: Set(Some(dob)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to seed kid")
}

pub async fn seed_email_kid(
    db: &DatabaseConnection,
    name: &str,
    email: &str,
    pw: &str,
    verified: bool,
) -> kid::Model {
    let now = Utc::now();
    kid::ActiveModel {
        name: Set(name.to_string()),
        email: Set(Some(email.to_string())),
        password_hash: Set(Some(password::hash_password(pw).unwrap())),
        is_verified: Set(verified),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to seed kid")
}

pub async fn seed_comic(
    db: &DatabaseConnection,
    title: &str,
    total_marks: i32,
    bonus: i32,
    deadline: Option<DateTime<Utc>>,
    max_uploads: i32,
) -> comic::Model {
    let now = Utc::now();
    comic::ActiveModel {
        title: Set(title.to_string()),
        subtitle: Set("Subtitle".to_string()),
        description: Set("Description".to_string()),
        image: Set(String::new()),
        submission_deadline: Set(deadline),
        bonus: Set(bonus),
        total_marks: Set(total_marks),
        max_uploads: Set(max_uploads),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to seed comic")
}

pub async fn seed_submission(
    db: &DatabaseConnection,
    kid_id: i64,
    comic_id: i64,
    marks: Option<i32>,
    created_at: DateTime<Utc>,
) -> submission::Model {
    submission::ActiveModel {
        kid_id: Set(kid_id),
        comic_id: Set(comic_id),
        files: Set("[]".to_string()),
        marks: Set(marks),
        status: Set(if marks.is_some() {
            SubmissionStatus::Graded
        } else {
            SubmissionStatus::Pending
        }),
        submission_date: Set(created_at),
        created_at: Set(created_at),
        updated_at: Set(created_at),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to seed submission")
}
