mod helpers;

use api::auth::Role;
use axum::{
    body::Body,
    http::{
        Request, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
};
use chrono::{Duration, TimeZone, Utc};
use db::models::kid;
use db::test_utils::setup_test_db;
use helpers::{
    bearer, get_json_body, json_request, make_app, multipart_body, seed_comic, seed_email_kid,
    seed_phone_kid, seed_submission,
};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde_json::json;
use serial_test::serial;
use tower::ServiceExt;

#[tokio::test]
#[serial]
async fn check_profile_logs_in_by_phone_and_dob() {
    let db = setup_test_db().await;
    let dob = Utc.with_ymd_and_hms(2015, 6, 1, 0, 0, 0).unwrap();
    let kid = seed_phone_kid(&db, "Lebo", "+27821234567", dob).await;

    let app = make_app(db.clone());
    let payload = json!({"parent_phone": "+27821234567", "date_of_birth": "2015-06-01"});
    let response = app
        .oneshot(json_request("POST", "/api/kid/check", &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = get_json_body(response).await;
    assert_eq!(body["data"]["kid"]["name"], "Lebo");
    assert!(body["data"]["token"].as_str().is_some());

    let refreshed = kid::Entity::find_by_id(kid.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert!(refreshed.last_login.is_some());
}

#[tokio::test]
#[serial]
async fn check_profile_rejects_unknown_phone_and_wrong_dob() {
    let db = setup_test_db().await;
    let dob = Utc.with_ymd_and_hms(2015, 6, 1, 0, 0, 0).unwrap();
    seed_phone_kid(&db, "Lebo", "+27821234567", dob).await;

    let app = make_app(db.clone());
    let payload = json!({"parent_phone": "+27829999999", "date_of_birth": "2015-06-01"});
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/kid/check", &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = get_json_body(response).await;
    assert_eq!(body["message"], "This phone number is not registered");

    let payload = json!({"parent_phone": "+27821234567", "date_of_birth": "2014-01-01"});
    let response = app
        .oneshot(json_request("POST", "/api/kid/check", &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = get_json_body(response).await;
    assert_eq!(body["message"], "Invalid date of birth");
}

#[tokio::test]
#[serial]
async fn create_kid_requires_confirmation_and_unique_phone() {
    let db = setup_test_db().await;
    let app = make_app(db.clone());

    let unconfirmed = json!({
        "name": "Zia", "parent_phone": "+27825550000",
        "date_of_birth": "2016-02-10", "confirm": false
    });
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/kid/create", &unconfirmed))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = get_json_body(response).await;
    assert_eq!(body["message"], "Profile creation must be confirmed");

    let confirmed = json!({
        "name": "Zia", "parent_phone": "+27825550000",
        "date_of_birth": "2016-02-10", "confirm": true
    });
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/kid/create", &confirmed))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = get_json_body(response).await;
    assert_eq!(body["message"], "Kid profile created successfully");
    assert!(body["data"]["token"].as_str().is_some());

    let response = app
        .oneshot(json_request("POST", "/api/kid/create", &confirmed))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = get_json_body(response).await;
    assert_eq!(body["message"], "A profile with this parent phone already exists");
}

#[tokio::test]
#[serial]
async fn signup_rejects_duplicate_email() {
    let db = setup_test_db().await;
    seed_email_kid(&db, "Sam", "sam@example.com", "kidpass123", true).await;

    let app = make_app(db);
    let payload = json!({
        "full_name": "Sam Again", "email": "sam@example.com", "password": "kidpass456"
    });
    let response = app
        .oneshot(json_request("POST", "/api/kid/signup", &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = get_json_body(response).await;
    assert_eq!(body["message"], "A kid with this email already exists");
}

async fn seed_unverified_kid(
    db: &sea_orm::DatabaseConnection,
    email: &str,
    code: &str,
    expires_in_minutes: i64,
) -> kid::Model {
    let base = seed_email_kid(db, "Pending", email, "kidpass123", false).await;
    kid::ActiveModel {
        id: Set(base.id),
        verification_code: Set(Some(code.to_string())),
        verification_code_expires: Set(Some(Utc::now() + Duration::minutes(expires_in_minutes))),
        ..Default::default()
    }
    .update(db)
    .await
    .unwrap()
}

#[tokio::test]
#[serial]
async fn verify_email_checks_code_and_expiry() {
    let db = setup_test_db().await;
    seed_unverified_kid(&db, "new@example.com", "123456", 10).await;

    let app = make_app(db.clone());

    let wrong = json!({"email": "new@example.com", "code": "654321"});
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/kid/verify-email", &wrong))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = get_json_body(response).await;
    assert_eq!(body["message"], "Invalid verification code");

    let right = json!({"email": "new@example.com", "code": "123456"});
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/kid/verify-email", &right))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = get_json_body(response).await;
    assert_eq!(body["message"], "Email verified successfully");

    // The code is single-use.
    let response = app
        .oneshot(json_request("POST", "/api/kid/verify-email", &right))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = get_json_body(response).await;
    assert_eq!(body["message"], "Email already verified");
}

#[tokio::test]
#[serial]
async fn verify_email_rejects_expired_code() {
    let db = setup_test_db().await;
    seed_unverified_kid(&db, "late@example.com", "123456", -1).await;

    let app = make_app(db);
    let payload = json!({"email": "late@example.com", "code": "123456"});
    let response = app
        .oneshot(json_request("POST", "/api/kid/verify-email", &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = get_json_body(response).await;
    assert_eq!(body["message"], "Verification code expired");
}

#[tokio::test]
#[serial]
async fn complete_profile_requires_verification_and_issues_token() {
    let db = setup_test_db().await;
    seed_email_kid(&db, "Unverified", "no@example.com", "kidpass123", false).await;
    seed_email_kid(&db, "Verified", "yes@example.com", "kidpass123", true).await;

    let app = make_app(db);

    let blocked = json!({"email": "no@example.com", "father_name": "Joe"});
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/kid/complete-profile", &blocked))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = get_json_body(response).await;
    assert_eq!(body["message"], "User not found or not verified");

    let allowed = json!({
        "email": "yes@example.com", "father_name": "Joe", "mother_name": "Ana",
        "gender": "female", "date_of_birth": "2014-09-20"
    });
    let response = app
        .oneshot(json_request("POST", "/api/kid/complete-profile", &allowed))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = get_json_body(response).await;
    assert_eq!(body["message"], "Profile completed successfully");
    assert!(body["data"]["token"].as_str().is_some());
    assert_eq!(body["data"]["kid"]["father_name"], "Joe");
}

#[tokio::test]
#[serial]
async fn dashboard_ranks_kids_and_reports_percentages() {
    let db = setup_test_db().await;
    let deadline = Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).unwrap();
    let comic = seed_comic(&db, "Space Pirates", 100, 20, Some(deadline), 1).await;

    let early = seed_email_kid(&db, "Early", "early@example.com", "kidpass123", true).await;
    let empty = seed_email_kid(&db, "Empty", "empty@example.com", "kidpass123", true).await;

    // Graded 80, submitted before the deadline, so bonus applies: score 100.
    let before = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
    seed_submission(&db, early.id, comic.id, Some(80), before).await;

    let app = make_app(db.clone());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/kid/dashboard")
                .header(AUTHORIZATION, bearer(early.id, Role::Kid))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = get_json_body(response).await;
    let data = &body["data"];
    assert_eq!(data["kid_name"], "Early");
    assert_eq!(data["rank"], 1);
    assert_eq!(data["standing"], 1);
    assert_eq!(data["overall_percentage"], 100.0);
    assert_eq!(data["comics_read"], 1);
    assert_eq!(data["recent_progress"][0]["progress"], 80.0);
    assert_eq!(data["recent_progress"][0]["marks"], 80);
    assert_eq!(data["recent_progress"][0]["title"], "Space Pirates");

    // The kid with no submissions comes second with 0%.
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/kid/dashboard")
                .header(AUTHORIZATION, bearer(empty.id, Role::Kid))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = get_json_body(response).await;
    assert_eq!(body["data"]["rank"], 2);
    assert_eq!(body["data"]["overall_percentage"], 0.0);
    assert_eq!(body["data"]["comics_read"], 0);
}

#[tokio::test]
#[serial]
async fn dashboard_reports_zero_percentage_without_comics() {
    let db = setup_test_db().await;
    let kid = seed_email_kid(&db, "Solo", "solo@example.com", "kidpass123", true).await;

    let app = make_app(db);
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/kid/dashboard")
                .header(AUTHORIZATION, bearer(kid.id, Role::Kid))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = get_json_body(response).await;
    assert_eq!(body["data"]["overall_percentage"], 0.0);
    assert_eq!(body["data"]["rank"], 1);
}

#[tokio::test]
#[serial]
async fn dashboard_rejects_missing_kid_and_wrong_role() {
    let db = setup_test_db().await;
    let app = make_app(db);

    // Token for a kid that was deleted after issuing.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/kid/dashboard")
                .header(AUTHORIZATION, bearer(999, Role::Kid))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = get_json_body(response).await;
    assert_eq!(body["message"], "Kid not found in records");

    // Admin tokens are not accepted on kid-only routes.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/kid/dashboard")
                .header(AUTHORIZATION, bearer(1, Role::Admin))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // No token at all.
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/kid/dashboard")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[serial]
async fn submit_stores_files_and_blocks_duplicates() {
    let db = setup_test_db().await;
    let comic = seed_comic(&db, "Moon Base", 50, 0, None, 2).await;
    let kid = seed_email_kid(&db, "Sam", "sam@example.com", "kidpass123", true).await;

    let app = make_app(db.clone());

    let (content_type, body) = multipart_body(
        &[
            ("comic_id", &comic.id.to_string()),
            ("description", "My drawing"),
        ],
        &[("files", "page1.png", b"fake image bytes")],
    );
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/kid/submit")
                .header(AUTHORIZATION, bearer(kid.id, Role::Kid))
                .header(CONTENT_TYPE, &content_type)
                .body(Body::from(body.clone()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = get_json_body(response).await;
    assert_eq!(json["message"], "Assignment submitted successfully");
    assert_eq!(json["data"]["status"], "pending");
    let file_url = json["data"]["files"][0].as_str().unwrap().to_string();
    assert!(file_url.starts_with("/api/uploads/submissions/"));

    // The stored file is served back.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(&file_url)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let served = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&served[..], b"fake image bytes");

    // One submission per comic per kid.
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/kid/submit")
                .header(AUTHORIZATION, bearer(kid.id, Role::Kid))
                .header(CONTENT_TYPE, &content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_json_body(response).await;
    assert_eq!(json["message"], "You have already submitted for this comic.");
}

#[tokio::test]
#[serial]
async fn submit_enforces_upload_cap_and_comic_existence() {
    let db = setup_test_db().await;
    let comic = seed_comic(&db, "Tight", 50, 0, None, 1).await;
    let kid = seed_email_kid(&db, "Sam", "sam@example.com", "kidpass123", true).await;

    let app = make_app(db);

    let (content_type, body) = multipart_body(
        &[("comic_id", &comic.id.to_string())],
        &[
            ("files", "a.png", b"one"),
            ("files", "b.png", b"two"),
        ],
    );
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/kid/submit")
                .header(AUTHORIZATION, bearer(kid.id, Role::Kid))
                .header(CONTENT_TYPE, &content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_json_body(response).await;
    assert_eq!(json["message"], "Maximum 1 files allowed for this assignment");

    let (content_type, body) = multipart_body(&[("comic_id", "424242")], &[]);
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/kid/submit")
                .header(AUTHORIZATION, bearer(kid.id, Role::Kid))
                .header(CONTENT_TYPE, &content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = get_json_body(response).await;
    assert_eq!(json["message"], "Comic not found");
}

#[tokio::test]
#[serial]
async fn lists_own_submissions_for_a_comic_newest_first() {
    let db = setup_test_db().await;
    let comic = seed_comic(&db, "Moon Base", 50, 0, None, 1).await;
    let kid = seed_email_kid(&db, "Sam", "sam@example.com", "kidpass123", true).await;
    let other = seed_email_kid(&db, "Other", "other@example.com", "kidpass123", true).await;

    let t = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
    seed_submission(&db, kid.id, comic.id, Some(40), t).await;
    seed_submission(&db, other.id, comic.id, None, t).await;

    let app = make_app(db);
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/api/kid/submissions/{}", comic.id))
                .header(AUTHORIZATION, bearer(kid.id, Role::Kid))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = get_json_body(response).await;
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["kid_id"], kid.id);
    assert_eq!(data[0]["marks"], 40);
}

#[tokio::test]
#[serial]
async fn profile_update_changes_fields_and_guards_password() {
    let db = setup_test_db().await;
    let kid = seed_email_kid(&db, "Sam", "sam@example.com", "kidpass123", true).await;

    let app = make_app(db.clone());

    let (content_type, body) = multipart_body(&[("name", "Samuel")], &[]);
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/kid/profile")
                .header(AUTHORIZATION, bearer(kid.id, Role::Kid))
                .header(CONTENT_TYPE, &content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_json_body(response).await;
    assert_eq!(json["data"]["kid_name"], "Samuel");

    let (content_type, body) = multipart_body(
        &[("old_password", "wrong"), ("new_password", "newpass456")],
        &[],
    );
    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/kid/profile")
                .header(AUTHORIZATION, bearer(kid.id, Role::Kid))
                .header(CONTENT_TYPE, &content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = get_json_body(response).await;
    assert_eq!(json["message"], "Invalid old password");
}

#[tokio::test]
#[serial]
async fn profile_update_rejects_taken_email_and_phone() {
    let db = setup_test_db().await;
    let kid = seed_email_kid(&db, "Sam", "sam@example.com", "kidpass123", true).await;
    seed_email_kid(&db, "Other", "other@example.com", "kidpass123", true).await;
    let dob = Utc.with_ymd_and_hms(2015, 6, 1, 0, 0, 0).unwrap();
    seed_phone_kid(&db, "Lebo", "+27821234567", dob).await;

    let app = make_app(db.clone());

    let (content_type, body) = multipart_body(&[("email", "other@example.com")], &[]);
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/kid/profile")
                .header(AUTHORIZATION, bearer(kid.id, Role::Kid))
                .header(CONTENT_TYPE, &content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = get_json_body(response).await;
    assert_eq!(json["message"], "A kid with this email already exists");

    let (content_type, body) = multipart_body(&[("parent_phone", "+27821234567")], &[]);
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/kid/profile")
                .header(AUTHORIZATION, bearer(kid.id, Role::Kid))
                .header(CONTENT_TYPE, &content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = get_json_body(response).await;
    assert_eq!(
        json["message"],
        "A profile with this parent phone already exists"
    );

    // Re-submitting your own email is not a conflict.
    let (content_type, body) = multipart_body(&[("email", "sam@example.com")], &[]);
    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/kid/profile")
                .header(AUTHORIZATION, bearer(kid.id, Role::Kid))
                .header(CONTENT_TYPE, &content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
#[serial]
async fn profile_update_removes_replaced_avatar() {
    let db = setup_test_db().await;
    let kid = seed_email_kid(&db, "Sam", "sam@example.com", "kidpass123", true).await;

    let app = make_app(db.clone());

    let put_avatar = |content_type: String, body: Vec<u8>| {
        Request::builder()
            .method("PUT")
            .uri("/api/kid/profile")
            .header(AUTHORIZATION, bearer(kid.id, Role::Kid))
            .header(CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .unwrap()
    };

    let (content_type, body) = multipart_body(&[], &[("avatar", "first.png", b"first avatar")]);
    let response = app
        .clone()
        .oneshot(put_avatar(content_type, body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_json_body(response).await;
    let first_url = json["data"]["avatar"].as_str().unwrap().to_string();
    assert!(first_url.starts_with("/api/uploads/avatars/"));

    let (content_type, body) = multipart_body(&[], &[("avatar", "second.png", b"second avatar")]);
    let response = app
        .clone()
        .oneshot(put_avatar(content_type, body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_json_body(response).await;
    let second_url = json["data"]["avatar"].as_str().unwrap().to_string();
    assert_ne!(first_url, second_url);

    // The replaced file is gone; the new one is served.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(&first_url)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(&second_url)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
