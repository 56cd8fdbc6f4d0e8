//! # Kid Routes Module
//!
//! Defines and wires up routes for the `/api/kid` endpoint group.
//!
//! ## Structure
//! - `post.rs` — POST handlers (login flows, signup steps, submissions)
//! - `get.rs` — GET handlers (dashboard, own submissions)
//! - `put.rs` — PUT handlers (profile update)
//!
//! The signup and login endpoints are public; everything else requires a
//! kid token.

use axum::{
    Router,
    middleware::from_fn,
    routing::{get, post, put},
};
use common::state::AppState;

use crate::auth::guards::allow_kid;

pub mod get;
pub mod post;
pub mod put;

use get::{get_comic_submissions, get_dashboard};
use post::{check_profile, complete_profile, create_kid, signup, submit_assignment, verify_email};
use put::update_profile;

/// Builds the `/kid` route group.
///
/// Routes:
/// - `POST /kid/check`            → phone + date-of-birth login (public)
/// - `POST /kid/create`           → phone-based profile creation (public)
/// - `POST /kid/signup`           → email signup step 1 (public)
/// - `POST /kid/verify-email`     → email signup step 2 (public)
/// - `POST /kid/complete-profile` → email signup step 3 (public)
/// - `GET  /kid/dashboard`        → ranking and progress stats (kid only)
/// - `POST /kid/submit`           → submit work for a comic (kid only)
/// - `GET  /kid/submissions/{comic_id}` → own submissions (kid only)
/// - `PUT  /kid/profile`          → update own profile (kid only)
pub fn kid_routes() -> Router<AppState> {
    Router::new()
        .route("/check", post(check_profile))
        .route("/create", post(create_kid))
        .route("/signup", post(signup))
        .route("/verify-email", post(verify_email))
        .route("/complete-profile", post(complete_profile))
        .route("/dashboard", get(get_dashboard).route_layer(from_fn(allow_kid)))
        .route("/submit", post(submit_assignment).route_layer(from_fn(allow_kid)))
        .route(
            "/submissions/{comic_id}",
            get(get_comic_submissions).route_layer(from_fn(allow_kid)),
        )
        .route("/profile", put(update_profile).route_layer(from_fn(allow_kid)))
}
