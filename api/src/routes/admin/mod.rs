//! # Admin Routes Module
//!
//! Defines and wires up routes for the `/api/admin` endpoint group.
//!
//! ## Structure
//! - `post.rs` — POST handlers (login, create comic/kid, grade submission)
//! - `get.rs` — GET handlers (comics, kids, submissions, stats)
//! - `put.rs` — PUT handlers (edit comic, own profile)
//! - `delete.rs` — DELETE handlers (remove comic)
//!
//! Comic reads are open to any authenticated user so kids can browse the
//! catalog; everything else is admin only.

use axum::{
    Router,
    middleware::from_fn,
    routing::{delete, get, post, put},
};
use common::state::AppState;

use crate::auth::guards::{allow_admin, allow_authenticated};

pub mod delete;
pub mod get;
pub mod post;
pub mod put;

use delete::delete_comic;
use get::{get_comic, get_comics, get_dashboard_stats, get_kids, get_notifications, get_submissions};
use post::{admin_login, create_comic, create_kid, grade_submission};
use put::{update_admin_profile, update_comic};

/// Builds the `/admin` route group.
///
/// Routes:
/// - `POST   /admin/login`          → admin login (public)
/// - `GET    /admin/comics`         → list comics (authenticated)
/// - `GET    /admin/comics/{comic_id}` → single comic (authenticated)
/// - `POST   /admin/comics`         → create comic (admin only)
/// - `PUT    /admin/comics/{comic_id}` → edit comic (admin only)
/// - `DELETE /admin/comics/{comic_id}` → delete comic (admin only)
/// - `GET    /admin/stats`          → dashboard counts and activity chart (admin only)
/// - `GET    /admin/notifications`  → pending submission count (admin only)
/// - `GET    /admin/kids`           → list kids (admin only)
/// - `POST   /admin/kids`           → create kid (admin only)
/// - `GET    /admin/submissions`    → list all submissions (admin only)
/// - `POST   /admin/submissions/{submission_id}/grade` → grade (admin only)
/// - `PUT    /admin/profile`        → update own profile (admin only)
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(admin_login))
        .route(
            "/comics",
            get(get_comics).route_layer(from_fn(allow_authenticated)),
        )
        .route(
            "/comics/{comic_id}",
            get(get_comic).route_layer(from_fn(allow_authenticated)),
        )
        .route(
            "/comics",
            post(create_comic).route_layer(from_fn(allow_admin)),
        )
        .route(
            "/comics/{comic_id}",
            put(update_comic).route_layer(from_fn(allow_admin)),
        )
        .route(
            "/comics/{comic_id}",
            delete(delete_comic).route_layer(from_fn(allow_admin)),
        )
        .route(
            "/stats",
            get(get_dashboard_stats).route_layer(from_fn(allow_admin)),
        )
        .route(
            "/notifications",
            get(get_notifications).route_layer(from_fn(allow_admin)),
        )
        .route("/kids", get(get_kids).route_layer(from_fn(allow_admin)))
        .route("/kids", post(create_kid).route_layer(from_fn(allow_admin)))
        .route(
            "/submissions",
            get(get_submissions).route_layer(from_fn(allow_admin)),
        )
        .route(
            "/submissions/{submission_id}/grade",
            post(grade_submission).route_layer(from_fn(allow_admin)),
        )
        .route(
            "/profile",
            put(update_admin_profile).route_layer(from_fn(allow_admin)),
        )
}
