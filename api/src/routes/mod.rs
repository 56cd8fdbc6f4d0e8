//! HTTP route entry point for `/api/...`.
//!
//! This module defines all HTTP entry points under the `/api` namespace.
//! Routes are organized by domain (authentication, admin console, kid
//! surface, health), each protected via appropriate access control
//! middleware.
//!
//! Route groups include:
//! - `/health` → Health check endpoint (public)
//! - `/auth` → Unified login (public)
//! - `/admin` → Admin console endpoints (admin-only beyond login and comic reads)
//! - `/kid` → Kid signup flows and kid-only endpoints
//! - `/uploads/{*path}` → Stored file serving (public)

use axum::{Router, routing::get};
use ::common::state::AppState;

use crate::routes::{admin::admin_routes, auth::auth_routes, health::health_routes, kid::kid_routes};
use crate::services::storage::serve_upload;

pub mod admin;
pub mod auth;
pub mod common;
pub mod health;
pub mod kid;

/// Builds the complete application router for all HTTP endpoints.
///
/// The returned router has its state applied and mounts all core API
/// routes under their respective base paths.
///
/// # Route Structure:
/// - `/health` → Health check endpoint (no authentication required).
/// - `/auth` → Unified admin/kid login.
/// - `/admin` → Comic management, kid management, submissions, stats.
/// - `/kid` → Login/signup flows, dashboard, submissions, profile.
/// - `/uploads/{*path}` → Streams stored upload files.
pub fn routes(app_state: AppState) -> Router {
    Router::new()
        .nest("/health", health_routes())
        .nest("/auth", auth_routes())
        .nest("/admin", admin_routes())
        .nest("/kid", kid_routes())
        .route("/uploads/{*path}", get(serve_upload))
        .with_state(app_state)
}
