//! Authentication routes under `/api/auth`.
//!
//! Holds the unified login endpoint that serves both admins and kids from
//! one request shape.

use axum::{Router, routing::post};
use common::state::AppState;

pub mod post;

use post::login;

/// Builds the `/auth` route group.
///
/// Routes:
/// - `POST /auth/login` → unified admin/kid login
pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/login", post(login))
}
