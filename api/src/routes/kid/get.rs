//! Kid dashboard and submission listing.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::auth::AuthUser;
use crate::response::ApiResponse;
use crate::routes::common::{SubmissionResponse, default_avatar};
use crate::services::ranking::{
    StatsError, compute_leaderboard, grand_total_marks, overall_percentage, progress_percentage,
    rank_of,
};
use common::state::AppState;
use db::models::submission::SubmissionStatus;
use db::models::{comic, kid, submission};

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

/// One entry in the dashboard's recent-progress list.
#[derive(Debug, Serialize)]
pub struct ProgressEntry {
    pub id: i64,
    pub title: String,
    pub cover: String,
    pub progress: f64,
    pub status: SubmissionStatus,
    pub submission_date: DateTime<Utc>,
    pub marks: i32,
    pub total_marks: i32,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub kid_name: String,
    pub email: Option<String>,
    pub avatar: String,
    pub parent_phone: Option<String>,
    pub date_of_birth: Option<DateTime<Utc>>,
    pub standing: usize,
    pub rank: usize,
    pub overall_percentage: f64,
    pub comics_read: usize,
    pub recent_progress: Vec<ProgressEntry>,
}

/// GET /api/kid/dashboard
///
/// Computes the querying kid's leaderboard standing, overall percentage,
/// and per-submission progress from a fresh snapshot of all kids, comics,
/// and submissions. Recording the visit in `last_login` is best-effort.
///
/// ### Responses
///
/// - `200 OK` → the dashboard payload
/// - `404 Not Found` → `"Kid not found in records"`
pub async fn get_dashboard(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> Response {
    let db = app_state.db();

    let comics = match comic::Entity::find().all(db).await {
        Ok(comics) => comics,
        Err(e) => return db_error(e),
    };
    let kids = match kid::Entity::find().all(db).await {
        Ok(kids) => kids,
        Err(e) => return db_error(e),
    };
    let pairs = match submission::Entity::find()
        .find_also_related(comic::Entity)
        .all(db)
        .await
    {
        Ok(pairs) => pairs,
        Err(e) => return db_error(e),
    };

    let mut by_kid: HashMap<i64, Vec<(submission::Model, comic::Model)>> = HashMap::new();
    for (sub, maybe_comic) in pairs {
        let Some(c) = maybe_comic else {
            let err = StatsError::MissingComic(sub.id);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string());
        };
        by_kid.entry(sub.kid_id).or_default().push((sub, c));
    }

    let grand_total = grand_total_marks(&comics);
    let leaderboard = compute_leaderboard(kids, by_kid);

    let rank = match rank_of(&leaderboard, claims.sub) {
        Ok(rank) => rank,
        Err(e) => return error_response(StatusCode::NOT_FOUND, e.to_string()),
    };
    let me = &leaderboard[rank - 1];
    let percentage = overall_percentage(me.score, grand_total);

    if let Err(e) = kid::Model::touch_last_login(db, claims.sub).await {
        tracing::warn!("Failed to update last_login for kid {}: {}", claims.sub, e);
    }

    let mut my_submissions = me.submissions.clone();
    my_submissions.sort_by(|(a, _), (b, _)| b.created_at.cmp(&a.created_at));

    let comics_read = my_submissions
        .iter()
        .map(|(s, _)| s.comic_id)
        .collect::<HashSet<_>>()
        .len();

    let recent_progress = my_submissions
        .into_iter()
        .map(|(sub, c)| {
            let marks = sub.marks.unwrap_or(0);
            let total = if c.total_marks > 0 { c.total_marks } else { 100 };
            ProgressEntry {
                id: c.id,
                title: c.title,
                cover: c.image,
                progress: progress_percentage(marks, c.total_marks),
                status: sub.status,
                submission_date: sub.submission_date,
                marks,
                total_marks: total,
            }
        })
        .collect();

    let avatar = me
        .kid
        .avatar
        .clone()
        .unwrap_or_else(|| default_avatar(&me.kid.name));

    let response = DashboardResponse {
        kid_name: me.kid.name.clone(),
        email: me.kid.email.clone(),
        avatar,
        parent_phone: me.kid.parent_phone.clone(),
        date_of_birth: me.kid.date_of_birth,
        standing: rank,
        rank,
        overall_percentage: percentage,
        comics_read,
        recent_progress,
    };

    (
        StatusCode::OK,
        Json(ApiResponse::success(response, "Dashboard stats retrieved")),
    )
        .into_response()
}

/// GET /api/kid/submissions/{comic_id}
///
/// Lists the querying kid's submissions for one comic, newest first.
pub async fn get_comic_submissions(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Path(comic_id): Path<i64>,
) -> Response {
    let result = submission::Entity::find()
        .filter(submission::Column::KidId.eq(claims.sub))
        .filter(submission::Column::ComicId.eq(comic_id))
        .order_by_desc(submission::Column::CreatedAt)
        .all(app_state.db())
        .await;

    match result {
        Ok(submissions) => {
            let data: Vec<SubmissionResponse> =
                submissions.into_iter().map(SubmissionResponse::from).collect();
            (
                StatusCode::OK,
                Json(ApiResponse::success(data, "Submissions retrieved")),
            )
                .into_response()
        }
        Err(e) => db_error(e),
    }
}
