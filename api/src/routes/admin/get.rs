//! Admin read endpoints: comic catalog, kids, submissions, dashboard stats.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Duration, Local, Timelike, Utc};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use std::collections::HashMap;

use crate::response::ApiResponse;
use crate::routes::common::{ComicResponse, SubmissionResponse, default_avatar};
use crate::services::activity::{
    ActivityBucket, KidActivity, daily_activity, monthly_activity, weekly_activity,
};
use common::state::AppState;
use db::models::submission::SubmissionStatus;
use db::models::{admin, comic, kid, submission};

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
pub struct ComicWithStats {
    #[serde(flatten)]
    pub comic: ComicResponse,
    pub submission_count: u64,
    pub total_kids: u64,
}

/// GET /api/admin/comics
///
/// Lists all comics newest first, each with its submission count and the
/// total number of kids on the platform (used by progress displays).
pub async fn get_comics(State(app_state): State<AppState>) -> Response {
    let db = app_state.db();

    let comics = match comic::Entity::find()
        .order_by_desc(comic::Column::CreatedAt)
        .all(db)
        .await
    {
        Ok(comics) => comics,
        Err(e) => return db_error(e),
    };

    let submissions = match submission::Entity::find().all(db).await {
        Ok(subs) => subs,
        Err(e) => return db_error(e),
    };
    let mut counts: HashMap<i64, u64> = HashMap::new();
    for sub in &submissions {
        *counts.entry(sub.comic_id).or_default() += 1;
    }

    let total_kids = match kid::Entity::find().count(db).await {
        Ok(count) => count,
        Err(e) => return db_error(e),
    };

    let data: Vec<ComicWithStats> = comics
        .into_iter()
        .map(|c| {
            let submission_count = counts.get(&c.id).copied().unwrap_or(0);
            ComicWithStats {
                comic: ComicResponse::from(c),
                submission_count,
                total_kids,
            }
        })
        .collect();

    (
        StatusCode::OK,
        Json(ApiResponse::success(data, "Comics retrieved")),
    )
        .into_response()
}

/// GET /api/admin/comics/{comic_id}
///
/// Fetches a single comic.
///
/// ### Responses
///
/// - `200 OK` → the comic
/// - `404 Not Found` → `"Comic not found"`
pub async fn get_comic(
    State(app_state): State<AppState>,
    Path(comic_id): Path<i64>,
) -> Response {
    match comic::Entity::find_by_id(comic_id).one(app_state.db()).await {
        Ok(Some(comic)) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                ComicResponse::from(comic),
                "Comic retrieved",
            )),
        )
            .into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "Comic not found"),
        Err(e) => db_error(e),
    }
}

#[derive(Debug, Serialize)]
pub struct ChartData {
    pub monthly: Vec<ActivityBucket>,
    pub weekly: Vec<ActivityBucket>,
    pub daily: Vec<ActivityBucket>,
}

#[derive(Debug, Serialize)]
pub struct DashboardStatsResponse {
    pub total_comics: u64,
    pub total_submissions: u64,
    pub total_kids: u64,
    pub total_admins: u64,
    pub greeting: String,
    pub chart_data: ChartData,
}

/// GET /api/admin/stats
///
/// Entity counts, a time-of-day greeting, and the monthly/weekly/daily
/// activity chart. Kid activity rows are fetched once and bucketed in
/// memory.
pub async fn get_dashboard_stats(State(app_state): State<AppState>) -> Response {
    let db = app_state.db();

    let total_comics = match comic::Entity::find().count(db).await {
        Ok(n) => n,
        Err(e) => return db_error(e),
    };
    let total_submissions = match submission::Entity::find().count(db).await {
        Ok(n) => n,
        Err(e) => return db_error(e),
    };
    let total_kids = match kid::Entity::find().count(db).await {
        Ok(n) => n,
        Err(e) => return db_error(e),
    };
    let total_admins = match admin::Entity::find().count(db).await {
        Ok(n) => n,
        Err(e) => return db_error(e),
    };

    let hour = Local::now().hour();
    let greeting = if hour < 12 {
        "Good Morning"
    } else if hour < 18 {
        "Good Afternoon"
    } else {
        "Good Evening"
    };

    let kids = match kid::Entity::find().all(db).await {
        Ok(kids) => kids,
        Err(e) => return db_error(e),
    };
    let activity: Vec<KidActivity> = kids
        .iter()
        .map(|k| KidActivity {
            created_at: k.created_at,
            last_login: k.last_login,
        })
        .collect();

    let now_local = Local::now();
    let chart_data = ChartData {
        monthly: monthly_activity(&activity, Utc::now()),
        weekly: weekly_activity(&activity, &now_local),
        daily: daily_activity(&activity, &now_local),
    };

    let response = DashboardStatsResponse {
        total_comics,
        total_submissions,
        total_kids,
        total_admins,
        greeting: greeting.to_string(),
        chart_data,
    };

    (
        StatusCode::OK,
        Json(ApiResponse::success(response, "Dashboard stats retrieved")),
    )
        .into_response()
}

#[derive(Debug, Serialize, Default)]
pub struct NotificationsResponse {
    pub pending_count: u64,
}

/// GET /api/admin/notifications
///
/// Number of submissions still waiting for a grade.
pub async fn get_notifications(State(app_state): State<AppState>) -> Response {
    let result = submission::Entity::find()
        .filter(submission::Column::Status.eq(SubmissionStatus::Pending))
        .count(app_state.db())
        .await;

    match result {
        Ok(pending_count) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                NotificationsResponse { pending_count },
                "Notifications retrieved",
            )),
        )
            .into_response(),
        Err(e) => db_error(e),
    }
}

#[derive(Debug, Serialize)]
pub struct KidSummary {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub avatar: String,
    pub gender: Option<String>,
    pub father_name: Option<String>,
    pub mother_name: Option<String>,
    pub date_of_birth: Option<DateTime<Utc>>,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub status: String,
    pub submissions: u64,
}

/// GET /api/admin/kids
///
/// Lists all kids ordered by name. A kid counts as `Active` when their
/// last login falls within the past seven days (local day boundary).
pub async fn get_kids(State(app_state): State<AppState>) -> Response {
    let db = app_state.db();

    let kids = match kid::Entity::find()
        .order_by_asc(kid::Column::Name)
        .all(db)
        .await
    {
        Ok(kids) => kids,
        Err(e) => return db_error(e),
    };

    let submissions = match submission::Entity::find().all(db).await {
        Ok(subs) => subs,
        Err(e) => return db_error(e),
    };
    let mut counts: HashMap<i64, u64> = HashMap::new();
    for sub in &submissions {
        *counts.entry(sub.kid_id).or_default() += 1;
    }

    let now_local = Local::now();
    let cutoff = (now_local - Duration::days(7))
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .unwrap();

    let data: Vec<KidSummary> = kids
        .into_iter()
        .map(|k| {
            let is_active = k
                .last_login
                .map(|ll| ll.with_timezone(&now_local.timezone()).naive_local() >= cutoff)
                .unwrap_or(false);
            KidSummary {
                avatar: k.avatar.clone().unwrap_or_else(|| default_avatar(&k.name)),
                status: if is_active { "Active" } else { "Inactive" }.to_string(),
                submissions: counts.get(&k.id).copied().unwrap_or(0),
                id: k.id,
                name: k.name,
                email: k.email,
                gender: k.gender,
                father_name: k.father_name,
                mother_name: k.mother_name,
                date_of_birth: k.date_of_birth,
                last_login: k.last_login,
                created_at: k.created_at,
            }
        })
        .collect();

    (
        StatusCode::OK,
        Json(ApiResponse::success(data, "Kids retrieved")),
    )
        .into_response()
}

#[derive(Debug, Serialize)]
pub struct KidBrief {
    pub id: i64,
    pub name: String,
    pub avatar: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ComicBrief {
    pub id: i64,
    pub title: String,
    pub image: String,
    pub subtitle: String,
}

#[derive(Debug, Serialize)]
pub struct AdminSubmission {
    #[serde(flatten)]
    pub submission: SubmissionResponse,
    pub kid: Option<KidBrief>,
    pub comic: Option<ComicBrief>,
}

/// GET /api/admin/submissions
///
/// Lists every submission newest first, each joined with a brief view of
/// its kid and comic.
pub async fn get_submissions(State(app_state): State<AppState>) -> Response {
    let db = app_state.db();

    let submissions = match submission::Entity::find()
        .order_by_desc(submission::Column::CreatedAt)
        .all(db)
        .await
    {
        Ok(subs) => subs,
        Err(e) => return db_error(e),
    };

    let kids = match kid::Entity::find().all(db).await {
        Ok(kids) => kids,
        Err(e) => return db_error(e),
    };
    let comics = match comic::Entity::find().all(db).await {
        Ok(comics) => comics,
        Err(e) => return db_error(e),
    };

    let kids_by_id: HashMap<i64, &kid::Model> = kids.iter().map(|k| (k.id, k)).collect();
    let comics_by_id: HashMap<i64, &comic::Model> = comics.iter().map(|c| (c.id, c)).collect();

    let data: Vec<AdminSubmission> = submissions
        .into_iter()
        .map(|s| {
            let kid = kids_by_id.get(&s.kid_id).map(|k| KidBrief {
                id: k.id,
                name: k.name.clone(),
                avatar: k.avatar.clone(),
                email: k.email.clone(),
            });
            let comic = comics_by_id.get(&s.comic_id).map(|c| ComicBrief {
                id: c.id,
                title: c.title.clone(),
                image: c.image.clone(),
                subtitle: c.subtitle.clone(),
            });
            AdminSubmission {
                submission: SubmissionResponse::from(s),
                kid,
                comic,
            }
        })
        .collect();

    (
        StatusCode::OK,
        Json(ApiResponse::success(data, "Submissions retrieved")),
    )
        .into_response()
}
