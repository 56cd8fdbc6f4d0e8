//! Comic deletion.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use crate::auth::guards::Empty;
use crate::response::ApiResponse;
use crate::routes::common::parse_document_urls;
use crate::services::storage;
use common::state::AppState;
use db::models::{comic, submission};

/// DELETE /api/admin/comics/{comic_id}
///
/// Deletes a comic together with all submissions made for it.
///
/// ### Responses
///
/// - `200 OK` → `"Comic deleted successfully"`
/// - `404 Not Found` → `"Comic not found"`
pub async fn delete_comic(
    State(app_state): State<AppState>,
    Path(comic_id): Path<i64>,
) -> Response {
    let db = app_state.db();

    let existing = match comic::Entity::find_by_id(comic_id).one(db).await {
        Ok(Some(comic)) => comic,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::<Empty>::error("Comic not found")),
            )
                .into_response();
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error(format!("Database error: {e}"))),
            )
                .into_response();
        }
    };

    if let Err(e) = submission::Entity::delete_many()
        .filter(submission::Column::ComicId.eq(comic_id))
        .exec(db)
        .await
    {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::<Empty>::error(format!("Database error: {e}"))),
        )
            .into_response();
    }

    match comic::Entity::delete_by_id(comic_id).exec(db).await {
        Ok(_) => {
            if !existing.image.is_empty() {
                storage::remove_upload(&existing.image).await;
            }
            for url in parse_document_urls(existing.document.as_deref()) {
                storage::remove_upload(&url).await;
            }
            (
                StatusCode::OK,
                Json(ApiResponse::success(Empty, "Comic deleted successfully")),
            )
                .into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::<Empty>::error(format!("Database error: {e}"))),
        )
            .into_response(),
    }
}
