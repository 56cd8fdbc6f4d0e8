//! Request/response types and helpers shared across route groups.

use axum::extract::Multipart;
use chrono::{DateTime, NaiveDate, Utc};
use db::models::{comic, submission};
use serde::Serialize;
use std::collections::HashMap;

/// One file received in a multipart request.
pub struct UploadedFile {
    /// Name of the multipart field the file arrived under.
    pub field: String,
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Drains a multipart body into plain text fields and uploaded files.
pub async fn collect_multipart(
    mut multipart: Multipart,
) -> Result<(HashMap<String, String>, Vec<UploadedFile>), String> {
    let mut fields = HashMap::new();
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Invalid multipart body: {e}"))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if let Some(filename) = field.file_name().map(|f| f.to_string()) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| format!("Failed to read uploaded file: {e}"))?
                .to_vec();
            files.push(UploadedFile {
                field: name,
                filename,
                bytes,
            });
        } else {
            let text = field
                .text()
                .await
                .map_err(|e| format!("Failed to read field: {e}"))?;
            fields.insert(name, text);
        }
    }

    Ok((fields, files))
}

/// Parses a client-supplied date, accepting either RFC 3339 timestamps or
/// plain `YYYY-MM-DD` dates (interpreted as midnight UTC).
pub fn parse_date_input(input: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(input, "%Y-%m-%d").ok()?;
    Some(DateTime::from_naive_utc_and_offset(
        date.and_hms_opt(0, 0, 0)?,
        Utc,
    ))
}

/// Fallback avatar URL for accounts without an uploaded image.
pub fn default_avatar(name: &str) -> String {
    format!(
        "https://ui-avatars.com/api/?name={}&background=random",
        name.replace(' ', "+")
    )
}

/// Expands a comic's stored document JSON into its list of URLs.
pub fn parse_document_urls(raw: Option<&str>) -> Vec<String> {
    raw.and_then(|raw| serde_json::from_str::<Vec<String>>(raw).ok())
        .unwrap_or_default()
}

/// A comic as returned to clients, with the stored document JSON expanded
/// into a list of URLs.
#[derive(Debug, Serialize)]
pub struct ComicResponse {
    pub id: i64,
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub image: String,
    pub category: Option<String>,
    pub submission_deadline: Option<DateTime<Utc>>,
    pub bonus: i32,
    pub total_marks: i32,
    pub max_uploads: i32,
    pub documents: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<comic::Model> for ComicResponse {
    fn from(model: comic::Model) -> Self {
        let documents = parse_document_urls(model.document.as_deref());
        Self {
            id: model.id,
            title: model.title,
            subtitle: model.subtitle,
            description: model.description,
            image: model.image,
            category: model.category,
            submission_deadline: model.submission_deadline,
            bonus: model.bonus,
            total_marks: model.total_marks,
            max_uploads: model.max_uploads,
            documents,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// A submission as returned to clients, with the stored file JSON expanded
/// into a list of URLs.
#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub id: i64,
    pub kid_id: i64,
    pub comic_id: i64,
    pub description: Option<String>,
    pub comments: Option<String>,
    pub files: Vec<String>,
    pub marks: Option<i32>,
    pub status: submission::SubmissionStatus,
    pub submission_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<submission::Model> for SubmissionResponse {
    fn from(model: submission::Model) -> Self {
        let files = serde_json::from_str::<Vec<String>>(&model.files).unwrap_or_default();
        Self {
            id: model.id,
            kid_id: model.kid_id,
            comic_id: model.comic_id,
            description: model.description,
            comments: model.comments,
            files,
            marks: model.marks,
            status: model.status,
            submission_date: model.submission_date,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
