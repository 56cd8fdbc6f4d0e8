//! File-storage service for multipart uploads.
//!
//! Uploaded files land under `STORAGE_ROOT/<subdir>/` with a generated UUID
//! filename (the original extension is kept). Callers get back a stable
//! public URL under `/api/uploads/` which `serve_upload` resolves and
//! streams.

use axum::{
    body::Body,
    extract::Path as AxumPath,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio_util::io::ReaderStream;
use uuid::Uuid;

use common::config;

/// Subdirectory for comic cover images and documents.
pub const COMICS_DIR: &str = "comics";
/// Subdirectory for kid and admin avatars.
pub const AVATARS_DIR: &str = "avatars";
/// Subdirectory for kid submission files.
pub const SUBMISSIONS_DIR: &str = "submissions";

/// Persists one uploaded file and returns its public URL.
///
/// The stored filename is a fresh UUID with the extension taken from the
/// client-supplied name (lowercased, alphanumeric extensions only).
pub async fn save_upload(
    subdir: &str,
    original_name: &str,
    bytes: &[u8],
) -> Result<String, std::io::Error> {
    let dir = PathBuf::from(config::storage_root()).join(subdir);
    fs::create_dir_all(&dir).await?;

    let filename = match sanitized_extension(original_name) {
        Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
        None => Uuid::new_v4().to_string(),
    };
    fs::write(dir.join(&filename), bytes).await?;

    Ok(format!("/api/uploads/{}/{}", subdir, filename))
}

/// Deletes a previously stored file given its public URL. Unknown or
/// foreign URLs are ignored.
pub async fn remove_upload(url: &str) {
    if let Some(rel) = url.strip_prefix("/api/uploads/") {
        if let Some(path) = resolve(rel) {
            let _ = fs::remove_file(path).await;
        }
    }
}

fn sanitized_extension(name: &str) -> Option<String> {
    let ext = Path::new(name).extension()?.to_str()?;
    if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Maps a relative upload path to a location under `STORAGE_ROOT`,
/// rejecting anything that would escape it.
fn resolve(rel: &str) -> Option<PathBuf> {
    let rel_path = Path::new(rel);
    let safe = rel_path
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if !safe {
        return None;
    }
    Some(PathBuf::from(config::storage_root()).join(rel_path))
}

/// GET /api/uploads/{*path}
///
/// Streams a stored file back to the client with a guessed MIME type.
pub async fn serve_upload(AxumPath(path): AxumPath<String>) -> Response {
    let Some(full_path) = resolve(&path) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let file = match fs::File::open(&full_path).await {
        Ok(f) => f,
        Err(_) => return StatusCode::NOT_FOUND.into_response(),
    };

    let mime = mime_guess::from_path(&full_path).first_or_octet_stream();
    let stream = ReaderStream::new(file);

    (
        [(header::CONTENT_TYPE, mime.as_ref().to_string())],
        Body::from_stream(stream),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_lowercased_and_validated() {
        assert_eq!(sanitized_extension("cover.PNG"), Some("png".into()));
        assert_eq!(sanitized_extension("report.pdf"), Some("pdf".into()));
        assert_eq!(sanitized_extension("noext"), None);
        assert_eq!(sanitized_extension("weird.t@r"), None);
    }

    #[test]
    fn resolve_rejects_traversal() {
        unsafe {
            std::env::set_var("DATABASE_PATH", "sqlite::memory:");
            std::env::set_var("JWT_SECRET", "test-secret");
            std::env::set_var("STORAGE_ROOT", "/tmp/comicroom-test-storage");
        }
        assert!(resolve("../secrets").is_none());
        assert!(resolve("comics/../../etc/passwd").is_none());
        assert!(resolve("comics/abc.png").is_some());
    }
}
