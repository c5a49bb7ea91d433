//! Image upload handlers.
//!
//! Files are checked by extension, size, and header sniffing, then written to
//! the configured upload directory under a generated name and served back
//! from `/uploads/<name>`.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use bazaar_core::images::UPLOADS_PATH;
use bazaar_core::upload::{
    check_upload, sniff_image_dimensions, stored_upload_name, MAX_FILES_PER_REQUEST,
};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAuth;
use crate::response::DataResponse;
use crate::state::AppState;

/// Metadata returned for every stored file.
#[derive(Debug, Serialize)]
pub struct UploadedFile {
    /// Absolute URL the file is served from.
    pub url: String,
    /// Stored name; also accepted wherever an image list is expected.
    pub filename: String,
    pub original_name: String,
    pub size: usize,
    pub width: u32,
    pub height: u32,
}

/// A received file that passed every check but is not yet on disk.
struct CheckedFile {
    original_name: String,
    ext: String,
    data: Vec<u8>,
    width: u32,
    height: u32,
}

/// Drain the multipart stream, keeping the fields named in `accept`.
async fn collect_files(
    multipart: &mut Multipart,
    accept: &[&str],
    max_bytes: usize,
) -> AppResult<Vec<CheckedFile>> {
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        if !accept.contains(&name.as_str()) {
            continue;
        }
        if files.len() == MAX_FILES_PER_REQUEST {
            return Err(AppError::BadRequest(format!(
                "At most {MAX_FILES_PER_REQUEST} files may be uploaded at once"
            )));
        }

        let original_name = field.file_name().unwrap_or("").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        let ext = check_upload(&original_name, data.len(), max_bytes)?;
        let (width, height) = sniff_image_dimensions(&data, &ext)?;
        files.push(CheckedFile {
            original_name,
            ext,
            data: data.to_vec(),
            width,
            height,
        });
    }
    Ok(files)
}

async fn store(state: &AppState, files: Vec<CheckedFile>) -> AppResult<Vec<UploadedFile>> {
    let dir = &state.config.upload_dir;
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

    let mut stored = Vec::with_capacity(files.len());
    for file in files {
        let filename = stored_upload_name(&file.ext, chrono::Utc::now());
        tokio::fs::write(dir.join(&filename), &file.data)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        tracing::debug!(filename = %filename, size = file.data.len(), "Upload stored");
        stored.push(UploadedFile {
            url: format!("{}{UPLOADS_PATH}/{filename}", state.config.public_base_url),
            filename,
            original_name: file.original_name,
            size: file.data.len(),
            width: file.width,
            height: file.height,
        });
    }
    Ok(stored)
}

/// POST /api/upload
///
/// Multipart form with a single `file` field.
pub async fn upload_single(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<UploadedFile>>)> {
    let mut files = collect_files(&mut multipart, &["file"], state.config.max_upload_bytes).await?;
    if files.len() != 1 {
        return Err(AppError::BadRequest(
            "Expected exactly one 'file' field".into(),
        ));
    }
    let file = files.remove(0);
    let mut stored = store(&state, vec![file]).await?;

    tracing::info!(user_id = user.user_id, "Image uploaded");
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: stored.remove(0),
        }),
    ))
}

/// POST /api/upload-multiple
///
/// Multipart form with up to ten `files` fields. Nothing is stored unless
/// every file is acceptable.
pub async fn upload_multiple(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<Vec<UploadedFile>>>)> {
    let files = collect_files(
        &mut multipart,
        &["files", "files[]"],
        state.config.max_upload_bytes,
    )
    .await?;
    if files.is_empty() {
        return Err(AppError::BadRequest("Missing 'files' field".into()));
    }
    let stored = store(&state, files).await?;

    tracing::info!(user_id = user.user_id, count = stored.len(), "Images uploaded");
    Ok((StatusCode::CREATED, Json(DataResponse { data: stored })))
}
