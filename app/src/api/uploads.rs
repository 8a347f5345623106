//! Upload endpoint and the multipart reader shared with the avatar route.
//!
//! - POST /api/uploads - Store an image (multipart field `file`)

use crate::auth::middleware::SessionUser;
use crate::server::state::AppState;
use axum::{
    Json,
    body::Bytes,
    extract::{Multipart, State, multipart::MultipartError},
    http::StatusCode,
};
use marquee_web::AppError;
use serde::Serialize;

/// One file taken from a multipart body.
#[derive(Debug)]
pub struct ImageField {
    /// Client-side file name
    pub file_name: String,
    /// Declared content type
    pub content_type: Option<String>,
    /// Contents
    pub bytes: Bytes,
}

fn multipart_error(err: &MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::payload_too_large("Upload exceeds the size limit")
    } else {
        AppError::bad_request(err.body_text())
    }
}

/// Read the field called `name`, skipping any others.
///
/// # Errors
///
/// 400 if the body is malformed or the field is missing, 413 if the body
/// limit is hit while reading.
pub async fn read_image_field(mut multipart: Multipart, name: &str) -> Result<ImageField, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(|e| multipart_error(&e))? {
        if field.name() != Some(name) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(|e| multipart_error(&e))?;
        return Ok(ImageField {
            file_name,
            content_type,
            bytes,
        });
    }
    Err(AppError::bad_request(format!("Missing file field '{name}'")))
}

/// Stored file location.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Public URL, `/uploads/<file>`
    pub url: String,
}

/// Store an image and return its URL.
pub async fn upload(
    State(state): State<AppState>,
    SessionUser(_principal): SessionUser,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let image = read_image_field(multipart, "file").await?;
    let url = state
        .uploads
        .save(&image.file_name, image.content_type.as_deref(), &image.bytes)
        .await?;
    Ok(Json(UploadResponse { url }))
}
