use crate::handlers::health::panic_message;
use crate::models::{ClassificationResponse, ImageUpload};
use crate::startup::AppState;
use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use service_core::error::{AppError, ErrorResponse};
use std::any::Any;

/// Multipart field carrying the image.
pub const IMAGE_FIELD: &str = "image";

fn no_image() -> AppError {
    AppError::BadRequest(anyhow::anyhow!("No image provided"))
}

pub async fn classify_dress(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ClassificationResponse>, AppError> {
    // A body that is not multipart at all carries no image either.
    let multipart = multipart.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Request is not a multipart form");
        no_image()
    })?;

    let limit = state.config.upload.max_upload_bytes;
    let image = read_image_field(multipart, limit)
        .await?
        .ok_or_else(no_image)?;

    tracing::info!(
        size = image.data.len(),
        mime_type = %image.mime_type(),
        "Classification request received"
    );

    let response = state.classifier.classify(&image).await.map_err(|e| {
        tracing::error!(error = %e, "Classification failed");
        AppError::Upstream(e.to_string())
    })?;

    Ok(Json(ClassificationResponse { response }))
}

/// Map a multipart read failure; hitting the body limit is a 413.
fn multipart_error(e: MultipartError, context: &str, limit: usize) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        tracing::debug!(limit, "Upload exceeds the body limit");
        return AppError::PayloadTooLarge(format!(
            "Image exceeds the upload limit of {} bytes",
            limit
        ));
    }
    AppError::BadRequest(anyhow::anyhow!("{}: {}", context, e))
}

/// Read the first non-empty `image` file part, skipping every other field.
/// A plain text part named `image` is not a file and is skipped too.
async fn read_image_field(
    mut multipart: Multipart,
    limit: usize,
) -> Result<Option<ImageUpload>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, "Failed to read multipart field", limit))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, "Failed to read image bytes", limit))?;

        if data.is_empty() {
            return Ok(None);
        }

        return Ok(Some(ImageUpload {
            data: data.to_vec(),
            file_name: Some(file_name),
            content_type,
        }));
    }

    Ok(None)
}

/// Panic handler for the classification route.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic_message(err.as_ref());
    tracing::error!(panic = %message, "Classification handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: message,
            details: None,
        }),
    )
        .into_response()
}
