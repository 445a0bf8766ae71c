use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::any::Any;

pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "message": "API is running smoothly!"
    }))
}

/// Panic handler for the health route.
pub fn unhealthy_response(err: Box<dyn Any + Send + 'static>) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "status": "unhealthy",
            "message": panic_message(err.as_ref())
        })),
    )
        .into_response()
}

pub(crate) fn panic_message(err: &(dyn Any + Send)) -> String {
    if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic message".to_string()
    }
}
