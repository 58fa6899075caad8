use std::any::Any;

use axum::{
    extract::rejection::PathRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

pub const MSG_DATA_UNAVAILABLE: &str = "فشل تحميل البيانات. يرجى المحاولة مرة أخرى لاحقاً";
pub const MSG_INTERNAL: &str = "⚠️ حدث خطأ أثناء معالجة الطلب";

/// Request-time failures, each mapped to a status and a user-facing message.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("no nurses found in city {0:?}")]
    CityNotFound(String),

    #[error("nurse data is not loaded")]
    DataUnavailable,

    #[error("not found")]
    RouteNotFound,

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error(transparent)]
    InvalidPath(#[from] PathRejection),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Error body: `{"detail": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::CityNotFound(city) => (
                StatusCode::NOT_FOUND,
                format!("❌ لا يوجد ممرضين في المدينة: {city}"),
            ),
            ApiError::DataUnavailable => {
                (StatusCode::SERVICE_UNAVAILABLE, MSG_DATA_UNAVAILABLE.to_string())
            }
            ApiError::RouteNotFound => (StatusCode::NOT_FOUND, "Not Found".to_string()),
            ApiError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                "Method Not Allowed".to_string(),
            ),
            ApiError::InvalidPath(rejection) => (rejection.status(), rejection.body_text()),
            ApiError::Internal(e) => {
                log::error!("Error processing request: {e:#}");
                (StatusCode::INTERNAL_SERVER_ERROR, MSG_INTERNAL.to_string())
            }
        };

        (status, Json(ErrorBody { detail })).into_response()
    }
}

/// Fault boundary for panics escaping a handler; the cause is only logged.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let cause = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        *s
    } else {
        "unknown panic payload"
    };
    ApiError::Internal(anyhow::anyhow!("handler panicked: {cause}")).into_response()
}
