use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::utils::error::{ErrorCategory, KyoError};

impl KyoError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            KyoError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            KyoError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            KyoError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            KyoError::NotFound { .. } => StatusCode::NOT_FOUND,
            KyoError::ApiError(_) | KyoError::RemoteError { .. } | KyoError::DecodeError { .. } => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn category_name(category: ErrorCategory) -> &'static str {
    match category {
        ErrorCategory::Configuration => "configuration",
        ErrorCategory::Network => "network",
        ErrorCategory::Authentication => "authentication",
        ErrorCategory::Validation => "validation",
        ErrorCategory::Data => "data",
        ErrorCategory::System => "system",
    }
}

/// Renders as `{"error": {"category": ..., "message": ...}}`.
impl IntoResponse for KyoError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(
                "❌ {} (Category: {:?}, Severity: {:?})",
                self,
                self.category(),
                self.severity()
            );
        } else {
            tracing::debug!("↩️ {}: {}", status, self);
        }

        let body = json!({
            "error": {
                "category": category_name(self.category()),
                "message": self.user_friendly_message(),
            }
        });
        (status, Json(body)).into_response()
    }
}
