use reqwest::Response;
use serde::Deserialize;

use crate::utils::error::KyoError;

/// Google and Cloudinary both wrap failures as `{"error": {"message": ...}}`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Status code and best-effort message of a failed response.
pub(crate) async fn read_failure(response: Response) -> (u16, String) {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|envelope| envelope.error.message)
        .ok()
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string()
            } else {
                body.trim().to_string()
            }
        });

    (status.as_u16(), message)
}

pub(crate) async fn remote_error(service: &'static str, response: Response) -> KyoError {
    let (status, message) = read_failure(response).await;
    tracing::warn!("❌ {} request failed with {}: {}", service, status, message);
    KyoError::RemoteError {
        service,
        status,
        message,
    }
}

/// Identity Toolkit appends details after the code: `"TOO_MANY_ATTEMPTS_TRY_LATER : ..."`.
pub(crate) fn error_code(message: &str) -> &str {
    message.split(" : ").next().unwrap_or(message).trim()
}
