use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Failure talking to the payment processor.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("processor request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("processor returned {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Rejected { status: u16, message: Option<String> },
    #[error("invalid processor URL: {0}")]
    InvalidUrl(String),
}

impl GatewayError {
    /// Message reported by the processor, if it sent one.
    pub fn upstream_message(&self) -> Option<&str> {
        match self {
            GatewayError::Rejected { message, .. } => message.as_deref(),
            GatewayError::Transport(_) | GatewayError::InvalidUrl(_) => None,
        }
    }
}

/// Errors surfaced by the HTTP handlers, rendered as `{success: false, message}`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    NotConfigured(String),
    #[error("{message}")]
    Upstream { message: String, source: GatewayError },
    #[error("{message}")]
    Store { message: String, source: sqlx::Error },
}

impl ApiError {
    /// Wraps a gateway failure, preferring the processor's own message over `fallback`.
    pub fn upstream(source: GatewayError, fallback: &str) -> Self {
        let message = source.upstream_message().unwrap_or(fallback).to_string();
        ApiError::Upstream { message, source }
    }

    pub fn store(source: sqlx::Error, message: &str) -> Self {
        ApiError::Store { message: message.to_string(), source }
    }

    pub fn api_key_missing() -> Self {
        ApiError::NotConfigured("NowPayments API key is not configured".to_string())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::NotConfigured(_) | ApiError::Upstream { .. } | ApiError::Store { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::Upstream { source, .. } => log::error!("{}: {}", self, source),
            ApiError::Store { source, .. } => log::error!("{}: {}", self, source),
            ApiError::NotConfigured(_) => log::error!("{}", self),
            _ => log::warn!("{}", self),
        }

        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "message": self.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_message_wins_over_fallback() {
        let rejected = GatewayError::Rejected { status: 400, message: Some("pay_currency is invalid".into()) };
        let err = ApiError::upstream(rejected, "Error creating payment");
        assert_eq!(err.to_string(), "pay_currency is invalid");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn fallback_used_without_upstream_message() {
        let rejected = GatewayError::Rejected { status: 502, message: None };
        let err = ApiError::upstream(rejected, "Error fetching currencies");
        assert_eq!(err.to_string(), "Error fetching currencies");
    }

    #[test]
    fn client_errors_map_to_4xx() {
        assert_eq!(ApiError::BadRequest("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Unauthorized("x".into()).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::api_key_missing().status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
