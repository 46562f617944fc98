use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Errors raised while turning a domain event into delivered notifications
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// Event payload is missing something a notification cannot do without
    #[error("Validation error: {0}")]
    Validation(String),

    /// The final transport (mock) rejected the send
    #[error("Delivery to {recipient} failed: {reason}")]
    Delivery { recipient: String, reason: String },

    /// At least one send of a multi-recipient event failed
    #[error("{failed} of {attempted} notifications failed: {}", .reasons.join("; "))]
    FanOut {
        attempted: usize,
        failed: usize,
        reasons: Vec<String>,
    },

    /// The backend feeding scheduled checks could not be queried
    #[error("Upstream error: {0}")]
    Upstream(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Notify(#[from] NotifyError),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

/// Check if running in production mode (based on RUN_MODE env var)
fn is_production() -> bool {
    std::env::var("RUN_MODE")
        .map(|m| m == "production" || m == "prod")
        .unwrap_or(false)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, client_message, log_message) = match &self {
            AppError::Config(e) => {
                let log_msg = e.to_string();
                let client_msg = if is_production() {
                    "Configuration error".to_string()
                } else {
                    log_msg.clone()
                };
                (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR", client_msg, log_msg)
            }
            AppError::Notify(NotifyError::Validation(msg)) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                msg.clone(),
                msg.clone(),
            ),
            AppError::Notify(e @ NotifyError::Delivery { .. })
            | AppError::Notify(e @ NotifyError::FanOut { .. }) => {
                let msg = e.to_string();
                (StatusCode::BAD_GATEWAY, "DELIVERY_FAILED", msg.clone(), msg)
            }
            AppError::Notify(NotifyError::Upstream(e)) => {
                let log_msg = e.clone();
                let client_msg = if is_production() {
                    "Upstream service unavailable".to_string()
                } else {
                    log_msg.clone()
                };
                (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", client_msg, log_msg)
            }
            AppError::Internal(e) => {
                let log_msg = e.clone();
                let client_msg = if is_production() {
                    "Internal server error".to_string()
                } else {
                    log_msg.clone()
                };
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", client_msg, log_msg)
            }
        };

        tracing::error!(
            code = %code,
            status = %status.as_u16(),
            message = %log_message,
            "API error"
        );

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: client_message,
            },
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fan_out_message_lists_reasons() {
        let err = NotifyError::FanOut {
            attempted: 2,
            failed: 1,
            reasons: vec!["dir@x.com: simulated connection error".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "1 of 2 notifications failed: dir@x.com: simulated connection error"
        );
    }

    #[test]
    fn test_status_mapping() {
        let response = AppError::from(NotifyError::Validation("missing".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = AppError::from(NotifyError::Delivery {
            recipient: "a@x.com".into(),
            reason: "simulated connection error".into(),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let response = AppError::Internal("boom".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
