//! Mock transport control and send log inspection.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;

use crate::server::AppState;
use crate::transport::SendLogEntry;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MockModeResponse {
    pub success: bool,
    pub mock_forced: bool,
}

#[derive(Debug, Serialize)]
pub struct SendLogResponse {
    pub total: usize,
    pub entries: Vec<SendLogEntry>,
}

/// Force all sends through the mock transport
pub async fn enable_mock(State(state): State<AppState>) -> Json<MockModeResponse> {
    state.dispatcher.enable_mock();
    tracing::info!("Mock delivery forced");
    Json(MockModeResponse {
        success: true,
        mock_forced: true,
    })
}

/// Return to real-first delivery
pub async fn disable_mock(State(state): State<AppState>) -> Json<MockModeResponse> {
    state.dispatcher.disable_mock();
    tracing::info!("Mock delivery no longer forced");
    Json(MockModeResponse {
        success: true,
        mock_forced: false,
    })
}

pub async fn get_log(State(state): State<AppState>) -> Json<SendLogResponse> {
    let entries = state.dispatcher.get_sent_log();
    Json(SendLogResponse {
        total: entries.len(),
        entries,
    })
}

pub async fn clear_log(State(state): State<AppState>) -> StatusCode {
    state.dispatcher.clear_sent_log();
    StatusCode::NO_CONTENT
}

/// Numbered plain-text listing of the send log
pub async fn log_summary(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        state.dispatcher.show_sent_log(),
    )
}
