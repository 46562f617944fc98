use axum::{
    routing::{get, post},
    Router,
};

use crate::server::AppState;

use super::events::{
    daily_absences, notify_absence, notify_credentials, notify_event, notify_progress_approved,
    notify_progress_rejected, notify_progress_submitted, send_test,
};
use super::health::health;
use super::metrics::prometheus_metrics;
use super::mock::{clear_log, disable_mock, enable_mock, get_log, log_summary};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health & Metrics
        .route("/health", get(health))
        .route("/metrics", get(prometheus_metrics))
        .nest(
            "/api/v1",
            Router::new()
                // Domain events
                .route("/events", post(notify_event))
                .route("/events/absence", post(notify_absence))
                .route("/events/progress-submitted", post(notify_progress_submitted))
                .route("/events/progress-approved", post(notify_progress_approved))
                .route("/events/progress-rejected", post(notify_progress_rejected))
                .route("/events/credentials", post(notify_credentials))
                .route("/events/test", post(send_test))
                .route("/events/daily-absences", post(daily_absences))
                // Mock transport control
                .route("/mock/enable", post(enable_mock))
                .route("/mock/disable", post(disable_mock))
                .route("/mock/log", get(get_log).delete(clear_log))
                .route("/mock/log/summary", get(log_summary)),
        )
}
