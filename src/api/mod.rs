//! API layer - HTTP endpoint handlers organized by concern.

mod events;
mod health;
mod metrics;
mod mock;
mod routes;

pub use events::{
    daily_absences, notify_absence, notify_credentials, notify_event, notify_progress_approved,
    notify_progress_rejected, notify_progress_submitted, send_test, DailyAbsencesRequest,
    EventResponse, ScanResponse,
};
pub use health::{health, HealthResponse};
pub use metrics::prometheus_metrics;
pub use mock::{clear_log, disable_mock, enable_mock, get_log, log_summary, MockModeResponse};
pub use routes::api_routes;
