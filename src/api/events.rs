//! Domain event handlers

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::events::{
    AbsenceDetected, AbsenceScanReport, CredentialsIssued, DomainEvent, HttpAbsenceSource,
    NotifyReport, ProgressApproved, ProgressRejected, ProgressSubmitted, ScanFailure,
    TestNotification,
};
use crate::notification::SendOutcome;
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub success: bool,
    pub event: &'static str,
    pub outcomes: Vec<SendOutcome>,
    pub timestamp: DateTime<Utc>,
}

impl From<NotifyReport> for EventResponse {
    fn from(report: NotifyReport) -> Self {
        Self {
            success: true,
            event: report.event,
            outcomes: report.outcomes,
            timestamp: Utc::now(),
        }
    }
}

/// Absences to scan; when omitted they are fetched from the attendance backend
#[derive(Debug, Default, Deserialize)]
pub struct DailyAbsencesRequest {
    #[serde(default)]
    pub absences: Option<Vec<AbsenceDetected>>,
}

#[derive(Debug, Serialize)]
pub struct ScanResponse {
    pub success: bool,
    pub detected: usize,
    pub notified: usize,
    pub failures: Vec<ScanFailure>,
    pub timestamp: DateTime<Utc>,
}

impl From<AbsenceScanReport> for ScanResponse {
    fn from(report: AbsenceScanReport) -> Self {
        Self {
            success: report.failures.is_empty(),
            detected: report.detected,
            notified: report.notified,
            failures: report.failures,
            timestamp: Utc::now(),
        }
    }
}

/// Any event, tagged by name
#[tracing::instrument(name = "http.notify_event", skip(state, event), fields(event = event.name()))]
pub async fn notify_event(
    State(state): State<AppState>,
    Json(event): Json<DomainEvent>,
) -> Result<Json<EventResponse>> {
    let report = state.notifier.notify(&event).await?;
    Ok(Json(report.into()))
}

pub async fn notify_absence(
    State(state): State<AppState>,
    Json(event): Json<AbsenceDetected>,
) -> Result<Json<EventResponse>> {
    let report = state.notifier.notify_absence(&event).await?;
    Ok(Json(report.into()))
}

pub async fn notify_progress_submitted(
    State(state): State<AppState>,
    Json(event): Json<ProgressSubmitted>,
) -> Result<Json<EventResponse>> {
    let report = state.notifier.notify_progress_submitted(&event).await?;
    Ok(Json(report.into()))
}

pub async fn notify_progress_approved(
    State(state): State<AppState>,
    Json(event): Json<ProgressApproved>,
) -> Result<Json<EventResponse>> {
    let report = state.notifier.notify_progress_approved(&event).await?;
    Ok(Json(report.into()))
}

pub async fn notify_progress_rejected(
    State(state): State<AppState>,
    Json(event): Json<ProgressRejected>,
) -> Result<Json<EventResponse>> {
    let report = state.notifier.notify_progress_rejected(&event).await?;
    Ok(Json(report.into()))
}

pub async fn notify_credentials(
    State(state): State<AppState>,
    Json(event): Json<CredentialsIssued>,
) -> Result<Json<EventResponse>> {
    let report = state.notifier.notify_credentials(&event).await?;
    Ok(Json(report.into()))
}

pub async fn send_test(
    State(state): State<AppState>,
    Json(event): Json<TestNotification>,
) -> Result<Json<EventResponse>> {
    let report = state.notifier.send_test(&event).await?;
    Ok(Json(report.into()))
}

/// Run the daily absence scan now. A bare POST without a JSON body fetches
/// the list from the attendance backend.
#[tracing::instrument(name = "http.daily_absences", skip(state, request))]
pub async fn daily_absences(
    State(state): State<AppState>,
    request: Option<Json<DailyAbsencesRequest>>,
) -> Result<Json<ScanResponse>> {
    let absences = request.and_then(|Json(request)| request.absences);

    let report = match absences {
        Some(absences) => state.notifier.process_daily_absences(&absences).await,
        None => {
            let source = HttpAbsenceSource::new(
                state.settings.backend_base_url(),
                &state.settings.absence_check.path,
                state.settings.transport.timeout(),
            )?;
            state.notifier.run_absence_check(&source).await?
        }
    };

    Ok(Json(report.into()))
}
