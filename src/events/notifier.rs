use std::sync::Arc;

use serde::Serialize;
use serde_json::json;

use crate::metrics::EventMetrics;
use crate::notification::{
    Message, NotificationDispatcher, NotificationKind, NotifyError, SendOutcome,
};
use crate::template::{self, template_data};

use super::models::{
    AbsenceDetected, CredentialsIssued, DomainEvent, ProgressApproved, ProgressRejected,
    ProgressSubmitted, RoleClass, TestNotification,
};
use super::source::AbsenceSource;

/// Comment used when an approval carries none
pub const DEFAULT_APPROVAL_COMMENT: &str = "Progress reviewed and approved successfully";

/// Label put in the supervisor slot of the submitter's confirmation
const CONFIRMATION_ADDRESSEE: &str = "You";

const TEST_MESSAGE: &str =
    "This is a test notification from the University Attendance System.";

/// Outcomes of every send performed for one event
#[derive(Debug, Clone, Serialize)]
pub struct NotifyReport {
    pub event: &'static str,
    pub outcomes: Vec<SendOutcome>,
}

/// Per-absence failure in a daily scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanFailure {
    pub director_email: String,
    pub helper_name: String,
    pub reason: String,
}

/// Result of one daily absence scan
#[derive(Debug, Clone, Default, Serialize)]
pub struct AbsenceScanReport {
    pub detected: usize,
    pub notified: usize,
    pub failures: Vec<ScanFailure>,
}

/// Turns domain events into addressed, rendered messages and dispatches them.
///
/// Stateless and retry-free; fallback is the dispatcher's concern. Sends that
/// already succeeded are never undone when a sibling send fails.
pub struct EventNotifier {
    dispatcher: Arc<NotificationDispatcher>,
    system_url: String,
}

impl EventNotifier {
    pub fn new(dispatcher: Arc<NotificationDispatcher>, system_url: impl Into<String>) -> Self {
        Self {
            dispatcher,
            system_url: system_url.into(),
        }
    }

    pub fn dispatcher(&self) -> &Arc<NotificationDispatcher> {
        &self.dispatcher
    }

    /// Notify any domain event
    pub async fn notify(&self, event: &DomainEvent) -> Result<NotifyReport, NotifyError> {
        match event {
            DomainEvent::Absence(e) => self.notify_absence(e).await,
            DomainEvent::ProgressSubmitted(e) => self.notify_progress_submitted(e).await,
            DomainEvent::ProgressApproved(e) => self.notify_progress_approved(e).await,
            DomainEvent::ProgressRejected(e) => self.notify_progress_rejected(e).await,
            DomainEvent::CredentialsIssued(e) => self.notify_credentials(e).await,
            DomainEvent::Test(e) => self.send_test(e).await,
        }
    }

    /// Absence: director as recipient, absent helper in copy
    #[tracing::instrument(name = "notifier.absence", skip(self, event), fields(helper = %event.helper_name))]
    pub async fn notify_absence(&self, event: &AbsenceDetected) -> Result<NotifyReport, NotifyError> {
        let result = match self.absence_message(event) {
            Ok(message) => self.send_single("absence", &message).await,
            Err(e) => Err(e),
        };
        finish("absence", result)
    }

    /// Progress submitted: supervisor notice and submitter confirmation, sent
    /// concurrently. Both are always attempted.
    #[tracing::instrument(name = "notifier.progress_submitted", skip(self, event), fields(project = %event.project_name))]
    pub async fn notify_progress_submitted(
        &self,
        event: &ProgressSubmitted,
    ) -> Result<NotifyReport, NotifyError> {
        let result = self.progress_submitted_fan_out(event).await;
        finish("progress-submitted", result)
    }

    async fn progress_submitted_fan_out(
        &self,
        event: &ProgressSubmitted,
    ) -> Result<NotifyReport, NotifyError> {
        let (notice, confirmation) = self.progress_submitted_messages(event);

        let (notice_result, confirmation_result) = futures::join!(
            self.send_built(notice),
            self.send_built(confirmation)
        );

        let results = [notice_result, confirmation_result];
        let attempted = results.len();
        let mut outcomes = Vec::with_capacity(attempted);
        let mut reasons = Vec::new();

        for result in results {
            match result {
                Ok(outcome) => outcomes.push(outcome),
                Err(NotifyError::Delivery { recipient, reason }) => {
                    reasons.push(format!("{}: {}", recipient, reason))
                }
                Err(e) => reasons.push(e.to_string()),
            }
        }

        if reasons.is_empty() {
            Ok(NotifyReport {
                event: "progress-submitted",
                outcomes,
            })
        } else {
            Err(NotifyError::FanOut {
                attempted,
                failed: reasons.len(),
                reasons,
            })
        }
    }

    /// Dispatch a message that may have failed to build; a build error is
    /// reported without touching the dispatcher
    async fn send_built(
        &self,
        built: Result<Message, NotifyError>,
    ) -> Result<SendOutcome, NotifyError> {
        let message = built?;
        self.dispatcher.send(&message).await.into_result()
    }

    /// Approval: single message to the submitting director
    #[tracing::instrument(name = "notifier.progress_approved", skip(self, event), fields(project = %event.project_name))]
    pub async fn notify_progress_approved(
        &self,
        event: &ProgressApproved,
    ) -> Result<NotifyReport, NotifyError> {
        let result = match self.progress_approved_message(event) {
            Ok(message) => self.send_single("progress-approved", &message).await,
            Err(e) => Err(e),
        };
        finish("progress-approved", result)
    }

    /// Rejection: single message to the submitting director; reason and
    /// remarks are mandatory
    #[tracing::instrument(name = "notifier.progress_rejected", skip(self, event), fields(project = %event.project_name))]
    pub async fn notify_progress_rejected(
        &self,
        event: &ProgressRejected,
    ) -> Result<NotifyReport, NotifyError> {
        let result = match self.progress_rejected_message(event) {
            Ok(message) => self.send_single("progress-rejected", &message).await,
            Err(e) => Err(e),
        };
        finish("progress-rejected", result)
    }

    /// Credentials: template chosen by role class
    #[tracing::instrument(name = "notifier.credentials", skip(self, event), fields(role = %event.role))]
    pub async fn notify_credentials(
        &self,
        event: &CredentialsIssued,
    ) -> Result<NotifyReport, NotifyError> {
        let result = match self.credentials_message(event) {
            Ok(message) => self.send_single("credentials-issued", &message).await,
            Err(e) => Err(e),
        };
        finish("credentials-issued", result)
    }

    /// Connectivity check through the default template
    #[tracing::instrument(name = "notifier.test", skip(self, event))]
    pub async fn send_test(&self, event: &TestNotification) -> Result<NotifyReport, NotifyError> {
        let result = match self.test_message(event) {
            Ok(message) => self.send_single("test", &message).await,
            Err(e) => Err(e),
        };
        finish("test", result)
    }

    /// Notify each detected absence in order.
    ///
    /// Every absence is attempted; failures are collected in the report
    /// instead of aborting the scan.
    #[tracing::instrument(name = "notifier.daily_absences", skip(self, absences), fields(count = absences.len()))]
    pub async fn process_daily_absences(&self, absences: &[AbsenceDetected]) -> AbsenceScanReport {
        let mut report = AbsenceScanReport {
            detected: absences.len(),
            ..Default::default()
        };

        for absence in absences {
            match self.notify_absence(absence).await {
                Ok(_) => report.notified += 1,
                Err(e) => report.failures.push(ScanFailure {
                    director_email: absence.director_email.clone(),
                    helper_name: absence.helper_name.clone(),
                    reason: e.to_string(),
                }),
            }
        }

        EventMetrics::record_absences_notified(report.notified);
        tracing::info!(
            detected = report.detected,
            notified = report.notified,
            failed = report.failures.len(),
            "Daily absences processed"
        );

        report
    }

    /// Fetch today's absences from `source` and notify them
    pub async fn run_absence_check(
        &self,
        source: &dyn AbsenceSource,
    ) -> Result<AbsenceScanReport, NotifyError> {
        let absences = source.daily_absences().await?;
        Ok(self.process_daily_absences(&absences).await)
    }

    async fn send_single(
        &self,
        event: &'static str,
        message: &Message,
    ) -> Result<NotifyReport, NotifyError> {
        let outcome = self.dispatcher.send(message).await.into_result()?;
        Ok(NotifyReport {
            event,
            outcomes: vec![outcome],
        })
    }

    fn system_url<'a>(&'a self, explicit: &'a Option<String>) -> &'a str {
        explicit
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(&self.system_url)
    }

    pub fn absence_message(&self, event: &AbsenceDetected) -> Result<Message, NotifyError> {
        let data = template_data(json!({
            "directorName": event.director_name,
            "helperName": event.helper_name,
            "helperId": event.helper_id,
            "date": event.date,
            "projectName": event.project_name,
            "systemUrl": self.system_url(&event.system_url),
        }));

        Message::new(
            NotificationKind::Absence,
            &event.director_email,
            event.helper_email.clone(),
            format!("Absence Detected - {}", event.helper_name),
            template::render(NotificationKind::Absence, &data),
        )
    }

    /// Supervisor notice and submitter confirmation, in that order. Each is
    /// built on its own so one bad address does not block the other.
    pub fn progress_submitted_messages(
        &self,
        event: &ProgressSubmitted,
    ) -> (Result<Message, NotifyError>, Result<Message, NotifyError>) {
        let notice_data = template_data(json!({
            "supervisorName": event.supervisor_name,
            "directorName": event.director_name,
            "projectName": event.project_name,
            "submittedAt": event.submitted_at,
            "description": event.description,
            "systemUrl": self.system_url(&event.system_url),
        }));

        let mut confirmation_data = notice_data.clone();
        confirmation_data.insert(
            "supervisorName".to_string(),
            CONFIRMATION_ADDRESSEE.into(),
        );

        let notice = Message::new(
            NotificationKind::ProgressSubmitted,
            &event.supervisor_email,
            None,
            format!("New Progress Report - {}", event.project_name),
            template::render(NotificationKind::ProgressSubmitted, &notice_data),
        );

        let confirmation = Message::new(
            NotificationKind::ProgressSubmittedConfirmation,
            &event.director_email,
            None,
            format!("Confirmation: Progress Report Submitted - {}", event.project_name),
            template::render(NotificationKind::ProgressSubmittedConfirmation, &confirmation_data),
        );

        (notice, confirmation)
    }

    pub fn progress_approved_message(&self, event: &ProgressApproved) -> Result<Message, NotifyError> {
        let comments = event
            .comments
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(DEFAULT_APPROVAL_COMMENT);

        let data = template_data(json!({
            "directorName": event.director_name,
            "projectName": event.project_name,
            "approvedAt": event.approved_at,
            "supervisorName": event.supervisor_name,
            "comments": comments,
            "systemUrl": self.system_url(&event.system_url),
        }));

        Message::new(
            NotificationKind::ProgressApproved,
            &event.director_email,
            None,
            format!("Progress Approved - {}", event.project_name),
            template::render(NotificationKind::ProgressApproved, &data),
        )
    }

    pub fn progress_rejected_message(&self, event: &ProgressRejected) -> Result<Message, NotifyError> {
        if event.rejection_reason.trim().is_empty() {
            return Err(NotifyError::Validation(
                "rejection requires a reason".to_string(),
            ));
        }
        if event.remarks.trim().is_empty() {
            return Err(NotifyError::Validation(
                "rejection requires remarks".to_string(),
            ));
        }

        let data = template_data(json!({
            "directorName": event.director_name,
            "projectName": event.project_name,
            "reviewedAt": event.reviewed_at,
            "supervisorName": event.supervisor_name,
            "rejectionReason": event.rejection_reason,
            "remarks": event.remarks,
            "systemUrl": self.system_url(&event.system_url),
        }));

        Message::new(
            NotificationKind::ProgressRejected,
            &event.director_email,
            None,
            format!("Progress Requires Revision - {}", event.project_name),
            template::render(NotificationKind::ProgressRejected, &data),
        )
    }

    pub fn credentials_message(&self, event: &CredentialsIssued) -> Result<Message, NotifyError> {
        let data = template_data(json!({
            "name": event.name,
            "username": event.username,
            "temporaryPassword": event.temporary_password,
            "role": event.role,
            "code": event.code,
            "systemUrl": self.system_url(&event.system_url),
        }));

        let (kind, subject) = match event.role_class() {
            RoleClass::Director => (
                NotificationKind::DirectorCredentials,
                format!("Welcome Project Director - {}", event.name),
            ),
            RoleClass::Staff => (
                NotificationKind::StaffCredentials,
                format!("Welcome to the System - {}", event.name),
            ),
        };

        Message::new(kind, &event.email, None, subject, template::render(kind, &data))
    }

    pub fn test_message(&self, event: &TestNotification) -> Result<Message, NotifyError> {
        let data = template_data(json!({ "message": TEST_MESSAGE }));

        Message::new(
            NotificationKind::Test,
            &event.email,
            None,
            "Test Notification",
            template::render_default(&data),
        )
    }
}

fn finish(
    event: &'static str,
    result: Result<NotifyReport, NotifyError>,
) -> Result<NotifyReport, NotifyError> {
    EventMetrics::record_event(event, result.is_ok());
    match &result {
        Ok(report) => tracing::info!(
            event = event,
            sent = report.outcomes.len(),
            "Notification sent"
        ),
        Err(e) => tracing::error!(event = event, error = %e, "Notification failed"),
    }
    result
}
