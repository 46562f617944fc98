//! Domain events and the notifier that turns them into messages.

mod models;
mod notifier;
mod source;

pub use models::{
    AbsenceDetected, CredentialsIssued, DomainEvent, ProgressApproved, ProgressRejected,
    ProgressSubmitted, RoleClass, TestNotification,
};
pub use notifier::{
    AbsenceScanReport, EventNotifier, NotifyReport, ScanFailure, DEFAULT_APPROVAL_COMMENT,
};
pub use source::{AbsenceSource, HttpAbsenceSource, StaticAbsenceSource, DAILY_ABSENCES_PATH};
