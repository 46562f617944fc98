use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::NotifyError;

/// Kind of notification being sent.
///
/// The kebab-case name is what goes over the wire as `type` and what the
/// template renderer dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationKind {
    /// A helper missed a scheduled attendance
    Absence,
    /// A director uploaded a progress report (sent to the supervisor)
    ProgressSubmitted,
    /// Confirmation of the upload sent back to the director
    ProgressSubmittedConfirmation,
    /// Progress report approved
    ProgressApproved,
    /// Progress report rejected and needs rework
    ProgressRejected,
    /// Credentials for a newly created project director
    DirectorCredentials,
    /// Credentials for newly registered staff
    StaffCredentials,
    /// Connectivity check
    Test,
}

impl NotificationKind {
    pub const ALL: [NotificationKind; 8] = [
        NotificationKind::Absence,
        NotificationKind::ProgressSubmitted,
        NotificationKind::ProgressSubmittedConfirmation,
        NotificationKind::ProgressApproved,
        NotificationKind::ProgressRejected,
        NotificationKind::DirectorCredentials,
        NotificationKind::StaffCredentials,
        NotificationKind::Test,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Absence => "absence",
            NotificationKind::ProgressSubmitted => "progress-submitted",
            NotificationKind::ProgressSubmittedConfirmation => "progress-submitted-confirmation",
            NotificationKind::ProgressApproved => "progress-approved",
            NotificationKind::ProgressRejected => "progress-rejected",
            NotificationKind::DirectorCredentials => "director-credentials",
            NotificationKind::StaffCredentials => "staff-credentials",
            NotificationKind::Test => "test",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NotificationKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

/// Returned when a kind name does not match any known notification kind
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown notification kind: {0}")]
pub struct UnknownKind(pub String);

/// A fully rendered, addressed notification.
///
/// Built once per send and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    kind: NotificationKind,
    recipient: String,
    carbon_copy: Option<String>,
    subject: String,
    body: String,
}

impl Message {
    /// Create a message, rejecting an empty primary recipient.
    ///
    /// A blank carbon copy is treated as absent.
    pub fn new(
        kind: NotificationKind,
        recipient: impl Into<String>,
        carbon_copy: Option<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Result<Self, NotifyError> {
        let recipient = recipient.into().trim().to_string();
        if recipient.is_empty() {
            return Err(NotifyError::Validation(format!(
                "{} notification has no recipient",
                kind
            )));
        }

        let carbon_copy = carbon_copy
            .map(|cc| cc.trim().to_string())
            .filter(|cc| !cc.is_empty());

        Ok(Self {
            kind,
            recipient,
            carbon_copy,
            subject: subject.into(),
            body: body.into(),
        })
    }

    pub fn kind(&self) -> NotificationKind {
        self.kind
    }

    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    pub fn carbon_copy(&self) -> Option<&str> {
        self.carbon_copy.as_deref()
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

/// Which transport ended up handling a send
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Real,
    Mock,
}

impl TransportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::Real => "real",
            TransportKind::Mock => "mock",
        }
    }
}

/// Why a send was routed to the mock transport instead of the real one
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "kebab-case")]
pub enum FallbackReason {
    /// Real transport disabled or not configured
    Unavailable,
    /// Too many consecutive real failures; real transport skipped
    CircuitOpen,
    /// Real transport answered with a non-2xx status
    Status { status: u16 },
    /// Connection or protocol level failure
    Network { detail: String },
    /// No answer within the configured timeout
    Timeout,
    /// 2xx answer without a JSON body
    InvalidBody { detail: String },
}

impl FallbackReason {
    /// Short label used for metrics and log fields
    pub fn label(&self) -> &'static str {
        match self {
            FallbackReason::Unavailable => "unavailable",
            FallbackReason::CircuitOpen => "circuit-open",
            FallbackReason::Status { .. } => "status",
            FallbackReason::Network { .. } => "network",
            FallbackReason::Timeout => "timeout",
            FallbackReason::InvalidBody { .. } => "invalid-body",
        }
    }
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::Status { status } => write!(f, "status {}", status),
            FallbackReason::Network { detail } => write!(f, "network error: {}", detail),
            FallbackReason::InvalidBody { detail } => write!(f, "invalid body: {}", detail),
            other => f.write_str(other.label()),
        }
    }
}

/// Result of one dispatch attempt.
///
/// `message_id` is set only on success, `error` only on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOutcome {
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub transport_used: TransportKind,
    pub recipient: String,
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<FallbackReason>,
}

impl SendOutcome {
    pub fn delivered(message: &Message, transport: TransportKind, message_id: impl Into<String>) -> Self {
        Self {
            succeeded: true,
            message_id: Some(message_id.into()),
            error: None,
            transport_used: transport,
            recipient: message.recipient().to_string(),
            subject: message.subject().to_string(),
            fallback: None,
        }
    }

    pub fn failed(message: &Message, transport: TransportKind, error: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            message_id: None,
            error: Some(error.into()),
            transport_used: transport,
            recipient: message.recipient().to_string(),
            subject: message.subject().to_string(),
            fallback: None,
        }
    }

    /// Tag this outcome as the product of a fallback from the real transport
    pub fn with_fallback(mut self, reason: FallbackReason) -> Self {
        self.fallback = Some(reason);
        self
    }

    /// Convert a failed outcome into a `NotifyError::Delivery`
    pub fn into_result(self) -> Result<SendOutcome, NotifyError> {
        if self.succeeded {
            Ok(self)
        } else {
            Err(NotifyError::Delivery {
                recipient: self.recipient,
                reason: self.error.unwrap_or_else(|| "unknown delivery failure".to_string()),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips_through_name() {
        for kind in NotificationKind::ALL {
            assert_eq!(kind.as_str().parse::<NotificationKind>().unwrap(), kind);
        }
        assert!("unknown-kind".parse::<NotificationKind>().is_err());
    }

    #[test]
    fn test_kind_serializes_kebab_case() {
        let json = serde_json::to_string(&NotificationKind::ProgressSubmittedConfirmation).unwrap();
        assert_eq!(json, "\"progress-submitted-confirmation\"");
    }

    #[test]
    fn test_message_requires_recipient() {
        let result = Message::new(NotificationKind::Test, "   ", None, "s", "b");
        assert!(matches!(result, Err(NotifyError::Validation(_))));
    }

    #[test]
    fn test_message_drops_blank_carbon_copy() {
        let message = Message::new(
            NotificationKind::Absence,
            " d@x.com ",
            Some("".to_string()),
            "s",
            "b",
        )
        .unwrap();
        assert_eq!(message.recipient(), "d@x.com");
        assert_eq!(message.carbon_copy(), None);
    }

    #[test]
    fn test_outcome_invariants() {
        let message = Message::new(NotificationKind::Test, "a@x.com", None, "s", "b").unwrap();

        let ok = SendOutcome::delivered(&message, TransportKind::Mock, "mock-1");
        assert!(ok.succeeded);
        assert!(ok.message_id.is_some());
        assert!(ok.error.is_none());
        assert!(ok.clone().into_result().is_ok());

        let failed = SendOutcome::failed(&message, TransportKind::Mock, "boom");
        assert!(!failed.succeeded);
        assert!(failed.message_id.is_none());
        assert!(matches!(
            failed.into_result(),
            Err(NotifyError::Delivery { reason, .. }) if reason == "boom"
        ));
    }

    #[test]
    fn test_fallback_reason_display() {
        assert_eq!(FallbackReason::Status { status: 503 }.to_string(), "status 503");
        assert_eq!(FallbackReason::CircuitOpen.to_string(), "circuit-open");
        assert_eq!(FallbackReason::Timeout.label(), "timeout");
    }
}
