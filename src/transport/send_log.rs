//! In-memory record of simulated deliveries.
//!
//! Entries are append-only and kept in insertion order until `clear` is
//! called. The log lives as long as its owner; nothing is persisted.

use std::fmt::Write as _;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::notification::Message;

/// Delivery status recorded in the log. Only reached states are logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Sent => "sent",
        }
    }
}

/// One simulated delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendLogEntry {
    pub timestamp: DateTime<Utc>,
    pub recipient: String,
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carbon_copy: Option<String>,
    pub status: DeliveryStatus,
    pub message_id: String,
}

impl SendLogEntry {
    pub fn sent(message: &Message, message_id: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            recipient: message.recipient().to_string(),
            subject: message.subject().to_string(),
            carbon_copy: message.carbon_copy().map(str::to_string),
            status: DeliveryStatus::Sent,
            message_id: message_id.into(),
        }
    }
}

/// Shared, append-only send log
#[derive(Debug, Default)]
pub struct SendLog {
    entries: Mutex<Vec<SendLogEntry>>,
}

impl SendLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<SendLogEntry>> {
        // A panic while holding the lock cannot leave a half-written Vec push
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append an entry and return the new length
    pub fn append(&self, entry: SendLogEntry) -> usize {
        let mut entries = self.lock();
        entries.push(entry);
        entries.len()
    }

    /// Snapshot of all entries, oldest first
    pub fn entries(&self) -> Vec<SendLogEntry> {
        self.lock().clone()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Numbered, human readable listing of the log
    pub fn summary(&self) -> String {
        let entries = self.lock();
        let mut out = String::from("=== SENT EMAILS (MOCK) ===\n");

        for (index, entry) in entries.iter().enumerate() {
            let _ = writeln!(out, "\n{}. To: {}", index + 1, entry.recipient);
            let _ = writeln!(out, "   Subject: {}", entry.subject);
            let _ = writeln!(out, "   CC: {}", entry.carbon_copy.as_deref().unwrap_or("N/A"));
            let _ = writeln!(out, "   Date: {}", entry.timestamp.to_rfc3339());
            let _ = writeln!(out, "   Status: {}", entry.status.as_str());
            let _ = writeln!(out, "   ID: {}", entry.message_id);
        }

        let _ = writeln!(out, "\n=== TOTAL: {} emails ===", entries.len());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::NotificationKind;

    fn entry(recipient: &str, id: &str) -> SendLogEntry {
        let message = Message::new(NotificationKind::Test, recipient, None, "Subject", "b").unwrap();
        SendLogEntry::sent(&message, id, Utc::now())
    }

    #[test]
    fn test_entries_keep_insertion_order() {
        let log = SendLog::new();
        assert_eq!(log.append(entry("a@x.com", "1")), 1);
        assert_eq!(log.append(entry("b@x.com", "2")), 2);
        assert_eq!(log.append(entry("c@x.com", "3")), 3);

        let ids: Vec<_> = log.entries().into_iter().map(|e| e.message_id).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_clear_empties_log() {
        let log = SendLog::new();
        log.append(entry("a@x.com", "1"));
        log.clear();

        assert!(log.is_empty());
        assert!(log.entries().is_empty());
    }

    #[test]
    fn test_summary_lists_entries() {
        let log = SendLog::new();
        let message = Message::new(
            NotificationKind::Absence,
            "d@x.com",
            Some("a@x.com".to_string()),
            "Absence Detected - Luis",
            "b",
        )
        .unwrap();
        log.append(SendLogEntry::sent(&message, "mock-1", Utc::now()));
        log.append(entry("t@x.com", "mock-2"));

        let summary = log.summary();
        assert!(summary.contains("1. To: d@x.com"));
        assert!(summary.contains("CC: a@x.com"));
        assert!(summary.contains("CC: N/A"));
        assert!(summary.contains("ID: mock-2"));
        assert!(summary.contains("TOTAL: 2 emails"));
    }

    #[test]
    fn test_entry_serializes_camel_case() {
        let value = serde_json::to_value(entry("a@x.com", "mock-1")).unwrap();
        assert_eq!(value["messageId"], "mock-1");
        assert_eq!(value["status"], "sent");
        assert!(value.get("carbonCopy").is_none());
    }
}
