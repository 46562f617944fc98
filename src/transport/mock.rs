//! Simulated delivery channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

use crate::metrics::DispatchMetrics;
use crate::notification::{Message, SendOutcome, TransportKind};

use super::send_log::{SendLog, SendLogEntry};

/// Error text of an injected failure
pub const SIMULATED_FAILURE: &str = "simulated connection error";

/// Mock transport configuration
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Artificial latency before each send resolves
    pub delay: Duration,
    /// Probability in `[0, 1]` that a send fails
    pub failure_probability: f64,
    /// Seed for the failure draw; `None` seeds from the OS
    pub seed: Option<u64>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(1000),
            failure_probability: 0.10,
            seed: None,
        }
    }
}

impl MockConfig {
    /// No latency, no failures. Handy in tests.
    pub fn reliable() -> Self {
        Self {
            delay: Duration::ZERO,
            failure_probability: 0.0,
            seed: Some(0),
        }
    }
}

/// Locally simulated transport.
///
/// Every successful send appends exactly one entry to the injected
/// `SendLog`; injected failures append nothing.
pub struct MockTransport {
    config: MockConfig,
    log: Arc<SendLog>,
    rng: Mutex<StdRng>,
    enabled: AtomicBool,
}

impl MockTransport {
    pub fn new(config: MockConfig, log: Arc<SendLog>) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Self {
            config,
            log,
            rng: Mutex::new(rng),
            enabled: AtomicBool::new(true),
        }
    }

    /// Simulate delivering one message
    #[tracing::instrument(
        name = "transport.mock.send",
        skip(self, message),
        fields(recipient = %message.recipient(), kind = %message.kind())
    )]
    pub async fn send(&self, message: &Message) -> SendOutcome {
        if !self.config.delay.is_zero() {
            tokio::time::sleep(self.config.delay).await;
        }

        if self.should_fail() {
            DispatchMetrics::record_mock_injected_failure();
            tracing::warn!(error = SIMULATED_FAILURE, "Mock transport injected a failure");
            return SendOutcome::failed(message, TransportKind::Mock, SIMULATED_FAILURE);
        }

        let message_id = format!("mock-{}", Uuid::new_v4());
        let entry = SendLogEntry::sent(message, message_id.clone(), Utc::now());
        let log_size = self.log.append(entry);
        DispatchMetrics::set_log_size(log_size);

        tracing::info!(
            message_id = %message_id,
            subject = %message.subject(),
            cc = message.carbon_copy().unwrap_or("N/A"),
            "Email sent (mock)"
        );

        SendOutcome::delivered(message, TransportKind::Mock, message_id)
    }

    fn should_fail(&self) -> bool {
        let p = self.config.failure_probability;
        if p <= 0.0 || p.is_nan() {
            return false;
        }
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        rng.random::<f64>() < p
    }

    /// The log this transport appends to
    pub fn log(&self) -> &Arc<SendLog> {
        &self.log
    }

    /// Snapshot of the send log, oldest first
    pub fn get_log(&self) -> Vec<SendLogEntry> {
        self.log.entries()
    }

    pub fn clear_log(&self) {
        self.log.clear();
        DispatchMetrics::set_log_size(0);
    }

    /// Informational flag only; sending is gated by the dispatcher
    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Release);
        tracing::info!("Mock email transport ENABLED");
    }

    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Release);
        tracing::info!("Mock email transport DISABLED");
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn config(&self) -> &MockConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::NotificationKind;

    fn message(recipient: &str) -> Message {
        Message::new(
            NotificationKind::Absence,
            recipient,
            Some("cc@x.com".to_string()),
            "Absence Detected - Luis",
            "<p>b</p>",
        )
        .unwrap()
    }

    fn transport(failure_probability: f64, seed: u64) -> MockTransport {
        MockTransport::new(
            MockConfig {
                delay: Duration::ZERO,
                failure_probability,
                seed: Some(seed),
            },
            Arc::new(SendLog::new()),
        )
    }

    #[tokio::test]
    async fn test_success_appends_one_entry() {
        let mock = transport(0.0, 1);
        let outcome = mock.send(&message("d@x.com")).await;

        assert!(outcome.succeeded);
        assert_eq!(outcome.transport_used, TransportKind::Mock);
        let id = outcome.message_id.unwrap();
        assert!(id.starts_with("mock-"));

        let log = mock.get_log();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].recipient, "d@x.com");
        assert_eq!(log[0].carbon_copy.as_deref(), Some("cc@x.com"));
        assert_eq!(log[0].message_id, id);
    }

    #[tokio::test]
    async fn test_injected_failure_logs_nothing() {
        let mock = transport(1.0, 1);
        let outcome = mock.send(&message("d@x.com")).await;

        assert!(!outcome.succeeded);
        assert_eq!(outcome.error.as_deref(), Some(SIMULATED_FAILURE));
        assert!(outcome.message_id.is_none());
        assert!(mock.get_log().is_empty());
    }

    #[tokio::test]
    async fn test_seeded_failures_are_reproducible() {
        let run = |seed| async move {
            let mock = transport(0.5, seed);
            let mut pattern = Vec::new();
            for _ in 0..20 {
                pattern.push(mock.send(&message("d@x.com")).await.succeeded);
            }
            pattern
        };

        assert_eq!(run(42).await, run(42).await);
    }

    #[tokio::test]
    async fn test_failure_rate_tracks_probability() {
        let mock = transport(0.1, 7);
        let mut failures = 0;
        for _ in 0..1000 {
            if !mock.send(&message("d@x.com")).await.succeeded {
                failures += 1;
            }
        }

        assert!((50..=150).contains(&failures), "failures = {}", failures);
        assert_eq!(mock.get_log().len(), 1000 - failures);
    }

    #[tokio::test]
    async fn test_unique_message_ids() {
        let mock = transport(0.0, 1);
        let a = mock.send(&message("a@x.com")).await.message_id;
        let b = mock.send(&message("b@x.com")).await.message_id;
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_enable_flag_does_not_block_sending() {
        let mock = transport(0.0, 1);
        assert!(mock.is_enabled());

        mock.disable();
        assert!(!mock.is_enabled());
        assert!(mock.send(&message("d@x.com")).await.succeeded);

        mock.enable();
        assert!(mock.is_enabled());
    }

    #[tokio::test]
    async fn test_clear_log() {
        let mock = transport(0.0, 1);
        mock.send(&message("d@x.com")).await;
        mock.clear_log();
        assert!(mock.get_log().is_empty());
    }

    #[tokio::test]
    async fn test_shared_log_sees_sends() {
        let log = Arc::new(SendLog::new());
        let mock = MockTransport::new(MockConfig::reliable(), log.clone());
        mock.send(&message("d@x.com")).await;
        assert_eq!(log.len(), 1);
    }
}
