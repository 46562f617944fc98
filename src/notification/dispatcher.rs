use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::metrics::DispatchMetrics;
use crate::transport::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerStats, Delivery, MockTransport,
    RealTransport, SendLogEntry, TransportError,
};

use super::{FallbackReason, Message, SendOutcome, TransportKind};

/// Default budget for one real transport call
pub const DEFAULT_REAL_TIMEOUT: Duration = Duration::from_secs(10);

/// Dispatcher configuration
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Explicit availability flag for the real transport
    pub real_enabled: bool,
    /// Timeout for one real transport call; expiry counts as a failure
    pub real_timeout: Duration,
    /// Initial value of the mock override
    pub force_mock: bool,
    pub circuit_breaker: CircuitBreakerConfig,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            real_enabled: true,
            real_timeout: DEFAULT_REAL_TIMEOUT,
            force_mock: false,
            circuit_breaker: CircuitBreakerConfig::default(),
        }
    }
}

/// Result of trying the real transport for one message
#[derive(Debug)]
enum RealAttempt {
    Delivered(Delivery),
    Fallback(FallbackReason),
}

/// Statistics for the notification dispatcher
#[derive(Debug, Default)]
pub struct DispatcherStats {
    /// Total dispatch calls
    pub total_sent: AtomicU64,
    /// Delivered through the real transport
    pub real_delivered: AtomicU64,
    /// Delivered through the mock transport (forced or fallback)
    pub mock_delivered: AtomicU64,
    /// Real transport failures or skips that fell back to mock
    pub fallbacks: AtomicU64,
    /// Dispatch calls that failed end to end
    pub total_failed: AtomicU64,
}

impl DispatcherStats {
    pub fn snapshot(&self) -> DispatcherStatsSnapshot {
        DispatcherStatsSnapshot {
            total_sent: self.total_sent.load(Ordering::Relaxed),
            real_delivered: self.real_delivered.load(Ordering::Relaxed),
            mock_delivered: self.mock_delivered.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
            total_failed: self.total_failed.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of dispatcher statistics
#[derive(Debug, Clone, Serialize)]
pub struct DispatcherStatsSnapshot {
    pub total_sent: u64,
    pub real_delivered: u64,
    pub mock_delivered: u64,
    pub fallbacks: u64,
    pub total_failed: u64,
}

/// Routes each message to the real transport or the mock.
///
/// Decision per call:
/// 1. mock forced: mock only, the real transport is never touched
/// 2. otherwise try the real transport (if available and the circuit allows);
///    any failure falls back to the mock and is recorded on the outcome
/// 3. a mock failure is the final result of the call
pub struct NotificationDispatcher {
    real: Option<Arc<dyn RealTransport>>,
    mock: Arc<MockTransport>,
    config: DispatcherConfig,
    circuit: CircuitBreaker,
    mock_forced: AtomicBool,
    stats: DispatcherStats,
}

impl NotificationDispatcher {
    /// Create a dispatcher with no real transport; every send goes to the mock
    pub fn new(mock: Arc<MockTransport>) -> Self {
        Self::build(None, mock, DispatcherConfig::default())
    }

    /// Create a dispatcher with a real transport and the mock as fallback
    pub fn with_real(
        real: Arc<dyn RealTransport>,
        mock: Arc<MockTransport>,
        config: DispatcherConfig,
    ) -> Self {
        Self::build(Some(real), mock, config)
    }

    fn build(
        real: Option<Arc<dyn RealTransport>>,
        mock: Arc<MockTransport>,
        config: DispatcherConfig,
    ) -> Self {
        let circuit = CircuitBreaker::with_config(config.circuit_breaker.clone());
        let mock_forced = AtomicBool::new(config.force_mock);
        DispatchMetrics::set_mock_forced(config.force_mock);

        Self {
            real,
            mock,
            config,
            circuit,
            mock_forced,
            stats: DispatcherStats::default(),
        }
    }

    /// Dispatch one message
    #[tracing::instrument(
        name = "dispatcher.send",
        skip(self, message),
        fields(
            recipient = %message.recipient(),
            kind = %message.kind(),
            mock_forced = self.is_mock_forced()
        )
    )]
    pub async fn send(&self, message: &Message) -> SendOutcome {
        self.stats.total_sent.fetch_add(1, Ordering::Relaxed);

        let outcome = if self.is_mock_forced() {
            tracing::debug!("Mock transport forced");
            self.mock.send(message).await
        } else {
            match self.try_real(message).await {
                RealAttempt::Delivered(delivery) => {
                    SendOutcome::delivered(message, TransportKind::Real, delivery.message_id)
                }
                RealAttempt::Fallback(reason) => {
                    self.stats.fallbacks.fetch_add(1, Ordering::Relaxed);
                    DispatchMetrics::record_fallback(&reason);
                    tracing::warn!(reason = %reason, "Real transport unusable, falling back to mock");
                    self.mock.send(message).await.with_fallback(reason)
                }
            }
        };

        self.record(&outcome);
        outcome
    }

    /// Whether the real transport may be called right now.
    ///
    /// Never blocks and never touches the network; unknown means unavailable.
    fn available_real(&self) -> Result<&Arc<dyn RealTransport>, FallbackReason> {
        let real = match &self.real {
            Some(real) if self.config.real_enabled => real,
            _ => return Err(FallbackReason::Unavailable),
        };

        if !self.circuit.allow_request() {
            return Err(FallbackReason::CircuitOpen);
        }

        Ok(real)
    }

    async fn try_real(&self, message: &Message) -> RealAttempt {
        let real = match self.available_real() {
            Ok(real) => real,
            Err(reason) => return RealAttempt::Fallback(reason),
        };

        let start = Instant::now();
        let result = match tokio::time::timeout(self.config.real_timeout, real.send(message)).await
        {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(self.config.real_timeout)),
        };
        DispatchMetrics::observe_real_latency(start.elapsed());

        let attempt = match result {
            Ok(delivery) => {
                self.circuit.record_success();
                RealAttempt::Delivered(delivery)
            }
            Err(error) => {
                self.circuit.record_failure();
                tracing::debug!(
                    endpoint = %real.endpoint(),
                    error = %error,
                    "Real transport send failed"
                );
                RealAttempt::Fallback(error.fallback_reason())
            }
        };
        DispatchMetrics::set_circuit_state(self.circuit.state());
        attempt
    }

    fn record(&self, outcome: &SendOutcome) {
        match (outcome.succeeded, outcome.transport_used) {
            (true, TransportKind::Real) => {
                self.stats.real_delivered.fetch_add(1, Ordering::Relaxed);
            }
            (true, TransportKind::Mock) => {
                self.stats.mock_delivered.fetch_add(1, Ordering::Relaxed);
            }
            (false, _) => {
                self.stats.total_failed.fetch_add(1, Ordering::Relaxed);
            }
        }
        DispatchMetrics::record_dispatch(outcome.transport_used, outcome.succeeded);
    }

    /// Force every send through the mock transport
    pub fn enable_mock(&self) {
        self.mock_forced.store(true, Ordering::Release);
        self.mock.enable();
        DispatchMetrics::set_mock_forced(true);
    }

    /// Return to real-first delivery with mock fallback
    pub fn disable_mock(&self) {
        self.mock_forced.store(false, Ordering::Release);
        self.mock.disable();
        DispatchMetrics::set_mock_forced(false);
    }

    pub fn is_mock_forced(&self) -> bool {
        self.mock_forced.load(Ordering::Acquire)
    }

    /// Mock send log, oldest first
    pub fn get_sent_log(&self) -> Vec<SendLogEntry> {
        self.mock.get_log()
    }

    pub fn clear_sent_log(&self) {
        self.mock.clear_log();
    }

    /// Write the numbered send log listing to the log output and return it
    pub fn show_sent_log(&self) -> String {
        let summary = self.mock.log().summary();
        tracing::info!("\n{}", summary);
        summary
    }

    pub fn stats(&self) -> DispatcherStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn circuit_stats(&self) -> CircuitBreakerStats {
        self.circuit.stats()
    }

    /// Target of the real transport, if one is configured and enabled
    pub fn real_endpoint(&self) -> Option<&str> {
        self.real
            .as_ref()
            .filter(|_| self.config.real_enabled)
            .map(|real| real.endpoint())
    }

    pub fn mock(&self) -> &Arc<MockTransport> {
        &self.mock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::NotificationKind;
    use crate::transport::{MockConfig, SendLog, SIMULATED_FAILURE};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    /// Real transport that counts calls and answers with a fixed result
    struct ScriptedReal {
        calls: AtomicUsize,
        result: Result<Delivery, TransportError>,
        delay: Duration,
    }

    impl ScriptedReal {
        fn ok() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                result: Ok(Delivery {
                    message_id: "real-1".to_string(),
                }),
                delay: Duration::ZERO,
            })
        }

        fn failing(error: TransportError) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                result: Err(error),
                delay: Duration::ZERO,
            })
        }

        fn slow(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                result: Ok(Delivery {
                    message_id: "late".to_string(),
                }),
                delay,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RealTransport for ScriptedReal {
        async fn send(&self, _message: &Message) -> Result<Delivery, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.result.clone()
        }

        fn endpoint(&self) -> &str {
            "scripted"
        }
    }

    fn message() -> Message {
        Message::new(NotificationKind::Test, "t@x.com", None, "Test Notification", "b").unwrap()
    }

    fn mock(failure_probability: f64) -> Arc<MockTransport> {
        Arc::new(MockTransport::new(
            MockConfig {
                delay: Duration::ZERO,
                failure_probability,
                seed: Some(3),
            },
            Arc::new(SendLog::new()),
        ))
    }

    #[tokio::test]
    async fn test_real_delivery() {
        let real = ScriptedReal::ok();
        let dispatcher = NotificationDispatcher::with_real(real.clone(), mock(0.0), DispatcherConfig::default());

        let outcome = dispatcher.send(&message()).await;

        assert!(outcome.succeeded);
        assert_eq!(outcome.transport_used, TransportKind::Real);
        assert_eq!(outcome.message_id.as_deref(), Some("real-1"));
        assert_eq!(outcome.fallback, None);
        assert!(dispatcher.get_sent_log().is_empty());
        assert_eq!(real.calls(), 1);
    }

    #[tokio::test]
    async fn test_forced_mock_never_calls_real() {
        let real = ScriptedReal::ok();
        let dispatcher = NotificationDispatcher::with_real(real.clone(), mock(0.0), DispatcherConfig::default());
        dispatcher.enable_mock();

        for _ in 0..5 {
            let outcome = dispatcher.send(&message()).await;
            assert_eq!(outcome.transport_used, TransportKind::Mock);
            assert_eq!(outcome.fallback, None);
        }

        assert_eq!(real.calls(), 0);
        assert_eq!(dispatcher.get_sent_log().len(), 5);
        assert!(dispatcher.mock().is_enabled());
    }

    #[tokio::test]
    async fn test_initial_force_mock_from_config() {
        let real = ScriptedReal::ok();
        let config = DispatcherConfig {
            force_mock: true,
            ..Default::default()
        };
        let dispatcher = NotificationDispatcher::with_real(real.clone(), mock(0.0), config);

        assert!(dispatcher.is_mock_forced());
        dispatcher.send(&message()).await;
        assert_eq!(real.calls(), 0);

        dispatcher.disable_mock();
        assert!(!dispatcher.is_mock_forced());
        assert!(!dispatcher.mock().is_enabled());
        dispatcher.send(&message()).await;
        assert_eq!(real.calls(), 1);
    }

    #[tokio::test]
    async fn test_status_failure_falls_back() {
        let real = ScriptedReal::failing(TransportError::Status { status: 500 });
        let dispatcher = NotificationDispatcher::with_real(real, mock(0.0), DispatcherConfig::default());

        let outcome = dispatcher.send(&message()).await;

        assert!(outcome.succeeded);
        assert_eq!(outcome.transport_used, TransportKind::Mock);
        assert_eq!(outcome.fallback, Some(FallbackReason::Status { status: 500 }));
        assert_eq!(dispatcher.get_sent_log().len(), 1);
        assert_eq!(dispatcher.stats().fallbacks, 1);
    }

    #[tokio::test]
    async fn test_timeout_falls_back() {
        let real = ScriptedReal::slow(Duration::from_secs(5));
        let config = DispatcherConfig {
            real_timeout: Duration::from_millis(20),
            ..Default::default()
        };
        let dispatcher = NotificationDispatcher::with_real(real, mock(0.0), config);

        let outcome = dispatcher.send(&message()).await;

        assert!(outcome.succeeded);
        assert_eq!(outcome.fallback, Some(FallbackReason::Timeout));
    }

    #[tokio::test]
    async fn test_no_real_transport_is_unavailable() {
        let dispatcher = NotificationDispatcher::new(mock(0.0));

        let outcome = dispatcher.send(&message()).await;

        assert!(outcome.succeeded);
        assert_eq!(outcome.fallback, Some(FallbackReason::Unavailable));
        assert_eq!(dispatcher.real_endpoint(), None);
    }

    #[tokio::test]
    async fn test_disabled_real_transport_is_not_called() {
        let real = ScriptedReal::ok();
        let config = DispatcherConfig {
            real_enabled: false,
            ..Default::default()
        };
        let dispatcher = NotificationDispatcher::with_real(real.clone(), mock(0.0), config);

        let outcome = dispatcher.send(&message()).await;

        assert_eq!(outcome.fallback, Some(FallbackReason::Unavailable));
        assert_eq!(real.calls(), 0);
    }

    #[tokio::test]
    async fn test_mock_failure_after_fallback_fails_dispatch() {
        let real = ScriptedReal::failing(TransportError::Network("refused".into()));
        let dispatcher = NotificationDispatcher::with_real(real, mock(1.0), DispatcherConfig::default());

        let outcome = dispatcher.send(&message()).await;

        assert!(!outcome.succeeded);
        assert_eq!(outcome.error.as_deref(), Some(SIMULATED_FAILURE));
        assert!(matches!(outcome.fallback, Some(FallbackReason::Network { .. })));
        assert!(dispatcher.get_sent_log().is_empty());
        assert_eq!(dispatcher.stats().total_failed, 1);
    }

    #[tokio::test]
    async fn test_circuit_opens_and_skips_real() {
        let real = ScriptedReal::failing(TransportError::Status { status: 502 });
        let config = DispatcherConfig {
            circuit_breaker: CircuitBreakerConfig {
                failure_threshold: 2,
                success_threshold: 1,
                reset_timeout: Duration::from_secs(60),
            },
            ..Default::default()
        };
        let dispatcher = NotificationDispatcher::with_real(real.clone(), mock(0.0), config);

        dispatcher.send(&message()).await;
        dispatcher.send(&message()).await;
        let outcome = dispatcher.send(&message()).await;

        assert_eq!(real.calls(), 2);
        assert_eq!(outcome.fallback, Some(FallbackReason::CircuitOpen));
        assert!(outcome.succeeded);
        assert_eq!(dispatcher.circuit_stats().times_opened, 1);
    }

    #[tokio::test]
    async fn test_clear_and_show_sent_log() {
        let dispatcher = NotificationDispatcher::new(mock(0.0));
        dispatcher.send(&message()).await;

        assert!(dispatcher.show_sent_log().contains("To: t@x.com"));

        dispatcher.clear_sent_log();
        assert!(dispatcher.get_sent_log().is_empty());
    }
}
