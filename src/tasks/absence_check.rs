use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::broadcast;

use crate::events::{AbsenceSource, EventNotifier};

/// Background task running the daily absence scan on a fixed interval
pub struct AbsenceCheckTask {
    interval: Duration,
    notifier: Arc<EventNotifier>,
    source: Arc<dyn AbsenceSource>,
    shutdown: broadcast::Receiver<()>,
}

impl AbsenceCheckTask {
    pub fn new(
        interval: Duration,
        notifier: Arc<EventNotifier>,
        source: Arc<dyn AbsenceSource>,
        shutdown: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            interval,
            notifier,
            source,
            shutdown,
        }
    }

    /// Run until a shutdown signal arrives
    pub async fn run(mut self) {
        let mut timer = tokio::time::interval(self.interval);

        // Skip immediate first tick
        timer.tick().await;

        tracing::info!(
            interval_secs = self.interval.as_secs(),
            "Absence check task started"
        );

        loop {
            tokio::select! {
                _ = self.shutdown.recv() => {
                    tracing::info!("Absence check task received shutdown signal");
                    break;
                }
                _ = timer.tick() => {
                    self.check_absences().await;
                }
            }
        }

        tracing::info!("Absence check task stopped");
    }

    async fn check_absences(&self) {
        let start = Instant::now();

        match self.notifier.run_absence_check(self.source.as_ref()).await {
            Ok(report) => {
                if !report.failures.is_empty() {
                    tracing::warn!(
                        failed = report.failures.len(),
                        notified = report.notified,
                        "Some absence notifications failed"
                    );
                }
                tracing::info!(
                    detected = report.detected,
                    notified = report.notified,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Daily absence check completed"
                );
            }
            Err(e) => {
                tracing::warn!(error = %e, "Daily absence check failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{AbsenceDetected, StaticAbsenceSource};
    use crate::notification::NotificationDispatcher;
    use crate::transport::{MockConfig, MockTransport, SendLog};

    fn notifier() -> Arc<EventNotifier> {
        let mock = Arc::new(MockTransport::new(
            MockConfig::reliable(),
            Arc::new(SendLog::new()),
        ));
        let dispatcher = Arc::new(NotificationDispatcher::new(mock));
        Arc::new(EventNotifier::new(dispatcher, "http://localhost:3000"))
    }

    #[tokio::test]
    async fn test_absence_check_task_shutdown() {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let task = AbsenceCheckTask::new(
            Duration::from_secs(3600),
            notifier(),
            Arc::new(StaticAbsenceSource::new(vec![])),
            shutdown_rx,
        );

        let handle = tokio::spawn(async move {
            task.run().await;
        });

        tokio::time::sleep(Duration::from_millis(100)).await;
        shutdown_tx.send(()).unwrap();

        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("Task should complete")
            .expect("Task should not panic");
    }

    #[tokio::test]
    async fn test_absence_check_notifies_on_tick() {
        let notifier = notifier();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let source = Arc::new(StaticAbsenceSource::new(vec![AbsenceDetected {
            director_email: "d@x.com".into(),
            helper_name: "Luis".into(),
            ..Default::default()
        }]));

        let task = AbsenceCheckTask::new(
            Duration::from_millis(50),
            notifier.clone(),
            source,
            shutdown_rx,
        );
        let handle = tokio::spawn(async move {
            task.run().await;
        });

        let log = notifier.dispatcher().mock().log().clone();
        tokio::time::timeout(Duration::from_secs(2), async {
            while log.is_empty() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("Absence should be notified");

        shutdown_tx.send(()).unwrap();
        let _ = handle.await;

        let entries = notifier.dispatcher().get_sent_log();
        assert_eq!(entries[0].recipient, "d@x.com");
        assert_eq!(entries[0].subject, "Absence Detected - Luis");
    }
}
