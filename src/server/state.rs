use std::sync::Arc;
use std::time::Instant;

use crate::config::Settings;
use crate::events::EventNotifier;
use crate::notification::NotificationDispatcher;
use crate::transport::{HttpTransport, MockTransport, RealTransport, SendLog, TransportError};

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub notifier: Arc<EventNotifier>,
    pub start_time: Instant,
}

impl AppState {
    /// Wire the real HTTP transport, the mock and the notifier from settings
    pub fn new(settings: Settings) -> Result<Self, TransportError> {
        let mock = Arc::new(MockTransport::new(
            settings.mock_config(),
            Arc::new(SendLog::new()),
        ));

        let base_url = settings.backend_base_url();
        let real: Arc<dyn RealTransport> =
            Arc::new(HttpTransport::new(base_url, settings.transport.timeout())?);

        tracing::info!(
            endpoint = %real.endpoint(),
            enabled = settings.transport.enabled,
            force_mock = settings.transport.force_mock,
            run_mode = %settings.run_mode,
            "Real transport configured"
        );

        let dispatcher = Arc::new(NotificationDispatcher::with_real(
            real,
            mock,
            settings.dispatcher_config(),
        ));

        Ok(Self::with_dispatcher(settings, dispatcher))
    }

    /// Build state around an existing dispatcher
    pub fn with_dispatcher(settings: Settings, dispatcher: Arc<NotificationDispatcher>) -> Self {
        let notifier = Arc::new(EventNotifier::new(
            dispatcher.clone(),
            settings.system_url.clone(),
        ));

        Self {
            settings: Arc::new(settings),
            dispatcher,
            notifier,
            start_time: Instant::now(),
        }
    }
}
