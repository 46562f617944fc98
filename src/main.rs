use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::broadcast;

use attendance_notifier::config::Settings;
use attendance_notifier::events::{AbsenceSource, HttpAbsenceSource};
use attendance_notifier::server::{create_app, AppState};
use attendance_notifier::tasks::AbsenceCheckTask;
use attendance_notifier::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let settings = Settings::new()?;

    // Initialize tracing; keep the guard until shutdown
    let _telemetry = init_telemetry(&settings.otel, settings.log.format)?;
    tracing::info!(run_mode = %settings.run_mode, "Configuration loaded");

    // Create application state
    let state = AppState::new(settings.clone())?;
    tracing::info!("Application state initialized");

    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    // Start the scheduled absence check in background
    let absence_handle = if settings.absence_check.enabled {
        let source: Arc<dyn AbsenceSource> = Arc::new(HttpAbsenceSource::new(
            settings.backend_base_url(),
            &settings.absence_check.path,
            settings.transport.timeout(),
        )?);
        let task = AbsenceCheckTask::new(
            Duration::from_secs(settings.absence_check.interval_secs),
            state.notifier.clone(),
            source,
            shutdown_tx.subscribe(),
        );
        Some(tokio::spawn(async move {
            task.run().await;
        }))
    } else {
        tracing::info!("Scheduled absence check disabled");
        None
    };

    // Create Axum app
    let app = create_app(state);

    // Start server
    let addr = settings.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal_handler(shutdown_tx))
        .await?;

    // Wait for background tasks to finish
    if let Some(handle) = absence_handle {
        tracing::info!("Waiting for background tasks to finish...");
        let _ = handle.await;
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal_handler(shutdown_tx: broadcast::Sender<()>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install terminate handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }

    // Stop background tasks
    let _ = shutdown_tx.send(());
}
