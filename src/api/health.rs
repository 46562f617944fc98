//! Health check endpoint.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::notification::DispatcherStatsSnapshot;
use crate::server::AppState;
use crate::transport::{CircuitBreakerStats, CircuitState};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub transport: TransportHealthResponse,
    pub mock: MockHealthResponse,
    pub dispatch: DispatcherStatsSnapshot,
}

#[derive(Debug, Serialize)]
pub struct TransportHealthResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    pub enabled: bool,
    pub circuit: CircuitBreakerStats,
}

#[derive(Debug, Serialize)]
pub struct MockHealthResponse {
    pub forced: bool,
    pub log_size: usize,
    pub failure_probability: f64,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let circuit = state.dispatcher.circuit_stats();
    let endpoint = state.dispatcher.real_endpoint().map(str::to_string);

    // Mock delivery still works when the real side is unusable
    let status = if endpoint.is_some() && circuit.state != CircuitState::Open {
        "healthy"
    } else {
        "degraded"
    };

    let mock = state.dispatcher.mock();

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        transport: TransportHealthResponse {
            enabled: endpoint.is_some(),
            endpoint,
            circuit,
        },
        mock: MockHealthResponse {
            forced: state.dispatcher.is_mock_forced(),
            log_size: mock.log().len(),
            failure_probability: mock.config().failure_probability,
        },
        dispatch: state.dispatcher.stats(),
    })
}
