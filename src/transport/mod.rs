//! Delivery channels for rendered messages.
//!
//! - `HttpTransport`: the real backend email endpoint
//! - `MockTransport`: locally simulated delivery with latency and injected failures
//! - `SendLog`: append-only record of mock deliveries, owned by whoever builds the mock
//! - `CircuitBreaker`: stops calling the real transport after repeated failures

mod circuit_breaker;
mod http;
mod mock;
mod send_log;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::notification::{FallbackReason, Message};

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerStats, CircuitState};
pub use http::{HttpTransport, SEND_EMAIL_PATH};
pub use mock::{MockConfig, MockTransport, SIMULATED_FAILURE};
pub use send_log::{DeliveryStatus, SendLog, SendLogEntry};

/// Failure of the real transport. Every variant is recoverable through the
/// mock fallback.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Real transport returned status {status}")]
    Status { status: u16 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid response body: {0}")]
    InvalidBody(String),
}

impl TransportError {
    /// Map to the reason recorded on a fallback outcome
    pub fn fallback_reason(&self) -> FallbackReason {
        match self {
            TransportError::Status { status } => FallbackReason::Status { status: *status },
            TransportError::Network(detail) => FallbackReason::Network {
                detail: detail.clone(),
            },
            TransportError::Timeout(_) => FallbackReason::Timeout,
            TransportError::InvalidBody(detail) => FallbackReason::InvalidBody {
                detail: detail.clone(),
            },
        }
    }
}

/// Accepted delivery on the real transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub message_id: String,
}

/// The non-simulated delivery channel.
///
/// Implemented by `HttpTransport`; tests substitute their own.
#[async_trait]
pub trait RealTransport: Send + Sync {
    /// Hand one message to the backend
    async fn send(&self, message: &Message) -> Result<Delivery, TransportError>;

    /// Human readable target, for logs and health output
    fn endpoint(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_reason_mapping() {
        assert_eq!(
            TransportError::Status { status: 500 }.fallback_reason(),
            FallbackReason::Status { status: 500 }
        );
        assert_eq!(
            TransportError::Timeout(Duration::from_secs(1)).fallback_reason(),
            FallbackReason::Timeout
        );
        assert_eq!(
            TransportError::Network("refused".into()).fallback_reason().label(),
            "network"
        );
    }
}
