//! Circuit breaker guarding the real transport.
//!
//! Consecutive real-transport failures open the circuit; while open the
//! dispatcher goes straight to the mock transport. After the reset timeout
//! a half-open state lets trial requests through.

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use serde::Serialize;

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CircuitState {
    /// Requests flow to the real transport
    Closed,
    /// Real transport is skipped
    Open,
    /// Probe requests allowed
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half-open",
        }
    }

    /// Numeric value for the state gauge
    pub fn as_gauge(&self) -> i64 {
        match self {
            CircuitState::Closed => 0,
            CircuitState::Open => 1,
            CircuitState::HalfOpen => 2,
        }
    }
}

/// Circuit breaker configuration
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before opening; 0 disables the breaker
    pub failure_threshold: u32,
    /// Successes in half-open state before closing
    pub success_threshold: u32,
    /// Time spent open before allowing a trial request
    pub reset_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 2,
            reset_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    failure_count: u32,
    success_count: u32,
    last_state_change: Instant,
    times_opened: u64,
}

/// Circuit breaker for the real transport
pub struct CircuitBreaker {
    inner: Mutex<BreakerInner>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new() -> Self {
        Self::with_config(CircuitBreakerConfig::default())
    }

    pub fn with_config(config: CircuitBreakerConfig) -> Self {
        Self {
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                failure_count: 0,
                success_count: 0,
                last_state_change: Instant::now(),
                times_opened: 0,
            }),
            config,
        }
    }

    fn lock(&self) -> MutexGuard<'_, BreakerInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Current state, moving Open to HalfOpen once the reset timeout elapsed
    pub fn state(&self) -> CircuitState {
        let mut inner = self.lock();
        self.check_state_transition(&mut inner);
        inner.state
    }

    /// Whether the real transport may be tried
    pub fn allow_request(&self) -> bool {
        self.state() != CircuitState::Open
    }

    pub fn record_success(&self) {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => inner.failure_count = 0,
            CircuitState::HalfOpen => {
                inner.success_count += 1;
                if inner.success_count >= self.config.success_threshold {
                    Self::transition_to(&mut inner, CircuitState::Closed);
                    tracing::info!("Real transport circuit closed after successful recovery");
                }
            }
            CircuitState::Open => {}
        }
    }

    pub fn record_failure(&self) {
        if self.config.failure_threshold == 0 {
            return;
        }

        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => {
                inner.failure_count += 1;
                if inner.failure_count >= self.config.failure_threshold {
                    let failures = inner.failure_count;
                    Self::transition_to(&mut inner, CircuitState::Open);
                    tracing::warn!(
                        failures = failures,
                        reset_timeout_ms = self.config.reset_timeout.as_millis() as u64,
                        "Real transport circuit opened, routing all notifications to mock"
                    );
                }
            }
            CircuitState::HalfOpen => {
                Self::transition_to(&mut inner, CircuitState::Open);
                tracing::warn!("Real transport circuit reopened after failed trial request");
            }
            CircuitState::Open => {
                inner.last_state_change = Instant::now();
            }
        }
    }

    fn check_state_transition(&self, inner: &mut BreakerInner) {
        if inner.state == CircuitState::Open
            && inner.last_state_change.elapsed() >= self.config.reset_timeout
        {
            Self::transition_to(inner, CircuitState::HalfOpen);
            tracing::info!("Real transport circuit half-open, probing");
        }
    }

    fn transition_to(inner: &mut BreakerInner, new_state: CircuitState) {
        inner.state = new_state;
        inner.last_state_change = Instant::now();
        inner.success_count = 0;

        match new_state {
            CircuitState::Closed => inner.failure_count = 0,
            CircuitState::Open => inner.times_opened += 1,
            CircuitState::HalfOpen => {}
        }
    }

    pub fn stats(&self) -> CircuitBreakerStats {
        let mut inner = self.lock();
        self.check_state_transition(&mut inner);
        CircuitBreakerStats {
            state: inner.state,
            failure_count: inner.failure_count,
            success_count: inner.success_count,
            times_opened: inner.times_opened,
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}

/// Circuit breaker statistics
#[derive(Debug, Clone, Serialize)]
pub struct CircuitBreakerStats {
    pub state: CircuitState,
    pub failure_count: u32,
    pub success_count: u32,
    pub times_opened: u64,
}
