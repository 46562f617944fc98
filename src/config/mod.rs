mod settings;

pub use settings::{
    AbsenceCheckConfig, CircuitBreakerSettings, EndpointTable, LogConfig, LogFormat, MockSettings,
    OtelConfig, ServerConfig, Settings, TransportConfig,
};
