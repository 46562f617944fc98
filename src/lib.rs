// Shared infrastructure
pub mod config;
pub mod error;
pub mod metrics;
pub mod telemetry;

// Notification core
pub mod events;
pub mod notification;
pub mod template;
pub mod transport;

// Application layer
pub mod api;
pub mod server;
pub mod tasks;
