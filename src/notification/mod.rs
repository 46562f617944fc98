//! Notification messages and dispatching.
//!
//! A `Message` is built once per send from a rendered template. The
//! `NotificationDispatcher` hands it to the real transport or to the mock,
//! and always answers with exactly one `SendOutcome`.

mod dispatcher;
mod types;

pub use crate::error::NotifyError;
pub use dispatcher::{
    DispatcherConfig, DispatcherStats, DispatcherStatsSnapshot, NotificationDispatcher,
    DEFAULT_REAL_TIMEOUT,
};
pub use types::{FallbackReason, Message, NotificationKind, SendOutcome, TransportKind, UnknownKind};
