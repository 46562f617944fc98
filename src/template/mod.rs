//! Notification template rendering.
//!
//! This module provides:
//! - One HTML layout per notification kind, with `{{variable}}` placeholders
//! - A substitution engine that never fails on missing data
//!
//! Rendering is a pure function of `(kind, data)`: no clock, no randomness,
//! no shared state. Missing keys render as empty text so a data-binding gap
//! degrades the message instead of dropping it.
//!
//! # Example
//!
//! ```ignore
//! let data = template_data(json!({
//!     "directorName": "Ana",
//!     "projectName": "P1",
//! }));
//!
//! let body = render(NotificationKind::ProgressApproved, &data);
//! ```

mod layouts;
mod substitution;

use serde_json::{Map, Value};

use crate::notification::NotificationKind;

pub use substitution::substitute;

/// Key/value bag handed to the renderer
pub type TemplateData = Map<String, Value>;

/// Text used by the default layout when no `message` is supplied
pub const DEFAULT_MESSAGE: &str = "You have a new notification in the system.";

/// Render the body for a notification kind
pub fn render(kind: NotificationKind, data: &TemplateData) -> String {
    match kind {
        NotificationKind::Absence => render_layout(&layouts::ABSENCE, data),
        NotificationKind::ProgressSubmitted | NotificationKind::ProgressSubmittedConfirmation => {
            render_layout(&layouts::PROGRESS_SUBMITTED, data)
        }
        NotificationKind::ProgressApproved => render_layout(&layouts::PROGRESS_APPROVED, data),
        NotificationKind::ProgressRejected => render_layout(&layouts::PROGRESS_REJECTED, data),
        NotificationKind::DirectorCredentials => render_layout(&layouts::DIRECTOR_CREDENTIALS, data),
        NotificationKind::StaffCredentials => render_layout(&layouts::STAFF_CREDENTIALS, data),
        NotificationKind::Test => render_default(data),
    }
}

/// Render by kind name; unrecognized names use the default layout
pub fn render_named(kind: &str, data: &TemplateData) -> String {
    match kind.parse::<NotificationKind>() {
        Ok(kind) => render(kind, data),
        Err(_) => render_default(data),
    }
}

/// Render the generic layout showing `data.message`
pub fn render_default(data: &TemplateData) -> String {
    let has_message = data
        .get("message")
        .map(|v| match v {
            Value::String(s) => !s.trim().is_empty(),
            Value::Null => false,
            _ => true,
        })
        .unwrap_or(false);

    if has_message {
        render_layout(&layouts::DEFAULT, data)
    } else {
        let mut data = data.clone();
        data.insert("message".to_string(), Value::String(DEFAULT_MESSAGE.to_string()));
        render_layout(&layouts::DEFAULT, &data)
    }
}

/// Build a `TemplateData` from a JSON object; anything else yields an empty bag
pub fn template_data(value: Value) -> TemplateData {
    match value {
        Value::Object(map) => map,
        _ => TemplateData::new(),
    }
}

fn render_layout(layout: &layouts::Layout, data: &TemplateData) -> String {
    substitute(&layouts::frame(layout), data)
}
