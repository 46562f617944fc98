//! Domain event payloads supplied by the application layer.
//!
//! Descriptive fields default to empty so a partially filled event still
//! produces a (degraded) notification. Recipient addresses are checked when
//! the message is built.

use serde::{Deserialize, Deserializer, Serialize};

/// A helper did not register attendance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbsenceDetected {
    #[serde(default, alias = "directorNombre")]
    pub director_name: String,
    #[serde(default)]
    pub director_email: String,
    #[serde(default, alias = "ayudanteNombre")]
    pub helper_name: String,
    #[serde(default, alias = "ayudanteEmail")]
    pub helper_email: Option<String>,
    #[serde(default, alias = "ayudanteId", deserialize_with = "string_or_number")]
    pub helper_id: String,
    #[serde(default, alias = "fecha")]
    pub date: String,
    #[serde(default, alias = "proyectoNombre")]
    pub project_name: String,
    #[serde(default, alias = "sistemaUrl")]
    pub system_url: Option<String>,
}

/// A director submitted a progress report for supervisor review
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSubmitted {
    #[serde(default, alias = "jefaturaNombre")]
    pub supervisor_name: String,
    #[serde(default, alias = "jefaturaEmail")]
    pub supervisor_email: String,
    #[serde(default, alias = "directorNombre")]
    pub director_name: String,
    #[serde(default)]
    pub director_email: String,
    #[serde(default, alias = "proyectoNombre")]
    pub project_name: String,
    #[serde(default, alias = "fechaSubida")]
    pub submitted_at: String,
    #[serde(default, alias = "descripcion")]
    pub description: String,
    #[serde(default, alias = "sistemaUrl")]
    pub system_url: Option<String>,
}

/// A supervisor approved a progress report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressApproved {
    #[serde(default, alias = "directorNombre")]
    pub director_name: String,
    #[serde(default)]
    pub director_email: String,
    #[serde(default, alias = "proyectoNombre")]
    pub project_name: String,
    #[serde(default, alias = "fechaAprobacion")]
    pub approved_at: String,
    #[serde(default, alias = "jefaturaNombre")]
    pub supervisor_name: String,
    #[serde(default, alias = "comentarios")]
    pub comments: Option<String>,
    #[serde(default, alias = "sistemaUrl")]
    pub system_url: Option<String>,
}

/// A supervisor rejected a progress report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRejected {
    #[serde(default, alias = "directorNombre")]
    pub director_name: String,
    #[serde(default)]
    pub director_email: String,
    #[serde(default, alias = "proyectoNombre")]
    pub project_name: String,
    #[serde(default, alias = "fechaRevision")]
    pub reviewed_at: String,
    #[serde(default, alias = "jefaturaNombre")]
    pub supervisor_name: String,
    #[serde(default, alias = "motivoRechazo")]
    pub rejection_reason: String,
    #[serde(default, alias = "observaciones")]
    pub remarks: String,
    #[serde(default, alias = "sistemaUrl")]
    pub system_url: Option<String>,
}

/// Credentials were issued to a new user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsIssued {
    #[serde(default)]
    pub email: String,
    #[serde(default, alias = "nombre")]
    pub name: String,
    #[serde(default, alias = "usuario")]
    pub username: String,
    #[serde(default, alias = "contrasena")]
    pub temporary_password: String,
    #[serde(default, alias = "rol")]
    pub role: String,
    #[serde(default, alias = "codigo", deserialize_with = "string_or_number")]
    pub code: String,
    #[serde(default, alias = "sistemaUrl")]
    pub system_url: Option<String>,
}

impl CredentialsIssued {
    pub fn role_class(&self) -> RoleClass {
        RoleClass::from_role(&self.role)
    }
}

/// Connectivity check addressed to an arbitrary mailbox
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestNotification {
    #[serde(default)]
    pub email: String,
}

/// Which credentials template a role gets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleClass {
    Director,
    Staff,
}

impl RoleClass {
    /// Any role naming a director (e.g. `DIRECTOR`, `project_director`) is director-class
    pub fn from_role(role: &str) -> Self {
        if role.to_lowercase().contains("director") {
            RoleClass::Director
        } else {
            RoleClass::Staff
        }
    }
}

/// Any event the notifier understands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum DomainEvent {
    Absence(AbsenceDetected),
    ProgressSubmitted(ProgressSubmitted),
    ProgressApproved(ProgressApproved),
    ProgressRejected(ProgressRejected),
    CredentialsIssued(CredentialsIssued),
    Test(TestNotification),
}

impl DomainEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::Absence(_) => "absence",
            DomainEvent::ProgressSubmitted(_) => "progress-submitted",
            DomainEvent::ProgressApproved(_) => "progress-approved",
            DomainEvent::ProgressRejected(_) => "progress-rejected",
            DomainEvent::CredentialsIssued(_) => "credentials-issued",
            DomainEvent::Test(_) => "test",
        }
    }
}

/// Accept identifiers sent either as JSON strings or numbers
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
        Nothing(()),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
        Raw::Nothing(()) => String::new(),
    })
}
