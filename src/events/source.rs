//! Where the daily absence scan gets its list of absent helpers.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::notification::NotifyError;

use super::models::AbsenceDetected;

/// Default path of the attendance service's daily absence check
pub const DAILY_ABSENCES_PATH: &str = "/api/ausencias/verificar-diarias";

/// Supplies the absences detected for the current day
#[async_trait]
pub trait AbsenceSource: Send + Sync {
    async fn daily_absences(&self) -> Result<Vec<AbsenceDetected>, NotifyError>;
}

/// Fixed list of absences, used when the caller already has them
pub struct StaticAbsenceSource {
    absences: Vec<AbsenceDetected>,
}

impl StaticAbsenceSource {
    pub fn new(absences: Vec<AbsenceDetected>) -> Self {
        Self { absences }
    }
}

#[async_trait]
impl AbsenceSource for StaticAbsenceSource {
    async fn daily_absences(&self) -> Result<Vec<AbsenceDetected>, NotifyError> {
        Ok(self.absences.clone())
    }
}

/// Accepts either a bare array or an object wrapping the list
#[derive(Deserialize)]
#[serde(untagged)]
enum AbsenceListBody {
    List(Vec<AbsenceDetected>),
    Wrapped {
        #[serde(alias = "ausencias", alias = "data")]
        absences: Vec<AbsenceDetected>,
    },
}

/// Asks the attendance backend to run its daily check and return the absences
pub struct HttpAbsenceSource {
    client: reqwest::Client,
    url: String,
}

impl HttpAbsenceSource {
    pub fn new(base_url: &str, path: &str, timeout: Duration) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::Upstream(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: format!("{}{}", base_url.trim_end_matches('/'), path),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl AbsenceSource for HttpAbsenceSource {
    #[tracing::instrument(name = "absence_source.fetch", skip(self), fields(url = %self.url))]
    async fn daily_absences(&self) -> Result<Vec<AbsenceDetected>, NotifyError> {
        let response = self
            .client
            .post(&self.url)
            .send()
            .await
            .map_err(|e| NotifyError::Upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Upstream(format!(
                "absence check returned status {}",
                status.as_u16()
            )));
        }

        let body: AbsenceListBody = response
            .json()
            .await
            .map_err(|e| NotifyError::Upstream(format!("invalid absence list: {}", e)))?;

        let absences = match body {
            AbsenceListBody::List(list) => list,
            AbsenceListBody::Wrapped { absences } => absences,
        };

        tracing::debug!(count = absences.len(), "Fetched daily absences");
        Ok(absences)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetches_bare_list() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(DAILY_ABSENCES_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "directorNombre": "Dr. Vega",
                    "directorEmail": "d@x.com",
                    "ayudanteNombre": "Luis",
                    "fecha": "2024-03-01",
                    "proyectoNombre": "Solar Car"
                }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let source =
            HttpAbsenceSource::new(&server.uri(), DAILY_ABSENCES_PATH, Duration::from_secs(2))
                .unwrap();
        let absences = source.daily_absences().await.unwrap();

        assert_eq!(absences.len(), 1);
        assert_eq!(absences[0].helper_name, "Luis");
        assert_eq!(absences[0].director_name, "Dr. Vega");
        assert_eq!(absences[0].date, "2024-03-01");
        assert_eq!(absences[0].project_name, "Solar Car");
    }

    #[tokio::test]
    async fn test_fetches_wrapped_list() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ausencias": [
                    {"directorEmail": "d1@x.com"},
                    {"directorEmail": "d2@x.com"}
                ]
            })))
            .mount(&server)
            .await;

        let source =
            HttpAbsenceSource::new(&server.uri(), DAILY_ABSENCES_PATH, Duration::from_secs(2))
                .unwrap();
        let absences = source.daily_absences().await.unwrap();

        assert_eq!(absences.len(), 2);
        assert_eq!(absences[1].director_email, "d2@x.com");
    }

    #[tokio::test]
    async fn test_error_status_is_upstream_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let source =
            HttpAbsenceSource::new(&server.uri(), DAILY_ABSENCES_PATH, Duration::from_secs(2))
                .unwrap();
        let err = source.daily_absences().await.unwrap_err();

        assert!(matches!(err, NotifyError::Upstream(msg) if msg.contains("503")));
    }

    #[tokio::test]
    async fn test_static_source() {
        let source = StaticAbsenceSource::new(vec![AbsenceDetected::default()]);
        assert_eq!(source.daily_absences().await.unwrap().len(), 1);
    }
}
