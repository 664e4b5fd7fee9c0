//! HTTP geolocation adapter. Implements LocationPort via a JSON lookup endpoint.
//!
//! Expects `{"latitude": .., "longitude": ..}`; `lat`/`lon` and `lat`/`lng` spellings are accepted.
//! Every failure (network, status, body) is reported as `LocationUnavailable`.

use crate::domain::{Coordinate, DomainError};
use crate::ports::LocationPort;
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
struct LocationResponse {
    #[serde(alias = "lat")]
    latitude: Option<f64>,
    #[serde(alias = "lon", alias = "lng")]
    longitude: Option<f64>,
}

/// Geolocation over HTTP. No timeout of its own; the caller bounds the request.
pub struct HttpLocationAdapter {
    client: Client,
    url: String,
}

impl HttpLocationAdapter {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }

    fn parse_body(body: &str) -> Result<Coordinate, DomainError> {
        let parsed: LocationResponse = serde_json::from_str(body).map_err(|e| {
            DomainError::LocationUnavailable(format!("unreadable location response: {}", e))
        })?;
        match (parsed.latitude, parsed.longitude) {
            (Some(lat), Some(lng)) => Coordinate::new(lat, lng),
            _ => Err(DomainError::LocationUnavailable(
                "location response has no coordinates".to_string(),
            )),
        }
    }
}

#[async_trait::async_trait]
impl LocationPort for HttpLocationAdapter {
    async fn current_location(&self) -> Result<Coordinate, DomainError> {
        let response = self
            .client
            .get(&self.url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| DomainError::LocationUnavailable(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            warn!(status = %status, url = %self.url, "location service returned error");
            return Err(DomainError::LocationUnavailable(format!(
                "location service error {}",
                status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| DomainError::LocationUnavailable(format!("read body: {}", e)))?;
        let at = Self::parse_body(&body)?;
        info!(location = %at, "location acquired");
        Ok(at)
    }
}
