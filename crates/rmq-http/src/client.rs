use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use rmq_core::{Credentials, HarnessError, HarnessResult};

use crate::evidence::{HttpBody, HttpEvidence};

#[derive(Debug, Clone)]
/// Basic-auth client for the broker management API.
///
/// Every completed request yields evidence, whatever its status code; only
/// connection failures and timeouts are errors.
pub struct ManagementApiClient {
    http: reqwest::Client,
}

impl ManagementApiClient {
    pub fn new(request_timeout_ms: u64) -> HarnessResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent("rmq-suite/management-probe")
            .timeout(Duration::from_millis(request_timeout_ms.max(1)))
            .build()
            .map_err(|error| {
                HarnessError::Transport(format!("failed to create management api client: {error}"))
            })?;
        Ok(Self { http })
    }

    pub async fn http_get(
        &self,
        url: &str,
        username: &str,
        password: &str,
    ) -> HarnessResult<HttpEvidence> {
        let response = self
            .http
            .get(url)
            .basic_auth(username, Some(password))
            .send()
            .await
            .map_err(|error| HarnessError::Transport(format!("GET {url} failed: {error}")))?;

        let status = response.status().as_u16();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_ascii_lowercase().contains("json"))
            .unwrap_or(false);
        let raw = response.text().await.map_err(|error| {
            HarnessError::Transport(format!("GET {url} body read failed: {error}"))
        })?;

        let body = if is_json {
            match serde_json::from_str(&raw) {
                Ok(value) => HttpBody::Json(value),
                Err(error) => {
                    tracing::debug!(url, error = %error, "json content type with undecodable body");
                    HttpBody::Text(raw)
                }
            }
        } else {
            HttpBody::Text(raw)
        };
        tracing::debug!(url, status, "management api request completed");
        Ok(HttpEvidence { status, body })
    }

    pub async fn get_with(
        &self,
        url: &str,
        credentials: &Credentials,
    ) -> HarnessResult<HttpEvidence> {
        self.http_get(url, &credentials.username, &credentials.password)
            .await
    }
}
