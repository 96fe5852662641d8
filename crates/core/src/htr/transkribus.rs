//! Transkribus processing API client.

use async_trait::async_trait;
use base64::Engine;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::HtrServiceConfig;

use super::token::{Grant, TokenState};
use super::{HtrClient, HtrError};

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: u64,
    refresh_expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    #[serde(rename = "processId")]
    process_id: i64,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
}

/// Client for the Transkribus processing API.
///
/// Credentials live behind a mutex held across both the refresh decision and
/// the grant call, so concurrent callers never trigger duplicate
/// re-authentication or read a half-updated token set.
pub struct TranskribusClient {
    http: Client,
    config: HtrServiceConfig,
    tokens: Mutex<Option<TokenState>>,
}

impl TranskribusClient {
    /// Create a new client from the service configuration.
    pub fn new(config: HtrServiceConfig) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            config,
            tokens: Mutex::new(None),
        }
    }

    /// Return a valid access token, performing whichever grant is due.
    async fn bearer_token(&self) -> Result<String, HtrError> {
        let mut tokens = self.tokens.lock().await;

        match Grant::decide(tokens.as_ref(), Instant::now()) {
            Grant::Reuse => {
                if let Some(state) = tokens.as_ref() {
                    return Ok(state.access_token.clone());
                }
            }
            Grant::Refresh => {
                if let Some(state) = tokens.as_ref() {
                    debug!("Access token near expiry, performing refresh grant");
                    let refreshed = self
                        .request_token(&[
                            ("grant_type", "refresh_token"),
                            ("refresh_token", state.refresh_token.as_str()),
                            ("client_id", self.config.client_id.as_str()),
                        ])
                        .await?;
                    let access = refreshed.access_token.clone();
                    *tokens = Some(refreshed);
                    return Ok(access);
                }
            }
            Grant::Password => {}
        }

        debug!("Performing password grant against token endpoint");
        let fresh = self
            .request_token(&[
                ("grant_type", "password"),
                ("username", self.config.username.as_str()),
                ("password", self.config.password.as_str()),
                ("client_id", self.config.client_id.as_str()),
            ])
            .await?;
        let access = fresh.access_token.clone();
        *tokens = Some(fresh);
        Ok(access)
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> Result<TokenState, HtrError> {
        let response = self
            .http
            .post(&self.config.token_url)
            .form(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(HtrError::Auth(format!(
                "token endpoint returned HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| HtrError::InvalidResponse(format!("token payload: {}", e)))?;

        Ok(TokenState {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            access_expires_in: Duration::from_secs(token.expires_in),
            refresh_expires_in: Duration::from_secs(token.refresh_expires_in),
            retrieved_at: Instant::now(),
        })
    }

    fn process_url(&self, process_id: i64) -> String {
        format!(
            "{}/{}",
            self.config.processing_url.trim_end_matches('/'),
            process_id
        )
    }

    async fn read_error(response: reqwest::Response) -> HtrError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        HtrError::Api {
            status,
            body: body.chars().take(200).collect(),
        }
    }
}

#[async_trait]
impl HtrClient for TranskribusClient {
    async fn submit(&self, model_id: i64, image: &[u8]) -> Result<i64, HtrError> {
        let token = self.bearer_token().await?;
        let image_base64 = base64::engine::general_purpose::STANDARD.encode(image);

        let response = self
            .http
            .post(&self.config.processing_url)
            .bearer_auth(token)
            .json(&json!({
                "config": {
                    "textRecognition": {
                        "htrId": model_id,
                    },
                },
                "image": {
                    "base64": image_base64,
                },
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::read_error(response).await);
        }

        let submit: SubmitResponse = response
            .json()
            .await
            .map_err(|e| HtrError::InvalidResponse(format!("submission payload: {}", e)))?;

        debug!(process_id = submit.process_id, "Job submitted");
        Ok(submit.process_id)
    }

    async fn status(&self, process_id: i64) -> Result<String, HtrError> {
        let token = self.bearer_token().await?;

        let response = self
            .http
            .get(self.process_url(process_id))
            .bearer_auth(token)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(HtrError::JobExpired { process_id });
        }
        if !response.status().is_success() {
            return Err(Self::read_error(response).await);
        }

        let status: StatusResponse = response
            .json()
            .await
            .map_err(|e| HtrError::InvalidResponse(format!("status payload: {}", e)))?;

        Ok(status.status)
    }

    async fn result(&self, process_id: i64) -> Result<String, HtrError> {
        let token = self.bearer_token().await?;

        let response = self
            .http
            .get(format!("{}/alto", self.process_url(process_id)))
            .bearer_auth(token)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(HtrError::JobExpired { process_id });
        }
        if !response.status().is_success() {
            return Err(Self::read_error(response).await);
        }

        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> TranskribusClient {
        TranskribusClient::new(HtrServiceConfig {
            processing_url: "https://example.test/processing/v1/processes/".to_string(),
            token_url: "https://example.test/token".to_string(),
            username: "reader".to_string(),
            password: "secret".to_string(),
            client_id: "processing-api-client".to_string(),
            default_model: None,
            timeout_secs: 5,
        })
    }

    #[test]
    fn test_process_url_trims_trailing_slash() {
        let client = test_client();
        assert_eq!(
            client.process_url(42),
            "https://example.test/processing/v1/processes/42"
        );
    }
}
