//! QR Render Client
//!
//! Client for the external QR image rendering microservice.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde::Serialize;

use crate::config::QrConfig;
use crate::error::{AppError, AppResult};

/// Renders an identifier code into an embeddable image
#[async_trait]
pub trait CodeRenderer: Send + Sync {
    /// Render `code` and return the image as a `data:image/png;base64,` URL.
    async fn render(&self, code: &str) -> AppResult<String>;
}

/// Client for the QR rendering microservice
#[derive(Clone)]
pub struct QrRenderClient {
    api_endpoint: String,
    api_key: String,
    image_size: u32,
    http_client: Client,
}

/// Request to render a QR image
#[derive(Debug, Serialize)]
pub struct RenderRequest {
    pub payload: String,
    pub size: u32,
}

impl QrRenderClient {
    /// Create a new QR render client
    pub fn new(config: &QrConfig) -> Self {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            api_endpoint: config.render_endpoint.clone(),
            api_key: config.render_api_key.clone(),
            image_size: config.image_size,
            http_client,
        }
    }
}

#[async_trait]
impl CodeRenderer for QrRenderClient {
    async fn render(&self, code: &str) -> AppResult<String> {
        let request = RenderRequest {
            payload: code.to_string(),
            size: self.image_size,
        };

        let response = self
            .http_client
            .post(&self.api_endpoint)
            .header("x-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::RenderServiceError(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::RenderServiceError(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::RenderServiceError(format!("Failed to read image: {}", e)))?;

        Ok(format!("data:image/png;base64,{}", STANDARD.encode(&bytes)))
    }
}
