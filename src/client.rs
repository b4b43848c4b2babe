// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! HTTP client for the external analysis service

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

use crate::analysis::{parse_response, AnalysisResult};
use crate::config::ServiceConfig;
use crate::picker::SelectedImage;
use crate::{MammoscanError, Result};

/// Anything that can turn an image into an analysis result
#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Submit one image and wait for the verdict
    async fn analyze(&self, image: &SelectedImage) -> Result<AnalysisResult>;

    /// Where requests go, for logs and status output
    fn endpoint(&self) -> &str;
}

/// Multipart upload client
pub struct AnalysisClient {
    client: Client,
    endpoint: String,
    field_name: String,
}

impl AnalysisClient {
    /// Create a new client from service settings
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            endpoint: config.url.trim().to_string(),
            field_name: config.field_name.clone(),
        })
    }

    /// Check that something answers at the endpoint
    ///
    /// Any HTTP status counts as reachable; the returned code lets callers
    /// tell a live service from a misrouted one.
    pub async fn health_check(&self) -> Result<u16> {
        let response = self
            .client
            .get(&self.endpoint)
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| {
                MammoscanError::Service(format!(
                    "Cannot reach analysis service at {}: {}",
                    self.endpoint, e
                ))
            })?;

        Ok(response.status().as_u16())
    }

    fn build_form(&self, image: &SelectedImage) -> Result<Form> {
        let part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.media_type)?;

        Ok(Form::new().part(self.field_name.clone(), part))
    }
}

#[async_trait]
impl AnalysisService for AnalysisClient {
    async fn analyze(&self, image: &SelectedImage) -> Result<AnalysisResult> {
        let form = self.build_form(image)?;

        debug!("Sending {} to {}", image.file_name, self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        debug!("Analysis service answered {}", status);

        let body = response.text().await?;
        if !status.is_success() {
            warn!("Analysis service returned status {}", status);
        }

        parse_response(status.as_u16(), &body)
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
