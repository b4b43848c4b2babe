// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Configuration management for Mammoscan

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main application configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Analysis service configuration
    pub service: ServiceConfig,

    /// Chat assistant script
    #[serde(default)]
    pub chat: ChatConfig,

    /// Terminal output settings
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServiceConfig {
    /// Endpoint that accepts the multipart upload
    pub url: String,
    /// Multipart field carrying the image bytes
    #[serde(default = "default_field_name")]
    pub field_name: String,
    /// Request timeout; absent means wait indefinitely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ChatConfig {
    #[serde(default = "default_greeting")]
    pub greeting: String,
    #[serde(default = "default_reply")]
    pub reply: String,
    #[serde(default = "default_reply_delay_ms")]
    pub reply_delay_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_true")]
    pub color: bool,
    /// Characters of the data URL shown by `preview` without `--full`
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,
}

// Default value functions
fn default_url() -> String { "http://localhost:5000/analyze".to_string() }
fn default_field_name() -> String { "image".to_string() }
fn default_reply_delay_ms() -> u64 { 1000 }
fn default_true() -> bool { true }
fn default_preview_chars() -> usize { 96 }

fn default_greeting() -> String {
    "Hello! I'm your breast cancer awareness assistant. How can I help you today?".to_string()
}

fn default_reply() -> String {
    "I understand your concern. While I can provide general information about breast cancer \
     awareness and prevention, please consult with healthcare professionals for medical advice."
        .to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            chat: ChatConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            field_name: default_field_name(),
            timeout_secs: None,
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            greeting: default_greeting(),
            reply: default_reply(),
            reply_delay_ms: default_reply_delay_ms(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            color: true,
            preview_chars: default_preview_chars(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = serde_json::from_str(&content)
                .map_err(|e| crate::MammoscanError::Config(format!("Failed to parse config: {}", e)))?;
            config.validate()?;
            Ok(config)
        } else {
            tracing::info!("Config file not found at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject settings the client cannot work with
    pub fn validate(&self) -> crate::Result<()> {
        let url = self.service.url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(crate::MammoscanError::Config(format!(
                "service.url must be an http(s) URL, got '{}'",
                self.service.url
            )));
        }
        if self.service.field_name.trim().is_empty() {
            return Err(crate::MammoscanError::Config(
                "service.field_name must not be empty".to_string(),
            ));
        }
        if self.service.timeout_secs == Some(0) {
            return Err(crate::MammoscanError::Config(
                "service.timeout_secs must be positive when set".to_string(),
            ));
        }
        Ok(())
    }
}
