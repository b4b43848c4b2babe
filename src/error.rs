// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Error types for Mammoscan

use thiserror::Error;

/// Result type alias for Mammoscan operations
pub type Result<T> = std::result::Result<T, MammoscanError>;

/// Shown when the picked file does not declare an image media type
pub const INVALID_IMAGE_MESSAGE: &str = "Please select a valid image file";

/// Shown when analysis is requested before any image is picked
pub const MISSING_IMAGE_MESSAGE: &str = "Please select an image first";

/// Shown when the service rejects a request without saying why
pub const ANALYSIS_FAILED_MESSAGE: &str = "Analysis failed";

/// Last-resort message when a failure carries no text of its own
pub const FALLBACK_MESSAGE: &str = "Error analyzing image. Please try again.";

/// Mammoscan error types
#[derive(Error, Debug)]
pub enum MammoscanError {
    /// Selected file is not an image type
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Analyze triggered with no file selected
    #[error("Missing input: no image selected")]
    MissingInput,

    /// Analyze triggered while a request is still outstanding
    #[error("An analysis is already in progress")]
    Busy,

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service reported a failure, either by status code or by an
    /// `error` field in an otherwise successful body
    #[error("Analysis service error: {0}")]
    Service(String),

    #[error("Malformed analysis response: {0}")]
    MalformedResponse(String),

    #[error("Unknown failure: {0}")]
    Unknown(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MammoscanError {
    /// The single display string shown to the user for this failure
    pub fn user_message(&self) -> String {
        let message = match self {
            Self::InvalidInput(_) => INVALID_IMAGE_MESSAGE.to_string(),
            Self::MissingInput => MISSING_IMAGE_MESSAGE.to_string(),
            Self::Busy => "Analysis already in progress".to_string(),
            Self::Transport(e) => e.to_string(),
            Self::Service(msg) | Self::MalformedResponse(msg) | Self::Unknown(msg) => msg.clone(),
            Self::Config(msg) => msg.clone(),
            Self::FileSystem(e) => e.to_string(),
            Self::Json(e) => e.to_string(),
        };

        if message.trim().is_empty() {
            FALLBACK_MESSAGE.to_string()
        } else {
            message
        }
    }
}
