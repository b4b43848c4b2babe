// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Analysis response model and the validation boundary for service replies

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::error::ANALYSIS_FAILED_MESSAGE;
use crate::{MammoscanError, Result};

/// Axis-aligned box locating a region in image pixel space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Suspicion tier the service assigns to a region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SuspicionLevel {
    High,
    Medium,
    Low,
}

impl SuspicionLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl FromStr for SuspicionLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(format!("unknown suspicion level '{}'", other)),
        }
    }
}

impl TryFrom<String> for SuspicionLevel {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SuspicionLevel> for String {
    fn from(level: SuspicionLevel) -> Self {
        level.as_str().to_string()
    }
}

impl fmt::Display for SuspicionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A sub-area of the analyzed image flagged by the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: i64,
    pub location: BoundingBox,
    pub area: f64,
    pub density: f64,
    pub suspicion_level: SuspicionLevel,
}

/// Structured result of one analysis call
///
/// Field names follow the service's JSON so the value can be echoed back
/// unchanged by `--format json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(rename = "class")]
    pub classification: String,
    #[serde(rename = "confidence")]
    pub confidence_percent: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<String>,
    pub regions: Vec<Region>,
    pub recommendations: Vec<String>,
    /// Free-text report some service builds attach under `result`
    #[serde(rename = "result", default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl AnalysisResult {
    /// Check invariants serde cannot express
    pub fn validate(&self) -> Result<()> {
        if !self.confidence_percent.is_finite()
            || !(0.0..=100.0).contains(&self.confidence_percent)
        {
            return Err(MammoscanError::MalformedResponse(format!(
                "confidence {} is outside 0-100",
                self.confidence_percent
            )));
        }

        let mut seen = HashSet::with_capacity(self.regions.len());
        for region in &self.regions {
            if !seen.insert(region.id) {
                return Err(MammoscanError::MalformedResponse(format!(
                    "duplicate region id {}",
                    region.id
                )));
            }
            if region.location.width < 0.0 || region.location.height < 0.0 {
                return Err(MammoscanError::MalformedResponse(format!(
                    "region {} has a negative extent",
                    region.id
                )));
            }
        }

        Ok(())
    }
}

/// Turn one HTTP status and body into a result or a user-facing failure
///
/// The service may report failure through the status code, through an
/// `error` field on a 2xx reply, or both; every path ends here.
pub fn parse_response(status: u16, body: &str) -> Result<AnalysisResult> {
    let success = (200..300).contains(&status);

    let value: serde_json::Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) if success => {
            return Err(MammoscanError::MalformedResponse(format!(
                "response body is not JSON: {}",
                e
            )))
        }
        Err(_) => return Err(MammoscanError::Service(ANALYSIS_FAILED_MESSAGE.to_string())),
    };

    let reported_error = error_field(&value);

    if !success {
        return Err(MammoscanError::Service(
            reported_error.unwrap_or_else(|| ANALYSIS_FAILED_MESSAGE.to_string()),
        ));
    }

    if let Some(message) = reported_error {
        return Err(MammoscanError::Service(message));
    }

    let result: AnalysisResult = serde_json::from_value(value)
        .map_err(|e| MammoscanError::MalformedResponse(e.to_string()))?;
    result.validate()?;

    Ok(result)
}

/// Non-empty `error` text in a response body, if any
fn error_field(value: &serde_json::Value) -> Option<String> {
    match value.get("error")? {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        serde_json::Value::String(_) | serde_json::Value::Null => None,
        serde_json::Value::Bool(false) => None,
        other => Some(other.to_string()),
    }
}
