// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Presentation mapping for analysis results

use colored::{ColoredString, Colorize};
use serde::Serialize;
use std::fmt::Write as _;

use crate::analysis::{AnalysisResult, SuspicionLevel};

/// Label the service uses for a non-concerning finding
pub const BENIGN_LABEL: &str = "Benign";

pub const DISCLAIMER: &str = "Important: This is an AI-assisted analysis and should not be used \
as a definitive diagnosis. Please consult with a healthcare professional for proper medical evaluation.";

/// Three-step visual tier shared by risk level and region suspicion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    High,
    Medium,
    Low,
}

impl Tier {
    /// Case-insensitive; anything but high/medium, including nothing, is low
    pub fn from_risk_level(risk_level: Option<&str>) -> Self {
        match risk_level.map(|r| r.to_ascii_lowercase()).as_deref() {
            Some("high") => Self::High,
            Some("medium") => Self::Medium,
            _ => Self::Low,
        }
    }

    fn paint(self, text: &str) -> ColoredString {
        match self {
            Self::High => text.red().bold(),
            Self::Medium => text.yellow(),
            Self::Low => text.green(),
        }
    }
}

impl From<SuspicionLevel> for Tier {
    fn from(level: SuspicionLevel) -> Self {
        match level {
            SuspicionLevel::High => Self::High,
            SuspicionLevel::Medium => Self::Medium,
            SuspicionLevel::Low => Self::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationStyle {
    Benign,
    Alert,
}

impl ClassificationStyle {
    pub fn for_label(label: &str) -> Self {
        if label == BENIGN_LABEL {
            Self::Benign
        } else {
            Self::Alert
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionView {
    pub id: i64,
    pub label: String,
    pub suspicion: SuspicionLevel,
    pub tier: Tier,
}

/// Everything a front end needs to draw one result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultView {
    pub classification: String,
    pub classification_style: ClassificationStyle,
    pub confidence: String,
    pub risk_level: String,
    pub risk_tier: Tier,
    pub regions: Vec<RegionView>,
    pub recommendations: Vec<String>,
    pub disclaimer: &'static str,
}

/// Percentage with one decimal, e.g. `87.5%`
pub fn format_confidence(percent: f64) -> String {
    format!("{:.1}%", percent)
}

impl ResultView {
    pub fn from_result(result: &AnalysisResult) -> Self {
        let regions = result
            .regions
            .iter()
            .map(|r| RegionView {
                id: r.id,
                label: format!("Region {}", r.id),
                suspicion: r.suspicion_level,
                tier: r.suspicion_level.into(),
            })
            .collect();

        Self {
            classification: result.classification.clone(),
            classification_style: ClassificationStyle::for_label(&result.classification),
            confidence: format_confidence(result.confidence_percent),
            risk_level: result.risk_level.clone().unwrap_or_default(),
            risk_tier: Tier::from_risk_level(result.risk_level.as_deref()),
            regions,
            recommendations: result.recommendations.clone(),
            disclaimer: DISCLAIMER,
        }
    }
}

fn styled(text: &str, tier: Tier, color: bool) -> String {
    if color {
        tier.paint(text).to_string()
    } else {
        text.to_string()
    }
}

/// Terminal rendering; `color` switches ANSI styling on or off
pub fn render_text(view: &ResultView, color: bool) -> String {
    let mut out = String::new();

    let class_line = format!("Classification: {}", view.classification);
    let class_tier = match view.classification_style {
        ClassificationStyle::Benign => Tier::Low,
        ClassificationStyle::Alert => Tier::High,
    };

    let _ = writeln!(out, "Primary Analysis");
    let _ = writeln!(out, "  {}", styled(&class_line, class_tier, color));
    let _ = writeln!(out, "  Confidence: {}", view.confidence);
    let risk_line = format!("Risk Level: {}", view.risk_level);
    let _ = writeln!(out, "  {}", styled(&risk_line, view.risk_tier, color));

    let _ = writeln!(out);
    let _ = writeln!(out, "Regions of Interest ({})", view.regions.len());
    for region in &view.regions {
        let line = format!("{}  Suspicion Level: {}", region.label, region.suspicion);
        let _ = writeln!(out, "  {}", styled(&line, region.tier, color));
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Recommendations");
    for (i, rec) in view.recommendations.iter().enumerate() {
        let _ = writeln!(out, "  {}. {}", i + 1, rec);
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{}", view.disclaimer);

    out
}
