// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Detection session: the selection and analysis state machine
//!
//! ```text
//! Idle -> FileSelected -> Analyzing -> Succeeded | Failed
//!              ^-------------- any new selection --'
//! ```
//!
//! A new selection while a request is outstanding does not cancel it. The
//! busy flag stays set until that request settles, and its outcome is
//! discarded because it belongs to an older generation.
//!
//! A refused selection is reported next to whatever is on screen: it sets
//! an error but leaves the image, preview and any result in place.

use std::path::Path;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::analysis::AnalysisResult;
use crate::client::AnalysisService;
use crate::error::MISSING_IMAGE_MESSAGE;
use crate::picker::{select_image, SelectedImage};
use crate::{MammoscanError, Result};

/// What the user sees for the current image
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    FileSelected,
    Analyzing,
    Succeeded(AnalysisResult),
    Failed(String),
}

/// Settled analysis: a result or the message to show instead
pub type Outcome = std::result::Result<AnalysisResult, String>;

/// Handle for one in-flight analysis attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisTicket {
    generation: u64,
    attempt_id: Uuid,
}

impl AnalysisTicket {
    pub fn attempt_id(&self) -> Uuid {
        self.attempt_id
    }
}

#[derive(Debug)]
pub struct DetectionSession {
    image: Option<SelectedImage>,
    state: SessionState,
    generation: u64,
    in_flight: Option<AnalysisTicket>,
    /// Set by a refused selection; cleared by the next selection or attempt
    selection_error: Option<String>,
}

impl Default for DetectionSession {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectionSession {
    pub fn new() -> Self {
        Self {
            image: None,
            state: SessionState::Idle,
            generation: 0,
            in_flight: None,
            selection_error: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn image(&self) -> Option<&SelectedImage> {
        self.image.as_ref()
    }

    pub fn preview(&self) -> Option<&str> {
        self.image.as_ref().map(|i| i.preview.as_str())
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        match &self.state {
            SessionState::Succeeded(result) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        if let Some(message) = self.selection_error.as_deref() {
            return Some(message);
        }
        match &self.state {
            SessionState::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// True while a request is outstanding; gates re-submission
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Accept a new image, dropping any previous result or error
    pub fn select(&mut self, image: SelectedImage) {
        self.generation += 1;
        debug!("Selection generation {}: {}", self.generation, image.file_name);
        self.image = Some(image);
        self.selection_error = None;
        self.state = SessionState::FileSelected;
    }

    /// Record a refused selection; image, preview and result stay
    pub fn reject_selection(&mut self, err: &MammoscanError) {
        warn!("Selection rejected: {}", err);
        self.selection_error = Some(err.user_message());
    }

    /// Load `path` and apply it as a selection or a rejection
    pub async fn pick(&mut self, path: &Path) -> Result<()> {
        match select_image(path).await {
            Ok(image) => {
                self.select(image);
                Ok(())
            }
            Err(e) => {
                self.reject_selection(&e);
                Err(e)
            }
        }
    }

    /// Enter `Analyzing` and hand out a ticket for the attempt
    pub fn begin_analysis(&mut self) -> Result<AnalysisTicket> {
        if self.is_busy() {
            return Err(MammoscanError::Busy);
        }
        self.selection_error = None;
        if self.image.is_none() {
            self.state = SessionState::Failed(MISSING_IMAGE_MESSAGE.to_string());
            return Err(MammoscanError::MissingInput);
        }

        let ticket = AnalysisTicket {
            generation: self.generation,
            attempt_id: Uuid::new_v4(),
        };
        self.in_flight = Some(ticket.clone());
        self.state = SessionState::Analyzing;
        Ok(ticket)
    }

    /// Settle an attempt; returns false if the outcome was dropped
    ///
    /// Only the outstanding ticket is accepted. A ticket that already
    /// settled, or was never issued here, changes nothing.
    pub fn complete(&mut self, ticket: &AnalysisTicket, outcome: Outcome) -> bool {
        if self.in_flight.as_ref() != Some(ticket) {
            debug!("Ignoring outcome of attempt {}: not in flight", ticket.attempt_id);
            return false;
        }
        self.in_flight = None;

        if ticket.generation != self.generation {
            debug!(
                "Discarding outcome of attempt {} for superseded selection",
                ticket.attempt_id
            );
            return false;
        }

        self.state = match outcome {
            Ok(result) => SessionState::Succeeded(result),
            Err(message) => SessionState::Failed(message),
        };
        true
    }

    /// Submit the selected image and wait for the service
    pub async fn analyze(&mut self, service: &dyn AnalysisService) -> Result<AnalysisResult> {
        let ticket = self.begin_analysis()?;
        info!(
            "Analysis attempt {} -> {}",
            ticket.attempt_id,
            service.endpoint()
        );

        let outcome = match self.image.as_ref() {
            Some(image) => service.analyze(image).await,
            None => Err(MammoscanError::MissingInput),
        };

        match outcome {
            Ok(result) => {
                info!(
                    "Attempt {} succeeded: {} ({:.1}%)",
                    ticket.attempt_id, result.classification, result.confidence_percent
                );
                self.complete(&ticket, Ok(result.clone()));
                Ok(result)
            }
            Err(e) => {
                warn!("Attempt {} failed: {}", ticket.attempt_id, e);
                self.complete(&ticket, Err(e.user_message()));
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::client::tests::sample_image;
    use crate::error::INVALID_IMAGE_MESSAGE;

    /// Canned service that counts calls
    struct ScriptedService {
        calls: AtomicUsize,
        reply: fn() -> Result<AnalysisResult>,
    }

    impl ScriptedService {
        fn new(reply: fn() -> Result<AnalysisResult>) -> Self {
            Self { calls: AtomicUsize::new(0), reply }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AnalysisService for ScriptedService {
        async fn analyze(&self, _image: &SelectedImage) -> Result<AnalysisResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.reply)()
        }

        fn endpoint(&self) -> &str {
            "scripted://analyze"
        }
    }

    fn benign() -> Result<AnalysisResult> {
        Ok(AnalysisResult {
            classification: "Benign".to_string(),
            confidence_percent: 70.0,
            risk_level: Some("Low".to_string()),
            regions: Vec::new(),
            recommendations: vec!["Maintain regular self-examinations".to_string()],
            summary: None,
        })
    }

    fn unavailable() -> Result<AnalysisResult> {
        Err(MammoscanError::Service("model unavailable".to_string()))
    }

    #[tokio::test]
    async fn test_analyze_without_image_skips_network() {
        let service = ScriptedService::new(benign);
        let mut session = DetectionSession::new();

        let err = session.analyze(&service).await.unwrap_err();
        assert!(matches!(err, MammoscanError::MissingInput));
        assert_eq!(session.error(), Some("Please select an image first"));
        assert_eq!(service.calls(), 0);
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_analyze_success() {
        let service = ScriptedService::new(benign);
        let mut session = DetectionSession::new();
        session.select(sample_image());
        assert_eq!(session.state(), &SessionState::FileSelected);

        let result = session.analyze(&service).await.unwrap();
        assert_eq!(result.classification, "Benign");
        assert_eq!(session.result(), Some(&result));
        assert!(session.error().is_none());
        assert!(!session.is_busy());
        assert_eq!(service.calls(), 1);
    }

    #[tokio::test]
    async fn test_analyze_failure_clears_busy() {
        let service = ScriptedService::new(unavailable);
        let mut session = DetectionSession::new();
        session.select(sample_image());

        assert!(session.analyze(&service).await.is_err());
        assert_eq!(session.error(), Some("model unavailable"));
        assert!(session.result().is_none());
        assert!(!session.is_busy());

        // Manual retry is allowed after a failure
        assert!(session.analyze(&service).await.is_err());
        assert_eq!(service.calls(), 2);
    }

    #[test]
    fn test_busy_spans_exactly_one_attempt() {
        let mut session = DetectionSession::new();
        session.select(sample_image());
        assert!(!session.is_busy());

        let ticket = session.begin_analysis().unwrap();
        assert!(session.is_busy());
        assert_eq!(session.state(), &SessionState::Analyzing);
        assert!(matches!(session.begin_analysis(), Err(MammoscanError::Busy)));

        assert!(session.complete(&ticket, Err("timeout".to_string())));
        assert!(!session.is_busy());
        assert_eq!(session.error(), Some("timeout"));
    }

    #[test]
    fn test_new_selection_clears_result() {
        let mut session = DetectionSession::new();
        session.select(sample_image());
        let ticket = session.begin_analysis().unwrap();
        session.complete(&ticket, benign().map_err(|e| e.user_message()));
        assert!(session.result().is_some());

        session.select(sample_image());
        assert!(session.result().is_none());
        assert!(session.error().is_none());
        assert_eq!(session.state(), &SessionState::FileSelected);
    }

    #[test]
    fn test_stale_outcome_is_discarded() {
        let mut session = DetectionSession::new();
        session.select(sample_image());
        let ticket = session.begin_analysis().unwrap();

        session.select(sample_image());
        // The old request is still outstanding, so re-submission stays blocked
        assert!(session.is_busy());

        let applied = session.complete(&ticket, benign().map_err(|e| e.user_message()));
        assert!(!applied);
        assert!(!session.is_busy());
        assert_eq!(session.state(), &SessionState::FileSelected);
        assert!(session.result().is_none());
    }

    #[tokio::test]
    async fn test_rejected_pick_keeps_preview_and_result() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("scan.png");
        image::RgbImage::new(2, 2).save(&good).unwrap();
        let bad = dir.path().join("notes.txt");
        std::fs::write(&bad, "hello").unwrap();

        let mut session = DetectionSession::new();
        session.pick(&good).await.unwrap();
        let service = ScriptedService::new(benign);
        let shown = session.analyze(&service).await.unwrap();
        let preview = session.preview().map(str::to_string);

        assert!(session.pick(&bad).await.is_err());
        assert_eq!(session.error(), Some(INVALID_IMAGE_MESSAGE));
        assert_eq!(session.result(), Some(&shown));
        assert_eq!(session.preview().map(str::to_string), preview);
        assert_eq!(session.image().unwrap().file_name, "scan.png");

        // The next attempt starts from a clean slate
        session.analyze(&service).await.unwrap();
        assert!(session.error().is_none());
    }

    #[test]
    fn test_settled_ticket_cannot_complete_again() {
        let mut session = DetectionSession::new();
        session.select(sample_image());

        let first = session.begin_analysis().unwrap();
        assert!(session.complete(&first, Err("timeout".to_string())));

        let second = session.begin_analysis().unwrap();
        assert_ne!(first.attempt_id(), second.attempt_id());

        let applied = session.complete(&first, benign().map_err(|e| e.user_message()));
        assert!(!applied);
        assert!(session.is_busy());
        assert_eq!(session.state(), &SessionState::Analyzing);

        assert!(session.complete(&second, Err("model unavailable".to_string())));
        assert!(!session.is_busy());
        assert_eq!(session.error(), Some("model unavailable"));
    }

    #[tokio::test]
    async fn test_pick_clears_previous_error() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("scan.png");
        image::RgbImage::new(2, 2).save(&good).unwrap();

        let mut session = DetectionSession::new();
        let service = ScriptedService::new(benign);
        assert!(session.analyze(&service).await.is_err());
        assert!(session.error().is_some());

        session.pick(&good).await.unwrap();
        assert!(session.error().is_none());
        assert!(session.preview().unwrap().starts_with("data:image/png;base64,"));
    }
}
