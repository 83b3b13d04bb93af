/*!
 * Translation request orchestration.
 *
 * Validates requests against the coordinator's cached languages, calls the
 * server, and decides per failure kind whether the coordinator's health
 * must change:
 * - transport failures mark the server degraded immediately
 * - auth and request failures leave health untouched
 *
 * With `source = "auto"` validation is skipped and a best-effort detection
 * runs first, so an unavailable pair can still report what was detected.
 */

use log::{debug, warn};
use serde::Serialize;

use crate::coordinator::{CapabilitySnapshot, Coordinator};
use crate::errors::{FailureKind, ProviderError, ServiceError};
use crate::language_utils;
use crate::providers::{DetectionCandidate, LanguageDescriptor, TranslateResponse};

/// Source value asking the server to detect the language
pub const AUTO_SOURCE: &str = "auto";

/// Detection candidates below this confidence are ignored
pub const MIN_DETECTION_CONFIDENCE: f64 = 50.0;

/// Result of a translate service call
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TranslationOutcome {
    pub translated_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected_language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detection_confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uninstalled_detected_language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TranslationOutcome {
    /// Outcome with translated text only
    pub fn translated(text: impl Into<String>) -> Self {
        Self {
            translated_text: text.into(),
            ..Default::default()
        }
    }

    /// Outcome with no translation and an error message
    pub fn partial(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// Whether the call produced a translation
    pub fn is_partial(&self) -> bool {
        self.error.is_some()
    }

    fn set_detection(&mut self, candidate: &DetectionCandidate, installed: &[LanguageDescriptor]) {
        self.detected_language = Some(candidate.language.clone());
        self.detection_confidence = Some(candidate.confidence);
        if !installed.iter().any(|l| l.code == candidate.language) {
            self.uninstalled_detected_language = Some(candidate.language.clone());
        }
    }
}

/// Result of a detect service call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionResult {
    pub detections: Vec<DetectionCandidate>,
}

/// Installed languages of a possibly missing snapshot
fn installed(snapshot: Option<&CapabilitySnapshot>) -> &[LanguageDescriptor] {
    snapshot.map(CapabilitySnapshot::languages).unwrap_or_default()
}

/// Translation service bound to one coordinator
#[derive(Debug, Clone)]
pub struct TranslationService {
    coordinator: Coordinator,
}

impl TranslationService {
    /// Create a service for the given coordinator
    pub fn new(coordinator: Coordinator) -> Self {
        Self { coordinator }
    }

    /// Coordinator this service reads from
    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    /// Translate `text` from `source` (or "auto") to `target`
    pub async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<TranslationOutcome, ServiceError> {
        if source == AUTO_SOURCE {
            return self.translate_auto(text, target).await;
        }

        self.validate_pair(source, target)?;

        match self.coordinator.translate(text, source, target).await {
            Ok(response) => Ok(self.compose(response)),
            Err(err) => Err(ServiceError::TranslationFailed(self.escalate(err))),
        }
    }

    /// Detect the language of `text`
    pub async fn detect(&self, text: &str) -> Result<DetectionResult, ServiceError> {
        match self.coordinator.detect(text).await {
            Ok(detections) => Ok(DetectionResult { detections }),
            Err(err) => Err(ServiceError::DetectionFailed(self.escalate(err))),
        }
    }

    /// Check the pair against the cached languages, before any network call
    fn validate_pair(&self, source: &str, target: &str) -> Result<(), ServiceError> {
        let snapshot = self.coordinator.data();
        let language = snapshot
            .as_deref()
            .and_then(|s| s.find(source))
            .ok_or_else(|| ServiceError::InvalidSource {
                language: source.to_string(),
            })?;

        if !language.supports_target(target) {
            return Err(ServiceError::InvalidTarget {
                from: source.to_string(),
                to: target.to_string(),
            });
        }

        Ok(())
    }

    async fn translate_auto(&self, text: &str, target: &str) -> Result<TranslationOutcome, ServiceError> {
        let candidates = match self.coordinator.detect(text).await {
            Ok(candidates) => candidates,
            Err(err) => {
                debug!("Detection before auto translation failed, continuing without it: {}", err);
                Vec::new()
            }
        };

        match self.coordinator.translate(text, AUTO_SOURCE, target).await {
            Ok(response) => Ok(self.compose(response)),
            Err(err) if err.kind() == FailureKind::Request => Ok(self.partial_outcome(&err, &candidates, target)),
            Err(err) => Err(ServiceError::TranslationFailed(self.escalate(err))),
        }
    }

    fn compose(&self, response: TranslateResponse) -> TranslationOutcome {
        let mut outcome = TranslationOutcome::translated(response.translated_text);
        if let Some(detected) = response.detected_language {
            let snapshot = self.coordinator.data();
            outcome.set_detection(&detected, installed(snapshot.as_deref()));
        }
        outcome
    }

    /// Outcome for an auto translation the server rejected
    fn partial_outcome(
        &self,
        err: &ProviderError,
        candidates: &[DetectionCandidate],
        target: &str,
    ) -> TranslationOutcome {
        let mut outcome = TranslationOutcome::partial(err.to_string());

        // Candidates arrive sorted by descending confidence
        let Some(best) = candidates
            .iter()
            .find(|c| c.confidence >= MIN_DETECTION_CONFIDENCE)
        else {
            debug!("Auto translation to '{}' rejected, no usable detection: {}", target, err);
            return outcome;
        };

        let snapshot = self.coordinator.data();
        let languages = installed(snapshot.as_deref());
        let detected_name = language_utils::display_name(&best.language, languages);
        let target_name = language_utils::display_name(target, languages);

        outcome.error = Some(format!(
            "Detected {} ({:.0}% confidence), but translation from {} to {} is not available",
            detected_name, best.confidence, detected_name, target_name
        ));
        outcome.set_detection(best, languages);
        debug!("Auto translation partial result: {:?}", outcome.error);
        outcome
    }

    /// Mark the server down on transport failures; pass the error on
    fn escalate(&self, err: ProviderError) -> ProviderError {
        if err.is_transport() {
            warn!("Request to '{}' could not reach the server: {}", self.coordinator.name(), err);
            self.coordinator.set_immediate_error(err.to_string());
        }
        err
    }
}
