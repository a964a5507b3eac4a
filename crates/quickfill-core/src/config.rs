use crate::error::{QuickfillError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// Marker attribute set on a surface once it is bound, so redundant sweeps
/// leave it alone.
pub const ATTACHED_MARKER: &str = "data-qf-attached";

/// Class carried by the overlay element; also how tests count overlays.
pub const OVERLAY_CLASS: &str = "qf-suggestion";

pub const DEFAULT_TRIGGER_KEY: &str = "Tab";
pub const DEFAULT_SENTINEL: char = ';';

/// Debounce before a detection read after ordinary typing.
pub const DETECT_DEBOUNCE: Duration = Duration::from_millis(50);
/// Longer debounce after Backspace/Delete, which tend to arrive in bursts.
pub const DELETE_DEBOUNCE: Duration = Duration::from_millis(100);
/// How long an unanswered suggestion stays on screen.
pub const OVERLAY_TIMEOUT: Duration = Duration::from_secs(2);
/// Cadence of the periodic re-discovery sweep.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(1);
/// How long the post-expansion highlight stays on the surface.
pub const HIGHLIGHT_REVERT: Duration = Duration::from_millis(200);
/// Delay before re-reading a surface after a write, giving rich editors
/// time to run their own asynchronous normalization.
pub const SETTLE_DELAY: Duration = Duration::from_millis(30);

/// Longest expansion preview shown in the overlay, in characters.
pub const PREVIEW_LIMIT: usize = 40;

/// How the trailing token is extracted from surface text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetectionMode {
    /// Canonical rule: the trailing non-whitespace run is the candidate.
    /// When a sentinel character is configured, the suffix of the run
    /// starting at its last sentinel is also tried, so `hello;sig` still
    /// offers `;sig`.
    #[default]
    TrailingRun,
    /// Stricter variant: only the whole whitespace-bounded trailing word is
    /// ever a candidate.
    WordBounded,
}

/// Process-wide configuration pushed in from the external store.
///
/// Replaced wholesale on every change notification; the engine never merges
/// partial updates.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Token -> expansion body.
    pub shortcuts: HashMap<String, String>,
    /// Key name that confirms an offered expansion.
    pub trigger_key: String,
    pub detection_mode: DetectionMode,
    /// Prefix character tokens conventionally start with.
    pub sentinel: Option<char>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            shortcuts: HashMap::new(),
            trigger_key: DEFAULT_TRIGGER_KEY.to_string(),
            detection_mode: DetectionMode::default(),
            sentinel: Some(DEFAULT_SENTINEL),
        }
    }
}

impl EngineConfig {
    /// Parses the store's change-notification payload,
    /// e.g. `{"shortcuts":{";sig":"..."},"triggerKey":"Tab"}`.
    pub fn from_json(payload: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(payload)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.trigger_key.is_empty() {
            return Err(QuickfillError::InvalidConfig(
                "trigger key must not be empty".to_string(),
            ));
        }
        if self.shortcuts.keys().any(|token| token.is_empty()) {
            return Err(QuickfillError::InvalidConfig(
                "shortcut tokens must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn expansion_for(&self, token: &str) -> Option<&str> {
        self.shortcuts.get(token).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_store_payload() {
        let config = EngineConfig::from_json(
            r#"{"shortcuts":{";sig":"Best regards,\nA"},"triggerKey":"Enter"}"#,
        )
        .unwrap();
        assert_eq!(config.trigger_key, "Enter");
        assert_eq!(config.expansion_for(";sig"), Some("Best regards,\nA"));
        assert_eq!(config.detection_mode, DetectionMode::TrailingRun);
        assert_eq!(config.sentinel, Some(';'));
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config = EngineConfig::from_json(r#"{"shortcuts":{}}"#).unwrap();
        assert_eq!(config.trigger_key, DEFAULT_TRIGGER_KEY);
    }

    #[test]
    fn rejects_empty_trigger_key() {
        let err = EngineConfig::from_json(r#"{"shortcuts":{},"triggerKey":""}"#).unwrap_err();
        assert!(matches!(err, QuickfillError::InvalidConfig(_)));
    }
}
