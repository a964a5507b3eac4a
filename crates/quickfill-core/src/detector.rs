use crate::adapter::adapter_for;
use crate::config::{DetectionMode, EngineConfig, OVERLAY_TIMEOUT};
use crate::overlay;
use crate::surface::Surface;
use quickfill_dom::{Document, NodeId};
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, trace};

/// Observable detector phase. `expanded` is transient and folds straight
/// back to idle once the executor finishes, so it never appears here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionPhase {
    Idle,
    Suggesting,
}

/// The single active suggestion. Invariant: while this exists, exactly one
/// overlay node exists in the document and belongs to this surface.
pub struct ActiveSuggestion {
    pub surface: Surface,
    pub token: String,
    pub overlay: NodeId,
    pub expires: Instant,
}

/// Watches bound surfaces for a completed shortcut token.
///
/// Pending debounced reads are tracked per surface: a burst of events on
/// one surface coalesces into one read, while events on other surfaces
/// never displace it.
pub struct TriggerDetector {
    pending: HashMap<NodeId, Instant>,
    active: Option<ActiveSuggestion>,
}

impl TriggerDetector {
    pub fn new() -> Self {
        TriggerDetector {
            pending: HashMap::new(),
            active: None,
        }
    }

    pub fn phase(&self) -> DetectionPhase {
        if self.active.is_some() {
            DetectionPhase::Suggesting
        } else {
            DetectionPhase::Idle
        }
    }

    pub fn active(&self) -> Option<&ActiveSuggestion> {
        self.active.as_ref()
    }

    /// The active suggestion, but only when it belongs to `node`.
    pub fn active_for(&self, node: NodeId) -> Option<&ActiveSuggestion> {
        self.active
            .as_ref()
            .filter(|active| active.surface.node == node)
    }

    /// Schedules the debounced detection read for a surface, superseding
    /// only a pending read for that same surface. The text is read at
    /// deadline expiry, never now, so the check always reflects the
    /// surface's true content after the burst of keystrokes settles.
    pub fn schedule(&mut self, node: NodeId, deadline: Instant) {
        self.pending.insert(node, deadline);
    }

    /// Takes every pending check whose deadline has passed, oldest first.
    pub fn due_pending(&mut self, now: Instant) -> Vec<NodeId> {
        let mut due: Vec<(NodeId, Instant)> = self
            .pending
            .iter()
            .filter(|(_, &deadline)| deadline <= now)
            .map(|(&node, &deadline)| (node, deadline))
            .collect();
        due.sort_by_key(|&(_, deadline)| deadline);
        for (node, _) in &due {
            self.pending.remove(node);
        }
        due.into_iter().map(|(node, _)| node).collect()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        let pending = self.pending.values().copied().min();
        let expiry = self.active.as_ref().map(|a| a.expires);
        match (pending, expiry) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Runs one detection pass against the surface's current text.
    pub fn run_check(
        &mut self,
        doc: &mut dyn Document,
        config: &EngineConfig,
        surface: Surface,
        now: Instant,
    ) {
        let text = adapter_for(surface.kind).read_text(doc, &surface);
        match match_token(&text, config) {
            Some(token) => {
                trace!(token = %token, "trailing token matched");
                self.suggest(doc, config, surface, token, now);
            }
            None => {
                if self.active_for(surface.node).is_some() {
                    self.dismiss(doc);
                }
            }
        }
    }

    /// Shows a suggestion for this surface, tearing down any previous one
    /// first regardless of which surface it belonged to.
    fn suggest(
        &mut self,
        doc: &mut dyn Document,
        config: &EngineConfig,
        surface: Surface,
        token: String,
        now: Instant,
    ) {
        self.dismiss(doc);
        let expansion = config.expansion_for(&token).unwrap_or_default();
        let overlay = overlay::show(doc, &surface, &token, expansion, &config.trigger_key);
        self.active = Some(ActiveSuggestion {
            surface,
            token,
            overlay,
            expires: now + OVERLAY_TIMEOUT,
        });
    }

    /// Removes the overlay and clears the suggestion in one step, for any
    /// dismissal reason. Idempotent.
    pub fn dismiss(&mut self, doc: &mut dyn Document) {
        if let Some(active) = self.active.take() {
            debug!(token = %active.token, "dismissing suggestion");
            overlay::remove(doc, active.overlay);
        }
    }

    /// Times out a stale suggestion and drops one whose surface left the
    /// document.
    pub fn expire(&mut self, doc: &mut dyn Document, now: Instant) {
        let gone = match &self.active {
            Some(active) => active.expires <= now || !doc.contains(active.surface.node),
            None => false,
        };
        if gone {
            self.dismiss(doc);
        }
    }
}

impl Default for TriggerDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Extracts and matches the trailing token per the configured mode.
/// Returns the matched table key.
pub fn match_token(text: &str, config: &EngineConfig) -> Option<String> {
    let run = trailing_run(text)?;
    if config.shortcuts.contains_key(run) {
        return Some(run.to_string());
    }
    if config.detection_mode == DetectionMode::TrailingRun {
        if let Some(sentinel) = config.sentinel {
            // The run may carry a word fused onto the token, e.g. "hi;sig";
            // the suffix from the last sentinel is still offered.
            if let Some(pos) = run.rfind(sentinel) {
                if pos > 0 {
                    let candidate = &run[pos..];
                    if config.shortcuts.contains_key(candidate) {
                        return Some(candidate.to_string());
                    }
                }
            }
        }
    }
    None
}

/// The contiguous run of non-whitespace characters ending at the end of the
/// text. Trailing whitespace means the token was already committed, so no
/// candidate.
fn trailing_run(text: &str) -> Option<&str> {
    let last = text.chars().next_back()?;
    if last.is_whitespace() {
        return None;
    }
    let start = text
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_whitespace())
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    Some(&text[start..])
}
