use crate::attach::AttachmentManager;
use crate::config::{EngineConfig, DELETE_DEBOUNCE, DETECT_DEBOUNCE, HIGHLIGHT_REVERT, SETTLE_DELAY};
use crate::detector::{DetectionPhase, TriggerDetector};
use crate::error::Result;
use crate::expand;
use quickfill_dom::{Document, NodeId};
use std::time::Instant;
use tracing::debug;

/// What the host should do with a keydown it just forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// The engine acted on the key; the host must suppress its default
    /// handling so the trigger key never also inserts a tab stop.
    Consumed,
    /// Not ours; let the page see it.
    Pass,
}

struct HighlightRevert {
    node: NodeId,
    previous: Option<String>,
    deadline: Instant,
}

struct SettleCheck {
    node: NodeId,
    deadline: Instant,
}

/// The process-scoped engine context.
///
/// Owns the cached configuration, the attachment registry, the detection
/// state and every timer deadline. Entirely event-driven and
/// single-threaded: the host forwards surface events and drives time via
/// [`tick`]; all waits are stored deadlines, never blocking. Ordering is
/// guaranteed by the host loop's serialization of callbacks, so nothing
/// here locks.
///
/// [`tick`]: Engine::tick
pub struct Engine {
    config: EngineConfig,
    attach: AttachmentManager,
    detector: TriggerDetector,
    highlight: Option<HighlightRevert>,
    settle: Option<SettleCheck>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Engine {
            config,
            attach: AttachmentManager::new(),
            detector: TriggerDetector::new(),
            highlight: None,
            settle: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn phase(&self) -> DetectionPhase {
        self.detector.phase()
    }

    pub fn bound_count(&self) -> usize {
        self.attach.bound_count()
    }

    /// Replaces the cached configuration wholesale. An active suggestion
    /// whose token the new table no longer carries is cleared on the next
    /// detection pass, and the executor re-checks the table anyway, so a
    /// stale suggestion can never expand.
    pub fn update_config(&mut self, config: EngineConfig) {
        debug!(
            shortcuts = config.shortcuts.len(),
            trigger_key = %config.trigger_key,
            "configuration replaced"
        );
        self.config = config;
    }

    /// Accepts the external store's change-notification payload.
    pub fn update_config_json(&mut self, payload: &str) -> Result<()> {
        let config = EngineConfig::from_json(payload)?;
        self.update_config(config);
        Ok(())
    }

    /// Initial discovery pass; equivalent to the first periodic sweep.
    pub fn bootstrap(&mut self, doc: &mut dyn Document, now: Instant) -> usize {
        self.attach.sweep(doc, now)
    }

    /// An input-affecting event fired on `node`. Schedules the debounced
    /// detection read; unbound nodes are ignored.
    pub fn on_input(&mut self, node: NodeId, now: Instant) {
        if self.attach.is_bound(node) {
            self.detector.schedule(node, now + DETECT_DEBOUNCE);
        }
    }

    /// A character-data mutation observed inside a bound surface's subtree.
    /// Only re-triggers detection; it never re-discovers surfaces.
    pub fn on_surface_mutation(&mut self, node: NodeId, now: Instant) {
        self.on_input(node, now);
    }

    /// A subtree mutation observed on the document body: run the immediate
    /// re-discovery sweep. When the host names the mutated subtree's root,
    /// only that subtree is re-scanned; `None` means the full sweep.
    pub fn on_body_mutation(
        &mut self,
        doc: &mut dyn Document,
        root: Option<NodeId>,
        now: Instant,
    ) -> usize {
        match root {
            Some(root) => self.attach.bind_under(doc, root),
            None => self.attach.sweep(doc, now),
        }
    }

    /// The surface lost focus or otherwise stopped being current.
    pub fn on_focus_lost(&mut self, doc: &mut dyn Document, node: NodeId) {
        if self.detector.active_for(node).is_some() {
            self.detector.dismiss(doc);
        }
    }

    /// A keydown on a bound surface. Returns whether the engine consumed it.
    pub fn on_keydown(
        &mut self,
        doc: &mut dyn Document,
        node: NodeId,
        key: &str,
        now: Instant,
    ) -> KeyAction {
        if !self.attach.is_bound(node) {
            return KeyAction::Pass;
        }

        if key == self.config.trigger_key {
            let target = match self.detector.active_for(node) {
                Some(active) => (active.surface, active.token.clone()),
                None => return KeyAction::Pass,
            };
            // Overlay comes down before the mutation so a failed write can
            // never leave a stale suggestion behind.
            self.detector.dismiss(doc);
            let (surface, token) = target;
            if expand::expand(doc, &self.config, &surface, &token) {
                let previous = expand::apply_highlight(doc, surface.node);
                self.highlight = Some(HighlightRevert {
                    node: surface.node,
                    previous,
                    deadline: now + HIGHLIGHT_REVERT,
                });
                self.settle = Some(SettleCheck {
                    node: surface.node,
                    deadline: now + SETTLE_DELAY,
                });
            }
            return KeyAction::Consumed;
        }

        if key == "Escape" {
            if self.detector.active_for(node).is_some() {
                self.detector.dismiss(doc);
                return KeyAction::Consumed;
            }
            return KeyAction::Pass;
        }

        if key == "Backspace" || key == "Delete" {
            self.detector.schedule(node, now + DELETE_DEBOUNCE);
        }
        KeyAction::Pass
    }

    /// Fires every deadline that has passed. The host calls this from its
    /// scheduled continuations; [`next_wake`] says when the next one is due.
    ///
    /// [`next_wake`]: Engine::next_wake
    pub fn tick(&mut self, doc: &mut dyn Document, now: Instant) {
        if self.attach.sweep_due(now) {
            self.attach.sweep(doc, now);
        }

        for node in self.detector.due_pending(now) {
            match self.attach.surface(node) {
                Some(surface) if doc.contains(node) => {
                    self.detector.run_check(doc, &self.config, surface, now);
                }
                _ => {
                    // Stale surface: the node left the document between the
                    // event and the deadline. Drop any suggestion it owned.
                    if self.detector.active_for(node).is_some() {
                        self.detector.dismiss(doc);
                    }
                }
            }
        }

        self.detector.expire(doc, now);

        if self
            .highlight
            .as_ref()
            .map(|h| h.deadline <= now)
            .unwrap_or(false)
        {
            if let Some(highlight) = self.highlight.take() {
                expand::revert_highlight(doc, highlight.node, highlight.previous);
            }
        }

        if self
            .settle
            .as_ref()
            .map(|s| s.deadline <= now)
            .unwrap_or(false)
        {
            if let Some(settle) = self.settle.take() {
                // Rich editors may normalize asynchronously after a write;
                // re-read once things settle so detection state reflects
                // what actually stuck.
                if let Some(surface) = self.attach.surface(settle.node) {
                    if doc.contains(settle.node) {
                        self.detector.run_check(doc, &self.config, surface, now);
                    }
                }
            }
        }
    }

    /// Earliest pending deadline across all timers, for host scheduling.
    pub fn next_wake(&self) -> Option<Instant> {
        let deadlines = [
            self.detector.next_deadline(),
            self.highlight.as_ref().map(|h| h.deadline),
            self.settle.as_ref().map(|s| s.deadline),
            self.attach.next_sweep(),
        ];
        deadlines.into_iter().flatten().min()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
