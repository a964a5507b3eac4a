use quickfill_core::config::{DETECT_DEBOUNCE, OVERLAY_CLASS, OVERLAY_TIMEOUT};
use quickfill_core::detector::DetectionPhase;
use quickfill_core::{Engine, EngineConfig, KeyAction};
use quickfill_dom::{Document, MemoryPage, NodeId, Rect, SelectorError, SyntheticEvent};
use std::collections::HashMap;
use std::time::{Duration, Instant};

fn config_with(tokens: &[(&str, &str)]) -> EngineConfig {
    EngineConfig {
        shortcuts: tokens
            .iter()
            .map(|(t, e)| (t.to_string(), e.to_string()))
            .collect::<HashMap<_, _>>(),
        ..EngineConfig::default()
    }
}

fn overlays(page: &MemoryPage) -> Vec<NodeId> {
    page.query_selector_all(&format!(".{}", OVERLAY_CLASS))
        .unwrap()
}

/// Sets the field's content, forwards the input event and runs time past
/// the detection debounce.
fn type_into(
    engine: &mut Engine,
    page: &mut MemoryPage,
    node: NodeId,
    text: &str,
    now: Instant,
) -> Instant {
    page.set_value(node, text);
    engine.on_input(node, now);
    let after = now + DETECT_DEBOUNCE;
    engine.tick(page, after);
    after
}

#[test]
fn scenario_a_trigger_key_expands_in_place() {
    let mut page = MemoryPage::new();
    let body = page.body();
    let field = page.append_element(body, "input", &[("type", "text")]);

    let mut engine = Engine::new(config_with(&[(";sig", "Best regards,\nA")]));
    let now = Instant::now();
    engine.bootstrap(&mut page, now);

    let now = type_into(&mut engine, &mut page, field, "Hello ;sig", now);
    assert_eq!(engine.phase(), DetectionPhase::Suggesting);
    assert_eq!(overlays(&page).len(), 1);

    let action = engine.on_keydown(&mut page, field, "Tab", now);
    assert_eq!(action, KeyAction::Consumed);
    assert_eq!(
        page.value(field).as_deref(),
        Some("Hello Best regards,\nA")
    );
    assert_eq!(engine.phase(), DetectionPhase::Idle);
    assert!(overlays(&page).is_empty());

    // The host's reactive layer was notified of the edit.
    let events = page.drain_events();
    assert!(events.contains(&(field, SyntheticEvent::Input)));
    assert!(events.contains(&(field, SyntheticEvent::Change)));
}

#[test]
fn scenario_b_non_trailing_token_is_ignored() {
    let mut page = MemoryPage::new();
    let body = page.body();
    let field = page.append_element(body, "textarea", &[]);

    let mut engine = Engine::new(config_with(&[(";sig", "Best")]));
    let now = Instant::now();
    engine.bootstrap(&mut page, now);

    let now = type_into(&mut engine, &mut page, field, ";sig more text", now);
    assert_eq!(engine.phase(), DetectionPhase::Idle);
    assert!(overlays(&page).is_empty());
    assert_eq!(engine.on_keydown(&mut page, field, "Tab", now), KeyAction::Pass);
}

#[test]
fn scenario_c_config_push_clears_stale_suggestion() {
    let mut page = MemoryPage::new();
    let body = page.body();
    let field = page.append_element(body, "input", &[("type", "text")]);

    let mut engine = Engine::new(config_with(&[(";sig", "Best")]));
    let now = Instant::now();
    engine.bootstrap(&mut page, now);

    let now = type_into(&mut engine, &mut page, field, ";sig", now);
    assert_eq!(engine.phase(), DetectionPhase::Suggesting);

    // Store pushes a table without the token while the suggestion is up.
    engine.update_config(config_with(&[(";other", "x")]));

    // The trigger key re-checks the table, so the stale suggestion cannot
    // expand even before the next detection pass.
    let action = engine.on_keydown(&mut page, field, "Tab", now);
    assert_eq!(action, KeyAction::Consumed);
    assert_eq!(page.value(field).as_deref(), Some(";sig"));
    assert!(overlays(&page).is_empty());

    // And a fresh detection pass leaves nothing behind.
    let now = type_into(&mut engine, &mut page, field, ";sig", now);
    let _ = now;
    assert_eq!(engine.phase(), DetectionPhase::Idle);
    assert!(overlays(&page).is_empty());
}

/// Delegating wrapper whose value writes never land, standing in for a
/// host that rejects programmatic edits.
struct ReadOnlyValues<'a> {
    inner: &'a mut MemoryPage,
}

impl Document for ReadOnlyValues<'_> {
    fn body(&self) -> NodeId {
        self.inner.body()
    }
    fn contains(&self, node: NodeId) -> bool {
        self.inner.contains(node)
    }
    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.inner.parent(node)
    }
    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.inner.children(node)
    }
    fn tag_name(&self, node: NodeId) -> Option<String> {
        self.inner.tag_name(node)
    }
    fn is_text(&self, node: NodeId) -> bool {
        self.inner.is_text(node)
    }
    fn node_text(&self, node: NodeId) -> Option<String> {
        self.inner.node_text(node)
    }
    fn set_node_text(&mut self, node: NodeId, text: &str) -> bool {
        self.inner.set_node_text(node, text)
    }
    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.inner.attribute(node, name)
    }
    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> bool {
        self.inner.set_attribute(node, name, value)
    }
    fn remove_attribute(&mut self, node: NodeId, name: &str) -> bool {
        self.inner.remove_attribute(node, name)
    }
    fn create_element(&mut self, tag: &str) -> NodeId {
        self.inner.create_element(tag)
    }
    fn create_text(&mut self, text: &str) -> NodeId {
        self.inner.create_text(text)
    }
    fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        self.inner.append_child(parent, child)
    }
    fn clear_children(&mut self, node: NodeId) -> bool {
        self.inner.clear_children(node)
    }
    fn remove_node(&mut self, node: NodeId) -> bool {
        self.inner.remove_node(node)
    }
    fn value(&self, node: NodeId) -> Option<String> {
        self.inner.value(node)
    }
    fn set_value(&mut self, _node: NodeId, _value: &str) -> bool {
        false
    }
    fn focused(&self) -> Option<NodeId> {
        self.inner.focused()
    }
    fn caret(&self) -> Option<(NodeId, usize)> {
        self.inner.caret()
    }
    fn set_caret(&mut self, node: NodeId, offset: usize) -> bool {
        self.inner.set_caret(node, offset)
    }
    fn bounding_rect(&self, node: NodeId) -> Option<Rect> {
        self.inner.bounding_rect(node)
    }
    fn caret_rect(&self) -> Option<Rect> {
        self.inner.caret_rect()
    }
    fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>, SelectorError> {
        self.inner.query_selector_all(selector)
    }
    fn dispatch(&mut self, node: NodeId, event: SyntheticEvent) {
        self.inner.dispatch(node, event)
    }
}

#[test]
fn scenario_d_write_failure_leaves_text_unchanged() {
    let mut page = MemoryPage::new();
    let body = page.body();
    let field = page.append_element(body, "input", &[("type", "text")]);

    let mut engine = Engine::new(config_with(&[(";sig", "Best")]));
    let now = Instant::now();
    engine.bootstrap(&mut page, now);
    let now = type_into(&mut engine, &mut page, field, "Hello ;sig", now);
    assert_eq!(engine.phase(), DetectionPhase::Suggesting);

    let mut failing = ReadOnlyValues { inner: &mut page };
    let action = engine.on_keydown(&mut failing, field, "Tab", now);
    assert_eq!(action, KeyAction::Consumed);

    assert_eq!(page.value(field).as_deref(), Some("Hello ;sig"));
    assert_eq!(engine.phase(), DetectionPhase::Idle);
    assert!(overlays(&page).is_empty());
    // Failed expansions get no success highlight.
    assert!(page.attribute(field, "style").is_none());
}

#[test]
fn every_surface_kind_reaches_suggesting() {
    let mut page = MemoryPage::new();
    let body = page.body();
    let input = page.append_element(body, "input", &[("type", "text")]);
    let area = page.append_element(body, "textarea", &[]);
    let editable = page.append_element(body, "div", &[("contenteditable", "true")]);
    let composer = page.append_element(body, "div", &[("data-lexical-editor", "true")]);

    let mut engine = Engine::new(config_with(&[(";sig", "Best")]));
    let mut now = Instant::now();
    assert_eq!(engine.bootstrap(&mut page, now), 4);

    for node in [input, area] {
        now = type_into(&mut engine, &mut page, node, "hi ;sig", now);
        assert_eq!(engine.phase(), DetectionPhase::Suggesting);
        assert_eq!(overlays(&page).len(), 1);
        engine.on_keydown(&mut page, node, "Escape", now);
    }

    for node in [editable, composer] {
        page.clear_children(node);
        page.append_text(node, "hi ;sig");
        engine.on_surface_mutation(node, now);
        now += DETECT_DEBOUNCE;
        engine.tick(&mut page, now);
        assert_eq!(engine.phase(), DetectionPhase::Suggesting);
        assert_eq!(overlays(&page).len(), 1);
        engine.on_keydown(&mut page, node, "Escape", now);
    }
    assert!(overlays(&page).is_empty());
}

#[test]
fn at_most_one_overlay_across_surfaces() {
    let mut page = MemoryPage::new();
    let body = page.body();
    let first = page.append_element(body, "input", &[("type", "text")]);
    let second = page.append_element(body, "textarea", &[]);

    let mut engine = Engine::new(config_with(&[(";a", "one"), (";b", "two")]));
    let now = Instant::now();
    engine.bootstrap(&mut page, now);

    let now = type_into(&mut engine, &mut page, first, ";a", now);
    assert_eq!(overlays(&page).len(), 1);

    // A match on another surface tears the first overlay down before
    // showing its own.
    let _ = type_into(&mut engine, &mut page, second, ";b", now);
    assert_eq!(overlays(&page).len(), 1);
}

#[test]
fn debounced_check_reads_text_at_expiry() {
    let mut page = MemoryPage::new();
    let body = page.body();
    let field = page.append_element(body, "input", &[("type", "text")]);

    let mut engine = Engine::new(config_with(&[(";sig", "Best")]));
    let now = Instant::now();
    engine.bootstrap(&mut page, now);

    // A partial token is typed, then completed before the first debounce
    // fires; the single coalesced check must see the final text.
    page.set_value(field, ";si");
    engine.on_input(field, now);
    page.set_value(field, ";sig");
    engine.on_input(field, now + Duration::from_millis(10));

    engine.tick(&mut page, now + Duration::from_millis(10) + DETECT_DEBOUNCE);
    assert_eq!(engine.phase(), DetectionPhase::Suggesting);
}

#[test]
fn pending_checks_are_tracked_per_surface() {
    let mut page = MemoryPage::new();
    let body = page.body();
    let field = page.append_element(body, "input", &[("type", "text")]);
    let composer = page.append_element(body, "div", &[("data-lexical-editor", "true")]);

    let mut engine = Engine::new(config_with(&[(";sig", "Best")]));
    let now = Instant::now();
    engine.bootstrap(&mut page, now);

    // The user finishes the token in one field while another surface's
    // mutation watch fires; the second event must not displace the first
    // field's pending read.
    page.set_value(field, "Hello ;sig");
    engine.on_input(field, now);
    engine.on_surface_mutation(composer, now + Duration::from_millis(10));

    engine.tick(
        &mut page,
        now + Duration::from_millis(10) + DETECT_DEBOUNCE,
    );
    assert_eq!(engine.phase(), DetectionPhase::Suggesting);
    assert_eq!(overlays(&page).len(), 1);

    let action = engine.on_keydown(&mut page, field, "Tab", now + Duration::from_millis(200));
    assert_eq!(action, KeyAction::Consumed);
    assert_eq!(page.value(field).as_deref(), Some("Hello Best"));
}

#[test]
fn overlay_times_out_and_surface_removal_dismisses() {
    let mut page = MemoryPage::new();
    let body = page.body();
    let field = page.append_element(body, "input", &[("type", "text")]);

    let mut engine = Engine::new(config_with(&[(";sig", "Best")]));
    let now = Instant::now();
    engine.bootstrap(&mut page, now);

    let now = type_into(&mut engine, &mut page, field, ";sig", now);
    assert_eq!(overlays(&page).len(), 1);
    assert!(engine.next_wake().unwrap() <= now + OVERLAY_TIMEOUT);

    engine.tick(&mut page, now + OVERLAY_TIMEOUT);
    assert_eq!(engine.phase(), DetectionPhase::Idle);
    assert!(overlays(&page).is_empty());

    // Again, but the surface leaves the document instead.
    let now = type_into(&mut engine, &mut page, field, ";sig", now);
    assert_eq!(overlays(&page).len(), 1);
    page.remove_node(field);
    engine.tick(&mut page, now + Duration::from_millis(1));
    assert_eq!(engine.phase(), DetectionPhase::Idle);
    assert!(overlays(&page).is_empty());
}

#[test]
fn focus_loss_dismisses_only_the_owning_surface() {
    let mut page = MemoryPage::new();
    let body = page.body();
    let field = page.append_element(body, "input", &[("type", "text")]);
    let other = page.append_element(body, "textarea", &[]);

    let mut engine = Engine::new(config_with(&[(";sig", "Best")]));
    let now = Instant::now();
    engine.bootstrap(&mut page, now);
    let _ = type_into(&mut engine, &mut page, field, ";sig", now);
    assert_eq!(engine.phase(), DetectionPhase::Suggesting);

    engine.on_focus_lost(&mut page, other);
    assert_eq!(engine.phase(), DetectionPhase::Suggesting);

    engine.on_focus_lost(&mut page, field);
    assert_eq!(engine.phase(), DetectionPhase::Idle);
    assert!(overlays(&page).is_empty());
}

#[test]
fn body_mutation_binds_new_surfaces_immediately() {
    let mut page = MemoryPage::new();
    let body = page.body();
    page.append_element(body, "input", &[("type", "text")]);

    let mut engine = Engine::new(config_with(&[(";sig", "Best")]));
    let now = Instant::now();
    engine.bootstrap(&mut page, now);
    assert_eq!(engine.bound_count(), 1);

    // A single-page app swaps in a new widget; the mutation-triggered
    // sweep binds it without waiting for the periodic one. The scoped
    // re-scan only binds inside the reported subtree.
    let widget = page.append_element(body, "div", &[]);
    let late = page.append_element(widget, "div", &[("contenteditable", "true")]);
    let elsewhere = page.append_element(body, "textarea", &[]);
    assert_eq!(engine.on_body_mutation(&mut page, Some(widget), now), 1);
    assert_eq!(engine.bound_count(), 2);

    // A rootless notification falls back to the full sweep and picks up
    // the rest.
    assert_eq!(engine.on_body_mutation(&mut page, None, now), 1);
    let _ = elsewhere;

    let _ = type_into(&mut engine, &mut page, late, "", now);
    page.append_text(late, ";sig");
    engine.on_surface_mutation(late, now);
    engine.tick(&mut page, now + DETECT_DEBOUNCE);
    assert_eq!(engine.phase(), DetectionPhase::Suggesting);
}

#[test]
fn config_json_push_is_wholesale() {
    let mut engine = Engine::new(config_with(&[(";old", "gone")]));
    engine
        .update_config_json(r#"{"shortcuts":{";sig":"Best"},"triggerKey":"Enter"}"#)
        .unwrap();

    assert_eq!(engine.config().trigger_key, "Enter");
    assert_eq!(engine.config().expansion_for(";sig"), Some("Best"));
    // Wholesale replacement: the old table is gone, not merged over.
    assert_eq!(engine.config().expansion_for(";old"), None);

    assert!(engine.update_config_json("not json").is_err());
    // A bad payload leaves the previous config in place.
    assert_eq!(engine.config().trigger_key, "Enter");
}
