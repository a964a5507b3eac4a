use crate::surface::{classify, Surface};
use quickfill_dom::{Document, NodeId};
use std::collections::HashSet;
use tracing::{debug, trace};

/// Native text-entry controls.
const NATIVE_RULES: &[&str] = &[
    "input[type=\"text\"]",
    "input[type=\"search\"]",
    "input[type=\"email\"]",
    "input[type=\"url\"]",
    "input[type=\"tel\"]",
    "input[type=\"number\"]",
    "input:not([type])",
    "textarea",
];

/// Explicitly editable regions.
const EDITABLE_RULES: &[&str] = &[
    "[contenteditable=\"true\"]",
    "[contenteditable=\"\"]",
    "[contenteditable]",
];

/// Accessibility roles that indicate text entry.
const ROLE_RULES: &[&str] = &[
    "[role=\"textbox\"]",
    "[role=\"combobox\"]",
    "[role=\"searchbox\"]",
    "div[aria-multiline=\"true\"]",
];

/// Vendor markers used by common rich-text frameworks. Some of these only
/// parse in certain hosts; each one is evaluated in isolation so a rule a
/// host rejects never costs us the rest.
const FRAMEWORK_RULES: &[&str] = &[
    ".public-DraftEditor-content",
    "[data-lexical-editor]",
    "[data-slate-editor]",
    "[g_editable=\"true\"]",
    "div[contenteditable=\"true\"][data-tab=\"10\"]",
    ".copyable-text.selectable-text",
    "[data-testid*=\"compose\"]",
    "div[aria-label*=\"Type a message\"]",
    "div[placeholder*=\"Type a message\" i]",
];

/// Finds every qualifying editable surface in the document.
///
/// The qualification groups are a union, not a priority chain: a node only
/// needs to match one rule, and matching several is harmless because the
/// result is deduplicated by node identity. Nodes that match a rule but
/// fail classification (password inputs, `contenteditable="false"`) are
/// dropped here, once, rather than re-checked downstream.
pub fn discover(doc: &dyn Document) -> Vec<Surface> {
    let mut seen: HashSet<NodeId> = HashSet::new();
    let mut surfaces = Vec::new();

    for rule in rule_set() {
        let nodes = match doc.query_selector_all(rule) {
            Ok(nodes) => nodes,
            Err(err) => {
                // One unsupported rule must never abort the others.
                debug!(rule, error = %err, "skipping discovery rule");
                continue;
            }
        };
        for node in nodes {
            if !seen.insert(node) {
                continue;
            }
            match classify(doc, node) {
                Some(kind) => surfaces.push(Surface::new(node, kind)),
                None => trace!(rule, "matched node did not classify as a surface"),
            }
        }
    }

    surfaces
}

/// Incremental variant scoped to one subtree, for re-scans after a host
/// mutation that only touched part of the page.
pub fn discover_under(doc: &dyn Document, root: NodeId) -> Vec<Surface> {
    discover(doc)
        .into_iter()
        .filter(|surface| in_subtree(doc, surface.node, root))
        .collect()
}

fn in_subtree(doc: &dyn Document, node: NodeId, root: NodeId) -> bool {
    let mut current = Some(node);
    while let Some(n) = current {
        if n == root {
            return true;
        }
        current = doc.parent(n);
    }
    false
}

fn rule_set() -> impl Iterator<Item = &'static str> {
    NATIVE_RULES
        .iter()
        .chain(EDITABLE_RULES)
        .chain(ROLE_RULES)
        .chain(FRAMEWORK_RULES)
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::SurfaceKind;
    use quickfill_dom::MemoryPage;

    #[test]
    fn finds_each_kind_once() {
        let mut page = MemoryPage::new();
        let body = page.body();
        let input = page.append_element(body, "input", &[("type", "text")]);
        let area = page.append_element(body, "textarea", &[]);
        // Matches both the contenteditable and the role rules.
        let editable = page.append_element(
            body,
            "div",
            &[("contenteditable", "true"), ("role", "textbox")],
        );
        let composer = page.append_element(body, "div", &[("data-lexical-editor", "true")]);
        page.append_element(body, "input", &[("type", "checkbox")]);

        let surfaces = discover(&page);
        assert_eq!(surfaces.len(), 4);

        let kind_of = |node| {
            surfaces
                .iter()
                .find(|s| s.node == node)
                .map(|s| s.kind)
                .unwrap()
        };
        assert_eq!(kind_of(input), SurfaceKind::PlainInput);
        assert_eq!(kind_of(area), SurfaceKind::PlainTextarea);
        assert_eq!(kind_of(editable), SurfaceKind::ContentEditable);
        assert_eq!(kind_of(composer), SurfaceKind::FrameworkManaged);
    }

    #[test]
    fn unsupported_rule_does_not_abort_the_rest() {
        // The rule set deliberately carries a selector with a
        // case-insensitivity flag MemoryPage rejects; discovery must still
        // return everything the remaining rules find.
        let mut page = MemoryPage::new();
        let body = page.body();
        page.append_element(body, "textarea", &[]);

        let surfaces = discover(&page);
        assert_eq!(surfaces.len(), 1);
    }

    #[test]
    fn subtree_scan_only_sees_that_subtree() {
        let mut page = MemoryPage::new();
        let body = page.body();
        page.append_element(body, "textarea", &[]);
        let widget = page.append_element(body, "div", &[]);
        let inner = page.append_element(widget, "input", &[("type", "text")]);

        let scoped = discover_under(&page, widget);
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].node, inner);
    }

    #[test]
    fn rerunning_discovery_yields_the_same_set() {
        let mut page = MemoryPage::new();
        let body = page.body();
        page.append_element(body, "input", &[("type", "text")]);
        page.append_element(body, "div", &[("contenteditable", "")]);

        let first = discover(&page);
        let second = discover(&page);
        assert_eq!(first, second);
    }
}
