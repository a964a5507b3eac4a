use crate::adapter::adapter_for;
use crate::config::EngineConfig;
use crate::surface::Surface;
use quickfill_dom::{Document, NodeId};
use tracing::{debug, warn};

const HIGHLIGHT_STYLE: &str =
    "background-color:rgba(76,175,80,0.2);transition:background-color 0.2s;";

/// Replaces the matched token occurrence with its stored expansion.
///
/// Only the rightmost occurrence is ever the target: that is the one the
/// user just finished typing, even when an earlier occurrence also matches.
/// Every failure mode (token no longer in the table, stale match, adapter
/// refusing the write) reports `false` and leaves the surface untouched.
pub fn expand(
    doc: &mut dyn Document,
    config: &EngineConfig,
    surface: &Surface,
    token: &str,
) -> bool {
    let expansion = match config.expansion_for(token) {
        Some(expansion) => expansion,
        None => {
            debug!(token = %token, "token no longer in shortcut table, nothing to do");
            return false;
        }
    };

    let adapter = adapter_for(surface.kind);
    let text = adapter.read_text(doc, surface);
    // Re-locate at expansion time; the surface may have changed since the
    // suggestion was shown.
    let start = match text.rfind(token) {
        Some(start) => start,
        None => {
            debug!(token = %token, "stale match, token gone from surface");
            return false;
        }
    };

    let replaced = adapter.replace_range(doc, surface, start, token.len(), expansion) || {
        let mut whole =
            String::with_capacity(text.len() - token.len() + expansion.len());
        whole.push_str(&text[..start]);
        whole.push_str(expansion);
        whole.push_str(&text[start + token.len()..]);
        adapter.write_text(doc, surface, &whole)
    };

    if replaced {
        debug!(token = %token, "expanded");
    } else {
        warn!(token = %token, "expansion write failed, surface left as-is");
    }
    replaced
}

/// Applies the transient success highlight, returning the style it
/// displaced so the revert can restore it.
pub fn apply_highlight(doc: &mut dyn Document, node: NodeId) -> Option<String> {
    let previous = doc.attribute(node, "style");
    doc.set_attribute(node, "style", HIGHLIGHT_STYLE);
    previous
}

pub fn revert_highlight(doc: &mut dyn Document, node: NodeId, previous: Option<String>) {
    match previous {
        Some(style) => {
            doc.set_attribute(node, "style", &style);
        }
        None => {
            doc.remove_attribute(node, "style");
        }
    }
}
