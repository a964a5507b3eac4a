use crate::config::{OVERLAY_CLASS, PREVIEW_LIMIT};
use crate::surface::Surface;
use quickfill_dom::{Document, NodeId};

const BASE_STYLE: &str = "position:absolute;pointer-events:none;z-index:2147483647;";
const CORNER_STYLE: &str = "position:fixed;bottom:20px;right:20px;pointer-events:none;z-index:2147483647;";

/// Builds and inserts the floating suggestion element.
///
/// The overlay is pure presentation: pointer-inert, hidden from assistive
/// tech, never focusable. It owns no state; the detector that created it is
/// responsible for removing it.
pub fn show(
    doc: &mut dyn Document,
    surface: &Surface,
    token: &str,
    expansion: &str,
    trigger_key: &str,
) -> NodeId {
    let node = doc.create_element("div");
    doc.set_attribute(node, "class", OVERLAY_CLASS);
    doc.set_attribute(node, "aria-hidden", "true");
    doc.set_attribute(node, "style", &position_style(doc, surface));

    let label = format!("{} \u{2192} {} [{}]", token, preview(expansion), trigger_key);
    let content = doc.create_text(&label);
    doc.append_child(node, content);

    let body = doc.body();
    doc.append_child(body, node);
    node
}

pub fn remove(doc: &mut dyn Document, node: NodeId) {
    doc.remove_node(node);
}

/// Caret rect if obtainable, else under the surface, else the screen corner.
fn position_style(doc: &dyn Document, surface: &Surface) -> String {
    let anchor = doc
        .caret_rect()
        .or_else(|| doc.bounding_rect(surface.node));
    match anchor {
        Some(rect) => format!(
            "{}top:{}px;left:{}px;",
            BASE_STYLE,
            rect.bottom() + 5.0,
            rect.x
        ),
        None => CORNER_STYLE.to_string(),
    }
}

/// One-line preview of the expansion: newlines rendered as return marks,
/// truncated to a fixed width.
fn preview(expansion: &str) -> String {
    let flat = expansion.replace('\n', " \u{21b5} ");
    let mut out: String = flat.chars().take(PREVIEW_LIMIT).collect();
    if flat.chars().count() > PREVIEW_LIMIT {
        out.push('\u{2026}');
    }
    out
}
