use crate::surface::{Surface, SurfaceKind};
use quickfill_dom::{Document, NodeId, SyntheticEvent};
use tracing::warn;

/// Capability interface over one surface kind.
///
/// All offsets are byte offsets into the logical text returned by
/// [`read_text`]. Mutating operations report `false` on any failure and
/// never panic; read failures surface as empty text so the detector simply
/// finds no token.
///
/// [`read_text`]: SurfaceAdapter::read_text
pub trait SurfaceAdapter {
    /// The surface's current logical text content.
    fn read_text(&self, doc: &dyn Document, surface: &Surface) -> String;

    /// Replaces the entire content, synthesizes the input notifications the
    /// host expects, and leaves the caret at the end of the new content.
    fn write_text(&self, doc: &mut dyn Document, surface: &Surface, text: &str) -> bool;

    /// Replaces only `[start, start+len)` of the logical text, leaving the
    /// caret at the end of the inserted replacement. Returns `false` when
    /// the kind cannot map the offset into its node structure; callers fall
    /// back to [`write_text`].
    ///
    /// [`write_text`]: SurfaceAdapter::write_text
    fn replace_range(
        &self,
        doc: &mut dyn Document,
        surface: &Surface,
        start: usize,
        len: usize,
        replacement: &str,
    ) -> bool;
}

/// Selects the adapter for a kind, decided once at discovery time.
pub fn adapter_for(kind: SurfaceKind) -> &'static dyn SurfaceAdapter {
    match kind {
        SurfaceKind::PlainInput | SurfaceKind::PlainTextarea => &NativeValueAdapter,
        SurfaceKind::ContentEditable => &ContentEditableAdapter,
        SurfaceKind::FrameworkManaged => &FrameworkAdapter,
    }
}

fn notify(doc: &mut dyn Document, node: NodeId) {
    doc.dispatch(node, SyntheticEvent::Input);
    doc.dispatch(node, SyntheticEvent::Change);
}

/// `<input>` / `<textarea>`: the value property is the text.
struct NativeValueAdapter;

impl SurfaceAdapter for NativeValueAdapter {
    fn read_text(&self, doc: &dyn Document, surface: &Surface) -> String {
        doc.value(surface.node).unwrap_or_default()
    }

    fn write_text(&self, doc: &mut dyn Document, surface: &Surface, text: &str) -> bool {
        if !doc.set_value(surface.node, text) {
            return false;
        }
        if doc.value(surface.node).as_deref() != Some(text) {
            warn!("native value write was not observed on re-read");
            return false;
        }
        doc.set_caret(surface.node, text.len());
        notify(doc, surface.node);
        true
    }

    fn replace_range(
        &self,
        doc: &mut dyn Document,
        surface: &Surface,
        start: usize,
        len: usize,
        replacement: &str,
    ) -> bool {
        let current = self.read_text(doc, surface);
        let spliced = match splice(&current, start, len, replacement) {
            Some(spliced) => spliced,
            None => return false,
        };
        if !doc.set_value(surface.node, &spliced) {
            return false;
        }
        if doc.value(surface.node).as_deref() != Some(spliced.as_str()) {
            return false;
        }
        doc.set_caret(surface.node, start + replacement.len());
        notify(doc, surface.node);
        true
    }
}

/// Plain `contenteditable` regions: logical text is the flattened text
/// nodes, with `<br>` contributing a newline and `<img>` contributing
/// nothing.
struct ContentEditableAdapter;

impl SurfaceAdapter for ContentEditableAdapter {
    fn read_text(&self, doc: &dyn Document, surface: &Surface) -> String {
        let mut out = String::new();
        flatten(doc, surface.node, &mut out);
        out
    }

    fn write_text(&self, doc: &mut dyn Document, surface: &Surface, text: &str) -> bool {
        if !doc.clear_children(surface.node) {
            return false;
        }
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                let br = doc.create_element("br");
                doc.append_child(surface.node, br);
            }
            if !line.is_empty() {
                let content = doc.create_text(line);
                doc.append_child(surface.node, content);
            }
        }
        if self.read_text(doc, surface) != text {
            warn!("contenteditable write was not observed on re-read");
            return false;
        }
        doc.set_caret(surface.node, text.len());
        notify(doc, surface.node);
        true
    }

    fn replace_range(
        &self,
        doc: &mut dyn Document,
        surface: &Surface,
        start: usize,
        len: usize,
        replacement: &str,
    ) -> bool {
        // Only attempt the precise edit when the range falls wholly inside
        // one text node; a range spanning nodes means ambiguous structure,
        // and the whole-content fallback handles that.
        let target = match locate_text_node(doc, surface.node, start, len) {
            Some(target) => target,
            None => return false,
        };
        let local = match doc.node_text(target.node) {
            Some(local) => local,
            None => return false,
        };
        let spliced = match splice(&local, target.local_start, len, replacement) {
            Some(spliced) => spliced,
            None => return false,
        };
        if !doc.set_node_text(target.node, &spliced) {
            return false;
        }
        doc.set_caret(target.node, target.local_start + replacement.len());
        notify(doc, surface.node);
        true
    }
}

/// Rich editors with their own virtual model. Reads are a best-effort
/// flattening of visible text (subtrees holding images are excluded);
/// writes rebuild the span-per-line structure these editors tolerate.
/// There is no stable offset mapping, so range replacement is unsupported.
struct FrameworkAdapter;

impl SurfaceAdapter for FrameworkAdapter {
    fn read_text(&self, doc: &dyn Document, surface: &Surface) -> String {
        let mut out = String::new();
        for child in doc.children(surface.node) {
            if doc.is_text(child) {
                out.push_str(&doc.node_text(child).unwrap_or_default());
            } else if doc.tag_name(child).as_deref() == Some("br") {
                out.push('\n');
            } else if !subtree_has_image(doc, child) {
                flatten(doc, child, &mut out);
            }
        }
        out
    }

    fn write_text(&self, doc: &mut dyn Document, surface: &Surface, text: &str) -> bool {
        if !doc.clear_children(surface.node) {
            return false;
        }
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                let br = doc.create_element("br");
                doc.append_child(surface.node, br);
            }
            let span = doc.create_element("span");
            doc.append_child(surface.node, span);
            if !line.is_empty() {
                let content = doc.create_text(line);
                doc.append_child(span, content);
            }
        }
        if self.read_text(doc, surface) != text {
            warn!("framework write was not observed on re-read");
            return false;
        }
        doc.set_caret(surface.node, text.len());
        notify(doc, surface.node);
        true
    }

    fn replace_range(
        &self,
        _doc: &mut dyn Document,
        _surface: &Surface,
        _start: usize,
        _len: usize,
        _replacement: &str,
    ) -> bool {
        false
    }
}

/// Splices `replacement` over `[start, start+len)`, refusing out-of-bounds
/// or non-boundary ranges instead of panicking.
fn splice(text: &str, start: usize, len: usize, replacement: &str) -> Option<String> {
    let end = start.checked_add(len)?;
    if end > text.len() || !text.is_char_boundary(start) || !text.is_char_boundary(end) {
        return None;
    }
    let mut out = String::with_capacity(text.len() - len + replacement.len());
    out.push_str(&text[..start]);
    out.push_str(replacement);
    out.push_str(&text[end..]);
    Some(out)
}

fn flatten(doc: &dyn Document, node: NodeId, out: &mut String) {
    for child in doc.children(node) {
        if doc.is_text(child) {
            out.push_str(&doc.node_text(child).unwrap_or_default());
            continue;
        }
        match doc.tag_name(child).as_deref() {
            Some("br") => out.push('\n'),
            Some("img") => {}
            _ => flatten(doc, child, out),
        }
    }
}

fn subtree_has_image(doc: &dyn Document, node: NodeId) -> bool {
    if doc.tag_name(node).as_deref() == Some("img") {
        return true;
    }
    doc.children(node)
        .into_iter()
        .any(|child| subtree_has_image(doc, child))
}

struct LocatedText {
    node: NodeId,
    local_start: usize,
}

/// Maps a logical byte range to the single text node containing it, if one
/// does. Walks the same order as [`flatten`] so offsets line up.
fn locate_text_node(
    doc: &dyn Document,
    root: NodeId,
    start: usize,
    len: usize,
) -> Option<LocatedText> {
    let mut offset = 0usize;
    let mut stack: Vec<NodeId> = doc.children(root).into_iter().rev().collect();
    while let Some(node) = stack.pop() {
        if doc.is_text(node) {
            let text = doc.node_text(node).unwrap_or_default();
            if start >= offset && start + len <= offset + text.len() {
                return Some(LocatedText {
                    node,
                    local_start: start - offset,
                });
            }
            offset += text.len();
            continue;
        }
        match doc.tag_name(node).as_deref() {
            Some("br") => offset += 1,
            Some("img") => {}
            _ => {
                for child in doc.children(node).into_iter().rev() {
                    stack.push(child);
                }
            }
        }
    }
    None
}
