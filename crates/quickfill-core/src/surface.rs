use quickfill_dom::{Document, NodeId};

/// What kind of editable region a surface is. Decided once at discovery
/// time; everything downstream selects behavior by this tag instead of
/// re-inspecting the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceKind {
    PlainInput,
    PlainTextarea,
    ContentEditable,
    /// A rich editor that keeps its own virtual model (Draft, Lexical,
    /// Slate, WhatsApp's composer). Text offsets inside it are not stable,
    /// so only whole-content writes are attempted.
    FrameworkManaged,
}

/// Handle to one editable region in the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Surface {
    pub node: NodeId,
    pub kind: SurfaceKind,
}

impl Surface {
    pub fn new(node: NodeId, kind: SurfaceKind) -> Self {
        Surface { node, kind }
    }
}

/// Input types that actually receive free text. Password fields are
/// deliberately excluded; expanding into one would echo the snippet into a
/// masked control.
const TEXT_INPUT_TYPES: &[&str] = &["text", "search", "email", "url", "tel", "number"];

const FRAMEWORK_CLASSES: &[&str] = &["public-DraftEditor-content", "selectable-text"];

/// Classifies a node that discovery matched, or `None` when it turns out
/// not to be a usable text surface after all.
pub fn classify(doc: &dyn Document, node: NodeId) -> Option<SurfaceKind> {
    let tag = doc.tag_name(node)?;

    match tag.as_str() {
        "textarea" => return Some(SurfaceKind::PlainTextarea),
        "input" => {
            return match doc.attribute(node, "type") {
                None => Some(SurfaceKind::PlainInput),
                Some(ty) if TEXT_INPUT_TYPES.contains(&ty.to_ascii_lowercase().as_str()) => {
                    Some(SurfaceKind::PlainInput)
                }
                Some(_) => None,
            };
        }
        _ => {}
    }

    if has_framework_marker(doc, node) {
        return Some(SurfaceKind::FrameworkManaged);
    }

    if is_content_editable(doc, node) || has_text_entry_role(doc, node) {
        return Some(SurfaceKind::ContentEditable);
    }

    None
}

fn has_framework_marker(doc: &dyn Document, node: NodeId) -> bool {
    if doc.attribute(node, "data-lexical-editor").is_some()
        || doc.attribute(node, "data-slate-editor").is_some()
    {
        return true;
    }
    if doc.attribute(node, "g_editable").as_deref() == Some("true") {
        return true;
    }
    if doc.attribute(node, "data-tab").as_deref() == Some("10") {
        return true;
    }
    if doc
        .attribute(node, "data-testid")
        .map(|v| v.contains("compose"))
        .unwrap_or(false)
    {
        return true;
    }
    doc.attribute(node, "class")
        .map(|classes| {
            classes
                .split_whitespace()
                .any(|c| FRAMEWORK_CLASSES.contains(&c))
        })
        .unwrap_or(false)
}

fn is_content_editable(doc: &dyn Document, node: NodeId) -> bool {
    matches!(
        doc.attribute(node, "contenteditable").as_deref(),
        Some("") | Some("true")
    )
}

fn has_text_entry_role(doc: &dyn Document, node: NodeId) -> bool {
    matches!(
        doc.attribute(node, "role").as_deref(),
        Some("textbox") | Some("combobox") | Some("searchbox")
    ) || doc.attribute(node, "aria-multiline").as_deref() == Some("true")
}
